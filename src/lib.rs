// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Docs Forge Gateway - trust layer for a multi-tenant document-editing
//! integration.
//!
//! Host platform requests arrive with an invocation token plus two
//! short-lived credentials (user and system). This crate verifies them,
//! caches the credentials per tenant, mints audience-bound capability tokens
//! for editor, download and callback links, and reports how long an editing
//! session can safely last.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Host and capability token verification, signed URLs, interceptor
//! - `context` - Product-specific document contexts
//! - `credentials` - Tenant credential cache and session expiry
//! - `config` - Environment configuration
//! - `telemetry` - Logging setup

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod state;
pub mod telemetry;
