// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Two kinds of bearer token reach this service:
//!
//! - **Host invocation tokens**, signed by the host platform. Verified against
//!   the host JWKS; the audience (app id) resolves the product and the
//!   `context` claim names the installation.
//! - **Capability tokens**, minted here (HS256, shared secret). Each is bound
//!   to one operation path through its audience and carries the full
//!   [`Context`](crate::context::Context) of the document it grants access to.
//!
//! ## Capability token checks
//!
//! Performed in this order, first failure wins:
//!
//! 1. Signature
//! 2. Expiry (`now >= exp` is expired, no leeway)
//! 3. Non-blank subject
//! 4. Context claim shape
//! 5. Audience equals the request path
//!
//! ## Security
//!
//! - Token failures share one `401` response body; the reason is only logged
//! - JWKS is fetched via HTTPS only and cached with a TTL
//! - Host tokens get 60 seconds of clock skew tolerance

pub mod claims;
pub mod clock;
pub mod error;
pub mod extractor;
pub mod host;
pub mod jwks;
pub mod middleware;
pub mod signed_url;
pub mod token;

pub use claims::Principal;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AuthError;
pub use extractor::{Auth, CapabilityToken};
pub use host::HostTokenVerifier;
pub use jwks::JwksManager;
pub use middleware::{credential_interceptor, InterceptorState, PrincipalSource, RequestIdentity};
pub use signed_url::{AppUrls, UrlSigner};
pub use token::{CapabilityTokenService, IssueError, VerifiedCapability};
