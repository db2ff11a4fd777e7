// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Composite `content-type:id` references to Confluence content nodes.

use serde::{Deserialize, Serialize};

/// Reference to a content node, written as `content-type:id`
/// (for example `page:98305` or `blogpost:1234`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentReference {
    content_type: String,
    id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid content reference '{0}' (expected 'content-type:id')")]
pub struct InvalidContentReference(pub String);

impl ContentReference {
    /// Build a reference from its halves. Both must be non-blank and the
    /// content type must not contain `:`, so the result always re-parses to
    /// itself.
    pub fn new(
        content_type: impl Into<String>,
        id: impl Into<String>,
    ) -> Result<Self, InvalidContentReference> {
        let content_type = content_type.into();
        let id = id.into();
        if content_type.trim().is_empty() || content_type.contains(':') || id.trim().is_empty() {
            return Err(InvalidContentReference(format!("{content_type}:{id}")));
        }
        Ok(Self { content_type, id })
    }

    /// Parse `content-type:id`. The id may itself contain further colons.
    pub fn parse(raw: &str) -> Result<Self, InvalidContentReference> {
        let (content_type, id) = raw
            .split_once(':')
            .ok_or_else(|| InvalidContentReference(raw.to_string()))?;
        Self::new(content_type, id).map_err(|_| InvalidContentReference(raw.to_string()))
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for ContentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.content_type, self.id)
    }
}

impl TryFrom<String> for ContentReference {
    type Error = InvalidContentReference;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentReference> for String {
    fn from(value: ContentReference) -> Self {
        value.to_string()
    }
}
