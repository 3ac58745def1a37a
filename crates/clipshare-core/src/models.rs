//! Data model for shared clipboard collections.
//!
//! The serde layout of [`SharedClipCollection`] is the persisted record
//! format: camelCase JSON with ISO-8601 timestamps, stored whole under
//! `clip:<id>`.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::defaults::SHARE_PATH;
use crate::error::{Error, Result};
use crate::ids::new_item_id;

/// How an item's content should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClipItemType {
    Text,
    Url,
    Html,
}

impl ClipItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipItemType::Text => "text",
            ClipItemType::Url => "url",
            ClipItemType::Html => "html",
        }
    }
}

impl std::fmt::Display for ClipItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single clipboard snippet inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ClipItemType,
    /// Canonical plain-text representation
    pub content: String,
    /// Rich-text representation, present only for `html` items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A TTL-bounded, URL-addressable list of clipboard items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharedClipCollection {
    pub id: String,
    /// Newest first
    pub items: Vec<ClipboardItem>,
    pub created_at: DateTime<Utc>,
}

impl SharedClipCollection {
    /// An empty collection created now.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            items: Vec::new(),
            created_at: now(),
        }
    }

    /// Insert an item at the front, making it the newest.
    pub fn prepend(&mut self, item: ClipboardItem) {
        self.items.insert(0, item);
    }

    /// Remove an item by id, returning it if it was present.
    pub fn remove_item(&mut self, item_id: &str) -> Option<ClipboardItem> {
        let pos = self.items.iter().position(|item| item.id == item_id)?;
        Some(self.items.remove(pos))
    }
}

/// Body of an add-item request, before the server assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewClipItem {
    #[serde(rename = "type")]
    pub item_type: ClipItemType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
}

impl NewClipItem {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            item_type: ClipItemType::Text,
            content: content.into(),
            html_content: None,
        }
    }

    pub fn url(content: impl Into<String>) -> Self {
        Self {
            item_type: ClipItemType::Url,
            content: content.into(),
            html_content: None,
        }
    }

    pub fn html(content: impl Into<String>, html_content: impl Into<String>) -> Self {
        Self {
            item_type: ClipItemType::Html,
            content: content.into(),
            html_content: Some(html_content.into()),
        }
    }

    /// Check the item invariants: non-empty content, and `htmlContent`
    /// present if and only if the type is `html`.
    pub fn validate(&self) -> Result<()> {
        if self.content.is_empty() {
            return Err(Error::InvalidInput("content must not be empty".to_string()));
        }
        match (self.item_type, &self.html_content) {
            (ClipItemType::Html, None) => Err(Error::InvalidInput(
                "htmlContent is required for html items".to_string(),
            )),
            (ClipItemType::Html, Some(html)) if html.is_empty() => Err(Error::InvalidInput(
                "htmlContent must not be empty".to_string(),
            )),
            (other, Some(_)) if other != ClipItemType::Html => Err(Error::InvalidInput(format!(
                "htmlContent is only allowed for html items, not {}",
                other
            ))),
            _ => Ok(()),
        }
    }

    /// Materialize into a stored item with a fresh id and timestamp.
    pub fn into_item(self) -> ClipboardItem {
        ClipboardItem {
            id: new_item_id(),
            item_type: self.item_type,
            content: self.content,
            html_content: self.html_content,
            created_at: now(),
        }
    }
}

/// Result of creating a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCollection {
    pub id: String,
    pub url: String,
    pub collection: SharedClipCollection,
}

/// Build the share URL `{base_url}/clip/{id}`.
pub fn share_url(base_url: &str, collection_id: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        SHARE_PATH,
        collection_id
    )
}

/// Current time at millisecond precision, matching what browsers emit.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
