//! Album record types.

use serde::{Deserialize, Serialize};

/// A stored album.
///
/// `id` is empty on records built by clients; `Store::add` assigns one.
/// Missing JSON fields decode as empty strings and a zero price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub artist: String,
    pub price: i64,
}

impl Record {
    /// Create a record without an id.
    pub fn new(title: impl Into<String>, artist: impl Into<String>, price: i64) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            artist: artist.into(),
            price,
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Update request for the record whose id is `id`.
///
/// An empty `title` or `artist` means "leave unchanged", same as `None`.
/// `price: Some(0)` overwrites the price with zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

impl PartialRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_price(mut self, price: i64) -> Self {
        self.price = Some(price);
        self
    }

    /// Title to write, if any. Empty strings count as unset.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    /// Artist to write, if any. Empty strings count as unset.
    pub fn artist(&self) -> Option<&str> {
        self.artist.as_deref().filter(|a| !a.is_empty())
    }

    /// Merge this update into `current`. The id is never changed.
    pub fn apply(&self, current: &Record) -> Record {
        Record {
            id: current.id.clone(),
            title: self.title().unwrap_or(&current.title).to_string(),
            artist: self.artist().unwrap_or(&current.artist).to_string(),
            price: self.price.unwrap_or(current.price),
        }
    }
}
