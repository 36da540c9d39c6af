use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Domain representation of a catalog product.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier assigned by the store.
    pub id: i32,
    /// Human-readable name of the product.
    pub name: String,
    /// Ordered labels attached to the product.
    pub tags: Vec<String>,
    /// Reference to the attached image (`uploads/<name>`), empty when none.
    pub image_url: String,
    /// Row version used for optimistic concurrency checks.
    #[serde(skip_serializing, default)]
    pub version: i32,
    /// Timestamp for when the product record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the product record.
    pub updated_at: NaiveDateTime,
}

impl Product {
    /// Whether an attachment is currently referenced by the product.
    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }
}

/// Payload required to insert a new product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    /// Human-readable name of the product.
    pub name: String,
    /// Ordered labels attached to the product.
    pub tags: Vec<String>,
    /// Reference to an already stored attachment, if any.
    pub image_url: Option<String>,
}

impl NewProduct {
    /// Build a new product payload without an attachment.
    pub fn new(name: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            name: name.into(),
            tags,
            image_url: None,
        }
    }

    /// Reference an attachment that was stored before the insert.
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// Replacement data applied when updating an existing product.
///
/// `name` and `tags` always overwrite the stored values. `image_url` only
/// overwrites the stored reference when a new attachment was uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProduct {
    /// New name of the product.
    pub name: String,
    /// New tag sequence, replacing the stored one.
    pub tags: Vec<String>,
    /// New attachment reference, `None` keeps the current one.
    pub image_url: Option<String>,
    /// Version observed by the caller before the update.
    pub expected_version: i32,
    /// Timestamp captured when the update was created.
    pub updated_at: NaiveDateTime,
}

impl UpdateProduct {
    /// Create an update that keeps the current attachment.
    pub fn new(name: impl Into<String>, tags: Vec<String>, expected_version: i32) -> Self {
        Self {
            name: name.into(),
            tags,
            image_url: None,
            expected_version,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Replace the attachment reference.
    pub fn image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// Query definition used to list products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductListQuery {
    /// Optional case-insensitive substring matched against the name.
    pub search: Option<String>,
}

impl ProductListQuery {
    /// Construct a query that targets every product.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter the results by a keyword. Blank keywords are ignored.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() {
            None
        } else {
            Some(term)
        };
        self
    }
}
