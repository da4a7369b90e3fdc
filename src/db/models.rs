use serde::{Deserialize, Serialize};

/// A category stored in the `categories` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Sequential identifier assigned on creation.
    pub id: i64,
    pub title: String,
}

/// An article stored in the `articles` collection.
///
/// The category is a reference by id; search documents embed a snapshot of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Sequential identifier assigned on creation.
    pub id: i64,
    pub title: String,
    /// Id of the owning [`Category`].
    pub category_id: i64,
}
