use serde::{Deserialize, Serialize};

use crate::db::models::{Article, Category};
use crate::search::mapping::{DocumentMapping, Field};

/// Logical name of the articles index.
pub const ARTICLES_INDEX: &str = "articles";

/// The part of a [`Category`] copied into every article document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySnapshot {
    pub id: i64,
    pub title: String,
    #[serde(rename = "title.raw")]
    pub title_raw: String,
}

/// An article as stored in the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleIndexDocument {
    /// Primary key, the article id.
    pub id: i64,
    /// Analyzed title for relevance search.
    pub title: String,
    /// Exact-match copy of the title for filtering and sorting.
    #[serde(rename = "title.raw")]
    pub title_raw: String,
    /// Completion copy of the title for autocomplete.
    #[serde(rename = "title.suggest")]
    pub title_suggest: String,
    /// Denormalized snapshot of the article's category at indexing time.
    pub category: CategorySnapshot,
}

/// Index configuration for [`Article`] rows.
///
/// Passed explicitly to [`crate::search::pipeline::IndexingPipeline::new`].
#[derive(Debug, Clone)]
pub struct ArticleDocument {
    index_name: String,
}

impl Default for ArticleDocument {
    fn default() -> Self {
        Self {
            index_name: ARTICLES_INDEX.to_string(),
        }
    }
}

impl ArticleDocument {
    /// Use a different physical index, e.g. a prefixed one per environment.
    pub fn with_index_name(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Field declaration for the articles index.
    ///
    /// The category relation is flattened into an object holding only
    /// `id` and `title`.
    pub fn mapping(&self) -> DocumentMapping {
        DocumentMapping {
            index_name: self.index_name.clone(),
            primary_key: "id".to_string(),
            fields: vec![
                Field::text("title").with_raw().with_suggest(),
                Field::object(
                    "category",
                    vec![Field::integer("id"), Field::text("title").with_raw()],
                ),
            ],
        }
    }

    /// Build the index document for `article`, embedding `category`.
    ///
    /// `category` must be the row referenced by `article.category_id`.
    pub fn prepare(&self, article: &Article, category: &Category) -> ArticleIndexDocument {
        debug_assert_eq!(article.category_id, category.id);

        ArticleIndexDocument {
            id: article.id,
            title: article.title.clone(),
            title_raw: article.title.clone(),
            title_suggest: article.title.clone(),
            category: CategorySnapshot {
                id: category.id,
                title: category.title.clone(),
                title_raw: category.title.clone(),
            },
        }
    }
}
