use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::error::AppError;
use crate::search::documents::ArticleIndexDocument;
use crate::search::mapping::DocumentMapping;

/// A query against the articles index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuery {
    pub text: String,
    /// Restrict matching to these attributes. Empty means all searchable ones.
    pub attributes: Vec<String>,
    /// Exact category title to filter on.
    pub category: Option<String>,
    /// Sort alphabetically by exact title instead of by relevance.
    pub sort_by_title: bool,
    pub limit: usize,
}

/// A search result returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleHit {
    pub id: i64,
    pub title: String,
    pub category_id: i64,
    pub category_title: String,
}

impl From<ArticleIndexDocument> for ArticleHit {
    fn from(doc: ArticleIndexDocument) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            category_id: doc.category.id,
            category_title: doc.category.title,
        }
    }
}

/// Trait for search operations, enabling mock testing.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Create the index described by `mapping` and apply its settings.
    /// Creating an index that already exists only refreshes its settings.
    async fn create_index(&self, mapping: &DocumentMapping) -> Result<(), AppError>;

    /// Drop an index and all of its documents.
    async fn delete_index(&self, index: &str) -> Result<(), AppError>;

    /// Add or replace documents, matched by primary key.
    async fn index_documents(
        &self,
        index: &str,
        docs: &[ArticleIndexDocument],
    ) -> Result<(), AppError>;

    /// Remove a document from the index.
    async fn delete_document(&self, index: &str, id: i64) -> Result<(), AppError>;

    async fn search(&self, index: &str, query: &ArticleQuery)
        -> Result<Vec<ArticleHit>, AppError>;
}

/// Build a filter expression matching an exact category title.
pub fn category_filter(title: &str) -> String {
    let escaped = title.replace('\\', "\\\\").replace('"', "\\\"");
    format!("category.title.raw = \"{escaped}\"")
}

/// Meilisearch implementation of the SearchService.
pub struct MeilisearchService {
    client: meilisearch_sdk::client::Client,
}

impl MeilisearchService {
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self, AppError> {
        let client = meilisearch_sdk::client::Client::new(url, api_key)
            .map_err(|e| AppError::Search(format!("Failed to create Meilisearch client: {e}")))?;

        Ok(Self { client })
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self, AppError> {
        Self::new(&config.url, config.api_key.clone())
    }

    fn index(&self, name: &str) -> meilisearch_sdk::indexes::Index {
        self.client.index(name)
    }
}

#[async_trait]
impl SearchService for MeilisearchService {
    async fn create_index(&self, mapping: &DocumentMapping) -> Result<(), AppError> {
        // Tasks run in submission order, so settings land after creation.
        let _: meilisearch_sdk::task_info::TaskInfo = self
            .client
            .create_index(&mapping.index_name, Some(mapping.primary_key.as_str()))
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch create error: {e}")))?;

        let index = self.index(&mapping.index_name);
        let settings = mapping.index_settings();

        let _: meilisearch_sdk::task_info::TaskInfo = index
            .set_searchable_attributes(&settings.searchable_attributes)
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch config error: {e}")))?;

        let _: meilisearch_sdk::task_info::TaskInfo = index
            .set_filterable_attributes(&settings.filterable_attributes)
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch config error: {e}")))?;

        let _: meilisearch_sdk::task_info::TaskInfo = index
            .set_sortable_attributes(&settings.sortable_attributes)
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch config error: {e}")))?;

        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), AppError> {
        let _: meilisearch_sdk::task_info::TaskInfo = self
            .client
            .delete_index(index)
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch delete index error: {e}")))?;

        Ok(())
    }

    async fn index_documents(
        &self,
        index: &str,
        docs: &[ArticleIndexDocument],
    ) -> Result<(), AppError> {
        if docs.is_empty() {
            return Ok(());
        }

        let _task: meilisearch_sdk::task_info::TaskInfo = self
            .index(index)
            .add_documents(docs, Some("id"))
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch index error: {e}")))?;

        Ok(())
    }

    async fn delete_document(&self, index: &str, id: i64) -> Result<(), AppError> {
        let _task: meilisearch_sdk::task_info::TaskInfo = self
            .index(index)
            .delete_document(id)
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch delete error: {e}")))?;

        Ok(())
    }

    async fn search(
        &self,
        index: &str,
        query: &ArticleQuery,
    ) -> Result<Vec<ArticleHit>, AppError> {
        let index = self.index(index);
        let attributes: Vec<&str> = query.attributes.iter().map(String::as_str).collect();
        let filter = query.category.as_deref().map(category_filter);
        let sort = ["title.raw:asc"];

        let mut search = index.search();
        search.with_query(&query.text).with_limit(query.limit);
        if !attributes.is_empty() {
            search.with_attributes_to_search_on(&attributes);
        }
        if let Some(filter) = filter.as_deref() {
            search.with_filter(filter);
        }
        if query.sort_by_title {
            search.with_sort(&sort);
        }

        let results: meilisearch_sdk::search::SearchResults<ArticleIndexDocument> = search
            .execute()
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch search error: {e}")))?;

        Ok(results
            .hits
            .into_iter()
            .map(|hit| ArticleHit::from(hit.result))
            .collect())
    }
}
