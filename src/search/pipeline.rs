use std::collections::HashMap;
use std::sync::Arc;

use crate::db::models::{Article, Category};
use crate::db::repository::{ArticleRepository, CategoryRepository};
use crate::error::AppError;
use crate::search::client::{ArticleHit, ArticleQuery, SearchService};
use crate::search::documents::{ArticleDocument, ArticleIndexDocument};

/// Documents sent per request when populating the index.
pub const BATCH_SIZE: usize = 500;

/// Default number of hits returned by queries.
pub const DEFAULT_LIMIT: usize = 20;

/// Keeps the search index in step with the database.
///
/// Write paths call the `*_saved` / `*_deleted` hooks after persisting a
/// change; the pipeline resolves related rows, runs the mapper and pushes the
/// result to the search service.
pub struct IndexingPipeline {
    search: Arc<dyn SearchService>,
    categories: Arc<dyn CategoryRepository>,
    articles: Arc<dyn ArticleRepository>,
    document: ArticleDocument,
}

impl IndexingPipeline {
    pub fn new(
        search: Arc<dyn SearchService>,
        categories: Arc<dyn CategoryRepository>,
        articles: Arc<dyn ArticleRepository>,
        document: ArticleDocument,
    ) -> Self {
        Self {
            search,
            categories,
            articles,
            document,
        }
    }

    pub fn document(&self) -> &ArticleDocument {
        &self.document
    }

    fn index_name(&self) -> &str {
        self.document.index_name()
    }

    /// Create the index and apply the settings derived from the mapping.
    pub async fn create_index(&self) -> Result<(), AppError> {
        tracing::info!("Creating search index '{}'", self.index_name());
        self.search.create_index(&self.document.mapping()).await
    }

    pub async fn delete_index(&self) -> Result<(), AppError> {
        tracing::info!("Deleting search index '{}'", self.index_name());
        self.search.delete_index(self.index_name()).await
    }

    /// Regenerate and upload the document of every article.
    ///
    /// Returns the number of documents sent.
    pub async fn populate(&self) -> Result<usize, AppError> {
        let categories: HashMap<i64, Category> = self
            .categories
            .list_all()
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let articles = self.articles.list_all().await?;
        let docs = articles
            .iter()
            .map(|article| {
                let category = categories.get(&article.category_id).ok_or_else(|| {
                    AppError::NotFound(format!(
                        "Category {} referenced by article {}",
                        article.category_id, article.id
                    ))
                })?;
                Ok(self.document.prepare(article, category))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        for batch in docs.chunks(BATCH_SIZE) {
            self.search.index_documents(self.index_name(), batch).await?;
            tracing::debug!("Indexed batch of {} articles", batch.len());
        }

        tracing::info!(
            "Populated '{}' with {} articles",
            self.index_name(),
            docs.len()
        );
        Ok(docs.len())
    }

    /// Delete, recreate and populate the index.
    pub async fn rebuild(&self) -> Result<usize, AppError> {
        self.delete_index().await?;
        self.create_index().await?;
        self.populate().await
    }

    /// Index (or re-index) one article after it was created or updated.
    pub async fn article_saved(&self, article: &Article) -> Result<ArticleIndexDocument, AppError> {
        let category = self
            .categories
            .find_by_id(article.category_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Category {} referenced by article {}",
                    article.category_id, article.id
                ))
            })?;

        let doc = self.document.prepare(article, &category);
        self.search
            .index_documents(self.index_name(), std::slice::from_ref(&doc))
            .await?;

        tracing::debug!("Indexed article {} ('{}')", article.id, article.title);
        Ok(doc)
    }

    /// Remove the document of a deleted article.
    pub async fn article_deleted(&self, article_id: i64) -> Result<(), AppError> {
        self.search
            .delete_document(self.index_name(), article_id)
            .await?;

        tracing::debug!("Removed article {} from index", article_id);
        Ok(())
    }

    /// Refresh the embedded snapshot in every article of a changed category.
    ///
    /// Returns the number of documents regenerated.
    pub async fn category_saved(&self, category: &Category) -> Result<usize, AppError> {
        let articles = self.articles.list_by_category(category.id).await?;
        let docs: Vec<ArticleIndexDocument> = articles
            .iter()
            .map(|article| self.document.prepare(article, category))
            .collect();

        for batch in docs.chunks(BATCH_SIZE) {
            self.search.index_documents(self.index_name(), batch).await?;
        }

        tracing::debug!(
            "Re-indexed {} articles of category {} ('{}')",
            docs.len(),
            category.id,
            category.title
        );
        Ok(docs.len())
    }

    /// Full-text search over the analyzed fields.
    pub async fn search(
        &self,
        text: &str,
        category: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ArticleHit>, AppError> {
        let query = ArticleQuery {
            text: text.to_string(),
            attributes: self.document.mapping().searchable_attributes(),
            category: category.map(str::to_string),
            sort_by_title: false,
            limit,
        };
        self.search.search(self.index_name(), &query).await
    }

    /// Autocomplete titles starting with `prefix`, alphabetically.
    pub async fn suggest(
        &self,
        prefix: &str,
        category: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ArticleHit>, AppError> {
        let query = ArticleQuery {
            text: prefix.to_string(),
            attributes: self.document.mapping().completion_attributes(),
            category: category.map(str::to_string),
            sort_by_title: true,
            limit,
        };
        self.search.search(self.index_name(), &query).await
    }
}
