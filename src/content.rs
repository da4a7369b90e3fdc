use std::sync::Arc;

use crate::db::models::{Article, Category};
use crate::db::repository::{ArticleRepository, CategoryRepository};
use crate::error::AppError;
use crate::search::pipeline::IndexingPipeline;

/// Write path for categories and articles.
///
/// Persists each change, then hands it to the indexing pipeline (if one is
/// configured). Index failures are logged and do not undo the write; a later
/// `search-index rebuild` brings the index back in line.
pub struct ContentService {
    categories: Arc<dyn CategoryRepository>,
    articles: Arc<dyn ArticleRepository>,
    pipeline: Option<Arc<IndexingPipeline>>,
}

fn require_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::BadRequest("Title cannot be empty".into()));
    }
    Ok(())
}

impl ContentService {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        articles: Arc<dyn ArticleRepository>,
        pipeline: Option<Arc<IndexingPipeline>>,
    ) -> Self {
        Self {
            categories,
            articles,
            pipeline,
        }
    }

    pub async fn find_category(&self, title: &str) -> Result<Option<Category>, AppError> {
        self.categories.find_by_title(title).await
    }

    /// Number of articles titled `title` in the category.
    pub async fn count_articles(&self, title: &str, category_id: i64) -> Result<usize, AppError> {
        self.articles
            .count_by_title_in_category(title, category_id)
            .await
    }

    /// Resolve a category by exact title, failing if it does not exist.
    pub async fn category_by_title(&self, title: &str) -> Result<Category, AppError> {
        self.categories
            .find_by_title(title)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category '{title}'")))
    }

    pub async fn create_category(&self, title: &str) -> Result<Category, AppError> {
        require_title(title)?;
        let category = self.categories.create(title).await?;
        tracing::info!("Created category {} ('{}')", category.id, category.title);
        Ok(category)
    }

    /// Rename a category and refresh the snapshot embedded in its articles.
    pub async fn rename_category(&self, id: i64, title: &str) -> Result<Category, AppError> {
        require_title(title)?;
        let category = self.categories.update_title(id, title).await?;

        if let Some(pipeline) = &self.pipeline {
            if let Err(e) = pipeline.category_saved(&category).await {
                tracing::warn!("Failed to re-index articles of category {id}: {e}");
            }
        }

        Ok(category)
    }

    /// Create an article in the category titled `category_title`.
    pub async fn create_article(
        &self,
        title: &str,
        category_title: &str,
    ) -> Result<Article, AppError> {
        require_title(title)?;
        let category = self.category_by_title(category_title).await?;
        let article = self.articles.create(title, category.id).await?;
        tracing::info!(
            "Created article {} ('{}') in '{}'",
            article.id,
            article.title,
            category.title
        );

        self.index_article(&article).await;
        Ok(article)
    }

    /// Change the title and/or category of an article.
    pub async fn update_article(
        &self,
        id: i64,
        title: Option<&str>,
        category_title: Option<&str>,
    ) -> Result<Article, AppError> {
        let mut article = self
            .articles
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article {id}")))?;

        if let Some(title) = title {
            require_title(title)?;
            article.title = title.to_string();
        }
        if let Some(category_title) = category_title {
            article.category_id = self.category_by_title(category_title).await?.id;
        }

        self.articles.update(&article).await?;
        self.index_article(&article).await;
        Ok(article)
    }

    /// Delete an article and drop its document from the index.
    pub async fn delete_article(&self, id: i64) -> Result<Article, AppError> {
        let article = self
            .articles
            .delete(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article {id}")))?;

        if let Some(pipeline) = &self.pipeline {
            if let Err(e) = pipeline.article_deleted(id).await {
                tracing::warn!("Failed to remove article {id} from search: {e}");
            }
        }

        Ok(article)
    }

    async fn index_article(&self, article: &Article) {
        if let Some(pipeline) = &self.pipeline {
            if let Err(e) = pipeline.article_saved(article).await {
                tracing::warn!("Failed to index article {} in search: {e}", article.id);
            }
        }
    }
}
