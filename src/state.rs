use std::sync::Arc;

use crate::config::AppConfig;
use crate::content::ContentService;
use crate::db::repository::{
    ArticleRepository, CategoryRepository, MongoArticleRepository, MongoCategoryRepository,
};
use crate::error::AppError;
use crate::search::client::{MeilisearchService, SearchService};
use crate::search::documents::{ArticleDocument, ARTICLES_INDEX};
use crate::search::pipeline::IndexingPipeline;

/// Wired-up services shared by every command.
#[derive(Clone)]
pub struct AppState {
    pub categories: Arc<dyn CategoryRepository>,
    pub articles: Arc<dyn ArticleRepository>,
    pub pipeline: Option<Arc<IndexingPipeline>>,
    pub config: AppConfig,
}

impl AppState {
    /// Assemble the state from already-built parts.
    ///
    /// The article index configuration is registered here, explicitly; a
    /// `None` search service disables indexing.
    pub fn new(
        config: AppConfig,
        categories: Arc<dyn CategoryRepository>,
        articles: Arc<dyn ArticleRepository>,
        search: Option<Arc<dyn SearchService>>,
    ) -> Self {
        let pipeline = search.map(|search| {
            let document =
                ArticleDocument::with_index_name(config.search.index_name(ARTICLES_INDEX));
            Arc::new(IndexingPipeline::new(
                search,
                categories.clone(),
                articles.clone(),
                document,
            ))
        });

        Self {
            categories,
            articles,
            pipeline,
            config,
        }
    }

    /// Connect to MongoDB and (unless `with_search` is false) Meilisearch.
    pub async fn connect(config: AppConfig, with_search: bool) -> Result<Self, AppError> {
        let mongo_client = mongodb::Client::with_uri_str(&config.mongodb.uri)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to MongoDB: {e}")))?;
        let db = mongo_client.database(&config.mongodb.database);

        let categories = MongoCategoryRepository::new(&db);
        let articles = MongoArticleRepository::new(&db);
        categories.ensure_indexes().await?;
        articles.ensure_indexes().await?;

        tracing::info!(
            "Connected to MongoDB at {} (database '{}')",
            config.mongodb.uri,
            config.mongodb.database
        );

        let search: Option<Arc<dyn SearchService>> = if with_search {
            let service = MeilisearchService::from_config(&config.search)?;
            tracing::info!("Search indexing enabled at {}", config.search.url);
            Some(Arc::new(service))
        } else {
            tracing::info!("Search indexing disabled");
            None
        };

        Ok(Self::new(config, Arc::new(categories), Arc::new(articles), search))
    }

    pub fn content(&self) -> ContentService {
        ContentService::new(
            self.categories.clone(),
            self.articles.clone(),
            self.pipeline.clone(),
        )
    }

    /// The pipeline, or an error when search was disabled.
    pub fn pipeline(&self) -> Result<&IndexingPipeline, AppError> {
        self.pipeline
            .as_deref()
            .ok_or_else(|| AppError::Config("Search indexing is disabled".into()))
    }
}
