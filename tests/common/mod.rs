#![allow(dead_code)]

use std::sync::Arc;

use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::meilisearch::Meilisearch;
use testcontainers_modules::mongo::Mongo;

use articles_search::config::{AppConfig, MongoConfig, SearchConfig, SeedConfig};
use articles_search::db::repository::{MongoArticleRepository, MongoCategoryRepository};
use articles_search::search::client::{MeilisearchService, SearchService};
use articles_search::state::AppState;

pub fn test_config(index_prefix: &str) -> AppConfig {
    AppConfig {
        mongodb: MongoConfig {
            uri: "mongodb://127.0.0.1:27017".to_string(),
            database: "articles_test".to_string(),
        },
        search: SearchConfig {
            url: "http://127.0.0.1:7700".to_string(),
            api_key: None,
            index_prefix: index_prefix.to_string(),
        },
        seed: SeedConfig {
            path: "demo-data.json".into(),
        },
    }
}

/// Holds running containers and the state wired to them.
///
/// Containers are kept alive for as long as this struct lives. When dropped,
/// containers are stopped and cleaned up automatically.
pub struct ContainerEnv {
    _mongo: ContainerAsync<Mongo>,
    _meili: ContainerAsync<Meilisearch>,
    pub state: AppState,
}

impl ContainerEnv {
    /// Spin up MongoDB and Meilisearch and connect real services to them.
    pub async fn start() -> Self {
        let (mongo_container, meili_container) =
            tokio::join!(Mongo::default().start(), Meilisearch::default().start());
        let mongo_container = mongo_container.expect("Failed to start MongoDB container");
        let meili_container = meili_container.expect("Failed to start Meilisearch container");

        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_client = mongodb::Client::with_uri_str(format!("mongodb://127.0.0.1:{mongo_port}"))
            .await
            .expect("Failed to connect to MongoDB");
        let db = mongo_client.database("articles_test");

        let categories = MongoCategoryRepository::new(&db);
        let articles = MongoArticleRepository::new(&db);
        categories
            .ensure_indexes()
            .await
            .expect("Failed to create category indexes");
        articles
            .ensure_indexes()
            .await
            .expect("Failed to create article indexes");

        let meili_port = meili_container
            .get_host_port_ipv4(7700)
            .await
            .expect("Failed to get Meilisearch port");
        let search = MeilisearchService::new(&format!("http://127.0.0.1:{meili_port}"), None)
            .expect("Failed to create MeilisearchService");

        let prefix = format!("t{}_", uuid::Uuid::new_v4().simple());
        let state = AppState::new(
            test_config(&prefix),
            Arc::new(categories),
            Arc::new(articles),
            Some(Arc::new(search) as Arc<dyn SearchService>),
        );

        Self {
            _mongo: mongo_container,
            _meili: meili_container,
            state,
        }
    }

    /// Meilisearch processes tasks asynchronously; give it time to catch up.
    pub async fn wait_for_search_indexing(&self) {
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    }
}
