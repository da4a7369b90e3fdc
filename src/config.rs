use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "articles.toml";

/// Runtime configuration.
///
/// Layered from built-in defaults, an optional TOML file and
/// `ARTICLES__*` environment variables (e.g. `ARTICLES__MONGODB__URI`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub mongodb: MongoConfig,
    pub search: SearchConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Meilisearch base URL.
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Prepended to every index name, so several environments can share one
    /// Meilisearch instance.
    #[serde(default)]
    pub index_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Fixture consumed by `load-data`.
    pub path: PathBuf,
}

impl SearchConfig {
    pub fn index_name(&self, base: &str) -> String {
        format!("{}{}", self.index_prefix, base)
    }
}

impl AppConfig {
    /// Load configuration. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let env = config::Environment::with_prefix("ARTICLES")
            .prefix_separator("__")
            .separator("__");

        Self::from_sources(file, Some(env))
    }

    /// Defaults, then `file`, then `env` when given.
    fn from_sources(
        file: config::File<config::FileSourceFile, config::FileFormat>,
        env: Option<config::Environment>,
    ) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .set_default("mongodb.uri", "mongodb://localhost:27017")?
            .set_default("mongodb.database", "articles")?
            .set_default("search.url", "http://localhost:7700")?
            .set_default("search.index_prefix", "")?
            .set_default("seed.path", "demo-data.json")?
            .add_source(file);

        if let Some(env) = env {
            builder = builder.add_source(env);
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}
