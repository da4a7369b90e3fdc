use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::content::ContentService;
use crate::error::AppError;

/// A seed fixture: categories first, then articles referencing them by title.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub articles: Vec<SeedArticle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCategory {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedArticle {
    pub title: String,
    /// Title of an existing category.
    pub category: String,
}

/// What a load run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub categories_created: usize,
    pub categories_skipped: usize,
    pub articles_created: usize,
    pub articles_skipped: usize,
}

/// Read and parse a seed fixture from disk.
pub fn read_seed_file(path: &Path) -> Result<SeedData, AppError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| {
        AppError::BadRequest(format!("Invalid seed file {}: {e}", path.display()))
    })
}

/// Create every category and article of `data`.
///
/// Only rows that existed before the run are skipped, so re-running a fixture
/// creates nothing new:
///
/// - a category is keyed by its title, which is unique in the store, so a
///   title listed twice in one fixture yields a single category;
/// - an article is keyed by `(title, category)`. If the store already holds
///   `n` such articles, the first `n` fixture entries with that key are
///   skipped and the rest are created, so repeated entries stay distinct rows.
///
/// The load stops at the first article whose category cannot be resolved;
/// rows created before that point are kept.
pub async fn load_data(service: &ContentService, data: &SeedData) -> Result<LoadSummary, AppError> {
    tracing::info!(
        "Loading {} categories and {} articles",
        data.categories.len(),
        data.articles.len()
    );

    let mut summary = LoadSummary::default();

    for seed in &data.categories {
        if service.find_category(&seed.title).await?.is_some() {
            tracing::warn!("Category '{}' already exists, skipping.", seed.title);
            summary.categories_skipped += 1;
            continue;
        }
        service.create_category(&seed.title).await?;
        summary.categories_created += 1;
    }

    let mut existing: HashMap<(String, i64), usize> = HashMap::new();
    for seed in &data.articles {
        let category = service.category_by_title(&seed.category).await.map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound(format!(
                "Category '{}' referenced by article '{}'",
                seed.category, seed.title
            )),
            other => other,
        })?;

        // Pre-run count, taken the first time a key shows up.
        let remaining = match existing.entry((seed.title.clone(), category.id)) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let count = service.count_articles(&seed.title, category.id).await?;
                entry.insert(count)
            }
        };
        if *remaining > 0 {
            *remaining -= 1;
            tracing::warn!(
                "Article '{}' in '{}' already exists, skipping.",
                seed.title,
                seed.category
            );
            summary.articles_skipped += 1;
            continue;
        }

        service.create_article(&seed.title, &category.title).await?;
        summary.articles_created += 1;
    }

    tracing::info!("Data loaded successfully: {:?}", summary);
    Ok(summary)
}

/// [`read_seed_file`] followed by [`load_data`].
pub async fn load_file(service: &ContentService, path: &Path) -> Result<LoadSummary, AppError> {
    let data = read_seed_file(path)?;
    load_data(service, &data).await
}
