use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use articles_search::config::AppConfig;
use articles_search::loader;
use articles_search::search::client::ArticleHit;
use articles_search::search::documents::{ArticleDocument, ARTICLES_INDEX};
use articles_search::search::pipeline::DEFAULT_LIMIT;
use articles_search::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "articles-search", version, about = "Article search indexing tools")]
struct Cli {
    /// Config file (defaults to ./articles.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load categories and articles from a JSON fixture.
    LoadData {
        /// Fixture path (defaults to `seed.path`).
        #[arg(long)]
        file: Option<PathBuf>,
        /// Write rows without updating the search index.
        #[arg(long)]
        no_index: bool,
    },
    /// Manage the articles search index.
    SearchIndex {
        #[arg(value_enum)]
        action: IndexAction,
    },
    /// Full-text search over article and category titles.
    Search {
        query: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Autocomplete article titles.
    Suggest {
        prefix: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Rename a category and re-index its articles.
    RenameCategory { id: i64, title: String },
    /// Change an article's title and/or category and re-index it.
    UpdateArticle {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        /// Title of the new category.
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete an article and its search document.
    DeleteArticle { id: i64 },
    /// Print the field mapping and the index settings derived from it.
    Mapping,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum IndexAction {
    Create,
    Delete,
    Populate,
    Rebuild,
}

fn print_hits(hits: &[ArticleHit]) {
    if hits.is_empty() {
        println!("No results.");
    }
    for hit in hits {
        println!("{:>6}  {}  [{}]", hit.id, hit.title, hit.category_title);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "articles_search=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Mapping => {
            let document =
                ArticleDocument::with_index_name(config.search.index_name(ARTICLES_INDEX));
            let mapping = document.mapping();
            let out = serde_json::json!({
                "index": mapping.index_name,
                "primary_key": mapping.primary_key,
                "mapping": mapping.to_index_mapping(),
                "settings": mapping.index_settings(),
                "completion": mapping.completion_attributes(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::SearchIndex { action } => {
            let state = AppState::connect(config, true).await?;
            let pipeline = state.pipeline()?;
            match action {
                IndexAction::Create => pipeline.create_index().await?,
                IndexAction::Delete => pipeline.delete_index().await?,
                IndexAction::Populate => {
                    let count = pipeline.populate().await?;
                    println!("Indexed {count} articles.");
                }
                IndexAction::Rebuild => {
                    let count = pipeline.rebuild().await?;
                    println!("Rebuilt index with {count} articles.");
                }
            }
        }
        Command::LoadData { file, no_index } => {
            let path = file.unwrap_or_else(|| config.seed.path.clone());
            let state = AppState::connect(config, !no_index).await?;
            if let Some(pipeline) = &state.pipeline {
                pipeline.create_index().await?;
            }
            let summary = loader::load_file(&state.content(), &path)
                .await
                .with_context(|| format!("Failed to load {}", path.display()))?;
            println!(
                "Data loaded successfully. Categories: {} created, {} skipped. Articles: {} created, {} skipped.",
                summary.categories_created,
                summary.categories_skipped,
                summary.articles_created,
                summary.articles_skipped
            );
        }
        Command::Search {
            query,
            category,
            limit,
        } => {
            let state = AppState::connect(config, true).await?;
            let hits = state
                .pipeline()?
                .search(&query, category.as_deref(), limit)
                .await?;
            print_hits(&hits);
        }
        Command::Suggest {
            prefix,
            category,
            limit,
        } => {
            let state = AppState::connect(config, true).await?;
            let hits = state
                .pipeline()?
                .suggest(&prefix, category.as_deref(), limit)
                .await?;
            print_hits(&hits);
        }
        Command::RenameCategory { id, title } => {
            let state = AppState::connect(config, true).await?;
            let category = state.content().rename_category(id, &title).await?;
            println!("Category {} renamed to '{}'.", category.id, category.title);
        }
        Command::UpdateArticle {
            id,
            title,
            category,
        } => {
            let state = AppState::connect(config, true).await?;
            let article = state
                .content()
                .update_article(id, title.as_deref(), category.as_deref())
                .await?;
            println!("Updated article {} ('{}').", article.id, article.title);
        }
        Command::DeleteArticle { id } => {
            let state = AppState::connect(config, true).await?;
            let article = state.content().delete_article(id).await?;
            println!("Deleted article {} ('{}').", article.id, article.title);
        }
    }

    Ok(())
}
