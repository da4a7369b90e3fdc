//! In-memory doubles for the repository and search traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::db::models::{Article, Category};
use crate::db::repository::{ArticleRepository, CategoryRepository};
use crate::error::AppError;
use crate::search::client::{ArticleHit, ArticleQuery, SearchService};
use crate::search::documents::ArticleIndexDocument;
use crate::search::mapping::DocumentMapping;

#[derive(Default)]
pub(crate) struct MockCategories {
    pub rows: Mutex<Vec<Category>>,
}

#[async_trait]
impl CategoryRepository for MockCategories {
    async fn create(&self, title: &str) -> Result<Category, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|c| c.title == title) {
            return Err(AppError::Database(format!("duplicate category title '{title}'")));
        }
        let category = Category {
            id: rows.len() as i64 + 1,
            title: title.to_string(),
        };
        rows.push(category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, AppError> {
        Ok(self.rows.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Category>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.title == title)
            .cloned())
    }

    async fn update_title(&self, id: i64, title: &str) -> Result<Category, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Category {id}")))?;
        row.title = title.to_string();
        Ok(row.clone())
    }

    async fn list_all(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.rows.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub(crate) struct MockArticles {
    pub rows: Mutex<Vec<Article>>,
    next_id: Mutex<i64>,
}

#[async_trait]
impl ArticleRepository for MockArticles {
    async fn create(&self, title: &str, category_id: i64) -> Result<Article, AppError> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let article = Article {
            id: *next_id,
            title: title.to_string(),
            category_id,
        };
        self.rows.lock().unwrap().push(article.clone());
        Ok(article)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, AppError> {
        Ok(self.rows.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn count_by_title_in_category(
        &self,
        title: &str,
        category_id: i64,
    ) -> Result<usize, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.title == title && a.category_id == category_id)
            .count())
    }

    async fn update(&self, article: &Article) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|a| a.id == article.id)
            .ok_or_else(|| AppError::NotFound(format!("Article {}", article.id)))?;
        *row = article.clone();
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<Option<Article>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let pos = rows.iter().position(|a| a.id == id);
        Ok(pos.map(|p| rows.remove(p)))
    }

    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Article>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Article>, AppError> {
        Ok(self.rows.lock().unwrap().clone())
    }
}

/// Records every call; `fail` makes every call error out.
///
/// `search` does a case-insensitive substring match on the attributes the
/// query names, so full-text and completion queries hit different fields.
#[derive(Default)]
pub(crate) struct MockSearch {
    pub docs: Mutex<HashMap<i64, ArticleIndexDocument>>,
    pub batches: Mutex<Vec<usize>>,
    pub queries: Mutex<Vec<ArticleQuery>>,
    pub created: Mutex<Vec<DocumentMapping>>,
    pub fail: AtomicBool,
}

impl MockSearch {
    pub fn failing() -> Self {
        let search = Self::default();
        search.fail.store(true, Ordering::SeqCst);
        search
    }

    fn check(&self) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Search("index connection unavailable".into()));
        }
        Ok(())
    }
}

/// Resolve a dotted attribute path, where sub-fields like `title.raw` are
/// literal keys and objects like `category` nest.
fn attribute<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a str> {
    if let Some(found) = value.get(path) {
        return found.as_str();
    }
    let (head, rest) = path.split_once('.')?;
    attribute(value.get(head)?, rest)
}

#[async_trait]
impl SearchService for MockSearch {
    async fn create_index(&self, mapping: &DocumentMapping) -> Result<(), AppError> {
        self.check()?;
        self.created.lock().unwrap().push(mapping.clone());
        Ok(())
    }

    async fn delete_index(&self, _index: &str) -> Result<(), AppError> {
        self.check()?;
        self.docs.lock().unwrap().clear();
        Ok(())
    }

    async fn index_documents(
        &self,
        _index: &str,
        docs: &[ArticleIndexDocument],
    ) -> Result<(), AppError> {
        self.check()?;
        self.batches.lock().unwrap().push(docs.len());
        let mut stored = self.docs.lock().unwrap();
        for doc in docs {
            stored.insert(doc.id, doc.clone());
        }
        Ok(())
    }

    async fn delete_document(&self, _index: &str, id: i64) -> Result<(), AppError> {
        self.check()?;
        self.docs.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn search(
        &self,
        _index: &str,
        query: &ArticleQuery,
    ) -> Result<Vec<ArticleHit>, AppError> {
        self.check()?;
        self.queries.lock().unwrap().push(query.clone());

        let needle = query.text.to_lowercase();
        let mut hits: Vec<ArticleIndexDocument> = self
            .docs
            .lock()
            .unwrap()
            .values()
            .filter(|doc| {
                let value = serde_json::to_value(doc).unwrap();
                query.attributes.iter().any(|path| {
                    attribute(&value, path)
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                })
            })
            .filter(|doc| {
                query
                    .category
                    .as_deref()
                    .map_or(true, |title| doc.category.title_raw == title)
            })
            .cloned()
            .collect();

        if query.sort_by_title {
            hits.sort_by(|a, b| a.title_raw.cmp(&b.title_raw));
        } else {
            hits.sort_by_key(|doc| doc.id);
        }
        hits.truncate(query.limit);
        Ok(hits.into_iter().map(ArticleHit::from).collect())
    }
}
