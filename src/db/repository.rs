use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::models::{Article, Category};
use crate::error::AppError;

/// Repository trait for category operations.
///
/// This trait allows mocking the database layer in tests.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Insert a new category. Titles are unique; inserting a duplicate fails.
    async fn create(&self, title: &str) -> Result<Category, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, AppError>;

    /// Find a category by its exact title.
    async fn find_by_title(&self, title: &str) -> Result<Option<Category>, AppError>;

    /// Rename a category. Returns `NotFound` if no category has this id.
    async fn update_title(&self, id: i64, title: &str) -> Result<Category, AppError>;

    /// List all categories ordered by id.
    async fn list_all(&self) -> Result<Vec<Category>, AppError>;
}

/// Repository trait for article operations.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert a new article referencing `category_id`.
    async fn create(&self, title: &str, category_id: i64) -> Result<Article, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, AppError>;

    /// Number of articles with this exact title in a category.
    async fn count_by_title_in_category(
        &self,
        title: &str,
        category_id: i64,
    ) -> Result<usize, AppError>;

    /// Overwrite title and category of an existing article.
    /// Returns `NotFound` if no article has this id.
    async fn update(&self, article: &Article) -> Result<(), AppError>;

    /// Delete an article, returning the removed row if it existed.
    async fn delete(&self, id: i64) -> Result<Option<Article>, AppError>;

    /// List articles of one category ordered by id.
    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Article>, AppError>;

    /// List all articles ordered by id.
    async fn list_all(&self) -> Result<Vec<Article>, AppError>;
}

/// A named monotonically increasing counter in the `counters` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Counter {
    #[serde(rename = "_id")]
    name: String,
    seq: i64,
}

/// Allocates sequential integer ids, one counter per collection.
#[derive(Clone)]
struct Sequences {
    collection: mongodb::Collection<Counter>,
}

impl Sequences {
    fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("counters"),
        }
    }

    async fn next(&self, name: &str) -> Result<i64, AppError> {
        use mongodb::bson::doc;
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = self
            .collection
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1_i64 } })
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::Database(format!("Counter '{name}' was not created")))?;

        Ok(counter.seq)
    }
}

async fn collect_cursor<T>(mut cursor: mongodb::Cursor<T>) -> Result<Vec<T>, AppError>
where
    T: serde::de::DeserializeOwned + Send + Sync + Unpin,
{
    use futures::TryStreamExt;

    let mut rows = Vec::new();
    while let Some(row) = cursor
        .try_next()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
    {
        rows.push(row);
    }
    Ok(rows)
}

async fn create_unique_index<T>(
    collection: &mongodb::Collection<T>,
    keys: mongodb::bson::Document,
) -> Result<(), AppError>
where
    T: Send + Sync,
{
    use mongodb::options::IndexOptions;
    use mongodb::IndexModel;

    let model = IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build();

    collection
        .create_index(model)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(())
}

/// MongoDB implementation of the CategoryRepository.
pub struct MongoCategoryRepository {
    collection: mongodb::Collection<Category>,
    sequences: Sequences,
}

impl MongoCategoryRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("categories"),
            sequences: Sequences::new(db),
        }
    }

    /// Create the unique indexes on `id` and `title`. Safe to call repeatedly.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::bson::doc;

        create_unique_index(&self.collection, doc! { "id": 1 }).await?;
        create_unique_index(&self.collection, doc! { "title": 1 }).await
    }
}

#[async_trait]
impl CategoryRepository for MongoCategoryRepository {
    async fn create(&self, title: &str) -> Result<Category, AppError> {
        let category = Category {
            id: self.sequences.next("categories").await?,
            title: title.to_string(),
        };

        self.collection
            .insert_one(&category)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(category)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Category>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "title": title })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_title(&self, id: i64, title: &str) -> Result<Category, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .update_one(doc! { "id": id }, doc! { "$set": { "title": title } })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!("Category {id}")));
        }

        Ok(Category {
            id,
            title: title.to_string(),
        })
    }

    async fn list_all(&self) -> Result<Vec<Category>, AppError> {
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder().sort(doc! { "id": 1 }).build();
        let cursor = self
            .collection
            .find(doc! {})
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        collect_cursor(cursor).await
    }
}

/// MongoDB implementation of the ArticleRepository.
pub struct MongoArticleRepository {
    collection: mongodb::Collection<Article>,
    sequences: Sequences,
}

impl MongoArticleRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("articles"),
            sequences: Sequences::new(db),
        }
    }

    /// Create the unique index on `id`. Safe to call repeatedly.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::bson::doc;

        create_unique_index(&self.collection, doc! { "id": 1 }).await
    }

    async fn list(&self, filter: mongodb::bson::Document) -> Result<Vec<Article>, AppError> {
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder().sort(doc! { "id": 1 }).build();
        let cursor = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        collect_cursor(cursor).await
    }
}

#[async_trait]
impl ArticleRepository for MongoArticleRepository {
    async fn create(&self, title: &str, category_id: i64) -> Result<Article, AppError> {
        let article = Article {
            id: self.sequences.next("articles").await?,
            title: title.to_string(),
            category_id,
        };

        self.collection
            .insert_one(&article)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(article)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count_by_title_in_category(
        &self,
        title: &str,
        category_id: i64,
    ) -> Result<usize, AppError> {
        use mongodb::bson::doc;

        let count = self
            .collection
            .count_documents(doc! { "title": title, "category_id": category_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count as usize)
    }

    async fn update(&self, article: &Article) -> Result<(), AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .update_one(
                doc! { "id": article.id },
                doc! { "$set": { "title": &article.title, "category_id": article.category_id } },
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!("Article {}", article.id)));
        }

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<Option<Article>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one_and_delete(doc! { "id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Article>, AppError> {
        use mongodb::bson::doc;

        self.list(doc! { "category_id": category_id }).await
    }

    async fn list_all(&self) -> Result<Vec<Article>, AppError> {
        use mongodb::bson::doc;

        self.list(doc! {}).await
    }
}
