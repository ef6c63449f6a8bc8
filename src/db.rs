use anyhow::{Context, Result};
use bson::doc;
use futures_util::TryStreamExt;
use mongodb::{Client, Collection};

use crate::config::Config;
use crate::models::{Author, Book};

pub const AUTHOR_COLLECTION: &str = "author";
pub const BOOK_COLLECTION: &str = "book";

#[derive(Clone)]
pub struct Database {
    client: Client,
    db: mongodb::Database,
}

impl Database {
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = Client::with_uri_str(&config.connection_uri)
            .await
            .context("invalid MongoDB connection URI")?;
        let db = client.database(&config.database);

        // Fail fast on unreachable hosts or bad credentials instead of on
        // the first real operation.
        db.run_command(doc! { "ping": 1 })
            .await
            .context("could not reach MongoDB")?;

        Ok(Self { client, db })
    }

    pub fn inner(&self) -> &mongodb::Database {
        &self.db
    }

    pub fn authors(&self) -> Collection<Author> {
        self.db.collection(AUTHOR_COLLECTION)
    }

    pub fn books(&self) -> Collection<Book> {
        self.db.collection(BOOK_COLLECTION)
    }

    pub async fn list_database_names(&self) -> Result<Vec<String>> {
        Ok(self.client.list_database_names().await?)
    }

    /// Every author document, materialized in natural order. Feeds the
    /// tabular export adapter.
    pub async fn all_authors(&self) -> Result<Vec<Author>> {
        let cursor = self.authors().find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }
}
