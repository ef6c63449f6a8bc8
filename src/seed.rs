use std::collections::HashMap;

use anyhow::{Context, Result};
use bson::oid::ObjectId;
use chrono::{DateTime, TimeZone, Utc};
use tracing::info;

use crate::db::Database;
use crate::errors::SeedError;
use crate::models::{Author, Book, BookCategory, CreateAuthor};
use crate::schema::CollectionSpec;

/// One author in a seed plan, addressable by alias from the book entries.
#[derive(Debug, Clone)]
pub struct SeedAuthor {
    pub key: String,
    pub author: CreateAuthor,
}

/// One book in a seed plan. Authors are referenced by alias, never by
/// position, so reordering the author list cannot silently rewire a book.
#[derive(Debug, Clone)]
pub struct SeedBook {
    pub title: String,
    pub author_keys: Vec<String>,
    pub publish_date: DateTime<Utc>,
    pub category: BookCategory,
    pub copies: i32,
}

#[derive(Debug, Clone)]
pub struct SeedData {
    pub authors: Vec<SeedAuthor>,
    pub books: Vec<SeedBook>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedSummary {
    pub authors_inserted: usize,
    pub books_inserted: usize,
}

impl SeedData {
    /// The fixed sample catalog: four authors, four books, one author each.
    pub fn sample() -> Self {
        fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
                .single()
                .expect("sample dates are valid")
        }

        let authors = vec![
            SeedAuthor {
                key: "calbo".to_string(),
                author: CreateAuthor {
                    first_name: "Igor".to_string(),
                    last_name: "Calbo".to_string(),
                    date_of_birth: date(1998, 11, 10),
                },
            },
            SeedAuthor {
                key: "orwell".to_string(),
                author: CreateAuthor {
                    first_name: "George".to_string(),
                    last_name: "Orwell".to_string(),
                    date_of_birth: date(1903, 6, 25),
                },
            },
            SeedAuthor {
                key: "melville".to_string(),
                author: CreateAuthor {
                    first_name: "Herman".to_string(),
                    last_name: "Melville".to_string(),
                    date_of_birth: date(1819, 8, 1),
                },
            },
            SeedAuthor {
                key: "fitzgerald".to_string(),
                author: CreateAuthor {
                    first_name: "F. Scott".to_string(),
                    last_name: "Fitzgerald".to_string(),
                    date_of_birth: date(1896, 9, 24),
                },
            },
        ];

        let books = vec![
            SeedBook {
                title: "MongoDB Advanced Tutorial".to_string(),
                author_keys: vec!["calbo".to_string()],
                publish_date: Utc::now(),
                category: BookCategory::NonFiction,
                copies: 5,
            },
            SeedBook {
                title: "Python for Dummies".to_string(),
                author_keys: vec!["orwell".to_string()],
                publish_date: date(2022, 1, 17),
                category: BookCategory::NonFiction,
                copies: 5,
            },
            SeedBook {
                title: "The Great Gatsby".to_string(),
                author_keys: vec!["fitzgerald".to_string()],
                publish_date: date(2014, 5, 23),
                category: BookCategory::Fiction,
                copies: 5,
            },
            SeedBook {
                title: "Moby Dick".to_string(),
                author_keys: vec!["melville".to_string()],
                publish_date: date(1851, 9, 24),
                category: BookCategory::Fiction,
                copies: 5,
            },
        ];

        Self { authors, books }
    }
}

/// Resolves book entries against the alias map produced by the author
/// insert. An alias that never went through that insert is fatal, so a book
/// can only ever reference identifiers generated in the same run.
pub fn resolve_books(
    books: &[SeedBook],
    ids: &HashMap<String, ObjectId>,
) -> Result<Vec<Book>, SeedError> {
    books
        .iter()
        .map(|entry| {
            let authors = entry
                .author_keys
                .iter()
                .map(|key| {
                    ids.get(key).copied().ok_or_else(|| SeedError::UnknownAuthorAlias {
                        title: entry.title.clone(),
                        alias: key.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Book {
                id: None,
                title: entry.title.clone(),
                authors,
                publish_date: entry.publish_date,
                category: entry.category,
                copies: entry.copies,
            })
        })
        .collect()
}

/// Inserts the whole plan: authors first, then books referencing the
/// generated author identifiers. All-or-nothing; any failure aborts the
/// seed and propagates.
pub async fn seed(db: &Database, data: SeedData) -> Result<SeedSummary> {
    if data.authors.is_empty() {
        return Err(SeedError::NoAuthors.into());
    }

    let author_spec = CollectionSpec::author();
    let book_spec = CollectionSpec::book();

    let mut author_docs = Vec::with_capacity(data.authors.len());
    for entry in &data.authors {
        let author = Author::from(entry.author.clone());
        author_spec.validate(&bson::to_document(&author)?)?;
        author_docs.push(author);
    }

    let inserted = db
        .authors()
        .insert_many(&author_docs)
        .await
        .context("author bulk insert failed")?;

    let mut ids: HashMap<String, ObjectId> = HashMap::with_capacity(data.authors.len());
    for (index, entry) in data.authors.iter().enumerate() {
        let id = inserted
            .inserted_ids
            .get(&index)
            .and_then(|id| id.as_object_id())
            .ok_or(SeedError::MissingInsertedId { index })?;
        ids.insert(entry.key.clone(), id);
    }
    info!("seeded {} authors", ids.len());

    let book_docs = resolve_books(&data.books, &ids)?;
    for book in &book_docs {
        book_spec.validate(&bson::to_document(book)?)?;
    }

    db.books()
        .insert_many(&book_docs)
        .await
        .context("book bulk insert failed")?;
    info!("seeded {} books", book_docs.len());

    Ok(SeedSummary {
        authors_inserted: author_docs.len(),
        books_inserted: book_docs.len(),
    })
}
