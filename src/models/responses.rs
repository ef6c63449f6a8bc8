use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Author, Book, BookCategory};

/// One author with every book whose `authors` array references them.
/// Authors with no books carry an empty list, never a missing field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorWithBooks {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date_of_birth: DateTime<Utc>,
    pub books: Vec<Book>,
}

/// Projection of the count pipeline: identifier suppressed, book list
/// collapsed to its size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorBookCount {
    pub first_name: String,
    pub last_name: String,
    pub total_books: i64,
}

/// Raw shape coming back from the book-side lookup, before any age
/// derivation happens client-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookAuthorJoin {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub authors: Vec<Author>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub publish_date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub category: BookCategory,
    pub copies: i32,
}

/// Joined author reduced to name and computed age in whole years.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorAgeView {
    pub age: i64,
    pub first_name: String,
    pub last_name: String,
}

/// Final row of the age-bounded query. The top-level `age` mirrors the sort
/// key of the original pipeline; nothing ever populates it, since ages only
/// exist nested under `authors`. Kept as-is pending a decision on the
/// intended ordering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookWithAuthorAges {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub authors: Vec<AuthorAgeView>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub publish_date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub category: BookCategory,
    pub copies: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}
