use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum BookCategory {
    #[serde(rename = "Fiction")]
    Fiction,
    #[serde(rename = "Non-Fiction")]
    NonFiction,
}

impl BookCategory {
    /// Every value the `type` field may carry, in validator order.
    pub const ALLOWED: &'static [&'static str] = &["Fiction", "Non-Fiction"];
}

impl std::fmt::Display for BookCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookCategory::Fiction => write!(f, "Fiction"),
            BookCategory::NonFiction => write!(f, "Non-Fiction"),
        }
    }
}

impl TryFrom<String> for BookCategory {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Fiction" => Ok(BookCategory::Fiction),
            "Non-Fiction" => Ok(BookCategory::NonFiction),
            _ => Err(format!("Invalid book category: {}", value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub authors: Vec<ObjectId>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub publish_date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub category: BookCategory,
    pub copies: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use chrono::TimeZone;

    #[test]
    fn category_round_trips_through_bson_with_hyphenated_name() {
        let book = Book {
            id: None,
            title: "Moby Dick".to_string(),
            authors: vec![ObjectId::new()],
            publish_date: Utc.with_ymd_and_hms(1851, 9, 24, 0, 0, 0).unwrap(),
            category: BookCategory::Fiction,
            copies: 5,
        };
        let doc = bson::to_document(&book).unwrap();
        assert_eq!(doc.get_str("type").unwrap(), "Fiction");
        assert!(doc.get("_id").is_none());

        let back: Book = bson::from_document(doc).unwrap();
        assert_eq!(back, book);
    }

    #[test]
    fn non_fiction_serializes_with_hyphen() {
        let doc = doc! { "category": bson::to_bson(&BookCategory::NonFiction).unwrap() };
        assert_eq!(doc.get_str("category").unwrap(), "Non-Fiction");
    }

    #[test]
    fn category_try_from_rejects_unknown_value() {
        assert_eq!(
            BookCategory::try_from("Fiction".to_string()).unwrap(),
            BookCategory::Fiction
        );
        assert_eq!(
            BookCategory::try_from("Non-Fiction".to_string()).unwrap(),
            BookCategory::NonFiction
        );
        assert!(BookCategory::try_from("Poetry".to_string()).is_err());
    }
}
