use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date_of_birth: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuthor {
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date_of_birth: DateTime<Utc>,
}

impl From<CreateAuthor> for Author {
    fn from(author: CreateAuthor) -> Self {
        Self {
            id: None,
            first_name: author.first_name,
            last_name: author.last_name,
            date_of_birth: author.date_of_birth,
        }
    }
}
