use anyhow::{Context, Result};
use bson::{doc, Bson, Document};
use tracing::{info, warn};

use crate::db::{Database, AUTHOR_COLLECTION, BOOK_COLLECTION};
use crate::errors::{is_collection_exists, ValidationError};
use crate::models::BookCategory;

/// Field constraints expressible by the catalog's validators.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Date,
    /// Non-empty array of ObjectId references.
    ObjectIdArray,
    Enum(&'static [&'static str]),
    Int { min: Option<i64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub ty: FieldType,
}

impl FieldSpec {
    fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            required: true,
            ty,
        }
    }

    /// The `properties` entry for this field in a `$jsonSchema` document.
    fn property(&self) -> Document {
        match &self.ty {
            FieldType::String => doc! {
                "bsonType": "string",
                "description": "must be a string and is required",
            },
            FieldType::Date => doc! {
                "bsonType": "date",
                "description": "must be a date and is required",
            },
            FieldType::ObjectIdArray => doc! {
                "bsonType": "array",
                "items": {
                    "bsonType": "objectId",
                    "description": "must be an objectid and is required",
                },
            },
            FieldType::Enum(values) => doc! {
                "enum": values.to_vec(),
                "description": "can only be one of the enum values and is required",
            },
            FieldType::Int { min } => {
                let mut property = doc! {
                    "bsonType": "int",
                    "description": "must be an integer and is required",
                };
                if let Some(min) = min {
                    property.insert("minimum", *min);
                }
                property
            }
        }
    }
}

/// Statically-defined constraints for one collection. The same spec drives
/// both the store-side validator and the in-process boundary checks, so the
/// two can never drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl CollectionSpec {
    pub fn author() -> Self {
        Self {
            name: AUTHOR_COLLECTION,
            fields: vec![
                FieldSpec::required("first_name", FieldType::String),
                FieldSpec::required("last_name", FieldType::String),
                FieldSpec::required("date_of_birth", FieldType::Date),
            ],
        }
    }

    pub fn book() -> Self {
        Self {
            name: BOOK_COLLECTION,
            fields: vec![
                FieldSpec::required("title", FieldType::String),
                FieldSpec::required("authors", FieldType::ObjectIdArray),
                FieldSpec::required("publish_date", FieldType::Date),
                FieldSpec::required("type", FieldType::Enum(BookCategory::ALLOWED)),
                FieldSpec::required("copies", FieldType::Int { min: Some(0) }),
            ],
        }
    }

    /// Renders the spec as the `$jsonSchema` validator attached to the
    /// collection. Deterministic: the same spec always produces the same
    /// document, so re-applying it converges.
    pub fn json_schema(&self) -> Document {
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name)
            .collect();

        let mut properties = Document::new();
        for field in &self.fields {
            properties.insert(field.name, field.property());
        }

        doc! {
            "$jsonSchema": {
                "bsonType": "object",
                "required": required,
                "properties": properties,
            }
        }
    }

    /// Boundary validation applied before any document is persisted.
    /// Unknown extra fields pass through, matching the validator's defaults.
    pub fn validate(&self, doc: &Document) -> Result<(), ValidationError> {
        for field in &self.fields {
            let value = match doc.get(field.name) {
                Some(value) => value,
                None if field.required => {
                    return Err(ValidationError::MissingField {
                        collection: self.name,
                        field: field.name,
                    })
                }
                None => continue,
            };

            match &field.ty {
                FieldType::String => {
                    if !matches!(value, Bson::String(_)) {
                        return Err(self.wrong_type(field, "string"));
                    }
                }
                FieldType::Date => {
                    if !matches!(value, Bson::DateTime(_)) {
                        return Err(self.wrong_type(field, "date"));
                    }
                }
                FieldType::ObjectIdArray => {
                    let items = match value {
                        Bson::Array(items) => items,
                        _ => return Err(self.wrong_type(field, "array of objectId")),
                    };
                    if items.is_empty() {
                        return Err(ValidationError::EmptyArray {
                            collection: self.name,
                            field: field.name,
                        });
                    }
                    if !items.iter().all(|item| matches!(item, Bson::ObjectId(_))) {
                        return Err(self.wrong_type(field, "array of objectId"));
                    }
                }
                FieldType::Enum(allowed) => {
                    let value = match value {
                        Bson::String(value) => value,
                        _ => return Err(self.wrong_type(field, "string")),
                    };
                    if !allowed.contains(&value.as_str()) {
                        return Err(ValidationError::InvalidEnumValue {
                            collection: self.name,
                            field: field.name,
                            allowed,
                            value: value.clone(),
                        });
                    }
                }
                FieldType::Int { min } => {
                    let value = match value {
                        Bson::Int32(value) => i64::from(*value),
                        Bson::Int64(value) => *value,
                        _ => return Err(self.wrong_type(field, "integer")),
                    };
                    if let Some(min) = min {
                        if value < *min {
                            return Err(ValidationError::BelowMinimum {
                                collection: self.name,
                                field: field.name,
                                min: *min,
                                value,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn wrong_type(&self, field: &FieldSpec, expected: &'static str) -> ValidationError {
        ValidationError::WrongType {
            collection: self.name,
            field: field.name,
            expected,
        }
    }
}

/// Idempotently ensures the collection exists and carries the spec's
/// validator. A pre-existing collection is not a failure: creation is
/// skipped and the validator is re-applied so repeated runs converge.
pub async fn ensure_collection(db: &Database, spec: &CollectionSpec) -> Result<()> {
    match db.inner().create_collection(spec.name).await {
        Ok(()) => info!("created collection '{}'", spec.name),
        Err(e) if is_collection_exists(&e) => {
            warn!("collection '{}' already exists, skipping creation", spec.name);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to create collection '{}'", spec.name))
        }
    }

    db.inner()
        .run_command(doc! {
            "collMod": spec.name,
            "validator": spec.json_schema(),
        })
        .await
        .with_context(|| format!("failed to apply validator to '{}'", spec.name))?;

    info!("validator applied to '{}'", spec.name);
    Ok(())
}
