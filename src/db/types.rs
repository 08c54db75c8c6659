//! Database-agnostic value mappings.
//!
//! Rows from every backend are converted into ordered `serde_json::Value`s.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Backend-specific decoders handle the actual value extraction
//!
//! PostgreSQL and MySQL statements without bind parameters run over the text
//! protocol, so their values are read as text and converted by category.
//! SQLite values are decoded by their runtime storage class, because computed
//! columns (`COUNT(*)`, `SUM(..)`) carry no declared type.

use crate::config::BackendKind;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Unknown,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, backend: BackendKind) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC is actually a float
        if backend == BackendKind::Sqlite {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    if lower.contains("int")
        || lower.contains("serial")
        || lower.contains("tiny")
        || lower == "long"
        || lower == "short"
        || lower == "byte"
    {
        return TypeCategory::Integer;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("float")
        || lower.contains("double")
        || lower == "real"
        || lower == "float4"
        || lower == "float8"
    {
        return TypeCategory::Float;
    }

    if lower == "json" || lower == "jsonb" {
        return TypeCategory::Json;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    if lower.contains("char") || lower == "text" || lower == "string" {
        return TypeCategory::Text;
    }

    // Dates, times, uuids and anything else render as text
    TypeCategory::Unknown
}

/// Convert a textual value into JSON according to its category.
///
/// Decimals stay strings to preserve the exact database representation.
pub fn text_to_json(text: &str, category: TypeCategory) -> JsonValue {
    match category {
        TypeCategory::Integer => text
            .trim()
            .parse::<i64>()
            .map(|v| JsonValue::Number(v.into()))
            .unwrap_or_else(|_| JsonValue::String(text.to_string())),
        TypeCategory::Float => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(text.to_string())),
        TypeCategory::Boolean => match text.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "1" => JsonValue::Bool(true),
            "f" | "false" | "0" => JsonValue::Bool(false),
            _ => JsonValue::String(text.to_string()),
        },
        TypeCategory::Json => serde_json::from_str(text)
            .unwrap_or_else(|_| JsonValue::String(text.to_string())),
        _ => JsonValue::String(text.to_string()),
    }
}

/// Encode binary data as a base64 JSON string.
pub fn encode_binary(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    JsonValue::String(STANDARD.encode(bytes))
}

// =============================================================================
// Raw Text Support
// =============================================================================

/// Wrapper reading any text-protocol value as its raw string.
#[derive(Debug)]
pub struct RawText(pub String);

impl Type<sqlx::MySql> for RawText {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(_ty: &MySqlTypeInfo) -> bool {
        true
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawText {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawText(s.to_string()))
    }
}

impl Type<sqlx::Postgres> for RawText {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(_ty: &PgTypeInfo) -> bool {
        true
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawText {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::Postgres>>::decode(value)?;
        Ok(RawText(s.to_string()))
    }
}

// =============================================================================
// Row Conversion
// =============================================================================

/// Conversion of a driver row into ordered column names and values.
pub trait RowValues {
    fn column_names(&self) -> Vec<String>;
    fn values(&self) -> Vec<JsonValue>;
}

impl RowValues for SqliteRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn values(&self) -> Vec<JsonValue> {
        (0..self.len()).map(|idx| sqlite::decode(self, idx)).collect()
    }
}

impl RowValues for PgRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn values(&self) -> Vec<JsonValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name(), BackendKind::Postgres);
                postgres::decode(self, idx, category)
            })
            .collect()
    }
}

impl RowValues for MySqlRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn values(&self) -> Vec<JsonValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name(), BackendKind::Mysql);
                mysql::decode(self, idx, category)
            })
            .collect()
    }
}

// =============================================================================
// Backend-Specific Decoders
// =============================================================================

mod sqlite {
    use super::*;

    pub fn decode(row: &SqliteRow, idx: usize) -> JsonValue {
        let storage_class = match row.try_get_raw(idx) {
            Ok(raw) if raw.is_null() => return JsonValue::Null,
            Ok(raw) => {
                let name = raw.type_info().name().to_string();
                name
            }
            Err(e) => {
                tracing::error!("Failed to read SQLite column {}: {:?}", idx, e);
                return JsonValue::Null;
            }
        };

        match categorize_type(&storage_class, BackendKind::Sqlite) {
            TypeCategory::Integer => row
                .try_get::<i64, _>(idx)
                .map(|v| JsonValue::Number(v.into()))
                .unwrap_or(JsonValue::Null),
            TypeCategory::Float | TypeCategory::Decimal => row
                .try_get::<f64, _>(idx)
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            TypeCategory::Binary => row
                .try_get::<Vec<u8>, _>(idx)
                .map(|v| encode_binary(&v))
                .unwrap_or(JsonValue::Null),
            _ => row
                .try_get::<String, _>(idx)
                .map(JsonValue::String)
                .unwrap_or(JsonValue::Null),
        }
    }
}

mod postgres {
    use super::*;

    pub fn decode(row: &PgRow, idx: usize, category: TypeCategory) -> JsonValue {
        if category == TypeCategory::Binary {
            return row
                .try_get::<Option<Vec<u8>>, _>(idx)
                .ok()
                .flatten()
                .map(|v| encode_binary(&v))
                .unwrap_or(JsonValue::Null);
        }
        match row.try_get::<Option<RawText>, _>(idx) {
            Ok(Some(v)) => text_to_json(&v.0, category),
            Ok(None) => JsonValue::Null,
            Err(e) => {
                tracing::error!("Failed to decode PostgreSQL column {}: {:?}", idx, e);
                JsonValue::Null
            }
        }
    }
}

mod mysql {
    use super::*;

    pub fn decode(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
        if category == TypeCategory::Binary {
            return row
                .try_get::<Option<Vec<u8>>, _>(idx)
                .ok()
                .flatten()
                .map(|v| encode_binary(&v))
                .unwrap_or(JsonValue::Null);
        }
        match row.try_get::<Option<RawText>, _>(idx) {
            Ok(Some(v)) => text_to_json(&v.0, category),
            Ok(None) => JsonValue::Null,
            Err(e) => {
                tracing::error!("Failed to decode MySQL column {}: {:?}", idx, e);
                JsonValue::Null
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(
            categorize_type("INT", BackendKind::Mysql),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("INT8", BackendKind::Postgres),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("INTEGER", BackendKind::Sqlite),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("LONG", BackendKind::Databricks),
            TypeCategory::Integer
        );
    }

    #[test]
    fn test_categorize_type_decimal() {
        assert_eq!(
            categorize_type("DECIMAL", BackendKind::Mysql),
            TypeCategory::Decimal
        );
        assert_eq!(
            categorize_type("NUMERIC", BackendKind::Postgres),
            TypeCategory::Decimal
        );
        // SQLite NUMERIC is a float
        assert_eq!(
            categorize_type("DECIMAL(10,2)", BackendKind::Sqlite),
            TypeCategory::Float
        );
    }

    #[test]
    fn test_categorize_type_text_and_unknown() {
        assert_eq!(
            categorize_type("VARCHAR", BackendKind::Mysql),
            TypeCategory::Text
        );
        assert_eq!(
            categorize_type("STRING", BackendKind::Databricks),
            TypeCategory::Text
        );
        assert_eq!(
            categorize_type("DATE", BackendKind::Postgres),
            TypeCategory::Unknown
        );
    }

    #[test]
    fn test_text_to_json_by_category() {
        assert_eq!(text_to_json("42", TypeCategory::Integer), json!(42));
        assert_eq!(text_to_json("2.5", TypeCategory::Float), json!(2.5));
        assert_eq!(text_to_json("t", TypeCategory::Boolean), json!(true));
        assert_eq!(text_to_json("false", TypeCategory::Boolean), json!(false));
        assert_eq!(
            text_to_json("1200.00", TypeCategory::Decimal),
            json!("1200.00")
        );
        assert_eq!(
            text_to_json("{\"a\":1}", TypeCategory::Json),
            json!({"a": 1})
        );
        assert_eq!(
            text_to_json("2024-01-15", TypeCategory::Unknown),
            json!("2024-01-15")
        );
    }

    #[test]
    fn test_text_to_json_unparseable_number_stays_text() {
        assert_eq!(text_to_json("n/a", TypeCategory::Integer), json!("n/a"));
        assert_eq!(text_to_json("NaN", TypeCategory::Float), json!("NaN"));
    }

    #[test]
    fn test_encode_binary() {
        assert_eq!(encode_binary(b"hello world"), json!("aGVsbG8gd29ybGQ="));
        assert_eq!(encode_binary(&[]), json!(""));
    }
}
