use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::database::{Database, DatabaseError};
use crate::table::column_type::ColumnType;
use crate::table::query::{describe_table, is_valid_identifier};
use crate::types::Record;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("No {0} table found")]
    TableNotFound(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Malformed column description for table {table}: missing {field}")]
    MalformedColumn { table: String, field: &'static str },
}

/// One row of `information_schema.COLUMNS`, reduced to what the schema needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescription {
    pub name: String,
    pub column_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub key: String,
    pub extra: String,
}

impl ColumnDescription {
    fn from_record(table: &str, record: &Record) -> Result<Self, SchemaError> {
        let text = |field: &'static str| -> Result<String, SchemaError> {
            match record.get(field) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(Value::Null) | None => Err(SchemaError::MalformedColumn { table: table.to_string(), field }),
                Some(other) => Ok(other.to_string()),
            }
        };

        Ok(Self {
            name: text("column_name")?,
            column_type: text("column_type")?,
            nullable: text("is_nullable").map(|v| v.eq_ignore_ascii_case("YES")).unwrap_or(false),
            default: match record.get("column_default") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            },
            key: text("column_key").unwrap_or_default(),
            extra: text("extra").unwrap_or_default().to_ascii_lowercase(),
        })
    }

    /// Callers must supply this column on create: no default, not part of the
    /// primary key, and not filled in by the server.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
            && self.key != "PRI"
            && !self.extra.contains("auto_increment")
            && !self.extra.contains("generated")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub declared: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

/// Column name to declared type for every column a caller must supply.
/// Derived once at startup and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    table: String,
    fields: BTreeMap<String, SchemaField>,
    columns: Vec<String>,
}

impl TableSchema {
    /// Describe `table` against the live database.
    pub async fn derive(db: &dyn Database, table: &str) -> Result<TableSchema, SchemaError> {
        if !is_valid_identifier(table) {
            return Err(SchemaError::InvalidTableName(table.to_string()));
        }

        let rows = db.fetch_all(&describe_table(table)).await?;
        let columns = rows
            .iter()
            .map(|row| ColumnDescription::from_record(table, row))
            .collect::<Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(SchemaError::TableNotFound(table.to_string()));
        }
        Ok(Self::from_columns(table, columns))
    }

    pub fn from_columns(table: impl Into<String>, columns: Vec<ColumnDescription>) -> Self {
        let mut fields = BTreeMap::new();
        let mut names = Vec::with_capacity(columns.len());

        for column in columns {
            names.push(column.name.clone());
            if column.is_required() {
                fields.insert(
                    column.name,
                    SchemaField {
                        column_type: ColumnType::parse(&column.column_type),
                        declared: column.column_type,
                        nullable: column.nullable,
                    },
                );
            }
        }

        Self { table: table.into(), fields, columns: names }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn get(&self, field: &str) -> Option<&SchemaField> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &SchemaField)> {
        self.fields.iter()
    }

    /// Any physical column, required or not.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Serialized as `{ "column": "declared type" }`.
impl Serialize for TableSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, field) in &self.fields {
            map.serialize_entry(name, &field.declared)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{describe_rows, MockDatabase, MockReply};
    use serde_json::json;

    fn column(name: &str, ty: &str, default: Option<&str>, key: &str, extra: &str) -> ColumnDescription {
        ColumnDescription {
            name: name.to_string(),
            column_type: ty.to_string(),
            nullable: false,
            default: default.map(str::to_string),
            key: key.to_string(),
            extra: extra.to_string(),
        }
    }

    #[test]
    fn keeps_only_required_columns() {
        let schema = TableSchema::from_columns(
            "users",
            vec![
                column("id", "int(11)", None, "PRI", "auto_increment"),
                column("email", "varchar(255)", None, "UNI", ""),
                column("first_name", "varchar(50)", None, "", ""),
                column("active", "tinyint(1)", Some("1"), "", ""),
                column("created_at", "timestamp", Some("CURRENT_TIMESTAMP"), "", "default_generated"),
                column("full_name", "varchar(101)", None, "", "virtual generated"),
            ],
        );

        let names: Vec<&String> = schema.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["email", "first_name"]);
        assert_eq!(schema.get("email").unwrap().declared, "varchar(255)");
        assert!(schema.has_column("created_at"));
        assert!(!schema.contains("created_at"));
        assert_eq!(serde_json::to_value(&schema).unwrap(), json!({"email": "varchar(255)", "first_name": "varchar(50)"}));
    }

    #[tokio::test]
    async fn derive_reads_information_schema() {
        let db = MockDatabase::new(vec![MockReply::Rows(describe_rows(&[
            ("id", "int(11)", None, "PRI", "auto_increment", false),
            ("email", "varchar(255)", None, "", "", false),
            ("nickname", "varchar(30)", None, "", "", true),
        ]))]);

        let schema = TableSchema::derive(&db, "users").await.unwrap();
        assert_eq!(schema.len(), 2);
        assert!(schema.get("nickname").unwrap().nullable);

        let calls = db.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].sql.contains("information_schema.COLUMNS"));
        assert_eq!(calls[0].params, vec![json!("users")]);
    }

    #[tokio::test]
    async fn derive_surfaces_missing_tables_and_errors() {
        let db = MockDatabase::new(vec![MockReply::Rows(vec![])]);
        assert!(matches!(TableSchema::derive(&db, "ghosts").await, Err(SchemaError::TableNotFound(t)) if t == "ghosts"));

        let db = MockDatabase::new(vec![MockReply::Error("connection refused".into())]);
        assert!(matches!(TableSchema::derive(&db, "users").await, Err(SchemaError::Database(_))));

        let db = MockDatabase::new(vec![]);
        assert!(matches!(TableSchema::derive(&db, "users; DROP").await, Err(SchemaError::InvalidTableName(_))));
        assert!(db.calls().is_empty());
    }
}
