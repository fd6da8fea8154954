use serde_json::Value;

use crate::database::SqlQuery;
use crate::filter::{ColumnFilter, FieldUpdate, FilterError, OrderSpec};
use crate::table::error::TableError;
use crate::table::schema::TableSchema;
use crate::types::Record;

/// Columns clients may always order or filter by, whether or not they are
/// required fields.
pub const FIXED_ORDER_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// Zero-based page; negative pages clamp to the first.
    pub fn for_page(page: i64, page_size: u32) -> Self {
        let limit = i64::from(page_size);
        Self { limit, offset: page.max(0).saturating_mul(limit) }
    }

    fn params(&self) -> [Value; 2] {
        [Value::from(self.limit), Value::from(self.offset)]
    }
}

/// Backtick-quote an identifier, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Table names: ASCII alphanumerics and underscores, not starting with a digit.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 64 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Path ids bind verbatim as strings. MySQL converts a string to the key's type
/// when the column is numeric, whereas a numeric bind against a character key
/// would compare every row numerically (`'abc' = 0`).
pub fn id_param(id: &str) -> Value {
    Value::String(id.to_string())
}

pub fn describe_table(table: &str) -> SqlQuery {
    SqlQuery::with_params(
        "SELECT COLUMN_NAME AS column_name, COLUMN_TYPE AS column_type, IS_NULLABLE AS is_nullable, \
         COLUMN_DEFAULT AS column_default, COLUMN_KEY AS column_key, EXTRA AS extra \
         FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
         ORDER BY ORDINAL_POSITION",
        vec![Value::from(table)],
    )
}

pub fn list_tables() -> SqlQuery {
    SqlQuery::new(
        "SELECT TABLE_NAME AS table_name FROM information_schema.TABLES \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE' \
         ORDER BY TABLE_NAME",
    )
}

/// Builds the fixed statement shapes for one table. Identifiers come from the
/// schema and are quoted; every value is a bound parameter.
pub struct QueryBuilder<'a> {
    schema: &'a TableSchema,
    table: String,
    page_size: u32,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(schema: &'a TableSchema, page_size: u32) -> Self {
        Self { table: quote_identifier(schema.table()), schema, page_size }
    }

    fn page(&self, page: i64) -> Pagination {
        Pagination::for_page(page, self.page_size)
    }

    pub fn list(&self, page: i64) -> SqlQuery {
        SqlQuery::with_params(
            format!("SELECT * FROM {} LIMIT ? OFFSET ?", self.table),
            self.page(page).params().to_vec(),
        )
    }

    pub fn first_page(&self) -> SqlQuery {
        SqlQuery::with_params(
            format!("SELECT * FROM {} LIMIT ?", self.table),
            vec![Value::from(self.page_size)],
        )
    }

    pub fn list_ordered(&self, orders: &[OrderSpec], page: i64) -> Result<SqlQuery, TableError> {
        let mut terms = Vec::with_capacity(orders.len());
        for order in orders {
            if !self.is_orderable(&order.field) {
                return Err(TableError::OrderField {
                    field: order.field.clone(),
                    table: self.schema.table().to_string(),
                });
            }
            let mut term = quote_identifier(&order.field);
            if let Some(direction) = order.direction() {
                term.push(' ');
                term.push_str(direction.to_sql());
            }
            terms.push(term);
        }

        if terms.is_empty() {
            return Err(TableError::Filter(FilterError::EmptyOrder));
        }

        Ok(SqlQuery::with_params(
            format!("SELECT * FROM {} ORDER BY {} LIMIT ? OFFSET ?", self.table, terms.join(", ")),
            self.page(page).params().to_vec(),
        ))
    }

    pub fn list_filtered(&self, filter: &ColumnFilter, page: i64) -> Result<SqlQuery, TableError> {
        if !self.is_orderable(&filter.column) {
            return Err(TableError::OrderField {
                field: filter.column.clone(),
                table: self.schema.table().to_string(),
            });
        }

        let recency = if self.schema.has_column("created_at") {
            format!(" ORDER BY {} DESC", quote_identifier("created_at"))
        } else {
            String::new()
        };

        let mut params = vec![filter.value.clone()];
        params.extend(self.page(page).params());
        Ok(SqlQuery::with_params(
            format!(
                "SELECT * FROM {} WHERE {} = ?{} LIMIT ? OFFSET ?",
                self.table,
                quote_identifier(&filter.column),
                recency
            ),
            params,
        ))
    }

    pub fn get_by_id(&self, id: &str) -> SqlQuery {
        SqlQuery::with_params(format!("SELECT * FROM {} WHERE `id` = ? LIMIT 1", self.table), vec![id_param(id)])
    }

    pub fn find_by_id(&self, id: &str, page: i64) -> SqlQuery {
        let mut params = vec![id_param(id)];
        params.extend(self.page(page).params());
        SqlQuery::with_params(format!("SELECT * FROM {} WHERE `id` = ? LIMIT ? OFFSET ?", self.table), params)
    }

    pub fn select_all(&self) -> SqlQuery {
        SqlQuery::new(format!("SELECT * FROM {}", self.table))
    }

    pub fn count(&self) -> SqlQuery {
        SqlQuery::new(format!("SELECT COUNT(*) AS count FROM {}", self.table))
    }

    pub fn insert(&self, record: &Record) -> Result<SqlQuery, TableError> {
        let mut columns = Vec::with_capacity(record.len());
        let mut params = Vec::with_capacity(record.len());
        for (name, value) in record {
            if !self.schema.contains(name) {
                return Err(TableError::UnknownColumn { column: name.clone(), table: self.schema.table().to_string() });
            }
            columns.push(quote_identifier(name));
            params.push(value.clone());
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        Ok(SqlQuery::with_params(
            format!("INSERT INTO {} ({}) VALUES ({})", self.table, columns.join(", "), placeholders),
            params,
        ))
    }

    pub fn update(&self, updates: &[FieldUpdate], id: &str) -> Result<SqlQuery, TableError> {
        let mut assignments = Vec::with_capacity(updates.len());
        let mut params = Vec::with_capacity(updates.len() + 1);
        for update in updates {
            if !self.schema.contains(&update.field) {
                return Err(TableError::UnknownColumn {
                    column: update.field.clone(),
                    table: self.schema.table().to_string(),
                });
            }
            assignments.push(format!("{} = ?", quote_identifier(&update.field)));
            params.push(update.value.clone());
        }
        params.push(id_param(id));

        Ok(SqlQuery::with_params(
            format!("UPDATE {} SET {} WHERE `id` = ?", self.table, assignments.join(", ")),
            params,
        ))
    }

    pub fn delete(&self, id: &str) -> SqlQuery {
        SqlQuery::with_params(format!("DELETE FROM {} WHERE `id` = ?", self.table), vec![id_param(id)])
    }

    fn is_orderable(&self, field: &str) -> bool {
        self.schema.contains(field) || FIXED_ORDER_COLUMNS.contains(&field)
    }
}
