use std::sync::atomic::{AtomicI64, Ordering};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::{hash_password_blocking, password_text, PASSWORD_FIELD};
use crate::config::{AppConfig, DEFAULT_PAGE_SIZE};
use crate::database::{Database, DatabaseError};
use crate::filter::{ColumnFilter, FieldUpdate, OrderSpec};
use crate::table::error::TableError;
use crate::table::query::{is_valid_identifier, QueryBuilder};
use crate::table::schema::TableSchema;
use crate::table::validate::{validate_record, validate_updates};
use crate::types::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    pub page_size: u32,
    pub bcrypt_cost: u32,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, bcrypt_cost: bcrypt::DEFAULT_COST }
    }
}

impl TableOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { page_size: config.api.page_size, bcrypt_cost: config.security.bcrypt_cost }
    }
}

/// One page of rows plus the table's cached record count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub rows: Vec<Record>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    pub id: u64,
    pub affected: u64,
}

/// Generic CRUD over one table. Built once at startup by [`TableInterface::initialize`]
/// and shared read-only afterwards, apart from the cached record count.
#[derive(Debug)]
pub struct TableInterface {
    name: String,
    schema: TableSchema,
    num_records: AtomicI64,
    options: TableOptions,
}

impl TableInterface {
    /// Derive the schema and seed the cached count.
    pub async fn initialize(
        db: &dyn Database,
        name: impl Into<String>,
        options: TableOptions,
    ) -> Result<Self, TableError> {
        let name = name.into();
        if !is_valid_identifier(&name) {
            return Err(TableError::InvalidIdentifier(name));
        }

        let schema = TableSchema::derive(db, &name).await?;
        let table = Self { name, schema, num_records: AtomicI64::new(0), options };
        let count = table.count(db).await?;

        info!(table = %table.name, fields = table.schema.len(), records = count, "table initialized");
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Cached count. Adjusted by create/delete, refreshed by [`TableInterface::count`].
    pub fn record_count(&self) -> i64 {
        self.num_records.load(Ordering::Relaxed)
    }

    fn queries(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.schema, self.options.page_size)
    }

    /// Run `COUNT(*)` and refresh the cache.
    pub async fn count(&self, db: &dyn Database) -> Result<i64, TableError> {
        let rows = db.fetch_all(&self.queries().count()).await?;
        let count = rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(|v| match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .ok_or_else(|| DatabaseError::QueryError(format!("COUNT(*) on {} returned no value", self.name)))?;

        self.num_records.store(count, Ordering::Relaxed);
        Ok(count)
    }

    pub async fn get_records(&self, db: &dyn Database, page: i64) -> Result<Page, TableError> {
        let rows = db.fetch_all(&self.queries().list(page)).await?;
        Ok(self.page(rows))
    }

    /// First page, schema and count together. Refreshes the count.
    pub async fn get_data(&self, db: &dyn Database) -> Result<(Vec<Record>, i64), TableError> {
        let total = self.count(db).await?;
        let rows = db.fetch_all(&self.queries().first_page()).await?;
        Ok((rows, total))
    }

    pub async fn get_ordered_records(
        &self,
        db: &dyn Database,
        orders: &[OrderSpec],
        page: i64,
    ) -> Result<Page, TableError> {
        let query = self.queries().list_ordered(orders, page)?;
        let rows = db.fetch_all(&query).await?;
        Ok(self.page(rows))
    }

    pub async fn get_records_by_query(
        &self,
        db: &dyn Database,
        filter: &ColumnFilter,
        page: i64,
    ) -> Result<Page, TableError> {
        let query = self.queries().list_filtered(filter, page)?;
        let rows = db.fetch_all(&query).await?;
        Ok(self.page(rows))
    }

    pub async fn get_all_records(&self, db: &dyn Database) -> Result<Vec<Record>, TableError> {
        Ok(db.fetch_all(&self.queries().select_all()).await?)
    }

    /// Rows whose `id` equals `id`. An empty result is not found.
    pub async fn get_record_by_id(&self, db: &dyn Database, id: &str) -> Result<Vec<Record>, TableError> {
        let rows = db.fetch_all(&self.queries().get_by_id(id)).await?;
        if rows.is_empty() {
            return Err(TableError::NotFound(format!("No record found by id {}", id)));
        }
        Ok(rows)
    }

    /// Paginated id lookup. An empty page is a successful empty result.
    pub async fn find_records_by_id(&self, db: &dyn Database, id: &str, page: i64) -> Result<Page, TableError> {
        let rows = db.fetch_all(&self.queries().find_by_id(id, page)).await?;
        Ok(self.page(rows))
    }

    /// Validate, hash any password, insert. Nothing is sent to the database
    /// when validation fails.
    pub async fn create_record(&self, db: &dyn Database, mut record: Record) -> Result<Created, TableError> {
        let errors = validate_record(&self.schema, &record);
        if !errors.is_empty() {
            return Err(TableError::Validation(errors));
        }

        if let Some(password) = record.get_mut(PASSWORD_FIELD) {
            self.seal_password(password).await?;
        }

        let result = db.execute(&self.queries().insert(&record)?).await?;
        if result.rows_affected == 0 {
            return Err(DatabaseError::QueryError(format!("Failed to create record in {}", self.name)).into());
        }

        self.num_records.fetch_add(result.rows_affected as i64, Ordering::Relaxed);
        debug!(table = %self.name, id = result.last_insert_id, "record created");
        Ok(Created { id: result.last_insert_id, affected: result.rows_affected })
    }

    /// Returns the number of affected rows; zero means no such id. Password
    /// updates are hashed like inserts.
    pub async fn update_record(
        &self,
        db: &dyn Database,
        id: &str,
        updates: &[FieldUpdate],
    ) -> Result<u64, TableError> {
        let errors = validate_updates(&self.schema, updates);
        if !errors.is_empty() {
            return Err(TableError::Validation(errors));
        }

        let mut updates = updates.to_vec();
        for update in updates.iter_mut().filter(|u| u.field == PASSWORD_FIELD) {
            self.seal_password(&mut update.value).await?;
        }

        let result = db.execute(&self.queries().update(&updates, id)?).await?;
        if result.rows_affected == 0 {
            return Err(TableError::NotFound(format!("Unable to update record with id {}", id)));
        }

        debug!(table = %self.name, id, affected = result.rows_affected, "record updated");
        Ok(result.rows_affected)
    }

    pub async fn delete_record(&self, db: &dyn Database, id: &str) -> Result<u64, TableError> {
        let result = db.execute(&self.queries().delete(id)).await?;
        if result.rows_affected == 0 {
            return Err(TableError::NotFound(format!("Unable to delete record with id {}", id)));
        }

        self.num_records.fetch_sub(result.rows_affected as i64, Ordering::Relaxed);
        debug!(table = %self.name, id, affected = result.rows_affected, "record deleted");
        Ok(result.rows_affected)
    }

    /// Replace a scalar password with its bcrypt hash in place. Null is left alone.
    async fn seal_password(&self, value: &mut Value) -> Result<(), TableError> {
        if let Some(plaintext) = password_text(value) {
            *value = Value::String(hash_password_blocking(plaintext, self.options.bcrypt_cost).await?);
        }
        Ok(())
    }

    fn page(&self, rows: Vec<Record>) -> Page {
        Page { rows, total: self.record_count() }
    }
}
