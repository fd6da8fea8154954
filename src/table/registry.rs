use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::database::Database;
use crate::table::error::TableError;
use crate::table::interface::{TableInterface, TableOptions};
use crate::table::query::{is_valid_identifier, list_tables};

/// Every exposed table, keyed by name. Read-only once built.
#[derive(Debug, Default, Clone)]
pub struct TableRegistry {
    tables: BTreeMap<String, Arc<TableInterface>>,
}

impl TableRegistry {
    /// List the database's base tables and initialize an interface for each.
    ///
    /// With an allow-list only those tables are exposed. A table that fails to
    /// initialize is logged and skipped; failing to list tables at all is fatal.
    pub async fn discover(
        db: &dyn Database,
        options: TableOptions,
        only: Option<&[String]>,
    ) -> Result<Self, TableError> {
        let names: Vec<String> = db
            .fetch_all(&list_tables())
            .await?
            .iter()
            .filter_map(|row| match row.get("table_name") {
                Some(Value::String(name)) => Some(name.clone()),
                _ => None,
            })
            .collect();

        if let Some(only) = only {
            for wanted in only.iter().filter(|w| !names.contains(*w)) {
                warn!(table = %wanted, "configured table not found in database");
            }
        }

        let mut registry = Self::default();
        for name in names {
            if let Some(only) = only {
                if !only.contains(&name) {
                    continue;
                }
            }
            if !is_valid_identifier(&name) {
                warn!(table = %name, "skipping table with unsupported name");
                continue;
            }

            match TableInterface::initialize(db, name.clone(), options).await {
                Ok(table) => registry.insert(table),
                Err(e) => error!(table = %name, error = %e, "skipping table that failed to initialize"),
            }
        }

        info!("Exposing {} table(s): {}", registry.len(), registry.names().join(", "));
        Ok(registry)
    }

    pub fn insert(&mut self, table: TableInterface) {
        self.tables.insert(table.name().to_string(), Arc::new(table));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TableInterface>> {
        self.tables.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TableInterface>> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
