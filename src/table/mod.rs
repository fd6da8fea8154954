pub mod column_type;
pub mod error;
pub mod interface;
pub mod query;
pub mod registry;
pub mod schema;
pub mod validate;

pub use column_type::ColumnType;
pub use error::TableError;
pub use interface::{Created, Page, TableInterface, TableOptions};
pub use registry::TableRegistry;
pub use schema::{SchemaError, TableSchema};
pub use validate::ValidationError;
