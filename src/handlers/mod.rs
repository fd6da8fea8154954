pub mod root;
pub mod table;

pub use root::AppState;
pub use table::TableContext;
