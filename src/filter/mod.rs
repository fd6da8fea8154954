pub mod error;
pub mod order;
pub mod types;

pub use error::FilterError;
pub use order::FilterOrder;
pub use types::*;
