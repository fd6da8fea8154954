pub mod response;
pub mod timing;

pub use response::{ApiResponse, ApiResult};
pub use timing::response_time;
