pub mod auth;
pub mod logging;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use logging::{request_logging_middleware, RequestLogger};
pub use response::{ApiResponse, ApiResult};
