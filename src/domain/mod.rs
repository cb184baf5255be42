pub mod errors;
pub mod models;
pub mod value_objects;

pub use errors::{ErrorCode, GatewayError, GatewayResult, ValidationError};
pub use models::*;
pub use value_objects::*;
