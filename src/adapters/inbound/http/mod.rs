pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use error::ApiError;
pub use middleware::{render_error_envelope, ErrorStatusPolicy};
pub use router::{create_app, create_router, AppState, HttpSettings};
