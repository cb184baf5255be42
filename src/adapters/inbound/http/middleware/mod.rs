mod error_envelope;

pub use error_envelope::{render_error_envelope, ErrorStatusPolicy};
