pub mod bucket;
pub mod object;
pub mod preview;

pub use bucket::*;
pub use object::*;
pub use preview::*;
