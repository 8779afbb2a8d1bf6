pub mod error;
pub mod scheduling;

pub use error::*;
pub use scheduling::*;
