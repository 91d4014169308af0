pub mod catalog;
pub mod classify;
pub mod model_string;
pub mod usage;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
