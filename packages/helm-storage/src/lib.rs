pub mod catalog;
pub mod credentials;
pub mod db;
pub mod model_config;
pub mod models;
pub mod registry;
pub mod schema;
pub mod usage;
pub mod vectors;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
