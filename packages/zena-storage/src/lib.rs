pub mod db;
pub mod integrity;
pub mod links;
pub mod qdrant;
pub mod source;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
