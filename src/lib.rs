pub mod config;
pub mod decoder;
pub mod error;
pub mod normalize;
pub mod runtime;
pub mod sources;
pub mod tree;
pub mod types;
pub mod xml_path;

pub use error::{RegisterError, Result};
pub use sources::dpma::access::RegisterAccess;
