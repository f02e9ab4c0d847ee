//! Query composition and relational assembly for the History Atlas API.

pub mod assembler;
pub mod error;
pub mod service;

pub use assembler::Assembler;
pub use error::{FetchError, FetchResult};
pub use service::{AtlasService, DEFAULT_FETCH_CONCURRENCY};
