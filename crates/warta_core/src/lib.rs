pub mod error;
pub mod regions;
pub mod storage;
pub mod types;

pub use error::Error;
pub use storage::ArticleStorage;
pub use types::*;

pub type Result<T> = std::result::Result<T, Error>;
