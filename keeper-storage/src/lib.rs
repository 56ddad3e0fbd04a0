pub mod cache;
pub mod impls;
pub mod merge;
pub mod model;
pub mod snowflake;
pub mod storage;

pub use cache::CacheService;
pub use storage::Storage;
