pub mod cache;
pub mod config;
pub mod error;
pub mod error_handling;
pub mod gateway;
pub mod logging;
pub mod request_context;
pub mod stackpath;

pub use cache::TtlCache;
pub use config::{CacheConfig, CoreConfig, HttpConfig, StackPathConfig};
pub use error::{CoreError, CoreResult};
pub use gateway::{Auth, Gateway};
pub use stackpath::{PurgeItem, PurgeTarget, StackMap, StackPathClient};
