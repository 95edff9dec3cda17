pub mod config;
pub mod error;
pub mod normalize;
pub mod safety;
pub mod types;

pub use config::Config;
pub use error::CuratorError;
pub use normalize::normalize_category_name;
pub use safety::validate_proxy_url;
pub use types::*;
