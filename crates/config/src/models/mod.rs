pub mod app_config;
pub mod coordinator_worker;
pub mod observability;
pub mod web_api;

pub use app_config::*;
pub use coordinator_worker::*;
pub use observability::*;
pub use web_api::*;
