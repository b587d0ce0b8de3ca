//! Client for the online voting backend: session handling, candidate
//! self-service, ballot casting and results.

pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{ClientError, Result};
pub use models::config::AppConfig;
pub use services::api::{HttpGateway, SharedApi, VotingApi};
pub use services::navigation::Navigator;
pub use services::session::SessionStore;
