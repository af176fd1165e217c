pub mod client;
pub mod config;
pub mod error;
pub mod prompts;
pub mod response;
pub mod secrets;
pub mod service;

pub use client::{ensure_service, test_configured_api_key};
pub use config::ServiceConfig;
pub use error::{ErrorKind, ServiceError};
pub use secrets::KeyStore;
pub use service::{LanguageService, OpenAiService};
