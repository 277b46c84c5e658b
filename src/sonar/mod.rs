//! SonarQube integration: scanner process, Web API client and data model

pub mod client;
pub mod error;
pub mod model;
pub mod retry;
pub mod scanner;

pub use client::SonarClient;
pub use error::BackendError;
pub use retry::{RetryPolicy, RetryingBackend};
pub use scanner::SonarScanner;
