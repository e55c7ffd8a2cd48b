pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::gateway::{HttpSubmissionGateway, InProcessGateway};
pub use adapters::notion::NotionClient;
pub use config::cli::{LocalCounterStore, MemoryCounterStore};
pub use config::env::HandlerEnv;
pub use core::questionnaire::{Phase, Questionnaire};
pub use core::submission::{HandlerRequest, HandlerResponse, SubmissionHandler};
pub use utils::error::{ProtocolError, Result};
