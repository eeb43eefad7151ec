//! # facelens-core
//!
//! Core library for facelens - a client for a remote facial-attribute
//! photo analysis service.
//!
//! This library provides:
//! - Domain types for images, uploaded assets, attribute results and usage analytics
//! - HTTP clients for the upload, analysis and analytics services
//! - The workflow orchestrator that sequences selection, upload and analysis
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows one way through the workflow:
//! - **Selection:** a local [`ImageReference`]
//! - **Upload:** the image becomes a durable [`UploadedAsset`]
//! - **Analysis:** the asset URL yields an [`AnalysisResult`]
//!
//! The analytics summary is refreshed independently: once at mount and
//! after every successful analysis.
//!
//! ## Example
//!
//! ```rust,no_run
//! use facelens_core::client::HttpClients;
//! use facelens_core::{Config, ImageReference, Orchestrator};
//!
//! # async fn run() -> facelens_core::Result<()> {
//! let config = Config::load()?;
//! let orchestrator = Orchestrator::with_http(HttpClients::new(&config.service)?);
//!
//! orchestrator.mount().await;
//! orchestrator
//!     .select_image(ImageReference::new("selfie.jpg"))
//!     .expect("nothing in flight");
//! orchestrator.start_analysis().await;
//!
//! if let Some(result) = orchestrator.state().result() {
//!     println!("gender: {:?}", result.gender);
//! }
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
pub use workflow::{FailureReason, Orchestrator, Phase, Rejection, StartOutcome, WorkflowState};

// Public modules
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod source;
pub mod types;
pub mod workflow;
