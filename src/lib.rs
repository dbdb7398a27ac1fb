//! CircleCI infrastructure provider.
//!
//! This crate exposes CircleCI projects, project environment variables and
//! SSH deploy keys as resources of a Terraform-style provider. The host
//! engine drives it through the [`ProviderService`] trait; the CircleCI v1.1
//! REST API is reached through [`client::ProviderClient`].
//!
//! # Overview
//!
//! - **ProviderService trait**: the host-facing seam (schema, configure,
//!   validate, plan, create, read, exists, delete, import)
//! - **CircleCiProvider**: the implementation, backed by a resource registry
//! - **Resources**: `circleci_project`, `circleci_environment_variable`,
//!   `circleci_ssh_key`
//! - **Client**: a reqwest-based API client with bounded exponential backoff
//!   around its idempotent calls
//! - **Schema / validation / plan**: schema types and the schema-driven
//!   validation and plan computation
//! - **Logging**: `tracing` to stderr, filtered by `RUST_LOG` or the host's
//!   `TF_LOG` level
//!
//! # Quick Start
//!
//! ```ignore
//! use circleci_provider::{init_logging, CircleCiProvider, ProviderService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let provider = CircleCiProvider::new();
//!     provider
//!         .configure(json!({"token": "...", "organization": "acme"}))
//!         .await?;
//!
//!     let state = provider
//!         .create("circleci_project", json!({"repo": "widgets"}))
//!         .await?;
//!     tracing::info!(%state, "project enabled");
//!     Ok(())
//! }
//! ```
//!
//! # Provider configuration
//!
//! | attribute | environment | default |
//! |---|---|---|
//! | `token` | `CIRCLECI_TOKEN` | required |
//! | `vcs_type` | `CIRCLECI_VCS_TYPE` | `github` |
//! | `organization` | `CIRCLECI_ORGANIZATION` | required |
//! | `url` | `CIRCLECI_URL` | `https://circleci.com/api/v1.1` |

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::{CircleCiApi, ClientError, ProviderClient, RetryPolicy};
pub use config::{ProviderConfig, ResolvedConfig};
pub use error::ProviderError;
pub use logging::{init_logging, try_init_logging};
pub use provider::CircleCiProvider;
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities};
pub use validation::{is_valid, validate, validate_env_var_name, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
