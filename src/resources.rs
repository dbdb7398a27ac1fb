//! Resource types served by the provider.
//!
//! Each resource maps the host's JSON attribute bag to a typed state struct
//! and drives the matching CircleCI calls through a [`ProviderClient`].

mod environment_variable;
mod project;
mod ssh_key;

pub use environment_variable::{EnvironmentVariable, EnvironmentVariableState};
pub use project::{Project, ProjectState};
pub use ssh_key::{SshKey, SshKeyState};

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::ProviderClient;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};

/// Upper bounds for the slow operations of a resource. `None` means the
/// operation runs until the client gives up on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timeouts {
    pub create: Option<Duration>,
    pub delete: Option<Duration>,
}

/// A resource type managed by the provider.
#[async_trait]
pub trait Resource: Send + Sync {
    /// The type name the host uses, e.g. `circleci_project`.
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Checks beyond the schema (value formats and the like).
    fn validate(&self, _config: &Value) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    async fn create(&self, client: &ProviderClient, planned_state: Value) -> Result<Value, ProviderError>;

    /// Refresh state from the API. A vanished resource is `NotFound`.
    async fn read(&self, client: &ProviderClient, current_state: Value) -> Result<Value, ProviderError>;

    async fn exists(&self, client: &ProviderClient, current_state: Value) -> Result<bool, ProviderError>;

    async fn delete(&self, client: &ProviderClient, current_state: Value) -> Result<(), ProviderError>;

    /// Build the initial state for an import ID. No API calls are made here.
    fn import(&self, id: &str) -> Result<Value, ProviderError>;
}

/// Every resource type the provider serves.
pub fn all() -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(Project),
        Box::new(EnvironmentVariable),
        Box::new(SshKey),
    ]
}

pub(crate) fn decode_state<T: DeserializeOwned>(resource_type: &str, state: Value) -> Result<T, ProviderError> {
    serde_json::from_value(state).map_err(|e| {
        ProviderError::Validation(format!("invalid {} state: {}", resource_type, e))
    })
}

pub(crate) fn encode_state<T: Serialize>(state: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(state)?)
}

/// Split an import ID into exactly `N` non-empty `|`-separated parts.
pub(crate) fn split_import_id<'a, const N: usize>(
    resource_type: &str,
    id: &'a str,
    format: &str,
) -> Result<[&'a str; N], ProviderError> {
    let parts: Vec<&str> = id.split('|').collect();
    let parts: [&str; N] = parts.try_into().map_err(|_| invalid_import_id(resource_type, id, format))?;
    if parts.iter().any(|p| p.is_empty()) {
        return Err(invalid_import_id(resource_type, id, format));
    }
    Ok(parts)
}

fn invalid_import_id(resource_type: &str, id: &str, format: &str) -> ProviderError {
    ProviderError::Validation(format!(
        "invalid import ID '{}' for {}: expected '{}'",
        id, resource_type, format
    ))
}
