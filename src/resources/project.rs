use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{decode_state, encode_state, Resource};
use crate::client::ProviderClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

const TYPE_NAME: &str = "circleci_project";

/// A followed and enabled CircleCI project (`circleci_project`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Project;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    #[serde(default)]
    pub id: Option<String>,
    pub repo: String,
}

#[async_trait]
impl Resource for Project {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Enables building a repository on CircleCI")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "repo",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The name of the CircleCI project to enable"),
            )
    }

    async fn create(&self, client: &ProviderClient, planned_state: Value) -> Result<Value, ProviderError> {
        let mut state: ProjectState = decode_state(TYPE_NAME, planned_state)?;

        client.follow_project(&state.repo).await?;
        client.enable_project(&state.repo).await?;
        info!(repo = %state.repo, "project enabled");

        state.id = Some(state.repo.clone());
        encode_state(&state)
    }

    async fn read(&self, client: &ProviderClient, current_state: Value) -> Result<Value, ProviderError> {
        let mut state: ProjectState = decode_state(TYPE_NAME, current_state)?;

        if client.get_project(&state.repo).await?.is_none() {
            return Err(ProviderError::NotFound(format!(
                "project '{}' is not followed in organization '{}'",
                state.repo,
                client.organization()
            )));
        }

        state.id = Some(state.repo.clone());
        encode_state(&state)
    }

    async fn exists(&self, client: &ProviderClient, current_state: Value) -> Result<bool, ProviderError> {
        let state: ProjectState = decode_state(TYPE_NAME, current_state)?;
        let found = client.get_project(&state.repo).await?.is_some();
        debug!(repo = %state.repo, found, "checked project");
        Ok(found)
    }

    async fn delete(&self, client: &ProviderClient, current_state: Value) -> Result<(), ProviderError> {
        let state: ProjectState = decode_state(TYPE_NAME, current_state)?;
        client.disable_project(&state.repo).await?;
        info!(repo = %state.repo, "project disabled");
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::Validation(format!(
                "invalid import ID '' for {}: expected 'repo'",
                TYPE_NAME
            )));
        }
        encode_state(&ProjectState {
            id: Some(id.to_string()),
            repo: id.to_string(),
        })
    }
}
