use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{decode_state, encode_state, split_import_id, Resource, Timeouts};
use crate::client::ProviderClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::validation::validate_env_var_name;

const TYPE_NAME: &str = "circleci_environment_variable";
const IMPORT_FORMAT: &str = "project|name";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// A project environment variable (`circleci_environment_variable`).
///
/// CircleCI masks values on read, so the configured `value` is kept in state
/// as written and never refreshed.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentVariable;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariableState {
    #[serde(default)]
    pub id: Option<String>,
    pub project: String,
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl std::fmt::Debug for EnvironmentVariableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentVariableState")
            .field("id", &self.id)
            .field("project", &self.project)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn invalid_name_message(name: &str) -> String {
    format!(
        "environment variable name {} is not valid. See https://circleci.com/docs/2.0/env-vars/#injecting-environment-variables-with-the-api",
        name
    )
}

#[async_trait]
impl Resource for EnvironmentVariable {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A CircleCI project environment variable")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "project",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The name of the CircleCI project to create the variable in"),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The name of the environment variable"),
            )
            .with_attribute(
                "value",
                Attribute::required_string()
                    .with_force_new()
                    .sensitive()
                    .with_description("The value of the environment variable"),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        match config.get("name").and_then(Value::as_str) {
            Some(name) if !validate_env_var_name(name) => {
                vec![Diagnostic::error(invalid_name_message(name)).with_attribute("name")]
            }
            _ => Vec::new(),
        }
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts {
            create: Some(DEFAULT_TIMEOUT),
            delete: Some(DEFAULT_TIMEOUT),
        }
    }

    async fn create(&self, client: &ProviderClient, planned_state: Value) -> Result<Value, ProviderError> {
        let mut state: EnvironmentVariableState = decode_state(TYPE_NAME, planned_state)?;

        if client.env_var_exists(&state.project, &state.name).await? {
            return Err(ProviderError::AlreadyExists(format!(
                "environment variable '{}' already exists for project '{}'",
                state.name, state.project
            )));
        }

        client
            .add_env_var(&state.project, &state.name, &state.value)
            .await?;
        info!(project = %state.project, name = %state.name, "environment variable created");

        state.id = Some(state.name.clone());
        self.read(client, encode_state(&state)?).await
    }

    async fn read(&self, client: &ProviderClient, current_state: Value) -> Result<Value, ProviderError> {
        let mut state: EnvironmentVariableState = decode_state(TYPE_NAME, current_state)?;

        let remote = client
            .get_env_var(&state.project, &state.name)
            .await?
            .ok_or_else(|| {
                ProviderError::NotFound(format!(
                    "environment variable '{}' not found in project '{}'",
                    state.name, state.project
                ))
            })?;

        state.name = remote.name;
        state.id = Some(state.name.clone());
        encode_state(&state)
    }

    async fn exists(&self, client: &ProviderClient, current_state: Value) -> Result<bool, ProviderError> {
        let state: EnvironmentVariableState = decode_state(TYPE_NAME, current_state)?;
        let found = client
            .get_env_var(&state.project, &state.name)
            .await?
            .is_some_and(|v| !v.value.is_empty());
        debug!(project = %state.project, name = %state.name, found, "checked environment variable");
        Ok(found)
    }

    async fn delete(&self, client: &ProviderClient, current_state: Value) -> Result<(), ProviderError> {
        let state: EnvironmentVariableState = decode_state(TYPE_NAME, current_state)?;
        client.delete_env_var(&state.project, &state.name).await?;
        info!(project = %state.project, name = %state.name, "environment variable deleted");
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let [project, name] = split_import_id::<2>(TYPE_NAME, id, IMPORT_FORMAT)?;
        encode_state(&EnvironmentVariableState {
            id: Some(name.to_string()),
            project: project.to_string(),
            name: name.to_string(),
            value: String::new(),
        })
    }
}
