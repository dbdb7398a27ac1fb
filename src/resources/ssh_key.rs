use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{decode_state, encode_state, split_import_id, Resource};
use crate::client::ProviderClient;
use crate::error::ProviderError;
use crate::fingerprint::legacy_md5_fingerprint;
use crate::schema::{Attribute, Schema};

const TYPE_NAME: &str = "circleci_ssh_key";
const IMPORT_FORMAT: &str = "project|hostname|fingerprint";

/// An SSH deploy key attached to a project (`circleci_ssh_key`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SshKey;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKeyState {
    #[serde(default)]
    pub id: Option<String>,
    pub project: String,
    pub hostname: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub fingerprint: Option<String>,
}

impl std::fmt::Debug for SshKeyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshKeyState")
            .field("id", &self.id)
            .field("project", &self.project)
            .field("hostname", &self.hostname)
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl SshKeyState {
    /// The stored fingerprint, or one derived from the private key.
    fn fingerprint(&self) -> Result<String, ProviderError> {
        match &self.fingerprint {
            Some(f) if !f.is_empty() => Ok(f.clone()),
            _ => legacy_md5_fingerprint(&self.private_key),
        }
    }
}

fn ssh_key_id(project: &str, hostname: &str, fingerprint: &str) -> String {
    format!("{}|{}|{}", project, hostname, fingerprint)
}

#[async_trait]
impl Resource for SshKey {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("An SSH key added to a CircleCI project")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "project",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The name of the CircleCI project to which you want to add the SSH key"),
            )
            .with_attribute(
                "hostname",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The hostname where we want to use the SSH key"),
            )
            .with_attribute(
                "private_key",
                Attribute::required_string()
                    .with_force_new()
                    .sensitive()
                    .with_description("The SSH private key"),
            )
            .with_attribute(
                "fingerprint",
                Attribute::computed_string().with_description("Legacy MD5 fingerprint of the key"),
            )
    }

    async fn create(&self, client: &ProviderClient, planned_state: Value) -> Result<Value, ProviderError> {
        let mut state: SshKeyState = decode_state(TYPE_NAME, planned_state)?;

        // Reject unusable keys before anything is sent.
        let fingerprint = legacy_md5_fingerprint(&state.private_key)?;

        client
            .add_ssh_key(&state.project, &state.hostname, &state.private_key)
            .await?;
        info!(project = %state.project, hostname = %state.hostname, %fingerprint, "SSH key added");

        state.id = Some(ssh_key_id(&state.project, &state.hostname, &fingerprint));
        state.fingerprint = Some(fingerprint);
        encode_state(&state)
    }

    /// The v1.1 API cannot list SSH keys, so state is returned unchanged.
    async fn read(&self, _client: &ProviderClient, current_state: Value) -> Result<Value, ProviderError> {
        let state: SshKeyState = decode_state(TYPE_NAME, current_state)?;
        encode_state(&state)
    }

    async fn exists(&self, _client: &ProviderClient, current_state: Value) -> Result<bool, ProviderError> {
        decode_state::<SshKeyState>(TYPE_NAME, current_state)?;
        Ok(true)
    }

    async fn delete(&self, client: &ProviderClient, current_state: Value) -> Result<(), ProviderError> {
        let state: SshKeyState = decode_state(TYPE_NAME, current_state)?;
        let fingerprint = state.fingerprint()?;
        client
            .delete_ssh_key(&state.project, &state.hostname, &fingerprint)
            .await?;
        info!(project = %state.project, hostname = %state.hostname, %fingerprint, "SSH key deleted");
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let [project, hostname, fingerprint] = split_import_id::<3>(TYPE_NAME, id, IMPORT_FORMAT)?;
        encode_state(&SshKeyState {
            id: Some(id.to_string()),
            project: project.to_string(),
            hostname: hostname.to_string(),
            private_key: String::new(),
            fingerprint: Some(fingerprint.to_string()),
        })
    }
}
