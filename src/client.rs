//! CircleCI API access for the provider.
//!
//! [`CircleCiApi`] speaks the v1.1 REST API. [`ProviderClient`] binds it to a
//! VCS type and organization and retries the idempotent calls
//! (environment variable deletion and the project calls) with bounded
//! exponential backoff.

mod api;
mod error;
mod retry;
mod types;

pub use api::CircleCiApi;
pub use error::ClientError;
pub use retry::{retry, RetryPolicy};
pub use types::{EnvVar, Project, DEFAULT_BASE_URL};

use tracing::{debug, info, instrument};

/// A [`CircleCiApi`] bound to one VCS type and organization.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    api: CircleCiApi,
    vcs_type: String,
    organization: String,
    retry_policy: RetryPolicy,
}

impl ProviderClient {
    pub fn new(api: CircleCiApi, vcs_type: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            api,
            vcs_type: vcs_type.into(),
            organization: organization.into(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn vcs_type(&self) -> &str {
        &self.vcs_type
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Get the environment variable with the given name, `None` if absent.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_env_var(&self, project: &str, name: &str) -> Result<Option<EnvVar>, ClientError> {
        debug!("fetching environment variable");
        self.api
            .get_env_var(&self.vcs_type, &self.organization, project, name)
            .await
    }

    /// Whether an environment variable with the given name exists.
    pub async fn env_var_exists(&self, project: &str, name: &str) -> Result<bool, ClientError> {
        let var = self.get_env_var(project, name).await?;
        Ok(var.is_some_and(|v| !v.name.is_empty()))
    }

    #[instrument(skip(self, value))]
    pub async fn add_env_var(
        &self,
        project: &str,
        name: &str,
        value: &str,
    ) -> Result<EnvVar, ClientError> {
        info!("adding environment variable");
        self.api
            .add_env_var(&self.vcs_type, &self.organization, project, name, value)
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_env_var(&self, project: &str, name: &str) -> Result<(), ClientError> {
        info!("deleting environment variable");
        retry(&self.retry_policy, "delete_env_var", || {
            self.api
                .delete_env_var(&self.vcs_type, &self.organization, project, name)
        })
        .await
    }

    /// Read the project, `None` if it is not followed.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_project(&self, project: &str) -> Result<Option<Project>, ClientError> {
        debug!("fetching project");
        retry(&self.retry_policy, "get_project", || {
            self.api.get_project(&self.organization, project)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn follow_project(&self, project: &str) -> Result<(), ClientError> {
        info!("following project");
        retry(&self.retry_policy, "follow_project", || {
            self.api
                .follow_project(&self.vcs_type, &self.organization, project)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn enable_project(&self, project: &str) -> Result<(), ClientError> {
        info!("enabling project");
        retry(&self.retry_policy, "enable_project", || {
            self.api
                .enable_project(&self.vcs_type, &self.organization, project)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn disable_project(&self, project: &str) -> Result<(), ClientError> {
        info!("disabling project");
        retry(&self.retry_policy, "disable_project", || {
            self.api
                .disable_project(&self.vcs_type, &self.organization, project)
        })
        .await
    }

    #[instrument(skip(self, private_key))]
    pub async fn add_ssh_key(
        &self,
        project: &str,
        hostname: &str,
        private_key: &str,
    ) -> Result<(), ClientError> {
        info!("adding SSH key");
        self.api
            .add_ssh_key(
                &self.vcs_type,
                &self.organization,
                project,
                hostname,
                private_key,
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_ssh_key(
        &self,
        project: &str,
        hostname: &str,
        fingerprint: &str,
    ) -> Result<(), ClientError> {
        info!("deleting SSH key");
        self.api
            .delete_ssh_key(
                &self.vcs_type,
                &self.organization,
                project,
                hostname,
                fingerprint,
            )
            .await
    }
}
