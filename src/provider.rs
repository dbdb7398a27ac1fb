//! The CircleCI provider.
//!
//! [`CircleCiProvider`] implements [`ProviderService`] on top of the
//! resource registry in [`crate::resources`]. The API client is created by
//! `configure` and shared by every later call.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{CircleCiApi, ProviderClient, RetryPolicy};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::resources::{self, Resource};
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities};
use crate::validation::validate;

/// Provider for CircleCI projects, environment variables and SSH keys.
pub struct CircleCiProvider {
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    client: RwLock<Option<Arc<ProviderClient>>>,
    retry_policy: RetryPolicy,
}

impl Default for CircleCiProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CircleCiProvider {
    pub fn new() -> Self {
        Self {
            resources: resources::all()
                .into_iter()
                .map(|r| (r.type_name(), r))
                .collect(),
            client: RwLock::new(None),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Use `policy` for the clients built by `configure`.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// A provider that is already configured with `client`.
    pub fn with_client(client: ProviderClient) -> Self {
        let provider = Self::new();
        Self {
            client: RwLock::new(Some(Arc::new(client))),
            ..provider
        }
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    async fn client(&self) -> Result<Arc<ProviderClient>, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }
}

/// Run `operation`, failing with `DeadlineExceeded` once `limit` elapses.
async fn with_timeout<T, F>(
    limit: Option<Duration>,
    operation: &str,
    resource_type: &str,
    fut: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let Some(limit) = limit else {
        return fut.await;
    };
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::DeadlineExceeded(format!(
            "{} of {} did not finish within {:?}",
            operation, resource_type, limit
        ))),
    }
}

#[async_trait::async_trait]
impl ProviderService for CircleCiProvider {
    fn schema(&self) -> ProviderSchema {
        self.resources.values().fold(
            ProviderSchema::new().with_provider_config(ProviderConfig::schema()),
            |schema, r| schema.with_resource(r.type_name(), r.schema()),
        )
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self.resources.keys().map(|k| k.to_string()).collect(),
            capabilities: ServerCapabilities {
                plan_destroy: true,
                update_in_place: false,
            },
        }
    }

    async fn validate_provider_config(
        &self,
        config: serde_json::Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        // A null block is an empty one; the environment fills it in.
        let mut diagnostics = if config.is_null() {
            Vec::new()
        } else {
            validate(&ProviderConfig::schema(), &config)
        };
        if has_errors(&diagnostics) {
            return Ok(diagnostics);
        }
        if let Err(missing) = ProviderConfig::from_value(&config)?.resolve() {
            diagnostics.extend(missing);
        }
        Ok(diagnostics)
    }

    #[instrument(skip_all, name = "provider.configure")]
    async fn configure(&self, config: serde_json::Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let resolved = match ProviderConfig::from_value(&config)?.resolve() {
            Ok(resolved) => resolved,
            Err(diagnostics) => {
                warn!(errors = diagnostics.len(), "provider configuration incomplete");
                return Ok(diagnostics);
            }
        };

        let api = CircleCiApi::with_base_url(&resolved.token, &resolved.url)?;
        let client = ProviderClient::new(api, &resolved.vcs_type, &resolved.organization)
            .with_retry_policy(self.retry_policy);

        *self.client.write().await = Some(Arc::new(client));
        info!(
            vcs_type = %resolved.vcs_type,
            organization = %resolved.organization,
            url = %resolved.url,
            "provider configured"
        );
        Ok(Vec::new())
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.client.write().await.take();
        info!("provider stopped");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: serde_json::Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let mut diagnostics = validate(&resource.schema(), &config);
        diagnostics.extend(resource.validate(&config));
        Ok(diagnostics)
    }

    #[instrument(skip_all, name = "provider.plan", fields(resource_type = %resource_type))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<serde_json::Value>,
        proposed_state: serde_json::Value,
        _config: serde_json::Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = self.resource(resource_type)?.schema();
        let result = crate::plan::compute_plan(&schema, prior_state.as_ref(), &proposed_state);
        debug!(
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "plan computed"
        );
        Ok(result)
    }

    #[instrument(skip_all, name = "provider.create", fields(resource_type = %resource_type))]
    async fn create(
        &self,
        resource_type: &str,
        planned_state: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;

        let result = with_timeout(
            resource.timeouts().create,
            "create",
            resource_type,
            resource.create(&client, planned_state),
        )
        .await;
        match &result {
            Ok(_) => info!("create completed"),
            Err(e) => error!(error = %e, "create failed"),
        }
        result
    }

    #[instrument(skip_all, name = "provider.read", fields(resource_type = %resource_type))]
    async fn read(
        &self,
        resource_type: &str,
        current_state: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        debug!("read called");
        resource.read(&client, current_state).await
    }

    #[instrument(skip_all, name = "provider.exists", fields(resource_type = %resource_type))]
    async fn exists(
        &self,
        resource_type: &str,
        current_state: serde_json::Value,
    ) -> Result<bool, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.exists(&client, current_state).await
    }

    async fn update(
        &self,
        resource_type: &str,
        _prior_state: serde_json::Value,
        _planned_state: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        self.resource(resource_type)?;
        Err(ProviderError::Unimplemented(format!(
            "{} cannot be updated in place; every attribute forces replacement",
            resource_type
        )))
    }

    #[instrument(skip_all, name = "provider.delete", fields(resource_type = %resource_type))]
    async fn delete(
        &self,
        resource_type: &str,
        current_state: serde_json::Value,
    ) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;

        let result = with_timeout(
            resource.timeouts().delete,
            "delete",
            resource_type,
            resource.delete(&client, current_state),
        )
        .await;
        match &result {
            Ok(()) => info!("delete completed"),
            Err(e) => error!(error = %e, "delete failed"),
        }
        result
    }

    #[instrument(skip_all, name = "provider.import", fields(resource_type = %resource_type, id = %id))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;

        let state = resource.import(id)?;
        let state = resource.read(&client, state).await?;
        info!("import completed");
        Ok(vec![ImportedResource::new(resource_type, state)])
    }
}
