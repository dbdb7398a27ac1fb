//! The host-facing provider trait.
//!
//! The host engine drives a provider exclusively through [`ProviderService`]:
//! it asks for the schema, configures the provider once, then validates,
//! plans and applies changes one resource at a time. How requests reach the
//! trait (RPC transport, process handshake) is the host's business.

use crate::error::ProviderError;
use crate::plan::compute_plan;
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::types::{ImportedResource, PlanResult, ProviderMetadata};
use crate::validation::validate;

/// Trait that provider implementations must implement.
///
/// Only [`schema`](Self::schema), [`configure`](Self::configure) and the
/// create/read/delete operations are mandatory. Validation and planning
/// default to schema-driven behavior.
///
/// # Example
///
/// ```ignore
/// use circleci_provider::{ProviderService, ProviderError, ProviderSchema};
/// use circleci_provider::schema::{Schema, Attribute, Diagnostic};
///
/// struct MyProvider;
///
/// #[async_trait::async_trait]
/// impl ProviderService for MyProvider {
///     fn schema(&self) -> ProviderSchema {
///         ProviderSchema::new()
///             .with_resource("example_resource", Schema::v0()
///                 .with_attribute("name", Attribute::required_string()))
///     }
///
///     async fn configure(&self, config: serde_json::Value) -> Result<Vec<Diagnostic>, ProviderError> {
///         Ok(vec![])
///     }
///
///     // ... create, read and delete
/// }
/// ```
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Return the provider's schema including all resources.
    fn schema(&self) -> ProviderSchema;

    /// Return provider metadata. By default, this is derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.keys().cloned().collect(),
            capabilities: Default::default(),
        }
    }

    /// Look up the schema of one resource type.
    fn resource_schema(&self, resource_type: &str) -> Result<Schema, ProviderError> {
        self.schema()
            .resources
            .remove(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider configuration before configuring.
    /// Returns diagnostics (errors and warnings).
    async fn validate_provider_config(
        &self,
        config: serde_json::Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate(&self.schema().provider, &config))
    }

    /// Configure the provider with credentials and settings.
    /// Returns diagnostics (errors and warnings).
    async fn configure(&self, config: serde_json::Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: serde_json::Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = self.resource_schema(resource_type)?;
        Ok(validate(&schema, &config))
    }

    /// Plan changes for a resource.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<serde_json::Value>,
        proposed_state: serde_json::Value,
        _config: serde_json::Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = self.resource_schema(resource_type)?;
        Ok(compute_plan(&schema, prior_state.as_ref(), &proposed_state))
    }

    /// Create a new resource.
    async fn create(
        &self,
        resource_type: &str,
        planned_state: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError>;

    /// Read the current state of a resource.
    async fn read(
        &self,
        resource_type: &str,
        current_state: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError>;

    /// Whether the resource still exists remotely.
    ///
    /// A `false` answer tells the host to drop the resource from state.
    async fn exists(
        &self,
        resource_type: &str,
        current_state: serde_json::Value,
    ) -> Result<bool, ProviderError> {
        match self.read(resource_type, current_state).await {
            Ok(_) => Ok(true),
            Err(ProviderError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Update an existing resource in place.
    async fn update(
        &self,
        resource_type: &str,
        _prior_state: serde_json::Value,
        _planned_state: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        Err(ProviderError::Unimplemented(format!(
            "in-place update not supported for resource type: {}",
            resource_type
        )))
    }

    /// Delete a resource.
    async fn delete(
        &self,
        resource_type: &str,
        current_state: serde_json::Value,
    ) -> Result<(), ProviderError>;

    /// Import existing infrastructure into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::Unimplemented(format!(
            "import not supported for resource type: {}",
            resource_type
        )))
    }
}
