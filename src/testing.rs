//! Testing utilities for provider implementations.
//!
//! This module drives a `ProviderService` directly, the way the host would,
//! without any transport in between.
//!
//! # Example
//!
//! ```ignore
//! use circleci_provider::testing::ProviderTester;
//! use circleci_provider::CircleCiProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_project() {
//!     let tester = ProviderTester::new(CircleCiProvider::new());
//!
//!     tester.configure(json!({"token": "t", "organization": "acme"})).await.unwrap();
//!
//!     let state = tester
//!         .lifecycle_create("circleci_project", json!({"repo": "widgets"}))
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(state["id"], "widgets");
//! }
//! ```

use crate::error::ProviderError;
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use serde_json::Value;

/// A test harness for provider implementations.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration.
    ///
    /// Returns `Err` with the diagnostics if there are errors.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider.
    ///
    /// Returns `Err` with the diagnostics if there are errors.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    /// Plan a change to an existing resource.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(
                resource_type,
                Some(prior_state),
                proposed_state.clone(),
                proposed_state,
            )
            .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Create a new resource.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Check whether a resource still exists.
    pub async fn exists(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<bool, ProviderError> {
        self.provider.exists(resource_type, current_state).await
    }

    /// Update an existing resource in place.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Run a full create lifecycle: plan → create → read.
    ///
    /// Returns the final state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self.plan_create(resource_type, config).await?;

        let created_state = self
            .create(resource_type, plan_result.planned_state)
            .await?;

        self.read(resource_type, created_state).await
    }

    /// Apply a configuration change the way the host does: plan, then
    /// either replace (delete → create → read) or update in place.
    ///
    /// Returns the prior state unchanged when the plan is empty.
    pub async fn lifecycle_apply(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self
            .plan_update(resource_type, prior_state.clone(), proposed_state)
            .await?;

        if !plan_result.has_changes() {
            return Ok(prior_state);
        }

        let new_state = if plan_result.requires_replace {
            self.delete(resource_type, prior_state).await?;
            self.create(resource_type, plan_result.planned_state).await?
        } else {
            self.update(resource_type, prior_state, plan_result.planned_state)
                .await?
        };

        self.read(resource_type, new_state).await
    }

    /// Run a full delete lifecycle: plan → delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.plan_delete(resource_type, current_state.clone()).await?;

        self.delete(resource_type, current_state).await
    }

    /// Run create → apply change → delete.
    ///
    /// Returns the state after the change (before delete).
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created_state = self.lifecycle_create(resource_type, initial_config).await?;

        let updated_state = self
            .lifecycle_apply(resource_type, created_state, updated_config)
            .await?;

        self.lifecycle_delete(resource_type, updated_state.clone())
            .await?;

        Ok(updated_state)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

/// Check diagnostics and return an error if there are any errors.
fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics
        .into_iter()
        .filter(Diagnostic::is_error)
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// Assertion helpers. These panic with the offending paths or summaries so
// failures read well in test output.

fn changed_paths(plan: &PlanResult) -> Vec<&str> {
    plan.changes.iter().map(|c| c.path.as_str()).collect()
}

fn error_summaries(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.summary.as_str())
        .collect()
}

/// Panics unless the plan creates a fresh resource.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(plan.has_changes(), "create plan has no changes");
    assert!(!plan.requires_replace, "create plan asks for replacement");
}

/// Panics if the plan would touch anything.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        !plan.has_changes(),
        "expected an empty plan, got changes to {:?}",
        changed_paths(plan)
    );
}

/// Panics unless the plan destroys and recreates the resource.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "expected replacement, plan changes {:?} in place",
        changed_paths(plan)
    );
}

pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.change(path).is_some(),
        "expected '{}' to change, plan changes {:?}",
        path,
        changed_paths(plan)
    );
}

pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    assert!(plan.change(path).is_none(), "'{}' unexpectedly changes", path);
}

/// Panics if any diagnostic is an error. Warnings are allowed.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors = error_summaries(diagnostics);
    assert!(errors.is_empty(), "expected no errors, got {:?}", errors);
}

pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(has_errors(diagnostics), "expected at least one error, got none");
}

/// Panics unless some error summary contains `substring`.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let errors = error_summaries(diagnostics);
    assert!(
        errors.iter().any(|s| s.contains(substring)),
        "no error contains '{}', errors: {:?}",
        substring,
        errors
    );
}
