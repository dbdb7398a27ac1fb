//! Provider configuration.
//!
//! The provider block is deserialized into [`ProviderConfig`]. Values set in
//! the block win; anything left unset falls back to the environment and then
//! to built-in defaults. [`ProviderConfig::resolve`] produces the
//! [`ResolvedConfig`] the client is built from.

use serde::Deserialize;

use crate::client::DEFAULT_BASE_URL;
use crate::schema::{Attribute, Diagnostic, Schema};

pub const TOKEN_ENV: &str = "CIRCLECI_TOKEN";
pub const VCS_TYPE_ENV: &str = "CIRCLECI_VCS_TYPE";
pub const ORGANIZATION_ENV: &str = "CIRCLECI_ORGANIZATION";
pub const URL_ENV: &str = "CIRCLECI_URL";

pub const DEFAULT_VCS_TYPE: &str = "github";

/// The provider configuration block as written by the user.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub token: Option<String>,
    pub vcs_type: Option<String>,
    pub organization: Option<String>,
    pub url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("vcs_type", &self.vcs_type)
            .field("organization", &self.organization)
            .field("url", &self.url)
            .finish()
    }
}

/// Configuration with every fallback applied.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub token: String,
    pub vcs_type: String,
    pub organization: String,
    pub url: String,
}

impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("token", &"<redacted>")
            .field("vcs_type", &self.vcs_type)
            .field("organization", &self.organization)
            .field("url", &self.url)
            .finish()
    }
}

impl ProviderConfig {
    /// Parse the provider block. `null` means an empty block.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(value)
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<ResolvedConfig, Vec<Diagnostic>> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve using `lookup` for environment fallbacks.
    ///
    /// Empty strings count as unset. Missing token or organization yields
    /// one error diagnostic each.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<ResolvedConfig, Vec<Diagnostic>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |value: &Option<String>, env: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .or_else(|| lookup(env).filter(|v| !v.is_empty()))
        };

        let token = pick(&self.token, TOKEN_ENV);
        let organization = pick(&self.organization, ORGANIZATION_ENV);
        let vcs_type = pick(&self.vcs_type, VCS_TYPE_ENV).unwrap_or_else(|| DEFAULT_VCS_TYPE.to_string());
        let url = pick(&self.url, URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut diagnostics = Vec::new();
        if token.is_none() {
            diagnostics.push(missing("token", TOKEN_ENV));
        }
        if organization.is_none() {
            diagnostics.push(missing("organization", ORGANIZATION_ENV));
        }

        match (token, organization) {
            (Some(token), Some(organization)) => Ok(ResolvedConfig {
                token,
                vcs_type,
                organization,
                url,
            }),
            _ => Err(diagnostics),
        }
    }

    /// Schema of the provider block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("CircleCI provider configuration")
            .with_attribute(
                "token",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!("The token key for API operations. Defaults to ${}", TOKEN_ENV)),
            )
            .with_attribute(
                "vcs_type",
                Attribute::optional_string().with_description(format!(
                    "The VCS type for the organization. Defaults to ${} or \"{}\"",
                    VCS_TYPE_ENV, DEFAULT_VCS_TYPE
                )),
            )
            .with_attribute(
                "organization",
                Attribute::optional_string().with_description(format!(
                    "The CircleCI organization. Defaults to ${}",
                    ORGANIZATION_ENV
                )),
            )
            .with_attribute(
                "url",
                Attribute::optional_string().with_description(format!(
                    "The URL of the CircleCI API. Defaults to ${} or {}",
                    URL_ENV, DEFAULT_BASE_URL
                )),
            )
    }
}

fn missing(attribute: &str, env: &str) -> Diagnostic {
    Diagnostic::error(format!("Missing provider setting '{}'", attribute))
        .with_detail(format!(
            "Set '{}' in the provider block or the {} environment variable",
            attribute, env
        ))
        .with_attribute(attribute)
}
