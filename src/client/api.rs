use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use super::types::{
    AddEnvVarRequest, AddSshKeyRequest, DeleteSshKeyRequest, EnvVar, ErrorBody, Project,
    DEFAULT_BASE_URL,
};
use super::ClientError;

const TOKEN_HEADER: &str = "circle-token";

/// Raw CircleCI v1.1 REST client.
///
/// Every call takes the full addressing context (VCS type, organization,
/// project). See [`super::ProviderClient`] for the bound, retrying wrapper.
#[derive(Clone)]
pub struct CircleCiApi {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for CircleCiApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircleCiApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CircleCiApi {
    pub fn new(token: &str) -> Result<Self, ClientError> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Point the client at a different endpoint (self-hosted server or a mock).
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let mut token_value = HeaderValue::from_str(token).map_err(|_| ClientError::InvalidToken)?;
        token_value.set_sensitive(true);
        headers.insert(HeaderName::from_static(TOKEN_HEADER), token_value);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn project_url(&self, vcs_type: &str, organization: &str, project: &str) -> String {
        format!(
            "{}/project/{}/{}/{}",
            self.base_url,
            urlencoding::encode(vcs_type),
            urlencoding::encode(organization),
            urlencoding::encode(project)
        )
    }

    /// Fetch a single environment variable. A 404 means it does not exist.
    pub async fn get_env_var(
        &self,
        vcs_type: &str,
        organization: &str,
        project: &str,
        name: &str,
    ) -> Result<Option<EnvVar>, ClientError> {
        let url = format!(
            "{}/envvar/{}",
            self.project_url(vcs_type, organization, project),
            urlencoding::encode(name)
        );
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;
        decode(response, "environment variable").await.map(Some)
    }

    pub async fn add_env_var(
        &self,
        vcs_type: &str,
        organization: &str,
        project: &str,
        name: &str,
        value: &str,
    ) -> Result<EnvVar, ClientError> {
        let url = format!("{}/envvar", self.project_url(vcs_type, organization, project));
        let response = self
            .client
            .post(&url)
            .json(&AddEnvVarRequest { name, value })
            .send()
            .await?;
        let response = check_status(response).await?;
        decode(response, "environment variable").await
    }

    pub async fn delete_env_var(
        &self,
        vcs_type: &str,
        organization: &str,
        project: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        let url = format!(
            "{}/envvar/{}",
            self.project_url(vcs_type, organization, project),
            urlencoding::encode(name)
        );
        let response = self.client.delete(&url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    /// Look up a followed project. `None` if the account does not follow it.
    pub async fn get_project(
        &self,
        organization: &str,
        project: &str,
    ) -> Result<Option<Project>, ClientError> {
        let url = format!("{}/projects", self.base_url);
        let response = self.client.get(&url).send().await?;
        let response = check_status(response).await?;
        let projects: Vec<Project> = decode(response, "project list").await?;
        Ok(projects.into_iter().find(|p| p.matches(organization, project)))
    }

    pub async fn follow_project(
        &self,
        vcs_type: &str,
        organization: &str,
        project: &str,
    ) -> Result<(), ClientError> {
        let url = format!("{}/follow", self.project_url(vcs_type, organization, project));
        let response = self.client.post(&url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn enable_project(
        &self,
        vcs_type: &str,
        organization: &str,
        project: &str,
    ) -> Result<(), ClientError> {
        let url = format!("{}/enable", self.project_url(vcs_type, organization, project));
        let response = self.client.post(&url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn disable_project(
        &self,
        vcs_type: &str,
        organization: &str,
        project: &str,
    ) -> Result<(), ClientError> {
        let url = format!("{}/enable", self.project_url(vcs_type, organization, project));
        let response = self.client.delete(&url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn add_ssh_key(
        &self,
        vcs_type: &str,
        organization: &str,
        project: &str,
        hostname: &str,
        private_key: &str,
    ) -> Result<(), ClientError> {
        let url = format!("{}/ssh-key", self.project_url(vcs_type, organization, project));
        let response = self
            .client
            .post(&url)
            .json(&AddSshKeyRequest {
                hostname,
                private_key,
            })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn delete_ssh_key(
        &self,
        vcs_type: &str,
        organization: &str,
        project: &str,
        hostname: &str,
        fingerprint: &str,
    ) -> Result<(), ClientError> {
        let url = format!("{}/ssh-key", self.project_url(vcs_type, organization, project));
        let response = self
            .client
            .delete(&url)
            .json(&DeleteSshKeyRequest {
                hostname,
                fingerprint,
            })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Turn a non-success response into a [`ClientError`], keeping the API's message.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ClientError::Auth { message });
    }

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, ClientError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ClientError::Decode {
        what: what.to_string(),
        message: e.to_string(),
    })
}
