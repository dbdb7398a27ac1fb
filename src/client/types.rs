use serde::{Deserialize, Serialize};

/// Default CircleCI v1.1 API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://circleci.com/api/v1.1";

/// A project environment variable.
///
/// The API masks `value` on reads (e.g. `xxxx1234`); only the value sent at
/// creation is the real one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// A followed project as returned by `GET /projects`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Project {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub reponame: String,
    #[serde(default)]
    pub vcs_url: Option<String>,
    #[serde(default)]
    pub vcs_type: Option<String>,
}

impl Project {
    pub fn matches(&self, organization: &str, repo: &str) -> bool {
        self.username == organization && self.reponame == repo
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AddEnvVarRequest<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddSshKeyRequest<'a> {
    pub hostname: &'a str,
    pub private_key: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteSshKeyRequest<'a> {
    pub hostname: &'a str,
    pub fingerprint: &'a str,
}

/// Body of a CircleCI error response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_deserialization() {
        let var: EnvVar =
            serde_json::from_str(r#"{"name": "API_KEY", "value": "xxxxabcd"}"#).unwrap();
        assert_eq!(var.name, "API_KEY");
        assert_eq!(var.value, "xxxxabcd");
    }

    #[test]
    fn test_project_deserialization_ignores_extra_fields() {
        let json = r#"{
            "username": "acme",
            "reponame": "widgets",
            "vcs_url": "https://github.com/acme/widgets",
            "vcs_type": "github",
            "following": true,
            "branches": {}
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert!(project.matches("acme", "widgets"));
        assert!(!project.matches("acme", "gadgets"));
        assert_eq!(project.vcs_type.as_deref(), Some("github"));
    }

    #[test]
    fn test_delete_ssh_key_request_shape() {
        let body = serde_json::to_value(DeleteSshKeyRequest {
            hostname: "github.com",
            fingerprint: "aa:bb",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"hostname": "github.com", "fingerprint": "aa:bb"})
        );
    }
}
