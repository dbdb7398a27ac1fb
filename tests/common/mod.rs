//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use circleci_provider::{CircleCiApi, CircleCiProvider, ProviderClient, ProviderService, RetryPolicy};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TOKEN: &str = "test-token";
pub const ORG: &str = "acme";
pub const PROJECT: &str = "widgets";

pub const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/test_rsa_key.pem");

pub const TEST_FINGERPRINT: &str = "d5:70:7c:17:6f:6b:26:8f:46:8b:88:a8:3c:ad:2a:ed";

/// Retries quickly so transient-failure tests stay fast.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::default()
        .with_initial_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(5))
}

pub fn client(server: &MockServer) -> ProviderClient {
    let api = CircleCiApi::with_base_url(TOKEN, &server.uri()).unwrap();
    ProviderClient::new(api, "github", ORG).with_retry_policy(fast_retry())
}

/// A provider configured the way the host would, pointed at `server`.
pub async fn provider(server: &MockServer) -> CircleCiProvider {
    circleci_provider::try_init_logging();
    let provider = CircleCiProvider::new().with_retry_policy(fast_retry());
    let diagnostics = provider
        .configure(json!({
            "token": TOKEN,
            "vcs_type": "github",
            "organization": ORG,
            "url": server.uri(),
        }))
        .await
        .unwrap();
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    provider
}

pub fn project_path(suffix: &str) -> String {
    format!("/project/github/{}/{}{}", ORG, PROJECT, suffix)
}

/// In-memory stand-in for a project's environment variable endpoints.
///
/// Reads mask the value the way CircleCI does.
#[derive(Clone, Default)]
pub struct FakeEnvVars {
    vars: Arc<Mutex<BTreeMap<String, String>>>,
}

impl FakeEnvVars {
    pub fn with_var(self, name: &str, value: &str) -> Self {
        self.vars
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn value(&self, name: &str) -> Option<String> {
        self.vars.lock().unwrap().get(name).cloned()
    }

    pub async fn mount(&self, server: &MockServer) {
        let item = format!(r"^{}/envvar/[^/]+$", project_path(""));
        Mock::given(method("GET"))
            .and(path_regex(item.clone()))
            .respond_with(Lookup(self.clone()))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path(project_path("/envvar")))
            .respond_with(Insert(self.clone()))
            .mount(server)
            .await;
        Mock::given(method("DELETE"))
            .and(path_regex(item))
            .respond_with(Remove(self.clone()))
            .mount(server)
            .await;
    }
}

fn var_name(request: &Request) -> String {
    request
        .url
        .path_segments()
        .and_then(|mut s| s.next_back())
        .unwrap_or_default()
        .to_string()
}

fn masked(value: &str) -> String {
    let tail: String = value.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("xxxx{}", tail)
}

struct Lookup(FakeEnvVars);

impl Respond for Lookup {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let name = var_name(request);
        match self.0.value(&name) {
            Some(value) => ResponseTemplate::new(200)
                .set_body_json(json!({"name": name, "value": masked(&value)})),
            None => ResponseTemplate::new(404)
                .set_body_json(json!({"message": "Environment variable not found"})),
        }
    }
}

struct Insert(FakeEnvVars);

impl Respond for Insert {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match request.body_json() {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };
        let name = body["name"].as_str().unwrap_or_default().to_string();
        let value = body["value"].as_str().unwrap_or_default().to_string();
        self.0.vars.lock().unwrap().insert(name.clone(), value.clone());
        ResponseTemplate::new(201).set_body_json(json!({"name": name, "value": masked(&value)}))
    }
}

struct Remove(FakeEnvVars);

impl Respond for Remove {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.0.vars.lock().unwrap().remove(&var_name(request));
        ResponseTemplate::new(200).set_body_json(json!({"message": "ok"}))
    }
}
