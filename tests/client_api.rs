mod common;

use circleci_provider::{CircleCiApi, ClientError, ProviderClient, RetryPolicy};
use common::{client, project_path, FakeEnvVars, ORG, PROJECT, TOKEN};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_requests_carry_token_and_accept_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(project_path("/envvar/API_KEY")))
        .and(header("circle-token", TOKEN))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"name": "API_KEY", "value": "xxxx1234"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let var = client(&mock_server)
        .get_env_var(PROJECT, "API_KEY")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(var.name, "API_KEY");
    assert_eq!(var.value, "xxxx1234");
}

#[tokio::test]
async fn test_get_env_var_not_found_is_none() {
    let mock_server = MockServer::start().await;
    FakeEnvVars::default().mount(&mock_server).await;

    let client = client(&mock_server);
    assert!(client.get_env_var(PROJECT, "MISSING").await.unwrap().is_none());
    assert!(!client.env_var_exists(PROJECT, "MISSING").await.unwrap());
}

#[tokio::test]
async fn test_add_then_delete_env_var() {
    let mock_server = MockServer::start().await;
    let vars = FakeEnvVars::default();
    vars.mount(&mock_server).await;

    let client = client(&mock_server);
    let created = client.add_env_var(PROJECT, "API_KEY", "s3cr3t-value").await.unwrap();
    assert_eq!(created.name, "API_KEY");
    assert_eq!(vars.value("API_KEY").as_deref(), Some("s3cr3t-value"));
    assert!(client.env_var_exists(PROJECT, "API_KEY").await.unwrap());

    client.delete_env_var(PROJECT, "API_KEY").await.unwrap();
    assert!(client.get_env_var(PROJECT, "API_KEY").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_env_var_retries_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(project_path("/envvar/API_KEY")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(project_path("/envvar/API_KEY")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    client(&mock_server)
        .delete_env_var(PROJECT, "API_KEY")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_retry_gives_up_after_max_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .expect(4)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).get_project(PROJECT).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 500, ref message } if message == "boom"));
}

#[tokio::test]
async fn test_permanent_errors_are_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(project_path("/follow")))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Project not found"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).follow_project(PROJECT).await.unwrap_err();
    assert_eq!(err.to_string(), "API error (400): Project not found");
}

#[tokio::test]
async fn test_add_env_var_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(project_path("/envvar")))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .add_env_var(PROJECT, "API_KEY", "v")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.to_string(), "API error (502): Bad Gateway");
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "You must log in first."})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).get_project(PROJECT).await.unwrap_err();
    assert!(matches!(err, ClientError::Auth { .. }));
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn test_get_project_matches_org_and_repo() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"username": "other", "reponame": PROJECT, "vcs_type": "github"},
            {"username": ORG, "reponame": "gadgets", "vcs_type": "github"},
            {"username": ORG, "reponame": PROJECT, "vcs_type": "github",
             "vcs_url": "https://github.com/acme/widgets", "following": true}
        ])))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let project = client.get_project(PROJECT).await.unwrap().unwrap();
    assert_eq!(project.username, ORG);
    assert_eq!(project.vcs_url.as_deref(), Some("https://github.com/acme/widgets"));

    assert!(client.get_project("gizmos").await.unwrap().is_none());
}

#[tokio::test]
async fn test_project_follow_enable_disable_paths() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(project_path("/follow")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"following": true})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(project_path("/enable")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(project_path("/enable")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    client.follow_project(PROJECT).await.unwrap();
    client.enable_project(PROJECT).await.unwrap();
    client.disable_project(PROJECT).await.unwrap();
}

#[tokio::test]
async fn test_ssh_key_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(project_path("/ssh-key")))
        .and(body_json(json!({"hostname": "github.com", "private_key": "KEY"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(project_path("/ssh-key")))
        .and(body_json(json!({"hostname": "github.com", "fingerprint": "aa:bb"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    client.add_ssh_key(PROJECT, "github.com", "KEY").await.unwrap();
    client
        .delete_ssh_key(PROJECT, "github.com", "aa:bb")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_vcs_type_and_org_are_part_of_the_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/project/bitbucket/initech/tps-reports/follow"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = CircleCiApi::with_base_url(TOKEN, &format!("{}/", mock_server.uri())).unwrap();
    let client = ProviderClient::new(api, "bitbucket", "initech").with_retry_policy(RetryPolicy::none());
    assert_eq!(client.vcs_type(), "bitbucket");
    client.follow_project("tps-reports").await.unwrap();
}

#[test]
fn test_token_with_newline_is_rejected() {
    let err = CircleCiApi::new("bad\ntoken").unwrap_err();
    assert!(matches!(err, ClientError::InvalidToken));
}
