//! Round trips through the OpenSearch-backed transport against a mock
//! cluster.

use serde_json::json;
use std::time::Duration;
use tfos_client::{
    ClientConfig, ErrorKind, LoggingConfig, RetryConfig, Role, SecurityClient,
    STATUS_CODE_MISMATCH,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROLES: &str = "/_plugins/_security/api/roles/";

fn client_for(server: &MockServer) -> SecurityClient {
    let config = ClientConfig::new(server.uri())
        .with_basic_auth("admin", "admin")
        .with_logging(LoggingConfig::enabled().with_bodies(true, true));
    SecurityClient::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_read_role_from_collection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ROLES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "readers": {
                "reserved": false,
                "hidden": false,
                "static": false,
                "description": "Read-only",
                "cluster_permissions": ["cluster_composite_ops_ro"],
                "index_permissions": [{
                    "index_patterns": ["logs-*"],
                    "dls": "",
                    "fls": "",
                    "masked_fields": [],
                    "allowed_actions": ["read"]
                }],
                "tenant_permissions": []
            },
            "kibana_user": {"description": "Kibana", "reserved": true}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let role = client.read_role("readers").await.unwrap();

    assert_eq!(role.description, "Read-only");
    assert_eq!(role.reserved, Some(false));
    assert_eq!(role.index_permissions[0].index_patterns, vec!["logs-*"]);
}

#[tokio::test]
async fn test_put_role_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/_plugins/_security/api/roles/readers"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "description": "Read-only",
            "cluster_permissions": ["cluster_composite_ops_ro"],
            "index_permissions": [],
            "tenant_permissions": []
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"status": "CREATED", "message": "'readers' created."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let role = Role {
        reserved: Some(false),
        ..Role::new("Read-only").with_cluster_permission("cluster_composite_ops_ro")
    };
    let status = client.put_role("readers", &role).await.unwrap();

    assert_eq!(status.status, "CREATED");
}

#[tokio::test]
async fn test_delete_mismatch_carries_warnings() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/_plugins/_security/api/roles/readers"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("Warning", "299 OpenSearch \"deprecated\"")
                .set_body_json(json!({"status": "NOT_FOUND", "message": "'readers' not found."})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.remove_role("readers").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StatusMismatch);
    let envelope = err.envelope().unwrap();
    assert_eq!(envelope.warnings(), &["299 OpenSearch \"deprecated\"".to_string()]);
    assert_eq!(envelope.root_causes().last().unwrap().kind, STATUS_CODE_MISMATCH);
}

#[tokio::test]
async fn test_retries_unavailable_cluster() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ROLES))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ROLES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let config = ClientConfig::new(server.uri()).with_retry(RetryConfig::immediate(2));
    let client = SecurityClient::from_config(&config).unwrap();

    let roles = client.fetch_roles().await.unwrap();
    assert!(roles.is_empty());
}

#[tokio::test]
async fn test_call_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ROLES))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let config = ClientConfig::new(server.uri()).with_call_timeout(Duration::from_millis(200));
    let client = SecurityClient::from_config(&config).unwrap();

    let err = client.fetch_roles().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_product_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "node-1",
            "cluster_name": "docker-cluster",
            "version": {"distribution": "opensearch", "number": "2.11.1"}
        })))
        .mount(&server)
        .await;

    let info = client_for(&server).info().await.unwrap();
    assert!(info.is_opensearch());
    assert_eq!(info.cluster_name, "docker-cluster");
}
