//! End-to-end webhook tests: router, dispatcher and real HTTP clients
//! pointed at mock Jira and GitHub servers.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use jira_sync::config::Config;
use jira_sync::server::{build_router, AppState};
use serde_json::{json, Value};
use std::collections::HashMap;
use tower::ServiceExt;
use wiremock::matchers::{basic_auth, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(jira: &MockServer, github: &MockServer, extra: &[(&str, &str)]) -> Router {
    let mut vars: HashMap<String, String> = [
        ("JIRA_BASE_URL", jira.uri()),
        ("JIRA_USER_EMAIL", "bot@example.com".to_string()),
        ("JIRA_API_TOKEN", "jira-token".to_string()),
        ("GITHUB_TOKEN", "gh-token".to_string()),
        ("GITHUB_API_URL", github.uri()),
        ("HTTP_TIMEOUT_SECS", "5".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    for (k, v) in extra {
        vars.insert((*k).to_string(), (*v).to_string());
    }

    let config = Config::from_lookup(|key| vars.get(key).cloned());
    build_router(AppState::from_config(&config))
}

async fn send(app: Router, event: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/github")
        .header("content-type", "application/json")
        .header("x-github-event", event)
        .header("x-github-delivery", "delivery-1")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn pull_request(action: &str, title: &str, branch: &str, merged: bool) -> Value {
    json!({
        "action": action,
        "number": 42,
        "pull_request": {
            "number": 42,
            "title": title,
            "body": null,
            "state": if action == "closed" { "closed" } else { "open" },
            "merged": merged,
            "html_url": "https://github.com/acme/widgets/pull/42",
            "user": { "login": "dev" },
            "head": { "sha": "0123456789abcdef0123456789abcdef01234567", "ref": branch },
            "base": {
                "ref": "main",
                "repo": { "name": "widgets", "owner": { "login": "acme" } }
            }
        }
    })
}

async fn mount_workflow(jira: &MockServer, key: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/api/3/issue/{key}/transitions")))
        .and(basic_auth("bot@example.com", "jira-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transitions": [
                { "id": "11", "name": "Start Progress", "to": { "name": "In Progress" } },
                { "id": "21", "name": "Request Review", "to": { "name": "In Review" } },
                { "id": "31", "name": "Close", "to": { "name": "Done" } }
            ]
        })))
        .mount(jira)
        .await;
}

#[tokio::test]
async fn pr_opened_comments_and_transitions_ticket() {
    let jira = MockServer::start().await;
    let github = MockServer::start().await;
    mount_workflow(&jira, "PROJ-123").await;

    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/PROJ-123/comment"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "1" })))
        .expect(1)
        .mount(&jira)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/PROJ-123/transitions"))
        .and(body_json(json!({ "transition": { "id": "21" } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&jira)
        .await;

    let body = pull_request("opened", "PROJ-123: Add new feature", "feature/x", false);
    let (status, value) = send(app(&jira, &github, &[]), "pull_request", &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "success");
    assert_eq!(value["message"], "PR #42 opened: PROJ-123: Add new feature");
    assert_eq!(value["jira_keys"], json!(["PROJ-123"]));
    assert_eq!(
        value["results"],
        json!([{ "success": true, "message": "Transitioned PROJ-123 to In Review" }])
    );
}

#[tokio::test]
async fn pr_opened_without_key_asks_for_reference() {
    let jira = MockServer::start().await;
    let github = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/issues/42/comments"))
        .and(header("authorization", "Bearer gh-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 9 })))
        .expect(1)
        .mount(&github)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&jira)
        .await;

    let body = pull_request("opened", "Add feature", "feature/x", false);
    let (status, value) = send(app(&jira, &github, &[]), "pull_request", &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["jira_keys"], json!([]));
    assert_eq!(
        value["results"],
        json!([{ "success": true, "message": "No Jira keys found in PR - comment added" }])
    );
}

#[tokio::test]
async fn pr_merged_with_rejected_transition_still_succeeds() {
    let jira = MockServer::start().await;
    let github = MockServer::start().await;
    mount_workflow(&jira, "PROJ-7").await;

    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/PROJ-7/comment"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&jira)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/PROJ-7/transitions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("resolution required"))
        .expect(1)
        .mount(&jira)
        .await;

    let body = pull_request("closed", "Finish login", "feature/PROJ-7-login", true);
    let (status, value) = send(app(&jira, &github, &[]), "pull_request", &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "success");
    assert_eq!(value["merged"], true);
    assert_eq!(value["message"], "PR #42 merged: Finish login");
    assert_eq!(
        value["results"],
        json!([{ "success": false, "message": "Failed to transition: resolution required" }])
    );
}

#[tokio::test]
async fn pr_synchronize_comments_when_enabled() {
    let jira = MockServer::start().await;
    let github = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/PROJ-1/comment"))
        .and(body_json(json!({
            "body": jira_sync::jira::adf_document("PR #42 updated with new commits. Latest: 0123456")
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "5" })))
        .expect(1)
        .mount(&jira)
        .await;

    let body = pull_request("synchronize", "PROJ-1: Login", "main-work", false);
    let app = app(&jira, &github, &[("COMMENT_ON_PR_SYNC", "true")]);
    let (status, value) = send(app, "pull_request", &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["message"], "PR #42 synchronized: 0123456");
    assert_eq!(
        value["results"],
        json!([{ "success": true, "message": "Added comment to PROJ-1" }])
    );
}

#[tokio::test]
async fn review_approved_without_status_makes_no_calls() {
    let jira = MockServer::start().await;
    let github = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&jira)
        .await;

    let mut body = pull_request("submitted", "PROJ-3: Thing", "feature/x", false);
    body["review"] = json!({ "state": "approved", "user": { "login": "carol" } });
    let (status, value) = send(app(&jira, &github, &[]), "pull_request_review", &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["review_state"], "approved");
    assert_eq!(value["reviewer"], "carol");
    assert_eq!(value["results"], json!([]));
}

#[tokio::test]
async fn push_collects_keys_from_commits() {
    let jira = MockServer::start().await;
    let github = MockServer::start().await;

    let body = json!({
        "ref": "refs/heads/main",
        "commits": [ { "message": "PROJ-1: a" }, { "message": "PROJ-2: b" } ]
    });
    let (status, value) = send(app(&jira, &github, &[]), "push", &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["commit_count"], 2);
    assert_eq!(value["ref"], "refs/heads/main");
    assert_eq!(value["jira_keys"], json!(["PROJ-1", "PROJ-2"]));
}

#[tokio::test]
async fn ping_is_acknowledged_without_outbound_calls() {
    let jira = MockServer::start().await;
    let github = MockServer::start().await;
    for server in [&jira, &github] {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(server)
            .await;
    }

    let body = json!({ "zen": "Keep it simple.", "hook_id": 12345 });
    let (status, value) = send(app(&jira, &github, &[]), "ping", &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["hook_id"], 12345);
    assert_eq!(value["zen"], "Keep it simple.");
    assert!(value["message"].as_str().unwrap().contains("Pong!"));
}

#[tokio::test]
async fn missing_review_section_is_rejected() {
    let jira = MockServer::start().await;
    let github = MockServer::start().await;

    let body = pull_request("submitted", "PROJ-3: Thing", "feature/x", false);
    let (status, value) = send(app(&jira, &github, &[]), "pull_request_review", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["status"], "error");
    assert_eq!(value["message"], "Payload does not contain review key");
    assert_eq!(value["action"], "submitted");
}
