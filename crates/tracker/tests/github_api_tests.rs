//! GitHub client wire-level tests against a mock server.
//!
//! These pin the request shapes the maintainer depends on: header set,
//! pagination, label-path encoding, the tolerated 404s, and how auth and
//! rate-limit responses map onto `TrackerError`.

use serde_json::json;
use tracker::{GitHubClient, IssueTracker, TrackerError};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

fn comment_json(id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "user": {"login": "bar"},
        "body": "a comment",
        "created_at": "2024-03-01T12:00:00Z",
        "updated_at": "2024-03-01T12:00:00Z"
    })
}

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(&server.uri(), TOKEN).unwrap()
}

// =============================================================================
// Identity and headers
// =============================================================================

#[tokio::test]
async fn test_bot_identity_is_fetched_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "shepherd-bot"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(client.bot_identity().await.unwrap(), "shepherd-bot");
    // Served from the cache; the mock's expect(1) verifies no second hit.
    assert_eq!(client.bot_identity().await.unwrap(), "shepherd-bot");
}

#[tokio::test]
async fn test_add_label_posts_a_label_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/o/r/issues/7/labels"))
        .and(header("accept", "application/vnd.github+json"))
        .and(header("x-github-api-version", "2022-11-28"))
        .and(body_json(json!({"labels": ["milestone/needs-approval"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .add_label("o", "r", 7, "milestone/needs-approval")
        .await
        .unwrap();
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn test_list_comments_follows_pages_until_a_short_one() {
    let server = MockServer::start().await;
    let full_page: Vec<_> = (0..100).map(comment_json).collect();
    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues/1/comments"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues/1/comments"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![comment_json(100)]))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let comments = client.list_comments("o", "r", 1).await.unwrap();

    assert_eq!(comments.len(), 101);
    assert_eq!(comments[0].id, 0);
    assert_eq!(comments[100].id, 100);
}

#[tokio::test]
async fn test_search_builds_the_milestone_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .and(query_param("q", r#"repo:o/r state:open milestone:"v1.8""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 1,
            "incomplete_results": false,
            "items": [{
                "number": 42,
                "state": "open",
                "title": "a milestone issue",
                "labels": [{"name": "kind/bug"}],
                "milestone": {"title": "v1.8"},
                "created_at": "2024-03-01T12:00:00Z"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let issues = client.list_milestone_issues("o", "r", "v1.8").await.unwrap();

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].number, 42);
    assert_eq!(issues[0].milestone_title(), Some("v1.8"));
}

// =============================================================================
// Tolerated 404s and path encoding
// =============================================================================

#[tokio::test]
async fn test_remove_label_encodes_the_slash_and_tolerates_absence() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/repos/o/r/issues/1/labels/priority%2Fcritical-urgent"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Label does not exist"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .remove_label("o", "r", 1, "priority/critical-urgent")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_comment_tolerates_one_already_gone() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/repos/o/r/issues/comments/5"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client.delete_comment("o", "r", 5).await.unwrap();
}

// =============================================================================
// Milestone clearing
// =============================================================================

#[tokio::test]
async fn test_clear_milestone_patches_it_to_null() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/repos/o/r/issues/7"))
        .and(body_json(json!({"milestone": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client.clear_milestone("o", "r", 7).await.unwrap();
}

// =============================================================================
// Error mapping
// =============================================================================

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.bot_identity().await.unwrap_err();
    assert!(matches!(err, TrackerError::AuthenticationFailed));
}

#[tokio::test]
async fn test_api_errors_surface_the_github_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/o/r/issues/1/comments"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Validation Failed"})),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.create_comment("o", "r", 1, "hello").await.unwrap_err();
    match err {
        TrackerError::Api { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Validation Failed");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_success_body_maps_to_invalid_response() {
    let server = MockServer::start().await;
    // A proxy can hand back HTML with a 200 status.
    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues/1/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.list_comments("o", "r", 1).await.unwrap_err();
    assert!(matches!(err, TrackerError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_exhausted_rate_limit_blocks_further_requests() {
    let server = MockServer::start().await;
    let reset = chrono::Utc::now().timestamp() + 3600;
    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues/1/comments"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", reset.to_string().as_str())
                .set_body_json(json!({"message": "API rate limit exceeded"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.list_comments("o", "r", 1).await.unwrap_err();
    assert!(matches!(err, TrackerError::RateLimited { .. }));

    // The second call fails client-side; the mock's expect(1) verifies the
    // server was not contacted again.
    let err = client.list_comments("o", "r", 1).await.unwrap_err();
    match err {
        TrackerError::RateLimited { reset_in_secs } => assert!(reset_in_secs <= 3600),
        other => panic!("expected rate limit error, got {other:?}"),
    }
}
