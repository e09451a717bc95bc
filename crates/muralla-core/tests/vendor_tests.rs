use muralla_core::api::{
    ApiError, ApifyClient, DatasetKind, FlowkickClient, GenerateRequest, PlacesClient,
};
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_dataset(server: &MockServer, dataset: &str, item: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/datasets/{dataset}/items")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([item])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn find_datasets_sniffs_newest_match_per_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/actor-runs"))
        .and(query_param("token", "tok"))
        .and(query_param("status", "SUCCEEDED"))
        .and(query_param("desc", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"items": [
                {"id": "r1", "defaultDatasetId": "comments-new"},
                {"id": "r2"},
                {"id": "r3", "defaultDatasetId": "posts"},
                {"id": "r4", "defaultDatasetId": "broken"},
                {"id": "r5", "defaultDatasetId": "comments-old"}
            ]}
        })))
        .mount(&server)
        .await;

    let comment = json!({
        "text": "rico",
        "ownerUsername": "ana",
        "postUrl": "https://www.instagram.com/p/Cx1/"
    });
    let post = json!({"shortCode": "Cx1", "displayUrl": "https://scontent.cdninstagram.com/a.jpg"});
    mount_dataset(&server, "comments-new", comment).await;
    mount_dataset(&server, "posts", post).await;
    mount_dataset(&server, "comments-old", json!({"text": "viejo", "ownerUsername": "bea"})).await;
    Mock::given(method("GET"))
        .and(path("/datasets/broken/items"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let apify = ApifyClient::with_client(Client::new(), server.uri(), "tok", None);
    let found = apify
        .find_datasets(&[DatasetKind::InstagramPosts, DatasetKind::InstagramComments])
        .await
        .unwrap();

    assert_eq!(found[&DatasetKind::InstagramPosts].id, "r3");
    assert_eq!(found[&DatasetKind::InstagramComments].id, "r1");
}

#[tokio::test]
async fn find_datasets_without_runs_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/actor-runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"items": []}})))
        .mount(&server)
        .await;

    let apify = ApifyClient::with_client(Client::new(), server.uri(), "tok", Some("user-1".into()));
    let err = apify.find_datasets(&[DatasetKind::MapsPlace]).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn run_actor_posts_input_and_returns_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/acts/apify~instagram-profile-scraper/runs"))
        .and(query_param("token", "tok"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"id": "run-9", "defaultDatasetId": "ds-9", "status": "RUNNING"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let apify = ApifyClient::with_client(Client::new(), server.uri(), "tok", None);
    let run = apify
        .run_actor("apify~instagram-profile-scraper", &json!({"usernames": ["muralla.cafe"]}))
        .await
        .unwrap();
    assert_eq!(run.id, "run-9");
    assert_eq!(run.default_dataset_id.as_deref(), Some("ds-9"));
}

fn flowkick_for(server: &MockServer) -> FlowkickClient {
    FlowkickClient::with_client(
        Client::new(),
        "fk-key",
        format!("{}/api/verification/generate", server.uri()),
        format!("{}/api/verification/check", server.uri()),
    )
}

#[tokio::test]
async fn flowkick_html_body_is_not_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verification/generate"))
        .and(header("authorization", "Bearer fk-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Error</html>"))
        .mount(&server)
        .await;

    let request = GenerateRequest {
        external_user_id: json!("mesa-4"),
        ..Default::default()
    };
    let err = flowkick_for(&server).generate(&request).await.unwrap_err();
    match err {
        ApiError::NotJson { status, preview } => {
            assert_eq!(status, 200);
            assert_eq!(preview, "<html>Error</html>");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn flowkick_vendor_error_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/verification/check"))
        .and(query_param("session", "s-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "unknown session"})))
        .mount(&server)
        .await;

    let err = flowkick_for(&server).check("s-1").await.unwrap_err();
    assert_eq!(err.upstream_status(), Some(404));
    assert!(matches!(err, ApiError::Vendor { body, .. } if body["error"] == "unknown session"));
}

#[tokio::test]
async fn places_reviews_are_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/place/details/json"))
        .and(query_param("place_id", "ChIJ"))
        .and(query_param("key", "gkey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "result": {
                "rating": 4.7,
                "user_ratings_total": 321,
                "reviews": [
                    {"author_name": "Ana", "rating": 5, "text": "Excelente", "time": 1730000000,
                     "profile_photo_url": "", "relative_time_description": "hace una semana"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let places = PlacesClient::with_client(Client::new(), server.uri(), "gkey");
    let reviews = places.reviews("ChIJ").await.unwrap();
    assert_eq!(reviews.rating, 4.7);
    assert_eq!(reviews.reviews.len(), 1);
    assert_eq!(reviews.total_reviews, Some(321));
}

#[tokio::test]
async fn places_denied_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/place/details/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        })))
        .mount(&server)
        .await;

    let places = PlacesClient::with_client(Client::new(), server.uri(), "bad");
    let err = places.reviews("ChIJ").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(msg) if msg.contains("REQUEST_DENIED")));
}
