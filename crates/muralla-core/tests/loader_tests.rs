use std::sync::Arc;

use muralla_core::{
    CacheFirstLoader, CacheStore, Domain, RefreshOutcome, Refresher, SourceDescriptor,
    SourceFetcher, Tier,
};
use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn products() -> SourceDescriptor {
    SourceDescriptor::new("products")
        .local("/assets/data/products.json")
        .remote("/api/products")
}

fn loader_for(server: &MockServer, dir: &TempDir) -> CacheFirstLoader {
    let cache = Arc::new(CacheStore::new(dir.path().to_path_buf()).unwrap());
    let base = Url::parse(&server.uri()).unwrap();
    let fetcher = SourceFetcher::new(Some(base)).unwrap();
    CacheFirstLoader::new(cache, fetcher)
}

#[tokio::test]
async fn cached_value_short_circuits_the_network() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let loader = loader_for(&server, &dir);
    let cached = json!([{"id": "cached", "name": "Cortado"}]);
    loader.cache().set("products", &cached);

    let (value, tier) = loader.load_with_tier(&products()).await.unwrap();
    assert_eq!(value, cached);
    assert_eq!(tier, Tier::Cache);
}

#[tokio::test]
async fn local_file_fills_the_cache() {
    let server = MockServer::start().await;
    let local = json!([{"id": "local", "name": "Latte", "tags": ["vegano"]}]);
    Mock::given(method("GET"))
        .and(path("/assets/data/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(local.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let loader = loader_for(&server, &dir);

    let (value, tier) = loader.load_with_tier(&products()).await.unwrap();
    assert_eq!(value, local);
    assert_eq!(tier, Tier::LocalFile);
    assert_eq!(loader.cache().get("products"), Some(local));
    assert!(dir.path().join("muralla_cache_products.json").exists());
}

#[tokio::test]
async fn cached_value_short_circuits_every_domain() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let loader = loader_for(&server, &dir);

    for domain in Domain::ALL {
        let cached = json!({"cached": domain.cache_key()});
        loader.cache().set(domain.cache_key(), &cached);

        let (value, tier) = loader.load_with_tier(&domain.descriptor()).await.unwrap();
        assert_eq!(value, cached, "{domain:?}");
        assert_eq!(tier, Tier::Cache, "{domain:?}");
    }
}

#[tokio::test]
async fn first_available_tier_fills_the_cache_for_every_domain() {
    let server = MockServer::start().await;
    for domain in Domain::ALL {
        let source = domain.descriptor();
        let body = json!({"from": domain.cache_key()});
        match (&source.local_url, &source.remote_url) {
            (Some(local), remote) => {
                Mock::given(method("GET"))
                    .and(path(local.as_str()))
                    .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
                    .expect(1)
                    .mount(&server)
                    .await;
                if let Some(remote) = remote {
                    Mock::given(method("GET"))
                        .and(path(remote.as_str()))
                        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
                        .expect(0)
                        .mount(&server)
                        .await;
                }
            }
            (None, Some(remote)) => {
                Mock::given(method("GET"))
                    .and(path(remote.as_str()))
                    .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
                    .expect(1)
                    .mount(&server)
                    .await;
            }
            (None, None) => unreachable!("{domain:?} has no source"),
        }
    }

    let dir = TempDir::new().unwrap();
    let loader = loader_for(&server, &dir);

    for domain in Domain::ALL {
        let source = domain.descriptor();
        let expected_tier = if source.local_url.is_some() {
            Tier::LocalFile
        } else {
            Tier::Remote
        };
        let expected = json!({"from": domain.cache_key()});

        let (value, tier) = loader.load_with_tier(&source).await.unwrap();
        assert_eq!(value, expected, "{domain:?}");
        assert_eq!(tier, expected_tier, "{domain:?}");
        assert_eq!(loader.cache().get(domain.cache_key()), Some(expected), "{domain:?}");
    }
}

#[tokio::test]
async fn remote_is_called_once_when_local_misses() {
    let server = MockServer::start().await;
    let remote = json!({"data": [{"sku": "ESP-01", "name": "Espresso", "unitPrice": 2200}]});
    Mock::given(method("GET"))
        .and(path("/assets/data/products.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let loader = loader_for(&server, &dir);

    let (value, tier) = loader.load_with_tier(&products()).await.unwrap();
    assert_eq!(value, remote);
    assert_eq!(tier, Tier::Remote);
}

#[tokio::test]
async fn every_tier_missing_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets/data/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let loader = loader_for(&server, &dir);

    assert!(loader.load(&products()).await.is_none());
    assert!(loader.cache().get("products").is_none());
}

#[tokio::test]
async fn refresh_with_identical_payload_leaves_cache_alone() {
    let server = MockServer::start().await;
    let payload = json!([{"id": "a", "title": "Jazz", "date": "2025-11-22"}]);
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let loader = loader_for(&server, &dir);
    loader.cache().set("events", &payload);
    let before = loader.cache().entry("events").unwrap();

    let source = SourceDescriptor::new("events").remote("/api/events");
    let mut calls = 0;
    let outcome = Refresher::new(loader.clone())
        .refresh(&source, |_| calls += 1)
        .await;

    assert_eq!(outcome, RefreshOutcome::Unchanged);
    assert_eq!(calls, 0);
    assert_eq!(loader.cache().entry("events").unwrap().timestamp, before.timestamp);
}

#[tokio::test]
async fn refresh_with_new_payload_writes_and_notifies_once() {
    let server = MockServer::start().await;
    let fresh = json!([{"id": "b", "title": "Poesía", "date": "2025-12-01"}]);
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fresh.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let loader = loader_for(&server, &dir);
    loader.cache().set("events", &json!([]));

    let source = SourceDescriptor::new("events")
        .local("/assets/data/events.json")
        .remote("/api/events");
    let mut seen = Vec::new();
    let outcome = Refresher::new(loader.clone())
        .refresh(&source, |value| seen.push(value))
        .await;

    assert_eq!(outcome, RefreshOutcome::Updated);
    assert_eq!(seen, vec![fresh.clone()]);
    assert_eq!(loader.cache().get("events"), Some(fresh));
}

#[tokio::test]
async fn refresh_failure_keeps_previous_value() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/today"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let loader = loader_for(&server, &dir);
    let cached = json!({"date": "2025-11-03", "items": []});
    loader.cache().set("today", &cached);

    let source = SourceDescriptor::new("today").remote("/api/today");
    let outcome = Refresher::new(loader.clone()).refresh(&source, |_| {}).await;

    assert_eq!(outcome, RefreshOutcome::Failed);
    assert_eq!(loader.cache().get("today"), Some(cached));

    let local_only = SourceDescriptor::new("blog").local("/assets/data/blog.json");
    let outcome = Refresher::new(loader).refresh(&local_only, |_| {}).await;
    assert_eq!(outcome, RefreshOutcome::NoRemote);
}
