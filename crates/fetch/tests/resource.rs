use farmacia_api_client::models::Product;
use farmacia_api_client::{ClientConfig, PrestashopClient, ProductQuery};
use farmacia_core::cache::{CacheConfig, TtlCache};
use farmacia_core::clock::ManualClock;
use farmacia_core::retry::RetryConfig;
use farmacia_fetch::{
    CategoryTreeQuery, FetchOutcome, ProductBySlugQuery, ProductListQuery, Resource, ResourceState,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> PrestashopClient {
    let config = ClientConfig::default()
        .with_base_url(format!("{}/api/prestashop", server.uri()))
        .with_api_key("WS-KEY")
        .with_timeout(Duration::from_secs(5))
        .with_retry(RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            jitter: false,
        });
    PrestashopClient::with_config(config).unwrap()
}

fn cache_with_clock() -> (Arc<TtlCache>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let cache = TtlCache::with_clock(CacheConfig::with_ttl(Duration::from_secs(60)), clock.clone());
    (Arc::new(cache), clock)
}

fn products_body(names: &[&str]) -> serde_json::Value {
    let records: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "id": i + 1,
                "name": name,
                "link_rewrite": name.to_lowercase(),
                "price": "4.20",
                "quantity": "5"
            })
        })
        .collect();
    json!({ "products": records })
}

fn placeholder_product() -> Product {
    serde_json::from_value(json!({
        "id": "0",
        "name": "Producto no disponible",
        "description": "",
        "shortDescription": "",
        "price": 0.0,
        "categoryId": "",
        "brand": "",
        "image": "/images/placeholder-product.svg",
        "images": ["/images/placeholder-product.svg"],
        "slug": "",
        "href": "",
        "inStock": false,
        "stockQuantity": 0,
        "rating": 0.0,
        "reviewCount": 0,
        "requiresPrescription": false,
        "tags": [],
        "specifications": {},
        "reference": "",
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z"
    }))
    .unwrap()
}

#[tokio::test]
async fn fresh_cache_entry_skips_the_network_until_it_expires() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prestashop/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body(&["Aspirina"])))
        .expect(2)
        .mount(&server)
        .await;

    let (cache, clock) = cache_with_clock();
    let resource = Resource::new(ProductListQuery, client_for(&server), cache.clone());
    let query = ProductQuery::new().with_category("3");

    assert!(resource.load(query.clone()).await.is_ok());
    assert_eq!(cache.len(), 1);

    // Served from cache
    clock.advance(Duration::from_secs(30));
    let cached = resource.load(query.clone()).await.into_data().unwrap();
    assert_eq!(cached[0].name, "Aspirina");

    // Expired: fetched again
    clock.advance(Duration::from_secs(31));
    assert!(resource.load(query).await.is_ok());
    assert_eq!(resource.generation(), 3);
}

#[tokio::test]
async fn refresh_bypasses_and_overwrites_the_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prestashop/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body(&["Aspirina"])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/prestashop/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body(&["Aspirina", "Ibuprofeno"])))
        .expect(1)
        .mount(&server)
        .await;

    let (cache, _clock) = cache_with_clock();
    let resource = Resource::new(ProductListQuery, client_for(&server), cache.clone());

    let first = resource.load(ProductQuery::new()).await.into_data().unwrap();
    assert_eq!(first.len(), 1);

    let refreshed = resource.refresh().await.into_data().unwrap();
    assert_eq!(refreshed.len(), 2);

    // The cache now holds the refreshed list
    let again = resource.load(ProductQuery::new()).await.into_data().unwrap();
    assert_eq!(again.len(), 2);
    assert_eq!(resource.state().data().map(Vec::len), Some(2));
}

#[tokio::test]
async fn refresh_to_empty_drops_the_cached_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prestashop/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body(&["Aspirina"])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/prestashop/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let (cache, _clock) = cache_with_clock();
    let resource = Resource::new(ProductListQuery, client_for(&server), cache.clone());

    assert!(resource.load(ProductQuery::new()).await.is_ok());
    assert_eq!(cache.len(), 1);

    assert!(matches!(resource.refresh().await, FetchOutcome::Empty));
    assert!(cache.is_empty());

    // Served from the network again, not the old listing
    assert!(matches!(resource.load(ProductQuery::new()).await, FetchOutcome::Empty));
    assert_eq!(resource.state(), ResourceState::Empty);
}

#[tokio::test]
async fn refresh_before_any_load_is_an_error() {
    let server = MockServer::start().await;
    let (cache, _clock) = cache_with_clock();
    let resource = Resource::new(CategoryTreeQuery, client_for(&server), cache);

    let outcome = resource.refresh().await;
    assert!(outcome.error().is_some());
    assert_eq!(resource.state(), ResourceState::Idle);
}

#[tokio::test]
async fn empty_listing_is_reported_and_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prestashop/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let (cache, _clock) = cache_with_clock();
    let resource = Resource::new(ProductListQuery, client_for(&server), cache.clone());

    assert!(matches!(resource.load(ProductQuery::new()).await, FetchOutcome::Empty));
    assert!(cache.is_empty());
    assert!(matches!(resource.load(ProductQuery::new()).await, FetchOutcome::Empty));

    let view = resource.view();
    assert_eq!(view.data, None);
    assert!(!view.is_placeholder);
    assert_eq!(view.error, None);
}

#[tokio::test]
async fn unknown_slug_settles_as_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prestashop/products"))
        .and(query_param("filter[link_rewrite]", "[crema-inexistente]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (cache, _clock) = cache_with_clock();
    let resource = Resource::new(ProductBySlugQuery, client_for(&server), cache);

    let outcome = resource.load("crema-inexistente".to_string()).await;
    assert!(matches!(outcome, FetchOutcome::Empty));
    assert_eq!(resource.state(), ResourceState::Empty);
}

#[tokio::test]
async fn failure_shows_placeholder_only_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prestashop/products"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "errors": [{"code": 46, "message": "Internal error"}]
        })))
        .expect(6)
        .mount(&server)
        .await;

    let (cache, _clock) = cache_with_clock();

    let bare = Resource::new(ProductListQuery, client_for(&server), cache.clone());
    assert!(bare.load(ProductQuery::new()).await.error().is_some());
    let view = bare.view();
    assert_eq!(view.data, None);
    assert!(view.error.is_some());

    let placeholder = vec![placeholder_product()];
    let with_fallback = Resource::new(ProductListQuery, client_for(&server), cache.clone())
        .with_placeholder(placeholder.clone());
    assert!(with_fallback.load(ProductQuery::new()).await.error().is_some());
    let view = with_fallback.view();
    assert_eq!(view.data, Some(placeholder));
    assert!(view.is_placeholder);
    assert!(view.error.is_some());
    assert!(matches!(with_fallback.state(), ResourceState::Failed(_)));

    assert!(cache.is_empty());
}

#[tokio::test]
async fn slower_earlier_load_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prestashop/products"))
        .and(query_param("filter[id_category_default]", "[1]"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(products_body(&["Lenta"]))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/prestashop/products"))
        .and(query_param("filter[id_category_default]", "[2]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body(&["Rapida"])))
        .expect(1)
        .mount(&server)
        .await;

    let (cache, _clock) = cache_with_clock();
    let resource = Resource::new(ProductListQuery, client_for(&server), cache.clone());

    let (slow, fast) = tokio::join!(
        resource.load(ProductQuery::new().with_category("1")),
        resource.load(ProductQuery::new().with_category("2")),
    );

    assert!(slow.is_stale());
    assert_eq!(fast.into_data().unwrap()[0].name, "Rapida");

    // The late response neither overwrote the state nor the params
    assert_eq!(resource.state().data().unwrap()[0].name, "Rapida");
    assert_eq!(resource.params().unwrap().category_id.as_deref(), Some("2"));

    // Both responses were still written through to the cache
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn invalidate_forces_the_next_load_to_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prestashop/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body(&["Aspirina"])))
        .expect(2)
        .mount(&server)
        .await;

    let (cache, _clock) = cache_with_clock();
    let resource = Resource::new(ProductListQuery, client_for(&server), cache.clone());

    assert!(!resource.invalidate());
    assert!(resource.load(ProductQuery::new()).await.is_ok());
    assert!(resource.invalidate());
    assert!(cache.is_empty());
    assert!(resource.load(ProductQuery::new()).await.is_ok());
}
