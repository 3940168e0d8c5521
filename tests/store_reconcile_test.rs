mod common;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{product_json, TestApp};
use watchstore_core::cache::{keys, MirrorStore};
use watchstore_core::errors::StoreError;
use watchstore_core::events::Notice;
use watchstore_core::store::{ListFilter, Pagination, SortKey};

fn search(term: &str) -> ListFilter {
    ListFilter {
        search: Some(term.to_string()),
        ..ListFilter::default()
    }
}

#[tokio::test]
async fn test_unfiltered_refetch_is_served_from_the_mirror() {
    let app = TestApp::new().await;
    let store = app.product_store();

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            product_json("p1", "Seiko 5", 2_500_000),
            product_json("p2", "Citizen Eco-Drive", 4_200_000),
        ])))
        .expect(1)
        .mount(&app.server)
        .await;

    let first = store.fetch_all(&ListFilter::default(), false).await.unwrap();
    assert_eq!(first.total, 2);

    // Second unforced, unfiltered load never leaves the process.
    let second = store.fetch_all(&ListFilter::default(), false).await.unwrap();
    assert_eq!(second.total, 2);
    assert_eq!(
        second.items.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        first.items.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
    );
}

#[tokio::test]
async fn test_force_refresh_always_goes_to_the_network() {
    let app = TestApp::new().await;
    let store = app.product_store();

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            product_json("p1", "Seiko 5", 2_500_000),
        ])))
        .expect(2)
        .mount(&app.server)
        .await;

    store.fetch_all(&ListFilter::default(), false).await.unwrap();
    store.fetch_all(&ListFilter::default(), true).await.unwrap();
}

#[tokio::test]
async fn test_refetch_merge_keeps_fields_the_backend_omits() {
    let app = TestApp::new().await;
    let store = app.product_store();

    let mut detailed = product_json("p1", "Seiko 5", 2_500_000);
    detailed["description"] = json!("Máy cơ tự động, kính cứng");
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([detailed])))
        .up_to_n_times(1)
        .mount(&app.server)
        .await;
    // The trimmed list payload drops the description.
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            product_json("p1", "Seiko 5 SNK809", 2_650_000),
        ])))
        .mount(&app.server)
        .await;

    store.fetch_all(&ListFilter::default(), false).await.unwrap();
    let merged = store.fetch_all(&ListFilter::default(), true).await.unwrap();

    assert_eq!(merged.items.len(), 1);
    let product = &merged.items[0];
    assert_eq!(product.name, "Seiko 5 SNK809");
    assert_eq!(product.price, 2_650_000);
    assert_eq!(
        product.description.as_deref(),
        Some("Máy cơ tự động, kính cứng")
    );
}

#[tokio::test]
async fn test_fetch_failure_keeps_the_previous_list() {
    let mut app = TestApp::new().await;
    let store = app.product_store();

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            product_json("p1", "Seiko 5", 2_500_000),
            product_json("p2", "Citizen Eco-Drive", 4_200_000),
        ])))
        .up_to_n_times(1)
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.server)
        .await;

    store.fetch_all(&ListFilter::default(), false).await.unwrap();
    let err = store
        .fetch_all(&ListFilter::default(), true)
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::RemoteCall { status: 500, .. }));
    let snapshot = store.snapshot();
    assert_eq!(snapshot.total, 2);

    // The transport already raised the fault; the store must not
    // stack a second toast on top.
    let notices = app.drain_notices();
    let faults = notices
        .iter()
        .filter(|n| matches!(n, Notice::SystemFault { .. }))
        .count();
    assert_eq!(faults, 1);
    assert_eq!(notices.len(), 1);
}

#[tokio::test]
async fn test_update_pins_the_record_until_the_sweep() {
    let app = TestApp::new().await;
    let store = app.product_store();

    let mut older = product_json("p-old", "Orient Bambino", 3_100_000);
    older["createdAt"] = json!("2024-01-01T08:00:00Z");
    let mut newer = product_json("p-new", "Tissot PRX", 9_400_000);
    newer["createdAt"] = json!("2024-02-01T08:00:00Z");
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([older, newer])))
        .mount(&app.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/products/p-old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&app.server)
        .await;

    let seeded = store.fetch_all(&ListFilter::default(), false).await.unwrap();
    assert_eq!(seeded.items[0].id, "p-new");

    let updated = store
        .update("p-old", json!({ "price": 3_350_000 }))
        .await
        .unwrap();
    assert_eq!(updated.price, 3_350_000);
    assert!(updated.updated_at.is_some());

    // Freshly edited records ride on top even against the active sort.
    let resorted =
        store.handle_table_change(Pagination::default(), Some(SortKey::descending("createdAt")));
    assert_eq!(resorted.items[0].id, "p-old");

    store.recency().sweep_now();
    let settled =
        store.handle_table_change(Pagination::default(), Some(SortKey::descending("createdAt")));
    assert_eq!(settled.items[0].id, "p-new");
    assert_eq!(settled.items[1].id, "p-old");
}

#[tokio::test]
async fn test_create_prepends_and_persists_aliased_ids() {
    let mut app = TestApp::new().await;
    let store = app.product_store();

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            product_json("p1", "Seiko 5", 2_500_000),
        ])))
        .mount(&app.server)
        .await;
    // Creation responses come back enveloped and with the verbose id key.
    Mock::given(method("POST"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "productId": 99,
                "name": "Vostok Amphibia",
                "price": 1_800_000,
                "quantity": 5,
                "status": "active",
            }
        })))
        .mount(&app.server)
        .await;

    store.fetch_all(&ListFilter::default(), false).await.unwrap();
    let created = store
        .create(json!({ "name": "Vostok Amphibia", "price": 1_800_000 }))
        .await
        .unwrap();
    assert_eq!(created.id, "99");

    let snapshot = store.snapshot();
    assert_eq!(snapshot.total, 2);
    assert_eq!(snapshot.items[0].id, "99");

    let mirrored = app
        .mirror
        .load(keys::PRODUCTS)
        .await
        .unwrap()
        .expect("mirror written");
    assert!(mirrored.contains("\"99\""));

    assert!(app
        .drain_notices()
        .iter()
        .any(|n| n.message() == "Thêm mới thành công"));
}

#[tokio::test]
async fn test_delete_drops_the_record_and_its_pin() {
    let mut app = TestApp::new().await;
    let store = app.product_store();

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            product_json("p1", "Seiko 5", 2_500_000),
            product_json("p2", "Citizen Eco-Drive", 4_200_000),
        ])))
        .mount(&app.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/products/p2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.server)
        .await;

    store.fetch_all(&ListFilter::default(), false).await.unwrap();
    store.delete("p2").await.unwrap();

    let snapshot = store.snapshot();
    assert_eq!(snapshot.total, 1);
    assert!(snapshot.items.iter().all(|p| p.id != "p2"));
    assert!(app
        .drain_notices()
        .iter()
        .any(|n| n.message() == "Xóa thành công"));
}

#[tokio::test]
async fn test_filtered_fetch_bypasses_the_mirror_and_filters_client_side() {
    let app = TestApp::new().await;
    let store = app.product_store();

    let mut quartz = product_json("p2", "Dong ho quartz", 1_200_000);
    quartz["status"] = json!("inactive");
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            product_json("p1", "Đồng Hồ Cơ", 5_000_000),
            quartz,
            product_json("p3", "Casio F-91W", 450_000),
        ])))
        .expect(2)
        .mount(&app.server)
        .await;

    store.fetch_all(&ListFilter::default(), false).await.unwrap();

    let filter = ListFilter {
        status: Some("active".to_string()),
        ..search("dong ho")
    };
    let filtered = store.fetch_all(&filter, false).await.unwrap();

    assert_eq!(filtered.items.len(), 1);
    assert_eq!(filtered.items[0].id, "p1");

    // Filtered views never clobber the mirrored full list.
    let full = store.fetch_all(&ListFilter::default(), false).await.unwrap();
    assert_eq!(full.total, 3);
}
