//! Shared harness for integration tests: a wiremock backend, an in-memory
//! mirror, a seeded session, and constructors for the pieces under test.

// Each test binary uses a different slice of the harness.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha512;
use tokio::sync::mpsc;
use url::form_urlencoded;
use wiremock::MockServer;

use watchstore_core::cache::MemoryMirror;
use watchstore_core::checkout::{CheckoutService, SingleFlight, StagingStore, VnpayGateway};
use watchstore_core::client::{ApiClient, Session, SessionStore};
use watchstore_core::config::{ApiConfig, StoreTuning, VnpayConfig};
use watchstore_core::entities::{CartItem, Order, Product};
use watchstore_core::events::{notice_channel, Notice, NoticeSender};
use watchstore_core::services::{CartService, OrderService, ProductService};
use watchstore_core::store::EntityStore;

pub const TEST_USER_ID: &str = "u-1";
pub const TEST_HASH_SECRET: &str = "INTEGRATIONTESTSECRET0001";

pub struct TestApp {
    pub server: MockServer,
    pub mirror: Arc<MemoryMirror>,
    pub session: Arc<SessionStore>,
    pub client: Arc<ApiClient>,
    pub notices: NoticeSender,
    pub notice_rx: mpsc::Receiver<Notice>,
}

impl TestApp {
    /// Harness with an authenticated session and an empty mirror.
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let mirror = Arc::new(MemoryMirror::new());
        let session = Arc::new(SessionStore::new(mirror.clone()));
        session
            .set(Session {
                token: "test-token".to_string(),
                user_id: TEST_USER_ID.to_string(),
                display_name: Some("Người dùng thử".to_string()),
            })
            .await;

        let (notices, notice_rx) = notice_channel(64);
        let api_config = ApiConfig {
            base_url: server.uri(),
            timeout_secs: 5,
        };
        let client = Arc::new(
            ApiClient::new(&api_config, session.clone(), notices.clone())
                .expect("client builds"),
        );

        Self {
            server,
            mirror,
            session,
            client,
            notices,
            notice_rx,
        }
    }

    pub fn tuning() -> StoreTuning {
        StoreTuning {
            touched_ttl_secs: 30,
            page_size: 10,
        }
    }

    pub fn vnpay_config() -> VnpayConfig {
        VnpayConfig {
            tmn_code: "TESTTMN1".to_string(),
            hash_secret: TEST_HASH_SECRET.to_string(),
            ..VnpayConfig::default()
        }
    }

    pub fn product_store(&self) -> EntityStore<Product> {
        EntityStore::new(
            Arc::new(ProductService::new(self.client.clone())),
            self.mirror.clone(),
            self.notices.clone(),
            &Self::tuning(),
        )
    }

    pub fn order_store(&self) -> EntityStore<Order> {
        EntityStore::new(
            Arc::new(OrderService::new(self.client.clone())),
            self.mirror.clone(),
            self.notices.clone(),
            &Self::tuning(),
        )
    }

    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(
            Arc::new(OrderService::new(self.client.clone())),
            Arc::new(CartService::new(self.client.clone())),
            Arc::new(VnpayGateway::new(Self::vnpay_config())),
            self.staging(),
            Arc::new(SingleFlight::new()),
            self.session.clone(),
            self.notices.clone(),
        )
    }

    pub fn staging(&self) -> StagingStore {
        StagingStore::new(self.mirror.clone())
    }

    /// Everything queued on the notice channel so far.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notice_rx.try_recv() {
            notices.push(notice);
        }
        notices
    }
}

pub fn order_draft(total_amount: i64) -> watchstore_core::entities::OrderDraft {
    use watchstore_core::entities::{OrderDraft, OrderDraftItem, OrderStatus, PaymentMethod};
    OrderDraft {
        user_id: TEST_USER_ID.to_string(),
        receiver_name: "Lê Văn Nam".to_string(),
        receiver_phone: "0905123456".to_string(),
        receiver_address: "27 Nguyễn Huệ, Huế".to_string(),
        note: None,
        items: vec![OrderDraftItem {
            product_id: "p1".to_string(),
            name: "Đồng hồ p1".to_string(),
            price: total_amount,
            quantity: 1,
        }],
        total_amount,
        payment_method: PaymentMethod::Vnpay,
        status: OrderStatus::Pending,
        transaction_id: None,
        bank_code: None,
    }
}

pub fn cart_item(id: &str, product_id: &str, price: i64, quantity: u32) -> CartItem {
    serde_json::from_value(json!({
        "id": id,
        "productId": product_id,
        "name": format!("Đồng hồ {product_id}"),
        "price": price,
        "quantity": quantity,
    }))
    .expect("cart item parses")
}

pub fn product_json(id: &str, name: &str, price: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "price": price,
        "quantity": 10,
        "status": "active",
        "createdAt": "2024-01-10T08:00:00Z",
        "updatedAt": "2024-01-10T08:00:00Z",
    })
}

/// Builds a redirect-back parameter map signed the way the gateway signs:
/// HMAC-SHA512 over the sorted, form-urlencoded `vnp_` parameters.
pub fn signed_return_params(amount: i64, response_code: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("vnp_Amount".to_string(), (amount * 100).to_string());
    params.insert("vnp_BankCode".to_string(), "NCB".to_string());
    params.insert("vnp_ResponseCode".to_string(), response_code.to_string());
    params.insert("vnp_TransactionNo".to_string(), "14422799".to_string());
    params.insert("vnp_TxnRef".to_string(), "0110300001".to_string());

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &params {
        serializer.append_pair(key, value);
    }
    let signed = serializer.finish();

    let mut mac = Hmac::<Sha512>::new_from_slice(TEST_HASH_SECRET.as_bytes())
        .expect("hmac accepts keys of any length");
    mac.update(signed.as_bytes());
    params.insert(
        "vnp_SecureHash".to_string(),
        hex::encode(mac.finalize().into_bytes()),
    );
    params
}
