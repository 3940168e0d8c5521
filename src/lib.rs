//! Watch-store client core.
//!
//! The non-UI half of a watch-store e-commerce client: a REST client with
//! session handling, cache-reconciling entity list stores for the admin
//! back office, and the checkout/payment orchestration for the storefront
//! (cash on delivery and VNPay). The backend is an external collaborator
//! reached over REST; everything here sits between that wire and whatever
//! surface renders the data.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod cache;
pub mod checkout;
pub mod client;
pub mod config;
pub mod entities;
pub mod errors;
pub mod events;
pub mod services;
pub mod store;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cache::MirrorStore;
use crate::checkout::{CheckoutService, SingleFlight, StagingStore, VnpayGateway};
use crate::client::{ApiClient, SessionStore};
use crate::config::AppConfig;
use crate::entities::{
    AttributeType, AttributeValue, Brand, Category, Customer, Order, Product,
};
use crate::errors::StoreError;
use crate::events::{notice_channel, Notice, NoticeSender};
use crate::services::{
    AttributeTypeService, AttributeValueService, BrandService, CartService, CategoryService,
    CustomerService, OrderService, ProductService,
};
use crate::store::EntityStore;

/// Fully wired application core.
///
/// One of these per process: it owns the shared client, session, mirror and
/// notice channel, one entity store per admin collection, and the checkout
/// service. Embedding code holds it behind whatever state mechanism the UI
/// layer uses and drains the returned notice receiver for toasts.
#[derive(Clone)]
pub struct WatchStore {
    pub config: AppConfig,
    pub client: Arc<ApiClient>,
    pub session: Arc<SessionStore>,
    pub mirror: Arc<dyn MirrorStore>,
    pub notices: NoticeSender,

    pub products: EntityStore<Product>,
    pub categories: EntityStore<Category>,
    pub brands: EntityStore<Brand>,
    pub attribute_types: EntityStore<AttributeType>,
    pub attribute_values: EntityStore<AttributeValue>,
    pub orders: EntityStore<Order>,
    pub customers: EntityStore<Customer>,

    pub cart: Arc<CartService>,
    pub checkout: CheckoutService,
}

impl WatchStore {
    /// Wires the whole core from configuration.
    ///
    /// Restores any persisted session from the mirror, so a reloaded app
    /// keeps its login. Must be called from within a Tokio runtime; the
    /// entity stores spawn their recency sweepers on construction.
    pub async fn build(config: AppConfig) -> Result<(Self, mpsc::Receiver<Notice>), StoreError> {
        let (notices, notice_rx) = notice_channel(config.notice_channel_capacity);
        let mirror = cache::build_mirror(&config.mirror);

        let session = Arc::new(SessionStore::new(mirror.clone()));
        session.restore().await;

        let client = Arc::new(ApiClient::new(&config.api, session.clone(), notices.clone())?);

        let products = EntityStore::new(
            Arc::new(ProductService::new(client.clone())),
            mirror.clone(),
            notices.clone(),
            &config.store,
        );
        let categories = EntityStore::new(
            Arc::new(CategoryService::new(client.clone())),
            mirror.clone(),
            notices.clone(),
            &config.store,
        );
        let brands = EntityStore::new(
            Arc::new(BrandService::new(client.clone())),
            mirror.clone(),
            notices.clone(),
            &config.store,
        );
        let attribute_types = EntityStore::new(
            Arc::new(AttributeTypeService::new(client.clone())),
            mirror.clone(),
            notices.clone(),
            &config.store,
        );
        let attribute_values = EntityStore::new(
            Arc::new(AttributeValueService::new(client.clone())),
            mirror.clone(),
            notices.clone(),
            &config.store,
        );
        let order_service = Arc::new(OrderService::new(client.clone()));
        let orders = EntityStore::new(
            order_service.clone(),
            mirror.clone(),
            notices.clone(),
            &config.store,
        );
        let customers = EntityStore::new(
            Arc::new(CustomerService::new(client.clone())),
            mirror.clone(),
            notices.clone(),
            &config.store,
        );

        let cart = Arc::new(CartService::new(client.clone()));
        let checkout = CheckoutService::new(
            order_service,
            cart.clone(),
            Arc::new(VnpayGateway::new(config.vnpay.clone())),
            StagingStore::new(mirror.clone()),
            Arc::new(SingleFlight::new()),
            session.clone(),
            notices.clone(),
        );

        let app = Self {
            config,
            client,
            session,
            mirror,
            notices,
            products,
            categories,
            brands,
            attribute_types,
            attribute_values,
            orders,
            customers,
            cart,
            checkout,
        };
        Ok((app, notice_rx))
    }
}

pub mod prelude {
    pub use crate::cache::{build_mirror, FileMirror, MemoryMirror, MirrorStore};
    pub use crate::checkout::{
        CheckoutOutcome, CheckoutService, CompletedOrder, FinalizeOutcome, PendingOrder,
        ShippingInfo, SingleFlight, StagingStore, VnpayGateway,
    };
    pub use crate::client::{ApiClient, Session, SessionStore};
    pub use crate::config::{load_config, AppConfig};
    pub use crate::entities::*;
    pub use crate::errors::StoreError;
    pub use crate::events::{notice_channel, Notice, NoticeKind, NoticeSender};
    pub use crate::services::*;
    pub use crate::store::{
        EntityApi, EntityRecord, EntityStore, ListFilter, ListSnapshot, Pagination, SortDirection,
        SortKey,
    };
    pub use crate::WatchStore;
}
