//! Checkout and payment orchestration.
//!
//! Two payment paths share one entry point: cash on delivery creates the
//! order immediately, VNPay stages the order locally and sends the shopper
//! to the hosted payment page. [`finalize_after_gateway_return`] picks the
//! flow back up after the redirect and creates the order exactly once, no
//! matter how many times the return page fires.
//!
//! [`finalize_after_gateway_return`]: CheckoutService::finalize_after_gateway_return

pub mod flight;
pub mod staging;
pub mod vnpay;

pub use flight::{FlightGuard, FlightTicket, SingleFlight};
pub use staging::{CompletedOrder, PendingOrder, StagingStore};
pub use vnpay::{GatewayRedirect, PaymentResult, ReturnValidation, VnpayGateway};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::{Validate, ValidationErrors};

use crate::client::SessionStore;
use crate::entities::{CartItem, OrderDraft, OrderStatus, PaymentMethod};
use crate::errors::StoreError;
use crate::events::{Notice, NoticeSender};
use crate::services::{CartService, OrderService};

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10,11}$").expect("phone pattern compiles"));

// Backends report an already-created order as "... #<id> ...".
static DUPLICATE_ORDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(\d+)").expect("duplicate order pattern compiles"));

/// Shipping details collected from the checkout form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    #[validate(length(min = 1, message = "Vui lòng nhập họ tên người nhận"))]
    pub receiver_name: String,
    #[validate(regex(path = "PHONE_RE", message = "Số điện thoại phải gồm 10-11 chữ số"))]
    pub receiver_phone: String,
    #[validate(length(min = 1, message = "Vui lòng nhập địa chỉ nhận hàng"))]
    pub receiver_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ShippingInfo {
    /// Trimmed copy, so whitespace-only input fails the emptiness checks.
    fn normalized(&self) -> ShippingInfo {
        ShippingInfo {
            receiver_name: self.receiver_name.trim().to_string(),
            receiver_phone: self.receiver_phone.trim().to_string(),
            receiver_address: self.receiver_address.trim().to_string(),
            note: self
                .note
                .as_deref()
                .map(str::trim)
                .filter(|note| !note.is_empty())
                .map(str::to_string),
        }
    }
}

/// What `submit_checkout` tells the caller to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// Order exists; show the confirmation screen.
    Created { order_id: String },
    /// Navigate the shopper to the gateway's payment page.
    RedirectToGateway {
        payment_url: String,
        temp_order_id: String,
    },
}

/// Result of the post-redirect finalize step.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeOutcome {
    pub order_id: String,
    /// True when this call replayed an earlier completion instead of
    /// creating the order itself.
    pub already_processed: bool,
}

/// Drives checkout from form submission to a created order.
#[derive(Clone)]
pub struct CheckoutService {
    orders: Arc<OrderService>,
    cart: Arc<CartService>,
    gateway: Arc<VnpayGateway>,
    staging: StagingStore,
    flight: Arc<SingleFlight>,
    session: Arc<SessionStore>,
    notices: NoticeSender,
}

impl CheckoutService {
    pub fn new(
        orders: Arc<OrderService>,
        cart: Arc<CartService>,
        gateway: Arc<VnpayGateway>,
        staging: StagingStore,
        flight: Arc<SingleFlight>,
        session: Arc<SessionStore>,
        notices: NoticeSender,
    ) -> Self {
        Self {
            orders,
            cart,
            gateway,
            staging,
            flight,
            session,
            notices,
        }
    }

    /// Validates the checkout form and runs the chosen payment path.
    ///
    /// Validation failures return before any remote call is made.
    #[instrument(skip(self, shipping, cart), fields(method = %method, items = cart.len()))]
    pub async fn submit_checkout(
        &self,
        shipping: &ShippingInfo,
        method: PaymentMethod,
        cart: &[CartItem],
    ) -> Result<CheckoutOutcome, StoreError> {
        if cart.is_empty() {
            return Err(StoreError::validation(
                ["cart"],
                "Giỏ hàng của bạn đang trống",
            ));
        }
        let Some(user_id) = self.session.user_id() else {
            return Err(StoreError::SessionExpired);
        };
        let shipping = shipping.normalized();
        shipping.validate().map_err(shipping_validation_error)?;

        let draft = build_draft(&user_id, &shipping, cart, method);
        match method {
            PaymentMethod::Cod => self.submit_cod(&user_id, draft).await,
            PaymentMethod::Vnpay => self.submit_vnpay(&user_id, draft).await,
        }
    }

    async fn submit_cod(
        &self,
        user_id: &str,
        draft: OrderDraft,
    ) -> Result<CheckoutOutcome, StoreError> {
        let order = match self.orders.create_order(&draft).await {
            Ok(order) => order,
            Err(err) => {
                self.notify_failure(&err).await;
                return Err(err);
            }
        };

        // The order exists; a cart-clear hiccup must not undo the checkout.
        self.clear_cart_best_effort(user_id).await;

        self.notices
            .send_or_log(Notice::success("Đặt hàng thành công"))
            .await;
        info!(order_id = %order.id, "checkout completed with cash on delivery");
        Ok(CheckoutOutcome::Created { order_id: order.id })
    }

    async fn submit_vnpay(
        &self,
        user_id: &str,
        draft: OrderDraft,
    ) -> Result<CheckoutOutcome, StoreError> {
        let order_info = vnpay::create_order_info(&draft);
        let temp_order_id = format!("{}-{}", Utc::now().timestamp_millis(), user_id);
        let pending = PendingOrder::new(
            temp_order_id.clone(),
            user_id.to_string(),
            draft,
            order_info.clone(),
        );

        // Staged before the URL is requested; must survive the redirect.
        self.staging.stage(&pending).await?;
        // A fresh attempt must not replay the previous checkout's order id.
        self.flight.reset().await;

        let redirect = match self.gateway.submit_order(pending.amount, &order_info) {
            Ok(redirect) => redirect,
            Err(err) => {
                // Staged record stays put so the shopper can retry payment.
                self.notify_failure(&err).await;
                return Err(err);
            }
        };

        info!(%temp_order_id, amount = pending.amount, "pending order staged, redirecting to gateway");
        Ok(CheckoutOutcome::RedirectToGateway {
            payment_url: redirect.payment_url,
            temp_order_id,
        })
    }

    /// Completes a VNPay checkout after the gateway redirects back.
    ///
    /// Safe to call any number of times per return: a single-flight
    /// coordinator serializes callers, the staged record remembers an
    /// already-created order id, and a server-side duplicate report is
    /// folded into success as the last line of defense.
    #[instrument(skip(self, params))]
    pub async fn finalize_after_gateway_return(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<FinalizeOutcome, StoreError> {
        let guard = match self.flight.begin().await {
            FlightTicket::Replay(order_id) => {
                return Ok(FinalizeOutcome {
                    order_id,
                    already_processed: true,
                });
            }
            FlightTicket::Entered(guard) => guard,
        };

        let Some(mut pending) = self.staging.pending().await? else {
            let err = StoreError::NotFound("đơn hàng đang chờ xử lý".to_string());
            self.notify_failure(&err).await;
            return Err(err);
        };

        if let Some(order_id) = pending.created_order_id.clone() {
            guard.resolve(order_id.clone());
            self.clear_cart_best_effort(&pending.customer_id).await;
            self.notices
                .send_or_log(Notice::warning("Đơn hàng đã được xử lý trước đó"))
                .await;
            return Ok(FinalizeOutcome {
                order_id,
                already_processed: true,
            });
        }

        let result = self.gateway.process_payment(params);
        if !result.success {
            // No order yet and the staged record stays intact, so the
            // shopper can retry payment from the cart.
            warn!(
                code = result.response_code.as_deref().unwrap_or("none"),
                "gateway reported an unsuccessful payment"
            );
            let err = StoreError::PaymentRejected {
                code: result.response_code.unwrap_or_else(|| "99".to_string()),
                reason: result.message,
            };
            self.notify_failure(&err).await;
            return Err(err);
        }

        pending.transaction_id = result.transaction_id.clone();
        pending.bank_code = result.bank_code.clone();
        pending.draft.status = OrderStatus::Confirmed;
        pending.draft.payment_method = PaymentMethod::Vnpay;
        pending.draft.transaction_id = result.transaction_id;
        pending.draft.bank_code = result.bank_code;
        if let Err(err) = self.staging.stage(&pending).await {
            warn!(%err, "failed to persist gateway result onto the staged order");
        }

        let (order_id, already_processed) = match self.orders.create_order(&pending.draft).await {
            Ok(order) => (order.id, false),
            Err(err) => match duplicate_order_id(&err) {
                Some(existing) => {
                    info!(order_id = %existing, "order already existed server side");
                    (existing, true)
                }
                None => {
                    // Cart untouched, staged record kept for recovery.
                    self.notify_failure(&err).await;
                    return Err(err);
                }
            },
        };

        pending.created_order_id = Some(order_id.clone());
        if let Err(err) = self.staging.stage(&pending).await {
            warn!(%err, "failed to record created order id on the staged order");
        }
        guard.resolve(order_id.clone());

        self.clear_cart_best_effort(&pending.customer_id).await;

        let completed = CompletedOrder {
            order_id: order_id.clone(),
            amount: pending.amount,
            payment_method: PaymentMethod::Vnpay,
            transaction_id: pending.transaction_id.clone(),
            bank_code: pending.bank_code.clone(),
            completed_at: Utc::now(),
        };
        if let Err(err) = self.staging.store_completed(&completed).await {
            warn!(%err, "failed to store the completed order slot");
        }
        if let Err(err) = self.staging.clear_pending().await {
            warn!(%err, "failed to clear the pending order slot");
        }

        let notice = if already_processed {
            Notice::warning("Đơn hàng đã được xử lý trước đó")
        } else {
            Notice::success("Đặt hàng thành công")
        };
        self.notices.send_or_log(notice).await;

        info!(%order_id, already_processed, "checkout finalized after gateway return");
        Ok(FinalizeOutcome {
            order_id,
            already_processed,
        })
    }

    /// Hands the thank-you page its one-shot completed-order record.
    pub async fn take_completed_order(&self) -> Result<Option<CompletedOrder>, StoreError> {
        self.staging.take_completed().await
    }

    async fn clear_cart_best_effort(&self, user_id: &str) {
        if let Err(err) = self.cart.clear_cart(user_id).await {
            warn!(%err, %user_id, "cart clear failed after successful order");
        }
    }

    async fn notify_failure(&self, err: &StoreError) {
        if !err.reported_at_transport() {
            self.notices.send_or_log(Notice::from_error(err)).await;
        }
    }
}

fn build_draft(
    user_id: &str,
    shipping: &ShippingInfo,
    cart: &[CartItem],
    method: PaymentMethod,
) -> OrderDraft {
    OrderDraft {
        user_id: user_id.to_string(),
        receiver_name: shipping.receiver_name.clone(),
        receiver_phone: shipping.receiver_phone.clone(),
        receiver_address: shipping.receiver_address.clone(),
        note: shipping.note.clone(),
        items: cart.iter().map(CartItem::to_draft_item).collect(),
        total_amount: crate::entities::cart_total(cart),
        payment_method: method,
        status: OrderStatus::Pending,
        transaction_id: None,
        bank_code: None,
    }
}

fn shipping_validation_error(errors: ValidationErrors) -> StoreError {
    let mut failed: Vec<(&str, String)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let message = field_errors
                .first()
                .and_then(|e| e.message.clone())
                .map(|m| m.into_owned())
                .unwrap_or_else(|| format!("Trường {field} không hợp lệ"));
            (field, message)
        })
        .collect();
    failed.sort_by_key(|(field, _)| *field);

    let fields: Vec<String> = failed.iter().map(|(field, _)| field.to_string()).collect();
    let message = failed
        .into_iter()
        .map(|(_, message)| message)
        .collect::<Vec<_>>()
        .join(". ");
    StoreError::validation(fields, message)
}

/// Extracts the existing order id from a server-side duplicate report.
fn duplicate_order_id(err: &StoreError) -> Option<String> {
    let StoreError::RemoteCall { message, .. } = err else {
        return None;
    };
    DUPLICATE_ORDER_RE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
