//! VNPay hosted-payment-page client.
//!
//! The gateway is driven entirely through URLs: we build a signed payment
//! URL, the shopper pays on VNPay's page, and VNPay redirects back with
//! signed result parameters. Requests and responses are both plain query
//! strings, signed with HMAC-SHA512 over the alphabetically sorted,
//! form-urlencoded parameter list.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use sha2::Sha512;
use tracing::{info, instrument, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use url::form_urlencoded;

use crate::config::VnpayConfig;
use crate::entities::OrderDraft;
use crate::errors::StoreError;

type HmacSha512 = Hmac<Sha512>;

const VNPAY_VERSION: &str = "2.1.0";
const VNPAY_COMMAND_PAY: &str = "pay";
const VNPAY_CURRENCY: &str = "VND";
const VNPAY_LOCALE: &str = "vn";
const VNPAY_ORDER_TYPE: &str = "other";
// The storefront runs in the browser and cannot see its own public address.
const VNPAY_CLIENT_IP: &str = "127.0.0.1";
const VNPAY_DATE_FORMAT: &str = "%Y%m%d%H%M%S";
const MAX_ORDER_INFO_LEN: usize = 100;

const REQUIRED_RETURN_PARAMS: &[&str] = &[
    "vnp_Amount",
    "vnp_ResponseCode",
    "vnp_TxnRef",
    "vnp_SecureHash",
];

// All gateway timestamps are Vietnam local time.
static VNPAY_TZ: Lazy<FixedOffset> =
    Lazy::new(|| FixedOffset::east_opt(7 * 3600).expect("UTC+7 is a valid offset"));

/// Where to send the shopper, plus the transaction reference we used.
#[derive(Debug, Clone)]
pub struct GatewayRedirect {
    pub payment_url: String,
    pub txn_ref: String,
}

/// Outcome of checking the redirect-back parameters.
#[derive(Debug, Clone)]
pub struct ReturnValidation {
    /// All required parameters present and the signature checks out.
    pub is_valid: bool,
    pub missing: Vec<String>,
    pub signature_valid: bool,
    pub response_code: Option<String>,
    /// Response code is "00". Independent of `is_valid`; the orchestrator
    /// requires both.
    pub is_success: bool,
}

/// Interpreted payment result, ready for user-facing reporting.
#[derive(Debug, Clone)]
pub struct PaymentResult {
    pub success: bool,
    pub message: String,
    pub response_code: Option<String>,
    pub transaction_id: Option<String>,
    pub txn_ref: Option<String>,
    pub bank_code: Option<String>,
    /// Back in whole VND, the wire carries it multiplied by 100.
    pub amount: Option<i64>,
}

#[derive(Clone)]
pub struct VnpayGateway {
    config: VnpayConfig,
}

impl VnpayGateway {
    pub fn new(config: VnpayConfig) -> Self {
        Self { config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Builds a signed payment URL for the given whole-VND amount.
    ///
    /// No remote call happens here; handing the URL to the shopper is the
    /// caller's job.
    #[instrument(skip(self, order_info))]
    pub fn submit_order(&self, amount: i64, order_info: &str) -> Result<GatewayRedirect, StoreError> {
        if amount <= 0 {
            return Err(StoreError::Gateway(
                "Số tiền thanh toán không hợp lệ".to_string(),
            ));
        }
        if !self.config.is_configured() {
            return Err(StoreError::Gateway(
                "Cổng thanh toán chưa được cấu hình".to_string(),
            ));
        }

        let now = Utc::now().with_timezone(&*VNPAY_TZ);
        let txn_ref = now.format("%d%H%M%S%3f").to_string();
        let payment_url = self.build_payment_url(amount, order_info, &txn_ref, now);
        info!(%txn_ref, amount, "payment url issued");
        Ok(GatewayRedirect {
            payment_url,
            txn_ref,
        })
    }

    fn build_payment_url(
        &self,
        amount: i64,
        order_info: &str,
        txn_ref: &str,
        now: DateTime<FixedOffset>,
    ) -> String {
        let expire = now + Duration::minutes(self.config.expire_minutes);

        let mut params = BTreeMap::new();
        params.insert("vnp_Version", VNPAY_VERSION.to_string());
        params.insert("vnp_Command", VNPAY_COMMAND_PAY.to_string());
        params.insert("vnp_TmnCode", self.config.tmn_code.clone());
        params.insert("vnp_Locale", VNPAY_LOCALE.to_string());
        params.insert("vnp_CurrCode", VNPAY_CURRENCY.to_string());
        params.insert("vnp_TxnRef", txn_ref.to_string());
        params.insert("vnp_OrderInfo", sanitize_order_info(order_info));
        params.insert("vnp_OrderType", VNPAY_ORDER_TYPE.to_string());
        // Wire amounts are in hundredths of a VND.
        params.insert("vnp_Amount", (amount * 100).to_string());
        params.insert("vnp_ReturnUrl", self.config.return_url.clone());
        params.insert("vnp_IpAddr", VNPAY_CLIENT_IP.to_string());
        params.insert(
            "vnp_CreateDate",
            now.format(VNPAY_DATE_FORMAT).to_string(),
        );
        params.insert(
            "vnp_ExpireDate",
            expire.format(VNPAY_DATE_FORMAT).to_string(),
        );

        let query = encode_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        let secure_hash = self.sign(&query);
        format!(
            "{}?{}&vnp_SecureHash={}",
            self.config.payment_url, query, secure_hash
        )
    }

    /// Checks the redirect-back parameters: required fields, signature,
    /// response code.
    pub fn validate_return(&self, params: &BTreeMap<String, String>) -> ReturnValidation {
        let missing: Vec<String> = REQUIRED_RETURN_PARAMS
            .iter()
            .filter(|key| params.get(**key).map_or(true, |v| v.is_empty()))
            .map(|key| key.to_string())
            .collect();

        let signature_valid = match params.get("vnp_SecureHash") {
            Some(provided) if !provided.is_empty() => {
                let signed = encode_pairs(params.iter().filter_map(|(k, v)| {
                    let keep = k.starts_with("vnp_")
                        && k != "vnp_SecureHash"
                        && k != "vnp_SecureHashType";
                    keep.then_some((k.as_str(), v.as_str()))
                }));
                constant_time_eq(&self.sign(&signed), &provided.to_lowercase())
            }
            _ => false,
        };

        let response_code = params.get("vnp_ResponseCode").cloned();
        let is_success = response_code.as_deref() == Some("00");

        ReturnValidation {
            is_valid: missing.is_empty() && signature_valid,
            missing,
            signature_valid,
            response_code,
            is_success,
        }
    }

    /// Turns the redirect-back parameters into a user-reportable result.
    pub fn process_payment(&self, params: &BTreeMap<String, String>) -> PaymentResult {
        let validation = self.validate_return(params);

        let message = if !validation.missing.is_empty() {
            warn!(missing = ?validation.missing, "gateway return is missing parameters");
            format!(
                "Thiếu tham số trả về từ cổng thanh toán: {}",
                validation.missing.join(", ")
            )
        } else if !validation.signature_valid {
            warn!("gateway return signature mismatch");
            "Chữ ký phản hồi từ cổng thanh toán không hợp lệ".to_string()
        } else {
            response_code_message(validation.response_code.as_deref().unwrap_or("99")).to_string()
        };

        PaymentResult {
            success: validation.is_valid && validation.is_success,
            message,
            response_code: validation.response_code,
            transaction_id: params.get("vnp_TransactionNo").cloned(),
            txn_ref: params.get("vnp_TxnRef").cloned(),
            bank_code: params.get("vnp_BankCode").cloned(),
            amount: params
                .get("vnp_Amount")
                .and_then(|raw| raw.parse::<i64>().ok())
                .map(|minor| minor / 100),
        }
    }

    fn sign(&self, data: &str) -> String {
        let mut mac = HmacSha512::new_from_slice(self.config.hash_secret.as_bytes())
            .expect("hmac accepts keys of any length");
        mac.update(data.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Form-urlencodes pairs in iteration order. Callers pass sorted maps, which
/// is what the gateway's signature scheme expects.
fn encode_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Gateway-facing order description for a checkout draft.
pub fn create_order_info(draft: &OrderDraft) -> String {
    sanitize_order_info(&format!(
        "Thanh toan don hang cua {} - {} san pham",
        draft.receiver_name,
        draft.item_count()
    ))
}

/// Folds diacritics to ASCII, drops anything else non-ASCII, caps at 100
/// characters. The gateway rejects descriptions outside that shape.
pub fn sanitize_order_info(raw: &str) -> String {
    let folded: String = raw
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .filter(char::is_ascii)
        .collect();
    folded.trim().chars().take(MAX_ORDER_INFO_LEN).collect()
}

/// Maps the published `vnp_ResponseCode` table to user-facing Vietnamese.
pub fn response_code_message(code: &str) -> &'static str {
    match code {
        "00" => "Giao dịch thành công",
        "07" => "Giao dịch bị nghi ngờ gian lận, vui lòng liên hệ ngân hàng",
        "09" => "Thẻ/Tài khoản chưa đăng ký dịch vụ InternetBanking",
        "10" => "Xác thực thông tin thẻ/tài khoản sai quá 3 lần",
        "11" => "Đã hết hạn chờ thanh toán, vui lòng thực hiện lại",
        "12" => "Thẻ/Tài khoản đang bị khóa",
        "13" => "Nhập sai mật khẩu xác thực (OTP), vui lòng thực hiện lại",
        "24" => "Giao dịch đã bị hủy",
        "51" => "Tài khoản không đủ số dư để thực hiện giao dịch",
        "65" => "Tài khoản đã vượt quá hạn mức giao dịch trong ngày",
        "75" => "Ngân hàng thanh toán đang bảo trì",
        "79" => "Nhập sai mật khẩu thanh toán quá số lần quy định",
        _ => "Giao dịch không thành công, vui lòng thử lại sau",
    }
}
