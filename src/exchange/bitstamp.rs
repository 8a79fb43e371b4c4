use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::BitstampAuthenticated;
use crate::error::{TradeError, TradeResult};

pub const BITSTAMP_API: &str = "https://www.bitstamp.net";

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const MAX_ERROR_BODY: usize = 256;

/// reqwest-backed transport for the private API. Holds no credentials; the
/// caller passes key, signature and nonce with every call.
#[derive(Debug, Clone)]
pub struct BitstampClient {
    client: Client,
    base_url: String,
}

impl BitstampClient {
    pub fn new(ssl_uri: impl Into<String>, timeout: Option<Duration>) -> TradeResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TradeError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: ssl_uri.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/api/{}/", self.base_url, endpoint)
    }

    async fn post_signed<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        api_key: &str,
        signature: &str,
        nonce: u64,
        params: Vec<(&str, String)>,
    ) -> TradeResult<T> {
        let (status, body) = self.send_signed(endpoint, api_key, signature, nonce, params).await?;
        decode_body(status, &body)
    }

    async fn post_order(
        &self,
        endpoint: &str,
        api_key: &str,
        signature: &str,
        nonce: u64,
        amount: Decimal,
        price: Decimal,
    ) -> TradeResult<BitstampOrderResult> {
        let params = vec![("amount", amount.to_string()), ("price", price.to_string())];
        let (status, body) = self.send_signed(endpoint, api_key, signature, nonce, params).await?;
        decode_order_result(status, &body)
    }

    async fn send_signed(
        &self,
        endpoint: &str,
        api_key: &str,
        signature: &str,
        nonce: u64,
        params: Vec<(&str, String)>,
    ) -> TradeResult<(StatusCode, String)> {
        let url = self.endpoint_url(endpoint);

        let mut form: Vec<(&str, String)> = vec![
            ("key", api_key.to_string()),
            ("signature", signature.to_string()),
            ("nonce", nonce.to_string()),
        ];
        form.extend(params);

        debug!("POST {} (nonce {})", url, nonce);

        let resp = self.client.post(&url).form(&form).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        Ok((status, body))
    }
}

#[async_trait]
impl BitstampAuthenticated for BitstampClient {
    async fn open_orders(&self, api_key: &str, signature: &str, nonce: u64) -> TradeResult<Vec<BitstampOrder>> {
        self.post_signed("open_orders", api_key, signature, nonce, Vec::new())
            .await
    }

    async fn buy(
        &self,
        api_key: &str,
        signature: &str,
        nonce: u64,
        amount: Decimal,
        price: Decimal,
    ) -> TradeResult<BitstampOrderResult> {
        self.post_order("buy", api_key, signature, nonce, amount, price).await
    }

    async fn sell(
        &self,
        api_key: &str,
        signature: &str,
        nonce: u64,
        amount: Decimal,
        price: Decimal,
    ) -> TradeResult<BitstampOrderResult> {
        self.post_order("sell", api_key, signature, nonce, amount, price).await
    }

    async fn cancel_order(&self, api_key: &str, signature: &str, nonce: u64, order_id: u64) -> TradeResult<Value> {
        let params = vec![("id", order_id.to_string())];
        self.post_signed("cancel_order", api_key, signature, nonce, params)
            .await
    }

    async fn user_transactions(
        &self,
        api_key: &str,
        signature: &str,
        nonce: u64,
        limit: u64,
    ) -> TradeResult<Vec<BitstampUserTransaction>> {
        let params = vec![("limit", limit.to_string())];
        self.post_signed("user_transactions", api_key, signature, nonce, params)
            .await
    }
}

/// Decodes a response body. An undecodable body is a protocol error unless
/// the HTTP status already says the request failed.
fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> TradeResult<T> {
    match serde_json::from_str::<T>(body) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => Err(TradeError::Transport(format!(
            "HTTP {}: {}",
            status,
            truncate(body)
        ))),
        Err(err) => match embedded_error(body) {
            Some(message) => Err(TradeError::ExchangeProtocol(format!(
                "unexpected error response: {}",
                message
            ))),
            None => Err(TradeError::ExchangeProtocol(format!(
                "{} in response: {}",
                err,
                truncate(body)
            ))),
        },
    }
}

/// Decodes a `buy`/`sell` response. A failed HTTP status whose body names
/// neither an order nor a rejection is a transport failure.
fn decode_order_result(status: StatusCode, body: &str) -> TradeResult<BitstampOrderResult> {
    let result: BitstampOrderResult = decode_body(status, body)?;
    if !status.is_success() && result.id.is_none() && result.error_message().is_none() {
        return Err(TradeError::Transport(format!("HTTP {}: {}", status, truncate(body))));
    }
    Ok(result)
}

/// Extracts the `error` field from a body shaped like `{"error": ...}`.
fn embedded_error(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("error").and_then(error_message)
}

/// Flattens an exchange error payload into one message. The exchange sends
/// either a plain string or an object mapping field names to message lists.
pub fn error_message(error: &Value) -> Option<String> {
    fn collect(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Null => {}
            Value::String(s) => {
                let s = s.trim();
                if !s.is_empty() {
                    out.push(s.to_string());
                }
            }
            Value::Array(items) => items.iter().for_each(|item| collect(item, out)),
            Value::Object(fields) => fields.values().for_each(|item| collect(item, out)),
            other => out.push(other.to_string()),
        }
    }

    let mut messages = Vec::new();
    collect(error, &mut messages);
    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

// API Response Types

/// Entry of the `open_orders` listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BitstampOrder {
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    #[serde(deserialize_with = "de_datetime")]
    pub datetime: DateTime<Utc>,
    /// 0 for buy orders, 1 for sell orders.
    #[serde(rename = "type", deserialize_with = "de_int")]
    pub order_type: i64,
    pub price: Decimal,
    pub amount: Decimal,
}

/// Response to `buy`/`sell`: the created order, or an `error` payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BitstampOrderResult {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl BitstampOrderResult {
    /// The rejection message, if the exchange sent a non-empty one.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().and_then(error_message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitstampTransactionType {
    Deposit,
    Withdrawal,
    MarketTrade,
    Other(i64),
}

impl From<i64> for BitstampTransactionType {
    fn from(raw: i64) -> Self {
        match raw {
            0 => BitstampTransactionType::Deposit,
            1 => BitstampTransactionType::Withdrawal,
            2 => BitstampTransactionType::MarketTrade,
            other => BitstampTransactionType::Other(other),
        }
    }
}

/// Entry of the `user_transactions` listing. Amounts are signed from the
/// account's point of view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BitstampUserTransaction {
    #[serde(deserialize_with = "de_datetime")]
    pub datetime: DateTime<Utc>,
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    #[serde(rename = "type", deserialize_with = "de_int")]
    pub transaction_type: i64,
    #[serde(default)]
    pub usd: Decimal,
    #[serde(default)]
    pub btc: Decimal,
    #[serde(default)]
    pub fee: Decimal,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub order_id: Option<u64>,
    #[serde(default)]
    pub btc_usd: Option<Decimal>,
}

impl BitstampUserTransaction {
    pub fn kind(&self) -> BitstampTransactionType {
        BitstampTransactionType::from(self.transaction_type)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

impl IntOrString {
    fn into_i64<E: de::Error>(self) -> Result<i64, E> {
        match self {
            IntOrString::Int(v) => Ok(v),
            IntOrString::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected integer, got {:?}", s))),
        }
    }
}

fn de_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    IntOrString::deserialize(deserializer)?.into_i64()
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = de_int(deserializer)?;
    u64::try_from(raw).map_err(|_| de::Error::custom(format!("negative id {}", raw)))
}

fn de_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<IntOrString>::deserialize(deserializer)? {
        Some(raw) => {
            let raw = raw.into_i64::<D::Error>()?;
            u64::try_from(raw)
                .map(Some)
                .map_err(|_| de::Error::custom(format!("negative id {}", raw)))
        }
        None => Ok(None),
    }
}

fn de_datetime<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw).map_err(de::Error::custom)
}

/// Timestamps are UTC `YYYY-MM-DD HH:MM:SS` with optional fractional seconds.
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| format!("invalid datetime {:?}: {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_open_order_deserialize() {
        let body = r#"[{"id": 5, "datetime": "2013-09-25 18:37:33", "type": 0, "price": "100.00", "amount": "1.00000000"}]"#;
        let orders: Vec<BitstampOrder> = serde_json::from_str(body).unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, 5);
        assert_eq!(orders[0].order_type, 0);
        assert_eq!(orders[0].price, dec!(100));
        assert_eq!(orders[0].amount, dec!(1));
        assert_eq!(orders[0].datetime, Utc.with_ymd_and_hms(2013, 9, 25, 18, 37, 33).unwrap());
    }

    #[test]
    fn test_open_order_accepts_string_type_and_numeric_decimals() {
        let body = r#"{"id": "7", "datetime": "2014-01-02 03:04:05.250000", "type": "1", "price": 250.5, "amount": 0.1}"#;
        let order: BitstampOrder = serde_json::from_str(body).unwrap();

        assert_eq!(order.id, 7);
        assert_eq!(order.order_type, 1);
        assert_eq!(order.price, dec!(250.5));
        assert_eq!(order.datetime.nanosecond(), 250_000_000);
    }

    #[test]
    fn test_bad_datetime_is_rejected() {
        let body = r#"{"id": 1, "datetime": "yesterday", "type": 0, "price": "1", "amount": "1"}"#;
        assert!(serde_json::from_str::<BitstampOrder>(body).is_err());
    }

    #[test]
    fn test_order_result_with_id() {
        let result: BitstampOrderResult = serde_json::from_str(
            r#"{"id": 1234, "datetime": "2013-09-25 18:37:33", "type": 0, "price": "100", "amount": "1"}"#,
        )
        .unwrap();
        assert_eq!(result.id, Some(1234));
        assert_eq!(result.error_message(), None);
    }

    #[test]
    fn test_order_result_error_string() {
        let result: BitstampOrderResult =
            serde_json::from_str(r#"{"error": "Invalid nonce"}"#).unwrap();
        assert_eq!(result.id, None);
        assert_eq!(result.error_message().as_deref(), Some("Invalid nonce"));
    }

    #[test]
    fn test_order_result_error_object_is_flattened() {
        let result: BitstampOrderResult = serde_json::from_str(
            r#"{"error": {"__all__": ["You have only 0 USD available.", "Check your account balance."]}}"#,
        )
        .unwrap();
        assert_eq!(
            result.error_message().as_deref(),
            Some("You have only 0 USD available.; Check your account balance.")
        );
    }

    #[test]
    fn test_blank_error_counts_as_absent() {
        assert_eq!(error_message(&json!("  ")), None);
        assert_eq!(error_message(&json!(null)), None);
        assert_eq!(error_message(&json!({"__all__": []})), None);
    }

    #[test]
    fn test_user_transaction_deserialize() {
        let body = r#"{"datetime": "2013-09-26 13:28:55", "id": 1205, "type": 2, "usd": "-100.00", "btc": "1.00000000", "fee": "0.50", "order_id": 5, "btc_usd": "100.00"}"#;
        let tx: BitstampUserTransaction = serde_json::from_str(body).unwrap();

        assert_eq!(tx.kind(), BitstampTransactionType::MarketTrade);
        assert_eq!(tx.usd, dec!(-100));
        assert_eq!(tx.order_id, Some(5));
        assert_eq!(tx.btc_usd, Some(dec!(100)));
    }

    #[test]
    fn test_deposit_without_order_fields() {
        let body = r#"{"datetime": "2013-09-26 13:28:55", "id": 1, "type": 0, "usd": "0", "btc": "2.5", "fee": "0", "order_id": null}"#;
        let tx: BitstampUserTransaction = serde_json::from_str(body).unwrap();

        assert_eq!(tx.kind(), BitstampTransactionType::Deposit);
        assert_eq!(tx.order_id, None);
        assert_eq!(tx.btc_usd, None);
    }

    #[test]
    fn test_decode_success_body() {
        let value: Value = decode_body(StatusCode::OK, "true").unwrap();
        assert_eq!(value, json!(true));
    }

    #[test]
    fn test_decode_error_object_where_list_expected() {
        let result: TradeResult<Vec<BitstampOrder>> =
            decode_body(StatusCode::OK, r#"{"error": "API key not found"}"#);
        match result {
            Err(TradeError::ExchangeProtocol(msg)) => assert!(msg.contains("API key not found")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage_is_protocol_error() {
        let result: TradeResult<Vec<BitstampOrder>> = decode_body(StatusCode::OK, "<html>oops</html>");
        assert!(matches!(result, Err(TradeError::ExchangeProtocol(_))));
    }

    #[test]
    fn test_decode_garbage_with_failed_status_is_transport_error() {
        let result: TradeResult<Vec<BitstampOrder>> =
            decode_body(StatusCode::BAD_GATEWAY, "<html>502 Bad Gateway</html>");
        match result {
            Err(TradeError::Transport(msg)) => assert!(msg.starts_with("HTTP 502")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_order_result_failed_status_without_payload_is_transport_error() {
        match decode_order_result(StatusCode::INTERNAL_SERVER_ERROR, "{}") {
            Err(TradeError::Transport(msg)) => assert_eq!(msg, "HTTP 500 Internal Server Error: {}"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_order_result_failed_status_keeps_rejection() {
        let result = decode_order_result(StatusCode::BAD_REQUEST, r#"{"error": "Invalid nonce"}"#).unwrap();
        assert_eq!(result.error_message().as_deref(), Some("Invalid nonce"));
    }

    #[test]
    fn test_order_result_success_status_without_payload_is_decoded() {
        let result = decode_order_result(StatusCode::OK, "{}").unwrap();
        assert_eq!(result, BitstampOrderResult::default());
    }

    #[test]
    fn test_endpoint_url() {
        let client = BitstampClient::new("https://www.bitstamp.net/", None).unwrap();
        assert_eq!(client.base_url(), "https://www.bitstamp.net");
        assert_eq!(client.endpoint_url("open_orders"), "https://www.bitstamp.net/api/open_orders/");
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(1000);
        assert_eq!(truncate(&body).len(), MAX_ERROR_BODY);
        assert_eq!(truncate("short"), "short");
    }
}
