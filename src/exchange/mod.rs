pub mod adapters;
pub mod bitstamp;
pub mod nonce;
pub mod signer;

pub use adapters::*;
pub use bitstamp::*;
pub use nonce::*;
pub use signer::*;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::TradeResult;

/// Signed calls against the private API. Each call returns the raw exchange
/// payload; normalization happens in [`adapters`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BitstampAuthenticated: Send + Sync {
    async fn open_orders(&self, api_key: &str, signature: &str, nonce: u64) -> TradeResult<Vec<BitstampOrder>>;

    async fn buy(
        &self,
        api_key: &str,
        signature: &str,
        nonce: u64,
        amount: Decimal,
        price: Decimal,
    ) -> TradeResult<BitstampOrderResult>;

    async fn sell(
        &self,
        api_key: &str,
        signature: &str,
        nonce: u64,
        amount: Decimal,
        price: Decimal,
    ) -> TradeResult<BitstampOrderResult>;

    /// The exchange answers `true` when the order was cancelled.
    async fn cancel_order(&self, api_key: &str, signature: &str, nonce: u64, order_id: u64) -> TradeResult<Value>;

    async fn user_transactions(
        &self,
        api_key: &str,
        signature: &str,
        nonce: u64,
        limit: u64,
    ) -> TradeResult<Vec<BitstampUserTransaction>>;
}
