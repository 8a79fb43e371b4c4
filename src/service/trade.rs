use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ExchangeSpecification;
use crate::error::{TradeError, TradeResult};
use crate::exchange::{
    adapt_open_orders, adapt_trade_history, BitstampAuthenticated, BitstampClient, BitstampSigner, NonceGenerator,
};
use crate::types::{LimitOrder, MarketOrder, OpenOrders, OrderSide, Trades};

/// Transaction count sent when the caller gives no bound. The exchange reads
/// the limit as a signed 64-bit integer.
pub const UNBOUNDED_TRANSACTIONS: u64 = i64::MAX as u64;

/// Trading operations on one Bitstamp account.
///
/// Every call takes a fresh nonce, signs it and performs exactly one request.
/// Nothing is cached between calls and failures are never retried. The
/// service is `Send + Sync` and can be shared behind an `Arc`.
#[derive(Debug)]
pub struct TradeService<A = BitstampClient> {
    api: A,
    api_key: String,
    username: String,
    signer: BitstampSigner,
    nonces: NonceGenerator,
}

impl TradeService<BitstampClient> {
    pub fn from_specification(spec: &ExchangeSpecification) -> TradeResult<Self> {
        spec.validate()?;
        let api = BitstampClient::new(spec.ssl_uri.clone(), spec.request_timeout())?;
        Self::new(api, spec)
    }
}

impl<A: BitstampAuthenticated> TradeService<A> {
    pub fn new(api: A, spec: &ExchangeSpecification) -> TradeResult<Self> {
        Ok(Self {
            api,
            api_key: spec.api_key.clone(),
            username: spec.username.clone(),
            signer: BitstampSigner::new(spec.secret_key.clone())?,
            nonces: NonceGenerator::new(),
        })
    }

    /// Fresh nonce and its signature for the next request.
    fn credentials(&self) -> (u64, String) {
        let nonce = self.nonces.next();
        let signature = self.signer.sign(nonce, &self.username, &self.api_key);
        (nonce, signature)
    }

    pub async fn get_open_orders(&self) -> TradeResult<OpenOrders> {
        let (nonce, signature) = self.credentials();
        let raw = self.api.open_orders(&self.api_key, &signature, nonce).await?;
        debug!("Fetched {} open orders", raw.len());
        Ok(adapt_open_orders(&raw))
    }

    /// The private API has no market orders.
    pub async fn place_market_order(&self, order: &MarketOrder) -> TradeResult<String> {
        debug!("Refusing market order: {:?}", order);
        Err(TradeError::UnsupportedOperation(
            "market orders are not available on this exchange".to_string(),
        ))
    }

    /// Places a limit order and returns the exchange-assigned id.
    ///
    /// An error message in the response wins over any id it also carries.
    pub async fn place_limit_order(&self, order: &LimitOrder) -> TradeResult<String> {
        let (nonce, signature) = self.credentials();
        let amount = order.tradable_amount;
        let price = order.limit_price.amount;

        let result = match order.side {
            OrderSide::Bid => self.api.buy(&self.api_key, &signature, nonce, amount, price).await?,
            OrderSide::Ask => self.api.sell(&self.api_key, &signature, nonce, amount, price).await?,
        };

        if let Some(message) = result.error_message() {
            warn!("{} order rejected: {}", order.side, message);
            return Err(TradeError::ExchangeRejected(message));
        }

        let id = result
            .id
            .ok_or_else(|| TradeError::ExchangeProtocol("order response carries neither id nor error".to_string()))?;

        info!("Placed {} order {}: {} @ {}", order.side, id, amount, order.limit_price);
        Ok(id.to_string())
    }

    /// Returns `true` only when the exchange acknowledges with `true`.
    ///
    /// The id must be a plain unsigned integer; whitespace and signs are
    /// rejected before any request is made.
    pub async fn cancel_order(&self, order_id: &str) -> TradeResult<bool> {
        let id: u64 = order_id
            .parse()
            .map_err(|_| TradeError::InvalidArgument(format!("order id {:?} is not an integer", order_id)))?;

        let (nonce, signature) = self.credentials();
        let ack = self.api.cancel_order(&self.api_key, &signature, nonce, id).await?;

        let cancelled = ack == Value::Bool(true);
        if cancelled {
            info!("Order {} cancelled", id);
        } else {
            warn!("Cancellation of order {} not acknowledged: {}", id, ack);
        }
        Ok(cancelled)
    }

    /// Without a bound, asks for everything the exchange has.
    pub async fn get_trade_history(&self, limit: Option<u64>) -> TradeResult<Trades> {
        let limit = limit.unwrap_or(UNBOUNDED_TRANSACTIONS);
        let (nonce, signature) = self.credentials();
        let raw = self
            .api
            .user_transactions(&self.api_key, &signature, nonce, limit)
            .await?;
        debug!("Fetched {} user transactions", raw.len());
        adapt_trade_history(&raw)
    }
}
