use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CurrencyPair, Money, OrderSide};

/// A limit order, either built locally for placement or adapted from the
/// exchange's open-orders listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrder {
    pub side: OrderSide,
    pub tradable_amount: Decimal,
    pub pair: CurrencyPair,
    /// Exchange order id. `None` until the exchange has assigned one.
    pub id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub limit_price: Money,
}

impl LimitOrder {
    pub fn new(side: OrderSide, tradable_amount: Decimal, pair: CurrencyPair, limit_price: Decimal) -> Self {
        Self {
            side,
            tradable_amount,
            pair,
            id: None,
            timestamp: None,
            limit_price: Money::new(limit_price, pair.counter()),
        }
    }

    pub fn bid(tradable_amount: Decimal, pair: CurrencyPair, limit_price: Decimal) -> Self {
        Self::new(OrderSide::Bid, tradable_amount, pair, limit_price)
    }

    pub fn ask(tradable_amount: Decimal, pair: CurrencyPair, limit_price: Decimal) -> Self {
        Self::new(OrderSide::Ask, tradable_amount, pair, limit_price)
    }
}

impl fmt::Display for LimitOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {} @ {}",
            self.id.as_deref().unwrap_or("-"),
            self.side,
            self.tradable_amount,
            self.pair.base(),
            self.limit_price
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOrder {
    pub side: OrderSide,
    pub tradable_amount: Decimal,
    pub pair: CurrencyPair,
}

impl MarketOrder {
    pub fn new(side: OrderSide, tradable_amount: Decimal, pair: CurrencyPair) -> Self {
        Self {
            side,
            tradable_amount,
            pair,
        }
    }
}

/// Open orders in the order the exchange listed them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenOrders {
    orders: Vec<LimitOrder>,
}

impl OpenOrders {
    pub fn new(orders: Vec<LimitOrder>) -> Self {
        Self { orders }
    }

    pub fn orders(&self) -> &[LimitOrder] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl IntoIterator for OpenOrders {
    type Item = LimitOrder;
    type IntoIter = std::vec::IntoIter<LimitOrder>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.into_iter()
    }
}
