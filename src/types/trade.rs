use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CurrencyPair, Money, OrderSide};

/// An executed trade from the account's transaction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: OrderSide,
    pub tradable_amount: Decimal,
    pub pair: CurrencyPair,
    pub price: Money,
    pub timestamp: DateTime<Utc>,
    pub id: String,
    pub order_id: Option<String>,
    pub fee: Money,
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} {} {} @ {} (fee {})",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.id,
            self.side,
            self.tradable_amount,
            self.pair.base(),
            self.price,
            self.fee
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trades {
    trades: Vec<Trade>,
}

impl Trades {
    pub fn new(trades: Vec<Trade>) -> Self {
        Self { trades }
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

impl IntoIterator for Trades {
    type Item = Trade;
    type IntoIter = std::vec::IntoIter<Trade>;

    fn into_iter(self) -> Self::IntoIter {
        self.trades.into_iter()
    }
}
