use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    BTC,
    USD,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::BTC => "BTC",
            Currency::USD => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pairs tradable through the authenticated API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CurrencyPair {
    BTCUSD,
}

impl CurrencyPair {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyPair::BTCUSD => "BTC/USD",
        }
    }

    pub fn base(&self) -> Currency {
        match self {
            CurrencyPair::BTCUSD => Currency::BTC,
        }
    }

    pub fn counter(&self) -> Currency {
        match self {
            CurrencyPair::BTCUSD => Currency::USD,
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Side of an order or trade.
///
/// The exchange encodes this as an integer discriminator on open orders:
/// `0` is a buy order, every other observed value a sell order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Bid,
    Ask,
}

impl OrderSide {
    pub fn from_discriminator(raw: i64) -> Self {
        if raw == 0 {
            OrderSide::Bid
        } else {
            OrderSide::Ask
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Bid => "BID",
            OrderSide::Ask => "ASK",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An amount tagged with its currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn usd(amount: Decimal) -> Self {
        Self::new(amount, Currency::USD)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
