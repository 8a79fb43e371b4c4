//! Conversions from Bitstamp wire records to the canonical order model.

use rust_decimal::Decimal;

use super::bitstamp::{BitstampOrder, BitstampTransactionType, BitstampUserTransaction};
use crate::error::{TradeError, TradeResult};
use crate::types::{CurrencyPair, LimitOrder, Money, OpenOrders, OrderSide, Trade, Trades};

/// The authenticated API trades a single pair.
pub const BITSTAMP_PAIR: CurrencyPair = CurrencyPair::BTCUSD;

pub fn adapt_order(raw: &BitstampOrder) -> LimitOrder {
    LimitOrder {
        side: OrderSide::from_discriminator(raw.order_type),
        tradable_amount: raw.amount,
        pair: BITSTAMP_PAIR,
        id: Some(raw.id.to_string()),
        timestamp: Some(raw.datetime),
        limit_price: Money::new(raw.price, BITSTAMP_PAIR.counter()),
    }
}

pub fn adapt_open_orders(raw: &[BitstampOrder]) -> OpenOrders {
    OpenOrders::new(raw.iter().map(adapt_order).collect())
}

/// Keeps market trades only; deposits and withdrawals are not trades.
pub fn adapt_trade_history(raw: &[BitstampUserTransaction]) -> TradeResult<Trades> {
    raw.iter()
        .filter(|tx| tx.kind() == BitstampTransactionType::MarketTrade)
        .map(adapt_trade)
        .collect::<TradeResult<Vec<_>>>()
        .map(Trades::new)
}

/// Fails with [`TradeError::ExchangeProtocol`] when the price has to be
/// derived from amounts that do not fit a decimal.
pub fn adapt_trade(tx: &BitstampUserTransaction) -> TradeResult<Trade> {
    // A USD credit means BTC was sold.
    let side = if tx.usd > Decimal::ZERO {
        OrderSide::Ask
    } else {
        OrderSide::Bid
    };
    let amount = tx.btc.abs();

    let price = match tx.btc_usd {
        Some(rate) => rate,
        None if amount.is_zero() => Decimal::ZERO,
        None => tx
            .usd
            .checked_div(amount)
            .map(|p| p.abs())
            .ok_or_else(|| {
                TradeError::ExchangeProtocol(format!(
                    "transaction {}: price {} USD / {} BTC out of range",
                    tx.id, tx.usd, amount
                ))
            })?,
    };

    Ok(Trade {
        side,
        tradable_amount: amount,
        pair: BITSTAMP_PAIR,
        price: Money::new(price, BITSTAMP_PAIR.counter()),
        timestamp: tx.datetime,
        id: tx.id.to_string(),
        order_id: tx.order_id.map(|id| id.to_string()),
        fee: Money::new(tx.fee, BITSTAMP_PAIR.counter()),
    })
}
