//! Trading client for the Bitstamp private REST API.
//!
//! [`service::TradeService`] is the entry point: it lists open orders,
//! places and cancels limit orders and reads the account's trade history.
//! Requests are signed per call with a fresh nonce, and responses are
//! normalized into the types in [`types`].

pub mod config;
pub mod error;
pub mod exchange;
pub mod service;
pub mod types;

pub use crate::config::ExchangeSpecification;
pub use error::{TradeError, TradeResult};
pub use service::TradeService;
