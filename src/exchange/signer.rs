//! HMAC-SHA256 request signing for the Bitstamp private API.
//!
//! Every private call carries `key`, `nonce` and `signature` form fields.
//! The signature is `HMAC-SHA256(secret, nonce + customer_id + api_key)`
//! rendered as uppercase hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::error::{TradeError, TradeResult};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct BitstampSigner {
    secret_key: String,
}

impl BitstampSigner {
    /// Fails with [`TradeError::Configuration`] when the secret is empty.
    pub fn new(secret_key: impl Into<String>) -> TradeResult<Self> {
        let secret_key = secret_key.into();
        if secret_key.trim().is_empty() {
            return Err(TradeError::Configuration("secret key must not be empty".to_string()));
        }
        Ok(Self { secret_key })
    }

    pub fn sign(&self, nonce: u64, username: &str, api_key: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(nonce.to_string().as_bytes());
        mac.update(username.as_bytes());
        mac.update(api_key.as_bytes());
        hex::encode_upper(mac.finalize().into_bytes())
    }
}

impl fmt::Debug for BitstampSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitstampSigner")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
