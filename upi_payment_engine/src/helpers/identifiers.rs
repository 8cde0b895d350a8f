use std::fmt::Write;

use rand::{distributions::Uniform, thread_rng, Rng, RngCore};

use crate::db_types::OrderId;

pub const API_KEY_PREFIX: &str = "pk_live_";
pub const LISTENER_TOKEN_PREFIX: &str = "lst_";
const TOKEN_RANDOM_BYTES: usize = 12;

/// A random 10-digit order id in the range [1_000_000_000, 9_999_999_999]. Never starts with a zero.
pub fn new_order_id() -> OrderId {
    let n: u64 = thread_rng().sample(Uniform::new_inclusive(1_000_000_000u64, 9_999_999_999u64));
    OrderId(n.to_string())
}

/// A fresh merchant API key: `pk_live_` followed by 24 hex characters.
pub fn new_api_key() -> String {
    format!("{API_KEY_PREFIX}{}", random_hex(TOKEN_RANDOM_BYTES))
}

/// A fresh listener token: `lst_` followed by 24 hex characters.
pub fn new_listener_token() -> String {
    format!("{LISTENER_TOKEN_PREFIX}{}", random_hex(TOKEN_RANDOM_BYTES))
}

/// Masks a secret for display, keeping `keep_prefix` leading and 4 trailing characters, e.g. `pk_live_a1b2...9f8e`.
/// Short values are fully masked.
pub fn mask_secret(secret: &str, keep_prefix: usize) -> String {
    let chars = secret.chars().collect::<Vec<char>>();
    if chars.len() <= keep_prefix + 4 {
        return "****".to_string();
    }
    let head = chars[..keep_prefix].iter().collect::<String>();
    let tail = chars[chars.len() - 4..].iter().collect::<String>();
    format!("{head}...{tail}")
}

fn random_hex(n: usize) -> String {
    let mut bytes = vec![0u8; n];
    thread_rng().fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(2 * n), |mut hex, b| {
        let _ = write!(hex, "{b:02x}");
        hex
    })
}
