//! Telegram Web App init-data validation
//!
//! A Mini App proves its session by forwarding the `initData` string Telegram
//! injected into the page. The string is a url-encoded query string whose
//! `hash` field is HMAC-SHA256 over the remaining pairs (sorted by key,
//! joined with newlines), keyed by HMAC-SHA256("WebAppData", bot_token).

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age of init data before it must be re-issued
pub const INIT_DATA_MAX_AGE_SECS: i64 = 24 * 60 * 60;

/// Authenticated Telegram identity extracted from init data
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// Validate an init-data string against the bot token.
///
/// Returns the claims on success. All failures collapse to a description
/// string; the middleware only logs it and answers 401.
pub fn validate_init_data(
    init_data: &str,
    bot_token: &str,
    now: DateTime<Utc>,
) -> Result<TelegramUser, String> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut hash: Option<String> = None;

    for part in init_data.split('&') {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| format!("Malformed init-data pair: {}", part))?;
        let key = urlencoding::decode(key)
            .map_err(|_| "Invalid percent-encoding in init data".to_string())?;
        let value = urlencoding::decode(value)
            .map_err(|_| "Invalid percent-encoding in init data".to_string())?;
        if key == "hash" {
            hash = Some(value.into_owned());
        } else {
            pairs.push((key.into_owned(), value.into_owned()));
        }
    }

    let hash = hash.ok_or("Init data missing hash field")?;
    let expected = hex::decode(&hash).map_err(|_| "Hash field is not hex".to_string())?;

    // Data-check string: remaining pairs sorted by key, newline-joined
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    let data_check_string = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n");

    let digest = sign(bot_token, &data_check_string);
    if !bool::from(digest.ct_eq(expected.as_slice())) {
        return Err("Init-data signature mismatch".to_string());
    }

    // Freshness: stale init data must be re-issued by the client
    let auth_date: i64 = pairs
        .iter()
        .find(|(k, _)| k == "auth_date")
        .ok_or("Init data missing auth_date")?
        .1
        .parse()
        .map_err(|_| "auth_date is not a timestamp".to_string())?;
    let age = now.timestamp() - auth_date;
    if age > INIT_DATA_MAX_AGE_SECS {
        return Err(format!("Init data expired ({} seconds old)", age));
    }

    let user_json = &pairs
        .iter()
        .find(|(k, _)| k == "user")
        .ok_or("Init data missing user field")?
        .1;
    serde_json::from_str(user_json).map_err(|e| format!("Unparsable user field: {}", e))
}

/// HMAC-SHA256 chain per Telegram's Web App contract
fn sign(bot_token: &str, data_check_string: &str) -> Vec<u8> {
    // Secret key is itself an HMAC of the bot token
    let mut secret = HmacSha256::new_from_slice(b"WebAppData").expect("HMAC accepts any key size");
    secret.update(bot_token.as_bytes());
    let secret_key = secret.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret_key).expect("HMAC accepts any key size");
    mac.update(data_check_string.as_bytes());
    mac.finalize().into_bytes().to_vec()
}
