use std::{net::IpAddr, str::FromStr};

use actix_web::{
    http::header::{HeaderMap, AUTHORIZATION, ORIGIN},
    HttpRequest,
};
use hmac::{Hmac, Mac};
use log::{debug, trace};
use once_cell::sync::Lazy;
use rand::{thread_rng, RngCore};
use regex::Regex;
use sha2::Sha256;
use upi_payment_engine::db_types::Settings;

static FORWARDED_FOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"for=(?P<ip>[^;,]+)"#).expect("static regex is valid"));

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| FORWARDED_FOR_RE.captures(v))
            .and_then(|caps| caps.name("ip"))
            .map(|m| m.as_str().trim_matches('"'))
            .and_then(|s| IpAddr::from_str(s).ok());
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.and_then(|s| IpAddr::from_str(&s).ok())
    })
}

/// The token in an `Authorization: Bearer <token>` header, if there is one.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Compares a presented secret against the stored one without leaking timing information.
///
/// Both values are run through HMAC-SHA256 with a throwaway key and the tags are compared with `verify_slice`, which
/// runs in constant time. An empty stored secret never matches.
pub fn secrets_match(candidate: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let mut key = [0u8; 32];
    thread_rng().fill_bytes(&mut key);
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&key) else {
        return false;
    };
    mac.update(expected.as_bytes());
    let tag = mac.finalize().into_bytes();
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&key) else {
        return false;
    };
    mac.update(candidate.as_bytes());
    mac.verify_slice(&tag).is_ok()
}

/// True if the request carries `Authorization: Bearer <listener token>`.
pub fn listener_access_allowed(settings: &Settings, headers: &HeaderMap) -> bool {
    bearer_token(headers).map(|token| secrets_match(token, settings.listener_token.reveal())).unwrap_or(false)
}

/// Decides whether a request may create orders.
///
/// Access is granted for a bearer token equal to the static API key, or an `Origin` header that is on the allowed
/// domain list. A request with neither an `Origin` nor an `Authorization` header (the merchant's own dashboard) is let
/// through as well, unless `require_api_key` is set.
pub fn merchant_access_allowed(settings: &Settings, headers: &HeaderMap, require_api_key: bool) -> bool {
    if let Some(token) = bearer_token(headers) {
        if secrets_match(token, settings.static_api_key.reveal()) {
            trace!("💻️ Merchant access granted by API key");
            return true;
        }
    }
    let origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok());
    if let Some(origin) = origin {
        if settings.is_domain_allowed(origin.trim_end_matches('/')) {
            trace!("💻️ Merchant access granted for origin {origin}");
            return true;
        }
    }
    let has_authorization = headers.contains_key(AUTHORIZATION);
    if origin.is_none() && !has_authorization && !require_api_key {
        trace!("💻️ Merchant access granted to a same-origin request");
        return true;
    }
    debug!("💻️ Merchant access denied. Origin: {origin:?}, authorization header present: {has_authorization}");
    false
}
