//! Client identity resolution.
//!
//! The peer socket address is the identity unless the peer is a configured
//! trusted proxy, in which case the forwarding headers it set are honored.
//! Forwarding headers from any other peer are ignored.

use std::net::IpAddr;

use axum::http::HeaderMap;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// Resolve the identity used as the rate limiting key.
pub fn client_identity(peer: IpAddr, headers: &HeaderMap, trusted_proxies: &[IpAddr]) -> String {
    if trusted_proxies.contains(&peer) {
        if let Some(ip) = forwarded_ip(headers) {
            return ip.to_string();
        }
    }
    peer.to_string()
}

/// Leftmost valid address of `X-Forwarded-For`, falling back to `X-Real-IP`.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_forwarded_for = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .find_map(|candidate| candidate.parse::<IpAddr>().ok());

    from_forwarded_for.or_else(|| {
        headers
            .get(X_REAL_IP)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
    })
}
