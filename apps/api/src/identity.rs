//! Client identity resolution.
//!
//! The raw identity (usually an IP) is only ever used as a rate-limit key;
//! logs and metrics see its truncated SHA-256 digest.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;
use sha2::{Digest, Sha256};

/// Resolves a stable client identity from proxy headers, falling back to the
/// transport peer address, then `"unknown"`.
///
/// Precedence: first `x-forwarded-for` entry → `x-real-ip` → peer IP.
pub fn client_identity<B>(request: &Request<B>) -> String {
    if let Some(forwarded) = header_str(request, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = header_str(request, "x-real-ip") {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// First 12 hex characters of the SHA-256 digest, for privacy-preserving
/// log correlation.
pub fn hash_identifier(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..12].to_string()
}

fn header_str<'a, B>(request: &'a Request<B>, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}
