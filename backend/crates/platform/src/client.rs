//! Client identification
//!
//! Sessions are bound to a User-Agent fingerprint; rate limits are keyed by
//! client IP.

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, header};

use crate::crypto::sha256;

#[derive(Debug, Clone)]
pub struct ClientFingerprint {
    /// SHA-256 of the User-Agent header
    pub hash: [u8; 32],
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl ClientFingerprint {
    pub fn hash_vec(&self) -> Vec<u8> {
        self.hash.to_vec()
    }

    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }

    /// Rate-limit key: the IP when known, otherwise the fingerprint hash.
    pub fn rate_limit_key(&self) -> String {
        match self.ip {
            Some(ip) => ip.to_string(),
            None => self.hash.iter().map(|b| format!("{:02x}", b)).collect(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FingerprintError {
    #[error("Missing required header: {0}")]
    MissingHeader(String),
}

/// Fingerprint from the User-Agent header. Requests without one are refused.
/// The IP is kept alongside but left out of the hash, so sessions bound to
/// the hash survive a client changing networks.
pub fn extract_fingerprint(
    headers: &HeaderMap,
    client_ip: Option<IpAddr>,
) -> Result<ClientFingerprint, FingerprintError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .filter(|ua| !ua.trim().is_empty())
        .ok_or_else(|| FingerprintError::MissingHeader("User-Agent".to_string()))?;

    Ok(ClientFingerprint {
        hash: sha256(user_agent.as_bytes()),
        ip: client_ip,
        user_agent: Some(user_agent.to_string()),
    })
}

/// First hop of `X-Forwarded-For`, else the socket address.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .or(direct_ip)
}

/// Client IP of a request inside middleware, where `ConnectInfo` is only
/// available as an extension.
pub fn request_client_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    let direct = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    extract_client_ip(req.headers(), direct)
}
