// Borrow a lot of code from crates.io
// https://github.com/rust-lang/crates.io/blob/986d296f910c2ed821be907b1e32a120c03338cb/src/real_ip.rs

use axum::{
    extract::ConnectInfo,
    http::{HeaderMap, request::Parts},
};
use std::net::{IpAddr, SocketAddr};

use crate::error::AppError;

/// The left-most public address in `X-Forwarded-For`, if any.
pub fn forwarded_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(','))
        .filter_map(|ip| ip.trim().parse::<IpAddr>().ok())
        .find(|ip| match ip {
            IpAddr::V4(ip) => !ip.is_private() && !ip.is_loopback(),
            IpAddr::V6(ip) => !ip.is_loopback(),
        })
}

pub struct ClientIp(pub IpAddr);

impl<S> axum::extract::FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(client_ip) = forwarded_client_ip(&parts.headers) {
            return Ok(ClientIp(client_ip));
        }

        let socket_ip: IpAddr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .ok_or("couldn't get connecting socket IP")?
            .0
            .ip();

        tracing::debug!(
            ?socket_ip,
            "No client IP found in X-Forwarded-For headers, using socket IP"
        );

        Ok(ClientIp(socket_ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_private_and_loopback_forwarded_addresses() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "10.0.0.3, 127.0.0.1, 203.0.113.9, 198.51.100.1".parse().unwrap(),
        );

        assert_eq!(
            forwarded_client_ip(&headers),
            Some("203.0.113.9".parse().unwrap())
        );
    }

    #[test]
    fn no_forwarded_header_yields_none() {
        assert_eq!(forwarded_client_ip(&HeaderMap::new()), None);
    }
}
