// src/middleware/client.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

const UNKNOWN: &str = "unknown";

// Origem da requisição (IP e User-Agent) para o histórico de login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientInfo {
    /// Atrás de proxy o IP vem do primeiro item de `X-Forwarded-For`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let ip_address = text("x-forwarded-for")
            .and_then(|list| list.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .or_else(|| text("x-real-ip"))
            .unwrap_or(UNKNOWN)
            .to_string();
        let user_agent = text(header::USER_AGENT.as_str()).unwrap_or(UNKNOWN).to_string();

        ClientInfo { ip_address, user_agent }
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientInfo::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn first_forwarded_address_is_the_client() {
        let info = ClientInfo::from_headers(&headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "10.0.0.1"),
            ("user-agent", "curl/8.5.0"),
        ]));
        assert_eq!(info.ip_address, "203.0.113.7");
        assert_eq!(info.user_agent, "curl/8.5.0");
    }

    #[test]
    fn falls_back_to_real_ip_then_unknown() {
        assert_eq!(ClientInfo::from_headers(&headers(&[("x-real-ip", "198.51.100.2")])).ip_address, "198.51.100.2");

        let bare = ClientInfo::from_headers(&HeaderMap::new());
        assert_eq!(bare.ip_address, "unknown");
        assert_eq!(bare.user_agent, "unknown");
    }
}
