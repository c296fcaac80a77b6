//! reqwest-backed commerce client

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use super::{CommerceApi, Endpoint, RawResponse};
use crate::config::ProbeConfig;
use crate::error::{CheckoutError, Result, TransportError};

/// HTTP client for the commerce API
///
/// Every request carries `Merchant-ID`, `API-Key`, and the API key again as
/// a bearer token.
pub struct HttpCommerceClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCommerceClient {
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let headers = Self::auth_headers(&config.merchant_id, &config.api_key)?;

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CheckoutError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_headers(merchant_id: &str, api_key: &str) -> Result<HeaderMap> {
        let value = |v: &str| {
            HeaderValue::from_str(v)
                .map_err(|_| CheckoutError::Config("credentials contain invalid header characters".into()))
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static("merchant-id"), value(merchant_id)?);
        headers.insert(HeaderName::from_static("api-key"), value(api_key)?);

        let mut bearer = value(&format!("Bearer {api_key}"))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        Ok(headers)
    }
}

#[async_trait]
impl CommerceApi for HttpCommerceClient {
    async fn call(
        &self,
        endpoint: &Endpoint,
        body: Option<&serde_json::Value>,
    ) -> std::result::Result<RawResponse, TransportError> {
        let url = format!("{}{}", self.base_url, endpoint.path());

        let mut request = self.http.request(endpoint.method(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }

    fn name(&self) -> &str {
        "commerce-http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_headers() {
        let headers = HttpCommerceClient::auth_headers("merchant-1", "key-1").unwrap();
        assert_eq!(headers["merchant-id"], "merchant-1");
        assert_eq!(headers["api-key"], "key-1");
        assert_eq!(headers[AUTHORIZATION], "Bearer key-1");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_invalid_header_characters() {
        assert!(HttpCommerceClient::auth_headers("merchant\n1", "key").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = ProbeConfig::new(
            "https://api.example.com/v1/",
            "merchant-1",
            "key-1",
            "https://hooks.example.com/abc",
        );
        let client = HttpCommerceClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com/v1");
    }
}
