//! Probe Configuration
//!
//! Everything the probe needs to reach the commerce API and the webhook
//! receiver. Read from the environment (a `.env` file is loaded by the
//! binary before this runs).

use std::time::Duration;

use crate::error::{CheckoutError, Result};

pub const DEFAULT_BASE_URL: &str = "https://dev-api.coinsub.io/v1";

/// Timeout for commerce API calls
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the full webhook payload POST
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

const PLACEHOLDER_MERCHANT_ID: &str = "your_merchant_id_here";
const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

/// Probe configuration
#[derive(Clone)]
pub struct ProbeConfig {
    /// Commerce API base URL (e.g., `https://dev-api.coinsub.io/v1`)
    pub base_url: String,

    /// Sent as the `Merchant-ID` header
    pub merchant_id: String,

    /// Sent as `API-Key` and as the bearer token
    pub api_key: String,

    /// Webhook receiver the probe posts to
    pub webhook_url: String,

    /// Shared secret for `X-CoinSub-Signature`, if the receiver checks one
    pub webhook_secret: Option<String>,

    pub success_url: String,
    pub cancel_url: String,

    /// Prepended to the purchase session name on the wire
    pub session_name_prefix: Option<String>,

    pub request_timeout: Duration,
    pub webhook_timeout: Duration,
}

impl ProbeConfig {
    pub fn new(
        base_url: impl Into<String>,
        merchant_id: impl Into<String>,
        api_key: impl Into<String>,
        webhook_url: impl Into<String>,
    ) -> Self {
        let webhook_url = webhook_url.into();
        let trimmed = webhook_url.trim_end_matches('/');
        Self {
            base_url: base_url.into(),
            merchant_id: merchant_id.into(),
            api_key: api_key.into(),
            success_url: format!("{trimmed}/success"),
            cancel_url: format!("{trimmed}/cancel"),
            webhook_url,
            webhook_secret: None,
            session_name_prefix: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            webhook_timeout: DEFAULT_WEBHOOK_TIMEOUT,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| CheckoutError::Config(format!("{key} not set")))
        };

        let base_url = get("COMMERCE_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let merchant_id = require("COMMERCE_MERCHANT_ID")?;
        let api_key = require("COMMERCE_API_KEY")?;
        let webhook_url = require("WEBHOOK_URL")?;

        let mut config = Self::new(base_url, merchant_id, api_key, webhook_url);
        config.webhook_secret = get("WEBHOOK_SECRET");
        config.session_name_prefix = get("CHECKOUT_SESSION_NAME_PREFIX");

        if let Some(url) = get("CHECKOUT_SUCCESS_URL") {
            config.success_url = url;
        }
        if let Some(url) = get("CHECKOUT_CANCEL_URL") {
            config.cancel_url = url;
        }
        if let Some(secs) = get("COMMERCE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| CheckoutError::Config(format!("Invalid COMMERCE_TIMEOUT_SECS: {secs}")))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject unset placeholders and malformed URLs
    pub fn validate(&self) -> Result<()> {
        if self.merchant_id == PLACEHOLDER_MERCHANT_ID || self.api_key == PLACEHOLDER_API_KEY {
            return Err(CheckoutError::Config(
                "merchant id / API key still hold placeholder values".into(),
            ));
        }

        for (name, url) in [
            ("base_url", &self.base_url),
            ("webhook_url", &self.webhook_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(CheckoutError::Config(format!("{name} is not an http(s) URL: {url}")));
            }
        }

        Ok(())
    }

    /// API key with everything but the last four characters masked
    pub fn redacted_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 4 {
            return "****".into();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{tail}")
    }

    /// Log the effective configuration once at startup
    pub fn log_summary(&self) {
        tracing::info!(
            base_url = %self.base_url,
            merchant_id = %self.merchant_id,
            api_key = %self.redacted_api_key(),
            webhook_url = %self.webhook_url,
            webhook_signing = self.webhook_secret.is_some(),
            timeout_secs = self.request_timeout.as_secs(),
            "Probe configuration loaded"
        );
    }
}

impl std::fmt::Debug for ProbeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeConfig")
            .field("base_url", &self.base_url)
            .field("merchant_id", &self.merchant_id)
            .field("api_key", &self.redacted_api_key())
            .field("webhook_url", &self.webhook_url)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "****"))
            .field("success_url", &self.success_url)
            .field("cancel_url", &self.cancel_url)
            .field("session_name_prefix", &self.session_name_prefix)
            .field("request_timeout", &self.request_timeout)
            .field("webhook_timeout", &self.webhook_timeout)
            .finish()
    }
}
