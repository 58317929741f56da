//! Client configuration
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | LOOKBOOK_DATABASE_URL | http://localhost:9000 | realtime database root |
//! | LOOKBOOK_API_KEY | - | sign-in API key |
//! | LOOKBOOK_AUTH_TOKEN | - | id token appended to every request |
//! | LOOKBOOK_TIMEOUT_SECS | 30 | request timeout |
//! | LOOKBOOK_PRODUCTS_PATH | products | products collection |
//! | LOOKBOOK_OUTFITS_PATH | outfits | outfits collection |

use shared::EntityKind;

/// Default sign-in endpoint (identity toolkit compatible)
pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Client configuration for connecting to the realtime database
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Database root URL (e.g., "https://shop-default-rtdb.firebaseio.com")
    pub database_url: String,

    /// Sign-in endpoint base URL
    pub auth_url: String,

    /// API key for the sign-in endpoint
    pub api_key: Option<String>,

    /// Id token for authenticated reads and writes
    pub auth_token: Option<String>,

    /// Request timeout in seconds (streams are not subject to it)
    pub timeout: u64,

    /// Products collection path
    pub products_path: String,

    /// Outfits collection path
    pub outfits_path: String,
}

impl ClientConfig {
    /// Create a new configuration with default collection paths
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_key: None,
            auth_token: None,
            timeout: 30,
            products_path: EntityKind::Product.default_path().to_string(),
            outfits_path: EntityKind::Outfit.default_path().to_string(),
        }
    }

    /// Load from environment variables (after reading `.env` if present)
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let mut config = Self::new(
            std::env::var("LOOKBOOK_DATABASE_URL").unwrap_or_else(|_| "http://localhost:9000".into()),
        );
        config.api_key = std::env::var("LOOKBOOK_API_KEY").ok();
        config.auth_token = std::env::var("LOOKBOOK_AUTH_TOKEN").ok();
        if let Ok(url) = std::env::var("LOOKBOOK_AUTH_URL") {
            config.auth_url = url;
        }
        config.timeout = std::env::var("LOOKBOOK_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(30);
        if let Ok(path) = std::env::var("LOOKBOOK_PRODUCTS_PATH") {
            config.products_path = path;
        }
        if let Ok(path) = std::env::var("LOOKBOOK_OUTFITS_PATH") {
            config.outfits_path = path;
        }
        config
    }

    /// Set the sign-in API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the sign-in endpoint
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    /// Set the id token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the products collection path
    pub fn with_products_path(mut self, path: impl Into<String>) -> Self {
        self.products_path = path.into();
        self
    }

    /// Set the outfits collection path
    pub fn with_outfits_path(mut self, path: impl Into<String>) -> Self {
        self.outfits_path = path.into();
        self
    }

    /// Collection path for an entity kind
    pub fn path_for(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Product => &self.products_path,
            EntityKind::Outfit => &self.outfits_path,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:9000")
    }
}
