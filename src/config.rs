use url::Url;

use crate::endpoints::{BASE_URL, TOKEN_URL};
use crate::entities::ActivityId;
use crate::error::{Error, Result};
use crate::oauth::Credentials;

pub const ENV_CLIENT_ID: &str = "STRAVA_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "STRAVA_CLIENT_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "STRAVA_REFRESH_TOKEN";
pub const ENV_TEST_ACTIVITY_ID: &str = "STRAVA_TEST_ACTIVITY_ID";
pub const ENV_API_BASE_URL: &str = "STRAVA_API_BASE_URL";
pub const ENV_TOKEN_URL: &str = "STRAVA_TOKEN_URL";

/// Everything a run needs: credentials, the optional activity override and
/// the endpoints to talk to.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub test_activity_id: Option<ActivityId>,
    pub api_base_url: Url,
    pub token_url: Url,
}

impl Config {
    /// Configuration against the public Strava endpoints.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Ok(Self {
            credentials,
            test_activity_id: None,
            api_base_url: parse_url(BASE_URL)?,
            token_url: parse_url(TOKEN_URL)?,
        })
    }

    /// Reads the configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a local `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(Error::MissingEnv(key));

        let credentials = Credentials::new(
            require(ENV_CLIENT_ID)?,
            require(ENV_CLIENT_SECRET)?,
            require(ENV_REFRESH_TOKEN)?,
        );

        let mut config = Self::new(credentials)?;
        if let Some(id) = get(ENV_TEST_ACTIVITY_ID) {
            config.test_activity_id = Some(id.parse()?);
        }
        if let Some(url) = get(ENV_API_BASE_URL) {
            config.api_base_url = parse_base_url(&url)?;
        }
        if let Some(url) = get(ENV_TOKEN_URL) {
            config.token_url = parse_url(&url)?;
        }

        debug!(
            client_id = config.credentials.client_id().as_str(),
            test_activity_id = ?config.test_activity_id,
            api_base_url = %config.api_base_url,
            token_url = %config.token_url,
            "loaded configuration"
        );
        Ok(config)
    }

    #[must_use]
    pub fn with_test_activity_id(mut self, id: impl Into<Option<ActivityId>>) -> Self {
        self.test_activity_id = id.into();
        self
    }

    pub fn with_api_base_url(mut self, url: &str) -> Result<Self> {
        self.api_base_url = parse_base_url(url)?;
        Ok(self)
    }

    pub fn with_token_url(mut self, url: &str) -> Result<Self> {
        self.token_url = parse_url(url)?;
        Ok(self)
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|_| Error::InvalidEndpoint)
}

/// Endpoint paths are joined onto the base, so it must end with a slash.
fn parse_base_url(url: &str) -> Result<Url> {
    if url.ends_with('/') {
        parse_url(url)
    } else {
        parse_url(&format!("{url}/"))
    }
}
