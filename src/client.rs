use core::fmt;
use std::time::Duration;

use oauth2::{AccessToken, TokenResponse};
use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::config::Config;
use crate::endpoints::StravaEndpoint;
use crate::entities::activity::{Activity, ActivityId, ListParameters, UpdatableActivity};
use crate::error::{Error, Fault, Result};

// Rate limiting headers used by the Strava API. Each carries two
// comma-separated numbers: the 15-minute window and the daily window.
/// Header containing the request limits
const HEADER_RATE_LIMIT: &str = "X-RateLimit-Limit";
/// Header containing the requests used so far
const HEADER_RATE_LIMIT_USAGE: &str = "X-RateLimit-Usage";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Information about the API rate limits reported with a response
///
/// Strava applies two limits per application:
/// - a short-term limit per 15-minute window (default 200)
/// - a daily limit (default 2000)
pub struct RateLimitInfo {
    pub short_term_limit: Option<u32>,
    pub daily_limit: Option<u32>,
    pub short_term_usage: Option<u32>,
    pub daily_usage: Option<u32>,
}

impl RateLimitInfo {
    /// Extract rate limit information from response headers
    #[must_use]
    pub fn from_response_headers(headers: &header::HeaderMap) -> Self {
        let pair = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| {
                    let mut parts = s.split(',').map(|p| p.trim().parse::<u32>().ok());
                    (parts.next().flatten(), parts.next().flatten())
                })
                .unwrap_or_default()
        };

        let (short_term_limit, daily_limit) = pair(HEADER_RATE_LIMIT);
        let (short_term_usage, daily_usage) = pair(HEADER_RATE_LIMIT_USAGE);
        Self {
            short_term_limit,
            daily_limit,
            short_term_usage,
            daily_usage,
        }
    }

    /// Returns true if either window has less than 10% of its requests left
    #[must_use]
    pub fn is_near_limit(&self) -> bool {
        fn near(usage: Option<u32>, limit: Option<u32>) -> bool {
            match (usage, limit) {
                (Some(usage), Some(limit)) if limit > 0 => {
                    u64::from(usage) * 10 >= u64::from(limit) * 9
                }
                _ => false,
            }
        }

        near(self.short_term_usage, self.short_term_limit)
            || near(self.daily_usage, self.daily_limit)
    }
}

#[derive(Clone, Debug)]
/// This is the client that is used for interacting with the Strava API. It carries the
/// access token obtained from the refresh-token exchange.
pub struct Client {
    http_client: reqwest::Client,
    api_base_url: Url,
    access_token: AccessToken,
}

impl Client {
    /// Creates a client for an already obtained access token.
    #[must_use]
    pub fn new(api_base_url: Url, access_token: AccessToken) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_base_url,
            access_token,
        }
    }

    /// Exchanges the configured refresh token for a fresh access token.
    ///
    /// # Errors
    /// Returns an error if the token endpoint can't be reached or rejects the credentials.
    #[instrument(skip(config), fields(token_url = %config.token_url))]
    pub async fn refresh_access_token(config: &Config) -> Result<AccessToken> {
        let oauth_client = config.credentials.oauth_client(&config.token_url);
        // Token requests must not follow redirects.
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        trace!("exchanging refresh token");
        let token_result = oauth_client
            .exchange_refresh_token(config.credentials.refresh_token())
            .request_async(&http_client)
            .await?;

        debug!(
            expires_in = ?token_result.expires_in(),
            expires_at = ?token_result.expires_at(),
            "received access token"
        );
        Ok(token_result.access_token().clone())
    }

    /// Refreshes the access token and builds a client around it.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let access_token = Self::refresh_access_token(config).await?;
        Ok(Self::new(config.api_base_url.clone(), access_token))
    }

    #[must_use]
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    #[must_use]
    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    fn endpoint_url(&self, endpoint: &StravaEndpoint) -> Result<Url> {
        endpoint.to_url(&self.api_base_url)
    }

    /// Build a request object with authentication headers.
    pub(crate) fn build_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .bearer_auth(self.access_token.secret())
            .header(header::ACCEPT, "application/json")
    }

    /// Perform an authenticated `GET` request against a typed endpoint.
    #[instrument(skip(self, query))]
    pub async fn get<R: DeserializeOwned, T: Serialize + fmt::Debug + ?Sized>(
        &self,
        endpoint: StravaEndpoint,
        query: &T,
    ) -> Result<R> {
        let url = self.endpoint_url(&endpoint)?;
        trace!(?query, %url, "making GET request");
        let response = self
            .build_request(Method::GET, url)
            .query(query)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Perform an authenticated `PUT` request with a form-encoded body.
    ///
    /// Any 2xx status counts as success; the response body is not interpreted.
    #[instrument(skip(self, form))]
    pub async fn put_form<T: Serialize + fmt::Debug + ?Sized>(
        &self,
        endpoint: StravaEndpoint,
        form: &T,
    ) -> Result<()> {
        let url = self.endpoint_url(&endpoint)?;
        trace!(?form, %url, "making PUT request");
        let response = self
            .build_request(Method::PUT, url)
            .form(form)
            .send()
            .await?;

        Self::read_response(response, endpoint.entity()).await?;
        Ok(())
    }

    #[instrument(skip(response))]
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown")
            .trim_end_matches('>');

        let text = Self::read_response(response, entity_type).await?;
        serde_json::from_str(&text).map_err(|e| {
            error!(
                "Deserialization error: {}, near column {}: {}",
                e,
                e.column(),
                text.chars()
                    .skip(e.column().saturating_sub(30))
                    .take(100)
                    .collect::<String>()
            );
            Error::DeserializationError(e, Some(text.clone()))
        })
    }

    /// Returns the body of a 2xx response and maps every other status to an error.
    async fn read_response(response: reqwest::Response, entity_type: &str) -> Result<String> {
        let status = response.status();
        let url = response.url().to_string();

        debug!(%url, %status, %entity_type, "received response");

        let rate_limit_info = RateLimitInfo::from_response_headers(response.headers());
        if rate_limit_info.is_near_limit() {
            warn!(
                "Approaching Strava API rate limits: 15min={:?}/{:?}, daily={:?}/{:?}",
                rate_limit_info.short_term_usage,
                rate_limit_info.short_term_limit,
                rate_limit_info.daily_usage,
                rate_limit_info.daily_limit
            );
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();

            warn!(%url, ?retry_after, ?rate_limit_info, "rate limit exceeded");
            return Err(Error::RateLimitExceeded {
                retry_after,
                status_code: status,
                url,
                body,
            });
        }

        let text = response.text().await?;
        debug!("Response body size: {} bytes", text.len());
        trace!("Response text:\n{}", text);

        if status.is_success() {
            return Ok(text);
        }

        let fault = serde_json::from_str::<Fault>(&text).ok();
        match status {
            StatusCode::NOT_FOUND => Err(Error::NotFound {
                entity: entity_type.to_string(),
                url,
                status_code: status,
                body: text,
            }),
            StatusCode::UNAUTHORIZED => Err(Error::Unauthorized {
                status_code: status,
                url,
                fault,
                body: text,
            }),
            status => {
                error!("Unexpected status code: {}", status);
                Err(Error::Api {
                    status_code: status,
                    url,
                    fault,
                    body: text,
                })
            }
        }
    }

    /// Access the activities API
    #[must_use]
    pub fn activities(&self) -> ActivitiesApi<'_> {
        ActivitiesApi { client: self }
    }
}

/// API handler for activity endpoints
#[derive(Debug)]
pub struct ActivitiesApi<'a> {
    client: &'a Client,
}

impl ActivitiesApi<'_> {
    /// List the authenticated athlete's activities, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, parameters: ListParameters) -> Result<Vec<Activity>> {
        self.client
            .get(StravaEndpoint::AthleteActivities, &parameters)
            .await
    }

    /// The most recent activity, or `None` when the athlete has none.
    #[instrument(skip(self))]
    pub async fn latest(&self) -> Result<Option<Activity>> {
        let activities = self.list(ListParameters::first_page(1)).await?;
        Ok(activities.into_iter().next())
    }

    /// Retrieve a single activity by ID
    #[instrument(skip(self))]
    pub async fn get(&self, activity_id: ActivityId) -> Result<Activity> {
        self.client
            .get(StravaEndpoint::Activity(activity_id), &())
            .await
    }

    /// Set the name of an activity.
    #[instrument(skip(self))]
    pub async fn rename(&self, activity_id: ActivityId, name: &str) -> Result<()> {
        self.client
            .put_form(
                StravaEndpoint::Activity(activity_id),
                &UpdatableActivity::rename(name),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    fn headers(limit: &'static str, usage: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static(limit));
        headers.insert("x-ratelimit-usage", HeaderValue::from_static(usage));
        headers
    }

    #[test]
    fn parses_rate_limit_headers() {
        let info = RateLimitInfo::from_response_headers(&headers("200,2000", "12,340"));
        assert_eq!(
            info,
            RateLimitInfo {
                short_term_limit: Some(200),
                daily_limit: Some(2000),
                short_term_usage: Some(12),
                daily_usage: Some(340),
            }
        );
        assert!(!info.is_near_limit());
    }

    #[test]
    fn near_limit_when_window_almost_used() {
        assert!(RateLimitInfo::from_response_headers(&headers("200,2000", "180,340")).is_near_limit());
        assert!(RateLimitInfo::from_response_headers(&headers("200,2000", "10,1999")).is_near_limit());
    }

    #[test]
    fn missing_headers_are_not_near_limit() {
        let info = RateLimitInfo::from_response_headers(&HeaderMap::new());
        assert_eq!(info, RateLimitInfo::default());
        assert!(!info.is_near_limit());
    }

    #[test]
    fn bearer_header_is_attached() {
        let client = Client::new(
            Url::parse("https://www.strava.com/api/v3/").unwrap(),
            AccessToken::new("abc123".to_string()),
        );
        let request = client
            .build_request(
                Method::GET,
                StravaEndpoint::AthleteActivities
                    .to_url(client.api_base_url())
                    .unwrap(),
            )
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer abc123"
        );
    }
}
