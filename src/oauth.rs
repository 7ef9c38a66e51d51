use std::time::Duration;

use oauth2::{
    basic::{BasicTokenIntrospectionResponse, BasicTokenType},
    AccessToken, AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, RefreshToken,
    StandardRevocableToken, TokenUrl,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error;

/// Stores the OAuth 2 client ID, client secret and the long-lived refresh token.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub(crate) client_id: ClientId,
    pub(crate) client_secret: ClientSecret,
    pub(crate) refresh_token: RefreshToken,
}

impl Credentials {
    #[must_use]
    pub fn new(client_id: String, client_secret: String, refresh_token: String) -> Self {
        Self {
            client_id: ClientId::new(client_id),
            client_secret: ClientSecret::new(client_secret),
            refresh_token: RefreshToken::new(refresh_token),
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    #[must_use]
    pub fn refresh_token(&self) -> &RefreshToken {
        &self.refresh_token
    }

    /// Builds an OAuth client that posts the credentials in the form body of
    /// the token request, which is what Strava expects.
    pub(crate) fn oauth_client(&self, token_url: &Url) -> OAuthClient {
        oauth2::Client::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(TokenUrl::from_url(token_url.clone()))
    }
}

pub type OAuthClient = oauth2::Client<
    error::OAuth2ErrorResponse,
    TokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    error::OAuth2ErrorResponse,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

fn default_token_type() -> BasicTokenType {
    BasicTokenType::Bearer
}

/// Body of a successful refresh-token exchange.
///
/// Strava also returns `expires_at`; `token_type` and `expires_in` are
/// optional so minimal responses still parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    access_token: AccessToken,
    #[serde(default = "default_token_type")]
    token_type: BasicTokenType,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    refresh_token: Option<RefreshToken>,
}

impl TokenResponse {
    /// Epoch second at which the access token expires, if reported.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }
}

impl oauth2::TokenResponse for TokenResponse {
    type TokenType = BasicTokenType;

    fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    fn token_type(&self) -> &BasicTokenType {
        &self.token_type
    }

    fn expires_in(&self) -> Option<Duration> {
        self.expires_in.map(Duration::from_secs)
    }

    fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    fn scopes(&self) -> Option<&Vec<oauth2::Scope>> {
        None
    }
}
