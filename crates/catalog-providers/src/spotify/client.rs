use crate::spotify::parser::{
    parse_search_results, parse_token, parse_tracks, AccessToken, Fallbacks, ParseError,
};
use crate::CatalogEntry;
use async_lock::Mutex;
use reqwest::{Client, Response, StatusCode};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

const SPOTIFY_ACCOUNTS_ENDPOINT: &str = "https://accounts.spotify.com";
const SPOTIFY_API_ENDPOINT: &str = "https://api.spotify.com";
const MAX_IDS_PER_REQUEST: usize = 50;
const SEARCH_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum SpotifyClientError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("Spotify responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Spotify token response has no access token")]
    MissingAccessToken,
    #[error("Malformed Spotify response: {0}")]
    Malformed(serde_json::Error),
    #[error("Giving up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },
}

impl From<ParseError> for SpotifyClientError {
    fn from(error: ParseError) -> Self {
        match error {
            ParseError::Json(error) => SpotifyClientError::Malformed(error),
            ParseError::MissingAccessToken => SpotifyClientError::MissingAccessToken,
        }
    }
}

impl SpotifyClientError {
    fn is_retryable(&self) -> bool {
        match self {
            SpotifyClientError::Http(_) => true,
            SpotifyClientError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
                    || *status == StatusCode::UNAUTHORIZED.as_u16()
                    || *status >= 500
            }
            _ => false,
        }
    }

    fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            SpotifyClientError::Status { status, .. }
                if *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
        )
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            rate_limit_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub(crate) fn delay_for(&self, attempt: usize, error: &SpotifyClientError) -> Duration {
        if error.is_rate_limited() {
            return self.rate_limit_delay;
        }

        self.base_delay * 2u32.saturating_pow(attempt as u32)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct SpotifyOptions {
    pub market: String,
    pub fallbacks: Fallbacks,
    pub retry: RetryPolicy,
}

/// Spotify Web API client using the client-credentials grant.
pub struct SpotifyClient {
    client: Client,
    credentials: SpotifyCredentials,
    options: SpotifyOptions,
    accounts_endpoint: String,
    api_endpoint: String,
    token: Mutex<Option<AccessToken>>,
}

impl SpotifyClient {
    pub fn create(credentials: SpotifyCredentials, options: SpotifyOptions) -> Self {
        Self::with_endpoints(
            credentials,
            options,
            SPOTIFY_ACCOUNTS_ENDPOINT,
            SPOTIFY_API_ENDPOINT,
        )
    }

    pub fn with_endpoints(
        credentials: SpotifyCredentials,
        options: SpotifyOptions,
        accounts_endpoint: &str,
        api_endpoint: &str,
    ) -> Self {
        Self {
            client: Client::new(),
            credentials,
            options,
            accounts_endpoint: accounts_endpoint.trim_end_matches('/').to_string(),
            api_endpoint: api_endpoint.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        }
    }

    /// Fetches the given tracks in request-sized batches. Unknown ids are skipped.
    pub async fn get_tracks(&self, ids: &[String]) -> Result<Vec<CatalogEntry>, SpotifyClientError> {
        let mut entries = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            let raw_json = self
                .with_retries("get tracks", move || self.request_tracks(chunk))
                .await?;

            entries.extend(parse_tracks(&raw_json, &self.options.fallbacks)?);
        }

        debug!(requested = ids.len(), received = entries.len(), "Spotify tracks fetched");

        Ok(entries)
    }

    /// Searches tracks by free text. Only hits with a preview are returned.
    pub async fn search_tracks(&self, query: &str) -> Result<Vec<CatalogEntry>, SpotifyClientError> {
        let query = query.trim();

        if query.is_empty() {
            return Ok(vec![]);
        }

        let params = [
            ("q", query.to_string()),
            ("type", "track".to_string()),
            ("market", self.options.market.clone()),
            ("limit", SEARCH_LIMIT.to_string()),
        ];
        let params = &params[..];

        let raw_json = self
            .with_retries("search tracks", move || self.authorized_get("/v1/search", params))
            .await?;
        let entries = parse_search_results(&raw_json, &self.options.fallbacks)?;

        debug!(query, found = entries.len(), "Spotify search finished");

        Ok(entries)
    }

    async fn access_token(&self) -> Result<String, SpotifyClientError> {
        let mut token = self.token.lock().await;

        if let Some(cached) = token.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(cached.value.clone());
        }

        let fresh = self
            .with_retries("request access token", || self.request_token())
            .await?;
        let value = fresh.value.clone();
        *token = Some(fresh);

        Ok(value)
    }

    async fn request_token(&self) -> Result<AccessToken, SpotifyClientError> {
        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_endpoint))
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let raw_json = read_body(response).await?;

        Ok(parse_token(&raw_json, Instant::now())?)
    }

    async fn request_tracks(&self, ids: &[String]) -> Result<String, SpotifyClientError> {
        let params = [("ids", ids.join(",")), ("market", self.options.market.clone())];

        self.authorized_get("/v1/tracks", &params).await
    }

    async fn authorized_get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<String, SpotifyClientError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(format!("{}{}", self.api_endpoint, path))
            .query(params)
            .bearer_auth(token)
            .send()
            .await?;

        match read_body(response).await {
            Err(SpotifyClientError::Status { status, body })
                if status == StatusCode::UNAUTHORIZED.as_u16() =>
            {
                // The cached token was revoked early; fetch a new one on retry.
                self.token.lock().await.take();
                Err(SpotifyClientError::Status { status, body })
            }
            result => result,
        }
    }

    pub(crate) async fn with_retries<T, F, Fut>(
        &self,
        operation: &str,
        mut attempt_fn: F,
    ) -> Result<T, SpotifyClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SpotifyClientError>>,
    {
        let policy = &self.options.retry;
        let mut attempt = 0;

        loop {
            let error = match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) => error,
            };

            if attempt >= policy.max_retries {
                error!(%error, operation, "Spotify request failed permanently");
                return Err(SpotifyClientError::RetriesExhausted {
                    attempts: attempt + 1,
                    last_error: error.to_string(),
                });
            }

            let delay = policy.delay_for(attempt, &error);
            warn!(%error, operation, retry = attempt + 1, ?delay, "Spotify request failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

async fn read_body(response: Response) -> Result<String, SpotifyClientError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(SpotifyClientError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}
