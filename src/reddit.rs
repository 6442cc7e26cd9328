//! Live `RedditApi` over Reddit's OAuth endpoints (script-app password grant).
//! Blocking and sequential: one request in flight at a time.

use crate::api::{ApiError, CommentData, RedditApi, SubmissionData};
use crate::config::Credentials;
use parking_lot::Mutex;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};

pub const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const API_BASE: &str = "https://oauth.reddit.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
// Refresh this long before the advertised expiry.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

struct Token {
    access: String,
    expires_at: Instant,
}

impl Token {
    fn fresh(&self) -> bool {
        Instant::now() + TOKEN_SLACK < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Deserialize)]
struct Thing {
    kind: String,
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct CommentFields {
    id: String,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Deserialize)]
struct SubmissionFields {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    selftext: Option<String>,
}

#[derive(Deserialize)]
struct Me {
    name: String,
}

pub struct RedditClient {
    http: Client,
    creds: Credentials,
    token: Mutex<Option<Token>>,
}

impl RedditClient {
    /// Build the HTTP client and perform the initial token exchange.
    /// Any failure here is fatal for the caller.
    pub fn connect(creds: Credentials) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(creds.user_agent.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let client = Self { http, creds, token: Mutex::new(None) };
        let token = client.exchange_token()?;
        *client.token.lock() = Some(token);
        Ok(client)
    }

    /// Name of the authenticated account (`/api/v1/me`).
    pub fn me(&self) -> Result<String, ApiError> {
        let me: Me = self.get_json("/api/v1/me", &[])?;
        Ok(me.name)
    }

    fn exchange_token(&self) -> Result<Token, ApiError> {
        let resp = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.creds.client_id, Some(&self.creds.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.creds.username.as_str()),
                ("password", self.creds.password.as_str()),
            ])
            .send()
            .map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Auth(format!("token endpoint returned HTTP {}", status.as_u16())));
        }
        let body: TokenResponse = resp.json().map_err(|e| ApiError::Decode(e.to_string()))?;
        match (body.access_token, body.error) {
            (Some(access), None) => {
                let ttl = Duration::from_secs(body.expires_in.unwrap_or(3600));
                tracing::debug!(expires_in = ttl.as_secs(), "obtained Reddit access token");
                Ok(Token { access, expires_at: Instant::now() + ttl })
            }
            (_, Some(err)) => Err(ApiError::Auth(err)),
            (None, None) => Err(ApiError::Auth("token response without access_token".into())),
        }
    }

    fn bearer(&self) -> Result<String, ApiError> {
        let mut guard = self.token.lock();
        match guard.as_ref() {
            Some(t) if t.fresh() => Ok(t.access.clone()),
            _ => {
                let t = self.exchange_token()?;
                let access = t.access.clone();
                *guard = Some(t);
                Ok(access)
            }
        }
    }

    fn send(&self, build: impl Fn(&str) -> RequestBuilder) -> Result<Response, ApiError> {
        let resp = build(&self.bearer()?).send().map_err(transport)?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }
        // Token revoked or expired early: exchange once and replay.
        tracing::debug!("access token rejected; refreshing");
        *self.token.lock() = None;
        build(&self.bearer()?).send().map_err(transport)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ApiError> {
        let url = format!("{API_BASE}{path}");
        let resp = self.send(|token| {
            self.http
                .get(&url)
                .bearer_auth(token)
                .query(query)
                .query(&[("raw_json", "1")])
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(status, &resp));
        }
        resp.json::<T>().map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `/api/info?id=<fullname>`; returns the first matching thing of `kind`.
    fn info(&self, fullname: &str, kind: &'static str, id: &str) -> Result<serde_json::Value, ApiError> {
        let listing: Listing = self.get_json("/api/info", &[("id", fullname)])?;
        listing
            .data
            .children
            .into_iter()
            .find(|t| t.kind == fullname[..2])
            .map(|t| t.data)
            .ok_or_else(|| ApiError::NotFound { kind, id: id.to_string() })
    }
}

impl RedditApi for RedditClient {
    fn fetch_comment(&self, id: &str) -> Result<CommentData, ApiError> {
        let v = self.info(&format!("t1_{id}"), "comment", id)?;
        let c: CommentFields = serde_json::from_value(v).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(CommentData { id: c.id, body: c.body.unwrap_or_default() })
    }

    fn fetch_submission(&self, id: &str) -> Result<SubmissionData, ApiError> {
        let v = self.info(&format!("t3_{id}"), "submission", id)?;
        let s: SubmissionFields = serde_json::from_value(v).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(SubmissionData {
            id: s.id,
            title: s.title.unwrap_or_default(),
            selftext: s.selftext.unwrap_or_default(),
        })
    }
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

fn status_error(status: StatusCode, resp: &Response) -> ApiError {
    match status.as_u16() {
        403 => ApiError::Forbidden,
        404 => ApiError::NotFound { kind: "thing", id: resp.url().to_string() },
        429 => {
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            ApiError::RateLimited { retry_after }
        }
        s @ 500..=599 => ApiError::Server(s),
        s => ApiError::Status(s),
    }
}
