//! REST-backed tweet source
//!
//! Talks to the scraper sidecar, which owns the actual social-network
//! protocol (login handshake, CAPTCHA, GraphQL shapes) and re-exposes it as
//! plain JSON REST. One `RestTweetSource` per account so each session can
//! ride its own egress proxy.
//!
//! Endpoints:
//! - `POST {base}/session` — establish a login for this connection
//! - `GET  {base}/users/by/username/{username}` — resolve a user
//! - `GET  {base}/users/{id}/tweets?tweet_type=&count=&cursor=` — one page

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::classify::classify_response;
use crate::credentials::AccountCredentials;
use crate::error::UpstreamError;
use crate::types::{TweetPage, UserProfile};
use crate::{Result, TweetSource};

/// Login request body sent to the sidecar.
#[derive(Serialize)]
struct LoginRequest<'a> {
    auth_info_1: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_info_2: Option<&'a str>,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cookies_file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    totp_secret: Option<&'a str>,
}

/// One sidecar-backed upstream connection.
pub struct RestTweetSource {
    client: reqwest::Client,
    base_url: String,
}

impl RestTweetSource {
    /// Build a source for one account.
    ///
    /// `proxy` routes this connection's egress (per-account proxies keep
    /// accounts from sharing an exit IP). Transport construction failures
    /// surface as `Unexpected` — there is no taxonomy entry for "could not
    /// even build a client".
    pub fn new(base_url: &str, timeout: Duration, proxy: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(proxy_url) = proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| UpstreamError::Unexpected(format!("invalid proxy url: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| UpstreamError::Unexpected(format!("building http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Execute a request and decode the success body, classifying failures.
    async fn execute<T: serde::de::DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let response = req
            .send()
            .await
            .map_err(|e| UpstreamError::Unexpected(format!("transport: {e}")))?;
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| UpstreamError::Unexpected(format!("decoding response: {e}")))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_response(status.as_u16(), &body))
        }
    }
}

impl TweetSource for RestTweetSource {
    fn login<'a>(
        &'a self,
        credentials: &'a AccountCredentials,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let body = LoginRequest {
                auth_info_1: &credentials.auth_info_1,
                auth_info_2: credentials.auth_info_2.as_deref(),
                password: credentials.password.expose(),
                cookies_file: credentials
                    .cookies_file
                    .as_ref()
                    .and_then(|p| p.to_str()),
                totp_secret: credentials.totp_secret.as_ref().map(|s| s.expose().as_str()),
            };
            let url = format!("{}/session", self.base_url);
            debug!(account = %credentials.auth_info_1, "establishing upstream session");
            let _: serde_json::Value = self.execute(self.client.post(&url).json(&body)).await?;
            Ok(())
        })
    }

    fn user_by_screen_name<'a>(
        &'a self,
        username: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<UserProfile>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/users/by/username/{username}", self.base_url);
            self.execute(self.client.get(&url)).await
        })
    }

    fn user_tweets<'a>(
        &'a self,
        user_id: &'a str,
        tweet_type: &'a str,
        count: u32,
        cursor: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<TweetPage>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/users/{user_id}/tweets", self.base_url);
            let mut query: Vec<(&str, String)> = vec![
                ("tweet_type", tweet_type.to_string()),
                ("count", count.to_string()),
            ];
            if let Some(cursor) = cursor {
                query.push(("cursor", cursor.to_string()));
            }
            self.execute(self.client.get(&url).query(&query)).await
        })
    }
}
