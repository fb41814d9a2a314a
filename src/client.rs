use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::models::{ApiBody, ApiConfig, Roster};

const CLIENT_UA: &str = concat!("activity-roster/", env!("CARGO_PKG_VERSION"));

/// Server verdict on a signup or unregister request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiReply {
    Accepted { message: String },
    Rejected { status: u16, detail: Option<String> },
}

/// The three calls the roster UI makes. Implemented by [`RosterClient`]
/// over HTTP and by in-memory fakes in tests.
pub trait RosterApi: Send + Sync {
    fn fetch_roster(&self) -> impl Future<Output = Result<Roster>> + Send;

    fn signup(&self, activity: &str, email: &str) -> impl Future<Output = Result<ApiReply>> + Send;

    fn unregister(
        &self,
        activity: &str,
        email: &str,
    ) -> impl Future<Output = Result<ApiReply>> + Send;
}

pub struct RosterClient {
    client: Client,
    base_url: String,
}

impl RosterClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder().default_headers(Self::default_headers());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_UA));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    pub fn roster_url(&self) -> String {
        format!("{}/activities", self.base_url)
    }

    /// `{base}/activities/{activity}/{action}?email={email}` with both values
    /// percent-encoded as given.
    pub fn mutation_url(&self, activity: &str, action: &str, email: &str) -> String {
        format!(
            "{}/activities/{}/{}?email={}",
            self.base_url,
            urlencoding::encode(activity),
            action,
            urlencoding::encode(email)
        )
    }
}

/// Interpret a mutation response. An unreadable body is a transport-level
/// failure regardless of status.
pub fn parse_reply(status: StatusCode, text: &str) -> Result<ApiReply> {
    let body: ApiBody = serde_json::from_str(text)
        .with_context(|| format!("Failed to parse response (status {status}): {text}"))?;

    if status.is_success() {
        Ok(ApiReply::Accepted {
            message: body.message.unwrap_or_default(),
        })
    } else {
        Ok(ApiReply::Rejected {
            status: status.as_u16(),
            detail: body.detail,
        })
    }
}

impl RosterApi for RosterClient {
    /// Fetch the full roster. Non-2xx or a body that is not a roster is an error.
    async fn fetch_roster(&self) -> Result<Roster> {
        let url = self.roster_url();

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch activities")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read activities response")?;
        debug!("Activities response (status {}): {}", status, text);

        if !status.is_success() {
            bail!("Activities request failed with status {status}");
        }

        let roster: Roster = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse activities (status {status}): {text}"))?;

        debug!("Fetched {} activities", roster.len());
        Ok(roster)
    }

    async fn signup(&self, activity: &str, email: &str) -> Result<ApiReply> {
        let url = self.mutation_url(activity, "signup", email);

        let resp = self
            .client
            .post(&url)
            .send()
            .await
            .context("Failed to send signup request")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read signup response")?;
        debug!("Signup response (status {}): {}", status, text);

        parse_reply(status, &text)
    }

    async fn unregister(&self, activity: &str, email: &str) -> Result<ApiReply> {
        let url = self.mutation_url(activity, "unregister", email);

        let resp = self
            .client
            .delete(&url)
            .send()
            .await
            .context("Failed to send unregister request")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read unregister response")?;
        debug!("Unregister response (status {}): {}", status, text);

        parse_reply(status, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> RosterClient {
        RosterClient::new(&ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: Some(5),
        })
        .unwrap()
    }

    #[test]
    fn test_mutation_url_encodes_path_and_query() {
        let c = client("http://localhost:8000/");
        assert_eq!(
            c.mutation_url("Chess Club", "signup", "a+b@c.com"),
            "http://localhost:8000/activities/Chess%20Club/signup?email=a%2Bb%40c.com"
        );
        assert_eq!(c.roster_url(), "http://localhost:8000/activities");
    }

    #[test]
    fn test_mutation_url_keeps_case() {
        let c = client("http://api");
        assert_eq!(
            c.mutation_url("Art/Design", "unregister", "Me@X.org"),
            "http://api/activities/Art%2FDesign/unregister?email=Me%40X.org"
        );
    }

    #[test]
    fn test_parse_reply_success() {
        let reply = parse_reply(
            StatusCode::OK,
            r#"{"message": "Signed up a@b.com for Chess Club"}"#,
        )
        .unwrap();
        assert_eq!(
            reply,
            ApiReply::Accepted {
                message: "Signed up a@b.com for Chess Club".into()
            }
        );
    }

    #[test]
    fn test_parse_reply_rejection_with_and_without_detail() {
        let reply = parse_reply(StatusCode::BAD_REQUEST, r#"{"detail": "Already registered"}"#).unwrap();
        assert_eq!(
            reply,
            ApiReply::Rejected {
                status: 400,
                detail: Some("Already registered".into())
            }
        );

        let reply = parse_reply(StatusCode::NOT_FOUND, "{}").unwrap();
        assert_eq!(reply, ApiReply::Rejected { status: 404, detail: None });
    }

    #[test]
    fn test_parse_reply_unreadable_body_is_error() {
        assert!(parse_reply(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>").is_err());
    }
}
