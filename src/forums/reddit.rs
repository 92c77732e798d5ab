use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::traits::{ForumError, ForumResults, ForumSource};
use crate::config::{base_url, Config};
use crate::constants::DISCOVERY_PAGE_SIZE;
use crate::models::{ForumSummary, Post};

/// Reddit client using application-only OAuth.
///
/// Holds only the connection pool and credentials. Tokens are acquired per
/// operation through [`RedditSession`] and go away with it.
#[derive(Clone)]
pub struct RedditClient {
    client: Client,
    api_base: Url,
    auth_base: Url,
    client_id: Option<String>,
    client_secret: Option<String>,
    discovery_max_pages: usize,
}

impl std::fmt::Debug for RedditClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditClient")
            .field("api_base", &self.api_base.as_str())
            .field("auth_base", &self.auth_base.as_str())
            .field("has_credentials", &self.client_id.is_some())
            .finish_non_exhaustive()
    }
}

impl RedditClient {
    /// Build a client from configuration. Credentials are not checked here.
    ///
    /// # Errors
    ///
    /// Returns an error if a base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, ForumError> {
        let client = Client::builder()
            .timeout(config.reddit_timeout)
            .user_agent(config.reddit_user_agent.as_str())
            // Reddit answers banned or missing subreddits with a redirect to search
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            api_base: base_url(&config.reddit_api_url)?,
            auth_base: base_url(&config.reddit_auth_url)?,
            client_id: config.reddit_client_id.clone(),
            client_secret: config.reddit_client_secret.clone(),
            discovery_max_pages: config.discovery_max_pages,
        })
    }

    /// Acquire an application-only bearer token.
    async fn session(&self) -> Result<RedditSession<'_>, ForumError> {
        let (Some(id), Some(secret)) = (&self.client_id, &self.client_secret) else {
            return Err(ForumError::MissingCredentials);
        };

        let url = self.auth_base.join("api/v1/access_token")?;
        let response = self
            .client
            .post(url)
            .basic_auth(id, Some(secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForumError::Auth(format!("token endpoint returned {status}")));
        }

        let token: TokenResponse = response.json().await?;
        match token.access_token {
            Some(access_token) if !access_token.is_empty() => {
                debug!("Acquired Reddit access token");
                Ok(RedditSession {
                    reddit: self,
                    access_token,
                })
            }
            _ => Err(ForumError::Auth(
                token.error.unwrap_or_else(|| "no access token".to_string()),
            )),
        }
    }
}

#[async_trait]
impl ForumSource for RedditClient {
    async fn search_posts(
        &self,
        forum: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Post>, ForumError> {
        let session = self.session().await?;
        session.search(forum, query, limit).await
    }

    async fn search_forums(
        &self,
        forums: &[String],
        query: &str,
        limit: u32,
    ) -> Result<ForumResults, ForumError> {
        // One token for the whole run
        let session = self.session().await?;
        let mut results = Vec::with_capacity(forums.len());
        for forum in forums {
            results.push(session.search(forum, query, limit).await);
        }
        Ok(results)
    }

    fn discover<'a>(&'a self, query: &'a str) -> BoxStream<'a, Result<ForumSummary, ForumError>> {
        let stream = try_stream! {
            let session = self.session().await?;
            let page_size = DISCOVERY_PAGE_SIZE.to_string();
            let mut after: Option<String> = None;

            for page in 0..self.discovery_max_pages {
                let listing: Listing<SubredditData> = {
                    let mut params = vec![
                        ("q", query),
                        ("limit", page_size.as_str()),
                        ("raw_json", "1"),
                    ];
                    if let Some(cursor) = after.as_deref() {
                        params.push(("after", cursor));
                    }
                    session.get("subreddits/search", &params, None).await?
                };
                debug!(page, count = listing.data.children.len(), "Fetched subreddit search page");

                for child in listing.data.children {
                    yield child.data.into_summary();
                }

                match listing.data.after {
                    Some(next) if !next.is_empty() => after = Some(next),
                    _ => break,
                }
            }
        };

        Box::pin(stream)
    }
}

/// Bearer token scoped to one operation.
struct RedditSession<'a> {
    reddit: &'a RedditClient,
    access_token: String,
}

impl RedditSession<'_> {
    async fn search(&self, forum: &str, query: &str, limit: u32) -> Result<Vec<Post>, ForumError> {
        let name = normalize_forum_name(forum)
            .ok_or_else(|| ForumError::UnknownForum(forum.to_string()))?;

        let limit = limit.to_string();
        let listing: Listing<SubmissionData> = self
            .get(
                &format!("r/{name}/search"),
                &[
                    ("q", query),
                    ("restrict_sr", "1"),
                    ("sort", "hot"),
                    ("t", "all"),
                    ("limit", limit.as_str()),
                    ("sr_detail", "1"),
                    ("raw_json", "1"),
                ],
                Some(name),
            )
            .await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data.into_post(name))
            .collect())
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        forum: Option<&str>,
    ) -> Result<T, ForumError> {
        let url = self.reddit.api_base.join(path)?;
        let response = self
            .reddit
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        warn!(path = %path, status = %status, "Reddit request failed");
        Err(match (status, forum) {
            (StatusCode::TOO_MANY_REQUESTS, _) => ForumError::RateLimited,
            (StatusCode::UNAUTHORIZED, _) => {
                ForumError::Auth(format!("{path} rejected the access token"))
            }
            (s, Some(name))
                if s == StatusCode::NOT_FOUND
                    || s == StatusCode::FORBIDDEN
                    || s.is_redirection() =>
            {
                ForumError::UnknownForum(name.to_string())
            }
            (s, _) => ForumError::Status {
                status: s.as_u16(),
                endpoint: path.to_string(),
            },
        })
    }
}

/// Strip an optional `r/` prefix and reject names Reddit cannot have.
fn normalize_forum_name(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let name = trimmed
        .strip_prefix("/r/")
        .or_else(|| trimmed.strip_prefix("r/"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(name)
}

fn pick_icon(community_icon: Option<String>, icon_img: Option<String>) -> Option<String> {
    community_icon
        .filter(|s| !s.is_empty())
        .or_else(|| icon_img.filter(|s| !s.is_empty()))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
    #[serde(default)]
    after: Option<String>,
    children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
struct Thing<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct SubmissionData {
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    sr_detail: Option<SubredditData>,
}

impl SubmissionData {
    fn into_post(self, forum: &str) -> Post {
        let subreddit_icon = self
            .sr_detail
            .and_then(|sr| pick_icon(sr.community_icon, sr.icon_img));

        Post {
            subreddit: forum.to_string(),
            subreddit_icon,
            title: self.title,
            content: self.selftext,
            url: self.url,
            score: self.score,
            num_comments: self.num_comments,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubredditData {
    #[serde(default)]
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    public_description: Option<String>,
    #[serde(default)]
    subscribers: Option<u64>,
    #[serde(default)]
    community_icon: Option<String>,
    #[serde(default)]
    icon_img: Option<String>,
}

impl SubredditData {
    fn into_summary(self) -> ForumSummary {
        let url = format!("https://www.reddit.com/r/{}", self.display_name);
        ForumSummary {
            name: self.name,
            url,
            display_name: self.display_name,
            description: self.public_description.filter(|d| !d.is_empty()),
            subscribers: self.subscribers.unwrap_or(0),
            subreddit_icon: pick_icon(self.community_icon, self.icon_img),
        }
    }
}
