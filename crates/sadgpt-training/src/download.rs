//! Reddit listing downloader.
//!
//! Authenticates with the password grant, then pages through a subreddit
//! listing with the `before` cursor until a batch comes back empty. Posts are
//! exported as `name,title,text`; comment exports pair each post with its top
//! comments as `name,title,comment`.

use crate::corpus::{write_records_as, Record};
use crate::error::{TrainingError, TrainingResult};
use reqwest::Client;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const USER_AGENT: &str = concat!("SadGPT/", env!("CARGO_PKG_VERSION"));

/// Listing entries requested per batch (the API maximum).
pub const PAGE_SIZE: u32 = 100;

/// Comments kept per post in comment exports.
pub const COMMENTS_PER_POST: usize = 5;

/// Script-app credentials, stored as a JSON file.
#[derive(Clone, Deserialize)]
pub struct RedditCredentials {
    pub client_id: String,
    pub secret_token: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl RedditCredentials {
    pub fn load(path: &Path) -> TrainingResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| TrainingError::Download(format!("failed to read credentials {}: {e}", path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| TrainingError::Download(format!("invalid credentials file {}: {e}", path.display())))
    }
}

/// Base URLs for the token endpoint and the authenticated API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditEndpoints {
    pub auth_base: String,
    pub api_base: String,
}

impl Default for RedditEndpoints {
    fn default() -> Self {
        Self {
            auth_base: "https://www.reddit.com".to_string(),
            api_base: "https://oauth.reddit.com".to_string(),
        }
    }
}

impl RedditEndpoints {
    /// Serve both endpoints from one base URL.
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self { auth_base: base.clone(), api_base: base }
    }
}

/// What a download collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    /// One row per post: title and self text.
    Post,
    /// One row per top comment of each top post of all time.
    Comment,
}

impl ListingKind {
    /// CSV column the body is written under.
    #[must_use]
    pub const fn body_column(self) -> &'static str {
        match self {
            Self::Post => "text",
            Self::Comment => "comment",
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Deserialize)]
struct ListingData<T> {
    children: Vec<Thing<T>>,
}

#[derive(Deserialize)]
struct Thing<T> {
    data: T,
}

#[derive(Deserialize)]
struct Post {
    name: String,
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
}

#[derive(Deserialize)]
struct Comment {
    body: Option<String>,
}

/// Authenticated API client.
#[derive(Debug, Clone)]
pub struct RedditClient {
    client: Client,
    endpoints: RedditEndpoints,
    token: String,
}

impl RedditClient {
    /// Exchange the credentials for a bearer token.
    pub async fn authenticate(credentials: &RedditCredentials, endpoints: RedditEndpoints) -> TrainingResult<Self> {
        let client = Client::builder().user_agent(USER_AGENT).timeout(Duration::from_secs(30)).build()?;

        let url = format!("{}/api/v1/access_token", endpoints.auth_base);
        let response = client
            .post(&url)
            .basic_auth(&credentials.client_id, Some(&credentials.secret_token))
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?;
        let status = response.status();
        let body: TokenResponse = response.json().await?;

        let token = body.access_token.ok_or_else(|| {
            TrainingError::Download(format!(
                "invalid credentials ({status}): {}",
                body.error.as_deref().unwrap_or("no access token in response")
            ))
        })?;

        tracing::info!(user = %credentials.username, "authenticated");
        Ok(Self { client, endpoints, token })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> TrainingResult<T> {
        let url = format!("{}{path}", self.endpoints.api_base);
        let response = self.client.get(&url).bearer_auth(&self.token).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TrainingError::Download(format!("GET {path} failed ({status}): {text}")));
        }
        Ok(response.json().await?)
    }

    async fn fetch_listing(&self, path: &str, extra: &[(&str, String)], before: Option<&str>) -> TrainingResult<Vec<Post>> {
        let mut query = vec![("limit", PAGE_SIZE.to_string()), ("raw_json", "1".to_string())];
        query.extend(extra.iter().cloned());
        if let Some(before) = before {
            query.push(("before", before.to_string()));
        }

        let listing: Listing<Post> = self.get_json(path, &query).await?;
        Ok(listing.data.children.into_iter().map(|thing| thing.data).collect())
    }

    /// One page of posts from `/r/<subreddit>/<sort_by>`.
    pub async fn fetch_posts(&self, subreddit: &str, sort_by: &str, before: Option<&str>) -> TrainingResult<Vec<Record>> {
        let posts = self.fetch_listing(&format!("/r/{subreddit}/{sort_by}"), &[], before).await?;
        Ok(posts.into_iter().map(|post| Record::new(post.name, post.title, post.selftext)).collect())
    }

    /// One page of top posts with up to [`COMMENTS_PER_POST`] comments each,
    /// ordered by `sort_by`.
    pub async fn fetch_comments(&self, subreddit: &str, sort_by: &str, before: Option<&str>) -> TrainingResult<Vec<Record>> {
        let posts = self
            .fetch_listing(&format!("/r/{subreddit}/top"), &[("t", "all".to_string())], before)
            .await?;

        let mut records = Vec::new();
        for post in posts {
            let query = [
                ("limit", COMMENTS_PER_POST.to_string()),
                ("raw_json", "1".to_string()),
                ("sort", sort_by.to_string()),
            ];
            let (_, comments): (IgnoredAny, Listing<Comment>) =
                self.get_json(&format!("/comments/{}", post.id), &query).await?;

            records.extend(
                comments
                    .data
                    .children
                    .into_iter()
                    .filter_map(|thing| thing.data.body)
                    .take(COMMENTS_PER_POST)
                    .map(|body| Record::new(post.name.clone(), post.title.clone(), body)),
            );
        }
        Ok(records)
    }

    /// Page through the listing until a batch adds nothing or `max_batches`
    /// pages have been read.
    ///
    /// A failure on the first page is returned. A failure on a later page
    /// ends the download with the pages collected so far.
    pub async fn download_all(
        &self,
        kind: ListingKind,
        subreddit: &str,
        sort_by: &str,
        max_batches: Option<usize>,
    ) -> TrainingResult<Vec<Record>> {
        let mut records: Vec<Record> = Vec::new();
        let mut before: Option<String> = None;
        let mut batch = 0usize;

        while max_batches.is_none_or(|max| batch < max) {
            let fetched = match kind {
                ListingKind::Post => self.fetch_posts(subreddit, sort_by, before.as_deref()).await,
                ListingKind::Comment => self.fetch_comments(subreddit, sort_by, before.as_deref()).await,
            };
            let fetched = match fetched {
                Ok(fetched) => fetched,
                Err(err) if batch > 0 => {
                    tracing::warn!(error = %err, batch, "stopping download after failed batch");
                    break;
                }
                Err(err) => return Err(err),
            };
            batch += 1;

            if fetched.is_empty() {
                break;
            }
            records.extend(fetched);
            before = records.last().map(|r| r.identifier.clone());
            tracing::info!(batch, records = records.len(), "downloaded batch");
        }

        Ok(records)
    }

    /// Download everything and write it as CSV. Returns the row count.
    pub async fn save(
        &self,
        kind: ListingKind,
        subreddit: &str,
        sort_by: &str,
        path: &Path,
        max_batches: Option<usize>,
    ) -> TrainingResult<usize> {
        let records = self.download_all(kind, subreddit, sort_by, max_batches).await?;
        write_records_as(path, &records, kind.body_column())?;
        Ok(records.len())
    }
}
