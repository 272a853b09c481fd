//! GitHub platform service implementation
//!
//! REST for the git object model (refs, blobs, trees, commits), forks and
//! pulls; GraphQL for head-ref lookups and draft promotion, which GitHub
//! only exposes there.

use crate::config::PortalConfig;
use crate::error::{Error, Result};
use crate::platform::{PlatformService, UpstreamRepo};
use crate::types::{
    CommitInfo, NewPullRequest, PrState, PrStateFilter, PullRequestRecord, RepositoryInfo,
    RepositoryRef, TreeEntry,
};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// User-Agent header value for API requests
const USER_AGENT_VALUE: &str = "contrib-portal";

/// REST API version pinned in every request
const API_VERSION: &str = "2022-11-28";

/// Items requested per page on list endpoints
const PAGE_SIZE: usize = 100;

/// Upper bound on pages fetched by one list call
const MAX_PAGES: usize = 10;

const FIND_PULLS_BY_HEAD_QUERY: &str = r"query($owner: String!, $repo: String!, $head: String!, $first: Int!) {
  repository(owner: $owner, name: $repo) {
    pullRequests(headRefName: $head, states: OPEN, first: $first) {
      nodes {
        id
        databaseId
        number
        title
        state
        isDraft
        url
        mergedAt
        headRefName
        author { login }
        headRepositoryOwner { login }
      }
    }
  }
}";

const MARK_READY_MUTATION: &str = r"mutation($id: ID!) {
  markPullRequestReadyForReview(input: {pullRequestId: $id}) {
    pullRequest { id isDraft }
  }
}";

/// GitHub service using reqwest
pub struct GitHubService {
    client: Client,
    api_base: String,
    graphql_url: String,
    upstream: UpstreamRepo,
}

// The token lives in the client's default headers; keep it out of Debug output
impl std::fmt::Debug for GitHubService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubService")
            .field("api_base", &self.api_base)
            .field("graphql_url", &self.graphql_url)
            .field("upstream", &self.upstream)
            .finish_non_exhaustive()
    }
}

impl GitHubService {
    /// Create a service authenticated with `token`
    pub fn new(config: &PortalConfig, token: &str) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::Auth("token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            graphql_url: config.graphql_url.clone(),
            upstream: UpstreamRepo {
                owner: config.upstream_owner.clone(),
                repo: config.repo.clone(),
            },
        })
    }

    fn repo_url(&self, owner: &str, path: &str) -> String {
        format!(
            "{}/repos/{owner}/{}/{path}",
            self.api_base, self.upstream.repo
        )
    }

    fn upstream_url(&self, path: &str) -> String {
        self.repo_url(&self.upstream.owner, path)
    }

    /// Send a request and parse a successful JSON body
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_from_response(response, what).await)
        }
    }

    /// Send a request whose success body is irrelevant
    async fn send_empty(&self, request: RequestBuilder, what: &str) -> Result<()> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response, what).await)
        }
    }

    /// Fetch every page of a list endpoint
    ///
    /// Fails with `TooManyResults` rather than returning a partial listing
    /// when more than `MAX_PAGES` full pages exist.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let per_page = PAGE_SIZE.to_string();

        for page in 1..=MAX_PAGES {
            let page = page.to_string();
            let request = self
                .client
                .get(url)
                .query(query)
                .query(&[("per_page", per_page.as_str()), ("page", page.as_str())]);
            let batch: Vec<T> = self.send_json(request, what).await?;
            let done = batch.len() < PAGE_SIZE;
            items.extend(batch);
            if done {
                return Ok(items);
            }
        }

        // Every page was full: the listing goes on past the cap
        Err(Error::TooManyResults {
            what: what.to_string(),
            limit: PAGE_SIZE * MAX_PAGES,
        })
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        let body = serde_json::json!({ "query": query, "variables": variables });
        let response = self.client.post(&self.graphql_url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response, "GraphQL endpoint").await);
        }

        let result: GraphQLResponse<T> = response.json().await?;
        if let Some(err) = result.errors.and_then(|errors| errors.into_iter().next()) {
            return Err(Error::Remote {
                status: 200,
                message: err.message,
            });
        }
        result.data.ok_or_else(|| Error::Remote {
            status: 200,
            message: "GraphQL response contained no data".to_string(),
        })
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn current_user(&self) -> Result<String> {
        let url = format!("{}/user", self.api_base);
        let user: GitHubUser = self
            .send_json(self.client.get(&url), "authenticated user")
            .await?;
        Ok(user.login)
    }

    async fn get_repository(&self, owner: &str) -> Result<Option<RepositoryInfo>> {
        let url = format!("{}/repos/{owner}/{}", self.api_base, self.upstream.repo);
        let what = format!("repository {owner}/{}", self.upstream.repo);
        match self.send_json::<GitHubRepo>(self.client.get(&url), &what).await {
            Ok(repo) => Ok(Some(RepositoryInfo {
                owner: repo.owner.login,
                name: repo.name,
                default_branch: repo.default_branch,
                fork: repo.fork,
            })),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_fork(&self) -> Result<()> {
        debug!(upstream = %self.upstream.owner, repo = %self.upstream.repo, "requesting fork");
        let url = self.upstream_url("forks");
        self.send_empty(
            self.client.post(&url).json(&serde_json::json!({})),
            "upstream repository",
        )
        .await
    }

    async fn get_branch_ref(&self, owner: &str, branch: &str) -> Result<RepositoryRef> {
        let url = self.repo_url(owner, &format!("git/ref/heads/{}", encode_branch(branch)));
        let git_ref: GitHubRef = self
            .send_json(self.client.get(&url), &format!("branch {owner}:{branch}"))
            .await?;
        Ok(self.to_repository_ref(owner, branch, git_ref))
    }

    async fn create_ref(&self, owner: &str, branch: &str, sha: &str) -> Result<RepositoryRef> {
        debug!(owner, branch, sha, "creating ref");
        let url = self.repo_url(owner, "git/refs");
        let body = CreateRefBody {
            ref_name: format!("refs/heads/{branch}"),
            sha,
        };
        let git_ref: GitHubRef = self
            .send_json(
                self.client.post(&url).json(&body),
                &format!("repository {owner}/{}", self.upstream.repo),
            )
            .await?;
        Ok(self.to_repository_ref(owner, branch, git_ref))
    }

    async fn update_ref(
        &self,
        owner: &str,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<RepositoryRef> {
        debug!(owner, branch, sha, force, "updating ref");
        let url = self.repo_url(owner, &format!("git/refs/heads/{}", encode_branch(branch)));
        let body = UpdateRefBody { sha, force };
        let git_ref: GitHubRef = self
            .send_json(
                self.client.patch(&url).json(&body),
                &format!("branch {owner}:{branch}"),
            )
            .await?;
        Ok(self.to_repository_ref(owner, branch, git_ref))
    }

    async fn delete_ref(&self, owner: &str, branch: &str) -> Result<()> {
        debug!(owner, branch, "deleting ref");
        let url = self.repo_url(owner, &format!("git/refs/heads/{}", encode_branch(branch)));
        self.send_empty(self.client.delete(&url), &format!("branch {owner}:{branch}"))
            .await
    }

    async fn get_commit(&self, owner: &str, sha: &str) -> Result<CommitInfo> {
        let url = self.repo_url(owner, &format!("git/commits/{sha}"));
        let commit: GitHubCommit = self
            .send_json(self.client.get(&url), &format!("commit {sha}"))
            .await?;
        Ok(CommitInfo {
            sha: commit.sha,
            tree_sha: commit.tree.sha,
            parents: commit.parents.into_iter().map(|p| p.sha).collect(),
        })
    }

    async fn create_blob(&self, owner: &str, content_base64: &str) -> Result<String> {
        let url = self.repo_url(owner, "git/blobs");
        let body = CreateBlobBody {
            content: content_base64,
            encoding: "base64",
        };
        let blob: GitHubSha = self
            .send_json(
                self.client.post(&url).json(&body),
                &format!("repository {owner}/{}", self.upstream.repo),
            )
            .await?;
        Ok(blob.sha)
    }

    async fn create_tree(
        &self,
        owner: &str,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> Result<String> {
        debug!(owner, base_tree, entries = entries.len(), "creating tree");
        let url = self.repo_url(owner, "git/trees");
        let body = CreateTreeBody {
            base_tree,
            tree: entries,
        };
        let tree: GitHubSha = self
            .send_json(
                self.client.post(&url).json(&body),
                &format!("base tree {base_tree}"),
            )
            .await?;
        Ok(tree.sha)
    }

    async fn create_commit(
        &self,
        owner: &str,
        message: &str,
        tree: &str,
        parents: &[String],
    ) -> Result<String> {
        debug!(owner, tree, ?parents, "creating commit");
        let url = self.repo_url(owner, "git/commits");
        let body = CreateCommitBody {
            message,
            tree,
            parents,
        };
        let commit: GitHubSha = self
            .send_json(
                self.client.post(&url).json(&body),
                &format!("tree {tree}"),
            )
            .await?;
        Ok(commit.sha)
    }

    async fn list_pulls(
        &self,
        state: PrStateFilter,
        head: Option<&str>,
    ) -> Result<Vec<PullRequestRecord>> {
        let url = self.upstream_url("pulls");
        let mut query = vec![("state", state.as_str())];
        if let Some(head) = head {
            query.push(("head", head));
        }
        let pulls: Vec<GitHubPull> = self
            .get_paginated(&url, &query, "upstream pull requests")
            .await?;
        Ok(pulls.into_iter().map(PullRequestRecord::from).collect())
    }

    async fn create_pull(&self, pull: &NewPullRequest) -> Result<PullRequestRecord> {
        debug!(head = %pull.head, base = %pull.base, draft = pull.draft, "creating pull request");
        let url = self.upstream_url("pulls");
        let created: GitHubPull = self
            .send_json(self.client.post(&url).json(pull), "upstream repository")
            .await?;
        Ok(created.into())
    }

    async fn list_branches(&self, owner: &str) -> Result<Vec<String>> {
        let url = self.repo_url(owner, "branches");
        let branches: Vec<GitHubBranch> = self
            .get_paginated(&url, &[], &format!("repository {owner}/{}", self.upstream.repo))
            .await?;
        Ok(branches.into_iter().map(|b| b.name).collect())
    }

    async fn get_file_contents(&self, owner: &str, path: &str, git_ref: &str) -> Result<String> {
        let encoded_path = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let url = self.repo_url(owner, &format!("contents/{encoded_path}"));
        let file: GitHubContent = self
            .send_json(
                self.client.get(&url).query(&[("ref", git_ref)]),
                &format!("file {path} in {owner}/{}", self.upstream.repo),
            )
            .await?;
        file.decode()
    }

    async fn find_open_pulls_by_head(
        &self,
        branch: &str,
        limit: u32,
    ) -> Result<Vec<PullRequestRecord>> {
        let data: FindPullsData = self
            .graphql(
                FIND_PULLS_BY_HEAD_QUERY,
                serde_json::json!({
                    "owner": self.upstream.owner,
                    "repo": self.upstream.repo,
                    "head": branch,
                    "first": limit,
                }),
            )
            .await?;

        let repository = data.repository.ok_or_else(|| {
            Error::NotFound(format!(
                "repository {}/{}",
                self.upstream.owner, self.upstream.repo
            ))
        })?;
        Ok(repository
            .pull_requests
            .nodes
            .into_iter()
            .map(PullRequestRecord::from)
            .collect())
    }

    async fn mark_ready_for_review(&self, node_id: &str) -> Result<()> {
        debug!(node_id, "marking pull request ready for review");
        let _: serde_json::Value = self
            .graphql(MARK_READY_MUTATION, serde_json::json!({ "id": node_id }))
            .await?;
        Ok(())
    }
}

impl GitHubService {
    fn to_repository_ref(&self, owner: &str, branch: &str, git_ref: GitHubRef) -> RepositoryRef {
        RepositoryRef {
            owner: owner.to_string(),
            repo: self.upstream.repo.clone(),
            branch: git_ref
                .ref_name
                .strip_prefix("refs/heads/")
                .unwrap_or(branch)
                .to_string(),
            sha: git_ref.object.sha,
        }
    }
}

/// Percent-encode each segment of a branch name for use in a URL path
fn encode_branch(branch: &str) -> String {
    branch
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build an error from a non-success response
async fn error_from_response(response: Response, what: &str) -> Error {
    let status = response.status();
    let message = response
        .json::<GitHubErrorResponse>()
        .await
        .map(|e| e.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
    classify_error(status, message, what)
}

/// Map an HTTP status and platform message onto the error taxonomy
pub(crate) fn classify_error(status: StatusCode, message: String, what: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::Auth(message),
        StatusCode::NOT_FOUND => Error::NotFound(what.to_string()),
        StatusCode::CONFLICT => Error::Conflict(message),
        StatusCode::UNPROCESSABLE_ENTITY if is_ref_conflict(&message) => Error::Conflict(message),
        _ => Error::Remote {
            status: status.as_u16(),
            message,
        },
    }
}

fn is_ref_conflict(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("already exists")
        || message.contains("not a fast forward")
        || message.contains("not a fast-forward")
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: &'a str,
}

#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

#[derive(Serialize)]
struct CreateBlobBody<'a> {
    content: &'a str,
    encoding: &'a str,
}

#[derive(Serialize)]
struct CreateTreeBody<'a> {
    base_tree: &'a str,
    tree: &'a [TreeEntry],
}

#[derive(Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: &'a [String],
}

#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

#[derive(Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Deserialize)]
struct GitHubRepo {
    name: String,
    default_branch: String,
    #[serde(default)]
    fork: bool,
    owner: GitHubUser,
}

#[derive(Deserialize)]
struct GitHubRef {
    #[serde(rename = "ref")]
    ref_name: String,
    object: GitHubSha,
}

#[derive(Deserialize)]
struct GitHubSha {
    sha: String,
}

#[derive(Deserialize)]
struct GitHubCommit {
    sha: String,
    tree: GitHubSha,
    #[serde(default)]
    parents: Vec<GitHubSha>,
}

#[derive(Deserialize)]
struct GitHubBranch {
    name: String,
}

#[derive(Deserialize)]
struct GitHubContent {
    content: String,
    encoding: String,
}

impl GitHubContent {
    fn decode(self) -> Result<String> {
        if self.encoding != "base64" {
            return Ok(self.content);
        }
        // GitHub wraps base64 content at 60 columns
        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = BASE64
            .decode(compact)
            .map_err(|e| Error::Invalid(format!("file content is not valid base64: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| Error::Invalid(format!("file content is not valid UTF-8: {e}")))
    }
}

/// Pull request as returned by the REST API (subset)
#[derive(Deserialize)]
struct GitHubPull {
    id: u64,
    node_id: String,
    number: u64,
    #[serde(default)]
    title: String,
    state: PrState,
    #[serde(default)]
    draft: bool,
    user: Option<GitHubUser>,
    head: GitHubHead,
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    html_url: String,
}

#[derive(Deserialize)]
struct GitHubHead {
    #[serde(rename = "ref")]
    ref_name: String,
    /// None when the head fork was deleted
    repo: Option<GitHubHeadRepo>,
}

#[derive(Deserialize)]
struct GitHubHeadRepo {
    owner: GitHubUser,
}

impl From<GitHubPull> for PullRequestRecord {
    fn from(pr: GitHubPull) -> Self {
        Self {
            id: pr.id,
            node_id: pr.node_id,
            number: pr.number,
            title: pr.title,
            state: pr.state,
            is_draft: pr.draft,
            author: pr.user.map(|u| u.login).unwrap_or_default(),
            head_branch: pr.head.ref_name,
            head_owner: pr.head.repo.map(|r| r.owner.login),
            merged_at: pr.merged_at,
            html_url: pr.html_url,
        }
    }
}

#[derive(Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Deserialize)]
struct FindPullsData {
    repository: Option<GqlRepository>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlRepository {
    pull_requests: GqlConnection,
}

#[derive(Deserialize)]
struct GqlConnection {
    nodes: Vec<GqlPull>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlPull {
    id: String,
    database_id: Option<u64>,
    number: u64,
    title: String,
    state: String,
    is_draft: bool,
    url: String,
    merged_at: Option<DateTime<Utc>>,
    head_ref_name: String,
    author: Option<GqlActor>,
    head_repository_owner: Option<GqlActor>,
}

#[derive(Deserialize)]
struct GqlActor {
    login: String,
}

impl From<GqlPull> for PullRequestRecord {
    fn from(pr: GqlPull) -> Self {
        let state = if pr.state.eq_ignore_ascii_case("open") {
            PrState::Open
        } else {
            PrState::Closed
        };
        Self {
            id: pr.database_id.unwrap_or_default(),
            node_id: pr.id,
            number: pr.number,
            title: pr.title,
            state,
            is_draft: pr.is_draft,
            author: pr.author.map(|a| a.login).unwrap_or_default(),
            head_branch: pr.head_ref_name,
            head_owner: pr.head_repository_owner.map(|o| o.login),
            merged_at: pr.merged_at,
            html_url: pr.url,
        }
    }
}
