//! Portal configuration
//!
//! Values come from `PORTAL_*` environment variables; anything unset falls
//! back to the defaults below.

use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default GitHub API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default GitHub web URL
pub const DEFAULT_WEB_BASE: &str = "https://github.com";

/// Where a missing integration branch is created from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationSource {
    /// Tip of upstream's development branch
    UpstreamDevelopment,
    /// Tip of the fork's default branch
    ForkDefault,
}

impl FromStr for IntegrationSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upstream" | "dev" => Ok(Self::UpstreamDevelopment),
            "fork" | "default" => Ok(Self::ForkDefault),
            other => Err(Error::Config(format!(
                "unknown integration source '{other}' (expected 'upstream' or 'fork')"
            ))),
        }
    }
}

/// Portal configuration
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Owner of the upstream content repository
    pub upstream_owner: String,
    /// Repository name (forks use the same name)
    pub repo: String,
    /// Upstream branch pull requests target
    pub development_branch: String,
    /// Source of newly created integration branches
    pub integration_source: IntegrationSource,
    /// Maximum simultaneously open PRs per user
    pub open_pr_ceiling: usize,
    /// REST API base URL
    pub api_base: String,
    /// GraphQL endpoint
    pub graphql_url: String,
    /// Web base URL for browsable links
    pub web_base: String,
    /// First wait between fork-existence polls
    pub fork_poll_interval: Duration,
    /// Give up on a new fork after this long
    pub fork_ready_timeout: Duration,
    /// How many open PRs to inspect when promoting a draft
    pub promote_page_size: u32,
    /// Directory submission folders are staged under
    pub staging_root: PathBuf,
    /// Public repository owner to fall back to when loading resource files
    pub public_mirror_owner: Option<String>,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Allowed CORS origin (None allows any)
    pub allowed_origin: Option<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            upstream_owner: "planb-network".to_string(),
            repo: "bitcoin-educational-content".to_string(),
            development_branch: "dev".to_string(),
            integration_source: IntegrationSource::UpstreamDevelopment,
            open_pr_ceiling: 15,
            api_base: DEFAULT_API_BASE.to_string(),
            graphql_url: format!("{DEFAULT_API_BASE}/graphql"),
            web_base: DEFAULT_WEB_BASE.to_string(),
            fork_poll_interval: Duration::from_millis(500),
            fork_ready_timeout: Duration::from_secs(30),
            promote_page_size: 20,
            staging_root: PathBuf::from("temp"),
            public_mirror_owner: Some("planb-network".to_string()),
            request_timeout: Duration::from_secs(30),
            listen_addr: "0.0.0.0:4000".to_string(),
            allowed_origin: None,
        }
    }
}

impl PortalConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("PORTAL_UPSTREAM_OWNER") {
            config.upstream_owner = v;
        }
        if let Some(v) = lookup("PORTAL_REPO") {
            config.repo = v;
        }
        if let Some(v) = lookup("PORTAL_DEV_BRANCH") {
            config.development_branch = v;
        }
        if let Some(v) = lookup("PORTAL_INTEGRATION_SOURCE") {
            config.integration_source = v.parse()?;
        }
        if let Some(v) = lookup("PORTAL_OPEN_PR_CEILING") {
            config.open_pr_ceiling = parse_number("PORTAL_OPEN_PR_CEILING", &v)?;
        }

        // GitHub Enterprise hosts serve the API under /api/v3
        let api_base = lookup("PORTAL_API_BASE").or_else(|| {
            lookup("GH_HOST")
                .filter(|h| h != "github.com")
                .map(|h| format!("https://{h}/api/v3"))
        });
        if let Some(v) = api_base {
            config.api_base = v.trim_end_matches('/').to_string();
            config.graphql_url = graphql_url_for(&config.api_base);
        }
        if let Some(v) = lookup("PORTAL_GRAPHQL_URL") {
            config.graphql_url = v;
        }
        if let Some(v) = lookup("PORTAL_WEB_BASE") {
            config.web_base = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("PORTAL_FORK_POLL_MS") {
            let millis: u64 = parse_number("PORTAL_FORK_POLL_MS", &v)?;
            if millis == 0 {
                return Err(Error::Config(
                    "PORTAL_FORK_POLL_MS must be greater than zero".to_string(),
                ));
            }
            config.fork_poll_interval = Duration::from_millis(millis);
        }
        if let Some(v) = lookup("PORTAL_FORK_TIMEOUT_SECS") {
            config.fork_ready_timeout =
                Duration::from_secs(parse_number("PORTAL_FORK_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("PORTAL_PROMOTE_PAGE_SIZE") {
            config.promote_page_size = parse_number("PORTAL_PROMOTE_PAGE_SIZE", &v)?;
        }
        if let Some(v) = lookup("PORTAL_STAGING_ROOT") {
            config.staging_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("PORTAL_PUBLIC_MIRROR_OWNER") {
            config.public_mirror_owner = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("PORTAL_REQUEST_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_number("PORTAL_REQUEST_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("PORTAL_LISTEN_ADDR") {
            config.listen_addr = v;
        }
        config.allowed_origin = lookup("PORTAL_ALLOWED_ORIGIN").filter(|v| !v.is_empty());

        Ok(config)
    }

    /// Browsable link to a branch of `owner`'s copy of the repository
    pub fn branch_url(&self, owner: &str, branch: &str) -> String {
        format!("{}/{owner}/{}/tree/{branch}", self.web_base, self.repo)
    }
}

/// GraphQL endpoint matching a REST base
///
/// github.com serves GraphQL at `/graphql`; Enterprise at `/api/graphql`.
fn graphql_url_for(api_base: &str) -> String {
    api_base.strip_suffix("/api/v3").map_or_else(
        || format!("{api_base}/graphql"),
        |host| format!("{host}/api/graphql"),
    )
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number, got '{value}'")))
}
