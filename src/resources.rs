//! Resource categories and naming
//!
//! Maps form-level resource categories onto repository locations and
//! derives deterministic branch names for submissions.

use crate::config::PortalConfig;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::SubmissionKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

/// Category of an educational resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceCategory {
    /// Conferences, meetups, workshops
    Events,
    /// Newsletters
    Newsletter,
    /// Professor bios
    Professor,
    /// Projects and companies
    Project,
    /// Tutorials
    Tutorial,
}

impl ResourceCategory {
    /// Repository directory the category's resources live under (with trailing slash)
    pub const fn remote_base_path(self) -> &'static str {
        match self {
            Self::Events => "events/",
            Self::Newsletter => "resources/newsletters/",
            Self::Professor => "professors/",
            Self::Project => "resources/projects/",
            Self::Tutorial => "tutorials/",
        }
    }

    /// Upper-case tag used in pull request titles
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Events => "EVENTS",
            Self::Newsletter => "NEWSLETTER",
            Self::Professor => "PROFESSOR",
            Self::Project => "PROJECT",
            Self::Tutorial => "TUTORIAL",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ResourceCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "events" | "event" => Ok(Self::Events),
            "newsletter" | "newsletters" => Ok(Self::Newsletter),
            "professor" | "professors" => Ok(Self::Professor),
            "project" | "projects" => Ok(Self::Project),
            "tutorial" | "tutorials" => Ok(Self::Tutorial),
            other => Err(Error::Invalid(format!("unknown resource category '{other}'"))),
        }
    }
}

/// Lower-case a resource name into a ref-safe slug
///
/// Whitespace runs become `-`; characters git rejects in ref names are dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_whitespace() || c == '-' {
            if !slug.ends_with('-') {
                slug.push('-');
            }
        } else if c.is_alphanumeric() || c == '_' || c == '.' {
            slug.extend(c.to_lowercase());
        }
    }

    while slug.contains("..") {
        slug = slug.replace("..", ".");
    }
    let slug = slug.trim_matches(|c| c == '-' || c == '.');
    slug.strip_suffix(".lock").unwrap_or(slug).to_string()
}

/// Deterministic topic branch name: `<owner>-<slug>`
pub fn branch_name_for(owner: &str, resource_name: &str) -> Result<String> {
    let slug = slugify(resource_name);
    if slug.is_empty() {
        return Err(Error::Invalid(format!(
            "resource name '{resource_name}' produces an empty branch name"
        )));
    }
    Ok(format!("{owner}-{slug}"))
}

/// Pull request title, e.g. `[EVENTS] Adding Bitcoin Meetup`
pub fn pull_request_title(
    category: ResourceCategory,
    kind: SubmissionKind,
    resource_name: &str,
) -> String {
    format!("[{}] {kind} {resource_name}", category.tag())
}

/// Pull request description
pub fn pull_request_body(kind: SubmissionKind, resource_name: &str) -> String {
    match kind {
        SubmissionKind::Adding => format!("This pull request adds resource {resource_name}"),
        SubmissionKind::Modifying => {
            format!("This pull request modifies resource {resource_name}")
        }
    }
}

fn trailing_uuid() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"-[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
            .expect("hardcoded UUID pattern is valid")
    })
}

/// Repository path of the YAML file behind a public resource URL
///
/// `https://.../resources/projects/acme-<uuid>` maps to
/// `resources/projects/acme/project.yml`; professor and event URLs map to
/// `professors/<slug>/professor.yml` and `events/<slug>/event.yml`.
pub fn resource_path_from_url(url: &str) -> Result<String> {
    let parsed =
        Url::parse(url).map_err(|e| Error::Invalid(format!("invalid resource URL {url}: {e}")))?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let position = |name: &str| segments.iter().position(|seg| *seg == name);
    let (kind, raw_slug) = if let Some(i) = position("professor") {
        ("professors", segments.get(i + 1))
    } else if let Some(i) = position("events") {
        ("events", segments.get(i + 1))
    } else if let Some(i) = position("resources") {
        let kind = segments
            .get(i + 1)
            .ok_or_else(|| Error::Invalid(format!("incomplete resource URL: {url}")))?;
        (*kind, segments.get(i + 2))
    } else {
        return Err(Error::Invalid(format!("unrecognised resource URL: {url}")));
    };
    let raw_slug = raw_slug
        .ok_or_else(|| Error::Invalid(format!("incomplete resource URL: {url}")))?;

    // Event URLs carry the event name itself; other kinds append the resource id
    let slug = if kind == "events" {
        (*raw_slug).to_string()
    } else {
        trailing_uuid().replace(raw_slug, "").into_owned()
    };

    match kind {
        "newsletters" => Ok(format!("resources/newsletters/{slug}/newsletter.yml")),
        "projects" => Ok(format!("resources/projects/{slug}/project.yml")),
        "professors" => Ok(format!("professors/{slug}/professor.yml")),
        "events" => Ok(format!("events/{slug}/event.yml")),
        other => Err(Error::Invalid(format!("unknown resource type '{other}'"))),
    }
}

/// A resource file fetched for editing
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoadedResource {
    /// Repository path of the file
    pub path: String,
    /// Owner whose copy was read
    pub source_owner: String,
    /// Decoded file content
    pub content: String,
}

/// Load the YAML file behind `url` from `username`'s fork
///
/// Falls back to the public mirror when the fork does not carry the file.
pub async fn load_resource_file(
    platform: &dyn PlatformService,
    config: &PortalConfig,
    url: &str,
    username: &str,
) -> Result<LoadedResource> {
    let path = resource_path_from_url(url)?;
    let branch = &config.development_branch;

    match platform.get_file_contents(username, &path, branch).await {
        Ok(content) => Ok(LoadedResource {
            path,
            source_owner: username.to_string(),
            content,
        }),
        Err(e) if e.is_not_found() => {
            let Some(mirror) = config.public_mirror_owner.as_deref() else {
                return Err(e);
            };
            debug!(path = %path, username, mirror, "file missing in fork, reading mirror");
            let content = platform.get_file_contents(mirror, &path, branch).await?;
            Ok(LoadedResource {
                path,
                source_owner: mirror.to_string(),
                content,
            })
        }
        Err(e) => Err(e),
    }
}
