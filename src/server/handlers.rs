//! Endpoint handlers
//!
//! Each request carries the caller's GitHub token, either in the JSON body or
//! an `Authorization` header; a platform client is built per request.

use crate::auth::token_from_authorization;
use crate::branch;
use crate::commit::{self, CommitRequest, commit_message, resolve_staging_folder};
use crate::error::Error;
use crate::platform::{PlatformService, create_platform_service};
use crate::resources::{self, ResourceCategory};
use crate::server::{ApiError, AppState};
use crate::submit::{self, Submission, TracingProgress};
use crate::types::SubmissionKind;
use crate::workspace::ensure_user_workspace;
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Body of `POST /create-branch`
#[derive(Debug, Deserialize)]
pub struct CreateBranchRequest {
    /// Fork owner
    #[serde(alias = "OWNER")]
    pub owner: String,
    /// Caller's token
    #[serde(alias = "TOKEN")]
    pub token: String,
    /// Branch to create
    #[serde(rename = "branchName", alias = "branch_name")]
    pub branch_name: String,
}

/// Body of `POST /commit-folder`
#[derive(Debug, Deserialize)]
pub struct CommitFolderRequest {
    /// Fork owner
    #[serde(alias = "OWNER")]
    pub owner: String,
    /// Caller's token
    #[serde(alias = "TOKEN")]
    pub token: String,
    /// Topic branch receiving the commit
    #[serde(rename = "branchName", alias = "branch_name")]
    pub branch_name: String,
    /// Staging folder, relative to or under the staging root
    #[serde(rename = "folderPath", alias = "folder_path", alias = "localFolderPath")]
    pub folder_path: String,
    /// Repository directory the folder lands in
    #[serde(rename = "remotePath", alias = "remote_path", alias = "remoteFolderPath")]
    pub remote_path: String,
    /// Resource name used in the commit message
    #[serde(rename = "resourceName", alias = "resource_name")]
    pub resource_name: String,
    /// Adding or Modifying
    #[serde(rename = "addOrMod", alias = "add_or_mod", default)]
    pub kind: SubmissionKind,
}

/// Body of `POST /submit`
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Fork owner
    #[serde(alias = "OWNER")]
    pub owner: String,
    /// Caller's token
    #[serde(alias = "TOKEN")]
    pub token: String,
    /// Resource name
    #[serde(rename = "resourceName", alias = "resource_name")]
    pub resource_name: String,
    /// Resource category label
    pub category: String,
    /// Staging folder, relative to or under the staging root
    #[serde(rename = "folderPath", alias = "folder_path", alias = "localFolderPath")]
    pub folder_path: String,
    /// Adding or Modifying
    #[serde(rename = "addOrMod", alias = "add_or_mod", default)]
    pub kind: SubmissionKind,
    /// Branch name overriding the derived one
    #[serde(rename = "branchName", alias = "branch_name", default)]
    pub branch_name: Option<String>,
    /// Repository directory overriding the category's
    #[serde(rename = "remotePath", alias = "remote_path", default)]
    pub remote_path: Option<String>,
}

/// Body carrying only a token
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Caller's token
    #[serde(alias = "TOKEN")]
    pub token: String,
}

/// Body naming one of the caller's branches
#[derive(Debug, Deserialize)]
pub struct BranchRequest {
    /// Caller's token
    #[serde(alias = "TOKEN")]
    pub token: String,
    /// Branch to act on
    #[serde(rename = "branchName", alias = "branch_name")]
    pub branch_name: String,
}

/// Query of `GET /api/load-file`
#[derive(Debug, Deserialize)]
pub struct LoadFileQuery {
    /// Public resource URL
    pub url: String,
    /// Fork owner to read from
    pub username: String,
}

fn platform_for(state: &AppState, token: &str) -> ApiResult<Box<dyn PlatformService>> {
    Ok(create_platform_service(&state.config, token)?)
}

fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(token_from_authorization)
        .ok_or_else(|| ApiError(Error::Auth("missing Authorization header".to_string())))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /create-branch`
pub async fn create_branch(
    State(state): State<AppState>,
    Json(req): Json<CreateBranchRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let platform = platform_for(&state, &req.token)?;
    let created = branch::create_branch(platform.as_ref(), &req.owner, &req.branch_name).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Branch {} created", req.branch_name),
            "ref": created,
        })),
    ))
}

/// `POST /commit-folder`
pub async fn commit_folder(
    State(state): State<AppState>,
    Json(req): Json<CommitFolderRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let local_folder = resolve_staging_folder(&state.config.staging_root, &req.folder_path)?;
    let platform = platform_for(&state, &req.token)?;

    let request = CommitRequest {
        owner: req.owner,
        branch_name: req.branch_name,
        local_folder,
        remote_base_path: req.remote_path,
        message: commit_message(req.kind, &req.resource_name),
    };
    let outcome = commit::commit_folder(platform.as_ref(), &request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Files committed to {}", request.branch_name),
            "commit": outcome,
        })),
    ))
}

/// `POST /submit`
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let category: ResourceCategory = req.category.parse()?;
    let local_folder = resolve_staging_folder(&state.config.staging_root, &req.folder_path)?;
    let platform = platform_for(&state, &req.token)?;

    let submission = Submission {
        owner: req.owner,
        resource_name: req.resource_name,
        category,
        kind: req.kind,
        local_folder,
        branch_name: req.branch_name,
        remote_base_path: req.remote_path,
    };
    let progress = TracingProgress {
        owner: submission.owner.clone(),
    };
    let outcome =
        submit::submit_resource(platform.as_ref(), &state.config, &submission, &progress).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Pull request #{} opened", outcome.pull_request.number),
            "pullRequest": outcome.pull_request,
            "branch": outcome.branch,
            "commit": outcome.commit,
        })),
    ))
}

/// `GET /manage/forks`: sync the caller's fork and return the branch link
pub async fn sync_fork(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<String>> {
    let platform = platform_for(&state, bearer_token(&headers)?)?;
    match ensure_user_workspace(platform.as_ref(), &state.config).await {
        Ok(link) => Ok(Json(link.url)),
        Err(e) => {
            warn!("workspace synchronization failed: {e}");
            Err(e.into())
        }
    }
}

/// `GET /manage/pulls`: every upstream pull request by the caller
pub async fn list_pulls(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let platform = platform_for(&state, bearer_token(&headers)?)?;
    let login = platform.current_user().await?;
    let pulls = submit::list_user_pull_requests(platform.as_ref(), &login).await?;
    Ok(Json(json!(pulls)))
}

/// `POST /branches`
pub async fn list_branches(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> ApiResult<Json<Value>> {
    let platform = platform_for(&state, &req.token)?;
    let branches = branch::list_user_branches(platform.as_ref()).await?;
    Ok(Json(json!({ "branches": branches })))
}

/// `POST /delete-branch`
pub async fn delete_branch(
    State(state): State<AppState>,
    Json(req): Json<BranchRequest>,
) -> ApiResult<Json<Value>> {
    let platform = platform_for(&state, &req.token)?;
    let deleted = branch::delete_branch(platform.as_ref(), &req.branch_name).await?;
    Ok(Json(json!({
        "message": format!(
            "Branch {} deleted (merged in #{})",
            deleted.branch, deleted.merged_pull_request
        ),
    })))
}

/// `POST /promote-pr`
pub async fn promote_pr(
    State(state): State<AppState>,
    Json(req): Json<BranchRequest>,
) -> ApiResult<Json<Value>> {
    let platform = platform_for(&state, &req.token)?;
    let pr = submit::promote_to_ready(platform.as_ref(), &state.config, &req.branch_name).await?;
    Ok(Json(json!({ "pullRequest": pr })))
}

/// `GET /api/load-file`
pub async fn load_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LoadFileQuery>,
) -> ApiResult<Json<Value>> {
    let platform = platform_for(&state, bearer_token(&headers)?)?;
    let loaded =
        resources::load_resource_file(platform.as_ref(), &state.config, &query.url, &query.username)
            .await?;
    Ok(Json(json!({
        "path": loaded.path,
        "source": loaded.source_owner,
        "content": loaded.content,
    })))
}
