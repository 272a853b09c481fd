//! Mock platform service for testing
//!
//! An in-memory model of the parts of GitHub the portal touches: repositories,
//! refs, git objects and pull requests. Not every helper is used by every
//! test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use contrib_portal::error::{Error, Result};
use contrib_portal::platform::{PlatformService, UpstreamRepo};
use contrib_portal::types::{
    CommitInfo, NewPullRequest, PrState, PrStateFilter, PullRequestRecord, RepositoryInfo,
    RepositoryRef, TreeEntry,
};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

pub const UPSTREAM_OWNER: &str = "planb-network";
pub const REPO: &str = "bitcoin-educational-content";
pub const DEV_BRANCH: &str = "dev";

/// Call record for `create_commit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommitCall {
    pub owner: String,
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

/// Call record for `create_tree`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTreeCall {
    pub owner: String,
    pub base_tree: String,
    pub entries: Vec<TreeEntry>,
}

/// Call record for `update_ref`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRefCall {
    pub owner: String,
    pub branch: String,
    pub sha: String,
    pub force: bool,
}

type ErrorFactory = Box<dyn Fn() -> Error + Send + Sync>;

#[derive(Default)]
struct Repo {
    default_branch: String,
    fork: bool,
}

#[derive(Default)]
struct State {
    repos: HashMap<String, Repo>,
    refs: HashMap<(String, String), String>,
    commits: HashMap<String, CommitInfo>,
    blobs: HashMap<String, String>,
    files: HashMap<(String, String), String>,
    pulls: Vec<PullRequestRecord>,
    /// Polls of `get_repository` that still report a requested fork missing
    fork_pending: Option<u32>,
}

/// In-memory GitHub for one authenticated user
///
/// Git objects are content-addressed, so uploading the same bytes twice
/// yields the same blob sha. Commits additionally hash a sequence number,
/// like the timestamp in a real commit. Non-forced ref updates must be
/// fast-forwards.
pub struct MockPlatformService {
    login: String,
    upstream: UpstreamRepo,
    state: Mutex<State>,
    commit_seq: AtomicU64,
    next_pr_number: AtomicU64,
    fork_polls_until_ready: Mutex<Option<u32>>,
    // Call tracking
    calls: Mutex<Vec<&'static str>>,
    create_ref_calls: Mutex<Vec<(String, String, String)>>,
    update_ref_calls: Mutex<Vec<UpdateRefCall>>,
    delete_ref_calls: Mutex<Vec<(String, String)>>,
    blob_calls: Mutex<Vec<String>>,
    tree_calls: Mutex<Vec<CreateTreeCall>>,
    commit_calls: Mutex<Vec<CreateCommitCall>>,
    create_pull_calls: Mutex<Vec<NewPullRequest>>,
    mark_ready_calls: Mutex<Vec<String>>,
    // Error injection
    failures: Mutex<HashMap<&'static str, ErrorFactory>>,
}

fn hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())[..40].to_string()
}

impl MockPlatformService {
    /// Upstream repository with one commit on its development branch
    pub fn new(login: &str) -> Self {
        let mock = Self {
            login: login.to_string(),
            upstream: UpstreamRepo {
                owner: UPSTREAM_OWNER.to_string(),
                repo: REPO.to_string(),
            },
            state: Mutex::new(State::default()),
            commit_seq: AtomicU64::new(0),
            next_pr_number: AtomicU64::new(1),
            fork_polls_until_ready: Mutex::new(Some(0)),
            calls: Mutex::new(Vec::new()),
            create_ref_calls: Mutex::new(Vec::new()),
            update_ref_calls: Mutex::new(Vec::new()),
            delete_ref_calls: Mutex::new(Vec::new()),
            blob_calls: Mutex::new(Vec::new()),
            tree_calls: Mutex::new(Vec::new()),
            commit_calls: Mutex::new(Vec::new()),
            create_pull_calls: Mutex::new(Vec::new()),
            mark_ready_calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        };
        {
            let mut state = mock.state.lock().unwrap();
            state.repos.insert(
                UPSTREAM_OWNER.to_string(),
                Repo {
                    default_branch: DEV_BRANCH.to_string(),
                    fork: false,
                },
            );
        }
        let root = mock.seed_commit("initial content", &[]);
        mock.set_ref(UPSTREAM_OWNER, DEV_BRANCH, &root);
        mock
    }

    /// The user already has a fork (without an integration branch)
    pub fn with_fork(self) -> Self {
        self.make_fork_visible();
        self
    }

    /// The user has a fork whose integration branch sits at upstream's tip
    pub fn with_integration_branch(self) -> Self {
        let this = self.with_fork();
        let tip = this.upstream_dev_sha();
        this.set_ref(&this.login.clone(), &format!("sync-repo-{}", this.login), &tip);
        this
    }

    /// The user owns a same-named repository that is not a fork
    pub fn with_unrelated_repository(self) -> Self {
        self.state.lock().unwrap().repos.insert(
            self.login.clone(),
            Repo {
                default_branch: "main".to_string(),
                fork: false,
            },
        );
        self
    }

    /// A requested fork only shows up after `polls` lookups; `None` never
    pub fn fork_ready_after(self, polls: Option<u32>) -> Self {
        *self.fork_polls_until_ready.lock().unwrap() = polls;
        self
    }

    // === State setup and inspection ===

    /// Store a commit object and return its sha
    pub fn seed_commit(&self, message: &str, parents: &[String]) -> String {
        let seq = self.commit_seq.fetch_add(1, Ordering::SeqCst).to_string();
        let tree_sha = hash(&["tree", message, &seq]);
        let mut parts = vec!["commit", message, tree_sha.as_str(), seq.as_str()];
        parts.extend(parents.iter().map(String::as_str));
        let sha = hash(&parts);
        self.state.lock().unwrap().commits.insert(
            sha.clone(),
            CommitInfo {
                sha: sha.clone(),
                tree_sha,
                parents: parents.to_vec(),
            },
        );
        sha
    }

    /// Move upstream's development branch forward by one commit
    pub fn advance_upstream(&self, message: &str) -> String {
        let parent = self.upstream_dev_sha();
        let sha = self.seed_commit(message, &[parent]);
        self.set_ref(UPSTREAM_OWNER, DEV_BRANCH, &sha);
        sha
    }

    pub fn set_ref(&self, owner: &str, branch: &str, sha: &str) {
        self.state
            .lock()
            .unwrap()
            .refs
            .insert((owner.to_string(), branch.to_string()), sha.to_string());
    }

    pub fn ref_sha(&self, owner: &str, branch: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .refs
            .get(&(owner.to_string(), branch.to_string()))
            .cloned()
    }

    pub fn upstream_dev_sha(&self) -> String {
        self.ref_sha(UPSTREAM_OWNER, DEV_BRANCH)
            .expect("upstream dev branch is seeded")
    }

    pub fn commit(&self, sha: &str) -> Option<CommitInfo> {
        self.state.lock().unwrap().commits.get(sha).cloned()
    }

    pub fn add_pull(&self, pr: PullRequestRecord) {
        self.state.lock().unwrap().pulls.push(pr);
    }

    pub fn pulls(&self) -> Vec<PullRequestRecord> {
        self.state.lock().unwrap().pulls.clone()
    }

    pub fn add_file(&self, owner: &str, path: &str, content: &str) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert((owner.to_string(), path.to_string()), content.to_string());
    }

    pub fn has_repository(&self, owner: &str) -> bool {
        self.state.lock().unwrap().repos.contains_key(owner)
    }

    fn make_fork_visible(&self) {
        let tip = self.ref_sha(UPSTREAM_OWNER, DEV_BRANCH);
        let mut state = self.state.lock().unwrap();
        state.fork_pending = None;
        state.repos.insert(
            self.login.clone(),
            Repo {
                default_branch: "main".to_string(),
                fork: true,
            },
        );
        if let Some(tip) = tip {
            state
                .refs
                .insert((self.login.clone(), "main".to_string()), tip);
        }
    }

    fn is_ancestor(state: &State, ancestor: &str, descendant: &str) -> bool {
        let mut stack = vec![descendant.to_string()];
        let mut seen = HashSet::new();
        while let Some(sha) = stack.pop() {
            if sha == ancestor {
                return true;
            }
            if !seen.insert(sha.clone()) {
                continue;
            }
            if let Some(commit) = state.commits.get(&sha) {
                stack.extend(commit.parents.iter().cloned());
            }
        }
        false
    }

    // === Error injection methods ===

    /// Make `method` fail with the error built by `make`
    pub fn fail_on(&self, method: &'static str, make: impl Fn() -> Error + Send + Sync + 'static) {
        self.failures.lock().unwrap().insert(method, Box::new(make));
    }

    fn enter(&self, method: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(method);
        match self.failures.lock().unwrap().get(method) {
            Some(make) => Err(make()),
            None => Ok(()),
        }
    }

    // === Call verification methods ===

    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| **m == method)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_create_ref_calls(&self) -> Vec<(String, String, String)> {
        self.create_ref_calls.lock().unwrap().clone()
    }

    pub fn get_update_ref_calls(&self) -> Vec<UpdateRefCall> {
        self.update_ref_calls.lock().unwrap().clone()
    }

    pub fn get_delete_ref_calls(&self) -> Vec<(String, String)> {
        self.delete_ref_calls.lock().unwrap().clone()
    }

    pub fn get_blob_calls(&self) -> Vec<String> {
        self.blob_calls.lock().unwrap().clone()
    }

    pub fn get_tree_calls(&self) -> Vec<CreateTreeCall> {
        self.tree_calls.lock().unwrap().clone()
    }

    pub fn get_commit_calls(&self) -> Vec<CreateCommitCall> {
        self.commit_calls.lock().unwrap().clone()
    }

    pub fn get_create_pull_calls(&self) -> Vec<NewPullRequest> {
        self.create_pull_calls.lock().unwrap().clone()
    }

    pub fn get_mark_ready_calls(&self) -> Vec<String> {
        self.mark_ready_calls.lock().unwrap().clone()
    }

    fn to_ref(&self, owner: &str, branch: &str, sha: &str) -> RepositoryRef {
        RepositoryRef {
            owner: owner.to_string(),
            repo: self.upstream.repo.clone(),
            branch: branch.to_string(),
            sha: sha.to_string(),
        }
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn current_user(&self) -> Result<String> {
        self.enter("current_user")?;
        Ok(self.login.clone())
    }

    async fn get_repository(&self, owner: &str) -> Result<Option<RepositoryInfo>> {
        self.enter("get_repository")?;

        let pending = self.state.lock().unwrap().fork_pending;
        if owner == self.login {
            match pending {
                Some(0) => self.make_fork_visible(),
                Some(n) => {
                    self.state.lock().unwrap().fork_pending = Some(n - 1);
                    return Ok(None);
                }
                None => {}
            }
        }

        let state = self.state.lock().unwrap();
        Ok(state.repos.get(owner).map(|repo| RepositoryInfo {
            owner: owner.to_string(),
            name: self.upstream.repo.clone(),
            default_branch: repo.default_branch.clone(),
            fork: repo.fork,
        }))
    }

    async fn create_fork(&self) -> Result<()> {
        self.enter("create_fork")?;
        let polls = *self.fork_polls_until_ready.lock().unwrap();
        // `None` keeps the fork pending for good
        self.state.lock().unwrap().fork_pending = Some(polls.unwrap_or(u32::MAX));
        Ok(())
    }

    async fn get_branch_ref(&self, owner: &str, branch: &str) -> Result<RepositoryRef> {
        self.enter("get_branch_ref")?;
        self.ref_sha(owner, branch)
            .map(|sha| self.to_ref(owner, branch, &sha))
            .ok_or_else(|| Error::NotFound(format!("branch {owner}:{branch}")))
    }

    async fn create_ref(&self, owner: &str, branch: &str, sha: &str) -> Result<RepositoryRef> {
        self.enter("create_ref")?;
        self.create_ref_calls.lock().unwrap().push((
            owner.to_string(),
            branch.to_string(),
            sha.to_string(),
        ));

        let mut state = self.state.lock().unwrap();
        let key = (owner.to_string(), branch.to_string());
        if state.refs.contains_key(&key) {
            return Err(Error::Conflict("Reference already exists".to_string()));
        }
        state.refs.insert(key, sha.to_string());
        Ok(self.to_ref(owner, branch, sha))
    }

    async fn update_ref(
        &self,
        owner: &str,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<RepositoryRef> {
        self.enter("update_ref")?;
        self.update_ref_calls.lock().unwrap().push(UpdateRefCall {
            owner: owner.to_string(),
            branch: branch.to_string(),
            sha: sha.to_string(),
            force,
        });

        let mut state = self.state.lock().unwrap();
        let key = (owner.to_string(), branch.to_string());
        let Some(current) = state.refs.get(&key).cloned() else {
            return Err(Error::NotFound(format!("branch {owner}:{branch}")));
        };
        if !force && !Self::is_ancestor(&state, &current, sha) {
            return Err(Error::Conflict("Update is not a fast forward".to_string()));
        }
        state.refs.insert(key, sha.to_string());
        Ok(self.to_ref(owner, branch, sha))
    }

    async fn delete_ref(&self, owner: &str, branch: &str) -> Result<()> {
        self.enter("delete_ref")?;
        self.delete_ref_calls
            .lock()
            .unwrap()
            .push((owner.to_string(), branch.to_string()));

        let mut state = self.state.lock().unwrap();
        state
            .refs
            .remove(&(owner.to_string(), branch.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("branch {owner}:{branch}")))
    }

    async fn get_commit(&self, _owner: &str, sha: &str) -> Result<CommitInfo> {
        self.enter("get_commit")?;
        self.commit(sha)
            .ok_or_else(|| Error::NotFound(format!("commit {sha}")))
    }

    async fn create_blob(&self, _owner: &str, content_base64: &str) -> Result<String> {
        self.enter("create_blob")?;
        let sha = hash(&["blob", content_base64]);
        self.blob_calls.lock().unwrap().push(sha.clone());
        self.state
            .lock()
            .unwrap()
            .blobs
            .insert(sha.clone(), content_base64.to_string());
        Ok(sha)
    }

    async fn create_tree(
        &self,
        owner: &str,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> Result<String> {
        self.enter("create_tree")?;
        self.tree_calls.lock().unwrap().push(CreateTreeCall {
            owner: owner.to_string(),
            base_tree: base_tree.to_string(),
            entries: entries.to_vec(),
        });

        let mut parts = vec!["tree".to_string(), base_tree.to_string()];
        for entry in entries {
            parts.push(entry.path.clone());
            parts.push(entry.sha.clone());
        }
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        Ok(hash(&parts))
    }

    async fn create_commit(
        &self,
        owner: &str,
        message: &str,
        tree: &str,
        parents: &[String],
    ) -> Result<String> {
        self.enter("create_commit")?;
        self.commit_calls.lock().unwrap().push(CreateCommitCall {
            owner: owner.to_string(),
            message: message.to_string(),
            tree: tree.to_string(),
            parents: parents.to_vec(),
        });

        let seq = self.commit_seq.fetch_add(1, Ordering::SeqCst).to_string();
        let mut parts = vec!["commit", message, tree, seq.as_str()];
        parts.extend(parents.iter().map(String::as_str));
        let sha = hash(&parts);
        self.state.lock().unwrap().commits.insert(
            sha.clone(),
            CommitInfo {
                sha: sha.clone(),
                tree_sha: tree.to_string(),
                parents: parents.to_vec(),
            },
        );
        Ok(sha)
    }

    async fn list_pulls(
        &self,
        state_filter: PrStateFilter,
        head: Option<&str>,
    ) -> Result<Vec<PullRequestRecord>> {
        self.enter("list_pulls")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .pulls
            .iter()
            .filter(|pr| match state_filter {
                PrStateFilter::Open => pr.state == PrState::Open,
                PrStateFilter::Closed => pr.state == PrState::Closed,
                PrStateFilter::All => true,
            })
            .filter(|pr| {
                head.is_none_or(|head| {
                    let owner = pr.head_owner.as_deref().unwrap_or_default();
                    head == format!("{owner}:{}", pr.head_branch)
                })
            })
            .cloned()
            .collect())
    }

    async fn create_pull(&self, pr: &NewPullRequest) -> Result<PullRequestRecord> {
        self.enter("create_pull")?;
        self.create_pull_calls.lock().unwrap().push(pr.clone());

        let (head_owner, head_branch) = pr
            .head
            .split_once(':')
            .ok_or_else(|| Error::Invalid(format!("head must be owner:branch, got {}", pr.head)))?;
        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        let record = PullRequestRecord {
            id: 1000 + number,
            node_id: format!("PR_node_{number}"),
            number,
            title: pr.title.clone(),
            state: PrState::Open,
            is_draft: pr.draft,
            author: self.login.clone(),
            head_branch: head_branch.to_string(),
            head_owner: Some(head_owner.to_string()),
            merged_at: None,
            html_url: format!("https://github.com/{UPSTREAM_OWNER}/{REPO}/pull/{number}"),
        };
        self.state.lock().unwrap().pulls.push(record.clone());
        Ok(record)
    }

    async fn list_branches(&self, owner: &str) -> Result<Vec<String>> {
        self.enter("list_branches")?;
        let state = self.state.lock().unwrap();
        let mut branches: Vec<String> = state
            .refs
            .keys()
            .filter(|(o, _)| o == owner)
            .map(|(_, b)| b.clone())
            .collect();
        branches.sort();
        Ok(branches)
    }

    async fn get_file_contents(&self, owner: &str, path: &str, _git_ref: &str) -> Result<String> {
        self.enter("get_file_contents")?;
        self.state
            .lock()
            .unwrap()
            .files
            .get(&(owner.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{owner}/{path}")))
    }

    async fn find_open_pulls_by_head(
        &self,
        branch: &str,
        limit: u32,
    ) -> Result<Vec<PullRequestRecord>> {
        self.enter("find_open_pulls_by_head")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .pulls
            .iter()
            .filter(|pr| pr.state == PrState::Open && pr.head_branch == branch)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn mark_ready_for_review(&self, node_id: &str) -> Result<()> {
        self.enter("mark_ready_for_review")?;
        self.mark_ready_calls
            .lock()
            .unwrap()
            .push(node_id.to_string());

        let mut state = self.state.lock().unwrap();
        let pr = state
            .pulls
            .iter_mut()
            .find(|pr| pr.node_id == node_id)
            .ok_or_else(|| Error::NotFound(format!("pull request {node_id}")))?;
        pr.is_draft = false;
        Ok(())
    }
}
