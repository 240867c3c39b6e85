//! Estructuras de payload de los webhooks de GitHub que se persisten.
//!
//! Sólo se modelan los campos que entran en el contrato de columnas. Todos los
//! structs usan `#[serde(default)]`: un campo ausente toma su valor cero. Los
//! campos que no son `Option` pasan además por `nullable::or_default`, así un
//! `null` explícito también queda en cero. Las sub-estructuras de las que
//! depende la identidad (repositorio, issue, comentario…) son `Option` y su
//! ausencia se reporta como error de extracción al despachar.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{nullable, timestamp};

type Timestamp = Option<DateTime<Utc>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(deserialize_with = "nullable::or_default")]
    pub id: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub login: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub node_id: String,
    #[serde(rename = "type", deserialize_with = "nullable::or_default")]
    pub user_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
    #[serde(deserialize_with = "nullable::or_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Milestone {
    #[serde(deserialize_with = "nullable::or_default")]
    pub id: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
    #[serde(deserialize_with = "nullable::or_default")]
    pub id: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub node_id: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub name: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub full_name: String,
    pub owner: Option<User>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub private: bool,
    #[serde(deserialize_with = "nullable::or_default")]
    pub html_url: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub fork: bool,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub created_at: Timestamp,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub updated_at: Timestamp,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub pushed_at: Timestamp,
    pub homepage: Option<String>,
    pub language: Option<String>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub ssh_url: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub forks_count: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub stargazers_count: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub watchers_count: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub open_issues_count: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub has_issues: bool,
    #[serde(deserialize_with = "nullable::or_default")]
    pub has_wiki: bool,
    #[serde(deserialize_with = "nullable::or_default")]
    pub archived: bool,
    #[serde(deserialize_with = "nullable::or_default")]
    pub disabled: bool,
    #[serde(deserialize_with = "nullable::or_default")]
    pub default_branch: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub topics: Vec<String>,
    pub allow_merge_commit: Option<bool>,
    pub allow_rebase_merge: Option<bool>,
    pub allow_squash_merge: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    #[serde(deserialize_with = "nullable::or_default")]
    pub id: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub login: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub node_id: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub avatar_url: String,
    pub html_url: Option<String>,
    pub description: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub collaborators: Option<i64>,
    pub owned_private_repos: Option<i64>,
    pub public_repos: Option<i64>,
    pub total_private_repos: Option<i64>,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub created_at: Timestamp,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    #[serde(deserialize_with = "nullable::or_default")]
    pub id: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub node_id: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub number: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub title: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub state: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub locked: bool,
    pub body: Option<String>,
    pub user: Option<User>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub labels: Vec<Label>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub assignees: Vec<User>,
    pub milestone: Option<Milestone>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub comments: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub html_url: String,
    pub closed_by: Option<User>,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub created_at: Timestamp,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub updated_at: Timestamp,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub closed_at: Timestamp,
    /// Presente (objeto de links) sólo cuando el issue es un pull request.
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueComment {
    #[serde(deserialize_with = "nullable::or_default")]
    pub id: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub node_id: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub html_url: String,
    pub body: Option<String>,
    pub user: Option<User>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub author_association: String,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub created_at: Timestamp,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestBranch {
    #[serde(deserialize_with = "nullable::or_default")]
    pub label: String,
    #[serde(rename = "ref", deserialize_with = "nullable::or_default")]
    pub git_ref: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub sha: String,
    pub user: Option<User>,
    /// `null` cuando el fork de origen fue borrado.
    pub repo: Option<Repository>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequest {
    #[serde(deserialize_with = "nullable::or_default")]
    pub id: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub node_id: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub number: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub state: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub locked: bool,
    #[serde(deserialize_with = "nullable::or_default")]
    pub title: String,
    pub body: Option<String>,
    pub user: Option<User>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub html_url: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub labels: Vec<Label>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub assignees: Vec<User>,
    pub milestone: Option<Milestone>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub author_association: String,
    pub head: Option<PullRequestBranch>,
    pub base: Option<PullRequestBranch>,
    pub merged: Option<bool>,
    pub mergeable: Option<bool>,
    pub merge_commit_sha: Option<String>,
    pub merged_by: Option<User>,
    pub maintainer_can_modify: Option<bool>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub comments: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub review_comments: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub commits: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub additions: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub deletions: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub changed_files: i64,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub created_at: Timestamp,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub updated_at: Timestamp,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub closed_at: Timestamp,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub merged_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestReview {
    #[serde(deserialize_with = "nullable::or_default")]
    pub id: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub node_id: String,
    pub user: Option<User>,
    pub body: Option<String>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub commit_id: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub state: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub html_url: String,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub submitted_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestComment {
    #[serde(deserialize_with = "nullable::or_default")]
    pub id: i64,
    #[serde(deserialize_with = "nullable::or_default")]
    pub node_id: String,
    pub pull_request_review_id: Option<i64>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub diff_hunk: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub path: String,
    pub position: Option<i64>,
    pub original_position: Option<i64>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub commit_id: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub original_commit_id: String,
    pub in_reply_to_id: Option<i64>,
    pub user: Option<User>,
    pub body: Option<String>,
    #[serde(deserialize_with = "nullable::or_default")]
    pub html_url: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub author_association: String,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub created_at: Timestamp,
    #[serde(deserialize_with = "timestamp::flexible")]
    pub updated_at: Timestamp,
}

// Eventos (raíz del payload). `action` se deja como texto: se clasifica con la
// tabla de acciones del tipo de evento.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallationEvent {
    #[serde(deserialize_with = "nullable::or_default")]
    pub action: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub repositories: Vec<Repository>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallationRepositoriesEvent {
    #[serde(deserialize_with = "nullable::or_default")]
    pub action: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub repositories_added: Vec<Repository>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryEvent {
    #[serde(deserialize_with = "nullable::or_default")]
    pub action: String,
    pub repository: Option<Repository>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationEvent {
    #[serde(deserialize_with = "nullable::or_default")]
    pub action: String,
    pub organization: Option<Organization>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueCommentEvent {
    #[serde(deserialize_with = "nullable::or_default")]
    pub action: String,
    pub issue: Option<Issue>,
    pub comment: Option<IssueComment>,
    pub repository: Option<Repository>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuesEvent {
    #[serde(deserialize_with = "nullable::or_default")]
    pub action: String,
    pub issue: Option<Issue>,
    pub repository: Option<Repository>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestEvent {
    #[serde(deserialize_with = "nullable::or_default")]
    pub action: String,
    #[serde(deserialize_with = "nullable::or_default")]
    pub number: i64,
    pub pull_request: Option<PullRequest>,
    pub repository: Option<Repository>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestReviewEvent {
    #[serde(deserialize_with = "nullable::or_default")]
    pub action: String,
    pub review: Option<PullRequestReview>,
    pub pull_request: Option<PullRequest>,
    pub repository: Option<Repository>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestReviewCommentEvent {
    #[serde(deserialize_with = "nullable::or_default")]
    pub action: String,
    pub comment: Option<PullRequestComment>,
    pub pull_request: Option<PullRequest>,
    pub repository: Option<Repository>,
}
