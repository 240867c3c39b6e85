//! Contrato estático de columnas por tipo de entidad.
//!
//! Cada `EntityKind` tiene exactamente una tabla con un conjunto ordenado de
//! columnas de contenido. El motor de upsert no infiere nada del payload: los
//! valores que recibe deben seguir este orden y estos tipos. Cambiar los campos
//! de un tipo exige cambiar este contrato y la migración SQL a la vez.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tipo semántico de una columna de contenido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Bool,
    BigInt,
    Timestamp,
    TextArray,
    BigIntArray,
}

impl ColumnType {
    /// Nombre SQL (Postgres) del tipo.
    pub fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Bool => "boolean",
            ColumnType::BigInt => "bigint",
            ColumnType::Timestamp => "timestamptz",
            ColumnType::TextArray => "text[]",
            ColumnType::BigIntArray => "bigint[]",
        }
    }
}

/// Tipos de entidad que este sistema persiste.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Organization,
    Repository,
    Issue,
    IssueComment,
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [EntityKind::Organization,
                                      EntityKind::Repository,
                                      EntityKind::Issue,
                                      EntityKind::IssueComment,
                                      EntityKind::PullRequest,
                                      EntityKind::PullRequestReview,
                                      EntityKind::PullRequestReviewComment];

    /// Contrato de columnas del tipo.
    pub fn schema(self) -> &'static EntitySchema {
        match self {
            EntityKind::Organization => &ORGANIZATIONS,
            EntityKind::Repository => &REPOSITORIES,
            EntityKind::Issue => &ISSUES,
            EntityKind::IssueComment => &ISSUE_COMMENTS,
            EntityKind::PullRequest => &PULL_REQUESTS,
            EntityKind::PullRequestReview => &PULL_REQUEST_REVIEWS,
            EntityKind::PullRequestReviewComment => &PULL_REQUEST_COMMENTS,
        }
    }

    pub fn table(self) -> &'static str {
        self.schema().table
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Organization => "organization",
            EntityKind::Repository => "repository",
            EntityKind::Issue => "issue",
            EntityKind::IssueComment => "issue_comment",
            EntityKind::PullRequest => "pull_request",
            EntityKind::PullRequestReview => "pull_request_review",
            EntityKind::PullRequestReviewComment => "pull_request_review_comment",
        };
        f.write_str(name)
    }
}

/// Entrada del registro: tabla destino y columnas de contenido ordenadas.
#[derive(Debug)]
pub struct EntitySchema {
    pub table: &'static str,
    pub columns: &'static [(&'static str, ColumnType)],
}

impl EntitySchema {
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(name, _)| *name)
    }
}

use ColumnType::{BigInt, Bool, Text, TextArray, Timestamp};

static ORGANIZATIONS: EntitySchema = EntitySchema {
    table: "github_organizations_versioned",
    columns: &[("avatar_url", Text),
               ("collaborators", BigInt),
               ("created_at", Timestamp),
               ("description", Text),
               ("email", Text),
               ("htmlurl", Text),
               ("id", BigInt),
               ("login", Text),
               ("name", Text),
               ("node_id", Text),
               ("owned_private_repos", BigInt),
               ("public_repos", BigInt),
               ("total_private_repos", BigInt),
               ("updated_at", Timestamp)],
};

static REPOSITORIES: EntitySchema = EntitySchema {
    table: "github_repositories_versioned",
    columns: &[("allow_merge_commit", Bool),
               ("allow_rebase_merge", Bool),
               ("allow_squash_merge", Bool),
               ("archived", Bool),
               ("created_at", Timestamp),
               ("default_branch", Text),
               ("description", Text),
               ("disabled", Bool),
               ("fork", Bool),
               ("forks_count", BigInt),
               ("fullname", Text),
               ("has_issues", Bool),
               ("has_wiki", Bool),
               ("homepage", Text),
               ("htmlurl", Text),
               ("id", BigInt),
               ("language", Text),
               ("name", Text),
               ("node_id", Text),
               ("open_issues_count", BigInt),
               ("owner_id", BigInt),
               ("owner_login", Text),
               ("owner_type", Text),
               ("private", Bool),
               ("pushed_at", Timestamp),
               ("sshurl", Text),
               ("stargazers_count", BigInt),
               ("topics", TextArray),
               ("updated_at", Timestamp),
               ("watchers_count", BigInt)],
};

static ISSUES: EntitySchema = EntitySchema {
    table: "github_issues_versioned",
    columns: &[("assignees", TextArray),
               ("body", Text),
               ("closed_at", Timestamp),
               ("closed_by_id", BigInt),
               ("closed_by_login", Text),
               ("comments", BigInt),
               ("created_at", Timestamp),
               ("htmlurl", Text),
               ("id", BigInt),
               ("labels", TextArray),
               ("locked", Bool),
               ("milestone_id", BigInt),
               ("milestone_title", Text),
               ("node_id", Text),
               ("number", BigInt),
               ("repository_name", Text),
               ("repository_owner", Text),
               ("repository_fullname", Text),
               ("state", Text),
               ("title", Text),
               ("updated_at", Timestamp),
               ("user_id", BigInt),
               ("user_login", Text)],
};

static ISSUE_COMMENTS: EntitySchema = EntitySchema {
    table: "github_issue_comments_versioned",
    columns: &[("author_association", Text),
               ("body", Text),
               ("created_at", Timestamp),
               ("htmlurl", Text),
               ("id", BigInt),
               ("issue_number", BigInt),
               ("node_id", Text),
               ("repository_name", Text),
               ("repository_owner", Text),
               ("repository_fullname", Text),
               ("updated_at", Timestamp),
               ("user_id", BigInt),
               ("user_login", Text)],
};

static PULL_REQUESTS: EntitySchema = EntitySchema {
    table: "github_pull_requests_versioned",
    columns: &[("additions", BigInt),
               ("assignees", TextArray),
               ("author_association", Text),
               ("base_ref", Text),
               ("base_repository_name", Text),
               ("base_repository_owner", Text),
               ("base_repository_fullname", Text),
               ("base_sha", Text),
               ("base_user", Text),
               ("body", Text),
               ("changed_files", BigInt),
               ("closed_at", Timestamp),
               ("comments", BigInt),
               ("commits", BigInt),
               ("created_at", Timestamp),
               ("deletions", BigInt),
               ("head_ref", Text),
               ("head_repository_name", Text),
               ("head_repository_owner", Text),
               ("head_repository_fullname", Text),
               ("head_sha", Text),
               ("head_user", Text),
               ("htmlurl", Text),
               ("id", BigInt),
               ("labels", TextArray),
               ("maintainer_can_modify", Bool),
               ("merge_commit_sha", Text),
               ("mergeable", Bool),
               ("merged", Bool),
               ("merged_at", Timestamp),
               ("merged_by_id", BigInt),
               ("merged_by_login", Text),
               ("milestone_id", BigInt),
               ("milestone_title", Text),
               ("node_id", Text),
               ("number", BigInt),
               ("repository_name", Text),
               ("repository_owner", Text),
               ("repository_fullname", Text),
               ("review_comments", BigInt),
               ("state", Text),
               ("title", Text),
               ("updated_at", Timestamp),
               ("user_id", BigInt),
               ("user_login", Text)],
};

static PULL_REQUEST_REVIEWS: EntitySchema = EntitySchema {
    table: "github_pull_request_reviews_versioned",
    columns: &[("body", Text),
               ("commit_id", Text),
               ("htmlurl", Text),
               ("id", BigInt),
               ("node_id", Text),
               ("pull_request_number", BigInt),
               ("repository_name", Text),
               ("repository_owner", Text),
               ("repository_fullname", Text),
               ("state", Text),
               ("submitted_at", Timestamp),
               ("user_id", BigInt),
               ("user_login", Text)],
};

static PULL_REQUEST_COMMENTS: EntitySchema = EntitySchema {
    table: "github_pull_request_comments_versioned",
    columns: &[("author_association", Text),
               ("body", Text),
               ("commit_id", Text),
               ("created_at", Timestamp),
               ("diff_hunk", Text),
               ("htmlurl", Text),
               ("id", BigInt),
               ("in_reply_to", BigInt),
               ("node_id", Text),
               ("original_commit_id", Text),
               ("original_position", BigInt),
               ("path", Text),
               ("position", BigInt),
               ("pull_request_number", BigInt),
               ("pull_request_review_id", BigInt),
               ("repository_name", Text),
               ("repository_owner", Text),
               ("repository_fullname", Text),
               ("updated_at", Timestamp),
               ("user_id", BigInt),
               ("user_login", Text)],
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_kind_has_its_own_table() {
        let tables: HashSet<&str> = EntityKind::ALL.iter().map(|k| k.table()).collect();
        assert_eq!(tables.len(), EntityKind::ALL.len());
    }

    #[test]
    fn column_names_are_unique_and_never_shadow_bookkeeping_columns() {
        for kind in EntityKind::ALL {
            let schema = kind.schema();
            let names: HashSet<&str> = schema.column_names().collect();
            assert_eq!(names.len(), schema.columns.len(), "duplicated column in {kind}");
            assert!(!names.contains("sum256") && !names.contains("versions"));
            assert!(names.contains("id"), "{kind} must carry its numeric id");
        }
    }
}
