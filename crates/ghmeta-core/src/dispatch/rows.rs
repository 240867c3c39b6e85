//! Construcción de `UpsertRequest` por tipo de entidad.
//!
//! Cada función fija la tupla de identidad y el orden de valores del contrato
//! (`entity::EntityKind::schema`). Los campos `null`/ausentes del payload se
//! escriben con su valor cero, salvo timestamps que quedan en NULL.
use crate::entity::{ColumnValue, EntityKind};
use crate::event::types::{Issue, IssueComment, Label, Organization, PullRequest, PullRequestBranch,
                          PullRequestComment, PullRequestReview, Repository, User};
use crate::store::UpsertRequest;

fn login(user: Option<&User>) -> String {
    user.map(|u| u.login.clone()).unwrap_or_default()
}

fn user_id(user: Option<&User>) -> i64 {
    user.map(|u| u.id).unwrap_or_default()
}

fn text(value: &Option<String>) -> ColumnValue {
    ColumnValue::Text(value.clone().unwrap_or_default())
}

fn logins(users: &[User]) -> ColumnValue {
    ColumnValue::TextArray(users.iter().map(|u| u.login.clone()).collect())
}

fn label_names(labels: &[Label]) -> ColumnValue {
    ColumnValue::TextArray(labels.iter().map(|l| l.name.clone()).collect())
}

/// (repository_name, repository_owner, repository_fullname)
fn repository_scope(repo: &Repository) -> [ColumnValue; 3] {
    [repo.name.as_str().into(), login(repo.owner.as_ref()).into(), repo.full_name.as_str().into()]
}

/// (ref, repo name, repo owner, repo fullname, sha, user) de una rama de PR.
fn branch(branch: Option<&PullRequestBranch>) -> [ColumnValue; 6] {
    let b = branch.cloned().unwrap_or_default();
    let repo = b.repo.unwrap_or_default();
    [b.git_ref.into(),
     repo.name.into(),
     login(repo.owner.as_ref()).into(),
     repo.full_name.into(),
     b.sha.into(),
     login(b.user.as_ref()).into()]
}

/// github_repositories_versioned, identidad `(repo.id)`.
pub fn repository(repo: &Repository, version: i64) -> UpsertRequest {
    let owner = repo.owner.as_ref();
    let values = vec![repo.allow_merge_commit.unwrap_or_default().into(),
                      repo.allow_rebase_merge.unwrap_or_default().into(),
                      repo.allow_squash_merge.unwrap_or_default().into(),
                      repo.archived.into(),
                      repo.created_at.into(),
                      repo.default_branch.as_str().into(),
                      text(&repo.description),
                      repo.disabled.into(),
                      repo.fork.into(),
                      repo.forks_count.into(),
                      repo.full_name.as_str().into(),
                      repo.has_issues.into(),
                      repo.has_wiki.into(),
                      text(&repo.homepage),
                      repo.html_url.as_str().into(),
                      repo.id.into(),
                      text(&repo.language),
                      repo.name.as_str().into(),
                      repo.node_id.as_str().into(),
                      repo.open_issues_count.into(),
                      user_id(owner).into(),
                      login(owner).into(),
                      owner.map(|o| o.user_type.clone()).unwrap_or_default().into(),
                      repo.private.into(),
                      repo.pushed_at.into(),
                      repo.ssh_url.as_str().into(),
                      repo.stargazers_count.into(),
                      repo.topics.clone().into(),
                      repo.updated_at.into(),
                      repo.watchers_count.into()];
    UpsertRequest::new(EntityKind::Repository, vec![repo.id], version, values)
}

/// github_organizations_versioned, identidad `(org.id)`.
pub fn organization(org: &Organization, version: i64) -> UpsertRequest {
    let values = vec![org.avatar_url.as_str().into(),
                      org.collaborators.unwrap_or_default().into(),
                      org.created_at.into(),
                      text(&org.description),
                      text(&org.email),
                      text(&org.html_url),
                      org.id.into(),
                      org.login.as_str().into(),
                      text(&org.name),
                      org.node_id.as_str().into(),
                      org.owned_private_repos.unwrap_or_default().into(),
                      org.public_repos.unwrap_or_default().into(),
                      org.total_private_repos.unwrap_or_default().into(),
                      org.updated_at.into()];
    UpsertRequest::new(EntityKind::Organization, vec![org.id], version, values)
}

/// github_issues_versioned, identidad `(repo.id, issue.id)`.
pub fn issue(repo: &Repository, issue: &Issue, version: i64) -> UpsertRequest {
    let closed_by = issue.closed_by.as_ref();
    let milestone = issue.milestone.clone().unwrap_or_default();
    let [repo_name, repo_owner, repo_fullname] = repository_scope(repo);
    let values = vec![logins(&issue.assignees),
                      text(&issue.body),
                      issue.closed_at.into(),
                      user_id(closed_by).into(),
                      login(closed_by).into(),
                      issue.comments.into(),
                      issue.created_at.into(),
                      issue.html_url.as_str().into(),
                      issue.id.into(),
                      label_names(&issue.labels),
                      issue.locked.into(),
                      milestone.id.into(),
                      milestone.title.into(),
                      issue.node_id.as_str().into(),
                      issue.number.into(),
                      repo_name,
                      repo_owner,
                      repo_fullname,
                      issue.state.as_str().into(),
                      issue.title.as_str().into(),
                      issue.updated_at.into(),
                      user_id(issue.user.as_ref()).into(),
                      login(issue.user.as_ref()).into()];
    UpsertRequest::new(EntityKind::Issue, vec![repo.id, issue.id], version, values)
}

/// github_issue_comments_versioned, identidad `(repo.id, issue.id, comment.id)`.
pub fn issue_comment(repo: &Repository, issue: &Issue, comment: &IssueComment, version: i64) -> UpsertRequest {
    let [repo_name, repo_owner, repo_fullname] = repository_scope(repo);
    let values = vec![comment.author_association.as_str().into(),
                      text(&comment.body),
                      comment.created_at.into(),
                      comment.html_url.as_str().into(),
                      comment.id.into(),
                      issue.number.into(),
                      comment.node_id.as_str().into(),
                      repo_name,
                      repo_owner,
                      repo_fullname,
                      comment.updated_at.into(),
                      user_id(comment.user.as_ref()).into(),
                      login(comment.user.as_ref()).into()];
    UpsertRequest::new(EntityKind::IssueComment,
                       vec![repo.id, issue.id, comment.id],
                       version,
                       values)
}

/// Comentario de conversación de un PR (llega como `issue_comment`).
///
/// Va a github_pull_request_comments_versioned con la misma identidad que
/// tendría como comentario de issue. Los campos de revisión que este payload
/// no trae (commit, diff_hunk, path, posiciones, review id, in_reply_to)
/// quedan vacíos o en cero.
pub fn issue_comment_as_pull_request(repo: &Repository,
                                     issue: &Issue,
                                     comment: &IssueComment,
                                     version: i64)
                                     -> UpsertRequest {
    let [repo_name, repo_owner, repo_fullname] = repository_scope(repo);
    let values = vec![comment.author_association.as_str().into(),
                      text(&comment.body),
                      "".into(),
                      comment.created_at.into(),
                      "".into(),
                      comment.html_url.as_str().into(),
                      comment.id.into(),
                      0i64.into(),
                      comment.node_id.as_str().into(),
                      "".into(),
                      0i64.into(),
                      "".into(),
                      0i64.into(),
                      issue.number.into(),
                      0i64.into(),
                      repo_name,
                      repo_owner,
                      repo_fullname,
                      comment.updated_at.into(),
                      user_id(comment.user.as_ref()).into(),
                      login(comment.user.as_ref()).into()];
    UpsertRequest::new(EntityKind::PullRequestReviewComment,
                       vec![repo.id, issue.id, comment.id],
                       version,
                       values)
}

/// github_pull_requests_versioned, identidad `(repo.id, pr.id)`.
pub fn pull_request(repo: &Repository, pr: &PullRequest, version: i64) -> UpsertRequest {
    let [base_ref, base_repo_name, base_repo_owner, base_repo_fullname, base_sha, base_user] =
        branch(pr.base.as_ref());
    let [head_ref, head_repo_name, head_repo_owner, head_repo_fullname, head_sha, head_user] =
        branch(pr.head.as_ref());
    let milestone = pr.milestone.clone().unwrap_or_default();
    let merged_by = pr.merged_by.as_ref();
    let [repo_name, repo_owner, repo_fullname] = repository_scope(repo);
    let values = vec![pr.additions.into(),
                      logins(&pr.assignees),
                      pr.author_association.as_str().into(),
                      base_ref,
                      base_repo_name,
                      base_repo_owner,
                      base_repo_fullname,
                      base_sha,
                      base_user,
                      text(&pr.body),
                      pr.changed_files.into(),
                      pr.closed_at.into(),
                      pr.comments.into(),
                      pr.commits.into(),
                      pr.created_at.into(),
                      pr.deletions.into(),
                      head_ref,
                      head_repo_name,
                      head_repo_owner,
                      head_repo_fullname,
                      head_sha,
                      head_user,
                      pr.html_url.as_str().into(),
                      pr.id.into(),
                      label_names(&pr.labels),
                      pr.maintainer_can_modify.unwrap_or_default().into(),
                      text(&pr.merge_commit_sha),
                      pr.mergeable.unwrap_or_default().into(),
                      pr.merged.unwrap_or_default().into(),
                      pr.merged_at.into(),
                      user_id(merged_by).into(),
                      login(merged_by).into(),
                      milestone.id.into(),
                      milestone.title.into(),
                      pr.node_id.as_str().into(),
                      pr.number.into(),
                      repo_name,
                      repo_owner,
                      repo_fullname,
                      pr.review_comments.into(),
                      pr.state.as_str().into(),
                      pr.title.as_str().into(),
                      pr.updated_at.into(),
                      user_id(pr.user.as_ref()).into(),
                      login(pr.user.as_ref()).into()];
    UpsertRequest::new(EntityKind::PullRequest, vec![repo.id, pr.id], version, values)
}

/// github_pull_request_reviews_versioned, identidad `(repo.id, pr.id, review.id)`.
pub fn pull_request_review(repo: &Repository,
                           pr: &PullRequest,
                           review: &PullRequestReview,
                           version: i64)
                           -> UpsertRequest {
    let [repo_name, repo_owner, repo_fullname] = repository_scope(repo);
    let values = vec![text(&review.body),
                      review.commit_id.as_str().into(),
                      review.html_url.as_str().into(),
                      review.id.into(),
                      review.node_id.as_str().into(),
                      pr.number.into(),
                      repo_name,
                      repo_owner,
                      repo_fullname,
                      review.state.as_str().into(),
                      review.submitted_at.into(),
                      user_id(review.user.as_ref()).into(),
                      login(review.user.as_ref()).into()];
    UpsertRequest::new(EntityKind::PullRequestReview,
                       vec![repo.id, pr.id, review.id],
                       version,
                       values)
}

/// github_pull_request_comments_versioned, identidad `(repo.id, pr.id, comment.id)`.
pub fn pull_request_review_comment(repo: &Repository,
                                   pr: &PullRequest,
                                   comment: &PullRequestComment,
                                   version: i64)
                                   -> UpsertRequest {
    let [repo_name, repo_owner, repo_fullname] = repository_scope(repo);
    let values = vec![comment.author_association.as_str().into(),
                      text(&comment.body),
                      comment.commit_id.as_str().into(),
                      comment.created_at.into(),
                      comment.diff_hunk.as_str().into(),
                      comment.html_url.as_str().into(),
                      comment.id.into(),
                      comment.in_reply_to_id.unwrap_or_default().into(),
                      comment.node_id.as_str().into(),
                      comment.original_commit_id.as_str().into(),
                      comment.original_position.unwrap_or_default().into(),
                      comment.path.as_str().into(),
                      comment.position.unwrap_or_default().into(),
                      pr.number.into(),
                      comment.pull_request_review_id.unwrap_or_default().into(),
                      repo_name,
                      repo_owner,
                      repo_fullname,
                      comment.updated_at.into(),
                      user_id(comment.user.as_ref()).into(),
                      login(comment.user.as_ref()).into()];
    UpsertRequest::new(EntityKind::PullRequestReviewComment,
                       vec![repo.id, pr.id, comment.id],
                       version,
                       values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builder_matches_its_contract_with_empty_payloads() {
        let repo = Repository::default();
        let requests = [repository(&repo, 1),
                        organization(&Organization::default(), 1),
                        issue(&repo, &Issue::default(), 1),
                        issue_comment(&repo, &Issue::default(), &IssueComment::default(), 1),
                        issue_comment_as_pull_request(&repo, &Issue::default(), &IssueComment::default(), 1),
                        pull_request(&repo, &PullRequest::default(), 1),
                        pull_request_review(&repo, &PullRequest::default(), &PullRequestReview::default(), 1),
                        pull_request_review_comment(&repo,
                                                    &PullRequest::default(),
                                                    &PullRequestComment::default(),
                                                    1)];
        for req in &requests {
            assert_eq!(req.validate(), Ok(()), "{}", req.kind);
        }
    }

    #[test]
    fn conversation_comment_on_pull_request_shares_identity_shape_with_issue_comment() {
        let repo = Repository { id: 1, ..Default::default() };
        let issue = Issue { id: 2, number: 7, ..Default::default() };
        let comment = IssueComment { id: 3, ..Default::default() };
        let as_issue = issue_comment(&repo, &issue, &comment, 1);
        let as_pr = issue_comment_as_pull_request(&repo, &issue, &comment, 1);
        assert_eq!(as_issue.identity(), as_pr.identity());
        assert_ne!(as_issue.kind, as_pr.kind);
        assert_eq!(as_pr.content().get("pull_request_number"), Some(&ColumnValue::BigInt(7)));
        assert_eq!(as_pr.content().get("diff_hunk"), Some(&ColumnValue::Text(String::new())));
    }
}
