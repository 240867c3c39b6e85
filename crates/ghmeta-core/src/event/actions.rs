//! Tablas de acciones por tipo de evento.
//!
//! Cada tipo de evento declara qué valores de `action` se ignoran y cuáles son
//! significativos (disparan persistencia). Cualquier otro valor es
//! "no reconocido" y se trata como no-op. Las tablas se generan con
//! `action_table!`, que produce un enum cerrado por tipo de evento; el `match`
//! de `outcome` es exhaustivo por construcción.
use std::fmt;

/// Resultado de clasificar una acción.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Ignored,
    Significant,
}

/// Contrato común de las tablas generadas.
pub trait ActionTable: Sized + Copy + fmt::Debug {
    const IGNORED: &'static [&'static str];
    const SIGNIFICANT: &'static [&'static str];

    fn parse(action: &str) -> Option<Self>;
    fn as_str(self) -> &'static str;
    fn outcome(self) -> ActionOutcome;
}

/// Acción clasificada contra la tabla `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified<A> {
    Ignored(A),
    Significant(A),
    Unrecognized,
}

pub fn classify<A: ActionTable>(action: &str) -> Classified<A> {
    match A::parse(action) {
        Some(a) => match a.outcome() {
            ActionOutcome::Ignored => Classified::Ignored(a),
            ActionOutcome::Significant => Classified::Significant(a),
        },
        None => Classified::Unrecognized,
    }
}

macro_rules! action_table {
    ($(#[$meta:meta])*
     $name:ident {
         ignored: [$($ig:ident => $igs:literal),* $(,)?],
         significant: [$($sg:ident => $sgs:literal),* $(,)?] $(,)?
     }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($ig,)*
            $($sg,)*
        }

        impl ActionTable for $name {
            const IGNORED: &'static [&'static str] = &[$($igs),*];
            const SIGNIFICANT: &'static [&'static str] = &[$($sgs),*];

            fn parse(action: &str) -> Option<Self> {
                match action {
                    $($igs => Some($name::$ig),)*
                    $($sgs => Some($name::$sg),)*
                    _ => None,
                }
            }

            fn as_str(self) -> &'static str {
                match self {
                    $($name::$ig => $igs,)*
                    $($name::$sg => $sgs,)*
                }
            }

            fn outcome(self) -> ActionOutcome {
                match self {
                    $($name::$ig => ActionOutcome::Ignored,)*
                    $($name::$sg => ActionOutcome::Significant,)*
                }
            }
        }
    };
}

action_table! {
    /// `installation`: `created` persiste cada repositorio adjunto.
    InstallationAction {
        ignored: [Deleted => "deleted"],
        significant: [Created => "created"],
    }
}

action_table! {
    /// `installation_repositories`: `added` persiste cada repositorio agregado.
    InstallationRepositoriesAction {
        ignored: [Removed => "removed"],
        significant: [Added => "added"],
    }
}

action_table! {
    RepositoryAction {
        ignored: [Deleted => "deleted",
                  AnonymousAccessEnabled => "anonymous_access_enabled",
                  AnonymousAccessDisabled => "anonymous_access_disabled"],
        significant: [Created => "created",
                      Edited => "edited",
                      Renamed => "renamed",
                      Transferred => "transferred",
                      Archived => "archived",
                      Unarchived => "unarchived",
                      Publicized => "publicized",
                      Privatized => "privatized"],
    }
}

action_table! {
    OrganizationAction {
        ignored: [Deleted => "deleted", MemberRemoved => "member_removed"],
        significant: [Created => "created",
                      Renamed => "renamed",
                      MemberAdded => "member_added",
                      MemberInvited => "member_invited"],
    }
}

action_table! {
    /// `issue_comment`: se enruta a la tabla de comentarios de issue o de pull
    /// request según el issue sea un PR.
    IssueCommentAction {
        ignored: [Deleted => "deleted"],
        significant: [Created => "created", Edited => "edited"],
    }
}

action_table! {
    IssuesAction {
        ignored: [Deleted => "deleted",
                  Unpinned => "unpinned",
                  Unassigned => "unassigned",
                  Unlocked => "unlocked",
                  Demilestoned => "demilestoned"],
        significant: [Opened => "opened",
                      Edited => "edited",
                      Reopened => "reopened",
                      Transferred => "transferred",
                      Labeled => "labeled",
                      Assigned => "assigned",
                      Closed => "closed",
                      Locked => "locked",
                      Pinned => "pinned",
                      Milestoned => "milestoned"],
    }
}

action_table! {
    PullRequestAction {
        ignored: [Closed => "closed",
                  Synchronize => "synchronize",
                  Locked => "locked",
                  Unlocked => "unlocked"],
        significant: [Assigned => "assigned",
                      Unassigned => "unassigned",
                      Labeled => "labeled",
                      Unlabeled => "unlabeled",
                      Opened => "opened",
                      Edited => "edited",
                      Reopened => "reopened",
                      ReadyForReview => "ready_for_review"],
    }
}

action_table! {
    PullRequestReviewAction {
        ignored: [Dismissed => "dismissed"],
        significant: [Submitted => "submitted", Edited => "edited"],
    }
}

action_table! {
    PullRequestReviewCommentAction {
        ignored: [Deleted => "deleted"],
        significant: [Created => "created", Edited => "edited"],
    }
}

/// Tipos de evento reconocidos (valor del header `X-GitHub-Event`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Installation,
    InstallationRepositories,
    Repository,
    Organization,
    IssueComment,
    Issues,
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
}

impl EventType {
    pub const ALL: [EventType; 9] = [EventType::Installation,
                                     EventType::InstallationRepositories,
                                     EventType::Repository,
                                     EventType::Organization,
                                     EventType::IssueComment,
                                     EventType::Issues,
                                     EventType::PullRequest,
                                     EventType::PullRequestReview,
                                     EventType::PullRequestReviewComment];

    /// Primera fase del parseo: sólo el discriminante. Tags desconocidos
    /// devuelven `None` y el payload nunca se toca.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "installation" => EventType::Installation,
            "installation_repositories" => EventType::InstallationRepositories,
            "repository" => EventType::Repository,
            "organization" => EventType::Organization,
            "issue_comment" => EventType::IssueComment,
            "issues" => EventType::Issues,
            "pull_request" => EventType::PullRequest,
            "pull_request_review" => EventType::PullRequestReview,
            "pull_request_review_comment" => EventType::PullRequestReviewComment,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Installation => "installation",
            EventType::InstallationRepositories => "installation_repositories",
            EventType::Repository => "repository",
            EventType::Organization => "organization",
            EventType::IssueComment => "issue_comment",
            EventType::Issues => "issues",
            EventType::PullRequest => "pull_request",
            EventType::PullRequestReview => "pull_request_review",
            EventType::PullRequestReviewComment => "pull_request_review_comment",
        }
    }

    pub fn ignored_actions(self) -> &'static [&'static str] {
        match self {
            EventType::Installation => InstallationAction::IGNORED,
            EventType::InstallationRepositories => InstallationRepositoriesAction::IGNORED,
            EventType::Repository => RepositoryAction::IGNORED,
            EventType::Organization => OrganizationAction::IGNORED,
            EventType::IssueComment => IssueCommentAction::IGNORED,
            EventType::Issues => IssuesAction::IGNORED,
            EventType::PullRequest => PullRequestAction::IGNORED,
            EventType::PullRequestReview => PullRequestReviewAction::IGNORED,
            EventType::PullRequestReviewComment => PullRequestReviewCommentAction::IGNORED,
        }
    }

    pub fn significant_actions(self) -> &'static [&'static str] {
        match self {
            EventType::Installation => InstallationAction::SIGNIFICANT,
            EventType::InstallationRepositories => InstallationRepositoriesAction::SIGNIFICANT,
            EventType::Repository => RepositoryAction::SIGNIFICANT,
            EventType::Organization => OrganizationAction::SIGNIFICANT,
            EventType::IssueComment => IssueCommentAction::SIGNIFICANT,
            EventType::Issues => IssuesAction::SIGNIFICANT,
            EventType::PullRequest => PullRequestAction::SIGNIFICANT,
            EventType::PullRequestReview => PullRequestReviewAction::SIGNIFICANT,
            EventType::PullRequestReviewComment => PullRequestReviewCommentAction::SIGNIFICANT,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
