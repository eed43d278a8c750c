//! Contains definitions of common Bitbucket Cloud resources (users,
//! repositories, commits, pull requests, issues) as they appear in webhook
//! payloads, plus the closed set of event kinds the relay understands.
use std::fmt::{Display, Formatter};

use chrono::{DateTime, FixedOffset};
use url::Url;

pub mod event;

pub use event::BitbucketEvent;

/// Name of the header carrying the event identifier, e.g. `pullrequest:created`.
pub const EVENT_KEY_HEADER: &str = "x-event-key";

/// The closed set of webhook events that have a formatter.
///
/// Adding a new event means adding a variant here, a payload schema in
/// [`event`], and a formatter; there is no dynamic lookup by string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RepoPush,
    RepoChanged,
    Fork,
    CommitComment,
    PullRequestCreated,
    PullRequestRejected,
    PullRequestApproved,
    PullRequestUnapproved,
    PullRequestFulfilled,
    PullRequestUpdated,
    PullRequestCommentCreated,
    PullRequestCommentUpdated,
    PullRequestCommentDeleted,
    IssueCreated,
    IssueUpdated,
    IssueCommentCreated,
}

impl EventKind {
    /// Resolves a normalized event key (`:` already replaced by `_`).
    pub fn from_key(key: &str) -> Option<Self> {
        let kind = match key {
            "repo_push" => Self::RepoPush,
            "changes" => Self::RepoChanged,
            "fork" => Self::Fork,
            "comment" => Self::CommitComment,
            "pullrequest_created" => Self::PullRequestCreated,
            "pullrequest_rejected" => Self::PullRequestRejected,
            "pullrequest_approved" => Self::PullRequestApproved,
            "pullrequest_unapproved" => Self::PullRequestUnapproved,
            "pullrequest_fulfilled" => Self::PullRequestFulfilled,
            "pullrequest_updated" => Self::PullRequestUpdated,
            "pullrequest_comment_created" => Self::PullRequestCommentCreated,
            "pullrequest_comment_updated" => Self::PullRequestCommentUpdated,
            "pullrequest_comment_deleted" => Self::PullRequestCommentDeleted,
            "issue_created" => Self::IssueCreated,
            "issue_updated" => Self::IssueUpdated,
            "issue_comment_created" => Self::IssueCommentCreated,
            _ => return None,
        };
        Some(kind)
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::RepoPush => "repo_push",
            Self::RepoChanged => "changes",
            Self::Fork => "fork",
            Self::CommitComment => "comment",
            Self::PullRequestCreated => "pullrequest_created",
            Self::PullRequestRejected => "pullrequest_rejected",
            Self::PullRequestApproved => "pullrequest_approved",
            Self::PullRequestUnapproved => "pullrequest_unapproved",
            Self::PullRequestFulfilled => "pullrequest_fulfilled",
            Self::PullRequestUpdated => "pullrequest_updated",
            Self::PullRequestCommentCreated => "pullrequest_comment_created",
            Self::PullRequestCommentUpdated => "pullrequest_comment_updated",
            Self::PullRequestCommentDeleted => "pullrequest_comment_deleted",
            Self::IssueCreated => "issue_created",
            Self::IssueUpdated => "issue_updated",
            Self::IssueCommentCreated => "issue_comment_created",
        }
    }

    /// All event kinds, in dispatch-table order.
    pub const ALL: [EventKind; 16] = [
        Self::RepoPush,
        Self::RepoChanged,
        Self::Fork,
        Self::CommitComment,
        Self::PullRequestCreated,
        Self::PullRequestRejected,
        Self::PullRequestApproved,
        Self::PullRequestUnapproved,
        Self::PullRequestFulfilled,
        Self::PullRequestUpdated,
        Self::PullRequestCommentCreated,
        Self::PullRequestCommentUpdated,
        Self::PullRequestCommentDeleted,
        Self::IssueCreated,
        Self::IssueUpdated,
        Self::IssueCommentCreated,
    ];
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A single hyperlink inside a `links` object.
#[derive(serde::Deserialize, Debug, Clone)]
pub struct Link {
    pub href: Url,
}

/// Links attached to most repository-scoped resources.
#[derive(serde::Deserialize, Debug, Clone)]
pub struct ResourceLinks {
    pub html: Link,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct UserLinks {
    pub html: Link,
    pub avatar: Link,
}

/// The top-level `actor` of repository events; carries the profile links
/// used for the attachment author card.
#[derive(serde::Deserialize, Debug, Clone)]
pub struct Actor {
    pub display_name: String,
    pub links: UserLinks,
}

/// A user referenced by name only (pull-request author, comment author,
/// issue reporter). The text body renders it as `Display Name _(@username)_`.
#[derive(serde::Deserialize, Debug, Clone)]
pub struct Author {
    pub username: String,
    pub display_name: String,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Repository {
    pub full_name: String,
    pub links: ResourceLinks,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Commit {
    pub hash: String,
    #[serde(default)]
    pub message: String,
    pub date: Option<DateTime<FixedOffset>>,
    pub links: ResourceLinks,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct CommentContent {
    pub raw: String,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Comment {
    pub user: Author,
    pub content: CommentContent,
    pub created_on: Option<DateTime<FixedOffset>>,
    pub updated_on: Option<DateTime<FixedOffset>>,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct BranchRef {
    pub name: String,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct RepositoryRef {
    pub name: String,
}

/// One side of a pull request (`source` or `destination`).
#[derive(serde::Deserialize, Debug, Clone)]
pub struct PullRequestEndpoint {
    pub branch: BranchRef,
    pub repository: RepositoryRef,
}

/// Links of a pull request. Which of these are present depends on the
/// event; formatters require the ones they actually render.
#[derive(serde::Deserialize, Debug, Clone, Default)]
pub struct PullRequestLinks {
    pub html: Option<Link>,
    #[serde(rename = "self")]
    pub this: Option<Link>,
    pub decline: Option<Link>,
    pub approve: Option<Link>,
    pub merge: Option<Link>,
    pub commits: Option<Link>,
    pub comments: Option<Link>,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reason: String,
    pub author: Option<Author>,
    pub source: PullRequestEndpoint,
    pub destination: PullRequestEndpoint,
    pub updated_on: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub links: PullRequestLinks,
}

impl PullRequest {
    /// Attachment title used by most pull-request events: `#<id>: <title>`.
    pub fn numbered_title(&self) -> String {
        format!("#{}: {}", self.id, self.title)
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Issue {
    pub id: u64,
    pub title: String,
    pub reporter: Option<Author>,
    pub links: ResourceLinks,
    pub created_on: Option<DateTime<FixedOffset>>,
    pub updated_on: Option<DateTime<FixedOffset>>,
}

impl Issue {
    pub fn numbered_title(&self) -> String {
        format!("#{}: {}", self.id, self.title)
    }
}

/// An old/new value pair from a `changes` map. The values are free-form
/// JSON; repository settings can change between types.
#[derive(serde::Deserialize, Debug, Clone)]
pub struct ChangedValue {
    pub old: serde_json::Value,
    pub new: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_from_known_key() {
        insta::assert_debug_snapshot!(
            EventKind::from_key("pullrequest_comment_created"),
            @r###"
        Some(
            PullRequestCommentCreated,
        )
        "###
        );
    }

    #[test]
    fn event_kind_from_unknown_key() {
        assert_eq!(EventKind::from_key("pullrequest_superseded"), None);
        // Raw keys are only resolved after `:` normalization.
        assert_eq!(EventKind::from_key("repo:push"), None);
    }

    #[test]
    fn event_kind_key_roundtrip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_key(kind.key()), Some(kind));
        }
    }
}
