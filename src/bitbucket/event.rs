//! Typed payload schemas for the webhook events, one per event kind.
//!
//! Bitbucket sends loosely structured JSON whose shape varies per event;
//! deserializing into these schemas makes a missing field an explicit error
//! that the dispatcher can surface, instead of an incidental failure deep
//! inside a formatter.
use std::collections::BTreeMap;

use super::{
    Actor, Author, ChangedValue, Comment, CommentContent, Commit, EventKind, Issue, PullRequest,
    Repository,
};

#[derive(Debug)]
pub enum BitbucketEvent {
    /// Commits were pushed to a repository.
    Push(PushPayload),
    /// Repository settings changed (name, description, website, ...).
    RepoChanged(RepoChangedPayload),
    /// The repository was forked.
    Fork(ForkPayload),
    /// A comment was posted on a commit.
    CommitComment(CommitCommentPayload),
    PullRequestCreated(PullRequestActivityPayload),
    PullRequestRejected(PullRequestActivityPayload),
    PullRequestApproved(PullRequestReviewPayload),
    PullRequestUnapproved(PullRequestReviewPayload),
    PullRequestFulfilled(PullRequestActivityPayload),
    PullRequestUpdated(PullRequestActivityPayload),
    PullRequestCommentCreated(PullRequestCommentPayload),
    PullRequestCommentUpdated(PullRequestCommentPayload),
    PullRequestCommentDeleted(PullRequestCommentDeletedPayload),
    IssueCreated(IssueCreatedPayload),
    IssueUpdated(IssueUpdatedPayload),
    IssueCommentCreated(IssueCommentPayload),
}

impl BitbucketEvent {
    /// Deserializes the request body into the schema matching `kind`.
    pub fn parse(kind: EventKind, body: &[u8]) -> anyhow::Result<Self> {
        let event = match kind {
            EventKind::RepoPush => Self::Push(serde_json::from_slice(body)?),
            EventKind::RepoChanged => Self::RepoChanged(serde_json::from_slice(body)?),
            EventKind::Fork => Self::Fork(serde_json::from_slice(body)?),
            EventKind::CommitComment => Self::CommitComment(serde_json::from_slice(body)?),
            EventKind::PullRequestCreated => {
                Self::PullRequestCreated(serde_json::from_slice(body)?)
            }
            EventKind::PullRequestRejected => {
                Self::PullRequestRejected(serde_json::from_slice(body)?)
            }
            EventKind::PullRequestApproved => {
                Self::PullRequestApproved(serde_json::from_slice(body)?)
            }
            EventKind::PullRequestUnapproved => {
                Self::PullRequestUnapproved(serde_json::from_slice(body)?)
            }
            EventKind::PullRequestFulfilled => {
                Self::PullRequestFulfilled(serde_json::from_slice(body)?)
            }
            EventKind::PullRequestUpdated => {
                Self::PullRequestUpdated(serde_json::from_slice(body)?)
            }
            EventKind::PullRequestCommentCreated => {
                Self::PullRequestCommentCreated(serde_json::from_slice(body)?)
            }
            EventKind::PullRequestCommentUpdated => {
                Self::PullRequestCommentUpdated(serde_json::from_slice(body)?)
            }
            EventKind::PullRequestCommentDeleted => {
                Self::PullRequestCommentDeleted(serde_json::from_slice(body)?)
            }
            EventKind::IssueCreated => Self::IssueCreated(serde_json::from_slice(body)?),
            EventKind::IssueUpdated => Self::IssueUpdated(serde_json::from_slice(body)?),
            EventKind::IssueCommentCreated => {
                Self::IssueCommentCreated(serde_json::from_slice(body)?)
            }
        };
        Ok(event)
    }
}

#[derive(serde::Deserialize, Debug)]
pub struct PushPayload {
    pub actor: Actor,
    pub repository: Repository,
    pub push: PushInfo,
}

#[derive(serde::Deserialize, Debug)]
pub struct PushInfo {
    pub changes: Vec<Changeset>,
}

#[derive(serde::Deserialize, Debug)]
pub struct Changeset {
    pub commits: Vec<Commit>,
}

#[derive(serde::Deserialize, Debug)]
pub struct RepoChangedPayload {
    pub actor: Actor,
    pub repository: Repository,
    /// Changed setting name to old/new value pair, in key order.
    pub changes: BTreeMap<String, ChangedValue>,
}

#[derive(serde::Deserialize, Debug)]
pub struct ForkPayload {
    pub actor: Actor,
    pub repository: Repository,
    pub fork: Repository,
}

#[derive(serde::Deserialize, Debug)]
pub struct CommitCommentPayload {
    pub actor: Actor,
    pub repository: Repository,
    pub comment: CommitCommentInfo,
}

#[derive(serde::Deserialize, Debug)]
pub struct CommitCommentInfo {
    pub content: CommentContent,
    pub commit: Commit,
}

/// Payload of the pull-request lifecycle events that speak in the voice of
/// the pull request's author (created, rejected, fulfilled, updated).
#[derive(serde::Deserialize, Debug)]
pub struct PullRequestActivityPayload {
    pub pullrequest: PullRequest,
}

/// Payload of approval events; the acting user and timestamp live in the
/// `approval` object, not in the pull request itself.
#[derive(serde::Deserialize, Debug)]
pub struct PullRequestReviewPayload {
    pub approval: Approval,
    pub pullrequest: PullRequest,
}

#[derive(serde::Deserialize, Debug)]
pub struct Approval {
    pub user: Author,
    pub date: Option<chrono::DateTime<chrono::FixedOffset>>,
}

#[derive(serde::Deserialize, Debug)]
pub struct PullRequestCommentPayload {
    pub comment: Comment,
    pub pullrequest: PullRequest,
}

/// Comment deletion is attributed to the top-level actor; the comment's own
/// `user` is whoever wrote it, which may differ.
#[derive(serde::Deserialize, Debug)]
pub struct PullRequestCommentDeletedPayload {
    pub actor: Author,
    pub comment: Comment,
    pub pullrequest: PullRequest,
}

#[derive(serde::Deserialize, Debug)]
pub struct IssueCreatedPayload {
    pub issue: Issue,
}

#[derive(serde::Deserialize, Debug)]
pub struct IssueUpdatedPayload {
    pub actor: Author,
    pub issue: Issue,
    pub changes: IssueChanges,
}

#[derive(serde::Deserialize, Debug)]
pub struct IssueChanges {
    pub status: ChangedValue,
}

#[derive(serde::Deserialize, Debug)]
pub struct IssueCommentPayload {
    pub comment: Comment,
    pub issue: Issue,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::load_test_file;

    #[test]
    fn parse_push() {
        let body = load_test_file("webhook/repo-push.json");
        let event = BitbucketEvent::parse(EventKind::RepoPush, body.as_bytes()).unwrap();
        let BitbucketEvent::Push(payload) = event else {
            panic!("expected a push event");
        };
        assert_eq!(payload.repository.full_name, "teamsinspace/documentation");
        assert_eq!(payload.push.changes.len(), 1);
        assert_eq!(payload.push.changes[0].commits.len(), 3);
    }

    #[test]
    fn parse_pull_request_created() {
        let body = load_test_file("webhook/pullrequest-created.json");
        let event =
            BitbucketEvent::parse(EventKind::PullRequestCreated, body.as_bytes()).unwrap();
        let BitbucketEvent::PullRequestCreated(payload) = event else {
            panic!("expected a pull request event");
        };
        let pr = &payload.pullrequest;
        assert_eq!(pr.id, 7);
        assert_eq!(pr.author.as_ref().unwrap().username, "emmap1");
        assert_eq!(pr.source.branch.name, "feature/attachment-cards");
        assert_eq!(pr.destination.branch.name, "main");
        assert!(pr.links.decline.is_some());
        assert!(pr.links.this.is_some());
    }

    #[test]
    fn parse_issue_updated_changes() {
        let body = load_test_file("webhook/issue-updated.json");
        let event = BitbucketEvent::parse(EventKind::IssueUpdated, body.as_bytes()).unwrap();
        let BitbucketEvent::IssueUpdated(payload) = event else {
            panic!("expected an issue event");
        };
        assert_eq!(payload.changes.status.old, "new");
        assert_eq!(payload.changes.status.new, "resolved");
    }

    #[test]
    fn parse_with_missing_resource_fails() {
        // An approval event without the `approval` object must not parse.
        let body = load_test_file("webhook/pullrequest-created.json");
        let error =
            BitbucketEvent::parse(EventKind::PullRequestApproved, body.as_bytes()).unwrap_err();
        assert!(error.to_string().contains("approval"));
    }
}
