//! Static relay configuration, loaded once at process start from a TOML
//! file. There is no runtime reload; changing the file requires a restart.
use std::path::Path;

use crate::bitbucket::EventKind;

/// Accent color used when none is configured (Bitbucket's dark teal).
pub const DEFAULT_COLOR: &str = "#225159";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration of the relay.
///
/// ```toml
/// color = "1f6feb"
///
/// [notifications]
/// fork = false
///
/// [links]
/// merge = false
/// ```
#[derive(serde::Deserialize, Debug, Clone)]
pub struct RelayConfig {
    /// Accent color of produced messages, with or without a leading `#`.
    #[serde(default = "default_color")]
    pub color: String,
    /// Which event types produce a notification at all.
    #[serde(default)]
    pub notifications: NotificationFilter,
    /// Which action links are appended to pull-request-created messages.
    #[serde(default)]
    pub links: ActionLinks,
}

impl RelayConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Normalized accent color: a leading `#` is stripped and re-applied so
    /// both `225159` and `#225159` configure the same color. An empty value
    /// falls back to [`DEFAULT_COLOR`].
    pub fn accent_color(&self) -> String {
        if self.color.is_empty() {
            DEFAULT_COLOR.to_string()
        } else {
            let hex = self.color.strip_prefix('#').unwrap_or(&self.color);
            format!("#{hex}")
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            color: default_color(),
            notifications: NotificationFilter::default(),
            links: ActionLinks::default(),
        }
    }
}

/// Per-event enabled flags; everything defaults to enabled.
#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct NotificationFilter {
    pub repo_push: bool,
    pub changes: bool,
    pub fork: bool,
    pub comment: bool,
    pub pullrequest_created: bool,
    pub pullrequest_rejected: bool,
    pub pullrequest_approved: bool,
    pub pullrequest_unapproved: bool,
    pub pullrequest_fulfilled: bool,
    pub pullrequest_updated: bool,
    pub pullrequest_comment_created: bool,
    pub pullrequest_comment_updated: bool,
    pub pullrequest_comment_deleted: bool,
    pub issue_created: bool,
    pub issue_updated: bool,
    pub issue_comment_created: bool,
}

impl NotificationFilter {
    pub fn is_enabled(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::RepoPush => self.repo_push,
            EventKind::RepoChanged => self.changes,
            EventKind::Fork => self.fork,
            EventKind::CommitComment => self.comment,
            EventKind::PullRequestCreated => self.pullrequest_created,
            EventKind::PullRequestRejected => self.pullrequest_rejected,
            EventKind::PullRequestApproved => self.pullrequest_approved,
            EventKind::PullRequestUnapproved => self.pullrequest_unapproved,
            EventKind::PullRequestFulfilled => self.pullrequest_fulfilled,
            EventKind::PullRequestUpdated => self.pullrequest_updated,
            EventKind::PullRequestCommentCreated => self.pullrequest_comment_created,
            EventKind::PullRequestCommentUpdated => self.pullrequest_comment_updated,
            EventKind::PullRequestCommentDeleted => self.pullrequest_comment_deleted,
            EventKind::IssueCreated => self.issue_created,
            EventKind::IssueUpdated => self.issue_updated,
            EventKind::IssueCommentCreated => self.issue_comment_created,
        }
    }

    /// Disables a single event kind; used by tests and kept symmetrical
    /// with [`Self::is_enabled`].
    pub fn set_enabled(&mut self, kind: EventKind, enabled: bool) {
        match kind {
            EventKind::RepoPush => self.repo_push = enabled,
            EventKind::RepoChanged => self.changes = enabled,
            EventKind::Fork => self.fork = enabled,
            EventKind::CommitComment => self.comment = enabled,
            EventKind::PullRequestCreated => self.pullrequest_created = enabled,
            EventKind::PullRequestRejected => self.pullrequest_rejected = enabled,
            EventKind::PullRequestApproved => self.pullrequest_approved = enabled,
            EventKind::PullRequestUnapproved => self.pullrequest_unapproved = enabled,
            EventKind::PullRequestFulfilled => self.pullrequest_fulfilled = enabled,
            EventKind::PullRequestUpdated => self.pullrequest_updated = enabled,
            EventKind::PullRequestCommentCreated => self.pullrequest_comment_created = enabled,
            EventKind::PullRequestCommentUpdated => self.pullrequest_comment_updated = enabled,
            EventKind::PullRequestCommentDeleted => self.pullrequest_comment_deleted = enabled,
            EventKind::IssueCreated => self.issue_created = enabled,
            EventKind::IssueUpdated => self.issue_updated = enabled,
            EventKind::IssueCommentCreated => self.issue_comment_created = enabled,
        }
    }
}

impl Default for NotificationFilter {
    fn default() -> Self {
        Self {
            repo_push: true,
            changes: true,
            fork: true,
            comment: true,
            pullrequest_created: true,
            pullrequest_rejected: true,
            pullrequest_approved: true,
            pullrequest_unapproved: true,
            pullrequest_fulfilled: true,
            pullrequest_updated: true,
            pullrequest_comment_created: true,
            pullrequest_comment_updated: true,
            pullrequest_comment_deleted: true,
            issue_created: true,
            issue_updated: true,
            issue_comment_created: true,
        }
    }
}

/// Visibility of the action links on `pullrequest_created` messages. The
/// rendered order (decline, approve, merge, commits, comments) is fixed.
#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ActionLinks {
    pub decline: bool,
    pub approve: bool,
    pub merge: bool,
    pub commits: bool,
    pub comments: bool,
}

impl Default for ActionLinks {
    fn default() -> Self {
        Self {
            decline: true,
            approve: true,
            merge: true,
            commits: true,
            comments: true,
        }
    }
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}
