//! One pure formatter per event type.
//!
//! Every formatter turns a typed payload into a [`ChatMessage`] with exactly
//! one attachment. Repository events render into the attachment body, the
//! pull-request and issue events into the message text with the attachment
//! acting as a title card. The wording and markdown here is load-bearing:
//! the delivery side renders it verbatim.
use std::borrow::Cow;

use anyhow::Context;
use chrono::{DateTime, FixedOffset};

use crate::bitbucket::event::{
    BitbucketEvent, CommitCommentPayload, ForkPayload, IssueCommentPayload, IssueCreatedPayload,
    IssueUpdatedPayload, PullRequestActivityPayload, PullRequestCommentDeletedPayload,
    PullRequestCommentPayload, PullRequestReviewPayload, PushPayload, RepoChangedPayload,
};
use crate::bitbucket::{Actor, Link, PullRequest, Repository};
use crate::config::RelayConfig;
use crate::relay::message::{Attachment, ChatMessage};

/// Formats an already-parsed event into a chat message.
pub fn render(event: &BitbucketEvent, config: &RelayConfig) -> anyhow::Result<ChatMessage> {
    let color = config.accent_color();
    match event {
        BitbucketEvent::Push(payload) => push(payload, color),
        BitbucketEvent::RepoChanged(payload) => repo_changed(payload, color),
        BitbucketEvent::Fork(payload) => fork(payload, color),
        BitbucketEvent::CommitComment(payload) => commit_comment(payload, color),
        BitbucketEvent::PullRequestCreated(payload) => {
            pull_request_created(payload, config, color)
        }
        BitbucketEvent::PullRequestRejected(payload) => pull_request_rejected(payload, color),
        BitbucketEvent::PullRequestApproved(payload) => {
            pull_request_review(payload, "approved", "APPROVED", color)
        }
        BitbucketEvent::PullRequestUnapproved(payload) => {
            pull_request_review(payload, "unapproved", "UNAPPROVED", color)
        }
        BitbucketEvent::PullRequestFulfilled(payload) => pull_request_fulfilled(payload, color),
        BitbucketEvent::PullRequestUpdated(payload) => pull_request_updated(payload, color),
        BitbucketEvent::PullRequestCommentCreated(payload) => {
            pull_request_comment_created(payload, color)
        }
        BitbucketEvent::PullRequestCommentUpdated(payload) => {
            pull_request_comment_updated(payload, color)
        }
        BitbucketEvent::PullRequestCommentDeleted(payload) => {
            pull_request_comment_deleted(payload, color)
        }
        BitbucketEvent::IssueCreated(payload) => issue_created(payload, color),
        BitbucketEvent::IssueUpdated(payload) => issue_updated(payload, color),
        BitbucketEvent::IssueCommentCreated(payload) => issue_comment_created(payload, color),
    }
}

fn push(payload: &PushPayload, color: String) -> anyhow::Result<ChatMessage> {
    let changeset = payload
        .push
        .changes
        .first()
        .context("push event has no changesets")?;
    let first_commit = changeset
        .commits
        .first()
        .context("push changeset has no commits")?;

    let mut text = repository_header(&payload.repository);
    for commit in &changeset.commits {
        text.push_str(&format!(
            "*Pushed* [{}]({}): {}",
            short_hash(&commit.hash),
            commit.links.html.href,
            commit.message
        ));
    }

    Ok(attachment_message(
        author_card(&payload.actor, text, first_commit.date),
        color,
    ))
}

fn repo_changed(payload: &RepoChangedPayload, color: String) -> anyhow::Result<ChatMessage> {
    let mut text = repository_header(&payload.repository);
    for (name, change) in &payload.changes {
        text.push_str(&format!("*Changed* [{name}]\n"));
        text.push_str(&format!("\tOld Value: {}\n", value_text(&change.old)));
        text.push_str(&format!("\tNew Value: {}\n", value_text(&change.new)));
    }

    Ok(attachment_message(
        author_card(&payload.actor, text, None),
        color,
    ))
}

fn fork(payload: &ForkPayload, color: String) -> anyhow::Result<ChatMessage> {
    let mut text = repository_header(&payload.repository);
    text.push_str(&format!(
        "*Forked* to [{}]({})\n",
        payload.fork.full_name, payload.fork.links.html.href
    ));

    Ok(attachment_message(
        author_card(&payload.actor, text, None),
        color,
    ))
}

fn commit_comment(payload: &CommitCommentPayload, color: String) -> anyhow::Result<ChatMessage> {
    let mut text = repository_header(&payload.repository);
    text.push_str(&format!(
        "*Commented* [{}]({}): {}\n",
        short_hash(&payload.comment.commit.hash),
        payload.comment.commit.links.html.href,
        payload.comment.content.raw
    ));

    Ok(attachment_message(
        author_card(&payload.actor, text, None),
        color,
    ))
}

fn pull_request_created(
    payload: &PullRequestActivityPayload,
    config: &RelayConfig,
    color: String,
) -> anyhow::Result<ChatMessage> {
    let pr = &payload.pullrequest;
    let author = pr.author.as_ref().context("pull request author missing")?;

    let mut text = format!(
        "{} _(@{})_ *opened* a new pull request:\n",
        author.display_name, author.username
    );
    text.push_str(&branch_pair(pr));
    text.push_str("Description:\n");
    text.push_str(&pr.description);
    text.push('\n');

    // The rendered order of the action links is fixed; the config only
    // controls which of them appear.
    let mut actions = String::from("Actions:");
    if config.links.decline {
        actions.push_str(&action_link("decline", &pr.links.decline, "decline")?);
    }
    if config.links.approve {
        actions.push_str(&action_link("approve", &pr.links.approve, "approve")?);
    }
    if config.links.merge {
        actions.push_str(&action_link("merge", &pr.links.merge, "merge")?);
    }
    if config.links.commits {
        actions.push_str(&action_link("view commits", &pr.links.commits, "commits")?);
    }
    if config.links.comments {
        actions.push_str(&action_link(
            "view comments",
            &pr.links.comments,
            "comments",
        )?);
    }
    if actions != "Actions:" {
        text.push_str(&actions);
    }

    let attachment = Attachment::title_card(
        format!("#{} - {}", pr.id, pr.title),
        require_link(&pr.links.this, "self")?.href.clone(),
    );
    Ok(text_message(text, attachment, color))
}

fn pull_request_rejected(
    payload: &PullRequestActivityPayload,
    color: String,
) -> anyhow::Result<ChatMessage> {
    let pr = &payload.pullrequest;
    let author = pr.author.as_ref().context("pull request author missing")?;

    let mut text = format!(
        "{} _(@{})_ *declined* a pull request:\n",
        author.display_name, author.username
    );
    text.push_str(&branch_pair(pr));
    text.push_str("Reason:\n");
    text.push_str(&pr.reason);
    text.push('\n');

    let attachment = Attachment::title_card(
        format!("DECLINED: {}", pr.numbered_title()),
        require_link(&pr.links.html, "html")?.href.clone(),
    )
    .with_ts(pr.updated_on);
    Ok(text_message(text, attachment, color))
}

fn pull_request_review(
    payload: &PullRequestReviewPayload,
    verb: &str,
    label: &str,
    color: String,
) -> anyhow::Result<ChatMessage> {
    let pr = &payload.pullrequest;
    let reviewer = &payload.approval.user;

    let mut text = format!(
        "{} _(@{})_ *{verb}* a pull request:\n",
        reviewer.display_name, reviewer.username
    );
    text.push_str(&branch_pair(pr));

    let attachment = Attachment::title_card(
        format!("{label}: {}", pr.numbered_title()),
        require_link(&pr.links.html, "html")?.href.clone(),
    )
    .with_ts(payload.approval.date);
    Ok(text_message(text, attachment, color))
}

fn pull_request_fulfilled(
    payload: &PullRequestActivityPayload,
    color: String,
) -> anyhow::Result<ChatMessage> {
    let pr = &payload.pullrequest;
    let author = pr.author.as_ref().context("pull request author missing")?;

    let mut text = format!(
        "{} _(@{})_ *merged* a pull request:\n",
        author.display_name, author.username
    );
    text.push_str(&branch_pair(pr));
    if !pr.description.is_empty() {
        text.push_str("Description:\n");
        text.push_str(&pr.description);
        text.push('\n');
    }

    let attachment = Attachment::title_card(
        format!("MERGED: {}", pr.numbered_title()),
        require_link(&pr.links.html, "html")?.href.clone(),
    )
    .with_ts(pr.updated_on);
    Ok(text_message(text, attachment, color))
}

fn pull_request_updated(
    payload: &PullRequestActivityPayload,
    color: String,
) -> anyhow::Result<ChatMessage> {
    let pr = &payload.pullrequest;
    let author = pr.author.as_ref().context("pull request author missing")?;

    let mut text = format!(
        "{} _(@{})_ *updated* a pull request:\n",
        author.display_name, author.username
    );
    text.push_str(&format!(
        "{} => {}\n",
        pr.source.branch.name, pr.destination.branch.name
    ));

    let attachment = Attachment::title_card(
        format!("UPDATED: {}", pr.numbered_title()),
        require_link(&pr.links.html, "html")?.href.clone(),
    )
    .with_ts(pr.updated_on);
    Ok(text_message(text, attachment, color))
}

fn pull_request_comment_created(
    payload: &PullRequestCommentPayload,
    color: String,
) -> anyhow::Result<ChatMessage> {
    let author = &payload.comment.user;
    let text = format!(
        "{} _(@{})_ *commented* on a pull request:\n{}\n",
        author.display_name, author.username, payload.comment.content.raw
    );
    let attachment = pull_request_title_card(&payload.pullrequest)?
        .with_ts(payload.comment.created_on);
    Ok(text_message(text, attachment, color))
}

fn pull_request_comment_updated(
    payload: &PullRequestCommentPayload,
    color: String,
) -> anyhow::Result<ChatMessage> {
    let author = &payload.comment.user;
    let text = format!(
        "{} _(@{})_  *updated a comment* on a pull request:\n{}\n",
        author.display_name, author.username, payload.comment.content.raw
    );
    let attachment = pull_request_title_card(&payload.pullrequest)?
        .with_ts(payload.comment.updated_on);
    Ok(text_message(text, attachment, color))
}

fn pull_request_comment_deleted(
    payload: &PullRequestCommentDeletedPayload,
    color: String,
) -> anyhow::Result<ChatMessage> {
    let text = format!(
        "{} _(@{})_  *deleted a comment* on a pull request:\n{}\n",
        payload.actor.display_name, payload.actor.username, payload.comment.content.raw
    );
    let attachment = pull_request_title_card(&payload.pullrequest)?
        .with_ts(payload.comment.updated_on);
    Ok(text_message(text, attachment, color))
}

fn issue_created(payload: &IssueCreatedPayload, color: String) -> anyhow::Result<ChatMessage> {
    let issue = &payload.issue;
    let reporter = issue.reporter.as_ref().context("issue reporter missing")?;

    let text = format!(
        "{} _(@{})_  *created* a _new_ issue",
        reporter.display_name, reporter.username
    );
    let attachment =
        Attachment::title_card(issue.numbered_title(), issue.links.html.href.clone())
            .with_ts(issue.created_on);
    Ok(text_message(text, attachment, color))
}

fn issue_updated(payload: &IssueUpdatedPayload, color: String) -> anyhow::Result<ChatMessage> {
    let issue = &payload.issue;
    let text = format!(
        "{} _(@{})_  *updated* an issue from _{}_ to _{}_",
        payload.actor.display_name,
        payload.actor.username,
        value_text(&payload.changes.status.old),
        value_text(&payload.changes.status.new)
    );
    let attachment =
        Attachment::title_card(issue.numbered_title(), issue.links.html.href.clone())
            .with_ts(issue.updated_on);
    Ok(text_message(text, attachment, color))
}

fn issue_comment_created(
    payload: &IssueCommentPayload,
    color: String,
) -> anyhow::Result<ChatMessage> {
    let author = &payload.comment.user;
    let issue = &payload.issue;
    let text = format!(
        "{} _(@{})_  *commented* on an issue:\n{}\n",
        author.display_name, author.username, payload.comment.content.raw
    );
    let attachment =
        Attachment::title_card(issue.numbered_title(), issue.links.html.href.clone())
            .with_ts(payload.comment.created_on);
    Ok(text_message(text, attachment, color))
}

/// First line shared by the repository-level events.
fn repository_header(repository: &Repository) -> String {
    format!(
        "On repository [{}]({}): \n",
        repository.full_name, repository.links.html.href
    )
}

/// `` `source-repo/source-branch` => `dest-repo/dest-branch` `` line used by
/// the pull-request lifecycle events.
fn branch_pair(pr: &PullRequest) -> String {
    format!(
        "`{}/{}` => `{}/{}`\n\n",
        pr.source.repository.name,
        pr.source.branch.name,
        pr.destination.repository.name,
        pr.destination.branch.name
    )
}

fn pull_request_title_card(pr: &PullRequest) -> anyhow::Result<Attachment> {
    Ok(Attachment::title_card(
        pr.numbered_title(),
        require_link(&pr.links.html, "html")?.href.clone(),
    ))
}

fn author_card(actor: &Actor, text: String, ts: Option<DateTime<FixedOffset>>) -> Attachment {
    Attachment {
        author_name: actor.display_name.clone(),
        author_link: actor.links.html.href.clone(),
        author_icon: Some(actor.links.avatar.href.clone()),
        text: Some(text),
        ts,
    }
}

fn attachment_message(attachment: Attachment, color: String) -> ChatMessage {
    ChatMessage {
        text: None,
        attachments: vec![attachment],
        parse_urls: false,
        color,
    }
}

fn text_message(text: String, attachment: Attachment, color: String) -> ChatMessage {
    ChatMessage {
        text: Some(text),
        attachments: vec![attachment],
        parse_urls: false,
        color,
    }
}

fn action_link(label: &str, link: &Option<Link>, name: &str) -> anyhow::Result<String> {
    Ok(format!(" | [{label}]({})", require_link(link, name)?.href))
}

fn require_link<'a>(link: &'a Option<Link>, name: &str) -> anyhow::Result<&'a Link> {
    link.as_ref()
        .with_context(|| format!("pull request link `{name}` missing"))
}

/// First six characters of a commit hash, as shown in the message text.
fn short_hash(hash: &str) -> &str {
    hash.get(..6).unwrap_or(hash)
}

/// Renders a free-form JSON value the way it appears in a message: strings
/// without quotes, everything else as compact JSON.
fn value_text(value: &serde_json::Value) -> Cow<'_, str> {
    match value {
        serde_json::Value::String(text) => Cow::from(text.as_str()),
        other => Cow::from(other.to_string()),
    }
}
