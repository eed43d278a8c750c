//! The relay itself: takes an incoming webhook request (headers + body) and
//! produces the response value handed back to the caller.
use axum::http::HeaderMap;

use crate::bitbucket::{BitbucketEvent, EventKind, EVENT_KEY_HEADER};
use crate::config::RelayConfig;

pub mod format;
pub mod message;

pub use message::WebhookResponse;

/// Message of the response returned for anything the relay does not act on:
/// a missing event header, an unknown event key or a disabled event type.
pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong before processing started or the \
     handling of this type of trigger is not implemented. Please consider to disable the trigger \
     or send a bug report.";

/// Everything the dispatcher needs, fixed at startup.
#[derive(Debug, Clone)]
pub struct RelayContext {
    config: RelayConfig,
}

impl RelayContext {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Handles one webhook delivery. Fully synchronous, no side effects beyond
/// the returned value; every failure mode is a value, never a panic.
pub fn handle_webhook(ctx: &RelayContext, headers: &HeaderMap, body: &[u8]) -> WebhookResponse {
    let Some(key) = headers.get(EVENT_KEY_HEADER).and_then(|v| v.to_str().ok()) else {
        tracing::debug!("Request without an {EVENT_KEY_HEADER} header");
        return WebhookResponse::error(DEFAULT_ERROR_MESSAGE.to_string());
    };

    // `repo:push` -> `repo_push`; only the first `:` separates the scope.
    let key = key.replacen(':', "_", 1);
    let Some(kind) = EventKind::from_key(&key) else {
        tracing::debug!("Ignoring unknown event type {key:?}");
        return WebhookResponse::error(DEFAULT_ERROR_MESSAGE.to_string());
    };

    if !ctx.config.notifications.is_enabled(kind) {
        tracing::debug!("Notifications for {kind} are disabled");
        return WebhookResponse::error(DEFAULT_ERROR_MESSAGE.to_string());
    }

    match process_event(ctx, kind, body) {
        Ok(response) => response,
        Err(error) => {
            tracing::error!("Cannot process {kind} event: {error:?}");
            WebhookResponse::error(error.to_string())
        }
    }
}

fn process_event(
    ctx: &RelayContext,
    kind: EventKind,
    body: &[u8],
) -> anyhow::Result<WebhookResponse> {
    let event = BitbucketEvent::parse(kind, body)?;
    let message = format::render(&event, &ctx.config)?;
    Ok(WebhookResponse::Content(message))
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};

    use super::message::{ChatMessage, ErrorBody};
    use super::*;
    use crate::tests::load_test_file;

    fn headers_with_key(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(EVENT_KEY_HEADER, HeaderValue::from_str(key).unwrap());
        headers
    }

    fn dispatch(ctx: &RelayContext, key: &str, body: &str) -> WebhookResponse {
        handle_webhook(ctx, &headers_with_key(key), body.as_bytes())
    }

    /// Raw event key and the fixture holding a well-formed payload for it.
    const SAMPLES: [(&str, &str); 16] = [
        ("repo:push", "webhook/repo-push.json"),
        ("changes", "webhook/repo-changes.json"),
        ("fork", "webhook/fork.json"),
        ("comment", "webhook/commit-comment.json"),
        ("pullrequest:created", "webhook/pullrequest-created.json"),
        ("pullrequest:rejected", "webhook/pullrequest-rejected.json"),
        ("pullrequest:approved", "webhook/pullrequest-approved.json"),
        ("pullrequest:unapproved", "webhook/pullrequest-approved.json"),
        ("pullrequest:fulfilled", "webhook/pullrequest-fulfilled.json"),
        ("pullrequest:updated", "webhook/pullrequest-updated.json"),
        (
            "pullrequest:comment_created",
            "webhook/pullrequest-comment.json",
        ),
        (
            "pullrequest:comment_updated",
            "webhook/pullrequest-comment.json",
        ),
        (
            "pullrequest:comment_deleted",
            "webhook/pullrequest-comment.json",
        ),
        ("issue:created", "webhook/issue-created.json"),
        ("issue:updated", "webhook/issue-updated.json"),
        ("issue:comment_created", "webhook/issue-comment-created.json"),
    ];

    fn expect_content(response: WebhookResponse) -> ChatMessage {
        match response {
            WebhookResponse::Content(message) => message,
            WebhookResponse::Error(error) => panic!("unexpected error response: {error:?}"),
        }
    }

    fn expect_error(response: WebhookResponse) -> ErrorBody {
        match response {
            WebhookResponse::Error(error) => error,
            WebhookResponse::Content(message) => {
                panic!("unexpected content response: {message:?}")
            }
        }
    }

    #[test]
    fn every_enabled_event_produces_a_message() {
        let ctx = RelayContext::new(RelayConfig::default());
        for (key, fixture) in SAMPLES {
            let message = expect_content(dispatch(&ctx, key, &load_test_file(fixture)));
            assert!(!message.parse_urls, "{key}: parseUrls must stay false");
            assert_eq!(message.attachments.len(), 1, "{key}");
            assert!(is_hex_color(&message.color), "{key}: {}", message.color);
        }
    }

    #[test]
    fn missing_event_header_is_ignored() {
        let ctx = RelayContext::new(RelayConfig::default());
        let response = handle_webhook(&ctx, &HeaderMap::new(), b"{}");
        let error = expect_error(response);
        assert!(!error.success);
        assert_eq!(error.message, DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn unknown_event_key_is_ignored() {
        let ctx = RelayContext::new(RelayConfig::default());
        let error = expect_error(dispatch(&ctx, "repo:transfer", "{}"));
        assert_eq!(error.message, DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn disabled_event_never_reaches_the_formatter() {
        let mut config = RelayConfig::default();
        config
            .notifications
            .set_enabled(crate::bitbucket::EventKind::RepoPush, false);
        let ctx = RelayContext::new(config);

        // The body is not even valid JSON. If parsing or formatting ran,
        // the message would carry a parse error instead of the default one.
        let error = expect_error(dispatch(&ctx, "repo:push", "not json at all"));
        assert!(!error.success);
        assert_eq!(error.message, DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn malformed_payload_surfaces_the_parse_error() {
        let ctx = RelayContext::new(RelayConfig::default());
        let error = expect_error(dispatch(&ctx, "pullrequest:created", r#"{"actor": {}}"#));
        assert!(!error.success);
        assert!(
            error.message.contains("pullrequest"),
            "message should name the missing field: {}",
            error.message
        );
    }

    #[test]
    fn configured_color_is_normalized_onto_messages() {
        let config = RelayConfig {
            color: "1f6feb".to_string(),
            ..RelayConfig::default()
        };
        let ctx = RelayContext::new(config);
        let message = expect_content(dispatch(
            &ctx,
            "repo:push",
            &load_test_file("webhook/repo-push.json"),
        ));
        assert_eq!(message.color, "#1f6feb");
    }

    fn is_hex_color(color: &str) -> bool {
        let Some(hex) = color.strip_prefix('#') else {
            return false;
        };
        hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
    }
}
