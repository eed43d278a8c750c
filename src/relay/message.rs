//! Output model consumed by the chat delivery system.
use chrono::{DateTime, FixedOffset};
use url::Url;

/// A single notification message.
///
/// Repository-level events (push, fork, settings changes, commit comments)
/// put their body inside the attachment and leave `text` empty; pull-request
/// and issue events set `text` and use the attachment as a title card.
#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
    #[serde(rename = "parseUrls")]
    pub parse_urls: bool,
    pub color: String,
}

/// A display card bound to one author (or title), link and timestamp.
#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct Attachment {
    pub author_name: String,
    pub author_link: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_icon: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<DateTime<FixedOffset>>,
}

impl Attachment {
    /// Title card of a pull request or issue: name and link, no avatar.
    pub fn title_card(author_name: String, author_link: Url) -> Self {
        Self {
            author_name,
            author_link,
            author_icon: None,
            text: None,
            ts: None,
        }
    }

    pub fn with_ts(mut self, ts: Option<DateTime<FixedOffset>>) -> Self {
        self.ts = ts;
        self
    }
}

/// What the relay hands back to the caller: either a message to deliver or
/// an error value. Ignored events are reported as errors too; a disabled
/// event and an unknown one produce the same response.
#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookResponse {
    Content(ChatMessage),
    Error(ErrorBody),
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl WebhookResponse {
    pub fn error(message: String) -> Self {
        Self::Error(ErrorBody {
            success: false,
            message,
        })
    }
}
