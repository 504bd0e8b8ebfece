use chrono::{DateTime, TimeZone, Utc};
use html_escape::decode_html_entities;
use serde::{Deserialize, Serialize};

/// Ids are assigned by the forum; -1 marks a placeholder row.
pub type ItemId = i64;

pub const PLACEHOLDER_ID: ItemId = -1;

/// Fields shared by every item variant. Which ones are present depends on
/// the variant, hence the options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemFields {
    pub id: ItemId,
    #[serde(default)]
    pub by: Option<String>,
    /// Creation instant, unix seconds.
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub descendants: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    /// Entity-encoded HTML.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub kids: Vec<ItemId>,
    #[serde(default)]
    pub parent: Option<ItemId>,
    #[serde(default)]
    pub parts: Vec<ItemId>,
    #[serde(default)]
    pub poll: Option<ItemId>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub dead: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ForumItem {
    Story(ItemFields),
    Job(ItemFields),
    Poll(ItemFields),
    #[serde(rename = "pollopt")]
    PollOpt(ItemFields),
    Comment(ItemFields),
}

impl ForumItem {
    pub fn fields(&self) -> &ItemFields {
        match self {
            ForumItem::Story(f)
            | ForumItem::Job(f)
            | ForumItem::Poll(f)
            | ForumItem::PollOpt(f)
            | ForumItem::Comment(f) => f,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ForumItem::Story(_) => "story",
            ForumItem::Job(_) => "job",
            ForumItem::Poll(_) => "poll",
            ForumItem::PollOpt(_) => "pollopt",
            ForumItem::Comment(_) => "comment",
        }
    }

    pub fn id(&self) -> ItemId {
        self.fields().id
    }

    pub fn parent(&self) -> Option<ItemId> {
        self.fields().parent
    }

    pub fn kids(&self) -> &[ItemId] {
        &self.fields().kids
    }

    pub fn url(&self) -> Option<&str> {
        self.fields().url.as_deref()
    }

    /// Stories (ask stories included) and polls terminate an ancestor chain.
    pub fn is_root(&self) -> bool {
        matches!(self, ForumItem::Story(_) | ForumItem::Poll(_))
    }

    /// An "Ask" post is a story without an external link.
    pub fn is_ask(&self) -> bool {
        matches!(self, ForumItem::Story(f) if f.url.is_none())
    }

    /// Fetched fine, but the content is withheld.
    pub fn is_tombstone(&self) -> bool {
        let f = self.fields();
        f.deleted || f.dead
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.fields()
            .time
            .and_then(|t| Utc.timestamp_opt(t, 0).single())
    }

    pub fn display_title(&self) -> String {
        self.fields()
            .title
            .as_deref()
            .map(|t| decode_html_entities(t).to_string())
            .unwrap_or_else(|| "(Untitled)".to_string())
    }

    /// Body text with entities decoded; empty for tombstones.
    pub fn display_text(&self) -> String {
        if self.is_tombstone() {
            return String::new();
        }
        self.fields()
            .text
            .as_deref()
            .map(|t| decode_html_entities(t).to_string())
            .unwrap_or_default()
    }
}
