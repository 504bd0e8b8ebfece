use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ItemId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumUser {
    /// Case-sensitive username.
    pub id: String,
    #[serde(default)]
    pub about: Option<String>,
    pub created: i64,
    #[serde(default)]
    pub karma: i64,
    #[serde(default)]
    pub submitted: Vec<ItemId>,
}

impl ForumUser {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.created, 0).single()
    }
}
