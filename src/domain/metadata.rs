use serde::{Deserialize, Serialize};

/// Preview data derived from a page's HTML. `None` means no candidate matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub favicon: Option<String>,
    pub image: Option<String>,
    pub application_name: Option<String>,
}

impl PageMetadata {
    pub fn is_empty(&self) -> bool {
        self.favicon.is_none() && self.image.is_none() && self.application_name.is_none()
    }
}
