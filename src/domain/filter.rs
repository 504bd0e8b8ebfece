use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Story listings offered by the forum API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryFilter {
    #[default]
    Top,
    New,
    Best,
    Show,
    Ask,
    Job,
}

impl StoryFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryFilter::Top => "top",
            StoryFilter::New => "new",
            StoryFilter::Best => "best",
            StoryFilter::Show => "show",
            StoryFilter::Ask => "ask",
            StoryFilter::Job => "job",
        }
    }
}

/// Client-side slice of an id listing; the API has no pagination.
pub fn page<T: Clone>(ids: &[T], offset: usize, len: usize) -> Vec<T> {
    ids.iter().skip(offset).take(len).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_slices_within_bounds() {
        let ids = vec![1, 2, 3, 4, 5];
        assert_eq!(page(&ids, 1, 2), vec![2, 3]);
        assert_eq!(page(&ids, 4, 10), vec![5]);
        assert!(page(&ids, 10, 2).is_empty());
    }

    #[test]
    fn test_filter_names() {
        assert_eq!(StoryFilter::default().as_str(), "top");
        assert_eq!(StoryFilter::Job.as_str(), "job");
    }
}
