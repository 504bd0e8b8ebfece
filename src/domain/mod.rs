pub mod filter;
pub mod item;
pub mod metadata;
pub mod user;

pub use filter::{page, StoryFilter};
pub use item::{ForumItem, ItemFields, ItemId, PLACEHOLDER_ID};
pub use metadata::PageMetadata;
pub use user::ForumUser;
