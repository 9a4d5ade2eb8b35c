//! Business logic services.

#![allow(missing_docs)]

pub mod engagement;
pub mod feed;
pub mod gallery;
pub mod refresh;
pub mod voter_token;

pub use engagement::{CommentInput, EngagementService, LikeState};
pub use feed::{FeedEntry, FeedRefresher, FeedService, FeedSnapshot};
pub use gallery::{
    AppendOutcome, CreatedGallery, DeleteGalleryOutcome, DeleteImageOutcome, FilePayload,
    GalleryService,
};
pub use refresh::RefreshTrigger;
pub use voter_token::VoterTokenStore;
