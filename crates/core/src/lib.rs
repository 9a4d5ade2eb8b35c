//! Core business logic for memento.
//!
//! [`GalleryService`] keeps stored objects and image records paired,
//! [`FeedService`] and [`FeedRefresher`] read the feed back, and
//! [`EngagementService`] handles likes and comments.

pub mod services;

pub use services::*;
