//! Repositories wrapping the record store.

mod comment;
mod gallery;
mod image;
mod like;

pub use comment::CommentRepository;
pub use gallery::GalleryRepository;
pub use image::ImageRepository;
pub use like::LikeRepository;
