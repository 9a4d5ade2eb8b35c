//! Database entities.

pub mod comment;
pub mod gallery;
pub mod image;
pub mod image_like;

pub use comment::Entity as Comment;
pub use gallery::Entity as Gallery;
pub use image::Entity as Image;
pub use image_like::Entity as ImageLike;
