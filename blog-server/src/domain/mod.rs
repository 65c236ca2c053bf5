pub mod comment;
pub mod error;
pub mod feed;
pub mod follow;
pub mod group;
pub mod pagination;
pub mod post;
pub mod user;
pub mod viewer;
