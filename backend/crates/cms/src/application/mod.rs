//! Application Layer

pub mod landing;
pub mod news;

pub use landing::LandingUseCase;
pub use news::{NewsInput, NewsUpdate, NewsUseCase};
