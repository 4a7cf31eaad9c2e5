//! Application Layer

pub mod articles;
pub mod chat;
pub mod config;

pub use articles::{ArticleInput, ArticleUpdate, ArticlesUseCase};
pub use chat::{ChatAnswer, ChatUseCase, SourceArticle};
pub use config::LibrarianConfig;
