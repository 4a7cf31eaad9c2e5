//! Application Layer

pub mod config;
pub mod intake;
pub mod pipeline;

pub use config::CrmConfig;
pub use intake::{IntakeUseCase, RegistrationInput};
pub use pipeline::{PipelineUseCase, RegistrationDetail, RegistrationStats};
