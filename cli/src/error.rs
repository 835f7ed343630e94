use thiserror::Error;
use unistate_core::api::StateError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid seed file: {0}")]
    Seed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    // 0: success
    // 11: config error
    // 20: IO error (including unreadable seed files)
    // 30: partial sync failure
    // 50: internal/uncategorized
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 11,
            CliError::Seed(_) | CliError::Io(_) => 20,
            CliError::State(StateError::SyncPartialFailure { .. }) => 30,
            CliError::State(_) => 50,
            CliError::Anyhow(_) => 50,
        }
    }
}
