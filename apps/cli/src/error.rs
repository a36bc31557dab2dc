//! CLI error type and exit code mapping.

use scanwise_client::ClientError;
use scanwise_core::ValidationError;
use scanwise_scanner::SessionError;

/// Everything a subcommand can fail with.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading, validation or writing failed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Bad input caught before anything was sent.
    #[error("invalid input: {0}")]
    Input(#[from] ValidationError),

    /// The analysis client failed.
    #[error("{0}")]
    Client(ClientError),

    /// The scan session could not start or acquire.
    #[error("scan error: {0}")]
    Scan(String),

    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ClientError> for CliError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Validation(v) => CliError::Input(v),
            e if e.is_config_error() => CliError::Config(e.to_string()),
            e => CliError::Client(e),
        }
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Scan(e.to_string())
    }
}

impl CliError {
    /// Process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 1    | General error                            |
    /// | 2    | Configuration error                      |
    /// | 3    | Not signed in, or the token has expired  |
    /// | 4    | Analysis service failed or unreachable   |
    /// | 5    | Scanner unavailable                      |
    /// | 10   | IO error                                 |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Client(e) if e.is_auth_error() => 3,
            Self::Client(e) if e.is_upstream() => 4,
            Self::Scan(_) => 5,
            Self::Io(_) => 10,
            Self::Input(_) | Self::Client(_) | Self::JsonSerialize(_) => 1,
        }
    }
}
