//! Domain error types.

/// Top-level error type for folio.
#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("ledger error in {source_name}: {reason}")]
    Ledger { source_name: String, reason: String },

    #[error("invalid ledger entry {symbol}: {reason}")]
    LedgerInvalid { symbol: String, reason: String },

    #[error("quote error for {symbol}: {reason}")]
    Quote { symbol: String, reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&FolioError> for std::process::ExitCode {
    fn from(err: &FolioError) -> Self {
        let code: u8 = match err {
            FolioError::Io(_) => 1,
            FolioError::ConfigParse { .. }
            | FolioError::ConfigMissing { .. }
            | FolioError::ConfigInvalid { .. } => 2,
            FolioError::Ledger { .. } | FolioError::LedgerInvalid { .. } => 3,
            FolioError::Quote { .. } => 4,
            FolioError::Report { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
