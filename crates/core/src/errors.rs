use thiserror::Error;

/// Unified error type for the entire mindstock-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Persistence / Import ────────────────────────────────────────
    #[error("Invalid document format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("CSV import failed: {0}")]
    CsvImport(String),

    // ── File I/O (native only) ──────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("No provider available for market: {0}")]
    NoProvider(String),

    #[error("Exchange rate {0} outside the accepted 800..=2000 KRW band")]
    RateOutOfRange(f64),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Holding validation failed: {0}")]
    ValidationError(String),

    #[error("Holding already exists: {0}")]
    DuplicateHolding(String),

    #[error("Holding not found: {0}")]
    HoldingNotFound(String),

    // ── Auth ────────────────────────────────────────────────────────
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Password hashing failed")]
    PasswordHash,
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Sanitize error message: strip query parameters from URLs to prevent
        // API key leakage. reqwest errors often contain full URLs with secrets.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}

impl From<jsonwebtoken::errors::Error> for CoreError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        CoreError::InvalidToken
    }
}
