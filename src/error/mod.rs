use thiserror::Error;

/// Coarse classification of a fetch failure, used by the dashboard to pick
/// the message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    UnknownSymbol,
    EmptyData,
    Malformed,
    InvalidInput,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error for {symbol}: {message}")]
    Network { symbol: String, message: String },

    #[error("unknown symbol {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("no price data for {symbol}")]
    EmptyData { symbol: String },

    #[error("malformed response for {symbol}: {message}")]
    Malformed { symbol: String, message: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Network { .. } => ErrorKind::Network,
            FetchError::UnknownSymbol { .. } => ErrorKind::UnknownSymbol,
            FetchError::EmptyData { .. } => ErrorKind::EmptyData,
            FetchError::Malformed { .. } => ErrorKind::Malformed,
            FetchError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    pub fn network(symbol: &str, message: impl Into<String>) -> Self {
        FetchError::Network { symbol: symbol.to_string(), message: message.into() }
    }

    pub fn malformed(symbol: &str, message: impl Into<String>) -> Self {
        FetchError::Malformed { symbol: symbol.to_string(), message: message.into() }
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;
