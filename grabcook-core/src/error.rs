use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Could not reach the server: {0}")]
    Network(String),

    #[error("API returned error: {status} - {detail}")]
    Status { status: u16, detail: String },

    #[error("Failed to parse response: {0}")]
    InvalidResponse(String),

    #[error("Not authenticated")]
    Unauthenticated,
}

impl ApiError {
    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupted entry for key {key}: {message}")]
    Corrupted { key: String, message: String },

    #[error("Failed to serialize entry for key {key}: {message}")]
    Serialize { key: String, message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("Dozwolone formaty: JPEG, PNG, WebP")]
    UnsupportedType,

    #[error("Plik jest za duży (maks. 1 MB)")]
    TooLarge { size: usize },

    #[error("Wymiary obrazu nie mogą przekraczać 2048x2048 px")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("Nie udało się odczytać obrazu")]
    Unreadable(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Hasła nie są identyczne")]
    PasswordMismatch,
}
