use thiserror::Error;

#[derive(Error, Debug)]
pub enum WhoisError {
    #[error("Unsupported address kind: {0} (email addresses are not supported)")]
    UnsupportedAddressKind(String),

    #[error("No whois server is known for this kind of object: {0}")]
    NoServerKnown(String),

    #[error("Lookup timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    IoError(#[from] tokio::io::Error),

    #[error("Proxy error: {0}")]
    ProxyError(#[from] tokio_socks::Error),

    #[error("Invalid server: {0}")]
    InvalidServer(String),

    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl From<tokio::time::error::Elapsed> for WhoisError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        WhoisError::Timeout
    }
}

impl WhoisError {
    /// Short machine-friendly label, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            WhoisError::UnsupportedAddressKind(_) => "unsupported_address_kind",
            WhoisError::NoServerKnown(_) => "no_server_known",
            WhoisError::Timeout => "timeout",
            WhoisError::IoError(_) | WhoisError::ProxyError(_) => "transport_error",
            WhoisError::InvalidServer(_)
            | WhoisError::InvalidProxy(_)
            | WhoisError::InvalidBindAddress(_)
            | WhoisError::UnknownEncoding(_) => "invalid_option",
            WhoisError::ConfigError(_) => "config_error",
        }
    }
}
