use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProductivityError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage quota exceeded while saving '{key}' ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("Storage is disabled")]
    StorageDisabled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid JSON document: {0}")]
    ImportParse(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for ProductivityError {
    fn from(err: anyhow::Error) -> Self {
        ProductivityError::Unknown(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_message_names_the_key() {
        let err = ProductivityError::QuotaExceeded {
            key: "emails".to_string(),
            needed: 10,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Storage quota exceeded while saving 'emails' (10 bytes, 2 available)"
        );
    }

    #[test]
    fn test_from_anyhow_maps_to_unknown() {
        let err: ProductivityError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, ProductivityError::Unknown(ref m) if m == "boom"));
    }
}
