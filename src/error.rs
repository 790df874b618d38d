use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RsaKitError {
    #[error("Invalid key file `{path}`: {reason}")]
    InvalidKeyFile { path: String, reason: String },

    #[error("Invalid config `{key}`: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("Key generation stopped before the key pair was ready")]
    KeyGenIncomplete,
}
