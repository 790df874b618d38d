use crypto_hash::HashError;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CipherError {
    /// 密钥生成参数不合法
    #[error("rsa: invalid key generation parameter, {0}")]
    Configuration(String),

    #[error("unsupported hash algorithm `{0}`")]
    UnsupportedAlgorithm(String),

    #[error("rsa-oaep: message length `{len}` exceeds the maximum `{max}`")]
    MessageTooLong { len: usize, max: usize },

    #[error("rsa-oaep: seed length `{real}` not match to the digest length `{target}`")]
    SeedLengthMismatch { target: usize, real: usize },

    #[error("rsa-oaep: encoded message length `{real}` not match to the key length `{target}`")]
    EncodedMessageLengthMismatch { target: usize, real: usize },

    #[error("rsa-oaep: key length `{key_len}` bytes is shorter than the minimum `{min}` bytes")]
    KeyTooShort { key_len: usize, min: usize },

    /// 解码失败时不区分具体原因
    #[error("rsa-oaep: decoding error")]
    InvalidPadding,

    #[error("rsa: invalid public key, {0}")]
    InvalidPublicKey(String),

    #[error("rsa: invalid private key, {0}")]
    InvalidPrivateKey(String),
}

impl From<HashError> for CipherError {
    fn from(value: HashError) -> Self {
        match value {
            HashError::UnsupportedAlgorithm(name) => Self::UnsupportedAlgorithm(name),
        }
    }
}
