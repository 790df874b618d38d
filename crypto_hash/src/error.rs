use std::{error::Error, fmt::Display};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HashError {
    /// 未注册或者不认识的哈希算法名
    UnsupportedAlgorithm(String),
}

impl Display for HashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashError::UnsupportedAlgorithm(name) => {
                f.write_fmt(format_args!("unsupported hash algorithm `{name}`"))
            }
        }
    }
}

impl Error for HashError {}
