mod error;
pub use error::CipherError;

pub use rand::{DefaultRand, Rand, SeededRand};

pub mod rsa;
