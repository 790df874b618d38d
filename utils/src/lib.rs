mod biguint_ext;
pub use biguint_ext::{miller_rabin_rounds, BigUintExt};

pub mod bytes;
