//! RSA
//!
//! - 随机选择两个质数$p$和$q$($p\neq q$), 则模数$n=p*q$. 模数的字节长度$k$满足: $2^{((k-1)*8}\le n \lt 2^{k*8}$;
//! - 选择公钥指数$e$, 满足和$p-1$及$q-1$都是互质关系(公共因子是1);
//! - 那么私钥的指数部分$d$满足: $d*e-1$能被$q-1$和$p-1$整除;
//!
//! 这里只包含密钥对生成和OAEP填充, 不包含模幂运算本身.
//!

mod key;
pub use key::{PrivateKey, PublicKey};

mod keygen;
pub use keygen::{
    generate_key_pair, generate_key_pair_with_rng, CandidateState, KeyGenOptions,
    KeyGenerationState, Phase,
};

mod mgf;
pub use mgf::{mgf1, mgf1_with_name};

mod oaep;
pub use oaep::{decode_oaep, encode_oaep, max_message_len, OAEPCodec, OAEPOptions};
