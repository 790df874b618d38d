//! = RFC 8017
//!
//! == PKCS #1: RSA Cryptography Specification Version 2.2
//!
//! === OAEP(Optimal Asymmetric Encryption Padding)
//!
//! 只负责EME-OAEP的编码和解码, 编码结果EM的长度总是等于模数的字节长度k:
//!
//! ```txt
//!                     +----------+------+--+-------+
//!                DB = |  lHash   |  PS  |01|   M   |
//!                     +----------+------+--+-------+
//!                                    |
//!          +----------+              |
//!          |   seed   |              |
//!          +----------+              |
//!                |                   |
//!                |-------> MGF ---> xor
//!                |                   |
//!       +--+     V                   |
//!       |00|    xor <----- MGF <-----|
//!       +--+     |                   |
//!         |      |                   |
//!         V      V                   V
//!       +--+----------+----------------------------+
//! EM =  |00|maskedSeed|          maskedDB          |
//!       +--+----------+----------------------------+
//! ```

use crate::rsa::mgf::mgf1_xor;
use crate::rsa::PublicKey;
use crate::{CipherError, DefaultRand, Rand};
use crypto_hash::{HashAlgorithm, HashRegistry};
use utils::bytes::{ct_eq, ct_is_zero, ct_or_diff, ct_select_usize};
#[cfg(feature = "sec-zeroize")]
use zeroize::Zeroize;

/// OAEP编解码参数
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OAEPOptions {
    // 和消息相关联的标签, 默认为空
    label: Vec<u8>,
    // 指定seed时编码结果是确定的, 长度必须等于摘要长度
    seed: Option<Vec<u8>>,
    hash: HashAlgorithm,
    // 未指定时和`hash`相同
    mgf1_hash: Option<HashAlgorithm>,
}

impl OAEPOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按名字指定哈希算法, `mgf1_hash`为None时和`hash`相同
    pub fn from_names(hash: &str, mgf1_hash: Option<&str>) -> Result<Self, CipherError> {
        let registry = HashRegistry::global();
        let hash = registry.resolve(hash)?;
        let mgf1_hash = mgf1_hash.map(|h| registry.resolve(h)).transpose()?;
        Ok(Self {
            hash,
            mgf1_hash,
            ..Default::default()
        })
    }

    pub fn with_label(mut self, label: &[u8]) -> Self {
        self.label = label.to_vec();
        self
    }

    pub fn with_seed(mut self, seed: &[u8]) -> Self {
        self.seed = Some(seed.to_vec());
        self
    }

    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    pub fn with_mgf1_hash(mut self, hash: HashAlgorithm) -> Self {
        self.mgf1_hash = Some(hash);
        self
    }

    pub fn label(&self) -> &[u8] {
        self.label.as_slice()
    }

    pub fn seed(&self) -> Option<&[u8]> {
        self.seed.as_deref()
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn mgf1_hash(&self) -> HashAlgorithm {
        self.mgf1_hash.unwrap_or(self.hash)
    }
}

/// OAEP可编码的最大消息字节长度, 密钥太短时返回None
pub fn max_message_len(key_len: usize, hash: HashAlgorithm) -> Option<usize> {
    key_len.checked_sub((hash.digest_len() << 1) + 2)
}

/// EME-OAEP编解码. 不持有可变状态, 可以在多个线程之间共享.
#[derive(Clone, Copy, Debug)]
pub struct OAEPCodec<'a> {
    registry: &'a HashRegistry,
}

impl Default for OAEPCodec<'static> {
    fn default() -> Self {
        Self::new(HashRegistry::global())
    }
}

impl<'a> OAEPCodec<'a> {
    pub fn new(registry: &'a HashRegistry) -> Self {
        Self { registry }
    }

    fn hash_len(&self, hash: HashAlgorithm) -> Result<usize, CipherError> {
        Ok(self.registry.meta_of(hash)?.digest_len)
    }

    fn label_hash(&self, opts: &OAEPOptions) -> Result<Vec<u8>, CipherError> {
        Ok(self.registry.digest(opts.hash(), opts.label())?)
    }

    /// EME-OAEP编码, 返回`key_len()`字节的EM. 未指定seed时从`rng`中读取.
    pub fn encode<K: AsRef<PublicKey>, R: Rand>(
        &self,
        key: &K,
        msg: &[u8],
        opts: &OAEPOptions,
        rng: &mut R,
    ) -> Result<Vec<u8>, CipherError> {
        let (klen, hlen) = (key.as_ref().key_len(), self.hash_len(opts.hash())?);
        let mut mgf_hasher = self.registry.hasher(opts.mgf1_hash())?;

        let max = max_message_len(klen, opts.hash()).ok_or(CipherError::KeyTooShort {
            key_len: klen,
            min: (hlen << 1) + 2,
        })?;
        if msg.len() > max {
            return Err(CipherError::MessageTooLong {
                len: msg.len(),
                max,
            });
        }

        if let Some(seed) = opts.seed() {
            if seed.len() != hlen {
                return Err(CipherError::SeedLengthMismatch {
                    target: hlen,
                    real: seed.len(),
                });
            }
        }

        let lhash = self.label_hash(opts)?;

        // em = 0x00 || seed || db, db = lhash || ps || 0x01 || M
        let mut em = vec![0u8; klen];
        let (seed, db) = em[1..].split_at_mut(hlen);
        match opts.seed() {
            Some(s) => seed.copy_from_slice(s),
            None => rng.rand(seed),
        }

        db[..hlen].copy_from_slice(lhash.as_slice());
        let mstart = db.len() - msg.len();
        db[mstart - 1] = 0x01;
        db[mstart..].copy_from_slice(msg);

        // maskedDB = db ^ MGF(seed, k - hlen - 1)
        mgf1_xor(&mut mgf_hasher, seed, db);
        // maskedSeed = seed ^ MGF(maskedDB, hlen)
        mgf1_xor(&mut mgf_hasher, db, seed);

        Ok(em)
    }

    /// EME-OAEP解码, 返回恢复出的消息.
    ///
    /// 所有和填充格式相关的检查都会执行完, 任何一项失败都只返回[`CipherError::InvalidPadding`].
    pub fn decode<K: AsRef<PublicKey>>(
        &self,
        key: &K,
        em: &[u8],
        opts: &OAEPOptions,
    ) -> Result<Vec<u8>, CipherError> {
        let (klen, hlen) = (key.as_ref().key_len(), self.hash_len(opts.hash())?);
        let mut mgf_hasher = self.registry.hasher(opts.mgf1_hash())?;

        if em.len() != klen {
            return Err(CipherError::EncodedMessageLengthMismatch {
                target: klen,
                real: em.len(),
            });
        }

        if klen < (hlen << 1) + 2 {
            return Err(CipherError::KeyTooShort {
                key_len: klen,
                min: (hlen << 1) + 2,
            });
        }

        let lhash = self.label_hash(opts)?;

        let mut buf = em.to_vec();
        let (y, rest) = buf.split_at_mut(1);
        let (seed, db) = rest.split_at_mut(hlen);

        // seed = maskedSeed ^ MGF(maskedDB, hlen)
        mgf1_xor(&mut mgf_hasher, db, seed);
        // db = maskedDB ^ MGF(seed, k - hlen - 1)
        mgf1_xor(&mut mgf_hasher, seed, db);

        // 0xff表示出错
        let mut bad = !ct_is_zero(y[0]);
        bad |= !ct_is_zero(ct_or_diff(lhash.as_slice(), &db[..hlen]));

        // 0xff表示仍处于PS中, 遇到第一个0x01后变为0x00
        let (mut looking, mut index) = (0xffu8, 0usize);
        for (i, &x) in db[hlen..].iter().enumerate() {
            let (is_zero, is_one) = (ct_is_zero(x), ct_eq(x, 0x01));
            index = ct_select_usize(looking & is_one, i, index);
            bad |= looking & !is_zero & !is_one;
            looking &= !is_one;
        }
        // 没有找到0x01
        bad |= looking;

        let result = if std::hint::black_box(bad) != 0 {
            Err(CipherError::InvalidPadding)
        } else {
            Ok(db[(hlen + index + 1)..].to_vec())
        };

        #[cfg(feature = "sec-zeroize")]
        buf.zeroize();

        result
    }
}

/// 使用全局哈希注册表和系统随机数的OAEP编码
pub fn encode_oaep<K: AsRef<PublicKey>>(
    key: &K,
    msg: &[u8],
    opts: &OAEPOptions,
) -> Result<Vec<u8>, CipherError> {
    OAEPCodec::default().encode(key, msg, opts, &mut DefaultRand::default())
}

/// 使用全局哈希注册表的OAEP解码
pub fn decode_oaep<K: AsRef<PublicKey>>(
    key: &K,
    em: &[u8],
    opts: &OAEPOptions,
) -> Result<Vec<u8>, CipherError> {
    OAEPCodec::default().decode(key, em, opts)
}
