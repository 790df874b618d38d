//! 哈希算法的统一入口.
//!
//! 摘要计算由RustCrypto的`sha1`/`sha2`提供, 这里只负责按名字查找算法, 以及给上层提供统一的流式接口.

use digest::DynDigest;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::str::FromStr;

mod error;
pub use error::HashError;

mod registry;
pub use registry::{HashMeta, HashRegistry};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashAlgorithm {
    #[default]
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 7] = [
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Sha512_224,
        Self::Sha512_256,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Sha512_224 => "sha512/224",
            Self::Sha512_256 => "sha512/256",
        }
    }

    /// 摘要的字节长度
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha224 | Self::Sha512_224 => 28,
            Self::Sha256 | Self::Sha512_256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// 压缩函数每次处理的块字节长度
    pub const fn block_len(&self) -> usize {
        match self {
            Self::Sha1 | Self::Sha224 | Self::Sha256 => 64,
            _ => 128,
        }
    }

    fn new_digest(&self) -> Box<dyn DynDigest> {
        match self {
            Self::Sha1 => Box::<sha1::Sha1>::default(),
            Self::Sha224 => Box::<sha2::Sha224>::default(),
            Self::Sha256 => Box::<sha2::Sha256>::default(),
            Self::Sha384 => Box::<sha2::Sha384>::default(),
            Self::Sha512 => Box::<sha2::Sha512>::default(),
            Self::Sha512_224 => Box::<sha2::Sha512_224>::default(),
            Self::Sha512_256 => Box::<sha2::Sha512_256>::default(),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    /// 不区分大小写, 允许`sha-256`, `SHA256`, `sha512-256`这类写法
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('-', "");
        let name = match name.as_str() {
            "sha512224" => "sha512/224",
            "sha512256" => "sha512/256",
            x => x,
        };

        Self::ALL
            .iter()
            .find(|alg| alg.name() == name)
            .copied()
            .ok_or_else(|| HashError::UnsupportedAlgorithm(s.to_string()))
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 运行时才确定具体算法的哈希接口
pub trait DigestX: Write {
    fn block_bits_x(&self) -> usize;
    fn digest_bits_x(&self) -> usize;
    fn write_x(&mut self, data: &[u8]);
    /// 输出摘要并重置到初始状态
    fn finish_x(&mut self) -> Vec<u8>;
    fn reset_x(&mut self);
}

/// 流式哈希计算, 通过[`HashRegistry::hasher`]创建
pub struct Hasher {
    alg: HashAlgorithm,
    inner: Box<dyn DynDigest>,
}

impl Hasher {
    pub(crate) fn new(alg: HashAlgorithm) -> Self {
        Self {
            alg,
            inner: alg.new_digest(),
        }
    }
}

impl Clone for Hasher {
    fn clone(&self) -> Self {
        Self {
            alg: self.alg,
            inner: self.inner.box_clone(),
        }
    }
}

impl Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl DigestX for Hasher {
    fn block_bits_x(&self) -> usize {
        self.alg.block_len() << 3
    }

    fn digest_bits_x(&self) -> usize {
        self.inner.output_size() << 3
    }

    fn write_x(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    fn finish_x(&mut self) -> Vec<u8> {
        self.inner.finalize_reset().into_vec()
    }

    fn reset_x(&mut self) {
        self.inner.reset();
    }
}

#[cfg(test)]
mod tests {
    use crate::{DigestX, HashAlgorithm, HashError, HashRegistry};
    use std::io::Write;

    #[test]
    fn parse_names() {
        let cases = [
            ("sha1", HashAlgorithm::Sha1),
            ("SHA-1", HashAlgorithm::Sha1),
            ("sha256", HashAlgorithm::Sha256),
            ("Sha-384", HashAlgorithm::Sha384),
            ("sha512/256", HashAlgorithm::Sha512_256),
            ("sha512-224", HashAlgorithm::Sha512_224),
        ];
        for (s, alg) in cases {
            assert_eq!(s.parse::<HashAlgorithm>(), Ok(alg), "parse `{s}`");
        }

        assert_eq!(
            "md5".parse::<HashAlgorithm>(),
            Err(HashError::UnsupportedAlgorithm("md5".to_string()))
        );
    }

    #[test]
    fn hasher_stream() {
        let reg = HashRegistry::new();
        let mut h = reg.hasher(HashAlgorithm::Sha1).unwrap();
        h.write_all(b"a").unwrap();
        h.write_x(b"bc");
        let d = h.finish_x();
        assert_eq!(
            d,
            vec![
                0xa9, 0x99, 0x3e, 0x36, 0x47, 0x06, 0x81, 0x6a, 0xba, 0x3e, 0x25, 0x71, 0x78, 0x50,
                0xc2, 0x6c, 0x9c, 0xd0, 0xd8, 0x9d
            ]
        );
        assert_eq!(h.digest_bits_x(), 160);
        assert_eq!(h.block_bits_x(), 512);

        // finish_x之后回到初始状态
        h.write_x(b"abc");
        assert_eq!(h.finish_x(), d);
    }

    #[test]
    fn digest_len_matches_output() {
        let reg = HashRegistry::new();
        for alg in HashAlgorithm::ALL {
            let d = reg.digest(alg, b"").unwrap();
            assert_eq!(d.len(), alg.digest_len(), "{alg}");
        }
    }
}
