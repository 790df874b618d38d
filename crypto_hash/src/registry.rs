use crate::{HashAlgorithm, HashError, Hasher};
use std::sync::OnceLock;

/// 哈希算法的元信息
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HashMeta {
    pub algorithm: HashAlgorithm,
    pub digest_len: usize,
    pub block_len: usize,
}

impl From<HashAlgorithm> for HashMeta {
    fn from(value: HashAlgorithm) -> Self {
        Self {
            algorithm: value,
            digest_len: value.digest_len(),
            block_len: value.block_len(),
        }
    }
}

/// 可用哈希算法的注册表, 创建之后只读.
///
/// 需要共享时使用[`HashRegistry::global`], 也可以单独创建后以引用的方式传给使用者.
#[derive(Clone, Debug)]
pub struct HashRegistry {
    metas: Vec<HashMeta>,
}

impl Default for HashRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HashRegistry {
    /// 包含所有支持的算法
    pub fn new() -> Self {
        Self::with_algorithms(&HashAlgorithm::ALL)
    }

    /// 只包含`algs`中的算法
    pub fn with_algorithms(algs: &[HashAlgorithm]) -> Self {
        let mut metas: Vec<HashMeta> = algs.iter().copied().map(HashMeta::from).collect();
        metas.sort_by_key(|m| m.algorithm);
        metas.dedup();

        Self { metas }
    }

    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<HashRegistry> = OnceLock::new();
        REGISTRY.get_or_init(HashRegistry::new)
    }

    pub fn algorithms(&self) -> impl Iterator<Item = HashAlgorithm> + '_ {
        self.metas.iter().map(|m| m.algorithm)
    }

    /// 按名字查找已注册的算法
    pub fn resolve(&self, name: &str) -> Result<HashAlgorithm, HashError> {
        let alg = name.parse::<HashAlgorithm>()?;
        self.meta_of(alg).map(|m| m.algorithm)
    }

    pub fn meta(&self, name: &str) -> Result<&HashMeta, HashError> {
        let alg = name.parse::<HashAlgorithm>()?;
        self.meta_of(alg)
    }

    pub fn meta_of(&self, alg: HashAlgorithm) -> Result<&HashMeta, HashError> {
        self.metas
            .iter()
            .find(|m| m.algorithm == alg)
            .ok_or_else(|| HashError::UnsupportedAlgorithm(alg.name().to_string()))
    }

    pub fn hasher(&self, alg: HashAlgorithm) -> Result<Hasher, HashError> {
        self.meta_of(alg)?;
        Ok(Hasher::new(alg))
    }

    /// 一次性计算`data`的摘要
    pub fn digest(&self, alg: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>, HashError> {
        use crate::DigestX;

        let mut hasher = self.hasher(alg)?;
        hasher.write_x(data);
        Ok(hasher.finish_x())
    }
}

#[cfg(test)]
mod tests {
    use crate::{HashAlgorithm, HashError, HashRegistry};

    #[test]
    fn meta_lookup() {
        let reg = HashRegistry::global();
        let m = reg.meta("sha256").unwrap();
        assert_eq!((m.digest_len, m.block_len), (32, 64));
        let m = reg.meta("SHA-512").unwrap();
        assert_eq!((m.digest_len, m.block_len), (64, 128));
        assert!(matches!(
            reg.meta("whirlpool"),
            Err(HashError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn restricted_registry() {
        let reg = HashRegistry::with_algorithms(&[HashAlgorithm::Sha256, HashAlgorithm::Sha256]);
        assert_eq!(reg.algorithms().collect::<Vec<_>>(), vec![HashAlgorithm::Sha256]);
        assert_eq!(reg.resolve("sha-256"), Ok(HashAlgorithm::Sha256));
        assert_eq!(
            reg.resolve("sha1"),
            Err(HashError::UnsupportedAlgorithm("sha1".to_string()))
        );
        assert!(reg.digest(HashAlgorithm::Sha1, b"abc").is_err());
    }

    #[test]
    fn sha256_abc() {
        let d = HashRegistry::global()
            .digest(HashAlgorithm::Sha256, b"abc")
            .unwrap();
        assert_eq!(
            d,
            vec![
                0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae,
                0x22, 0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61,
                0xf2, 0x00, 0x15, 0xad
            ]
        );
    }
}
