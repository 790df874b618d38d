//! MGF1, RFC 8017 B.2.1
//!
//! mask = Hash(seed || C0) || Hash(seed || C1) || ..., 截断到需要的长度, C为4字节大端计数器.

use crate::CipherError;
use crypto_hash::{DigestX, HashAlgorithm, HashRegistry};
use utils::bytes::xor_in_place;
#[cfg(feature = "sec-zeroize")]
use zeroize::Zeroize;

/// 生成`mask_len`字节的掩码
pub fn mgf1(
    registry: &HashRegistry,
    hash: HashAlgorithm,
    seed: &[u8],
    mask_len: usize,
) -> Result<Vec<u8>, CipherError> {
    let mut hasher = registry.hasher(hash)?;
    let mut mask = vec![0u8; mask_len];
    mgf1_xor(&mut hasher, seed, mask.as_mut_slice());
    Ok(mask)
}

/// 按名字选择哈希算法, 使用全局注册表
pub fn mgf1_with_name(seed: &[u8], mask_len: usize, hash: &str) -> Result<Vec<u8>, CipherError> {
    let registry = HashRegistry::global();
    let alg = registry.resolve(hash)?;
    mgf1(registry, alg, seed, mask_len)
}

/// out ^= MGF1(seed, out.len())
pub(crate) fn mgf1_xor<H: DigestX>(hasher: &mut H, seed: &[u8], out: &mut [u8]) {
    let hlen = hasher.digest_bits_x() >> 3;

    hasher.reset_x();
    for (cnt, block) in out.chunks_mut(hlen).enumerate() {
        hasher.write_x(seed);
        hasher.write_x(&(cnt as u32).to_be_bytes());
        let mut digest = hasher.finish_x();
        xor_and_wipe(block, digest.as_mut_slice());
    }
}

/// block ^= digest, 之后清除digest. 解码时掩码和明文等价.
fn xor_and_wipe(block: &mut [u8], digest: &mut [u8]) {
    xor_in_place(block, &digest[..block.len()]);
    #[cfg(feature = "sec-zeroize")]
    digest.zeroize();
}
