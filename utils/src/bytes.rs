//! 字节串工具.
//!
//! 以`ct_`开头的函数不含依赖于数据的分支, 返回的掩码只取`0x00`或`0xff`.

/// dst[i] ^= mask[i], 两者长度应当相同
pub fn xor_in_place(dst: &mut [u8], mask: &[u8]) {
    debug_assert_eq!(dst.len(), mask.len());
    dst.iter_mut().zip(mask.iter()).for_each(|(a, &b)| *a ^= b);
}

/// x == 0时返回0xff, 否则返回0x00
#[inline]
pub fn ct_is_zero(x: u8) -> u8 {
    let x = x as u32;
    // x != 0 时, x | -x 的最高位必然为1
    let nonzero = (x | x.wrapping_neg()) >> 31;
    (nonzero as u8).wrapping_sub(1)
}

/// a == b时返回0xff, 否则返回0x00
#[inline]
pub fn ct_eq(a: u8, b: u8) -> u8 {
    ct_is_zero(a ^ b)
}

/// 把所有字节的差异累加到一个字节上, 两者相等时返回0. 总会遍历完公共长度, 不会提前返回.
pub fn ct_or_diff(a: &[u8], b: &[u8]) -> u8 {
    a.iter().zip(b.iter()).fold(0u8, |acc, (&x, &y)| acc | (x ^ y))
}

/// mask为0xff时选择a, 为0x00时选择b
#[inline]
pub fn ct_select_usize(mask: u8, a: usize, b: usize) -> usize {
    let m = ((mask & 1) as usize).wrapping_neg();
    (a & m) | (b & !m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_bytes() {
        let mut a = [0x0fu8, 0xf0, 0xaa, 0x55];
        xor_in_place(&mut a, &[0xff, 0xff, 0xaa, 0x00]);
        assert_eq!(a, [0xf0, 0x0f, 0x00, 0x55]);
    }

    #[test]
    fn masks() {
        for x in 0..=255u8 {
            assert_eq!(ct_is_zero(x), if x == 0 { 0xff } else { 0x00 }, "ct_is_zero({x})");
            assert_eq!(ct_eq(x, 0x01), if x == 1 { 0xff } else { 0x00 });
        }

        assert_eq!(ct_or_diff(b"abc", b"abc"), 0);
        assert_ne!(ct_or_diff(b"abc", b"abd"), 0);
        assert_eq!(ct_select_usize(0xff, 7, 9), 7);
        assert_eq!(ct_select_usize(0x00, 7, 9), 9);
    }
}
