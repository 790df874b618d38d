use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use rand::Rand;
use std::borrow::Borrow;
use std::ops::Deref;

pub struct BigUintExt<T: Borrow<BigUint>>(pub T);

impl<T: Borrow<BigUint>> Deref for BigUintExt<T> {
    type Target = BigUint;
    fn deref(&self) -> &Self::Target {
        self.0.borrow()
    }
}

/// Handbook of Applied Cryptography, Table 4.4: 对于位长度为`bits`的随机奇数, 按照返回的轮数做Miller-Rabin测试,
/// 误判为素数的概率不超过$2^{-80}$.
pub fn miller_rabin_rounds(bits: u64) -> usize {
    match bits {
        0..=100 => 27,
        101..=150 => 18,
        151..=200 => 15,
        201..=250 => 12,
        251..=300 => 9,
        301..=350 => 8,
        351..=400 => 7,
        401..=500 => 6,
        501..=600 => 5,
        601..=800 => 4,
        801..=1250 => 3,
        _ => 2,
    }
}

impl<T: Borrow<BigUint>> BigUintExt<T> {
    /// <<算法导论>>
    /// 定理31.23: 若有d=gcd(a, n), 假设对于某些整数x'和y', 有d=ax'+ny'. 如果d|b, 则方程
    /// ax=b(mod n)有一个解的值位x0, 则x0=x'(b/d) mod n;
    /// self * inv = 1 \mod modules
    pub fn modinv(&self, modulus: &BigUint) -> Option<BigUint> {
        if modulus.is_zero() {
            return None;
        }

        let (a, n) = (
            BigInt::from(self.deref() % modulus),
            BigInt::from(modulus.clone()),
        );
        let g = a.extended_gcd(&n);
        if g.gcd.is_one() {
            g.x.mod_floor(&n).to_biguint()
        } else {
            None
        }
    }

    /// 生成[0..self)之间的随机数, self为0时返回0
    pub fn gen_random<R: Rand>(&self, rng: &mut R) -> BigUint {
        let bits = self.bits();
        if bits == 0 {
            return BigUint::zero();
        }

        loop {
            let r = Self::random_bits(bits, rng);
            if self.deref() > &r {
                return r;
            }
        }
    }

    /// 生成[0, 2^bits)之间均匀分布的随机数
    pub fn random_bits<R: Rand>(bits: u64, rng: &mut R) -> BigUint {
        let len = ((bits + 7) >> 3) as usize;
        let mut buf = vec![0u8; len];
        rng.rand(buf.as_mut_slice());

        // 大端序, 多出来的高位在第一个字节
        let excess = (len as u64) * 8 - bits;
        if let Some(first) = buf.first_mut() {
            *first &= 0xffu8 >> excess;
        }

        BigUint::from_bytes_be(buf.as_slice())
    }

    /// 用小素数试除, 返回`self`是否有一个不等于自身的小素数因子
    pub fn has_small_factor(&self) -> bool {
        const PRIMES_A: u64 = 3 * 5 * 7 * 11 * 13 * 17 * 19 * 23 * 29 * 31 * 37 * 41 * 43 * 47 * 53;
        const PRIMES_B: u64 = 59 * 61 * 67 * 71 * 73 * 79 * 83 * 89 * 97 * 101;
        const FACTORS_A: [u64; 15] = [3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53];
        const FACTORS_B: [u64; 10] = [59, 61, 67, 71, 73, 79, 83, 89, 97, 101];

        if self.bits() <= 7 {
            return false;
        }

        if self.is_even() {
            return true;
        }

        let (ra, rb) = (
            (self.deref() % PRIMES_A).to_u64().unwrap_or(1),
            (self.deref() % PRIMES_B).to_u64().unwrap_or(1),
        );

        FACTORS_A.iter().any(|&f| ra % f == 0) || FACTORS_B.iter().any(|&f| rb % f == 0)
    }

    /// Miller-Rabin概率素数测试.
    ///
    /// `test_rounds`表示测试轮数, 对于任意大于2的奇数, 单轮误判的概率至多为$\frac{1}{4}$,
    /// 见[`miller_rabin_rounds`]按位长度选择的轮数.
    pub fn probably_prime_test<R: Rand>(&self, test_rounds: usize, rng: &mut R) -> bool {
        const PRIME_BIT_MASK: u128 = 1 << 2
            | 1 << 3
            | 1 << 5
            | 1 << 7
            | 1 << 11
            | 1 << 13
            | 1 << 17
            | 1 << 19
            | 1 << 23
            | 1 << 29
            | 1 << 31
            | 1 << 37
            | 1 << 41
            | 1 << 43
            | 1 << 47
            | 1 << 53
            | 1 << 59
            | 1 << 61
            | 1 << 67
            | 1 << 71
            | 1 << 73
            | 1 << 79
            | 1 << 83
            | 1 << 89
            | 1 << 97
            | 1 << 101
            | 1 << 103
            | 1 << 107
            | 1 << 109
            | 1 << 113
            | 1 << 127;

        if self.bits() <= 7 {
            // 小于128的数直接查表
            let x = self.to_u32().unwrap_or(0);
            return ((1u128 << x) & PRIME_BIT_MASK) != 0;
        }

        if self.has_small_factor() {
            return false;
        }

        self.prime_validate_by_miller_rabin(test_rounds.max(1), rng)
    }

    /// 判断`n`是否是合数, n-1 = 2^s * r, a是在[2,n-1)之间随机选择的见证数.
    fn miller_rabin_witness(&self, s: u64, r: &BigUint, n_m1: &BigUint, a: &BigUint) -> bool {
        let n = self.deref();
        let mut y = a.modpow(r, n);

        for _ in 0..s {
            let y2 = (&y * &y) % n;
            if y2.is_one() && !y.is_one() && (&y != n_m1) {
                return true;
            }

            y = y2;
        }

        !y.is_one()
    }

    /// note: 内部调用函数, self是大于3的奇数, t>0
    fn prime_validate_by_miller_rabin<R: Rand>(&self, t: usize, rng: &mut R) -> bool {
        let n_m1 = self.deref() - 1u32;
        let s = n_m1.trailing_zeros().unwrap_or(0);
        let r = &n_m1 >> s;
        // a = 2 + [0, n-3)
        let range = BigUintExt(self.deref() - 3u32);

        for _ in 0..t {
            let a = range.gen_random(rng) + 2u32;
            if self.miller_rabin_witness(s, &r, &n_m1, &a) {
                return false;
            }
        }

        true
    }
}
