//! 参考RFC 8017, 3.1 RSA public key / 3.2 RSA private key
use crate::CipherError;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use utils::BigUintExt;

#[derive(Clone, Debug, PartialOrd, PartialEq, Ord, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    // n = p * q
    n: BigUint,
    // public exponent, gcd(e, (p-1)(q-1)) = 1
    e: BigUint,
}

/// 两个素因子的私钥, 附带CRT参数
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKey {
    pk: PublicKey,
    // d * e = 1 % (p-1)(q-1)
    d: BigUint,
    // p > q
    p: BigUint,
    q: BigUint,
    // d % (p - 1)
    d_p: BigUint,
    // d % (q - 1)
    d_q: BigUint,
    // q^{-1} % p
    q_inv: BigUint,
}

impl PublicKey {
    /// n: RSA modulus
    /// e: public key exponent
    /// note: not to check the `n` and `exp` are right RSA parameters
    pub fn new_uncheck(n: BigUint, exp: BigUint) -> Self {
        Self { e: exp, n }
    }

    /// note: not to check the `n` and `exp` are right RSA parameters
    pub fn from_be_bytes(n: &[u8], exp: &[u8]) -> Self {
        Self {
            e: BigUint::from_bytes_be(exp),
            n: BigUint::from_bytes_be(n),
        }
    }

    /// n
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// e
    pub fn exponent(&self) -> &BigUint {
        &self.e
    }

    /// 模数的位长度
    pub fn bits(&self) -> u64 {
        self.n.bits()
    }

    /// 模数的字节长度k, $2^{(k-1)*8} \le n \lt 2^{k*8}$
    pub fn key_len(&self) -> usize {
        ((self.n.bits() + 7) >> 3) as usize
    }

    pub fn is_valid(&self) -> Result<(), CipherError> {
        if self.e <= BigUint::from(2u8) {
            Err(CipherError::InvalidPublicKey(format!(
                "public exponent {:#x} is too small",
                self.e
            )))
        } else if self.e.is_even() {
            Err(CipherError::InvalidPublicKey(format!(
                "public exponent {:#x} is even",
                self.e
            )))
        } else if self.e >= self.n {
            Err(CipherError::InvalidPublicKey(format!(
                "public exponent {:#x} is not less than the modulus",
                self.e
            )))
        } else {
            Ok(())
        }
    }
}

impl PrivateKey {
    /// 由两个素数和公钥指数计算私钥, `p`和`q`的顺序无关, 内部总是保持`p > q`.
    ///
    /// note: 不检查`p`和`q`是否为素数
    pub fn from_primes(p: BigUint, q: BigUint, e: BigUint) -> Result<Self, CipherError> {
        if p <= BigUint::one() || q <= BigUint::one() || p == q {
            return Err(CipherError::InvalidPrivateKey(
                "prime factors must be distinct and greater than 1".to_string(),
            ));
        }

        let phi = (&p - 1u32) * (&q - 1u32);
        let d = BigUintExt(&e).modinv(&phi).ok_or_else(|| {
            CipherError::InvalidPrivateKey(format!(
                "public exponent {:#x} is not invertible modulo phi",
                e
            ))
        })?;

        let n = &p * &q;
        Self::with_exponent(PublicKey::new_uncheck(n, e), d, p, q)
    }

    /// 已知私钥指数`d`时计算CRT参数
    pub(crate) fn with_exponent(
        pk: PublicKey,
        d: BigUint,
        p: BigUint,
        q: BigUint,
    ) -> Result<Self, CipherError> {
        let (p, q) = if p < q { (q, p) } else { (p, q) };
        let (p1, q1) = (&p - 1u32, &q - 1u32);
        Self::from_parts(pk, d, p, q, &p1, &q1)
    }

    /// p > q, p1 = p - 1, q1 = q - 1
    pub(crate) fn from_parts(
        pk: PublicKey,
        d: BigUint,
        p: BigUint,
        q: BigUint,
        p1: &BigUint,
        q1: &BigUint,
    ) -> Result<Self, CipherError> {
        let q_inv = BigUintExt(&q).modinv(&p).ok_or_else(|| {
            CipherError::InvalidPrivateKey("prime factors are not coprime".to_string())
        })?;

        let (d_p, d_q) = (&d % p1, &d % q1);

        Ok(Self {
            pk,
            d,
            p,
            q,
            d_p,
            d_q,
            q_inv,
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    /// d
    pub fn private_exponent(&self) -> &BigUint {
        &self.d
    }

    /// (p, q), p > q
    pub fn primes(&self) -> (&BigUint, &BigUint) {
        (&self.p, &self.q)
    }

    /// (dP, dQ)
    pub fn crt_exponents(&self) -> (&BigUint, &BigUint) {
        (&self.d_p, &self.d_q)
    }

    /// qInv
    pub fn crt_coefficient(&self) -> &BigUint {
        &self.q_inv
    }

    pub fn key_len(&self) -> usize {
        self.pk.key_len()
    }

    pub fn is_valid(&self) -> Result<(), CipherError> {
        self.pk.is_valid()?;

        let one = BigUint::one();
        if self.p <= one || self.q <= one {
            return Err(CipherError::InvalidPrivateKey(
                "invalid prime value".to_string(),
            ));
        }

        if &self.p * &self.q != self.pk.n {
            return Err(CipherError::InvalidPrivateKey(
                "invalid modulus".to_string(),
            ));
        }

        // d*e
        let de = &self.d * &self.pk.e;
        let (p1, q1) = (&self.p - 1u32, &self.q - 1u32);
        for pm1 in [&p1, &q1] {
            if !(&de % pm1).is_one() {
                return Err(CipherError::InvalidPrivateKey(
                    "invalid exponent".to_string(),
                ));
            }
        }

        if self.d_p != &self.d % &p1 || self.d_q != &self.d % &q1 {
            return Err(CipherError::InvalidPrivateKey(
                "invalid crt exponent".to_string(),
            ));
        }

        let t = (&self.q * &self.q_inv) % &self.p;
        if !t.is_one() || self.q_inv.is_zero() {
            return Err(CipherError::InvalidPrivateKey(
                "invalid crt coefficient".to_string(),
            ));
        }

        Ok(())
    }
}

impl AsRef<PublicKey> for PublicKey {
    fn as_ref(&self) -> &PublicKey {
        self
    }
}

impl AsRef<PublicKey> for PrivateKey {
    fn as_ref(&self) -> &PublicKey {
        &self.pk
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{n={:#x}, e={:#x}}}", self.n, self.e)
    }
}

impl Display for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{pk: {}, p: {} bits, q: {} bits}}",
            self.pk,
            self.p.bits(),
            self.q.bits()
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::rsa::{PrivateKey, PublicKey};
    use crate::CipherError;
    use num_bigint::BigUint;
    use num_traits::Num;

    fn gnu_tls_primes() -> (BigUint, BigUint) {
        (
            BigUint::from_str_radix("16775196964030542637", 10).unwrap(),
            BigUint::from_str_radix("17328218193455850539", 10).unwrap(),
        )
    }

    #[test]
    fn gnu_tls_key() {
        let n = BigUint::from_str_radix("290684273230919398108010081414538931343", 10).unwrap();
        let e = BigUint::from(65537u32);
        let d = BigUint::from_str_radix("31877380284581499213530787347443987241", 10).unwrap();
        let (p, q) = gnu_tls_primes();

        let key = PrivateKey::from_primes(p.clone(), q.clone(), e.clone()).unwrap();
        key.is_valid().unwrap();
        assert_eq!(&e, key.public_key().exponent());
        assert_eq!(&n, key.public_key().modulus());
        assert_eq!(&d, key.private_exponent());
        // p > q
        assert_eq!(key.primes(), (&q, &p));
        assert_eq!(
            key.crt_exponents(),
            (
                &BigUint::from(5953575675756372531u64),
                &BigUint::from(6585730849558903085u64)
            )
        );
        assert_eq!(key.key_len(), 16);
    }

    #[test]
    fn order_independent() {
        let (p, q) = gnu_tls_primes();
        let e = BigUint::from(65537u32);
        let k1 = PrivateKey::from_primes(p.clone(), q.clone(), e.clone()).unwrap();
        let k2 = PrivateKey::from_primes(q, p, e).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn invalid_keys() {
        let (p, q) = gnu_tls_primes();
        assert!(matches!(
            PrivateKey::from_primes(p.clone(), p.clone(), BigUint::from(3u32)),
            Err(CipherError::InvalidPrivateKey(_))
        ));

        // e = 2 has no inverse modulo an even phi
        assert!(PrivateKey::from_primes(p.clone(), q.clone(), BigUint::from(2u32)).is_err());

        let n = &p * &q;
        for e in [1u32, 2, 4, 65536] {
            let pk = PublicKey::new_uncheck(n.clone(), BigUint::from(e));
            assert!(pk.is_valid().is_err(), "e = {e}");
        }
        assert!(PublicKey::new_uncheck(n, BigUint::from(65537u32))
            .is_valid()
            .is_ok());
    }

    #[test]
    fn key_len() {
        let pk = PublicKey::from_be_bytes(&[0x01, 0x00, 0x01], &[0x03]);
        assert_eq!(pk.bits(), 17);
        assert_eq!(pk.key_len(), 3);
        let pk = PublicKey::from_be_bytes(&[0xff; 256], &[0x01, 0x00, 0x01]);
        assert_eq!(pk.key_len(), 256);
    }

    #[test]
    fn serde_round_trip() {
        let (p, q) = gnu_tls_primes();
        let key = PrivateKey::from_primes(p, q, BigUint::from(65537u32)).unwrap();
        let s = serde_json::to_string(&key).unwrap();
        let key2: PrivateKey = serde_json::from_str(&s).unwrap();
        assert_eq!(key, key2);
        key2.is_valid().unwrap();
    }
}
