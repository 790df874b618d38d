//! 可分段执行的RSA密钥对生成
//!
//! 生成过程是一个显式的状态机, 每次调用[`KeyGenerationState::step`]最多运行给定的毫秒数,
//! 时间用完后返回, 调用者可以稍后继续. 时间只在两个子步骤之间检查, 一轮完整的Miller-Rabin测试不会被打断.
//!
//! ```txt
//! SearchP -> SearchQ -> OrderPQ -> ComputePhi -> CheckCoprime -> ComputeN -> Done
//!               ^                                     |             |
//!               |-------------- 丢弃q ----------------|-------------|
//! ```
//!
//! 每次搜索素数的子状态:
//!
//! ```txt
//! Draw -> TestPrimality -> CheckCoprimeWithE -> Store
//!  ^          |  ^ (+wheel delta)   |
//!  |----------|--|------------------|
//! ```

use crate::rsa::{PrivateKey, PublicKey};
use crate::{CipherError, DefaultRand, Rand};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use std::time::{Duration, Instant};
use utils::{miller_rabin_rounds, BigUintExt};

/// 30k+1出发, 依次加上这些增量可以遍历所有和30互质的数
const GCD_30_DELTA: [u32; 8] = [6, 4, 2, 4, 2, 4, 6, 2];

const MIN_KEY_BITS: usize = 512;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    SearchP,
    SearchQ,
    OrderPQ,
    ComputePhi,
    CheckCoprime,
    ComputeN,
    Done,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CandidateState {
    Draw,
    TestPrimality,
    CheckCoprimeWithE,
    Store,
}

/// 密钥生成参数
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyGenOptions {
    pub bits: usize,
    pub exponent: u64,
}

impl Default for KeyGenOptions {
    fn default() -> Self {
        Self {
            bits: 2048,
            exponent: 65537,
        }
    }
}

impl KeyGenOptions {
    pub fn new(bits: usize, exponent: u64) -> Self {
        Self { bits, exponent }
    }

    fn check(&self) -> Result<(), CipherError> {
        if self.bits < MIN_KEY_BITS || self.bits & 1 == 1 {
            Err(CipherError::Configuration(format!(
                "modulus bits `{}` must be even and not less than {}",
                self.bits, MIN_KEY_BITS
            )))
        } else if self.exponent <= 2 || self.exponent & 1 == 0 {
            Err(CipherError::Configuration(format!(
                "public exponent `{}` must be odd and greater than 2",
                self.exponent
            )))
        } else {
            Ok(())
        }
    }
}

pub struct KeyGenerationState<R: Rand = DefaultRand> {
    bits: usize,
    e: BigUint,
    rng: R,
    phase: Phase,
    candidate_state: CandidateState,
    candidate: Option<BigUint>,
    // GCD_30_DELTA的下标, 跨step保存
    delta_idx: usize,
    p: Option<BigUint>,
    q: Option<BigUint>,
    p1: Option<BigUint>,
    q1: Option<BigUint>,
    phi: Option<BigUint>,
    n: Option<BigUint>,
    keys: Option<(PublicKey, PrivateKey)>,
    // 已执行的子步骤数
    steps: u64,
}

impl KeyGenerationState<DefaultRand> {
    pub fn new(bits: usize, e: u64) -> Result<Self, CipherError> {
        Self::with_rng(KeyGenOptions::new(bits, e), DefaultRand::default())
    }
}

impl<R: Rand> KeyGenerationState<R> {
    pub fn with_rng(opts: KeyGenOptions, rng: R) -> Result<Self, CipherError> {
        opts.check()?;

        Ok(Self {
            bits: opts.bits,
            e: BigUint::from(opts.exponent),
            rng,
            phase: Phase::SearchP,
            candidate_state: CandidateState::Draw,
            candidate: None,
            delta_idx: 0,
            p: None,
            q: None,
            p1: None,
            q1: None,
            phi: None,
            n: None,
            keys: None,
            steps: 0,
        })
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn exponent(&self) -> &BigUint {
        &self.e
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn candidate_state(&self) -> CandidateState {
        self.candidate_state
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_done(&self) -> bool {
        self.keys.is_some()
    }

    pub fn keys(&self) -> Option<&(PublicKey, PrivateKey)> {
        self.keys.as_ref()
    }

    pub fn into_keys(self) -> Option<(PublicKey, PrivateKey)> {
        self.keys
    }

    /// 最多运行`max_millis`毫秒, 0表示一直运行到完成. 返回密钥对是否已经生成.
    ///
    /// 未完成时至少执行一个子步骤.
    pub fn step(&mut self, max_millis: u64) -> bool {
        let (start, budget) = (Instant::now(), Duration::from_millis(max_millis));

        while !self.is_done() {
            self.advance();
            if max_millis != 0 && start.elapsed() >= budget {
                break;
            }
        }

        self.is_done()
    }

    /// 一直运行到生成密钥对
    pub fn finish(mut self) -> (PublicKey, PrivateKey) {
        loop {
            match self.keys.take() {
                Some(keys) => return keys,
                None => self.advance(),
            }
        }
    }

    fn enter(&mut self, phase: Phase) {
        log::trace!("rsa keygen: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn target_bits(&self) -> u64 {
        let bits = if self.p.is_none() {
            self.bits - (self.bits >> 1)
        } else {
            self.bits >> 1
        };
        bits as u64
    }

    fn discard_q(&mut self, reason: &str) {
        log::debug!("rsa keygen: discard q, {}", reason);
        self.q = None;
        self.p1 = None;
        self.q1 = None;
        self.phi = None;
        self.n = None;
        self.enter(Phase::SearchQ);
    }

    fn discard_candidate(&mut self, reason: &str) {
        log::debug!("rsa keygen: discard candidate, {}", reason);
        self.candidate = None;
        self.candidate_state = CandidateState::Draw;
    }

    /// 执行一个子步骤
    fn advance(&mut self) {
        self.steps += 1;

        match self.phase {
            Phase::SearchP | Phase::SearchQ => self.search_prime(),
            Phase::OrderPQ => {
                if let (Some(p), Some(q)) = (self.p.take(), self.q.take()) {
                    let (p, q) = if p < q { (q, p) } else { (p, q) };
                    self.p = Some(p);
                    self.q = Some(q);
                    self.enter(Phase::ComputePhi);
                } else {
                    self.enter(Phase::SearchP);
                }
            }
            Phase::ComputePhi => {
                if let (Some(p), Some(q)) = (self.p.as_ref(), self.q.as_ref()) {
                    let (p1, q1) = (p - 1u32, q - 1u32);
                    self.phi = Some(&p1 * &q1);
                    self.p1 = Some(p1);
                    self.q1 = Some(q1);
                    self.enter(Phase::CheckCoprime);
                } else {
                    self.discard_q("missing prime");
                }
            }
            Phase::CheckCoprime => {
                // p和q入选时已满足gcd(x-1, e) = 1, 这里正常不会失败
                let coprime = self.phi.as_ref().map_or(false, |phi| self.e.gcd(phi).is_one());
                if coprime {
                    self.enter(Phase::ComputeN);
                } else {
                    self.discard_q("gcd(e, phi) != 1");
                }
            }
            Phase::ComputeN => {
                if let (Some(p), Some(q)) = (self.p.as_ref(), self.q.as_ref()) {
                    let n = p * q;
                    if n.bits() == self.bits as u64 {
                        self.n = Some(n);
                        self.enter(Phase::Done);
                    } else {
                        let msg = format!("modulus has {} bits", n.bits());
                        self.discard_q(msg.as_str());
                    }
                } else {
                    self.discard_q("missing prime");
                }
            }
            Phase::Done => self.build_keys(),
        }
    }

    fn search_prime(&mut self) {
        let target = self.target_bits();

        match self.candidate_state {
            CandidateState::Draw => {
                let mut num = BigUintExt::<BigUint>::random_bits(target, &mut self.rng);
                num.set_bit(target - 1, true);
                // 对齐到30k+1
                let r = &num % 30u32;
                num += 31u32;
                num -= r;

                self.delta_idx = 0;
                if num.bits() > target {
                    log::debug!("rsa keygen: candidate overflow {} bits", num.bits());
                    return;
                }

                self.candidate = Some(num);
                self.candidate_state = CandidateState::TestPrimality;
            }
            CandidateState::TestPrimality => {
                let Some(num) = self.candidate.as_mut() else {
                    self.candidate_state = CandidateState::Draw;
                    return;
                };

                let rounds = miller_rabin_rounds(target);
                if BigUintExt(&*num).probably_prime_test(rounds, &mut self.rng) {
                    self.candidate_state = CandidateState::CheckCoprimeWithE;
                } else {
                    *num += GCD_30_DELTA[self.delta_idx];
                    self.delta_idx = (self.delta_idx + 1) % GCD_30_DELTA.len();
                    if num.bits() > target {
                        self.discard_candidate("candidate overflow");
                    }
                }
            }
            CandidateState::CheckCoprimeWithE => {
                let coprime = self
                    .candidate
                    .as_ref()
                    .map_or(false, |num| (num - 1u32).gcd(&self.e).is_one());
                if coprime {
                    self.candidate_state = CandidateState::Store;
                } else {
                    self.discard_candidate("gcd(candidate - 1, e) != 1");
                }
            }
            CandidateState::Store => {
                let Some(num) = self.candidate.take() else {
                    self.candidate_state = CandidateState::Draw;
                    return;
                };
                self.candidate_state = CandidateState::Draw;

                if self.p.is_none() {
                    self.p = Some(num);
                    self.enter(Phase::SearchQ);
                } else if self.p.as_ref() == Some(&num) {
                    log::debug!("rsa keygen: discard candidate, equal to p");
                } else {
                    self.q = Some(num);
                    self.enter(Phase::OrderPQ);
                }
            }
        }
    }

    fn build_keys(&mut self) {
        let (Some(p), Some(q), Some(p1), Some(q1), Some(phi), Some(n)) = (
            self.p.as_ref(),
            self.q.as_ref(),
            self.p1.as_ref(),
            self.q1.as_ref(),
            self.phi.as_ref(),
            self.n.as_ref(),
        ) else {
            self.discard_q("incomplete state");
            return;
        };

        // gcd(e, phi) = 1已经在CheckCoprime中保证
        let Some(d) = BigUintExt(&self.e).modinv(phi) else {
            self.discard_q("e is not invertible");
            return;
        };

        let pk = PublicKey::new_uncheck(n.clone(), self.e.clone());
        match PrivateKey::from_parts(pk.clone(), d, p.clone(), q.clone(), p1, q1) {
            Ok(sk) => {
                log::debug!(
                    "rsa keygen: {} bits key generated after {} steps",
                    self.bits,
                    self.steps
                );
                self.candidate = None;
                self.p1 = None;
                self.q1 = None;
                self.phi = None;
                self.keys = Some((pk, sk));
            }
            Err(e) => {
                let msg = e.to_string();
                self.discard_q(msg.as_str());
            }
        }
    }
}

/// 生成密钥对, 使用系统随机数
pub fn generate_key_pair(bits: usize, e: u64) -> Result<(PublicKey, PrivateKey), CipherError> {
    Ok(KeyGenerationState::new(bits, e)?.finish())
}

pub fn generate_key_pair_with_rng<R: Rand>(
    opts: KeyGenOptions,
    rng: R,
) -> Result<(PublicKey, PrivateKey), CipherError> {
    Ok(KeyGenerationState::with_rng(opts, rng)?.finish())
}

#[cfg(test)]
mod tests {
    use super::{
        generate_key_pair_with_rng, CandidateState, KeyGenOptions, KeyGenerationState, Phase,
    };
    use crate::rsa::{PrivateKey, PublicKey};
    use crate::{CipherError, SeededRand};
    use num_bigint::BigUint;
    use num_integer::Integer;
    use num_traits::One;
    use utils::BigUintExt;

    fn check_key_pair(bits: usize, pk: &PublicKey, sk: &PrivateKey) {
        let (p, q) = sk.primes();
        let e = pk.exponent();
        let phi = (p - 1u32) * (q - 1u32);

        assert_eq!(pk.bits(), bits as u64);
        assert!(p > q);
        assert_eq!(&(p * q), pk.modulus());
        assert!(e.gcd(&phi).is_one());
        assert!(((e * sk.private_exponent()) % &phi).is_one());

        let mut rng = SeededRand::new(bits as u64);
        assert!(BigUintExt(p).probably_prime_test(40, &mut rng));
        assert!(BigUintExt(q).probably_prime_test(40, &mut rng));
        sk.is_valid().unwrap();
    }

    fn bounded_steps(bits: usize) {
        let mut state = KeyGenerationState::new(bits, 65537).unwrap();
        assert_eq!(state.phase(), Phase::SearchP);

        let mut calls = 0;
        while !state.step(5) {
            calls += 1;
        }
        assert_eq!(state.phase(), Phase::Done);
        assert!(state.steps() > calls);

        let (pk, sk) = state.into_keys().unwrap();
        check_key_pair(bits, &pk, &sk);
    }

    #[test]
    fn key_pair_512() {
        bounded_steps(512);
    }

    #[test]
    fn key_pair_1024() {
        bounded_steps(1024);
    }

    #[test]
    fn key_pair_2048() {
        bounded_steps(2048);
    }

    #[test]
    fn resumable() {
        for (bits, seed) in [(512, 1u64), (512, 2), (1024, 3)] {
            let opts = KeyGenOptions::new(bits, 65537);

            let mut once = KeyGenerationState::with_rng(opts, SeededRand::new(seed)).unwrap();
            assert!(once.step(0));

            let mut many = KeyGenerationState::with_rng(opts, SeededRand::new(seed)).unwrap();
            while !many.step(5) {}

            assert_eq!(once.steps(), many.steps());
            assert_eq!(once.keys(), many.keys());

            let finished = generate_key_pair_with_rng(opts, SeededRand::new(seed)).unwrap();
            assert_eq!(once.into_keys(), Some(finished));
        }
    }

    #[test]
    fn candidate_alignment() {
        let opts = KeyGenOptions::new(512, 3);
        let mut state = KeyGenerationState::with_rng(opts, SeededRand::new(11)).unwrap();

        while state.candidate_state() != CandidateState::TestPrimality {
            state.advance();
        }
        let c = state.candidate.clone().unwrap();
        assert_eq!(&c % 30u32, BigUint::one());
        assert_eq!(c.bits(), 256);

        // 单个子步骤也会推进
        let steps = state.steps();
        state.step(1);
        assert!(state.steps() > steps);
    }

    #[test]
    fn short_modulus_keeps_p() {
        let opts = KeyGenOptions::new(512, 65537);
        let mut state = KeyGenerationState::with_rng(opts, SeededRand::new(0)).unwrap();
        let p = (BigUint::one() << 255u32) + 1u32;
        state.p = Some(p.clone());
        state.q = Some(BigUint::from(3u32));
        state.phase = Phase::ComputeN;

        state.advance();
        assert_eq!(state.phase(), Phase::SearchQ);
        assert_eq!(state.p, Some(p));
        assert_eq!(state.q, None);
        assert_eq!(state.n, None);
        assert_eq!(state.phi, None);
    }

    #[test]
    fn discard_q_keeps_p() {
        let mut discards = 0;
        for seed in 1..=20u64 {
            let opts = KeyGenOptions::new(512, 65537);
            let mut state = KeyGenerationState::with_rng(opts, SeededRand::new(seed)).unwrap();

            while !state.is_done() {
                let p = state.p.clone();
                let before = state.phase();
                state.advance();

                if before == Phase::ComputeN && state.phase() == Phase::SearchQ {
                    discards += 1;
                    assert!(p.is_some());
                    assert_eq!(state.p, p, "seed {seed}");
                    assert_eq!(state.q, None, "seed {seed}");
                }
            }

            let (pk, sk) = state.into_keys().unwrap();
            check_key_pair(512, &pk, &sk);
        }

        // 两个256位素数之积约有四成概率只有511位
        assert!(discards > 0);
    }

    #[test]
    fn small_exponent() {
        let opts = KeyGenOptions::new(512, 3);
        let (pk, sk) = generate_key_pair_with_rng(opts, SeededRand::new(5)).unwrap();
        check_key_pair(512, &pk, &sk);
        assert_eq!(pk.exponent(), &BigUint::from(3u32));
    }

    #[test]
    fn invalid_options() {
        for (bits, e) in [(256usize, 65537u64), (1025, 65537), (0, 3), (2048, 65536), (2048, 1), (2048, 2)] {
            assert!(
                matches!(
                    KeyGenerationState::new(bits, e),
                    Err(CipherError::Configuration(_))
                ),
                "bits {bits}, e {e}"
            );
        }

        assert_eq!(KeyGenOptions::default(), KeyGenOptions::new(2048, 65537));
    }
}
