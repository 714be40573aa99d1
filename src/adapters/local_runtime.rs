//! In-process secure runtime (simulation).
//!
//! Simulates `parties` computing parties that hold additive shares of
//! fixed-point numbers in the ring of 64-bit integers. Linear operations work
//! share-wise. Everything else (products, truncation, division, comparison,
//! boolean logic, select) is evaluated by an in-process dealer that
//! reconstructs the operands, computes in plaintext and re-shares the result
//! with fresh randomness. This reproduces the operation contract and the
//! fixed-point numerics of a real runtime; it offers no confidentiality.
//!
//! Share randomness comes from an RNG seeded once per session, so two sessions
//! started from the same runtime perform bit-for-bit identical work.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::domain::error::SectraderError;
use crate::domain::secret::{SecretBool, SecretValue, SessionId};
use crate::ports::config_port::ConfigPort;
use crate::ports::secure_runtime_port::{SecureRuntime, SecureSession};

pub const DEFAULT_PARTIES: usize = 3;
pub const DEFAULT_FRAC_BITS: u32 = 16;
pub const MAX_FRAC_BITS: u32 = 30;

/// Largest magnitude a fixed-point encoding may take. Any two encodings sum
/// without wrapping the 64-bit ring, so every result is checked against it.
const ENCODING_LIMIT: i64 = 1 << 62;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRuntimeConfig {
    pub parties: usize,
    pub frac_bits: u32,
    pub seed: u64,
}

impl Default for LocalRuntimeConfig {
    fn default() -> Self {
        LocalRuntimeConfig {
            parties: DEFAULT_PARTIES,
            frac_bits: DEFAULT_FRAC_BITS,
            seed: 0,
        }
    }
}

impl LocalRuntimeConfig {
    /// Read the `[mpc]` section.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        LocalRuntimeConfig {
            parties: config.get_int("mpc", "parties", DEFAULT_PARTIES as i64).max(0) as usize,
            frac_bits: config
                .get_int("mpc", "frac_bits", DEFAULT_FRAC_BITS as i64)
                .clamp(0, u32::MAX as i64) as u32,
            seed: config.get_int("mpc", "seed", 0) as u64,
        }
    }

    pub fn validate(&self) -> Result<(), SectraderError> {
        if self.parties == 0 {
            return Err(SectraderError::ConfigInvalid {
                section: "mpc".into(),
                key: "parties".into(),
                reason: "at least one party is required".into(),
            });
        }
        if self.frac_bits == 0 || self.frac_bits > MAX_FRAC_BITS {
            return Err(SectraderError::ConfigInvalid {
                section: "mpc".into(),
                key: "frac_bits".into(),
                reason: format!("frac_bits must be between 1 and {MAX_FRAC_BITS}"),
            });
        }
        Ok(())
    }
}

pub struct LocalRuntime {
    config: LocalRuntimeConfig,
    disconnect_after: Option<u64>,
    next_session: AtomicU64,
    open_sessions: Arc<AtomicUsize>,
}

impl LocalRuntime {
    pub fn new(config: LocalRuntimeConfig) -> Result<Self, SectraderError> {
        config.validate()?;
        Ok(Self {
            config,
            disconnect_after: None,
            next_session: AtomicU64::new(1),
            open_sessions: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Make every session fail once it has performed `rounds` interactive
    /// rounds, as if a party dropped off the network.
    pub fn with_disconnect_after(mut self, rounds: u64) -> Self {
        self.disconnect_after = Some(rounds);
        self
    }

    /// Sessions started and not yet shut down.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }
}

impl SecureRuntime for LocalRuntime {
    type Session = LocalSession;

    fn start(&self) -> Result<LocalSession, SectraderError> {
        let id = SessionId(self.next_session.fetch_add(1, Ordering::SeqCst));
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            session = %id,
            parties = self.config.parties,
            frac_bits = self.config.frac_bits,
            "secure session started"
        );
        Ok(LocalSession {
            id,
            parties: self.config.parties,
            frac_bits: self.config.frac_bits,
            rng: ChaCha8Rng::seed_from_u64(self.config.seed),
            shares: Vec::new(),
            slots: 0,
            rounds: 0,
            disconnect_after: self.disconnect_after,
            open: true,
            open_sessions: Arc::clone(&self.open_sessions),
        })
    }
}

pub struct LocalSession {
    id: SessionId,
    parties: usize,
    frac_bits: u32,
    rng: ChaCha8Rng,
    /// Slot-major: `parties` consecutive shares per slot.
    shares: Vec<u64>,
    slots: u32,
    rounds: u64,
    disconnect_after: Option<u64>,
    open: bool,
    open_sessions: Arc<AtomicUsize>,
}

impl LocalSession {
    /// Interactive rounds performed so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Secret values and bits held by the session.
    pub fn slots(&self) -> u32 {
        self.slots
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn scale_factor(&self) -> f64 {
        (1u64 << self.frac_bits) as f64
    }

    fn encode(&self, value: f64) -> Result<i64, SectraderError> {
        if !value.is_finite() {
            return Err(SectraderError::protocol(format!(
                "cannot encode non-finite value {value}"
            )));
        }
        let scaled = (value * self.scale_factor()).round();
        if scaled.abs() >= ENCODING_LIMIT as f64 {
            return Err(SectraderError::protocol(format!(
                "value {value} exceeds the fixed-point range"
            )));
        }
        Ok(scaled as i64)
    }

    fn decode(&self, raw: i64) -> f64 {
        raw as f64 / self.scale_factor()
    }

    fn fit(&self, raw: i128) -> Result<i64, SectraderError> {
        i64::try_from(raw)
            .ok()
            .filter(|v| v.unsigned_abs() < ENCODING_LIMIT as u64)
            .ok_or_else(|| SectraderError::protocol("fixed-point overflow"))
    }

    fn ensure_open(&self) -> Result<(), SectraderError> {
        if self.open {
            Ok(())
        } else {
            Err(SectraderError::protocol(format!("{} is shut down", self.id)))
        }
    }

    /// Account for one interactive round.
    fn round(&mut self) -> Result<(), SectraderError> {
        self.ensure_open()?;
        if let Some(limit) = self.disconnect_after {
            if self.rounds >= limit {
                return Err(SectraderError::protocol(format!(
                    "party {} disconnected during round {}",
                    self.parties.saturating_sub(1),
                    self.rounds + 1
                )));
            }
        }
        self.rounds += 1;
        Ok(())
    }

    fn check(&self, session: SessionId, slot: u32) -> Result<usize, SectraderError> {
        self.ensure_open()?;
        if session != self.id {
            return Err(SectraderError::protocol(format!(
                "handle from {session} used in {}",
                self.id
            )));
        }
        if slot >= self.slots {
            return Err(SectraderError::protocol(format!(
                "unknown slot {slot} in {}",
                self.id
            )));
        }
        Ok(slot as usize * self.parties)
    }

    fn push_shares(&mut self, shares: impl IntoIterator<Item = u64>) -> u32 {
        self.shares.extend(shares);
        let slot = self.slots;
        self.slots += 1;
        slot
    }

    /// Split `raw` into fresh random additive shares.
    fn deal(&mut self, raw: i64) -> u32 {
        let mut total = 0u64;
        let mut shares = Vec::with_capacity(self.parties);
        for _ in 1..self.parties {
            let share = self.rng.next_u64();
            total = total.wrapping_add(share);
            shares.push(share);
        }
        shares.push((raw as u64).wrapping_sub(total));
        self.push_shares(shares)
    }

    /// Public value: party 0 holds it, everyone else holds zero.
    fn deal_public(&mut self, raw: i64) -> u32 {
        let parties = self.parties;
        self.push_shares((0..parties).map(|p| if p == 0 { raw as u64 } else { 0 }))
    }

    fn open_slot(&self, offset: usize) -> i64 {
        self.shares[offset..offset + self.parties]
            .iter()
            .fold(0u64, |acc, s| acc.wrapping_add(*s)) as i64
    }

    fn open_value(&self, a: SecretValue) -> Result<i64, SectraderError> {
        let offset = self.check(a.session(), a.slot())?;
        Ok(self.open_slot(offset))
    }

    fn open_bit(&self, a: SecretBool) -> Result<bool, SectraderError> {
        let offset = self.check(a.session(), a.slot())?;
        match self.open_slot(offset) {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SectraderError::protocol(format!(
                "corrupted bit {other} in {}",
                self.id
            ))),
        }
    }

    fn value(&self, slot: u32) -> SecretValue {
        SecretValue::from_parts(self.id, slot)
    }

    fn dealt_value(&mut self, raw: i64) -> SecretValue {
        let slot = self.deal(raw);
        self.value(slot)
    }

    fn dealt_bit(&mut self, bit: bool) -> SecretBool {
        let slot = self.deal(i64::from(bit));
        SecretBool::from_parts(self.id, slot)
    }

    fn linear(
        &mut self,
        a: SecretValue,
        b: SecretValue,
        op: fn(u64, u64) -> u64,
    ) -> Result<SecretValue, SectraderError> {
        let a_off = self.check(a.session(), a.slot())?;
        let b_off = self.check(b.session(), b.slot())?;
        let combined: Vec<u64> = (0..self.parties)
            .map(|p| op(self.shares[a_off + p], self.shares[b_off + p]))
            .collect();
        let total = combined.iter().fold(0u64, |acc, s| acc.wrapping_add(*s)) as i64;
        self.fit(i128::from(total))?;
        let slot = self.push_shares(combined);
        Ok(self.value(slot))
    }

    fn fixed_div(&self, numerator: i64, denominator: i64) -> Result<i64, SectraderError> {
        if denominator == 0 {
            return Err(SectraderError::protocol("division by zero"));
        }
        self.fit(((numerator as i128) << self.frac_bits) / denominator as i128)
    }
}

impl SecureSession for LocalSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn share(&mut self, value: f64) -> Result<SecretValue, SectraderError> {
        self.round()?;
        let raw = self.encode(value)?;
        Ok(self.dealt_value(raw))
    }

    fn constant(&mut self, value: f64) -> Result<SecretValue, SectraderError> {
        self.ensure_open()?;
        let raw = self.encode(value)?;
        let slot = self.deal_public(raw);
        Ok(self.value(slot))
    }

    fn bit(&mut self, value: bool) -> Result<SecretBool, SectraderError> {
        self.ensure_open()?;
        let slot = self.deal_public(i64::from(value));
        Ok(SecretBool::from_parts(self.id, slot))
    }

    fn add(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretValue, SectraderError> {
        self.linear(a, b, u64::wrapping_add)
    }

    fn sub(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretValue, SectraderError> {
        self.linear(a, b, u64::wrapping_sub)
    }

    fn mul(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretValue, SectraderError> {
        let (x, y) = (self.open_value(a)?, self.open_value(b)?);
        self.round()?;
        let raw = self.fit((x as i128 * y as i128) >> self.frac_bits)?;
        Ok(self.dealt_value(raw))
    }

    fn scale(&mut self, a: SecretValue, factor: f64) -> Result<SecretValue, SectraderError> {
        let x = self.open_value(a)?;
        let k = self.encode(factor)?;
        self.round()?;
        let raw = self.fit((x as i128 * k as i128) >> self.frac_bits)?;
        Ok(self.dealt_value(raw))
    }

    fn div_public(
        &mut self,
        a: SecretValue,
        divisor: f64,
    ) -> Result<SecretValue, SectraderError> {
        let x = self.open_value(a)?;
        let d = self.encode(divisor)?;
        self.round()?;
        let raw = self.fixed_div(x, d)?;
        Ok(self.dealt_value(raw))
    }

    fn div(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretValue, SectraderError> {
        let (x, y) = (self.open_value(a)?, self.open_value(b)?);
        self.round()?;
        let raw = self.fixed_div(x, y)?;
        Ok(self.dealt_value(raw))
    }

    fn lt(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretBool, SectraderError> {
        let (x, y) = (self.open_value(a)?, self.open_value(b)?);
        self.round()?;
        Ok(self.dealt_bit(x < y))
    }

    fn eq(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretBool, SectraderError> {
        let (x, y) = (self.open_value(a)?, self.open_value(b)?);
        self.round()?;
        Ok(self.dealt_bit(x == y))
    }

    fn and(&mut self, a: SecretBool, b: SecretBool) -> Result<SecretBool, SectraderError> {
        let (x, y) = (self.open_bit(a)?, self.open_bit(b)?);
        self.round()?;
        Ok(self.dealt_bit(x && y))
    }

    fn or(&mut self, a: SecretBool, b: SecretBool) -> Result<SecretBool, SectraderError> {
        let (x, y) = (self.open_bit(a)?, self.open_bit(b)?);
        self.round()?;
        Ok(self.dealt_bit(x || y))
    }

    fn not(&mut self, a: SecretBool) -> Result<SecretBool, SectraderError> {
        // 1 - a, share-wise: party 0 adds the public one.
        let offset = self.check(a.session(), a.slot())?;
        let negated: Vec<u64> = (0..self.parties)
            .map(|p| {
                let share = 0u64.wrapping_sub(self.shares[offset + p]);
                if p == 0 { share.wrapping_add(1) } else { share }
            })
            .collect();
        let slot = self.push_shares(negated);
        Ok(SecretBool::from_parts(self.id, slot))
    }

    fn select(
        &mut self,
        cond: SecretBool,
        if_true: SecretValue,
        if_false: SecretValue,
    ) -> Result<SecretValue, SectraderError> {
        let c = self.open_bit(cond)?;
        let (t, f) = (self.open_value(if_true)?, self.open_value(if_false)?);
        self.round()?;
        Ok(self.dealt_value(if c { t } else { f }))
    }

    fn reveal(&mut self, a: SecretValue) -> Result<f64, SectraderError> {
        let raw = self.open_value(a)?;
        self.round()?;
        Ok(self.decode(raw))
    }

    fn reveal_bool(&mut self, a: SecretBool) -> Result<bool, SectraderError> {
        let bit = self.open_bit(a)?;
        self.round()?;
        Ok(bit)
    }

    fn shutdown(&mut self) -> Result<(), SectraderError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.shares = Vec::new();
        self.open_sessions.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!(
            session = %self.id,
            rounds = self.rounds,
            slots = self.slots,
            "secure session shut down"
        );
        Ok(())
    }
}
