//! Secure-computation runtime port.
//!
//! Every operation on a session is one protocol step that all parties perform
//! together, so every party must issue the same operations in the same order.
//! Callers must never branch on a secret; `select` chooses obliviously.
//! Sessions take `&mut self` for each step, which keeps one party's steps
//! strictly sequential.

use crate::domain::error::SectraderError;
use crate::domain::secret::{SecretBool, SecretValue, SessionId};

pub trait SecureRuntime {
    type Session: SecureSession;

    fn start(&self) -> Result<Self::Session, SectraderError>;
}

pub trait SecureSession {
    fn id(&self) -> SessionId;

    /// Secret-share a plaintext input.
    fn share(&mut self, value: f64) -> Result<SecretValue, SectraderError>;

    /// Lift a public constant into the secret domain.
    fn constant(&mut self, value: f64) -> Result<SecretValue, SectraderError>;

    /// Lift a public boolean into the secret domain.
    fn bit(&mut self, value: bool) -> Result<SecretBool, SectraderError>;

    fn add(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretValue, SectraderError>;

    fn sub(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretValue, SectraderError>;

    fn mul(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretValue, SectraderError>;

    /// Multiply by a public constant.
    fn scale(&mut self, a: SecretValue, factor: f64) -> Result<SecretValue, SectraderError>;

    /// Divide by a public constant. A zero divisor is an error.
    fn div_public(&mut self, a: SecretValue, divisor: f64)
    -> Result<SecretValue, SectraderError>;

    /// Divide by a secret. The caller guarantees the divisor is nonzero,
    /// typically by selecting a substitute first.
    fn div(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretValue, SectraderError>;

    /// `a < b`
    fn lt(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretBool, SectraderError>;

    /// `a == b`
    fn eq(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretBool, SectraderError>;

    fn and(&mut self, a: SecretBool, b: SecretBool) -> Result<SecretBool, SectraderError>;

    fn or(&mut self, a: SecretBool, b: SecretBool) -> Result<SecretBool, SectraderError>;

    fn not(&mut self, a: SecretBool) -> Result<SecretBool, SectraderError>;

    /// `if cond { if_true } else { if_false }` without revealing `cond`.
    fn select(
        &mut self,
        cond: SecretBool,
        if_true: SecretValue,
        if_false: SecretValue,
    ) -> Result<SecretValue, SectraderError>;

    /// Reconstruct the plaintext. Every party learns the result.
    fn reveal(&mut self, a: SecretValue) -> Result<f64, SectraderError>;

    fn reveal_bool(&mut self, a: SecretBool) -> Result<bool, SectraderError>;

    /// End the session. Handles minted by it become invalid.
    fn shutdown(&mut self) -> Result<(), SectraderError>;

    /// `a > b`
    fn gt(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretBool, SectraderError> {
        self.lt(b, a)
    }

    fn max(&mut self, a: SecretValue, b: SecretValue) -> Result<SecretValue, SectraderError> {
        let a_wins = self.gt(a, b)?;
        self.select(a_wins, a, b)
    }

    /// Sum of a window. An empty window is zero.
    fn sum(&mut self, values: &[SecretValue]) -> Result<SecretValue, SectraderError> {
        let Some((first, rest)) = values.split_first() else {
            return self.constant(0.0);
        };
        rest.iter().try_fold(*first, |acc, v| self.add(acc, *v))
    }
}
