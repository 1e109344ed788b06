//! Prime field arithmetic over arbitrary-precision residues.
//!
//! The modulus is chosen per circuit (it arrives as a decimal string in the
//! circuit description), so elements are plain `BigUint` residues and all
//! arithmetic goes through the owning [`Field`].

use std::fmt;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

use crate::error::FieldError;

/// A residue modulo the circuit prime.
///
/// Elements produced by [`Field`] are always canonical (`< p`), which makes
/// equality and ordering on the underlying integer the field comparison.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldElement(BigUint);

impl FieldElement {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn one() -> Self {
        Self(BigUint::one())
    }

    /// Copy the value of `other` into `self`, reusing the existing allocation.
    pub fn set(&mut self, other: &FieldElement) {
        self.0.clone_from(&other.0);
    }

    /// Reset to zero.
    pub fn clear(&mut self) {
        self.0.set_zero();
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<u64> for FieldElement {
    fn from(v: u64) -> Self {
        Self(BigUint::from(v))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Arithmetic context for one prime modulus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    prime: BigUint,
}

impl Field {
    /// Build a field from the decimal representation of its prime.
    pub fn from_decimal(prime: &str) -> Result<Self, FieldError> {
        let p = prime
            .trim()
            .parse::<BigUint>()
            .map_err(|_| FieldError::InvalidPrime(prime.to_string()))?;
        if p <= BigUint::one() {
            return Err(FieldError::InvalidPrime(prime.to_string()));
        }
        Ok(Self { prime: p })
    }

    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    /// Reduce an arbitrary unsigned integer into the field.
    pub fn reduce(&self, v: BigUint) -> FieldElement {
        if v < self.prime {
            FieldElement(v)
        } else {
            FieldElement(v % &self.prime)
        }
    }

    /// Reduce a signed integer; negative values map to `p - (|v| mod p)`.
    pub fn reduce_signed(&self, v: &BigInt) -> FieldElement {
        let magnitude = self.reduce(v.magnitude().clone());
        match v.sign() {
            Sign::Minus => self.neg(&magnitude),
            _ => magnitude,
        }
    }

    pub fn element(&self, v: u64) -> FieldElement {
        self.reduce(BigUint::from(v))
    }

    /// Parse a decimal literal, optionally negative.
    pub fn parse(&self, literal: &str) -> Result<FieldElement, FieldError> {
        let v = literal
            .trim()
            .parse::<BigInt>()
            .map_err(|_| FieldError::InvalidLiteral(literal.to_string()))?;
        Ok(self.reduce_signed(&v))
    }

    pub fn is_canonical(&self, a: &FieldElement) -> bool {
        a.0 < self.prime
    }

    pub fn add(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        self.reduce(&a.0 + &b.0)
    }

    pub fn sub(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        if a.0 >= b.0 {
            FieldElement(&a.0 - &b.0)
        } else {
            FieldElement(&self.prime - &b.0 + &a.0)
        }
    }

    pub fn mul(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        self.reduce(&a.0 * &b.0)
    }

    pub fn neg(&self, a: &FieldElement) -> FieldElement {
        if a.is_zero() {
            FieldElement::zero()
        } else {
            FieldElement(&self.prime - &a.0)
        }
    }
}
