use std::fmt::{Display, Formatter};

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::algorithms::poly_eval::{evaluate, formal_derivative};

///
/// A univariate polynomial with integer coefficients.
///
/// The coefficients are stored from the highest degree down to the constant
/// term, so a polynomial of degree `n` has `n + 1` coefficients. The representation
/// is not normalized, i.e. leading zeros are kept, and the degree is always derived
/// from the length of the coefficient list.
///
/// # Example
/// ```rust
/// # use hensel_lift::poly::*;
/// let f = Polynomial::from_coefficients([1, 1, 7]);
/// assert_eq!(Some(2), f.degree());
/// assert_eq!("x^2 + x + 7", format!("{}", f));
/// ```
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polynomial {
    coefficients: Vec<BigInt>
}

impl Polynomial {

    pub fn new(coefficients: Vec<BigInt>) -> Self {
        Self { coefficients }
    }

    pub fn from_coefficients<I>(coefficients: I) -> Self
        where I: IntoIterator,
            I::Item: Into<BigInt>
    {
        Self::new(coefficients.into_iter().map(Into::into).collect())
    }

    ///
    /// The coefficients, highest degree first.
    ///
    pub fn coefficients(&self) -> &[BigInt] {
        &self.coefficients
    }

    ///
    /// Returns `len - 1`, or `None` for the empty polynomial (e.g. the derivative
    /// of a constant).
    ///
    pub fn degree(&self) -> Option<usize> {
        self.coefficients.len().checked_sub(1)
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients.iter().all(Zero::is_zero)
    }

    pub fn evaluate(&self, x: &BigInt) -> BigInt {
        evaluate(self, x)
    }

    pub fn derivative(&self) -> Polynomial {
        formal_derivative(self)
    }
}

impl Display for Polynomial {

    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let n = match self.degree() {
            Some(n) => n,
            None => return write!(f, "0")
        };
        let mut first = true;
        for (i, c) in self.coefficients.iter().enumerate() {
            if c.is_zero() {
                continue;
            }
            let power = n - i;
            match (first, c.is_negative()) {
                (true, true) => write!(f, "-")?,
                (true, false) => {},
                (false, true) => write!(f, " - ")?,
                (false, false) => write!(f, " + ")?
            }
            first = false;
            let abs = c.abs();
            if power == 0 || !abs.is_one() {
                write!(f, "{}", abs)?;
            }
            match power {
                0 => {},
                1 => write!(f, "x")?,
                _ => write!(f, "x^{}", power)?
            }
        }
        if first {
            write!(f, "0")?;
        }
        return Ok(());
    }
}

#[cfg(test)]
use crate::tracing::LogAlgorithmSubscriber;

#[test]
fn test_degree() {
    LogAlgorithmSubscriber::init_test();
    assert_eq!(Some(2), Polynomial::from_coefficients([1, 1, 7]).degree());
    assert_eq!(Some(0), Polynomial::from_coefficients([5]).degree());
    assert_eq!(Some(3), Polynomial::from_coefficients([0, 0, 1, 0]).degree());
    assert_eq!(None, Polynomial::new(Vec::new()).degree());
}

#[test]
fn test_is_zero() {
    LogAlgorithmSubscriber::init_test();
    assert!(Polynomial::new(Vec::new()).is_zero());
    assert!(Polynomial::from_coefficients([0, 0]).is_zero());
    assert!(!Polynomial::from_coefficients([0, 1]).is_zero());
    assert!(Polynomial::from_coefficients([5]).derivative().is_zero());
    assert_eq!(BigInt::from(13), Polynomial::from_coefficients([1, 1, 7]).evaluate(&BigInt::from(2)));
}

#[test]
fn test_display() {
    LogAlgorithmSubscriber::init_test();
    let display = |coeffs: &[i64]| format!("{}", Polynomial::from_coefficients(coeffs.iter().copied()));
    assert_eq!("x^2 + x + 7", display(&[1, 1, 7]));
    assert_eq!("-x^3 + 2x - 1", display(&[-1, 0, 2, -1]));
    assert_eq!("3x^2 - x", display(&[3, -1, 0]));
    assert_eq!("x", display(&[1, 0]));
    assert_eq!("1", display(&[1]));
    assert_eq!("-1", display(&[-1]));
    assert_eq!("-7", display(&[0, 0, -7]));
    assert_eq!("0", display(&[0, 0]));
    assert_eq!("0", display(&[]));
}

#[test]
fn test_serialization() {
    LogAlgorithmSubscriber::init_test();
    let f = Polynomial::from_coefficients([-3, 0, 12345678901234567890i128]);
    let serialized = serde_json::to_string(&f).unwrap();
    let deserialized: Polynomial = serde_json::from_str(&serialized).unwrap();
    assert_eq!(f, deserialized);
}
