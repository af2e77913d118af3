use num_bigint::BigInt;
use num_traits::Zero;
use tracing::instrument;

use crate::poly::Polynomial;

///
/// Computes `f(x)` exactly, using Horner's rule.
///
/// This equals `sum_i a_i x^(n - i)` where `a_0, ..., a_n` are the coefficients
/// of `f`, highest degree first. The empty polynomial evaluates to `0` everywhere.
///
/// # Example
/// ```rust
/// # use num_bigint::BigInt;
/// # use hensel_lift::poly::*;
/// # use hensel_lift::algorithms::poly_eval::*;
/// let f = Polynomial::from_coefficients([1, 1, 7]);
/// assert_eq!(BigInt::from(13), evaluate(&f, &BigInt::from(2)));
/// ```
///
#[instrument(skip_all, level = "trace")]
pub fn evaluate(f: &Polynomial, x: &BigInt) -> BigInt {
    let mut current = BigInt::zero();
    for c in f.coefficients() {
        current *= x;
        current += c;
    }
    return current;
}

///
/// Returns the formal derivative of `f`.
///
/// For `f` of degree `n` with coefficients `a_0, ..., a_n`, the result has degree
/// `n - 1` and coefficients `n a_0, (n - 1) a_1, ..., 1 a_(n - 1)`. In particular,
/// the derivative of a constant is the empty polynomial. Leading zeros of `f` are
/// kept, so the result always has exactly one coefficient less than `f`.
///
#[instrument(skip_all, level = "trace")]
pub fn formal_derivative(f: &Polynomial) -> Polynomial {
    let coefficients = f.coefficients();
    let n = match f.degree() {
        Some(n) => n,
        None => return Polynomial::new(Vec::new())
    };
    Polynomial::new(coefficients[..n].iter().enumerate().map(|(i, a)| a * BigInt::from(n - i)).collect())
}

#[cfg(test)]
use crate::tracing::LogAlgorithmSubscriber;

#[test]
fn test_evaluate() {
    LogAlgorithmSubscriber::init_test();
    let f = Polynomial::from_coefficients([2, -3, 0, 5]);
    for x in -10..10i64 {
        assert_eq!(BigInt::from(2 * x.pow(3) - 3 * x.pow(2) + 5), evaluate(&f, &BigInt::from(x)));
    }
    assert_eq!(BigInt::from(-4), evaluate(&Polynomial::from_coefficients([-4]), &BigInt::from(100)));
    assert_eq!(BigInt::zero(), evaluate(&Polynomial::new(Vec::new()), &BigInt::from(100)));
}

#[test]
fn test_evaluate_large() {
    LogAlgorithmSubscriber::init_test();
    // x^5 at x = 10^20 does not fit into any primitive integer
    let f = Polynomial::from_coefficients([1, 0, 0, 0, 0, 1]);
    let x = BigInt::from(10).pow(20);
    assert_eq!(BigInt::from(10).pow(100) + 1, evaluate(&f, &x));
}

#[test]
fn test_formal_derivative() {
    LogAlgorithmSubscriber::init_test();
    assert_eq!(Polynomial::from_coefficients([2, 1]), formal_derivative(&Polynomial::from_coefficients([1, 1, 7])));
    assert_eq!(Polynomial::from_coefficients([20, 0, -6, 0]), formal_derivative(&Polynomial::from_coefficients([5, 0, -3, 0, 9])));
    assert_eq!(Polynomial::from_coefficients([0, 0, 1]), formal_derivative(&Polynomial::from_coefficients([0, 0, 1, 3])));
    assert_eq!(Polynomial::from_coefficients([1]), formal_derivative(&Polynomial::from_coefficients([1, 0])));
}

#[test]
fn test_formal_derivative_constant() {
    LogAlgorithmSubscriber::init_test();
    let df = formal_derivative(&Polynomial::from_coefficients([7]));
    assert_eq!(None, df.degree());
    assert_eq!(BigInt::zero(), evaluate(&df, &BigInt::from(3)));
    assert_eq!(None, formal_derivative(&df).degree());
}

#[test]
fn test_formal_derivative_power_rule() {
    LogAlgorithmSubscriber::init_test();
    let mut rng = oorandom::Rand64::new(1);
    for _ in 0..20 {
        let len = rng.rand_range(1..8) as usize;
        let coeffs = (0..len).map(|_| rng.rand_i64() >> 40).collect::<Vec<_>>();
        let f = Polynomial::from_coefficients(coeffs.iter().copied());
        let df = formal_derivative(&f);
        let n = len - 1;
        assert_eq!(n, df.coefficients().len());
        for i in 0..n {
            assert_eq!(BigInt::from(coeffs[i]) * BigInt::from(n - i), df.coefficients()[i]);
        }
    }
}
