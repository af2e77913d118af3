use std::fmt::{Display, Formatter};
use std::mem::swap;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use tracing::instrument;

///
/// Returned when a linear diophantine equation `ax + by = c` has no integer solution,
/// i.e. when `gcd(a, b)` does not divide `c`.
///
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct NoSolution;

impl Display for NoSolution {

    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "the linear diophantine equation has no integer solution")
    }
}

impl std::error::Error for NoSolution {}

///
/// For `a, b` computes `s, t, d` such that `s*a + t*b == d` is a greatest
/// common divisor of `a` and `b`.
///
/// The sign of `d` is not normalized, it is the last nonzero remainder of the
/// euclidean remainder sequence (using truncating division). For `a = b = 0`,
/// this returns `(1, 0, 0)`.
///
#[stability::unstable(feature = "enable")]
#[instrument(skip_all, level = "trace")]
pub fn eea(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut a, mut b) = (a.clone(), b.clone());
    let (mut sa, mut ta) = (BigInt::one(), BigInt::zero());
    let (mut sb, mut tb) = (BigInt::zero(), BigInt::one());

    // invariant: `a = sa * fst + ta * snd` and `b = sb * fst + tb * snd`
    while !b.is_zero() {
        let (quo, rem) = a.div_rem(&b);
        ta -= &quo * &tb;
        sa -= &quo * &sb;
        a = rem;

        swap(&mut a, &mut b);
        swap(&mut sa, &mut sb);
        swap(&mut ta, &mut tb);
    }
    return (sa, ta, a);
}

///
/// Finds integers `(x, y)` with `a*x + b*y == c`, or returns [`NoSolution`] if
/// `gcd(a, b)` does not divide `c`.
///
/// The solution is computed from the Bezout coefficients of the extended euclidean
/// algorithm, scaled by `c / gcd(a, b)`. Internally, the inputs are ordered such that
/// `|a| >= |b|`, however the returned pair always refers to the inputs in the order
/// they were given. If the smaller input divides the larger one, no euclidean step is
/// performed and the solution puts all weight on the smaller input, i.e. it is
/// `(0, c/b)` if `b | a` resp. `(c/a, 0)` if `a | b`.
///
/// # Example
/// ```rust
/// # use num_bigint::BigInt;
/// # use hensel_lift::algorithms::eea::*;
/// let (x, y) = solve_linear_diophantine(&BigInt::from(3), &BigInt::from(5), &BigInt::from(1)).unwrap();
/// assert_eq!(BigInt::from(1), BigInt::from(3) * x + BigInt::from(5) * y);
/// assert_eq!(Err(NoSolution), solve_linear_diophantine(&BigInt::from(4), &BigInt::from(6), &BigInt::from(3)));
/// ```
///
#[instrument(skip_all, level = "trace")]
pub fn solve_linear_diophantine(a: &BigInt, b: &BigInt, c: &BigInt) -> Result<(BigInt, BigInt), NoSolution> {
    let swapped = a.abs() < b.abs();
    let (a, b) = if swapped { (b, a) } else { (a, b) };

    let (x, y) = if b.is_zero() {
        if a.is_zero() {
            if !c.is_zero() {
                return Err(NoSolution);
            }
            (BigInt::zero(), BigInt::zero())
        } else {
            (exact_quotient(c, a)?, BigInt::zero())
        }
    } else if a.is_multiple_of(b) {
        (BigInt::zero(), exact_quotient(c, b)?)
    } else {
        let (s, t, d) = eea(a, b);
        let factor = exact_quotient(c, &d)?;
        (s * &factor, t * factor)
    };

    if swapped {
        return Ok((y, x));
    } else {
        return Ok((x, y));
    }
}

fn exact_quotient(c: &BigInt, d: &BigInt) -> Result<BigInt, NoSolution> {
    let (quo, rem) = c.div_rem(d);
    if rem.is_zero() {
        Ok(quo)
    } else {
        Err(NoSolution)
    }
}

///
/// Computes the inverse of `a` modulo `m`, as the smallest nonnegative representative.
///
/// This is the `x`-component of the solution to `ax + my = 1` as given by
/// [`solve_linear_diophantine()`]. Fails if `a` and `m` are not coprime, or `m <= 0`.
///
#[instrument(skip_all, level = "trace")]
pub fn modular_inverse(a: &BigInt, m: &BigInt) -> Result<BigInt, NoSolution> {
    if !m.is_positive() {
        return Err(NoSolution);
    }
    let (x, _) = solve_linear_diophantine(&a.mod_floor(m), m, &BigInt::one())?;
    return Ok(x.mod_floor(m));
}

#[cfg(test)]
use crate::tracing::LogAlgorithmSubscriber;

#[cfg(test)]
fn int(x: i64) -> BigInt {
    BigInt::from(x)
}

#[test]
fn test_eea() {
    LogAlgorithmSubscriber::init_test();
    let check = |a: i64, b: i64, gcd: i64| {
        let (s, t, d) = eea(&int(a), &int(b));
        assert_eq!(int(gcd), d.abs());
        assert_eq!(d, s * int(a) + t * int(b));
    };
    check(15, 6, 3);
    check(6, 15, 3);
    check(0, 7, 7);
    check(7, 0, 7);
    check(0, 0, 0);
    check(-12, 18, 6);
    check(35, -49, 7);
    check(17, 5, 1);
}

#[test]
fn test_solve_linear_diophantine() {
    LogAlgorithmSubscriber::init_test();
    let (x, y) = solve_linear_diophantine(&int(240), &int(46), &int(4)).unwrap();
    assert_eq!(int(4), int(240) * x + int(46) * y);

    let (x, y) = solve_linear_diophantine(&int(46), &int(240), &int(4)).unwrap();
    assert_eq!(int(4), int(46) * x + int(240) * y);

    assert_eq!(Err(NoSolution), solve_linear_diophantine(&int(240), &int(46), &int(3)));
    assert_eq!(Err(NoSolution), solve_linear_diophantine(&int(46), &int(240), &int(3)));
}

#[test]
fn test_solve_linear_diophantine_divisible() {
    LogAlgorithmSubscriber::init_test();
    assert_eq!(Ok((int(0), int(3))), solve_linear_diophantine(&int(6), &int(3), &int(9)));
    assert_eq!(Ok((int(3), int(0))), solve_linear_diophantine(&int(3), &int(6), &int(9)));
    assert_eq!(Err(NoSolution), solve_linear_diophantine(&int(6), &int(3), &int(10)));
    assert_eq!(Ok((int(0), int(-2))), solve_linear_diophantine(&int(5), &int(5), &int(-10)));
}

#[test]
fn test_solve_linear_diophantine_zero() {
    LogAlgorithmSubscriber::init_test();
    assert_eq!(Ok((int(0), int(0))), solve_linear_diophantine(&int(0), &int(0), &int(0)));
    assert_eq!(Err(NoSolution), solve_linear_diophantine(&int(0), &int(0), &int(1)));
    assert_eq!(Ok((int(0), int(-4))), solve_linear_diophantine(&int(0), &int(3), &int(-12)));
    assert_eq!(Ok((int(-4), int(0))), solve_linear_diophantine(&int(3), &int(0), &int(-12)));
    assert_eq!(Err(NoSolution), solve_linear_diophantine(&int(0), &int(3), &int(2)));
}

#[test]
fn test_solve_linear_diophantine_random() {
    LogAlgorithmSubscriber::init_test();
    let mut rng = oorandom::Rand64::new(1);
    for _ in 0..1000 {
        let a = int(rng.rand_i64() >> 44);
        let b = int(rng.rand_i64() >> 44);
        let c = int(rng.rand_i64() >> 40);
        let gcd = a.gcd(&b);
        match solve_linear_diophantine(&a, &b, &c) {
            Ok((x, y)) => assert_eq!(c, &a * x + &b * y),
            Err(NoSolution) => assert!(gcd.is_zero() && !c.is_zero() || !gcd.is_zero() && !c.is_multiple_of(&gcd))
        }
        if !gcd.is_zero() {
            let multiple = &c * &gcd;
            let (x, y) = solve_linear_diophantine(&a, &b, &multiple).unwrap();
            assert_eq!(multiple, &a * x + &b * y);
        }
    }
}

#[test]
fn test_modular_inverse() {
    LogAlgorithmSubscriber::init_test();
    for p in [2, 3, 5, 7, 13, 65537] {
        for a in 1..p.min(200) {
            let inv = modular_inverse(&int(a), &int(p)).unwrap();
            assert!(!inv.is_negative() && inv < int(p));
            assert!((int(a) * inv - BigInt::one()).is_multiple_of(&int(p)));
        }
    }
    assert_eq!(Ok(int(3)), modular_inverse(&int(-3), &int(5)));
    assert_eq!(Err(NoSolution), modular_inverse(&int(6), &int(9)));
    assert_eq!(Err(NoSolution), modular_inverse(&int(0), &int(7)));
    assert_eq!(Err(NoSolution), modular_inverse(&int(1), &int(0)));
}
