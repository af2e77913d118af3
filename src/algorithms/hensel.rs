use std::fmt::{Display, Formatter};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Zero;
use tracing::instrument;

use crate::algorithms::eea::{modular_inverse, NoSolution};
use crate::algorithms::poly_eval::{evaluate, formal_derivative};
use crate::computation::{ComputationController, DontObserve};
use crate::poly::Polynomial;

#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum HenselError {
    /// the exponent `k` was smaller than `1`
    InvalidExponent,
    /// the modulus `p` was smaller than `2`
    InvalidModulus,
    /// the polynomial had no coefficients
    EmptyPolynomial,
    /// `f'(r)` is nonzero modulo `p`, but not invertible; this only happens if `p` is not prime
    NotInvertible
}

impl Display for HenselError {

    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HenselError::InvalidExponent => write!(f, "the exponent must be at least 1"),
            HenselError::InvalidModulus => write!(f, "the modulus must be at least 2"),
            HenselError::EmptyPolynomial => write!(f, "the polynomial must have at least one coefficient"),
            HenselError::NotInvertible => write!(f, "the derivative is not invertible modulo p, is p prime?")
        }
    }
}

impl std::error::Error for HenselError {}

impl From<NoSolution> for HenselError {

    fn from(_: NoSolution) -> Self {
        HenselError::NotInvertible
    }
}

///
/// Returns all `r` in `[0, p)` with `f(r) = 0 mod p`, in ascending order.
///
#[instrument(skip_all, level = "debug")]
pub fn roots_mod_prime(f: &Polynomial, p: &BigInt) -> Vec<BigInt> {
    let mut result = Vec::new();
    let mut r = BigInt::zero();
    while &r < p {
        if evaluate(f, &r).is_multiple_of(p) {
            result.push(r.clone());
        }
        r += 1;
    }
    return result;
}

///
/// Performs a single Hensel lifting step, i.e. computes the roots of `f` modulo `p^k` from
/// the roots of `f` modulo `p^(k - 1)`.
///
/// Here `df` must be the formal derivative of `f`, and every element of `roots` must be a root
/// of `f` modulo `p^(k - 1)` in `[0, p^(k - 1))`. For each such root `r`
///  - if `f'(r) != 0 mod p`, there is exactly one lift `r + t p^(k - 1)` with
///    `t = -f'(r)^-1 f(r) / p^(k - 1) mod p`,
///  - if `f'(r) = 0 mod p` and `f(r) = 0 mod p^k`, all `r + t p^(k - 1)` for `t` in `[0, p)`
///    are roots,
///  - otherwise, `r` has no lift.
///
/// The lifts are returned in the order of `roots`, and for each root by ascending `t`.
/// No deduplication is performed.
///
#[instrument(skip_all, level = "debug", fields(k = k))]
pub fn lift_roots(f: &Polynomial, df: &Polynomial, p: &BigInt, k: usize, roots: &[BigInt]) -> Result<Vec<BigInt>, HenselError> {
    if k < 2 {
        return Err(HenselError::InvalidExponent);
    }
    let prime_power = num_traits::pow(p.clone(), k - 1);
    let next_prime_power = &prime_power * p;

    let mut result = Vec::new();
    for r in roots {
        let fr = evaluate(f, r);
        let dfr = evaluate(df, r).mod_floor(p);
        if !dfr.is_zero() {
            debug_assert!(fr.is_multiple_of(&prime_power));
            let inv = modular_inverse(&dfr, p)?;
            let t = (-inv * (&fr / &prime_power)).mod_floor(p);
            result.push(r + t * &prime_power);
        } else if fr.is_multiple_of(&next_prime_power) {
            let mut lift = r.clone();
            let mut t = BigInt::zero();
            while &t < p {
                result.push(lift.clone());
                lift += &prime_power;
                t += 1;
            }
        }
    }
    return Ok(result);
}

///
/// Computes all solutions `x` in `[0, p^k)` of `f(x) = 0 mod p^k`, for a prime `p`.
///
/// The roots modulo `p` are found by exhaustive search, and then lifted one exponent
/// at a time using [`lift_roots()`]. In particular, the running time is linear in `p`.
/// Primality of `p` is not checked, but if `p` is not prime, the result may be incomplete
/// or [`HenselError::NotInvertible`] may be returned.
///
/// # Example
/// ```rust
/// # use num_bigint::BigInt;
/// # use hensel_lift::poly::*;
/// # use hensel_lift::algorithms::hensel::*;
/// let f = Polynomial::from_coefficients([1, 0, 1]);
/// assert_eq!(vec![BigInt::from(57), BigInt::from(68)], hensel(&f, &BigInt::from(5), 3).unwrap());
/// ```
///
pub fn hensel(f: &Polynomial, p: &BigInt, k: usize) -> Result<Vec<BigInt>, HenselError> {
    hensel_with_controller(f, p, k, DontObserve)
}

///
/// Same as [`hensel()`], but reports the number of roots found at each exponent
/// to the given [`ComputationController`].
///
#[instrument(skip_all, level = "info", fields(p = %p, k = k))]
pub fn hensel_with_controller<Controller>(f: &Polynomial, p: &BigInt, k: usize, controller: Controller) -> Result<Vec<BigInt>, HenselError>
    where Controller: ComputationController
{
    if k < 1 {
        return Err(HenselError::InvalidExponent);
    }
    if *p < BigInt::from(2) {
        return Err(HenselError::InvalidModulus);
    }
    let mut roots = roots_mod_prime(f, p);
    log_progress!(controller, "(mod={}^1, roots={})", p, roots.len());
    if k == 1 {
        return Ok(roots);
    }
    let df = formal_derivative(f);
    for level in 2..=k {
        roots = lift_roots(f, &df, p, level, &roots)?;
        log_progress!(controller, "(mod={}^{}, roots={})", p, level, roots.len());
    }
    return Ok(roots);
}

///
/// Solves `a_n x^n + ... + a_1 x + a_0 = 0 mod p^k`, where the coefficients are given
/// as `[a_n, ..., a_0]`.
///
/// This is [`hensel()`] with validation of the raw input, as it would come e.g. from
/// the command line.
///
pub fn solve(p: &BigInt, k: i64, coefficients: &[BigInt]) -> Result<Vec<BigInt>, HenselError> {
    solve_with_controller(p, k, coefficients, DontObserve)
}

///
/// Same as [`solve()`], but reports progress to the given [`ComputationController`],
/// as done by [`hensel_with_controller()`].
///
pub fn solve_with_controller<Controller>(p: &BigInt, k: i64, coefficients: &[BigInt], controller: Controller) -> Result<Vec<BigInt>, HenselError>
    where Controller: ComputationController
{
    if coefficients.is_empty() {
        return Err(HenselError::EmptyPolynomial);
    }
    let k = usize::try_from(k).map_err(|_| HenselError::InvalidExponent)?;
    return hensel_with_controller(&Polynomial::new(coefficients.to_vec()), p, k, controller);
}

#[cfg(test)]
use std::sync::{Arc, Mutex};
#[cfg(test)]
use crate::tracing::LogAlgorithmSubscriber;

#[cfg(test)]
fn ints<I: IntoIterator<Item = i64>>(values: I) -> Vec<BigInt> {
    values.into_iter().map(BigInt::from).collect()
}

#[cfg(test)]
fn brute_force_roots(f: &Polynomial, modulus: i64) -> Vec<BigInt> {
    (0..modulus).map(BigInt::from).filter(|x| evaluate(f, x).is_multiple_of(&BigInt::from(modulus))).collect()
}

#[cfg(test)]
fn random_polynomial(rng: &mut oorandom::Rand64) -> Polynomial {
    let len = rng.rand_range(1..6) as usize;
    Polynomial::from_coefficients((0..len).map(|_| rng.rand_range(0..21) as i64 - 10))
}

#[test]
fn test_roots_mod_prime() {
    LogAlgorithmSubscriber::init_test();
    let mut rng = oorandom::Rand64::new(1);
    for p in [2, 3, 5, 7, 11, 13] {
        for _ in 0..10 {
            let f = random_polynomial(&mut rng);
            assert_eq!(brute_force_roots(&f, p), roots_mod_prime(&f, &BigInt::from(p)));
            assert_eq!(roots_mod_prime(&f, &BigInt::from(p)), hensel(&f, &BigInt::from(p), 1).unwrap());
        }
    }
}

#[test]
fn test_hensel_without_roots() {
    LogAlgorithmSubscriber::init_test();
    let f = Polynomial::from_coefficients([1, 1, 7]);
    assert_eq!(brute_force_roots(&f, 5), hensel(&f, &BigInt::from(5), 1).unwrap());
    assert_eq!(brute_force_roots(&f, 25), hensel(&f, &BigInt::from(5), 2).unwrap());
    // x^2 + x + 2 has no roots modulo 5
    assert!(hensel(&f, &BigInt::from(5), 2).unwrap().is_empty());
}

#[test]
fn test_hensel_unique_lifts() {
    LogAlgorithmSubscriber::init_test();
    let f = Polynomial::from_coefficients([1, 0, 1]);
    let p = BigInt::from(5);
    assert_eq!(ints([2, 3]), hensel(&f, &p, 1).unwrap());
    assert_eq!(ints([7, 18]), hensel(&f, &p, 2).unwrap());
    assert_eq!(ints([57, 68]), hensel(&f, &p, 3).unwrap());
}

#[test]
fn test_hensel_singular_roots() {
    LogAlgorithmSubscriber::init_test();
    // f'(1) = 3 vanishes modulo 3, so the root 1 either lifts to all residues or to none
    let f = Polynomial::from_coefficients([1, 1, 7]);
    let p = BigInt::from(3);
    assert_eq!(ints([1]), hensel(&f, &p, 1).unwrap());
    assert_eq!(ints([1, 4, 7]), hensel(&f, &p, 2).unwrap());
    assert_eq!(ints([4, 13, 22]), hensel(&f, &p, 3).unwrap());
}

#[test]
fn test_hensel_zero_polynomial() {
    LogAlgorithmSubscriber::init_test();
    let f = Polynomial::from_coefficients([0]);
    assert_eq!(ints([0, 3, 6, 1, 4, 7, 2, 5, 8]), hensel(&f, &BigInt::from(3), 2).unwrap());
}

#[test]
fn test_hensel_constant_polynomial() {
    LogAlgorithmSubscriber::init_test();
    let f = Polynomial::from_coefficients([7]);
    for k in 1..5 {
        assert!(hensel(&f, &BigInt::from(5), k).unwrap().is_empty());
    }
    let f = Polynomial::from_coefficients([10]);
    assert_eq!(ints(0..5), hensel(&f, &BigInt::from(5), 1).unwrap());
    assert!(hensel(&f, &BigInt::from(5), 2).unwrap().is_empty());
}

#[test]
fn test_hensel_identity() {
    LogAlgorithmSubscriber::init_test();
    let f = Polynomial::from_coefficients([1, 0]);
    for p in [2, 3, 5, 7, 101] {
        for k in 1..7 {
            assert_eq!(ints([0]), hensel(&f, &BigInt::from(p), k).unwrap());
        }
    }
}

#[test]
fn test_hensel_large_exponent() {
    LogAlgorithmSubscriber::init_test();
    let f = Polynomial::from_coefficients([1, 0, -2]);
    let p = BigInt::from(7);
    let k = 40;
    let modulus = num_traits::pow(p.clone(), k);
    let roots = hensel(&f, &p, k).unwrap();
    assert_eq!(2, roots.len());
    for r in &roots {
        assert!(*r >= BigInt::zero() && *r < modulus);
        assert!(evaluate(&f, r).is_multiple_of(&modulus));
    }
    assert_eq!(modulus, &roots[0] + &roots[1]);
}

#[test]
fn test_hensel_random() {
    LogAlgorithmSubscriber::init_test();
    let mut rng = oorandom::Rand64::new(1);
    for p in [2i64, 3, 5, 7] {
        for _ in 0..8 {
            let f = random_polynomial(&mut rng);
            let mut previous = Vec::new();
            for k in 1..5u32 {
                let modulus = p.pow(k);
                let roots = hensel(&f, &BigInt::from(p), k as usize).unwrap();
                for r in &roots {
                    assert!(*r >= BigInt::zero() && *r < BigInt::from(modulus));
                    assert!(evaluate(&f, r).is_multiple_of(&BigInt::from(modulus)));
                }
                let mut sorted = roots.clone();
                sorted.sort();
                assert_eq!(brute_force_roots(&f, modulus), sorted);

                if k > 1 {
                    let mut reduced = roots.iter().map(|r| r.mod_floor(&BigInt::from(modulus / p))).collect::<Vec<_>>();
                    reduced.sort();
                    reduced.dedup();
                    let mut lifted_from = previous.iter().filter(|r| roots.iter().any(|s| s.mod_floor(&BigInt::from(modulus / p)) == **r)).cloned().collect::<Vec<BigInt>>();
                    lifted_from.sort();
                    assert_eq!(lifted_from, reduced);
                }
                previous = roots;
            }
        }
    }
}

#[test]
fn test_lift_roots_invalid_exponent() {
    LogAlgorithmSubscriber::init_test();
    let f = Polynomial::from_coefficients([1, 0, 1]);
    let df = formal_derivative(&f);
    assert_eq!(Err(HenselError::InvalidExponent), lift_roots(&f, &df, &BigInt::from(5), 1, &ints([2, 3])));
    assert_eq!(Ok(ints([7, 18])), lift_roots(&f, &df, &BigInt::from(5), 2, &ints([2, 3])));
}

#[test]
fn test_hensel_errors() {
    LogAlgorithmSubscriber::init_test();
    let f = Polynomial::from_coefficients([1, 1, 7]);
    assert_eq!(Err(HenselError::InvalidExponent), hensel(&f, &BigInt::from(5), 0));
    assert_eq!(Err(HenselError::InvalidModulus), hensel(&f, &BigInt::from(1), 2));
    assert_eq!(Err(HenselError::InvalidModulus), hensel(&f, &BigInt::from(-5), 2));
    // 2x has the roots 0, 2 modulo 4, but 2 is not invertible modulo 4
    let f = Polynomial::from_coefficients([2, 0]);
    assert_eq!(Err(HenselError::NotInvertible), hensel(&f, &BigInt::from(4), 2));
}

#[test]
fn test_solve() {
    LogAlgorithmSubscriber::init_test();
    assert_eq!(Ok(ints([57, 68])), solve(&BigInt::from(5), 3, &ints([1, 0, 1])));
    assert_eq!(Err(HenselError::EmptyPolynomial), solve(&BigInt::from(5), 3, &[]));
    assert_eq!(Err(HenselError::InvalidExponent), solve(&BigInt::from(5), 0, &ints([1, 0, 1])));
    assert_eq!(Err(HenselError::InvalidExponent), solve(&BigInt::from(5), -2, &ints([1, 0, 1])));
}

#[cfg(test)]
#[derive(Clone)]
struct RecordProgress(Arc<Mutex<Vec<String>>>);

#[cfg(test)]
impl ComputationController for RecordProgress {

    fn log(&self, args: std::fmt::Arguments) {
        self.0.lock().unwrap().push(format!("{}", args));
    }
}

#[test]
fn test_hensel_with_controller() {
    LogAlgorithmSubscriber::init_test();
    let messages = Arc::new(Mutex::new(Vec::new()));
    let f = Polynomial::from_coefficients([1, 0, 1]);
    let roots = hensel_with_controller(&f, &BigInt::from(5), 3, RecordProgress(messages.clone())).unwrap();
    assert_eq!(ints([57, 68]), roots);
    assert_eq!(vec!["(mod=5^1, roots=2)", "(mod=5^2, roots=2)", "(mod=5^3, roots=2)"], *messages.lock().unwrap());
}

#[test]
fn test_solve_with_controller() {
    LogAlgorithmSubscriber::init_test();
    let messages = Arc::new(Mutex::new(Vec::new()));
    let roots = solve_with_controller(&BigInt::from(3), 2, &ints([1, 1, 7]), RecordProgress(messages.clone()));
    assert_eq!(Ok(ints([1, 4, 7])), roots);
    assert_eq!(vec!["(mod=3^1, roots=1)", "(mod=3^2, roots=3)"], *messages.lock().unwrap());

    // invalid input is rejected before any progress is reported
    let messages = Arc::new(Mutex::new(Vec::new()));
    assert_eq!(Err(HenselError::InvalidExponent), solve_with_controller(&BigInt::from(5), -1, &ints([1, 0, 1]), RecordProgress(messages.clone())));
    assert_eq!(Err(HenselError::EmptyPolynomial), solve_with_controller(&BigInt::from(5), 2, &[], RecordProgress(messages.clone())));
    assert!(messages.lock().unwrap().is_empty());
}
