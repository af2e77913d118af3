use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::One;
use tracing::instrument;

const SMALL_PRIMES: [u32; 6] = [2, 3, 5, 7, 11, 13];

///
/// Miller-Rabin primality test.
///
/// If n is a prime, this returns true.
/// If n is not a prime, this returns false with probability greater or
/// equal than 1 - 4^(-k).
///
/// Complexity O(k log(n)^3)
///
/// # Randomness
///
/// The randomness used for this function is derived only from the input,
/// hence it will always yield the same output on the same input.
///
#[instrument(skip_all, level = "trace")]
pub fn is_prime(n: &BigInt, k: usize) -> bool {
    if *n < BigInt::from(2) {
        return false;
    }
    for p in SMALL_PRIMES {
        let p = BigInt::from(p);
        if *n == p {
            return true;
        } else if n.is_multiple_of(&p) {
            return false;
        }
    }

    let n_minus_one: BigInt = n - BigInt::one();
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;
    // witnesses are sampled from `[2, n - 2]`
    let witness_range: BigInt = n - BigInt::from(3);
    let mut rng = oorandom::Rand64::new(default_hash(n));

    'witness: for _ in 0..k {
        let a = BigInt::from(rng.rand_u64()) % &witness_range + BigInt::from(2);
        let mut current = a.modpow(&d, n);
        if current.is_one() || current == n_minus_one {
            continue;
        }
        for _ in 1..s {
            current = (&current * &current) % n;
            if current == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    return true;
}

fn default_hash(n: &BigInt) -> u128 {
    n.magnitude().iter_u64_digits().fold(0, |hash, digit| hash.wrapping_mul(0x100000001b3).wrapping_add(digit as u128))
}

#[cfg(test)]
use crate::tracing::LogAlgorithmSubscriber;

#[test]
fn test_is_prime() {
    LogAlgorithmSubscriber::init_test();
    let is_prime_i64 = |n: i64| is_prime(&BigInt::from(n), 10);
    assert!(is_prime_i64(2));
    assert!(is_prime_i64(3));
    assert!(is_prime_i64(5));
    assert!(is_prime_i64(7));
    assert!(is_prime_i64(11));
    assert!(is_prime_i64(22531));
    assert!(is_prime_i64(417581));
    assert!(is_prime_i64(68719476767));

    assert!(!is_prime_i64(-7));
    assert!(!is_prime_i64(0));
    assert!(!is_prime_i64(1));
    assert!(!is_prime_i64(4));
    assert!(!is_prime_i64(9));
    assert!(!is_prime_i64(22532));
    assert!(!is_prime_i64(347584));
    // Carmichael numbers
    assert!(!is_prime_i64(561));
    assert!(!is_prime_i64(41041));
    assert!(!is_prime_i64(825265));

    let mersenne_127: BigInt = "170141183460469231731687303715884105727".parse().unwrap();
    assert!(is_prime(&mersenne_127, 10));
    assert!(!is_prime(&(&mersenne_127 * BigInt::from(68719476767i64)), 10));
}

#[test]
fn test_is_prime_small() {
    LogAlgorithmSubscriber::init_test();
    for n in 0..2000i64 {
        let expected = n >= 2 && (2..n).take_while(|d| d * d <= n).all(|d| n % d != 0);
        assert_eq!(expected, is_prime(&BigInt::from(n), 10), "wrong result for {}", n);
    }
}
