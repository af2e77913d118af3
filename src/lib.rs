//!
//! Computes all solutions of a polynomial congruence `f(x) = 0 mod p^k` for a prime `p`,
//! by finding the roots modulo `p` and lifting them with Hensel's Lemma.
//!
//! All arithmetic is done with arbitrary-precision integers from `num-bigint`, since the
//! roots grow like `p^k`.
//!
//! # Example
//! ```rust
//! # use num_bigint::BigInt;
//! # use hensel_lift::*;
//! let f = Polynomial::from_coefficients([1, 1, 7]);
//! // f'(1) = 3 vanishes modulo 3, so every lift of the root 1 is again a root
//! assert_eq!(vec![BigInt::from(1), BigInt::from(4), BigInt::from(7)], hensel(&f, &BigInt::from(3), 2).unwrap());
//! ```
//!

#[macro_use]
pub mod computation;
pub mod tracing;
pub mod poly;
pub mod algorithms;

pub use poly::Polynomial;
pub use algorithms::hensel::{hensel, hensel_with_controller, solve, solve_with_controller, HenselError};
pub use algorithms::eea::{solve_linear_diophantine, NoSolution};
