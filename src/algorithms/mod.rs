///
/// Contains [`poly_eval::evaluate()`] and [`poly_eval::formal_derivative()`] for
/// integer polynomials.
///
pub mod poly_eval;
///
/// Contains the Extended Euclidean Algorithm and [`eea::solve_linear_diophantine()`],
/// which is used to compute modular inverses.
///
pub mod eea;
///
/// Contains an implementation of the Miller-Rabin probabilistic primality test.
///
pub mod miller_rabin;
///
/// Contains [`hensel::hensel()`], which computes the roots of an integer polynomial
/// modulo a prime power by lifting the roots modulo the prime.
///
pub mod hensel;
