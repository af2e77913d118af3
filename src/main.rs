use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use num_bigint::BigInt;
use tracing::Level;

use hensel_lift::algorithms::miller_rabin::is_prime;
use hensel_lift::computation::LogProgress;
use hensel_lift::tracing::LogAlgorithmSubscriber;
use hensel_lift::{solve, solve_with_controller, Polynomial};

const MILLER_RABIN_ROUNDS: usize = 20;

/// Finds all solutions of a_n x^n + ... + a_1 x + a_0 = 0 mod p^k using Hensel's Lemma.
///
/// For example, to solve x^2 + x + 7 = 0 mod 25, run `hensel 5 2 1 1 7`.
#[derive(Parser, Debug)]
#[command(name = "hensel", version)]
struct Args {
    /// The prime p
    #[arg(allow_negative_numbers = true)]
    p: BigInt,

    /// The exponent k >= 1
    #[arg(allow_negative_numbers = true)]
    k: i64,

    /// The coefficients a_n, ..., a_0, highest degree first
    #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
    coefficients: Vec<BigInt>,

    /// Print the algorithm spans to stderr (repeat for more detail)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Print the number of roots found modulo each power of p to stderr
    #[arg(long)]
    progress: bool,

    /// Do not warn if p is not prime
    #[arg(long)]
    skip_prime_check: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose > 0 {
        let finest = match args.verbose {
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE
        };
        LogAlgorithmSubscriber::init(Level::INFO..=finest, args.verbose as usize)
            .context("failed to install the tracing subscriber")?;
    }

    if !args.skip_prime_check && !is_prime(&args.p, MILLER_RABIN_ROUNDS) {
        eprintln!("warning: {} is not prime, the solutions may be incomplete", args.p);
    }

    let f = Polynomial::new(args.coefficients);
    println!("Using Hensel's Lemma to find solutions for:");
    println!("{} mod {}^{} = 0", f, args.p, args.k);

    let roots = if args.progress {
        solve_with_controller(&args.p, args.k, f.coefficients(), LogProgress)
    } else {
        solve(&args.p, args.k, f.coefficients())
    };
    let roots = roots.with_context(|| format!("failed to solve {} mod {}^{} = 0", f, args.p, args.k))?;

    println!("Solutions: [{}]", roots.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", "));
    return Ok(());
}

#[test]
fn test_parse_args() {
    let args = Args::try_parse_from(["hensel", "5", "2", "1", "-1", "-7"]).unwrap();
    assert_eq!(BigInt::from(5), args.p);
    assert_eq!(2, args.k);
    assert_eq!(vec![BigInt::from(1), BigInt::from(-1), BigInt::from(-7)], args.coefficients);
    assert_eq!(0, args.verbose);

    let args = Args::try_parse_from(["hensel", "-vv", "--progress", "3", "4", "1", "1", "7"]).unwrap();
    assert_eq!(2, args.verbose);
    assert!(args.progress);
    assert!(!args.skip_prime_check);

    assert!(Args::try_parse_from(["hensel", "5", "2"]).is_err());
    assert!(Args::try_parse_from(["hensel", "5", "2", "x"]).is_err());
}
