use std::fmt::Arguments;
use std::io::Write;

///
/// Receives progress information from long-running algorithms, such as
/// [`crate::algorithms::hensel::hensel_with_controller()`].
///
/// Messages are supposed to be short and are not terminated by a newline. It is
/// up to the controller to separate them from each other and from other output.
///
pub trait ComputationController: Clone {

    fn log(&self, args: Arguments);
}

#[macro_export]
macro_rules! log_progress {
    ($controller:expr, $($args:tt)*) => {
        ($controller).log(std::format_args!($($args)*))
    };
}

///
/// Writes all progress messages to stderr, one per line, so that they do not run
/// into the span lines printed by [`crate::tracing::LogAlgorithmSubscriber`].
/// We use `eprint!` instead of the handle returned by `std::io::stderr()`, since
/// this works with output capture in tests.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProgress;

impl ComputationController for LogProgress {

    fn log(&self, args: Arguments) {
        eprint!("{}", progress_line(args));
        _ = std::io::stderr().flush();
    }
}

fn progress_line(args: Arguments) -> String {
    format!("{}\n", args)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DontObserve;

impl ComputationController for DontObserve {

    fn log(&self, _args: Arguments) {}
}

#[test]
fn test_progress_line() {
    assert_eq!("(mod=5^1, roots=2)\n", progress_line(format_args!("(mod={}^{}, roots={})", 5, 1, 2)));
    let output = ["(mod=5^1, roots=2)", "(mod=5^2, roots=2)"].iter().map(|message| progress_line(format_args!("{}", message))).collect::<String>();
    assert_eq!(2, output.lines().count());
    assert_eq!(Some("(mod=5^2, roots=2)"), output.lines().last());
}
