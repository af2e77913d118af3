use std::cell::Cell;
use std::collections::HashMap;
use std::fmt::{Debug, Write};
use std::num::NonZeroU64;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use thread_local::ThreadLocal;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_core::dispatcher::SetGlobalDefaultError;
use tracing_core::Interest;
use tracing_core::span::Current;

struct SpanState {
    parent: Option<Id>,
    /// how many handles to the span currently exist; the span is removed
    /// from the span map once this reaches zero
    reference_counter: AtomicUsize,
    /// span name together with the recorded fields
    description: String,
    metadata: &'static Metadata<'static>,
    /// microseconds since creation of the subscriber, at the time the span was last entered
    entered_timestamp: AtomicU64,
    /// on which level of the span tree this span is
    depth: usize
}

///
/// A [`tracing::Subscriber`] that prints the tree of entered algorithm spans to stderr,
/// one line per span, indented by nesting depth and followed by the time spent in it.
///
/// Everything that is nested at least `max_depth` levels deep is not printed. For the
/// lifting algorithm, depth `0` is the whole computation, depth `1` a single lifting step
/// and depth `2` the arithmetic within it.
///
pub struct LogAlgorithmSubscriber {
    span_ids: AtomicU64,
    span_map: RwLock<HashMap<Id, SpanState>>,
    current_span: ThreadLocal<Cell<Option<NonZeroU64>>>,
    default_instant: Instant,
    interested_level: RangeInclusive<Level>,
    max_depth: usize,
    /// if set, lines are collected here instead of printed
    captured_lines: Option<Arc<Mutex<Vec<String>>>>
}

impl LogAlgorithmSubscriber {

    pub fn new(levels: RangeInclusive<Level>, max_depth: usize) -> Self {
        Self {
            span_ids: AtomicU64::new(1),
            span_map: RwLock::new(HashMap::new()),
            current_span: ThreadLocal::new(),
            default_instant: Instant::now(),
            interested_level: levels,
            max_depth: max_depth,
            captured_lines: None
        }
    }

    #[cfg(test)]
    fn capturing(levels: RangeInclusive<Level>, max_depth: usize) -> (Self, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let mut result = Self::new(levels, max_depth);
        result.captured_lines = Some(lines.clone());
        return (result, lines);
    }

    ///
    /// Installs the subscriber as global default. Fails if another global
    /// default has already been set.
    ///
    pub fn init(levels: RangeInclusive<Level>, max_depth: usize) -> Result<(), SetGlobalDefaultError> {
        tracing::subscriber::set_global_default(Self::new(levels, max_depth))
    }

    ///
    /// Like [`LogAlgorithmSubscriber::init()`] with settings suitable for tests, but does nothing
    /// if a global default is already set (e.g. by another test).
    ///
    pub fn init_test() {
        _ = tracing::subscriber::set_global_default(Self::new(Level::INFO..=Level::INFO, 2));
    }

    fn span_map<'a>(&'a self) -> RwLockReadGuard<'a, HashMap<Id, SpanState>> {
        self.span_map.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn span_map_mut<'a>(&'a self) -> RwLockWriteGuard<'a, HashMap<Id, SpanState>> {
        self.span_map.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_span_cell(&self) -> &Cell<Option<NonZeroU64>> {
        self.current_span.get_or(|| Cell::new(None))
    }

    fn current_id(&self) -> Option<Id> {
        self.current_span_cell().get().map(Id::from_non_zero_u64)
    }

    fn elapsed_micros(&self) -> u64 {
        Instant::now().duration_since(self.default_instant).as_micros() as u64
    }

    ///
    /// Returns the line as printed for a span at the given depth, or `None` if
    /// the span is nested too deeply.
    ///
    fn format_line(&self, depth: usize, line: std::fmt::Arguments) -> Option<String> {
        if depth < self.max_depth {
            Some(format!("{}{}", "  ".repeat(depth), line))
        } else {
            None
        }
    }

    fn print_line(&self, depth: usize, line: std::fmt::Arguments) {
        let Some(line) = self.format_line(depth, line) else {
            return;
        };
        match &self.captured_lines {
            Some(lines) => lines.lock().unwrap_or_else(PoisonError::into_inner).push(line),
            None => eprintln!("{}", line)
        }
    }
}

#[derive(Default)]
struct FieldRecorder {
    message: Option<String>,
    fields: Option<String>
}

impl FieldRecorder {

    fn finish(self, name: &str) -> String {
        let mut result = name.to_owned();
        if let Some(message) = self.message {
            if !result.is_empty() {
                result.push(' ');
            }
            result.push_str(&message);
        }
        if let Some(fields) = self.fields {
            _ = write!(&mut result, "({})", fields);
        }
        return result;
    }
}

impl Visit for FieldRecorder {

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else if let Some(fields) = &mut self.fields {
            _ = write!(fields, ", {}={:?}", field.name(), value);
        } else {
            self.fields = Some(format!("{}={:?}", field.name(), value));
        }
    }
}

impl Subscriber for LogAlgorithmSubscriber {

    fn register_callsite(&self, metadata: &'static Metadata<'static>) -> Interest {
        if self.interested_level.contains(metadata.level()) {
            Interest::always()
        } else {
            Interest::never()
        }
    }

    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.interested_level.contains(metadata.level())
    }

    fn current_span(&self) -> Current {
        let spans = self.span_map();
        match self.current_id().and_then(|id| spans.get(&id).map(|span| (id, span.metadata))) {
            Some((id, metadata)) => Current::new(id, metadata),
            None => Current::none()
        }
    }

    fn new_span(&self, span: &Attributes<'_>) -> Id {
        let id = Id::from_u64(self.span_ids.fetch_add(1, Ordering::Relaxed));
        let parent = if span.is_root() {
            None
        } else {
            span.parent().cloned().or_else(|| self.current_id())
        };
        let mut description = FieldRecorder::default();
        span.record(&mut description);

        let mut spans = self.span_map_mut();
        let depth = parent.as_ref().and_then(|parent| spans.get(parent)).map(|parent| parent.depth + 1).unwrap_or(0);
        spans.insert(id.clone(), SpanState {
            parent: parent,
            reference_counter: AtomicUsize::new(1),
            description: description.finish(span.metadata().name()),
            metadata: span.metadata(),
            entered_timestamp: AtomicU64::new(0),
            depth: depth
        });
        return id;
    }

    fn record(&self, span: &Id, values: &Record<'_>) {
        let mut recorder = FieldRecorder::default();
        values.record(&mut recorder);
        if let Some(state) = self.span_map_mut().get_mut(span) {
            state.description.push_str(&recorder.finish(""));
        }
    }

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {
        // we only care about parent spans currently
    }

    fn event(&self, event: &Event<'_>) {
        let depth = {
            let spans = self.span_map();
            self.current_id().and_then(|id| spans.get(&id).map(|span| span.depth + 1)).unwrap_or(0)
        };
        let mut description = FieldRecorder::default();
        event.record(&mut description);
        self.print_line(depth, format_args!("{}", description.finish("")));
    }

    fn enter(&self, span: &Id) {
        self.current_span_cell().set(Some(span.into_non_zero_u64()));
        let spans = self.span_map();
        if let Some(entered_span) = spans.get(span) {
            self.print_line(entered_span.depth, format_args!("{}", entered_span.description));
            entered_span.entered_timestamp.store(self.elapsed_micros(), Ordering::SeqCst);
        }
    }

    fn exit(&self, span: &Id) {
        let spans = self.span_map();
        let parent = if let Some(exited_span) = spans.get(span) {
            let time = self.elapsed_micros().saturating_sub(exited_span.entered_timestamp.load(Ordering::SeqCst));
            self.print_line(exited_span.depth, format_args!("done({}us)", time));
            exited_span.parent.as_ref().map(Id::into_non_zero_u64)
        } else {
            None
        };
        self.current_span_cell().set(parent);
    }

    fn clone_span(&self, id: &Id) -> Id {
        if let Some(span) = self.span_map().get(id) {
            _ = span.reference_counter.fetch_add(1, Ordering::Relaxed);
        }
        return id.clone();
    }

    fn try_close(&self, id: Id) -> bool {
        let remaining_handles = match self.span_map().get(&id) {
            Some(span) => span.reference_counter.fetch_sub(1, Ordering::Relaxed) - 1,
            None => return false
        };
        if remaining_handles == 0 {
            _ = self.span_map_mut().remove(&id);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
use num_bigint::BigInt;
#[cfg(test)]
use crate::algorithms::hensel::hensel;
#[cfg(test)]
use crate::poly::Polynomial;

#[test]
fn test_span_tree_is_cleaned_up() {
    let subscriber = std::sync::Arc::new(LogAlgorithmSubscriber::new(Level::INFO..=Level::TRACE, 2));
    let f = Polynomial::from_coefficients([1, 0, -2]);
    let roots = tracing::subscriber::with_default(subscriber.clone(), || hensel(&f, &BigInt::from(7), 4)).unwrap();
    assert_eq!(2, roots.len());
    assert!(subscriber.span_map().is_empty());
    assert!(subscriber.current_id().is_none());
}

#[test]
fn test_field_recorder() {
    let mut recorder = FieldRecorder::default();
    recorder.message = Some("lifted".to_owned());
    recorder.fields = Some("k=3, roots=2".to_owned());
    assert_eq!("step lifted(k=3, roots=2)", recorder.finish("step"));
    assert_eq!("", FieldRecorder::default().finish(""));
}

#[test]
fn test_format_line() {
    let subscriber = LogAlgorithmSubscriber::new(Level::INFO..=Level::INFO, 2);
    assert_eq!(Some("hensel(k=3)".to_owned()), subscriber.format_line(0, format_args!("hensel(k={})", 3)));
    assert_eq!(Some("  done(12us)".to_owned()), subscriber.format_line(1, format_args!("done({}us)", 12)));
    assert_eq!(None, subscriber.format_line(2, format_args!("evaluate")));
    assert_eq!(None, LogAlgorithmSubscriber::new(Level::INFO..=Level::INFO, 0).format_line(0, format_args!("hensel")));
}

#[cfg(test)]
fn assert_done_line(indent: &str, line: &str) {
    let micros = line.strip_prefix(indent).and_then(|l| l.strip_prefix("done(")).and_then(|l| l.strip_suffix("us)"));
    assert!(micros.is_some_and(|micros| micros.parse::<u64>().is_ok()), "not a done line: {:?}", line);
}

#[test]
fn test_printed_span_tree() {
    let f = Polynomial::from_coefficients([1, 0, -2]);

    let (subscriber, lines) = LogAlgorithmSubscriber::capturing(Level::INFO..=Level::DEBUG, 2);
    tracing::subscriber::with_default(subscriber, || hensel(&f, &BigInt::from(7), 3)).unwrap();
    let lines = lines.lock().unwrap().clone();
    assert_eq!(8, lines.len(), "{:?}", lines);
    assert_eq!("hensel_with_controller(p=7, k=3)", lines[0]);
    assert_eq!("  roots_mod_prime", lines[1]);
    assert_done_line("  ", &lines[2]);
    assert_eq!("  lift_roots(k=2)", lines[3]);
    assert_done_line("  ", &lines[4]);
    assert_eq!("  lift_roots(k=3)", lines[5]);
    assert_done_line("  ", &lines[6]);
    assert_done_line("", &lines[7]);

    // nested spans are suppressed, but still tracked
    let (subscriber, lines) = LogAlgorithmSubscriber::capturing(Level::INFO..=Level::DEBUG, 1);
    tracing::subscriber::with_default(subscriber, || hensel(&f, &BigInt::from(7), 3)).unwrap();
    let lines = lines.lock().unwrap().clone();
    assert_eq!(2, lines.len(), "{:?}", lines);
    assert_eq!("hensel_with_controller(p=7, k=3)", lines[0]);
    assert_done_line("", &lines[1]);
}

#[test]
fn test_printed_primality_test() {
    let (subscriber, lines) = LogAlgorithmSubscriber::capturing(Level::INFO..=Level::TRACE, 1);
    assert!(tracing::subscriber::with_default(subscriber, || crate::algorithms::miller_rabin::is_prime(&BigInt::from(7919), 5)));
    let lines = lines.lock().unwrap().clone();
    assert_eq!(2, lines.len(), "{:?}", lines);
    assert_eq!("is_prime", lines[0]);
    assert_done_line("", &lines[1]);
}
