//! Process-wide enable state and output sink
//!
//! One guarded singleton holds the active matcher and the current output
//! sink. The enabled flag is a lock-free atomic read on the emit fast path;
//! the matcher and sink live behind a single mutex, held across the
//! compile-and-install sequence and across every write, so a reader never
//! observes a half-installed matcher or a sink mid-swap.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use eyre::Result;
use once_cell::sync::Lazy;

use crate::pattern::Matcher;

struct Guarded {
    matcher: Option<Matcher>,
    sink: Box<dyn Write + Send>,
}

static ENABLED: AtomicBool = AtomicBool::new(false);

static GUARDED: Lazy<Mutex<Guarded>> = Lazy::new(|| {
    Mutex::new(Guarded {
        matcher: None,
        sink: Box::new(io::stderr()),
    })
});

fn lock() -> MutexGuard<'static, Guarded> {
    // Recover from poisoning: the guarded state is valid after a writer panic.
    GUARDED.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Compile `pattern` and install it as the active matcher, enabling tracing.
///
/// Last writer wins. On compile failure the prior state is left untouched
/// and the error is returned.
pub fn try_enable(pattern: &str) -> Result<()> {
    let matcher = Matcher::compile(pattern)?;
    let guarded = &mut *lock();
    guarded.matcher = Some(matcher);
    ENABLED.store(true, Ordering::SeqCst);
    Ok(())
}

/// Like [`try_enable`], but logs the failure instead of returning it.
pub fn enable(pattern: &str) {
    if let Err(err) = try_enable(pattern) {
        log::error!("dbgchan: failed to enable pattern {:?}: {:#}", pattern, err);
    }
}

/// Disable all tracing. The matcher may stay installed; the cleared flag
/// short-circuits every query.
pub fn disable() {
    ENABLED.store(false, Ordering::SeqCst);
}

/// Whether a channel named `name` should produce output right now.
pub fn query(name: &str) -> bool {
    if !ENABLED.load(Ordering::SeqCst) {
        return false;
    }
    lock().matcher.as_ref().is_some_and(|m| m.matches(name))
}

/// Swap the output sink, returning the previous one. Default is stderr.
pub fn set_output<W: Write + Send + 'static>(sink: W) -> Box<dyn Write + Send> {
    std::mem::replace(&mut lock().sink, Box::new(sink))
}

/// Write one formatted line to the current sink. Best effort: failures are
/// logged, never surfaced to the emitting caller.
pub(crate) fn write_line(line: &str) {
    let guarded = &mut *lock();
    let result = guarded.sink.write_all(line.as_bytes()).and_then(|()| guarded.sink.flush());
    if let Err(err) = result {
        log::warn!("dbgchan: sink write failed: {}", err);
    }
}
