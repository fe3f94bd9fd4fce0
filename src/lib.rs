//! Runtime-gated debug channels
//!
//! Libraries and applications create named channels and emit printf-style
//! trace lines through them. Nothing is written unless an operator enables a
//! glob pattern matching the channel name, either via the `DEBUG` environment
//! variable at startup or live over the per-process control socket.
//!
//! ```no_run
//! dbgchan::init();
//!
//! let mut db = dbgchan::channel("mongo:connection");
//! dbgchan::emit!(db, "connected in {}ms", 14);
//! ```
//!
//! Patterns are comma-separated globs matched against the whole channel
//! name: `*` enables everything, `mongo:*` a whole library, `mongo:*,redis:*`
//! several at once.
//!
//! The control socket lives at `/tmp/dbgchan-<pid>.sock`; connect with any
//! line-oriented client (for example `nc -U`), send a pattern to enable it
//! and receive the trace stream, `d` to disable, `q` to end the session and
//! restore the previous output sink.

mod channel;
mod control;
mod pattern;
mod state;

use std::io::Write;
use std::path::PathBuf;

use once_cell::sync::OnceCell;

pub use channel::Channel;

/// Read the `DEBUG` environment variable and start the control-socket server.
///
/// Idempotent: only the first call has any effect. A control-socket bind
/// failure is logged and otherwise ignored; local tracing keeps working from
/// the environment-provided state.
pub fn init() {
    static STARTED: OnceCell<()> = OnceCell::new();
    STARTED.get_or_init(|| {
        match std::env::var("DEBUG") {
            Ok(env) if !env.is_empty() => enable(&env),
            _ => {}
        }
        if let Err(err) = control::spawn() {
            log::warn!("dbgchan: remote control unavailable: {:#}", err);
        }
    });
}

/// Enable channels matching the glob `pattern`, e.g. `"mongo:*,redis:*"`.
///
/// Replaces any previously active pattern. A malformed pattern is logged and
/// leaves the prior state untouched; use [`try_enable`] to observe the error.
pub fn enable(pattern: &str) {
    state::enable(pattern);
}

/// Like [`enable`], but returns the compilation error instead of logging it.
pub fn try_enable(pattern: &str) -> eyre::Result<()> {
    state::try_enable(pattern)
}

/// Disable all channels.
pub fn disable() {
    state::disable();
}

/// Create a named channel.
pub fn channel(name: impl Into<String>) -> Channel {
    Channel::new(name)
}

/// Redirect trace output to `sink`, returning the previous sink.
///
/// The default sink is stderr. The control server uses this to hand the
/// stream to a connected client; embedders can use it directly, typically in
/// tests, to capture output.
pub fn set_output<W: Write + Send + 'static>(sink: W) -> Box<dyn Write + Send> {
    state::set_output(sink)
}

/// Path of this process's control socket, whether or not it is bound.
pub fn control_socket_path() -> PathBuf {
    control::socket_path()
}

/// Emit a printf-style trace line through a [`Channel`].
///
/// ```no_run
/// let mut chan = dbgchan::channel("redis:get");
/// dbgchan::emit!(chan, "key={} took {}us", "user:1", 250);
/// ```
#[macro_export]
macro_rules! emit {
    ($chan:expr, $($arg:tt)*) => {
        $chan.emit(::core::format_args!($($arg)*))
    };
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;
    use std::sync::{Arc, Mutex, MutexGuard};

    use once_cell::sync::Lazy;

    static STATE: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    /// Serializes tests that touch the process-wide enable state or sink.
    pub(crate) fn lock_state() -> MutexGuard<'static, ()> {
        STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cloneable in-memory sink for capturing trace output.
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
