//! Named debug channels and their emitters
//!
//! A [`Channel`] carries an immutable name, a randomly assigned terminal
//! color, and two private timing cursors: one seeded at creation for the
//! global delta, one tracking the previous emission on this channel.

use std::fmt;
use std::time::Instant;

use chrono::Utc;
use colored::{Color, Colorize};
use rand::Rng;

use crate::state;

/// Fixed palette used to tell channels apart in a terminal. Collisions
/// between channels are acceptable.
const PALETTE: [Color; 6] = [
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
];

/// A named trace channel.
///
/// Channels are ad hoc: there is no registry, and a dropped channel leaves
/// nothing behind. The same name may be used by any number of channels.
pub struct Channel {
    name: String,
    color: Color,
    last_global: Instant,
    last_local: Instant,
}

impl Channel {
    /// Create a channel named `name` with a random palette color.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            name: name.into(),
            color: PALETTE[rand::thread_rng().gen_range(0..PALETTE.len())],
            last_global: now,
            last_local: now,
        }
    }

    /// The channel's name, as matched against enable patterns.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Emit one trace line if this channel is currently enabled.
    ///
    /// Disabled or non-matching channels return immediately with no I/O and
    /// no timing-cursor mutation. Never panics and never reports an error to
    /// the caller. Prefer the [`emit!`](crate::emit) macro for printf-style
    /// arguments.
    pub fn emit(&mut self, args: fmt::Arguments<'_>) {
        if !state::query(&self.name) {
            return;
        }

        let now = Instant::now();
        let global = humanize_nanos(now.duration_since(self.last_global).as_nanos());
        let local = humanize_nanos(now.duration_since(self.last_local).as_nanos());

        // Pad before colorizing so escape bytes do not skew the columns.
        let line = format!(
            "{} {:<6} {} {} - {}\n",
            Utc::now().format("%H:%M:%S%.3f"),
            global,
            format!("{:<6}", local).color(self.color),
            self.name.as_str().color(self.color),
            args,
        );
        state::write_line(&line);

        self.last_global = now;
        self.last_local = now;
    }
}

/// Humanize a nanosecond count into the largest unit whose truncated value
/// is non-zero: `3s`, `2ms`, `1us`, `999ns`.
fn humanize_nanos(n: u128) -> String {
    if n >= 1_000_000_000 {
        format!("{}s", n / 1_000_000_000)
    } else if n >= 1_000_000 {
        format!("{}ms", n / 1_000_000)
    } else if n >= 1_000 {
        format!("{}us", n / 1_000)
    } else {
        format!("{}ns", n)
    }
}
