//! Unix-socket control server
//!
//! Each process exposes a socket at `/tmp/dbgchan-<pid>.sock` so concurrent
//! instances never collide. A connected client becomes the trace sink for the
//! duration of its session and can steer enablement with one command per
//! line: any other text is compiled and enabled as a pattern, `d`/`disable`
//! turns tracing off, and `q`/`quit` (or a disconnect) ends the session and
//! restores the previous sink.

use std::io::{BufRead, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::thread;

use eyre::{Context, Result};

use crate::state;

/// Control-socket path for this process.
pub(crate) fn socket_path() -> PathBuf {
    PathBuf::from(format!("/tmp/dbgchan-{}.sock", std::process::id()))
}

/// Bind the control socket and start the accept loop on a background thread.
///
/// Sessions are handled one at a time; a second client queues at the
/// listener until the current session ends. Returns the bound path.
pub(crate) fn spawn() -> Result<PathBuf> {
    let path = socket_path();
    if path.exists() {
        std::fs::remove_file(&path)
            .with_context(|| format!("failed to remove stale socket {}", path.display()))?;
    }

    let listener = UnixListener::bind(&path)
        .with_context(|| format!("failed to bind control socket {}", path.display()))?;
    log::info!("dbgchan: control socket listening on {}", path.display());

    thread::Builder::new()
        .name("dbgchan-control".into())
        .spawn(move || accept_loop(listener))
        .context("failed to spawn control-socket thread")?;

    Ok(path)
}

fn accept_loop(listener: UnixListener) {
    loop {
        match listener.accept() {
            Ok((stream, _addr)) => session(stream),
            Err(err) => log::warn!("dbgchan: failed to accept control connection: {}", err),
        }
    }
}

/// Run one control session: hijack the sink, process commands until the peer
/// quits or disconnects, then disable tracing and restore the previous sink.
fn session(stream: UnixStream) {
    let writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(err) => {
            log::warn!("dbgchan: failed to clone control stream: {}", err);
            return;
        }
    };

    log::info!("dbgchan: control session started");
    let prev = state::set_output(writer);

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                log::warn!("dbgchan: control peer disconnected, disabling");
                break;
            }
            Ok(_) => match line.trim() {
                "quit" | "q" => {
                    log::info!("dbgchan: quit");
                    break;
                }
                "disable" | "d" => {
                    log::info!("dbgchan: disabling");
                    state::disable();
                }
                "" => {}
                pattern => {
                    log::info!("dbgchan: enabling {:?}", pattern);
                    state::enable(pattern);
                }
            },
            Err(err) => {
                log::warn!("dbgchan: control read failed, disabling: {}", err);
                break;
            }
        }
    }

    state::disable();
    state::set_output(prev);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_path_embeds_pid() {
        let path = socket_path().display().to_string();
        assert!(path.starts_with("/tmp/dbgchan-"));
        assert!(path.ends_with(".sock"));
        assert!(path.contains(&std::process::id().to_string()));
    }
}
