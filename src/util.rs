// util.rs

use std::io::{self, Write};

/// Writes `s` and a newline, treating a closed pipe as success so piping the
/// REPL into `head` does not abort the session.
pub fn writeln_ignore_broken_pipe<W: Write, S: AsRef<str>>(mut w: W, s: S) -> io::Result<()> {
    match writeln!(w, "{}", s.as_ref()).and_then(|()| w.flush()) {
        Err(ref e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
