// src/exec/streams.rs

//! Line reader tasks for the child's output streams.
//!
//! Each stream gets its own task so a chatty stderr never stalls stdout (and
//! the other way around).

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::ProcessEvent;

/// Which output stream a reader is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn label(&self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }

    fn event(&self, line: String) -> ProcessEvent {
        match self {
            OutputStream::Stdout => ProcessEvent::Stdout(line),
            OutputStream::Stderr => ProcessEvent::Stderr(line),
        }
    }
}

/// Spawn a task that sends one event per line of `reader` until EOF.
///
/// Invalid UTF-8 is replaced rather than ending the stream. A final line
/// without a trailing newline is still delivered.
pub fn spawn_line_reader<R>(
    reader: R,
    stream: OutputStream,
    events: mpsc::Sender<ProcessEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    trim_newline(&mut buf);
                    let line = String::from_utf8_lossy(&buf).into_owned();

                    match stream {
                        OutputStream::Stdout => debug!(stream = "stdout", "[crawler] {}", line),
                        OutputStream::Stderr => warn!(stream = "stderr", "[crawler] {}", line),
                    }

                    if events.send(stream.event(line)).await.is_err() {
                        debug!(stream = stream.label(), "event receiver dropped; stopping reader");
                        break;
                    }
                }
                Err(e) => {
                    warn!(stream = stream.label(), error = %e, "failed to read crawler output");
                    break;
                }
            }
        }

        debug!(stream = stream.label(), "output stream closed");
    })
}

fn trim_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}
