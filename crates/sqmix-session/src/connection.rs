//! TCP transport: a dedicated writer thread draining a bounded queue with
//! paced sends, plus a status cell the host can poll.
//!
//! Pacing is deliberate backpressure, not a performance hack: a full-status
//! refresh queues thousands of "get" requests, and the console's input
//! buffer overruns if they are blasted out back-to-back.

use std::io::Write;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use arc_swap::ArcSwap;
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The console's fixed MIDI-over-TCP port.
pub const DEFAULT_PORT: u16 = 51325;

/// Anything that accepts outgoing raw MIDI bytes.
///
/// [`Connection`] is the production implementation; tests substitute a
/// collector to observe outbound traffic.
pub trait MidiSink: Send + Sync + 'static {
    fn send(&self, bytes: &[u8]);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// Inter-command pacing: sleep `delay` after every `every` commands.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Pacing {
    pub every: usize,
    pub delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            every: 1,
            delay: Duration::from_millis(2),
        }
    }
}

enum WriteCommand {
    Bytes(Vec<u8>),
    Shutdown,
}

/// One TCP connection to a console. Clone is cheap (shared queue).
#[derive(Clone)]
pub struct Connection {
    tx: Sender<WriteCommand>,
    status: Arc<ArcSwap<ConnectionStatus>>,
    stream: Arc<TcpStream>,
}

impl Connection {
    /// Connect and spawn the writer thread. Returns the connection plus a
    /// cloned stream handle for the session's reader loop.
    pub fn connect(addr: impl ToSocketAddrs, pacing: Pacing) -> crate::Result<(Self, TcpStream)> {
        let status = Arc::new(ArcSwap::new(Arc::new(ConnectionStatus::Connecting)));
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let reader = stream.try_clone()?;

        let (tx, rx) = bounded(1024);
        let writer = stream.try_clone()?;
        let writer_status = Arc::clone(&status);
        thread::Builder::new()
            .name("sqmix-writer".into())
            .spawn(move || writer_loop(writer, rx, pacing, writer_status))
            .expect("failed to spawn writer thread");

        status.store(Arc::new(ConnectionStatus::Connected));
        debug!("console connection established");
        Ok((
            Self {
                tx,
                status,
                stream: Arc::new(stream),
            },
            reader,
        ))
    }

    pub fn status(&self) -> ConnectionStatus {
        **self.status.load()
    }

    /// The shared status cell, for wiring into a session's reader loop.
    pub fn status_cell(&self) -> Arc<ArcSwap<ConnectionStatus>> {
        Arc::clone(&self.status)
    }

    /// Tear the connection down: stop the writer and close both stream
    /// directions, which also unblocks the reader loop.
    pub fn shutdown(&self) {
        let _ = self.tx.send(WriteCommand::Shutdown);
        let _ = self.stream.shutdown(Shutdown::Both);
        self.status.store(Arc::new(ConnectionStatus::Disconnected));
    }
}

impl MidiSink for Connection {
    fn send(&self, bytes: &[u8]) {
        if self.tx.send(WriteCommand::Bytes(bytes.to_vec())).is_err() {
            debug!("write after disconnect dropped");
        }
    }
}

fn writer_loop(
    mut stream: TcpStream,
    rx: Receiver<WriteCommand>,
    pacing: Pacing,
    status: Arc<ArcSwap<ConnectionStatus>>,
) {
    let mut sent = 0usize;
    while let Ok(command) = rx.recv() {
        match command {
            WriteCommand::Bytes(bytes) => {
                if let Err(err) = stream.write_all(&bytes) {
                    warn!(%err, "console write failed, closing connection");
                    break;
                }
                sent += 1;
                if pacing.every > 0 && sent % pacing.every == 0 && !pacing.delay.is_zero() {
                    thread::sleep(pacing.delay);
                }
            }
            WriteCommand::Shutdown => break,
        }
    }
    status.store(Arc::new(ConnectionStatus::Disconnected));
    debug!("writer thread stopped");
}
