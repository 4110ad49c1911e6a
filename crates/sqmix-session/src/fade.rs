//! Fade engine: synthesizes smooth level ramps the hardware has no native
//! primitive for.
//!
//! A fade is a straight line in dB space sampled every 50 ms; each step's
//! value is taken at the midpoint of that step's time interval, which
//! averages out the staircase a listener would otherwise perceive. The 50 ms
//! cadence is observable behavior that downstream feedback relies on; keep
//! it. Degenerate fades (zero duration, identical endpoints) collapse to a
//! single immediate set, which is also the normal path for plain level sets
//! since the console does not reliably echo levels changed by scene recall.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{after, bounded, never, select, Receiver, Sender};
use tracing::debug;

use sqmix_proto::{kind, level_to_data, FaderLaw, Level, Nrpn};

use crate::commands;
use crate::connection::MidiSink;
use crate::store::{level_key, ChangeListener, StateStore};

const STEP_INTERVAL_MS: f64 = 50.0;
const COALESCE_THRESHOLD: Duration = Duration::from_millis(5);

/// The fade step plan: `(offset from fade start, level to set)`.
///
/// Pure so the cadence and midpoint math are testable without a clock:
/// - zero duration or equal endpoints → one step at offset zero;
/// - duration within the coalesce threshold → one step at `duration`;
/// - otherwise steps every 50 ms (the last one shortened), each valued at
///   the midpoint of its interval, plus a landing step exactly at
///   `duration` carrying the exact end level.
pub(crate) fn plan(start: Level, end: Level, duration: Duration) -> Vec<(Duration, Level)> {
    if duration.is_zero() || start == end {
        return vec![(Duration::ZERO, end)];
    }
    if duration <= COALESCE_THRESHOLD {
        return vec![(duration, end)];
    }

    let total_ms = duration.as_secs_f64() * 1000.0;
    let from = f64::from(start.fade_db());
    let to = f64::from(end.fade_db());

    let mut steps = Vec::new();
    let mut t = 0.0;
    while t < total_ms {
        let len = (total_ms - t).min(STEP_INTERVAL_MS);
        let fraction = (t + len / 2.0) / total_ms;
        let db = from + (to - from) * fraction;
        steps.push((Duration::from_secs_f64(t / 1000.0), finite_or_off(db)));
        t += STEP_INTERVAL_MS;
    }
    steps.push((duration, end));
    steps
}

fn finite_or_off(db: f64) -> Level {
    if db <= -89.0 {
        Level::Off
    } else {
        Level::Db(db.min(10.0) as f32)
    }
}

struct FadeContext {
    channel: u8,
    law: FaderLaw,
    sink: Arc<dyn MidiSink>,
    store: Arc<StateStore>,
    listener: Arc<dyn ChangeListener>,
}

impl FadeContext {
    fn write_level(&self, msb: u8, lsb: u8, level: Level) {
        let (vc, vf) = level_to_data(level, self.law);
        self.sink
            .send(&commands::nrpn_set(self.channel, msb, lsb, vc, vf));
        let address = u16::from(msb) << 7 | u16::from(lsb);
        if self.store.set_level(address, vc, vf) {
            self.listener.level_changed(&level_key(msb, lsb), vc, vf);
        }
    }
}

enum FadeCommand {
    Start {
        address: u16,
        msb: u8,
        lsb: u8,
        steps: VecDeque<(Instant, Level)>,
    },
    Shutdown,
}

/// Schedules level ramps on one dedicated timer thread.
///
/// Fades on distinct addresses run concurrently without coordination (they
/// write disjoint addresses); a fresh fade on an address replaces the one
/// already running there. Shutdown cancels everything in flight, so no step
/// can ever write to a dead connection.
pub struct FadeEngine {
    tx: Sender<FadeCommand>,
    ctx: Arc<FadeContext>,
}

impl FadeEngine {
    pub fn new(
        channel: u8,
        law: FaderLaw,
        sink: Arc<dyn MidiSink>,
        store: Arc<StateStore>,
        listener: Arc<dyn ChangeListener>,
    ) -> Self {
        let ctx = Arc::new(FadeContext {
            channel,
            law,
            sink,
            store,
            listener,
        });
        let (tx, rx) = bounded(256);
        let worker_ctx = Arc::clone(&ctx);
        thread::Builder::new()
            .name("sqmix-fader".into())
            .spawn(move || worker(rx, worker_ctx))
            .expect("failed to spawn fade thread");
        Self { tx, ctx }
    }

    /// Set a level immediately, with no timer involved.
    pub fn set(&self, nrpn: Nrpn<kind::Level>, level: Level) {
        self.ctx.write_level(nrpn.msb(), nrpn.lsb(), level);
    }

    /// Ramp an address from `start` to `end` over `duration`.
    pub fn fade(&self, nrpn: Nrpn<kind::Level>, start: Level, end: Level, duration: Duration) {
        let steps = plan(start, end, duration);
        if steps.len() == 1 && steps[0].0.is_zero() {
            self.ctx.write_level(nrpn.msb(), nrpn.lsb(), steps[0].1);
            return;
        }
        let now = Instant::now();
        let steps = steps
            .into_iter()
            .map(|(offset, level)| (now + offset, level))
            .collect();
        if self
            .tx
            .send(FadeCommand::Start {
                address: nrpn.as_u14(),
                msb: nrpn.msb(),
                lsb: nrpn.lsb(),
                steps,
            })
            .is_err()
        {
            debug!("fade after shutdown dropped");
        }
    }

    /// Cancel all in-flight fades and stop the timer thread.
    pub fn shutdown(&self) {
        let _ = self.tx.send(FadeCommand::Shutdown);
    }
}

impl Drop for FadeEngine {
    fn drop(&mut self) {
        let _ = self.tx.send(FadeCommand::Shutdown);
    }
}

struct ActiveFade {
    msb: u8,
    lsb: u8,
    steps: VecDeque<(Instant, Level)>,
}

fn worker(rx: Receiver<FadeCommand>, ctx: Arc<FadeContext>) {
    let mut fades: HashMap<u16, ActiveFade> = HashMap::new();
    loop {
        let next_due = fades
            .values()
            .filter_map(|fade| fade.steps.front())
            .map(|(due, _)| *due)
            .min();
        let timer = match next_due {
            Some(due) => after(due.saturating_duration_since(Instant::now())),
            None => never(),
        };

        select! {
            recv(rx) -> command => match command {
                Ok(FadeCommand::Start { address, msb, lsb, steps }) => {
                    // Supersede any fade already running on this address.
                    fades.insert(address, ActiveFade { msb, lsb, steps });
                }
                Ok(FadeCommand::Shutdown) | Err(_) => break,
            },
            recv(timer) -> _ => {
                let now = Instant::now();
                fades.retain(|_, fade| {
                    while fade
                        .steps
                        .front()
                        .is_some_and(|(due, _)| *due <= now)
                    {
                        let (_, level) = fade.steps.pop_front().expect("front just checked");
                        ctx.write_level(fade.msb, fade.lsb, level);
                    }
                    !fade.steps.is_empty()
                });
            }
        }
    }
    debug!("fade thread stopped");
}
