//! Channel-level parser: recognizes the console's multi-message NRPN and
//! scene-change sequences and emits semantic mixer events.
//!
//! The caller feeds one channel message at a time, already filtered to the
//! session's MIDI channel (filtering is a session concern, not ours). A full
//! NRPN event spans four Control Change messages; a scene recall spans a Bank
//! Select plus a Program Change.

use tracing::{debug, trace};

use crate::message::MidiMessage;

const CC_NRPN_MSB: u8 = 0x63;
const CC_NRPN_LSB: u8 = 0x62;
const CC_DATA_VC: u8 = 0x06;
const CC_DATA_VF: u8 = 0x26;
const CC_BANK_SELECT: u8 = 0x00;

/// A semantic mixer event assembled from channel messages.
///
/// `msb`/`lsb` are the raw 7-bit NRPN address halves; resolving them back to
/// a source/sink pairing is the address calculator's reverse-map business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerEvent {
    /// A scene was recalled. Zero-based (the console UI shows scene 1 for 0).
    SceneRecalled { scene: u16 },
    Mute { msb: u8, lsb: u8, on: bool },
    FaderLevel { msb: u8, lsb: u8, vc: u8, vf: u8 },
    PanLevel { msb: u8, lsb: u8, vc: u8, vf: u8 },
}

#[derive(Debug, Clone, Copy)]
enum State {
    AwaitingFirst,
    AwaitingLsb { msb: u8 },
    AwaitingVc { msb: u8, lsb: u8 },
    AwaitingVf { msb: u8, lsb: u8, vc: u8 },
    AwaitingProgram { bank: u8 },
}

/// Assembles [`MixerEvent`]s from a stream of channel messages.
#[derive(Debug)]
pub struct ChannelParser {
    state: State,
}

impl Default for ChannelParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelParser {
    pub fn new() -> Self {
        Self {
            state: State::AwaitingFirst,
        }
    }

    /// Feed one channel message; returns at most one event.
    ///
    /// A message that does not fit the expected next step aborts the partial
    /// sequence and is re-examined once as the first message of a fresh one.
    /// If it fits nothing there either it is dropped, which is exactly how
    /// the console's spurious extra Program Change after a scene recall gets
    /// swallowed.
    pub fn handle(&mut self, msg: &MidiMessage) -> Option<MixerEvent> {
        let bytes = match msg {
            MidiMessage::Channel(bytes) => bytes.as_slice(),
            _ => return None,
        };

        match self.step(bytes) {
            Step::Event(event) => Some(event),
            Step::Advanced => None,
            Step::Mismatch => {
                if !matches!(self.state, State::AwaitingFirst) {
                    trace!(
                        state = ?self.state,
                        bytes = ?bytes,
                        "unexpected message aborts partial sequence, re-examining"
                    );
                    self.state = State::AwaitingFirst;
                    match self.step(bytes) {
                        Step::Event(event) => return Some(event),
                        Step::Advanced => return None,
                        Step::Mismatch => {}
                    }
                }
                trace!(bytes = ?bytes, "channel message outside any known sequence, dropped");
                None
            }
        }
    }

    fn step(&mut self, bytes: &[u8]) -> Step {
        let kind = bytes[0] >> 4;
        match self.state {
            State::AwaitingFirst => match (kind, bytes.get(1)) {
                (0xB, Some(&CC_NRPN_MSB)) => {
                    self.state = State::AwaitingLsb { msb: bytes[2] };
                    Step::Advanced
                }
                (0xB, Some(&CC_BANK_SELECT)) => {
                    self.state = State::AwaitingProgram { bank: bytes[2] };
                    Step::Advanced
                }
                _ => Step::Mismatch,
            },
            State::AwaitingLsb { msb } => match (kind, bytes.get(1)) {
                (0xB, Some(&CC_NRPN_LSB)) => {
                    self.state = State::AwaitingVc { msb, lsb: bytes[2] };
                    Step::Advanced
                }
                _ => Step::Mismatch,
            },
            State::AwaitingVc { msb, lsb } => match (kind, bytes.get(1)) {
                (0xB, Some(&CC_DATA_VC)) => {
                    self.state = State::AwaitingVf {
                        msb,
                        lsb,
                        vc: bytes[2],
                    };
                    Step::Advanced
                }
                _ => Step::Mismatch,
            },
            State::AwaitingVf { msb, lsb, vc } => match (kind, bytes.get(1)) {
                (0xB, Some(&CC_DATA_VF)) => {
                    self.state = State::AwaitingFirst;
                    Self::dispatch(msb, lsb, vc, bytes[2])
                }
                _ => Step::Mismatch,
            },
            State::AwaitingProgram { bank } => match kind {
                0xC => {
                    self.state = State::AwaitingFirst;
                    let scene = u16::from(bank & 0x7F) << 7 | u16::from(bytes[1]);
                    Step::Event(MixerEvent::SceneRecalled { scene })
                }
                _ => Step::Mismatch,
            },
        }
    }

    /// MSB-range dispatch for a completed NRPN sequence. These ranges are the
    /// backbone of the whole address scheme; keep them exact.
    fn dispatch(msb: u8, lsb: u8, vc: u8, vf: u8) -> Step {
        match msb {
            0x00 | 0x02 | 0x04 if vc == 0 && vf < 2 => Step::Event(MixerEvent::Mute {
                msb,
                lsb,
                on: vf == 1,
            }),
            0x40..=0x4F => Step::Event(MixerEvent::FaderLevel { msb, lsb, vc, vf }),
            0x50..=0x5E => Step::Event(MixerEvent::PanLevel { msb, lsb, vc, vf }),
            _ => {
                debug!(
                    msb = format_args!("{msb:#04x}"),
                    lsb = format_args!("{lsb:#04x}"),
                    vc,
                    vf,
                    "NRPN sequence outside known parameter ranges, dropped"
                );
                Step::Advanced
            }
        }
    }
}

enum Step {
    Advanced,
    Event(MixerEvent),
    Mismatch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::SmallVec;

    fn channel(bytes: &[u8]) -> MidiMessage {
        MidiMessage::Channel(SmallVec::from_slice(bytes))
    }

    fn run(parser: &mut ChannelParser, seqs: &[&[u8]]) -> Vec<MixerEvent> {
        seqs.iter()
            .filter_map(|bytes| parser.handle(&channel(bytes)))
            .collect()
    }

    #[test]
    fn test_mute_sequence() {
        let mut parser = ChannelParser::new();
        let events = run(
            &mut parser,
            &[
                &[0xB0, 0x63, 0x00],
                &[0xB0, 0x62, 0x2F],
                &[0xB0, 0x06, 0x00],
                &[0xB0, 0x26, 0x01],
            ],
        );
        assert_eq!(
            events,
            vec![MixerEvent::Mute {
                msb: 0x00,
                lsb: 0x2F,
                on: true
            }]
        );
    }

    #[test]
    fn test_fader_level_sequence() {
        let mut parser = ChannelParser::new();
        let events = run(
            &mut parser,
            &[
                &[0xB5, 0x63, 0x42],
                &[0xB5, 0x62, 0x4E],
                &[0xB5, 0x06, 0x7D],
                &[0xB5, 0x26, 0x00],
            ],
        );
        assert_eq!(
            events,
            vec![MixerEvent::FaderLevel {
                msb: 0x42,
                lsb: 0x4E,
                vc: 0x7D,
                vf: 0x00
            }]
        );
    }

    #[test]
    fn test_pan_level_sequence() {
        let mut parser = ChannelParser::new();
        let events = run(
            &mut parser,
            &[
                &[0xB0, 0x63, 0x50],
                &[0xB0, 0x62, 0x05],
                &[0xB0, 0x06, 0x3F],
                &[0xB0, 0x26, 0x7F],
            ],
        );
        assert_eq!(
            events,
            vec![MixerEvent::PanLevel {
                msb: 0x50,
                lsb: 0x05,
                vc: 0x3F,
                vf: 0x7F
            }]
        );
    }

    #[test]
    fn test_scene_recall_with_spurious_program_change() {
        let mut parser = ChannelParser::new();
        let events = run(
            &mut parser,
            &[&[0xB0, 0x00, 0x01], &[0xC0, 0x05], &[0xC0, 0x00]],
        );
        // The trailing Program Change must be swallowed, not emitted as a
        // second scene event.
        assert_eq!(events, vec![MixerEvent::SceneRecalled { scene: 0x85 }]);
    }

    #[test]
    fn test_mismatch_reexamined_as_fresh_first() {
        let mut parser = ChannelParser::new();
        // The second NRPN-MSB message aborts the first sequence but starts a
        // new one that then completes.
        let events = run(
            &mut parser,
            &[
                &[0xB0, 0x63, 0x40],
                &[0xB0, 0x63, 0x40],
                &[0xB0, 0x62, 0x00],
                &[0xB0, 0x06, 0x70],
                &[0xB0, 0x26, 0x00],
            ],
        );
        assert_eq!(
            events,
            vec![MixerEvent::FaderLevel {
                msb: 0x40,
                lsb: 0x00,
                vc: 0x70,
                vf: 0x00
            }]
        );
    }

    #[test]
    fn test_mute_dispatch_requires_mute_shaped_data() {
        let mut parser = ChannelParser::new();
        // MSB 0x00 but VC != 0: not a mute, not a level; dropped.
        let events = run(
            &mut parser,
            &[
                &[0xB0, 0x63, 0x00],
                &[0xB0, 0x62, 0x00],
                &[0xB0, 0x06, 0x05],
                &[0xB0, 0x26, 0x00],
            ],
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_unknown_msb_range_dropped() {
        let mut parser = ChannelParser::new();
        let events = run(
            &mut parser,
            &[
                &[0xB0, 0x63, 0x30],
                &[0xB0, 0x62, 0x00],
                &[0xB0, 0x06, 0x01],
                &[0xB0, 0x26, 0x00],
            ],
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_non_channel_messages_ignored() {
        let mut parser = ChannelParser::new();
        assert_eq!(parser.handle(&MidiMessage::SystemRealTime(0xF8)), None);
        assert_eq!(
            parser.handle(&MidiMessage::SystemExclusive(vec![0xF0, 0xF7])),
            None
        );
    }
}
