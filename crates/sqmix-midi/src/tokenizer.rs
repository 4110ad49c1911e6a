//! Byte-stream tokenizer: raw socket bytes in, whole MIDI messages out.
//!
//! The console's TCP stream fragments arbitrarily, so the tokenizer keeps an
//! internal buffer with a scan cursor and an explicit state enum; callers
//! [`feed`](Tokenizer::feed) bytes as they arrive and pull messages with
//! [`next_message`](Tokenizer::next_message). `None` means "nothing complete
//! yet", which makes readiness directly observable.

use smallvec::{smallvec, SmallVec};
use tracing::trace;

use crate::message::{channel_data_len, MidiMessage};

#[derive(Debug)]
enum State {
    Idle,
    Channel {
        status: u8,
        data: SmallVec<[u8; 2]>,
    },
    SystemCommon {
        status: u8,
        need: usize,
        data: SmallVec<[u8; 2]>,
    },
    SystemExclusive {
        data: Vec<u8>,
    },
}

/// Incremental MIDI 1.0 stream tokenizer.
///
/// Handles running status, real-time bytes interleaved mid-message, and
/// System Exclusive sequences terminated by any status byte (normalized to a
/// canonical `0xF7`). Malformed sequences are discarded with a trace log and
/// parsing resynchronizes at the next status byte; nothing here is a hard
/// error.
#[derive(Debug)]
pub struct Tokenizer {
    buf: Vec<u8>,
    pos: usize,
    state: State,
    running_status: Option<u8>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
            state: State::Idle,
            running_status: None,
        }
    }

    /// Append freshly received bytes. Consumed bytes are compacted away first
    /// so the buffer never grows beyond one partial message plus the new
    /// chunk.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.drain(..self.pos);
        self.pos = 0;
        self.buf.extend_from_slice(bytes);
    }

    /// Pull the next complete message, or `None` if more bytes are needed.
    pub fn next_message(&mut self) -> Option<MidiMessage> {
        while self.pos < self.buf.len() {
            let byte = self.buf[self.pos];

            // Real-time bytes pass straight through, even mid-message, and
            // never count as message content.
            if byte >= 0xF8 {
                self.pos += 1;
                return Some(MidiMessage::SystemRealTime(byte));
            }

            if byte >= 0x80 {
                if let Some(msg) = self.on_status(byte) {
                    return Some(msg);
                }
                continue;
            }

            self.pos += 1;
            if let Some(msg) = self.on_data(byte) {
                return Some(msg);
            }
        }

        self.buf.clear();
        self.pos = 0;
        None
    }

    /// Drain every currently complete message.
    pub fn drain(&mut self) -> impl Iterator<Item = MidiMessage> + '_ {
        std::iter::from_fn(move || self.next_message())
    }

    /// A non-real-time status byte at the cursor: terminate whatever is in
    /// progress, then start (or emit) the message it introduces.
    fn on_status(&mut self, status: u8) -> Option<MidiMessage> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::SystemExclusive { mut data } => {
                // Any status terminates SysEx; normalize to a canonical 0xF7.
                // A real terminator is consumed, anything else is left at the
                // cursor and reinterpreted as the start of the next message.
                data.push(0xF7);
                if status == 0xF7 {
                    self.pos += 1;
                }
                return Some(MidiMessage::SystemExclusive(data));
            }
            State::Channel { status: old, data } => {
                trace!(
                    status = format_args!("{old:#04x}"),
                    got = data.len(),
                    "channel message truncated by new status, discarding"
                );
            }
            State::SystemCommon { status: old, data, .. } => {
                trace!(
                    status = format_args!("{old:#04x}"),
                    got = data.len(),
                    "system common message truncated by new status, discarding"
                );
            }
            State::Idle => {}
        }

        self.pos += 1;
        match status {
            0x80..=0xEF => {
                self.running_status = Some(status);
                self.state = State::Channel {
                    status,
                    data: SmallVec::new(),
                };
            }
            0xF0 => {
                self.running_status = None;
                self.state = State::SystemExclusive { data: vec![0xF0] };
            }
            0xF1 | 0xF3 => {
                self.running_status = None;
                self.state = State::SystemCommon {
                    status,
                    need: 1,
                    data: SmallVec::new(),
                };
            }
            0xF2 => {
                self.running_status = None;
                self.state = State::SystemCommon {
                    status,
                    need: 2,
                    data: SmallVec::new(),
                };
            }
            0xF6 | 0xF7 => {
                self.running_status = None;
                return Some(MidiMessage::SystemCommon(smallvec![status]));
            }
            // 0xF4/0xF5 are undefined in MIDI 1.0.
            _ => {
                self.running_status = None;
                trace!(
                    status = format_args!("{status:#04x}"),
                    "undefined system common status, discarding"
                );
            }
        }
        None
    }

    /// A data byte at the cursor (already consumed by the caller).
    fn on_data(&mut self, byte: u8) -> Option<MidiMessage> {
        match &mut self.state {
            State::Channel { status, data } => {
                data.push(byte);
                if data.len() == channel_data_len(*status) {
                    let status = *status;
                    let data = std::mem::take(data);
                    self.state = State::Idle;
                    let mut bytes: SmallVec<[u8; 3]> = smallvec![status];
                    bytes.extend_from_slice(&data);
                    return Some(MidiMessage::Channel(bytes));
                }
            }
            State::SystemCommon { status, need, data } => {
                data.push(byte);
                if data.len() == *need {
                    let status = *status;
                    let data = std::mem::take(data);
                    self.state = State::Idle;
                    let mut bytes: SmallVec<[u8; 3]> = smallvec![status];
                    bytes.extend_from_slice(&data);
                    return Some(MidiMessage::SystemCommon(bytes));
                }
            }
            State::SystemExclusive { data } => {
                data.push(byte);
            }
            State::Idle => match self.running_status {
                // Running status: data-byte runs keep emitting under the last
                // channel status, with the status byte re-prepended.
                Some(status) => {
                    self.state = State::Channel {
                        status,
                        data: smallvec![byte],
                    };
                    return self.on_data_complete_check();
                }
                None => {
                    trace!(byte = format_args!("{byte:#04x}"), "stray data byte discarded");
                }
            },
        }
        None
    }

    /// One-data-byte statuses under running status complete immediately.
    fn on_data_complete_check(&mut self) -> Option<MidiMessage> {
        if let State::Channel { status, data } = &self.state {
            if data.len() == channel_data_len(*status) {
                let mut bytes: SmallVec<[u8; 3]> = smallvec![*status];
                bytes.extend_from_slice(data);
                self.state = State::Idle;
                return Some(MidiMessage::Channel(bytes));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(chunks: &[&[u8]]) -> Vec<MidiMessage> {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut tok = Tokenizer::new();
        let mut out = Vec::new();
        for chunk in chunks {
            tok.feed(chunk);
            out.extend(tok.drain());
        }
        out
    }

    fn channel(bytes: &[u8]) -> MidiMessage {
        MidiMessage::Channel(SmallVec::from_slice(bytes))
    }

    #[test]
    fn test_nrpn_fixture_yields_four_ccs_and_one_program_change() {
        let msgs = collect(&[
            &[0xB5, 0x63, 0x42],
            &[0xB5, 0x62, 0x4E],
            &[0xC6, 0x00, 0x7F],
            &[0xB5, 0x06, 0x7D],
            &[0xB5, 0x26, 0x00],
        ]);
        // 0xC6 takes one data byte; 0x7F continues under running status.
        assert_eq!(
            msgs,
            vec![
                channel(&[0xB5, 0x63, 0x42]),
                channel(&[0xB5, 0x62, 0x4E]),
                channel(&[0xC6, 0x00]),
                channel(&[0xC6, 0x7F]),
                channel(&[0xB5, 0x06, 0x7D]),
                channel(&[0xB5, 0x26, 0x00]),
            ]
        );
    }

    #[test]
    fn test_not_ready_until_final_byte() {
        let mut tok = Tokenizer::new();
        tok.feed(&[0xB5, 0x63]);
        assert_eq!(tok.next_message(), None);
        tok.feed(&[0x42]);
        assert_eq!(tok.next_message(), Some(channel(&[0xB5, 0x63, 0x42])));
        assert_eq!(tok.next_message(), None);
    }

    #[test]
    fn test_running_status() {
        let msgs = collect(&[&[0xB0, 0x63, 0x01, 0x62, 0x02, 0x06, 0x03]]);
        assert_eq!(
            msgs,
            vec![
                channel(&[0xB0, 0x63, 0x01]),
                channel(&[0xB0, 0x62, 0x02]),
                channel(&[0xB0, 0x06, 0x03]),
            ]
        );
    }

    #[test]
    fn test_real_time_interleaved_mid_message() {
        let msgs = collect(&[&[0xB0, 0x63, 0xF8, 0x01]]);
        assert_eq!(
            msgs,
            vec![
                MidiMessage::SystemRealTime(0xF8),
                channel(&[0xB0, 0x63, 0x01]),
            ]
        );
    }

    #[test]
    fn test_new_status_aborts_partial_message() {
        let msgs = collect(&[&[0x90, 0x40, 0xB0, 0x63, 0x42]]);
        assert_eq!(msgs, vec![channel(&[0xB0, 0x63, 0x42])]);
    }

    #[test]
    fn test_sysex_canonical_termination() {
        let msgs = collect(&[&[0xF0, 0x01, 0x02], &[0x03, 0xF7]]);
        assert_eq!(
            msgs,
            vec![MidiMessage::SystemExclusive(vec![0xF0, 0x01, 0x02, 0x03, 0xF7])]
        );
    }

    #[test]
    fn test_sysex_normalizes_non_canonical_terminator() {
        let msgs = collect(&[&[0xF0], &[0xC3, 0x05]]);
        assert_eq!(
            msgs,
            vec![
                MidiMessage::SystemExclusive(vec![0xF0, 0xF7]),
                channel(&[0xC3, 0x05]),
            ]
        );
    }

    #[test]
    fn test_sysex_clears_running_status() {
        let msgs = collect(&[&[0xB0, 0x63, 0x01, 0xF0, 0xF7, 0x10, 0x20]]);
        // The data run after the SysEx has no status context and is dropped.
        assert_eq!(
            msgs,
            vec![
                channel(&[0xB0, 0x63, 0x01]),
                MidiMessage::SystemExclusive(vec![0xF0, 0xF7]),
            ]
        );
    }

    #[test]
    fn test_undefined_statuses_discarded() {
        let msgs = collect(&[&[0xF4, 0xF5, 0xB0, 0x63, 0x01]]);
        assert_eq!(msgs, vec![channel(&[0xB0, 0x63, 0x01])]);
    }

    #[test]
    fn test_single_byte_system_common() {
        let msgs = collect(&[&[0xF6]]);
        assert_eq!(msgs, vec![MidiMessage::SystemCommon(SmallVec::from_slice(&[0xF6]))]);
    }

    #[test]
    fn test_song_position_pointer() {
        let msgs = collect(&[&[0xF2, 0x01, 0x02]]);
        assert_eq!(
            msgs,
            vec![MidiMessage::SystemCommon(SmallVec::from_slice(&[
                0xF2, 0x01, 0x02
            ]))]
        );
    }

    #[test]
    fn test_stray_data_bytes_discarded() {
        assert!(collect(&[&[0x12, 0x34, 0x56]]).is_empty());
    }
}
