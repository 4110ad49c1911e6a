//! Raw outbound command builders.
//!
//! Every mixer operation ultimately becomes one of these byte shapes on the
//! configured MIDI channel `n`:
//!
//! - NRPN data:      `Bn 63 MSB, Bn 62 LSB, Bn 06 VC, Bn 26 VF`
//! - NRPN inc/dec:   `Bn 63 MSB, Bn 62 LSB, Bn 60|61 val`
//! - Scene recall:   `Bn 00 bankMSB, Cn program`
//!
//! A "get current value" request is an increment by `0x7F`; the console
//! echoes a full four-message NRPN data reply.

const CC_NRPN_MSB: u8 = 0x63;
const CC_NRPN_LSB: u8 = 0x62;
const CC_DATA_VC: u8 = 0x06;
const CC_DATA_VF: u8 = 0x26;
const CC_INCREMENT: u8 = 0x60;
const CC_DECREMENT: u8 = 0x61;
const CC_BANK_SELECT: u8 = 0x00;

const GET_VALUE: u8 = 0x7F;

fn cc(channel: u8) -> u8 {
    0xB0 | (channel & 0x0F)
}

/// Set a 14-bit NRPN value.
pub fn nrpn_set(channel: u8, msb: u8, lsb: u8, vc: u8, vf: u8) -> Vec<u8> {
    let status = cc(channel);
    vec![
        status, CC_NRPN_MSB, msb & 0x7F,
        status, CC_NRPN_LSB, lsb & 0x7F,
        status, CC_DATA_VC, vc & 0x7F,
        status, CC_DATA_VF, vf & 0x7F,
    ]
}

/// Request the current value of an NRPN address.
pub fn nrpn_get(channel: u8, msb: u8, lsb: u8) -> Vec<u8> {
    nrpn_increment(channel, msb, lsb, GET_VALUE)
}

/// Increment an NRPN value by one console-defined unit.
pub fn nrpn_increment(channel: u8, msb: u8, lsb: u8, value: u8) -> Vec<u8> {
    let status = cc(channel);
    vec![
        status, CC_NRPN_MSB, msb & 0x7F,
        status, CC_NRPN_LSB, lsb & 0x7F,
        status, CC_INCREMENT, value & 0x7F,
    ]
}

/// Decrement an NRPN value by one console-defined unit.
pub fn nrpn_decrement(channel: u8, msb: u8, lsb: u8, value: u8) -> Vec<u8> {
    let status = cc(channel);
    vec![
        status, CC_NRPN_MSB, msb & 0x7F,
        status, CC_NRPN_LSB, lsb & 0x7F,
        status, CC_DECREMENT, value & 0x7F,
    ]
}

/// Recall a zero-based scene: Bank Select MSB then Program Change.
pub fn scene_recall(channel: u8, scene: u16) -> Vec<u8> {
    let bank = ((scene >> 7) & 0x7F) as u8;
    let program = (scene & 0x7F) as u8;
    vec![
        cc(channel), CC_BANK_SELECT, bank,
        0xC0 | (channel & 0x0F), program,
    ]
}
