//! Fader level codec: dB (or `-inf`) to and from the console's 14-bit VC/VF
//! data encoding, under either fader law.
//!
//! LinearTaper follows the documented closed formula. AudioTaper has no
//! authoritative derivation; the piecewise segments below are empirically
//! calibrated against console behavior and the deployed fleet depends on
//! them, so resist the urge to fit a smoother curve.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Console-configurable dB-to-data encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum FaderLaw {
    LinearTaper,
    AudioTaper,
}

/// A fader level: a dB value in `(-90, +10]`, or the `-inf` floor.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Level {
    /// Negative infinity, the mute-equivalent floor. Always encodes as
    /// `(0, 0)` and `(0, 0)` always decodes to it, under both laws.
    Off,
    Db(f32),
}

impl Level {
    /// A validated finite level.
    pub fn db(value: f32) -> Result<Self> {
        if value.is_finite() && value > -90.0 && value <= 10.0 {
            Ok(Level::Db(value))
        } else {
            Err(Error::LevelOutOfRange(value))
        }
    }

    pub fn is_off(self) -> bool {
        matches!(self, Level::Off)
    }

    /// The dB value used for fade interpolation; `Off` sits one step under
    /// the audible floor.
    pub fn fade_db(self) -> f32 {
        match self {
            Level::Off => -90.0,
            Level::Db(db) => db,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Off => f.write_str("-inf"),
            Level::Db(db) => write!(f, "{db:.1} dB"),
        }
    }
}

const LINEAR_OFFSET: f32 = 15196.0;
const LINEAR_SLOPE: f32 = 118.775;

/// AudioTaper anchor points as (VC position, dB). VF is the fractional
/// 1/128 step within one VC unit; segment boundaries are not evenly spaced.
const AUDIO_ANCHORS: [(f32, f32); 7] = [
    (0.0, -89.0),
    (15.0, -50.0),
    (63.0, -30.0),
    (79.0, -20.0),
    (99.0, -10.0),
    (115.0, 0.0),
    (127.0, 10.0),
];

/// Encode a level as a `(VC, VF)` pair under `law`.
pub fn level_to_data(level: Level, law: FaderLaw) -> (u8, u8) {
    let db = match level {
        Level::Off => return (0, 0),
        Level::Db(db) => db.clamp(-89.0, 10.0),
    };
    match law {
        FaderLaw::LinearTaper => {
            let data = (LINEAR_OFFSET + db * LINEAR_SLOPE).round() as u16;
            split(data.min(0x3FFF))
        }
        FaderLaw::AudioTaper => {
            let position = audio_db_to_position(db);
            // Step 1/128 is the lowest finite encoding; (0, 0) is reserved
            // for Off.
            let steps = ((position * 128.0).round() as u16).clamp(1, 0x3FFF);
            split(steps)
        }
    }
}

/// Decode a `(VC, VF)` pair back to a level under `law`.
pub fn data_to_level(vc: u8, vf: u8, law: FaderLaw) -> Level {
    let data = u16::from(vc & 0x7F) << 7 | u16::from(vf & 0x7F);
    if data == 0 {
        return Level::Off;
    }
    let db = match law {
        FaderLaw::LinearTaper => (f32::from(data) - LINEAR_OFFSET) / LINEAR_SLOPE,
        FaderLaw::AudioTaper => audio_position_to_db(f32::from(data) / 128.0),
    };
    // The floor comparison needs half an encoding step of slack: -89 dB
    // itself rounds to data 4625, which decodes a hair under -89 and must
    // stay finite. Only (0, 0) means -inf.
    if db < -89.05 {
        Level::Off
    } else {
        Level::Db(db.clamp(-89.0, 10.0))
    }
}

/// Map dB onto the continuous VC axis through the anchor table.
fn audio_db_to_position(db: f32) -> f32 {
    let (mut lo, mut hi) = (AUDIO_ANCHORS[0], AUDIO_ANCHORS[1]);
    for window in AUDIO_ANCHORS.windows(2) {
        if db >= window[0].1 {
            lo = window[0];
            hi = window[1];
        }
    }
    let (pos_lo, db_lo) = lo;
    let (pos_hi, db_hi) = hi;
    pos_lo + (db - db_lo) * (pos_hi - pos_lo) / (db_hi - db_lo)
}

fn audio_position_to_db(position: f32) -> f32 {
    let (mut lo, mut hi) = (AUDIO_ANCHORS[0], AUDIO_ANCHORS[1]);
    for window in AUDIO_ANCHORS.windows(2) {
        if position >= window[0].0 {
            lo = window[0];
            hi = window[1];
        }
    }
    let (pos_lo, db_lo) = lo;
    let (pos_hi, db_hi) = hi;
    db_lo + (position - pos_lo) * (db_hi - db_lo) / (pos_hi - pos_lo)
}

fn split(data: u16) -> (u8, u8) {
    (((data >> 7) & 0x7F) as u8, (data & 0x7F) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_off_is_zero_zero_both_laws() {
        for law in [FaderLaw::LinearTaper, FaderLaw::AudioTaper] {
            assert_eq!(level_to_data(Level::Off, law), (0, 0));
            assert_eq!(data_to_level(0, 0, law), Level::Off);
        }
    }

    #[test]
    fn test_linear_taper_anchor_values() {
        // 0 dB sits exactly at the documented offset.
        assert_eq!(level_to_data(Level::Db(0.0), FaderLaw::LinearTaper), split(15196));
        // +10 dB saturates the 14-bit range.
        assert_eq!(
            level_to_data(Level::Db(10.0), FaderLaw::LinearTaper),
            (0x7F, 0x7F)
        );
    }

    #[test]
    fn test_linear_taper_round_trips_at_tenth_db() {
        let mut db = -89.0f32;
        while db <= 10.0 {
            let (vc, vf) = level_to_data(Level::Db(db), FaderLaw::LinearTaper);
            match data_to_level(vc, vf, FaderLaw::LinearTaper) {
                Level::Db(back) => assert_abs_diff_eq!(back, db, epsilon = 0.05),
                Level::Off => panic!("{db} dB decoded as -inf"),
            }
            db += 0.1;
        }
    }

    #[test]
    fn test_linear_taper_floor_round_trips_finite() {
        // -89 dB encodes to data 4625, a hair under -89 on decode; it must
        // come back as the finite floor, never as -inf.
        let (vc, vf) = level_to_data(Level::Db(-89.0), FaderLaw::LinearTaper);
        assert_ne!((vc, vf), (0, 0));
        assert_eq!(data_to_level(vc, vf, FaderLaw::LinearTaper), Level::Db(-89.0));
    }

    #[test]
    fn test_linear_taper_decode_clamps() {
        // Below the -89 dB floor decodes as -inf.
        assert_eq!(data_to_level(0x01, 0x00, FaderLaw::LinearTaper), Level::Off);
        // The top of the range never exceeds +10.
        match data_to_level(0x7F, 0x7F, FaderLaw::LinearTaper) {
            Level::Db(db) => assert!(db <= 10.0),
            Level::Off => panic!("full scale decoded as -inf"),
        }
    }

    #[test]
    fn test_audio_taper_anchor_values() {
        assert_eq!(level_to_data(Level::Db(10.0), FaderLaw::AudioTaper), (127, 0));
        assert_eq!(level_to_data(Level::Db(0.0), FaderLaw::AudioTaper), (115, 0));
        assert_eq!(level_to_data(Level::Db(-10.0), FaderLaw::AudioTaper), (99, 0));
        assert_eq!(level_to_data(Level::Db(-30.0), FaderLaw::AudioTaper), (63, 0));
    }

    #[test]
    fn test_audio_taper_round_trips_within_one_db() {
        let mut db = -89.0f32;
        while db <= 10.0 {
            let (vc, vf) = level_to_data(Level::Db(db), FaderLaw::AudioTaper);
            match data_to_level(vc, vf, FaderLaw::AudioTaper) {
                Level::Db(back) => assert!(
                    (back - db).abs() <= 1.0,
                    "{db} dB round-tripped as {back} dB"
                ),
                Level::Off => panic!("{db} dB decoded as -inf"),
            }
            db += 0.25;
        }
    }

    #[test]
    fn test_audio_taper_finite_never_encodes_as_off() {
        let (vc, vf) = level_to_data(Level::Db(-89.0), FaderLaw::AudioTaper);
        assert_ne!((vc, vf), (0, 0));
    }

    #[test]
    fn test_level_validation() {
        assert!(Level::db(-89.9).is_ok());
        assert!(Level::db(10.0).is_ok());
        assert!(Level::db(10.1).is_err());
        assert!(Level::db(-90.0).is_err());
        assert!(Level::db(f32::NAN).is_err());
    }
}
