//! Pan/balance codec: the console's 41 labeled positions to and from the
//! 14-bit data encoding.
//!
//! The inverse `(data - 8191) / 81.9` is an empirically reverse-engineered
//! approximation with no authoritative derivation; keep it bit-for-bit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One of the 41 discrete pan/balance positions: `CTR`, `L5..L100`,
/// `R5..R100` in steps of five percent.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Pan {
    Left(u8),
    Centre,
    Right(u8),
}

/// Relative one-unit step. An action input only, never stored state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PanDirection {
    Left,
    Right,
}

impl Pan {
    /// Validate an amount for `Left`/`Right` construction.
    pub fn left(amount: u8) -> Result<Self> {
        check_amount(amount)?;
        Ok(Pan::Left(amount))
    }

    pub fn right(amount: u8) -> Result<Self> {
        check_amount(amount)?;
        Ok(Pan::Right(amount))
    }

    /// Signed percentage: `L100 = -100`, `CTR = 0`, `R100 = +100`.
    pub fn percent(self) -> i16 {
        match self {
            Pan::Left(amount) => -i16::from(amount),
            Pan::Centre => 0,
            Pan::Right(amount) => i16::from(amount),
        }
    }

    /// Encode as a `(VC, VF)` pair.
    ///
    /// Linear interpolation of the combined 14-bit value between `L100 = 0`,
    /// `CTR = 0x1FFF` and `R100 = 0x3FFF`.
    pub fn to_data(self) -> (u8, u8) {
        let value = f32::from(100 + self.percent());
        let data = (value / 200.0 * 0x3FFF as f32).floor() as u16;
        (((data >> 7) & 0x7F) as u8, (data & 0x7F) as u8)
    }

    /// Decode a `(VC, VF)` pair, snapping to the nearest 5 % position.
    pub fn from_data(vc: u8, vf: u8) -> Self {
        let data = u16::from(vc & 0x7F) << 7 | u16::from(vf & 0x7F);
        let percent = (f32::from(data) - 8191.0) / 81.9;
        let snapped = ((percent / 5.0).round() as i16 * 5).clamp(-100, 100);
        match snapped {
            0 => Pan::Centre,
            p if p < 0 => Pan::Left((-p) as u8),
            p => Pan::Right(p as u8),
        }
    }
}

fn check_amount(amount: u8) -> Result<()> {
    if (5..=100).contains(&amount) && amount % 5 == 0 {
        Ok(())
    } else {
        Err(Error::InvalidPanAmount(amount))
    }
}

impl fmt::Display for Pan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pan::Centre => f.write_str("CTR"),
            Pan::Left(amount) => write!(f, "L{amount}"),
            Pan::Right(amount) => write!(f, "R{amount}"),
        }
    }
}

impl FromStr for Pan {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidPanLabel(s.to_string());
        match s {
            "CTR" => Ok(Pan::Centre),
            _ if s.len() < 2 => Err(invalid()),
            _ => {
                let (side, amount) = s.split_at(1);
                let amount: u8 = amount.parse().map_err(|_| invalid())?;
                match side {
                    "L" => Pan::left(amount).map_err(|_| invalid()),
                    "R" => Pan::right(amount).map_err(|_| invalid()),
                    _ => Err(invalid()),
                }
            }
        }
    }
}

impl TryFrom<String> for Pan {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Pan> for String {
    fn from(pan: Pan) -> String {
        pan.to_string()
    }
}

/// Every storable position, hard left to hard right.
pub fn all_pan_positions() -> impl Iterator<Item = Pan> {
    let lefts = (1..=20).rev().map(|n| Pan::Left(n * 5));
    let rights = (1..=20).map(|n| Pan::Right(n * 5));
    lefts.chain(std::iter::once(Pan::Centre)).chain(rights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_encodings() {
        assert_eq!(Pan::Left(100).to_data(), (0x00, 0x00));
        assert_eq!(Pan::Centre.to_data(), (0x3F, 0x7F));
        assert_eq!(Pan::Right(100).to_data(), (0x7F, 0x7F));
    }

    #[test]
    fn test_all_pan_positions_round_trip() {
        let positions: Vec<_> = all_pan_positions().collect();
        assert_eq!(positions.len(), 41);
        for pan in positions {
            let (vc, vf) = pan.to_data();
            assert_eq!(Pan::from_data(vc, vf), pan, "{pan}");
        }
    }

    #[test]
    fn test_labels_round_trip() {
        for pan in all_pan_positions() {
            assert_eq!(pan.to_string().parse::<Pan>().unwrap(), pan);
        }
        assert_eq!("CTR".parse::<Pan>().unwrap(), Pan::Centre);
        assert_eq!("L55".parse::<Pan>().unwrap(), Pan::Left(55));
    }

    #[test]
    fn test_invalid_labels_and_amounts() {
        assert!("".parse::<Pan>().is_err());
        assert!("C".parse::<Pan>().is_err());
        assert!("L3".parse::<Pan>().is_err());
        assert!("L105".parse::<Pan>().is_err());
        assert!("X50".parse::<Pan>().is_err());
        assert!(Pan::left(0).is_err());
        assert!(Pan::right(101).is_err());
    }
}
