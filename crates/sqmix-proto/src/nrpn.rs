//! Branded NRPN addresses.
//!
//! The console exposes four independent parameter families over the same
//! 14-bit address space: mute, assign, level, pan/balance. An address from
//! one family must never be compared or combined with one from another, so
//! [`Nrpn`] is generic over a zero-sized kind marker and mixing kinds is a
//! type error, at zero runtime cost.

use std::fmt;
use std::marker::PhantomData;

/// Runtime tag naming a parameter family, for diagnostics and table lookup.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ParamTag {
    Mute,
    Assign,
    Level,
    PanBalance,
}

impl fmt::Display for ParamTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamTag::Mute => "mute",
            ParamTag::Assign => "assign",
            ParamTag::Level => "level",
            ParamTag::PanBalance => "pan/balance",
        })
    }
}

/// Zero-sized kind markers for [`Nrpn`].
pub mod kind {
    use super::ParamTag;

    mod sealed {
        pub trait Sealed {}
    }

    /// One of the four NRPN parameter families.
    pub trait ParamKind:
        sealed::Sealed + Copy + Clone + PartialEq + Eq + std::hash::Hash + std::fmt::Debug
    {
        const TAG: ParamTag;
    }

    macro_rules! param_kind {
        ($(#[$doc:meta])* $name:ident => $tag:ident) => {
            $(#[$doc])*
            #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
            pub struct $name;
            impl sealed::Sealed for $name {}
            impl ParamKind for $name {
                const TAG: ParamTag = ParamTag::$tag;
            }
        };
    }

    param_kind!(
        /// Mute-style on/off parameters (also carries softkey press state).
        Mute => Mute
    );
    param_kind!(
        /// Source-into-sink routing assignments.
        Assign => Assign
    );
    param_kind!(
        /// Fader levels, send levels and output masters.
        Level => Level
    );
    param_kind!(
        /// Pan positions and output balances.
        PanBalance => PanBalance
    );
}

use kind::ParamKind;

/// A 14-bit NRPN address, logically `(msb << 7) | lsb`, branded by family.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nrpn<K: ParamKind> {
    msb: u8,
    lsb: u8,
    _kind: PhantomData<K>,
}

impl<K: ParamKind> Nrpn<K> {
    pub(crate) fn new(msb: u8, lsb: u8) -> Self {
        debug_assert!(msb < 0x80 && lsb < 0x80);
        Self {
            msb,
            lsb,
            _kind: PhantomData,
        }
    }

    /// Most significant 7-bit half.
    pub fn msb(self) -> u8 {
        self.msb
    }

    /// Least significant 7-bit half.
    pub fn lsb(self) -> u8 {
        self.lsb
    }

    /// The combined 14-bit value.
    pub fn as_u14(self) -> u16 {
        u16::from(self.msb) << 7 | u16::from(self.lsb)
    }
}

impl<K: ParamKind> fmt::Debug for Nrpn<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Nrpn<{}>({:#04x}, {:#04x})",
            K::TAG,
            self.msb,
            self.lsb
        )
    }
}

impl<K: ParamKind> fmt::Display for Nrpn<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.msb, self.lsb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u14_packing() {
        let nrpn = Nrpn::<kind::Level>::new(0x45, 0x04);
        assert_eq!(nrpn.as_u14(), (0x45 << 7) | 0x04);
        assert_eq!(nrpn.msb(), 0x45);
        assert_eq!(nrpn.lsb(), 0x04);
    }

    #[test]
    fn test_display_matches_store_key_shape() {
        let nrpn = Nrpn::<kind::Mute>::new(0x04, 0x00);
        assert_eq!(nrpn.to_string(), "4.0");
    }
}
