//! Base parameter tables, hand-transcribed from the vendor protocol document.
//!
//! Each entry is the `(MSB, LSB)` of source index 0 / sink index 0 for one
//! parameter family and one source/sink pairing. A pairing absent from a
//! table does not exist on the hardware for that family. These constants are
//! wire-compatibility critical: change nothing here without the protocol
//! document open.

use crate::model::Category;
use crate::nrpn::ParamTag;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Base {
    pub msb: u8,
    pub lsb: u8,
}

const fn base(msb: u8, lsb: u8) -> Option<Base> {
    Some(Base { msb, lsb })
}

/// Mute-style single-dimension family (index 0 base per category).
/// Softkey press/release rides the same table shape at MSB 0x05.
pub(crate) fn mute_base(category: Category) -> Option<Base> {
    use Category::*;
    match category {
        InputChannel => base(0x00, 0x00),
        Group => base(0x00, 0x30),
        FxReturn => base(0x00, 0x3C),
        Lr => base(0x00, 0x44),
        Mix => base(0x00, 0x45),
        FxSend => base(0x00, 0x51),
        Matrix => base(0x00, 0x55),
        Dca => base(0x02, 0x00),
        MuteGroup => base(0x04, 0x00),
        SoftKey => base(0x05, 0x00),
    }
}

/// Two-dimensional source-into-sink families.
pub(crate) fn send_base(tag: ParamTag, source: Category, sink: Category) -> Option<Base> {
    use Category::*;
    match tag {
        ParamTag::Level => match (source, sink) {
            (InputChannel, Lr) => base(0x40, 0x00),
            (Group, Lr) => base(0x40, 0x30),
            (FxReturn, Lr) => base(0x40, 0x3C),
            (InputChannel, Mix) => base(0x40, 0x44),
            (Group, Mix) => base(0x45, 0x04),
            (FxReturn, Mix) => base(0x46, 0x14),
            (InputChannel, FxSend) => base(0x4C, 0x14),
            (Group, FxSend) => base(0x4D, 0x54),
            (FxReturn, FxSend) => base(0x4E, 0x04),
            (Lr, Matrix) => base(0x4E, 0x24),
            (Mix, Matrix) => base(0x4E, 0x27),
            (Group, Matrix) => base(0x4E, 0x4B),
            _ => None,
        },
        ParamTag::PanBalance => match (source, sink) {
            (InputChannel, Lr) => base(0x50, 0x00),
            (Group, Lr) => base(0x50, 0x30),
            (FxReturn, Lr) => base(0x50, 0x3C),
            (InputChannel, Mix) => base(0x50, 0x44),
            (Group, Mix) => base(0x55, 0x04),
            (FxReturn, Mix) => base(0x56, 0x14),
            (Lr, Matrix) => base(0x5E, 0x24),
            (Mix, Matrix) => base(0x5E, 0x27),
            (Group, Matrix) => base(0x5E, 0x4B),
            _ => None,
        },
        ParamTag::Assign => match (source, sink) {
            (InputChannel, Lr) => base(0x60, 0x00),
            (Group, Lr) => base(0x60, 0x30),
            (FxReturn, Lr) => base(0x60, 0x3C),
            (InputChannel, Mix) => base(0x60, 0x44),
            (Group, Mix) => base(0x65, 0x04),
            (FxReturn, Mix) => base(0x66, 0x14),
            (InputChannel, Group) => base(0x66, 0x74),
            (FxReturn, Group) => base(0x6B, 0x34),
            (InputChannel, FxSend) => base(0x6C, 0x14),
            (Group, FxSend) => base(0x6D, 0x54),
            (FxReturn, FxSend) => base(0x6E, 0x04),
            (Lr, Matrix) => base(0x6E, 0x24),
            (Mix, Matrix) => base(0x6E, 0x27),
            (Group, Matrix) => base(0x6E, 0x4B),
            _ => None,
        },
        // Mutes are single-dimension only.
        ParamTag::Mute => None,
    }
}

/// Output (master) single-dimension families.
pub(crate) fn output_base(tag: ParamTag, category: Category) -> Option<Base> {
    use Category::*;
    match tag {
        ParamTag::Level => match category {
            Lr => base(0x4F, 0x00),
            Mix => base(0x4F, 0x01),
            FxSend => base(0x4F, 0x0D),
            Matrix => base(0x4F, 0x11),
            Dca => base(0x4F, 0x20),
            _ => None,
        },
        ParamTag::PanBalance => match category {
            Lr => base(0x5F, 0x00),
            Mix => base(0x5F, 0x01),
            Matrix => base(0x5F, 0x11),
            _ => None,
        },
        ParamTag::Mute | ParamTag::Assign => None,
    }
}

/// Source categories that can feed at least one sink, in table order.
pub(crate) const SEND_SOURCES: [Category; 5] = [
    Category::InputChannel,
    Category::Group,
    Category::FxReturn,
    Category::Lr,
    Category::Mix,
];

/// Sink categories, in table order.
pub(crate) const SEND_SINKS: [Category; 5] = [
    Category::Lr,
    Category::Mix,
    Category::Group,
    Category::FxSend,
    Category::Matrix,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_table_anchors() {
        let mg = mute_base(Category::MuteGroup).unwrap();
        assert_eq!((mg.msb, mg.lsb), (0x04, 0x00));
        let lr = mute_base(Category::Lr).unwrap();
        assert_eq!((lr.msb, lr.lsb), (0x00, 0x44));
    }

    #[test]
    fn test_level_pairs_without_hardware_support_are_absent() {
        // Input-channel level into group does not exist; the route into a
        // group is assign-only.
        assert!(send_base(ParamTag::Level, Category::InputChannel, Category::Group).is_none());
        assert!(send_base(ParamTag::Assign, Category::InputChannel, Category::Group).is_some());
        // No pan on FX sends.
        assert!(send_base(ParamTag::PanBalance, Category::InputChannel, Category::FxSend).is_none());
    }

    #[test]
    fn test_mute_table_is_contiguous_through_msb_zero() {
        // Input 48 + group 12 + FX return 8 + LR 1 + mix 12 + FX send 4 +
        // matrix 3 pack the MSB 0x00 row without gaps.
        let seq = [
            (Category::InputChannel, 48u16),
            (Category::Group, 12),
            (Category::FxReturn, 8),
            (Category::Lr, 1),
            (Category::Mix, 12),
            (Category::FxSend, 4),
            (Category::Matrix, 3),
        ];
        let mut next = 0u16;
        for (category, count) in seq {
            let b = mute_base(category).unwrap();
            assert_eq!((b.msb, u16::from(b.lsb)), (0x00, next), "{category}");
            next += count;
        }
    }
}
