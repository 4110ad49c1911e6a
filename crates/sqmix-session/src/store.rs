//! Last-known console state, plus the host notification boundary.
//!
//! The maps are written by event application and by outbound sets, and read
//! by fade-start lookup; `dashmap` keeps read-your-latest-write semantics
//! without a single big lock.

use dashmap::DashMap;
use parking_lot::Mutex;

/// Synthetic identifier hosts use to persist a level, `level_{MSB}.{LSB}`.
pub fn level_key(msb: u8, lsb: u8) -> String {
    format!("level_{msb}.{lsb}")
}

/// Synthetic identifier hosts use to persist a mute, `mute_{MSB}.{LSB}`.
pub fn mute_key(msb: u8, lsb: u8) -> String {
    format!("mute_{msb}.{lsb}")
}

pub fn pan_key(msb: u8, lsb: u8) -> String {
    format!("pan_{msb}.{lsb}")
}

/// Host notification hook, invoked whenever a stored value changes (for UI
/// feedback refresh). All methods default to no-ops.
pub trait ChangeListener: Send + Sync {
    fn mute_changed(&self, _key: &str, _on: bool) {}
    fn level_changed(&self, _key: &str, _vc: u8, _vf: u8) {}
    fn pan_changed(&self, _key: &str, _vc: u8, _vf: u8) {}
    fn scene_changed(&self, _scene: u16) {}
}

/// The default listener: ignores everything.
pub struct NopListener;

impl ChangeListener for NopListener {}

/// Per-address last-known values for one console session. Created at
/// connection start, discarded at disconnect.
#[derive(Default)]
pub struct StateStore {
    levels: DashMap<u16, (u8, u8)>,
    pans: DashMap<u16, (u8, u8)>,
    mutes: DashMap<u16, bool>,
    scene: Mutex<Option<u16>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a level; returns whether the value actually changed.
    pub fn set_level(&self, address: u16, vc: u8, vf: u8) -> bool {
        self.levels.insert(address, (vc, vf)) != Some((vc, vf))
    }

    pub fn level(&self, address: u16) -> Option<(u8, u8)> {
        self.levels.get(&address).map(|entry| *entry)
    }

    pub fn set_pan(&self, address: u16, vc: u8, vf: u8) -> bool {
        self.pans.insert(address, (vc, vf)) != Some((vc, vf))
    }

    pub fn pan(&self, address: u16) -> Option<(u8, u8)> {
        self.pans.get(&address).map(|entry| *entry)
    }

    pub fn set_mute(&self, address: u16, on: bool) -> bool {
        self.mutes.insert(address, on) != Some(on)
    }

    pub fn mute(&self, address: u16) -> Option<bool> {
        self.mutes.get(&address).map(|entry| *entry)
    }

    pub fn set_scene(&self, scene: u16) -> bool {
        self.scene.lock().replace(scene) != Some(scene)
    }

    pub fn scene(&self) -> Option<u16> {
        *self.scene.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_detection() {
        let store = StateStore::new();
        assert!(store.set_level(0x2000, 0x70, 0x00));
        assert!(!store.set_level(0x2000, 0x70, 0x00));
        assert!(store.set_level(0x2000, 0x70, 0x01));
        assert_eq!(store.level(0x2000), Some((0x70, 0x01)));
        assert_eq!(store.level(0x2001), None);

        assert!(store.set_mute(0x0000, true));
        assert!(!store.set_mute(0x0000, true));
        assert_eq!(store.mute(0x0000), Some(true));

        assert!(store.set_scene(4));
        assert!(!store.set_scene(4));
        assert_eq!(store.scene(), Some(4));
    }

    #[test]
    fn test_key_formats() {
        assert_eq!(level_key(0x45, 0x04), "level_69.4");
        assert_eq!(mute_key(0x00, 0x2F), "mute_0.47");
    }
}
