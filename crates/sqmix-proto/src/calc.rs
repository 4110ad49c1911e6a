//! The NRPN address calculator.
//!
//! One [`SendCalculator`] or [`StripCalculator`] exists per (kind, source,
//! sink) triple; base lookup and bounds metadata are constant per triple, so
//! [`AddressCalculator::new`] builds the whole (small, fully known) triple
//! space eagerly and full-status refresh can enumerate thousands of addresses
//! without recomputing anything. The mute reverse map is generated from the
//! same forward calculators, so the two directions cannot drift apart.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::{Category, Model};
use crate::nrpn::{kind, kind::ParamKind, Nrpn, ParamTag};
use crate::tables::{self, Base, SEND_SINKS, SEND_SOURCES};

/// A send target that is either the LR main or a numbered mix.
///
/// LR has its own base table rows; it is never addressed as a thirteenth
/// mix, so helpers taking this type branch between two calculators.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MixOrLr {
    Lr,
    Mix(u16),
}

/// Calculates addresses for one two-dimensional (source × sink) family.
#[derive(Clone, Debug)]
pub struct SendCalculator<K: ParamKind> {
    model: Model,
    source: Category,
    sink: Category,
    base: Base,
    source_count: u16,
    sink_count: u16,
    _kind: std::marker::PhantomData<K>,
}

impl<K: ParamKind> SendCalculator<K> {
    fn new(model: Model, source: Category, sink: Category, base: Base) -> Self {
        Self {
            model,
            source,
            sink,
            base,
            source_count: model.count(source),
            sink_count: model.count(sink),
            _kind: std::marker::PhantomData,
        }
    }

    pub fn source(&self) -> Category {
        self.source
    }

    pub fn sink(&self) -> Category {
        self.sink
    }

    /// Address of `source_index` into `sink_index`.
    pub fn nrpn(&self, source_index: u16, sink_index: u16) -> Result<Nrpn<K>> {
        self.model.check_index(self.source, source_index)?;
        self.model.check_index(self.sink, sink_index)?;
        let value = u16::from(self.base.lsb) + self.sink_count * source_index + sink_index;
        Ok(Nrpn::new(
            self.base.msb + ((value >> 7) & 0x0F) as u8,
            (value & 0x7F) as u8,
        ))
    }

    /// Every valid (source, sink) pair with its address.
    pub fn addresses(&self) -> impl Iterator<Item = ((u16, u16), Nrpn<K>)> + '_ {
        (0..self.source_count).flat_map(move |si| {
            (0..self.sink_count).map(move |ki| {
                let nrpn = self
                    .nrpn(si, ki)
                    .expect("in-bounds indices always calculate");
                ((si, ki), nrpn)
            })
        })
    }
}

/// Calculates addresses for one single-dimension family (mutes, output
/// masters, softkeys).
#[derive(Clone, Debug)]
pub struct StripCalculator<K: ParamKind> {
    model: Model,
    category: Category,
    base: Base,
    count: u16,
    _kind: std::marker::PhantomData<K>,
}

impl<K: ParamKind> StripCalculator<K> {
    fn new(model: Model, category: Category, base: Base) -> Self {
        Self {
            model,
            category,
            base,
            count: model.count(category),
            _kind: std::marker::PhantomData,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn nrpn(&self, index: u16) -> Result<Nrpn<K>> {
        self.model.check_index(self.category, index)?;
        let value = u16::from(self.base.lsb) + index;
        Ok(Nrpn::new(
            self.base.msb + ((value >> 7) & 0x0F) as u8,
            (value & 0x7F) as u8,
        ))
    }

    pub fn addresses(&self) -> impl Iterator<Item = (u16, Nrpn<K>)> + '_ {
        (0..self.count).map(move |i| {
            let nrpn = self.nrpn(i).expect("in-bounds index always calculates");
            (i, nrpn)
        })
    }
}

/// Eagerly built calculator set for one console model, plus the mute reverse
/// map used to resolve incoming mute feedback back to a (category, index).
pub struct AddressCalculator {
    model: Model,
    mute: HashMap<Category, StripCalculator<kind::Mute>>,
    level_sends: HashMap<(Category, Category), SendCalculator<kind::Level>>,
    pan_sends: HashMap<(Category, Category), SendCalculator<kind::PanBalance>>,
    assign_sends: HashMap<(Category, Category), SendCalculator<kind::Assign>>,
    level_outputs: HashMap<Category, StripCalculator<kind::Level>>,
    pan_outputs: HashMap<Category, StripCalculator<kind::PanBalance>>,
    mute_reverse: HashMap<(u8, u8), (Category, u16)>,
}

impl AddressCalculator {
    pub fn new(model: Model) -> Self {
        let mut mute = HashMap::new();
        for category in Category::ALL {
            if let Some(base) = tables::mute_base(category) {
                mute.insert(category, StripCalculator::new(model, category, base));
            }
        }

        let mute_reverse = mute
            .values()
            .flat_map(|calc| {
                let category = calc.category();
                calc.addresses()
                    .map(move |(index, nrpn)| ((nrpn.msb(), nrpn.lsb()), (category, index)))
            })
            .collect();

        Self {
            model,
            mute,
            level_sends: Self::build_sends(model),
            pan_sends: Self::build_sends(model),
            assign_sends: Self::build_sends(model),
            level_outputs: Self::build_outputs(model),
            pan_outputs: Self::build_outputs(model),
            mute_reverse,
        }
    }

    fn build_sends<K: ParamKind>(model: Model) -> HashMap<(Category, Category), SendCalculator<K>> {
        let mut map = HashMap::new();
        for source in SEND_SOURCES {
            for sink in SEND_SINKS {
                if let Some(base) = tables::send_base(K::TAG, source, sink) {
                    map.insert((source, sink), SendCalculator::new(model, source, sink, base));
                }
            }
        }
        map
    }

    fn build_outputs<K: ParamKind>(model: Model) -> HashMap<Category, StripCalculator<K>> {
        let mut map = HashMap::new();
        for category in Category::ALL {
            if let Some(base) = tables::output_base(K::TAG, category) {
                map.insert(category, StripCalculator::new(model, category, base));
            }
        }
        map
    }

    pub fn model(&self) -> Model {
        self.model
    }

    // ==================== Mute & softkey ====================

    pub fn mute(&self, category: Category, index: u16) -> Result<Nrpn<kind::Mute>> {
        self.mute
            .get(&category)
            .ok_or(Error::UnsupportedStrip {
                kind: ParamTag::Mute,
                category,
            })?
            .nrpn(index)
    }

    /// Resolve an incoming mute address back to its (category, index).
    pub fn resolve_mute(&self, msb: u8, lsb: u8) -> Option<(Category, u16)> {
        self.mute_reverse.get(&(msb, lsb)).copied()
    }

    // ==================== Sends ====================

    pub fn send_level(
        &self,
        source: Category,
        sink: Category,
        source_index: u16,
        sink_index: u16,
    ) -> Result<Nrpn<kind::Level>> {
        Self::send(&self.level_sends, source, sink, source_index, sink_index)
    }

    pub fn send_pan(
        &self,
        source: Category,
        sink: Category,
        source_index: u16,
        sink_index: u16,
    ) -> Result<Nrpn<kind::PanBalance>> {
        Self::send(&self.pan_sends, source, sink, source_index, sink_index)
    }

    pub fn send_assign(
        &self,
        source: Category,
        sink: Category,
        source_index: u16,
        sink_index: u16,
    ) -> Result<Nrpn<kind::Assign>> {
        Self::send(&self.assign_sends, source, sink, source_index, sink_index)
    }

    /// Level of `source_index` into LR or a numbered mix.
    pub fn send_level_mix(
        &self,
        source: Category,
        source_index: u16,
        sink: MixOrLr,
    ) -> Result<Nrpn<kind::Level>> {
        match sink {
            MixOrLr::Lr => self.send_level(source, Category::Lr, source_index, 0),
            MixOrLr::Mix(i) => self.send_level(source, Category::Mix, source_index, i),
        }
    }

    pub fn send_pan_mix(
        &self,
        source: Category,
        source_index: u16,
        sink: MixOrLr,
    ) -> Result<Nrpn<kind::PanBalance>> {
        match sink {
            MixOrLr::Lr => self.send_pan(source, Category::Lr, source_index, 0),
            MixOrLr::Mix(i) => self.send_pan(source, Category::Mix, source_index, i),
        }
    }

    pub fn send_assign_mix(
        &self,
        source: Category,
        source_index: u16,
        sink: MixOrLr,
    ) -> Result<Nrpn<kind::Assign>> {
        match sink {
            MixOrLr::Lr => self.send_assign(source, Category::Lr, source_index, 0),
            MixOrLr::Mix(i) => self.send_assign(source, Category::Mix, source_index, i),
        }
    }

    fn send<K: ParamKind>(
        map: &HashMap<(Category, Category), SendCalculator<K>>,
        source: Category,
        sink: Category,
        source_index: u16,
        sink_index: u16,
    ) -> Result<Nrpn<K>> {
        map.get(&(source, sink))
            .ok_or(Error::UnsupportedSend {
                kind: K::TAG,
                from: source,
                sink,
            })?
            .nrpn(source_index, sink_index)
    }

    // ==================== Output masters ====================

    pub fn output_level(&self, category: Category, index: u16) -> Result<Nrpn<kind::Level>> {
        self.level_outputs
            .get(&category)
            .ok_or(Error::UnsupportedOutput {
                kind: ParamTag::Level,
                category,
            })?
            .nrpn(index)
    }

    pub fn output_balance(&self, category: Category, index: u16) -> Result<Nrpn<kind::PanBalance>> {
        self.pan_outputs
            .get(&category)
            .ok_or(Error::UnsupportedOutput {
                kind: ParamTag::PanBalance,
                category,
            })?
            .nrpn(index)
    }

    // ==================== Enumeration (full-status refresh) ====================

    pub fn all_mutes(&self) -> impl Iterator<Item = Nrpn<kind::Mute>> + '_ {
        self.mute
            .values()
            .flat_map(|calc| calc.addresses().map(|(_, nrpn)| nrpn))
    }

    pub fn all_levels(&self) -> impl Iterator<Item = Nrpn<kind::Level>> + '_ {
        self.level_sends
            .values()
            .flat_map(|calc| calc.addresses().map(|(_, nrpn)| nrpn))
            .chain(
                self.level_outputs
                    .values()
                    .flat_map(|calc| calc.addresses().map(|(_, nrpn)| nrpn)),
            )
    }

    pub fn all_pans(&self) -> impl Iterator<Item = Nrpn<kind::PanBalance>> + '_ {
        self.pan_sends
            .values()
            .flat_map(|calc| calc.addresses().map(|(_, nrpn)| nrpn))
            .chain(
                self.pan_outputs
                    .values()
                    .flat_map(|calc| calc.addresses().map(|(_, nrpn)| nrpn)),
            )
    }

    pub fn all_assigns(&self) -> impl Iterator<Item = Nrpn<kind::Assign>> + '_ {
        self.assign_sends
            .values()
            .flat_map(|calc| calc.addresses().map(|(_, nrpn)| nrpn))
    }
}
