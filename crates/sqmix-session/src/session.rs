//! The mixer session: one console connection's worth of state and behavior.
//!
//! Inbound, a single reader loop drives bytes → tokenizer → channel parser →
//! event application (strictly in socket-arrival order, one unit at a time).
//! Outbound, host intents resolve through the address calculator into raw
//! command bytes handed to the sink. Cloning the session is cheap; all state
//! lives behind one `Arc`.

use std::io::Read;
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use sqmix_midi::{ChannelParser, MixerEvent, Tokenizer};
use sqmix_proto::{
    kind, AddressCalculator, Category, FaderLaw, Level, MixOrLr, Model, Nrpn, Pan, PanDirection,
};

use crate::commands;
use crate::connection::{ConnectionStatus, MidiSink, Pacing};
use crate::error::{Error, Result};
use crate::fade::FadeEngine;
use crate::store::{level_key, mute_key, pan_key, ChangeListener, StateStore};

/// Per-console session configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    pub model: Model,
    /// MIDI channel 0-15 the console is configured to speak on.
    pub midi_channel: u8,
    pub fader_law: FaderLaw,
    pub pacing: Pacing,
}

impl SessionConfig {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            midi_channel: 0,
            fader_law: FaderLaw::LinearTaper,
            pacing: Pacing::default(),
        }
    }
}

struct SessionInner {
    config: SessionConfig,
    calc: AddressCalculator,
    store: Arc<StateStore>,
    sink: Arc<dyn MidiSink>,
    fades: FadeEngine,
    listener: Arc<dyn ChangeListener>,
    pipeline: Mutex<(Tokenizer, ChannelParser)>,
}

/// A live console session. Clone is cheap (`Arc` internally).
#[derive(Clone)]
pub struct MixerSession {
    inner: Arc<SessionInner>,
}

impl MixerSession {
    pub fn new(
        config: SessionConfig,
        sink: Arc<dyn MidiSink>,
        listener: Arc<dyn ChangeListener>,
    ) -> Self {
        let store = Arc::new(StateStore::new());
        let fades = FadeEngine::new(
            config.midi_channel,
            config.fader_law,
            Arc::clone(&sink),
            Arc::clone(&store),
            Arc::clone(&listener),
        );
        Self {
            inner: Arc::new(SessionInner {
                calc: AddressCalculator::new(config.model),
                config,
                store,
                sink,
                fades,
                listener,
                pipeline: Mutex::new((Tokenizer::new(), ChannelParser::new())),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn calculator(&self) -> &AddressCalculator {
        &self.inner.calc
    }

    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }

    /// Spawn the reader loop over a connected stream. On EOF or error the
    /// status cell flips to `Disconnected` and all in-flight fades are
    /// cancelled so nothing writes to the dead connection.
    pub fn attach_reader(&self, mut stream: TcpStream, status: Arc<ArcSwap<ConnectionStatus>>) {
        let session = self.clone();
        thread::Builder::new()
            .name("sqmix-reader".into())
            .spawn(move || {
                let mut buf = [0u8; 4096];
                loop {
                    match stream.read(&mut buf) {
                        Ok(0) => {
                            debug!("console closed the connection");
                            break;
                        }
                        Ok(n) => session.pump(&buf[..n]),
                        Err(err) => {
                            warn!(%err, "console read failed");
                            break;
                        }
                    }
                }
                status.store(Arc::new(ConnectionStatus::Disconnected));
                session.inner.fades.shutdown();
            })
            .expect("failed to spawn reader thread");
    }

    /// Feed raw received bytes through tokenizer and parser, applying every
    /// resulting event. Messages on other MIDI channels are filtered here.
    pub fn pump(&self, bytes: &[u8]) {
        let mut pipeline = self.inner.pipeline.lock();
        let (tokenizer, parser) = &mut *pipeline;
        tokenizer.feed(bytes);
        while let Some(message) = tokenizer.next_message() {
            match message.channel() {
                Some(ch) if ch == self.inner.config.midi_channel => {
                    if let Some(event) = parser.handle(&message) {
                        self.apply(event);
                    }
                }
                Some(ch) => {
                    trace!(channel = ch, "message on foreign MIDI channel ignored")
                }
                None => {}
            }
        }
    }

    fn apply(&self, event: MixerEvent) {
        let inner = &self.inner;
        match event {
            MixerEvent::SceneRecalled { scene } => {
                if inner.store.set_scene(scene) {
                    inner.listener.scene_changed(scene);
                }
            }
            MixerEvent::Mute { msb, lsb, on } => {
                let address = u16::from(msb) << 7 | u16::from(lsb);
                if inner.store.set_mute(address, on) {
                    if let Some((category, index)) = inner.calc.resolve_mute(msb, lsb) {
                        trace!(%category, index, on, "mute feedback");
                    }
                    inner.listener.mute_changed(&mute_key(msb, lsb), on);
                }
            }
            MixerEvent::FaderLevel { msb, lsb, vc, vf } => {
                let address = u16::from(msb) << 7 | u16::from(lsb);
                if inner.store.set_level(address, vc, vf) {
                    inner.listener.level_changed(&level_key(msb, lsb), vc, vf);
                }
            }
            MixerEvent::PanLevel { msb, lsb, vc, vf } => {
                let address = u16::from(msb) << 7 | u16::from(lsb);
                if inner.store.set_pan(address, vc, vf) {
                    inner.listener.pan_changed(&pan_key(msb, lsb), vc, vf);
                }
            }
        }
    }

    // ==================== Mutes & softkeys ====================

    pub fn set_mute(&self, category: Category, index: u16, on: bool) -> Result<()> {
        let nrpn = self.inner.calc.mute(category, index)?;
        self.send_on_off(nrpn.msb(), nrpn.lsb(), on);
        let address = nrpn.as_u14();
        if self.inner.store.set_mute(address, on) {
            self.inner
                .listener
                .mute_changed(&mute_key(nrpn.msb(), nrpn.lsb()), on);
        }
        Ok(())
    }

    /// Press (`true`) or release (`false`) a surface softkey.
    pub fn set_softkey(&self, index: u16, pressed: bool) -> Result<()> {
        let nrpn = self.inner.calc.mute(Category::SoftKey, index)?;
        self.send_on_off(nrpn.msb(), nrpn.lsb(), pressed);
        Ok(())
    }

    fn send_on_off(&self, msb: u8, lsb: u8, on: bool) {
        self.inner.sink.send(&commands::nrpn_set(
            self.inner.config.midi_channel,
            msb,
            lsb,
            0x00,
            on as u8,
        ));
    }

    // ==================== Levels ====================

    /// Immediately set a level toward the LR main or a numbered mix; the two
    /// targets live in different base table rows, hence the branch type.
    pub fn set_mix_level(
        &self,
        source: Category,
        source_index: u16,
        sink: MixOrLr,
        level: Level,
    ) -> Result<()> {
        let nrpn = self
            .inner
            .calc
            .send_level_mix(source, source_index, sink)?;
        self.inner.fades.set(nrpn, level);
        Ok(())
    }

    /// Immediately set a send level on an arbitrary source/sink pair.
    pub fn set_send_level(
        &self,
        source: Category,
        sink: Category,
        source_index: u16,
        sink_index: u16,
        level: Level,
    ) -> Result<()> {
        let nrpn = self
            .inner
            .calc
            .send_level(source, sink, source_index, sink_index)?;
        self.inner.fades.set(nrpn, level);
        Ok(())
    }

    pub fn set_output_level(&self, category: Category, index: u16, level: Level) -> Result<()> {
        let nrpn = self.inner.calc.output_level(category, index)?;
        self.inner.fades.set(nrpn, level);
        Ok(())
    }

    /// Ramp a send level to `target` over `duration`. The start value is the
    /// last known level for the address; with none stored the set happens
    /// immediately.
    pub fn fade_send_level(
        &self,
        source: Category,
        sink: Category,
        source_index: u16,
        sink_index: u16,
        target: Level,
        duration: Duration,
    ) -> Result<()> {
        let nrpn = self
            .inner
            .calc
            .send_level(source, sink, source_index, sink_index)?;
        self.fade_to(nrpn, target, duration);
        Ok(())
    }

    pub fn fade_output_level(
        &self,
        category: Category,
        index: u16,
        target: Level,
        duration: Duration,
    ) -> Result<()> {
        let nrpn = self.inner.calc.output_level(category, index)?;
        self.fade_to(nrpn, target, duration);
        Ok(())
    }

    fn fade_to(&self, nrpn: Nrpn<kind::Level>, target: Level, duration: Duration) {
        let start = match self.inner.store.level(nrpn.as_u14()) {
            Some((vc, vf)) => sqmix_proto::data_to_level(vc, vf, self.inner.config.fader_law),
            None => {
                debug!(%nrpn, "no last-known level for fade start, setting immediately");
                target
            }
        };
        self.inner.fades.fade(nrpn, start, target, duration);
    }

    // ==================== Pan / balance ====================

    pub fn set_send_pan(
        &self,
        source: Category,
        sink: Category,
        source_index: u16,
        sink_index: u16,
        pan: Pan,
    ) -> Result<()> {
        let nrpn = self
            .inner
            .calc
            .send_pan(source, sink, source_index, sink_index)?;
        self.write_pan(nrpn, pan);
        Ok(())
    }

    pub fn set_output_balance(&self, category: Category, index: u16, pan: Pan) -> Result<()> {
        let nrpn = self.inner.calc.output_balance(category, index)?;
        self.write_pan(nrpn, pan);
        Ok(())
    }

    fn write_pan(&self, nrpn: Nrpn<kind::PanBalance>, pan: Pan) {
        let (vc, vf) = pan.to_data();
        self.inner.sink.send(&commands::nrpn_set(
            self.inner.config.midi_channel,
            nrpn.msb(),
            nrpn.lsb(),
            vc,
            vf,
        ));
        if self.inner.store.set_pan(nrpn.as_u14(), vc, vf) {
            self.inner
                .listener
                .pan_changed(&pan_key(nrpn.msb(), nrpn.lsb()), vc, vf);
        }
    }

    /// Step a pan position one console unit left or right.
    pub fn step_send_pan(
        &self,
        source: Category,
        sink: Category,
        source_index: u16,
        sink_index: u16,
        direction: PanDirection,
    ) -> Result<()> {
        let nrpn = self
            .inner
            .calc
            .send_pan(source, sink, source_index, sink_index)?;
        let channel = self.inner.config.midi_channel;
        let bytes = match direction {
            PanDirection::Right => commands::nrpn_increment(channel, nrpn.msb(), nrpn.lsb(), 0x00),
            PanDirection::Left => commands::nrpn_decrement(channel, nrpn.msb(), nrpn.lsb(), 0x00),
        };
        self.inner.sink.send(&bytes);
        // The console echoes the resulting position; the store updates then.
        self.request(nrpn.msb(), nrpn.lsb());
        Ok(())
    }

    // ==================== Assignments ====================

    /// Route (or unroute) a source into a sink.
    pub fn set_assign(
        &self,
        source: Category,
        sink: Category,
        source_index: u16,
        sink_index: u16,
        on: bool,
    ) -> Result<()> {
        let nrpn = self
            .inner
            .calc
            .send_assign(source, sink, source_index, sink_index)?;
        self.send_on_off(nrpn.msb(), nrpn.lsb(), on);
        Ok(())
    }

    // ==================== Scenes ====================

    pub fn recall_scene(&self, scene: u16) -> Result<()> {
        self.inner.config.model.check_scene(scene)?;
        self.inner
            .sink
            .send(&commands::scene_recall(self.inner.config.midi_channel, scene));
        Ok(())
    }

    /// Step relative to the current scene, clamped to the scene range.
    /// Requires at least one scene recall to have been observed.
    pub fn step_scene(&self, delta: i16) -> Result<()> {
        let current = self.inner.store.scene().ok_or(Error::SceneUnknown)?;
        let stepped = (i32::from(current) + i32::from(delta))
            .clamp(0, i32::from(Model::SCENE_COUNT) - 1) as u16;
        if stepped != current {
            self.recall_scene(stepped)?;
        }
        Ok(())
    }

    // ==================== Value retrieval ====================

    fn request(&self, msb: u8, lsb: u8) {
        self.inner
            .sink
            .send(&commands::nrpn_get(self.inner.config.midi_channel, msb, lsb));
    }

    pub fn request_send_level(
        &self,
        source: Category,
        sink: Category,
        source_index: u16,
        sink_index: u16,
    ) -> Result<()> {
        let nrpn = self
            .inner
            .calc
            .send_level(source, sink, source_index, sink_index)?;
        self.request(nrpn.msb(), nrpn.lsb());
        Ok(())
    }

    pub fn request_output_level(&self, category: Category, index: u16) -> Result<()> {
        let nrpn = self.inner.calc.output_level(category, index)?;
        self.request(nrpn.msb(), nrpn.lsb());
        Ok(())
    }

    /// Query every address of every kind the model has. The writer's pacing
    /// keeps the resulting burst within what the console can absorb.
    pub fn request_full_status(&self) {
        let calc = &self.inner.calc;
        for nrpn in calc.all_mutes() {
            self.request(nrpn.msb(), nrpn.lsb());
        }
        for nrpn in calc.all_assigns() {
            self.request(nrpn.msb(), nrpn.lsb());
        }
        for nrpn in calc.all_levels() {
            self.request(nrpn.msb(), nrpn.lsb());
        }
        for nrpn in calc.all_pans() {
            self.request(nrpn.msb(), nrpn.lsb());
        }
    }

    /// Cancel fades and release the session's threads. Called on disconnect.
    pub fn shutdown(&self) {
        self.inner.fades.shutdown();
    }
}
