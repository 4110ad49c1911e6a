//! Builder for configuring and connecting an [`SqMixer`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sqmix_proto::{FaderLaw, Model};
use sqmix_session::{
    ChangeListener, Connection, MixerSession, NopListener, Pacing, SessionConfig, DEFAULT_PORT,
};

use crate::{Result, SqMixer};

/// Serializable connection settings, for hosts that keep them in a config
/// file. `SqMixerBuilder::from_config` turns one into a builder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MixerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub model: Model,
    #[serde(default)]
    pub midi_channel: u8,
    #[serde(default = "default_fader_law")]
    pub fader_law: FaderLaw,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_fader_law() -> FaderLaw {
    FaderLaw::LinearTaper
}

/// The MIDI channel and fader law must match the console's MIDI settings
/// page or every address and level on the wire will be wrong; there is no
/// way to detect a mismatch from this side.
///
/// # Example
///
/// ```ignore
/// use sqmix::prelude::*;
///
/// let mixer = SqMixer::builder("192.168.1.60", Model::Sq6)
///     .fader_law(FaderLaw::AudioTaper)
///     .connect()?;
///
/// mixer.session().set_mute(Category::InputChannel, 0, true)?;
/// ```
pub struct SqMixerBuilder {
    host: String,
    port: u16,
    model: Model,
    midi_channel: u8,
    fader_law: FaderLaw,
    pacing: Pacing,
    listener: Arc<dyn ChangeListener>,
}

impl SqMixerBuilder {
    pub fn new(host: impl Into<String>, model: Model) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            model,
            midi_channel: 0,
            fader_law: FaderLaw::LinearTaper,
            pacing: Pacing::default(),
            listener: Arc::new(NopListener),
        }
    }

    pub fn from_config(config: &MixerConfig) -> Self {
        Self::new(config.host.clone(), config.model)
            .port(config.port)
            .midi_channel(config.midi_channel)
            .fader_law(config.fader_law)
    }

    /// Default: 51325, the console's fixed listener.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Default: 0 (channel 1 on the console's MIDI settings page).
    pub fn midi_channel(mut self, channel: u8) -> Self {
        self.midi_channel = channel & 0x0F;
        self
    }

    /// Default: [`FaderLaw::LinearTaper`].
    pub fn fader_law(mut self, law: FaderLaw) -> Self {
        self.fader_law = law;
        self
    }

    /// Outbound command pacing. The default suits a full-status refresh;
    /// raise it only if the console drops requests.
    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Receive change notifications for values the console reports.
    pub fn listener(mut self, listener: Arc<dyn ChangeListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Open the TCP connection, spawn the writer and reader threads, and
    /// return the live mixer handle.
    pub fn connect(self) -> Result<SqMixer> {
        let (connection, reader) =
            Connection::connect((self.host.as_str(), self.port), self.pacing)?;

        let config = SessionConfig {
            model: self.model,
            midi_channel: self.midi_channel,
            fader_law: self.fader_law,
            pacing: self.pacing,
        };
        let session = MixerSession::new(config, Arc::new(connection.clone()), self.listener);
        session.attach_reader(reader, connection.status_cell());
        tracing::info!(host = %self.host, port = self.port, model = %self.model, "connected to console");

        Ok(SqMixer::from_parts(connection, session))
    }
}
