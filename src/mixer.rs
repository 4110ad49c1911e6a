//! The connected-mixer handle tying the transport and the session together.

use sqmix_session::{Connection, ConnectionStatus, MixerSession};

/// A live connection to one SQ console.
///
/// Cheap to clone; all clones share the same connection and session. The
/// console accepts multiple simultaneous TCP clients, so several `SqMixer`
/// instances (in one process or many) can coexist against one desk.
#[derive(Clone)]
pub struct SqMixer {
    connection: Connection,
    session: MixerSession,
}

impl SqMixer {
    /// Start configuring a connection. See [`crate::SqMixerBuilder`].
    pub fn builder(host: impl Into<String>, model: sqmix_proto::Model) -> crate::SqMixerBuilder {
        crate::SqMixerBuilder::new(host, model)
    }

    pub(crate) fn from_parts(connection: Connection, session: MixerSession) -> Self {
        Self {
            connection,
            session,
        }
    }

    /// All mixer operations live on the session.
    pub fn session(&self) -> &MixerSession {
        &self.session
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.status() == ConnectionStatus::Connected
    }

    /// Close the connection and stop the writer, reader and fade threads.
    /// Idempotent; clones of this handle see `Disconnected` afterwards.
    pub fn disconnect(&self) {
        self.session.shutdown();
        self.connection.shutdown();
    }
}
