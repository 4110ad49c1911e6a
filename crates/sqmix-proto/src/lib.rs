//! Pure protocol calculus for SQ-series consoles.
//!
//! Everything in this crate is stateless arithmetic over the vendor protocol
//! document: console models and their object counts, the NRPN address
//! calculator with its hand-transcribed base tables, and the numeric codecs
//! for fader levels (both fader laws) and pan/balance positions. No I/O, no
//! sockets, no time.

pub mod error;
pub use error::{Error, Result};

mod model;
pub use model::{Category, Model};

mod nrpn;
pub use nrpn::{kind, Nrpn, ParamTag};

pub(crate) mod tables;

mod calc;
pub use calc::{AddressCalculator, MixOrLr, SendCalculator, StripCalculator};

mod level;
pub use level::{data_to_level, level_to_data, FaderLaw, Level};

mod pan;
pub use pan::{all_pan_positions, Pan, PanDirection};
