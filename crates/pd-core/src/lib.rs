//! pd-core: Entity model for the prize draw engine
//!
//! Participants, prizes and winner records, the derived statistics, and the
//! display customisation types shared by the console and the display view.
//! Everything here is plain data plus validation; the draw logic lives in
//! `pd-draw` and the authoritative session in `pd-state`.

mod error;
mod ids;
mod participant;
mod prize;
mod winner;
mod stats;
mod roster;
mod settings;

pub use error::*;
pub use ids::*;
pub use participant::*;
pub use prize::*;
pub use winner::*;
pub use stats::*;
pub use roster::*;
pub use settings::*;
