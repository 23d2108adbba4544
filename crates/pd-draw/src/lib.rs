//! # pd-draw: Winner selection and draw state machine
//!
//! Samples winners from the eligible pool and walks a prize through its
//! draw cycles: standby → drawing → confirming → revealing → standby.
//!
//! ## Architecture
//!
//! ```text
//! DrawMachine
//!     │
//!     ├── SystemState (standby / drawing / confirming / revealing)
//!     ├── DrawMode (all / one / custom) + custom_draw_count
//!     ├── Option<Draw> (in-flight prize session)
//!     └── Sampler (seedable RNG, Fisher–Yates)
//!           │
//!           v
//!     Roster mutations (winners, has_won, drawn_count)
//! ```
//!
//! The machine never owns entities; every transition borrows the session
//! [`pd_core::Roster`] and either applies completely or returns an error
//! with nothing changed.

pub mod draw;
pub mod error;
pub mod machine;
pub mod selection;

pub use draw::*;
pub use error::*;
pub use machine::*;
pub use selection::*;
