//! Device façades.
//!
//! Each device kind pairs a kind-specific façade (canonical state buffers,
//! button-name services, text queue, dead-zone table) with a backend trait
//! object that translates one platform's raw events into the canonical
//! space. Backends live under [`crate::backends`].

pub mod keyboard;
pub mod mouse;
pub mod pad;
pub mod touch;

pub use keyboard::{KeyboardBackend, KeyboardDevice};
pub use mouse::{MouseBackend, MouseDevice};
pub use pad::{PadBackend, PadDevice};
pub use touch::{TouchBackend, TouchDevice};
