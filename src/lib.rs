#![cfg_attr(docsrs, feature(doc_cfg))]
//! `intake`: a cross-platform input abstraction core.
//!
//! Intake unifies heterogeneous physical input sources (keyboards, mice,
//! game controllers over several transports: XInput, raw USB HID, the Linux
//! joystick API, plus touch surfaces) behind one polymorphic device model,
//! and feeds their state into a per-frame, listener-driven delta pipeline.
//!
//! # Platform support
//! - **Linux**: X11 keyboard/mouse, evdev raw keyboard, `/dev/input/jsN`
//!   pads with inotify hot-plug, and raw HID (PlayStation family) via
//!   `hidapi`.
//! - **Windows**: Raw Input keyboard/mouse, XInput pads, raw HID.
//! - Everywhere: the synthetic source, which feeds devices programmatically
//!   (tests, embedder glue for platforms that deliver pre-translated input).
//!
//! # Quick start
//! ```no_run
//! use intake::prelude::*;
//!
//! let mut manager = InputManager::new(InputConfig::default());
//! manager.init().expect("init input");
//! let keyboard = manager.create_keyboard(DeviceVariant::Standard).unwrap();
//! manager.create_controllers(4).unwrap();
//!
//! loop {
//!     // Pump platform events into `manager.handle_event(..)` here.
//!     manager.update(1.0 / 60.0).unwrap();
//!     let device = manager.get_device(keyboard).unwrap();
//!     if device.get_bool(Key::Escape.id()) {
//!         break;
//!     }
//! }
//! manager.exit().unwrap();
//! ```
//!
//! # Modules
//! - [`manager`] — device registry, tick, listeners
//! - [`device`] — device model shared across kinds
//! - [`devices`] — per-kind façades (keyboard, mouse, pad, touch)
//! - [`backends`] — platform translation layers
//! - [`buttons`] — canonical button/axis id spaces and ABI-stable names
//! - [`mapping`] — controller GUIDs and the dialect database
//! - [`rumble`] — the haptics scheduler and HID report layouts
//! - [`config`] — runtime options
//!
//! ## Threading
//! The manager lives on **one thread**; `update`, listener callbacks, and
//! all registry mutation happen there. Other threads talk to it exclusively
//! through the bounded [`InputQueue`](queue::InputQueue) (and the rumble
//! worker, which the manager owns). Listener callbacks must not block.

pub mod backends;
pub mod buttons;
pub mod config;
pub mod containers;
pub mod delta;
pub mod device;
pub mod devices;
pub mod evaluate;
pub mod manager;
pub mod mapping;
pub mod queue;
pub mod rumble;
pub mod state;

/// Error and Result types for the crate.
pub mod error {
    //! Error and result types used across intake.
    //!
    //! Runtime input handling never raises errors through the update path:
    //! device loss, unknown buttons, and I/O hiccups are absorbed locally
    //! and logged. What remains here are programmer errors (lifecycle
    //! misuse), configuration/database loading failures, and the OS
    //! resources `init` must acquire up front (the rumble worker thread).

    /// Crate-wide error type.
    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        /// `init` was called on an already-initialized manager.
        #[error("input manager is already initialized")]
        AlreadyInitialized,

        /// An operation other than `init` ran before `init` (or after
        /// `exit`).
        #[error("input manager is not initialized")]
        NotInitialized,

        /// A one-shot setup step was repeated.
        #[error("invalid operation: {0}")]
        InvalidOperation(&'static str),

        /// Configuration file or value rejected.
        #[error("invalid configuration: {0}")]
        Config(String),

        /// Controller mapping line or database rejected.
        #[error("bad controller mapping: {0}")]
        Mapping(String),

        /// The rumble worker thread could not be started.
        #[error("failed to spawn rumble worker: {0}")]
        RumbleWorker(String),
    }

    /// Convenient crate-wide result alias.
    pub type Result<T> = core::result::Result<T, Error>;
}

pub use error::{Error, Result};
pub use manager::InputManager;

// ---- Re-exports (convenience) ----
pub use buttons::{ButtonType, DeviceButtonId, Key, MouseButton, PadButton};
pub use config::InputConfig;
pub use device::{DeviceId, DeviceKind, DeviceState, DeviceVariant, InputDeviceOps};

// A tiny prelude for downstreams.
pub mod prelude {
    pub use crate::backends::SyntheticEvent;
    pub use crate::buttons::{ButtonType, DeviceButtonId, Key, MouseButton, PadButton};
    pub use crate::config::InputConfig;
    pub use crate::delta::{DeltaState, InputListener, ListenerId};
    pub use crate::device::{
        DeviceButtonSpec, DeviceId, DeviceInput, DeviceInputValue, DeviceKind, DeviceState,
        DeviceVariant, InputDeviceOps,
    };
    pub use crate::manager::{DeviceStateModifier, InputManager};
    pub use crate::queue::InputQueue;
}
