//! Teleprompter playback engine.
//!
//! The engine keeps a script's elapsed time and its scroll position in step:
//! timed autoplay, manual takeover, recorded gesture automation and an
//! optional video element all meet in [`session::Session`].

pub mod automation;
pub mod clock;
pub mod config;
pub mod error;
pub mod formats;
pub mod layout;
pub mod model;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod timeline;
pub mod video;

pub use error::{EngineError, MediaError, Result, StoreError};
pub use session::{Frame, Mode, Session, SessionEvent, SessionSettings};
