//! Event bus used to report run lifecycle.
//!
//! The walker emits [`Event`]s through an [`EventEmitter`]; reporters and
//! metrics subscribe by [`EventKind`].

pub mod emitter;
pub mod event;

pub use emitter::{handler, EventEmitter, Handler};
pub use event::{BlockCompletion, Event, EventKind};
