#![forbid(unsafe_code)]

//! Versioned, typed preference store
//!
//! A flat key/value property map with typed accessors (string, bool, int,
//! double, color, dimension, list), ordered-group bookkeeping, a
//! single-step schema migration engine, TOML persistence under the
//! platform config directory, and change notification with a pluggable
//! delivery policy.
//!
//! Applications describe a store through a [`PreferenceModel`] (file
//! name, schema version, defaults, upgrade steps) and interact with it
//! through [`Preferences`], either directly or via the process-wide
//! [`registry`].

pub mod color;
pub mod constants;
pub mod error;
pub mod notify;
pub mod registry;
pub mod store;
pub mod value;

pub use color::HexColor;
pub use error::PrefError;
pub use notify::{ChannelDispatch, Dispatch, ImmediateDispatch, ObserverId};
pub use store::{PreferenceModel, Preferences, PropertyMap};
pub use value::PrefValue;
