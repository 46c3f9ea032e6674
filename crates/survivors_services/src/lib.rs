//! Survivors Services Layer
//!
//! Host-facing services the simulation consumes: settings files and the
//! input collaborator.

pub mod input;
pub mod settings;

pub use input::{InputRecording, InputSource, InputState};
pub use settings::{Settings, SettingsError};
