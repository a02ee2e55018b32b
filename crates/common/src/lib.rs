//! Shared configuration for the p4 wrapper: platform defaults, well-known
//! paths and the preferences document.

pub mod paths;
pub mod platform;
pub mod preferences;

pub use platform::Platform;
pub use preferences::{PreferenceSources, Preferences};
