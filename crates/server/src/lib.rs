//! Companion server for the slide reuse taskpane.
//!
//! Renders uploaded presentations into slide preview images and serves the
//! add-in configuration.

pub mod convert;
pub mod routes;
pub mod settings;

pub use convert::{CommandRenderer, ConvertError, SlideRenderer};
pub use routes::{router, AppState};
pub use settings::Settings;
