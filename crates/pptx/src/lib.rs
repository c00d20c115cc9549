//! PPTX (Office Open XML) slide-order reader for slide reuse.
//!
//! Reads the slide id list that the host's insert call addresses slides by,
//! and encodes packages into the base64 form the host accepts.

pub mod package;
pub mod parser;

pub use package::{decode_package, encode_package};
pub use parser::SlideIdReader;
