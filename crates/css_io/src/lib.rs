//! Text and binary formats for circuits, error models and shot data.
//!
//! Everything here converts between the in-memory types of `css_core` and
//! the file formats used by Stim-compatible tooling. Errors are reported
//! with `anyhow` and carry the file or line that failed.

/// Shot data in the Stim `.b8` format.
///
/// Each shot is packed little-endian into whole bytes; the next shot starts
/// on a fresh byte boundary.
pub mod loader;

/// Parser and writer for detector error model (.dem) text.
///
/// Understands `error(p)`, `detector` and `logical_observable` lines with
/// `D`/`L` targets and `#` comments.
pub mod parser;

/// Stim-syntax circuit export.
pub mod stim;
