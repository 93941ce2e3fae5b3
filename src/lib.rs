//! Static HTML viewer for mined AST pattern matches.
//!
//! Each match names a set of nodes in the annotated syntax tree of a source
//! file. [`backend::locate`] maps those nodes to line and column markers,
//! [`codegen::markup`] re-renders the source around them, and [`pipeline`]
//! writes one page per match, one per pattern and a root listing.
pub mod backend;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod error;
pub mod frontend;
pub mod pipeline;

pub use error::{Error, Result};
pub use pipeline::{Report, Viewer};
