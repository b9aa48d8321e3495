//! Ginga Panel Library
//!
//! Headless front end for the Ginga interactive TV engine.

pub mod headless;

pub use headless::runner::{drive_panel, run_headless, Command, StartAction};
