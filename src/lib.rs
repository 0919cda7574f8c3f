//! Stash: storage bins and a wish list as plain-text files
//!
//! Keeps storage bins (labelled with QR codes of their ids) and a wish list
//! as YAML files in a project directory, with CSV import for the wish list
//! and optional mirroring to a remote directory.

pub mod cli;
pub mod core;
pub mod entities;
