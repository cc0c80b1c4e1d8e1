//! Resgen - Library for generating embedded-asset C++ sources
//!
//! This library provides functionality to:
//! - Read a flat directory of resource files
//! - Compress each file and encode it as a C++ array literal
//! - Generate the cross-referencing accessor, mapping, and build files

pub mod cli;
pub mod compress;
pub mod cpp;
pub mod gen;
pub mod vfs;
