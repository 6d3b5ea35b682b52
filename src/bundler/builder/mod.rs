//! Package orchestration.
//!
//! This module provides the main [`Bundler`] orchestrator that assembles the
//! package directory and hands dependency bundling and binary patching over
//! to the platform packager.
//!
//! # Overview
//!
//! The bundler:
//! 1. Reads configuration from [`Settings`](crate::bundler::Settings)
//! 2. Copies resources, scripts, binaries, shaders and plugins
//! 3. Delegates to the platform packager
//! 4. Zips the package and calculates its checksum
//! 5. Returns a [`PackageArtifact`]
//!
//! # Module Organization
//!
//! - [`archive`] - zip archive creation
//! - [`checksum`] - SHA256 checksum calculation for the archive
//! - [`orchestrator`] - main [`Bundler`] struct and packaging steps
//! - [`tool_detection`] - external tool availability checking

mod archive;
mod checksum;
mod orchestrator;
mod tool_detection;

pub use archive::create_zip;
pub use checksum::calculate_sha256;
pub use orchestrator::{Bundler, PackageArtifact};
pub use tool_detection::locate_tool;
