//! Utility functions for turning a capture into an uploadable archive.
//!
//! ## Components
//!
//! - **Compression**: single-file `.tar.gz` creation through the system `tar`
//! - **Hashing**: SHA-256 digests logged for every shipped archive
//! - **Sniffing**: content type detection from leading bytes
//!
//! ### Creating an Archive
//!
//! ```no_run
//! use yarder::utils::compress::Archiver;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), yarder::error::YarderError> {
//! let archive = Archiver::default().archive(Path::new("/tmp/capture.log"))?;
//! println!("Created archive: {}", archive.display());
//! # Ok(())
//! # }
//! ```

/// Single-file tar.gz archive creation
pub mod compress;

/// Cryptographic hash calculation utilities
pub mod hash;

/// Content type sniffing
pub mod sniff;
