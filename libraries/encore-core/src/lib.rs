//! Encore Core
//!
//! Platform-agnostic types, traits, and error handling shared by the Encore
//! playback crates.
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackId`
//! - **Core Traits**: `TrackCatalog` (the narrow write contract of the catalog service)
//! - **Error Handling**: Unified `EncoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use encore_core::{Track, TrackId};
//!
//! let track = Track::new("t-1", "Intro", "Some Artist", "https://cdn.example.com/t-1.mp3")
//!     .with_album("Debut")
//!     .with_duration(182.5);
//!
//! assert_eq!(track.id, TrackId::new("t-1"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{EncoreError, Result};
pub use traits::{NullCatalog, TrackCatalog};
pub use types::{Track, TrackId};
