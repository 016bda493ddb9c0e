//! # sam3d-core — SAM3D checkpoint discovery and verification
//!
//! Given a directory, determine which supported checkpoint layout it holds, which
//! required files are present or missing, and how large the tree is:
//!
//! - **Structured**: `hf/pipeline.yaml`, optional `hf/config.json`, and a weight
//!   file in `hf/` (`.safetensors`, then `.bin`, then `.pth`).
//! - **Flat**: one or more `*.pth` files directly in the root.
//!
//! ```no_run
//! use sam3d_core::{CheckpointRoot, discover, format_report};
//!
//! let result = discover(&CheckpointRoot::new("checkpoints"))?;
//! print!("{}", format_report(&result));
//! if !result.pass() {
//!     std::process::exit(1);
//! }
//! # Ok::<(), sam3d_core::ResolveError>(())
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod layout;
pub mod loader;
pub mod report;

// Re-exports
pub use config::{ConfigOverrides, VerifyConfig, load_config};
pub use discovery::{
    CheckpointRoot, DiscoveryOptions, DiscoveryResult, FileEntry, TreeSummary, Verdict, discover,
    discover_with, summarize_tree,
};
pub use error::{LoadError, ResolveError};
pub use layout::{LayoutFormat, WeightKind};
pub use loader::{CheckpointLoader, LoadRequest, load};
pub use report::{format_report, format_summary};
