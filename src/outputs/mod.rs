//! Report output.
//!
//! # Submodules
//!
//! - [`json`]: Serializes a [`Report`](crate::models::Report) and writes it
//!   to a timestamped file, or renders it for stdout
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! ├── sentiment_20251017_093000.json
//! └── sentiment_20251017_101500.json
//! ```

pub mod json;
