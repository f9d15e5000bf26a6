//! Variant generation pipeline.
//!
//! - **planner**: classification-driven target boxes
//! - **validate**: structural checks before any work starts
//! - **source**: the verified source shared by an image's workers
//! - **codec**: decode/transform/encode capability
//! - **hash**: content digests of written files
//! - **worker**: one variant per target box
//! - **orchestrator**: per-image fan-out and aggregation
//! - **batch**: request-level merging of per-image reports

pub mod batch;
pub mod codec;
pub mod hash;
pub mod orchestrator;
pub mod planner;
pub mod source;
pub mod validate;
pub mod worker;

// Re-exports for convenient access
pub use batch::{UploadAggregator, UploadFailure, UploadResponse, UploadStatus};
pub use codec::{CodecError, ImageCodec, ImageInfo, RasterCodec};
pub use hash::Hasher;
pub use orchestrator::{Orchestrator, SharedManifest, Stage, TransientFile};
pub use planner::SizePlanner;
pub use source::{SourceImage, SourceKind};
pub use validate::Validator;
pub use worker::VariantWorker;
