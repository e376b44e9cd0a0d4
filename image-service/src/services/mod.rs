//! Business logic: image processing, the two resize pipelines, and restore.

pub mod processor;
pub mod resize;
pub mod restore;
pub mod thumbnail;

pub use processor::{ImageProcessor, ProcessedImage, ProcessorConfig};
pub use resize::{ResizeService, ResizeServiceConfig};
pub use restore::{HttpRestoreInvoker, RestoreInvoker, RestoreService};
pub use thumbnail::{ThumbnailService, ThumbnailServiceConfig};
