//! Image pool providers
//!
//! - `DirectoryImagePool`: scans the similar and different folders on disk
//! - `StaticImagePool`: fixed lists supplied up front

pub mod directory;
pub mod static_pool;

pub use directory::DirectoryImagePool;
pub use static_pool::StaticImagePool;
