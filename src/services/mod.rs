pub mod resize;

pub use resize::{CacheKey, ImageCache, MemoryImageCache, ResizeDispatcher};
