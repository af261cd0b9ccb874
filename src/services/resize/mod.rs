// 缩放模块 - 远程图片缩放与缓存
//
// 本模块提供远程图片的缩放流水线，包括：
// - 缓存键生成
// - 源图片抓取（带大小上限）
// - JPEG 解码、缩放、编码
// - 进程内 LRU 缓存
// - 同键请求合并
// - 三种执行策略的调度

pub mod cache;
pub mod dispatcher;
pub mod error;
pub mod fetcher;
pub mod key;
pub mod singleflight;
pub mod transform;

pub use cache::{ImageCache, MemoryImageCache};
pub use dispatcher::{DispatcherSettings, ResizeDispatcher};
pub use error::{FetchError, ResizeError, TransformError};
pub use fetcher::{Fetcher, HttpFetcher, DEFAULT_FETCH_LIMIT};
pub use key::{CacheKey, KeyScheme};
pub use singleflight::SingleFlight;
pub use transform::{
    ImageTransformer, JpegTransformer, TransformTask, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_OUTPUT_PIXELS,
};
