// 缩放结果缓存
//
// 调度器只通过 contains / add 两个方法读写缓存，容量与淘汰策略由实现负责。
// 默认实现基于 moka，使用 LRU 淘汰策略，容量按条目数计算，进程内有效。

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use moka::policy::EvictionPolicy;

/// 缩放结果缓存接口
///
/// 实现需要自行保证并发安全：多个批量请求会同时调用这些方法。
#[async_trait]
pub trait ImageCache: Send + Sync {
    /// 是否存在该键（命中时刷新其最近使用时间）
    async fn contains(&self, key: &str) -> bool;

    /// 写入缓存，失败不对调用方可见
    async fn add(&self, key: &str, data: Bytes);

    /// 读取缓存内容
    async fn get(&self, key: &str) -> Option<Bytes>;

    /// 当前条目数
    fn entry_count(&self) -> u64;
}

/// 内存 LRU 缓存
#[derive(Clone)]
pub struct MemoryImageCache {
    cache: Cache<String, Bytes>,
    capacity: u64,
}

impl MemoryImageCache {
    /// 创建指定容量（条目数）的缓存
    pub fn new(capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self { cache, capacity }
    }

    /// 容量（条目数）
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// 执行挂起的维护任务（淘汰等），主要用于测试
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl ImageCache for MemoryImageCache {
    async fn contains(&self, key: &str) -> bool {
        // 用 get 而不是 contains_key，命中时会刷新 LRU 顺序
        self.cache.get(key).await.is_some()
    }

    async fn add(&self, key: &str, data: Bytes) {
        self.cache.insert(key.to_string(), data).await;
    }

    async fn get(&self, key: &str) -> Option<Bytes> {
        self.cache.get(key).await
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}
