// 同键请求合并
//
// 多个批次同时未命中同一个缓存键时，只有第一个调用者（leader）执行抓取和缩放，
// 其余调用者订阅 leader 的广播通道并得到同一个结果。
//
// leader 的 FlightGuard 被 drop 时（无论是否完成）都会移除在途记录，
// 等待者会看到通道关闭并报告失败，不会永久挂起。

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

/// 同一个键的所有等待者共享的结果
pub type FlightOutcome = Result<Bytes, String>;

/// 登记某个键后的角色
pub enum Flight {
    /// 调用者是 leader，需要完成工作后调用 [`FlightGuard::complete`]
    Leader(FlightGuard),
    /// 已有其他调用者在处理
    Follower(broadcast::Receiver<FlightOutcome>),
}

type FlightTable = Arc<Mutex<HashMap<String, (u64, broadcast::Sender<FlightOutcome>)>>>;

/// 按缓存键记录在途计算
#[derive(Default)]
pub struct SingleFlight {
    in_flight: FlightTable,
    next_id: AtomicU64,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记对 `key` 的请求
    pub fn register(&self, key: &str) -> Flight {
        let mut in_flight = match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some((_, tx)) = in_flight.get(key) {
            debug!(key, "合并请求，等待在途缩放");
            return Flight::Follower(tx.subscribe());
        }

        // 每个通道只发送一次
        let (tx, _rx) = broadcast::channel(1);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        in_flight.insert(key.to_string(), (id, tx.clone()));
        debug!(key, in_flight = in_flight.len(), "新的缩放任务");

        Flight::Leader(FlightGuard {
            key: key.to_string(),
            id,
            sender: tx,
            table: Arc::clone(&self.in_flight),
        })
    }

    /// 当前在途的键数量
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().map(|m| m.len()).unwrap_or(0)
    }
}

/// leader 持有的守卫
pub struct FlightGuard {
    key: String,
    id: u64,
    sender: broadcast::Sender<FlightOutcome>,
    table: FlightTable,
}

impl FlightGuard {
    /// 向所有等待者广播结果并结束本次任务
    pub fn complete(self, outcome: FlightOutcome) {
        self.remove_entry();
        let waiters = self.sender.receiver_count();
        // 等待者可能已全部离开
        let _ = self.sender.send(outcome);
        if waiters > 0 {
            debug!(key = %self.key, waiters, "已向等待者广播缩放结果");
        }
    }

    fn remove_entry(&self) {
        let mut table = match self.table.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // 只移除自己的记录，可能已被更新的任务替换
        if table.get(&self.key).is_some_and(|(id, _)| *id == self.id) {
            table.remove(&self.key);
        }
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.remove_entry();
    }
}

/// 等待 leader 的结果
pub async fn wait_for_leader(mut rx: broadcast::Receiver<FlightOutcome>) -> FlightOutcome {
    match rx.recv().await {
        Ok(outcome) => outcome,
        Err(e) => Err(format!("在途缩放被放弃: {}", e)),
    }
}
