//! 事件系统模块 - 集合存储的响应式通知
//!
//! UI 层通过订阅广播通道感知集合变化，而不是直接读写 `items`：
//! - 页替换/追加/刷新事件
//! - 乐观 toggle 与回滚事件
//! - 创建/更新事件
//! - 拉取失败事件

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;
use tracing::debug;

/// 集合存储事件种类
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEventKind {
    /// 第 1 页拉取完成，集合被整体替换
    PageReplaced { count: usize },
    /// 后续页拉取完成，条目已追加
    PageAppended { count: usize },
    /// 下拉刷新完成，集合被整体替换
    Refreshed { count: usize },
    /// 拉取失败，集合保持原样
    FetchFailed { message: String },
    /// toggle 变更：settled=false 为乐观写入，settled=true 为服务端确认
    Toggled { settled: bool },
    /// toggle 失败，集合已回滚到变更前快照
    Reverted,
    /// 新建实体已插入集合头部
    Created,
    /// 实体已被整体替换
    Updated,
}

/// 集合存储事件
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub kind: StoreEventKind,
    /// 事件毫秒时间戳
    pub timestamp: u64,
}

impl StoreEvent {
    pub fn new(kind: StoreEventKind) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self { kind, timestamp }
    }
}

/// 事件广播器（每个存储实例一个）
///
/// 有界通道，落后的订阅者会丢事件（Lagged），UI 收到 Lagged 后
/// 应重新读取整份快照。
#[derive(Debug)]
pub struct StoreEventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl StoreEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// 广播一个事件；没有订阅者时发送失败是正常情况
    pub fn emit(&self, kind: StoreEventKind) {
        if self.sender.send(StoreEvent::new(kind)).is_err() {
            debug!("事件无订阅者，已丢弃");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
