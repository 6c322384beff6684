//! 实体信封 - 集合存储操作的统一实体形状
//!
//! 每个远端资源（动态、短视频、饮食计划等）在核心层被归一化为：
//! 稳定标识 + 观察者关系布尔位 + 关系计数器，其余业务字段对核心不透明。

use std::fmt::Debug;
use std::hash::Hash;

/// 实体信封 trait
///
/// 关系位与计数器都用 `Option` 表达"服务端未返回"：
/// - `viewer_relation() == None` 表示未知，toggle 时按 `false` 处理
/// - `relation_counter() == None` 出现在部分更新（partial patch）响应中，
///   和解合并时保留本地乐观值
///
/// 计数器用 `u64`，非负性由类型保证；递减一律饱和到 0。
pub trait Envelope: Clone + Send + Sync + 'static {
    /// 稳定标识类型，跨多次拉取不变
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    fn entity_id(&self) -> Self::Id;

    /// 观察者关系位（已点赞/已关注/已加入/已读）
    fn viewer_relation(&self) -> Option<bool>;

    fn set_viewer_relation(&mut self, on: bool);

    /// 关系计数器（点赞数/关注数/参与数），绝对值由服务端拥有，客户端仅作参考
    fn relation_counter(&self) -> Option<u64>;

    fn set_relation_counter(&mut self, count: u64);

    /// 关系位的有效值（未知视为 false）
    fn relation_or_default(&self) -> bool {
        self.viewer_relation().unwrap_or(false)
    }

    /// 计数器的有效值（缺失视为 0）
    fn counter_or_default(&self) -> u64 {
        self.relation_counter().unwrap_or(0)
    }
}
