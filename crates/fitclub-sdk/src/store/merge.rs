//! 和解合并 - toggle 往返后本地乐观实体与服务端响应的合并规则
//!
//! 部分接口只返回不完整的 patch（例如只有计数没有关系位）。规则：
//! 关系位和计数器各自独立地"服务端有值则服务端赢，否则保留本地乐观值"；
//! 其余非关系字段不参与乐观预测，服务端实体整体胜出。

use super::envelope::Envelope;

/// 合并服务端响应实体与本地（乐观）实体
///
/// 以服务端实体为基底（非关系字段全量覆盖），对 `viewer_relation` 与
/// `relation_counter` 逐个回填缺失值，防止部分响应把正确的乐观计数
/// 踩回陈旧值。
pub fn reconcile<E: Envelope>(local: &E, server: E) -> E {
    let mut merged = server;
    if merged.viewer_relation().is_none() {
        merged.set_viewer_relation(local.relation_or_default());
    }
    if merged.relation_counter().is_none() {
        merged.set_relation_counter(local.counter_or_default());
    }
    merged
}
