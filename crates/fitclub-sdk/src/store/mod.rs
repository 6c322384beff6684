//! 集合存储核心 - 分页累积 + 乐观变更 + 回滚
//!
//! 模块组成：
//! - `envelope`：实体信封 trait（标识 + 关系位 + 计数器）
//! - `cursor`：分页游标（replace-vs-append 与请求资格判断）
//! - `collection`：通用集合存储（七类资源共用一份实现）
//! - `merge`：toggle 往返后的和解合并规则

pub mod collection;
pub mod cursor;
pub mod envelope;
pub mod merge;

pub use collection::{CollectionStats, CollectionStore};
pub use cursor::PageCursor;
pub use envelope::Envelope;
pub use merge::reconcile;
