//! 资源适配器契约 - 集合存储与传输层的边界
//!
//! 核心对传输方式不感知：HTTP、mock、内存实现都只需满足本契约。
//! 认证/重试拦截器属于传输层自身的职责，不出现在这里。

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::store::{Envelope, PageCursor};

/// 一页列表响应
#[derive(Debug, Clone, Deserialize)]
pub struct ListPage<E> {
    pub items: Vec<E>,
    pub pagination: PageCursor,
}

/// 资源适配器契约（每种资源类型一个实现）
///
/// 失败统一映射到 `Network` / `Server { status, message }`。
/// `toggle` 允许返回部分 patch 实体（关系位/计数器可缺失），
/// 由和解合并负责回填。
#[async_trait]
pub trait ResourceAdapter<E: Envelope>: Send + Sync + 'static {
    /// 拉取一页列表
    async fn list(&self, page: u32, limit: u32) -> Result<ListPage<E>>;

    /// 切换观察者关系（点赞/关注/加入/已读）
    async fn toggle(&self, id: &E::Id) -> Result<E>;

    /// 创建资源
    async fn create(&self, payload: serde_json::Value) -> Result<E>;

    /// 更新资源
    async fn update(&self, id: &E::Id, payload: serde_json::Value) -> Result<E>;
}

#[async_trait]
impl<E, A> ResourceAdapter<E> for Arc<A>
where
    E: Envelope,
    A: ResourceAdapter<E> + ?Sized,
{
    async fn list(&self, page: u32, limit: u32) -> Result<ListPage<E>> {
        (**self).list(page, limit).await
    }

    async fn toggle(&self, id: &E::Id) -> Result<E> {
        (**self).toggle(id).await
    }

    async fn create(&self, payload: serde_json::Value) -> Result<E> {
        (**self).create(payload).await
    }

    async fn update(&self, id: &E::Id, payload: serde_json::Value) -> Result<E> {
        (**self).update(id, payload).await
    }
}
