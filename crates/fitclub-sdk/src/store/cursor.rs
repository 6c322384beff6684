//! 分页游标 - 单个集合的 page/limit/total/pages 簿记
//!
//! 服务端是 total/pages 的唯一事实来源，客户端从不自行计算；
//! `advance` 只做整体替换。畸形分页（如 pages < page）原样接受，
//! 只影响后续页是否还会被请求。

use serde::{Deserialize, Serialize};

/// 分页游标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// 当前页号（从 1 开始）
    pub page: u32,
    /// 每页条数
    pub limit: u32,
    /// 总条数
    pub total: u64,
    /// 总页数（0 表示未知）
    pub pages: u32,
}

impl PageCursor {
    /// 首次拉取前的初始游标（尚未有服务端分页信息）
    pub fn initial(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            total: 0,
            pages: 0,
        }
    }

    /// 是否还有下一页可拉
    pub fn has_next(&self) -> bool {
        self.pages == 0 || self.page < self.pages
    }

    /// 调用方侧守卫：请求第 `page` 页是否被允许
    ///
    /// 第 1 页（或刷新）永远允许；pages 已知时超出尾部的请求被拒绝，
    /// 既不翻动加载标志也不发请求。
    pub fn allows(&self, page: u32) -> bool {
        if page <= 1 {
            return true;
        }
        self.pages == 0 || page <= self.pages
    }

    /// 用服务端返回的游标整体替换本地游标
    pub fn advance(&mut self, server: PageCursor) {
        *self = server;
    }

    /// 下一页页号
    pub fn next_page(&self) -> u32 {
        self.page + 1
    }
}
