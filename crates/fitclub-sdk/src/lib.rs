//! FitClub SDK - 健身社交平台移动端数据核心
//!
//! 本 SDK 提供贯穿各功能区（动态、短视频、饮食计划、挑战、通知、
//! 订单、训练）的分页集合同步引擎，包括：
//! - 📄 分页累积：服务端分页列表汇入单一有序内存集合
//! - ⚡ 乐观变更：点赞/关注/加入/已读在网络往返前即时生效
//! - 🔄 和解合并：服务端响应与本地乐观状态按字段和解
//! - ↩️ 失败回滚：网络失败时整体恢复变更前快照
//! - 📡 事件系统：集合变化的广播订阅机制
//! - 🧵 并发安全：不可变快照 + 单次赋值替换，读者永不见半更新
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use fitclub_sdk::{FitClubConfig, FitClubStores};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 配置 SDK
//!     let config = FitClubConfig::builder()
//!         .base_url("https://api.fitclub.app")
//!         .bearer_token("user-token")
//!         .page_limit(20)
//!         .build();
//!
//!     // 应用根持有注册表，注入到各界面
//!     let stores = FitClubStores::initialize(config)?;
//!
//!     // 首屏加载 + 无限滚动
//!     stores.posts.fetch_page(1).await?;
//!     let next = stores.posts.cursor().next_page();
//!     stores.posts.fetch_page(next).await?;
//!
//!     // 乐观点赞：UI 立即看到新状态，失败自动回滚
//!     stores.posts.toggle(&42).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod entities;
pub mod error;
pub mod events;
pub mod rest;
pub mod sdk;
pub mod store;

pub use adapter::{ListPage, ResourceAdapter};
pub use entities::{Challenge, DietPlan, Notification, Order, Post, Reel, Workout};
pub use error::{FitClubSDKError, Result};
pub use events::{StoreEvent, StoreEventBus, StoreEventKind};
pub use rest::{ApiResponse, HttpConfig, ResourceRoutes, RestAdapter};
pub use sdk::{FitClubConfig, FitClubConfigBuilder, FitClubStores, RestStore};
pub use store::{CollectionStats, CollectionStore, Envelope, PageCursor};
pub use store::reconcile;
