//! SDK 入口 - 配置与存储注册表
//!
//! 每类资源一个集合存储实例。注册表由应用根持有并注入到各个界面，
//! 不做模块级全局单例，核心因此可以脱离进程全局状态测试。

use std::fmt::Display;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::entities::{Challenge, DietPlan, Notification, Order, Post, Reel, Workout};
use crate::error::{FitClubSDKError, Result};
use crate::rest::{HttpConfig, ResourceRoutes, RestAdapter};
use crate::store::{CollectionStore, Envelope};

/// SDK 配置
#[derive(Debug, Clone)]
pub struct FitClubConfig {
    /// 后端基础 URL，如 https://api.fitclub.app
    pub base_url: String,
    /// 每页条数
    pub page_limit: u32,
    /// 每个存储的事件通道容量
    pub event_capacity: usize,
    /// HTTP 客户端配置
    pub http: HttpConfig,
}

impl Default for FitClubConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            page_limit: 20,
            event_capacity: 64,
            http: HttpConfig::default(),
        }
    }
}

impl FitClubConfig {
    pub fn builder() -> FitClubConfigBuilder {
        FitClubConfigBuilder::new()
    }
}

/// 配置构建器
pub struct FitClubConfigBuilder {
    config: FitClubConfig,
}

impl FitClubConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: FitClubConfig::default(),
        }
    }

    pub fn base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn page_limit(mut self, limit: u32) -> Self {
        self.config.page_limit = limit;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn bearer_token<S: Into<String>>(mut self, token: S) -> Self {
        self.config.http.bearer_token = Some(token.into());
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http.connect_timeout_secs = Some(secs);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http.request_timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> FitClubConfig {
        self.config
    }
}

impl Default for FitClubConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 每类资源的存储类型别名
pub type RestStore<E> = CollectionStore<E, RestAdapter<E>>;

/// 存储注册表
///
/// 应用会话期内每类资源一个实例；是否把注册表本身当进程级单例
/// 由应用根决定。
pub struct FitClubStores {
    pub posts: RestStore<Post>,
    pub reels: RestStore<Reel>,
    pub diet_plans: RestStore<DietPlan>,
    pub challenges: RestStore<Challenge>,
    pub notifications: RestStore<Notification>,
    pub orders: RestStore<Order>,
    pub workouts: RestStore<Workout>,
}

impl FitClubStores {
    /// 按配置初始化全部存储
    pub fn initialize(config: FitClubConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(FitClubSDKError::Config("base_url 不能为空".to_string()));
        }

        let stores = Self {
            posts: make_store(&config, "posts", ResourceRoutes::crud("/api/posts", "like"))?,
            reels: make_store(&config, "reels", ResourceRoutes::crud("/api/reels", "like"))?,
            diet_plans: make_store(
                &config,
                "diet_plans",
                ResourceRoutes::crud("/api/diet-plans", "follow"),
            )?,
            challenges: make_store(
                &config,
                "challenges",
                ResourceRoutes::crud("/api/challenges", "join"),
            )?,
            notifications: make_store(
                &config,
                "notifications",
                ResourceRoutes::crud("/api/notifications", "read"),
            )?,
            orders: make_store(&config, "orders", ResourceRoutes::crud("/api/orders", "review"))?,
            workouts: make_store(
                &config,
                "workouts",
                ResourceRoutes::crud("/api/workouts", "complete"),
            )?,
        };

        info!(
            "✅ FitClub 存储注册表已初始化 (base_url: {}, page_limit: {})",
            config.base_url, config.page_limit
        );
        Ok(stores)
    }
}

fn make_store<E>(
    config: &FitClubConfig,
    name: &'static str,
    routes: ResourceRoutes,
) -> Result<RestStore<E>>
where
    E: Envelope + DeserializeOwned,
    E::Id: Display,
{
    let adapter = RestAdapter::new(&config.base_url, routes, &config.http)?;
    Ok(CollectionStore::new(
        name,
        adapter,
        config.page_limit,
        config.event_capacity,
    ))
}
