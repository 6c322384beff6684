//! 实体定义 - 七类远端资源的线上形状
//!
//! 每个实体实现 `Envelope`，把各自的关系位/计数器字段
//! （is_liked/likes_count、is_followed/followers_count 等）映射到统一
//! 访问器；其余业务字段对核心不透明。关系字段一律 `Option` +
//! `#[serde(default)]`，以兼容只回部分字段的 patch 响应。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Envelope;

/// 动态（社区帖子）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    #[serde(default)]
    pub author_id: u64,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub comments_count: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_liked: Option<bool>,
    #[serde(default)]
    pub likes_count: Option<u64>,
}

impl Envelope for Post {
    type Id = u64;

    fn entity_id(&self) -> u64 {
        self.id
    }

    fn viewer_relation(&self) -> Option<bool> {
        self.is_liked
    }

    fn set_viewer_relation(&mut self, on: bool) {
        self.is_liked = Some(on);
    }

    fn relation_counter(&self) -> Option<u64> {
        self.likes_count
    }

    fn set_relation_counter(&mut self, count: u64) {
        self.likes_count = Some(count);
    }
}

/// 短视频
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reel {
    pub id: u64,
    #[serde(default)]
    pub author_id: u64,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<u32>,
    #[serde(default)]
    pub views_count: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_liked: Option<bool>,
    #[serde(default)]
    pub likes_count: Option<u64>,
}

impl Envelope for Reel {
    type Id = u64;

    fn entity_id(&self) -> u64 {
        self.id
    }

    fn viewer_relation(&self) -> Option<bool> {
        self.is_liked
    }

    fn set_viewer_relation(&mut self, on: bool) {
        self.is_liked = Some(on);
    }

    fn relation_counter(&self) -> Option<u64> {
        self.likes_count
    }

    fn set_relation_counter(&mut self, count: u64) {
        self.likes_count = Some(count);
    }
}

/// 饮食计划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietPlan {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub calories_per_day: Option<u32>,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_followed: Option<bool>,
    #[serde(default)]
    pub followers_count: Option<u64>,
}

impl Envelope for DietPlan {
    type Id = u64;

    fn entity_id(&self) -> u64 {
        self.id
    }

    fn viewer_relation(&self) -> Option<bool> {
        self.is_followed
    }

    fn set_viewer_relation(&mut self, on: bool) {
        self.is_followed = Some(on);
    }

    fn relation_counter(&self) -> Option<u64> {
        self.followers_count
    }

    fn set_relation_counter(&mut self, count: u64) {
        self.followers_count = Some(count);
    }
}

/// 挑战活动
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_joined: Option<bool>,
    #[serde(default)]
    pub participants_count: Option<u64>,
}

impl Envelope for Challenge {
    type Id = u64;

    fn entity_id(&self) -> u64 {
        self.id
    }

    fn viewer_relation(&self) -> Option<bool> {
        self.is_joined
    }

    fn set_viewer_relation(&mut self, on: bool) {
        self.is_joined = Some(on);
    }

    fn relation_counter(&self) -> Option<u64> {
        self.participants_count
    }

    fn set_relation_counter(&mut self, count: u64) {
        self.participants_count = Some(count);
    }
}

/// 通知
///
/// 关系位是"已读"；通知没有关系计数器，访问器固定返回 0，
/// setter 为 no-op。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_read: Option<bool>,
}

impl Envelope for Notification {
    type Id = u64;

    fn entity_id(&self) -> u64 {
        self.id
    }

    fn viewer_relation(&self) -> Option<bool> {
        self.is_read
    }

    fn set_viewer_relation(&mut self, on: bool) {
        self.is_read = Some(on);
    }

    fn relation_counter(&self) -> Option<u64> {
        Some(0)
    }

    fn set_relation_counter(&mut self, _count: u64) {}
}

/// 商城订单
///
/// 关系位是"已评价"；订单同样没有计数器。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub item_names: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_reviewed: Option<bool>,
}

impl Envelope for Order {
    type Id = u64;

    fn entity_id(&self) -> u64 {
        self.id
    }

    fn viewer_relation(&self) -> Option<bool> {
        self.is_reviewed
    }

    fn set_viewer_relation(&mut self, on: bool) {
        self.is_reviewed = Some(on);
    }

    fn relation_counter(&self) -> Option<u64> {
        Some(0)
    }

    fn set_relation_counter(&mut self, _count: u64) {}
}

/// 训练课程
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub muscle_group: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub duration_mins: Option<u32>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub completions_count: Option<u64>,
}

impl Envelope for Workout {
    type Id = u64;

    fn entity_id(&self) -> u64 {
        self.id
    }

    fn viewer_relation(&self) -> Option<bool> {
        self.is_completed
    }

    fn set_viewer_relation(&mut self, on: bool) {
        self.is_completed = Some(on);
    }

    fn relation_counter(&self) -> Option<u64> {
        self.completions_count
    }

    fn set_relation_counter(&mut self, count: u64) {
        self.completions_count = Some(count);
    }
}
