//! REST 适配器 - 资源适配器契约的 reqwest 实现
//!
//! 使用 reqwest 作为底层 HTTP 客户端（纯 Rust rustls）。后端所有接口
//! 统一包在 `{success, data, message}` 信封里。认证/重试拦截器不在
//! 这一层：这里只支持一个可选的 bearer token。

use std::fmt::Display;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::adapter::{ListPage, ResourceAdapter};
use crate::error::{FitClubSDKError, Result};
use crate::store::Envelope;

/// 后端统一响应信封
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// HTTP 客户端配置
#[derive(Debug, Clone, Default)]
pub struct HttpConfig {
    /// 连接超时（秒）
    pub connect_timeout_secs: Option<u64>,
    /// 请求超时（秒）
    pub request_timeout_secs: Option<u64>,
    /// 可选的 bearer token
    pub bearer_token: Option<String>,
}

/// 资源路由配置（相对 base_url 的路径）
#[derive(Debug, Clone)]
pub struct ResourceRoutes {
    /// 列表接口，如 "/api/posts"
    pub list: String,
    /// 切换接口模板，"{id}" 会被替换，如 "/api/posts/{id}/like"
    pub toggle: String,
    /// 创建接口
    pub create: String,
    /// 更新接口模板，"{id}" 会被替换
    pub update: String,
}

impl ResourceRoutes {
    /// 标准 CRUD + toggle 动作的路由
    ///
    /// `collection` 形如 "/api/posts"，`toggle_action` 形如 "like"。
    pub fn crud(collection: &str, toggle_action: &str) -> Self {
        Self {
            list: collection.to_string(),
            toggle: format!("{}/{{id}}/{}", collection, toggle_action),
            create: collection.to_string(),
            update: format!("{}/{{id}}", collection),
        }
    }
}

/// REST 适配器（每种资源类型实例化一个）
pub struct RestAdapter<E> {
    client: Client,
    base_url: String,
    routes: ResourceRoutes,
    bearer_token: Option<String>,
    _marker: PhantomData<fn() -> E>,
}

impl<E> RestAdapter<E> {
    pub fn new(
        base_url: impl Into<String>,
        routes: ResourceRoutes,
        http: &HttpConfig,
    ) -> Result<Self> {
        let mut builder = Client::builder();

        if let Some(timeout) = http.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(timeout));
        }
        if let Some(timeout) = http.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let client = builder
            .build()
            .map_err(|e| FitClubSDKError::Config(format!("创建 HTTP 客户端失败: {}", e)))?;

        let base_url = base_url.into();
        info!("✅ REST 适配器已创建 (base_url: {}, list: {})", base_url, routes.list);

        Ok(Self {
            client,
            base_url,
            routes,
            bearer_token: http.bearer_token.clone(),
            _marker: PhantomData,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 发送请求并解包统一响应信封
    async fn request_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T> {
        let builder = match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FitClubSDKError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| FitClubSDKError::Json(e.to_string()))?;
        match body.data {
            Some(data) => Ok(data),
            None => Err(FitClubSDKError::Server {
                status: status.as_u16(),
                message: body
                    .message
                    .unwrap_or_else(|| "服务端未返回数据".to_string()),
            }),
        }
    }
}

#[async_trait]
impl<E> ResourceAdapter<E> for RestAdapter<E>
where
    E: Envelope + DeserializeOwned,
    E::Id: Display,
{
    async fn list(&self, page: u32, limit: u32) -> Result<ListPage<E>> {
        let url = self.url(&self.routes.list);
        let builder = self
            .client
            .get(&url)
            .query(&[("page", page), ("limit", limit)]);
        let result: ListPage<E> = self.request_json(builder).await?;
        debug!("GET {} page={} 返回 {} 条", url, page, result.items.len());
        Ok(result)
    }

    async fn toggle(&self, id: &E::Id) -> Result<E> {
        let path = self.routes.toggle.replace("{id}", &id.to_string());
        let url = self.url(&path);
        debug!("POST {}", url);
        self.request_json(self.client.post(&url)).await
    }

    async fn create(&self, payload: serde_json::Value) -> Result<E> {
        let url = self.url(&self.routes.create);
        debug!("POST {}", url);
        self.request_json(self.client.post(&url).json(&payload)).await
    }

    async fn update(&self, id: &E::Id, payload: serde_json::Value) -> Result<E> {
        let path = self.routes.update.replace("{id}", &id.to_string());
        let url = self.url(&path);
        debug!("PUT {}", url);
        self.request_json(self.client.put(&url).json(&payload)).await
    }
}
