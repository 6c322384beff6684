//! 通用集合存储 - 分页累积 + 乐观 toggle + 失败回滚
//!
//! 同一套"分页累积 + 乐观切换"逻辑贯穿七类资源（动态/短视频/饮食计划/
//! 挑战/通知/订单/训练），这里只实现一份泛型版本，按资源类型实例化，
//! 避免各处的回滚完整性出现漂移。
//!
//! ## 快照语义
//!
//! `items` 是 `Arc<Vec<E>>` 不可变快照，所有写入都构造新快照后单次赋值
//! 替换，读者看到的要么是旧快照要么是新快照，从不半更新。
//!
//! ## NOTE: Store 不做重试
//!
//! 拉取失败只记录 error 并保留旧数据，重试是用户重新调用
//! `fetch_page` / `refresh` 的事情。取消也不存在：在途请求不会被新请求
//! 打断，过期响应由拉取序号守卫丢弃。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::cursor::PageCursor;
use super::envelope::Envelope;
use super::merge::reconcile;
use crate::adapter::{ListPage, ResourceAdapter};
use crate::error::{FitClubSDKError, Result};
use crate::events::{StoreEvent, StoreEventBus, StoreEventKind};

/// 一次未结算的乐观 toggle
///
/// 在网络调用结算前挂在 pending 表里；表中存在即"Pending"，
/// 不存在即"Confirmed"。失败回滚恢复的是完整的变更前快照，
/// 而不是单独把计数减回去。
#[derive(Debug, Clone)]
struct PendingToggle<E> {
    /// 乐观写入后的关系值
    optimistic: bool,
    /// 变更前的完整集合快照
    pre_snapshot: Arc<Vec<E>>,
}

/// 拉取种类：首屏/翻页走 is_loading，下拉刷新走 is_refreshing，
/// 让 UI 能区分"重新灌入"与"初次加载"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Load,
    Refresh,
}

struct StoreState<E> {
    /// 有序快照，插入顺序即服务端顺序
    items: Arc<Vec<E>>,
    cursor: PageCursor,
    is_loading: bool,
    is_refreshing: bool,
    error: Option<String>,
    /// 已签发的拉取序号（单调递增）
    issued_seq: u64,
    /// 最近一次已应用（含已记录失败）的拉取序号
    applied_seq: u64,
    /// Load 种类最近签发的序号
    issued_load_seq: u64,
    /// Refresh 种类最近签发的序号
    issued_refresh_seq: u64,
}

impl<E> StoreState<E> {
    fn latest_issued(&self, kind: FetchKind) -> u64 {
        match kind {
            FetchKind::Load => self.issued_load_seq,
            FetchKind::Refresh => self.issued_refresh_seq,
        }
    }

    /// 复位 `seq` 这次请求占用的加载标志
    ///
    /// 仅当 `seq` 是该种类最近签发的请求时才复位；否则标志归属
    /// 同种类更新的在途请求，不能动。
    fn clear_flag_if_latest(&mut self, kind: FetchKind, seq: u64) {
        if seq == self.latest_issued(kind) {
            match kind {
                FetchKind::Load => self.is_loading = false,
                FetchKind::Refresh => self.is_refreshing = false,
            }
        }
    }
}

struct StoreInner<E: Envelope, A> {
    /// 资源名，仅用于日志
    name: &'static str,
    adapter: A,
    state: RwLock<StoreState<E>>,
    /// 按 id 挂起的乐观 toggle；同一 id 的第二次 toggle 在结算前被拒绝
    pending: Mutex<HashMap<E::Id, PendingToggle<E>>>,
    events: StoreEventBus,
}

/// 集合存储快照统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStats {
    pub len: usize,
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    pub pending_toggles: usize,
    pub is_loading: bool,
    pub is_refreshing: bool,
}

/// 通用集合存储
///
/// Clone 只是克隆 `Arc` 把手，同一实例可被任意多个 UI 组件共享读取；
/// 写入只能通过本类型的操作进行。
pub struct CollectionStore<E: Envelope, A: ResourceAdapter<E>> {
    inner: Arc<StoreInner<E, A>>,
}

impl<E: Envelope, A: ResourceAdapter<E>> Clone for CollectionStore<E, A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Envelope, A: ResourceAdapter<E>> CollectionStore<E, A> {
    pub fn new(name: &'static str, adapter: A, page_limit: u32, event_capacity: usize) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                name,
                adapter,
                state: RwLock::new(StoreState {
                    items: Arc::new(Vec::new()),
                    cursor: PageCursor::initial(page_limit.max(1)),
                    is_loading: false,
                    is_refreshing: false,
                    error: None,
                    issued_seq: 0,
                    applied_seq: 0,
                    issued_load_seq: 0,
                    issued_refresh_seq: 0,
                }),
                pending: Mutex::new(HashMap::new()),
                events: StoreEventBus::new(event_capacity),
            }),
        }
    }

    // ---- 读取面 ----

    /// 当前集合快照（廉价克隆 Arc）
    pub fn snapshot(&self) -> Arc<Vec<E>> {
        self.inner.state.read().items.clone()
    }

    pub fn cursor(&self) -> PageCursor {
        self.inner.state.read().cursor
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.read().is_loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.state.read().is_refreshing
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.read().error.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按 id 查找实体（克隆返回）
    pub fn get(&self, id: &E::Id) -> Option<E> {
        self.inner
            .state
            .read()
            .items
            .iter()
            .find(|e| e.entity_id() == *id)
            .cloned()
    }

    pub fn stats(&self) -> CollectionStats {
        // 锁序与 toggle 一致：先 pending 后 state
        let pending_toggles = self.inner.pending.lock().len();
        let state = self.inner.state.read();
        CollectionStats {
            len: state.items.len(),
            page: state.cursor.page,
            pages: state.cursor.pages,
            total: state.cursor.total,
            pending_toggles,
            is_loading: state.is_loading,
            is_refreshing: state.is_refreshing,
        }
    }

    /// 订阅集合变化事件
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    // ---- 拉取 ----

    /// 拉取第 `page` 页
    ///
    /// 第 1 页整体替换集合，后续页追加（不跨页去重，假定服务端不重发
    /// 早先的页）。页号 0 钳制为 1。失败时记录 error、保留旧数据。
    /// pages 已知且请求超出尾部时是纯 no-op：不翻动 is_loading，
    /// 也不发请求。
    pub async fn fetch_page(&self, page: u32) -> Result<usize> {
        self.fetch(page, FetchKind::Load).await
    }

    /// 下拉刷新：等价于 `fetch_page(1)`，但走 is_refreshing 标志
    pub async fn refresh(&self) -> Result<usize> {
        self.fetch(1, FetchKind::Refresh).await
    }

    async fn fetch(&self, page: u32, kind: FetchKind) -> Result<usize> {
        // 页号从 1 开始，0 钳制为 1
        let page = page.max(1);
        let (seq, limit) = {
            let mut state = self.inner.state.write();
            if !state.cursor.allows(page) {
                debug!(
                    "{} 第 {} 页超出尾部 (pages={})，忽略本次拉取",
                    self.inner.name, page, state.cursor.pages
                );
                return Ok(0);
            }
            state.issued_seq += 1;
            let seq = state.issued_seq;
            match kind {
                FetchKind::Load => {
                    state.is_loading = true;
                    state.issued_load_seq = seq;
                }
                FetchKind::Refresh => {
                    state.is_refreshing = true;
                    state.issued_refresh_seq = seq;
                }
            }
            state.error = None;
            (seq, state.cursor.limit)
        };

        let outcome = self.inner.adapter.list(page, limit).await;

        let mut state = self.inner.state.write();
        // 拉取序号守卫：比最近已应用响应更老的响应整体丢弃。
        // 该请求自己占用的加载标志仍要复位，除非同种类还有更新的在途请求。
        if seq <= state.applied_seq {
            state.clear_flag_if_latest(kind, seq);
            debug!(
                "{} 丢弃过期拉取响应 (seq={}, applied_seq={})",
                self.inner.name, seq, state.applied_seq
            );
            return Ok(0);
        }

        match outcome {
            Ok(ListPage { items, pagination }) => {
                state.applied_seq = seq;
                let count = items.len();
                if page == 1 {
                    state.items = Arc::new(items);
                } else {
                    let mut merged: Vec<E> = state.items.as_ref().clone();
                    merged.extend(items);
                    state.items = Arc::new(merged);
                }
                state.cursor.advance(pagination);
                state.clear_flag_if_latest(kind, seq);
                drop(state);

                info!(
                    "{} 第 {} 页已应用: {} 条",
                    self.inner.name, page, count
                );
                let event = match (kind, page) {
                    (FetchKind::Refresh, _) => StoreEventKind::Refreshed { count },
                    (FetchKind::Load, 1) => StoreEventKind::PageReplaced { count },
                    (FetchKind::Load, _) => StoreEventKind::PageAppended { count },
                };
                self.inner.events.emit(event);
                Ok(count)
            }
            Err(error) => {
                state.applied_seq = seq;
                let message = error.to_string();
                state.error = Some(message.clone());
                state.clear_flag_if_latest(kind, seq);
                drop(state);

                warn!("{} 拉取第 {} 页失败: {}", self.inner.name, page, message);
                self.inner.events.emit(StoreEventKind::FetchFailed { message });
                Err(error)
            }
        }
    }

    // ---- 乐观 toggle ----

    /// 乐观切换观察者关系（点赞/关注/加入/已读）
    ///
    /// 乐观写入段是同步的，在第一个 await 之前完成：一旦本 future 开始
    /// 执行，UI 在网络往返前就能从快照读到新状态。随后等待适配器结算：
    /// 成功走和解合并，失败整体恢复变更前快照。
    ///
    /// id 不在本地集合时视为过期引用，按 no-op 返回 Ok。同一 id 上已有
    /// 未结算 toggle 时拒绝并返回 `ToggleInFlight`，避免失败回滚吞掉
    /// 叠加在上面的第二次乐观变更。
    pub async fn toggle(&self, id: &E::Id) -> Result<()> {
        let optimistic = {
            let mut pending = self.inner.pending.lock();
            if pending.contains_key(id) {
                debug!("{} toggle {:?} 已在途，拒绝重叠操作", self.inner.name, id);
                return Err(FitClubSDKError::ToggleInFlight(format!("{:?}", id)));
            }

            let mut state = self.inner.state.write();
            let Some(pos) = state.items.iter().position(|e| e.entity_id() == *id) else {
                debug!(
                    "{} toggle 目标 {:?} 不在本地集合，忽略",
                    self.inner.name, id
                );
                return Ok(());
            };

            let pre_snapshot = state.items.clone();
            let mut next_items: Vec<E> = state.items.as_ref().clone();
            let entry = &mut next_items[pos];
            let next = !entry.relation_or_default();
            let counter = entry.counter_or_default();
            entry.set_viewer_relation(next);
            entry.set_relation_counter(if next {
                counter.saturating_add(1)
            } else {
                counter.saturating_sub(1)
            });
            state.items = Arc::new(next_items);
            pending.insert(
                id.clone(),
                PendingToggle {
                    optimistic: next,
                    pre_snapshot,
                },
            );
            next
        };
        self.inner.events.emit(StoreEventKind::Toggled { settled: false });

        match self.inner.adapter.toggle(id).await {
            Ok(server) => {
                {
                    let mut pending = self.inner.pending.lock();
                    let mut state = self.inner.state.write();
                    if let Some(p) = pending.remove(id) {
                        // 服务端明确给出的关系与乐观预测不一致时以服务端为准
                        if let Some(confirmed) = server.viewer_relation() {
                            if confirmed != p.optimistic {
                                warn!(
                                    "{} toggle {:?} 服务端关系 {} 与乐观预测 {} 不一致，以服务端为准",
                                    self.inner.name, id, confirmed, p.optimistic
                                );
                            }
                        }
                    }
                    if let Some(pos) = state.items.iter().position(|e| e.entity_id() == *id) {
                        let merged = reconcile(&state.items[pos], server);
                        let mut next_items: Vec<E> = state.items.as_ref().clone();
                        next_items[pos] = merged;
                        state.items = Arc::new(next_items);
                    }
                }
                debug!(
                    "{} toggle {:?} 已确认 (optimistic={})",
                    self.inner.name, id, optimistic
                );
                self.inner.events.emit(StoreEventKind::Toggled { settled: true });
                Ok(())
            }
            Err(error) => {
                {
                    let mut pending = self.inner.pending.lock();
                    let mut state = self.inner.state.write();
                    if let Some(p) = pending.remove(id) {
                        state.items = p.pre_snapshot;
                    }
                }
                warn!(
                    "{} toggle {:?} 失败，已整体回滚: {}",
                    self.inner.name, id, error
                );
                self.inner.events.emit(StoreEventKind::Reverted);
                Err(error)
            }
        }
    }

    // ---- 创建 / 更新 ----

    /// 把新建成功的实体插到集合头部
    pub fn insert_created(&self, entity: E) {
        {
            let mut state = self.inner.state.write();
            let mut next_items: Vec<E> = Vec::with_capacity(state.items.len() + 1);
            next_items.push(entity);
            next_items.extend(state.items.iter().cloned());
            state.items = Arc::new(next_items);
        }
        self.inner.events.emit(StoreEventKind::Created);
    }

    /// 编辑/更新结算后整体替换匹配实体；id 不存在时为 no-op
    pub fn replace_by_id(&self, id: &E::Id, entity: E) {
        let replaced = {
            let mut state = self.inner.state.write();
            match state.items.iter().position(|e| e.entity_id() == *id) {
                Some(pos) => {
                    let mut next_items: Vec<E> = state.items.as_ref().clone();
                    next_items[pos] = entity;
                    state.items = Arc::new(next_items);
                    true
                }
                None => false,
            }
        };
        if replaced {
            self.inner.events.emit(StoreEventKind::Updated);
        } else {
            debug!(
                "{} replace_by_id 目标 {:?} 不在本地集合，忽略",
                self.inner.name, id
            );
        }
    }

    /// 创建资源并把结果插到集合头部
    pub async fn create(&self, payload: serde_json::Value) -> Result<E> {
        let entity = self.inner.adapter.create(payload).await?;
        self.insert_created(entity.clone());
        Ok(entity)
    }

    /// 更新资源并把结果写回集合
    pub async fn update(&self, id: &E::Id, payload: serde_json::Value) -> Result<E> {
        let entity = self.inner.adapter.update(id, payload).await?;
        self.replace_by_id(id, entity.clone());
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::TestItem;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// 脚本化 mock 适配器：list/toggle 响应按预置顺序弹出
    struct MockAdapter {
        /// (结算前延迟毫秒, 响应)
        lists: Mutex<VecDeque<(u64, Result<ListPage<TestItem>>)>>,
        toggles: Mutex<VecDeque<Result<TestItem>>>,
        list_calls: AtomicUsize,
        toggle_calls: AtomicUsize,
        /// 实际请求到的页号序列
        requested_pages: Mutex<Vec<u32>>,
        /// 设置后 toggle 会等待 notify 才结算，用于观察乐观中间态
        toggle_gate: Option<Arc<Notify>>,
    }

    impl MockAdapter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                lists: Mutex::new(VecDeque::new()),
                toggles: Mutex::new(VecDeque::new()),
                list_calls: AtomicUsize::new(0),
                toggle_calls: AtomicUsize::new(0),
                requested_pages: Mutex::new(Vec::new()),
                toggle_gate: None,
            })
        }

        fn gated() -> (Arc<Self>, Arc<Notify>) {
            let gate = Arc::new(Notify::new());
            (
                Arc::new(Self {
                    lists: Mutex::new(VecDeque::new()),
                    toggles: Mutex::new(VecDeque::new()),
                    list_calls: AtomicUsize::new(0),
                    toggle_calls: AtomicUsize::new(0),
                    requested_pages: Mutex::new(Vec::new()),
                    toggle_gate: Some(gate.clone()),
                }),
                gate,
            )
        }

        fn push_list(&self, delay_ms: u64, response: Result<ListPage<TestItem>>) {
            self.lists.lock().push_back((delay_ms, response));
        }

        fn push_toggle(&self, response: Result<TestItem>) {
            self.toggles.lock().push_back(response);
        }
    }

    #[async_trait::async_trait]
    impl ResourceAdapter<TestItem> for MockAdapter {
        async fn list(&self, page: u32, _limit: u32) -> Result<ListPage<TestItem>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.requested_pages.lock().push(page);
            let (delay_ms, response) = self.lists.lock().pop_front().expect("预置的 list 响应不足");
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            response
        }

        async fn toggle(&self, _id: &u64) -> Result<TestItem> {
            self.toggle_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.toggle_gate {
                gate.notified().await;
            }
            self.toggles.lock().pop_front().expect("预置的 toggle 响应不足")
        }

        async fn create(&self, payload: serde_json::Value) -> Result<TestItem> {
            serde_json::from_value(payload).map_err(Into::into)
        }

        async fn update(&self, _id: &u64, payload: serde_json::Value) -> Result<TestItem> {
            serde_json::from_value(payload).map_err(Into::into)
        }
    }

    fn page(items: Vec<TestItem>, page: u32, limit: u32, total: u64, pages: u32) -> ListPage<TestItem> {
        ListPage {
            items,
            pagination: PageCursor {
                page,
                limit,
                total,
                pages,
            },
        }
    }

    fn store(adapter: Arc<MockAdapter>) -> CollectionStore<TestItem, Arc<MockAdapter>> {
        CollectionStore::new("test", adapter, 2, 64)
    }

    fn ids(store: &CollectionStore<TestItem, Arc<MockAdapter>>) -> Vec<u64> {
        store.snapshot().iter().map(|e| e.id).collect()
    }

    #[tokio::test]
    async fn test_page1_replace_then_page2_append() {
        // 第 1 页替换，第 2 页追加，顺序与服务端一致
        let adapter = MockAdapter::new();
        adapter.push_list(
            0,
            Ok(page(
                vec![TestItem::new(1, None, None), TestItem::new(2, None, None)],
                1,
                2,
                5,
                3,
            )),
        );
        adapter.push_list(
            0,
            Ok(page(
                vec![TestItem::new(3, None, None), TestItem::new(4, None, None)],
                2,
                2,
                5,
                3,
            )),
        );
        let store = store(adapter);

        assert_eq!(store.fetch_page(1).await.unwrap(), 2);
        assert_eq!(ids(&store), vec![1, 2]);

        assert_eq!(store.fetch_page(2).await.unwrap(), 2);
        assert_eq!(ids(&store), vec![1, 2, 3, 4]);
        assert_eq!(store.cursor().page, 2);
        assert_eq!(store.cursor().pages, 3);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_refetch_page1_discards_prior_entities() {
        let adapter = MockAdapter::new();
        adapter.push_list(
            0,
            Ok(page(
                vec![TestItem::new(1, None, None), TestItem::new(2, None, None)],
                1,
                2,
                4,
                2,
            )),
        );
        adapter.push_list(
            0,
            Ok(page(vec![TestItem::new(3, None, None), TestItem::new(4, None, None)], 2, 2, 4, 2)),
        );
        adapter.push_list(
            0,
            Ok(page(vec![TestItem::new(9, None, None)], 1, 2, 1, 1)),
        );
        let store = store(adapter);

        store.fetch_page(1).await.unwrap();
        store.fetch_page(2).await.unwrap();
        assert_eq!(ids(&store), vec![1, 2, 3, 4]);

        // 重新拉第 1 页：先前累积全部丢弃
        store.fetch_page(1).await.unwrap();
        assert_eq!(ids(&store), vec![9]);
        assert_eq!(store.cursor().pages, 1);
    }

    #[tokio::test]
    async fn test_tail_stop_does_not_touch_loading_or_issue_request() {
        // page == pages 后再翻页必须是纯 no-op
        let adapter = MockAdapter::new();
        adapter.push_list(0, Ok(page(vec![TestItem::new(1, None, None)], 1, 2, 1, 1)));
        let store = store(adapter.clone());

        store.fetch_page(1).await.unwrap();
        assert_eq!(adapter.list_calls.load(Ordering::SeqCst), 1);

        assert_eq!(store.fetch_page(2).await.unwrap(), 0);
        assert_eq!(adapter.list_calls.load(Ordering::SeqCst), 1);
        assert!(!store.is_loading());
        assert_eq!(ids(&store), vec![1]);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_stale_data() {
        let adapter = MockAdapter::new();
        adapter.push_list(0, Ok(page(vec![TestItem::new(1, None, None)], 1, 2, 3, 2)));
        adapter.push_list(
            0,
            Err(FitClubSDKError::Server {
                status: 500,
                message: "boom".to_string(),
            }),
        );
        let store = store(adapter);

        store.fetch_page(1).await.unwrap();
        let result = store.fetch_page(2).await;
        assert!(result.is_err());

        // 旧数据保留，错误被记录，标志复位
        assert_eq!(ids(&store), vec![1]);
        assert_eq!(store.cursor().pages, 2);
        assert!(store.error().unwrap().contains("boom"));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_error_cleared_on_next_fetch() {
        let adapter = MockAdapter::new();
        adapter.push_list(0, Err(FitClubSDKError::Network("offline".to_string())));
        adapter.push_list(0, Ok(page(vec![TestItem::new(1, None, None)], 1, 2, 1, 1)));
        let store = store(adapter);

        assert!(store.fetch_page(1).await.is_err());
        assert!(store.error().is_some());

        store.fetch_page(1).await.unwrap();
        assert!(store.error().is_none());
        assert_eq!(ids(&store), vec![1]);
    }

    #[tokio::test]
    async fn test_refresh_uses_separate_flag() {
        let adapter = MockAdapter::new();
        adapter.push_list(50, Ok(page(vec![TestItem::new(7, None, None)], 1, 2, 1, 1)));
        let store = store(adapter);

        let handle = tokio::spawn({
            let store = store.clone();
            async move { store.refresh().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        // 刷新期间 is_refreshing 置位，is_loading 不动
        assert!(store.is_refreshing());
        assert!(!store.is_loading());

        handle.await.unwrap().unwrap();
        assert!(!store.is_refreshing());
        assert_eq!(ids(&store), vec![7]);
    }

    #[tokio::test]
    async fn test_out_of_order_fetch_response_discarded() {
        // 同一存储上两次并发翻页：慢的那次先签发、后结算，必须被丢弃
        let adapter = MockAdapter::new();
        adapter.push_list(0, Ok(page(vec![TestItem::new(1, None, None)], 1, 2, 5, 3)));
        adapter.push_list(
            100,
            Ok(page(vec![TestItem::new(91, None, None)], 2, 2, 5, 3)),
        );
        adapter.push_list(
            0,
            Ok(page(vec![TestItem::new(3, None, None)], 2, 2, 5, 3)),
        );
        let store = store(adapter);

        store.fetch_page(1).await.unwrap();

        let slow = tokio::spawn({
            let store = store.clone();
            async move { store.fetch_page(2).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        // 快的那次后签发，先结算并被应用
        assert_eq!(store.fetch_page(2).await.unwrap(), 1);
        assert_eq!(ids(&store), vec![1, 3]);

        // 慢响应随后到达：序号过期，整体丢弃
        assert_eq!(slow.await.unwrap().unwrap(), 0);
        assert_eq!(ids(&store), vec![1, 3]);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_refresh_flag_cleared_when_stale_refresh_discarded() {
        // 慢 refresh 先签发，快翻页后签发先结算：慢响应被丢弃时
        // is_refreshing 必须随之复位，不能永久卡住
        let adapter = MockAdapter::new();
        adapter.push_list(0, Ok(page(vec![TestItem::new(1, None, None)], 1, 2, 5, 3)));
        adapter.push_list(
            100,
            Ok(page(vec![TestItem::new(1, None, None)], 1, 2, 5, 3)),
        );
        adapter.push_list(
            0,
            Ok(page(vec![TestItem::new(3, None, None)], 2, 2, 5, 3)),
        );
        let store = store(adapter);

        store.fetch_page(1).await.unwrap();

        let slow_refresh = tokio::spawn({
            let store = store.clone();
            async move { store.refresh().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.is_refreshing());

        // 翻页先结算并被应用，慢 refresh 的响应随后过期
        assert_eq!(store.fetch_page(2).await.unwrap(), 1);
        assert_eq!(slow_refresh.await.unwrap().unwrap(), 0);

        assert!(!store.is_refreshing());
        assert!(!store.is_loading());
        assert_eq!(ids(&store), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_fetch_page_zero_clamped_to_first_page() {
        // 页号 0 钳制为 1：按首页替换语义处理，不向服务端发 page=0
        let adapter = MockAdapter::new();
        adapter.push_list(
            0,
            Ok(page(
                vec![TestItem::new(1, None, None), TestItem::new(2, None, None)],
                1,
                2,
                3,
                2,
            )),
        );
        adapter.push_list(0, Ok(page(vec![TestItem::new(9, None, None)], 1, 2, 1, 1)));
        let store = store(adapter.clone());

        store.fetch_page(1).await.unwrap();
        assert_eq!(ids(&store), vec![1, 2]);

        assert_eq!(store.fetch_page(0).await.unwrap(), 1);
        assert_eq!(ids(&store), vec![9]);
        assert_eq!(*adapter.requested_pages.lock(), vec![1, 1]);
    }

    #[tokio::test]
    async fn test_optimistic_toggle_visible_before_settle_then_merged() {
        // 乐观写入立即可见；服务端只回计数不回关系位，合并保留本地关系
        let (adapter, gate) = MockAdapter::gated();
        adapter.push_list(
            0,
            Ok(page(vec![TestItem::new(1, Some(false), Some(5))], 1, 2, 1, 1)),
        );
        adapter.push_toggle(Ok(TestItem::new(1, None, Some(6))));
        let store = store(adapter);
        store.fetch_page(1).await.unwrap();

        let handle = tokio::spawn({
            let store = store.clone();
            async move { store.toggle(&1).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // 网络未结算，乐观状态已可见
        let item = store.get(&1).unwrap();
        assert_eq!(item.liked, Some(true));
        assert_eq!(item.likes, Some(6));
        assert_eq!(store.stats().pending_toggles, 1);

        gate.notify_one();
        handle.await.unwrap().unwrap();

        let item = store.get(&1).unwrap();
        assert_eq!(item.liked, Some(true));
        assert_eq!(item.likes, Some(6));
        assert_eq!(store.stats().pending_toggles, 0);
    }

    #[tokio::test]
    async fn test_toggle_failure_reverts_exactly() {
        // 失败回滚到与变更前逐位相等的状态
        let adapter = MockAdapter::new();
        adapter.push_list(
            0,
            Ok(page(
                vec![
                    TestItem::new(1, Some(false), Some(5)),
                    TestItem::new(2, Some(true), Some(9)),
                ],
                1,
                2,
                2,
                1,
            )),
        );
        adapter.push_toggle(Err(FitClubSDKError::Network("timeout".to_string())));
        let store = store(adapter);
        store.fetch_page(1).await.unwrap();
        let before = store.snapshot();

        assert!(store.toggle(&1).await.is_err());

        let after = store.snapshot();
        assert_eq!(*after, *before);
        assert_eq!(store.stats().pending_toggles, 0);
        // 拉取 error 字段不被 toggle 失败污染（集合层面静默）
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_two_settled_toggles_cancel_out() {
        // 两次先后结算的 toggle 互相抵消
        let adapter = MockAdapter::new();
        adapter.push_list(
            0,
            Ok(page(vec![TestItem::new(1, Some(false), Some(5))], 1, 2, 1, 1)),
        );
        adapter.push_toggle(Ok(TestItem::new(1, Some(true), Some(6))));
        adapter.push_toggle(Ok(TestItem::new(1, Some(false), Some(5))));
        let store = store(adapter);
        store.fetch_page(1).await.unwrap();

        store.toggle(&1).await.unwrap();
        store.toggle(&1).await.unwrap();

        let item = store.get(&1).unwrap();
        assert_eq!(item.liked, Some(false));
        assert_eq!(item.likes, Some(5));
    }

    #[tokio::test]
    async fn test_toggle_server_relation_disagreement_is_server_authoritative() {
        // 服务端回的关系位与乐观预测相反：以服务端为准，不保留乐观值
        let adapter = MockAdapter::new();
        adapter.push_list(
            0,
            Ok(page(vec![TestItem::new(1, Some(false), Some(5))], 1, 2, 1, 1)),
        );
        adapter.push_toggle(Ok(TestItem::new(1, Some(false), Some(5))));
        let store = store(adapter);
        store.fetch_page(1).await.unwrap();

        store.toggle(&1).await.unwrap();

        let item = store.get(&1).unwrap();
        assert_eq!(item.liked, Some(false));
        assert_eq!(item.likes, Some(5));
        assert_eq!(store.stats().pending_toggles, 0);
    }

    #[tokio::test]
    async fn test_overlapping_toggle_on_same_id_rejected() {
        let (adapter, gate) = MockAdapter::gated();
        adapter.push_list(
            0,
            Ok(page(vec![TestItem::new(1, Some(false), Some(5))], 1, 2, 1, 1)),
        );
        adapter.push_toggle(Ok(TestItem::new(1, Some(true), Some(6))));
        let store = store(adapter.clone());
        store.fetch_page(1).await.unwrap();

        let handle = tokio::spawn({
            let store = store.clone();
            async move { store.toggle(&1).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // 第一次未结算期间，同一 id 的第二次 toggle 被拒绝
        let err = store.toggle(&1).await.unwrap_err();
        assert!(err.is_toggle_in_flight());
        // 第二次没有发起网络调用
        assert_eq!(adapter.toggle_calls.load(Ordering::SeqCst), 1);

        gate.notify_one();
        handle.await.unwrap().unwrap();

        // 结算后可以再次 toggle（无在途记录）
        assert_eq!(store.stats().pending_toggles, 0);
    }

    #[tokio::test]
    async fn test_toggle_unknown_id_is_noop() {
        let adapter = MockAdapter::new();
        adapter.push_list(0, Ok(page(vec![TestItem::new(1, None, None)], 1, 2, 1, 1)));
        let store = store(adapter.clone());
        store.fetch_page(1).await.unwrap();

        // 过期引用：no-op，不算错误，也不发请求
        store.toggle(&42).await.unwrap();
        assert_eq!(adapter.toggle_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ids(&store), vec![1]);
    }

    #[tokio::test]
    async fn test_counter_never_negative() {
        // 关系位与计数器不一致（liked=true 但计数 0）时递减饱和到 0
        let adapter = MockAdapter::new();
        adapter.push_list(
            0,
            Ok(page(vec![TestItem::new(1, Some(true), Some(0))], 1, 2, 1, 1)),
        );
        adapter.push_toggle(Ok(TestItem::new(1, Some(false), None)));
        let store = store(adapter);
        store.fetch_page(1).await.unwrap();

        store.toggle(&1).await.unwrap();
        let item = store.get(&1).unwrap();
        assert_eq!(item.liked, Some(false));
        assert_eq!(item.likes, Some(0));
    }

    #[tokio::test]
    async fn test_unknown_relation_treated_as_false() {
        // viewer_relation 缺失时按 false 处理：toggle 置为 true 并 +1
        let adapter = MockAdapter::new();
        adapter.push_list(0, Ok(page(vec![TestItem::new(1, None, Some(3))], 1, 2, 1, 1)));
        adapter.push_toggle(Ok(TestItem::new(1, None, None)));
        let store = store(adapter);
        store.fetch_page(1).await.unwrap();

        store.toggle(&1).await.unwrap();
        let item = store.get(&1).unwrap();
        assert_eq!(item.liked, Some(true));
        assert_eq!(item.likes, Some(4));
    }

    #[tokio::test]
    async fn test_insert_created_prepends() {
        let adapter = MockAdapter::new();
        adapter.push_list(
            0,
            Ok(page(
                vec![TestItem::new(1, None, None), TestItem::new(2, None, None)],
                1,
                2,
                2,
                1,
            )),
        );
        let store = store(adapter);
        store.fetch_page(1).await.unwrap();

        store.insert_created(TestItem::new(99, Some(false), Some(0)));
        assert_eq!(ids(&store), vec![99, 1, 2]);
    }

    #[tokio::test]
    async fn test_replace_by_id() {
        let adapter = MockAdapter::new();
        adapter.push_list(
            0,
            Ok(page(
                vec![TestItem::new(1, None, None), TestItem::new(2, None, None)],
                1,
                2,
                2,
                1,
            )),
        );
        let store = store(adapter);
        store.fetch_page(1).await.unwrap();

        let mut edited = TestItem::new(2, Some(true), Some(1));
        edited.title = "edited".to_string();
        store.replace_by_id(&2, edited.clone());
        assert_eq!(store.get(&2).unwrap(), edited);
        assert_eq!(ids(&store), vec![1, 2]);

        // 不存在的 id：no-op
        store.replace_by_id(&42, TestItem::new(42, None, None));
        assert_eq!(ids(&store), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_create_and_update_flow() {
        let adapter = MockAdapter::new();
        adapter.push_list(0, Ok(page(vec![TestItem::new(1, None, None)], 1, 2, 1, 1)));
        let store = store(adapter);
        store.fetch_page(1).await.unwrap();

        let created = store
            .create(serde_json::json!({"id": 5, "title": "new"}))
            .await
            .unwrap();
        assert_eq!(created.id, 5);
        assert_eq!(ids(&store), vec![5, 1]);

        let updated = store
            .update(&1, serde_json::json!({"id": 1, "title": "edited"}))
            .await
            .unwrap();
        assert_eq!(updated.title, "edited");
        assert_eq!(store.get(&1).unwrap().title, "edited");
    }

    #[tokio::test]
    async fn test_event_sequence() {
        let adapter = MockAdapter::new();
        adapter.push_list(
            0,
            Ok(page(vec![TestItem::new(1, Some(false), Some(5))], 1, 2, 1, 1)),
        );
        adapter.push_toggle(Ok(TestItem::new(1, Some(true), Some(6))));
        let store = store(adapter);
        let mut rx = store.subscribe();

        store.fetch_page(1).await.unwrap();
        store.toggle(&1).await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap().kind,
            StoreEventKind::PageReplaced { count: 1 }
        );
        assert_eq!(
            rx.recv().await.unwrap().kind,
            StoreEventKind::Toggled { settled: false }
        );
        assert_eq!(
            rx.recv().await.unwrap().kind,
            StoreEventKind::Toggled { settled: true }
        );
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let adapter = MockAdapter::new();
        adapter.push_list(
            0,
            Ok(page(
                vec![TestItem::new(1, None, None), TestItem::new(2, None, None)],
                1,
                2,
                5,
                3,
            )),
        );
        let store = store(adapter);
        assert!(store.is_empty());

        store.fetch_page(1).await.unwrap();
        let stats = store.stats();
        assert_eq!(stats.len, 2);
        assert_eq!(stats.page, 1);
        assert_eq!(stats.pages, 3);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.pending_toggles, 0);
        assert!(!stats.is_loading);
        assert!(!stats.is_refreshing);
    }
}
