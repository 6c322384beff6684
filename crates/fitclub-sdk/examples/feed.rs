//! 动态信息流演示：分页加载 + 乐观点赞
//!
//! 运行前需要一个可访问的后端：
//! cargo run --example feed -- https://api.fitclub.app

use fitclub_sdk::{FitClubConfig, FitClubStores, StoreEventKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:3000".to_string());

    let config = FitClubConfig::builder()
        .base_url(base_url)
        .page_limit(10)
        .request_timeout_secs(15)
        .build();
    let stores = FitClubStores::initialize(config)?;

    let mut events = stores.posts.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let StoreEventKind::Reverted = event.kind {
                println!("⚠️ 点赞失败，已回滚");
            }
        }
    });

    // 首屏
    let count = stores.posts.fetch_page(1).await?;
    println!("首屏加载 {} 条动态", count);

    // 无限滚动：拉到尾页为止
    while stores.posts.cursor().has_next() {
        let next = stores.posts.cursor().next_page();
        let count = stores.posts.fetch_page(next).await?;
        println!("第 {} 页追加 {} 条", next, count);
    }

    // 乐观点赞第一条
    if let Some(first) = stores.posts.snapshot().first() {
        let id = first.id;
        match stores.posts.toggle(&id).await {
            Ok(()) => println!("动态 {} 点赞已确认", id),
            Err(e) => println!("动态 {} 点赞失败: {}", id, e),
        }
    }

    let stats = stores.posts.stats();
    println!("共 {} 条 / {} 页", stats.len, stats.pages);
    Ok(())
}
