//! 状态管理系统使用示例
//!
//! 演示统一状态管理器的读写、事件观察、事务与跨域同步

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use unistate_core::api::{
    IdentityMapping, InMemoryStateProvider, StateConfig, StateEvent, StateEventType,
    StateObserver, StateRegistry, StateSyncCoordinator, StateType, StateValue,
    UnifiedStateManager,
};

struct PrintObserver;

#[async_trait]
impl StateObserver for PrintObserver {
    fn id(&self) -> &str {
        "print"
    }

    async fn on_state_change(&self, event: &StateEvent) -> Result<()> {
        let marker = match event.event_type {
            StateEventType::Created => "✓",
            StateEventType::Updated => "→",
            StateEventType::Deleted => "✗",
            StateEventType::Synced => "⇄",
            _ => "·",
        };
        println!("{marker} {}:{} ({:?})", event.state_type, event.state_id, event.event_type);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    // 1. 注册状态提供者与观察者
    let registry = StateRegistry::new()
        .provider(StateType::Tool, Arc::new(InMemoryStateProvider::new(StateType::Tool)))
        .provider(StateType::Global, Arc::new(InMemoryStateProvider::new(StateType::Global)))
        .observer(Arc::new(PrintObserver));
    let manager = UnifiedStateManager::with_registry(StateConfig::default(), registry);

    // 2. 写入工具状态
    println!("[Step 1] Writing tool state...");
    manager
        .set_state(StateType::Tool, "grep-1", StateValue::Tool(json!({"matches": 3})))
        .await?;
    manager
        .set_state(StateType::Tool, "grep-1", StateValue::Tool(json!({"matches": 5})))
        .await?;

    // 3. 批量事务
    println!("[Step 2] Committing a transaction...");
    let mut tx = manager.create_state_transaction();
    tx.set(StateType::Tool, "ls-1", StateValue::Tool(json!({"entries": 12})))
        .set(StateType::Tool, "cat-1", StateValue::Tool(json!({"bytes": 2048})));
    let applied = tx.commit().await?;
    println!("  applied {applied} operations");

    // 4. 同步到全局域
    println!("[Step 3] Syncing tool -> global...");
    let coordinator = StateSyncCoordinator::new();
    let report = coordinator
        .sync_states(&manager, StateType::Tool, StateType::Global, Arc::new(IdentityMapping))
        .await?;
    println!("  synced {}/{} states", report.synced, report.total);

    // 给观察者一点时间输出
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    // 5. 查询历史
    println!("\n📊 History for tool:grep-1");
    for event in manager.get_state_history(StateType::Tool, "grep-1", 0).await {
        println!("  {} {:?} at {}", event.id, event.event_type, event.timestamp);
    }

    manager.shutdown();
    Ok(())
}
