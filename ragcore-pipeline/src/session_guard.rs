//! ABOUTME: RAII guard for the scoped relational-session-context discipline (§9/§5)

use ragcore_adapters::relational_store::RelationalStore;
use ragcore_core::{Result, UserContext};
use std::sync::Arc;

/// Clears the relational store's row-level-security session context on every
/// exit path, including early returns and cancellation.
///
/// `release()` is the expected path: callers consume the guard once the
/// scoped queries are done, awaiting the clear. `Drop` is only a fallback for
/// the paths that skip `release()` (a `?` before it, a panic); since `Drop`
/// can't be async, it spawns a detached task to clear context and logs if
/// that fallback ever actually fires.
pub struct SessionContextGuard {
    store: Arc<dyn RelationalStore>,
    released: bool,
}

impl SessionContextGuard {
    pub async fn acquire(store: Arc<dyn RelationalStore>, user: &UserContext) -> Result<Self> {
        store.set_user_context(user).await?;
        Ok(Self { store, released: false })
    }

    /// Clears the session context and consumes the guard. Safe to call even
    /// after an error: every caller should route through this (or let `Drop`
    /// catch it) before the request task exits.
    pub async fn release(mut self) {
        self.released = true;
        if let Err(error) = self.store.clear_user_context().await {
            tracing::error!(%error, "failed to clear relational session context");
        }
    }
}

impl Drop for SessionContextGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(error) = store.clear_user_context().await {
                tracing::error!(%error, "failed to clear relational session context in drop fallback");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcore_adapters::memory::InMemoryRelationalStore;
    use ragcore_core::UserRole;

    fn user() -> UserContext {
        UserContext::new("alice", UserRole::Employee, "eng")
    }

    #[tokio::test]
    async fn release_clears_context() {
        let store = Arc::new(InMemoryRelationalStore::new());
        let guard = SessionContextGuard::acquire(store.clone() as Arc<dyn RelationalStore>, &user())
            .await
            .unwrap();
        guard.release().await;
        assert!(store.current_user_context().is_none());
    }

    #[tokio::test]
    async fn dropping_without_release_clears_context_via_fallback_task() {
        let store = Arc::new(InMemoryRelationalStore::new());
        {
            let _guard = SessionContextGuard::acquire(store.clone() as Arc<dyn RelationalStore>, &user())
                .await
                .unwrap();
        }
        // The fallback clear runs on a spawned task; give it a moment.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(store.current_user_context().is_none());
    }
}
