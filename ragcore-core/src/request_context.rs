//! ABOUTME: Per-request context threaded through the pipeline
//! ABOUTME: Carries caller identity, a session id, and a cancellation token

use crate::types::UserContext;
use tokio_util::sync::CancellationToken;

/// Everything a pipeline stage needs about the caller and the in-flight request.
///
/// Cloning is cheap: the cancellation token is an `Arc` handle, so cancelling
/// any clone cancels every clone derived from the same request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: UserContext,
    pub session_id: String,
    cancellation: CancellationToken,
}

impl RequestContext {
    #[must_use]
    pub fn new(user: UserContext, session_id: impl Into<String>) -> Self {
        Self { user, session_id: session_id.into(), cancellation: CancellationToken::new() }
    }

    /// A child token that is cancelled whenever the parent is, but can also
    /// be cancelled independently (used to bound a single adapter call).
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancellation.child_token()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Resolves once the request is cancelled; callers `select!` this against
    /// adapter futures to honor cancellation mid-step.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserRole;

    #[test]
    fn cancelling_context_cancels_child_tokens() {
        let ctx = RequestContext::new(UserContext::new("u1", UserRole::Employee, "eng"), "sess-1");
        let child = ctx.child_token();
        assert!(!child.is_cancelled());
        ctx.cancel();
        assert!(child.is_cancelled());
        assert!(ctx.is_cancelled());
    }
}
