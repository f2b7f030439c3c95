//! Observers for transport failures
//!
//! A failed command is reported to the client's handler exactly once; the
//! command itself then yields nothing. Handlers decide what happens next
//! (log, ignore, schedule a fresh login, ...).

use tracing::error;

use crate::error::ClientError;

/// Receives transport failures from a [`crate::SessionClient`]
pub trait FailureHandler: Send + Sync {
    fn on_transport_failure(&self, error: &ClientError);
}

/// Logs each failure at error level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFailureHandler;

impl FailureHandler for LogFailureHandler {
    fn on_transport_failure(&self, error: &ClientError) {
        error!(error = %error, "Device transport failure");
    }
}

/// Ignores failures
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFailureHandler;

impl FailureHandler for NoopFailureHandler {
    fn on_transport_failure(&self, _error: &ClientError) {}
}

impl<F> FailureHandler for F
where
    F: Fn(&ClientError) + Send + Sync,
{
    fn on_transport_failure(&self, error: &ClientError) {
        self(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_closure_handler() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let handler: Arc<dyn FailureHandler> = Arc::new(move |_: &ClientError| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        handler.on_transport_failure(&ClientError::InvalidPosition(101));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
