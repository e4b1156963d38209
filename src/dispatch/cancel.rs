use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Cloneable cancellation signal shared between a caller and a dispatch.
///
/// Cancelling is sticky; once set it stays set for every clone.
#[derive(Clone, Debug)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives as long as `self`, so this only ends on cancel.
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            debug!("Cancel sender dropped while waiting");
        }
    }
}
