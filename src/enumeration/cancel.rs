use std::sync::Arc;
use tokio::sync::watch;

/// Sending half; dropping every clone leaves the last value in place
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<watch::Sender<bool>>);

/// Observed by every enumeration task once per iteration
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(Arc::new(tx)), CancelSignal(rx))
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal(self.0.subscribe())
    }
}

impl CancelSignal {
    /// A signal that is never raised
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self(rx)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancellation is requested; pending forever otherwise
    pub async fn cancelled(&mut self) {
        let sender_gone = self.0.wait_for(|cancelled| *cancelled).await.is_err();
        if sender_gone {
            std::future::pending::<()>().await;
        }
    }
}
