use std::future::Future;
use std::pin::Pin;

use missiongraph::engine::Ticker;
use tokio::sync::mpsc;

/// Ticker that only fires when the test says so.
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

/// Test-side handle that releases ticks to a [`ManualTicker`].
#[derive(Debug, Clone)]
pub struct TickHandle {
    tx: mpsc::UnboundedSender<()>,
}

pub fn manual_ticker() -> (TickHandle, ManualTicker) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TickHandle { tx }, ManualTicker { rx })
}

impl TickHandle {
    pub fn tick(&self) {
        let _ = self.tx.send(());
    }

    pub fn ticks(&self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }
}

impl Ticker for ManualTicker {
    fn tick(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if self.rx.recv().await.is_none() {
                // All handles dropped: never tick again.
                std::future::pending::<()>().await;
            }
        })
    }
}
