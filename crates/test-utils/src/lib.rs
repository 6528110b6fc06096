pub mod builders;
pub mod fake_channel;
pub mod ticker;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use missiongraph::logging::LOG_ENV_VAR;
use tracing_subscriber::{fmt, EnvFilter};

pub use fake_channel::{completion_for, failure_for, FakeChannel, SentCommand};
pub use ticker::{manual_ticker, ManualTicker, TickHandle};

static INIT: Once = Once::new();

const MISSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-captured tracing subscriber, once per test binary.
///
/// The filter comes from `MISSIONGRAPH_LOG`, then `RUST_LOG`, then `info`.
/// Output goes through the test writer, so it only shows for failing tests
/// or with `--nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|spec| EnvFilter::try_new(spec).ok())
            .or_else(|| EnvFilter::try_from_default_env().ok())
            .unwrap_or_else(|| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if the mission has not finished within 5 s.
///
/// Under paused tokio time the limit is virtual and auto-advances.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(MISSION_TIMEOUT, f).await {
        Ok(out) => out,
        Err(_) => panic!("mission did not finish within {MISSION_TIMEOUT:?}"),
    }
}
