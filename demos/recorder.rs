//! Records a simulated screen only while it is visible.
//!
//! Run with `RUST_LOG=stategate=debug cargo run --example recorder`.

use std::sync::Arc;
use std::time::Duration;

use stategate::{
    Config, Gate, LifecycleRegistry, LifecycleState, LogWriter, Subscribe,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stategate=info")),
        )
        .init();

    let screen = Arc::new(LifecycleRegistry::new(LifecycleState::Created));
    let shutdown = CancellationToken::new();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let gate = Gate::builder(Arc::clone(&screen), Config::default())
        .with_subscribers(subs)
        .with_token(&shutdown)
        .build();

    // Screen goes visible, the user leaves mid-recording, then comes back and stays.
    let driver = Arc::clone(&screen);
    let stop = shutdown.clone();
    tokio::spawn(async move {
        let script = [
            (300, LifecycleState::Resumed),
            (700, LifecycleState::Created),
            (300, LifecycleState::Started),
            (1500, LifecycleState::Created),
        ];
        for (wait_ms, state) in script {
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
            println!("screen -> {state}");
            if driver.set_state(state).is_err() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        stop.cancel();
    });

    let rounds = gate
        .repeat_while_at_least(LifecycleState::Started, |ctx| async move {
            let mut frames = 0u32;
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => {
                        println!("recording interrupted after {frames} frames");
                        return;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(100)) => {
                        frames += 1;
                        if frames == 10 {
                            println!("recording saved ({frames} frames)");
                            return;
                        }
                    }
                }
            }
        })
        .await?;

    println!("done after {rounds} rounds");
    Ok(())
}
