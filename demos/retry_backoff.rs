//! Watch a subscription ride out a flaky source: failures are logged, polls
//! back off, and the last error surfaces when the stream is closed.
//!
//! Run with:
//! ```bash
//! cargo run --example retry_backoff --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use feedvisor::{
    subscribe_with, Batch, Bus, Config, FetchError, FetcherFn, Item, Jitter, LogWriter,
    RetryPolicy,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let bus = Bus::new(64);
    bus.attach(Arc::new(LogWriter));

    // Fails twice for every success.
    let mut call = 0u32;
    let flaky = FetcherFn::arc("flaky.example.org", move || {
        call += 1;
        let n = call;
        async move {
            if n % 3 == 0 {
                let item = Item::new(
                    format!("Item {n}"),
                    "flaky.example.org",
                    format!("flaky/{n}"),
                );
                Ok(Batch::after(vec![item], Duration::from_millis(200)))
            } else {
                Err(FetchError::failed("503 service unavailable"))
            }
        }
    });

    let cfg = Config {
        retry: RetryPolicy {
            base: Duration::from_millis(500),
            factor: 2.0,
            cap: Duration::from_secs(4),
            jitter: Jitter::Equal,
        },
        ..Config::default()
    };
    let mut sub = subscribe_with(flaky, cfg, bus);

    let closer = sub.close_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(6)).await;
        println!("closed: {:?}", closer.close().await);
    });

    while let Some(item) = sub.recv().await {
        println!("received {} ({})", item.title, item.guid);
    }
}
