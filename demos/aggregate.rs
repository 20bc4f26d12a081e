//! Subscribe to several fake feeds, merge them, and read the combined stream
//! until a timed shutdown.
//!
//! Run with:
//! ```bash
//! cargo run --example aggregate
//! ```

use std::time::Duration;

use feedvisor::{merge, subscribe, Batch, FetcherFn, FetcherRef, Item};

/// Builds a fake fetcher that emits three fresh items per call, repeating the
/// last GUID of the previous batch so deduplication is visible in the output.
fn fake_feed(domain: &'static str) -> FetcherRef {
    let mut last = 0u32;
    FetcherFn::arc(domain, move || {
        // Start from the previous batch's tail GUID so every batch overlaps
        // the one before it by a single item.
        let start = last.max(1);
        last = start + 2;
        let items: Vec<Item> = (start..start + 3)
            .map(|n| Item::new(format!("Item {n}"), domain, format!("{domain}/{n}")))
            .collect();
        async move { Ok(Batch::after(items, Duration::from_millis(400))) }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mut merged = merge(vec![
        subscribe(fake_feed("blog.golang.org")),
        subscribe(fake_feed("googleblog.blogspot.com")),
        subscribe(fake_feed("googledevelopers.blogspot.com")),
    ]);

    // Shut everything down after a few seconds.
    let closer = merged.close_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        println!("closed: {:?}", closer.close().await);
    });

    while let Some(item) = merged.recv().await {
        println!("{} {}", item.channel, item.title);
    }
}
