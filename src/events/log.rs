//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [fetch-started] source=blog.golang.org
//! [batch] source=blog.golang.org admitted=3
//! [fetch-failed] source=blog.golang.org err="connection refused" streak=1
//! [backoff] source=blog.golang.org delay=10000ms streak=1
//! [duplicate] source=blog.golang.org guid=g2
//! [closed] source=blog.golang.org
//! [merge-closed]
//! ```
//!
//! Enabled via the `logging` feature. Not intended for production use;
//! implement a custom [`Subscriber`] for structured logging or metrics.

use async_trait::async_trait;

use crate::events::{Event, EventKind, Subscriber};

/// Stdout logging subscriber.
pub struct LogWriter;

#[async_trait]
impl Subscriber for LogWriter {
    fn name(&self) -> &'static str {
        "log_writer"
    }

    async fn handle(&self, e: &Event) {
        match e.kind {
            EventKind::FetchStarted => {
                if let Some(source) = &e.source {
                    println!("[fetch-started] source={source}");
                }
            }
            EventKind::BatchAdmitted => {
                if let (Some(source), Some(admitted)) = (&e.source, e.admitted) {
                    println!("[batch] source={source} admitted={admitted}");
                }
            }
            EventKind::FetchFailed => {
                println!(
                    "[fetch-failed] source={:?} err={:?} streak={:?}",
                    e.source, e.reason, e.attempt
                );
            }
            EventKind::BackoffScheduled => {
                println!(
                    "[backoff] source={:?} delay={:?}ms streak={:?}",
                    e.source, e.delay_ms, e.attempt
                );
            }
            EventKind::DuplicateDropped => {
                println!("[duplicate] source={:?} guid={:?}", e.source, e.guid);
            }
            EventKind::SubscriptionClosed => match &e.reason {
                Some(reason) => {
                    println!("[closed] source={:?} reason={reason}", e.source)
                }
                None => println!("[closed] source={:?}", e.source),
            },
            EventKind::MergeClosed => {
                println!("[merge-closed]");
            }
        }
    }
}
