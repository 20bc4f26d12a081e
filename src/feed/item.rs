//! A single feed entry.

/// One unit of feed content.
///
/// Identity is carried by [`guid`](Item::guid) alone. `title` and `channel`
/// are display metadata and play no part in deduplication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    /// Human-readable entry title.
    pub title: String,
    /// Label of the source the entry came from.
    pub channel: String,
    /// Globally unique identifier of the entry.
    pub guid: String,
}

impl Item {
    /// Creates a new item.
    pub fn new(
        title: impl Into<String>,
        channel: impl Into<String>,
        guid: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            channel: channel.into(),
            guid: guid.into(),
        }
    }
}
