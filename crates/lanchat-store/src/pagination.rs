use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use lanchat_shared::types::SessionKey;

/// History cursor of one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cursor {
    /// Next page to fetch, 1-based.
    pub page: u32,
    pub has_more: bool,
    pub is_loading: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            page: 1,
            has_more: true,
            is_loading: false,
        }
    }
}

/// Handle of one outstanding history fetch.
///
/// A fetch started before a [`Pagination::reset`] carries an older
/// generation; its result is discarded when it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub page: u32,
    generation: u64,
}

#[derive(Debug, Default)]
struct Entry {
    cursor: Cursor,
    generation: u64,
}

/// Per-conversation history cursors.
///
/// At most one fetch per conversation is in flight: a `begin_*` call that
/// finds the cursor loading returns without starting another. This holds
/// across a reset until the fetch started before it has landed.
#[derive(Debug)]
pub struct Pagination {
    page_size: u32,
    entries: HashMap<SessionKey, Entry>,
}

impl Pagination {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            entries: HashMap::new(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn cursor(&self, key: &SessionKey) -> Cursor {
        self.entries
            .get(key)
            .map(|e| e.cursor)
            .unwrap_or_default()
    }

    /// Start fetching an explicit page. Returns `None` when a fetch is
    /// already in flight for this conversation.
    pub fn begin_page(&mut self, key: SessionKey, page: u32) -> Option<FetchTicket> {
        let entry = self.entries.entry(key).or_default();
        if entry.cursor.is_loading {
            debug!(session = %key, page, "History fetch already in flight");
            return None;
        }
        entry.cursor.is_loading = true;
        Some(FetchTicket {
            page,
            generation: entry.generation,
        })
    }

    /// Start fetching the next page, or `None` when there is nothing more to
    /// load or a fetch is in flight.
    pub fn begin_next(&mut self, key: SessionKey) -> Option<FetchTicket> {
        let entry = self.entries.entry(key).or_default();
        if !entry.cursor.has_more || entry.cursor.is_loading {
            return None;
        }
        entry.cursor.is_loading = true;
        Some(FetchTicket {
            page: entry.cursor.page,
            generation: entry.generation,
        })
    }

    /// Finish the fetch of `ticket` that returned `fetched` items.
    ///
    /// A batch shorter than the page size (including an empty one) ends the
    /// history. Returns `false` when the conversation was reset after the
    /// fetch started; the cursor is then only released, and the caller must
    /// drop the fetched items.
    pub fn complete(&mut self, key: SessionKey, ticket: FetchTicket, fetched: usize) -> bool {
        let page_size = self.page_size as usize;
        let Some(entry) = self.entries.get_mut(&key) else {
            return false;
        };
        entry.cursor.is_loading = false;

        if entry.generation != ticket.generation {
            debug!(session = %key, page = ticket.page, "History page from before reset dropped");
            return false;
        }

        let cursor = &mut entry.cursor;
        if fetched < page_size {
            cursor.has_more = false;
        } else {
            cursor.page = cursor.page.max(ticket.page.saturating_add(1));
        }
        debug!(
            session = %key,
            page = ticket.page,
            fetched,
            has_more = cursor.has_more,
            "History page loaded"
        );
        true
    }

    /// Release the cursor after a failed fetch. The cursor is not advanced so
    /// the same page can be requested again.
    pub fn abort(&mut self, key: SessionKey, ticket: FetchTicket) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.cursor.is_loading = false;
            debug!(session = %key, page = ticket.page, "History fetch aborted");
        }
    }

    /// Rewind the conversation to its first page. A fetch still in flight
    /// keeps the cursor loading until it lands, and its result is dropped.
    pub fn reset(&mut self, key: &SessionKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.generation = entry.generation.wrapping_add(1);
            entry.cursor = Cursor {
                is_loading: entry.cursor.is_loading,
                ..Cursor::default()
            };
        }
    }
}
