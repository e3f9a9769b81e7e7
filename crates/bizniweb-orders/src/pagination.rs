//! Cursor bookkeeping for `getOrderList` pagination.
//!
//! The API returns `pageInfo { hasNextPage, nextCursor }`. The cursor is an
//! opaque JSON scalar (seen as both a number and a string), so it is kept as
//! a [`serde_json::Value`] and echoed back unchanged.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::OrderApiError;
use crate::types::PageInfo;

/// What to do after a page has been processed.
#[derive(Debug, Clone, PartialEq)]
pub enum NextPage {
    Fetch(Value),
    Done,
    /// `hasNextPage` was true but no cursor was supplied.
    MissingCursor,
}

/// Tracks cursors already requested so a server that keeps returning the
/// same cursor cannot loop forever.
#[derive(Debug, Default)]
pub struct CursorTracker {
    seen: HashSet<String>,
}

impl CursorTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide the next step from a page's `pageInfo`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderApiError::CursorCycle`] when the cursor was already
    /// followed earlier in this pagination run.
    pub fn advance(&mut self, page_info: &PageInfo) -> Result<NextPage, OrderApiError> {
        if !page_info.has_next_page {
            return Ok(NextPage::Done);
        }
        let Some(cursor) = page_info.next_cursor.as_ref().filter(|c| !c.is_null()) else {
            return Ok(NextPage::MissingCursor);
        };
        let key = cursor_key(cursor);
        if !self.seen.insert(key.clone()) {
            return Err(OrderApiError::CursorCycle { cursor: key });
        }
        Ok(NextPage::Fetch(cursor.clone()))
    }
}

fn cursor_key(cursor: &Value) -> String {
    match cursor {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
