//! Transcript pagination
//!
//! Pages are numbered from 1 and count from the end of the transcript:
//! page 1 holds the newest messages. Within a page, messages stay in
//! chronological order.

use crate::session::Message;

/// Number of pages a transcript spans; never less than 1.
///
/// A `page_size` of 0 means "everything on one page".
pub fn page_count(total: usize, page_size: usize) -> usize {
    if total == 0 || page_size == 0 {
        1
    } else {
        total.div_ceil(page_size)
    }
}

/// Clamp a requested page number into the valid range
pub fn clamp_page(page: usize, total: usize, page_size: usize) -> usize {
    page.clamp(1, page_count(total, page_size))
}

/// The slice of messages shown on `page`
pub fn page_slice(messages: &[Message], page: usize, page_size: usize) -> &[Message] {
    if page_size == 0 {
        return messages;
    }
    let page = clamp_page(page, messages.len(), page_size);
    let end = messages.len().saturating_sub((page - 1) * page_size);
    let start = end.saturating_sub(page_size);
    &messages[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(total: usize) -> Vec<Message> {
        (0..total)
            .map(|i| Message::user(format!("message {}", i)))
            .collect()
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(25, 10), 3);
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0, 25, 10), 1);
        assert_eq!(clamp_page(2, 25, 10), 2);
        assert_eq!(clamp_page(99, 25, 10), 3);
    }

    #[test]
    fn test_page_one_holds_newest_messages() {
        let messages = numbered(25);
        let page = page_slice(&messages, 1, 10);

        assert_eq!(page.len(), 10);
        assert_eq!(page[0].content, "message 15");
        assert_eq!(page[9].content, "message 24");
    }

    #[test]
    fn test_last_page_holds_oldest_remainder() {
        let messages = numbered(25);
        let page = page_slice(&messages, 3, 10);

        assert_eq!(page.len(), 5);
        assert_eq!(page[0].content, "message 0");
        assert_eq!(page[4].content, "message 4");
    }

    #[test]
    fn test_out_of_range_page_clamps() {
        let messages = numbered(5);
        let page = page_slice(&messages, 42, 10);
        assert_eq!(page.len(), 5);
    }

    #[test]
    fn test_empty_transcript() {
        let messages: Vec<Message> = Vec::new();
        assert!(page_slice(&messages, 1, 10).is_empty());
    }
}
