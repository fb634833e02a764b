//! Reasoning-block extraction from raw model replies
//!
//! Some models interleave a delimited "thinking" segment with the final
//! answer. The splitter walks the reply as a small scanner over
//! {before, reasoning, after} segments, so the edge cases (missing end
//! marker, markers out of order, nested open markers) are explicit.

/// Start marker of an embedded reasoning block
pub const REASONING_OPEN: &str = "<think>";
/// End marker of an embedded reasoning block
pub const REASONING_CLOSE: &str = "</think>";

/// A raw reply separated into answer and reasoning
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitReply {
    /// The user-facing answer; empty when the entire reply was reasoning
    pub answer: String,
    /// The reasoning text, trimmed; empty when no block was found
    pub reasoning: String,
}

#[derive(Debug, PartialEq, Eq)]
enum ScanState {
    BeforeReasoning,
    InReasoning,
    AfterReasoning,
}

/// Split a raw reply into the user-facing answer and the reasoning block.
///
/// Pure and total: the same input always yields the same output, and no
/// input can produce an error. Malformed or missing markers degrade to the
/// untouched reply with empty reasoning.
///
/// When a block is found, the answer is the trimmed text after it, falling
/// back to the trimmed text before it, falling back to the empty string.
pub fn split_reply(raw: &str) -> SplitReply {
    let mut state = ScanState::BeforeReasoning;
    let mut before = "";
    let mut reasoning = "";
    let mut after = "";
    let mut cursor = 0usize;

    loop {
        match state {
            ScanState::BeforeReasoning => {
                let open = raw[cursor..].find(REASONING_OPEN);
                let close = raw[cursor..].find(REASONING_CLOSE);
                match (open, close) {
                    // A block only exists when the first open marker comes
                    // strictly before the first close marker
                    (Some(open), Some(close)) if open < close => {
                        before = &raw[..cursor + open];
                        cursor += open + REASONING_OPEN.len();
                        state = ScanState::InReasoning;
                    }
                    _ => return untouched(raw),
                }
            }
            ScanState::InReasoning => match raw[cursor..].find(REASONING_CLOSE) {
                Some(close) => {
                    reasoning = &raw[cursor..cursor + close];
                    after = &raw[cursor + close + REASONING_CLOSE.len()..];
                    state = ScanState::AfterReasoning;
                }
                // Unterminated block
                None => return untouched(raw),
            },
            ScanState::AfterReasoning => break,
        }
    }

    let after = after.trim();
    let before = before.trim();
    let answer = if !after.is_empty() { after } else { before };

    SplitReply {
        answer: answer.to_string(),
        reasoning: reasoning.trim().to_string(),
    }
}

fn untouched(raw: &str) -> SplitReply {
    SplitReply {
        answer: raw.to_string(),
        reasoning: String::new(),
    }
}
