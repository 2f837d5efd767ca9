// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-processing of raw model output into a sendable reply.

use crate::prompt::{END_OF_TEXT, IM_END, IM_START};

/// Replies longer than this many characters are shortened.
pub const MAX_REPLY_CHARS: usize = 200;

const QUOTE_PAIRS: &[(char, char)] = &[
    ('"', '"'),
    ('\'', '\''),
    ('“', '”'),
    ('‘', '’'),
    ('「', '」'),
    ('『', '』'),
];

const SENTENCE_ENDS: &[char] = &['。', '！', '？', '.', '!', '?', '~', '～'];

/// Cleans a generated reply.
///
/// Applies [`clean_pass`] until the text stops changing. Every pass only
/// removes characters, so this terminates, and the result is a fixed point:
/// `cleanup(&cleanup(x)) == cleanup(x)`.
pub fn cleanup(raw: &str) -> String {
    let mut current = clean_pass(raw);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_pass(text: &str) -> String {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix(IM_START) {
        text = rest;
    }

    // A later turn opener starts content the model invented for another role.
    for marker in [IM_END, END_OF_TEXT, IM_START] {
        if let Some(at) = text.find(marker) {
            text = &text[..at];
        }
    }

    let text = strip_role_word(text.trim());
    let unquoted = strip_quotes(text.trim());
    truncate(unquoted).trim().to_string()
}

/// Drops a leaked `assistant` role tag at the start of the text.
fn strip_role_word(text: &str) -> &str {
    match text.strip_prefix("assistant") {
        Some("") => "",
        Some(rest) if rest.starts_with(['\n', ':', '：']) => rest.trim_start_matches([':', '：']),
        _ => text,
    }
}

/// Removes one layer of matching wrapping quotes.
fn strip_quotes(text: &str) -> &str {
    let mut chars = text.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return text;
    };
    if QUOTE_PAIRS.contains(&(first, last)) {
        &text[first.len_utf8()..text.len() - last.len_utf8()]
    } else {
        text
    }
}

/// Shortens to [`MAX_REPLY_CHARS`], preferring a sentence boundary.
fn truncate(text: &str) -> &str {
    let Some((limit, _)) = text.char_indices().nth(MAX_REPLY_CHARS) else {
        return text;
    };
    let head = &text[..limit];
    let boundary = head
        .char_indices()
        .rev()
        .find(|(idx, c)| *idx > 0 && SENTENCE_ENDS.contains(c));
    match boundary {
        Some((idx, c)) => &head[..idx + c.len_utf8()],
        None => head,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_at_end_marker() {
        assert_eq!(cleanup("Hi there<|im_end|>trailing"), "Hi there");
        assert_eq!(cleanup("ok<|endoftext|>more"), "ok");
    }

    #[test]
    fn strips_role_markers_and_tag() {
        assert_eq!(cleanup("<|im_start|>assistant\nsure, see you"), "sure, see you");
        assert_eq!(cleanup("assistant: on my way"), "on my way");
        assert_eq!(cleanup("assistant"), "");
        assert_eq!(cleanup("assistants are helpful"), "assistants are helpful");
    }

    #[test]
    fn turn_opener_mid_reply_ends_it() {
        let cleaned = cleanup("Sure thing<|im_start|>assistant\nsee you");
        assert_eq!(cleaned, "Sure thing");
        assert!(!cleaned.contains("assistant"));
        assert_eq!(cleanup("ok!<|im_start|>user\nand you?"), "ok!");
    }

    #[test]
    fn strips_wrapping_quotes() {
        assert_eq!(cleanup("\"see you soon\""), "see you soon");
        assert_eq!(cleanup("“好的”"), "好的");
        assert_eq!(cleanup("「收到」"), "收到");
        assert_eq!(cleanup("\"unbalanced"), "\"unbalanced");
        assert_eq!(cleanup("\""), "\"");
    }

    #[test]
    fn long_reply_cut_at_sentence_end() {
        let first = "a".repeat(150) + ".";
        let text = format!("{first}{}", "b".repeat(100));
        assert_eq!(cleanup(&text), first);
    }

    #[test]
    fn long_reply_without_punctuation_is_hard_cut() {
        let text = "字".repeat(300);
        let cleaned = cleanup(&text);
        assert_eq!(cleaned.chars().count(), MAX_REPLY_CHARS);
    }

    #[test]
    fn cjk_punctuation_counts_as_boundary() {
        let text = format!("{}！{}", "好".repeat(120), "啊".repeat(150));
        let cleaned = cleanup(&text);
        assert!(cleaned.ends_with('！'));
        assert_eq!(cleaned.chars().count(), 121);
    }

    #[test]
    fn whitespace_only_becomes_empty() {
        assert_eq!(cleanup("   \n\t"), "");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn cleanup_is_idempotent(s in "(\\PC|<\\|im_start\\|>|<\\|im_end\\|>|assistant\n|\"|“|”){0,260}") {
                let once = cleanup(&s);
                prop_assert_eq!(cleanup(&once), once.clone());
            }

            #[test]
            fn cleanup_never_exceeds_limit(s in "\\PC{0,400}") {
                prop_assert!(cleanup(&s).chars().count() <= MAX_REPLY_CHARS);
            }
        }
    }
}
