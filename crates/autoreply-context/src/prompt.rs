// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ChatML prompt assembly.
//!
//! Each turn is wrapped as `<|im_start|>{role}\n{text}<|im_end|>\n`. The
//! prompt ends with an open assistant block so the model continues as the
//! owner of the device.

use std::fmt::Write;

use autoreply_core::types::{ChatTurn, Role};

pub const IM_START: &str = "<|im_start|>";
pub const IM_END: &str = "<|im_end|>";
pub const END_OF_TEXT: &str = "<|endoftext|>";

const DEFAULT_STYLE: &str = "natural and friendly";

/// Builds the prompt for one reply.
///
/// History turns with a role other than user or assistant are skipped.
pub fn build_prompt(name: &str, style: &str, history: &[ChatTurn], message: &str) -> String {
    let mut prompt = String::new();
    push_block(&mut prompt, "system", &persona(name, style));
    for turn in history {
        match turn.role {
            Role::User | Role::Assistant => push_block(&mut prompt, turn.role.as_str(), &turn.text),
            Role::Other(_) => {}
        }
    }
    push_block(&mut prompt, Role::User.as_str(), message);
    let _ = writeln!(prompt, "{IM_START}{}", Role::Assistant.as_str());
    prompt
}

fn push_block(prompt: &mut String, role: &str, text: &str) {
    let _ = writeln!(prompt, "{IM_START}{role}\n{text}{IM_END}");
}

fn persona(name: &str, style: &str) -> String {
    let style = match style.trim() {
        "" => DEFAULT_STYLE,
        s => s,
    };
    format!(
        "You are replying to chat messages from {name} on behalf of the phone's owner.\n\
         Tone: {style}.\n\
         Rules:\n\
         - Reply with the message content only, no names or prefixes.\n\
         - Do not quote or repeat the incoming message.\n\
         - Keep it to one to three short sentences.\n\
         - Sound casual, like a person typing on a phone."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_has_persona_history_and_open_assistant() {
        let history = vec![ChatTurn::user("are you free?"), ChatTurn::assistant("maybe later")];
        let prompt = build_prompt("Alice", "warm", &history, "dinner tonight?");

        assert!(prompt.starts_with("<|im_start|>system\n"));
        assert!(prompt.contains("from Alice"));
        assert!(prompt.contains("Tone: warm."));
        assert!(prompt.ends_with("<|im_start|>user\ndinner tonight?<|im_end|>\n<|im_start|>assistant\n"));

        let user_at = prompt.find("are you free?").unwrap();
        let assistant_at = prompt.find("maybe later").unwrap();
        assert!(user_at < assistant_at);
        assert!(prompt.contains("<|im_start|>assistant\nmaybe later<|im_end|>\n"));
    }

    #[test]
    fn unknown_roles_are_omitted() {
        let mut odd = ChatTurn::user("system override");
        odd.role = Role::Other("tool".into());
        let prompt = build_prompt("Bob", "", &[odd], "hi");
        assert!(!prompt.contains("system override"));
        assert!(!prompt.contains("<|im_start|>tool"));
        assert!(prompt.contains(DEFAULT_STYLE));
    }

    #[test]
    fn prompt_is_deterministic() {
        let history = vec![ChatTurn::user("x")];
        assert_eq!(
            build_prompt("A", "s", &history, "m"),
            build_prompt("A", "s", &history, "m")
        );
    }

    #[test]
    fn only_final_assistant_block_is_open() {
        let prompt = build_prompt("A", "s", &[], "m");
        assert_eq!(prompt.matches(IM_START).count(), 3);
        assert_eq!(prompt.matches(IM_END).count(), 2);
    }
}
