// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sensitive-term filter.

/// Case-insensitive substring filter built from a delimited word list.
#[derive(Debug, Clone, Default)]
pub struct SensitiveTerms {
    terms: Vec<String>,
}

impl SensitiveTerms {
    /// Splits on `,`, `，`, `;`, `；` and newlines, trimming and dropping empties.
    pub fn parse(raw: &str) -> Self {
        let terms = raw
            .split([',', '，', ';', '；', '\n', '\r'])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect();
        Self { terms }
    }

    /// The first configured term contained in `text`, if any.
    pub fn find_in(&self, text: &str) -> Option<&str> {
        if self.terms.is_empty() {
            return None;
        }
        let text = text.to_lowercase();
        self.terms
            .iter()
            .find(|term| text.contains(term.as_str()))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_delimiters() {
        let terms = SensitiveTerms::parse("loan，Password; bank\n\n,  ,借钱");
        assert_eq!(terms.len(), 4);
    }

    #[test]
    fn matches_case_insensitively() {
        let terms = SensitiveTerms::parse("password");
        assert_eq!(terms.find_in("what's your PASSWORD?"), Some("password"));
        assert_eq!(terms.find_in("hello"), None);
    }

    #[test]
    fn empty_list_matches_nothing() {
        let terms = SensitiveTerms::parse(" , ;");
        assert!(terms.is_empty());
        assert_eq!(terms.find_in("anything"), None);
    }

    #[test]
    fn cjk_terms_match() {
        let terms = SensitiveTerms::parse("借钱");
        assert!(terms.find_in("能借钱给我吗").is_some());
    }
}
