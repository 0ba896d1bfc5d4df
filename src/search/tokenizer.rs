// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search text tokenizer
//!
//! ```text
//! tail:N123 "red barn" xc via:"K SEA"
//! ───┬───── ────┬──── ┬─ ──────┬─────
//!  Field       Term  Term    Field
//!           (quoted)       (quoted value)
//! ```
//!
//! A bare token ends at whitespace or at `:`. Text after `:` is the field
//! value and runs to the next whitespace (colons included), or through the
//! closing quote when it starts with `"`. Quoted tokens are never alias keys.
//! Unterminated quotes read to end of input.

/// One token of user search text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Plain search term
    Term { text: String, quoted: bool },
    /// `alias:value` pair
    Field { alias: String, value: String },
}

/// Split search text into tokens. Never fails.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&c) = chars.peek() else { break };

        if c == '"' {
            chars.next();
            let text = read_quoted(&mut chars);
            tokens.push(Token::Term { text, quoted: true });
            continue;
        }

        let mut word = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != ':') {
            word.push(c);
        }

        if chars.next_if_eq(&':').is_none() {
            tokens.push(Token::Term { text: word, quoted: false });
            continue;
        }

        let value = match chars.peek() {
            Some('"') => {
                chars.next();
                read_quoted(&mut chars)
            }
            _ => {
                let mut value = String::new();
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    value.push(c);
                }
                value
            }
        };
        tokens.push(Token::Field { alias: word, value });
    }

    tokens
}

fn read_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut text = String::new();
    for c in chars.by_ref() {
        if c == '"' {
            break;
        }
        text.push(c);
    }
    text
}
