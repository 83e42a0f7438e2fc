//! Line tokenizer shared by the tileset and board readers.
//!
//! Tokens are separated by whitespace; `"..."` quotes a token that may be
//! empty or contain spaces; `#` outside quotes starts a comment.

use crate::error::TokenError;

/// Split one line into tokens.
pub(crate) fn tokenize(line: &str) -> Result<Vec<String>, TokenError> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '#' {
            break;
        } else if c == '"' {
            chars.next();
            let mut token = String::new();
            let mut closed = false;
            for (_, c) in chars.by_ref() {
                if c == '"' {
                    closed = true;
                    break;
                }
                token.push(c);
            }
            if !closed {
                return Err(TokenError::UnterminatedQuote { column: start + 1 });
            }
            tokens.push(token);
        } else {
            let mut token = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if c.is_whitespace() || c == '"' || c == '#' {
                    break;
                }
                token.push(c);
                chars.next();
            }
            tokens.push(token);
        }
    }

    Ok(tokens)
}
