// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Whitespace and comment aware tokenizer for material text.

/// A cursor over material text producing whitespace separated tokens.
///
/// Tokens are returned as slices of the source. An empty token means either
/// the end of the text or, when line breaks are not allowed, the end of the
/// current line. In the latter case the line break is consumed, so the next
/// call continues on the following line.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    /// Starts tokenizing at the beginning of `text`.
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Starts tokenizing at byte offset `pos` of `text`.
    pub fn at(text: &'a str, pos: usize) -> Self {
        Self {
            text,
            pos: pos.min(text.len()),
        }
    }

    /// Current byte offset into the source.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether every byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Returns the next token.
    ///
    /// With `allow_line_breaks == false` an empty token is returned as soon
    /// as a newline is crossed.
    pub fn next_token(&mut self, allow_line_breaks: bool) -> &'a str {
        let bytes = self.text.as_bytes();
        let mut crossed_newline = false;

        loop {
            while self.pos < bytes.len() && bytes[self.pos] <= b' ' {
                if bytes[self.pos] == b'\n' {
                    crossed_newline = true;
                }
                self.pos += 1;
            }
            if self.pos >= bytes.len() {
                return "";
            }
            if crossed_newline && !allow_line_breaks {
                return "";
            }

            let c = bytes[self.pos];
            let next = bytes.get(self.pos + 1).copied();
            if c == b'/' && next == Some(b'/') {
                self.pos += 2;
                while self.pos < bytes.len() && bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
            } else if c == b'/' && next == Some(b'*') {
                self.pos += 2;
                while self.pos < bytes.len()
                    && !(bytes[self.pos] == b'*' && bytes.get(self.pos + 1) == Some(&b'/'))
                {
                    self.pos += 1;
                }
                self.pos = (self.pos + 2).min(bytes.len());
            } else {
                break;
            }
        }

        if bytes[self.pos] == b'"' {
            let start = self.pos + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end] != b'"' {
                end += 1;
            }
            self.pos = (end + 1).min(bytes.len());
            return &self.text[start..end];
        }

        let start = self.pos;
        while self.pos < bytes.len() && bytes[self.pos] > b' ' {
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }

    /// Collects the remaining tokens of the current line, separated by a space.
    pub fn rest_of_line_tokens(&mut self) -> String {
        let mut line = String::new();
        loop {
            let token = self.next_token(false);
            if token.is_empty() {
                return line;
            }
            line.push_str(token);
            line.push(' ');
        }
    }

    /// Advances past the next newline.
    pub fn skip_rest_of_line(&mut self) {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            let c = bytes[self.pos];
            self.pos += 1;
            if c == b'\n' {
                break;
            }
        }
    }

    /// Skips a brace-delimited section, counting nested braces.
    ///
    /// The cursor must be positioned before the opening brace.
    pub fn skip_braced_section(&mut self) {
        let mut depth = 0i32;
        loop {
            let token = self.next_token(true);
            match token {
                "{" => depth += 1,
                "}" => depth -= 1,
                _ => {}
            }
            if depth == 0 || self.is_at_end() {
                break;
            }
        }
    }
}

/// Permissive string to float conversion.
///
/// Parses the longest numeric prefix of `token`; anything unparsable yields 0.
pub fn atof(token: &str) -> f32 {
    let token = token.trim_start();
    let bytes = token.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || (end == digits_start + 1 && bytes[digits_start] == b'.') {
        return 0.0;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    token[..end].parse::<f32>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_and_comments() {
        let mut tokens = Tokenizer::new("a // comment\n /* block\n */ b \"quoted text\" c");
        assert_eq!(tokens.next_token(true), "a");
        assert_eq!(tokens.next_token(true), "b");
        assert_eq!(tokens.next_token(true), "quoted text");
        assert_eq!(tokens.next_token(true), "c");
        assert_eq!(tokens.next_token(true), "");
        assert!(tokens.is_at_end());
    }

    #[test]
    fn test_line_mode_stops_at_newline_once() {
        let mut tokens = Tokenizer::new("map foo\nblend");
        assert_eq!(tokens.next_token(false), "map");
        assert_eq!(tokens.next_token(false), "foo");
        assert_eq!(tokens.next_token(false), "");
        assert_eq!(tokens.next_token(false), "blend");
    }

    #[test]
    fn test_rest_of_line_tokens() {
        let mut tokens = Tokenizer::new("scroll 0.5  1\nnext");
        assert_eq!(tokens.rest_of_line_tokens(), "scroll 0.5 1 ");
        assert_eq!(tokens.next_token(true), "next");
    }

    #[test]
    fn test_skip_braced_section_handles_nesting() {
        let mut tokens = Tokenizer::new("{ a { b } c } after");
        tokens.skip_braced_section();
        assert_eq!(tokens.next_token(true), "after");
    }

    #[test]
    fn test_skip_rest_of_line() {
        let mut tokens = Tokenizer::new("qer_editorimage x y\nnext");
        tokens.next_token(true);
        tokens.skip_rest_of_line();
        assert_eq!(tokens.next_token(false), "next");
    }

    #[test]
    fn test_atof_is_permissive() {
        assert_eq!(atof("1.5"), 1.5);
        assert_eq!(atof("-2"), -2.0);
        assert_eq!(atof("3abc"), 3.0);
        assert_eq!(atof(".25"), 0.25);
        assert_eq!(atof("1e2"), 100.0);
        assert_eq!(atof("1e"), 1.0);
        assert_eq!(atof("abc"), 0.0);
        assert_eq!(atof(""), 0.0);
        assert_eq!(atof("-"), 0.0);
    }
}
