// Copyright 2025 Logtree Developers
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

//! The conversion-pattern scanner.
//!
//! A pattern is literal text interspersed with `%`-introduced conversions:
//! an optional `-` (right-pad) flag, an optional `0` (zero-pad) flag, an
//! optional minimum width, an optional `.`-prefixed maximum width, a
//! conversion word resolved by longest match against the registry, and any
//! number of `{...}` option groups. Scanning never fails: malformed input
//! degrades to literal text and a recorded diagnostic.

use crate::layout::pattern::convert::ConverterRegistry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FormatSpec {
    pub(crate) left_align: bool,
    pub(crate) zero_pad: bool,
    pub(crate) min_width: Option<usize>,
    pub(crate) max_width: Option<usize>,
}

impl FormatSpec {
    pub(crate) fn is_plain(&self) -> bool {
        *self == FormatSpec::default()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Piece {
    Literal(String),
    Conversion {
        spec: FormatSpec,
        word: String,
        options: Vec<String>,
        raw: String,
    },
}

struct Cursor<'a> {
    pattern: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.pattern[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.pattern[start..self.pos]
    }
}

/// Scan a pattern into literal and conversion pieces.
pub(crate) fn parse(
    pattern: &str,
    registry: &ConverterRegistry,
    diagnostics: &mut Vec<String>,
) -> Vec<Piece> {
    let mut cursor = Cursor { pattern, pos: 0 };
    let mut pieces = Vec::new();
    let mut literal = String::new();

    while let Some(c) = cursor.bump() {
        if c != '%' {
            literal.push(c);
            continue;
        }

        let start = cursor.pos - 1;
        if cursor.peek().is_none() {
            diagnostics.push("trailing '%' at end of pattern".to_string());
            literal.push('%');
            break;
        }
        if cursor.eat('%') {
            literal.push('%');
            continue;
        }

        let spec = parse_spec(&mut cursor);

        let word_start = cursor.pos;
        let run = cursor.eat_while(|c| c.is_ascii_alphabetic());
        if run.is_empty() {
            diagnostics.push(format!(
                "missing conversion word after {:?}",
                &pattern[start..cursor.pos]
            ));
            literal.push_str(&pattern[start..cursor.pos]);
            continue;
        }

        let Some(matched) = registry.resolve(run) else {
            diagnostics.push(format!("unknown conversion word {run:?}"));
            literal.push_str(&pattern[start..cursor.pos]);
            continue;
        };
        // hand unmatched tail of the run back to the literal scanner
        cursor.pos = word_start + matched;
        let word = &run[..matched];

        let mut options = Vec::new();
        let mut raw_end = cursor.pos;
        let mut tail = None;
        while cursor.peek() == Some('{') {
            let brace_start = cursor.pos;
            match parse_brace_group(&mut cursor) {
                Some(group) => {
                    options.push(group);
                    raw_end = cursor.pos;
                }
                None => {
                    // never-closed group: its text is emitted as literal output
                    diagnostics.push(format!("unterminated option group after %{word}"));
                    tail = Some(&pattern[brace_start..]);
                    break;
                }
            }
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(std::mem::take(&mut literal)));
        }
        pieces.push(Piece::Conversion {
            spec,
            word: word.to_string(),
            options,
            raw: pattern[start..raw_end].to_string(),
        });
        if let Some(tail) = tail {
            literal.push_str(tail);
        }
    }

    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    pieces
}

fn parse_spec(cursor: &mut Cursor<'_>) -> FormatSpec {
    let mut spec = FormatSpec::default();
    if cursor.eat('-') {
        spec.left_align = true;
    }
    if cursor.eat('0') {
        spec.zero_pad = true;
    }
    let min = cursor.eat_while(|c| c.is_ascii_digit());
    if !min.is_empty() {
        spec.min_width = min.parse().ok();
    }
    if cursor.peek() == Some('.') {
        let dot = cursor.pos;
        cursor.bump();
        let max = cursor.eat_while(|c| c.is_ascii_digit());
        if max.is_empty() {
            // a bare '.' belongs to the following text, not the spec
            cursor.pos = dot;
        } else {
            spec.max_width = max.parse().ok();
        }
    }
    spec
}

/// Consume a `{...}` group, tracking nested braces. Returns the group body,
/// or `None` (cursor left at end) if the group never closes.
fn parse_brace_group(cursor: &mut Cursor<'_>) -> Option<String> {
    debug_assert_eq!(cursor.peek(), Some('{'));
    cursor.bump();
    let start = cursor.pos;
    let mut depth = 1usize;
    while let Some(c) = cursor.bump() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(cursor.pattern[start..cursor.pos - 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(pattern: &str) -> (Vec<Piece>, Vec<String>) {
        let registry = ConverterRegistry::default();
        let mut diagnostics = Vec::new();
        let pieces = parse(pattern, &registry, &mut diagnostics);
        (pieces, diagnostics)
    }

    fn conversion(piece: &Piece) -> (&FormatSpec, &str, &[String]) {
        match piece {
            Piece::Conversion {
                spec,
                word,
                options,
                ..
            } => (spec, word.as_str(), options.as_slice()),
            Piece::Literal(text) => panic!("expected conversion, got literal {text:?}"),
        }
    }

    #[test]
    fn literal_only() {
        let (pieces, diagnostics) = scan("plain text");
        assert_eq!(pieces, vec![Piece::Literal("plain text".to_string())]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn escaped_percent() {
        let (pieces, diagnostics) = scan("100%% done");
        assert_eq!(pieces, vec![Piece::Literal("100% done".to_string())]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn flags_and_widths() {
        let (pieces, _) = scan("%-5p");
        let (spec, word, _) = conversion(&pieces[0]);
        assert_eq!(word, "p");
        assert!(spec.left_align);
        assert_eq!(spec.min_width, Some(5));

        let (pieces, _) = scan("%05L");
        let (spec, word, _) = conversion(&pieces[0]);
        assert_eq!(word, "L");
        assert!(spec.zero_pad);
        assert_eq!(spec.min_width, Some(5));

        let (pieces, _) = scan("%10.20m");
        let (spec, _, _) = conversion(&pieces[0]);
        assert_eq!(spec.min_width, Some(10));
        assert_eq!(spec.max_width, Some(20));
    }

    #[test]
    fn longest_word_wins() {
        let (pieces, _) = scan("%logger");
        let (_, word, _) = conversion(&pieces[0]);
        assert_eq!(word, "logger");
    }

    #[test]
    fn unmatched_word_tail_becomes_literal() {
        let (pieces, _) = scan("%pXY");
        let (_, word, _) = conversion(&pieces[0]);
        assert_eq!(word, "p");
        assert_eq!(pieces[1], Piece::Literal("XY".to_string()));
    }

    #[test]
    fn options_are_raw_groups() {
        let (pieces, _) = scan("%d{%H:%M}{UTC}");
        let (_, word, options) = conversion(&pieces[0]);
        assert_eq!(word, "d");
        assert_eq!(options, ["%H:%M", "UTC"]);
    }

    #[test]
    fn nested_braces_stay_in_one_group() {
        let (pieces, _) = scan("%upper{%d{ISO8601} %m}");
        let (_, word, options) = conversion(&pieces[0]);
        assert_eq!(word, "upper");
        assert_eq!(options, ["%d{ISO8601} %m"]);
    }

    #[test]
    fn unknown_word_falls_back_to_literal() {
        let (pieces, diagnostics) = scan("a %q b");
        assert_eq!(
            pieces,
            vec![Piece::Literal("a %q b".to_string())],
            "unknown conversion must round-trip as literal text"
        );
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn trailing_percent_is_literal() {
        let (pieces, diagnostics) = scan("oops %");
        assert_eq!(pieces, vec![Piece::Literal("oops %".to_string())]);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn unterminated_group_degrades_to_literal() {
        let (pieces, diagnostics) = scan("%d{ISO8601 %m");
        let (_, word, options) = conversion(&pieces[0]);
        assert_eq!(word, "d");
        assert!(options.is_empty());
        assert_eq!(pieces[1], Piece::Literal("{ISO8601 %m".to_string()));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn bare_dot_is_not_a_width() {
        let (pieces, _) = scan("%c.%m");
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[1], Piece::Literal(".".to_string()));
    }
}
