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

//! The pattern layout: a conversion-pattern mini-language compiled once and
//! interpreted per event.

use std::fmt;

use crate::Error;
use crate::Record;
use crate::layout::Layout;

mod convert;
mod parse;

pub use self::convert::Chain;
pub use self::convert::Converter;
pub use self::convert::ConverterRegistry;
pub use self::convert::FactoryContext;

use self::convert::EXCEPTION_WORDS;
use self::convert::Step;
use self::convert::build_chain;
use self::convert::render_error_chain;
use self::parse::Piece;
use self::parse::parse;

/// A layout driven by a conversion-pattern string.
///
/// The pattern is compiled once at construction; formatting an event walks
/// the compiled converter chain, appending to a single output buffer.
/// Compilation never fails: unknown words, malformed widths, and bad options
/// degrade to literal output and are reported through
/// [`diagnostics`](PatternLayout::diagnostics).
///
/// ```
/// use logtree::layout::PatternLayout;
///
/// let layout = PatternLayout::new("%d{ISO8601} %-5p [%t] %c{2} - %m");
/// assert!(layout.diagnostics().is_empty());
/// ```
///
/// # Conversion words
///
/// | word | output |
/// |---|---|
/// | `%p`, `%level` | level name |
/// | `%c`, `%logger` | logger name; `{n}` keeps the last `n` dotted segments |
/// | `%m`, `%msg`, `%message` | the message |
/// | `%d`, `%date` | timestamp; `{ISO8601}` (default), `{UNIX}`, or a strftime string, with an optional `{timezone}` group |
/// | `%t`, `%thread` | thread name |
/// | `%X`, `%mdc` | one MDC value with `{key}`, the whole map without |
/// | `%x`, `%ndc` | the NDC stack, space-separated |
/// | `%F`, `%file` / `%L`, `%line` | call site |
/// | `%r`, `%relative` | milliseconds since the pattern engine first ran |
/// | `%sn`, `%sequence` | event sequence number |
/// | `%ex`, `%exception` | error cause chain |
/// | `%n` | newline |
/// | `%upper{...}`, `%lower{...}` | decorate a nested pattern |
/// | `%highlight{...}`, `%style{...}{color}` | colored decorators (`colored` feature) |
///
/// A `-` flag right-pads, `0` zero-pads, a number sets the minimum width, and
/// `.n` truncates to `n` characters keeping the tail, so `%.5c` renders
/// `a.b.c.d.e` as `c.d.e`.
///
/// If the pattern contains no exception word, the error chain is appended
/// after the rendered line.
pub struct PatternLayout {
    pattern: String,
    chain: Chain,
    diagnostics: Vec<String>,
}

impl PatternLayout {
    /// Compile a pattern against the built-in conversion words.
    pub fn new(pattern: impl Into<String>) -> PatternLayout {
        PatternLayout::with_registry(pattern, &ConverterRegistry::default())
    }

    /// Compile a pattern against a custom [`ConverterRegistry`].
    pub fn with_registry(pattern: impl Into<String>, registry: &ConverterRegistry) -> PatternLayout {
        let pattern = pattern.into();
        let mut diagnostics = Vec::new();
        let pieces = parse(&pattern, registry, &mut diagnostics);
        let renders_errors = pieces.iter().any(|piece| match piece {
            Piece::Conversion { word, .. } => EXCEPTION_WORDS.contains(&word.as_str()),
            Piece::Literal(_) => false,
        });
        let mut chain = build_chain(pieces, registry, &mut diagnostics);
        if !renders_errors {
            chain.push(Step::plain(Converter::field(|record, out| {
                if !record.error_chain().is_empty() {
                    out.push('\n');
                    render_error_chain(record, out);
                }
            })));
        }
        PatternLayout {
            pattern,
            chain,
            diagnostics,
        }
    }

    /// The source pattern string.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Problems found while compiling the pattern. The layout still works;
    /// offending parts render as literal text.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }
}

impl Default for PatternLayout {
    /// The conventional line format: `%d %-5p [%t] %c - %m`.
    fn default() -> Self {
        PatternLayout::new("%d %-5p [%t] %c - %m")
    }
}

impl fmt::Debug for PatternLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternLayout")
            .field("pattern", &self.pattern)
            .finish()
    }
}

impl Layout for PatternLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let mut out = String::with_capacity(self.pattern.len() + 64);
        self.chain.render(record, &mut out);
        Ok(out.into_bytes())
    }
}
