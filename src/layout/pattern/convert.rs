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

//! Converter nodes and the conversion-word registry.
//!
//! A compiled pattern is a [`Chain`] of steps. Each step is a literal, a
//! field extractor, or a decorator wrapping a nested chain; decorators render
//! their inner chain into the shared buffer and then post-process the region
//! it appended. Chains are immutable after construction and safe to share
//! across threads.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write;
use std::sync::OnceLock;
use std::time::Instant;

use jiff::Timestamp;
use jiff::tz::TimeZone;

#[cfg(feature = "colored")]
use colored::Color;
#[cfg(feature = "colored")]
use colored::Colorize;

use crate::Error;
use crate::Record;
#[cfg(feature = "colored")]
use crate::record::Level;

use super::parse::FormatSpec;
use super::parse::Piece;
use super::parse::parse;

type FieldFn = Box<dyn Fn(&Record, &mut String) + Send + Sync>;
type TransformFn = Box<dyn Fn(&Record, &mut String) + Send + Sync>;
type Factory = Box<dyn Fn(&mut FactoryContext<'_>) -> Result<Converter, Error> + Send + Sync>;

/// A single compiled converter node.
pub struct Converter {
    kind: Kind,
}

enum Kind {
    Literal(String),
    Field(FieldFn),
    Decorator { inner: Chain, transform: TransformFn },
}

impl Converter {
    /// A converter that emits fixed text.
    pub fn literal(text: impl Into<String>) -> Converter {
        Converter {
            kind: Kind::Literal(text.into()),
        }
    }

    /// A converter that extracts a record field into the output buffer.
    pub fn field(extract: impl Fn(&Record, &mut String) + Send + Sync + 'static) -> Converter {
        Converter {
            kind: Kind::Field(Box::new(extract)),
        }
    }

    /// A converter that renders a nested chain, then rewrites the text the
    /// chain appended.
    pub fn decorator(
        inner: Chain,
        transform: impl Fn(&Record, &mut String) + Send + Sync + 'static,
    ) -> Converter {
        Converter {
            kind: Kind::Decorator {
                inner,
                transform: Box::new(transform),
            },
        }
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Kind::Field(_) => f.write_str("Field"),
            Kind::Decorator { inner, .. } => f.debug_tuple("Decorator").field(inner).finish(),
        }
    }
}

pub(crate) struct Step {
    pub(crate) spec: FormatSpec,
    pub(crate) converter: Converter,
}

impl Step {
    pub(crate) fn plain(converter: Converter) -> Step {
        Step {
            spec: FormatSpec::default(),
            converter,
        }
    }
}

/// An ordered sequence of compiled converters.
pub struct Chain {
    steps: Vec<Step>,
}

impl Chain {
    pub(crate) fn new(steps: Vec<Step>) -> Chain {
        Chain { steps }
    }

    pub(crate) fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub(crate) fn render(&self, record: &Record, out: &mut String) {
        for step in &self.steps {
            let start = out.len();
            match &step.converter.kind {
                Kind::Literal(text) => {
                    out.push_str(text);
                    continue;
                }
                Kind::Field(extract) => extract(record, out),
                Kind::Decorator { inner, transform } => {
                    inner.render(record, out);
                    let mut region = out.split_off(start);
                    transform(record, &mut region);
                    out.push_str(&region);
                }
            }
            if !step.spec.is_plain() {
                apply_spec(&step.spec, out, start);
            }
        }
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(|step| &step.converter))
            .finish()
    }
}

/// Pad to the minimum width and truncate to the maximum width, in place, over
/// the region appended since `start`. Truncation drops leading characters and
/// keeps the tail.
fn apply_spec(spec: &FormatSpec, out: &mut String, start: usize) {
    if let Some(max) = spec.max_width {
        let length = out[start..].chars().count();
        if length > max {
            let cut = out[start..]
                .char_indices()
                .nth(length - max)
                .map_or(out.len() - start, |(idx, _)| idx);
            out.replace_range(start..start + cut, "");
        }
    }
    if let Some(min) = spec.min_width {
        let length = out[start..].chars().count();
        if length < min {
            let pad_char = if spec.zero_pad { '0' } else { ' ' };
            let padding: String = std::iter::repeat_n(pad_char, min - length).collect();
            if spec.left_align {
                out.push_str(&padding);
            } else {
                out.insert_str(start, &padding);
            }
        }
    }
}

/// The arguments handed to a conversion-word factory at pattern-compile time.
pub struct FactoryContext<'a> {
    word: &'a str,
    options: &'a [String],
    registry: &'a ConverterRegistry,
    diagnostics: &'a mut Vec<String>,
}

impl FactoryContext<'_> {
    /// The conversion word being compiled.
    pub fn word(&self) -> &str {
        self.word
    }

    /// The raw `{...}` option groups, in order.
    pub fn options(&self) -> &[String] {
        self.options
    }

    /// A single raw option group.
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    /// Option group `index` split on `,`/`;` and trimmed.
    pub fn list_option(&self, index: usize) -> Vec<String> {
        self.option(index)
            .map(|group| {
                group
                    .split([',', ';'])
                    .map(|item| item.trim().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Compile a nested pattern against the same registry. Used by decorator
    /// words whose option is itself a pattern.
    pub fn compile(&mut self, pattern: &str) -> Chain {
        compile_chain(pattern, self.registry, self.diagnostics)
    }
}

pub(crate) fn compile_chain(
    pattern: &str,
    registry: &ConverterRegistry,
    diagnostics: &mut Vec<String>,
) -> Chain {
    let pieces = parse(pattern, registry, diagnostics);
    build_chain(pieces, registry, diagnostics)
}

pub(crate) fn build_chain(
    pieces: Vec<Piece>,
    registry: &ConverterRegistry,
    diagnostics: &mut Vec<String>,
) -> Chain {
    let mut steps = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match piece {
            Piece::Literal(text) => steps.push(Step::plain(Converter::literal(text))),
            Piece::Conversion {
                spec,
                word,
                options,
                raw,
            } => match registry.build(&word, &options, diagnostics) {
                Ok(converter) => steps.push(Step { spec, converter }),
                Err(err) => {
                    diagnostics.push(format!("%{word}: {err}"));
                    steps.push(Step::plain(Converter::literal(raw)));
                }
            },
        }
    }
    Chain::new(steps)
}

/// The conversion-word table consulted by the pattern compiler.
///
/// [`ConverterRegistry::default`] carries the built-in words; custom words
/// register a factory closure and become available to every pattern compiled
/// against the registry, without touching the parser.
///
/// # Examples
///
/// ```
/// use logtree::layout::Converter;
/// use logtree::layout::ConverterRegistry;
/// use logtree::layout::PatternLayout;
///
/// let mut registry = ConverterRegistry::default();
/// registry
///     .register("pid", |_ctx| {
///         Ok(Converter::field(|_record, out| out.push_str("4242")))
///     })
///     .unwrap();
///
/// let layout = PatternLayout::with_registry("%pid %m", &registry);
/// ```
pub struct ConverterRegistry {
    words: HashMap<String, Factory>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words: Vec<&str> = self.words.keys().map(String::as_str).collect();
        words.sort_unstable();
        f.debug_struct("ConverterRegistry")
            .field("words", &words)
            .finish()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        let mut registry = ConverterRegistry::empty();
        registry.add_builtin_words();
        registry
    }
}

impl ConverterRegistry {
    /// A registry with no words at all.
    pub fn empty() -> Self {
        ConverterRegistry {
            words: HashMap::new(),
        }
    }

    /// Register a conversion word. Replaces any previous registration of the
    /// same word.
    ///
    /// # Errors
    ///
    /// Returns an error if the word is empty or not purely ASCII-alphabetic;
    /// the scanner would never match it.
    pub fn register(
        &mut self,
        word: impl Into<String>,
        factory: impl Fn(&mut FactoryContext<'_>) -> Result<Converter, Error> + Send + Sync + 'static,
    ) -> Result<(), Error> {
        let word = word.into();
        if word.is_empty() || !word.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(
                Error::new("conversion words must be non-empty ASCII-alphabetic")
                    .with_context("word", &word),
            );
        }
        self.words.insert(word, Box::new(factory));
        Ok(())
    }

    /// Longest registered prefix of an alphabetic run, as a byte length.
    pub(crate) fn resolve(&self, run: &str) -> Option<usize> {
        (1..=run.len())
            .rev()
            .find(|&len| self.words.contains_key(&run[..len]))
    }

    pub(crate) fn build(
        &self,
        word: &str,
        options: &[String],
        diagnostics: &mut Vec<String>,
    ) -> Result<Converter, Error> {
        let factory = self
            .words
            .get(word)
            .ok_or_else(|| Error::new("unregistered conversion word"))?;
        let mut ctx = FactoryContext {
            word,
            options,
            registry: self,
            diagnostics,
        };
        factory(&mut ctx)
    }

    fn add(
        &mut self,
        words: &[&str],
        factory: impl Fn(&mut FactoryContext<'_>) -> Result<Converter, Error>
        + Send
        + Sync
        + Clone
        + 'static,
    ) {
        for word in words {
            self.words.insert(word.to_string(), Box::new(factory.clone()));
        }
    }

    fn add_builtin_words(&mut self) {
        self.add(&["p", "level"], level_word);
        self.add(&["m", "msg", "message"], message_word);
        self.add(&["c", "logger"], logger_word);
        self.add(&["t", "thread"], thread_word);
        self.add(&["d", "date"], date_word);
        self.add(&["X", "mdc"], mdc_word);
        self.add(&["x", "ndc"], ndc_word);
        self.add(&["F", "file"], file_word);
        self.add(&["L", "line"], line_word);
        self.add(&["r", "relative"], relative_word);
        self.add(&["sn", "sequence"], sequence_word);
        self.add(&["ex", "exception"], exception_word);
        self.add(&["n"], newline_word);
        self.add(&["upper"], upper_word);
        self.add(&["lower"], lower_word);
        #[cfg(feature = "colored")]
        {
            self.add(&["highlight"], highlight_word);
            self.add(&["style"], style_word);
        }
    }
}

/// Conversion words whose presence in a pattern means the layout already
/// renders the record's error chain.
pub(crate) const EXCEPTION_WORDS: [&str; 2] = ["ex", "exception"];

pub(crate) fn render_error_chain(record: &Record, out: &mut String) {
    for (depth, cause) in record.error_chain().iter().enumerate() {
        if depth > 0 {
            out.push_str("\ncaused by: ");
        }
        out.push_str(cause);
    }
}

fn level_word(_ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    Ok(Converter::field(|record, out| {
        out.push_str(record.level().as_str())
    }))
}

fn message_word(_ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    Ok(Converter::field(|record, out| {
        out.push_str(record.payload())
    }))
}

fn logger_word(ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    let precision = match ctx.option(0) {
        None => None,
        Some(option) => Some(option.trim().parse::<usize>().map_err(|err| {
            Error::new("malformed logger precision")
                .with_context("option", option)
                .with_source(err)
        })?),
    };
    Ok(Converter::field(move |record, out| {
        let name = record.logger();
        match precision {
            None | Some(0) => out.push_str(name),
            Some(keep) => out.push_str(trailing_segments(name, keep)),
        }
    }))
}

/// The last `keep` dot-separated segments of a logger name.
fn trailing_segments(name: &str, keep: usize) -> &str {
    let mut seen = 0;
    for (idx, _) in name.rmatch_indices('.') {
        seen += 1;
        if seen == keep {
            return &name[idx + 1..];
        }
    }
    name
}

fn thread_word(_ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    Ok(Converter::field(|record, out| {
        out.push_str(record.thread())
    }))
}

enum DateFormat {
    Iso8601,
    UnixMillis,
    Custom(String),
}

fn date_word(ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    let format = match ctx.option(0) {
        None => DateFormat::Iso8601,
        Some(option) if option.eq_ignore_ascii_case("ISO8601") => DateFormat::Iso8601,
        Some(option) if option.eq_ignore_ascii_case("UNIX") => DateFormat::UnixMillis,
        Some(option) => DateFormat::Custom(option.to_string()),
    };
    let tz = match ctx.option(1) {
        None => TimeZone::system(),
        Some(name) => TimeZone::get(name).map_err(|err| {
            Error::new("unknown timezone")
                .with_context("timezone", name)
                .with_source(err)
        })?,
    };

    if let DateFormat::Custom(format) = &format {
        // probe once so a bad strftime string fails at compile time, not on
        // every event
        let probe = Timestamp::UNIX_EPOCH.to_zoned(tz.clone());
        let mut buffer = String::new();
        write!(buffer, "{}", probe.strftime(format)).map_err(|_| {
            Error::new("malformed date format").with_context("format", format)
        })?;
    }

    Ok(Converter::field(move |record, out| {
        let zoned = record.timestamp().to_zoned(tz.clone());
        match &format {
            DateFormat::Iso8601 => {
                let _ = write!(out, "{}", zoned.strftime("%Y-%m-%dT%H:%M:%S.%3f%:z"));
            }
            DateFormat::UnixMillis => {
                let _ = write!(out, "{}", record.timestamp().as_millisecond());
            }
            DateFormat::Custom(format) => {
                let _ = write!(out, "{}", zoned.strftime(format));
            }
        }
    }))
}

fn mdc_word(ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    match ctx.option(0) {
        Some(key) => {
            let key = key.to_string();
            Ok(Converter::field(move |record, out| {
                if let Some(value) = record.mdc_value(&key) {
                    out.push_str(value);
                }
            }))
        }
        None => Ok(Converter::field(|record, out| {
            out.push('{');
            for (idx, (key, value)) in record.mdc().iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{key}={value}");
            }
            out.push('}');
        })),
    }
}

fn ndc_word(_ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    Ok(Converter::field(|record, out| {
        for (idx, entry) in record.ndc().iter().enumerate() {
            if idx > 0 {
                out.push(' ');
            }
            out.push_str(entry);
        }
    }))
}

fn file_word(_ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    Ok(Converter::field(|record, out| {
        out.push_str(record.file().unwrap_or_default())
    }))
}

fn line_word(_ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    Ok(Converter::field(|record, out| {
        if let Some(line) = record.line() {
            let _ = write!(out, "{line}");
        }
    }))
}

static START: OnceLock<Instant> = OnceLock::new();

fn relative_word(_ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    let start = *START.get_or_init(Instant::now);
    Ok(Converter::field(move |_record, out| {
        let _ = write!(out, "{}", start.elapsed().as_millis());
    }))
}

fn sequence_word(_ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    Ok(Converter::field(|record, out| {
        let _ = write!(out, "{}", record.sequence());
    }))
}

fn exception_word(_ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    Ok(Converter::field(|record, out| {
        render_error_chain(record, out)
    }))
}

fn newline_word(_ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    Ok(Converter::literal("\n"))
}

fn nested_pattern(ctx: &mut FactoryContext<'_>) -> Result<Chain, Error> {
    let pattern = ctx
        .option(0)
        .ok_or_else(|| Error::new("decorator takes a {pattern} option"))?
        .to_string();
    Ok(ctx.compile(&pattern))
}

fn upper_word(ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    let inner = nested_pattern(ctx)?;
    Ok(Converter::decorator(inner, |_record, region| {
        *region = region.to_uppercase();
    }))
}

fn lower_word(ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    let inner = nested_pattern(ctx)?;
    Ok(Converter::decorator(inner, |_record, region| {
        *region = region.to_lowercase();
    }))
}

#[cfg(feature = "colored")]
fn level_color(level: Level) -> Color {
    match level {
        Level::Fatal => Color::BrightRed,
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Blue,
        Level::Trace => Color::Magenta,
    }
}

#[cfg(feature = "colored")]
fn highlight_word(ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    let inner = nested_pattern(ctx)?;
    Ok(Converter::decorator(inner, |record, region| {
        *region = region
            .as_str()
            .color(level_color(record.level()))
            .to_string();
    }))
}

#[cfg(feature = "colored")]
fn style_word(ctx: &mut FactoryContext<'_>) -> Result<Converter, Error> {
    let inner = nested_pattern(ctx)?;
    let color = Color::from(
        ctx.option(1)
            .ok_or_else(|| Error::new("style takes a {pattern}{color} option pair"))?,
    );
    Ok(Converter::decorator(inner, move |_record, region| {
        *region = region.as_str().color(color).to_string();
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_segments_keep_the_tail() {
        assert_eq!(trailing_segments("a.b.c.d.e", 1), "e");
        assert_eq!(trailing_segments("a.b.c.d.e", 3), "c.d.e");
        assert_eq!(trailing_segments("a.b.c.d.e", 9), "a.b.c.d.e");
        assert_eq!(trailing_segments("single", 1), "single");
    }

    #[test]
    fn apply_spec_pads_and_truncates() {
        let pad = |spec: FormatSpec, text: &str| {
            let mut out = String::from("|");
            out.push_str(text);
            apply_spec(&spec, &mut out, 1);
            out
        };

        let mut spec = FormatSpec::default();
        spec.min_width = Some(5);
        assert_eq!(pad(spec, "abc"), "|  abc");

        spec.left_align = true;
        assert_eq!(pad(spec, "abc"), "|abc  ");

        spec.left_align = false;
        spec.zero_pad = true;
        assert_eq!(pad(spec, "42"), "|00042");

        let mut spec = FormatSpec::default();
        spec.max_width = Some(5);
        assert_eq!(pad(spec, "a.b.c.d.e"), "|c.d.e");
    }

    #[test]
    fn longest_registered_word_resolves() {
        let registry = ConverterRegistry::default();
        assert_eq!(registry.resolve("logger"), Some(6));
        assert_eq!(registry.resolve("loggerx"), Some(6));
        assert_eq!(registry.resolve("lx"), None);
        assert_eq!(registry.resolve("sn"), Some(2));
    }

    #[test]
    fn register_rejects_invalid_words() {
        let mut registry = ConverterRegistry::empty();
        assert!(registry.register("", |_| Ok(Converter::literal(""))).is_err());
        assert!(
            registry
                .register("no-dash", |_| Ok(Converter::literal("")))
                .is_err()
        );
        assert!(registry.register("ok", |_| Ok(Converter::literal(""))).is_ok());
    }
}
