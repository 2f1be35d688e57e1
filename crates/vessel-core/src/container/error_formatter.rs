//! Plugin error enrichment: attribution, code frames, and source-map
//! trace-back applied to a raw hook failure before it reaches the caller.

use std::fmt;

/// Number of source lines shown above/below the error line in a frame.
const FRAME_CONTEXT_LINES: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loc {
    pub file: Option<String>,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl Loc {
    fn is_empty(&self) -> bool {
        self.file.is_none() && self.line.is_none() && self.column.is_none()
    }
}

/// Where to find a position in a raw, not-yet-enriched error.
#[derive(Debug, Clone, Copy)]
pub enum ErrorPos {
    /// Byte offset into `activeCode`.
    Offset(usize),
    LineColumn { line: usize, column: usize },
}

/// An error as it looks before the container has touched it: a plugin
/// threw, or returned `Err(...)`, without going through `this.error`.
#[derive(Debug, Clone)]
pub struct RawHookError {
    pub message: String,
    pub pos: Option<ErrorPos>,
    /// A pre-existing `loc` on the error (rare; mirrors `err.loc`).
    pub loc: Option<Loc>,
}

impl RawHookError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            pos: None,
            loc: None,
        }
    }

    #[must_use]
    pub fn at_offset(mut self, offset: usize) -> Self {
        self.pos = Some(ErrorPos::Offset(offset));
        self
    }

    #[must_use]
    pub fn at_line_column(mut self, line: usize, column: usize) -> Self {
        self.pos = Some(ErrorPos::LineColumn { line, column });
        self
    }
}

/// A fully enriched plugin error: attribution, location, and an optional
/// rendered code frame.
#[derive(Debug, Clone)]
pub struct PluginError {
    pub plugin: String,
    pub hook: &'static str,
    pub id: Option<String>,
    pub plugin_code: Option<String>,
    pub loc: Option<Loc>,
    pub frame: Option<String>,
    pub message: String,
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[plugin {}] {}", self.plugin, self.message)?;
        if let Some(loc) = &self.loc {
            if let (Some(line), Some(col)) = (loc.line, loc.column) {
                write!(f, " ({line}:{col})")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for PluginError {}

/// Either a raw, unformatted error coming out of a hook, or one the plugin
/// already formatted itself via `this.error`.
#[derive(Debug, Clone)]
pub enum HookError {
    Raw(RawHookError),
    Formatted(Box<PluginError>),
}

impl From<PluginError> for HookError {
    fn from(err: PluginError) -> Self {
        Self::Formatted(Box::new(err))
    }
}

/// What `ErrorFormatter` needs to know about the hook invocation that
/// produced the error. Implemented by `PluginContext` (no remap) and
/// `TransformContext` (remaps through the accumulated source-map chain).
pub trait ActiveContext {
    fn active_plugin_name(&self) -> Option<&str>;
    fn active_id(&self) -> Option<&str>;
    fn active_code(&self) -> Option<&str>;
    fn hook(&self) -> &'static str;

    /// Only `TransformContext` overrides this.
    fn remap_via_sourcemap(&mut self, _loc: &Loc) -> Option<Loc> {
        None
    }
}

pub struct ErrorFormatter;

impl ErrorFormatter {
    /// Enrich `err` in the context of `ctx`, returning a [`PluginError`].
    pub fn format<C: ActiveContext>(err: HookError, ctx: &mut C) -> PluginError {
        // Already formatted via `this.error` — return unchanged.
        let raw = match err {
            HookError::Formatted(plugin_err) => return *plugin_err,
            HookError::Raw(raw) => raw,
        };

        // Attach attribution.
        let plugin = ctx.active_plugin_name().unwrap_or("unknown").to_string();
        let id = ctx.active_id().map(ToOwned::to_owned);
        let plugin_code = ctx.active_code().map(ToOwned::to_owned);

        // Compute location.
        let mut loc = match raw.pos {
            Some(ErrorPos::Offset(offset)) => match ctx.active_code() {
                Some(code) => match byte_offset_to_line_col(code, offset) {
                    Some((line, column)) => Some(Loc {
                        file: id.clone(),
                        line: Some(line),
                        column: Some(column),
                    }),
                    None => {
                        tracing::error!(
                            plugin = %plugin,
                            offset,
                            "failed to translate byte offset to line/column"
                        );
                        None
                    }
                },
                None => {
                    tracing::error!(plugin = %plugin, "no active code to translate offset against");
                    None
                }
            },
            Some(ErrorPos::LineColumn { line, column }) => Some(Loc {
                file: id.clone(),
                line: Some(line),
                column: Some(column),
            }),
            None => raw.loc.clone(),
        };

        let mut frame = None;
        if let Some(l) = &loc {
            if let (Some(line), Some(_column)) = (l.line, l.column) {
                if let Some(code) = plugin_code.as_deref() {
                    frame = code_frame(code, line, l.column.unwrap_or(0));
                }
            }
        }

        // Remap through the transform's accumulated source map, if any.
        if let Some(current) = &loc {
            if current.line.is_some() && current.column.is_some() {
                if let Some(remapped) = ctx.remap_via_sourcemap(current) {
                    loc = Some(remapped);
                }
            }
        }

        // Scrub an empty loc rather than carry a struct of all-`None`s.
        if loc.as_ref().is_some_and(Loc::is_empty) {
            loc = None;
        }

        PluginError {
            plugin,
            hook: ctx.hook(),
            id,
            plugin_code,
            loc,
            frame,
            message: raw.message,
        }
    }
}

/// Translate a byte offset into `(line, column)`, 1-based line, 0-based
/// column measured from the start of that line.
#[must_use]
pub fn byte_offset_to_line_col(source: &str, offset: usize) -> Option<(usize, usize)> {
    if offset > source.len() {
        return None;
    }

    let mut line = 1usize;
    let mut line_start = 0usize;

    for (idx, byte) in source.bytes().enumerate() {
        if idx == offset {
            break;
        }
        if byte == b'\n' {
            line += 1;
            line_start = idx + 1;
        }
    }

    Some((line, offset - line_start))
}

/// Render a fixed-context-window code frame around `line` (1-based),
/// caret-pointing at `column` (0-based).
#[must_use]
pub fn code_frame(source: &str, line: usize, column: usize) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    if line == 0 || line > lines.len() {
        return None;
    }

    let idx = line - 1;
    let start = idx.saturating_sub(FRAME_CONTEXT_LINES);
    let end = (idx + FRAME_CONTEXT_LINES + 1).min(lines.len());

    let gutter_width = end.to_string().len();
    let mut out = String::new();
    for (i, text) in lines.iter().enumerate().take(end).skip(start) {
        let marker = if i == idx { '>' } else { ' ' };
        out.push_str(&format!("{marker} {:>gutter_width$} | {text}\n", i + 1));
        if i == idx {
            out.push_str(&" ".repeat(gutter_width + 4 + column));
            out.push_str("^\n");
        }
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeCtx {
        plugin: &'static str,
        id: Option<String>,
        code: Option<String>,
        hook: &'static str,
    }

    impl ActiveContext for FakeCtx {
        fn active_plugin_name(&self) -> Option<&str> {
            Some(self.plugin)
        }
        fn active_id(&self) -> Option<&str> {
            self.id.as_deref()
        }
        fn active_code(&self) -> Option<&str> {
            self.code.as_deref()
        }
        fn hook(&self) -> &'static str {
            self.hook
        }
    }

    #[test]
    fn byte_offset_translation_matches_expected_convention() {
        // pos: 3 on "abcdef" -> line 1, column 3 (0-based, no +1).
        assert_eq!(byte_offset_to_line_col("abcdef", 3), Some((1, 3)));
    }

    #[test]
    fn byte_offset_across_lines() {
        assert_eq!(byte_offset_to_line_col("ab\ncd", 4), Some((2, 1)));
    }

    #[test]
    fn transform_error_carries_plugin_attribution_and_frame() {
        let mut ctx = FakeCtx {
            plugin: "p1",
            id: Some("/x.js".into()),
            code: Some("abcdef".into()),
            hook: "transform",
        };
        let raw = HookError::Raw(RawHookError::new("boom").at_offset(3));
        let enriched = ErrorFormatter::format(raw, &mut ctx);

        assert_eq!(enriched.plugin, "p1");
        assert_eq!(enriched.id.as_deref(), Some("/x.js"));
        assert_eq!(enriched.plugin_code.as_deref(), Some("abcdef"));
        let loc = enriched.loc.expect("loc should be set");
        assert_eq!(loc.line, Some(1));
        assert_eq!(loc.column, Some(3));
        assert!(enriched.frame.is_some());
    }

    #[test]
    fn already_formatted_errors_pass_through_unchanged() {
        let mut ctx = FakeCtx {
            plugin: "other",
            id: None,
            code: None,
            hook: "load",
        };
        let pre_formatted = PluginError {
            plugin: "p1".into(),
            hook: "transform",
            id: Some("/x.js".into()),
            plugin_code: Some("abcdef".into()),
            loc: None,
            frame: None,
            message: "boom".into(),
        };
        let formatted = ErrorFormatter::format(pre_formatted.clone().into(), &mut ctx);
        assert_eq!(formatted.plugin, "p1");
        assert_eq!(formatted.hook, "transform");
    }

    #[test]
    fn empty_loc_is_scrubbed() {
        let mut ctx = FakeCtx {
            plugin: "p1",
            id: None,
            code: None,
            hook: "load",
        };
        let raw = HookError::Raw(RawHookError::new("boom"));
        let enriched = ErrorFormatter::format(raw, &mut ctx);
        assert!(enriched.loc.is_none());
    }
}
