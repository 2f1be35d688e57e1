//! Per-transform source-map chain.
//!
//! A `transform` hook may return a map as `null`, the empty sentinel
//! `{"mappings": ""}`, or a real v3 source map. The chain collapses on
//! demand into a single map tracing the final code back to the original.

use serde_json::Value;
use sourcemap::{SourceMap, SourceMapBuilder};

/// One entry pushed onto the chain by a `transform` hook result.
#[derive(Debug, Clone)]
pub enum MapEntry {
    /// `{mappings: ""}` — deliberately empty, distinct from `null`.
    Sentinel,
    Null,
    Json(Value),
}

/// The collapsed result of a chain: either a real map, the sentinel, or
/// nothing to collapse yet.
#[derive(Debug, Clone)]
pub enum CombinedMap {
    Sentinel,
    Null,
    Map(SourceMap),
}

pub struct SourceMapChain {
    filename: String,
    original_code: String,
    entries: Vec<MapEntry>,
}

impl SourceMapChain {
    #[must_use]
    pub fn new(filename: impl Into<String>, original_code: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            original_code: original_code.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: MapEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collapse the chain into a single map and clear it.
    #[must_use]
    pub fn collapse(&mut self) -> CombinedMap {
        let entries = std::mem::take(&mut self.entries);
        self.combine_entries(&entries)
    }

    /// Same computation as [`Self::collapse`] without consuming the chain.
    /// Used by error-location remapping, which must not disturb the chain
    /// the final `transform` return value still needs.
    #[must_use]
    pub fn peek_combined(&self) -> CombinedMap {
        self.combine_entries(&self.entries)
    }

    fn combine_entries(&self, entries: &[MapEntry]) -> CombinedMap {
        // Sentinel/null short-circuit: any member forces the whole chain to
        // that outcome.
        if entries.iter().any(|e| matches!(e, MapEntry::Sentinel)) {
            return CombinedMap::Sentinel;
        }
        if entries.iter().any(|e| matches!(e, MapEntry::Null)) {
            return CombinedMap::Null;
        }

        let mut combined: Option<SourceMap> = None;
        for entry in entries {
            let MapEntry::Json(value) = entry else {
                unreachable!("sentinel/null handled above")
            };
            let parsed = match self.parse_and_rewrite(value) {
                Some(map) => map,
                None => continue,
            };
            combined = Some(match combined {
                None => parsed,
                Some(lower) => compose(&parsed, &lower),
            });
        }

        match combined {
            Some(map) => CombinedMap::Map(map),
            None => CombinedMap::Null,
        }
    }

    /// Parse a plugin-returned map, rewriting the `sources: [""]` /
    /// `sources: [null]` special case to point at `self.filename` with
    /// `sourcesContent` set to `self.original_code`.
    fn parse_and_rewrite(&self, value: &Value) -> Option<SourceMap> {
        let mut value = value.clone();
        if let Some(obj) = value.as_object_mut() {
            let needs_rewrite = obj
                .get("sources")
                .and_then(Value::as_array)
                .is_some_and(|sources| {
                    sources.len() == 1
                        && matches!(sources[0], Value::Null)
                            .then_some(())
                            .or_else(|| {
                                sources[0].as_str().filter(|s| s.is_empty()).map(|_| ())
                            })
                            .is_some()
                });

            if needs_rewrite {
                obj.insert(
                    "sources".into(),
                    Value::Array(vec![Value::String(self.filename.clone())]),
                );
                obj.insert(
                    "sourcesContent".into(),
                    Value::Array(vec![Value::String(self.original_code.clone())]),
                );
            }
        }

        let bytes = serde_json::to_vec(&value).ok()?;
        SourceMap::from_slice(&bytes).ok()
    }

    /// Always returns a real map, synthesizing an identity map from the
    /// original code when the chain has collapsed to nothing meaningful.
    /// Backs `TransformContext::get_combined_sourcemap`.
    #[must_use]
    pub fn get_combined_sourcemap(&mut self) -> SourceMap {
        match self.collapse() {
            CombinedMap::Map(map) => map,
            CombinedMap::Sentinel | CombinedMap::Null => {
                identity_map(&self.filename, &self.original_code)
            }
        }
    }
}

/// Compose `upper` (finalcode -> intermediate) with `lower`
/// (intermediate -> original) into a single finalcode -> original map.
fn compose(upper: &SourceMap, lower: &SourceMap) -> SourceMap {
    let mut builder = SourceMapBuilder::new(None);

    for token in upper.tokens() {
        let src_line = token.get_src_line();
        let src_col = token.get_src_col();

        if let Some(original) = lower.lookup_token(src_line, src_col) {
            let src_id = builder.add_source(original.get_source().unwrap_or(""));
            if let Some(content) = original.get_source_view().map(|v| v.source()) {
                builder.set_source_contents(src_id, Some(content));
            }
            builder.add_raw(
                token.get_dst_line(),
                token.get_dst_col(),
                original.get_src_line(),
                original.get_src_col(),
                Some(src_id),
                none_if_sentinel(original.get_name_id()),
                false,
            );
        } else if let Some(source) = token.get_source() {
            let src_id = builder.add_source(source);
            builder.add_raw(
                token.get_dst_line(),
                token.get_dst_col(),
                src_line,
                src_col,
                Some(src_id),
                none_if_sentinel(token.get_name_id()),
                false,
            );
        }
    }

    builder.into_sourcemap()
}

/// `sourcemap`'s raw token ids use `u32::MAX` as a "no id" sentinel.
fn none_if_sentinel(id: u32) -> Option<u32> {
    if id == u32::MAX { None } else { Some(id) }
}

/// High-resolution identity map: every line/column of `code` maps to the
/// same line/column of `filename`, with source content embedded.
fn identity_map(filename: &str, code: &str) -> SourceMap {
    let mut builder = SourceMapBuilder::new(None);
    let src_id = builder.add_source(filename);
    builder.set_source_contents(src_id, Some(code));

    for (line_idx, line) in code.lines().enumerate() {
        for col in 0..=line.len() {
            builder.add_raw(line_idx as u32, col as u32, line_idx as u32, col as u32, Some(src_id), None, false);
        }
    }

    builder.into_sourcemap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentinel_short_circuits() {
        let mut chain = SourceMapChain::new("/f.js", "X");
        chain.push(MapEntry::Null);
        chain.push(MapEntry::Sentinel);
        assert!(matches!(chain.collapse(), CombinedMap::Sentinel));
    }

    #[test]
    fn null_short_circuits_without_sentinel() {
        let mut chain = SourceMapChain::new("/f.js", "X");
        chain.push(MapEntry::Null);
        assert!(matches!(chain.collapse(), CombinedMap::Null));
    }

    #[test]
    fn chain_emptied_after_collapse() {
        let mut chain = SourceMapChain::new("/f.js", "X");
        chain.push(MapEntry::Null);
        chain.collapse();
        assert!(chain.is_empty());
    }

    #[test]
    fn rewrites_empty_sources_to_filename() {
        let mut chain = SourceMapChain::new("/f.js", "X");
        chain.push(MapEntry::Json(json!({
            "version": 3,
            "sources": [""],
            "names": [],
            "mappings": "AAAA"
        })));
        let combined = chain.collapse();
        let CombinedMap::Map(map) = combined else {
            panic!("expected a real map")
        };
        let sources: Vec<_> = map.sources().collect();
        assert_eq!(sources, vec!["/f.js"]);
    }

    #[test]
    fn identity_map_is_non_empty_for_nonempty_code() {
        let map = identity_map("/f.js", "const x = 1;");
        assert!(map.tokens().count() > 0);
    }
}
