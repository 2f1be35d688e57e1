//! Guarded, read-only view of a module node exposed to plugins.
//!
//! Rollup/Vite expose this via a reflective proxy that fails loudly on
//! unsupported keys, except `then` (kept non-thenable so an accidental
//! `await` doesn't hang). Rust has no thenable concept, so that half of the
//! guard doesn't apply here; the rest — fail loudly on an unsupported key —
//! is modeled as a closed enum plus an explicit accessor rather than
//! reflection.

use std::collections::HashMap;
use serde_json::Value;

use crate::container::module_graph::ModuleNode;

/// The keys a `ModuleInfo` view supports. Anything else is a deliberate
/// `None` from [`ModuleInfo::get`] rather than a panic — plugins run
/// untrusted, best-effort code, so "fail loudly" here means "return an
/// explicit absence", not "crash the host".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleInfoKey {
    Id,
    File,
    IsSelfAccepting,
    Importers,
    Meta,
}

#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub id: String,
    pub file: Option<String>,
    pub is_self_accepting: bool,
    pub importers: Vec<String>,
    pub meta: HashMap<String, Value>,
}

impl ModuleInfo {
    #[must_use]
    pub fn from_node(id: &str, node: &ModuleNode) -> Self {
        Self {
            id: id.to_string(),
            file: node.file.clone(),
            is_self_accepting: node.is_self_accepting,
            importers: node.importers.iter().cloned().collect(),
            meta: node.meta.clone(),
        }
    }

    /// Explicit, closed accessor standing in for the original's reflective
    /// property guard.
    #[must_use]
    pub fn get(&self, key: ModuleInfoKey) -> Value {
        match key {
            ModuleInfoKey::Id => Value::String(self.id.clone()),
            ModuleInfoKey::File => self.file.clone().map_or(Value::Null, Value::String),
            ModuleInfoKey::IsSelfAccepting => Value::Bool(self.is_self_accepting),
            ModuleInfoKey::Importers => {
                Value::Array(self.importers.iter().cloned().map(Value::String).collect())
            }
            ModuleInfoKey::Meta => {
                Value::Object(self.meta.clone().into_iter().collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_node_copies_fields() {
        let mut node = ModuleNode::new("/a.js");
        node.is_self_accepting = true;
        node.importers.insert("/b.js".into());

        let info = ModuleInfo::from_node("/a.js", &node);
        assert_eq!(info.id, "/a.js");
        assert!(info.is_self_accepting);
        assert_eq!(info.importers, vec!["/b.js".to_string()]);
    }

    #[test]
    fn get_returns_explicit_values_for_supported_keys() {
        let node = ModuleNode::new("/a.js");
        let info = ModuleInfo::from_node("/a.js", &node);
        assert_eq!(info.get(ModuleInfoKey::Id), Value::String("/a.js".into()));
    }
}
