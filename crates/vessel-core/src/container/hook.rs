//! Stable ordering of plugins per hook.

/// Where a hook handler sits relative to the default tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookOrder {
    Pre,
    #[default]
    Default,
    Post,
}

/// A hook field is either a bare handler or `{handler, order, sequential}`.
/// `sequential` only matters for the parallel hooks (`buildStart`,
/// `buildEnd`, `watchChange`, `closeBundle`); it is ignored elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct HookMeta {
    pub order: HookOrder,
    pub sequential: bool,
}

/// Stable sort of `(plugin index, meta)` pairs into `[pre..., default..., post...]`,
/// preserving input order within each tier.
#[must_use]
pub fn sort_plugins_for_hook(entries: &[(usize, HookMeta)]) -> Vec<usize> {
    let mut pre = Vec::new();
    let mut default = Vec::new();
    let mut post = Vec::new();

    for &(idx, meta) in entries {
        match meta.order {
            HookOrder::Pre => pre.push(idx),
            HookOrder::Default => default.push(idx),
            HookOrder::Post => post.push(idx),
        }
    }

    pre.into_iter().chain(default).chain(post).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(order: HookOrder) -> HookMeta {
        HookMeta {
            order,
            sequential: false,
        }
    }

    #[test]
    fn pre_before_default_before_post() {
        let entries = vec![
            (0, meta(HookOrder::Post)),
            (1, meta(HookOrder::Default)),
            (2, meta(HookOrder::Pre)),
            (3, meta(HookOrder::Default)),
            (4, meta(HookOrder::Pre)),
        ];
        assert_eq!(sort_plugins_for_hook(&entries), vec![2, 4, 1, 3, 0]);
    }

    #[test]
    fn preserves_input_order_within_tier() {
        let entries = vec![
            (0, meta(HookOrder::Default)),
            (1, meta(HookOrder::Default)),
            (2, meta(HookOrder::Default)),
        ];
        assert_eq!(sort_plugins_for_hook(&entries), vec![0, 1, 2]);
    }
}
