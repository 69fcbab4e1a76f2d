//! A single path-trie permission set: the exact and descendant trees, plus
//! their conditional counterparts.

use std::collections::BTreeMap;

use crate::error::ParseError;
use crate::path::{self, parse_line};
use crate::permission::{Condition, Permission};

#[derive(Default, Clone)]
struct TrieNode {
    value: Option<Permission>,
    children: BTreeMap<String, TrieNode>,
}

impl TrieNode {
    fn node_at(&self, path: &[String]) -> Option<&TrieNode> {
        let mut node = self;
        for seg in path {
            node = node.children.get(seg)?;
        }
        Some(node)
    }

    fn node_at_mut(&mut self, path: &[String]) -> &mut TrieNode {
        let mut node = self;
        for seg in path {
            node = node.children.entry(seg.clone()).or_default();
        }
        node
    }

    fn set(&mut self, path: &[String], permission: Permission) {
        self.node_at_mut(path).value = Some(permission);
    }

    fn remove(&mut self, path: &[String]) -> Option<Permission> {
        self.node_at_mut(path).value.take()
    }

    fn is_empty(&self) -> bool {
        self.value.is_none() && self.children.values().all(TrieNode::is_empty)
    }

    fn any_value_at_or_under(&self, pred: &dyn Fn(&Permission) -> bool) -> bool {
        if self.value.as_ref().map(|p| pred(p)).unwrap_or(false) {
            return true;
        }
        self.children.values().any(|c| c.any_value_at_or_under(pred))
    }

    fn collect(&self, prefix: &mut Vec<String>, out: &mut Vec<(Vec<String>, Permission)>) {
        if let Some(p) = &self.value {
            out.push((prefix.clone(), p.clone()));
        }
        for (seg, child) in &self.children {
            prefix.push(seg.clone());
            child.collect(prefix, out);
            prefix.pop();
        }
    }
}

/// A matched permission together with the path it was actually stored at
/// (which, for a descendant-tree hit, is an ancestor of the queried path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub path: Vec<String>,
    pub permission: Permission,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Source {
    Descendant,
    Exact,
}

struct Best {
    depth: Option<usize>,
    source: Source,
    path: Vec<String>,
    permission: Option<Permission>,
}

impl Best {
    fn new() -> Self {
        Self {
            depth: None,
            source: Source::Descendant,
            path: Vec::new(),
            permission: None,
        }
    }

    fn offer(&mut self, depth: usize, source: Source, path: &[String], permission: &Permission) {
        let better = match self.depth {
            None => true,
            Some(d) => depth > d || (depth == d && source == Source::Exact && self.source == Source::Descendant),
        };
        if better {
            self.depth = Some(depth);
            self.source = source;
            self.path = path.to_vec();
            self.permission = Some(permission.clone());
        }
    }

    fn into_match(self) -> Option<Match> {
        self.permission.map(|permission| Match { path: self.path, permission })
    }
}

/// The four parallel trees backing one set of permissions.
///
/// `exact_tree` and `descendant_tree` hold ordinary permissions;
/// `exact_conditional_tree` and `descendant_conditional_tree` mirror them for
/// entries carrying a runtime [`Condition`]. The two pairs never interact:
/// setting one never overwrites or is shadowed by the other.
#[derive(Default, Clone)]
pub struct PermissionSet {
    exact_tree: TrieNode,
    descendant_tree: TrieNode,
    exact_conditional_tree: TrieNode,
    descendant_conditional_tree: TrieNode,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&mut self, negating: bool, path: &[String], wildcard: bool, arg: Option<String>, condition: Option<Condition>) {
        let mut exact = if negating { Permission::NEGATING } else { Permission::PERMITTING };
        if let Some(arg) = &arg {
            exact = exact.with_arg(arg.clone());
        }
        let mut indirect = if negating {
            Permission::NEGATING_INDIRECTLY
        } else {
            Permission::PERMITTING_INDIRECTLY
        };
        if let Some(arg) = arg {
            indirect = indirect.with_arg(arg);
        }

        if let Some(condition) = condition {
            if wildcard {
                self.descendant_conditional_tree.set(path, exact.with_condition(condition));
            } else {
                self.exact_conditional_tree.set(path, exact.with_condition(condition.clone()));
                self.descendant_conditional_tree.set(path, indirect.with_condition(condition));
            }
        } else if wildcard {
            self.descendant_tree.set(path, exact);
        } else {
            self.exact_tree.set(path, exact);
            self.descendant_tree.set(path, indirect);
        }
    }

    /// Parses `line` and stores it. A multi-line arg is normalized to its
    /// logical body (the mandatory 4-space continuation marker is stripped),
    /// so [`crate::path::apply_to_path`] is the only place that ever adds
    /// indentation back.
    pub fn set(&mut self, line: &str) -> Result<(), ParseError> {
        let parsed = parse_line(line)?;
        self.store(parsed.negating, &parsed.path, parsed.wildcard, parsed.arg, None);
        Ok(())
    }

    /// Identical to [`Self::set`]; kept as a distinct, clearly-named entry
    /// point for `registry::load`, which always hands it lines pulled out of
    /// a saved group body rather than a caller-constructed literal.
    pub fn set_while_de_indenting(&mut self, line: &str) -> Result<(), ParseError> {
        self.set(line)
    }

    /// As [`Self::set`], attaching `condition` to the stored permission.
    pub fn set_conditional(&mut self, line: &str, condition: Condition) -> Result<(), ParseError> {
        let parsed = parse_line(line)?;
        self.store(parsed.negating, &parsed.path, parsed.wildcard, parsed.arg, Some(condition));
        Ok(())
    }

    /// Removes the entry matching `line`'s path, ignoring any negation
    /// prefix or arg it carries. Returns the removed permission, preferring
    /// the exact-tree value when both trees held one.
    pub fn remove(&mut self, line: &str) -> Result<Option<Permission>, ParseError> {
        let parsed = parse_line(line)?;
        if parsed.wildcard {
            Ok(self.descendant_tree.remove(&parsed.path))
        } else {
            let exact = self.exact_tree.remove(&parsed.path);
            let descendant = self.descendant_tree.remove(&parsed.path);
            Ok(exact.or(descendant))
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Empties the non-conditional trees, leaving conditional entries intact.
    pub fn clear_except_conditionals(&mut self) {
        self.exact_tree = TrieNode::default();
        self.descendant_tree = TrieNode::default();
    }

    pub fn has_any(&self) -> bool {
        !self.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.exact_tree.is_empty()
            && self.descendant_tree.is_empty()
            && self.exact_conditional_tree.is_empty()
            && self.descendant_conditional_tree.is_empty()
    }

    pub fn has_any_except_conditionals(&self) -> bool {
        !self.is_empty_except_conditionals()
    }

    pub fn is_empty_except_conditionals(&self) -> bool {
        self.exact_tree.is_empty() && self.descendant_tree.is_empty()
    }

    /// The deepest, most specific permission covering `path`, per the
    /// exact-over-descendant, deepest-wins resolution order.
    pub fn get_most_relevant(&self, path: &[String]) -> Option<Match> {
        let len = path.len();
        let mut best = Best::new();

        let mut exact = Some(&self.exact_tree);
        let mut descendant = Some(&self.descendant_tree);
        let mut exact_cond = Some(&self.exact_conditional_tree);
        let mut descendant_cond = Some(&self.descendant_conditional_tree);

        for depth in 0..=len {
            if depth > 0 {
                let seg = &path[depth - 1];
                exact = exact.and_then(|n| n.children.get(seg));
                descendant = descendant.and_then(|n| n.children.get(seg));
                exact_cond = exact_cond.and_then(|n| n.children.get(seg));
                descendant_cond = descendant_cond.and_then(|n| n.children.get(seg));
            }

            if depth == len {
                if let Some(p) = exact.and_then(|n| n.value.as_ref()) {
                    best.offer(depth, Source::Exact, path, p);
                }
                if let Some(p) = exact_cond.and_then(|n| n.value.as_ref()) {
                    if p.is_active() {
                        best.offer(depth, Source::Exact, path, p);
                    }
                }
            }
            if depth < len {
                if let Some(p) = descendant.and_then(|n| n.value.as_ref()) {
                    best.offer(depth, Source::Descendant, &path[..depth], p);
                }
                if let Some(p) = descendant_cond.and_then(|n| n.value.as_ref()) {
                    if p.is_active() {
                        best.offer(depth, Source::Descendant, &path[..depth], p);
                    }
                }
            }
        }

        best.into_match()
    }

    pub fn has_permission(&self, path: &[String]) -> bool {
        self.get_most_relevant(path).map(|m| m.permission.permits()).unwrap_or(false)
    }

    pub fn negates_permission(&self, path: &[String]) -> bool {
        self.get_most_relevant(path).map(|m| !m.permission.permits()).unwrap_or(false)
    }

    fn split_wildcard_query<'a>(&self, path: &'a [String]) -> (&'a [String], bool) {
        match path.last() {
            Some(last) if last == "*" => (&path[..path.len() - 1], true),
            _ => (path, false),
        }
    }

    pub fn has_permission_exactly(&self, path: &[String]) -> bool {
        self.exactly(path, true)
    }

    pub fn negates_permission_exactly(&self, path: &[String]) -> bool {
        self.exactly(path, false)
    }

    fn exactly(&self, path: &[String], want_permits: bool) -> bool {
        let (core, wildcard) = self.split_wildcard_query(path);
        if wildcard {
            self.descendant_tree
                .node_at(core)
                .and_then(|n| n.value.as_ref())
                .map(|p| p.covers_self() && p.permits() == want_permits)
                .unwrap_or(false)
        } else {
            self.exact_tree
                .node_at(core)
                .and_then(|n| n.value.as_ref())
                .map(|p| p.permits() == want_permits)
                .unwrap_or(false)
        }
    }

    fn has_any_related(&self, path: &[String], pred: &dyn Fn(&Permission) -> bool) -> bool {
        [&self.exact_tree, &self.descendant_tree, &self.exact_conditional_tree, &self.descendant_conditional_tree]
            .iter()
            .any(|tree| tree.node_at(path).map(|n| n.any_value_at_or_under(pred)).unwrap_or(false))
    }

    pub fn has_anything_related_to(&self, path: &[String]) -> bool {
        self.get_most_relevant(path).is_some() || self.has_any_related(path, &|_| true)
    }

    pub fn has_permission_or_any_under(&self, path: &[String]) -> bool {
        self.has_permission_or_any_under_where(path, |_| true)
    }

    /// True iff there's a permitting entry at or under `path` satisfying
    /// `pred`, and that finding isn't shadowed by a covering negation with no
    /// deeper permitting override.
    ///
    /// `pred` is only ever applied to the permission actually found by
    /// [`Self::get_most_relevant`], not to every candidate under `path`.
    pub fn has_permission_or_any_under_where(&self, path: &[String], pred: impl Fn(&Permission) -> bool) -> bool {
        if let Some(m) = self.get_most_relevant(path) {
            if m.permission.permits() {
                return pred(&m.permission);
            }
            // covering negation: only a deeper permitting entry can win back.
            return self.has_any_related(path, &|p: &Permission| p.permits() && p.is_active());
        }
        self.has_any_related(path, &|p: &Permission| p.permits() && p.is_active())
    }

    /// Every directly-set, non-conditional entry as `(path, wildcard,
    /// permission)`, without going through save-string rendering — the
    /// `path` never includes a trailing `"*"` segment; `wildcard` says so
    /// instead.
    pub fn direct_entries(&self) -> Vec<(Vec<String>, bool, Permission)> {
        let mut out = Vec::new();

        let mut exact_entries = Vec::new();
        self.exact_tree.collect(&mut Vec::new(), &mut exact_entries);
        for (path, perm) in exact_entries {
            out.push((path, false, perm));
        }

        let mut descendant_entries = Vec::new();
        self.descendant_tree.collect(&mut Vec::new(), &mut descendant_entries);
        for (path, perm) in descendant_entries {
            if perm.covers_self() {
                out.push((path, true, perm));
            }
        }

        out
    }

    /// All set permissions (excluding conditionals, which can't be
    /// serialized) rendered as save-string lines, sorted lexicographically.
    pub fn get_permissions_as_strings(&self, include_args: bool) -> Vec<String> {
        let mut lines = Vec::new();

        let mut exact_entries = Vec::new();
        self.exact_tree.collect(&mut Vec::new(), &mut exact_entries);
        for (p, perm) in exact_entries {
            let joined = path::join_path(&p);
            let arg = if include_args { perm.arg() } else { None };
            lines.push(path::apply_to_path(&joined, perm.permits(), arg));
        }

        let mut descendant_entries = Vec::new();
        self.descendant_tree.collect(&mut Vec::new(), &mut descendant_entries);
        for (p, perm) in descendant_entries {
            if !perm.covers_self() {
                // mirrors its matching exact_tree entry; not independently set.
                continue;
            }
            let mut joined = path::join_path(&p);
            joined.push_str(".*");
            let arg = if include_args { perm.arg() } else { None };
            lines.push(path::apply_to_path(&joined, perm.permits(), arg));
        }

        lines.sort();
        lines
    }

    pub fn to_save_string(&self) -> String {
        self.get_permissions_as_strings(true).join("\n")
    }
}
