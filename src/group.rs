//! Named and per-user permission groups, and their save-string rendering.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::error::ParseError;
use crate::path::{self, parse_priority};
use crate::set::{Match, PermissionSet};

/// A named bundle of permissions that can reference other groups, cascading
/// through them in priority order when its own set comes up empty.
///
/// Users are modelled the same way: each user gets its own `PermissionGroup`
/// whose `default_group` is set to the registry's reserved default group
/// name, which named groups never get automatically.
#[derive(Clone)]
pub struct PermissionGroup {
    pub(crate) name: String,
    pub(crate) priority: f64,
    pub(crate) perms: PermissionSet,
    pub(crate) refs: Vec<String>,
    pub(crate) default_group: Option<String>,
}

impl PermissionGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 0.0,
            perms: PermissionSet::new(),
            refs: Vec::new(),
            default_group: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn priority_as_i64(&self) -> i64 {
        self.priority.trunc() as i64
    }

    pub fn reassign_priority(&mut self, priority: f64) {
        self.priority = priority;
    }

    pub fn perms(&self) -> &PermissionSet {
        &self.perms
    }

    pub fn perms_mut(&mut self) -> &mut PermissionSet {
        &mut self.perms
    }

    pub fn refs(&self) -> &[String] {
        &self.refs
    }

    pub fn add_reference(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.refs.contains(&name) {
            self.refs.push(name);
        }
    }

    pub fn remove_reference(&mut self, name: &str) {
        self.refs.retain(|r| r != name);
    }

    pub fn default_group(&self) -> Option<&str> {
        self.default_group.as_deref()
    }

    pub fn set_default_group(&mut self, name: Option<String>) {
        self.default_group = name;
    }

    /// `refs`, ordered by descending priority of the referenced group (ties
    /// broken by name, ascending). Unresolvable names sort as priority 0 and
    /// still participate in cascading — a forward reference to a
    /// not-yet-declared group keeps whatever priority it's later assigned.
    pub fn sorted_refs(&self, groups: &HashMap<String, PermissionGroup>) -> Vec<String> {
        let mut refs = self.refs.clone();
        refs.sort_by(|a, b| {
            let pa = groups.get(a).map(|g| g.priority).unwrap_or(0.0);
            let pb = groups.get(b).map(|g| g.priority).unwrap_or(0.0);
            pb.partial_cmp(&pa).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b))
        });
        refs
    }

    /// Own set, then each reference (priority-ordered, transitively), then
    /// `default_group` if set — first non-null result wins. Reference
    /// cycles are broken silently.
    pub fn get_most_relevant(&self, query_path: &[String], groups: &HashMap<String, PermissionGroup>) -> Option<Match> {
        self.get_most_relevant_in(query_path, groups, &mut HashSet::new())
    }

    pub(crate) fn get_most_relevant_in(
        &self,
        query_path: &[String],
        groups: &HashMap<String, PermissionGroup>,
        visited: &mut HashSet<String>,
    ) -> Option<Match> {
        if let Some(m) = self.perms.get_most_relevant(query_path) {
            return Some(m);
        }

        for name in self.sorted_refs(groups) {
            if !visited.insert(name.clone()) {
                log::debug!("skipping '{name}' already visited while resolving references");
                continue;
            }
            if let Some(group) = groups.get(&name) {
                if let Some(m) = group.get_most_relevant_in(query_path, groups, visited) {
                    return Some(m);
                }
            }
        }

        if let Some(name) = &self.default_group {
            if visited.insert(name.clone()) {
                if let Some(group) = groups.get(name) {
                    return group.get_most_relevant_in(query_path, groups, visited);
                }
            }
        }

        None
    }

    /// True if there's nothing a cascade into `refs`/`default_group` could
    /// add beyond what `perms` alone already settles for `path` — used to
    /// decide whether a cascaded "any under" search needs to keep looking.
    pub fn is_authoritative_for(&self, path: &[String]) -> bool {
        self.perms.has_anything_related_to(path)
    }

    pub fn has_permission_or_any_under(
        &self,
        path: &[String],
        pred: &dyn Fn(&crate::permission::Permission) -> bool,
        groups: &HashMap<String, PermissionGroup>,
    ) -> bool {
        self.has_permission_or_any_under_in(path, pred, groups, &mut HashSet::new())
    }

    pub(crate) fn has_permission_or_any_under_in(
        &self,
        path: &[String],
        pred: &dyn Fn(&crate::permission::Permission) -> bool,
        groups: &HashMap<String, PermissionGroup>,
        visited: &mut HashSet<String>,
    ) -> bool {
        if self.is_authoritative_for(path) {
            return self.perms.has_permission_or_any_under_where(path, pred);
        }

        for name in self.sorted_refs(groups) {
            if !visited.insert(name.clone()) {
                continue;
            }
            if let Some(group) = groups.get(&name) {
                if group.has_permission_or_any_under_in(path, pred, groups, visited) {
                    return true;
                }
            }
        }

        if let Some(name) = &self.default_group {
            if visited.insert(name.clone()) {
                if let Some(group) = groups.get(name) {
                    return group.has_permission_or_any_under_in(path, pred, groups, visited);
                }
            }
        }

        false
    }

    pub fn to_save_string(&self, groups: &HashMap<String, PermissionGroup>) -> String {
        let refs = self.sorted_refs(groups);
        let perm_lines = self.perms.get_permissions_as_strings(true);

        let needs_priority = self.priority != 0.0 || !refs.is_empty();
        let header = if needs_priority {
            format!("{}: {}", self.name, path::format_priority(self.priority))
        } else {
            self.name.clone()
        };

        if refs.len() == 1 && perm_lines.is_empty() {
            return format!("{header} #{}", refs[0]);
        }

        let mut body_lines: Vec<String> = refs.iter().map(|r| format!("#{r}")).collect();
        body_lines.extend(perm_lines);

        if body_lines.is_empty() {
            header
        } else {
            let body = body_lines
                .iter()
                .map(|l| path::indent_block(l, "    "))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{header}\n{body}")
        }
    }
}

/// The parsed header of a group or user block: `name[: priority][ #ref]`.
pub(crate) struct ParsedHeader {
    pub name: String,
    pub priority: f64,
    pub compact_ref: Option<String>,
}

pub(crate) fn parse_header(line: &str) -> Result<ParsedHeader, ParseError> {
    let (head, compact_ref) = match line.split_once(" #") {
        Some((h, r)) => (h, Some(r.to_string())),
        None => (line, None),
    };
    let (name, priority) = match head.split_once(": ") {
        Some((n, p)) => (n.to_string(), parse_priority(p)?),
        None => (head.to_string(), 0.0),
    };
    if name.is_empty() || name.starts_with('-') || name.starts_with('#') {
        return Err(ParseError::InvalidName(name));
    }
    Ok(ParsedHeader { name, priority, compact_ref })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups_with(entries: &[(&str, f64)]) -> HashMap<String, PermissionGroup> {
        entries
            .iter()
            .map(|(name, priority)| {
                let mut g = PermissionGroup::new(*name);
                g.reassign_priority(*priority);
                (name.to_string(), g)
            })
            .collect()
    }

    #[test]
    fn sorted_refs_orders_by_priority_desc_then_name() {
        let mut g = PermissionGroup::new("testgroup");
        g.add_reference("fallback2");
        g.add_reference("fallback1");
        g.add_reference("fallback3");
        let groups = groups_with(&[("fallback1", 21.0), ("fallback2", 13.0), ("fallback3", 5.0)]);
        assert_eq!(g.sorted_refs(&groups), vec!["fallback1", "fallback2", "fallback3"]);
    }

    #[test]
    fn forward_reference_keeps_priority_assigned_later() {
        let mut g = PermissionGroup::new("g");
        g.add_reference("later");
        let mut groups = HashMap::new();
        groups.insert("later".to_string(), {
            let mut l = PermissionGroup::new("later");
            l.reassign_priority(99.0);
            l
        });
        assert_eq!(g.sorted_refs(&groups), vec!["later"]);
        assert_eq!(groups["later"].priority(), 99.0);
    }

    #[test]
    fn cascade_falls_through_refs_then_default() {
        let groups = HashMap::new();
        let mut base = PermissionGroup::new("base");
        base.set_default_group(Some("fallback".to_string()));
        // own empty, refs empty, default not present in map -> None
        assert!(base.get_most_relevant(&["a".to_string()], &groups).is_none());
    }

    #[test]
    fn parses_compact_and_full_headers() {
        let h = parse_header("testgroup: 14").unwrap();
        assert_eq!(h.name, "testgroup");
        assert_eq!(h.priority, 14.0);
        assert_eq!(h.compact_ref, None);

        let h = parse_header("name #ref").unwrap();
        assert_eq!(h.name, "name");
        assert_eq!(h.priority, 0.0);
        assert_eq!(h.compact_ref.as_deref(), Some("ref"));

        let h = parse_header("name: 3 #ref").unwrap();
        assert_eq!(h.priority, 3.0);
        assert_eq!(h.compact_ref.as_deref(), Some("ref"));
    }

    #[test]
    fn renders_single_reference_compactly() {
        let mut groups = HashMap::new();
        let mut g = PermissionGroup::new("g");
        g.add_reference("other");
        groups.insert("other".to_string(), PermissionGroup::new("other"));
        groups.insert("g".to_string(), g.clone());
        assert_eq!(g.to_save_string(&groups), "g #other");
    }
}
