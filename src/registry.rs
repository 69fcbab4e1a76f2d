//! The top-level registry tying users, named groups and the default group
//! together behind a single query surface.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use crate::error::{LoadError, MissingPermissionError, ParseError, UserMissingPermissionError};
use crate::group::{self, PermissionGroup};
use crate::path;
use crate::permission::Permission;

/// Converters and naming policy injected by the embedding application, since
/// this crate has no opinion on what a `UserId` looks like.
pub struct RegistryConfig<U> {
    pub id_to_str: Box<dyn Fn(&U) -> String>,
    pub str_to_id: Box<dyn Fn(&str) -> Result<U, ParseError>>,
    pub default_group_name: String,
}

impl<U> RegistryConfig<U> {
    pub fn new(
        id_to_str: impl Fn(&U) -> String + 'static,
        str_to_id: impl Fn(&str) -> Result<U, ParseError> + 'static,
    ) -> Self {
        Self {
            id_to_str: Box::new(id_to_str),
            str_to_id: Box::new(str_to_id),
            default_group_name: "*".to_string(),
        }
    }

    pub fn with_default_group_name(mut self, name: impl Into<String>) -> Self {
        self.default_group_name = name.into();
        self
    }
}

/// The outcome of resolving a user's cascade at a path, bundling the
/// permit/deny decision with the permission that produced it (if any).
pub struct PermissionStatus {
    pub permitted: bool,
    pub permission: Option<Permission>,
}

impl PermissionStatus {
    pub fn arg(&self) -> Option<&str> {
        if self.permitted {
            self.permission.as_ref().and_then(Permission::arg)
        } else {
            None
        }
    }

    pub fn assert_has_permission(&self, path: &str) -> Result<(), MissingPermissionError> {
        if self.permitted {
            Ok(())
        } else {
            Err(MissingPermissionError::single(path))
        }
    }
}

/// A generic, in-memory permission hierarchy: users and named groups, each
/// holding a [`PermissionGroup`], cascading through references down to one
/// reserved default group.
pub struct PermissionsRegistry<U> {
    config: RegistryConfig<U>,
    users: HashMap<U, PermissionGroup>,
    groups: HashMap<String, PermissionGroup>,
}

impl<U> PermissionsRegistry<U>
where
    U: Eq + Hash + Clone + fmt::Debug + fmt::Display,
{
    pub fn new(config: RegistryConfig<U>) -> Self {
        let mut groups = HashMap::new();
        groups.insert(config.default_group_name.clone(), PermissionGroup::new(config.default_group_name.clone()));
        Self { config, users: HashMap::new(), groups }
    }

    pub fn default_group_name(&self) -> &str {
        &self.config.default_group_name
    }

    pub fn default_group(&self) -> &PermissionGroup {
        self.groups.get(&self.config.default_group_name).expect("default group always present")
    }

    fn default_group_mut(&mut self) -> &mut PermissionGroup {
        let name = self.config.default_group_name.clone();
        self.groups.get_mut(&name).expect("default group always present")
    }

    pub fn get_user(&self, uid: &U) -> Option<&PermissionGroup> {
        self.users.get(uid)
    }

    pub fn get_group(&self, name: &str) -> Option<&PermissionGroup> {
        self.groups.get(name)
    }

    pub fn get_users(&self) -> Vec<U> {
        self.users.keys().cloned().collect()
    }

    /// Named groups, excluding the reserved default group (use
    /// [`Self::default_group`] for that).
    pub fn get_group_names(&self) -> Vec<String> {
        self.groups
            .keys()
            .filter(|n| **n != self.config.default_group_name)
            .cloned()
            .collect()
    }

    fn get_or_create_user(&mut self, uid: &U) -> &mut PermissionGroup {
        let default_name = self.config.default_group_name.clone();
        let rendered = (self.config.id_to_str)(uid);
        self.users.entry(uid.clone()).or_insert_with(|| {
            let mut group = PermissionGroup::new(rendered);
            group.set_default_group(Some(default_name));
            group
        })
    }

    pub fn create_group(&mut self, name: impl Into<String>) -> &mut PermissionGroup {
        let name = name.into();
        self.groups.entry(name.clone()).or_insert_with(|| PermissionGroup::new(name))
    }

    pub fn delete_group(&mut self, name: &str) -> Option<PermissionGroup> {
        if name == self.config.default_group_name {
            return None;
        }
        self.groups.remove(name)
    }

    // -- mutators -----------------------------------------------------

    pub fn assign_user_permission(&mut self, uid: &U, line: &str) -> Result<(), ParseError> {
        self.get_or_create_user(uid).perms_mut().set(line)
    }

    pub fn revoke_user_permission(&mut self, uid: &U, line: &str) -> Result<Option<Permission>, ParseError> {
        match self.users.get_mut(uid) {
            Some(group) => group.perms_mut().remove(line),
            None => Ok(None),
        }
    }

    pub fn clear_user_permissions(&mut self, uid: &U) {
        if let Some(group) = self.users.get_mut(uid) {
            group.perms_mut().clear();
        }
    }

    pub fn assign_group_permission(&mut self, name: &str, line: &str) -> Result<(), ParseError> {
        self.create_group(name).perms_mut().set(line)
    }

    /// Sets a permission directly on the reserved default group, making it
    /// apply to every user whose own cascade falls all the way through.
    pub fn assign_default_permission(&mut self, line: &str) -> Result<(), ParseError> {
        self.default_group_mut().perms_mut().set(line)
    }

    pub fn revoke_default_permission(&mut self, line: &str) -> Result<Option<Permission>, ParseError> {
        self.default_group_mut().perms_mut().remove(line)
    }

    pub fn revoke_group_permission(&mut self, name: &str, line: &str) -> Result<Option<Permission>, ParseError> {
        match self.groups.get_mut(name) {
            Some(group) => group.perms_mut().remove(line),
            None => Ok(None),
        }
    }

    pub fn clear_group_permissions(&mut self, name: &str) {
        if let Some(group) = self.groups.get_mut(name) {
            group.perms_mut().clear();
        }
    }

    pub fn assign_group_to_user(&mut self, uid: &U, group_name: &str) {
        self.create_group(group_name);
        self.get_or_create_user(uid).add_reference(group_name);
    }

    pub fn revoke_group_from_user(&mut self, uid: &U, group_name: &str) {
        if let Some(group) = self.users.get_mut(uid) {
            group.remove_reference(group_name);
        }
    }

    pub fn assign_group_to_group(&mut self, name: &str, referenced: &str) {
        self.create_group(referenced);
        self.create_group(name).add_reference(referenced);
    }

    pub fn revoke_group_from_group(&mut self, name: &str, referenced: &str) {
        if let Some(group) = self.groups.get_mut(name) {
            group.remove_reference(referenced);
        }
    }

    pub fn assign_default_group(&mut self, name: &str) {
        self.create_group(name);
        self.default_group_mut().add_reference(name);
    }

    pub fn revoke_default_group(&mut self, name: &str) {
        self.default_group_mut().remove_reference(name);
    }

    pub fn reassign_group_priority(&mut self, name: &str, priority: f64) {
        self.create_group(name).reassign_priority(priority);
    }

    /// Fetches the user's own group, creating it (with the default group
    /// wired in) if this is the first time `uid` has been seen.
    pub fn get_user_group_or_new(&mut self, uid: &U) -> &mut PermissionGroup {
        self.get_or_create_user(uid)
    }

    /// Fetches a named group, creating it (optionally at `priority`) if it
    /// doesn't exist yet. An existing group's priority is left untouched.
    pub fn get_group_or_new(&mut self, name: &str, priority: Option<f64>) -> &mut PermissionGroup {
        let name = name.to_string();
        let is_new = !self.groups.contains_key(&name);
        let group = self.create_group(name);
        if is_new {
            if let Some(priority) = priority {
                group.reassign_priority(priority);
            }
        }
        group
    }

    /// Empties every user, named group and the default group's own
    /// permissions and references, leaving the registry as if freshly
    /// constructed.
    pub fn clear(&mut self) {
        self.users.clear();
        self.groups.clear();
        self.groups.insert(self.config.default_group_name.clone(), PermissionGroup::new(self.config.default_group_name.clone()));
    }

    // -- membership -----------------------------------------------------

    fn reachable(&self, start_refs: &[String], target: &str, visited: &mut HashSet<String>) -> bool {
        for r in start_refs {
            if r == target {
                return true;
            }
            if visited.insert(r.clone()) {
                if let Some(g) = self.groups.get(r) {
                    if self.reachable(&g.refs, target, visited) {
                        return true;
                    }
                }
            }
        }
        false
    }

    pub fn user_has_group(&self, uid: &U, name: &str) -> bool {
        match self.users.get(uid) {
            Some(group) => self.reachable(&group.refs, name, &mut HashSet::new()),
            None => false,
        }
    }

    /// True iff `name`'s reference graph reaches `target`, transitively.
    /// False for `target == default_group_name`: reachability here tracks
    /// the explicit reference graph, which the default group is never a
    /// structural part of, even though it still applies at query time for
    /// users (see [`Self::has_default_permission`]).
    pub fn group_extends_from_group(&self, name: &str, target: &str) -> bool {
        match self.groups.get(name) {
            Some(group) => self.reachable(&group.refs, target, &mut HashSet::new()),
            None => false,
        }
    }

    pub fn user_has_all_groups(&self, uid: &U, names: &[&str]) -> bool {
        names.iter().all(|n| self.user_has_group(uid, n))
    }

    pub fn user_has_any_group(&self, uid: &U, names: &[&str]) -> bool {
        names.iter().any(|n| self.user_has_group(uid, n))
    }

    pub fn group_has_all_groups(&self, name: &str, targets: &[&str]) -> bool {
        targets.iter().all(|t| self.group_extends_from_group(name, t))
    }

    pub fn group_has_any_group(&self, name: &str, targets: &[&str]) -> bool {
        targets.iter().any(|t| self.group_extends_from_group(name, t))
    }

    // -- queries -----------------------------------------------------

    fn user_most_relevant(&self, uid: &U, path: &str) -> Option<crate::set::Match> {
        let segments = path::split_path(path);
        if let Some(group) = self.users.get(uid) {
            return group.get_most_relevant(&segments, &self.groups);
        }
        self.default_group().get_most_relevant(&segments, &self.groups)
    }

    pub fn user_has_permission(&self, uid: &U, path: &str) -> bool {
        self.user_most_relevant(uid, path).map(|m| m.permission.permits()).unwrap_or(false)
    }

    pub fn user_negates_permission(&self, uid: &U, path: &str) -> bool {
        self.user_most_relevant(uid, path).map(|m| !m.permission.permits()).unwrap_or(false)
    }

    pub fn user_has_permission_exactly(&self, uid: &U, path: &str) -> bool {
        let segments = path::split_path(path);
        self.users.get(uid).map(|g| g.perms().has_permission_exactly(&segments)).unwrap_or(false)
    }

    pub fn user_negates_permission_exactly(&self, uid: &U, path: &str) -> bool {
        let segments = path::split_path(path);
        self.users.get(uid).map(|g| g.perms().negates_permission_exactly(&segments)).unwrap_or(false)
    }

    pub fn get_user_permission_status(&self, uid: &U, path: &str) -> PermissionStatus {
        let found = self.user_most_relevant(uid, path);
        let permitted = found.as_ref().map(|m| m.permission.permits()).unwrap_or(false);
        PermissionStatus { permitted, permission: found.map(|m| m.permission) }
    }

    pub fn get_user_permission_arg(&self, uid: &U, path: &str) -> Option<String> {
        self.get_user_permission_status(uid, path).arg().map(String::from)
    }

    /// One status per path, in `paths` order, each independently cascaded.
    pub fn get_user_permission_statuses(&self, uid: &U, paths: &[&str]) -> HashMap<String, PermissionStatus> {
        paths.iter().map(|p| (p.to_string(), self.get_user_permission_status(uid, p))).collect()
    }

    /// The user's own directly-set permissions rendered as statuses,
    /// ignoring any cascade through references or the default group.
    pub fn get_all_user_permission_statuses(&self, uid: &U) -> Vec<PermissionStatus> {
        match self.users.get(uid) {
            Some(group) => group
                .perms()
                .direct_entries()
                .into_iter()
                .map(|(_, _, permission)| PermissionStatus { permitted: permission.permits(), permission: Some(permission) })
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn user_has_all_permissions(&self, uid: &U, paths: &[&str]) -> bool {
        paths.iter().all(|p| self.user_has_permission(uid, p))
    }

    pub fn user_has_any_permissions(&self, uid: &U, paths: &[&str]) -> bool {
        paths.iter().any(|p| self.user_has_permission(uid, p))
    }

    pub fn group_has_all_permissions(&self, name: &str, paths: &[&str]) -> bool {
        paths.iter().all(|p| self.group_has_permission(name, p))
    }

    pub fn group_has_any_permissions(&self, name: &str, paths: &[&str]) -> bool {
        paths.iter().any(|p| self.group_has_permission(name, p))
    }

    /// True iff `path` or anything under it is permitted, for `uid`'s full
    /// cascade (own set, then references, then the default group).
    pub fn user_has_any_sub_permission_of(&self, uid: &U, path: &str) -> bool {
        self.user_has_any_sub_permission_of_where(uid, path, |_| true)
    }

    pub fn user_has_any_sub_permission_of_where(&self, uid: &U, path: &str, pred: impl Fn(&Permission) -> bool) -> bool {
        let segments = path::split_path(path);
        if let Some(group) = self.users.get(uid) {
            return group.has_permission_or_any_under(&segments, &pred, &self.groups);
        }
        self.default_group().has_permission_or_any_under(&segments, &pred, &self.groups)
    }

    /// As [`Self::user_has_permission`], but for a named group and without
    /// ever consulting the default group — a named group's cascade only
    /// ever reaches its own references.
    pub fn group_has_permission(&self, name: &str, path: &str) -> bool {
        let segments = path::split_path(path);
        match self.groups.get(name) {
            Some(group) => group
                .get_most_relevant(&segments, &self.groups)
                .map(|m| m.permission.permits())
                .unwrap_or(false),
            None => false,
        }
    }

    pub fn group_negates_permission(&self, name: &str, path: &str) -> bool {
        let segments = path::split_path(path);
        match self.groups.get(name) {
            Some(group) => group
                .get_most_relevant(&segments, &self.groups)
                .map(|m| !m.permission.permits())
                .unwrap_or(false),
            None => false,
        }
    }

    pub fn group_has_permission_exactly(&self, name: &str, path: &str) -> bool {
        let segments = path::split_path(path);
        self.groups.get(name).map(|g| g.perms().has_permission_exactly(&segments)).unwrap_or(false)
    }

    pub fn get_group_permission_arg(&self, name: &str, path: &str) -> Option<String> {
        let segments = path::split_path(path);
        let group = self.groups.get(name)?;
        let found = group.get_most_relevant(&segments, &self.groups)?;
        if found.permission.permits() {
            found.permission.arg().map(String::from)
        } else {
            None
        }
    }

    pub fn group_has_any_sub_permission_of(&self, name: &str, path: &str) -> bool {
        let segments = path::split_path(path);
        match self.groups.get(name) {
            Some(group) => group.has_permission_or_any_under(&segments, &|_| true, &self.groups),
            None => false,
        }
    }

    /// The default group's own cascade (its set, then its own references —
    /// the "list of default groups" assigned with [`Self::assign_default_group`]).
    pub fn has_default_permission(&self, path: &str) -> bool {
        let segments = path::split_path(path);
        self.default_group()
            .get_most_relevant(&segments, &self.groups)
            .map(|m| m.permission.permits())
            .unwrap_or(false)
    }

    pub fn get_user_permissions(&self, uid: &U) -> Vec<String> {
        self.users.get(uid).map(|g| g.perms().get_permissions_as_strings(true)).unwrap_or_default()
    }

    pub fn get_group_permissions(&self, name: &str) -> Vec<String> {
        self.groups.get(name).map(|g| g.perms().get_permissions_as_strings(true)).unwrap_or_default()
    }

    // -- assertions -----------------------------------------------------

    pub fn assert_user_has_permission(&self, uid: &U, path: &str) -> Result<(), UserMissingPermissionError<U>> {
        self.get_user_permission_status(uid, path)
            .assert_has_permission(path)
            .map_err(|e| UserMissingPermissionError::new(uid.clone(), e))
    }

    pub fn assert_user_has_all_permissions(&self, uid: &U, paths: &[&str]) -> Result<(), UserMissingPermissionError<U>> {
        let missing: Vec<String> = paths.iter().filter(|p| !self.user_has_permission(uid, p)).map(|p| p.to_string()).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(UserMissingPermissionError::new(uid.clone(), MissingPermissionError::all_of(missing)))
        }
    }

    pub fn assert_user_has_any_permission(&self, uid: &U, paths: &[&str]) -> Result<(), UserMissingPermissionError<U>> {
        if paths.iter().any(|p| self.user_has_permission(uid, p)) {
            Ok(())
        } else {
            let checked = paths.iter().map(|p| p.to_string()).collect();
            Err(UserMissingPermissionError::new(uid.clone(), MissingPermissionError::any_of(checked)))
        }
    }

    // -- save / load -----------------------------------------------------

    pub fn save(&self) -> String {
        let mut blocks = vec![self.default_group().to_save_string(&self.groups)];

        let mut group_names: Vec<&String> = self.groups.keys().filter(|n| **n != self.config.default_group_name).collect();
        group_names.sort();
        for name in group_names {
            blocks.push(self.groups[name].to_save_string(&self.groups));
        }

        let mut user_ids: Vec<&U> = self.users.keys().collect();
        user_ids.sort_by_key(|u| (self.config.id_to_str)(u));
        for uid in user_ids {
            blocks.push(self.users[uid].to_save_string(&self.groups));
        }

        blocks.join("\n\n")
    }

    /// Parses `text` into a fresh set of users and groups, only replacing the
    /// registry's current contents once the whole text has parsed
    /// successfully — a malformed block never leaves the registry
    /// half-loaded.
    pub fn load(&mut self, text: &str) -> Result<(), LoadError> {
        let mut users = HashMap::new();
        let mut groups = HashMap::new();
        groups.insert(self.config.default_group_name.clone(), PermissionGroup::new(self.config.default_group_name.clone()));

        let mut block_lines: Vec<&str> = Vec::new();
        let mut block_start_line = 1usize;
        let mut line_no = 0usize;

        for raw_line in text.lines() {
            line_no += 1;
            if raw_line.is_empty() {
                if !block_lines.is_empty() {
                    Self::load_block(&self.config, &mut users, &mut groups, &block_lines, block_start_line)?;
                    block_lines.clear();
                }
                block_start_line = line_no + 1;
            } else {
                if block_lines.is_empty() {
                    block_start_line = line_no;
                }
                block_lines.push(raw_line);
            }
        }
        if !block_lines.is_empty() {
            Self::load_block(&self.config, &mut users, &mut groups, &block_lines, block_start_line)?;
        }

        self.users = users;
        self.groups = groups;
        Ok(())
    }

    fn load_block(
        config: &RegistryConfig<U>,
        users: &mut HashMap<U, PermissionGroup>,
        groups: &mut HashMap<String, PermissionGroup>,
        lines: &[&str],
        start_line: usize,
    ) -> Result<(), LoadError> {
        let header_line = lines[0];
        let parsed = group::parse_header(header_line).map_err(|e| LoadError {
            block: header_line.to_string(),
            line: start_line,
            source: e,
        })?;

        let mut logical_lines: Vec<String> = Vec::new();
        if let Some(r) = &parsed.compact_ref {
            logical_lines.push(format!("#{r}"));
        }

        let mut buffer: Option<String> = None;
        for raw in &lines[1..] {
            let stripped = raw.strip_prefix("    ").unwrap_or(raw);
            let is_continuation = stripped.starts_with(' ') || stripped.starts_with('\t');
            if is_continuation {
                if let Some(buf) = buffer.as_mut() {
                    buf.push('\n');
                    buf.push_str(stripped);
                } else {
                    log::warn!("ignoring orphan continuation line while loading '{}'", parsed.name);
                }
            } else {
                if let Some(buf) = buffer.take() {
                    logical_lines.push(buf);
                }
                buffer = Some(stripped.to_string());
            }
        }
        if let Some(buf) = buffer.take() {
            logical_lines.push(buf);
        }

        let mut refs = Vec::new();
        let mut perm_lines = Vec::new();
        for line in logical_lines {
            match line.strip_prefix('#') {
                Some(r) => refs.push(r.to_string()),
                None => perm_lines.push(line),
            }
        }

        let is_default = parsed.name == config.default_group_name;
        let uid_result = if is_default { None } else { Some((config.str_to_id)(&parsed.name)) };
        let default_name = config.default_group_name.clone();

        let group = match uid_result {
            Some(Ok(uid)) => users.entry(uid).or_insert_with(|| {
                let mut g = PermissionGroup::new(parsed.name.clone());
                g.set_default_group(Some(default_name));
                g
            }),
            _ => groups.entry(parsed.name.clone()).or_insert_with(|| PermissionGroup::new(parsed.name.clone())),
        };

        group.reassign_priority(parsed.priority);
        for r in refs {
            group.add_reference(r);
        }
        for line in perm_lines {
            group.perms_mut().set_while_de_indenting(&line).map_err(|e| LoadError {
                block: parsed.name.clone(),
                line: start_line,
                source: e,
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PermissionsRegistry<String> {
        let config = RegistryConfig::new(|id: &String| id.clone(), |s: &str| Ok(s.to_string()));
        PermissionsRegistry::new(config)
    }

    #[test]
    fn unknown_user_falls_through_to_default_group() {
        let mut reg = registry();
        reg.assign_default_group("guests");
        reg.assign_group_permission("guests", "read.public").unwrap();

        assert!(reg.user_has_permission(&"nobody".to_string(), "read.public"));
    }

    #[test]
    fn known_user_own_permission_beats_default() {
        let mut reg = registry();
        reg.assign_default_group("guests");
        reg.assign_group_permission("guests", "-read.public").unwrap();
        reg.assign_user_permission(&"alice".to_string(), "read.public").unwrap();

        assert!(reg.user_has_permission(&"alice".to_string(), "read.public"));
    }

    #[test]
    fn group_cascade_never_reaches_default() {
        let mut reg = registry();
        reg.assign_default_group("guests");
        reg.assign_group_permission("guests", "read.public").unwrap();
        reg.create_group("empty");

        assert!(!reg.group_has_permission("empty", "read.public"));
    }

    #[test]
    fn user_group_reference_cascades_by_priority() {
        let mut reg = registry();
        reg.assign_group_permission("low", "-read.public").unwrap();
        reg.reassign_group_priority("low", 1.0);
        reg.assign_group_permission("high", "read.public").unwrap();
        reg.reassign_group_priority("high", 10.0);

        reg.assign_group_to_user(&"bob".to_string(), "low");
        reg.assign_group_to_user(&"bob".to_string(), "high");

        assert!(reg.user_has_permission(&"bob".to_string(), "read.public"));
    }

    #[test]
    fn reference_cycles_do_not_infinite_loop() {
        let mut reg = registry();
        reg.assign_group_to_group("a", "b");
        reg.assign_group_to_group("b", "a");
        reg.assign_group_to_user(&"carol".to_string(), "a");

        assert!(!reg.user_has_permission(&"carol".to_string(), "anything"));
    }

    #[test]
    fn a_malformed_block_leaves_the_registry_untouched() {
        let mut reg = registry();
        reg.assign_user_permission(&"dave".to_string(), "a.b").unwrap();
        let before = reg.save();

        let err = reg.load("dave\n    a..b").unwrap_err();
        assert_eq!(err.block, "dave");
        assert_eq!(reg.save(), before);
    }

    #[test]
    fn default_permission_and_clear_round_trip() {
        let mut reg = registry();
        reg.assign_default_permission("read.public").unwrap();
        assert!(reg.has_default_permission("read.public"));
        assert!(reg.user_has_permission(&"anyone".to_string(), "read.public"));

        reg.revoke_default_permission("read.public").unwrap();
        assert!(!reg.has_default_permission("read.public"));

        reg.assign_user_permission(&"dave".to_string(), "a.b").unwrap();
        reg.clear();
        assert!(reg.get_users().is_empty());
        assert!(!reg.user_has_permission(&"dave".to_string(), "a.b"));
    }

    #[test]
    fn get_group_or_new_only_applies_priority_on_first_creation() {
        let mut reg = registry();
        reg.get_group_or_new("staff", Some(7.0));
        assert_eq!(reg.get_group("staff").unwrap().priority(), 7.0);

        reg.get_group_or_new("staff", Some(99.0));
        assert_eq!(reg.get_group("staff").unwrap().priority(), 7.0);
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut reg = registry();
        reg.assign_user_permission(&"dave".to_string(), "a.b.*: wild").unwrap();
        reg.assign_group_permission("staff", "a.b").unwrap();
        reg.reassign_group_priority("staff", 7.0);
        reg.assign_group_to_user(&"dave".to_string(), "staff");

        let saved = reg.save();

        let mut reloaded = registry();
        reloaded.load(&saved).unwrap();

        assert!(reloaded.user_has_permission(&"dave".to_string(), "a.b.anything"));
        assert!(reloaded.group_has_permission("staff", "a.b"));
        assert_eq!(reloaded.get_group("staff").unwrap().priority(), 7.0);
        assert_eq!(reloaded.save(), saved);
    }

    #[test]
    fn loading_an_inline_arg_continued_on_indented_lines_normalizes_to_eight_space_continuations() {
        let mut reg = registry();
        reg.load("group1\n    my.perm: this is\n        some text\n        more\n    my.perm.other").unwrap();

        let rendered = reg.get_group("group1").unwrap().to_save_string(&reg.groups);
        assert_eq!(
            rendered,
            "group1\n    my.perm:\n        this is\n        some text\n        more\n    my.perm.other"
        );

        let mut reloaded = registry();
        reloaded.load(&reg.save()).unwrap();
        assert_eq!(reloaded.save(), reg.save());
    }
}
