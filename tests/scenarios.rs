use std::collections::HashMap;

use permission_tree::{ParseError, PermissionGroup, PermissionSet, PermissionsRegistry, RegistryConfig};

fn segs(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

fn registry() -> PermissionsRegistry<String> {
    let config = RegistryConfig::new(|id: &String| id.clone(), |s: &str| Ok(s.to_string()));
    PermissionsRegistry::new(config)
}

#[test]
fn a_non_wildcard_permission_covers_everything_strictly_below_it_with_its_arg() -> anyhow::Result<()> {
    let mut set = PermissionSet::new();
    set.set("first.second: doot")?;

    assert!(!set.has_permission(&segs("first")));
    let hit = set.get_most_relevant(&segs("first.second.third")).expect("should be covered");
    assert!(hit.permission.permits());
    assert_eq!(hit.permission.arg(), Some("doot"));
    Ok(())
}

#[test]
fn a_wildcard_permission_does_not_cover_the_path_it_is_set_on() -> anyhow::Result<()> {
    let mut set = PermissionSet::new();
    set.set("first.second.*: wild")?;

    assert!(set.get_most_relevant(&segs("first.second")).is_none());
    let hit = set.get_most_relevant(&segs("first.second.third")).expect("wildcard covers children");
    assert_eq!(hit.permission.arg(), Some("wild"));
    Ok(())
}

#[test]
fn a_deeper_permitting_entry_overrides_a_shallower_negation() -> anyhow::Result<()> {
    let mut set = PermissionSet::new();
    set.set("first: doot")?;
    set.set("-first.second")?;
    set.set("first.second.third")?;

    assert!(set.has_permission(&segs("first")));
    assert!(!set.has_permission(&segs("first.second")));
    assert!(set.has_permission(&segs("first.second.third")));
    Ok(())
}

#[test]
fn has_permission_or_any_under_is_false_at_a_negation_with_nothing_deeper() -> anyhow::Result<()> {
    let mut set = PermissionSet::new();
    set.set("first: doot")?;
    set.set("-first.second")?;

    assert!(!set.has_permission_or_any_under(&segs("first.second")));
    assert!(!set.has_permission_or_any_under(&segs("first.second.third")));
    Ok(())
}

#[test]
fn has_permission_or_any_under_recovers_once_something_deeper_permits() -> anyhow::Result<()> {
    let mut set = PermissionSet::new();
    set.set("-first.second")?;
    set.set("first.second.third")?;

    assert!(set.has_permission_or_any_under(&segs("first.second")));
    Ok(())
}

#[test]
fn group_references_cascade_in_descending_priority_with_name_as_tiebreak() -> anyhow::Result<()> {
    let mut groups: HashMap<String, PermissionGroup> = HashMap::new();

    let mut fallback1 = PermissionGroup::new("fallback1");
    fallback1.reassign_priority(21.0);
    fallback1.perms_mut().set("read.public")?;
    groups.insert("fallback1".to_string(), fallback1);

    let mut fallback2 = PermissionGroup::new("fallback2");
    fallback2.reassign_priority(13.0);
    fallback2.perms_mut().set("-read.public")?;
    groups.insert("fallback2".to_string(), fallback2);

    let mut fallback3 = PermissionGroup::new("fallback3");
    fallback3.reassign_priority(5.0);
    groups.insert("fallback3".to_string(), fallback3);

    let mut testgroup = PermissionGroup::new("testgroup");
    testgroup.add_reference("fallback2");
    testgroup.add_reference("fallback1");
    testgroup.add_reference("fallback3");

    assert_eq!(testgroup.sorted_refs(&groups), vec!["fallback1", "fallback2", "fallback3"]);

    let hit = testgroup.get_most_relevant(&segs("read.public"), &groups).expect("fallback1 permits");
    assert!(hit.permission.permits());
    Ok(())
}

#[test]
fn a_group_with_references_saves_them_in_priority_order_before_its_permissions() -> anyhow::Result<()> {
    let mut groups: HashMap<String, PermissionGroup> = HashMap::new();
    for (name, priority) in [("fallback1", 21.0), ("fallback2", 13.0), ("fallback3", 5.0)] {
        let mut g = PermissionGroup::new(name);
        g.reassign_priority(priority);
        groups.insert(name.to_string(), g);
    }

    let mut testgroup = PermissionGroup::new("testgroup");
    testgroup.reassign_priority(14.0);
    testgroup.add_reference("fallback3");
    testgroup.add_reference("fallback1");
    testgroup.add_reference("fallback2");
    testgroup.perms_mut().set("my.perm")?;
    groups.insert("testgroup".to_string(), testgroup.clone());

    let rendered = testgroup.to_save_string(&groups);
    assert_eq!(rendered, "testgroup: 14\n    #fallback1\n    #fallback2\n    #fallback3\n    my.perm");
    Ok(())
}

#[test]
fn a_multiline_arg_gets_a_second_indent_level_inside_a_group_body() -> anyhow::Result<()> {
    let mut groups: HashMap<String, PermissionGroup> = HashMap::new();
    let mut group1 = PermissionGroup::new("group1");
    group1.perms_mut().set("my.perm:\n    this is\n    some text\n    more")?;
    group1.perms_mut().set("my.perm.other")?;
    groups.insert("group1".to_string(), group1.clone());

    let rendered = group1.to_save_string(&groups);
    assert_eq!(
        rendered,
        "group1\n    my.perm:\n        this is\n        some text\n        more\n    my.perm.other"
    );
    Ok(())
}

#[test]
fn registry_cascade_reaches_the_default_group_only_for_users_not_named_groups() -> anyhow::Result<()> {
    let mut reg = registry();
    reg.assign_default_group("guests");
    reg.assign_group_permission("guests", "read.public")?;
    reg.create_group("empty");

    assert!(reg.user_has_permission(&"nobody".to_string(), "read.public"));
    assert!(!reg.group_has_permission("empty", "read.public"));
    Ok(())
}

#[test]
fn reference_cycles_between_groups_resolve_without_looping_forever() -> anyhow::Result<()> {
    let mut reg = registry();
    reg.assign_group_to_group("a", "b");
    reg.assign_group_to_group("b", "a");
    reg.assign_group_to_user(&"carol".to_string(), "a");

    assert!(!reg.user_has_permission(&"carol".to_string(), "anything"));
    assert!(reg.user_has_group(&"carol".to_string(), "a"));
    assert!(reg.user_has_group(&"carol".to_string(), "b"));
    Ok(())
}

#[test]
fn a_malformed_line_is_rejected_without_mutating_the_set() {
    let mut set = PermissionSet::new();
    let err = set.set("a..b").unwrap_err();
    assert!(matches!(err, ParseError::EmptySegment(_)));
    assert!(set.is_empty());
}

#[test]
fn save_and_load_agree_on_a_registry_with_users_groups_and_wildcards() -> anyhow::Result<()> {
    let mut reg = registry();
    reg.assign_user_permission(&"dave".to_string(), "a.b.*: wild")?;
    reg.assign_group_permission("staff", "a.b")?;
    reg.reassign_group_priority("staff", 7.0);
    reg.assign_group_to_user(&"dave".to_string(), "staff");
    reg.assign_default_group("staff");

    let saved = reg.save();
    let mut reloaded = registry();
    reloaded.load(&saved)?;

    assert!(reloaded.user_has_permission(&"dave".to_string(), "a.b.anything"));
    assert_eq!(reloaded.get_user_permission_arg(&"dave".to_string(), "a.b.anything").as_deref(), Some("wild"));
    assert!(reloaded.has_default_permission("a.b"));
    assert_eq!(reloaded.save(), saved);
    Ok(())
}
