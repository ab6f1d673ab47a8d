//! Snapshot differ.
//!
//! Produces the action list that transforms one snapshot into the next.
//! Elements are identified by name; a member whose kind changed under the
//! same name is reported as a removal followed by an addition.

use apitrail_model::{Class, Enum, Member, Snapshot, Value};

use crate::{Action, ActionKind, FieldChange, Target};

/// Diffs two snapshots. A `None` previous snapshot yields pure additions,
/// which is how the first build in history is recorded.
pub fn diff_snapshots(prev: Option<&Snapshot>, next: &Snapshot) -> Vec<Action> {
    let mut actions = Vec::new();
    let Some(prev) = prev else {
        for class in &next.classes {
            actions.push(class_action(ActionKind::Add, class));
        }
        for enum_ in &next.enums {
            actions.push(enum_action(ActionKind::Add, enum_));
        }
        return actions;
    };

    for class in &next.classes {
        match prev.class(&class.name) {
            None => actions.push(class_action(ActionKind::Add, class)),
            Some(old) => diff_class(old, class, &mut actions),
        }
    }
    for class in &prev.classes {
        if next.class(&class.name).is_none() {
            actions.push(class_action(ActionKind::Remove, class));
        }
    }

    for enum_ in &next.enums {
        match prev.get_enum(&enum_.name) {
            None => actions.push(enum_action(ActionKind::Add, enum_)),
            Some(old) => diff_enum(old, enum_, &mut actions),
        }
    }
    for enum_ in &prev.enums {
        if next.get_enum(&enum_.name).is_none() {
            actions.push(enum_action(ActionKind::Remove, enum_));
        }
    }

    actions
}

fn class_action(kind: ActionKind, class: &Class) -> Action {
    Action {
        kind,
        index: 0,
        target: Target::Class(class.clone()),
        change: None,
    }
}

fn enum_action(kind: ActionKind, enum_: &Enum) -> Action {
    Action {
        kind,
        index: 0,
        target: Target::Enum(enum_.clone()),
        change: None,
    }
}

fn change<T: Into<Value>>(field: &str, prev: T, next: T) -> FieldChange {
    FieldChange {
        field: field.to_string(),
        prev: prev.into(),
        next: next.into(),
    }
}

fn diff_class(old: &Class, new: &Class, actions: &mut Vec<Action>) {
    let mut changes = Vec::new();
    if old.superclass != new.superclass {
        changes.push(change(
            "Superclass",
            old.superclass.as_str(),
            new.superclass.as_str(),
        ));
    }
    if old.memory_category != new.memory_category {
        changes.push(change(
            "MemoryCategory",
            old.memory_category.as_str(),
            new.memory_category.as_str(),
        ));
    }
    if old.tags != new.tags {
        changes.push(FieldChange {
            field: "Tags".to_string(),
            prev: Value::Tags(old.tags.0.clone()),
            next: Value::Tags(new.tags.0.clone()),
        });
    }
    for field_change in changes {
        actions.push(Action {
            kind: ActionKind::Change,
            index: 0,
            target: Target::Class(new.with_members_stripped()),
            change: Some(field_change),
        });
    }

    for member in &new.members {
        match old.member(member.name()) {
            None => actions.push(member_action(ActionKind::Add, new, member)),
            Some(old_member) if old_member.kind() != member.kind() => {
                actions.push(member_action(ActionKind::Remove, new, old_member));
                actions.push(member_action(ActionKind::Add, new, member));
            }
            Some(old_member) => diff_member(new, old_member, member, actions),
        }
    }
    for member in &old.members {
        if new.member(member.name()).is_none() {
            actions.push(member_action(ActionKind::Remove, new, member));
        }
    }
}

fn member_action(kind: ActionKind, owner: &Class, member: &Member) -> Action {
    Action {
        kind,
        index: 0,
        target: Target::Member {
            owner: owner.with_members_stripped(),
            member: member.clone(),
        },
        change: None,
    }
}

fn diff_member(owner: &Class, old: &Member, new: &Member, actions: &mut Vec<Action>) {
    let mut changes = Vec::new();
    match (old, new) {
        (Member::Property(o), Member::Property(n)) => {
            if o.value_type != n.value_type {
                changes.push(FieldChange {
                    field: "ValueType".to_string(),
                    prev: Value::Type(o.value_type.clone()),
                    next: Value::Type(n.value_type.clone()),
                });
            }
            if o.category != n.category {
                changes.push(change("Category", o.category.as_str(), n.category.as_str()));
            }
            if o.read_security != n.read_security {
                changes.push(change(
                    "ReadSecurity",
                    o.read_security.as_str(),
                    n.read_security.as_str(),
                ));
            }
            if o.write_security != n.write_security {
                changes.push(change(
                    "WriteSecurity",
                    o.write_security.as_str(),
                    n.write_security.as_str(),
                ));
            }
            if o.can_load != n.can_load {
                changes.push(change("CanLoad", o.can_load, n.can_load));
            }
            if o.can_save != n.can_save {
                changes.push(change("CanSave", o.can_save, n.can_save));
            }
            if o.tags != n.tags {
                changes.push(FieldChange {
                    field: "Tags".to_string(),
                    prev: Value::Tags(o.tags.0.clone()),
                    next: Value::Tags(n.tags.0.clone()),
                });
            }
        }
        (Member::Function(o), Member::Function(n)) => {
            if o.parameters != n.parameters {
                changes.push(FieldChange {
                    field: "Parameters".to_string(),
                    prev: Value::Parameters(o.parameters.clone()),
                    next: Value::Parameters(n.parameters.clone()),
                });
            }
            if o.return_type != n.return_type {
                changes.push(FieldChange {
                    field: "ReturnType".to_string(),
                    prev: Value::Type(o.return_type.clone()),
                    next: Value::Type(n.return_type.clone()),
                });
            }
            if o.security != n.security {
                changes.push(change("Security", o.security.as_str(), n.security.as_str()));
            }
            if o.tags != n.tags {
                changes.push(FieldChange {
                    field: "Tags".to_string(),
                    prev: Value::Tags(o.tags.0.clone()),
                    next: Value::Tags(n.tags.0.clone()),
                });
            }
        }
        (Member::Event(o), Member::Event(n)) => {
            if o.parameters != n.parameters {
                changes.push(FieldChange {
                    field: "Parameters".to_string(),
                    prev: Value::Parameters(o.parameters.clone()),
                    next: Value::Parameters(n.parameters.clone()),
                });
            }
            if o.security != n.security {
                changes.push(change("Security", o.security.as_str(), n.security.as_str()));
            }
            if o.tags != n.tags {
                changes.push(FieldChange {
                    field: "Tags".to_string(),
                    prev: Value::Tags(o.tags.0.clone()),
                    next: Value::Tags(n.tags.0.clone()),
                });
            }
        }
        (Member::Callback(o), Member::Callback(n)) => {
            if o.parameters != n.parameters {
                changes.push(FieldChange {
                    field: "Parameters".to_string(),
                    prev: Value::Parameters(o.parameters.clone()),
                    next: Value::Parameters(n.parameters.clone()),
                });
            }
            if o.return_type != n.return_type {
                changes.push(FieldChange {
                    field: "ReturnType".to_string(),
                    prev: Value::Type(o.return_type.clone()),
                    next: Value::Type(n.return_type.clone()),
                });
            }
            if o.security != n.security {
                changes.push(change("Security", o.security.as_str(), n.security.as_str()));
            }
            if o.tags != n.tags {
                changes.push(FieldChange {
                    field: "Tags".to_string(),
                    prev: Value::Tags(o.tags.0.clone()),
                    next: Value::Tags(n.tags.0.clone()),
                });
            }
        }
        // Kind mismatches are handled by the caller as remove + add.
        _ => {}
    }
    for field_change in changes {
        actions.push(Action {
            kind: ActionKind::Change,
            index: 0,
            target: Target::Member {
                owner: owner.with_members_stripped(),
                member: new.clone(),
            },
            change: Some(field_change),
        });
    }
}

fn diff_enum(old: &Enum, new: &Enum, actions: &mut Vec<Action>) {
    if old.tags != new.tags {
        actions.push(Action {
            kind: ActionKind::Change,
            index: 0,
            target: Target::Enum(new.with_items_stripped()),
            change: Some(FieldChange {
                field: "Tags".to_string(),
                prev: Value::Tags(old.tags.0.clone()),
                next: Value::Tags(new.tags.0.clone()),
            }),
        });
    }

    for item in &new.items {
        match old.item(&item.name) {
            None => actions.push(Action {
                kind: ActionKind::Add,
                index: 0,
                target: Target::EnumItem {
                    owner: new.with_items_stripped(),
                    item: item.clone(),
                },
                change: None,
            }),
            Some(old_item) => {
                let mut changes = Vec::new();
                if old_item.value != item.value {
                    changes.push(FieldChange {
                        field: "Value".to_string(),
                        prev: Value::Int(old_item.value as i64),
                        next: Value::Int(item.value as i64),
                    });
                }
                if old_item.tags != item.tags {
                    changes.push(FieldChange {
                        field: "Tags".to_string(),
                        prev: Value::Tags(old_item.tags.0.clone()),
                        next: Value::Tags(item.tags.0.clone()),
                    });
                }
                for field_change in changes {
                    actions.push(Action {
                        kind: ActionKind::Change,
                        index: 0,
                        target: Target::EnumItem {
                            owner: new.with_items_stripped(),
                            item: item.clone(),
                        },
                        change: Some(field_change),
                    });
                }
            }
        }
    }
    for item in &old.items {
        if new.item(&item.name).is_none() {
            actions.push(Action {
                kind: ActionKind::Remove,
                index: 0,
                target: Target::EnumItem {
                    owner: new.with_items_stripped(),
                    item: item.clone(),
                },
                change: None,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apitrail_model::{Callback, Enum, EnumItem, Event, Function, Property, Tags, TypeRef};

    fn property(name: &str, security: &str) -> Member {
        Member::Property(Property {
            name: name.to_string(),
            value_type: TypeRef::new("Primitive", "int"),
            category: String::new(),
            read_security: security.to_string(),
            write_security: security.to_string(),
            can_load: true,
            can_save: true,
            tags: Tags::default(),
        })
    }

    fn function(name: &str) -> Member {
        Member::Function(Function {
            name: name.to_string(),
            parameters: Vec::new(),
            return_type: TypeRef::new("Primitive", "void"),
            security: "None".to_string(),
            tags: Tags::default(),
        })
    }

    fn class(name: &str, members: Vec<Member>) -> Class {
        Class {
            name: name.to_string(),
            superclass: "Base".to_string(),
            memory_category: String::new(),
            members,
            tags: Tags::default(),
        }
    }

    fn snapshot(classes: Vec<Class>, enums: Vec<Enum>) -> Snapshot {
        Snapshot { classes, enums }
    }

    #[test]
    fn first_build_is_pure_additions() {
        let next = snapshot(
            vec![class("Widget", vec![property("Size", "None")])],
            vec![Enum {
                name: "Shape".to_string(),
                items: Vec::new(),
                tags: Tags::default(),
            }],
        );
        let actions = diff_snapshots(None, &next);
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| a.kind == ActionKind::Add));
        // Whole-element additions keep their children embedded.
        match &actions[0].target {
            Target::Class(c) => assert_eq!(c.members.len(), 1),
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn identical_snapshots_diff_to_nothing() {
        let snap = snapshot(vec![class("Widget", vec![property("Size", "None")])], vec![]);
        assert!(diff_snapshots(Some(&snap), &snap.clone()).is_empty());
    }

    #[test]
    fn member_addition_strips_owner() {
        let prev = snapshot(vec![class("Widget", vec![])], vec![]);
        let next = snapshot(vec![class("Widget", vec![property("Size", "None")])], vec![]);
        let actions = diff_snapshots(Some(&prev), &next);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::Add);
        match &actions[0].target {
            Target::Member { owner, member } => {
                assert!(owner.members.is_empty());
                assert_eq!(member.name(), "Size");
            }
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn field_change_produces_one_action_per_field() {
        let prev = snapshot(vec![class("Widget", vec![property("Size", "None")])], vec![]);
        let next = snapshot(
            vec![class("Widget", vec![property("Size", "PluginSecurity")])],
            vec![],
        );
        let actions = diff_snapshots(Some(&prev), &next);
        let fields: Vec<&str> = actions
            .iter()
            .filter_map(|a| a.change.as_ref().map(|c| c.field.as_str()))
            .collect();
        assert_eq!(fields, ["ReadSecurity", "WriteSecurity"]);
        let first = actions[0].change.as_ref().unwrap();
        assert_eq!(first.prev, Value::from("None"));
        assert_eq!(first.next, Value::from("PluginSecurity"));
    }

    #[test]
    fn member_kind_swap_is_remove_then_add() {
        let prev = snapshot(vec![class("Widget", vec![property("Act", "None")])], vec![]);
        let next = snapshot(vec![class("Widget", vec![function("Act")])], vec![]);
        let actions = diff_snapshots(Some(&prev), &next);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind, ActionKind::Remove);
        assert_eq!(actions[1].kind, ActionKind::Add);
    }

    #[test]
    fn class_removal_carries_full_element() {
        let prev = snapshot(vec![class("Widget", vec![property("Size", "None")])], vec![]);
        let next = snapshot(vec![], vec![]);
        let actions = diff_snapshots(Some(&prev), &next);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::Remove);
        match &actions[0].target {
            Target::Class(c) => assert_eq!(c.members.len(), 1),
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn enum_item_value_change() {
        let old = Enum {
            name: "Shape".to_string(),
            items: vec![EnumItem {
                name: "Round".to_string(),
                value: 0,
                tags: Tags::default(),
            }],
            tags: Tags::default(),
        };
        let mut new = old.clone();
        new.items[0].value = 2;
        let actions = diff_snapshots(
            Some(&snapshot(vec![], vec![old])),
            &snapshot(vec![], vec![new]),
        );
        assert_eq!(actions.len(), 1);
        let change = actions[0].change.as_ref().unwrap();
        assert_eq!(change.field, "Value");
        assert_eq!(change.prev, Value::Int(0));
        assert_eq!(change.next, Value::Int(2));
    }

    #[test]
    fn callback_return_type_change() {
        let make = |ret: &str| {
            snapshot(
                vec![class(
                    "Widget",
                    vec![Member::Callback(Callback {
                        name: "OnDraw".to_string(),
                        parameters: Vec::new(),
                        return_type: TypeRef::new("Primitive", ret),
                        security: "None".to_string(),
                        tags: Tags::default(),
                    })],
                )],
                vec![],
            )
        };
        let actions = diff_snapshots(Some(&make("void")), &make("bool"));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].change.as_ref().unwrap().field, "ReturnType");
    }

    #[test]
    fn event_parameter_change() {
        let make = |params: Vec<apitrail_model::Parameter>| {
            snapshot(
                vec![class(
                    "Widget",
                    vec![Member::Event(Event {
                        name: "Moved".to_string(),
                        parameters: params,
                        security: "None".to_string(),
                        tags: Tags::default(),
                    })],
                )],
                vec![],
            )
        };
        let param = apitrail_model::Parameter {
            param_type: TypeRef::new("Primitive", "int"),
            name: "delta".to_string(),
            default: None,
        };
        let actions = diff_snapshots(Some(&make(vec![])), &make(vec![param]));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].change.as_ref().unwrap().field, "Parameters");
    }

}
