//! Shared constructors for graph tests.

use apitrail_builds::{Action, ActionKind, FieldChange, Patch, Target};
use apitrail_model::{
    Class, Enum, EnumItem, Function, Member, Parameter, Property, Tags, TypeRef, Value,
};
use apitrail_source::{BuildInfo, Version};
use chrono::{TimeZone, Utc};

pub fn info(hash: &str, day: u32) -> BuildInfo {
    BuildInfo {
        hash: hash.to_string(),
        date: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).single().unwrap(),
        version: Version::new(0, 500 + day, 0, 0),
    }
}

pub fn patch(hash: &str, day: u32, actions: Vec<Action>) -> Patch {
    Patch {
        info: info(hash, day),
        prev: None,
        config: "primary".to_string(),
        actions,
        stale: false,
    }
}

pub fn class(name: &str, members: Vec<Member>) -> Class {
    Class {
        name: name.to_string(),
        superclass: String::new(),
        memory_category: String::new(),
        members,
        tags: Tags::default(),
    }
}

pub fn class_extending(name: &str, superclass: &str) -> Class {
    Class {
        superclass: superclass.to_string(),
        ..class(name, Vec::new())
    }
}

pub fn property(name: &str) -> Member {
    property_typed(name, "Primitive", "int")
}

pub fn property_typed(name: &str, category: &str, type_name: &str) -> Member {
    Member::Property(Property {
        name: name.to_string(),
        value_type: TypeRef::new(category, type_name),
        category: String::new(),
        read_security: "None".to_string(),
        write_security: "None".to_string(),
        can_load: false,
        can_save: false,
        tags: Tags::default(),
    })
}

pub fn function_returning(name: &str, category: &str, type_name: &str) -> Member {
    Member::Function(Function {
        name: name.to_string(),
        parameters: Vec::new(),
        return_type: TypeRef::new(category, type_name),
        security: "None".to_string(),
        tags: Tags::default(),
    })
}

pub fn param(name: &str, category: &str, type_name: &str) -> Parameter {
    Parameter {
        param_type: TypeRef::new(category, type_name),
        name: name.to_string(),
        default: None,
    }
}

pub fn item(name: &str, value: u32) -> EnumItem {
    EnumItem {
        name: name.to_string(),
        value,
        tags: Tags::default(),
    }
}

pub fn enum_with_items(name: &str, items: Vec<(&str, u32)>) -> Enum {
    Enum {
        name: name.to_string(),
        items: items.into_iter().map(|(n, v)| item(n, v)).collect(),
        tags: Tags::default(),
    }
}

pub fn add_class(class: Class) -> Action {
    Action {
        kind: ActionKind::Add,
        index: 0,
        target: Target::Class(class),
        change: None,
    }
}

pub fn remove_class(class: Class) -> Action {
    Action {
        kind: ActionKind::Remove,
        index: 0,
        target: Target::Class(class),
        change: None,
    }
}

pub fn change_class(name: &str, field: &str, prev: &str, next: &str) -> Action {
    Action {
        kind: ActionKind::Change,
        index: 0,
        target: Target::Class(class(name, Vec::new())),
        change: Some(FieldChange {
            field: field.to_string(),
            prev: Value::from(prev),
            next: Value::from(next),
        }),
    }
}

pub fn add_member(owner: &str, member: Member) -> Action {
    Action {
        kind: ActionKind::Add,
        index: 0,
        target: Target::Member {
            owner: class(owner, Vec::new()),
            member,
        },
        change: None,
    }
}

pub fn remove_member(owner: &str, member: Member) -> Action {
    Action {
        kind: ActionKind::Remove,
        index: 0,
        target: Target::Member {
            owner: class(owner, Vec::new()),
            member,
        },
        change: None,
    }
}

pub fn change_member(owner: &str, member: Member, field: &str, prev: &str, next: &str) -> Action {
    Action {
        kind: ActionKind::Change,
        index: 0,
        target: Target::Member {
            owner: class(owner, Vec::new()),
            member,
        },
        change: Some(FieldChange {
            field: field.to_string(),
            prev: Value::from(prev),
            next: Value::from(next),
        }),
    }
}

pub fn change_member_type(
    owner: &str,
    member: Member,
    field: &str,
    prev: TypeRef,
    next: TypeRef,
) -> Action {
    Action {
        kind: ActionKind::Change,
        index: 0,
        target: Target::Member {
            owner: class(owner, Vec::new()),
            member,
        },
        change: Some(FieldChange {
            field: field.to_string(),
            prev: Value::Type(prev),
            next: Value::Type(next),
        }),
    }
}

pub fn add_enum(enum_: Enum) -> Action {
    Action {
        kind: ActionKind::Add,
        index: 0,
        target: Target::Enum(enum_),
        change: None,
    }
}

pub fn change_enum_item(owner: &str, item: EnumItem, field: &str, prev: i64, next: i64) -> Action {
    Action {
        kind: ActionKind::Change,
        index: 0,
        target: Target::EnumItem {
            owner: enum_with_items(owner, Vec::new()),
            item,
        },
        change: Some(FieldChange {
            field: field.to_string(),
            prev: Value::Int(prev),
            next: Value::Int(next),
        }),
    }
}
