//! Entity storage and history replay.

use std::collections::{BTreeMap, BTreeSet};

use apitrail_builds::{Action, ActionKind, Patch, Target};
use apitrail_model::{Class, Enum, EnumItem, Member, TypeRef};

use crate::GraphError;

/// Appends an action to the entity's copy of the given build's patch,
/// creating the copy if this is the first action of that build to touch
/// the entity. Attribution can pin actions to builds older than the
/// entity's latest, so the whole list is scanned, never just the tail.
fn add_event(history: &mut Vec<Patch>, source: &Patch, action: &Action) {
    if let Some(existing) = history.iter_mut().find(|p| p.info == source.info) {
        existing.actions.push(action.clone());
        return;
    }
    history.push(Patch {
        info: source.info.clone(),
        prev: source.prev.clone(),
        config: source.config.clone(),
        actions: vec![action.clone()],
        stale: source.stale,
    });
}

/// A class, current or removed, with its reconstructed state and history.
#[derive(Debug, Clone)]
pub struct ClassEntity {
    pub id: String,
    /// Denormalized current element, member list included.
    pub element: Class,
    pub removed: bool,
    /// Per-build patch copies, actions filtered to this entity.
    pub history: Vec<Patch>,
    /// Member ids whose current signature mentions this class.
    pub referrers: BTreeSet<(String, String)>,
}

/// A class member entity.
#[derive(Debug, Clone)]
pub struct MemberEntity {
    /// `(class id, member name)`.
    pub id: (String, String),
    pub element: Member,
    pub removed: bool,
    pub history: Vec<Patch>,
    /// Type keys the current signature mentions.
    pub references: BTreeSet<(String, String)>,
}

/// An enum entity.
#[derive(Debug, Clone)]
pub struct EnumEntity {
    pub id: String,
    /// Denormalized current element, item list included.
    pub element: Enum,
    pub removed: bool,
    pub history: Vec<Patch>,
    /// Member ids whose current signature mentions this enum.
    pub referrers: BTreeSet<(String, String)>,
}

/// An enum item entity.
#[derive(Debug, Clone)]
pub struct EnumItemEntity {
    /// `(enum id, item name)`.
    pub id: (String, String),
    pub element: EnumItem,
    pub removed: bool,
    pub history: Vec<Patch>,
}

/// A type mentioned by any member signature, past or present.
///
/// Types have no declarations of their own in the dump, so they are
/// materialized from use. A type is removed when no current signature of a
/// live member mentions it anymore.
#[derive(Debug, Clone)]
pub struct TypeEntity {
    /// `(category, name)`.
    pub id: (String, String),
    pub element: TypeRef,
    pub removed: bool,
    /// Member ids currently referencing the type.
    pub referrers: BTreeSet<(String, String)>,
    /// Member ids that referenced the type at some earlier build only.
    pub removed_referrers: BTreeSet<(String, String)>,
}

/// The reconstructed entity graph.
#[derive(Debug, Clone, Default)]
pub struct Entities {
    pub classes: BTreeMap<String, ClassEntity>,
    pub members: BTreeMap<(String, String), MemberEntity>,
    pub enums: BTreeMap<String, EnumEntity>,
    pub enum_items: BTreeMap<(String, String), EnumItemEntity>,
    pub types: BTreeMap<(String, String), TypeEntity>,
}

/// Replays the patch history into an entity graph and links references.
pub fn build_graph(patches: &[Patch]) -> Result<Entities, GraphError> {
    let mut entities = Entities::default();
    for patch in patches {
        for action in &patch.actions {
            entities.apply(patch, action)?;
        }
    }
    entities.link_references();
    Ok(entities)
}

impl Entities {
    fn apply(&mut self, source: &Patch, action: &Action) -> Result<(), GraphError> {
        match &action.target {
            Target::Class(class) => self.apply_class(source, action, class),
            Target::Member { owner, member } => self.apply_member(source, action, owner, member)?,
            Target::Enum(enum_) => self.apply_enum(source, action, enum_),
            Target::EnumItem { owner, item } => self.apply_enum_item(source, action, owner, item)?,
        }
        Ok(())
    }

    fn apply_class(&mut self, source: &Patch, action: &Action, class: &Class) {
        let created = !self.classes.contains_key(&class.name);
        let prior_element = self.classes.get(&class.name).map(|e| e.element.clone());
        let prior_event = self
            .classes
            .get(&class.name)
            .and_then(|e| e.history.last().cloned());

        let entity = self
            .classes
            .entry(class.name.clone())
            .or_insert_with(|| ClassEntity {
                id: class.name.clone(),
                element: class.clone(),
                removed: false,
                history: Vec::new(),
                referrers: BTreeSet::new(),
            });

        match action.kind {
            ActionKind::Add => {
                entity.element = class.clone();
                entity.removed = false;
            }
            ActionKind::Remove => {
                entity.removed = true;
            }
            ActionKind::Change => {
                if let Some(change) = &action.change {
                    entity.element.apply_change(&change.field, &change.next);
                }
            }
        }
        add_event(&mut entity.history, source, action);

        if action.kind == ActionKind::Add {
            // Re-adding a whole class resurrects the members it now
            // carries and implicitly retires the ones it no longer does.
            for member in &class.members {
                let key = (class.name.clone(), member.name().to_string());
                let member_entity =
                    self.members
                        .entry(key.clone())
                        .or_insert_with(|| MemberEntity {
                            id: key,
                            element: member.clone(),
                            removed: false,
                            history: Vec::new(),
                            references: BTreeSet::new(),
                        });
                member_entity.element = member.clone();
                member_entity.removed = false;
            }
            if !created {
                if let Some(old) = prior_element {
                    for member in &old.members {
                        if class.member(member.name()).is_none() {
                            let key = (class.name.clone(), member.name().to_string());
                            if let Some(member_entity) = self.members.get_mut(&key) {
                                member_entity.removed = true;
                                // The removal has no action of its own; pin
                                // it to the owner's previous event so the
                                // member's history still names a build.
                                if let Some(event) = &prior_event {
                                    if let Some(first) = event.actions.first() {
                                        add_event(&mut member_entity.history, event, first);
                                    }
                                }
                            }
                        }
                    }
                    for member in &class.members {
                        if old.member(member.name()).is_none() {
                            let key = (class.name.clone(), member.name().to_string());
                            if let Some(member_entity) = self.members.get_mut(&key) {
                                add_event(&mut member_entity.history, source, action);
                            }
                        }
                    }
                }
            }
        }
    }

    fn apply_member(
        &mut self,
        source: &Patch,
        action: &Action,
        owner: &Class,
        member: &Member,
    ) -> Result<(), GraphError> {
        let class_entity =
            self.classes
                .get_mut(&owner.name)
                .ok_or_else(|| GraphError::MissingOwner {
                    owner: owner.name.clone(),
                    member: member.name().to_string(),
                })?;

        // Keep the owner's denormalized member list in step.
        match action.kind {
            ActionKind::Add => {
                let element = &mut class_entity.element;
                match element.members.iter_mut().find(|m| m.name() == member.name()) {
                    Some(slot) => *slot = member.clone(),
                    None => element.members.push(member.clone()),
                }
            }
            ActionKind::Remove => {
                class_entity
                    .element
                    .members
                    .retain(|m| m.name() != member.name());
            }
            ActionKind::Change => {
                if let Some(change) = &action.change {
                    if let Some(slot) = class_entity
                        .element
                        .members
                        .iter_mut()
                        .find(|m| m.name() == member.name())
                    {
                        slot.apply_change(&change.field, &change.next);
                    }
                }
            }
        }

        let key = (owner.name.clone(), member.name().to_string());
        let entity = self
            .members
            .entry(key.clone())
            .or_insert_with(|| MemberEntity {
                id: key,
                element: member.clone(),
                removed: false,
                history: Vec::new(),
                references: BTreeSet::new(),
            });
        match action.kind {
            ActionKind::Add => {
                entity.element = member.clone();
                entity.removed = false;
            }
            ActionKind::Remove => {
                entity.removed = true;
            }
            ActionKind::Change => {
                if let Some(change) = &action.change {
                    entity.element.apply_change(&change.field, &change.next);
                }
            }
        }
        add_event(&mut entity.history, source, action);
        Ok(())
    }

    fn apply_enum(&mut self, source: &Patch, action: &Action, enum_: &Enum) {
        let created = !self.enums.contains_key(&enum_.name);
        let prior_element = self.enums.get(&enum_.name).map(|e| e.element.clone());
        let prior_event = self
            .enums
            .get(&enum_.name)
            .and_then(|e| e.history.last().cloned());

        let entity = self
            .enums
            .entry(enum_.name.clone())
            .or_insert_with(|| EnumEntity {
                id: enum_.name.clone(),
                element: enum_.clone(),
                removed: false,
                history: Vec::new(),
                referrers: BTreeSet::new(),
            });

        match action.kind {
            ActionKind::Add => {
                entity.element = enum_.clone();
                entity.removed = false;
            }
            ActionKind::Remove => {
                entity.removed = true;
            }
            ActionKind::Change => {
                if let Some(change) = &action.change {
                    entity.element.apply_change(&change.field, &change.next);
                }
            }
        }
        add_event(&mut entity.history, source, action);

        if action.kind == ActionKind::Add {
            for item in &enum_.items {
                let key = (enum_.name.clone(), item.name.clone());
                let item_entity =
                    self.enum_items
                        .entry(key.clone())
                        .or_insert_with(|| EnumItemEntity {
                            id: key,
                            element: item.clone(),
                            removed: false,
                            history: Vec::new(),
                        });
                item_entity.element = item.clone();
                item_entity.removed = false;
            }
            if !created {
                if let Some(old) = prior_element {
                    for item in &old.items {
                        if enum_.item(&item.name).is_none() {
                            let key = (enum_.name.clone(), item.name.clone());
                            if let Some(item_entity) = self.enum_items.get_mut(&key) {
                                item_entity.removed = true;
                                if let Some(event) = &prior_event {
                                    if let Some(first) = event.actions.first() {
                                        add_event(&mut item_entity.history, event, first);
                                    }
                                }
                            }
                        }
                    }
                    for item in &enum_.items {
                        if old.item(&item.name).is_none() {
                            let key = (enum_.name.clone(), item.name.clone());
                            if let Some(item_entity) = self.enum_items.get_mut(&key) {
                                add_event(&mut item_entity.history, source, action);
                            }
                        }
                    }
                }
            }
        }
    }

    fn apply_enum_item(
        &mut self,
        source: &Patch,
        action: &Action,
        owner: &Enum,
        item: &EnumItem,
    ) -> Result<(), GraphError> {
        let enum_entity =
            self.enums
                .get_mut(&owner.name)
                .ok_or_else(|| GraphError::MissingOwner {
                    owner: owner.name.clone(),
                    member: item.name.clone(),
                })?;

        match action.kind {
            ActionKind::Add => {
                let element = &mut enum_entity.element;
                match element.items.iter_mut().find(|i| i.name == item.name) {
                    Some(slot) => *slot = item.clone(),
                    None => element.items.push(item.clone()),
                }
            }
            ActionKind::Remove => {
                enum_entity.element.items.retain(|i| i.name != item.name);
            }
            ActionKind::Change => {
                if let Some(change) = &action.change {
                    if let Some(slot) = enum_entity
                        .element
                        .items
                        .iter_mut()
                        .find(|i| i.name == item.name)
                    {
                        slot.apply_change(&change.field, &change.next);
                    }
                }
            }
        }

        let key = (owner.name.clone(), item.name.clone());
        let entity = self
            .enum_items
            .entry(key.clone())
            .or_insert_with(|| EnumItemEntity {
                id: key,
                element: item.clone(),
                removed: false,
                history: Vec::new(),
            });
        match action.kind {
            ActionKind::Add => {
                entity.element = item.clone();
                entity.removed = false;
            }
            ActionKind::Remove => {
                entity.removed = true;
            }
            ActionKind::Change => {
                if let Some(change) = &action.change {
                    entity.element.apply_change(&change.field, &change.next);
                }
            }
        }
        add_event(&mut entity.history, source, action);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::*;

    #[test]
    fn add_then_remove_keeps_entity_with_history() {
        let patches = vec![
            patch("a", 1, vec![add_class(class("Widget", vec![]))]),
            patch("b", 2, vec![remove_class(class("Widget", vec![]))]),
        ];
        let graph = build_graph(&patches).unwrap();
        let entity = &graph.classes["Widget"];
        assert!(entity.removed);
        assert_eq!(entity.history.len(), 2);
        assert_eq!(entity.history[0].info.hash, "a");
        assert_eq!(entity.history[1].info.hash, "b");
    }

    #[test]
    fn readd_resurrects_removed_class() {
        let patches = vec![
            patch("a", 1, vec![add_class(class("Widget", vec![]))]),
            patch("b", 2, vec![remove_class(class("Widget", vec![]))]),
            patch("c", 3, vec![add_class(class("Widget", vec![]))]),
        ];
        let graph = build_graph(&patches).unwrap();
        assert!(!graph.classes["Widget"].removed);
        assert_eq!(graph.classes["Widget"].history.len(), 3);
    }

    #[test]
    fn whole_class_add_creates_member_entities() {
        let patches = vec![patch(
            "a",
            1,
            vec![add_class(class("Widget", vec![property("Size")]))],
        )];
        let graph = build_graph(&patches).unwrap();
        let key = ("Widget".to_string(), "Size".to_string());
        assert!(!graph.members[&key].removed);
        assert_eq!(graph.members[&key].element.name(), "Size");
    }

    #[test]
    fn member_add_updates_owner_element() {
        let patches = vec![
            patch("a", 1, vec![add_class(class("Widget", vec![]))]),
            patch("b", 2, vec![add_member("Widget", property("Size"))]),
        ];
        let graph = build_graph(&patches).unwrap();
        assert_eq!(graph.classes["Widget"].element.members.len(), 1);
        let key = ("Widget".to_string(), "Size".to_string());
        assert_eq!(graph.members[&key].history.len(), 1);
    }

    #[test]
    fn member_remove_marks_entity_and_trims_owner() {
        let patches = vec![
            patch(
                "a",
                1,
                vec![add_class(class("Widget", vec![property("Size")]))],
            ),
            patch("b", 2, vec![remove_member("Widget", property("Size"))]),
        ];
        let graph = build_graph(&patches).unwrap();
        assert!(graph.classes["Widget"].element.members.is_empty());
        let key = ("Widget".to_string(), "Size".to_string());
        assert!(graph.members[&key].removed);
    }

    #[test]
    fn member_change_applies_to_entity_and_owner() {
        let patches = vec![
            patch(
                "a",
                1,
                vec![add_class(class("Widget", vec![property("Size")]))],
            ),
            patch(
                "b",
                2,
                vec![change_member(
                    "Widget",
                    property("Size"),
                    "ReadSecurity",
                    "None",
                    "PluginSecurity",
                )],
            ),
        ];
        let graph = build_graph(&patches).unwrap();
        let key = ("Widget".to_string(), "Size".to_string());
        match &graph.members[&key].element {
            Member::Property(p) => assert_eq!(p.read_security, "PluginSecurity"),
            other => panic!("unexpected member: {other:?}"),
        }
        match &graph.classes["Widget"].element.members[0] {
            Member::Property(p) => assert_eq!(p.read_security, "PluginSecurity"),
            other => panic!("unexpected member: {other:?}"),
        }
    }

    #[test]
    fn member_action_without_owner_is_an_error() {
        let patches = vec![patch("a", 1, vec![add_member("Widget", property("Size"))])];
        assert!(matches!(
            build_graph(&patches),
            Err(GraphError::MissingOwner { .. })
        ));
    }

    #[test]
    fn readded_class_retires_members_it_no_longer_carries() {
        let patches = vec![
            patch(
                "a",
                1,
                vec![add_class(class("Widget", vec![property("Size")]))],
            ),
            patch("b", 2, vec![add_class(class("Widget", vec![property("Color")]))]),
        ];
        let graph = build_graph(&patches).unwrap();
        let size = &graph.members[&("Widget".to_string(), "Size".to_string())];
        assert!(size.removed);
        // The removal is pinned to the build of the owner's previous event.
        assert_eq!(size.history.last().unwrap().info.hash, "a");
        let color = &graph.members[&("Widget".to_string(), "Color".to_string())];
        assert!(!color.removed);
        assert_eq!(color.history.last().unwrap().info.hash, "b");
    }

    #[test]
    fn attribution_to_an_earlier_build_extends_its_event() {
        // Size is touched at builds a and b. Re-adding the class at c pins
        // the implicit removal back to build a, which must land in the
        // existing entry for a instead of splitting the build in two.
        let patches = vec![
            patch(
                "a",
                1,
                vec![
                    add_class(class("Widget", vec![])),
                    add_member("Widget", property("Size")),
                ],
            ),
            patch(
                "b",
                2,
                vec![change_member(
                    "Widget",
                    property("Size"),
                    "ReadSecurity",
                    "None",
                    "PluginSecurity",
                )],
            ),
            patch("c", 3, vec![add_class(class("Widget", vec![]))]),
        ];
        let graph = build_graph(&patches).unwrap();
        let size = &graph.members[&("Widget".to_string(), "Size".to_string())];
        assert!(size.removed);
        let hashes: Vec<&str> = size.history.iter().map(|p| p.info.hash.as_str()).collect();
        assert_eq!(hashes, ["a", "b"]);
        assert_eq!(size.history[0].actions.len(), 2);
    }

    #[test]
    fn enum_item_value_change_applies() {
        let patches = vec![
            patch(
                "a",
                1,
                vec![add_enum(enum_with_items("Shape", vec![("Round", 0)]))],
            ),
            patch(
                "b",
                2,
                vec![change_enum_item("Shape", item("Round", 0), "Value", 0, 4)],
            ),
        ];
        let graph = build_graph(&patches).unwrap();
        let key = ("Shape".to_string(), "Round".to_string());
        assert_eq!(graph.enum_items[&key].element.value, 4);
        assert_eq!(graph.enums["Shape"].element.items[0].value, 4);
    }

    #[test]
    fn history_groups_actions_by_build() {
        let patches = vec![patch(
            "a",
            1,
            vec![
                add_class(class("Widget", vec![])),
                change_class("Widget", "MemoryCategory", "", "Gui"),
            ],
        )];
        let graph = build_graph(&patches).unwrap();
        let entity = &graph.classes["Widget"];
        assert_eq!(entity.history.len(), 1);
        assert_eq!(entity.history[0].actions.len(), 2);
        assert_eq!(entity.element.memory_category, "Gui");
    }
}
