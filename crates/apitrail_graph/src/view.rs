//! Sorted projections and history views over the entity graph.

use std::collections::HashSet;

use apitrail_builds::{merge_patches, Action, Patch, Target};

use crate::entities::{
    ClassEntity, Entities, EnumEntity, EnumItemEntity, MemberEntity, TypeEntity,
};

impl Entities {
    /// All classes, sorted by id.
    pub fn class_list(&self) -> Vec<&ClassEntity> {
        self.classes.values().collect()
    }

    /// Members of one class, sorted by kind then name.
    pub fn member_list(&self, class: &str) -> Vec<&MemberEntity> {
        let mut members: Vec<&MemberEntity> = self
            .members
            .values()
            .filter(|m| m.id.0 == class)
            .collect();
        members.sort_by(|a, b| {
            (a.element.kind(), a.element.name()).cmp(&(b.element.kind(), b.element.name()))
        });
        members
    }

    /// All enums, sorted by id.
    pub fn enum_list(&self) -> Vec<&EnumEntity> {
        self.enums.values().collect()
    }

    /// Items of one enum, sorted by value then name.
    pub fn item_list(&self, enum_name: &str) -> Vec<&EnumItemEntity> {
        let mut items: Vec<&EnumItemEntity> = self
            .enum_items
            .values()
            .filter(|i| i.id.0 == enum_name)
            .collect();
        items.sort_by(|a, b| {
            (a.element.value, &a.element.name).cmp(&(b.element.value, &b.element.name))
        });
        items
    }

    /// All types, sorted by category then name.
    pub fn type_list(&self) -> Vec<&TypeEntity> {
        self.types.values().collect()
    }

    /// Types grouped by category, categories in sorted order.
    pub fn type_categories(&self) -> Vec<(&str, Vec<&TypeEntity>)> {
        let mut categories: Vec<(&str, Vec<&TypeEntity>)> = Vec::new();
        for entity in self.types.values() {
            match categories.last_mut() {
                Some((category, group)) if *category == entity.id.0 => group.push(entity),
                _ => categories.push((entity.id.0.as_str(), vec![entity])),
            }
        }
        categories
    }

    /// Live classes whose superclass is absent or removed; the roots of the
    /// inheritance tree.
    pub fn tree_roots(&self) -> Vec<&ClassEntity> {
        self.classes
            .values()
            .filter(|c| !c.removed)
            .filter(|c| {
                self.classes
                    .get(&c.element.superclass)
                    .map_or(true, |parent| parent.removed)
            })
            .collect()
    }

    /// Live direct subclasses of a class, sorted by id.
    pub fn subclasses(&self, class: &str) -> Vec<&ClassEntity> {
        self.classes
            .values()
            .filter(|c| !c.removed && c.element.superclass == class)
            .collect()
    }

    /// Live ancestors of a class, nearest first, stopping at the first
    /// missing or removed superclass.
    pub fn superclass_chain(&self, class: &str) -> Vec<&ClassEntity> {
        let mut chain = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = match self.classes.get(class) {
            Some(entity) => entity.element.superclass.as_str(),
            None => return chain,
        };
        seen.insert(class);
        while let Some(parent) = self.classes.get(current) {
            if parent.removed || !seen.insert(current) {
                break;
            }
            chain.push(parent);
            current = parent.element.superclass.as_str();
        }
        chain
    }

    /// A class's complete history: its own patches unioned with its
    /// members' member-targeted actions, grouped by build and ordered by
    /// date. Whole-class actions attached to member histories for
    /// attribution are filtered out, so no action appears twice.
    pub fn class_history(&self, class: &str) -> Vec<Patch> {
        let mut events = self
            .classes
            .get(class)
            .map(|c| c.history.clone())
            .unwrap_or_default();
        let member_only = |a: &Action| matches!(a.target, Target::Member { .. });
        for member in self.members.values().filter(|m| m.id.0 == class) {
            events = merge_patches(&events, &member.history, Some(&member_only));
        }
        finish_history(&mut events);
        events
    }

    /// An enum's complete history, analogous to [`Entities::class_history`].
    pub fn enum_history(&self, enum_name: &str) -> Vec<Patch> {
        let mut events = self
            .enums
            .get(enum_name)
            .map(|e| e.history.clone())
            .unwrap_or_default();
        let item_only = |a: &Action| matches!(a.target, Target::EnumItem { .. });
        for item in self.enum_items.values().filter(|i| i.id.0 == enum_name) {
            events = merge_patches(&events, &item.history, Some(&item_only));
        }
        finish_history(&mut events);
        events
    }
}

/// Orders patches by build date and restores patch order within each one
/// from the actions' positional indices.
fn finish_history(events: &mut [Patch]) {
    events.sort_by(|a, b| {
        (a.info.date, &a.info.hash).cmp(&(b.info.date, &b.info.hash))
    });
    for event in events {
        event.actions.sort_by_key(|a| a.index);
    }
}
