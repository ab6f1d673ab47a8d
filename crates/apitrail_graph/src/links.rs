//! Cross-reference linking.
//!
//! Connects member entities to the type entities their signatures mention.
//! Current signatures of live members produce live references; everything
//! found only in history, or reachable only through removed elements,
//! marks the type as formerly referenced.

use apitrail_builds::{Action, Target};
use apitrail_model::{Member, TypeRef, Value};

use crate::entities::{Entities, TypeEntity};

/// Types mentioned by a member's signature.
fn signature_types(member: &Member) -> Vec<TypeRef> {
    match member {
        Member::Property(p) => vec![p.value_type.clone()],
        Member::Function(f) => {
            let mut types: Vec<TypeRef> =
                f.parameters.iter().map(|p| p.param_type.clone()).collect();
            types.push(f.return_type.clone());
            types
        }
        Member::Event(e) => e.parameters.iter().map(|p| p.param_type.clone()).collect(),
        Member::Callback(c) => {
            let mut types: Vec<TypeRef> =
                c.parameters.iter().map(|p| p.param_type.clone()).collect();
            types.push(c.return_type.clone());
            types
        }
    }
}

/// Types mentioned anywhere in a recorded action: the member payload plus
/// any type-shaped change operands.
fn action_types(action: &Action) -> Vec<TypeRef> {
    let mut types = Vec::new();
    if let Target::Member { member, .. } = &action.target {
        types.extend(signature_types(member));
    }
    if let Some(change) = &action.change {
        for value in [&change.prev, &change.next] {
            match value {
                Value::Type(t) => types.push(t.clone()),
                Value::Parameters(params) => {
                    types.extend(params.iter().map(|p| p.param_type.clone()));
                }
                _ => {}
            }
        }
    }
    types
}

impl Entities {
    pub(crate) fn link_references(&mut self) {
        // (member id, type, live) triples; live means the reference comes
        // from the current signature of a live member of a live owner.
        let mut refs: Vec<((String, String), TypeRef, bool)> = Vec::new();
        for (id, member) in &self.members {
            let owner_removed = self.classes.get(&id.0).map_or(true, |c| c.removed);
            let live = !member.removed && !owner_removed;
            for type_ref in signature_types(&member.element) {
                refs.push((id.clone(), type_ref, live));
            }
            for event in &member.history {
                for action in &event.actions {
                    for type_ref in action_types(action) {
                        refs.push((id.clone(), type_ref, false));
                    }
                }
            }
        }

        for (member_id, type_ref, live) in refs {
            if type_ref.name.is_empty() {
                continue;
            }
            let key = (type_ref.category.clone(), type_ref.name.clone());
            let entity = self.types.entry(key.clone()).or_insert_with(|| TypeEntity {
                id: key.clone(),
                element: type_ref.clone(),
                removed: true,
                referrers: Default::default(),
                removed_referrers: Default::default(),
            });
            if live {
                entity.removed = false;
                entity.referrers.insert(member_id.clone());
                match type_ref.category.as_str() {
                    "Class" => {
                        if let Some(class) = self.classes.get_mut(&type_ref.name) {
                            class.referrers.insert(member_id.clone());
                        }
                    }
                    "Enum" => {
                        if let Some(enum_) = self.enums.get_mut(&type_ref.name) {
                            enum_.referrers.insert(member_id.clone());
                        }
                    }
                    _ => {}
                }
                if let Some(member) = self.members.get_mut(&member_id) {
                    member.references.insert(key);
                }
            } else {
                entity.removed_referrers.insert(member_id);
            }
        }

        // A member that still references a type is not also a former
        // referrer of it.
        for type_entity in self.types.values_mut() {
            let current: Vec<_> = type_entity.referrers.iter().cloned().collect();
            for id in current {
                type_entity.removed_referrers.remove(&id);
            }
        }
    }
}
