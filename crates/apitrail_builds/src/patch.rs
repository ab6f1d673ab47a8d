//! Patches and the actions they contain.

use std::fmt;

use apitrail_model::{Class, Enum, EnumItem, Member, Value};
use apitrail_source::BuildInfo;

/// What an action does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Add,
    Remove,
    Change,
}

impl ActionKind {
    /// Past-tense phrase, used in rendered history.
    pub fn past(self) -> &'static str {
        match self {
            ActionKind::Add => "Added",
            ActionKind::Remove => "Removed",
            ActionKind::Change => "Changed",
        }
    }

    /// Ongoing-tense phrase.
    pub fn ongoing(self) -> &'static str {
        match self {
            ActionKind::Add => "Adding",
            ActionKind::Remove => "Removing",
            ActionKind::Change => "Changing",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::Add => "Add",
            ActionKind::Remove => "Remove",
            ActionKind::Change => "Change",
        };
        f.write_str(s)
    }
}

/// The element an action applies to.
///
/// Member and enum-item targets embed their owner with its child list
/// stripped, so an action is self-describing without duplicating the
/// owner's whole body.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Class(Class),
    Member { owner: Class, member: Member },
    Enum(Enum),
    EnumItem { owner: Enum, item: EnumItem },
}

impl Target {
    /// Stable identifier: `Name` for top-level elements, `Owner.Name` for
    /// members and enum items.
    pub fn id(&self) -> String {
        match self {
            Target::Class(c) => c.name.clone(),
            Target::Member { owner, member } => format!("{}.{}", owner.name, member.name()),
            Target::Enum(e) => e.name.clone(),
            Target::EnumItem { owner, item } => format!("{}.{}", owner.name, item.name),
        }
    }

    /// Human label for the target's element kind.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Target::Class(_) => "Class",
            Target::Member { member, .. } => match member {
                Member::Property(_) => "Property",
                Member::Function(_) => "Function",
                Member::Event(_) => "Event",
                Member::Callback(_) => "Callback",
            },
            Target::Enum(_) => "Enum",
            Target::EnumItem { .. } => "EnumItem",
        }
    }
}

/// One field transition within a change action.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub prev: Value,
    pub next: Value,
}

/// One recorded difference between two consecutive builds.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    /// Position of the action within its patch, assigned after merging.
    pub index: usize,
    pub target: Target,
    /// Present exactly when `kind` is [`ActionKind::Change`].
    pub change: Option<FieldChange>,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.kind.past(),
            self.target.kind_label(),
            self.target.id()
        )?;
        if let Some(change) = &self.change {
            write!(f, " ({})", change.field)?;
        }
        Ok(())
    }
}

/// The differences introduced by one build, relative to the one before it.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// The build this patch leads to.
    pub info: BuildInfo,
    /// The build the actions were diffed against. `None` for the first
    /// build in history.
    pub prev: Option<BuildInfo>,
    /// Name of the source the build came from.
    pub config: String,
    pub actions: Vec<Action>,
    /// Whether the patch was computed this run rather than reused from the
    /// cached manifest.
    pub stale: bool,
}

/// Merges two patch lists, combining actions for patches that describe the
/// same build and appending the rest. Actions from `right` are kept only
/// when `filter` accepts them.
pub fn merge_patches(
    left: &[Patch],
    right: &[Patch],
    filter: Option<&dyn Fn(&Action) -> bool>,
) -> Vec<Patch> {
    let mut merged = left.to_vec();
    for patch in right {
        let actions: Vec<Action> = patch
            .actions
            .iter()
            .filter(|a| filter.map_or(true, |f| f(a)))
            .cloned()
            .collect();
        if let Some(existing) = merged.iter_mut().find(|p| p.info == patch.info) {
            existing.actions.extend(actions);
        } else {
            merged.push(Patch {
                actions,
                ..patch.clone()
            });
        }
    }
    merged
}

/// Expands a whole-class or whole-enum action into one action per child,
/// with the same kind and the owner stripped. Other targets expand to
/// nothing.
pub fn subactions(action: &Action) -> Vec<Action> {
    match &action.target {
        Target::Class(class) => class
            .members
            .iter()
            .map(|member| Action {
                kind: action.kind,
                index: 0,
                target: Target::Member {
                    owner: class.with_members_stripped(),
                    member: member.clone(),
                },
                change: None,
            })
            .collect(),
        Target::Enum(enum_) => enum_
            .items
            .iter()
            .map(|item| Action {
                kind: action.kind,
                index: 0,
                target: Target::EnumItem {
                    owner: enum_.with_items_stripped(),
                    item: item.clone(),
                },
                change: None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
