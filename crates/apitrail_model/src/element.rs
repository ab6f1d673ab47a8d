//! API surface element types.
//!
//! Field names mirror the JSON dump format consumed by the directory
//! source, so the structs double as the wire schema for snapshot files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A reference to a data type, as it appears in member signatures.
///
/// The category groups types for presentation ("Class", "Enum",
/// "Primitive", "DataType", ...); the name identifies the type within its
/// category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Type category. "Class" and "Enum" resolve to first-class entities.
    #[serde(default)]
    pub category: String,

    /// Type name.
    pub name: String,
}

impl TypeRef {
    /// Creates a type reference from a category and name.
    pub fn new(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.category.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.category, self.name)
        }
    }
}

/// One parameter of a function, event, or callback signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter type.
    #[serde(rename = "type")]
    pub param_type: TypeRef,

    /// Parameter name.
    pub name: String,

    /// Default value, if the parameter is optional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// An ordered list of element tags ("Deprecated", "NotBrowsable", ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags(pub Vec<String>);

impl Tags {
    /// Returns whether the given tag is present (case-sensitive).
    pub fn has(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }
}

impl From<Vec<&str>> for Tags {
    fn from(tags: Vec<&str>) -> Self {
        Self(tags.into_iter().map(str::to_string).collect())
    }
}

/// A property member: a named, typed value on a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Member name.
    pub name: String,
    /// Type of the stored value.
    pub value_type: TypeRef,
    /// Presentation category within the owning class.
    #[serde(default)]
    pub category: String,
    /// Security context required to read the property.
    #[serde(default)]
    pub read_security: String,
    /// Security context required to write the property.
    #[serde(default)]
    pub write_security: String,
    /// Whether the property is deserialized from files.
    #[serde(default)]
    pub can_load: bool,
    /// Whether the property is serialized to files.
    #[serde(default)]
    pub can_save: bool,
    /// Element tags.
    #[serde(default)]
    pub tags: Tags,
}

/// A function member: callable with parameters and a return type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// Member name.
    pub name: String,
    /// Ordered parameter list.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Return type.
    pub return_type: TypeRef,
    /// Security context required to call the function.
    #[serde(default)]
    pub security: String,
    /// Element tags.
    #[serde(default)]
    pub tags: Tags,
}

/// An event member: subscribable with a parameter signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Member name.
    pub name: String,
    /// Ordered parameter list delivered to listeners.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Security context required to connect to the event.
    #[serde(default)]
    pub security: String,
    /// Element tags.
    #[serde(default)]
    pub tags: Tags,
}

/// A callback member: a user-assignable function slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
    /// Member name.
    pub name: String,
    /// Ordered parameter list the callback receives.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Type the callback must return.
    pub return_type: TypeRef,
    /// Security context required to assign the callback.
    #[serde(default)]
    pub security: String,
    /// Element tags.
    #[serde(default)]
    pub tags: Tags,
}

/// The kind of a class member, in fixed presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    /// A typed value slot.
    Property,
    /// A callable function.
    Function,
    /// A subscribable event.
    Event,
    /// A user-assignable function slot.
    Callback,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemberKind::Property => "Property",
            MemberKind::Function => "Function",
            MemberKind::Event => "Event",
            MemberKind::Callback => "Callback",
        };
        f.write_str(s)
    }
}

/// A class member, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "member_type")]
pub enum Member {
    /// Property member.
    Property(Property),
    /// Function member.
    Function(Function),
    /// Event member.
    Event(Event),
    /// Callback member.
    Callback(Callback),
}

impl Member {
    /// Returns the member's name.
    pub fn name(&self) -> &str {
        match self {
            Member::Property(m) => &m.name,
            Member::Function(m) => &m.name,
            Member::Event(m) => &m.name,
            Member::Callback(m) => &m.name,
        }
    }

    /// Returns the member's kind tag.
    pub fn kind(&self) -> MemberKind {
        match self {
            Member::Property(_) => MemberKind::Property,
            Member::Function(_) => MemberKind::Function,
            Member::Event(_) => MemberKind::Event,
            Member::Callback(_) => MemberKind::Callback,
        }
    }

    /// Returns the member's tags.
    pub fn tags(&self) -> &Tags {
        match self {
            Member::Property(m) => &m.tags,
            Member::Function(m) => &m.tags,
            Member::Event(m) => &m.tags,
            Member::Callback(m) => &m.tags,
        }
    }

    /// Returns the single security context for non-property members,
    /// or `None` for properties (which carry read/write contexts).
    pub fn security(&self) -> Option<&str> {
        match self {
            Member::Property(_) => None,
            Member::Function(m) => Some(&m.security),
            Member::Event(m) => Some(&m.security),
            Member::Callback(m) => Some(&m.security),
        }
    }

    /// Returns `(read, write)` security contexts for properties.
    pub fn read_write_security(&self) -> Option<(&str, &str)> {
        match self {
            Member::Property(m) => Some((&m.read_security, &m.write_security)),
            _ => None,
        }
    }
}

/// A class: a named collection of members with an optional superclass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    /// Class name; the class identifier.
    pub name: String,
    /// Superclass name; empty for root classes.
    #[serde(default)]
    pub superclass: String,
    /// Memory accounting category.
    #[serde(default)]
    pub memory_category: String,
    /// Owned members.
    #[serde(default)]
    pub members: Vec<Member>,
    /// Element tags.
    #[serde(default)]
    pub tags: Tags,
}

impl Class {
    /// Looks up a member by name.
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// Returns a copy of the class with its member list emptied.
    ///
    /// Used when embedding the owner into member-level actions, so the
    /// action does not duplicate the whole member list.
    pub fn with_members_stripped(&self) -> Class {
        Class {
            members: Vec::new(),
            ..self.clone()
        }
    }
}

/// One item of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumItem {
    /// Item name.
    pub name: String,
    /// Underlying integer value.
    pub value: u32,
    /// Element tags.
    #[serde(default)]
    pub tags: Tags,
}

/// An enumeration: a named collection of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enum {
    /// Enum name; the enum identifier.
    pub name: String,
    /// Owned items.
    #[serde(default)]
    pub items: Vec<EnumItem>,
    /// Element tags.
    #[serde(default)]
    pub tags: Tags,
}

impl Enum {
    /// Looks up an item by name.
    pub fn item(&self, name: &str) -> Option<&EnumItem> {
        self.items.iter().find(|i| i.name == name)
    }

    /// Returns a copy of the enum with its item list emptied.
    pub fn with_items_stripped(&self) -> Enum {
        Enum {
            items: Vec::new(),
            ..self.clone()
        }
    }
}

/// A complete API surface at one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// All classes, in dump order.
    #[serde(default)]
    pub classes: Vec<Class>,
    /// All enums, in dump order.
    #[serde(default)]
    pub enums: Vec<Enum>,
}

impl Snapshot {
    /// Looks up a class by name.
    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Looks up an enum by name.
    pub fn get_enum(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }
}
