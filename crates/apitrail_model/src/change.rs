//! Field-level change application.
//!
//! Replaying a Change action mutates the current element snapshot in
//! place. A field name paired with a value of the wrong shape is ignored,
//! matching the permissive patcher the history format was recorded with.

use crate::element::{Class, Enum, EnumItem, Member, Tags};
use crate::value::Value;

impl Class {
    /// Applies a field change to this class.
    pub fn apply_change(&mut self, field: &str, next: &Value) {
        match (field, next) {
            ("Name", Value::String(s)) => self.name = s.clone(),
            ("Superclass", Value::String(s)) => self.superclass = s.clone(),
            ("MemoryCategory", Value::String(s)) => self.memory_category = s.clone(),
            ("Tags", Value::Tags(t)) => self.tags = Tags(t.clone()),
            _ => {}
        }
    }
}

impl Member {
    /// Applies a field change to this member.
    pub fn apply_change(&mut self, field: &str, next: &Value) {
        match self {
            Member::Property(m) => match (field, next) {
                ("Name", Value::String(s)) => m.name = s.clone(),
                ("ValueType", Value::Type(t)) => m.value_type = t.clone(),
                ("Category", Value::String(s)) => m.category = s.clone(),
                ("ReadSecurity", Value::String(s)) => m.read_security = s.clone(),
                ("WriteSecurity", Value::String(s)) => m.write_security = s.clone(),
                ("CanLoad", Value::Bool(b)) => m.can_load = *b,
                ("CanSave", Value::Bool(b)) => m.can_save = *b,
                ("Tags", Value::Tags(t)) => m.tags = Tags(t.clone()),
                _ => {}
            },
            Member::Function(m) => match (field, next) {
                ("Name", Value::String(s)) => m.name = s.clone(),
                ("Parameters", Value::Parameters(p)) => m.parameters = p.clone(),
                ("ReturnType", Value::Type(t)) => m.return_type = t.clone(),
                ("Security", Value::String(s)) => m.security = s.clone(),
                ("Tags", Value::Tags(t)) => m.tags = Tags(t.clone()),
                _ => {}
            },
            Member::Event(m) => match (field, next) {
                ("Name", Value::String(s)) => m.name = s.clone(),
                ("Parameters", Value::Parameters(p)) => m.parameters = p.clone(),
                ("Security", Value::String(s)) => m.security = s.clone(),
                ("Tags", Value::Tags(t)) => m.tags = Tags(t.clone()),
                _ => {}
            },
            Member::Callback(m) => match (field, next) {
                ("Name", Value::String(s)) => m.name = s.clone(),
                ("Parameters", Value::Parameters(p)) => m.parameters = p.clone(),
                ("ReturnType", Value::Type(t)) => m.return_type = t.clone(),
                ("Security", Value::String(s)) => m.security = s.clone(),
                ("Tags", Value::Tags(t)) => m.tags = Tags(t.clone()),
                _ => {}
            },
        }
    }
}

impl Enum {
    /// Applies a field change to this enum.
    pub fn apply_change(&mut self, field: &str, next: &Value) {
        match (field, next) {
            ("Name", Value::String(s)) => self.name = s.clone(),
            ("Tags", Value::Tags(t)) => self.tags = Tags(t.clone()),
            _ => {}
        }
    }
}

impl EnumItem {
    /// Applies a field change to this enum item.
    pub fn apply_change(&mut self, field: &str, next: &Value) {
        match (field, next) {
            ("Name", Value::String(s)) => self.name = s.clone(),
            ("Value", Value::Int(n)) => self.value = *n as u32,
            ("Tags", Value::Tags(t)) => self.tags = Tags(t.clone()),
            _ => {}
        }
    }
}
