//! Data model for one build's API surface.
//!
//! A [`Snapshot`] is the complete structured description of the API at a
//! single build: classes with their members (properties, functions, events,
//! callbacks) and enumerations with their items. Elements are plain owned
//! values; diffing and history replay clone the fragments they embed, so
//! nothing in this crate references shared mutable state.

mod change;
mod element;
mod value;

pub use element::{
    Callback, Class, Enum, EnumItem, Event, Function, Member, MemberKind, Parameter, Property,
    Snapshot, Tags, TypeRef,
};
pub use value::Value;
