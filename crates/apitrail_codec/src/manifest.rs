//! Patch manifest codec.
//!
//! The manifest serializes the complete patch history. Strings are
//! u8-length-prefixed UTF-8, integers little-endian. Every action starts
//! with one tag byte: bits 0-1 carry the action kind offset by one so that
//! zero never names a valid kind, bits 2-4 carry the target shape. The
//! target's elements follow, then, for change actions, the field name and
//! both operand values.
//!
//! Decoding is strict. The stream has no skippable regions, so any
//! unknown tag fails the whole read rather than guessing at alignment.

use std::io::{Read, Write};

use apitrail_builds::{Action, ActionKind, FieldChange, Patch, Target};
use apitrail_model::{
    Callback, Class, Enum, EnumItem, Event, Function, Member, Parameter, Property, Tags, TypeRef,
    Value,
};
use apitrail_source::{BuildInfo, Version};
use chrono::{DateTime, Utc};

use crate::rw::{Reader, Writer};
use crate::CodecError;

// Action tag byte: bits 0-1 kind, bits 2-4 target shape.
const KIND_MASK: u8 = 0b0000_0011;
const TARGET_SHIFT: u8 = 2;
const TARGET_MASK: u8 = 0b0000_0111;

const KIND_ADD: u8 = 1;
const KIND_REMOVE: u8 = 2;
const KIND_CHANGE: u8 = 3;

// Target shapes. 1-4 are member actions (owner class then member body),
// 5 a whole class, 6 an enum item (owner enum then item), 7 a whole enum.
const TARGET_PROPERTY: u8 = 1;
const TARGET_FUNCTION: u8 = 2;
const TARGET_EVENT: u8 = 3;
const TARGET_CALLBACK: u8 = 4;
const TARGET_CLASS: u8 = 5;
const TARGET_ENUM_ITEM: u8 = 6;
const TARGET_ENUM: u8 = 7;

// Value tags.
const VALUE_FALSE: u8 = 1;
const VALUE_TRUE: u8 = 2;
const VALUE_INT: u8 = 3;
const VALUE_STRING: u8 = 4;
const VALUE_TYPE: u8 = 5;
const VALUE_STRING_LIST: u8 = 6;
const VALUE_PARAMETERS: u8 = 7;

// Member kind bytes inside class bodies.
const MEMBER_PROPERTY: u8 = 0;
const MEMBER_FUNCTION: u8 = 1;
const MEMBER_EVENT: u8 = 2;
const MEMBER_CALLBACK: u8 = 3;

// Property flags byte.
const PROP_CAN_LOAD: u8 = 1 << 0;
const PROP_CAN_SAVE: u8 = 1 << 1;

/// Serializes the patch history.
pub fn encode_manifest<W: Write>(patches: &[Patch], out: W) -> Result<(), CodecError> {
    let mut w = Writer::new(out);
    w.write_u32(patches.len() as u32)?;
    for patch in patches {
        write_build_info(&mut w, &patch.info)?;
        match &patch.prev {
            Some(prev) => {
                w.write_u8(1)?;
                write_build_info(&mut w, prev)?;
            }
            None => w.write_u8(0)?,
        }
        w.write_str(&patch.config)?;
        w.write_u32(patch.actions.len() as u32)?;
        for action in &patch.actions {
            write_action(&mut w, action)?;
        }
    }
    Ok(())
}

/// Deserializes the patch history. Decoded patches come out with `stale`
/// cleared and action indices assigned from stream position.
pub fn decode_manifest<R: Read>(input: R) -> Result<Vec<Patch>, CodecError> {
    let mut r = Reader::new(input);
    let count = r.read_u32()?;
    let mut patches = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let info = read_build_info(&mut r)?;
        let prev = if r.read_bool()? {
            Some(read_build_info(&mut r)?)
        } else {
            None
        };
        let config = r.read_str()?;
        let action_count = r.read_u32()?;
        let mut actions = Vec::with_capacity(action_count as usize);
        for index in 0..action_count {
            let mut action = read_action(&mut r)?;
            action.index = index as usize;
            actions.push(action);
        }
        patches.push(Patch {
            info,
            prev,
            config,
            actions,
            stale: false,
        });
    }
    Ok(patches)
}

fn write_build_info<W: Write>(w: &mut Writer<W>, info: &BuildInfo) -> Result<(), CodecError> {
    w.write_str(&info.hash)?;
    w.write_str(&info.date.to_rfc3339())?;
    w.write_u32(info.version.major)?;
    w.write_u32(info.version.minor)?;
    w.write_u32(info.version.maint)?;
    w.write_u32(info.version.build)?;
    Ok(())
}

fn read_build_info<R: Read>(r: &mut Reader<R>) -> Result<BuildInfo, CodecError> {
    let hash = r.read_str()?;
    let date_text = r.read_str()?;
    let date = DateTime::parse_from_rfc3339(&date_text)
        .map_err(|_| CodecError::InvalidDate(date_text))?
        .with_timezone(&Utc);
    let version = Version {
        major: r.read_u32()?,
        minor: r.read_u32()?,
        maint: r.read_u32()?,
        build: r.read_u32()?,
    };
    Ok(BuildInfo {
        hash,
        date,
        version,
    })
}

fn write_action<W: Write>(w: &mut Writer<W>, action: &Action) -> Result<(), CodecError> {
    let kind = match action.kind {
        ActionKind::Add => KIND_ADD,
        ActionKind::Remove => KIND_REMOVE,
        ActionKind::Change => KIND_CHANGE,
    };
    let target = match &action.target {
        Target::Member { member, .. } => match member {
            Member::Property(_) => TARGET_PROPERTY,
            Member::Function(_) => TARGET_FUNCTION,
            Member::Event(_) => TARGET_EVENT,
            Member::Callback(_) => TARGET_CALLBACK,
        },
        Target::Class(_) => TARGET_CLASS,
        Target::EnumItem { .. } => TARGET_ENUM_ITEM,
        Target::Enum(_) => TARGET_ENUM,
    };
    w.write_u8(kind | (target << TARGET_SHIFT))?;

    match &action.target {
        Target::Class(class) => write_class(w, class)?,
        Target::Member { owner, member } => {
            write_class(w, owner)?;
            write_member_body(w, member)?;
        }
        Target::Enum(enum_) => write_enum(w, enum_)?,
        Target::EnumItem { owner, item } => {
            write_enum(w, owner)?;
            write_enum_item(w, item)?;
        }
    }

    if action.kind == ActionKind::Change {
        // Change actions always carry a field change; an empty one keeps
        // the stream aligned regardless.
        let empty = FieldChange {
            field: String::new(),
            prev: Value::Bool(false),
            next: Value::Bool(false),
        };
        let change = action.change.as_ref().unwrap_or(&empty);
        w.write_str(&change.field)?;
        write_value(w, &change.prev)?;
        write_value(w, &change.next)?;
    }
    Ok(())
}

fn read_action<R: Read>(r: &mut Reader<R>) -> Result<Action, CodecError> {
    let tag = r.read_u8()?;
    let kind = match tag & KIND_MASK {
        KIND_ADD => ActionKind::Add,
        KIND_REMOVE => ActionKind::Remove,
        KIND_CHANGE => ActionKind::Change,
        value => return Err(CodecError::InvalidTag {
            what: "action kind",
            value,
        }),
    };
    let target = match (tag >> TARGET_SHIFT) & TARGET_MASK {
        TARGET_CLASS => Target::Class(read_class(r)?),
        shape @ (TARGET_PROPERTY | TARGET_FUNCTION | TARGET_EVENT | TARGET_CALLBACK) => {
            let owner = read_class(r)?;
            let member = read_member_body(r, shape)?;
            Target::Member { owner, member }
        }
        TARGET_ENUM => Target::Enum(read_enum(r)?),
        TARGET_ENUM_ITEM => {
            let owner = read_enum(r)?;
            let item = read_enum_item(r)?;
            Target::EnumItem { owner, item }
        }
        value => {
            return Err(CodecError::InvalidTag {
                what: "action target",
                value,
            })
        }
    };
    let change = if kind == ActionKind::Change {
        Some(FieldChange {
            field: r.read_str()?,
            prev: read_value(r)?,
            next: read_value(r)?,
        })
    } else {
        None
    };
    Ok(Action {
        kind,
        index: 0,
        target,
        change,
    })
}

fn write_class<W: Write>(w: &mut Writer<W>, class: &Class) -> Result<(), CodecError> {
    w.write_str(&class.name)?;
    w.write_str(&class.superclass)?;
    w.write_str(&class.memory_category)?;
    w.write_u32(class.members.len() as u32)?;
    for member in &class.members {
        let kind = match member {
            Member::Property(_) => MEMBER_PROPERTY,
            Member::Function(_) => MEMBER_FUNCTION,
            Member::Event(_) => MEMBER_EVENT,
            Member::Callback(_) => MEMBER_CALLBACK,
        };
        w.write_u8(kind)?;
        write_member_body(w, member)?;
    }
    write_tags(w, &class.tags)?;
    Ok(())
}

fn read_class<R: Read>(r: &mut Reader<R>) -> Result<Class, CodecError> {
    let name = r.read_str()?;
    let superclass = r.read_str()?;
    let memory_category = r.read_str()?;
    let count = r.read_u32()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let kind = r.read_u8()?;
        let shape = match kind {
            MEMBER_PROPERTY => TARGET_PROPERTY,
            MEMBER_FUNCTION => TARGET_FUNCTION,
            MEMBER_EVENT => TARGET_EVENT,
            MEMBER_CALLBACK => TARGET_CALLBACK,
            value => {
                return Err(CodecError::InvalidTag {
                    what: "member kind",
                    value,
                })
            }
        };
        members.push(read_member_body(r, shape)?);
    }
    let tags = read_tags(r)?;
    Ok(Class {
        name,
        superclass,
        memory_category,
        members,
        tags,
    })
}

fn write_member_body<W: Write>(w: &mut Writer<W>, member: &Member) -> Result<(), CodecError> {
    match member {
        Member::Property(p) => {
            w.write_str(&p.name)?;
            write_type_ref(w, &p.value_type)?;
            w.write_str(&p.category)?;
            w.write_str(&p.read_security)?;
            w.write_str(&p.write_security)?;
            let mut flags = 0u8;
            if p.can_load {
                flags |= PROP_CAN_LOAD;
            }
            if p.can_save {
                flags |= PROP_CAN_SAVE;
            }
            w.write_u8(flags)?;
            write_tags(w, &p.tags)?;
        }
        Member::Function(f) => {
            w.write_str(&f.name)?;
            write_parameters(w, &f.parameters)?;
            write_type_ref(w, &f.return_type)?;
            w.write_str(&f.security)?;
            write_tags(w, &f.tags)?;
        }
        Member::Event(e) => {
            w.write_str(&e.name)?;
            write_parameters(w, &e.parameters)?;
            w.write_str(&e.security)?;
            write_tags(w, &e.tags)?;
        }
        Member::Callback(c) => {
            w.write_str(&c.name)?;
            write_parameters(w, &c.parameters)?;
            write_type_ref(w, &c.return_type)?;
            w.write_str(&c.security)?;
            write_tags(w, &c.tags)?;
        }
    }
    Ok(())
}

fn read_member_body<R: Read>(r: &mut Reader<R>, shape: u8) -> Result<Member, CodecError> {
    let member = match shape {
        TARGET_PROPERTY => {
            let name = r.read_str()?;
            let value_type = read_type_ref(r)?;
            let category = r.read_str()?;
            let read_security = r.read_str()?;
            let write_security = r.read_str()?;
            let flags = r.read_u8()?;
            let tags = read_tags(r)?;
            Member::Property(Property {
                name,
                value_type,
                category,
                read_security,
                write_security,
                can_load: flags & PROP_CAN_LOAD != 0,
                can_save: flags & PROP_CAN_SAVE != 0,
                tags,
            })
        }
        TARGET_FUNCTION => Member::Function(Function {
            name: r.read_str()?,
            parameters: read_parameters(r)?,
            return_type: read_type_ref(r)?,
            security: r.read_str()?,
            tags: read_tags(r)?,
        }),
        TARGET_EVENT => Member::Event(Event {
            name: r.read_str()?,
            parameters: read_parameters(r)?,
            security: r.read_str()?,
            tags: read_tags(r)?,
        }),
        TARGET_CALLBACK => Member::Callback(Callback {
            name: r.read_str()?,
            parameters: read_parameters(r)?,
            return_type: read_type_ref(r)?,
            security: r.read_str()?,
            tags: read_tags(r)?,
        }),
        value => {
            return Err(CodecError::InvalidTag {
                what: "member shape",
                value,
            })
        }
    };
    Ok(member)
}

fn write_enum<W: Write>(w: &mut Writer<W>, enum_: &Enum) -> Result<(), CodecError> {
    w.write_str(&enum_.name)?;
    w.write_u32(enum_.items.len() as u32)?;
    for item in &enum_.items {
        write_enum_item(w, item)?;
    }
    write_tags(w, &enum_.tags)?;
    Ok(())
}

fn read_enum<R: Read>(r: &mut Reader<R>) -> Result<Enum, CodecError> {
    let name = r.read_str()?;
    let count = r.read_u32()?;
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        items.push(read_enum_item(r)?);
    }
    let tags = read_tags(r)?;
    Ok(Enum { name, items, tags })
}

fn write_enum_item<W: Write>(w: &mut Writer<W>, item: &EnumItem) -> Result<(), CodecError> {
    w.write_str(&item.name)?;
    w.write_u32(item.value)?;
    write_tags(w, &item.tags)?;
    Ok(())
}

fn read_enum_item<R: Read>(r: &mut Reader<R>) -> Result<EnumItem, CodecError> {
    Ok(EnumItem {
        name: r.read_str()?,
        value: r.read_u32()?,
        tags: read_tags(r)?,
    })
}

fn write_type_ref<W: Write>(w: &mut Writer<W>, type_ref: &TypeRef) -> Result<(), CodecError> {
    w.write_str(&type_ref.category)?;
    w.write_str(&type_ref.name)?;
    Ok(())
}

fn read_type_ref<R: Read>(r: &mut Reader<R>) -> Result<TypeRef, CodecError> {
    Ok(TypeRef {
        category: r.read_str()?,
        name: r.read_str()?,
    })
}

fn write_parameters<W: Write>(w: &mut Writer<W>, params: &[Parameter]) -> Result<(), CodecError> {
    w.write_u32(params.len() as u32)?;
    for param in params {
        write_type_ref(w, &param.param_type)?;
        w.write_str(&param.name)?;
        match &param.default {
            Some(default) => {
                w.write_u8(1)?;
                w.write_str(default)?;
            }
            None => w.write_u8(0)?,
        }
    }
    Ok(())
}

fn read_parameters<R: Read>(r: &mut Reader<R>) -> Result<Vec<Parameter>, CodecError> {
    let count = r.read_u32()?;
    let mut params = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let param_type = read_type_ref(r)?;
        let name = r.read_str()?;
        let default = if r.read_bool()? {
            Some(r.read_str()?)
        } else {
            None
        };
        params.push(Parameter {
            param_type,
            name,
            default,
        });
    }
    Ok(params)
}

fn write_tags<W: Write>(w: &mut Writer<W>, tags: &Tags) -> Result<(), CodecError> {
    w.write_u32(tags.0.len() as u32)?;
    for tag in &tags.0 {
        w.write_str(tag)?;
    }
    Ok(())
}

fn read_tags<R: Read>(r: &mut Reader<R>) -> Result<Tags, CodecError> {
    let count = r.read_u32()?;
    let mut tags = Vec::with_capacity(count as usize);
    for _ in 0..count {
        tags.push(r.read_str()?);
    }
    Ok(Tags(tags))
}

fn write_value<W: Write>(w: &mut Writer<W>, value: &Value) -> Result<(), CodecError> {
    match value {
        Value::Bool(false) => w.write_u8(VALUE_FALSE)?,
        Value::Bool(true) => w.write_u8(VALUE_TRUE)?,
        Value::Int(n) => {
            w.write_u8(VALUE_INT)?;
            // Full 64 bits; integer operands can be negative or wide.
            w.write_u64(*n as u64)?;
        }
        Value::String(s) => {
            w.write_u8(VALUE_STRING)?;
            w.write_str(s)?;
        }
        Value::Type(t) => {
            w.write_u8(VALUE_TYPE)?;
            write_type_ref(w, t)?;
        }
        Value::Tags(list) => {
            w.write_u8(VALUE_STRING_LIST)?;
            w.write_u32(list.len() as u32)?;
            for item in list {
                w.write_str(item)?;
            }
        }
        Value::Parameters(params) => {
            w.write_u8(VALUE_PARAMETERS)?;
            write_parameters(w, params)?;
        }
    }
    Ok(())
}

fn read_value<R: Read>(r: &mut Reader<R>) -> Result<Value, CodecError> {
    let value = match r.read_u8()? {
        VALUE_FALSE => Value::Bool(false),
        VALUE_TRUE => Value::Bool(true),
        VALUE_INT => Value::Int(r.read_u64()? as i64),
        VALUE_STRING => Value::String(r.read_str()?),
        VALUE_TYPE => Value::Type(read_type_ref(r)?),
        VALUE_STRING_LIST => {
            let count = r.read_u32()?;
            let mut list = Vec::with_capacity(count as usize);
            for _ in 0..count {
                list.push(r.read_str()?);
            }
            Value::Tags(list)
        }
        VALUE_PARAMETERS => Value::Parameters(read_parameters(r)?),
        value => {
            return Err(CodecError::InvalidTag {
                what: "value",
                value,
            })
        }
    };
    Ok(value)
}
