//! Search index writer.
//!
//! The index is consumed by the reference frontend for client-side lookup,
//! so it is write-only here. Three passes over the same entity order keep
//! the reader trivial: fixed-width icon bytes, fixed-width packed entries,
//! then length-prefixed identifier strings. Entity order is types, classes,
//! enums, then members grouped by class and items grouped by enum, each
//! group in its sorted projection order.

use std::collections::HashMap;
use std::io::Write;

use apitrail_graph::Entities;
use apitrail_model::Member;

use crate::rw::Writer;
use crate::CodecError;

const INDEX_VERSION: u8 = 1;

// Packed entry: bits 0-2 kind, 3-6 flags, 8-10 security, 11-13 write
// security (properties only). Bits 7, 14, and 15 are reserved.
const KIND_CLASS: u16 = 0;
const KIND_ENUM: u16 = 1;
const KIND_ENUM_ITEM: u16 = 2;
const KIND_TYPE: u16 = 3;
const KIND_PROPERTY: u16 = 4;
const KIND_FUNCTION: u16 = 5;
const KIND_EVENT: u16 = 6;
const KIND_CALLBACK: u16 = 7;

const FLAG_REMOVED: u16 = 1 << 3;
const FLAG_DEPRECATED: u16 = 1 << 4;
const FLAG_NOT_BROWSABLE: u16 = 1 << 5;
// NotCreatable on classes, Hidden on properties.
const FLAG_RESTRICTED: u16 = 1 << 6;

const SECURITY_SHIFT: u16 = 8;
const WRITE_SECURITY_SHIFT: u16 = 11;

/// Maps a security context name to its 3-bit level. Unknown contexts map
/// to no security rather than failing the encode.
fn security_level(context: &str) -> u16 {
    match context {
        "RobloxPlaceSecurity" => 1,
        "PluginSecurity" => 2,
        "LocalUserSecurity" => 3,
        "RobloxScriptSecurity" => 4,
        "RobloxSecurity" => 5,
        "NotAccessibleSecurity" => 6,
        _ => 0,
    }
}

struct Entry {
    packed: u16,
    id: String,
}

/// Serializes the search index for the given graph. `icons` assigns each
/// class an icon sheet index; unlisted classes get zero.
pub fn encode_search_index<W: Write>(
    entities: &Entities,
    icons: &HashMap<String, u8>,
    out: W,
) -> Result<(), CodecError> {
    let classes = entities.class_list();
    let enums = entities.enum_list();
    let types = entities.type_list();

    let mut entries: Vec<Entry> = Vec::new();
    for type_entity in &types {
        let mut packed = KIND_TYPE;
        if type_entity.removed {
            packed |= FLAG_REMOVED;
        }
        entries.push(Entry {
            packed,
            id: type_entity.element.name.clone(),
        });
    }
    for class in &classes {
        let mut packed = KIND_CLASS;
        if class.removed {
            packed |= FLAG_REMOVED;
        }
        packed |= tag_flags(&class.element.tags, "NotCreatable");
        entries.push(Entry {
            packed,
            id: class.id.clone(),
        });
    }
    for enum_entity in &enums {
        let mut packed = KIND_ENUM;
        if enum_entity.removed {
            packed |= FLAG_REMOVED;
        }
        packed |= tag_flags(&enum_entity.element.tags, "");
        entries.push(Entry {
            packed,
            id: enum_entity.id.clone(),
        });
    }
    for class in &classes {
        for member in entities.member_list(&class.id) {
            let mut packed = match member.element {
                Member::Property(_) => KIND_PROPERTY,
                Member::Function(_) => KIND_FUNCTION,
                Member::Event(_) => KIND_EVENT,
                Member::Callback(_) => KIND_CALLBACK,
            };
            if member.removed {
                packed |= FLAG_REMOVED;
            }
            packed |= tag_flags(member.element.tags(), "Hidden");
            match &member.element {
                Member::Property(p) => {
                    packed |= security_level(&p.read_security) << SECURITY_SHIFT;
                    packed |= security_level(&p.write_security) << WRITE_SECURITY_SHIFT;
                }
                other => {
                    if let Some(security) = other.security() {
                        packed |= security_level(security) << SECURITY_SHIFT;
                    }
                }
            }
            entries.push(Entry {
                packed,
                id: format!("{}.{}", member.id.0, member.id.1),
            });
        }
    }
    for enum_entity in &enums {
        for item in entities.item_list(&enum_entity.id) {
            let mut packed = KIND_ENUM_ITEM;
            if item.removed {
                packed |= FLAG_REMOVED;
            }
            packed |= tag_flags(&item.element.tags, "");
            entries.push(Entry {
                packed,
                id: format!("{}.{}", item.id.0, item.id.1),
            });
        }
    }

    let mut w = Writer::new(out);
    w.write_u8(INDEX_VERSION)?;
    w.write_u16(classes.len() as u16)?;
    w.write_u16(types.len() as u16)?;
    w.write_u16(entries.len() as u16)?;
    for class in &classes {
        w.write_u8(icons.get(&class.id).copied().unwrap_or(0))?;
    }
    for entry in &entries {
        w.write_u16(entry.packed)?;
    }
    for entry in &entries {
        w.write_str(&entry.id)?;
    }
    Ok(())
}

fn tag_flags(tags: &apitrail_model::Tags, restricted: &str) -> u16 {
    let mut flags = 0;
    if tags.has("Deprecated") {
        flags |= FLAG_DEPRECATED;
    }
    if tags.has("NotBrowsable") {
        flags |= FLAG_NOT_BROWSABLE;
    }
    if !restricted.is_empty() && tags.has(restricted) {
        flags |= FLAG_RESTRICTED;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use apitrail_builds::{Action, ActionKind, Patch, Target};
    use apitrail_graph::build_graph;
    use apitrail_model::{Class, Enum, EnumItem, Member, Property, Tags, TypeRef};
    use apitrail_source::{BuildInfo, Version};
    use chrono::{TimeZone, Utc};

    use crate::rw::Reader;

    fn property(name: &str, tags: Vec<&str>, read: &str, write: &str) -> Member {
        Member::Property(Property {
            name: name.to_string(),
            value_type: TypeRef::new("DataType", "Vector2"),
            category: String::new(),
            read_security: read.to_string(),
            write_security: write.to_string(),
            can_load: true,
            can_save: true,
            tags: Tags::from(tags),
        })
    }

    fn graph() -> Entities {
        let class = Class {
            name: "Widget".to_string(),
            superclass: String::new(),
            memory_category: String::new(),
            members: vec![property(
                "Size",
                vec!["Hidden", "Deprecated"],
                "PluginSecurity",
                "RobloxScriptSecurity",
            )],
            tags: Tags::from(vec!["NotCreatable"]),
        };
        let enum_ = Enum {
            name: "Shape".to_string(),
            items: vec![EnumItem {
                name: "Round".to_string(),
                value: 0,
                tags: Tags::default(),
            }],
            tags: Tags::default(),
        };
        let patch = Patch {
            info: BuildInfo {
                hash: "aaa".to_string(),
                date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap(),
                version: Version::new(0, 600, 0, 1),
            },
            prev: None,
            config: "primary".to_string(),
            actions: vec![
                Action {
                    kind: ActionKind::Add,
                    index: 0,
                    target: Target::Class(class),
                    change: None,
                },
                Action {
                    kind: ActionKind::Add,
                    index: 1,
                    target: Target::Enum(enum_),
                    change: None,
                },
            ],
            stale: false,
        };
        build_graph(&[patch]).unwrap()
    }

    struct Decoded {
        icons: Vec<u8>,
        packed: Vec<u16>,
        ids: Vec<String>,
        class_offset: u16,
    }

    fn decode(bytes: &[u8]) -> Decoded {
        let mut r = Reader::new(bytes);
        assert_eq!(r.read_u8().unwrap(), INDEX_VERSION);
        let icon_count = r.read_u16().unwrap();
        let class_offset = r.read_u16().unwrap();
        let total = r.read_u16().unwrap();
        let icons = (0..icon_count).map(|_| r.read_u8().unwrap()).collect();
        let packed = (0..total).map(|_| r.read_u16().unwrap()).collect();
        let ids = (0..total).map(|_| r.read_str().unwrap()).collect();
        Decoded {
            icons,
            packed,
            ids,
            class_offset,
        }
    }

    #[test]
    fn header_and_order() {
        let entities = graph();
        let mut bytes = Vec::new();
        encode_search_index(&entities, &HashMap::new(), &mut bytes).unwrap();
        let decoded = decode(&bytes);
        // One type (Vector2), one class, one enum, one member, one item.
        assert_eq!(decoded.class_offset, 1);
        assert_eq!(decoded.icons, [0]);
        assert_eq!(
            decoded.ids,
            ["Vector2", "Widget", "Shape", "Widget.Size", "Shape.Round"]
        );
    }

    #[test]
    fn packed_entry_bits() {
        let entities = graph();
        let mut bytes = Vec::new();
        encode_search_index(&entities, &HashMap::new(), &mut bytes).unwrap();
        let decoded = decode(&bytes);

        let type_entry = decoded.packed[0];
        assert_eq!(type_entry & 0b111, KIND_TYPE);
        assert_eq!(type_entry & FLAG_REMOVED, 0);

        let class_entry = decoded.packed[1];
        assert_eq!(class_entry & 0b111, KIND_CLASS);
        assert_ne!(class_entry & FLAG_RESTRICTED, 0);
        assert_eq!(class_entry & FLAG_DEPRECATED, 0);

        let member_entry = decoded.packed[3];
        assert_eq!(member_entry & 0b111, KIND_PROPERTY);
        assert_ne!(member_entry & FLAG_DEPRECATED, 0);
        assert_ne!(member_entry & FLAG_RESTRICTED, 0);
        assert_eq!((member_entry >> SECURITY_SHIFT) & 0b111, 2);
        assert_eq!((member_entry >> WRITE_SECURITY_SHIFT) & 0b111, 4);
    }

    #[test]
    fn icons_follow_the_class_order() {
        let entities = graph();
        let mut icons = HashMap::new();
        icons.insert("Widget".to_string(), 7u8);
        let mut bytes = Vec::new();
        encode_search_index(&entities, &icons, &mut bytes).unwrap();
        let decoded = decode(&bytes);
        assert_eq!(decoded.icons, [7]);
    }

    #[test]
    fn output_is_deterministic() {
        let entities = graph();
        let mut first = Vec::new();
        let mut second = Vec::new();
        encode_search_index(&entities, &HashMap::new(), &mut first).unwrap();
        encode_search_index(&entities, &HashMap::new(), &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn security_levels_fit_three_bits() {
        let contexts = [
            ("None", 0),
            ("RobloxPlaceSecurity", 1),
            ("PluginSecurity", 2),
            ("LocalUserSecurity", 3),
            ("RobloxScriptSecurity", 4),
            ("RobloxSecurity", 5),
            ("NotAccessibleSecurity", 6),
        ];
        for (context, level) in contexts {
            assert_eq!(security_level(context), level);
            assert!(security_level(context) <= 0b111);
        }
    }

    #[test]
    fn kind_values_fit_three_bits() {
        for kind in [
            KIND_CLASS,
            KIND_ENUM,
            KIND_ENUM_ITEM,
            KIND_TYPE,
            KIND_PROPERTY,
            KIND_FUNCTION,
            KIND_EVENT,
            KIND_CALLBACK,
        ] {
            assert!(kind <= 0b111);
        }
    }

    #[test]
    fn unknown_security_context_packs_as_none() {
        assert_eq!(security_level("TotallyNewSecurity"), 0);
        assert_eq!(security_level(""), 0);
        assert_eq!(security_level("None"), 0);
    }
}
