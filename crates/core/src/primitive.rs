//! Primitive pages - plain, serializable snapshots of [`Page`]
//!
//! History tasks keep these instead of live pages so a revert restores exactly
//! what was there. The JSON shape mirrors the page model:
//!
//! ```text
//! {"index":1,"field":{"ref":0},"piece":{"type":"T","rotation":"spawn","x":4,"y":0},
//!  "comment":{"text":"hi"},"flags":{"lock":true,"mirror":false,"colorize":true,"rise":false,"quiz":false}}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;
use crate::field::Field;
use crate::page::{CommandKey, Commands, CommentSource, FieldSource, Flags, Page};
use crate::types::{Move, Piece, Rotation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveFieldObj {
    /// 10 characters per row, top row first
    pub field: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub garbage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj: Option<PrimitiveFieldObj>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveComment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveMove {
    #[serde(rename = "type", with = "piece_letter")]
    pub piece: Piece,
    #[serde(with = "rotation_name")]
    pub rotation: Rotation,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveCommands {
    /// `block-<x>-<y>` or `sentBlock-<x>` to a piece letter
    pub pre: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitivePage {
    pub index: usize,
    pub field: PrimitiveField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piece: Option<PrimitiveMove>,
    pub comment: PrimitiveComment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<PrimitiveCommands>,
    pub flags: Flags,
}

mod piece_letter {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::types::Piece;

    pub fn serialize<S: Serializer>(piece: &Piece, serializer: S) -> Result<S::Ok, S::Error> {
        let mut buf = [0u8; 4];
        serializer.serialize_str(piece.as_char().encode_utf8(&mut buf))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Piece, D::Error> {
        let s = String::deserialize(deserializer)?;
        Piece::from_str(&s).ok_or_else(|| serde::de::Error::custom("invalid piece"))
    }
}

mod rotation_name {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::types::Rotation;

    pub fn serialize<S: Serializer>(rotation: &Rotation, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(rotation.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rotation, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rotation::from_str(&s).ok_or_else(|| serde::de::Error::custom("invalid rotation"))
    }
}

fn command_key_string(key: &CommandKey) -> String {
    match key {
        CommandKey::Block { x, y } => format!("block-{}-{}", x, y),
        CommandKey::SentBlock { x } => format!("sentBlock-{}", x),
    }
}

fn parse_command_key(s: &str) -> Result<CommandKey, FormatError> {
    let invalid = || FormatError::InvalidValue {
        kind: "command key",
        value: s.to_string(),
    };
    if let Some(rest) = s.strip_prefix("sentBlock-") {
        let x = rest.parse().map_err(|_| invalid())?;
        return Ok(CommandKey::SentBlock { x });
    }
    let rest = s.strip_prefix("block-").ok_or_else(invalid)?;
    let (x, y) = rest.split_once('-').ok_or_else(invalid)?;
    Ok(CommandKey::Block {
        x: x.parse().map_err(|_| invalid())?,
        y: y.parse().map_err(|_| invalid())?,
    })
}

impl From<&Page> for PrimitivePage {
    fn from(page: &Page) -> Self {
        let field = match &page.field {
            FieldSource::Key(field) => PrimitiveField {
                obj: Some(PrimitiveFieldObj {
                    field: field.to_field_string(),
                    garbage: field.garbage_string(),
                }),
                reference: None,
            },
            FieldSource::Ref(r) => PrimitiveField {
                obj: None,
                reference: Some(*r),
            },
        };
        let comment = match &page.comment {
            CommentSource::Text(text) => PrimitiveComment {
                text: Some(text.clone()),
                reference: None,
            },
            CommentSource::Ref(r) => PrimitiveComment {
                text: None,
                reference: Some(*r),
            },
        };
        let commands = page.commands.as_ref().map(|c| PrimitiveCommands {
            pre: c
                .pre
                .iter()
                .map(|(k, p)| (command_key_string(k), p.as_char().to_string()))
                .collect(),
        });

        Self {
            index: page.index,
            field,
            piece: page.piece.map(|mv| PrimitiveMove {
                piece: mv.piece,
                rotation: mv.rotation,
                x: mv.x,
                y: mv.y,
            }),
            comment,
            commands,
            flags: page.flags,
        }
    }
}

impl TryFrom<PrimitivePage> for Page {
    type Error = FormatError;

    fn try_from(p: PrimitivePage) -> Result<Self, Self::Error> {
        let index = p.index;
        let check_ref = |target: usize| {
            if target < index {
                Ok(target)
            } else {
                Err(FormatError::MissingReference { index, target })
            }
        };

        let field = match (p.field.obj, p.field.reference) {
            (Some(obj), None) => FieldSource::Key(Field::with_garbage(&obj.field, &obj.garbage)?),
            (None, Some(r)) => FieldSource::Ref(check_ref(r)?),
            _ => return Err(FormatError::AmbiguousSlot { index, slot: "field" }),
        };
        let comment = match (p.comment.text, p.comment.reference) {
            (Some(text), None) => CommentSource::Text(text),
            (None, Some(r)) => CommentSource::Ref(check_ref(r)?),
            _ => {
                return Err(FormatError::AmbiguousSlot {
                    index,
                    slot: "comment",
                })
            }
        };

        let commands = match p.commands {
            Some(c) => {
                let mut pre = BTreeMap::new();
                for (key, letter) in c.pre {
                    let piece = Piece::from_str(&letter).ok_or(FormatError::InvalidValue {
                        kind: "piece",
                        value: letter.clone(),
                    })?;
                    pre.insert(parse_command_key(&key)?, piece);
                }
                Some(Commands { pre })
            }
            None => None,
        };

        Ok(Page {
            index,
            field,
            piece: p
                .piece
                .map(|m| Move::new(m.piece, m.rotation, m.x, m.y)),
            comment,
            commands,
            flags: p.flags,
        })
    }
}
