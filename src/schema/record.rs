use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::NAME_KEY;
use crate::constants::TYPE_KEY;
use crate::StorageError;

/// Store-assigned record identifier, stable for the life of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl RecordId {
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub(crate) fn from_be_slice(bytes: &[u8]) -> std::result::Result<Self, StorageError> {
        let raw: [u8; 8] = bytes.try_into().map_err(|_| StorageError::DataCorruption {
            location: format!("record key of length {}", bytes.len()),
        })?;
        Ok(RecordId(u64::from_be_bytes(raw)))
    }
}

impl fmt::Display for RecordId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node class discriminator. Only `Entity` has a facade today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeClass {
    Entity = 1,
    Action = 2,
    Relationship = 3,
}

/// Which of the four schema kinds a record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Node,
    Property,
    Tag,
    Group,
}

impl RecordKind {
    /// Stable on-disk discriminator
    pub fn code(self) -> u8 {
        match self {
            RecordKind::Node => 1,
            RecordKind::Property => 2,
            RecordKind::Tag => 3,
            RecordKind::Group => 4,
        }
    }

    /// `None` for kinds written by a newer schema
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(RecordKind::Node),
            2 => Some(RecordKind::Property),
            3 => Some(RecordKind::Tag),
            4 => Some(RecordKind::Group),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Node => "Node",
            RecordKind::Property => "Property",
            RecordKind::Tag => "Tag",
            RecordKind::Group => "Group",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: RecordId,
    pub class: NodeClass,
    pub node_type: String,
    /// Milliseconds since the unix epoch
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: RecordId,
    /// Owning node. Kept on the record itself so it survives deletion.
    pub node: RecordId,
    pub name: String,
    pub value: crate::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: RecordId,
    pub node: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: RecordId,
    pub node: RecordId,
    pub name: String,
}

/// Closed variant over the four schema kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Node(NodeRecord),
    Property(PropertyRecord),
    Tag(TagRecord),
    Group(GroupRecord),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Node(_) => RecordKind::Node,
            Record::Property(_) => RecordKind::Property,
            Record::Tag(_) => RecordKind::Tag,
            Record::Group(_) => RecordKind::Group,
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            Record::Node(n) => n.id,
            Record::Property(p) => p.id,
            Record::Tag(t) => t.id,
            Record::Group(g) => g.id,
        }
    }

    /// Owning node for facet records, `None` for nodes
    pub fn owner(&self) -> Option<RecordId> {
        match self {
            Record::Node(_) => None,
            Record::Property(p) => Some(p.node),
            Record::Tag(t) => Some(t.node),
            Record::Group(g) => Some(g.node),
        }
    }

    /// Facet name for property/tag/group records
    pub fn name(&self) -> Option<&str> {
        match self {
            Record::Node(_) => None,
            Record::Property(p) => Some(&p.name),
            Record::Tag(t) => Some(&t.name),
            Record::Group(g) => Some(&g.name),
        }
    }

    /// String field lookup used by predicates
    pub fn field(
        &self,
        key: &str,
    ) -> Option<&str> {
        match (self, key) {
            (Record::Node(n), TYPE_KEY) => Some(&n.node_type),
            (_, NAME_KEY) => self.name(),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&NodeRecord> {
        match self {
            Record::Node(n) => Some(n),
            _ => None,
        }
    }
}

impl From<NodeRecord> for Record {
    fn from(r: NodeRecord) -> Self {
        Record::Node(r)
    }
}

impl From<PropertyRecord> for Record {
    fn from(r: PropertyRecord) -> Self {
        Record::Property(r)
    }
}

impl From<TagRecord> for Record {
    fn from(r: TagRecord) -> Self {
        Record::Tag(r)
    }
}

impl From<GroupRecord> for Record {
    fn from(r: GroupRecord) -> Self {
        Record::Group(r)
    }
}
