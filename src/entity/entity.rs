//! Entity facade
//!
//! An [`Entity`] is a node of class [`NodeClass::Entity`] together with the
//! graph it lives in. Every mutation is staged on the graph's pending
//! transaction and becomes durable with the next [`Graph::commit`]; reads see
//! staged changes right away.

use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

use crate::graph;
use crate::graph::Staging;
use crate::utils::time::get_now_as_millis;
use crate::Graph;
use crate::GroupRecord;
use crate::InvalidInputError;
use crate::NodeClass;
use crate::NodeRecord;
use crate::PropertyRecord;
use crate::Record;
use crate::RecordId;
use crate::RecordKind;
use crate::Result;
use crate::TagRecord;
use crate::Value;
use crate::Watchable;

#[derive(Clone)]
pub struct Entity {
    graph: Graph,
    node: NodeRecord,
}

impl Entity {
    /// New entity of `node_type` in the default graph
    pub fn new(node_type: &str) -> Result<Self> {
        Self::new_in(node_type, &graph::default_graph()?)
    }

    /// New entity of `node_type` in the process-wide graph `graph_name`
    pub fn new_named(
        node_type: &str,
        graph_name: &str,
    ) -> Result<Self> {
        Self::new_in(node_type, &graph::named(graph_name)?)
    }

    pub fn new_in(
        node_type: &str,
        graph: &Graph,
    ) -> Result<Self> {
        if node_type.is_empty() {
            return Err(InvalidInputError::EmptyType.into());
        }
        let node = NodeRecord {
            id: graph.next_id()?,
            class: NodeClass::Entity,
            node_type: node_type.to_string(),
            created_at: get_now_as_millis(),
        };
        let staged = Record::Node(node.clone());
        graph.stage(|staging| {
            staging.insert(staged);
            Ok(())
        })?;
        trace!(id = %node.id, %node_type, "entity staged");

        Ok(Self {
            graph: graph.clone(),
            node,
        })
    }

    /// The entity with `id`, `None` when there is no such entity node
    pub fn load(
        graph: &Graph,
        id: RecordId,
    ) -> Result<Option<Self>> {
        Ok(graph
            .node(id)?
            .filter(|node| node.class == NodeClass::Entity)
            .map(|node| Self {
                graph: graph.clone(),
                node,
            }))
    }

    pub fn id(&self) -> RecordId {
        self.node.id
    }

    pub fn node_type(&self) -> &str {
        &self.node.node_type
    }

    /// Milliseconds since the unix epoch
    pub fn created_at(&self) -> u64 {
        self.node.created_at
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn node(&self) -> &NodeRecord {
        &self.node
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Result<Option<Value>> {
        Ok(self
            .graph
            .children(self.node.id)?
            .into_iter()
            .find_map(|record| match record {
                Record::Property(p) if p.name == name => Some(p.value),
                _ => None,
            }))
    }

    pub fn set(
        &self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        self.assign(name, Some(value.into()))
    }

    pub fn unset(
        &self,
        name: &str,
    ) -> Result<()> {
        self.assign(name, None)
    }

    /// Inserts, updates or, for `None`, deletes property `name`. An empty
    /// text or byte value deletes the property as well.
    /// Assigning the value a property already has stages nothing.
    pub fn assign(
        &self,
        name: &str,
        value: Option<Value>,
    ) -> Result<()> {
        validate_keys("property", &[name])?;
        let node = self.node.id;
        let id_source = &self.graph;
        let value = value.filter(|value| !value.is_empty());

        self.graph.stage(|staging| {
            ensure_live(staging, node)?;
            let existing = find_facet(staging, node, RecordKind::Property, name)?;
            match (existing, value) {
                (None, Some(value)) => staging.insert(Record::Property(PropertyRecord {
                    id: id_source.next_id()?,
                    node,
                    name: name.to_string(),
                    value,
                })),
                (Some(Record::Property(mut property)), Some(value)) => {
                    if property.value != value {
                        property.value = value;
                        staging.update(Record::Property(property));
                    }
                }
                (Some(existing), None) => staging.delete(existing),
                _ => {}
            }
            Ok(())
        })
    }

    pub fn properties(&self) -> Result<BTreeMap<String, Value>> {
        Ok(self
            .graph
            .children(self.node.id)?
            .into_iter()
            .filter_map(|record| match record {
                Record::Property(p) => Some((p.name, p.value)),
                _ => None,
            })
            .collect())
    }

    /// Adds every tag the entity does not have yet
    pub fn add_tags<S: AsRef<str>>(
        &self,
        tags: &[S],
    ) -> Result<()> {
        self.add_facets(RecordKind::Tag, tags)
    }

    pub fn remove_tags<S: AsRef<str>>(
        &self,
        tags: &[S],
    ) -> Result<()> {
        self.remove_facets(RecordKind::Tag, tags)
    }

    /// True when the entity carries every one of `tags`
    pub fn has_tags<S: AsRef<str>>(
        &self,
        tags: &[S],
    ) -> Result<bool> {
        self.has_facets(RecordKind::Tag, tags)
    }

    pub fn tags(&self) -> Result<Vec<String>> {
        self.facet_names(RecordKind::Tag)
    }

    pub fn add_to_groups<S: AsRef<str>>(
        &self,
        groups: &[S],
    ) -> Result<()> {
        self.add_facets(RecordKind::Group, groups)
    }

    pub fn remove_from_groups<S: AsRef<str>>(
        &self,
        groups: &[S],
    ) -> Result<()> {
        self.remove_facets(RecordKind::Group, groups)
    }

    /// True when the entity is in every one of `groups`
    pub fn is_member_of<S: AsRef<str>>(
        &self,
        groups: &[S],
    ) -> Result<bool> {
        self.has_facets(RecordKind::Group, groups)
    }

    pub fn groups(&self) -> Result<Vec<String>> {
        self.facet_names(RecordKind::Group)
    }

    /// Stages the deletion of the entity and everything attached to it.
    pub fn delete(&self) -> Result<()> {
        let node = self.node.id;
        self.graph.stage(|staging| {
            for child in staging.children(node)? {
                staging.delete(child);
            }
            match staging.read(node)? {
                Some(current) => staging.delete(current),
                None => trace!(id = %node, "entity already gone"),
            }
            Ok(())
        })
    }

    fn add_facets<S: AsRef<str>>(
        &self,
        kind: RecordKind,
        names: &[S],
    ) -> Result<()> {
        validate_keys(facet_label(kind), names)?;
        let node = self.node.id;
        let id_source = &self.graph;

        self.graph.stage(|staging| {
            ensure_live(staging, node)?;
            let mut present: Vec<String> = facet_records(staging, node, kind)?
                .filter_map(|record| record.name().map(str::to_string))
                .collect();
            for name in names {
                let name = name.as_ref();
                if present.iter().any(|p| p == name) {
                    continue;
                }
                let id = id_source.next_id()?;
                let name = name.to_string();
                staging.insert(match kind {
                    RecordKind::Group => Record::Group(GroupRecord {
                        id,
                        node,
                        name: name.clone(),
                    }),
                    _ => Record::Tag(TagRecord {
                        id,
                        node,
                        name: name.clone(),
                    }),
                });
                present.push(name);
            }
            Ok(())
        })
    }

    fn remove_facets<S: AsRef<str>>(
        &self,
        kind: RecordKind,
        names: &[S],
    ) -> Result<()> {
        validate_keys(facet_label(kind), names)?;
        let node = self.node.id;

        self.graph.stage(|staging| {
            let doomed: Vec<Record> = facet_records(staging, node, kind)?
                .filter(|record| {
                    record
                        .name()
                        .is_some_and(|n| names.iter().any(|name| name.as_ref() == n))
                })
                .collect();
            for record in doomed {
                staging.delete(record);
            }
            Ok(())
        })
    }

    fn has_facets<S: AsRef<str>>(
        &self,
        kind: RecordKind,
        names: &[S],
    ) -> Result<bool> {
        let present = self.facet_names(kind)?;
        Ok(names
            .iter()
            .all(|name| present.iter().any(|p| p == name.as_ref())))
    }

    fn facet_names(
        &self,
        kind: RecordKind,
    ) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .graph
            .children(self.node.id)?
            .into_iter()
            .filter(|record| record.kind() == kind)
            .filter_map(|record| record.name().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}

fn facet_label(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Group => "group",
        RecordKind::Property => "property",
        _ => "tag",
    }
}

fn validate_keys<S: AsRef<str>>(
    facet: &'static str,
    names: &[S],
) -> Result<()> {
    if names.iter().any(|name| name.as_ref().is_empty()) {
        return Err(InvalidInputError::EmptyKey { facet }.into());
    }
    Ok(())
}

/// Facet records need a live owner; a deleted entity only accepts `delete`.
fn ensure_live(
    staging: &Staging<'_>,
    node: RecordId,
) -> Result<()> {
    match staging.read(node)? {
        Some(Record::Node(_)) => Ok(()),
        _ => Err(InvalidInputError::EntityDeleted { id: node }.into()),
    }
}

fn facet_records(
    staging: &Staging<'_>,
    node: RecordId,
    kind: RecordKind,
) -> Result<impl Iterator<Item = Record>> {
    Ok(staging
        .children(node)?
        .into_iter()
        .filter(move |record| record.kind() == kind))
}

fn find_facet(
    staging: &Staging<'_>,
    node: RecordId,
    kind: RecordKind,
    name: &str,
) -> Result<Option<Record>> {
    Ok(facet_records(staging, node, kind)?.find(|record| record.name() == Some(name)))
}

impl Watchable for Entity {
    const CLASS: NodeClass = NodeClass::Entity;

    fn from_node(
        graph: &Graph,
        node: NodeRecord,
    ) -> Self {
        Self {
            graph: graph.clone(),
            node,
        }
    }
}

impl PartialEq for Entity {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.node.id == other.node.id && self.graph == other.graph
    }
}

impl Eq for Entity {}

impl fmt::Debug for Entity {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.node.id)
            .field("type", &self.node.node_type)
            .field("graph", &self.graph.name())
            .finish()
    }
}
