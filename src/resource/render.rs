//! Entity -> JSON:API resource object, restricted to the schema's whitelist and any sparse fieldset.

use crate::resource::schema::{ResourceSchema, ResourceType};
use crate::response::{Linkage, Relationship, RelationshipLinks, ResourceIdentifier, ResourceLinks, ResourceObject};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A domain entity exposed as a JSON:API resource.
pub trait Resource {
    const SCHEMA: &'static ResourceSchema;

    fn id(&self) -> i64;

    /// Value of a whitelisted attribute; `Value::Null` for names outside the schema.
    fn attribute(&self, name: &str) -> Value;

    fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier {
            kind: Self::SCHEMA.kind.as_str(),
            id: self.id().to_string(),
        }
    }
}

/// Requested `fields[<type>]` restrictions. Types without an entry expose every field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fieldsets(HashMap<ResourceType, HashSet<&'static str>>);

impl Fieldsets {
    pub fn restrict(&mut self, kind: ResourceType, fields: HashSet<&'static str>) {
        self.0.insert(kind, fields);
    }

    pub fn allows(&self, kind: ResourceType, field: &str) -> bool {
        self.0.get(&kind).map(|f| f.contains(field)).unwrap_or(true)
    }
}

pub fn relationship_links(kind: ResourceType, id: i64, name: &str) -> RelationshipLinks {
    let base = kind.url(id);
    RelationshipLinks {
        self_link: format!("{}/relationships/{}", base, name),
        related: format!("{}/{}", base, name),
    }
}

/// Render `resource`. `linkage` supplies relationship data by name; relationships without it get links only.
pub fn render<R: Resource>(
    resource: &R,
    mut linkage: HashMap<&'static str, Linkage>,
    fieldsets: &Fieldsets,
) -> ResourceObject {
    let schema = R::SCHEMA;
    let kind = schema.kind;
    let id = resource.id();

    let mut attributes = Map::new();
    for name in schema.attributes {
        if fieldsets.allows(kind, name) {
            attributes.insert((*name).to_string(), resource.attribute(name));
        }
    }

    let mut relationships = BTreeMap::new();
    for rel in schema.relationships {
        if !fieldsets.allows(kind, rel.name) {
            continue;
        }
        relationships.insert(
            rel.name,
            Relationship {
                links: relationship_links(kind, id, rel.name),
                data: linkage.remove(rel.name),
            },
        );
    }

    ResourceObject {
        id: id.to_string(),
        kind: kind.as_str(),
        attributes,
        relationships,
        links: ResourceLinks { self_link: kind.url(id) },
    }
}

pub fn identifiers<'a, R: Resource + 'a>(resources: impl IntoIterator<Item = &'a R>) -> Vec<ResourceIdentifier> {
    resources.into_iter().map(R::identifier).collect()
}
