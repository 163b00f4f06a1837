//! Static resource schemas: what each resource type exposes, accepts, and filters on.

use std::fmt;

pub const API_PREFIX: &str = "/api/v1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceType {
    Contacts,
    PhoneNumbers,
}

impl ResourceType {
    pub const ALL: [ResourceType; 2] = [ResourceType::Contacts, ResourceType::PhoneNumbers];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Contacts => "contacts",
            ResourceType::PhoneNumbers => "phone_numbers",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn schema(&self) -> &'static ResourceSchema {
        match self {
            ResourceType::Contacts => &CONTACT_SCHEMA,
            ResourceType::PhoneNumbers => &PHONE_NUMBER_SCHEMA,
        }
    }

    pub fn url(&self, id: i64) -> String {
        format!("{}/{}/{}", API_PREFIX, self.as_str(), id)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    ToOne,
    ToMany,
}

#[derive(Debug)]
pub struct RelationshipDef {
    pub name: &'static str,
    pub cardinality: Cardinality,
    pub related: ResourceType,
    /// Whether requests may set this relationship through the resource document.
    pub writable: bool,
}

/// A whitelisted `filter[<key>]`. Values are ids of the related resource.
#[derive(Debug)]
pub struct FilterDef {
    pub key: &'static str,
    pub related: ResourceType,
}

#[derive(Debug)]
pub struct ResourceSchema {
    pub kind: ResourceType,
    /// Serialized attributes, in output order.
    pub attributes: &'static [&'static str],
    pub writable: &'static [&'static str],
    pub relationships: &'static [RelationshipDef],
    pub filters: &'static [FilterDef],
}

impl ResourceSchema {
    pub fn relationship(&self, name: &str) -> Option<&'static RelationshipDef> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub fn filter(&self, key: &str) -> Option<&'static FilterDef> {
        self.filters.iter().find(|f| f.key == key)
    }

    pub fn attribute(&self, name: &str) -> Option<&'static str> {
        self.attributes.iter().copied().find(|a| *a == name)
    }

    pub fn is_writable(&self, name: &str) -> bool {
        self.writable.contains(&name)
    }

    /// Sortable fields are `id` and every serialized attribute.
    pub fn sort_field(&self, name: &str) -> Option<&'static str> {
        if name == "id" {
            return Some("id");
        }
        self.attribute(name)
    }
}

pub static CONTACT_SCHEMA: ResourceSchema = ResourceSchema {
    kind: ResourceType::Contacts,
    attributes: &["name_first", "name_last", "email", "twitter", "created_at", "updated_at"],
    writable: &["name_first", "name_last", "email", "twitter"],
    relationships: &[RelationshipDef {
        name: "phone_numbers",
        cardinality: Cardinality::ToMany,
        related: ResourceType::PhoneNumbers,
        writable: false,
    }],
    filters: &[],
};

pub static PHONE_NUMBER_SCHEMA: ResourceSchema = ResourceSchema {
    kind: ResourceType::PhoneNumbers,
    attributes: &["name", "phone_number"],
    writable: &["name", "phone_number"],
    relationships: &[RelationshipDef {
        name: "contact",
        cardinality: Cardinality::ToOne,
        related: ResourceType::Contacts,
        writable: true,
    }],
    filters: &[FilterDef {
        key: "contact",
        related: ResourceType::Contacts,
    }],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers_hide_foreign_key_and_timestamps() {
        let schema = ResourceType::PhoneNumbers.schema();
        assert!(schema.attribute("contact_id").is_none());
        assert!(schema.attribute("created_at").is_none());
        assert_eq!(schema.filter("contact").map(|f| f.related), Some(ResourceType::Contacts));
    }

    #[test]
    fn contacts_declare_no_filters() {
        assert!(ResourceType::Contacts.schema().filter("contact").is_none());
        assert!(ResourceType::Contacts.schema().filters.is_empty());
    }

    #[test]
    fn sort_fields_include_id() {
        let schema = ResourceType::Contacts.schema();
        assert_eq!(schema.sort_field("id"), Some("id"));
        assert_eq!(schema.sort_field("name_last"), Some("name_last"));
        assert_eq!(schema.sort_field("phone_numbers"), None);
    }

    #[test]
    fn type_names_round_trip() {
        for t in ResourceType::ALL {
            assert_eq!(ResourceType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ResourceType::parse("people"), None);
    }
}
