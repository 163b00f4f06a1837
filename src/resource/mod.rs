//! Resource mapping: schemas, rendering, query options, and request documents.

mod contact;
mod options;
mod payload;
mod phone_number;
mod render;
mod schema;

pub use contact::{phone_numbers_linkage, render_contact};
pub use options::{FetchOptions, ListOptions};
pub use phone_number::render_phone_number;
pub use payload::{parse_relationship, parse_resource, Intent, LinkageData, ParsedResource};
pub use render::{identifiers, relationship_links, render, Fieldsets, Resource};
pub use schema::{
    Cardinality, FilterDef, RelationshipDef, ResourceSchema, ResourceType, API_PREFIX, CONTACT_SCHEMA,
    PHONE_NUMBER_SCHEMA,
};
