//! JSON:API document envelope and response helpers.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Serializes `T` as the body with the JSON:API media type.
pub struct JsonApi<T>(pub StatusCode, pub T);

impl<T: Serialize> IntoResponse for JsonApi<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.1) {
            Ok(bytes) => {
                let mut res = (self.0, bytes).into_response();
                res.headers_mut()
                    .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSONAPI_MEDIA_TYPE));
                res
            }
            Err(e) => {
                tracing::error!(error = %e, "response serialization failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

pub fn ok(doc: Document) -> JsonApi<Document> {
    JsonApi(StatusCode::OK, doc)
}

pub fn created(doc: Document) -> JsonApi<Document> {
    JsonApi(StatusCode::CREATED, doc)
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
}

/// Relationship linkage: a single identifier (or null) for to-one, an array for to-many.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Linkage {
    ToOne(Option<ResourceIdentifier>),
    ToMany(Vec<ResourceIdentifier>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RelationshipLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub related: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Relationship {
    pub links: RelationshipLinks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Linkage>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceLinks {
    #[serde(rename = "self")]
    pub self_link: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceObject {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<&'static str, Relationship>,
    pub links: ResourceLinks,
}

impl ResourceObject {
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier {
            kind: self.kind,
            id: self.id.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    Resource(ResourceObject),
    Resources(Vec<ResourceObject>),
    Linkage(Linkage),
    Null,
}

/// Top-level pagination and self links.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TopLinks {
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

impl TopLinks {
    fn is_empty(&self) -> bool {
        *self == TopLinks::default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Document {
    pub data: PrimaryData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<ResourceObject>,
    #[serde(skip_serializing_if = "TopLinks::is_empty")]
    pub links: TopLinks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Document {
    fn with_data(data: PrimaryData) -> Self {
        Document {
            data,
            included: Vec::new(),
            links: TopLinks::default(),
            meta: None,
        }
    }

    pub fn one(resource: ResourceObject) -> Self {
        Self::with_data(PrimaryData::Resource(resource))
    }

    pub fn many(resources: Vec<ResourceObject>) -> Self {
        Self::with_data(PrimaryData::Resources(resources))
    }

    pub fn null() -> Self {
        Self::with_data(PrimaryData::Null)
    }

    pub fn linkage(linkage: Linkage, links: RelationshipLinks) -> Self {
        let mut doc = Self::with_data(PrimaryData::Linkage(linkage));
        doc.links.self_link = Some(links.self_link);
        doc.links.related = Some(links.related);
        doc
    }

    /// Adds resources to `included`, skipping any already in the primary data or included.
    pub fn include(mut self, resources: Vec<ResourceObject>) -> Self {
        let mut seen: std::collections::HashSet<ResourceIdentifier> = match &self.data {
            PrimaryData::Resource(r) => std::iter::once(r.identifier()).collect(),
            PrimaryData::Resources(rs) => rs.iter().map(ResourceObject::identifier).collect(),
            _ => Default::default(),
        };
        seen.extend(self.included.iter().map(ResourceObject::identifier));
        for r in resources {
            if seen.insert(r.identifier()) {
                self.included.push(r);
            }
        }
        self
    }

    pub fn with_links(mut self, links: TopLinks) -> Self {
        self.links = links;
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(kind: &'static str, id: &str) -> ResourceObject {
        ResourceObject {
            id: id.into(),
            kind,
            attributes: Map::new(),
            relationships: BTreeMap::new(),
            links: ResourceLinks {
                self_link: format!("/api/v1/{}/{}", kind, id),
            },
        }
    }

    #[test]
    fn include_skips_duplicates_and_primary_data() {
        let doc = Document::many(vec![resource("contacts", "1")]).include(vec![
            resource("contacts", "1"),
            resource("phone_numbers", "1"),
            resource("phone_numbers", "1"),
        ]);
        assert_eq!(doc.included.len(), 1);
        assert_eq!(doc.included[0].kind, "phone_numbers");
    }

    #[test]
    fn null_document_serializes_null_data() {
        let v = serde_json::to_value(Document::null()).unwrap();
        assert_eq!(v, serde_json::json!({ "data": null }));
    }

    #[test]
    fn to_one_linkage_serializes_identifier() {
        let linkage = Linkage::ToOne(Some(ResourceIdentifier {
            kind: "contacts",
            id: "3".into(),
        }));
        let v = serde_json::to_value(linkage).unwrap();
        assert_eq!(v, serde_json::json!({ "type": "contacts", "id": "3" }));
    }
}
