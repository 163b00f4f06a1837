//! Request documents: `{"data": {"type", "id", "attributes", "relationships"}}`.

use crate::error::AppError;
use crate::resource::schema::{Cardinality, RelationshipDef, ResourceSchema};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// What the document is for. Updates carry the id from the URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Create,
    Update(i64),
}

/// Linkage data sent by the client, reduced to ids of the related type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkageData {
    ToOne(Option<i64>),
    ToMany(Vec<i64>),
}

/// A request document checked against a schema: only writable names survive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedResource {
    pub attributes: BTreeMap<&'static str, Option<String>>,
    pub relationships: BTreeMap<&'static str, LinkageData>,
}

impl ParsedResource {
    /// Presence and value of a to-one relationship.
    pub fn to_one(&mut self, name: &str) -> Option<Option<i64>> {
        match self.relationships.remove(name) {
            Some(LinkageData::ToOne(id)) => Some(id),
            _ => None,
        }
    }
}

pub fn parse_resource(
    schema: &'static ResourceSchema,
    body: Value,
    intent: Intent,
) -> Result<ParsedResource, AppError> {
    let Value::Object(mut data) = take_data(body)? else {
        return Err(AppError::bad_pointer("/data", "data must be a resource object"));
    };

    match data.get("type") {
        Some(Value::String(t)) if t == schema.kind.as_str() => {}
        Some(Value::String(t)) => {
            return Err(AppError::Conflict(format!(
                "{} is not a valid type for this operation, expected {}",
                t, schema.kind
            )))
        }
        _ => return Err(AppError::bad_pointer("/data/type", "type is required")),
    }

    match (intent, data.get("id")) {
        (Intent::Create, Some(_)) => {
            return Err(AppError::bad_pointer("/data/id", "client generated ids are not supported"))
        }
        (Intent::Update(expected), Some(given)) => {
            if parse_id(given) != Some(expected) {
                return Err(AppError::Conflict(format!(
                    "id {} does not match the id {} in the URL",
                    given, expected
                )));
            }
        }
        _ => {}
    }

    let mut parsed = ParsedResource::default();

    if let Some(attributes) = data.remove("attributes") {
        for (key, value) in object_member(attributes, "/data/attributes")? {
            let pointer = format!("/data/attributes/{}", key);
            let name = schema
                .writable
                .iter()
                .copied()
                .find(|w| *w == key)
                .ok_or_else(|| AppError::bad_pointer(pointer.clone(), format!("{} is not allowed", key)))?;
            let value = match value {
                Value::Null => None,
                Value::String(s) => Some(s),
                _ => return Err(AppError::bad_pointer(pointer, format!("{} must be a string or null", key))),
            };
            parsed.attributes.insert(name, value);
        }
    }

    if let Some(relationships) = data.remove("relationships") {
        for (key, value) in object_member(relationships, "/data/relationships")? {
            let pointer = format!("/data/relationships/{}", key);
            let def = schema
                .relationship(&key)
                .filter(|r| r.writable)
                .ok_or_else(|| AppError::bad_pointer(pointer.clone(), format!("{} is not allowed", key)))?;
            let linkage = match value {
                Value::Object(mut rel) => match rel.remove("data") {
                    Some(data) => parse_linkage(def, data, &format!("{}/data", pointer))?,
                    None => return Err(AppError::bad_pointer(pointer, "relationship data is required")),
                },
                _ => return Err(AppError::bad_pointer(pointer, "relationship must be an object")),
            };
            parsed.relationships.insert(def.name, linkage);
        }
    }

    Ok(parsed)
}

/// Body of a `PATCH .../relationships/<name>` request.
pub fn parse_relationship(def: &'static RelationshipDef, body: Value) -> Result<LinkageData, AppError> {
    let data = take_data(body)?;
    parse_linkage(def, data, "/data")
}

fn take_data(body: Value) -> Result<Value, AppError> {
    match body {
        Value::Object(mut doc) => doc
            .remove("data")
            .ok_or_else(|| AppError::bad_pointer("/data", "data is required")),
        _ => Err(AppError::bad_request("request body must be a JSON object")),
    }
}

fn object_member(value: Value, pointer: &str) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::bad_pointer(pointer, "must be an object")),
    }
}

fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

fn parse_identifier(def: &RelationshipDef, value: &Value, pointer: &str) -> Result<i64, AppError> {
    let Value::Object(ident) = value else {
        return Err(AppError::bad_pointer(pointer, "resource identifier must be an object"));
    };
    match ident.get("type") {
        Some(Value::String(t)) if t == def.related.as_str() => {}
        _ => {
            return Err(AppError::bad_pointer(
                format!("{}/type", pointer),
                format!("{} expects type {}", def.name, def.related),
            ))
        }
    }
    ident
        .get("id")
        .and_then(parse_id)
        .ok_or_else(|| AppError::bad_pointer(format!("{}/id", pointer), "id must be an integer"))
}

fn parse_linkage(def: &RelationshipDef, data: Value, pointer: &str) -> Result<LinkageData, AppError> {
    match (def.cardinality, data) {
        (Cardinality::ToOne, Value::Null) => Ok(LinkageData::ToOne(None)),
        (Cardinality::ToOne, ident @ Value::Object(_)) => {
            Ok(LinkageData::ToOne(Some(parse_identifier(def, &ident, pointer)?)))
        }
        (Cardinality::ToMany, Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_identifier(def, item, &format!("{}/{}", pointer, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(LinkageData::ToMany),
        (Cardinality::ToOne, _) => Err(AppError::bad_pointer(pointer, "to-one linkage must be an object or null")),
        (Cardinality::ToMany, _) => Err(AppError::bad_pointer(pointer, "to-many linkage must be an array")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::schema::{CONTACT_SCHEMA, PHONE_NUMBER_SCHEMA};
    use serde_json::json;

    #[test]
    fn create_keeps_writable_attributes() {
        let parsed = parse_resource(
            &CONTACT_SCHEMA,
            json!({"data": {"type": "contacts", "attributes": {"name_first": "Ada", "email": null}}}),
            Intent::Create,
        )
        .unwrap();
        assert_eq!(parsed.attributes["name_first"].as_deref(), Some("Ada"));
        assert_eq!(parsed.attributes["email"], None);
        assert!(!parsed.attributes.contains_key("name_last"));
    }

    #[test]
    fn missing_data_is_a_bad_request() {
        let err = parse_resource(&CONTACT_SCHEMA, json!({"name_first": "Ada"}), Intent::Create).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn type_mismatch_conflicts() {
        let err = parse_resource(&CONTACT_SCHEMA, json!({"data": {"type": "phone_numbers"}}), Intent::Create).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn update_id_must_match_url() {
        let body = json!({"data": {"type": "contacts", "id": "2"}});
        assert!(parse_resource(&CONTACT_SCHEMA, body.clone(), Intent::Update(2)).is_ok());
        assert!(matches!(
            parse_resource(&CONTACT_SCHEMA, body, Intent::Update(3)),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn client_ids_and_read_only_fields_are_rejected() {
        assert!(parse_resource(&CONTACT_SCHEMA, json!({"data": {"type": "contacts", "id": "9"}}), Intent::Create).is_err());
        let err = parse_resource(
            &CONTACT_SCHEMA,
            json!({"data": {"type": "contacts", "attributes": {"created_at": "2020-01-01"}}}),
            Intent::Create,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::BadRequest { origin: Some(crate::error::ErrorSource::Pointer(ref p)), .. }
                if p == "/data/attributes/created_at"
        ));
        assert!(parse_resource(
            &CONTACT_SCHEMA,
            json!({"data": {"type": "contacts", "relationships": {"phone_numbers": {"data": []}}}}),
            Intent::Create,
        )
        .is_err());
    }

    #[test]
    fn to_one_linkage_accepts_string_or_number_ids() {
        for id in [json!("1"), json!(1)] {
            let mut parsed = parse_resource(
                &PHONE_NUMBER_SCHEMA,
                json!({"data": {"type": "phone_numbers",
                    "relationships": {"contact": {"data": {"type": "contacts", "id": id}}}}}),
                Intent::Create,
            )
            .unwrap();
            assert_eq!(parsed.to_one("contact"), Some(Some(1)));
        }
    }

    #[test]
    fn linkage_type_must_match_relationship() {
        let err = parse_relationship(
            PHONE_NUMBER_SCHEMA.relationship("contact").unwrap(),
            json!({"data": {"type": "phone_numbers", "id": "1"}}),
        )
        .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(
            parse_relationship(PHONE_NUMBER_SCHEMA.relationship("contact").unwrap(), json!({"data": null})).unwrap(),
            LinkageData::ToOne(None)
        );
    }

    #[test]
    fn to_many_linkage_reads_every_identifier() {
        let def = CONTACT_SCHEMA.relationship("phone_numbers").unwrap();
        let parsed = parse_relationship(
            def,
            json!({"data": [{"type": "phone_numbers", "id": "3"}, {"type": "phone_numbers", "id": 7}]}),
        )
        .unwrap();
        assert_eq!(parsed, LinkageData::ToMany(vec![3, 7]));

        let err = parse_relationship(def, json!({"data": [{"type": "phone_numbers", "id": "x"}]})).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(parse_relationship(def, json!({"data": {"type": "phone_numbers", "id": "1"}})).is_err());
    }
}
