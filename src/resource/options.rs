//! Check parsed query parameters against a resource schema.

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::pagination::PageRequest;
use crate::query::QueryParams;
use crate::resource::render::Fieldsets;
use crate::resource::schema::{FilterDef, RelationshipDef, ResourceSchema, ResourceType};
use crate::store::SortField;
use std::collections::{BTreeMap, HashSet};

/// Options for collection endpoints.
#[derive(Debug)]
pub struct ListOptions {
    pub filters: Vec<(&'static FilterDef, Vec<i64>)>,
    pub sort: Vec<SortField>,
    pub page: PageRequest,
    pub includes: Vec<&'static RelationshipDef>,
    pub fieldsets: Fieldsets,
}

/// Options for single-resource endpoints.
#[derive(Debug)]
pub struct FetchOptions {
    pub includes: Vec<&'static RelationshipDef>,
    pub fieldsets: Fieldsets,
}

impl ListOptions {
    pub fn resolve(schema: &'static ResourceSchema, q: &QueryParams, config: &ApiConfig) -> Result<Self, AppError> {
        Ok(ListOptions {
            filters: resolve_filters(schema, &q.filters)?,
            sort: resolve_sort(schema, q)?,
            page: PageRequest::from_params(&q.page, config)?,
            includes: resolve_includes(schema, &q.include)?,
            fieldsets: resolve_fieldsets(q)?,
        })
    }

    pub fn includes(&self, relationship: &str) -> bool {
        self.includes.iter().any(|r| r.name == relationship)
    }

    /// Values given for `filter[<key>]`, if that filter was requested.
    pub fn filter_values(&self, key: &str) -> Option<&[i64]> {
        self.filters
            .iter()
            .find(|(f, _)| f.key == key)
            .map(|(_, v)| v.as_slice())
    }
}

impl FetchOptions {
    pub fn resolve(schema: &'static ResourceSchema, q: &QueryParams) -> Result<Self, AppError> {
        if let Some(key) = q.filters.keys().next() {
            return Err(AppError::UnsupportedFilter(key.clone()));
        }
        if let Some(param) = q.collection_param() {
            return Err(AppError::bad_parameter(
                param.clone(),
                format!("{} is not supported when fetching a single resource", param),
            ));
        }
        Ok(FetchOptions {
            includes: resolve_includes(schema, &q.include)?,
            fieldsets: resolve_fieldsets(q)?,
        })
    }

    pub fn includes(&self, relationship: &str) -> bool {
        self.includes.iter().any(|r| r.name == relationship)
    }
}

/// Filter values are comma-separated ids of the filter's related type.
fn resolve_filters(
    schema: &'static ResourceSchema,
    filters: &BTreeMap<String, String>,
) -> Result<Vec<(&'static FilterDef, Vec<i64>)>, AppError> {
    let mut out = Vec::new();
    for (key, raw) in filters {
        let def = schema
            .filter(key)
            .ok_or_else(|| AppError::UnsupportedFilter(key.clone()))?;
        let mut values = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let id = part.parse::<i64>().map_err(|_| {
                AppError::bad_parameter(
                    format!("filter[{}]", key),
                    format!("{} is not a valid {} id for filter {}", part, def.related, key),
                )
            })?;
            values.push(id);
        }
        if values.is_empty() {
            return Err(AppError::bad_parameter(
                format!("filter[{}]", key),
                format!("filter {} requires a value", key),
            ));
        }
        out.push((def, values));
    }
    Ok(out)
}

fn resolve_sort(schema: &'static ResourceSchema, q: &QueryParams) -> Result<Vec<SortField>, AppError> {
    q.sort
        .iter()
        .map(|term| {
            schema
                .sort_field(&term.field)
                .map(|field| SortField {
                    field,
                    descending: term.descending,
                })
                .ok_or_else(|| {
                    AppError::bad_parameter("sort", format!("{} is not a valid sort criteria for {}", term.field, schema.kind))
                })
        })
        .collect()
}

fn resolve_includes(
    schema: &'static ResourceSchema,
    include: &[String],
) -> Result<Vec<&'static RelationshipDef>, AppError> {
    include
        .iter()
        .map(|name| {
            schema.relationship(name).ok_or_else(|| {
                AppError::bad_parameter("include", format!("{} is not a valid includable relationship of {}", name, schema.kind))
            })
        })
        .collect()
}

fn resolve_fieldsets(q: &QueryParams) -> Result<Fieldsets, AppError> {
    let mut fieldsets = Fieldsets::default();
    for (type_name, fields) in &q.fields {
        let param = format!("fields[{}]", type_name);
        let kind = ResourceType::parse(type_name)
            .ok_or_else(|| AppError::bad_parameter(param.clone(), format!("{} is not a valid resource", type_name)))?;
        let schema = kind.schema();
        let mut allowed = HashSet::new();
        for field in fields {
            let name = schema
                .attribute(field)
                .or_else(|| schema.relationship(field).map(|r| r.name))
                .ok_or_else(|| AppError::bad_parameter(param.clone(), format!("{} is not a valid field for {}", field, kind)))?;
            allowed.insert(name);
        }
        fieldsets.restrict(kind, allowed);
    }
    Ok(fieldsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::schema::{CONTACT_SCHEMA, PHONE_NUMBER_SCHEMA};

    fn query(raw: &[(&str, &str)]) -> QueryParams {
        QueryParams::parse(raw.iter().map(|(k, v)| (k.to_string(), v.to_string()))).unwrap()
    }

    #[test]
    fn contact_filter_is_whitelisted_for_phone_numbers() {
        let opts = ListOptions::resolve(&PHONE_NUMBER_SCHEMA, &query(&[("filter[contact]", "1,2")]), &ApiConfig::default())
            .unwrap();
        assert_eq!(opts.filter_values("contact"), Some(&[1, 2][..]));
    }

    #[test]
    fn any_filter_on_contacts_is_unsupported() {
        let err = ListOptions::resolve(&CONTACT_SCHEMA, &query(&[("filter[contact]", "1")]), &ApiConfig::default())
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFilter(ref k) if k == "contact"));
    }

    #[test]
    fn other_phone_number_filters_are_unsupported() {
        let err = ListOptions::resolve(&PHONE_NUMBER_SCHEMA, &query(&[("filter[name]", "cell")]), &ApiConfig::default())
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFilter(_)));
    }

    #[test]
    fn non_numeric_filter_value_is_a_bad_request() {
        let err = ListOptions::resolve(&PHONE_NUMBER_SCHEMA, &query(&[("filter[contact]", "ada")]), &ApiConfig::default())
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
    }

    #[test]
    fn sort_include_and_fields_are_checked() {
        let config = ApiConfig::default();
        assert!(ListOptions::resolve(&CONTACT_SCHEMA, &query(&[("sort", "-email")]), &config).is_ok());
        assert!(ListOptions::resolve(&CONTACT_SCHEMA, &query(&[("sort", "contact_id")]), &config).is_err());
        assert!(ListOptions::resolve(&CONTACT_SCHEMA, &query(&[("include", "contact")]), &config).is_err());
        assert!(ListOptions::resolve(&CONTACT_SCHEMA, &query(&[("fields[people]", "name")]), &config).is_err());
        assert!(ListOptions::resolve(&CONTACT_SCHEMA, &query(&[("fields[phone_numbers]", "contact_id")]), &config).is_err());

        let opts = ListOptions::resolve(
            &CONTACT_SCHEMA,
            &query(&[("include", "phone_numbers"), ("fields[contacts]", "email")]),
            &config,
        )
        .unwrap();
        assert!(opts.includes("phone_numbers"));
        assert!(opts.fieldsets.allows(ResourceType::Contacts, "email"));
        assert!(!opts.fieldsets.allows(ResourceType::Contacts, "name_first"));
        assert!(opts.fieldsets.allows(ResourceType::PhoneNumbers, "name"));
    }

    #[test]
    fn fetch_rejects_collection_parameters() {
        assert!(FetchOptions::resolve(&CONTACT_SCHEMA, &query(&[("page[size]", "2")])).is_err());
        assert!(matches!(
            FetchOptions::resolve(&CONTACT_SCHEMA, &query(&[("filter[email]", "x")])),
            Err(AppError::UnsupportedFilter(_))
        ));
        assert!(FetchOptions::resolve(&PHONE_NUMBER_SCHEMA, &query(&[("include", "contact")])).is_ok());
    }
}
