//! JSON:API query parameters: `filter[..]`, `page[..]`, `fields[..]`, `include`, `sort`.

use crate::error::AppError;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn family_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(filter|page|fields)\[([A-Za-z0-9_\-]+)\]$").expect("static pattern"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortTerm {
    pub field: String,
    pub descending: bool,
}

/// Raw, syntactically parsed parameters. Checking them against a resource happens in `resource::ListOptions` and `resource::FetchOptions`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub filters: BTreeMap<String, String>,
    pub page: BTreeMap<String, String>,
    pub fields: BTreeMap<String, Vec<String>>,
    pub include: Vec<String>,
    pub sort: Vec<SortTerm>,
}

impl QueryParams {
    /// Parse decoded `key=value` pairs. Unknown parameter names fail with 400.
    pub fn parse<I>(pairs: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut q = QueryParams::default();
        for (key, value) in pairs {
            match key.as_str() {
                "include" => q.include = split_list(&value),
                "sort" => {
                    q.sort = split_list(&value)
                        .into_iter()
                        .map(|term| match term.strip_prefix('-') {
                            Some(field) => SortTerm {
                                field: field.to_string(),
                                descending: true,
                            },
                            None => SortTerm {
                                field: term,
                                descending: false,
                            },
                        })
                        .collect();
                }
                _ => {
                    let caps = family_pattern()
                        .captures(&key)
                        .ok_or_else(|| AppError::bad_parameter(key.clone(), format!("{} is not a supported parameter", key)))?;
                    let name = caps[2].to_string();
                    match &caps[1] {
                        "filter" => {
                            q.filters.insert(name, value);
                        }
                        "page" => {
                            q.page.insert(name, value);
                        }
                        _ => {
                            q.fields.insert(name, split_list(&value));
                        }
                    }
                }
            }
        }
        Ok(q)
    }

    /// Name of the first parameter that only makes sense on a collection, if any.
    pub fn collection_param(&self) -> Option<String> {
        if let Some(k) = self.page.keys().next() {
            return Some(format!("page[{}]", k));
        }
        if !self.sort.is_empty() {
            return Some("sort".to_string());
        }
        None
    }

    /// Stable rendering of every parameter except `page[..]`, used for cache keys and pagination links.
    pub fn canonical_without_page(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (k, v) in &self.filters {
            out.push((format!("filter[{}]", k), v.clone()));
        }
        for (k, v) in &self.fields {
            out.push((format!("fields[{}]", k), v.join(",")));
        }
        if !self.include.is_empty() {
            out.push(("include".to_string(), self.include.join(",")));
        }
        if !self.sort.is_empty() {
            let terms: Vec<String> = self
                .sort
                .iter()
                .map(|t| if t.descending { format!("-{}", t.field) } else { t.field.clone() })
                .collect();
            out.push(("sort".to_string(), terms.join(",")));
        }
        out
    }

    /// Every parameter in stable order.
    pub fn canonical(&self) -> Vec<(String, String)> {
        let mut out = self.canonical_without_page();
        for (k, v) in &self.page {
            out.push((format!("page[{}]", k), v.clone()));
        }
        out
    }
}

/// Request path plus its parsed parameters, as handed to the service layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiQuery {
    pub path: String,
    pub params: QueryParams,
}

impl ApiQuery {
    /// `path?canonical-query`; parameter order in the request does not matter.
    pub fn canonical_url(&self) -> String {
        let canonical = self.params.canonical();
        if canonical.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, to_query_string(&canonical))
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Render pairs as an encoded query string (no leading `?`).
pub fn to_query_string(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn parses_each_family() {
        let q = QueryParams::parse(pairs(&[
            ("filter[contact]", "3"),
            ("page[number]", "2"),
            ("page[size]", "10"),
            ("fields[contacts]", "name_first, email"),
            ("include", "phone_numbers"),
            ("sort", "-name_last,id"),
        ]))
        .unwrap();
        assert_eq!(q.filters.get("contact").map(String::as_str), Some("3"));
        assert_eq!(q.page.len(), 2);
        assert_eq!(q.fields["contacts"], vec!["name_first", "email"]);
        assert_eq!(q.include, vec!["phone_numbers"]);
        assert_eq!(
            q.sort,
            vec![
                SortTerm {
                    field: "name_last".into(),
                    descending: true
                },
                SortTerm {
                    field: "id".into(),
                    descending: false
                },
            ]
        );
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let err = QueryParams::parse(pairs(&[("limit", "10")])).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn canonical_form_ignores_input_order() {
        let a = QueryParams::parse(pairs(&[("page[size]", "2"), ("filter[contact]", "1")])).unwrap();
        let b = QueryParams::parse(pairs(&[("filter[contact]", "1"), ("page[size]", "2")])).unwrap();
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn canonical_url_omits_empty_query() {
        let q = ApiQuery {
            path: "/api/v1/contacts".into(),
            params: QueryParams::parse(pairs(&[("sort", "-id")])).unwrap(),
        };
        assert_eq!(q.canonical_url(), "/api/v1/contacts?sort=-id");
        assert_eq!(
            ApiQuery {
                path: "/api/v1/contacts".into(),
                ..ApiQuery::default()
            }
            .canonical_url(),
            "/api/v1/contacts"
        );
    }

    #[test]
    fn brackets_are_percent_encoded() {
        let qs = to_query_string(&pairs(&[("page[number]", "2")]));
        assert_eq!(qs, "page%5Bnumber%5D=2");
    }

    #[test]
    fn unreserved_characters_pass_through() {
        let qs = to_query_string(&pairs(&[("sort", "-name_last,email"), ("fields[contacts]", "a b")]));
        assert_eq!(qs, "sort=-name_last%2Cemail&fields%5Bcontacts%5D=a%20b");
    }
}
