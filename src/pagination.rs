//! Paginator strategies: parse `page[..]`, window the listing, build links and meta.

use crate::config::{ApiConfig, PaginatorKind};
use crate::error::AppError;
use crate::query::to_query_string;
use crate::response::TopLinks;
use crate::store::Window;
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageRequest {
    Unpaginated,
    Offset { offset: u64, limit: u64 },
    Paged { number: u64, size: u64 },
}

fn parse_u64(param: &str, raw: &str) -> Result<u64, AppError> {
    raw.trim().parse::<u64>().map_err(|_| AppError::InvalidPageValue {
        param: param.to_string(),
        value: raw.to_string(),
    })
}

/// Windows are bound by the store's signed 64-bit OFFSET.
const MAX_OFFSET: u64 = i64::MAX as u64;

fn reject_unknown(page: &BTreeMap<String, String>, allowed: &[&str]) -> Result<(), AppError> {
    match page.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(k) => Err(AppError::bad_parameter(
            format!("page[{}]", k),
            format!("{} is not a supported page parameter", k),
        )),
        None => Ok(()),
    }
}

/// Size-like parameter: defaults when omitted, at least 1, never above the maximum.
fn size_param(
    page: &BTreeMap<String, String>,
    param: &'static str,
    config: &ApiConfig,
) -> Result<u64, AppError> {
    let Some(raw) = page.get(param) else {
        return Ok(config.default_page_size);
    };
    let size = parse_u64(param, raw)?;
    if size == 0 {
        return Err(AppError::InvalidPageValue {
            param: param.to_string(),
            value: raw.clone(),
        });
    }
    if size > config.maximum_page_size {
        return Err(AppError::PageSizeExceeded {
            param,
            requested: size,
            maximum: config.maximum_page_size,
        });
    }
    Ok(size)
}

impl PageRequest {
    /// Interpret `page[..]` under the configured paginator.
    pub fn from_params(page: &BTreeMap<String, String>, config: &ApiConfig) -> Result<Self, AppError> {
        match config.default_paginator {
            PaginatorKind::None => {
                reject_unknown(page, &[])?;
                Ok(PageRequest::Unpaginated)
            }
            PaginatorKind::Offset => {
                reject_unknown(page, &["offset", "limit"])?;
                let offset = match page.get("offset") {
                    Some(raw) => match parse_u64("offset", raw)? {
                        o if o > MAX_OFFSET => {
                            return Err(AppError::InvalidPageValue {
                                param: "offset".into(),
                                value: raw.clone(),
                            })
                        }
                        o => o,
                    },
                    None => 0,
                };
                let limit = size_param(page, "limit", config)?;
                Ok(PageRequest::Offset { offset, limit })
            }
            PaginatorKind::Paged => {
                reject_unknown(page, &["number", "size"])?;
                let number = match page.get("number") {
                    Some(raw) => match parse_u64("number", raw)? {
                        0 => {
                            return Err(AppError::InvalidPageValue {
                                param: "number".into(),
                                value: raw.clone(),
                            })
                        }
                        n => n,
                    },
                    None => 1,
                };
                let size = size_param(page, "size", config)?;
                match (number - 1).checked_mul(size) {
                    Some(offset) if offset <= MAX_OFFSET => Ok(PageRequest::Paged { number, size }),
                    _ => Err(AppError::InvalidPageValue {
                        param: "number".into(),
                        value: page.get("number").cloned().unwrap_or_default(),
                    }),
                }
            }
        }
    }

    pub fn window(&self) -> Window {
        match *self {
            PageRequest::Unpaginated => Window::default(),
            PageRequest::Offset { offset, limit } => Window {
                offset,
                limit: Some(limit),
            },
            PageRequest::Paged { number, size } => Window {
                offset: (number - 1).saturating_mul(size).min(MAX_OFFSET),
                limit: Some(size),
            },
        }
    }

    /// `first`/`prev`/`next`/`last` links, keeping every non-page parameter in `other`.
    pub fn links(&self, base_url: &str, other: &[(String, String)], total: u64) -> TopLinks {
        let link = |page: Vec<(&str, u64)>| {
            let mut pairs = other.to_vec();
            pairs.extend(page.into_iter().map(|(k, v)| (format!("page[{}]", k), v.to_string())));
            format!("{}?{}", base_url, to_query_string(&pairs))
        };
        match *self {
            PageRequest::Unpaginated => TopLinks::default(),
            PageRequest::Paged { number, size } => {
                let last = total.div_ceil(size).max(1);
                TopLinks {
                    first: Some(link(vec![("number", 1), ("size", size)])),
                    prev: (number > 1).then(|| link(vec![("number", (number - 1).min(last)), ("size", size)])),
                    next: (number < last).then(|| link(vec![("number", number + 1), ("size", size)])),
                    last: Some(link(vec![("number", last), ("size", size)])),
                    ..TopLinks::default()
                }
            }
            PageRequest::Offset { offset, limit } => {
                let last_offset = if total == 0 { 0 } else { (total - 1) / limit * limit };
                TopLinks {
                    first: Some(link(vec![("offset", 0), ("limit", limit)])),
                    prev: (offset > 0).then(|| link(vec![("offset", offset.saturating_sub(limit)), ("limit", limit)])),
                    next: offset
                        .checked_add(limit)
                        .filter(|next| *next < total)
                        .map(|next| link(vec![("offset", next), ("limit", limit)])),
                    last: Some(link(vec![("offset", last_offset), ("limit", limit)])),
                    ..TopLinks::default()
                }
            }
        }
    }

    pub fn meta(&self, total: u64) -> Value {
        match *self {
            PageRequest::Paged { size, .. } => json!({
                "record_count": total,
                "page_count": total.div_ceil(size),
            }),
            _ => json!({ "record_count": total }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(raw: &[(&str, &str)]) -> BTreeMap<String, String> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn omitted_size_uses_default() {
        let req = PageRequest::from_params(&page(&[]), &ApiConfig::default()).unwrap();
        assert_eq!(req, PageRequest::Paged { number: 1, size: 5 });
        assert_eq!(req.window(), Window { offset: 0, limit: Some(5) });
    }

    #[test]
    fn maximum_size_is_accepted_and_one_more_is_not() {
        let config = ApiConfig::default();
        assert!(PageRequest::from_params(&page(&[("size", "100")]), &config).is_ok());
        let err = PageRequest::from_params(&page(&[("size", "101")]), &config).unwrap_err();
        assert!(matches!(
            err,
            AppError::PageSizeExceeded {
                requested: 101,
                maximum: 100,
                ..
            }
        ));
    }

    #[test]
    fn zero_or_garbage_values_are_invalid() {
        let config = ApiConfig::default();
        for raw in [("number", "0"), ("size", "0"), ("number", "two"), ("size", "-1")] {
            let err = PageRequest::from_params(&page(&[raw]), &config).unwrap_err();
            assert!(matches!(err, AppError::InvalidPageValue { .. }), "{:?}", raw);
        }
    }

    #[test]
    fn paged_window_skips_earlier_pages() {
        let req = PageRequest::Paged { number: 3, size: 5 };
        assert_eq!(req.window(), Window { offset: 10, limit: Some(5) });
    }

    #[test]
    fn paged_links_cover_neighbours() {
        let req = PageRequest::Paged { number: 2, size: 5 };
        let other = vec![("filter[contact]".to_string(), "1".to_string())];
        let links = req.links("/api/v1/phone_numbers", &other, 12);
        assert_eq!(
            links.next.as_deref(),
            Some("/api/v1/phone_numbers?filter%5Bcontact%5D=1&page%5Bnumber%5D=3&page%5Bsize%5D=5")
        );
        assert!(links.prev.is_some());
        assert!(links.last.unwrap().contains("page%5Bnumber%5D=3"));
        assert_eq!(req.meta(12), json!({ "record_count": 12, "page_count": 3 }));
    }

    #[test]
    fn last_page_has_no_next() {
        let links = PageRequest::Paged { number: 1, size: 5 }.links("/x", &[], 5);
        assert!(links.next.is_none());
        assert!(links.prev.is_none());
    }

    #[test]
    fn offset_paginator_uses_offset_and_limit() {
        let config = ApiConfig {
            default_paginator: PaginatorKind::Offset,
            ..ApiConfig::default()
        };
        let req = PageRequest::from_params(&page(&[("offset", "4"), ("limit", "2")]), &config).unwrap();
        assert_eq!(req.window(), Window { offset: 4, limit: Some(2) });
        assert!(PageRequest::from_params(&page(&[("number", "1")]), &config).is_err());
    }

    #[test]
    fn unpaginated_rejects_page_parameters() {
        let config = ApiConfig {
            default_paginator: PaginatorKind::None,
            ..ApiConfig::default()
        };
        assert_eq!(
            PageRequest::from_params(&page(&[]), &config).unwrap().window(),
            Window::default()
        );
        assert!(PageRequest::from_params(&page(&[("size", "5")]), &config).is_err());
    }

    #[test]
    fn offset_beyond_signed_range_is_invalid() {
        let config = ApiConfig {
            default_paginator: PaginatorKind::Offset,
            ..ApiConfig::default()
        };
        let err = PageRequest::from_params(&page(&[("offset", "18446744073709551615")]), &config).unwrap_err();
        assert!(matches!(err, AppError::InvalidPageValue { ref param, .. } if param == "offset"));
        assert!(PageRequest::from_params(&page(&[("offset", "9223372036854775807")]), &config).is_ok());
    }

    #[test]
    fn offset_links_do_not_overflow() {
        let req = PageRequest::Offset {
            offset: u64::MAX - 1,
            limit: 5,
        };
        let links = req.links("/x", &[], 3);
        assert!(links.next.is_none());
        assert!(links.prev.is_some());
    }

    #[test]
    fn page_number_past_signed_offset_is_invalid() {
        let config = ApiConfig::default();
        let err = PageRequest::from_params(&page(&[("number", "18446744073709551615")]), &config).unwrap_err();
        assert!(matches!(err, AppError::InvalidPageValue { ref param, .. } if param == "number"));
        let err = PageRequest::from_params(&page(&[("number", "9223372036854775807"), ("size", "2")]), &config)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidPageValue { .. }));
    }
}
