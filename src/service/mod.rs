//! Resource services: check the request against the schema, call the store, build the document.

mod contacts;
mod phone_numbers;

pub use contacts::ContactService;
pub use phone_numbers::PhoneNumberService;

use crate::error::{AppError, FieldError};
use crate::pagination::PageRequest;
use crate::query::ApiQuery;
use crate::resource::ResourceType;
use crate::response::{Document, ResourceObject, TopLinks};
use crate::state::AppState;

/// Every write clears both types: relationship linkage appears in documents of either type.
fn invalidate_after_write(state: &AppState) {
    state.cache.invalidate(&ResourceType::ALL);
}

/// Collection document with `self` and pagination links plus record counts.
fn collection_document(resources: Vec<ResourceObject>, page: &PageRequest, total: u64, q: &ApiQuery) -> Document {
    let links = TopLinks {
        self_link: Some(q.canonical_url()),
        ..page.links(&q.path, &q.params.canonical_without_page(), total)
    };
    Document::many(resources).with_links(links).with_meta(page.meta(total))
}

/// A phone number may only point at a contact that exists.
async fn ensure_contact_exists(state: &AppState, contact_id: i64, pointer: &str) -> Result<(), AppError> {
    match state.store.find_contact(contact_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Validation(vec![FieldError {
            field: "contact".into(),
            message: format!("contact {} does not exist", contact_id),
            pointer: pointer.into(),
        }])),
    }
}
