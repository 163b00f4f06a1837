use super::{collection_document, ensure_contact_exists, invalidate_after_write, ContactService};
use crate::error::AppError;
use crate::model::{PhoneNumber, PhoneNumberChanges};
use crate::query::ApiQuery;
use crate::resource::{
    parse_relationship, parse_resource, relationship_links, render, render_phone_number, FetchOptions, Fieldsets,
    Intent, LinkageData, ListOptions, ResourceType, PHONE_NUMBER_SCHEMA,
};
use crate::response::{Document, ResourceObject};
use crate::state::AppState;
use crate::store::PhoneNumberFilter;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

pub struct PhoneNumberService;

impl PhoneNumberService {
    /// One page of phone numbers; `filter[contact]` narrows to the given owners.
    pub async fn list(state: &AppState, q: &ApiQuery) -> Result<Document, AppError> {
        let opts = ListOptions::resolve(&PHONE_NUMBER_SCHEMA, &q.params, &state.config)?;
        state
            .cache
            .get_or_insert_with(ResourceType::PhoneNumbers, q.canonical_url(), || async move {
                let filter = PhoneNumberFilter {
                    contact_ids: opts.filter_values("contact").map(<[i64]>::to_vec),
                };
                Self::listing_document(state, &filter, &opts, q).await
            })
            .await
    }

    /// Phone numbers owned by any of `owners`, windowed and rendered as a collection.
    pub(crate) async fn collection(
        state: &AppState,
        owners: Vec<i64>,
        opts: &ListOptions,
        q: &ApiQuery,
    ) -> Result<Document, AppError> {
        let filter = PhoneNumberFilter {
            contact_ids: Some(owners),
        };
        Self::listing_document(state, &filter, opts, q).await
    }

    async fn listing_document(
        state: &AppState,
        filter: &PhoneNumberFilter,
        opts: &ListOptions,
        q: &ApiQuery,
    ) -> Result<Document, AppError> {
        let listing = state
            .store
            .list_phone_numbers(filter, &opts.sort, opts.page.window())
            .await?;
        let resources = listing
            .records
            .iter()
            .map(|n| render_phone_number(n, &opts.fieldsets))
            .collect();
        let mut doc = collection_document(resources, &opts.page, listing.total, q);
        if opts.includes("contact") {
            doc = doc.include(owners_of(state, &listing.records, &opts.fieldsets).await?);
        }
        Ok(doc)
    }

    pub async fn fetch(state: &AppState, id: i64, q: &ApiQuery) -> Result<Document, AppError> {
        let opts = FetchOptions::resolve(&PHONE_NUMBER_SCHEMA, &q.params)?;
        state
            .cache
            .get_or_insert_with(ResourceType::PhoneNumbers, q.canonical_url(), || async move {
                let number = Self::load(state, id).await?;
                let mut doc = Document::one(render_phone_number(&number, &opts.fieldsets));
                if opts.includes("contact") {
                    doc = doc.include(owners_of(state, std::slice::from_ref(&number), &opts.fieldsets).await?);
                }
                Ok(doc)
            })
            .await
    }

    pub async fn create(state: &AppState, body: Value) -> Result<Document, AppError> {
        let parsed = parse_resource(&PHONE_NUMBER_SCHEMA, body, Intent::Create)?;
        let changes = PhoneNumberChanges::from(parsed);
        if let Some(Some(contact_id)) = changes.contact_id {
            ensure_contact_exists(state, contact_id, "/data/relationships/contact").await?;
        }
        let number = state.store.insert_phone_number(&changes).await?;
        invalidate_after_write(state);
        tracing::info!(phone_number_id = number.id, contact_id = ?number.contact_id, "phone number created");
        Ok(Document::one(render_phone_number(&number, &Fieldsets::default())))
    }

    /// Writes only the attributes and linkage present in the document.
    pub async fn update(state: &AppState, id: i64, body: Value) -> Result<Document, AppError> {
        let parsed = parse_resource(&PHONE_NUMBER_SCHEMA, body, Intent::Update(id))?;
        let changes = PhoneNumberChanges::from(parsed);
        let number = Self::apply(state, id, &changes, "/data/relationships/contact").await?;
        Ok(Document::one(render_phone_number(&number, &Fieldsets::default())))
    }

    pub async fn delete(state: &AppState, id: i64) -> Result<(), AppError> {
        if !state.store.delete_phone_number(id).await? {
            return Err(AppError::not_found("phone_numbers", id));
        }
        invalidate_after_write(state);
        tracing::info!(phone_number_id = id, "phone number deleted");
        Ok(())
    }

    /// `GET /phone_numbers/:id/contact`: the owning contact, or null data for an orphan.
    pub async fn related_contact(state: &AppState, id: i64, q: &ApiQuery) -> Result<Document, AppError> {
        let opts = FetchOptions::resolve(ResourceType::Contacts.schema(), &q.params)?;
        state
            .cache
            .get_or_insert_with(ResourceType::Contacts, q.canonical_url(), || async move {
                let number = Self::load(state, id).await?;
                let Some(contact_id) = number.contact_id else {
                    return Ok(Document::null());
                };
                match state.store.find_contact(contact_id).await? {
                    Some(contact) => ContactService::document(state, &contact, &opts).await,
                    None => Ok(Document::null()),
                }
            })
            .await
    }

    /// `GET /phone_numbers/:id/relationships/contact`
    pub async fn contact_relationship(state: &AppState, id: i64, q: &ApiQuery) -> Result<Document, AppError> {
        FetchOptions::resolve(&PHONE_NUMBER_SCHEMA, &q.params)?;
        state
            .cache
            .get_or_insert_with(ResourceType::PhoneNumbers, q.canonical_url(), || async move {
                let number = Self::load(state, id).await?;
                Ok(Document::linkage(
                    number.contact_linkage(),
                    relationship_links(ResourceType::PhoneNumbers, id, "contact"),
                ))
            })
            .await
    }

    /// `PATCH /phone_numbers/:id/relationships/contact`: replace the owner, or clear it with null data.
    pub async fn replace_contact(state: &AppState, id: i64, body: Value) -> Result<(), AppError> {
        let def = PHONE_NUMBER_SCHEMA
            .relationship("contact")
            .ok_or_else(|| AppError::bad_request("contact relationship is not defined"))?;
        let LinkageData::ToOne(contact_id) = parse_relationship(def, body)? else {
            return Err(AppError::bad_pointer("/data", "contact linkage must be a single resource identifier"));
        };
        let changes = PhoneNumberChanges {
            contact_id: Some(contact_id),
            ..PhoneNumberChanges::default()
        };
        Self::apply(state, id, &changes, "/data").await?;
        Ok(())
    }

    async fn apply(
        state: &AppState,
        id: i64,
        changes: &PhoneNumberChanges,
        contact_pointer: &str,
    ) -> Result<PhoneNumber, AppError> {
        let current = Self::load(state, id).await?;
        if changes.is_empty() {
            return Ok(current);
        }
        if let Some(Some(contact_id)) = changes.contact_id {
            ensure_contact_exists(state, contact_id, contact_pointer).await?;
        }
        let number = state
            .store
            .update_phone_number(id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("phone_numbers", id))?;
        invalidate_after_write(state);
        tracing::info!(phone_number_id = id, contact_id = ?number.contact_id, "phone number updated");
        Ok(number)
    }

    async fn load(state: &AppState, id: i64) -> Result<PhoneNumber, AppError> {
        state
            .store
            .find_phone_number(id)
            .await?
            .ok_or_else(|| AppError::not_found("phone_numbers", id))
    }
}

/// Owning contacts of `numbers`, for `include=contact`. Their phone number linkage is left to the related link.
async fn owners_of(state: &AppState, numbers: &[PhoneNumber], fieldsets: &Fieldsets) -> Result<Vec<ResourceObject>, AppError> {
    let ids: Vec<i64> = numbers
        .iter()
        .filter_map(|n| n.contact_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let contacts = state.store.find_contacts(&ids).await?;
    Ok(contacts.iter().map(|c| render(c, HashMap::new(), fieldsets)).collect())
}
