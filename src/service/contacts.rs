use super::{collection_document, invalidate_after_write};
use crate::error::AppError;
use crate::model::{Contact, ContactChanges, ContactDraft, PhoneNumber};
use crate::query::ApiQuery;
use crate::resource::{
    parse_resource, phone_numbers_linkage, relationship_links, render_contact, render_phone_number, FetchOptions,
    Fieldsets, Intent, ListOptions, ResourceType, CONTACT_SCHEMA,
};
use crate::response::{Document, ResourceObject};
use crate::state::AppState;
use serde_json::Value;
use std::collections::HashMap;

pub struct ContactService;

impl ContactService {
    /// One page of contacts with their phone number linkage.
    pub async fn list(state: &AppState, q: &ApiQuery) -> Result<Document, AppError> {
        let opts = ListOptions::resolve(&CONTACT_SCHEMA, &q.params, &state.config)?;
        state
            .cache
            .get_or_insert_with(ResourceType::Contacts, q.canonical_url(), || async move {
                let listing = state.store.list_contacts(&opts.sort, opts.page.window()).await?;
                let ids: Vec<i64> = listing.records.iter().map(|c| c.id).collect();
                let numbers = state.store.phone_numbers_for_contacts(&ids).await?;

                let mut owned: HashMap<i64, Vec<PhoneNumber>> = HashMap::new();
                for n in &numbers {
                    if let Some(contact_id) = n.contact_id {
                        owned.entry(contact_id).or_default().push(n.clone());
                    }
                }
                let resources = listing
                    .records
                    .iter()
                    .map(|c| {
                        let mine = owned.get(&c.id).map(Vec::as_slice).unwrap_or(&[]);
                        render_contact(c, mine, &opts.fieldsets)
                    })
                    .collect();

                let mut doc = collection_document(resources, &opts.page, listing.total, q);
                if opts.includes("phone_numbers") {
                    doc = doc.include(render_numbers(&numbers, &opts.fieldsets));
                }
                Ok(doc)
            })
            .await
    }

    pub async fn fetch(state: &AppState, id: i64, q: &ApiQuery) -> Result<Document, AppError> {
        let opts = FetchOptions::resolve(&CONTACT_SCHEMA, &q.params)?;
        state
            .cache
            .get_or_insert_with(ResourceType::Contacts, q.canonical_url(), || async move {
                let contact = Self::load(state, id).await?;
                Self::document(state, &contact, &opts).await
            })
            .await
    }

    pub async fn create(state: &AppState, body: Value) -> Result<Document, AppError> {
        let parsed = parse_resource(&CONTACT_SCHEMA, body, Intent::Create)?;
        let fields = ContactDraft::default().apply(ContactChanges::from(parsed)).validate()?;
        let contact = state.store.insert_contact(&fields).await?;
        invalidate_after_write(state);
        tracing::info!(contact_id = contact.id, "contact created");
        Ok(Document::one(render_contact(&contact, &[], &Fieldsets::default())))
    }

    /// Merges the changes into the stored contact and validates the result before writing.
    pub async fn update(state: &AppState, id: i64, body: Value) -> Result<Document, AppError> {
        let parsed = parse_resource(&CONTACT_SCHEMA, body, Intent::Update(id))?;
        let existing = Self::load(state, id).await?;
        let fields = existing.draft().apply(ContactChanges::from(parsed)).validate()?;
        let contact = state
            .store
            .update_contact(id, &fields)
            .await?
            .ok_or_else(|| AppError::not_found("contacts", id))?;
        invalidate_after_write(state);
        tracing::info!(contact_id = id, "contact updated");
        let numbers = contact.phone_numbers().fetch(state.store.as_ref()).await?;
        Ok(Document::one(render_contact(&contact, &numbers, &Fieldsets::default())))
    }

    /// Deletes the contact together with its phone numbers.
    pub async fn delete(state: &AppState, id: i64) -> Result<(), AppError> {
        if !state.store.delete_contact(id).await? {
            return Err(AppError::not_found("contacts", id));
        }
        invalidate_after_write(state);
        tracing::info!(contact_id = id, "contact deleted");
        Ok(())
    }

    /// `GET /contacts/:id/phone_numbers`: the contact's phone numbers as a collection.
    pub async fn related_phone_numbers(state: &AppState, id: i64, q: &ApiQuery) -> Result<Document, AppError> {
        let opts = ListOptions::resolve(ResourceType::PhoneNumbers.schema(), &q.params, &state.config)?;
        state
            .cache
            .get_or_insert_with(ResourceType::PhoneNumbers, q.canonical_url(), || async move {
                Self::load(state, id).await?;
                let owners: Vec<i64> = match opts.filter_values("contact") {
                    Some(ids) => ids.iter().copied().filter(|c| *c == id).collect(),
                    None => vec![id],
                };
                super::PhoneNumberService::collection(state, owners, &opts, q).await
            })
            .await
    }

    /// `GET /contacts/:id/relationships/phone_numbers`
    pub async fn phone_numbers_relationship(state: &AppState, id: i64, q: &ApiQuery) -> Result<Document, AppError> {
        FetchOptions::resolve(&CONTACT_SCHEMA, &q.params)?;
        state
            .cache
            .get_or_insert_with(ResourceType::Contacts, q.canonical_url(), || async move {
                let contact = Self::load(state, id).await?;
                let numbers = contact.phone_numbers().fetch(state.store.as_ref()).await?;
                Ok(Document::linkage(
                    phone_numbers_linkage(&numbers),
                    relationship_links(ResourceType::Contacts, id, "phone_numbers"),
                ))
            })
            .await
    }

    pub(crate) async fn load(state: &AppState, id: i64) -> Result<Contact, AppError> {
        state
            .store
            .find_contact(id)
            .await?
            .ok_or_else(|| AppError::not_found("contacts", id))
    }

    /// Single-contact document; phone numbers are re-read for the linkage and any `include`.
    pub(crate) async fn document(state: &AppState, contact: &Contact, opts: &FetchOptions) -> Result<Document, AppError> {
        let numbers = contact.phone_numbers().fetch(state.store.as_ref()).await?;
        let mut doc = Document::one(render_contact(contact, &numbers, &opts.fieldsets));
        if opts.includes("phone_numbers") {
            doc = doc.include(render_numbers(&numbers, &opts.fieldsets));
        }
        Ok(doc)
    }
}

fn render_numbers(numbers: &[PhoneNumber], fieldsets: &Fieldsets) -> Vec<ResourceObject> {
    numbers.iter().map(|n| render_phone_number(n, fieldsets)).collect()
}
