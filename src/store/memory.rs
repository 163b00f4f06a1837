//! In-process store with the same semantics as the PostgreSQL tables, including the cascading delete.

use crate::error::AppError;
use crate::model::{Contact, ContactFields, PhoneNumber, PhoneNumberChanges};
use crate::store::{Listing, PhoneNumberFilter, SortField, Store, Window};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    contacts: BTreeMap<i64, Contact>,
    phone_numbers: BTreeMap<i64, PhoneNumber>,
    last_contact_id: i64,
    last_phone_number_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Orders every value before NULL, as PostgreSQL does for ASC (and after it for DESC).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NullsLast<T> {
    Value(T),
    Null,
}

impl<T> From<Option<T>> for NullsLast<T> {
    fn from(v: Option<T>) -> Self {
        v.map_or(NullsLast::Null, NullsLast::Value)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey<'a> {
    Int(NullsLast<i64>),
    Text(NullsLast<&'a str>),
    Time(DateTime<Utc>),
}

trait Sortable {
    fn id(&self) -> i64;
    fn sort_key(&self, field: &str) -> SortKey<'_>;
}

impl Sortable for Contact {
    fn id(&self) -> i64 {
        self.id
    }

    fn sort_key(&self, field: &str) -> SortKey<'_> {
        match field {
            "name_first" => SortKey::Text(NullsLast::Value(self.name_first.as_str())),
            "name_last" => SortKey::Text(NullsLast::Value(self.name_last.as_str())),
            "email" => SortKey::Text(self.email.as_deref().into()),
            "twitter" => SortKey::Text(self.twitter.as_deref().into()),
            "created_at" => SortKey::Time(self.created_at),
            "updated_at" => SortKey::Time(self.updated_at),
            _ => SortKey::Int(NullsLast::Value(self.id)),
        }
    }
}

impl Sortable for PhoneNumber {
    fn id(&self) -> i64 {
        self.id
    }

    fn sort_key(&self, field: &str) -> SortKey<'_> {
        match field {
            "name" => SortKey::Text(self.name.as_deref().into()),
            "phone_number" => SortKey::Text(self.phone_number.as_deref().into()),
            "contact_id" => SortKey::Int(self.contact_id.into()),
            "created_at" => SortKey::Time(self.created_at),
            "updated_at" => SortKey::Time(self.updated_at),
            _ => SortKey::Int(NullsLast::Value(self.id)),
        }
    }
}

fn compare<T: Sortable>(a: &T, b: &T, sort: &[SortField]) -> Ordering {
    for s in sort {
        let ord = a.sort_key(s.field).cmp(&b.sort_key(s.field));
        let ord = if s.descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.id().cmp(&b.id())
}

fn take_window<'a, T, I>(rows: I, sort: &[SortField], window: Window) -> Listing<T>
where
    T: Sortable + Clone + 'a,
    I: Iterator<Item = &'a T>,
{
    let mut matching: Vec<&T> = rows.collect();
    matching.sort_by(|a, b| compare(*a, *b, sort));
    let total = matching.len() as u64;
    let skipped = matching.into_iter().skip(window.offset as usize);
    let records = match window.limit {
        Some(limit) => skipped.take(limit as usize).cloned().collect(),
        None => skipped.cloned().collect(),
    };
    Listing { records, total }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_contacts(&self, sort: &[SortField], window: Window) -> Result<Listing<Contact>, AppError> {
        let tables = self.read();
        Ok(take_window(tables.contacts.values(), sort, window))
    }

    async fn find_contact(&self, id: i64) -> Result<Option<Contact>, AppError> {
        Ok(self.read().contacts.get(&id).cloned())
    }

    async fn find_contacts(&self, ids: &[i64]) -> Result<Vec<Contact>, AppError> {
        let tables = self.read();
        Ok(tables
            .contacts
            .values()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn insert_contact(&self, fields: &ContactFields) -> Result<Contact, AppError> {
        let mut tables = self.write();
        tables.last_contact_id += 1;
        let now = Utc::now();
        let contact = Contact {
            id: tables.last_contact_id,
            name_first: fields.name_first.clone(),
            name_last: fields.name_last.clone(),
            email: fields.email.clone(),
            twitter: fields.twitter.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.contacts.insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn update_contact(&self, id: i64, fields: &ContactFields) -> Result<Option<Contact>, AppError> {
        let mut tables = self.write();
        let Some(contact) = tables.contacts.get_mut(&id) else {
            return Ok(None);
        };
        contact.name_first = fields.name_first.clone();
        contact.name_last = fields.name_last.clone();
        contact.email = fields.email.clone();
        contact.twitter = fields.twitter.clone();
        contact.updated_at = Utc::now();
        Ok(Some(contact.clone()))
    }

    async fn delete_contact(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.write();
        if tables.contacts.remove(&id).is_none() {
            return Ok(false);
        }
        tables.phone_numbers.retain(|_, p| p.contact_id != Some(id));
        Ok(true)
    }

    async fn list_phone_numbers(
        &self,
        filter: &PhoneNumberFilter,
        sort: &[SortField],
        window: Window,
    ) -> Result<Listing<PhoneNumber>, AppError> {
        let tables = self.read();
        let rows = tables.phone_numbers.values().filter(|p| match &filter.contact_ids {
            Some(ids) => p.contact_id.map(|c| ids.contains(&c)).unwrap_or(false),
            None => true,
        });
        Ok(take_window(rows, sort, window))
    }

    async fn phone_numbers_for_contacts(&self, contact_ids: &[i64]) -> Result<Vec<PhoneNumber>, AppError> {
        let tables = self.read();
        Ok(tables
            .phone_numbers
            .values()
            .filter(|p| p.contact_id.map(|c| contact_ids.contains(&c)).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn find_phone_number(&self, id: i64) -> Result<Option<PhoneNumber>, AppError> {
        Ok(self.read().phone_numbers.get(&id).cloned())
    }

    async fn insert_phone_number(&self, changes: &PhoneNumberChanges) -> Result<PhoneNumber, AppError> {
        let mut tables = self.write();
        tables.last_phone_number_id += 1;
        let now = Utc::now();
        let phone_number = PhoneNumber {
            id: tables.last_phone_number_id,
            contact_id: changes.contact_id.flatten(),
            name: changes.name.clone().flatten(),
            phone_number: changes.phone_number.clone().flatten(),
            created_at: now,
            updated_at: now,
        };
        tables.phone_numbers.insert(phone_number.id, phone_number.clone());
        Ok(phone_number)
    }

    async fn update_phone_number(
        &self,
        id: i64,
        changes: &PhoneNumberChanges,
    ) -> Result<Option<PhoneNumber>, AppError> {
        let mut tables = self.write();
        let Some(p) = tables.phone_numbers.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = changes.contact_id {
            p.contact_id = v;
        }
        if let Some(v) = &changes.name {
            p.name = v.clone();
        }
        if let Some(v) = &changes.phone_number {
            p.phone_number = v.clone();
        }
        p.updated_at = Utc::now();
        Ok(Some(p.clone()))
    }

    async fn delete_phone_number(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.write().phone_numbers.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(first: &str, last: &str) -> ContactFields {
        ContactFields {
            name_first: first.into(),
            name_last: last.into(),
            email: None,
            twitter: None,
        }
    }

    fn owned_by(contact_id: i64, name: &str) -> PhoneNumberChanges {
        PhoneNumberChanges {
            contact_id: Some(Some(contact_id)),
            name: Some(Some(name.into())),
            phone_number: Some(Some("555-0000".into())),
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_in_insertion_order() {
        let store = MemoryStore::new();
        let a = store.insert_contact(&fields("Ada", "Lovelace")).await.unwrap();
        let b = store.insert_contact(&fields("Grace", "Hopper")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[tokio::test]
    async fn list_sorts_then_windows() {
        let store = MemoryStore::new();
        for (f, l) in [("Ada", "Lovelace"), ("Grace", "Hopper"), ("Alan", "Turing")] {
            store.insert_contact(&fields(f, l)).await.unwrap();
        }
        let sort = [SortField {
            field: "name_last",
            descending: true,
        }];
        let listing = store
            .list_contacts(&sort, Window { offset: 1, limit: Some(1) })
            .await
            .unwrap();
        assert_eq!(listing.total, 3);
        assert_eq!(listing.records.len(), 1);
        assert_eq!(listing.records[0].name_last, "Lovelace");
    }

    #[tokio::test]
    async fn deleting_a_contact_removes_its_phone_numbers() {
        let store = MemoryStore::new();
        let ada = store.insert_contact(&fields("Ada", "Lovelace")).await.unwrap();
        let grace = store.insert_contact(&fields("Grace", "Hopper")).await.unwrap();
        store.insert_phone_number(&owned_by(ada.id, "cell")).await.unwrap();
        let kept = store.insert_phone_number(&owned_by(grace.id, "home")).await.unwrap();

        assert!(store.delete_contact(ada.id).await.unwrap());
        assert!(!store.delete_contact(ada.id).await.unwrap());
        let remaining = store
            .list_phone_numbers(&PhoneNumberFilter::default(), &[], Window::default())
            .await
            .unwrap();
        assert_eq!(remaining.records, vec![kept]);
    }

    #[tokio::test]
    async fn partial_update_leaves_absent_fields() {
        let store = MemoryStore::new();
        let ada = store.insert_contact(&fields("Ada", "Lovelace")).await.unwrap();
        let p = store.insert_phone_number(&owned_by(ada.id, "cell")).await.unwrap();
        let updated = store
            .update_phone_number(
                p.id,
                &PhoneNumberChanges {
                    name: Some(None),
                    ..PhoneNumberChanges::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, None);
        assert_eq!(updated.phone_number.as_deref(), Some("555-0000"));
        assert_eq!(updated.contact_id, Some(ada.id));
    }

    #[tokio::test]
    async fn relationship_accessor_rereads_the_store() {
        let store = MemoryStore::new();
        let ada = store.insert_contact(&fields("Ada", "Lovelace")).await.unwrap();
        let numbers = ada.phone_numbers();
        assert!(numbers.fetch(&store).await.unwrap().is_empty());
        store.insert_phone_number(&owned_by(ada.id, "cell")).await.unwrap();
        store.insert_phone_number(&owned_by(ada.id, "home")).await.unwrap();
        let names: Vec<_> = numbers
            .fetch(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name.unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["cell", "home"]);
    }

    #[tokio::test]
    async fn nulls_sort_last_ascending_and_first_descending() {
        let store = MemoryStore::new();
        store.insert_contact(&fields("Ada", "Lovelace")).await.unwrap();
        store
            .insert_contact(&ContactFields {
                email: Some("grace@example.com".into()),
                ..fields("Grace", "Hopper")
            })
            .await
            .unwrap();
        let ids = |listing: Listing<Contact>| listing.records.iter().map(|c| c.id).collect::<Vec<_>>();

        let asc = [SortField {
            field: "email",
            descending: false,
        }];
        assert_eq!(ids(store.list_contacts(&asc, Window::default()).await.unwrap()), vec![2, 1]);

        let desc = [SortField {
            field: "email",
            descending: true,
        }];
        assert_eq!(ids(store.list_contacts(&desc, Window::default()).await.unwrap()), vec![1, 2]);
    }
}
