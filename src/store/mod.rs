//! Storage seam: the service layer talks to `dyn Store`, backed by PostgreSQL or memory.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, ensure_schema, PgStore};

use crate::error::AppError;
use crate::model::{Contact, ContactFields, PhoneNumber, PhoneNumberChanges};
use async_trait::async_trait;

/// Rows to skip and the maximum to return. `limit: None` returns everything after `offset`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: Option<u64>,
}

/// One `ORDER BY` term. `field` always comes from a resource schema, never from raw input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortField {
    pub field: &'static str,
    pub descending: bool,
}

/// Conditions for listing phone numbers. `contact_ids: Some` matches any of the given owners.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhoneNumberFilter {
    pub contact_ids: Option<Vec<i64>>,
}

/// One window of records plus the number of records matching overall.
#[derive(Clone, Debug, PartialEq)]
pub struct Listing<T> {
    pub records: Vec<T>,
    pub total: u64,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;

    async fn list_contacts(&self, sort: &[SortField], window: Window) -> Result<Listing<Contact>, AppError>;
    async fn find_contact(&self, id: i64) -> Result<Option<Contact>, AppError>;
    /// Contacts with the given ids, ascending by id; unknown ids are skipped.
    async fn find_contacts(&self, ids: &[i64]) -> Result<Vec<Contact>, AppError>;
    async fn insert_contact(&self, fields: &ContactFields) -> Result<Contact, AppError>;
    async fn update_contact(&self, id: i64, fields: &ContactFields) -> Result<Option<Contact>, AppError>;
    /// Deletes the contact and the phone numbers it owns. Returns false when no such contact exists.
    async fn delete_contact(&self, id: i64) -> Result<bool, AppError>;

    async fn list_phone_numbers(
        &self,
        filter: &PhoneNumberFilter,
        sort: &[SortField],
        window: Window,
    ) -> Result<Listing<PhoneNumber>, AppError>;
    /// Phone numbers owned by any of the given contacts, ascending by id.
    async fn phone_numbers_for_contacts(&self, contact_ids: &[i64]) -> Result<Vec<PhoneNumber>, AppError>;
    async fn find_phone_number(&self, id: i64) -> Result<Option<PhoneNumber>, AppError>;
    /// Absent fields are stored as null.
    async fn insert_phone_number(&self, changes: &PhoneNumberChanges) -> Result<PhoneNumber, AppError>;
    /// Only present fields are written.
    async fn update_phone_number(
        &self,
        id: i64,
        changes: &PhoneNumberChanges,
    ) -> Result<Option<PhoneNumber>, AppError>;
    async fn delete_phone_number(&self, id: i64) -> Result<bool, AppError>;
}
