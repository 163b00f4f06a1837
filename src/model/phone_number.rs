//! Phone number rows. No field rules: any label or number, including null, is accepted.

use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct PhoneNumber {
    pub id: i64,
    pub contact_id: Option<i64>,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field changes from a request; the outer `Option` is presence, the inner one nullability.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhoneNumberChanges {
    pub contact_id: Option<Option<i64>>,
    pub name: Option<Option<String>>,
    pub phone_number: Option<Option<String>>,
}

impl PhoneNumberChanges {
    pub fn is_empty(&self) -> bool {
        self.contact_id.is_none() && self.name.is_none() && self.phone_number.is_none()
    }
}
