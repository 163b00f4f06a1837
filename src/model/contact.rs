//! Contact rows, their required-name rule, and the phone number accessor.

use crate::error::{AppError, FieldError};
use crate::model::PhoneNumber;
use crate::store::Store;
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub name_first: String,
    pub name_last: String,
    pub email: Option<String>,
    pub twitter: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Phone numbers owned by this contact. Nothing is loaded until `fetch`, and every `fetch` re-reads the store.
    pub fn phone_numbers(&self) -> PhoneNumbersOf {
        PhoneNumbersOf { contact_id: self.id }
    }

    pub fn draft(&self) -> ContactDraft {
        ContactDraft {
            name_first: Some(self.name_first.clone()),
            name_last: Some(self.name_last.clone()),
            email: self.email.clone(),
            twitter: self.twitter.clone(),
        }
    }
}

/// Lazy handle on the one-to-many relationship from a contact to its phone numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhoneNumbersOf {
    contact_id: i64,
}

impl PhoneNumbersOf {
    /// Phone numbers whose `contact_id` is this contact, ascending by id.
    pub async fn fetch(&self, store: &dyn Store) -> Result<Vec<PhoneNumber>, AppError> {
        store.phone_numbers_for_contacts(&[self.contact_id]).await
    }
}

/// Writable contact fields before validation. `None` means null or absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name_first: Option<String>,
    pub name_last: Option<String>,
    pub email: Option<String>,
    pub twitter: Option<String>,
}

/// Field changes from a request; the outer `Option` is presence, the inner one nullability.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactChanges {
    pub name_first: Option<Option<String>>,
    pub name_last: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub twitter: Option<Option<String>>,
}

impl ContactDraft {
    pub fn apply(mut self, changes: ContactChanges) -> Self {
        if let Some(v) = changes.name_first {
            self.name_first = v;
        }
        if let Some(v) = changes.name_last {
            self.name_last = v;
        }
        if let Some(v) = changes.email {
            self.email = v;
        }
        if let Some(v) = changes.twitter {
            self.twitter = v;
        }
        self
    }

    /// Both names must be present and not blank. Every missing name is reported.
    pub fn validate(self) -> Result<ContactFields, AppError> {
        let mut errors = Vec::new();
        let name_first = required(self.name_first, "name_first", &mut errors);
        let name_last = required(self.name_last, "name_last", &mut errors);
        match (name_first, name_last) {
            (Some(name_first), Some(name_last)) if errors.is_empty() => Ok(ContactFields {
                name_first,
                name_last,
                email: self.email,
                twitter: self.twitter,
            }),
            _ => Err(AppError::Validation(errors)),
        }
    }
}

fn required(value: Option<String>, field: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            errors.push(FieldError::attribute(field, "can't be blank"));
            None
        }
    }
}

/// Validated writable fields, ready to persist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactFields {
    pub name_first: String,
    pub name_last: String,
    pub email: Option<String>,
    pub twitter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(first: Option<&str>, last: Option<&str>) -> ContactDraft {
        ContactDraft {
            name_first: first.map(String::from),
            name_last: last.map(String::from),
            ..ContactDraft::default()
        }
    }

    #[test]
    fn names_present_validates() {
        let fields = draft(Some("Ada"), Some("Lovelace")).validate().unwrap();
        assert_eq!(fields.name_first, "Ada");
        assert_eq!(fields.email, None);
    }

    #[test]
    fn blank_and_missing_names_are_both_reported() {
        let err = draft(Some("   "), None).validate().unwrap_err();
        match err {
            AppError::Validation(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["name_first", "name_last"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn apply_distinguishes_absent_from_null() {
        let base = ContactDraft {
            email: Some("ada@example.com".into()),
            twitter: Some("@ada".into()),
            ..draft(Some("Ada"), Some("Lovelace"))
        };
        let changed = base.apply(ContactChanges {
            email: Some(None),
            name_last: Some(Some("King".into())),
            ..ContactChanges::default()
        });
        assert_eq!(changed.email, None);
        assert_eq!(changed.twitter.as_deref(), Some("@ada"));
        assert_eq!(changed.name_last.as_deref(), Some("King"));
    }

    #[test]
    fn nulling_a_name_fails_validation() {
        let err = draft(Some("Ada"), Some("Lovelace"))
            .apply(ContactChanges {
                name_first: Some(None),
                ..ContactChanges::default()
            })
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref f) if f.len() == 1 && f[0].field == "name_first"));
    }
}
