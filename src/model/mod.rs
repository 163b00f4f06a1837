//! Domain entities: contacts and the phone numbers they own.

mod contact;
mod phone_number;
pub use contact::{Contact, ContactChanges, ContactDraft, ContactFields, PhoneNumbersOf};
pub use phone_number::{PhoneNumber, PhoneNumberChanges};
