use crate::model::{Contact, ContactChanges, PhoneNumber};
use crate::resource::payload::ParsedResource;
use crate::resource::render::{identifiers, render, Fieldsets, Resource};
use crate::resource::schema::{ResourceSchema, CONTACT_SCHEMA};
use crate::response::{Linkage, ResourceObject};
use serde_json::{json, Value};
use std::collections::HashMap;

impl Resource for Contact {
    const SCHEMA: &'static ResourceSchema = &CONTACT_SCHEMA;

    fn id(&self) -> i64 {
        self.id
    }

    fn attribute(&self, name: &str) -> Value {
        match name {
            "name_first" => json!(self.name_first),
            "name_last" => json!(self.name_last),
            "email" => json!(self.email),
            "twitter" => json!(self.twitter),
            "created_at" => json!(self.created_at.to_rfc3339()),
            "updated_at" => json!(self.updated_at.to_rfc3339()),
            _ => Value::Null,
        }
    }
}

impl From<ParsedResource> for ContactChanges {
    fn from(mut parsed: ParsedResource) -> Self {
        ContactChanges {
            name_first: parsed.attributes.remove("name_first"),
            name_last: parsed.attributes.remove("name_last"),
            email: parsed.attributes.remove("email"),
            twitter: parsed.attributes.remove("twitter"),
        }
    }
}

/// To-many linkage for a contact's `phone_numbers`.
pub fn phone_numbers_linkage(numbers: &[PhoneNumber]) -> Linkage {
    Linkage::ToMany(identifiers(numbers))
}

/// Contact as primary data, with `numbers` as its phone number linkage.
pub fn render_contact(contact: &Contact, numbers: &[PhoneNumber], fieldsets: &Fieldsets) -> ResourceObject {
    render(
        contact,
        HashMap::from([("phone_numbers", phone_numbers_linkage(numbers))]),
        fieldsets,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ada() -> Contact {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        Contact {
            id: 1,
            name_first: "Ada".into(),
            name_last: "Lovelace".into(),
            email: None,
            twitter: Some("@ada".into()),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn renders_whitelisted_attributes_and_linkage() {
        let number = PhoneNumber {
            id: 7,
            contact_id: Some(1),
            name: Some("home".into()),
            phone_number: Some("555".into()),
            created_at: ada().created_at,
            updated_at: ada().updated_at,
        };
        let obj = serde_json::to_value(render_contact(&ada(), &[number], &Fieldsets::default())).unwrap();

        assert_eq!(obj["id"], "1");
        assert_eq!(obj["type"], "contacts");
        assert_eq!(obj["attributes"]["email"], Value::Null);
        assert_eq!(obj["attributes"]["created_at"], "2024-01-02T03:04:05+00:00");
        assert_eq!(obj["links"]["self"], "/api/v1/contacts/1");
        assert_eq!(
            obj["relationships"]["phone_numbers"]["data"],
            json!([{"type": "phone_numbers", "id": "7"}])
        );
        assert_eq!(
            obj["relationships"]["phone_numbers"]["links"]["related"],
            "/api/v1/contacts/1/phone_numbers"
        );
    }

    #[test]
    fn sparse_fieldset_drops_other_fields() {
        let mut fields = Fieldsets::default();
        fields.restrict(crate::resource::ResourceType::Contacts, ["email"].into_iter().collect());
        let obj = serde_json::to_value(render(&ada(), HashMap::new(), &fields)).unwrap();
        assert_eq!(obj["attributes"], json!({"email": null}));
        assert!(obj.get("relationships").is_none());
    }
}
