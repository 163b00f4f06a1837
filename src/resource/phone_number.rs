use crate::model::{PhoneNumber, PhoneNumberChanges};
use crate::resource::payload::ParsedResource;
use crate::resource::render::{render, Fieldsets, Resource};
use crate::resource::schema::{ResourceSchema, ResourceType, PHONE_NUMBER_SCHEMA};
use crate::response::{Linkage, ResourceIdentifier, ResourceObject};
use serde_json::{json, Value};
use std::collections::HashMap;

impl Resource for PhoneNumber {
    const SCHEMA: &'static ResourceSchema = &PHONE_NUMBER_SCHEMA;

    fn id(&self) -> i64 {
        self.id
    }

    fn attribute(&self, name: &str) -> Value {
        match name {
            "name" => json!(self.name),
            "phone_number" => json!(self.phone_number),
            _ => Value::Null,
        }
    }
}

impl PhoneNumber {
    /// To-one linkage for `contact`; null for an orphaned number.
    pub fn contact_linkage(&self) -> Linkage {
        Linkage::ToOne(self.contact_id.map(|id| ResourceIdentifier {
            kind: ResourceType::Contacts.as_str(),
            id: id.to_string(),
        }))
    }
}

pub fn render_phone_number(number: &PhoneNumber, fieldsets: &Fieldsets) -> ResourceObject {
    render(number, HashMap::from([("contact", number.contact_linkage())]), fieldsets)
}

impl From<ParsedResource> for PhoneNumberChanges {
    fn from(mut parsed: ParsedResource) -> Self {
        PhoneNumberChanges {
            contact_id: parsed.to_one("contact"),
            name: parsed.attributes.remove("name"),
            phone_number: parsed.attributes.remove("phone_number"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::payload::{parse_resource, Intent};
    use chrono::Utc;

    fn number(contact_id: Option<i64>) -> PhoneNumber {
        PhoneNumber {
            id: 3,
            contact_id,
            name: Some("cell".into()),
            phone_number: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn foreign_key_and_timestamps_stay_hidden() {
        let obj = serde_json::to_value(render_phone_number(&number(Some(1)), &Fieldsets::default())).unwrap();
        assert_eq!(obj["attributes"], json!({"name": "cell", "phone_number": null}));
        assert_eq!(obj["relationships"]["contact"]["data"], json!({"type": "contacts", "id": "1"}));
    }

    #[test]
    fn orphan_links_to_null() {
        assert_eq!(serde_json::to_value(number(None).contact_linkage()).unwrap(), Value::Null);
    }

    #[test]
    fn changes_carry_contact_linkage() {
        let parsed = parse_resource(
            &PHONE_NUMBER_SCHEMA,
            json!({"data": {"type": "phone_numbers",
                "attributes": {"phone_number": "555"},
                "relationships": {"contact": {"data": {"type": "contacts", "id": "4"}}}}}),
            Intent::Create,
        )
        .unwrap();
        let changes = PhoneNumberChanges::from(parsed);
        assert_eq!(changes.contact_id, Some(Some(4)));
        assert_eq!(changes.phone_number, Some(Some("555".into())));
        assert_eq!(changes.name, None);
    }
}
