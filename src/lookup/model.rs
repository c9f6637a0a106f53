//! Wire model for the company lookup service
//!
//! The service returns a deeply nested camelCase document in which any
//! branch may be missing. Every field here is optional and every collection
//! defaults to empty, so a sparse record for a dormant company deserializes
//! as cleanly as a fully populated one. Unknown keys are ignored.

use serde::{Deserialize, Serialize};

/// One company establishment as returned by the lookup service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeRecord {
    pub company: Option<CompanyInfo>,
    pub status: Option<Descriptor>,
    pub status_date: Option<String>,
    pub address: Option<AddressInfo>,
    #[serde(default)]
    pub phones: Vec<PhoneEntry>,
    #[serde(default)]
    pub emails: Vec<EmailEntry>,
    pub main_activity: Option<Descriptor>,
    #[serde(default)]
    pub side_activities: Vec<Descriptor>,
    #[serde(default)]
    pub registrations: Vec<RegistrationEntry>,
    #[serde(default)]
    pub establishments: Vec<EstablishmentEntry>,
}

/// Company-level data shared by all establishments of one root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: Option<String>,
    pub equity: Option<f64>,
    pub nature: Option<Descriptor>,
    pub size: Option<Descriptor>,
    pub simples: Option<RegimeOption>,
    pub simei: Option<RegimeOption>,
    #[serde(default)]
    pub members: Vec<MemberEntry>,
}

/// Coded value with a human-readable label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub text: Option<String>,
}

/// Opt-in tax regime (Simples Nacional / SIMEI)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegimeOption {
    pub optant: Option<bool>,
    pub since: Option<String>,
}

/// Membership record linking a person to the company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberEntry {
    pub role: Option<Descriptor>,
    pub person: Option<PersonInfo>,
}

/// Person behind a membership record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonInfo {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub tax_id: Option<String>,
}

/// Street address, optionally geocoded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub street: Option<String>,
    pub number: Option<String>,
    pub details: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Telephone contact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneEntry {
    pub area: Option<String>,
    pub number: Option<String>,
}

/// Email contact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailEntry {
    pub address: Option<String>,
}

/// State-level tax registration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationEntry {
    pub state: Option<String>,
    pub number: Option<String>,
}

/// Sibling establishment under the same company root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentEntry {
    pub tax_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<Descriptor>,
    pub address: Option<AddressInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_deserializes() {
        let record: OfficeRecord = serde_json::from_value(json!({})).unwrap();
        assert!(record.company.is_none());
        assert!(record.phones.is_empty());
        assert!(record.establishments.is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let record: OfficeRecord = serde_json::from_value(json!({
            "updated": "2024-01-01T00:00:00Z",
            "taxId": "11222333000181",
            "company": { "name": "ACME LTDA", "founded": "1999-01-01" },
        }))
        .unwrap();
        assert_eq!(record.company.unwrap().name.as_deref(), Some("ACME LTDA"));
    }

    #[test]
    fn nested_branches_deserialize() {
        let record: OfficeRecord = serde_json::from_value(json!({
            "company": {
                "name": "ACME LTDA",
                "equity": 150000.0,
                "nature": { "id": 2062, "text": "Sociedade Empresária Limitada" },
                "simples": { "optant": true, "since": "2015-01-01" },
                "members": [
                    {
                        "role": { "text": "Sócio-Administrador" },
                        "person": { "name": "Ana Souza", "type": "NATURAL", "taxId": "***123456**" }
                    }
                ]
            },
            "status": { "text": "Ativa" },
            "statusDate": "2010-06-15",
            "address": { "city": "São Paulo", "state": "SP", "latitude": -23.55, "longitude": -46.63 },
            "phones": [ { "area": "11", "number": "40001234" } ],
            "mainActivity": { "text": "Desenvolvimento de software" },
            "establishments": [
                { "taxId": "11222333000262", "type": { "text": "FILIAL" } }
            ]
        }))
        .unwrap();

        let company = record.company.unwrap();
        assert_eq!(company.equity, Some(150000.0));
        assert_eq!(company.members.len(), 1);
        let member = &company.members[0];
        assert_eq!(
            member.person.as_ref().unwrap().kind.as_deref(),
            Some("NATURAL")
        );
        assert_eq!(record.status_date.as_deref(), Some("2010-06-15"));
        assert_eq!(record.address.unwrap().latitude, Some(-23.55));
        assert_eq!(
            record.establishments[0].kind.as_ref().unwrap().text.as_deref(),
            Some("FILIAL")
        );
    }
}
