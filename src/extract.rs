//! Flat field extraction from lookup records
//!
//! The lookup service answers with a nested document; the output artifact
//! wants one flat row. [`extract`] walks the record and pulls out the fixed
//! field set, defaulting every field to empty so a sparse record still
//! yields a complete row. Extraction is pure: no IO, no clock, no failure
//! path.

use crate::cnpj;
use crate::lookup::model::{Descriptor, OfficeRecord, RegimeOption};

/// Owner and establishment blocks kept per row; later entries are dropped
pub const MAX_OWNERS: usize = 5;
pub const MAX_ESTABLISHMENTS: usize = 5;

/// Headquarters/branch classification of a row, derived after enrichment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Headquarters,
    Branch,
}

impl Classification {
    /// Artifact cell text
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Headquarters => "headquarters",
            Classification::Branch => "branch",
        }
    }
}

/// One owner block (company member)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnerBlock {
    pub name: String,
    pub kind: String,
    pub tax_id: String,
    pub role: String,
}

/// One establishment block (sibling under the same root)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstablishmentBlock {
    pub cnpj: String,
    pub kind: String,
    pub street: String,
    pub state: String,
}

/// The flat enrichment fields appended to every input row.
///
/// Scalar absences are `None` and render as empty cells; string fields use
/// the empty string directly. `classification` and `probable_headquarters`
/// stay empty until the relationship pass runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    pub company_name: String,
    pub status: String,
    pub status_date: String,
    pub legal_nature: String,
    pub company_size: String,
    pub capital: Option<f64>,
    pub phone: String,
    pub email: String,
    pub main_activity: String,
    pub side_activities: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub number: String,
    pub details: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub simples_optant: Option<bool>,
    pub simples_since: String,
    pub simei_optant: Option<bool>,
    pub simei_since: String,
    pub state_registrations: String,
    pub owners: Vec<OwnerBlock>,
    pub establishments: Vec<EstablishmentBlock>,
    pub classification: Option<Classification>,
    pub probable_headquarters: String,
}

impl FieldSet {
    /// Column headers for the enrichment fields, in artifact order
    pub fn columns() -> Vec<String> {
        let mut columns = vec![
            "company_name".to_string(),
            "status".to_string(),
            "status_date".to_string(),
            "legal_nature".to_string(),
            "company_size".to_string(),
            "capital".to_string(),
            "phone".to_string(),
            "email".to_string(),
            "main_activity".to_string(),
            "side_activities".to_string(),
            "street".to_string(),
            "city".to_string(),
            "state".to_string(),
            "zip".to_string(),
            "number".to_string(),
            "details".to_string(),
            "latitude".to_string(),
            "longitude".to_string(),
            "simples_optant".to_string(),
            "simples_since".to_string(),
            "simei_optant".to_string(),
            "simei_since".to_string(),
            "state_registrations".to_string(),
        ];
        for i in 1..=MAX_OWNERS {
            columns.push(format!("owner_{i}_name"));
            columns.push(format!("owner_{i}_type"));
            columns.push(format!("owner_{i}_tax_id"));
            columns.push(format!("owner_{i}_role"));
        }
        for i in 1..=MAX_ESTABLISHMENTS {
            columns.push(format!("establishment_{i}_cnpj"));
            columns.push(format!("establishment_{i}_type"));
            columns.push(format!("establishment_{i}_street"));
            columns.push(format!("establishment_{i}_state"));
        }
        columns.push("classification".to_string());
        columns.push("probable_headquarters".to_string());
        columns
    }

    /// Render the fields as artifact cells, one per column
    pub fn to_cells(&self) -> Vec<String> {
        let mut cells = vec![
            self.company_name.clone(),
            self.status.clone(),
            self.status_date.clone(),
            self.legal_nature.clone(),
            self.company_size.clone(),
            float_cell(self.capital),
            self.phone.clone(),
            self.email.clone(),
            self.main_activity.clone(),
            self.side_activities.clone(),
            self.street.clone(),
            self.city.clone(),
            self.state.clone(),
            self.zip.clone(),
            self.number.clone(),
            self.details.clone(),
            float_cell(self.latitude),
            float_cell(self.longitude),
            bool_cell(self.simples_optant),
            self.simples_since.clone(),
            bool_cell(self.simei_optant),
            self.simei_since.clone(),
            self.state_registrations.clone(),
        ];
        for i in 0..MAX_OWNERS {
            let owner = self.owners.get(i).cloned().unwrap_or_default();
            cells.push(owner.name);
            cells.push(owner.kind);
            cells.push(owner.tax_id);
            cells.push(owner.role);
        }
        for i in 0..MAX_ESTABLISHMENTS {
            let establishment = self.establishments.get(i).cloned().unwrap_or_default();
            cells.push(establishment.cnpj);
            cells.push(establishment.kind);
            cells.push(establishment.street);
            cells.push(establishment.state);
        }
        cells.push(
            self.classification
                .map(|c| c.as_str().to_string())
                .unwrap_or_default(),
        );
        cells.push(self.probable_headquarters.clone());
        cells
    }
}

fn float_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn bool_cell(value: Option<bool>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn descriptor_text(descriptor: &Option<Descriptor>) -> String {
    descriptor
        .as_ref()
        .and_then(|d| d.text.clone())
        .unwrap_or_default()
}

fn regime_fields(regime: &Option<RegimeOption>) -> (Option<bool>, String) {
    match regime {
        Some(r) => (r.optant, r.since.clone().unwrap_or_default()),
        None => (None, String::new()),
    }
}

/// Flatten a lookup record into the fixed enrichment field set
pub fn extract(record: &OfficeRecord) -> FieldSet {
    let mut fields = FieldSet::default();

    if let Some(company) = &record.company {
        fields.company_name = company.name.clone().unwrap_or_default();
        fields.legal_nature = descriptor_text(&company.nature);
        fields.company_size = descriptor_text(&company.size);
        fields.capital = company.equity;
        (fields.simples_optant, fields.simples_since) = regime_fields(&company.simples);
        (fields.simei_optant, fields.simei_since) = regime_fields(&company.simei);
        fields.owners = company
            .members
            .iter()
            .take(MAX_OWNERS)
            .map(|member| {
                let person = member.person.as_ref();
                OwnerBlock {
                    name: person.and_then(|p| p.name.clone()).unwrap_or_default(),
                    kind: person.and_then(|p| p.kind.clone()).unwrap_or_default(),
                    tax_id: person.and_then(|p| p.tax_id.clone()).unwrap_or_default(),
                    role: descriptor_text(&member.role),
                }
            })
            .collect();
    }

    fields.status = descriptor_text(&record.status);
    fields.status_date = record.status_date.clone().unwrap_or_default();
    fields.main_activity = descriptor_text(&record.main_activity);
    fields.side_activities = record
        .side_activities
        .iter()
        .filter_map(|activity| activity.text.clone())
        .collect::<Vec<_>>()
        .join("; ");

    if let Some(address) = &record.address {
        fields.street = address.street.clone().unwrap_or_default();
        fields.city = address.city.clone().unwrap_or_default();
        fields.state = address.state.clone().unwrap_or_default();
        fields.zip = address.zip.clone().unwrap_or_default();
        fields.number = address.number.clone().unwrap_or_default();
        fields.details = address.details.clone().unwrap_or_default();
        fields.latitude = address.latitude;
        fields.longitude = address.longitude;
    }

    // first listed contact wins; later entries are rarely maintained
    if let Some(phone) = record.phones.first() {
        let number = phone.number.clone().unwrap_or_default();
        fields.phone = match &phone.area {
            Some(area) if !area.is_empty() => format!("({area}) {number}"),
            _ => number,
        };
    }
    if let Some(email) = record.emails.first() {
        fields.email = email.address.clone().unwrap_or_default();
    }

    fields.state_registrations = record
        .registrations
        .iter()
        .filter_map(|registration| {
            match (&registration.state, &registration.number) {
                (Some(state), Some(number)) => Some(format!("{state}:{number}")),
                _ => None,
            }
        })
        .collect::<Vec<_>>()
        .join(";");

    fields.establishments = record
        .establishments
        .iter()
        .take(MAX_ESTABLISHMENTS)
        .map(|establishment| {
            let address = establishment.address.as_ref();
            EstablishmentBlock {
                cnpj: establishment
                    .tax_id
                    .as_deref()
                    .map(cnpj::normalize)
                    .unwrap_or_default(),
                kind: descriptor_text(&establishment.kind),
                street: address.and_then(|a| a.street.clone()).unwrap_or_default(),
                state: address.and_then(|a| a.state.clone()).unwrap_or_default(),
            }
        })
        .collect();

    fields
}

/// Column header for the normalized identifier, placed before the field
/// set. Distinct from any raw `cnpj` input column the caller supplied.
pub fn identifier_column() -> String {
    "cnpj_normalized".to_string()
}

/// Render the full enrichment cell block for one row: the normalized
/// identifier followed by the field cells.
pub fn enrichment_cells(identifier: &str, fields: &FieldSet) -> Vec<String> {
    let mut cells = Vec::with_capacity(1 + FieldSet::columns().len());
    cells.push(identifier.to_string());
    cells.extend(fields.to_cells());
    cells
}

/// All enrichment column headers: the identifier column plus the field set
pub fn enrichment_columns() -> Vec<String> {
    let mut columns = Vec::with_capacity(1 + FieldSet::columns().len());
    columns.push(identifier_column());
    columns.extend(FieldSet::columns());
    columns
}
