//! Headquarters/branch relationship derivation
//!
//! Runs once per batch, after every row has been attempted. Rows sharing an
//! 8-digit root belong to one company: the row whose branch sequence is
//! `0001` is the headquarters, every other row is a branch pointing at it.
//! When the headquarters row is not part of the batch, branches point at a
//! synthesized 12-character identifier (root + `0001`, no check digits).
//! Rows whose identifier failed validation are left unclassified.

use crate::extract::Classification;
use crate::rows::EnrichedRow;
use std::collections::HashMap;

/// Classify every valid row and wire branch rows to their headquarters
pub fn derive_relationships(rows: &mut [EnrichedRow]) {
    // first headquarters in input order wins for each root
    let mut headquarters: HashMap<String, String> = HashMap::new();
    for row in rows.iter() {
        if let Some(cnpj) = &row.cnpj {
            if cnpj.is_headquarters() {
                headquarters
                    .entry(cnpj.root().to_string())
                    .or_insert_with(|| cnpj.as_str().to_string());
            }
        }
    }

    for row in rows.iter_mut() {
        let Some(cnpj) = &row.cnpj else { continue };
        if cnpj.is_headquarters() {
            row.fields.classification = Some(Classification::Headquarters);
            row.fields.probable_headquarters = String::new();
        } else {
            row.fields.classification = Some(Classification::Branch);
            row.fields.probable_headquarters = match headquarters.get(cnpj.root()) {
                Some(sibling) => sibling.clone(),
                None => cnpj.synthesized_headquarters(),
            };
        }
    }
}
