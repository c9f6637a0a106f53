//! CNPJ identifier normalization and structure
//!
//! A CNPJ is a 14-digit Brazilian company tax identifier: an 8-digit root
//! shared by every establishment of the same company, a 4-digit branch
//! sequence (`0001` marks the headquarters), and 2 check digits. Check
//! digits are not verified here; the lookup service is the authority on
//! whether an identifier exists.

use std::fmt;

/// Number of digits in a complete identifier
pub const CNPJ_LEN: usize = 14;

/// Branch sequence reserved for the headquarters establishment
pub const HEADQUARTERS_BRANCH: &str = "0001";

/// Normalize raw input to the canonical 14-digit form.
///
/// Strips every non-digit character, left-pads with zeros to 14 digits and
/// truncates over-length input to its first 14 digits. Idempotent: applying
/// it to its own output changes nothing. Input with no digits at all comes
/// out as 14 zeros, which [`Cnpj::parse`] rejects.
pub fn normalize(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let mut out = String::with_capacity(CNPJ_LEN);
    for _ in digits.len()..CNPJ_LEN {
        out.push('0');
    }
    out.push_str(&digits);
    out.truncate(CNPJ_LEN);
    out
}

/// A normalized, non-degenerate CNPJ identifier.
///
/// Always exactly 14 ASCII digits. The only rejected form is the all-zero
/// string produced by digit-free input; everything else is accepted and left
/// for the lookup service to judge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cnpj(String);

impl Cnpj {
    /// Normalize and validate raw input.
    ///
    /// Returns `None` when the input contains no digits (the degenerate
    /// all-zero identifier).
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize(raw);
        if normalized.bytes().all(|b| b == b'0') {
            return None;
        }
        Some(Self(normalized))
    }

    /// The full 14-digit identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 8-digit company root shared across establishments
    pub fn root(&self) -> &str {
        &self.0[..8]
    }

    /// The 4-digit branch sequence
    pub fn branch(&self) -> &str {
        &self.0[8..12]
    }

    /// Whether this identifier names the headquarters establishment
    pub fn is_headquarters(&self) -> bool {
        self.branch() == HEADQUARTERS_BRANCH
    }

    /// The 12-character probable-headquarters identifier for this root.
    ///
    /// Check digits are not computed; the value marks the sibling a branch
    /// most likely belongs to when the headquarters row is absent from the
    /// batch.
    pub fn synthesized_headquarters(&self) -> String {
        format!("{}{}", self.root(), HEADQUARTERS_BRANCH)
    }
}

impl fmt::Display for Cnpj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
