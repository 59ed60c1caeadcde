//! State and district name canonicalization
//!
//! Source directory names (`andaman-&-nicobar-islands`) are mapped onto the
//! naming of the India state boundary dataset (`Andaman & Nicobar Island`)
//! so that dashboard choropleths join on the `State` column.

use std::collections::BTreeMap;
use tracing::warn;

/// The 36 state and union territory names of the boundary dataset
pub const CANONICAL_STATES: [&str; 36] = [
    "Andaman & Nicobar Island",
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chandigarh",
    "Chhattisgarh",
    "Dadara & Nagar Havelli",
    "Delhi",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jammu & Kashmir",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Ladakh",
    "Lakshadweep",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Puducherry",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
];

/// Built-in renames, keyed by the lower-cased hyphen-free source name
const BUILTIN_OVERRIDES: [(&str, &str); 2] = [
    ("andaman & nicobar islands", "andaman & nicobar island"),
    ("dadra & nagar haveli & daman & diu", "dadara & nagar havelli"),
];

pub fn is_known_state(name: &str) -> bool {
    CANONICAL_STATES.contains(&name)
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest
///
/// Multi-character case mappings (`ß` -> `SS`) are fed back one character at
/// a time, so only the first character of an expansion is upper-cased and
/// word boundaries follow the emitted text. Applying it twice gives the same
/// string.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_word = false;
    let mut pending: Vec<char> = Vec::new();
    let mut chars = input.chars();

    while let Some(c) = pending.pop().or_else(|| chars.next()) {
        let mapped: Vec<char> = if !c.is_alphabetic() {
            vec![c]
        } else if in_word {
            c.to_lowercase().collect()
        } else {
            c.to_uppercase().collect()
        };

        if let Some((&first, rest)) = mapped.split_first() {
            pending.extend(rest.iter().rev());
            out.push(first);
            in_word = first.is_alphabetic();
        }
    }
    out
}

/// Rename-table key: hyphens to spaces, then lower-cased through a title-case
/// pass so that a key and the key of its own title-cased form coincide
fn normalize_key(name: &str) -> String {
    title_case(&name.replace('-', " ").to_lowercase()).to_lowercase()
}

/// Maps raw state and district labels to canonical names
#[derive(Debug, Clone)]
pub struct NameCanonicalizer {
    overrides: BTreeMap<String, String>,
}

impl Default for NameCanonicalizer {
    fn default() -> Self {
        let overrides = BUILTIN_OVERRIDES
            .iter()
            .map(|(from, to)| (normalize_key(from), normalize_key(to)))
            .collect();
        Self { overrides }
    }
}

impl NameCanonicalizer {
    /// Built-in table extended with configured overrides
    ///
    /// Keys and values are normalized like source names. An override whose
    /// target is itself a rename key would make canonicalization unstable
    /// and is rejected with a warning.
    pub fn with_overrides(extra: &BTreeMap<String, String>) -> Self {
        let mut canonicalizer = Self::default();
        for (from, to) in extra {
            canonicalizer
                .overrides
                .insert(normalize_key(from), normalize_key(to));
        }

        let chained: Vec<String> = canonicalizer
            .overrides
            .iter()
            .filter(|(from, to)| from != to && canonicalizer.overrides.contains_key(*to))
            .map(|(from, _)| from.clone())
            .collect();
        for from in chained {
            warn!(
                "State override '{}' maps onto another override key, ignoring it",
                from
            );
            canonicalizer.overrides.remove(&from);
        }

        canonicalizer
    }

    /// Canonical state name
    pub fn state(&self, raw: &str) -> String {
        let key = normalize_key(raw);
        let renamed = self.overrides.get(&key).map(String::as_str).unwrap_or(&key);
        title_case(renamed)
    }

    /// Canonical district name (title-casing only)
    pub fn district(&self, raw: &str) -> String {
        title_case(raw)
    }
}
