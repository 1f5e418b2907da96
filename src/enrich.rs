//! Resolve personnel ssn references into display names.
//!
//! Pages build one [`PersonnelIndex`] per request and pass it to every
//! enrichment call of that request.

use std::collections::HashMap;

use serde::Serialize;

use crate::records::Personnel;

/// ssn → personnel lookup built from one personnel snapshot.
#[derive(Debug, Default)]
pub struct PersonnelIndex<'a> {
    by_ssn: HashMap<&'a str, &'a Personnel>,
}

impl<'a> PersonnelIndex<'a> {
    /// Index a personnel snapshot. Records without an ssn are not indexed;
    /// on duplicate ssn the first record wins.
    pub fn build(personnel: &'a [Personnel]) -> Self {
        let mut by_ssn = HashMap::with_capacity(personnel.len());
        for person in personnel {
            if let Some(ssn) = person.ssn.as_deref() {
                by_ssn.entry(ssn).or_insert(person);
            }
        }
        Self { by_ssn }
    }

    pub fn get(&self, ssn: &str) -> Option<&'a Personnel> {
        self.by_ssn.get(ssn).copied()
    }

    /// Display name for `ssn`, or `ssn` itself when nobody matches.
    pub fn resolve_name(&self, ssn: &str) -> String {
        self.get(ssn)
            .and_then(|person| person.nom_prenom.as_deref())
            .unwrap_or(ssn)
            .to_string()
    }
}

/// A record echoed with the resolved name of its `responsable`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithManagerName<T> {
    #[serde(flatten)]
    pub record: T,
    pub responsable_nom: String,
}

impl<T: Clone> WithManagerName<T> {
    pub fn new(record: &T, ssn: &str, index: &PersonnelIndex<'_>) -> Self {
        Self {
            record: record.clone(),
            responsable_nom: index.resolve_name(ssn),
        }
    }
}
