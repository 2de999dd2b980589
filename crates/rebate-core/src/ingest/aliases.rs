use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fields the rebate engine understands, independent of how a spreadsheet
/// happens to label its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    GroupName,
    Penetration,
    Arr,
    Mrr,
    Dum,
    Vum,
    Tam,
    Sam,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::GroupName,
        CanonicalField::Penetration,
        CanonicalField::Arr,
        CanonicalField::Mrr,
        CanonicalField::Dum,
        CanonicalField::Vum,
        CanonicalField::Tam,
        CanonicalField::Sam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::GroupName => "group_name",
            CanonicalField::Penetration => "penetration",
            CanonicalField::Arr => "arr",
            CanonicalField::Mrr => "mrr",
            CanonicalField::Dum => "dum",
            CanonicalField::Vum => "vum",
            CanonicalField::Tam => "tam",
            CanonicalField::Sam => "sam",
        }
    }

    fn default_aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::GroupName => &["Group Name | Website", "Group Name", "group_name", "PARENT_ACCOUNT"],
            CanonicalField::Penetration => &["SAM PEN", "SAM Penetration", "sam_pen"],
            CanonicalField::Arr => &["ARR", "Net New ARR", "Net ARR"],
            CanonicalField::Mrr => &["MRR"],
            CanonicalField::Dum => &["DUM"],
            CanonicalField::Vum => &["VUM", "VUM (EoM)", "EOM_VUM", "TAM"],
            CanonicalField::Tam => &["TAM"],
            CanonicalField::Sam => &["SAM"],
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted column names per canonical field. Matching is exact after
/// trimming and lower-casing; earlier aliases take priority.
///
/// Deserializes from a map of overrides, e.g.
/// `{"arr": ["Annual Revenue"], "penetration": ["Pen %"]}`. Fields not in
/// the map keep their default aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldAliases {
    overrides: BTreeMap<CanonicalField, Vec<String>>,
}

impl FieldAliases {
    /// Replace the alias list for `field`.
    pub fn set(&mut self, field: CanonicalField, aliases: Vec<String>) {
        self.overrides.insert(field, aliases);
    }

    /// Append an alias after the existing ones for `field`.
    pub fn add(&mut self, field: CanonicalField, alias: impl Into<String>) {
        let mut current = self.aliases(field);
        current.push(alias.into());
        self.overrides.insert(field, current);
    }

    pub fn aliases(&self, field: CanonicalField) -> Vec<String> {
        match self.overrides.get(&field) {
            Some(list) => list.clone(),
            None => field
                .default_aliases()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Find the column in `columns` that supplies `field`. Alias order
    /// decides between several candidate columns.
    pub fn resolve_column<'a, I>(&self, field: CanonicalField, columns: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let columns: Vec<&'a str> = columns.into_iter().collect();
        self.aliases(field).iter().find_map(|alias| {
            let wanted = normalize(alias);
            columns.iter().copied().find(|c| normalize(c) == wanted)
        })
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
