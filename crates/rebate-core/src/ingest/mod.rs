pub mod aliases;
pub mod row;

pub use aliases::{CanonicalField, FieldAliases};
pub use row::{extract_financials, find_group, group_names, parse_cell, RawRow};
