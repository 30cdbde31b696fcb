//! Nodes rename fields and change units between releases. A concept such as
//! "balance to us" is described by an ordered list of the field names it has
//! been reported under, newest first. Resolution takes the first present,
//! non-null, parseable entry and defaults to zero, independently for every
//! concept on a record.

use log::trace;
use serde_json::Value;

use crate::amount::{parse_json_msat, Msat, Unit};

/// One historical name of a field and the unit it was reported in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldAlias {
    /// JSON key
    pub name: &'static str,
    /// Unit of bare numeric values under this key
    pub unit: Unit,
}

/// A millisatoshi-denominated alias
pub const fn msat(name: &'static str) -> FieldAlias {
    FieldAlias { name, unit: Unit::Msat }
}

/// A satoshi-denominated alias
pub const fn sat(name: &'static str) -> FieldAlias {
    FieldAlias { name, unit: Unit::Sat }
}

/// A monetary concept and the names it has been reported under
#[derive(Clone, Copy, Debug)]
pub struct AmountConcept {
    /// Name for logs
    pub concept: &'static str,
    /// Aliases in priority order
    pub aliases: &'static [FieldAlias],
}

impl AmountConcept {
    /// The first usable alias on `record`, if any
    pub fn lookup(&self, record: &Value) -> Option<Msat> {
        for alias in self.aliases {
            match record.get(alias.name) {
                None | Some(Value::Null) => continue,
                Some(raw) => match parse_json_msat(raw, alias.unit) {
                    Some(amount) => {
                        trace!("{} resolved from {}", self.concept, alias.name);
                        return Some(amount);
                    }
                    None => trace!("{}: ignoring unparseable {}={}", self.concept, alias.name, raw),
                },
            }
        }
        None
    }

    /// The first usable alias on `record`, or zero
    pub fn resolve(&self, record: &Value) -> Msat {
        self.lookup(record).unwrap_or(Msat::ZERO)
    }
}

/// First present string among `names`
pub fn str_field(record: &Value, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| record.get(*name).and_then(Value::as_str)).map(str::to_string)
}

/// First present boolean among `names`, also accepting `"true"`/`"false"` strings
pub fn bool_field(record: &Value, names: &[&str]) -> Option<bool> {
    names.iter().find_map(|name| match record.get(*name) {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

/// First present non-negative integer among `names`
pub fn u64_field(record: &Value, names: &[&str]) -> Option<u64> {
    names.iter().find_map(|name| record.get(*name).and_then(Value::as_u64))
}

/// The array under `key`, or an empty slice when absent or of another type
pub fn array_field<'a>(record: &'a Value, key: &str) -> &'a [Value] {
    record.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

/// Sum `concept` over the records accepted by `filter`, saturating at `u64::MAX`
pub fn sum_amounts<'a, I, F>(records: I, concept: &AmountConcept, filter: F) -> Msat
where
    I: IntoIterator<Item = &'a Value>,
    F: Fn(&Value) -> bool,
{
    records
        .into_iter()
        .filter(|r| filter(r))
        .map(|r| concept.resolve(r))
        .fold(Msat::ZERO, |acc, m| acc.checked_add(m).unwrap_or(Msat(u64::MAX)))
}
