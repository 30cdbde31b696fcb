use core::fmt;

use serde_json::Value;

use crate::error::{Error, Result};

/// Millisatoshis per satoshi
pub const MSAT_PER_SAT: u64 = 1000;

/// An amount in millisatoshi
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Msat(pub u64);

impl Msat {
    /// Zero
    pub const ZERO: Msat = Msat(0);

    /// Convert whole satoshis, `None` on overflow
    pub fn from_sat(sat: u64) -> Option<Msat> {
        sat.checked_mul(MSAT_PER_SAT).map(Msat)
    }

    /// Raw millisatoshi value
    pub fn msat(self) -> u64 {
        self.0
    }

    /// Whole satoshis, if the amount has no millisatoshi remainder
    pub fn whole_sat(self) -> Option<u64> {
        if self.0 % MSAT_PER_SAT == 0 {
            Some(self.0 / MSAT_PER_SAT)
        } else {
            None
        }
    }

    /// Exact satoshi rendering.
    ///
    /// Multiples of 1000 render as integers; others keep the millisatoshi
    /// digits as a decimal fraction without trailing zeros, so `1234` renders
    /// as `"1.234"` and `1500` as `"1.5"`.
    pub fn to_sat_string(self) -> String {
        let sat = self.0 / MSAT_PER_SAT;
        let rem = self.0 % MSAT_PER_SAT;
        if rem == 0 {
            sat.to_string()
        } else {
            let frac = format!("{:03}", rem);
            format!("{}.{}", sat, frac.trim_end_matches('0'))
        }
    }

    /// Saturating difference, used for derived balances
    pub fn saturating_sub(self, other: Msat) -> Msat {
        Msat(self.0.saturating_sub(other.0))
    }

    /// Checked sum
    pub fn checked_add(self, other: Msat) -> Option<Msat> {
        self.0.checked_add(other.0).map(Msat)
    }
}

impl fmt::Display for Msat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}msat", self.0)
    }
}

/// Unit of a raw amount field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    /// Millisatoshi
    Msat,
    /// Satoshi
    Sat,
}

/// Read an amount from a JSON number, a numeric string, or a string with a
/// unit suffix such as `"3000000msat"` or `"1000sat"`.
///
/// A suffix overrides `unit`; bare values are taken to be in `unit`.
/// Negative, fractional and non-numeric values yield `None`.
pub fn parse_json_msat(value: &Value, unit: Unit) -> Option<Msat> {
    let (raw, unit) = match value {
        Value::Number(n) => (n.as_u64()?, unit),
        Value::String(s) => {
            let s = s.trim();
            let (digits, unit) = if let Some(d) = s.strip_suffix("msat") {
                (d, Unit::Msat)
            } else if let Some(d) = s.strip_suffix("sat") {
                (d, Unit::Sat)
            } else {
                (s, unit)
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            (digits.parse().ok()?, unit)
        }
        _ => return None,
    };
    match unit {
        Unit::Msat => Some(Msat(raw)),
        Unit::Sat => Msat::from_sat(raw),
    }
}

/// Satoshis to millisatoshis for a request, failing on overflow
pub fn sat_to_msat(sat: u64) -> Result<u64> {
    Msat::from_sat(sat)
        .map(Msat::msat)
        .ok_or_else(|| Error::InvalidRequest(format!("amount {} sat overflows", sat)))
}

/// Multiply a non-negative decimal string by 1000 exactly.
///
/// Used to turn sat/vbyte into sat per thousand vbytes. Precision beyond the
/// third decimal place cannot be expressed and is rejected.
pub fn decimal_times_1000(s: &str) -> Result<u64> {
    let invalid = || Error::InvalidRequest(format!("invalid decimal amount {:?}", s));
    let s = s.trim();
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(invalid());
    }
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.len() > 3 {
        return Err(Error::InvalidRequest(format!("{:?} has sub-unit precision", s)));
    }
    let int_value: u64 =
        if int_part.is_empty() { 0 } else { int_part.parse().map_err(|_| invalid())? };
    let frac_value: u64 = if frac_part.is_empty() {
        0
    } else {
        format!("{:0<3}", frac_part).parse().map_err(|_| invalid())?
    };
    int_value
        .checked_mul(1000)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(invalid)
}
