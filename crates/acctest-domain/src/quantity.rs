use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// A positive decimal resource request (CPU cores, memory GB).
///
/// Stored as `mantissa / 10^scale` with trailing zeros stripped, so equality
/// is exact rational equality: `"2.0" == "2"` and `"0.50" == "0.5"`. Nothing
/// is ever rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quantity {
    mantissa: u64,
    scale: u32,
}

impl Quantity {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidQuantity(s.to_string());
        let text = s.trim();

        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        // Zeros that do not change the value must not count against u64.
        let int_part = int_part.trim_start_matches('0');
        let frac_part = frac_part.trim_end_matches('0');

        let mut mantissa: u64 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(u64::from(b - b'0')))
                .ok_or_else(invalid)?;
        }
        if mantissa == 0 {
            return Err(invalid());
        }

        let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        Ok(Self::normalized(mantissa, scale))
    }

    /// Build from a JSON number as returned by a provider API. The shortest
    /// decimal representation of the float is parsed exactly.
    pub fn from_f64(v: f64) -> Result<Self, DomainError> {
        if !v.is_finite() || v <= 0.0 {
            return Err(DomainError::InvalidQuantity(v.to_string()));
        }
        Self::parse(&v.to_string())
    }

    /// Approximate float value, for provider payloads that take a JSON number.
    pub fn as_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }

    fn normalized(mut mantissa: u64, mut scale: u32) -> Self {
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        Quantity { mantissa, scale }
    }
}

impl std::str::FromStr for Quantity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantity::parse(s)
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let digits = format!("{:0>width$}", self.mantissa, width = self.scale as usize + 1);
        let (int_part, frac_part) = digits.split_at(digits.len() - self.scale as usize);
        write!(f, "{}.{}", int_part, frac_part)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // YAML authors write `cpu: 0.5` as often as `cpu: "0.5"`.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Int(u64),
            Float(f64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => Quantity::parse(&s),
            Repr::Int(n) => Quantity::parse(&n.to_string()),
            Repr::Float(v) => Quantity::from_f64(v),
        }
        .map_err(serde::de::Error::custom)
    }
}
