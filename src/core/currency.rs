use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies accepted for course purchases
///
/// All supported currencies use two decimal places; the provider expresses
/// them in minor units (piastres / cents) except on the intention endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(3)", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Egyptian Pound
    EGP,
    /// US Dollar
    USD,
    /// Saudi Riyal
    SAR,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::EGP => write!(f, "EGP"),
            Currency::USD => write!(f, "USD"),
            Currency::SAR => write!(f, "SAR"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EGP" => Ok(Currency::EGP),
            "USD" => Ok(Currency::USD),
            "SAR" => Ok(Currency::SAR),
            _ => Err(format!("Invalid currency: {}", s)),
        }
    }
}

impl TryFrom<&str> for Currency {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}
