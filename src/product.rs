//! Product number parsing.
//!
//! RevPi product numbers come in two shapes, both with a two-digit revision
//! suffix: `PR` + 6 digits (`PR100359R01`) and `FE` + 4 digits
//! (`FE1234R05`). Matching is case-insensitive.

use core::fmt;
use core::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static PRODUCT_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:PR(?P<pr>\d{6})|FE(?P<fe>\d{4}))R(?P<rev>\d{2})$")
        .unwrap_or_else(|e| unreachable!("static product number pattern: {e}"))
});

/// Numeric product id and revision of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductIdentity {
    pub product_id: u32,
    pub product_revision: u8,
    /// Upper-cased product number as given, e.g. `PR100359R01`.
    number: String,
}

impl ProductIdentity {
    /// Upper-cased product number, used as configuration file stem.
    pub fn number(&self) -> &str {
        &self.number
    }
}

/// Split a product number into `(product_id, product_revision)`.
pub fn extract_product(product_number: &str) -> Result<ProductIdentity> {
    let invalid = || Error::InvalidProductNumber(product_number.to_owned());

    let caps = PRODUCT_NUMBER.captures(product_number).ok_or_else(invalid)?;
    let id = caps.name("pr").or_else(|| caps.name("fe")).ok_or_else(invalid)?;
    let rev = caps.name("rev").ok_or_else(invalid)?;

    Ok(ProductIdentity {
        product_id: id.as_str().parse().map_err(|_| invalid())?,
        product_revision: rev.as_str().parse().map_err(|_| invalid())?,
        number: product_number.to_ascii_uppercase(),
    })
}

impl FromStr for ProductIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        extract_product(s)
    }
}

impl fmt::Display for ProductIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.number)
    }
}
