//! Coordinate reference system identifiers.
//!
//! The hazard engine never reprojects; it only needs to know whether two grids
//! claim the same reference frame. A CRS is therefore just a normalized
//! identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GridError;

/// EPSG code of WGS84 geographic coordinates.
pub const EPSG_WGS84: u32 = 4326;

/// Reference frame a grid is expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// An EPSG registry code.
    Epsg(u32),
    /// Anything else (WKT, PROJ string, local name), compared verbatim after trimming.
    Custom(String),
}

impl Crs {
    /// WGS84 geographic (EPSG:4326).
    pub fn wgs84() -> Self {
        Crs::Epsg(EPSG_WGS84)
    }

    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:4326"
    /// - "CRS:84" (treated as EPSG:4326)
    ///
    /// Any other non-empty text becomes [`Crs::Custom`].
    pub fn parse(s: &str) -> Result<Self, GridError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(GridError::InvalidCrs(s.to_string()));
        }

        let normalized = trimmed.to_uppercase();
        if normalized == "CRS:84" {
            return Ok(Crs::wgs84());
        }

        if let Some(code) = normalized.strip_prefix("EPSG:") {
            return code
                .trim()
                .parse::<u32>()
                .map(Crs::Epsg)
                .map_err(|_| GridError::InvalidCrs(s.to_string()));
        }

        Ok(Crs::Custom(trimmed.to_string()))
    }

    /// EPSG code, if this CRS has one.
    pub fn epsg_code(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            Crs::Custom(_) => None,
        }
    }

    /// Check if this is WGS84 geographic.
    pub fn is_wgs84(&self) -> bool {
        self.epsg_code() == Some(EPSG_WGS84)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::wgs84()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Custom(text) => write!(f, "{}", text),
        }
    }
}

impl TryFrom<String> for Crs {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Crs::parse(&value)
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}
