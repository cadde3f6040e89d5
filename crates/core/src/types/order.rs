//! Customer order types.

use core::fmt;

use chrono::{DateTime, Local, TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One requested line of an order.
///
/// `name` refers to a catalog product by exact name. Names that match nothing
/// are kept as-is; they simply do not contribute to the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub qty: u32,
}

impl OrderItem {
    #[must_use]
    pub fn new(name: impl Into<String>, qty: u32) -> Self {
        Self {
            name: name.into(),
            qty,
        }
    }
}

impl fmt::Display for OrderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.qty)
    }
}

/// One coordinate component as the browser submitted it.
#[derive(Debug, Clone, PartialEq)]
pub enum Coordinate {
    /// A numeric value in degrees.
    Degrees(f64),
    /// Any other scalar, kept as its text.
    Raw(String),
}

impl From<f64> for Coordinate {
    fn from(degrees: f64) -> Self {
        Self::Degrees(degrees)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degrees(v) => write!(f, "{v}"),
            Self::Raw(text) => f.write_str(text),
        }
    }
}

/// Delivery coordinates reported by the customer's browser.
///
/// Either component may be missing when the browser refused geolocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Location {
    pub latitude: Option<Coordinate>,
    pub longitude: Option<Coordinate>,
}

impl Location {
    /// Text rendered for a component that was not submitted.
    pub const MISSING: &'static str = "undefined";

    #[must_use]
    pub const fn new(latitude: Option<Coordinate>, longitude: Option<Coordinate>) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components given in degrees.
    #[must_use]
    pub const fn at(latitude: f64, longitude: f64) -> Self {
        Self::new(
            Some(Coordinate::Degrees(latitude)),
            Some(Coordinate::Degrees(longitude)),
        )
    }
}

/// Renders as `"<lat>, <lon>"`, the format stored on every order.
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn part(f: &mut fmt::Formatter<'_>, value: Option<&Coordinate>) -> fmt::Result {
            match value {
                Some(coordinate) => write!(f, "{coordinate}"),
                None => f.write_str(Location::MISSING),
            }
        }

        part(f, self.latitude.as_ref())?;
        f.write_str(", ")?;
        part(f, self.longitude.as_ref())
    }
}

/// Human-readable submission timestamp, e.g. `6/14/2024, 7:05:09 AM`.
///
/// This is a display string, not a sortable machine format. Orders are kept
/// in submission order by the order log itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderDate(String);

impl OrderDate {
    const FORMAT: &'static str = "%-m/%-d/%Y, %-I:%M:%S %p";

    /// Capture the current local time.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    /// Render an arbitrary instant in the order date format.
    #[must_use]
    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self(at.format(Self::FORMAT).to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A placed order, as persisted in the order log.
///
/// `total` was computed against the catalog snapshot read when the order was
/// taken. It is not recomputed later, and it may disagree with `items` when
/// some item names matched no product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub name: String,
    pub phone: String,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub location: String,
    pub date: OrderDate,
}

impl Order {
    /// Items rendered as `name: qty` pairs joined by `", "`.
    #[must_use]
    pub fn items_summary(&self) -> String {
        self.items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
