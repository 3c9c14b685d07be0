//! Sales rows, dataset schema and filter selections.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical column headers of an uploaded sales file.
pub mod column {
    pub const ORDER_DATE: &str = "Order Date";
    pub const REGION: &str = "Region";
    pub const STATE: &str = "State";
    pub const CITY: &str = "City";
    pub const CATEGORY: &str = "Category";
    pub const SUB_CATEGORY: &str = "Sub-Category";
    pub const SEGMENT: &str = "Segment";
    pub const SALES: &str = "Sales";
    pub const PROFIT: &str = "Profit";
    pub const QUANTITY: &str = "Quantity";
    pub const ORDER_ID: &str = "Order ID";
    pub const CUSTOMER_ID: &str = "Customer ID";
    pub const PRODUCT_NAME: &str = "Product Name";

    /// Columns every upload must carry.
    pub const REQUIRED: [&str; 10] = [
        ORDER_DATE,
        REGION,
        STATE,
        CITY,
        CATEGORY,
        SUB_CATEGORY,
        SEGMENT,
        SALES,
        PROFIT,
        QUANTITY,
    ];
}

/// One sales transaction line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub order_date: NaiveDate,
    pub region: String,
    pub state: String,
    pub city: String,
    pub category: String,
    pub sub_category: String,
    pub segment: String,
    pub sales: f64,
    pub profit: f64,
    pub quantity: u64,
    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    pub product_name: Option<String>,
}

/// Optional columns present in the source file.
///
/// Fallback behavior (average order value, customer count, product ranking)
/// depends on whether the column exists, not on individual row values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Columns {
    pub order_id: bool,
    pub customer_id: bool,
    pub product_name: bool,
}

impl Columns {
    /// All optional columns present.
    pub fn all() -> Self {
        Self {
            order_id: true,
            customer_id: true,
            product_name: true,
        }
    }
}

/// Location fields the cascading filters constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationField {
    Region,
    State,
    City,
}

impl LocationField {
    /// Read this field from a row.
    pub fn value<'r>(&self, row: &'r Row) -> &'r str {
        match self {
            LocationField::Region => &row.region,
            LocationField::State => &row.state,
            LocationField::City => &row.city,
        }
    }

    /// Column header for this field.
    pub fn header(&self) -> &'static str {
        match self {
            LocationField::Region => column::REGION,
            LocationField::State => column::STATE,
            LocationField::City => column::CITY,
        }
    }
}

/// User-chosen date range and location constraints.
///
/// Empty location sets impose no constraint. `date_upper >= date_lower` is
/// not enforced; an inverted range simply matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub date_lower: NaiveDate,
    pub date_upper: NaiveDate,
    #[serde(default)]
    pub regions: BTreeSet<String>,
    #[serde(default)]
    pub states: BTreeSet<String>,
    #[serde(default)]
    pub cities: BTreeSet<String>,
}

impl FilterSelection {
    /// Selection covering `[lower, upper]` with no location constraint.
    pub fn new(date_lower: NaiveDate, date_upper: NaiveDate) -> Self {
        Self {
            date_lower,
            date_upper,
            regions: BTreeSet::new(),
            states: BTreeSet::new(),
            cities: BTreeSet::new(),
        }
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states = states.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cities<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cities = cities.into_iter().map(Into::into).collect();
        self
    }

    /// The allowed set for a location field.
    pub fn allowed(&self, field: LocationField) -> &BTreeSet<String> {
        match field {
            LocationField::Region => &self.regions,
            LocationField::State => &self.states,
            LocationField::City => &self.cities,
        }
    }
}
