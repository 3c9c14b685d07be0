//! Cascading location options and the final filter predicate.
//!
//! Option lists narrow hierarchically: states come from rows matching the
//! selected regions, cities from rows matching the selected regions and
//! states. The final predicate ANDs every non-empty constraint against the
//! date-sliced base, which is equivalent to narrowing step by step.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, RowSet};
use crate::model::{FilterSelection, LocationField, Row};

/// Choices offered for each location filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub states: Vec<String>,
    pub cities: Vec<String>,
}

impl FilterOptions {
    /// Derive option lists from the date-sliced base and the current selection.
    pub fn derive(base: &RowSet<'_>, selection: &FilterSelection) -> Self {
        let regions = distinct(base, LocationField::Region);

        let by_region = narrow(base, LocationField::Region, &selection.regions);
        let states = distinct(&by_region, LocationField::State);

        let by_state = narrow(&by_region, LocationField::State, &selection.states);
        let cities = distinct(&by_state, LocationField::City);

        Self {
            regions,
            states,
            cities,
        }
    }
}

/// One active `field IN allowed` constraint.
#[derive(Debug, Clone, Copy)]
pub struct Constraint<'s> {
    pub field: LocationField,
    pub allowed: &'s BTreeSet<String>,
}

impl Constraint<'_> {
    pub fn matches(&self, row: &Row) -> bool {
        self.allowed.contains(self.field.value(row))
    }
}

/// The non-empty location constraints of a selection, broadest first.
pub fn constraints(selection: &FilterSelection) -> Vec<Constraint<'_>> {
    [LocationField::Region, LocationField::State, LocationField::City]
        .into_iter()
        .map(|field| Constraint {
            field,
            allowed: selection.allowed(field),
        })
        .filter(|c| !c.allowed.is_empty())
        .collect()
}

/// Apply the location constraints of `selection` to the date-sliced base.
pub fn apply<'a>(base: &RowSet<'a>, selection: &FilterSelection) -> RowSet<'a> {
    let active = constraints(selection);
    base.retain(|row| active.iter().all(|c| c.matches(row)))
}

/// Date slice followed by the location predicate.
pub fn filter_dataset<'a>(dataset: &'a Dataset, selection: &FilterSelection) -> RowSet<'a> {
    let base = dataset.slice_dates(selection.date_lower, selection.date_upper);
    let filtered = apply(&base, selection);
    tracing::debug!(
        "Filtered {} of {} date-sliced rows",
        filtered.len(),
        base.len()
    );
    filtered
}

impl FilterSelection {
    /// Full date range of `dataset`, no location constraint.
    ///
    /// Returns `None` when the dataset has no rows to take bounds from.
    pub fn with_defaults(dataset: &Dataset) -> Option<Self> {
        dataset
            .date_bounds()
            .map(|(lower, upper)| FilterSelection::new(lower, upper))
    }
}

fn narrow<'a>(rows: &RowSet<'a>, field: LocationField, allowed: &BTreeSet<String>) -> RowSet<'a> {
    if allowed.is_empty() {
        rows.clone()
    } else {
        rows.retain(|row| allowed.contains(field.value(row)))
    }
}

/// Distinct values of `field` in first-appearance order.
fn distinct(rows: &RowSet<'_>, field: LocationField) -> Vec<String> {
    let mut seen = FxHashSet::default();
    rows.iter()
        .map(|row| field.value(row))
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}
