//! WebSocket protocol messages for the Salesboard server.
//!
//! Defines the message types exchanged between client and server. The same
//! state payload is returned by the REST endpoints.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use salesboard_core::{DashboardView, FilterOptions, FilterSelection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request current dashboard state.
    GetState,

    /// Replace the filter selection.
    UpdateFilters {
        /// New selection; omitted dates fall back to the dataset bounds.
        filters: FilterUpdate,
    },

    /// Change the chart theme.
    SetTheme {
        /// Theme to apply.
        theme: Theme,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full dashboard state for a session.
    DashboardState {
        /// Session snapshot.
        state: Box<SessionState>,
    },

    /// Error message.
    Error {
        /// Error description.
        message: String,
    },
}

/// Chart theme, echoed to clients for styling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Plotly,
    PlotlyWhite,
    PlotlyDark,
    Ggplot2,
    Seaborn,
    SimpleWhite,
}

impl Theme {
    pub const ALL: [Theme; 6] = [
        Theme::Plotly,
        Theme::PlotlyWhite,
        Theme::PlotlyDark,
        Theme::Ggplot2,
        Theme::Seaborn,
        Theme::SimpleWhite,
    ];
}

/// A requested selection; every field may be omitted.
///
/// Missing dates fall back to the dataset bounds, missing location sets
/// mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_lower: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_upper: Option<NaiveDate>,
    #[serde(default)]
    pub regions: BTreeSet<String>,
    #[serde(default)]
    pub states: BTreeSet<String>,
    #[serde(default)]
    pub cities: BTreeSet<String>,
}

impl FilterUpdate {
    /// Resolve against the dataset bounds.
    pub fn into_selection(self, bounds: (NaiveDate, NaiveDate)) -> FilterSelection {
        let (lower, upper) = bounds;
        FilterSelection {
            date_lower: self.date_lower.unwrap_or(lower),
            date_upper: self.date_upper.unwrap_or(upper),
            regions: self.regions,
            states: self.states,
            cities: self.cities,
        }
    }
}

/// Sidebar contents: date bounds, option lists and the active selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPanel {
    pub date_min: NaiveDate,
    pub date_max: NaiveDate,
    pub options: FilterOptions,
    pub selection: FilterSelection,
}

/// Snapshot of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: Uuid,
    pub file_name: String,
    /// Rows with a valid order date.
    pub row_count: usize,
    /// Rows dropped for an unparseable order date.
    pub dropped_rows: usize,
    pub theme: Theme,
    pub filters: FilterPanel,
    pub dashboard: DashboardView,
}
