//! Dashboard session management.
//!
//! A session owns one upload's dataset together with its filter selection and
//! chart theme. Every change recomputes the dashboard and broadcasts the new
//! state to the session's WebSocket subscribers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use salesboard_core::{
    DashboardConfig, DashboardTable, DashboardView, Dataset, FilterOptions, FilterSelection, Table,
    filter, filter_dataset,
};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::protocol::{FilterPanel, FilterUpdate, ServerMessage, SessionState, Theme};

/// Capacity for each session's broadcast channel.
/// Slow clients miss intermediate states and catch up on the next one.
const MESSAGE_CHANNEL_CAPACITY: usize = 64;

/// One uploaded dataset and its view state.
pub struct DashboardSession {
    id: Uuid,
    file_name: String,
    dataset: Dataset,
    bounds: (NaiveDate, NaiveDate),
    selection: FilterSelection,
    theme: Theme,
    config: DashboardConfig,
    tx: broadcast::Sender<ServerMessage>,
}

impl DashboardSession {
    /// Create a session over the full date range with no location filter.
    pub fn new(
        file_name: impl Into<String>,
        dataset: Dataset,
        config: DashboardConfig,
    ) -> ServerResult<Self> {
        let selection =
            FilterSelection::with_defaults(&dataset).ok_or(ServerError::EmptyDataset)?;
        let (tx, _) = broadcast::channel(MESSAGE_CHANNEL_CAPACITY);
        let session = Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            bounds: (selection.date_lower, selection.date_upper),
            selection,
            dataset,
            theme: Theme::default(),
            config,
            tx,
        };
        tracing::info!(
            "Created session {} for {} ({} rows)",
            session.id,
            session.file_name,
            session.dataset.len()
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Subscribe to state broadcasts.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.tx.subscribe()
    }

    /// Number of connected WebSocket clients.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Recompute the filter panel and dashboard for the current selection.
    pub fn get_state(&self) -> SessionState {
        let base = self
            .dataset
            .slice_dates(self.selection.date_lower, self.selection.date_upper);
        let filtered = filter::apply(&base, &self.selection);

        SessionState {
            session_id: self.id,
            file_name: self.file_name.clone(),
            row_count: self.dataset.len(),
            dropped_rows: self.dataset.dropped_rows(),
            theme: self.theme,
            filters: FilterPanel {
                date_min: self.bounds.0,
                date_max: self.bounds.1,
                options: FilterOptions::derive(&base, &self.selection),
                selection: self.selection.clone(),
            },
            dashboard: DashboardView::compute(&base, &filtered, &self.config),
        }
    }

    pub fn state_message(&self) -> ServerMessage {
        ServerMessage::DashboardState {
            state: Box::new(self.get_state()),
        }
    }

    /// Replace the selection and broadcast the recomputed state.
    pub fn update_filters(&mut self, update: FilterUpdate) -> SessionState {
        self.selection = update.into_selection(self.bounds);
        tracing::debug!(
            "Session {} filters: {} to {}, {} regions, {} states, {} cities",
            self.id,
            self.selection.date_lower,
            self.selection.date_upper,
            self.selection.regions.len(),
            self.selection.states.len(),
            self.selection.cities.len()
        );
        self.publish()
    }

    /// Change the theme and broadcast the new state.
    pub fn set_theme(&mut self, theme: Theme) -> SessionState {
        self.theme = theme;
        self.publish()
    }

    /// Build a downloadable table under the current selection.
    pub fn table(&self, table: DashboardTable) -> ServerResult<Table> {
        let rows = filter_dataset(&self.dataset, &self.selection);
        Ok(table.build(&self.dataset, &rows, &self.config)?)
    }

    fn publish(&self) -> SessionState {
        let state = self.get_state();
        // No subscribers is not an error.
        let _ = self.tx.send(ServerMessage::DashboardState {
            state: Box::new(state.clone()),
        });
        state
    }
}

/// Shared handle to one session.
pub type SessionHandle = Arc<RwLock<DashboardSession>>;

struct StoredSession {
    handle: SessionHandle,
    last_access: Instant,
}

/// All live sessions, keyed by id.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<FxHashMap<Uuid, StoredSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return its handle.
    pub async fn insert(&self, session: DashboardSession) -> SessionHandle {
        let id = session.id();
        let handle = Arc::new(RwLock::new(session));
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id,
            StoredSession {
                handle: handle.clone(),
                last_access: Instant::now(),
            },
        );
        tracing::debug!("{} live sessions", sessions.len());
        handle
    }

    /// Look up a session and mark it as used.
    pub async fn get(&self, id: Uuid) -> ServerResult<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(&id)
            .ok_or(ServerError::SessionNotFound(id))?;
        stored.last_access = Instant::now();
        Ok(stored.handle.clone())
    }

    /// Mark a session as used without borrowing it.
    pub async fn touch(&self, id: Uuid) {
        if let Some(stored) = self.sessions.write().await.get_mut(&id) {
            stored.last_access = Instant::now();
        }
    }

    pub async fn remove(&self, id: Uuid) -> ServerResult<()> {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(_) => {
                tracing::info!("Closed session {}", id);
                Ok(())
            }
            None => Err(ServerError::SessionNotFound(id)),
        }
    }

    /// Drop sessions with no WebSocket clients that have not been used for
    /// `max_idle`. Returns the number evicted.
    ///
    /// A session whose lock is held is in use and is kept.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, stored| {
            if now.duration_since(stored.last_access) < max_idle {
                return true;
            }
            let connected = stored
                .handle
                .try_read()
                .map(|session| session.subscriber_count() > 0)
                .unwrap_or(true);
            if !connected {
                tracing::info!("Evicted idle session {}", id);
            }
            connected
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!("Evicted {} idle sessions, {} live", evicted, sessions.len());
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use salesboard_core::{Columns, LoadOptions, Row};

    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, d).unwrap()
    }

    fn row(month: u32, region: &str, state: &str, city: &str, sales: f64) -> Row {
        Row {
            order_date: date(month, 1),
            region: region.to_string(),
            state: state.to_string(),
            city: city.to_string(),
            category: "Technology".to_string(),
            sub_category: "Phones".to_string(),
            segment: "Consumer".to_string(),
            sales,
            profit: sales / 4.0,
            quantity: 1,
            order_id: None,
            customer_id: None,
            product_name: None,
        }
    }

    fn session() -> DashboardSession {
        let dataset = Dataset::new(
            vec![
                row(1, "West", "California", "Los Angeles", 100.0),
                row(2, "East", "New York", "Albany", 40.0),
                row(3, "West", "Oregon", "Salem", 10.0),
            ],
            Columns::default(),
        );
        DashboardSession::new("sales.csv", dataset, DashboardConfig::default()).unwrap()
    }

    #[test]
    fn test_initial_state_covers_full_range() {
        let session = session();
        let state = session.get_state();

        assert_eq!(state.file_name, "sales.csv");
        assert_eq!(state.filters.date_min, date(1, 1));
        assert_eq!(state.filters.date_max, date(3, 1));
        assert_eq!(state.filters.options.regions, vec!["West", "East"]);
        assert_eq!(state.dashboard.dashboard.kpis.total_sales, 150.0);
        assert_eq!(state.theme, Theme::Plotly);
    }

    #[test]
    fn test_update_filters_broadcasts() {
        let mut session = session();
        let mut rx = session.subscribe();

        let update = FilterUpdate {
            regions: ["West".to_string()].into(),
            ..FilterUpdate::default()
        };
        let state = session.update_filters(update);
        assert_eq!(state.dashboard.dashboard.kpis.total_sales, 110.0);
        assert_eq!(state.filters.options.states, vec!["California", "Oregon"]);
        assert_eq!(state.filters.selection.date_lower, date(1, 1));

        match rx.try_recv().unwrap() {
            ServerMessage::DashboardState { state } => {
                assert_eq!(state.filters.selection.regions.len(), 1)
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_preview_ignores_location_filters() {
        let mut session = session();
        let state = session.update_filters(FilterUpdate {
            date_upper: Some(date(2, 1)),
            cities: ["Albany".to_string()].into(),
            ..FilterUpdate::default()
        });
        assert_eq!(state.dashboard.preview.len(), 2);
        assert_eq!(state.dashboard.dashboard.kpis.row_count, 1);
    }

    #[test]
    fn test_set_theme_and_tables() {
        let mut session = session();
        assert_eq!(session.set_theme(Theme::PlotlyDark).theme, Theme::PlotlyDark);

        let table = session.table(DashboardTable::Region).unwrap();
        assert_eq!(table.len(), 2);
        assert!(session.table(DashboardTable::TopProducts).is_err());
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let input = "Order Date,Region,State,City,Category,Sub-Category,Segment,Sales,Profit,Quantity\n\
                     never,West,Utah,Provo,Technology,Phones,Consumer,5,1,1\n";
        let dataset =
            Dataset::from_bytes("bad.csv", input.as_bytes(), &LoadOptions::default()).unwrap();
        let err = DashboardSession::new("bad.csv", dataset, DashboardConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ServerError::EmptyDataset));
    }

    #[tokio::test]
    async fn test_store_lifecycle() {
        let store = SessionStore::new();
        let handle = store.insert(session()).await;
        let id = handle.read().await.id();

        assert_eq!(store.len().await, 1);
        assert!(store.get(id).await.is_ok());
        store.remove(id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(
            store.get(id).await,
            Err(ServerError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_evict_idle_keeps_connected_sessions() {
        let store = SessionStore::new();
        let idle = store.insert(session()).await;
        let watched = store.insert(session()).await;
        let idle_id = idle.read().await.id();
        let watched_id = watched.read().await.id();
        let _rx = watched.read().await.subscribe();

        assert_eq!(store.evict_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(store.len().await, 2);

        assert_eq!(store.evict_idle(Duration::ZERO).await, 1);
        assert!(matches!(
            store.get(idle_id).await,
            Err(ServerError::SessionNotFound(_))
        ));
        assert!(store.get(watched_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_evict_idle_skips_locked_sessions() {
        let store = SessionStore::new();
        let handle = store.insert(session()).await;
        let _guard = handle.write().await;

        assert_eq!(store.evict_idle(Duration::ZERO).await, 0);
        assert_eq!(store.len().await, 1);
    }
}
