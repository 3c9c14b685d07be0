//! Integration tests for protocol message serialization.
//!
//! Tests all client and server message types for correct JSON serialization.

use salesboard_core::{Columns, DashboardConfig, Dataset, Row};
use salesboard_server::protocol::*;
use salesboard_server::DashboardSession;

fn session() -> DashboardSession {
    let row = Row {
        order_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        region: "South".to_string(),
        state: "Florida".to_string(),
        city: "Miami".to_string(),
        category: "Furniture".to_string(),
        sub_category: "Chairs".to_string(),
        segment: "Home Office".to_string(),
        sales: 99.5,
        profit: -4.5,
        quantity: 3,
        order_id: Some("US-1".to_string()),
        customer_id: Some("AA-1".to_string()),
        product_name: Some("Chair".to_string()),
    };
    let dataset = Dataset::new(vec![row], Columns::all());
    DashboardSession::new("superstore.xlsx", dataset, DashboardConfig::default()).unwrap()
}

#[test]
fn test_all_client_messages_serialize() {
    let messages = vec![
        ClientMessage::GetState,
        ClientMessage::UpdateFilters {
            filters: FilterUpdate {
                regions: ["West".to_string()].into(),
                ..FilterUpdate::default()
            },
        },
        ClientMessage::SetTheme {
            theme: Theme::PlotlyDark,
        },
    ];

    for msg in messages {
        let json = serde_json::to_string(&msg).expect("Failed to serialize");
        let parsed: ClientMessage = serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(
            serde_json::to_value(&parsed).unwrap(),
            serde_json::to_value(&msg).unwrap()
        );
    }
}

#[test]
fn test_client_message_tags() {
    let msg: ClientMessage = serde_json::from_str(r#"{"type":"get_state"}"#).unwrap();
    assert!(matches!(msg, ClientMessage::GetState));

    let msg: ClientMessage = serde_json::from_str(
        r#"{"type":"update_filters","filters":{"date_lower":"2024-01-01","cities":["Miami"]}}"#,
    )
    .unwrap();
    match msg {
        ClientMessage::UpdateFilters { filters } => {
            assert!(filters.date_upper.is_none());
            assert!(filters.regions.is_empty());
            assert!(filters.cities.contains("Miami"));
        }
        other => panic!("unexpected message: {:?}", other),
    }

    let msg: ClientMessage =
        serde_json::from_str(r#"{"type":"set_theme","theme":"simple_white"}"#).unwrap();
    assert!(matches!(
        msg,
        ClientMessage::SetTheme {
            theme: Theme::SimpleWhite
        }
    ));

    assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"set_theme","theme":"neon"}"#).is_err());
}

#[test]
fn test_theme_names() {
    let names: Vec<String> = Theme::ALL
        .iter()
        .map(|t| serde_json::to_value(t).unwrap().as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "plotly",
            "plotly_white",
            "plotly_dark",
            "ggplot2",
            "seaborn",
            "simple_white"
        ]
    );
}

#[test]
fn test_server_messages_serialize() {
    let session = session();

    let json = serde_json::to_value(session.state_message()).unwrap();
    assert_eq!(json["type"], "dashboard_state");
    let state = &json["state"];
    assert_eq!(state["file_name"], "superstore.xlsx");
    assert_eq!(state["theme"], "plotly");
    assert_eq!(state["filters"]["date_min"], "2024-06-30");
    assert_eq!(state["dashboard"]["kpis"]["total_sales"], 99.5);
    assert_eq!(state["dashboard"]["monthly_sales"]["points"][0]["label"], "2024 : Jun");
    assert_eq!(state["dashboard"]["preview"][0]["city"], "Miami");

    let round_trip: ServerMessage = serde_json::from_value(json).unwrap();
    assert!(matches!(round_trip, ServerMessage::DashboardState { .. }));

    let error = ServerMessage::Error {
        message: "bad".to_string(),
    };
    let json = serde_json::to_value(&error).unwrap();
    assert_eq!(json, serde_json::json!({"type": "error", "message": "bad"}));
}
