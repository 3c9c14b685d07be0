//! Integration tests for the load → filter → aggregate pipeline.

use std::collections::BTreeSet;
use std::io::Write;

use chrono::NaiveDate;
use salesboard_core::aggregate::{category_sales, sales_hierarchy, top_cities};
use salesboard_core::*;

const HEADER: &str = "Order ID,Order Date,Customer ID,Segment,City,State,Region,Product Name,Category,Sub-Category,Sales,Quantity,Profit";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn load_str(body: &str) -> Dataset {
    let input = format!("{}\n{}", HEADER, body);
    Dataset::from_bytes("upload.csv", input.as_bytes(), &LoadOptions::default()).unwrap()
}

/// A grid of locations that includes rows violating the geographic hierarchy.
fn location_grid() -> Dataset {
    let mut body = String::new();
    let mut n = 0;
    for region in ["East", "West", "Central"] {
        for state in ["California", "New York", "Texas"] {
            for city in ["Austin", "Buffalo", "Fresno"] {
                n += 1;
                body.push_str(&format!(
                    "O-{n},1/{day}/2023,C-{c},Consumer,{city},{state},{region},P-{n},Furniture,Chairs,{sales},1,1\n",
                    day = n % 28 + 1,
                    c = n % 5,
                    sales = n * 10,
                ));
            }
        }
    }
    load_str(&body)
}

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Step-by-step narrowing with one branch per combination of non-empty filters.
fn cascade<'a>(base: &RowSet<'a>, sel: &FilterSelection) -> RowSet<'a> {
    let (r, s, c) = (&sel.regions, &sel.states, &sel.cities);
    let df2 = if r.is_empty() {
        base.clone()
    } else {
        base.retain(|row| r.contains(&row.region))
    };
    let df3 = if s.is_empty() {
        df2.clone()
    } else {
        df2.retain(|row| s.contains(&row.state))
    };

    match (r.is_empty(), s.is_empty(), c.is_empty()) {
        (true, true, true) => base.clone(),
        (false, true, true) => df2,
        (true, false, true) => base.retain(|row| s.contains(&row.state)),
        (true, true, false) => base.retain(|row| c.contains(&row.city)),
        (true, false, false) => {
            base.retain(|row| s.contains(&row.state) && c.contains(&row.city))
        }
        (false, false, true) => df3,
        (false, true, false) => df3.retain(|row| c.contains(&row.city)),
        (false, false, false) => {
            df3.retain(|row| s.contains(&row.state) && c.contains(&row.city))
        }
    }
}

fn ids(rows: &RowSet<'_>) -> Vec<String> {
    rows.iter().filter_map(|r| r.order_id.clone()).collect()
}

// =============================================================================
// Filtering
// =============================================================================

#[test]
fn test_filter_matches_step_by_step_cascade() {
    let dataset = location_grid();
    let (lower, upper) = dataset.date_bounds().unwrap();
    let base = dataset.slice_dates(lower, upper);

    let choices: [&[&str]; 3] = [&[], &["West"], &["East", "Central"]];
    let state_choices: [&[&str]; 3] = [&[], &["California"], &["Texas", "New York"]];
    let city_choices: [&[&str]; 3] = [&[], &["Fresno"], &["Austin", "Buffalo"]];

    for regions in choices {
        for states in state_choices {
            for cities in city_choices {
                let mut sel = FilterSelection::new(lower, upper);
                sel.regions = set(regions);
                sel.states = set(states);
                sel.cities = set(cities);

                let expected = ids(&cascade(&base, &sel));
                let actual = ids(&filter_dataset(&dataset, &sel));
                assert_eq!(
                    actual, expected,
                    "regions={regions:?} states={states:?} cities={cities:?}"
                );
            }
        }
    }
}

#[test]
fn test_region_and_state_exclude_out_of_hierarchy_rows() {
    let dataset = load_str(
        "O-1,3/1/2023,C-1,Consumer,Los Angeles,California,West,P,Technology,Phones,100,1,10\n\
         O-2,3/2/2023,C-2,Consumer,Oddity,California,East,P,Technology,Phones,50,1,5\n\
         O-3,3/3/2023,C-3,Consumer,Seattle,Washington,West,P,Technology,Phones,25,1,2\n",
    );
    let sel = FilterSelection::with_defaults(&dataset)
        .unwrap()
        .with_regions(["West"])
        .with_states(["California"]);

    let filtered = filter_dataset(&dataset, &sel);
    assert_eq!(ids(&filtered), vec!["O-1"]);

    let options = FilterOptions::derive(&dataset.all(), &sel);
    assert_eq!(options.states, vec!["California", "Washington"]);
    assert_eq!(options.cities, vec!["Los Angeles"]);
}

#[test]
fn test_inverted_date_range_yields_empty_dashboard() {
    let dataset = location_grid();
    let sel = FilterSelection::new(date(2023, 1, 20), date(2023, 1, 10));
    let rows = filter_dataset(&dataset, &sel);
    assert!(rows.is_empty());

    let dashboard = Dashboard::compute(&rows, &DashboardConfig::default());
    assert_eq!(dashboard.kpis, Kpis::default());
    assert!(dashboard.category_sales.entries.is_empty());
    assert!(dashboard.top_cities.entries.is_empty());
    assert!(dashboard.monthly_sales.points.is_empty());
    assert!(dashboard.sub_category_pivot.rows.is_empty());
    assert_eq!(dashboard.top_products.map(|p| p.entries.len()), Some(0));
}

// =============================================================================
// Aggregates
// =============================================================================

#[test]
fn test_group_totals_add_up_to_kpis() {
    let dataset = location_grid();
    let rows = dataset.all();
    let kpis = Kpis::compute(&rows);

    assert_eq!(category_sales(&rows).total(), kpis.total_sales);
    assert_eq!(sales_hierarchy(&rows).sales, kpis.total_sales);
    assert_eq!(kpis.total_sales, (1..=27).map(|n| (n * 10) as f64).sum::<f64>());
    assert_eq!(kpis.unique_customers, 5);
}

#[test]
fn test_top_cities_length() {
    let dataset = location_grid();
    let rows = dataset.all();
    assert_eq!(top_cities(&rows, 10).entries.len(), 3);
    assert_eq!(top_cities(&rows, 2).entries.len(), 2);
}

// =============================================================================
// Loading and export
// =============================================================================

#[test]
fn test_load_from_disk_and_export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("superstore.csv");
    std::fs::write(
        &path,
        format!(
            "{}\n{}",
            HEADER,
            "O-1,11/8/2016,C-1,Consumer,Henderson,Kentucky,South,Chair,Furniture,Chairs,261.96,2,41.9136\n\
             O-2,bad,C-2,Consumer,Henderson,Kentucky,South,Table,Furniture,Tables,731.94,3,219.582\n"
        ),
    )
    .unwrap();

    let dataset = Dataset::load(&path, &LoadOptions::default()).unwrap();
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.dropped_rows(), 1);

    let rows = dataset.all();
    let table = DashboardTable::Filtered
        .build(&dataset, &rows, &DashboardConfig::default())
        .unwrap();
    let out = dir.path().join(DashboardTable::Filtered.file_name());
    write_csv(&table, std::fs::File::create(&out).unwrap()).unwrap();

    let mut reader = csv::Reader::from_path(&out).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(headers, table.columns);
    assert_eq!(reader.records().count(), 1);
}

#[test]
fn test_windows_1252_input_loads() {
    let mut bytes = Vec::new();
    writeln!(bytes, "{}", HEADER).unwrap();
    bytes.extend_from_slice(b"O-1,1/2/2023,C-1,Consumer,Montr\xe9al,Qu\xe9bec,North,Caf\xe9,Furniture,Chairs,5,1,1\n");

    let dataset = Dataset::from_bytes("latin.csv", &bytes, &LoadOptions::default()).unwrap();
    assert_eq!(dataset.rows()[0].city, "Montréal");
    assert_eq!(dataset.rows()[0].product_name.as_deref(), Some("Café"));

    let strict = LoadOptions {
        encoding: TextEncoding::Utf8,
        ..LoadOptions::default()
    };
    let err = Dataset::from_bytes("latin.csv", &bytes, &strict).unwrap_err();
    assert!(matches!(err, Error::Encoding { row: 1 }));
}

#[test]
fn test_unsupported_upload_is_rejected() {
    let err = Dataset::from_bytes("data.json", b"{}", &LoadOptions::default()).unwrap_err();
    assert!(err.is_input_error());
    assert!(err.to_string().contains("data.json"));
}
