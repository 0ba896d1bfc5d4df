//! End-to-end tests for the list model over an in-process store.
//!
//! Run with: `cargo test --test list_model`
//!
//! # Test Organization
//! - `scenario_*` - Worked examples: empty table, sequential scroll, alias
//!   search, sections with an empty middle section
//! - `window_*` - Containment, bounded memory, one fetch per scroll step
//! - `search_*` - Filter idempotence and refresh behavior

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

use list_window::search::SqlParam;
use list_window::{
    Direction, FieldValue, ListConfig, ListModel, MemoryStore, OrderSpec, Record, RecordSchema,
    RecordStore, SectionKey, StoreError, StoreQuery,
};

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Flight {
    id: i64,
    tail: String,
    via1: Option<String>,
    via2: Option<String>,
    via3: Option<String>,
    cross_country: bool,
    year: i64,
}

impl Record for Flight {
    fn schema() -> RecordSchema {
        RecordSchema::new("flights")
            .primary_key("id")
            .text("tail")
            .text_aliased("via1", &["via"])
            .text_aliased("via2", &["via"])
            .text_aliased("via3", &["via"])
            .boolean_aliased("cross_country", &["xc"])
            .numeric("year")
            .ignored("photo")
    }

    fn value(&self, field: &str) -> Option<FieldValue> {
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text).unwrap_or(FieldValue::Null);
        match field {
            "id" => Some(FieldValue::Numeric(self.id as f64)),
            "tail" => Some(FieldValue::Text(self.tail.clone())),
            "via1" => Some(text(&self.via1)),
            "via2" => Some(text(&self.via2)),
            "via3" => Some(text(&self.via3)),
            "cross_country" => Some(FieldValue::Boolean(self.cross_country)),
            "year" => Some(FieldValue::Numeric(self.year as f64)),
            _ => None,
        }
    }
}

/// Log to the test writer; `RUST_LOG=list_window=debug` shows window moves
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn flight(id: i64, year: i64) -> Flight {
    Flight {
        id,
        tail: format!("N{}", 1000 + id),
        via1: None,
        via2: None,
        via3: None,
        cross_country: false,
        year,
    }
}

/// `n` flights ordered by id, all in one year
fn logbook(n: i64) -> MemoryStore<Flight> {
    MemoryStore::new((0..n).map(|i| flight(i, 2024)).collect())
        .with_expression("year", |f: &Flight| f.year.to_string())
}

fn by_id(page_size: usize) -> ListConfig {
    ListConfig {
        page_size,
        order: Some(OrderSpec::new("id", Direction::Ascending)),
        ..Default::default()
    }
}

fn ids(rows: &[Option<Flight>]) -> Vec<Option<i64>> {
    rows.iter().map(|r| r.as_ref().map(|f| f.id)).collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn scenario_empty_table() {
    let mut model = ListModel::new(MemoryStore::<Flight>::default(), &by_id(16));

    assert_eq!(model.section_count().await.unwrap(), 0);
    assert!(model.section_titles().await.unwrap().is_empty());
    assert_eq!(model.get_item(0, 0).await.unwrap(), None);
    assert_eq!(model.get_flat(0).await.unwrap(), None);
}

#[tokio::test]
async fn scenario_sequential_forward_scroll() {
    init_tracing();
    let mut model = ListModel::new(logbook(40), &by_id(16));
    let mut windows = Vec::new();

    for i in 0..40 {
        let row = model.get_flat(i).await.unwrap();
        assert_eq!(row.map(|f| f.id), Some(i as i64));
        let range = model.window_range();
        if windows.last() != Some(&range) {
            windows.push(range);
        }
    }

    assert_eq!(windows, vec![0..32, 16..40]);
    assert_eq!(model.get_flat(40).await.unwrap(), None);
}

#[tokio::test]
async fn scenario_alias_over_three_columns() {
    init_tracing();
    let mut rows: Vec<Flight> = (0..6).map(|i| flight(i, 2024)).collect();
    rows[1].via1 = Some("KSEA".into());
    rows[3].via2 = Some("ksea".into());
    rows[5].via3 = Some("CYVR KSEA".into());
    rows[4].tail = "KSEA".into(); // tail is not behind `via`
    let mut model = ListModel::new(MemoryStore::new(rows), &by_id(16));

    assert!(model.set_search_text("via:KSEA"));
    let filter = model.filter().unwrap();
    assert_eq!(
        filter.sql.clause,
        "(via1 LIKE ? ESCAPE '\\' OR via2 LIKE ? ESCAPE '\\' OR via3 LIKE ? ESCAPE '\\')"
    );
    assert_eq!(filter.sql.params, vec![SqlParam::Text("%KSEA%".into()); 3]);

    assert_eq!(model.row_count(0).await.unwrap(), Some(3));
    let mut found = Vec::new();
    for row in 0..3 {
        found.push(model.get_item(0, row).await.unwrap());
    }
    assert_eq!(ids(&found), vec![Some(1), Some(3), Some(5)]);
}

/// Store whose section layout is scripted: three sections holding 5, 0
/// and 7 rows. A real store never reports an empty section, but the index
/// must cope if one does.
struct ScriptedStore {
    page_fetches: AtomicU64,
}

#[async_trait]
impl RecordStore<Flight> for ScriptedStore {
    async fn fetch_page(&self, _query: &StoreQuery<'_>, offset: u64, limit: u64) -> Result<Vec<Flight>, StoreError> {
        self.page_fetches.fetch_add(1, Ordering::Relaxed);
        Ok((offset..12u64.min(offset + limit))
            .map(|i| flight(i as i64, if i < 5 { 2024 } else { 2022 }))
            .collect())
    }

    async fn count(&self, _query: &StoreQuery<'_>, section: Option<SectionKey<'_>>) -> Result<u64, StoreError> {
        Ok(match section.map(|k| k.title) {
            None => 12,
            Some("2024") => 5,
            Some("2022") => 7,
            Some(_) => 0,
        })
    }

    async fn count_distinct(&self, _query: &StoreQuery<'_>, _expr: &str) -> Result<u64, StoreError> {
        Ok(3)
    }

    async fn section_titles(&self, _query: &StoreQuery<'_>, _expr: &str) -> Result<Vec<String>, StoreError> {
        Ok(vec!["2024".into(), "2023".into(), "2022".into()])
    }
}

#[tokio::test]
async fn scenario_sections_with_empty_middle() {
    let config = ListConfig {
        section_expression: Some("year".into()),
        ..by_id(16)
    };
    let store = ScriptedStore { page_fetches: AtomicU64::new(0) };
    let mut model = ListModel::new(store, &config);

    assert_eq!(model.section_count().await.unwrap(), 3);
    assert_eq!(model.row_count(0).await.unwrap(), Some(5));
    assert_eq!(model.row_count(1).await.unwrap(), Some(0));
    assert_eq!(model.row_count(2).await.unwrap(), Some(7));
    assert_eq!(model.section_title(1).await.unwrap().as_deref(), Some("2023"));

    // 5 + 0 + 3
    assert_eq!(model.get_item(2, 3).await.unwrap().map(|f| f.id), Some(8));
    assert_eq!(model.get_item(1, 0).await.unwrap(), None);
    assert_eq!(model.locate(5).await.unwrap(), Some((2, 0)));
    assert_eq!(model.locate(4).await.unwrap(), Some((0, 4)));
    assert_eq!(model.store().page_fetches.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn scenario_sections_by_year() {
    let mut rows = Vec::new();
    for i in 0..5 {
        rows.push(flight(i, 2024));
    }
    for i in 5..12 {
        rows.push(flight(i, 2022));
    }
    let store = MemoryStore::new(rows).with_expression("year", |f: &Flight| f.year.to_string());
    let config = ListConfig {
        page_size: 4,
        order: Some(OrderSpec::new("year", Direction::Descending)),
        section_expression: Some("year".into()),
        ..Default::default()
    };
    let mut model = ListModel::new(store, &config);

    assert_eq!(model.section_titles().await.unwrap(), vec!["2024", "2022"]);
    for section in 0..2 {
        let rows = model.row_count(section).await.unwrap().unwrap();
        for row in 0..rows {
            let item = model.get_item(section, row).await.unwrap().unwrap();
            let title = model.section_title(section).await.unwrap().unwrap();
            assert_eq!(item.year.to_string(), title);
        }
    }
}

// =============================================================================
// Window properties
// =============================================================================

#[tokio::test]
async fn window_containment_and_bounded_memory() {
    let mut model = ListModel::new(logbook(300), &by_id(8));
    let pattern: Vec<u64> = vec![0, 1, 17, 16, 15, 250, 249, 299, 300, 3, 120, 121, 119, 118, 64];

    for flat in pattern {
        let row = model.get_flat(flat).await.unwrap();
        let range = model.window_range();
        assert!(range.end - range.start <= 16, "window {range:?} over two pages");
        match row {
            Some(f) => {
                assert_eq!(f.id as u64, flat);
                assert!(range.contains(&flat));
            }
            None => assert!(flat >= 300),
        }
    }
}

#[tokio::test]
async fn window_forward_scroll_one_fetch_per_miss() {
    let mut model = ListModel::new(logbook(200), &by_id(16));

    for i in 0..200 {
        let before = model.store().page_fetches();
        let misses = model.window_stats().misses;
        model.get_flat(i).await.unwrap();
        let fetched = model.store().page_fetches() - before;
        let missed = model.window_stats().misses - misses;
        assert_eq!(fetched, missed, "index {i}");
        assert!(fetched <= 1);
    }
    // 0..32 prewarm, then one page per 16 rows
    assert_eq!(model.store().page_fetches(), 1 + (200 - 32 + 15) / 16);
}

#[tokio::test]
async fn window_backward_scroll_one_fetch_per_miss() {
    let mut model = ListModel::new(logbook(200), &by_id(16));

    model.get_flat(199).await.unwrap();
    assert_eq!(model.window_range(), 192..200);
    let warm = model.store().page_fetches();

    for i in (0..199).rev() {
        let before = model.store().page_fetches();
        assert_eq!(model.get_flat(i).await.unwrap().map(|f| f.id), Some(i as i64));
        assert!(model.store().page_fetches() - before <= 1);
    }
    // 192 rows below the first window, one page per step back
    assert_eq!(model.store().page_fetches() - warm, 12);
    assert_eq!(model.window_range(), 0..32);
}

#[tokio::test]
async fn window_failed_fetch_then_recovers() {
    init_tracing();
    let mut model = ListModel::new(logbook(100), &by_id(16));
    model.get_flat(0).await.unwrap();

    model.store().fail_next();
    let err = model.get_flat(32).await.unwrap_err();
    assert!(matches!(err, StoreError::Backend(_)));
    assert_eq!(model.window_range(), 0..32);

    for i in 32..48 {
        assert_eq!(model.get_flat(i).await.unwrap().map(|f| f.id), Some(i as i64));
    }
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn search_same_text_refreshes_once() {
    init_tracing();
    let mut model = ListModel::new(logbook(50), &by_id(16));

    assert!(model.set_search_text("N101"));
    let first = model.filter().cloned().unwrap();
    model.get_flat(0).await.unwrap();
    let fetches = model.store().page_fetches();

    assert!(!model.set_search_text("N101"));
    assert_eq!(model.filter().unwrap().sql, first.sql);

    // Cache survived the no-op
    model.get_flat(0).await.unwrap();
    assert_eq!(model.store().page_fetches(), fetches);
}

#[tokio::test]
async fn search_boolean_alias_and_free_text() {
    let mut rows: Vec<Flight> = (0..10).map(|i| flight(i, 2024)).collect();
    rows[2].cross_country = true;
    rows[7].cross_country = true;
    rows[9].tail = "XC-ABC".into();
    let mut model = ListModel::new(MemoryStore::new(rows), &by_id(16));

    model.set_search_text("xc");
    assert_eq!(model.row_count(0).await.unwrap(), Some(3));

    // Quoted terms never match boolean aliases
    model.set_search_text("\"xc\"");
    assert_eq!(model.row_count(0).await.unwrap(), Some(1));
    assert_eq!(model.get_flat(0).await.unwrap().map(|f| f.id), Some(9));
}

#[tokio::test]
async fn search_malformed_input_never_fails() {
    let mut model = ListModel::new(logbook(20), &by_id(16));

    for text in ["\"", "via:", ":", "nosuch:thing", "::\"", "  "] {
        model.set_search_text(text);
        model.section_count().await.unwrap();
    }
    // Unresolved alias and empty values add no constraint
    model.set_search_text("nosuch:thing");
    assert!(model.filter().is_none());
    assert_eq!(model.row_count(0).await.unwrap(), Some(20));
}

#[tokio::test]
async fn search_like_metacharacters_are_literal() {
    let mut rows: Vec<Flight> = (0..4).map(|i| flight(i, 2024)).collect();
    rows[0].tail = "N1_00".into();
    rows[1].tail = "N1X00".into();
    let mut model = ListModel::new(MemoryStore::new(rows), &by_id(16));

    model.set_search_text("tail:1_0");
    assert_eq!(
        model.filter().unwrap().sql.params,
        vec![SqlParam::Text("%1\\_0%".into())]
    );
    assert_eq!(model.row_count(0).await.unwrap(), Some(1));
}
