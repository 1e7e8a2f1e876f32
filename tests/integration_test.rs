mod common;

use common::{key, key_with, new_app, render, run_event, FakeBackend, FLOWS_CSV};
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use flowdash::query_form::FormField;
use flowdash::{AppEvent, Focus, ViewState};
use std::sync::Arc;

const FRAGMENT: &str = "breakdown=src_asn&topFlows=5&src_asn=3320";

fn backend() -> Arc<FakeBackend> {
    Arc::new(FakeBackend::new(FLOWS_CSV).with_dict("src_asn", &["3320", "65000", "174"]))
}

#[test]
fn empty_location_stays_idle_without_querying() {
    let backend = backend();
    let (mut app, rx) = new_app(backend.clone());
    let start = app.start("");
    run_event(&mut app, &rx, start);

    assert_eq!(app.view, ViewState::Idle);
    assert!(backend.queries().is_empty());
    assert!(app.form.filters.is_empty());
    let screen = render(&mut app, 120, 40);
    assert!(screen.contains("Submit a query to see flows"));
    assert!(screen.contains("(no query)"));
}

#[test]
fn start_with_fragment_loads_form_and_chart() {
    let backend = backend();
    let (mut app, rx) = new_app(backend.clone());
    let start = app.start(&format!("http://flows.example/#{}", FRAGMENT));
    run_event(&mut app, &rx, start);

    assert_eq!(backend.queries(), vec![FRAGMENT.to_string()]);
    let table = app.table().expect("table");
    // the all-zero 10:01 bucket is dropped
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.series_count(), 3);
    assert_eq!(app.visibility.visible, vec![true, true, true]);

    assert_eq!(app.form.breakdown, vec!["src_asn"]);
    assert_eq!(app.form.top_flows, "5");
    let rows = app.form.filters.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].field, "src_asn");
    assert_eq!(rows[0].value, "3320");
    assert_eq!(rows[0].suggestions, vec!["3320", "65000", "174"]);
}

#[test]
fn submit_navigates_and_refetches() {
    let backend = backend();
    let (mut app, rx) = new_app(backend.clone());
    let start = app.start(FRAGMENT);
    run_event(&mut app, &rx, start);

    // focus wraps from the first field to Submit
    assert_eq!(app.form.focus, FormField::TimeStart);
    run_event(&mut app, &rx, key(KeyCode::Up));
    assert_eq!(app.form.focus, FormField::Submit);
    run_event(&mut app, &rx, key(KeyCode::Enter));

    assert_eq!(app.location.position(), (2, 2));
    let queries = backend.queries();
    assert_eq!(queries.len(), 2);
    assert!(queries[1].contains("time_start="));
    assert!(queries[1].contains("src_asn=3320"));
    assert!(app.table().is_some());
}

#[test]
fn invalid_top_flows_blocks_navigation() {
    let backend = backend();
    let (mut app, rx) = new_app(backend.clone());
    let start = app.start(FRAGMENT);
    run_event(&mut app, &rx, start);

    app.form.top_flows = "0".to_string();
    app.form.set_focus(FormField::Submit);
    run_event(&mut app, &rx, key(KeyCode::Enter));

    assert_eq!(app.location.position(), (1, 1));
    assert_eq!(backend.queries().len(), 1);
    assert!(app.form.error.is_some());
    assert_eq!(app.form.top_flows, "0");
}

#[test]
fn legend_keys_isolate_and_toggle() {
    let (mut app, rx) = new_app(backend());
    let start = app.start(FRAGMENT);
    run_event(&mut app, &rx, start);

    run_event(&mut app, &rx, key(KeyCode::Tab));
    assert_eq!(app.focus, Focus::Legend);
    // label order: AS174, AS3320, AS65000
    assert_eq!(app.legend_order(), vec![2, 0, 1]);

    run_event(&mut app, &rx, key(KeyCode::Enter));
    assert_eq!(app.visibility.visible, vec![false, false, true]);

    run_event(&mut app, &rx, key(KeyCode::Down));
    run_event(&mut app, &rx, key(KeyCode::Char(' ')));
    assert_eq!(app.visibility.visible, vec![true, false, true]);

    // sort by max, descending first
    run_event(&mut app, &rx, key(KeyCode::Char('m')));
    assert_eq!(app.legend_order(), vec![0, 1, 2]);
}

#[test]
fn stale_result_is_ignored() {
    let backend = Arc::new(
        FakeBackend::new(FLOWS_CSV).with_body("topFlows=1", "t,only\nb1,5\n"),
    );
    let (mut app, rx) = new_app(backend);
    let start = app.start(FRAGMENT);
    run_event(&mut app, &rx, start);
    run_event(&mut app, &rx, AppEvent::HashChanged("topFlows=1".to_string()));
    assert_eq!(app.table().map(|t| t.series_count()), Some(1));

    run_event(
        &mut app,
        &rx,
        AppEvent::QueryResult {
            seq: 1,
            result: Ok(FLOWS_CSV.to_string()),
        },
    );
    assert_eq!(app.table().map(|t| t.series_count()), Some(1));
}

#[test]
fn backend_error_body_is_shown() {
    let backend = Arc::new(
        FakeBackend::new(FLOWS_CSV).with_error("topFlows=99999", "topFlows out of range"),
    );
    let (mut app, rx) = new_app(backend);
    let start = app.start("topFlows=99999");
    run_event(&mut app, &rx, start);

    assert_eq!(
        app.view,
        ViewState::Failed("topFlows out of range".to_string())
    );
    assert!(render(&mut app, 120, 40).contains("topFlows out of range"));
}

#[test]
fn hidden_series_render_placeholder() {
    let (mut app, rx) = new_app(backend());
    let start = app.start(FRAGMENT);
    run_event(&mut app, &rx, start);

    app.visibility.visible = vec![false; 3];
    let screen = render(&mut app, 120, 40);
    assert!(screen.contains("No series selected"));
    // legend is still there to bring series back
    assert!(screen.contains("AS65000"));
}

#[test]
fn all_zero_response_is_no_data() {
    let backend = Arc::new(FakeBackend::new("t,a\nt1,0\nt2,0\n"));
    let (mut app, rx) = new_app(backend);
    let start = app.start("topFlows=3");
    run_event(&mut app, &rx, start);

    assert!(render(&mut app, 120, 40).contains("No data found"));
}

#[test]
fn clicking_legend_row_isolates_series() {
    let (mut app, rx) = new_app(backend());
    let start = app.start(FRAGMENT);
    run_event(&mut app, &rx, start);
    render(&mut app, 120, 40);

    // legend box is rows 33..39: border, header, then one row per series
    let click = AppEvent::Mouse(MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column: 60,
        row: 35,
        modifiers: KeyModifiers::NONE,
    });
    run_event(&mut app, &rx, click);

    assert_eq!(app.focus, Focus::Legend);
    assert_eq!(app.visibility.visible, vec![false, false, true]);
}

#[test]
fn history_back_refetches_previous_fragment() {
    let backend = backend();
    let (mut app, rx) = new_app(backend.clone());
    let start = app.start(FRAGMENT);
    run_event(&mut app, &rx, start);
    app.form.set_focus(FormField::Submit);
    run_event(&mut app, &rx, key(KeyCode::Enter));
    assert_eq!(app.location.position(), (2, 2));

    run_event(&mut app, &rx, key_with(KeyCode::Left, KeyModifiers::ALT));
    assert_eq!(app.location.position(), (1, 2));
    assert_eq!(app.location.current(), FRAGMENT);
    let queries = backend.queries();
    assert_eq!(queries.len(), 3);
    assert_eq!(queries[2], FRAGMENT);
}

#[test]
fn export_refuses_empty_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flows.png");
    let config = flowdash::AppConfig::default();

    let backend = FakeBackend::new("t,a\nt1,0\n");
    let err = flowdash::export_chart(&backend, "topFlows=3", &path, &config).unwrap_err();
    assert_eq!(err.to_string(), "No data found");
    assert_eq!(backend.queries(), vec!["topFlows=3".to_string()]);

    let err = flowdash::export_chart(&backend, "", &path, &config).unwrap_err();
    assert!(err.to_string().contains("no query"));
    assert_eq!(backend.queries().len(), 1);
    assert!(!path.exists());
}
