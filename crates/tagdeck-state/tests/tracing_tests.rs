#![forbid(unsafe_code)]

//! Diagnostic log points of the state engine.
//!
//! Self-healing paths stay silent to the user but must leave a trace:
//! reorder reconciliation warns, stale drag aborts and deferred replays
//! log at debug, and dataset loads log their counts.

use std::sync::{Arc, Mutex};

use serde_json::json;
use tagdeck_core::{ItemId, Point};
use tagdeck_state::{Dataset, EditorConfig, EditorState, SelectionStore, StackedLayout};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    message: String,
    fields: Vec<(String, String)>,
}

impl CapturedEvent {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name().to_string(), format!("{value:?}")));
        }
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor {
            message: String::new(),
            fields: Vec::new(),
        };
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

fn with_captured_events<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCapture {
        events: events.clone(),
    });
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn loaded(selected: &[&str]) -> EditorState {
    let mut editor = EditorState::create(EditorConfig::default());
    editor.load_dataset(Dataset {
        available: vec![
            json!({ "name": "A", "vendor": "Acme" }),
            json!({ "name": "B", "vendor": "Acme" }),
            json!({ "name": "A", "vendor": "Dup" }),
        ],
        selected: selected.iter().map(|s| (*s).to_string()).collect(),
    });
    editor
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn reorder_reconciliation_warns_with_counts() {
    let events = with_captured_events(|| {
        let mut store = SelectionStore::from_order([ItemId::new("A"), ItemId::new("B")]);
        store.reorder(&[ItemId::new("B"), ItemId::new("Z")]);
    });
    let warn = events
        .iter()
        .find(|e| e.level == Level::WARN)
        .expect("reconciliation warning");
    assert_eq!(warn.field("reincluded"), Some("1"));
    assert_eq!(warn.field("ignored"), Some("1"));
}

#[test]
fn permutation_reorder_is_silent() {
    let events = with_captured_events(|| {
        let mut store = SelectionStore::from_order([ItemId::new("A"), ItemId::new("B")]);
        store.reorder(&[ItemId::new("B"), ItemId::new("A")]);
    });
    assert!(events.iter().all(|e| e.level != Level::WARN));
}

#[test]
fn dataset_load_logs_counts() {
    let events = with_captured_events(|| {
        loaded(&["A", "Feed"]);
    });
    let load = events
        .iter()
        .find(|e| e.level == Level::INFO && e.message.contains("dataset loaded"))
        .expect("load event");
    assert_eq!(load.field("items"), Some("3"));
    assert_eq!(load.field("duplicate_names"), Some("1"));
    assert_eq!(load.field("external"), Some("1"));
}

#[test]
fn stale_drag_abort_logs_origin() {
    let mut editor = loaded(&["A", "B"]);
    let events = with_captured_events(|| {
        let probe = StackedLayout::new(
            [(ItemId::new("A"), "A"), (ItemId::new("B"), "B")],
            0.0,
            20.0,
        );
        editor.pointer_down(0, Point::new(0.0, 5.0), &probe).unwrap();
        let swapped = StackedLayout::new(
            [(ItemId::new("B"), "B"), (ItemId::new("A"), "A")],
            0.0,
            20.0,
        );
        editor.pointer_move(Point::new(0.0, 35.0), &swapped);
    });
    let abort = events
        .iter()
        .find(|e| e.message.contains("no longer matches"))
        .expect("stale abort event");
    assert_eq!(abort.level, Level::DEBUG);
    assert_eq!(abort.field("origin_index"), Some("0"));
    assert_eq!(abort.field("dragged"), Some("A"));
}
