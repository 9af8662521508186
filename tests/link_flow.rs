use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use tinylink::{
    clock::{Clock, ManualClock},
    stats::{LinkStatus, StatsSummary},
    validate::{is_valid_shortcode, is_valid_url},
    ClickTracker, Field, JsonFileStore, LinkService, NewLink, RecordStore, RedirectResolver,
    Resolution, ValidationError, Visit,
};

struct App {
    _dir: tempfile::TempDir,
    store: Arc<dyn RecordStore>,
    clock: ManualClock,
    links: LinkService,
    resolver: RedirectResolver,
    tracker: ClickTracker,
}

fn app() -> App {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn RecordStore> =
        Arc::new(JsonFileStore::new(dir.path().join("shortened_urls.json")));
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap());

    App {
        links: LinkService::new(store.clone(), "https://sho.rt")
            .with_clock(Arc::new(clock.clone())),
        resolver: RedirectResolver::new(store.clone()).with_clock(Arc::new(clock.clone())),
        tracker: ClickTracker::new(store.clone()).with_clock(Arc::new(clock.clone())),
        store,
        clock,
        _dir: dir,
    }
}

fn visitor() -> Visit {
    Visit::new("https://sho.rt/page", "Mozilla/5.0 (X11; Linux x86_64) Firefox/120.0")
}

#[test]
fn generated_codes_are_fresh_six_char_alphanumerics() {
    let app = app();
    for i in 0..25 {
        let before = app.store.load().unwrap();
        let record = app
            .links
            .create(NewLink::new(format!("https://example.com/{i}")))
            .unwrap();

        assert_eq!(record.shortcode.len(), 6);
        assert!(is_valid_shortcode(&record.shortcode));
        assert!(before.iter().all(|r| r.shortcode != record.shortcode));
    }
    assert_eq!(app.store.load().unwrap().len(), 25);
}

#[test]
fn collision_with_existing_custom_code() {
    let app = app();
    app.links
        .create(NewLink::new("https://example.com/first").with_code("abc123"))
        .unwrap();

    let err = app
        .links
        .create(NewLink::new("https://example.com/second").with_code("abc123"))
        .unwrap_err();

    assert_eq!(err.field(), Field::Shortcode);
    assert!(matches!(err, ValidationError::ShortcodeTaken(_)));
    assert_eq!(app.store.load().unwrap().len(), 1);
}

#[test]
fn invalid_validity_leaves_file_unchanged() {
    let app = app();
    app.links.create(NewLink::new("https://example.com")).unwrap();
    let before = app.store.load().unwrap();

    for minutes in [0, 10_081] {
        let err = app
            .links
            .create(NewLink::new("https://example.com/x").with_validity(minutes))
            .unwrap_err();
        assert_eq!(err.field(), Field::Validity);
    }

    assert_eq!(app.store.load().unwrap(), before);
}

#[test]
fn expiry_boundary_for_one_minute_link() {
    let app = app();
    app.links
        .create(
            NewLink::new("https://example.com/soon")
                .with_code("short1")
                .with_validity(1),
        )
        .unwrap();

    app.clock.advance(Duration::seconds(30));
    assert!(matches!(
        app.resolver.resolve("short1", &visitor()),
        Resolution::Found { .. }
    ));

    app.clock.advance(Duration::seconds(31));
    assert_eq!(
        app.resolver.resolve("short1", &visitor()),
        Resolution::Expired {
            long_url: "https://example.com/soon".into()
        }
    );
}

#[test]
fn reads_without_writes_are_equal() {
    let app = app();
    app.links.create(NewLink::new("https://example.com/a")).unwrap();
    app.links.create(NewLink::new("https://example.com/b")).unwrap();

    assert_eq!(app.store.load().unwrap(), app.store.load().unwrap());
}

#[test]
fn tracking_twice_counts_two_in_order() {
    let app = app();
    app.links
        .create(NewLink::new("https://example.com").with_code("clicky"))
        .unwrap();

    app.tracker.track("clicky", &Visit::new("first-source", "ua-1"));
    app.clock.advance(Duration::milliseconds(250));
    app.tracker.track("clicky", &Visit::new("second-source", "ua-2"));

    let record = app.links.get("clicky").unwrap();
    assert_eq!(record.clicks, 2);
    let sources: Vec<_> = record.click_details.iter().map(|c| c.source.as_str()).collect();
    assert_eq!(sources, ["first-source", "second-source"]);
    assert_eq!(record.click_details[1].timestamp, app.clock.now());
}

#[test]
fn resolve_then_stats() {
    let app = app();
    app.links
        .create(NewLink::new("https://example.com/live").with_code("live1"))
        .unwrap();
    app.links
        .create(
            NewLink::new("https://example.com/old")
                .with_code("old1")
                .with_validity(1),
        )
        .unwrap();

    app.clock.advance(Duration::minutes(5));
    assert_eq!(
        app.resolver.resolve("live1", &visitor()).destination(),
        Some("https://example.com/live")
    );
    assert!(matches!(
        app.resolver.resolve("gone", &visitor()),
        Resolution::NotFound { .. }
    ));

    let summary = StatsSummary::collect(app.links.list(), app.clock.now());
    assert_eq!(summary.total_links, 2);
    assert_eq!(summary.active_links, 1);
    assert_eq!(summary.total_clicks, 1);
    assert_eq!(summary.rows[1].status, LinkStatus::Expired);
}

#[test]
fn url_checks_match_examples() {
    assert!(is_valid_url("ftp://x"));
    assert!(!is_valid_url("not a url"));
    assert!(!is_valid_shortcode("ab-12"));
    assert!(is_valid_shortcode("ab12"));
}
