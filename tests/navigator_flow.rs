// Integration tests for the menu state machine: drill-down flows, back
// navigation, nearby search, debounce and menu expiry.

use std::time::{Duration, Instant};

use trailbot::catalog::Catalog;
use trailbot::geo::{self, GeoPoint, PlanarPoint};
use trailbot::menu::{text, Button, ButtonKind, Rendered};
use trailbot::navigator::{Navigator, Reply};
use trailbot::session::Session;

fn test_catalog() -> Catalog {
    Catalog::from_json(
        r#"{"areas": {
            "center": {"locations": {
                "Ben Shemen": {
                    "easy": [{"trail_name": "Forest Loop",
                              "location_link": "https://example.com/forest"}],
                    "medium": [{"trail_name": "Single Track",
                                "location_link": "https://example.com/single"}]
                }
            }},
            "south": {"locations": {
                "Crater Trail": {
                    "easy": [{"trail_name": "Sunset Loop",
                              "location_link": "https://example.com/sunset",
                              "location_easting": 182000,
                              "location_northing": 636000}]
                }
            }},
            "north": {"locations": {}}
        }}"#,
    )
    .unwrap()
}

/// Drives callbacks with an artificial clock so the debounce never
/// rejects scripted presses.
struct Driver {
    session: Session,
    now: Instant,
}

impl Driver {
    fn new() -> Driver {
        Driver {
            session: Session::new(),
            now: Instant::now(),
        }
    }

    fn press(&mut self, navigator: &Navigator, token: &str) -> Vec<Reply> {
        self.now += Duration::from_secs(1);
        navigator.callback(&mut self.session, token, self.now)
    }
}

fn edited(replies: &[Reply]) -> &Rendered {
    replies
        .iter()
        .find_map(|r| match r {
            Reply::Edit(rendered) => Some(rendered),
            _ => None,
        })
        .expect("no edit reply")
}

fn sent(replies: &[Reply]) -> &Rendered {
    replies
        .iter()
        .find_map(|r| match r {
            Reply::Send(rendered) => Some(rendered),
            _ => None,
        })
        .expect("no send reply")
}

fn callback_rows(rendered: &Rendered) -> Vec<&Button> {
    rendered.buttons.iter().map(|row| &row[0]).collect()
}

#[test]
fn start_sends_welcome_and_main_menu() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut session = Session::new();

    let replies = navigator.start(&mut session);
    assert_eq!(replies.len(), 2);
    let Reply::Send(welcome) = &replies[0] else {
        panic!("expected welcome message");
    };
    assert!(welcome.text.contains("ברוך הבא"));
    let Reply::Send(main) = &replies[1] else {
        panic!("expected main menu");
    };
    // Without a shared location the main menu offers the share button.
    let last = &main.buttons.last().unwrap()[0];
    assert_eq!(last.label, text::SHARE_LOCATION_BUTTON);
}

#[test]
fn drill_down_renders_exact_trail_button() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    driver.press(&navigator, "area:2");
    driver.press(&navigator, "path:2:Crater Trail");
    let replies = driver.press(&navigator, "difficulty:2:Crater Trail:✊ קל");

    let list = sent(&replies);
    assert_eq!(list.buttons.len(), 1);
    assert_eq!(list.buttons[0][0].label, "Sunset Loop");
    assert_eq!(
        list.buttons[0][0].kind,
        ButtonKind::Url("https://example.com/sunset".to_string())
    );
}

#[test]
fn difficulty_menu_offers_only_nonempty_levels() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    driver.press(&navigator, "area:1");
    let replies = driver.press(&navigator, "path:1:Ben Shemen");
    let rendered = edited(&replies);

    let labels: Vec<&str> = callback_rows(rendered)
        .iter()
        .map(|b| b.label.as_str())
        .collect();
    assert_eq!(labels, vec!["✊ קל", "💪 בינוני", text::BACK_BUTTON]);
}

#[test]
fn back_retraces_the_drill_down() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    driver.press(&navigator, "area:1");
    driver.press(&navigator, "path:1:Ben Shemen");

    // Back lands on the region submenu.
    let replies = driver.press(&navigator, "back");
    assert_eq!(edited(&replies).text, text::CHOOSE_LOCATION);

    // Another back lands on the main menu.
    let replies = driver.press(&navigator, "back");
    assert_eq!(edited(&replies).text, text::CHOOSE_AREA);

    // Back on the root stays on the root.
    let replies = driver.press(&navigator, "back");
    assert_eq!(edited(&replies).text, text::CHOOSE_AREA);
}

#[test]
fn reselecting_location_gives_same_difficulty_set() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    driver.press(&navigator, "area:1");
    let first = driver.press(&navigator, "path:1:Ben Shemen");
    let first_labels: Vec<String> = callback_rows(edited(&first))
        .iter()
        .map(|b| b.label.clone())
        .collect();

    driver.press(&navigator, "back");
    let second = driver.press(&navigator, "path:1:Ben Shemen");
    let second_labels: Vec<String> = callback_rows(edited(&second))
        .iter()
        .map(|b| b.label.clone())
        .collect();

    assert_eq!(first_labels, second_labels);
}

#[test]
fn nearby_without_location_prompts_to_share() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    let replies = driver.press(&navigator, "showTrails");
    assert_eq!(edited(&replies).text, text::NO_LOCATION);
}

#[test]
fn nearby_finds_trails_within_radius() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    // ~2236 m from the Sunset Loop trail at (182000, 636000).
    driver.session.projected_location = Some(PlanarPoint {
        easting: 180_000.0,
        northing: 635_000.0,
    });
    driver.session.has_shared_location = true;

    let replies = driver.press(&navigator, "showTrails");
    let rendered = edited(&replies);
    assert_eq!(rendered.text, text::NEARBY_HEADER);
    assert_eq!(rendered.buttons[0][0].label, "Sunset Loop");
    // Trail rows plus the back row.
    assert_eq!(rendered.buttons.len(), 2);
}

#[test]
fn nearby_far_away_reports_none_found() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    driver.session.projected_location = Some(PlanarPoint {
        easting: 220_000.0,
        northing: 700_000.0,
    });
    driver.session.has_shared_location = true;

    let replies = driver.press(&navigator, "showTrails");
    assert_eq!(edited(&replies).text, text::NO_TRAILS_NEARBY);
}

#[test]
fn location_share_enables_nearby_and_survives_start() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut session = Session::new();

    let point = GeoPoint {
        latitude: 31.5,
        longitude: 34.8,
    };
    let replies = navigator.location_shared(&mut session, point);
    assert!(matches!(replies[0], Reply::ClearReplyKeyboard { .. }));
    assert!(session.has_shared_location);
    assert_eq!(
        session.projected_location.unwrap(),
        geo::wgs84_to_itm(point)
    );

    // /start resets navigation but keeps the location.
    let replies = navigator.start(&mut session);
    assert!(session.has_shared_location);
    let Reply::Send(main) = &replies[1] else {
        panic!("expected main menu");
    };
    let last = &main.buttons.last().unwrap()[0];
    assert_eq!(last.label, text::SHOW_TRAILS_BUTTON);
}

#[test]
fn shared_location_projection_round_trip_finds_adjacent_trail() {
    // Build a catalog whose trail sits exactly at the projection of the
    // shared coordinate; the search must find it at distance zero.
    let point = GeoPoint {
        latitude: 31.78,
        longitude: 35.20,
    };
    let projected = geo::wgs84_to_itm(point);
    let json = format!(
        r#"{{"areas": {{
            "center": {{"locations": {{"Here": {{"easy": [
                {{"trail_name": "Adjacent", "location_link": "https://x",
                  "location_easting": {:.3}, "location_northing": {:.3}}}
            ]}}}}}},
            "south": {{"locations": {{}}}},
            "north": {{"locations": {{}}}}
        }}}}"#,
        projected.easting, projected.northing
    );
    let catalog = Catalog::from_json(&json).unwrap();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    navigator.location_shared(&mut driver.session, point);
    let replies = driver.press(&navigator, "showTrails");
    assert_eq!(edited(&replies).buttons[0][0].label, "Adjacent");
}

#[test]
fn back_from_nearby_returns_to_location_menu() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    navigator.location_shared(
        &mut driver.session,
        GeoPoint {
            latitude: 31.5,
            longitude: 34.8,
        },
    );
    driver.press(&navigator, "showTrails");
    let replies = driver.press(&navigator, "back");
    // Location menu re-derived from the stored location.
    assert!(edited(&replies).text.contains("מיקום שלך"));
}

#[test]
fn debounce_swallows_rapid_presses() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut session = Session::new();
    let t0 = Instant::now();

    let first = navigator.callback(&mut session, "area:1", t0);
    assert!(first.len() > 1);

    let second = navigator.callback(&mut session, "area:1", t0 + Duration::from_millis(100));
    assert_eq!(second, vec![Reply::Answer(None)]);
}

#[test]
fn stale_revision_reports_menu_expired() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    driver.press(&navigator, "area:1");
    let current = driver.session.revision;

    let replies = driver.press(&navigator, &format!("v{}:back", current - 1));
    assert_eq!(
        replies,
        vec![Reply::Answer(Some(text::MENU_EXPIRED.to_string()))]
    );

    // The stamp from the live menu is accepted.
    let replies = driver.press(&navigator, &format!("v{}:back", current));
    assert_eq!(edited(&replies).text, text::CHOOSE_AREA);
}

#[test]
fn empty_bucket_press_is_a_no_op_rerender() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    driver.press(&navigator, "area:2");
    driver.press(&navigator, "path:2:Crater Trail");
    // "hard" is never rendered for Crater Trail; a forged press must not
    // crash and must re-render the current menu.
    let replies = driver.press(&navigator, "difficulty:2:Crater Trail:👊 קשה");
    assert_eq!(edited(&replies).text, text::CHOOSE_DIFFICULTY);
}

#[test]
fn unknown_location_falls_back_to_main_menu() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    driver.press(&navigator, "area:2");
    let replies = driver.press(&navigator, "path:2:No Such Place");
    assert_eq!(edited(&replies).text, text::CHOOSE_OPTION);
}

#[test]
fn main_menu_action_resets_navigation() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    driver.press(&navigator, "area:1");
    driver.press(&navigator, "path:1:Ben Shemen");
    let replies = driver.press(&navigator, "mainMenu");
    assert_eq!(edited(&replies).text, text::CHOOSE_OPTION);
    assert_eq!(driver.session.depth(), 1);
}

#[test]
fn share_location_request_renders_reply_keyboard_prompt() {
    let catalog = test_catalog();
    let navigator = Navigator::new(&catalog, 10_000.0);
    let mut driver = Driver::new();

    let replies = driver.press(&navigator, "userLocation");
    assert!(replies.iter().any(|r| matches!(
        r,
        Reply::RequestLocation { prompt, .. } if prompt == text::SHARE_LOCATION_PROMPT
    )));
}
