// Menu navigator: the finite-state controller mapping (session, action)
// to rendered replies. All navigation errors are recovered here; nothing
// propagates far enough to kill a session or the process.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{Catalog, Difficulty, Region};
use crate::geo::{self, GeoPoint};
use crate::menu::{self, text, Rendered};
use crate::metrics;
use crate::proximity;
use crate::session::{MenuState, Session};

/// A user action, parsed from a command, callback token or location
/// message. Callback grammar: `area:<region>`, `path:<region>:<location>`,
/// `difficulty:<region>:<location>:<label>`, `userLocation`, `showTrails`,
/// `mainMenu`, `userLocationMenu`, `back`, optionally prefixed with a
/// `v<revision>:` stamp.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectRegion(Region),
    SelectLocation(Region, String),
    SelectDifficulty(Region, String, Difficulty),
    RequestShareLocation,
    ShowNearby,
    MainMenu,
    LocationMenu,
    Back,
}

impl Action {
    /// Parse a callback token. Returns the action and its revision stamp
    /// when present; unstamped tokens are valid and carry no stamp.
    pub fn parse(data: &str) -> Option<(Action, Option<u64>)> {
        let (revision, token) = split_stamp(data);
        let action = match token {
            "userLocation" => Action::RequestShareLocation,
            "showTrails" => Action::ShowNearby,
            "mainMenu" => Action::MainMenu,
            "userLocationMenu" => Action::LocationMenu,
            "back" => Action::Back,
            _ => {
                if let Some(region) = token.strip_prefix("area:") {
                    Action::SelectRegion(Region::from_token(region)?)
                } else if let Some(rest) = token.strip_prefix("path:") {
                    let (region, location) = rest.split_once(':')?;
                    Action::SelectLocation(Region::from_token(region)?, location.to_string())
                } else if let Some(rest) = token.strip_prefix("difficulty:") {
                    let mut parts = rest.splitn(3, ':');
                    let region = Region::from_token(parts.next()?)?;
                    let location = parts.next()?.to_string();
                    let difficulty = Difficulty::from_label(parts.next()?)?;
                    Action::SelectDifficulty(region, location, difficulty)
                } else {
                    return None;
                }
            }
        };
        Some((action, revision))
    }
}

/// Split an optional `v<digits>:` revision stamp off a callback token.
fn split_stamp(data: &str) -> (Option<u64>, &str) {
    if let Some(rest) = data.strip_prefix('v') {
        if let Some((digits, token)) = rest.split_once(':') {
            if let Ok(revision) = digits.parse::<u64>() {
                return (Some(revision), token);
            }
        }
    }
    (None, data)
}

/// What the transport layer should do in response to one action.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Send a fresh message.
    Send(Rendered),
    /// Edit the message the button was pressed on.
    Edit(Rendered),
    /// Prompt the client to share a location via a one-time reply keyboard.
    RequestLocation { prompt: String, button: String },
    /// Send a message that removes the reply keyboard.
    ClearReplyKeyboard { message: String },
    /// Answer the callback query; None acknowledges silently.
    Answer(Option<String>),
}

#[derive(Debug, Error, PartialEq)]
pub enum NavError {
    #[error("unknown location `{location}` in region {region:?}")]
    UnknownLocation { region: Region, location: String },
    #[error("no trails at {difficulty:?} for `{location}` in {region:?}")]
    EmptyBucket {
        region: Region,
        location: String,
        difficulty: Difficulty,
    },
}

impl NavError {
    fn metric_kind(&self) -> &'static str {
        match self {
            NavError::UnknownLocation { .. } => "unknown_location",
            NavError::EmptyBucket { .. } => "empty_bucket",
        }
    }
}

/// The state machine. Holds the read-only catalog and the search radius;
/// all mutable state lives in the session passed to each call.
pub struct Navigator<'a> {
    catalog: &'a Catalog,
    radius_m: f64,
}

impl<'a> Navigator<'a> {
    pub fn new(catalog: &'a Catalog, radius_m: f64) -> Navigator<'a> {
        Navigator { catalog, radius_m }
    }

    /// `/start`: back to a fresh main menu. Clears navigation but keeps
    /// the stored location.
    pub fn start(&self, session: &mut Session) -> Vec<Reply> {
        session.reset_to(MenuState::Main);
        let revision = session.next_revision();
        vec![
            Reply::Send(Rendered::text_only(text::WELCOME)),
            Reply::Send(menu::main_menu(
                text::CHOOSE_OPTION,
                session.has_shared_location,
                revision,
            )),
        ]
    }

    /// A location message arrived: store it, project it once, and show
    /// the location menu.
    pub fn location_shared(&self, session: &mut Session, point: GeoPoint) -> Vec<Reply> {
        let projected = geo::wgs84_to_itm(point);
        debug!(
            latitude = point.latitude,
            longitude = point.longitude,
            easting = projected.easting,
            northing = projected.northing,
            "location shared"
        );
        session.shared_location = Some(point);
        session.projected_location = Some(projected);
        session.has_shared_location = true;
        session.reset_to(MenuState::UserLocationMenu);
        let revision = session.next_revision();
        vec![
            Reply::ClearReplyKeyboard {
                message: text::LOCATION_RECEIVED.to_string(),
            },
            Reply::Send(menu::location_menu(projected, revision)),
        ]
    }

    /// A button press arrived. Debounce, check the revision stamp, then
    /// apply the action. Always answers the callback.
    pub fn callback(&self, session: &mut Session, data: &str, now: Instant) -> Vec<Reply> {
        if !session.accept_action(now) {
            metrics::ACTIONS_DEBOUNCED_TOTAL.inc();
            debug!(data, "debounced button press");
            return vec![Reply::Answer(None)];
        }

        let Some((action, stamp)) = Action::parse(data) else {
            warn!(data, "unparseable callback token");
            return vec![Reply::Answer(None)];
        };

        if let Some(stamp) = stamp {
            if stamp != session.revision {
                metrics::MENUS_EXPIRED_TOTAL.inc();
                debug!(stamp, current = session.revision, "stale menu revision");
                return vec![Reply::Answer(Some(text::MENU_EXPIRED.to_string()))];
            }
        }

        match self.apply(session, action) {
            Ok(mut replies) => {
                replies.insert(0, Reply::Answer(None));
                replies
            }
            Err(err) => {
                metrics::NAV_ERRORS_TOTAL
                    .with_label_values(&[err.metric_kind()])
                    .inc();
                warn!(error = %err, "recovered navigation error");
                vec![Reply::Answer(None), Reply::Edit(self.recover(session, &err))]
            }
        }
    }

    fn apply(&self, session: &mut Session, action: Action) -> Result<Vec<Reply>, NavError> {
        match action {
            Action::SelectRegion(region) => {
                session.truncate_to_root();
                session.push(MenuState::RegionSubmenu(region));
                let revision = session.next_revision();
                Ok(vec![Reply::Edit(menu::region_submenu(
                    region,
                    self.catalog.region(region),
                    revision,
                ))])
            }
            Action::SelectLocation(region, location) => {
                let found = self.catalog.region(region).location(&location).ok_or(
                    NavError::UnknownLocation {
                        region,
                        location: location.clone(),
                    },
                )?;
                // Rebuild the drill-down chain so "back" lands on the
                // region submenu even after a stale press.
                session.truncate_to_root();
                session.push(MenuState::RegionSubmenu(region));
                session.push(MenuState::DifficultySubmenu(region, location.clone()));
                let revision = session.next_revision();
                Ok(vec![Reply::Edit(menu::difficulty_submenu(
                    region, found, revision,
                ))])
            }
            Action::SelectDifficulty(region, location, difficulty) => {
                let found = self.catalog.region(region).location(&location).ok_or(
                    NavError::UnknownLocation {
                        region,
                        location: location.clone(),
                    },
                )?;
                let bucket = found.bucket(difficulty);
                if bucket.is_empty() {
                    return Err(NavError::EmptyBucket {
                        region,
                        location,
                        difficulty,
                    });
                }
                // Terminal rendering: a fresh message, no stack change.
                Ok(vec![Reply::Send(menu::trail_list(difficulty, bucket))])
            }
            Action::RequestShareLocation => Ok(vec![Reply::RequestLocation {
                prompt: text::SHARE_LOCATION_PROMPT.to_string(),
                button: text::SHARE_LOCATION_KEYBOARD_BUTTON.to_string(),
            }]),
            Action::ShowNearby => {
                let Some(origin) = session.projected_location else {
                    // Not an error: a user-visible prompt to share first.
                    let revision = session.next_revision();
                    return Ok(vec![Reply::Edit(menu::no_location(revision))]);
                };
                metrics::NEARBY_SEARCHES_TOTAL.inc();
                let found = proximity::find_nearby(self.catalog, origin, self.radius_m);
                if *session.current() != MenuState::NearbyResults {
                    session.push(MenuState::NearbyResults);
                }
                let revision = session.next_revision();
                Ok(vec![Reply::Edit(menu::nearby_results(&found, revision))])
            }
            Action::MainMenu => {
                session.reset_to(MenuState::Main);
                let revision = session.next_revision();
                Ok(vec![Reply::Edit(menu::main_menu(
                    text::CHOOSE_OPTION,
                    session.has_shared_location,
                    revision,
                ))])
            }
            Action::LocationMenu => {
                if session.projected_location.is_some() {
                    session.reset_to(MenuState::UserLocationMenu);
                } else {
                    session.reset_to(MenuState::Main);
                }
                let revision = session.next_revision();
                self.render_current(session, revision).map(|r| vec![Reply::Edit(r)])
            }
            Action::Back => {
                session.pop();
                let revision = session.next_revision();
                self.render_current(session, revision).map(|r| vec![Reply::Edit(r)])
            }
        }
    }

    /// Render the session's current menu state.
    fn render_current(&self, session: &Session, revision: u64) -> Result<Rendered, NavError> {
        match session.current() {
            MenuState::Main => Ok(menu::main_menu(
                text::CHOOSE_AREA,
                session.has_shared_location,
                revision,
            )),
            MenuState::UserLocationMenu => match session.projected_location {
                Some(position) => Ok(menu::location_menu(position, revision)),
                None => Ok(menu::main_menu(
                    text::CHOOSE_AREA,
                    session.has_shared_location,
                    revision,
                )),
            },
            MenuState::RegionSubmenu(region) => Ok(menu::region_submenu(
                *region,
                self.catalog.region(*region),
                revision,
            )),
            MenuState::DifficultySubmenu(region, location) => {
                let found = self.catalog.region(*region).location(location).ok_or_else(|| {
                    NavError::UnknownLocation {
                        region: *region,
                        location: location.clone(),
                    }
                })?;
                Ok(menu::difficulty_submenu(*region, found, revision))
            }
            MenuState::NearbyResults => match session.projected_location {
                Some(origin) => {
                    let found = proximity::find_nearby(self.catalog, origin, self.radius_m);
                    Ok(menu::nearby_results(&found, revision))
                }
                None => Ok(menu::no_location(revision)),
            },
        }
    }

    /// Recovery rendering per error class: unknown references fall back
    /// to the main menu, an empty bucket re-renders the current menu.
    fn recover(&self, session: &mut Session, err: &NavError) -> Rendered {
        match err {
            NavError::UnknownLocation { .. } => {
                session.reset_to(MenuState::Main);
                let revision = session.next_revision();
                menu::main_menu(text::CHOOSE_OPTION, session.has_shared_location, revision)
            }
            NavError::EmptyBucket { .. } => {
                let revision = session.next_revision();
                self.render_current(session, revision).unwrap_or_else(|_| {
                    menu::main_menu(text::CHOOSE_OPTION, session.has_shared_location, revision)
                })
            }
        }
    }
}
