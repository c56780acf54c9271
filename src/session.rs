// Per-user session state: navigation stack, shared location, debounce
// timestamp and menu revision. Sessions are created lazily on first
// interaction and evicted after long inactivity by a background sweep.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::catalog::Region;
use crate::geo::{GeoPoint, PlanarPoint};
use crate::metrics;

/// Minimum interval between accepted actions for one session.
pub const MIN_ACTION_INTERVAL: Duration = Duration::from_millis(500);

/// Maximum navigation stack depth. Deeper pushes drop the oldest
/// non-root entry.
pub const MAX_NAV_DEPTH: usize = 8;

/// Sessions idle longer than this are evicted.
pub const IDLE_EVICTION: Duration = Duration::from_secs(24 * 60 * 60);

/// One screen in the menu hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuState {
    Main,
    /// Main-equivalent menu shown after a location share.
    UserLocationMenu,
    RegionSubmenu(Region),
    DifficultySubmenu(Region, String),
    NearbyResults,
}

/// Mutable per-user state. Strictly partitioned by user id; the
/// dispatcher guarantees no two updates for one user run concurrently.
#[derive(Debug)]
pub struct Session {
    nav: Vec<MenuState>,
    /// Raw coordinates as shared by the user. Never cleared by
    /// navigation, including `/start`.
    pub shared_location: Option<GeoPoint>,
    /// ITM projection of `shared_location`, computed once at share time.
    pub projected_location: Option<PlanarPoint>,
    pub has_shared_location: bool,
    /// Bumped on every render; rendered keyboards are stamped with it.
    pub revision: u64,
    last_action_at: Option<Instant>,
    last_seen: Instant,
}

impl Session {
    pub fn new() -> Session {
        Session {
            nav: vec![MenuState::Main],
            shared_location: None,
            projected_location: None,
            has_shared_location: false,
            revision: 0,
            last_action_at: None,
            last_seen: Instant::now(),
        }
    }

    /// The menu the user is currently looking at.
    pub fn current(&self) -> &MenuState {
        // The root is pushed at construction and never popped.
        self.nav.last().expect("nav stack is never empty")
    }

    /// Reset navigation to the given root. Location state is untouched.
    pub fn reset_to(&mut self, root: MenuState) {
        self.nav.clear();
        self.nav.push(root);
    }

    /// Truncate back to the root screen without replacing it.
    pub fn truncate_to_root(&mut self) {
        self.nav.truncate(1);
        if self.nav.is_empty() {
            self.nav.push(MenuState::Main);
        }
    }

    /// Push a drill-down screen, keeping the stack bounded.
    pub fn push(&mut self, state: MenuState) {
        if self.nav.len() >= MAX_NAV_DEPTH {
            self.nav.remove(1);
        }
        self.nav.push(state);
    }

    /// Pop one screen; the root is never popped.
    pub fn pop(&mut self) {
        if self.nav.len() > 1 {
            self.nav.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.nav.len()
    }

    /// Debounce check: accept the action iff enough time has passed
    /// since the last accepted one. Accepting records the timestamp.
    pub fn accept_action(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_action_at {
            if now.duration_since(last) < MIN_ACTION_INTERVAL {
                return false;
            }
        }
        self.last_action_at = Some(now);
        true
    }

    /// Advance the menu revision and return the new value.
    pub fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

/// Thread-safe session table keyed by user id.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<i64, Session>>>,
}

impl SessionStore {
    pub fn new() -> SessionStore {
        SessionStore::default()
    }

    /// Run `f` against the user's session, creating it lazily.
    pub fn with_session<F, R>(&self, user_id: i64, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut map = self.inner.lock().unwrap();
        let session = map.entry(user_id).or_insert_with(Session::new);
        session.touch();
        let result = f(session);
        metrics::ACTIVE_SESSIONS.set(map.len() as i64);
        result
    }

    pub fn contains(&self, user_id: i64) -> bool {
        self.inner.lock().unwrap().contains_key(&user_id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Drop sessions idle longer than `max_idle`; returns how many.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut map = self.inner.lock().unwrap();
        let before = map.len();
        map.retain(|_, session| session.idle_for() < max_idle);
        metrics::ACTIVE_SESSIONS.set(map.len() as i64);
        before - map.len()
    }
}
