// Rendered menus: message text plus inline button rows, independent of
// the transport. The fixed Hebrew message set lives here.

use crate::catalog::{Difficulty, LocationTrails, Region, RegionTrails, TrailEntry};
use crate::geo::PlanarPoint;

/// Message texts and button labels.
pub mod text {
    pub const CHOOSE_OPTION: &str = "🏞️ <b>בחר אפשרות:</b>";
    pub const CHOOSE_AREA: &str = "🏞️ <b>בחר את האיזור:</b>";
    pub const CHOOSE_LOCATION: &str = "🏞️ <b>בחר מיקום:</b>";
    pub const CHOOSE_DIFFICULTY: &str = "<b>🏞️ בחר רמת קושי:</b>\n\n\
        <b>לא בכל האיזורים יש מסלולים בכל רמות הקושי.</b>\n\
        <b>❗ <i>אם רמת קושי מסוימת אינה מופיעה, זה אומר שאין מסלולים באותה רמת קושי באיזור שנבחר.</i></b>";
    pub const NEARBY_HEADER: &str = "**מסלולים בקרבת מקום:**\n\n";
    pub const NO_TRAILS_NEARBY: &str = "<b>❌ לא נמצאו מסלולים בקרבתך!</b>\n\n";
    pub const NO_LOCATION: &str = "<b>❌ לא נמצא המיקום שלך! נא שתף את מיקום כדי להמשיך.</b>\n\n";
    pub const SHARE_LOCATION_PROMPT: &str = "בחר את מיקומך באמצעות כפתור השיתוף של מיקום";
    pub const SHARE_LOCATION_KEYBOARD_BUTTON: &str = "📍 שתף את מיקומך";
    pub const LOCATION_RECEIVED: &str = "✅ **המיקום שלך נקלט בהצלחה!**";
    pub const MENU_EXPIRED: &str = "⌛ התפריט התיישן, נא לנווט שוב";

    pub const BACK_BUTTON: &str = "🔙 חזור";
    pub const SHOW_TRAILS_BUTTON: &str = "🔍 הצג מסלולים לידך";
    pub const SHARE_LOCATION_BUTTON: &str = "📍 שתף מיקום";
    pub const MAIN_MENU_BUTTON: &str = "🏠 בחר מהתפריט הראשי";

    pub const WELCOME: &str = "👊 **ברוך הבא לבוט הטיולים שלנו!** 🏞️\n\n\
        בבוט הזה תוכל לבחור מיקום בארץ ולמצוא את המעלה הבא שלך לפי רמת קושי.\n\n\
        🌍 <b>איך זה עובד?</b>\n\n\
        1. **בחר אזור בארץ** 🇮🇱\n\
        2. **בחר מיקום באותו אזור** 📍\n\
        3. **בחר את רמת הקושי של המעלה** 🧗‍♂️\n\n\
        הבוט יציג לך את כל המעלות ברמת הקושי שבחרת. לחץ על המעלה שתרצה ותעבור לאפליקציית Off-Road עם כל הפרטים הדרושים. 🚗💨\n\n\
        🔔 **שימו לב:**\n\
        אם רמות הקושי **קל, בינוני, קשה** אינן מופיעות, אין לנו מעלה ברמת קושי זו במאגר.\n\n\
        🌄 <b>אפשרות נוספת:</b>\n\
        שלח לבוט את המיקום שלך, והוא ימצא עבורך את המעלות הקרובים ביותר. 📲\n\n\
        - תוכל לשתף את המיקום שלך באמצעות כפתור **שתף מיקום** 📍\n\
        - או להשתמש בכפתור **מהדק** כדי לשתף את מיקומך בצ'אט 📎\n\n\
        🔔 **שימו לב:**\n\
        אם אינך רואה את אפשרות שיתוף המיקום, ייתכן שאין לך הרשאות לשלוח מיקום בצ'אט.\n\n\
        💪 **בהצלחה!** 🚶‍♂️🌄";

    pub fn difficulty_chosen(label: &str) -> String {
        format!("🏞️ <b>בחרת ברמת קושי: {label}!</b>")
    }

    /// Location menu body: the promised radius and the projected grid
    /// position, as in the original bot.
    pub fn location_info(easting: f64, northing: f64) -> String {
        format!(
            "המסלולים שיוצגו יהיו במרחק של עד 10 ק״מ ממיקומך🌲\n\n\
             📍 **מיקום שלך:**\n\
             מז: {easting:.2}\n\
             צפ: {northing:.2}\n"
        )
    }
}

/// An inline-keyboard button.
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub label: String,
    pub kind: ButtonKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ButtonKind {
    /// Press sends this callback token back to the bot.
    Callback(String),
    /// Press opens this URL.
    Url(String),
}

impl Button {
    pub fn callback(label: impl Into<String>, token: impl Into<String>) -> Button {
        Button {
            label: label.into(),
            kind: ButtonKind::Callback(token.into()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Button {
        Button {
            label: label.into(),
            kind: ButtonKind::Url(url.into()),
        }
    }
}

/// A rendered menu, ready for the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub buttons: Vec<Vec<Button>>,
}

impl Rendered {
    pub fn text_only(text: impl Into<String>) -> Rendered {
        Rendered {
            text: text.into(),
            buttons: Vec::new(),
        }
    }
}

/// Stamp a callback token with the session's menu revision so stale
/// presses can be detected.
pub fn stamp(revision: u64, token: &str) -> String {
    format!("v{revision}:{token}")
}

fn back_row(revision: u64) -> Vec<Button> {
    vec![Button::callback(text::BACK_BUTTON, stamp(revision, "back"))]
}

/// The main menu. Offers "share location" until a location has been
/// shared, then "show nearby trails".
pub fn main_menu(prompt: &str, has_shared_location: bool, revision: u64) -> Rendered {
    let mut buttons = vec![
        vec![
            Button::callback(Region::Center.label(), stamp(revision, "area:1")),
            Button::callback(Region::South.label(), stamp(revision, "area:2")),
        ],
        vec![Button::callback(
            Region::North.label(),
            stamp(revision, "area:3"),
        )],
    ];
    if has_shared_location {
        buttons.push(vec![Button::callback(
            text::SHOW_TRAILS_BUTTON,
            stamp(revision, "showTrails"),
        )]);
    } else {
        buttons.push(vec![Button::callback(
            text::SHARE_LOCATION_BUTTON,
            stamp(revision, "userLocation"),
        )]);
    }
    Rendered {
        text: prompt.to_string(),
        buttons,
    }
}

/// Location list for one region, plus a back button.
pub fn region_submenu(region: Region, trails: &RegionTrails, revision: u64) -> Rendered {
    let mut buttons: Vec<Vec<Button>> = trails
        .locations()
        .iter()
        .map(|loc| {
            vec![Button::callback(
                &loc.name,
                stamp(revision, &format!("path:{}:{}", region.token(), loc.name)),
            )]
        })
        .collect();
    buttons.push(back_row(revision));
    Rendered {
        text: text::CHOOSE_LOCATION.to_string(),
        buttons,
    }
}

/// Difficulty buttons for one location: exactly the non-empty buckets.
pub fn difficulty_submenu(region: Region, location: &LocationTrails, revision: u64) -> Rendered {
    let mut buttons: Vec<Vec<Button>> = location
        .difficulties()
        .map(|difficulty| {
            vec![Button::callback(
                difficulty.label(),
                stamp(
                    revision,
                    &format!(
                        "difficulty:{}:{}:{}",
                        region.token(),
                        location.name,
                        difficulty.label()
                    ),
                ),
            )]
        })
        .collect();
    buttons.push(back_row(revision));
    Rendered {
        text: text::CHOOSE_DIFFICULTY.to_string(),
        buttons,
    }
}

/// Trail links for one (location, difficulty). Terminal rendering: sent
/// as a fresh message, no back button, as in the original bot.
pub fn trail_list(difficulty: Difficulty, trails: &[TrailEntry]) -> Rendered {
    Rendered {
        text: text::difficulty_chosen(difficulty.label()),
        buttons: trails
            .iter()
            .map(|t| vec![Button::url(&t.name, &t.link)])
            .collect(),
    }
}

/// Menu shown after a location share: projected position plus the
/// nearby-search and main-menu entry points.
pub fn location_menu(position: PlanarPoint, revision: u64) -> Rendered {
    Rendered {
        text: text::location_info(position.easting, position.northing),
        buttons: vec![
            vec![Button::callback(
                text::SHOW_TRAILS_BUTTON,
                stamp(revision, "showTrails"),
            )],
            vec![Button::callback(
                text::MAIN_MENU_BUTTON,
                stamp(revision, "mainMenu"),
            )],
        ],
    }
}

/// Nearby-search results, or the "none found" message. Both carry a
/// back button.
pub fn nearby_results(trails: &[&TrailEntry], revision: u64) -> Rendered {
    if trails.is_empty() {
        return Rendered {
            text: text::NO_TRAILS_NEARBY.to_string(),
            buttons: vec![back_row(revision)],
        };
    }
    let mut buttons: Vec<Vec<Button>> = trails
        .iter()
        .map(|t| vec![Button::url(&t.name, &t.link)])
        .collect();
    buttons.push(back_row(revision));
    Rendered {
        text: text::NEARBY_HEADER.to_string(),
        buttons,
    }
}

/// "Your location was not found" rendering for a nearby request with no
/// stored location.
pub fn no_location(revision: u64) -> Rendered {
    Rendered {
        text: text::NO_LOCATION.to_string(),
        buttons: vec![back_row(revision)],
    }
}
