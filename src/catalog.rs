// Trail catalog: the static region -> location -> difficulty -> trail
// hierarchy, loaded once at startup and read-only afterwards.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::geo::PlanarPoint;

/// One of the three fixed top-level geographic groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Center,
    South,
    North,
}

impl Region {
    /// Fixed declaration order, which also defines catalog traversal order.
    pub const ALL: [Region; 3] = [Region::Center, Region::South, Region::North];

    /// JSON key in the trail data file.
    pub fn key(self) -> &'static str {
        match self {
            Region::Center => "center",
            Region::South => "south",
            Region::North => "north",
        }
    }

    /// Numeric token used in `area:` callback data.
    pub fn token(self) -> &'static str {
        match self {
            Region::Center => "1",
            Region::South => "2",
            Region::North => "3",
        }
    }

    pub fn from_token(token: &str) -> Option<Region> {
        match token {
            "1" => Some(Region::Center),
            "2" => Some(Region::South),
            "3" => Some(Region::North),
            _ => None,
        }
    }

    /// Button label shown on the main menu.
    pub fn label(self) -> &'static str {
        match self {
            Region::Center => "🌟 מרכז",
            Region::South => "🌞 דרום",
            Region::North => "🌲 צפון",
        }
    }
}

/// One of the three fixed difficulty levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// JSON key of the difficulty bucket.
    pub fn key(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Button label; also carried verbatim inside `difficulty:` callback data.
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "✊ קל",
            Difficulty::Medium => "💪 בינוני",
            Difficulty::Hard => "👊 קשה",
        }
    }

    pub fn from_label(label: &str) -> Option<Difficulty> {
        Difficulty::ALL.into_iter().find(|d| d.label() == label)
    }
}

/// A single trail. Immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailEntry {
    pub name: String,
    pub link: String,
    /// ITM position; None when the trail has no mapped location.
    pub position: Option<PlanarPoint>,
}

/// A named location holding up to three difficulty buckets.
#[derive(Debug, Clone, Default)]
pub struct LocationTrails {
    pub name: String,
    buckets: [Vec<TrailEntry>; 3],
}

impl LocationTrails {
    pub fn bucket(&self, difficulty: Difficulty) -> &[TrailEntry] {
        &self.buckets[difficulty as usize]
    }

    /// Difficulty levels that actually have trails, in fixed order.
    /// Empty buckets must never be offered as menu choices.
    pub fn difficulties(&self) -> impl Iterator<Item = Difficulty> + '_ {
        Difficulty::ALL
            .into_iter()
            .filter(|d| !self.bucket(*d).is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|b| b.is_empty())
    }
}

/// All locations under one region, in file declaration order.
#[derive(Debug, Clone, Default)]
pub struct RegionTrails {
    locations: Vec<LocationTrails>,
}

impl RegionTrails {
    pub fn locations(&self) -> &[LocationTrails] {
        &self.locations
    }

    pub fn location(&self, name: &str) -> Option<&LocationTrails> {
        self.locations.iter().find(|l| l.name == name)
    }
}

/// The full trail catalog. Shared read-only across all sessions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    center: RegionTrails,
    south: RegionTrails,
    north: RegionTrails,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read trail data file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse trail data: {0}")]
    Parse(#[from] serde_json::Error),
}

// ── JSON wire structs ────────────────────────────────────────────────

#[derive(Deserialize)]
struct TrailFileJson {
    areas: AreasJson,
}

#[derive(Deserialize)]
struct AreasJson {
    center: RegionJson,
    south: RegionJson,
    north: RegionJson,
}

#[derive(Deserialize)]
struct RegionJson {
    // serde_json's preserve_order feature keeps these in file order.
    locations: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize, Default)]
struct LocationJson {
    #[serde(default)]
    easy: Vec<TrailJson>,
    #[serde(default)]
    medium: Vec<TrailJson>,
    #[serde(default)]
    hard: Vec<TrailJson>,
}

#[derive(Deserialize)]
struct TrailJson {
    trail_name: String,
    location_link: String,
    #[serde(default)]
    location_easting: Option<serde_json::Value>,
    #[serde(default)]
    location_northing: Option<serde_json::Value>,
}

/// Coordinates arrive either as numbers or as numeric strings. Empty
/// strings and zero both mean "no mapped location".
fn parse_coordinate(value: &Option<serde_json::Value>) -> Option<f64> {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| *v != 0.0)
}

impl TrailJson {
    fn into_entry(self) -> TrailEntry {
        let easting = parse_coordinate(&self.location_easting);
        let northing = parse_coordinate(&self.location_northing);
        let position = match (easting, northing) {
            (Some(easting), Some(northing)) => Some(PlanarPoint { easting, northing }),
            _ => None,
        };
        TrailEntry {
            name: self.trail_name,
            link: self.location_link,
            position,
        }
    }
}

impl RegionJson {
    fn into_region(self) -> Result<RegionTrails, serde_json::Error> {
        let mut locations = Vec::with_capacity(self.locations.len());
        for (name, value) in self.locations {
            let loc: LocationJson = serde_json::from_value(value)?;
            let buckets = [
                loc.easy.into_iter().map(TrailJson::into_entry).collect(),
                loc.medium.into_iter().map(TrailJson::into_entry).collect(),
                loc.hard.into_iter().map(TrailJson::into_entry).collect(),
            ];
            locations.push(LocationTrails { name, buckets });
        }
        Ok(RegionTrails { locations })
    }
}

impl Catalog {
    /// An empty catalog: drill-down menus have nothing to offer but the
    /// bot still serves. Used as the fallback when loading fails.
    pub fn empty() -> Catalog {
        Catalog::default()
    }

    /// Load the catalog from a trail data file.
    pub fn load(path: &Path) -> Result<Catalog, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Catalog::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Catalog, CatalogError> {
        let file: TrailFileJson = serde_json::from_str(contents)?;
        Ok(Catalog {
            center: file.areas.center.into_region()?,
            south: file.areas.south.into_region()?,
            north: file.areas.north.into_region()?,
        })
    }

    pub fn region(&self, region: Region) -> &RegionTrails {
        match region {
            Region::Center => &self.center,
            Region::South => &self.south,
            Region::North => &self.north,
        }
    }

    /// All trails in catalog traversal order: regions in declaration
    /// order, then locations in file order, then difficulties, then
    /// trails within a bucket.
    pub fn trails(&self) -> impl Iterator<Item = &TrailEntry> {
        Region::ALL.into_iter().flat_map(move |r| {
            self.region(r).locations().iter().flat_map(|loc| {
                Difficulty::ALL
                    .into_iter()
                    .flat_map(move |d| loc.bucket(d).iter())
            })
        })
    }

    pub fn trail_count(&self) -> usize {
        self.trails().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "areas": {
            "center": {"locations": {
                "Ben Shemen": {
                    "easy": [{"trail_name": "Forest Loop",
                              "location_link": "https://example.com/forest",
                              "location_easting": "194000",
                              "location_northing": "649000"}],
                    "medium": [],
                    "hard": []
                }
            }},
            "south": {"locations": {
                "Crater Trail": {
                    "easy": [{"trail_name": "Sunset Loop",
                              "location_link": "https://example.com/sunset"}],
                    "hard": [{"trail_name": "Rim Ascent",
                              "location_link": "https://example.com/rim",
                              "location_easting": 182000,
                              "location_northing": 636000}]
                },
                "Arava": {
                    "medium": [{"trail_name": "Wadi Walk",
                                "location_link": "https://example.com/wadi",
                                "location_easting": "",
                                "location_northing": ""}]
                }
            }},
            "north": {"locations": {}}
        }
    }"#;

    #[test]
    fn test_from_json_builds_hierarchy() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.trail_count(), 4);

        let south = catalog.region(Region::South);
        assert_eq!(south.locations().len(), 2);
        let crater = south.location("Crater Trail").unwrap();
        assert_eq!(crater.bucket(Difficulty::Easy).len(), 1);
        assert_eq!(crater.bucket(Difficulty::Medium).len(), 0);
        assert_eq!(crater.bucket(Difficulty::Hard).len(), 1);
        assert!(catalog.region(Region::North).locations().is_empty());
    }

    #[test]
    fn test_difficulties_skip_empty_buckets() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let crater = catalog
            .region(Region::South)
            .location("Crater Trail")
            .unwrap();
        let offered: Vec<Difficulty> = crater.difficulties().collect();
        assert_eq!(offered, vec![Difficulty::Easy, Difficulty::Hard]);
    }

    #[test]
    fn test_coordinates_numbers_and_strings() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let forest = &catalog
            .region(Region::Center)
            .location("Ben Shemen")
            .unwrap()
            .bucket(Difficulty::Easy)[0];
        let pos = forest.position.unwrap();
        assert_eq!(pos.easting, 194_000.0);
        assert_eq!(pos.northing, 649_000.0);

        let rim = &catalog
            .region(Region::South)
            .location("Crater Trail")
            .unwrap()
            .bucket(Difficulty::Hard)[0];
        assert_eq!(rim.position.unwrap().easting, 182_000.0);
    }

    #[test]
    fn test_missing_or_empty_coordinates_mean_unmapped() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let sunset = &catalog
            .region(Region::South)
            .location("Crater Trail")
            .unwrap()
            .bucket(Difficulty::Easy)[0];
        assert!(sunset.position.is_none());

        let wadi = &catalog
            .region(Region::South)
            .location("Arava")
            .unwrap()
            .bucket(Difficulty::Medium)[0];
        assert!(wadi.position.is_none());
    }

    #[test]
    fn test_zero_coordinates_mean_unmapped() {
        let json = r#"{"areas": {
            "center": {"locations": {"L": {"easy": [
                {"trail_name": "T", "location_link": "https://x",
                 "location_easting": 0, "location_northing": "0"}
            ]}}},
            "south": {"locations": {}},
            "north": {"locations": {}}
        }}"#;
        let catalog = Catalog::from_json(json).unwrap();
        let trail = catalog.trails().next().unwrap();
        assert!(trail.position.is_none());
    }

    #[test]
    fn test_locations_keep_file_order() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let names: Vec<&str> = catalog
            .region(Region::South)
            .locations()
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["Crater Trail", "Arava"]);
    }

    #[test]
    fn test_traversal_order_is_stable() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let first: Vec<String> = catalog.trails().map(|t| t.name.clone()).collect();
        let second: Vec<String> = catalog.trails().map(|t| t.name.clone()).collect();
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec!["Forest Loop", "Sunset Loop", "Rim Ascent", "Wadi Walk"]
        );
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Catalog::load(Path::new("/no/such/trails.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = Catalog::load(file.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_missing_areas_key_fails() {
        assert!(Catalog::from_json("{}").is_err());
    }

    #[test]
    fn test_region_and_difficulty_tokens() {
        for region in Region::ALL {
            assert_eq!(Region::from_token(region.token()), Some(region));
        }
        assert_eq!(Region::from_token("4"), None);

        for difficulty in Difficulty::ALL {
            assert_eq!(Difficulty::from_label(difficulty.label()), Some(difficulty));
        }
        assert_eq!(Difficulty::from_label("easy"), None);
    }
}
