// WGS84 -> Israeli Transverse Mercator (EPSG:2039) forward projection.
//
// Trail coordinates in the catalog are stored in ITM meters, so a shared
// geographic location must be projected before any distance comparison.
// Uses the standard transverse-Mercator series on the GRS80 ellipsoid,
// accurate to well under a meter inside the projection's area of use.

/// A geographic coordinate in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A projected planar coordinate in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarPoint {
    pub easting: f64,
    pub northing: f64,
}

// GRS80 ellipsoid.
const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_222_101;

// EPSG:2039 natural origin and grid offsets.
// Latitude 31°44'03.817"N, longitude 35°12'16.261"E.
const ORIGIN_LAT_DEG: f64 = 31.0 + 44.0 / 60.0 + 3.817 / 3600.0;
const ORIGIN_LON_DEG: f64 = 35.0 + 12.0 / 60.0 + 16.261 / 3600.0;
const SCALE_FACTOR: f64 = 1.000_006_7;
pub const FALSE_EASTING: f64 = 219_529.584;
pub const FALSE_NORTHING: f64 = 626_907.390;

/// Project a WGS84 coordinate onto the ITM grid.
pub fn wgs84_to_itm(point: GeoPoint) -> PlanarPoint {
    let e2 = FLATTENING * (2.0 - FLATTENING);
    let ep2 = e2 / (1.0 - e2);

    let phi = point.latitude.to_radians();
    let lam = point.longitude.to_radians();
    let lam0 = ORIGIN_LON_DEG.to_radians();

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let nu = SEMI_MAJOR_AXIS / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t2 = phi.tan() * phi.tan();
    let c = ep2 * cos_phi * cos_phi;
    let a = (lam - lam0) * cos_phi;

    let m = meridian_arc(phi);
    let m0 = meridian_arc(ORIGIN_LAT_DEG.to_radians());

    let easting = FALSE_EASTING
        + SCALE_FACTOR
            * nu
            * (a
                + (1.0 - t2 + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t2 + t2 * t2 + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);

    let northing = FALSE_NORTHING
        + SCALE_FACTOR
            * (m - m0
                + nu
                    * phi.tan()
                    * (a * a / 2.0
                        + (5.0 - t2 + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                        + (61.0 - 58.0 * t2 + t2 * t2 + 600.0 * c - 330.0 * ep2) * a.powi(6)
                            / 720.0));

    PlanarPoint { easting, northing }
}

/// Meridian arc length from the equator to latitude `phi` (radians).
fn meridian_arc(phi: f64) -> f64 {
    let e2 = FLATTENING * (2.0 - FLATTENING);
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    SEMI_MAJOR_AXIS
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Straight-line Euclidean distance between two planar points, in meters.
pub fn planar_distance(a: PlanarPoint, b: PlanarPoint) -> f64 {
    (b.easting - a.easting).hypot(b.northing - a.northing)
}
