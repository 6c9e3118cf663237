//! The fixed catalog of astronomical objects the presence rotates through.
//!
//! Right ascension and declination are stored in degrees. Entries are
//! defined at compile time and never mutated.

use serde::Serialize;
use std::fmt;

/// A physical quantity that is either numeric or a free-form string
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Magnitude {
    Number(f64),
    Text(&'static str),
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Magnitude::Number(value) => write!(f, "{}", value),
            Magnitude::Text(text) => f.write_str(text),
        }
    }
}

/// A value with its unit and an optional error annotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measure {
    pub value: Magnitude,
    pub unit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl Measure {
    pub const fn new(value: f64, unit: &'static str) -> Self {
        Self {
            value: Magnitude::Number(value),
            unit,
            error: None,
        }
    }

    pub const fn with_error(value: f64, error: &'static str, unit: &'static str) -> Self {
        Self {
            value: Magnitude::Number(value),
            unit,
            error: Some(error),
        }
    }
}

/// Equatorial coordinates in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Equatorial {
    /// Right ascension, [0, 360)
    pub ra: f64,
    /// Declination, [-90, 90]
    pub dec: f64,
}

/// One catalog entry. `name` is the unique key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AstronomicalObject {
    pub name: &'static str,
    pub full_name: &'static str,
    /// Survey used by the sky-map viewer
    pub type_photo: &'static str,
    pub zoom: u8,
    pub description: &'static str,
    pub coordinates: Equatorial,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub distance: Option<Measure>,
    pub apparent_magnitude: Option<f64>,
    pub velocity: Option<Measure>,
    pub redshift: Option<Measure>,
    pub radius: Option<Measure>,
    pub mass: Option<Measure>,
    pub discovery_method: Option<&'static str>,
    pub visible_size: Option<&'static str>,
}

impl AstronomicalObject {
    /// Bare entry with no optional attributes, for building catalogs field by field
    pub const fn new(
        name: &'static str,
        kind: &'static str,
        description: &'static str,
        ra: f64,
        dec: f64,
    ) -> Self {
        Self {
            name,
            full_name: name,
            type_photo: "IMG_all",
            zoom: 10,
            description,
            coordinates: Equatorial { ra, dec },
            kind,
            distance: None,
            apparent_magnitude: None,
            velocity: None,
            redshift: None,
            radius: None,
            mass: None,
            discovery_method: None,
            visible_size: None,
        }
    }
}

/// Look up an entry by name
pub fn find<'a>(catalog: &'a [AstronomicalObject], name: &str) -> Option<&'a AstronomicalObject> {
    catalog.iter().find(|object| object.name == name)
}

const STEPHAN_1876: &str = "Discovered by Édouard Jean-Marie Stephan in 1876";

pub static CATALOG: [AstronomicalObject; 11] = [
    AstronomicalObject {
        name: "PGC 54559",
        full_name: "USNOA2 1050-07455174 (PGC 54559)",
        type_photo: "IMG_all",
        zoom: 13,
        description: "A rare ring galaxy with a bright ring of young, blue stars surrounding a central core.",
        coordinates: Equatorial { ra: 229.310_122_222_222_2, dec: 21.585_525 },
        kind: "Ring galaxy",
        distance: Some(Measure::new(600.0, "million light-years")),
        apparent_magnitude: Some(15.1),
        velocity: Some(Measure::new(12453.0, "km/s")),
        redshift: Some(Measure::with_error(12740.0, "± 50", "")),
        radius: Some(Measure::new(50000.0, "light-years")),
        mass: None,
        discovery_method: Some("Observed with large ground-based telescopes"),
        visible_size: None,
    },
    AstronomicalObject {
        name: "Stephan's Quintet",
        full_name: "Stephan's Quintet",
        type_photo: "IMG_all",
        zoom: 11,
        description: "A compact group of five galaxies in Pegasus, famous for violent interactions and a large shock wave.",
        coordinates: Equatorial { ra: 338.9895, dec: 33.9567 },
        kind: "Galaxy group",
        distance: Some(Measure::new(290.0, "million light-years")),
        apparent_magnitude: Some(13.0),
        velocity: None,
        redshift: Some(Measure::with_error(0.0215, "± 0.0006", "")),
        radius: None,
        mass: None,
        discovery_method: Some("Discovered by Édouard Stephan in 1877"),
        visible_size: None,
    },
    AstronomicalObject {
        name: "NGC 7317",
        full_name: "NGC 7317",
        type_photo: "IMG_all",
        zoom: 11,
        description: "An elliptical member of Stephan's Quintet, located toward the lower right of the group.",
        coordinates: Equatorial { ra: 338.9655, dec: 33.9453 },
        kind: "Elliptical galaxy",
        distance: Some(Measure::new(95.9, "million light-years")),
        apparent_magnitude: Some(13.6),
        velocity: None,
        redshift: Some(Measure::with_error(0.022012, "± 8.7E-5", "")),
        radius: None,
        mass: None,
        discovery_method: Some(STEPHAN_1876),
        visible_size: Some("0.832′ × 0.794′"),
    },
    AstronomicalObject {
        name: "NGC 7318A",
        full_name: "NGC 7318A",
        type_photo: "IMG_all",
        zoom: 11,
        description: "An elliptical galaxy in Stephan's Quintet showing signs of peculiarity due to interactions.",
        coordinates: Equatorial { ra: 338.979, dec: 33.9661 },
        kind: "Elliptical galaxy",
        distance: Some(Measure::new(96.3, "million light-years")),
        apparent_magnitude: Some(13.4),
        velocity: None,
        redshift: Some(Measure::with_error(0.022012, "± 8.7E-5", "")),
        radius: None,
        mass: None,
        discovery_method: Some(STEPHAN_1876),
        visible_size: Some("1.318′ × 1.202′"),
    },
    AstronomicalObject {
        name: "NGC 7318B",
        full_name: "NGC 7318B",
        type_photo: "IMG_all",
        zoom: 11,
        description: "A barred spiral galaxy currently colliding and interacting with NGC 7318A in Stephan's Quintet.",
        coordinates: Equatorial { ra: 338.9805, dec: 33.9667 },
        kind: "Spiral galaxy",
        distance: Some(Measure::new(83.7, "million light-years")),
        apparent_magnitude: Some(13.2),
        velocity: None,
        redshift: Some(Measure::with_error(0.0218, "± 0.0003", "")),
        radius: None,
        mass: None,
        discovery_method: Some(STEPHAN_1876),
        visible_size: Some("2′ × 1.05′"),
    },
    AstronomicalObject {
        name: "NGC 7319",
        full_name: "NGC 7319",
        type_photo: "IMG_all",
        zoom: 11,
        description: "A barred spiral galaxy with an active galactic nucleus in Stephan's Quintet.",
        coordinates: Equatorial { ra: 339.0045, dec: 33.9765 },
        kind: "Spiral galaxy",
        distance: Some(Measure::new(95.3, "million light-years")),
        apparent_magnitude: Some(13.3),
        velocity: None,
        redshift: Some(Measure::with_error(0.023, "± 0.0002", "")),
        radius: None,
        mass: None,
        discovery_method: Some(STEPHAN_1876),
        visible_size: Some("1.62′ × 1.07′"),
    },
    AstronomicalObject {
        name: "M60",
        full_name: "M60",
        type_photo: "IMG_all",
        zoom: 10,
        description: "A bright elliptical galaxy in Virgo, roughly 57 million light-years from Earth.",
        coordinates: Equatorial { ra: 190.917_083_333, dec: 11.552_222_222 },
        kind: "Elliptical galaxy",
        distance: Some(Measure::new(56.7, "million light-years")),
        apparent_magnitude: Some(8.8),
        velocity: Some(Measure::new(1108.0, "km/s")),
        redshift: Some(Measure::with_error(0.003726, "± 0.00001", "")),
        radius: Some(Measure::new(128.0, "arcseconds")),
        mass: None,
        discovery_method: None,
        visible_size: None,
    },
    AstronomicalObject {
        name: "NGC 7320",
        full_name: "NGC 7320",
        type_photo: "IMG_all",
        zoom: 11,
        description: "A foreground spiral galaxy projected onto Stephan’s Quintet, much closer to Earth than the main group.",
        coordinates: Equatorial { ra: 339.0045, dec: 33.9484 },
        kind: "Spiral galaxy",
        distance: Some(Measure::new(39.0, "million light-years")),
        apparent_magnitude: Some(12.5),
        velocity: None,
        redshift: Some(Measure::with_error(0.002622, "± 6.7E-5", "")),
        radius: None,
        mass: None,
        discovery_method: Some(STEPHAN_1876),
        visible_size: Some("7.943′ × 6.607′"),
    },
    AstronomicalObject {
        name: "NGC 5128",
        full_name: "NGC 5128 (Centaurus A)",
        type_photo: "IMG_all",
        zoom: 10,
        description: "Centaurus A is a nearby, bright radio galaxy with a striking dust lane and an active nucleus.",
        coordinates: Equatorial { ra: 201.3645, dec: -43.0192 },
        kind: "Lenticular/elliptical galaxy",
        distance: Some(Measure::new(11.0, "million light-years")),
        apparent_magnitude: Some(6.84),
        velocity: None,
        redshift: Some(Measure::with_error(547.0, "± 5", "km/s")),
        radius: None,
        mass: None,
        discovery_method: None,
        visible_size: Some("25.704′ × 17.783′"),
    },
    AstronomicalObject {
        name: "PGC 17223",
        full_name: "Large Magellanic Cloud (LMC)",
        type_photo: "DSS2",
        zoom: 6,
        description: "The Large Magellanic Cloud is the most massive satellite galaxy of the Milky Way.",
        coordinates: Equatorial { ra: 80.8935, dec: -69.7561 },
        kind: "Magellanic spiral galaxy",
        distance: Some(Measure::new(50.0, "kpc")),
        apparent_magnitude: Some(0.4),
        velocity: None,
        redshift: Some(Measure::with_error(0.00093, "± 0.00003", "")),
        radius: None,
        mass: None,
        discovery_method: None,
        visible_size: Some("645.654′ × 549.541′"),
    },
    AstronomicalObject {
        name: "Betelgeuse",
        full_name: "α Ori (Betelgeuse)",
        type_photo: "DSS2",
        zoom: 9,
        description: "Betelgeuse is one of the brightest and most recognizable stars in the constellation Orion.",
        coordinates: Equatorial { ra: 89.565, dec: 7.407 },
        kind: "Red supergiant star",
        distance: Some(Measure::new(0.4, "kpc")),
        apparent_magnitude: Some(0.5),
        velocity: None,
        redshift: Some(Measure::with_error(0.0, "± 0.00003", "")),
        radius: None,
        mass: None,
        discovery_method: None,
        visible_size: Some("40′ × 40′"),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = CATALOG.iter().map(|object| object.name).collect();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn test_coordinates_in_range() {
        for object in CATALOG.iter() {
            let Equatorial { ra, dec } = object.coordinates;
            assert!((0.0..360.0).contains(&ra), "{} ra {}", object.name, ra);
            assert!((-90.0..=90.0).contains(&dec), "{} dec {}", object.name, dec);
        }
    }

    #[test]
    fn test_find_by_name() {
        let betelgeuse = find(&CATALOG, "Betelgeuse").unwrap();
        assert_eq!(betelgeuse.full_name, "α Ori (Betelgeuse)");
        assert!(find(&CATALOG, "Vega").is_none());
    }

    #[test]
    fn test_magnitude_display() {
        assert_eq!(Magnitude::Number(600.0).to_string(), "600");
        assert_eq!(Magnitude::Number(95.9).to_string(), "95.9");
        assert_eq!(Magnitude::Text("unknown").to_string(), "unknown");
    }
}
