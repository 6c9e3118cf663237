/*!
 * Text rendering for catalog objects
 *
 * Pure helpers used by the activity cycle: sexagesimal coordinates and the
 * randomly sampled fact line shown once an object has been "explored".
 */

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{AstronomicalObject, Equatorial, Magnitude};

/// Explored lines at or above this many characters are recomputed with fewer facts
pub const MAX_STATE_LEN: usize = 115;

/// Facts sampled on the first attempt, then on each shorter retry
const FACT_COUNTS: [usize; 3] = [4, 3, 2];

/// Render RA/Dec (degrees) as `+H° M′ S″ ±D° M′ S″`.
///
/// RA is converted to hour units. The sign belongs to the leading component
/// only; minutes and seconds are always magnitudes.
pub fn format_coordinates(coordinates: Equatorial) -> String {
    let hours = coordinates.ra.rem_euclid(360.0) / 15.0;
    let (mut h, m, s) = split_sexagesimal(hours);
    if h >= 24 {
        h -= 24;
    }

    let sign = if coordinates.dec < 0.0 { '-' } else { '+' };
    let (d, dm, ds) = split_sexagesimal(coordinates.dec.abs());

    format!("+{}° {}′ {}″ {}{}° {}′ {}″", h, m, s, sign, d, dm, ds)
}

/// Split a non-negative value into whole units, minutes and rounded seconds
fn split_sexagesimal(value: f64) -> (u32, u32, u32) {
    let mut whole = value.floor() as u32;
    let minutes_exact = (value - value.floor()) * 60.0;
    let mut minutes = minutes_exact.floor() as u32;
    let mut seconds = ((minutes_exact - minutes_exact.floor()) * 60.0).round() as u32;

    if seconds >= 60 {
        seconds -= 60;
        minutes += 1;
    }
    if minutes >= 60 {
        minutes -= 60;
        whole += 1;
    }

    (whole, minutes, seconds)
}

/// Labels for the object's numeric attributes, absent ones skipped
pub fn fact_labels(object: &AstronomicalObject) -> Vec<String> {
    let mut labels = Vec::with_capacity(6);

    if let Some(mass) = object.mass {
        let value = match mass.value {
            Magnitude::Number(value) => format!("{:.2e}", value),
            Magnitude::Text(text) => text.to_string(),
        };
        labels.push(format!("Mass: {} {}", value, mass.unit));
    }
    if let Some(distance) = object.distance {
        labels.push(format!("Distance: {} {}", distance.value, distance.unit));
    }
    if let Some(magnitude) = object.apparent_magnitude {
        labels.push(format!("Apparent magnitude: {}", magnitude));
    }
    if let Some(velocity) = object.velocity {
        labels.push(format!("Velocity: {} {}", velocity.value, velocity.unit));
    }
    if let Some(redshift) = object.redshift {
        labels.push(format!(
            "Redshift: {} (error: {})",
            redshift.value,
            redshift.error.unwrap_or("n/a")
        ));
    }
    if let Some(radius) = object.radius {
        labels.push(format!("Radius: {} {}", radius.value, radius.unit));
    }

    labels.into_iter().map(|l| l.trim_end().to_string()).collect()
}

/// Shuffle the labels and join the first `count` with spaces
pub fn sample_facts<R: Rng + ?Sized>(labels: &[String], count: usize, rng: &mut R) -> String {
    let mut shuffled = labels.to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(count);
    shuffled.join(" ")
}

/// Sample `count` facts of one object
pub fn summarize<R: Rng + ?Sized>(object: &AstronomicalObject, count: usize, rng: &mut R) -> String {
    sample_facts(&fact_labels(object), count, rng)
}

/// Build the text that follows `Explored: ` for an object.
///
/// Objects without facts always get their description. Otherwise the line is
/// `<type> - <facts>` (or the description, with `description_probability`),
/// recomputed with 3 and then 2 facts while it is [`MAX_STATE_LEN`] or longer.
pub fn explored_state<R: Rng + ?Sized>(
    object: &AstronomicalObject,
    description_probability: f64,
    rng: &mut R,
) -> String {
    let labels = fact_labels(object);
    if labels.is_empty() {
        return object.description.to_string();
    }

    let facts_line = |count: usize, rng: &mut R| {
        format!("{} - {}", object.kind, sample_facts(&labels, count, rng))
    };

    let mut state = if rng.random_bool(description_probability) {
        object.description.to_string()
    } else {
        facts_line(FACT_COUNTS[0], rng)
    };

    for &count in &FACT_COUNTS[1..] {
        if state.chars().count() < MAX_STATE_LEN {
            break;
        }
        state = facts_line(count, rng);
    }

    state
}
