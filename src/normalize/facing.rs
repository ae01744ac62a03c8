use serde::{Deserialize, Serialize};

const COARSE: [&str; 9] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW", "N"];

const FINE: [&str; 17] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW", "N",
];

/// How the camera bearing is reported in the Facing column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FacingPrecision {
    /// 8 compass points (N, NE, E, ...).
    #[default]
    Coarse,
    /// 16 compass points (N, NNE, NE, ...).
    Fine,
    /// The bearing itself, rounded to whole degrees (halves to even).
    Precise,
}

impl FacingPrecision {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "coarse" => Some(FacingPrecision::Coarse),
            "fine" => Some(FacingPrecision::Fine),
            "precise" => Some(FacingPrecision::Precise),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FacingPrecision::Coarse => "coarse",
            FacingPrecision::Fine => "fine",
            FacingPrecision::Precise => "precise",
        }
    }

    /// Bucket width and circular direction table (first and last are N).
    fn table(&self) -> Option<(f64, &'static [&'static str])> {
        match self {
            FacingPrecision::Coarse => Some((22.5, &COARSE)),
            FacingPrecision::Fine => Some((11.25, &FINE)),
            FacingPrecision::Precise => None,
        }
    }
}

/// Convert an azimuth in degrees to a direction label.
///
/// Returns `None` when `azimuth` is not a finite number.
pub fn facing(azimuth: &str, precision: FacingPrecision) -> Option<String> {
    let degrees: f64 = azimuth.trim().parse().ok().filter(|d: &f64| d.is_finite())?;

    match precision.table() {
        None => Some(format!("{}°", degrees.round_ties_even() as i64)),
        Some((width, directions)) => {
            let normalized = degrees.rem_euclid(360.0);
            let half_buckets = (normalized / width).floor();
            let index = (half_buckets / 2.0).ceil() as usize;
            directions.get(index).map(|d| d.to_string())
        }
    }
}
