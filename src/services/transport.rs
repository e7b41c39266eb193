//! Multi-modal travel-time estimation.
//!
//! All numbers here are heuristics, not live routing: average speeds per
//! mode applied to the great-circle distance, with a fixed wait overhead
//! and distance-banded transfer counts for public transit. Changing any
//! constant changes user-visible estimates, so treat them as policy.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Average speeds in km/h. Driving is urban-traffic-adjusted.
const WALKING_SPEED_KMH: f64 = 5.0;
const CYCLING_SPEED_KMH: f64 = 15.0;
const DRIVING_SPEED_KMH: f64 = 25.0;
const TRANSIT_SPEED_KMH: f64 = 18.0;

/// Fixed wait/boarding overhead added to every transit estimate.
const TRANSIT_OVERHEAD_MIN: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Walking,
    Cycling,
    Driving,
    PublicTransit,
    SchoolBus,
}

impl TransportMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Cycling => "cycling",
            Self::Driving => "driving",
            Self::PublicTransit => "public_transit",
            Self::SchoolBus => "school_bus",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "walking" => Ok(Self::Walking),
            "cycling" => Ok(Self::Cycling),
            "driving" => Ok(Self::Driving),
            "public_transit" => Ok(Self::PublicTransit),
            "school_bus" => Ok(Self::SchoolBus),
            other => Err(format!("unknown transport mode '{other}'")),
        }
    }
}

/// Static school-bus schedule data, echoed verbatim when supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolBusSchedule {
    pub route_name: String,
    pub pickup_time: String,
    pub pickup_location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitDetail {
    pub transfers: u32,
    pub wait_minutes: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransportEstimate {
    pub mode: TransportMode,

    /// Absent for the school-bus placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,

    /// Rush-hour-adjusted duration; equals the base outside rush hour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morning_commute_minutes: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transit: Option<TransitDetail>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_bus: Option<SchoolBusSchedule>,

    pub display: String,
}

/// Duration at a constant speed, rounded to the nearest whole minute with
/// a floor of 1 minute for any positive distance.
fn duration_minutes(distance_km: f64, speed_kmh: f64) -> u32 {
    if distance_km <= 0.0 {
        return 0;
    }
    let minutes = (distance_km / speed_kmh * 60.0).round() as u32;
    minutes.max(1)
}

/// Transfer count by distance band: none below 3 km, one between 3 and
/// 8 km, two beyond. Heuristic standing in for live schedule data.
const fn transit_transfers(distance_km: f64) -> u32 {
    if distance_km < 3.0 {
        0
    } else if distance_km <= 8.0 {
        1
    } else {
        2
    }
}

/// Rush-hour multiplier for the morning school run: 7-9 h is full rush
/// (+25%), the 6-10 h shoulder is +15%.
fn morning_commute_minutes(base_minutes: u32, departure: DateTime<Utc>) -> u32 {
    let hour = departure.hour();
    let adjusted = if (7..=9).contains(&hour) {
        f64::from(base_minutes) * 1.25
    } else if (6..=10).contains(&hour) {
        f64::from(base_minutes) * 1.15
    } else {
        f64::from(base_minutes)
    };
    adjusted as u32
}

fn rounded_km(distance_km: f64) -> f64 {
    (distance_km * 100.0).round() / 100.0
}

/// One estimate per requested mode, in the order requested.
///
/// The caller resolves the shared origin before calling this; a failed
/// resolution fails the whole request rather than producing partial
/// results.
#[must_use]
pub fn estimate(
    distance_km: f64,
    modes: &[TransportMode],
    school_bus: Option<&SchoolBusSchedule>,
    departure: DateTime<Utc>,
) -> Vec<TransportEstimate> {
    modes
        .iter()
        .map(|&mode| match mode {
            TransportMode::Walking => {
                simple_estimate(mode, distance_km, WALKING_SPEED_KMH, "min walk", departure)
            }
            TransportMode::Cycling => {
                simple_estimate(mode, distance_km, CYCLING_SPEED_KMH, "min by bike", departure)
            }
            TransportMode::Driving => {
                simple_estimate(mode, distance_km, DRIVING_SPEED_KMH, "min drive", departure)
            }
            TransportMode::PublicTransit => transit_estimate(distance_km, departure),
            TransportMode::SchoolBus => school_bus_estimate(school_bus),
        })
        .collect()
}

fn simple_estimate(
    mode: TransportMode,
    distance_km: f64,
    speed_kmh: f64,
    label: &str,
    departure: DateTime<Utc>,
) -> TransportEstimate {
    let duration = duration_minutes(distance_km, speed_kmh);
    TransportEstimate {
        mode,
        duration_minutes: Some(duration),
        distance_km: Some(rounded_km(distance_km)),
        morning_commute_minutes: Some(morning_commute_minutes(duration, departure)),
        transit: None,
        school_bus: None,
        display: format!("{duration} {label}"),
    }
}

fn transit_estimate(distance_km: f64, departure: DateTime<Utc>) -> TransportEstimate {
    let travel = duration_minutes(distance_km, TRANSIT_SPEED_KMH);
    let total = travel + TRANSIT_OVERHEAD_MIN;
    let transfers = transit_transfers(distance_km);

    TransportEstimate {
        mode: TransportMode::PublicTransit,
        duration_minutes: Some(total),
        distance_km: Some(rounded_km(distance_km)),
        morning_commute_minutes: Some(morning_commute_minutes(total, departure)),
        transit: Some(TransitDetail {
            transfers,
            wait_minutes: TRANSIT_OVERHEAD_MIN,
        }),
        school_bus: None,
        display: match transfers {
            0 => format!("{total} min by public transit, direct"),
            1 => format!("{total} min by public transit, 1 transfer"),
            n => format!("{total} min by public transit, {n} transfers"),
        },
    }
}

fn school_bus_estimate(schedule: Option<&SchoolBusSchedule>) -> TransportEstimate {
    schedule.map_or_else(
        || TransportEstimate {
            mode: TransportMode::SchoolBus,
            duration_minutes: None,
            distance_km: None,
            morning_commute_minutes: None,
            transit: None,
            school_bus: None,
            display: "School bus: schedule not available".to_string(),
        },
        |schedule| TransportEstimate {
            mode: TransportMode::SchoolBus,
            duration_minutes: None,
            distance_km: None,
            morning_commute_minutes: None,
            transit: None,
            school_bus: Some(schedule.clone()),
            display: format!(
                "School bus {}, pickup {} at {}",
                schedule.route_name, schedule.pickup_time, schedule.pickup_location
            ),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn off_peak() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 13, 0, 0).unwrap()
    }

    #[test]
    fn five_km_reference_values() {
        let modes = [
            TransportMode::Walking,
            TransportMode::Cycling,
            TransportMode::Driving,
            TransportMode::PublicTransit,
        ];
        let estimates = estimate(5.0, &modes, None, off_peak());

        assert_eq!(estimates[0].duration_minutes, Some(60));
        assert_eq!(estimates[1].duration_minutes, Some(20));
        assert_eq!(estimates[2].duration_minutes, Some(12));
        // 5/18*60 + 5 = 21.67 -> 22, in the 1-transfer band.
        assert_eq!(estimates[3].duration_minutes, Some(22));
        assert_eq!(estimates[3].transit.as_ref().unwrap().transfers, 1);
    }

    #[test]
    fn results_follow_requested_order() {
        let modes = [TransportMode::Driving, TransportMode::Walking];
        let estimates = estimate(2.0, &modes, None, off_peak());
        assert_eq!(estimates[0].mode, TransportMode::Driving);
        assert_eq!(estimates[1].mode, TransportMode::Walking);
    }

    #[test]
    fn tiny_distances_round_up_to_one_minute() {
        let estimates = estimate(0.01, &[TransportMode::Driving], None, off_peak());
        assert_eq!(estimates[0].duration_minutes, Some(1));
    }

    #[test]
    fn transfer_bands() {
        assert_eq!(transit_transfers(2.9), 0);
        assert_eq!(transit_transfers(3.0), 1);
        assert_eq!(transit_transfers(8.0), 1);
        assert_eq!(transit_transfers(8.1), 2);
    }

    #[test]
    fn school_bus_without_schedule_is_a_placeholder() {
        let estimates = estimate(5.0, &[TransportMode::SchoolBus], None, off_peak());
        assert!(estimates[0].duration_minutes.is_none());
        assert!(estimates[0].school_bus.is_none());
    }

    #[test]
    fn school_bus_echoes_schedule_verbatim() {
        let schedule = SchoolBusSchedule {
            route_name: "Route B".to_string(),
            pickup_time: "08:15".to_string(),
            pickup_location: "Stationsplein".to_string(),
        };
        let estimates = estimate(5.0, &[TransportMode::SchoolBus], Some(&schedule), off_peak());
        let echoed = estimates[0].school_bus.as_ref().unwrap();
        assert_eq!(echoed.pickup_time, "08:15");
        assert_eq!(echoed.pickup_location, "Stationsplein");
    }

    #[test]
    fn rush_hour_inflates_morning_commute() {
        let rush = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let estimates = estimate(5.0, &[TransportMode::Cycling], None, rush);
        // 20 min base * 1.25
        assert_eq!(estimates[0].morning_commute_minutes, Some(25));

        let calm = estimate(5.0, &[TransportMode::Cycling], None, off_peak());
        assert_eq!(calm[0].morning_commute_minutes, Some(20));
    }
}
