use fleet_core::{
    DecodedBatch, EncounterVariant, EncounteringPairVessel, EventKind, ForecastPoint,
    ForecastUpdate, Mmsi, PositionUpdate, UpdateBatch, VesselEncounter,
};
use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde_json::Value;
use snafu::ResultExt;
use tracing::{Level, event, instrument};

use crate::{
    error::{
        Result,
        error::{JsonSnafu, NotAnArraySnafu, UnknownEventSnafu},
    },
    models::{Loose, RawEncounter, RawForecastPoint, RawPosition, parse_timestamp},
};

/// Decodes the payload of the event named `name` into a typed batch.
///
/// Malformed records are dropped and counted in [DecodedBatch::skipped], only an unknown event
/// name or a payload that is not a JSON array fails the batch as a whole.
#[instrument(skip_all, fields(app.event = name, app.num_records, app.skipped))]
pub fn decode(name: &str, data: &str) -> Result<DecodedBatch> {
    let kind: EventKind = name.parse().context(UnknownEventSnafu { name })?;
    let records = match serde_json::from_str::<Value>(data).context(JsonSnafu)? {
        Value::Array(records) => records,
        other => {
            return NotAnArraySnafu {
                found: json_type(&other),
            }
            .fail();
        }
    };

    let num_records = records.len();
    let (batch, skipped) = match kind {
        EventKind::Ais => {
            let (positions, skipped) = decode_records(records, position);
            (UpdateBatch::Position(positions), skipped)
        }
        EventKind::Prediction => {
            let (points, skipped) = decode_records(records, forecast_point);
            let forecasts = points
                .into_iter()
                .into_group_map()
                .into_iter()
                .map(|(mmsi, points)| ForecastUpdate { mmsi, points })
                .sorted_by(|a, b| a.mmsi.cmp(&b.mmsi))
                .collect();
            (UpdateBatch::Forecast(forecasts), skipped)
        }
        EventKind::Cri | EventKind::FutureCri => {
            let variant = if kind == EventKind::Cri {
                EncounterVariant::Current
            } else {
                EncounterVariant::Future
            };
            let (encounters, skipped) = decode_records(records, |r| encounter(r, variant));
            (
                UpdateBatch::Encounter {
                    variant,
                    encounters,
                },
                skipped,
            )
        }
    };

    let span = tracing::Span::current();
    span.record("app.num_records", num_records);
    span.record("app.skipped", skipped);

    if skipped > 0 {
        event!(
            Level::DEBUG,
            "skipped {skipped} of {num_records} malformed '{kind}' records"
        );
    }

    Ok(DecodedBatch { batch, skipped })
}

fn decode_records<R, T>(records: Vec<Value>, normalize: impl Fn(R) -> Option<T>) -> (Vec<T>, usize)
where
    R: DeserializeOwned,
{
    let total = records.len();
    let decoded: Vec<T> = records
        .into_iter()
        .filter_map(|r| serde_json::from_value::<R>(r).ok())
        .filter_map(normalize)
        .collect();
    let skipped = total - decoded.len();
    (decoded, skipped)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn number(value: &Option<Loose>) -> Option<f64> {
    value.as_ref().and_then(Loose::as_f64)
}

fn mmsi(value: &Option<Loose>) -> Option<Mmsi> {
    value.as_ref().and_then(Loose::to_mmsi)
}

// 91 and 181 are the AIS "not available" markers and fail here.
fn latitude(value: &Option<Loose>) -> Option<f64> {
    number(value).filter(|v| v.abs() <= 90.0)
}

fn longitude(value: &Option<Loose>) -> Option<f64> {
    number(value).filter(|v| v.abs() <= 180.0)
}

fn risk(value: &Option<Loose>) -> Option<f64> {
    number(value).filter(|v| (0.0..=1.0).contains(v))
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn position(raw: RawPosition) -> Option<PositionUpdate> {
    let timestamp = match raw.timestamp.as_deref() {
        Some(ts) => Some(parse_timestamp(ts)?),
        None => None,
    };

    Some(PositionUpdate {
        mmsi: mmsi(&raw.mmsi)?,
        vessel_type: text(raw.vessel_type),
        latitude: latitude(&raw.latitude)?,
        longitude: longitude(&raw.longitude)?,
        cog: number(&raw.cog),
        sog: number(&raw.sog),
        name: text(raw.name),
        timestamp,
        length: number(&raw.length),
    })
}

fn forecast_point(raw: RawForecastPoint) -> Option<(Mmsi, ForecastPoint)> {
    let point = ForecastPoint {
        timestamp: parse_timestamp(raw.timestamp.as_deref()?)?,
        latitude: latitude(&raw.latitude)?,
        longitude: longitude(&raw.longitude)?,
    };
    Some((mmsi(&raw.mmsi)?, point))
}

fn encounter(raw: RawEncounter, variant: EncounterVariant) -> Option<VesselEncounter> {
    let mmsi_1 = mmsi(&raw.vessel_1)?;
    let mmsi_2 = mmsi(&raw.vessel_2)?;
    if mmsi_1 == mmsi_2 {
        return None;
    }

    let cri = risk(&raw.cri);
    let future_cri = risk(&raw.future_cri);
    let present = match variant {
        EncounterVariant::Current => cri.is_some(),
        EncounterVariant::Future => future_cri.is_some(),
    };
    if !present {
        return None;
    }

    Some(VesselEncounter {
        vessel_1: EncounteringPairVessel {
            mmsi: mmsi_1,
            latitude: latitude(&raw.vessel_1_latitude),
            longitude: longitude(&raw.vessel_1_longitude),
            cog: number(&raw.vessel_1_cog),
            sog: number(&raw.vessel_1_sog),
            length: number(&raw.vessel_1_length),
        },
        vessel_2: EncounteringPairVessel {
            mmsi: mmsi_2,
            latitude: latitude(&raw.vessel_2_latitude),
            longitude: longitude(&raw.vessel_2_longitude),
            cog: number(&raw.vessel_2_cog),
            sog: number(&raw.vessel_2_sog),
            length: number(&raw.vessel_2_length),
        },
        distance: number(&raw.distance),
        rel_movement_direction: number(&raw.rel_movement_direction),
        azimuth_target_to_own: number(&raw.azimuth_target_to_own),
        start_time: raw.start_time.as_deref().and_then(parse_timestamp),
        end_time: raw.end_time.as_deref().and_then(parse_timestamp),
        duration: number(&raw.duration),
        cri,
        future_cri,
    })
}
