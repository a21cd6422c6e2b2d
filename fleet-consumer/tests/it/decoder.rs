use chrono::{TimeZone, Utc};
use fleet_consumer::{decoder::decode, error::Error};
use fleet_core::{EncounterVariant, Mmsi, UpdateBatch};
use serde_json::json;

fn decode_json(name: &str, data: serde_json::Value) -> fleet_core::DecodedBatch {
    decode(name, &data.to_string()).unwrap()
}

#[test]
fn test_position_records_are_normalized() {
    let decoded = decode_json(
        "ais",
        json!([
            {
                "mmsi": 219000001,
                "type of mobile": "Class A",
                "latitude": 56.0,
                "longitude": 9.0,
                "cog": "90.5",
                "sog": 10,
                "name": " NORDIC STAR ",
                "timestamp": "12/09/2024 08:30:00"
            },
            {
                "MMSI": "219000002",
                "Latitude": "55.5",
                "Longitude": 10.25,
                "Timestamp": "2024-09-12 08:31:00"
            }
        ]),
    );

    assert_eq!(decoded.skipped, 0);
    let UpdateBatch::Position(positions) = decoded.batch else {
        panic!("expected a position batch");
    };
    assert_eq!(positions.len(), 2);

    let first = &positions[0];
    assert_eq!(first.mmsi, Mmsi::from(219000001));
    assert_eq!(first.vessel_type.as_deref(), Some("Class A"));
    assert_eq!(first.cog, Some(90.5));
    assert_eq!(first.sog, Some(10.0));
    assert_eq!(first.name.as_deref(), Some("NORDIC STAR"));
    assert_eq!(
        first.timestamp,
        Some(Utc.with_ymd_and_hms(2024, 9, 12, 8, 30, 0).unwrap())
    );

    let second = &positions[1];
    assert_eq!(second.mmsi, Mmsi::from(219000002));
    assert_eq!(second.latitude, 55.5);
    assert_eq!(second.vessel_type, None);
    assert_eq!(second.cog, None);
    assert_eq!(second.name, None);
}

#[test]
fn test_malformed_position_records_are_skipped() {
    let decoded = decode_json(
        "ais",
        json!([
            { "latitude": 56.0, "longitude": 9.0 },
            { "mmsi": "", "latitude": 56.0, "longitude": 9.0 },
            { "mmsi": 1, "latitude": "n/a", "longitude": 9.0 },
            { "mmsi": 2, "latitude": 91.0, "longitude": 181.0 },
            { "mmsi": 3, "latitude": 56.0, "longitude": 9.0, "timestamp": "soon" },
            "not a record",
            { "mmsi": 4, "latitude": 56.0, "longitude": 9.0 }
        ]),
    );

    assert_eq!(decoded.skipped, 6);
    assert_eq!(decoded.batch.len(), 1);
}

#[test]
fn test_forecast_points_are_grouped_in_arrival_order() {
    let decoded = decode_json(
        "prediction",
        json!([
            { "mmsi": 2, "timestamp": "2024-09-12T08:40:00Z", "latitude": 56.2, "longitude": 9.1 },
            { "mmsi": 1, "timestamp": "2024-09-12T08:50:00Z", "latitude": 55.0, "longitude": 8.0 },
            { "mmsi": 2, "timestamp": "2024-09-12T08:35:00Z", "latitude": 56.1, "longitude": 9.0 },
            { "mmsi": 1, "latitude": 55.0, "longitude": 8.0 }
        ]),
    );

    assert_eq!(decoded.skipped, 1);
    let UpdateBatch::Forecast(forecasts) = decoded.batch else {
        panic!("expected a forecast batch");
    };
    assert_eq!(forecasts.len(), 2);
    assert_eq!(forecasts[0].mmsi, Mmsi::from(1));
    assert_eq!(forecasts[0].points.len(), 1);

    let lats: Vec<f64> = forecasts[1].points.iter().map(|p| p.latitude).collect();
    assert_eq!(forecasts[1].mmsi, Mmsi::from(2));
    assert_eq!(lats, vec![56.2, 56.1]);
}

#[test]
fn test_encounter_records_rebuild_both_parties() {
    let decoded = decode_json(
        "cri",
        json!([{
            "vessel_1": 1,
            "vessel_2": "2",
            "vessel_1_latitude": 56.0,
            "vessel_1_longitude": 9.0,
            "vessel_1_sog": 10.0,
            "vessel_2_length": "120",
            "euclidian_dist": 0.3,
            "start_time": "2024-09-12T08:30:00",
            "ves_cri": 0.95,
            "future_cri": 0.5
        }]),
    );

    let UpdateBatch::Encounter {
        variant,
        encounters,
    } = decoded.batch
    else {
        panic!("expected an encounter batch");
    };
    assert_eq!(variant, EncounterVariant::Current);
    let encounter = &encounters[0];
    assert_eq!(encounter.vessel_1.mmsi, Mmsi::from(1));
    assert_eq!(encounter.vessel_1.latitude, Some(56.0));
    assert_eq!(encounter.vessel_2.mmsi, Mmsi::from(2));
    assert_eq!(encounter.vessel_2.length, Some(120.0));
    assert_eq!(encounter.distance, Some(0.3));
    assert_eq!(encounter.cri, Some(0.95));
    assert_eq!(encounter.future_cri, Some(0.5));
    assert!(encounter.start_time.is_some());
}

#[test]
fn test_invalid_encounters_are_skipped() {
    let decoded = decode_json(
        "future_cri",
        json!([
            { "vessel_1": 1, "vessel_2": 1, "future_cri": 0.5 },
            { "vessel_1": 1, "future_cri": 0.5 },
            { "vessel_1": 1, "vessel_2": 2, "ves_cri": 0.5 },
            { "vessel_1": 1, "vessel_2": 2, "future_cri": 1.5 },
            { "vessel_1": 1, "vessel_2": 2, "future_cri": "0.4" }
        ]),
    );

    assert_eq!(decoded.skipped, 4);
    let UpdateBatch::Encounter {
        variant,
        encounters,
    } = decoded.batch
    else {
        panic!("expected an encounter batch");
    };
    assert_eq!(variant, EncounterVariant::Future);
    assert_eq!(encounters[0].future_cri, Some(0.4));
    assert_eq!(encounters[0].cri, None);
}

#[test]
fn test_batch_level_errors() {
    assert!(matches!(
        decode("weather", "[]"),
        Err(Error::UnknownEvent { .. })
    ));
    assert!(matches!(decode("ais", "{"), Err(Error::Json { .. })));
    assert!(matches!(
        decode("ais", r#"{"mmsi": 1}"#),
        Err(Error::NotAnArray { found: "an object", .. })
    ));
}

#[test]
fn test_empty_payload_is_an_empty_batch() {
    let decoded = decode_json("cri", json!([]));
    assert!(decoded.batch.is_empty());
    assert_eq!(decoded.skipped, 0);
}
