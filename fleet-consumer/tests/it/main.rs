#![deny(warnings)]
#![deny(rust_2018_idioms)]

use std::time::Duration;

use config::{Config, File};
use fleet_consumer::settings::{Environment, Settings};

pub mod decoder;

fn settings(file: &str, environment: &str) -> Settings {
    Config::builder()
        .add_source(File::with_name(file).required(true))
        .set_override("environment", environment)
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize::<Settings>()
        .unwrap()
}

#[test]
fn test_local_settings_are_valid() {
    let settings = settings("config/local.yml", "Local");
    assert_eq!(settings.environment, Environment::Local);
    assert_eq!(settings.commit_interval, Duration::from_millis(250));
    assert_eq!(settings.reconcile.forecast_tolerance, Duration::from_secs(60));
    assert_eq!(
        settings.reconcile.accepted_vessel_types,
        Some(vec!["Class A".to_string()])
    );
    settings.clustering.validate().unwrap();
}

#[test]
fn test_development_settings_are_valid() {
    let settings = settings("config/development.yml", "Development");
    settings.clustering.validate().unwrap();
}

#[test]
fn test_production_settings_are_valid() {
    let settings = settings("config/production.yml", "Production");
    assert_eq!(settings.view_max_zoom, 18);
    settings.clustering.validate().unwrap();
}

#[test]
fn test_test_settings_are_valid() {
    let settings = settings("config/test.yml", "Test");
    assert_eq!(settings.reconcile.accepted_vessel_types, None);
}

#[test]
fn test_environment_parses_case_insensitively() {
    assert_eq!("local".parse::<Environment>().unwrap(), Environment::Local);
    assert_eq!(
        "PRODUCTION".parse::<Environment>().unwrap(),
        Environment::Production
    );
    assert!("staging".parse::<Environment>().is_err());
}
