//! Loading configuration files from disk

use fairdice::{ConfigLoader, ConfigurationError, FairDiceError, GuessRange, LogLevel, Micros, Satoshis};
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"
        [verifier]
        max_concurrency = 8

        [logging]
        level = "debug"
        json = true

        [settings]
        base_pay_in = "0.00000001"
        max_allowed_pay_in = "-0.00000016"
        increase_on_lose_percent = 1
        reset_on_win = true
        reset_on_lose_max_bet = true
        guess_range = { low = 0, high = 989999 }
        max_bets = 100
        client_seed = 31337
        "#,
    );

    let config = ConfigLoader::new().with_path(file.path()).load_with_env(no_env).unwrap();

    assert_eq!(config.verifier.max_concurrency, 8);
    assert_eq!(config.verifier.event_buffer, 1024);
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert!(config.logging.json);

    let settings = config.settings.unwrap();
    assert_eq!(settings.base_pay_in, Satoshis::from_sat(-1));
    assert_eq!(settings.max_allowed_pay_in, Satoshis::from_sat(-16));
    assert_eq!(settings.increase_on_lose_percent, Micros::ONE);
    assert_eq!(settings.guess_range, GuessRange::new(0, 989_999).unwrap());
    assert_eq!(settings.client_seed, 31337);
}

#[test]
fn test_env_overrides_file() {
    let file = write_config("[verifier]\nmax_concurrency = 2\n");
    let config = ConfigLoader::new()
        .with_path(file.path())
        .load_with_env(|key| (key == "FAIRDICE_MAX_CONCURRENCY").then(|| "6".to_string()))
        .unwrap();
    assert_eq!(config.verifier.max_concurrency, 6);
}

#[test]
fn test_invalid_settings_rejected() {
    // cap smaller than the base stake
    let file = write_config(
        r#"
        [settings]
        base_pay_in = 10
        max_allowed_pay_in = 5
        guess_range = { low = 0, high = 499999 }
        "#,
    );
    let result = ConfigLoader::new().with_path(file.path()).load_with_env(no_env);
    assert!(matches!(
        result,
        Err(FairDiceError::Configuration(ConfigurationError::ValidationFailed(_)))
    ));
}

#[test]
fn test_unparsable_file() {
    let file = write_config("[verifier\nmax_concurrency = ");
    let result = ConfigLoader::new().with_path(file.path()).load_with_env(no_env);
    assert!(matches!(
        result,
        Err(FairDiceError::Configuration(ConfigurationError::LoadFailed(_)))
    ));
}
