use ta_core::config::{load_engine_config, EngineConfig};
use ta_core::indicators::IndicatorKind;
use ta_core::sweep::{generate_combinations, load_sweep_spec};

fn testdata(name: &str) -> String {
    format!("{}/../../testdata/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn engine_config_loads_from_file() {
    let cfg = load_engine_config(&testdata("engine.yaml"));
    assert_eq!(
        cfg,
        EngineConfig {
            block_size: 128,
            memory_limit_bytes: Some(268_435_456),
            threads: Some(4),
        }
    );
}

#[test]
fn missing_engine_config_falls_back_to_defaults() {
    let cfg = load_engine_config(&testdata("no_such_engine.yaml"));
    assert_eq!(cfg, EngineConfig::default());
}

#[test]
fn sweep_file_expands_to_cartesian_product() {
    let spec = load_sweep_spec(&testdata("sweep_bollinger.yaml")).unwrap();
    assert_eq!(spec.indicator, IndicatorKind::Bollinger);
    assert_eq!(spec.combination_count(), 18);

    let combos = generate_combinations(&spec.axes);
    assert_eq!(combos.len(), 18);
    assert_eq!(
        combos[0],
        vec![
            ("length".to_string(), 10.0),
            ("width".to_string(), 1.5),
            ("source".to_string(), 3.0),
        ]
    );
    assert_eq!(combos[17][0], ("length".to_string(), 50.0));
}

#[test]
fn missing_sweep_file_is_an_error() {
    assert!(load_sweep_spec(&testdata("no_such_sweep.yaml")).is_err());
}
