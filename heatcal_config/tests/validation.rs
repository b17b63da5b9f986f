use heatcal_config::{ShortfallPolicy, load_toml};
use rstest::rstest;

#[rstest]
#[case("[calibration]\nfull_duty = 0.0", "must differ")]
#[case("[calibration]\nfull_duty = -0.0", "must differ")]
#[case("[calibration]\nmin_base_samples = 0", "min_base_samples must be >= 1")]
#[case("[calibration]\nmin_max_samples = 0", "min_max_samples must be >= 1")]
#[case("[calibration]\nprecision = 13", "precision must be <= 12")]
#[case("[calibration.max_range]\nabove = 3.0\nbelow = 1.5", "above (3) must be < below (1.5)")]
#[case("[logging]\nrotation = \"weekly\"", "rotation must be one of")]
#[case("[device]\nboard_id = \"abc-01\"", "board_id requires device.id_table")]
fn rejects_invalid_settings(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        err.to_string().contains(needle),
        "expected {needle:?} in {err}"
    );
}

#[rstest]
fn accepts_full_config() {
    let toml = r#"
[device]
board_id = "abc-01"
id_table = "etc/mcu_uuid-abc_ids.csv"
fallback_id = "36125667584709914216457778738"

[calibration]
full_duty = 1000
off_duty = 0
min_base_samples = 20
min_max_samples = 6
precision = 2
on_shortfall = "collect"

[calibration.base_range]
below = 0.8

[calibration.max_range]
above = 1.0
below = 4.0

[logging]
file = "logs/heatcal.log"
level = "debug"
rotation = "daily"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config");
    assert_eq!(cfg.calibration.full_duty, 1000.0);
    assert_eq!(cfg.calibration.min_base_samples, 20);
    assert_eq!(cfg.calibration.precision, Some(2));
    assert_eq!(cfg.calibration.on_shortfall, ShortfallPolicy::Collect);
    assert_eq!(cfg.calibration.base_range.below, Some(0.8));
    assert_eq!(cfg.calibration.base_range.above, None);
    assert_eq!(
        cfg.device.fallback_id,
        Some(36_125_667_584_709_914_216_457_778_738)
    );
}

#[rstest]
fn unknown_range_key_is_a_parse_error() {
    let toml = "[calibration.base_range]\nbellow = 1.0\n";
    assert!(load_toml(toml).is_err());
}

#[rstest]
fn unbounded_range_is_valid() {
    let toml = "[calibration.max_range]\nabove = 1.5\n";
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("one-sided range is valid");
    assert_eq!(cfg.calibration.max_range.below, None);
}

#[rstest]
fn shipped_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../etc/heatcal.toml");
    let text = std::fs::read_to_string(path).expect("read etc/heatcal.toml");
    let cfg = load_toml(&text).expect("parse TOML");
    cfg.validate().expect("valid config");
    assert_eq!(cfg.device.board_id.as_deref(), Some("abc-01"));
}
