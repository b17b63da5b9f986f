#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse or validation errors are fine; panics are not.
    if let Ok(cfg) = toml::from_str::<heatcal_config::Config>(data) {
        if cfg.validate().is_ok() {
            let core: heatcal_core::CalibrationCfg = (&cfg.calibration).into();
            assert!(core.validate().is_ok());
        }
    }
});
