#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|words: (&str, &str, &str)| {
    let _ = heatcal_core::encode_mcu_uuid([words.0, words.1, words.2]);
});
