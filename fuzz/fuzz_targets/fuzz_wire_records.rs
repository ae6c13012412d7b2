#![no_main]
use libfuzzer_sys::fuzz_target;

/// Feed arbitrary UTF-8 to both JSON boundary parsers. Malformed records,
/// fractional or negative quantities and legacy nullable fields must surface
/// as errors, never as panics.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = bom_recon::model::parse_line_items(s);
        let _ = bom_recon::model::parse_observation(s);
    }
});
