#![no_main]

use clusterhet::input::AnalysisInput;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Parsing and matrix validation must reject bad documents without panicking
        if let Ok(input) = AnalysisInput::from_json_str(text) {
            if let Ok((clusters, conditions, distances)) = input.into_parts() {
                let _ = clusterhet::analyze(&clusters, &conditions, &distances, 8, Some(0));
            }
        }
    }
});
