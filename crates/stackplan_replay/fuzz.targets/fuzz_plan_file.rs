#![no_main]
use libfuzzer_sys::fuzz_target;
use stackplan_log::PlanFileReader;
use stackplan_replay::load_from_records;

fuzz_target!(|data: &[u8]| {
    // Arbitrary file contents must be rejected cleanly, never panic
    let Ok(reader) = PlanFileReader::new(data) else {
        return;
    };
    if let Ok(records) = reader.read_all() {
        let _ = load_from_records(&records);
    }
});
