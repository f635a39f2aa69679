#![no_main]
use libfuzzer_sys::fuzz_target;
use stackplan_log::{registry, RawRecord};
use stackplan_replay::load_from_records;

fuzz_target!(|data: &[u8]| {
    // Spread the input over every known record type
    let type_ids: Vec<&str> = registry().type_ids().collect();
    let mut records = Vec::new();
    for (i, chunk) in data.chunks(32).enumerate() {
        let type_id = type_ids[i % type_ids.len()];
        records.push(RawRecord::new(type_id, chunk.to_vec()));
    }
    let first = load_from_records(&records);
    let second = load_from_records(&records);
    assert_eq!(first, second);
});
