#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use tagscout::probe::Probe;
use tagscout::registry::Registry;

fuzz_target!(|data: Vec<u8>| {
	let registry = Registry::new();
	if let Ok(mut probe) = Probe::new(Cursor::new(data)) {
		for location in probe.detect(&registry) {
			let _ = probe.parse(&registry, &location);
		}
	}
});
