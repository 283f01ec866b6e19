#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use tagscout::config::{ParseOptions, ParsingMode};
use tagscout::probe::Probe;
use tagscout::registry::Registry;

fuzz_target!(|data: Vec<u8>| {
	let registry = Registry::new();
	let options = ParseOptions::new()
		.parsing_mode(ParsingMode::Strict)
		.read_cover_art(false);

	if let Ok(probe) = Probe::new(Cursor::new(data)) {
		let mut probe = probe.options(options);
		for location in probe.detect(&registry) {
			let _ = probe.parse(&registry, &location);
		}
	}
});
