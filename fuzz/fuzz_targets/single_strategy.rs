#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use tagscout::config::ParseOptions;
use tagscout::probe::Probe;
use tagscout::registry::{Registry, Strategy};

// The first byte picks the strategy, so each one sees inputs its signature check would reject
fuzz_target!(|data: Vec<u8>| {
	let Some((selector, file)) = data.split_first() else {
		return;
	};

	let strategy = Strategy::ALL[usize::from(*selector) % Strategy::ALL.len()];
	let registry = Registry::with_strategies(&[strategy]);

	let Ok(mut probe) = Probe::new(Cursor::new(file.to_vec())) else {
		return;
	};

	let buffers = probe.buffers().clone();
	let Ok(locations) = strategy.detect(probe.source(), &buffers, ParseOptions::new()) else {
		return;
	};

	for location in locations {
		let _ = probe.parse(&registry, &location);
	}
});
