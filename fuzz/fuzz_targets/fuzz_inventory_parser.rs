//! Fuzz target for inventory TOML parsing.
//!
//! Goal: The parsers should **never panic** on any input.
//! They may return errors, but panics are unacceptable.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_inventory_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only test valid UTF-8 strings (inventory files must be UTF-8)
    if let Ok(text) = std::str::from_utf8(data) {
        // Policies inventory parsing - should never panic
        let _ = confguard_store::fuzz::parse_policies(text);

        // Devices inventory parsing - should never panic
        let _ = confguard_store::fuzz::parse_devices(text);
    }
});
