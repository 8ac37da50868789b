//! Fuzz target: host serial line decoders
//!
//! Arbitrary (possibly non-UTF-8) input to `decode_line` and
//! `HostCommand::decode`. Neither may panic.
//!
//! cargo fuzz run fuzz_host_line

#![no_main]

use gridnode::protocol::{CommandTable, Crc8, HostCommand, decode_line};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };
    let table = CommandTable::default();
    let crc = Crc8::new(0x07);
    let _ = decode_line(&table, &crc, line);
    let _ = HostCommand::decode(&table, &crc, line);
});
