//! Fuzz target: bus packet decoders
//!
//! Feeds arbitrary bytes to both the master → node and node → master
//! decoders. Anything that decodes as a downstream packet must encode back
//! to a packet that decodes the same way.
//!
//! cargo fuzz run fuzz_bus_packet

#![no_main]

use gridnode::protocol::{CommandTable, Downstream, UpstreamFrame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let table = CommandTable::default();

    let _ = UpstreamFrame::decode(&table, data);

    if let Ok(packet) = Downstream::decode(&table, data) {
        let again = Downstream::decode(&table, &packet.encode(&table)).expect("re-decodes");
        assert_eq!(again, packet);
    }
});
