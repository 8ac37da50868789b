//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the master and node
//! services together on a simulated grid. All tests run on the host
//! (x86_64) with no real hardware required.

mod discovery_tests;
mod mock_hw;
mod recovery_tests;
mod streaming_tests;
