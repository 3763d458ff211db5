//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the full service against
//! mock adapters and the host-simulated multi-rate timer. All tests run on
//! the host (x86_64) with no real hardware required.

mod mock_hw;
mod session_flow_tests;
mod timing_tests;
