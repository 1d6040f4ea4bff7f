//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the oven and panel
//! services against mock I/O.  All tests run on the host with no real
//! display or link required.

mod mock_io;
mod oven_scenarios;
mod panel_sync_tests;
