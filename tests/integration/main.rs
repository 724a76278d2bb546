//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a subsystem against mock
//! adapters.  Everything runs on the host with no bus hardware.

mod lifecycle_tests;
mod mock_bus;
mod registry_tests;
