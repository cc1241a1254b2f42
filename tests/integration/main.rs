//! Host-side integration test harness.

mod activation_tests;
mod mock_hw;
