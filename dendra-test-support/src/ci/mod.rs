//! Environment-driven knobs shared by CI jobs and local test runs.

pub mod property_test_profile;
