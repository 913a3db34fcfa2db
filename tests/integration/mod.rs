//! Integration tests for deploy-check.
//!
//! These tests run whole validations against simulated deployments.

pub mod full_run_tests;
pub mod output_tests;
