//! Mock deployments for testing without network access.
//!
//! This module provides a configurable transport that simulates a deployed
//! web application in various states of health.


pub use site::*;
