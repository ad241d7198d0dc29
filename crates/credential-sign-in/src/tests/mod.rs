//! Behaviour tests for the sign-in controller and driver.
//!
//! - `flows.rs`       - end-to-end scenarios (password only, wrong password, TOTP)
//! - `otp_entry.rs`   - code buffer handling and auto-submission
//! - `errors.rs`      - validation, unexpected failures, error clearing
//! - `reentrancy.rs`  - duplicate triggers and stale responses
//! - `driver.rs`      - the single-task event loop

mod flows;
mod harness;
