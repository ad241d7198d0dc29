//! One-time code entry policy.
//!
//! The code input has a fixed number of slots, so there is no submit button:
//! filling the last slot is the submission. Every change to the buffer goes
//! through [`OtpPolicy::normalize`] and [`OtpPolicy::classify`], and the
//! controller acts on the resulting [`OtpEntry`].

use crate::config::DEFAULT_OTP_LENGTH;

/// How far a buffer is from being a submittable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpEntry {
    /// Nothing typed. Leaves any displayed error alone, which is what the
    /// user sees right after a rejected code clears the slots.
    Empty,
    /// Some slots filled.
    Partial,
    /// Exactly the required length.
    Complete,
    /// More characters than slots. Never submitted.
    Overflow,
}

impl OtpEntry {
    /// Mid-entry states hide the previous error.
    pub fn clears_error(&self) -> bool {
        matches!(self, OtpEntry::Partial | OtpEntry::Overflow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    length: usize,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_OTP_LENGTH)
    }
}

impl OtpPolicy {
    pub const fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Apply the input medium's character rule.
    ///
    /// Only ASCII digits are accepted. A buffer with anything else is refused
    /// as a whole and the previous buffer stays in place.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        if raw.chars().all(|c| c.is_ascii_digit()) {
            Some(raw.to_string())
        } else {
            None
        }
    }

    pub fn classify(&self, buffer: &str) -> OtpEntry {
        let filled = buffer.chars().count();
        match filled {
            0 => OtpEntry::Empty,
            n if n == self.length => OtpEntry::Complete,
            n if n < self.length => OtpEntry::Partial,
            _ => OtpEntry::Overflow,
        }
    }
}
