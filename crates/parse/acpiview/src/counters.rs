//! Error and warning tallies.

/// Error and warning counts accumulated while decoding tables.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    errors: u32,
    warnings: u32,
}

impl Counters {
    /// Resets both counts to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records one error.
    pub fn increment_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
    }

    /// Records one warning.
    pub fn increment_warning(&mut self) {
        self.warnings = self.warnings.saturating_add(1);
    }

    /// Adds the counts recorded in `other`.
    pub fn accumulate(&mut self, other: Counters) {
        self.errors = self.errors.saturating_add(other.errors);
        self.warnings = self.warnings.saturating_add(other.warnings);
    }

    /// Returns the number of errors recorded.
    #[must_use]
    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Returns the number of warnings recorded.
    #[must_use]
    pub fn warnings(&self) -> u32 {
        self.warnings
    }

    /// Returns `true` if nothing was reported.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors == 0 && self.warnings == 0
    }
}
