/// Knobs for [`crate::recognize_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognizeOptions {
    /// Re-check that the materialized intervals reproduce the adjacency exactly. A mismatch is
    /// reported as [`crate::Error::Internal`].
    pub verify_intervals: bool,
    /// Reconstruct the three connecting paths of an asteroidal triple.
    pub with_paths: bool,
}

impl Default for RecognizeOptions {
    fn default() -> Self {
        Self {
            verify_intervals: true,
            with_paths: true,
        }
    }
}

impl RecognizeOptions {
    pub fn strict() -> Self {
        Self {
            verify_intervals: true,
            with_paths: true,
        }
    }

    /// Skips the interval re-check.
    pub fn fast() -> Self {
        Self {
            verify_intervals: false,
            ..Self::default()
        }
    }
}
