use crate::error::StreamError;

/// Default smallest output buffer the adapter allocates (1 KiB).
pub const DEFAULT_MIN_CAPACITY: usize = 1024;

/// Default hard ceiling on a single output buffer (64 KiB).
pub const DEFAULT_MAX_CAPACITY: usize = 64 * 1024;

/// Default ratio between an input chunk's length and the output buffer
/// sized for it. Large enough that one engine call usually suffices.
pub const DEFAULT_GROWTH_FACTOR: f64 = 1.1;

/// Output buffer sizing policy for a [`StreamAdapter`](crate::StreamAdapter).
///
/// ```text
/// ┌───────────────┬─────────────────────────────────────────────────────┐
/// │ Field         │ Purpose                                             │
/// ├───────────────┼─────────────────────────────────────────────────────┤
/// │ min_capacity  │ Floor for every buffer, including the initial one   │
/// │ max_capacity  │ Ceiling regardless of input chunk size              │
/// │ growth_factor │ Multiplier applied to the chunk length per cycle    │
/// └───────────────┴─────────────────────────────────────────────────────┘
/// ```
///
/// Per cycle the adapter computes
/// `max(min(ceil(len * growth_factor), max_capacity), min_capacity)` and
/// only allocates when the current buffer is smaller than that target.
/// The finish cycle uses `max_capacity` as its estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdapterConfig {
    pub min_capacity: usize,
    pub max_capacity: usize,
    pub growth_factor: f64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            min_capacity: DEFAULT_MIN_CAPACITY,
            max_capacity: DEFAULT_MAX_CAPACITY,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl AdapterConfig {
    #[must_use]
    pub fn with_min_capacity(mut self, min_capacity: usize) -> Self {
        self.min_capacity = min_capacity;
        self
    }

    #[must_use]
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    #[must_use]
    pub fn with_growth_factor(mut self, growth_factor: f64) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    /// Check the policy is usable.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidConfig`] if the floor is zero, the ceiling is
    /// below the floor, or the growth factor is not a finite value >= 1.
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.min_capacity == 0 {
            return Err(StreamError::InvalidConfig {
                reason: "min_capacity must be at least 1 byte",
            });
        }
        if self.max_capacity < self.min_capacity {
            return Err(StreamError::InvalidConfig {
                reason: "max_capacity must not be below min_capacity",
            });
        }
        if !self.growth_factor.is_finite() || self.growth_factor < 1.0 {
            return Err(StreamError::InvalidConfig {
                reason: "growth_factor must be a finite value >= 1.0",
            });
        }
        Ok(())
    }

    /// Buffer capacity targeted for a chunk of `len` input bytes.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn target_capacity(&self, len: usize) -> usize {
        let scaled = (len as f64 * self.growth_factor).ceil();
        let capped = if scaled >= self.max_capacity as f64 {
            self.max_capacity
        } else {
            scaled as usize
        };
        capped.max(self.min_capacity)
    }
}
