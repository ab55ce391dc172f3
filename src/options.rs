//! Configuration options for zipson encoding.
//!
//! The decoder needs no configuration: every choice below is visible in the
//! encoded text itself.
//!
//! ## Examples
//!
//! ```rust
//! use serde_zipson::{encode_with_options, CompressOptions, Value};
//!
//! let options = CompressOptions::new().with_full_precision_floats(true);
//! let text = encode_with_options(&Value::Float(0.1), options).unwrap();
//! assert_eq!(text, "£0,1");
//! ```

/// Default nesting bound for template detection.
pub const DEFAULT_TEMPLATE_MAX_DEPTH: usize = 6;
/// Default per-level key bound for template detection.
pub const DEFAULT_TEMPLATE_MAX_KEYS: usize = 10;

/// Options controlling how values are compressed.
///
/// # Examples
///
/// ```rust
/// use serde_zipson::CompressOptions;
///
/// let options = CompressOptions::new()
///     .with_detect_utc_timestamps(true)
///     .with_template_max_depth(3);
/// assert!(options.detect_utc_timestamps);
/// assert_eq!(options.template_max_keys, 10);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressOptions {
    /// Store strings shaped like `2020-01-01T00:00:00.000Z` as dates.
    pub detect_utc_timestamps: bool,
    /// Write floats exactly instead of to three fractional digits.
    pub full_precision_floats: bool,
    /// Deepest mapping nesting a template may describe.
    pub template_max_depth: usize,
    /// Most keys a template may hold at any one level.
    pub template_max_keys: usize,
}

impl Default for CompressOptions {
    fn default() -> Self {
        CompressOptions {
            detect_utc_timestamps: false,
            full_precision_floats: false,
            template_max_depth: DEFAULT_TEMPLATE_MAX_DEPTH,
            template_max_keys: DEFAULT_TEMPLATE_MAX_KEYS,
        }
    }
}

impl CompressOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_detect_utc_timestamps(mut self, detect: bool) -> Self {
        self.detect_utc_timestamps = detect;
        self
    }

    #[must_use]
    pub fn with_full_precision_floats(mut self, full: bool) -> Self {
        self.full_precision_floats = full;
        self
    }

    /// Sets the template depth bound. Output encoded with a non-default bound
    /// still decodes with any decoder.
    #[must_use]
    pub fn with_template_max_depth(mut self, depth: usize) -> Self {
        self.template_max_depth = depth;
        self
    }

    #[must_use]
    pub fn with_template_max_keys(mut self, keys: usize) -> Self {
        self.template_max_keys = keys;
        self
    }
}
