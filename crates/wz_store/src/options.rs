//! Store configuration

use bon::Builder;

/// Options for how a [`crate::Store`] manages its units
///
/// ```
/// use wz_store::StoreOptions;
///
/// let options = StoreOptions::builder()
///     .max_cached_units(64)
///     .follow_cross_unit_links(true)
///     .build();
///
/// assert_eq!(options.max_cached_units, Some(64));
/// ```
#[derive(Debug, Clone, Copy, Default, Builder)]
pub struct StoreOptions {
    /// Number of parsed units kept before the least recently used clean ones are unparsed
    ///
    /// Unbounded when unset. Units with unsaved changes are never unparsed automatically.
    pub max_cached_units: Option<usize>,

    /// Fault in other units when a link points into them
    ///
    /// When unset, such links are reported as cross unit references and left alone.
    #[builder(default)]
    pub follow_cross_unit_links: bool,
}
