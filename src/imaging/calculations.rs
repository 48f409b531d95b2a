//! Pure calculation functions for the resize decision.
//!
//! All functions here are pure and testable without any I/O or images.

use super::engine::Dimensions;
use super::params::ResampleFilter;

/// Target size as requested by the user. `None` means "keep the source's".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestedSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Outcome of [`plan_resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub target: Dimensions,
    /// True iff `target` differs from the source in either dimension.
    pub needed: bool,
    pub filter: ResampleFilter,
}

/// Parse one dimension field of user input.
///
/// Only positive base-10 integers count; anything else (empty, `abc`, `0`,
/// `-5`, `12.5`) is treated as unspecified.
///
/// # Examples
/// ```
/// # use rasterconv::imaging::parse_dimension;
/// assert_eq!(parse_dimension(" 120 "), Some(120));
/// assert_eq!(parse_dimension("0"), None);
/// assert_eq!(parse_dimension("wide"), None);
/// ```
pub fn parse_dimension(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|&value| value > 0)
}

/// Resolve the target dimensions for a conversion.
///
/// Each requested dimension that is absent or zero falls back to the source's
/// corresponding dimension. Aspect ratio is not preserved: an explicit width
/// with an absent height yields `(width, source.height)`.
///
/// # Examples
/// ```
/// # use rasterconv::imaging::{Dimensions, RequestedSize, ResampleFilter, plan_resize};
/// let plan = plan_resize(
///     Dimensions::new(200, 100),
///     RequestedSize { width: Some(100), height: None },
///     ResampleFilter::Lanczos3,
/// );
/// assert_eq!(plan.target, Dimensions::new(100, 100));
/// assert!(plan.needed);
/// ```
pub fn plan_resize(
    source: Dimensions,
    requested: RequestedSize,
    filter: ResampleFilter,
) -> ResizePlan {
    let width = requested
        .width
        .filter(|&w| w > 0)
        .unwrap_or(source.width);
    let height = requested
        .height
        .filter(|&h| h > 0)
        .unwrap_or(source.height);
    let target = Dimensions::new(width, height);

    ResizePlan {
        target,
        needed: target != source,
        filter,
    }
}
