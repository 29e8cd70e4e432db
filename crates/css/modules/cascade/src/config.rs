//! Inspector configuration.
//!
//! Configuration can be loaded from environment variables or constructed
//! programmatically.

use crate::filter::SourceFilter;
use css_media_queries::Viewport;
use std::env;

/// Initial settings for a resolver and its reference host.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InspectorConfig {
    /// Which stylesheet origins are shown
    pub source_filter: SourceFilter,
    /// Viewport media queries are evaluated against
    pub viewport: Viewport,
}

impl InspectorConfig {
    #[inline]
    #[must_use]
    pub const fn new(source_filter: SourceFilter, viewport: Viewport) -> Self {
        Self {
            source_filter,
            viewport,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `CSS_INSPECTOR_SOURCE_FILTER`: `user`, `ua`, or a stylesheet href (default: `user`)
    /// - `CSS_INSPECTOR_VIEWPORT_WIDTH`: viewport width in CSS pixels (default: 1280)
    /// - `CSS_INSPECTOR_VIEWPORT_HEIGHT`: viewport height in CSS pixels (default: 720)
    ///
    /// Unparseable values fall back to the defaults.
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let source_filter = env::var("CSS_INSPECTOR_SOURCE_FILTER")
            .ok()
            .filter(|val| !val.trim().is_empty())
            .and_then(|val| val.parse::<SourceFilter>().ok())
            .unwrap_or(defaults.source_filter);
        let width_px = read_dimension("CSS_INSPECTOR_VIEWPORT_WIDTH")
            .unwrap_or(defaults.viewport.width_px);
        let height_px = read_dimension("CSS_INSPECTOR_VIEWPORT_HEIGHT")
            .unwrap_or(defaults.viewport.height_px);
        Self {
            source_filter,
            viewport: Viewport {
                width_px,
                height_px,
            },
        }
    }
}

fn read_dimension(name: &str) -> Option<f32> {
    env::var(name)
        .ok()
        .and_then(|val| val.trim().parse::<f32>().ok())
        .filter(|px| px.is_finite() && *px >= 0.0)
}
