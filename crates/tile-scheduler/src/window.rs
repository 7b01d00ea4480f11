//! Visible-window calculator.
//!
//! Maps the viewport onto a contiguous index range of the remote roster.
//! Two strategies share one contract:
//!
//! - **Paged**: fixed-size pages selected by page number. The last page is
//!   always full, pulled back from the tail when the roster does not divide
//!   evenly.
//! - **Scroll**: a virtualized list selected by scroll offset. Besides the
//!   on-screen range it reports a buffered "materialized" range and the
//!   spacer heights a host needs to reserve scroll space.

use crate::config::SchedulerSettings;
use crate::layout::page_geometry;
use serde::Serialize;

/// Half-open range `[start, end)` into the remote subsequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisibleWindow {
    pub start: usize,
    pub end: usize,
    /// Tiles per screen.
    pub page_size: usize,
    /// Number of remote participants the window indexes into.
    pub total: usize,
}

impl VisibleWindow {
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    /// Whether the viewer is at the head of the roster (first page, or
    /// scrolled to the top).
    #[must_use]
    pub fn is_first_page(&self) -> bool {
        self.start == 0
    }

    /// Whether the window reaches the tail of the roster.
    #[must_use]
    pub fn is_last_page(&self) -> bool {
        self.end >= self.total
    }
}

/// Current position within the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ViewMode {
    /// One-based page number.
    Paged { page: usize },
    /// Scroll offset in pixels.
    Scroll { scroll_top: f64 },
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Paged { page: 1 }
    }
}

/// Pagination controls state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Current page after clamping.
    pub page: usize,
    pub total_pages: usize,
}

/// Virtualization state for the scroll strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollExtent {
    pub materialized_start: usize,
    pub materialized_end: usize,
    pub item_height: f64,
    pub leading_spacer: f64,
    pub trailing_spacer: f64,
}

/// Output of the calculator for either strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowLayout {
    pub visible: VisibleWindow,
    pub page: Option<PageInfo>,
    pub scroll: Option<ScrollExtent>,
}

/// Compute the paged window.
///
/// The page is clamped into `1..=total_pages`; departures can leave the
/// viewer past the end, in which case they land on the new last page.
#[must_use]
pub fn paged_window(total: usize, page_size: usize, page: usize) -> (VisibleWindow, PageInfo) {
    let page_size = page_size.max(1);
    let total_pages = total.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);

    let mut start = (page - 1) * page_size;
    let mut end = page * page_size;
    if end > total {
        end = total;
        start = total.saturating_sub(page_size);
    }

    (
        VisibleWindow {
            start,
            end,
            page_size,
            total,
        },
        PageInfo { page, total_pages },
    )
}

/// Height of one list item: tile height at the configured aspect ratio plus
/// the inter-tile gap.
#[must_use]
pub fn scroll_item_height(settings: &SchedulerSettings) -> f64 {
    let aspect = if settings.aspect_ratio.is_finite() && settings.aspect_ratio > 0.0 {
        settings.aspect_ratio
    } else {
        crate::layout::DEFAULT_ASPECT_RATIO
    };
    (f64::from(settings.scroll_tile_width) / aspect + f64::from(settings.tile_gap)).max(1.0)
}

/// Clamp `[start, start + count)` to `total`, pulling `start` back so that
/// `count` items stay in range whenever the roster has that many.
fn clamp_run(start: usize, count: usize, total: usize) -> (usize, usize) {
    let end = start.saturating_add(count).min(total);
    let start = start.min(end.saturating_sub(count));
    (start, end)
}

/// Compute the continuous-scroll window.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn scroll_window(
    total: usize,
    scroll_top: f64,
    viewport_height: u32,
    settings: &SchedulerSettings,
) -> (VisibleWindow, ScrollExtent) {
    let item_height = scroll_item_height(settings);
    let scroll_top = if scroll_top.is_finite() {
        scroll_top.max(0.0)
    } else {
        0.0
    };

    let on_screen = ((f64::from(viewport_height) / item_height).ceil() as usize).max(1);
    let buffer = settings.max_scroll_buffer.min(on_screen.saturating_mul(2));
    let materialized_count = on_screen + buffer;

    let first_on_screen = (scroll_top / item_height).floor() as usize;
    let (start, end) = clamp_run(first_on_screen, on_screen, total);

    let lead_in = (buffer / 2) as f64 * item_height;
    let first_materialized = ((scroll_top - lead_in).max(0.0) / item_height).floor() as usize;
    let (materialized_start, materialized_end) =
        clamp_run(first_materialized, materialized_count, total);

    (
        VisibleWindow {
            start,
            end,
            page_size: on_screen,
            total,
        },
        ScrollExtent {
            materialized_start,
            materialized_end,
            item_height,
            leading_spacer: materialized_start as f64 * item_height,
            trailing_spacer: (total - materialized_end) as f64 * item_height,
        },
    )
}

/// Compute the window for the active strategy.
#[must_use]
pub fn compute(
    mode: ViewMode,
    total: usize,
    width: u32,
    height: u32,
    settings: &SchedulerSettings,
) -> WindowLayout {
    match mode {
        ViewMode::Paged { page } => {
            let geometry = page_geometry(
                width,
                height,
                settings.aspect_ratio,
                settings.min_tile_width,
                settings.max_tiles_per_page,
            );
            let (visible, info) = paged_window(total, geometry.page_size, page);
            WindowLayout {
                visible,
                page: Some(info),
                scroll: None,
            }
        }
        ViewMode::Scroll { scroll_top } => {
            let (visible, extent) = scroll_window(total, scroll_top, height, settings);
            WindowLayout {
                visible,
                page: None,
                scroll: Some(extent),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn list_settings() -> SchedulerSettings {
        // 160 / 1.6 + 0 = 100px items keep the arithmetic readable.
        SchedulerSettings {
            aspect_ratio: 1.6,
            scroll_tile_width: 160,
            tile_gap: 0,
            max_scroll_buffer: 4,
            ..SchedulerSettings::default()
        }
    }

    #[test]
    fn test_paged_first_page() {
        let (window, info) = paged_window(10, 4, 1);
        assert_eq!((window.start, window.end), (0, 4));
        assert_eq!(info.total_pages, 3);
        assert!(window.is_first_page());
        assert!(!window.is_last_page());
    }

    #[test]
    fn test_paged_last_page_is_full() {
        let (window, info) = paged_window(10, 4, 3);
        assert_eq!((window.start, window.end), (6, 10));
        assert_eq!(window.len(), 4);
        assert_eq!(info.page, 3);
        assert!(window.is_last_page());
    }

    #[test]
    fn test_paged_page_clamped_after_departures() {
        let (window, info) = paged_window(5, 4, 7);
        assert_eq!(info.page, 2);
        assert_eq!(info.total_pages, 2);
        assert_eq!((window.start, window.end), (1, 5));
    }

    #[test]
    fn test_paged_short_roster() {
        let (window, info) = paged_window(2, 12, 1);
        assert_eq!((window.start, window.end), (0, 2));
        assert_eq!(info.total_pages, 1);
        assert!(window.is_first_page() && window.is_last_page());
    }

    #[test]
    fn test_paged_empty_roster() {
        let (window, info) = paged_window(0, 12, 3);
        assert!(window.is_empty());
        assert_eq!(info.page, 1);
    }

    #[test]
    fn test_scroll_top_of_list() {
        let settings = list_settings();
        let (window, extent) = scroll_window(20, 0.0, 300, &settings);

        assert_eq!((window.start, window.end), (0, 3));
        assert_eq!(window.page_size, 3);
        // 3 on screen + min(4, 6) buffer.
        assert_eq!((extent.materialized_start, extent.materialized_end), (0, 7));
        assert!((extent.leading_spacer - 0.0).abs() < f64::EPSILON);
        assert!((extent.trailing_spacer - 1300.0).abs() < 1e-9);
    }

    #[test]
    fn test_scroll_middle_of_list() {
        let settings = list_settings();
        let (window, extent) = scroll_window(20, 1000.0, 300, &settings);

        assert_eq!((window.start, window.end), (10, 13));
        // Materialized run starts half a buffer (2 items) above the viewport.
        assert_eq!((extent.materialized_start, extent.materialized_end), (8, 15));
        assert!((extent.leading_spacer - 800.0).abs() < 1e-9);
        assert!((extent.trailing_spacer - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_scroll_past_end_keeps_constant_count() {
        let settings = list_settings();
        let (window, extent) = scroll_window(20, 5000.0, 300, &settings);

        assert_eq!((window.start, window.end), (17, 20));
        assert_eq!((extent.materialized_start, extent.materialized_end), (13, 20));
        assert!((extent.trailing_spacer - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scroll_short_list() {
        let settings = list_settings();
        let (window, extent) = scroll_window(2, 0.0, 300, &settings);
        assert_eq!((window.start, window.end), (0, 2));
        assert_eq!((extent.materialized_start, extent.materialized_end), (0, 2));
    }

    #[test]
    fn test_scroll_negative_offset_treated_as_top() {
        let settings = list_settings();
        let (window, _) = scroll_window(20, -50.0, 300, &settings);
        assert_eq!(window.start, 0);
    }

    #[test]
    fn test_compute_dispatches_by_mode() {
        let settings = SchedulerSettings::default();

        let paged = compute(ViewMode::Paged { page: 1 }, 30, 1280, 720, &settings);
        assert_eq!(paged.visible.page_size, 12);
        assert!(paged.page.is_some() && paged.scroll.is_none());

        let scrolled = compute(ViewMode::Scroll { scroll_top: 0.0 }, 30, 1280, 720, &settings);
        assert!(scrolled.page.is_none() && scrolled.scroll.is_some());
    }
}
