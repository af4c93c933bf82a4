#![forbid(unsafe_code)]

//! Dialog sizing.
//!
//! [`compute_layout`] is a pure function of the dialog's size settings, its
//! measured chrome, the viewport and the content's natural height. The
//! manager measures those inputs and writes the result back as inline
//! styles. Because the natural height is read from the content element
//! (never from the box the layout sizes), running it twice against an
//! unchanged viewport gives the same layout.

use tarmac_core::geometry::{ScrollOffsets, Sides, Size};

use crate::dialog::{DeviceClass, DialogDescriptor, DialogPosition, HeightPolicy};

/// Fraction of the viewport height a non-phone dialog box may occupy.
pub const MAX_VIEWPORT_HEIGHT_RATIO: f64 = 0.8;

/// Fraction of the viewport width a dialog takes when its configured width
/// does not fit.
pub const FITTED_WIDTH_RATIO: f64 = 0.95;

/// Width reserved for the content wrapper's scrollbar.
pub const SCROLLBAR_ALLOWANCE: f64 = 20.0;

/// Distance from the scroll top of a phone-layout dialog.
pub const PHONE_TOP_OFFSET: f64 = 10.0;

/// Size settings taken from a [`DialogDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub width: f64,
    pub height: HeightPolicy,
    pub max_height: f64,
    pub min_height: f64,
    pub responsive: bool,
    pub position: DialogPosition,
}

impl From<&DialogDescriptor> for LayoutParams {
    fn from(d: &DialogDescriptor) -> Self {
        Self {
            width: d.width.px(),
            height: d.height,
            max_height: d.max_height,
            min_height: d.min_height,
            responsive: d.responsive,
            position: d.position,
        }
    }
}

/// Measured sizes of everything around the content.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChromeMetrics {
    pub titlebar_height: f64,
    pub buttonpane_height: f64,
    pub frame_padding: Sides,
    pub content_padding: Sides,
    pub content_margin: Sides,
}

impl ChromeMetrics {
    /// Height taken by title bar, button bar and vertical padding.
    pub fn vertical(&self) -> f64 {
        self.titlebar_height
            + self.buttonpane_height
            + self.frame_padding.vertical_sum()
            + self.content_padding.vertical_sum()
            + self.content_margin.vertical_sum()
    }

    /// Width taken by horizontal padding and margins.
    pub fn horizontal(&self) -> f64 {
        self.frame_padding.horizontal_sum()
            + self.content_padding.horizontal_sum()
            + self.content_margin.horizontal_sum()
    }
}

/// How the frame is anchored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FramePosition {
    /// Viewport coordinates; the frame does not scroll.
    Fixed { left: f64, top: f64 },
    /// Page coordinates.
    Absolute { left: f64, top: f64 },
}

/// Computed sizes for one dialog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialogLayout {
    pub frame_width: f64,
    /// Outer height of the frame.
    pub box_height: f64,
    /// Explicit content wrapper width, set only when the frame was fitted.
    pub wrapper_width: Option<f64>,
    /// Explicit content height; `None` sizes to content.
    pub content_height: Option<f64>,
    pub max_content_height: Option<f64>,
    pub min_content_height: f64,
    /// The configured width did not fit the viewport.
    pub fitted: bool,
    /// The box was clamped to the viewport height.
    pub height_clamped: bool,
    pub position: FramePosition,
}

/// Lay out a dialog.
pub fn compute_layout(
    params: &LayoutParams,
    chrome: &ChromeMetrics,
    viewport: Size,
    scroll: ScrollOffsets,
    device: DeviceClass,
    natural_height: f64,
) -> DialogLayout {
    let viewport = viewport.sanitized();
    let phone = params.responsive && device == DeviceClass::Phone;
    let chrome_v = chrome.vertical();

    let mut content_height = match params.height {
        HeightPolicy::Auto => None,
        HeightPolicy::Fixed(h) => Some((h - chrome_v).max(0.0)),
        HeightPolicy::Percent(p) => Some((viewport.height * p / 100.0 - chrome_v).max(0.0)),
    };
    let mut max_content_height = (!phone).then_some(params.max_height);
    let mut min_content_height = params.min_height.max(0.0);

    let natural = if natural_height.is_finite() {
        natural_height.max(0.0)
    } else {
        0.0
    };
    let mut effective = content_height.unwrap_or(natural);
    if let Some(max) = max_content_height {
        effective = effective.min(max);
    }
    effective = effective.max(min_content_height);
    let mut box_height = effective + chrome_v;

    let limit = viewport.height * MAX_VIEWPORT_HEIGHT_RATIO;
    let height_clamped = !phone && box_height > limit;
    if height_clamped {
        let clamped = (limit - chrome_v).max(0.0);
        content_height = Some(clamped);
        max_content_height = Some(clamped);
        min_content_height = min_content_height.min(clamped);
        box_height = limit;
    }

    let fitted = viewport.width <= params.width;
    let frame_width = if fitted {
        viewport.width * FITTED_WIDTH_RATIO
    } else {
        params.width
    };
    let wrapper_width =
        fitted.then(|| (frame_width - chrome.horizontal() - SCROLLBAR_ALLOWANCE).max(0.0));

    let centered_left = ((viewport.width - frame_width) / 2.0).max(0.0);
    let position = if phone {
        FramePosition::Absolute {
            left: scroll.left + centered_left,
            top: scroll.top + PHONE_TOP_OFFSET,
        }
    } else {
        match params.position {
            DialogPosition::Center => FramePosition::Fixed {
                left: centered_left,
                top: ((viewport.height - box_height) / 2.0).max(0.0),
            },
            DialogPosition::At { left, top } => FramePosition::Fixed { left, top },
        }
    };

    DialogLayout {
        frame_width,
        box_height,
        wrapper_width,
        content_height,
        max_content_height,
        min_content_height,
        fitted,
        height_clamped,
        position,
    }
}
