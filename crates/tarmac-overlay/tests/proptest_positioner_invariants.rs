//! Property-based invariant tests for tooltip placement and dialog layout.
//!
//! 1. An in-viewport anchor with a panel no wider than the viewport places
//!    the panel inside the viewport horizontally and at a non-negative top.
//!    Any anchor at all, including off-page and NaN geometry, yields
//!    non-negative coordinates.
//! 2. An anchor at the left page edge sets the `left` flag and never yields a
//!    negative left.
//! 3. An anchor flush with the right viewport edge sets the `right` flag.
//! 4. `Below` always places below and flags `top`.
//! 5. Re-running a dialog's layout against an unchanged viewport changes
//!    nothing.

use proptest::prelude::*;
use tarmac_core::dom::Dom;
use tarmac_core::geometry::{Rect, ScrollOffsets, Size};
use tarmac_core::testing::MockDom;
use tarmac_overlay::{
    DeviceClass, DialogButton, DialogDescriptor, DialogManager, HeightPolicy, SideFlags,
    VerticalPolicy, place,
};

const EPS: f64 = 1e-9;

// ── Helpers ─────────────────────────────────────────────────────────────

fn policy_strategy() -> impl Strategy<Value = VerticalPolicy> {
    prop_oneof![
        Just(VerticalPolicy::Auto),
        Just(VerticalPolicy::Above),
        Just(VerticalPolicy::Below),
    ]
}

/// Finite values on both sides of the page origin, plus NaN.
fn coord_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -5000.0f64..5000.0,
        1 => Just(f64::NAN),
    ]
}

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (
        coord_strategy(),
        coord_strategy(),
        coord_strategy(),
        coord_strategy(),
    )
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

/// Viewport, an anchor inside it, and a panel no wider than it.
fn in_viewport_case() -> impl Strategy<Value = (Size, Rect, Size)> {
    (200.0f64..2000.0, 200.0f64..1500.0).prop_flat_map(|(vw, vh)| {
        (0.0f64..vw, 0.0f64..vh).prop_flat_map(move |(x, y)| {
            (
                Just(Size::new(vw, vh)),
                (0.0f64..=(vw - x), 0.0f64..=(vh - y))
                    .prop_map(move |(w, h)| Rect::new(x, y, w, h)),
                (1.0f64..=vw, 1.0f64..400.0).prop_map(|(w, h)| Size::new(w, h)),
            )
        })
    })
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Horizontal containment
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn in_viewport_anchor_keeps_panel_inside(
        (viewport, anchor, panel) in in_viewport_case(),
        policy in policy_strategy(),
    ) {
        let p = place(anchor, panel, viewport, ScrollOffsets::default(), policy);
        prop_assert!(p.left >= 0.0, "left {} < 0", p.left);
        prop_assert!(p.top >= 0.0, "top {} < 0", p.top);
        prop_assert!(
            p.left + panel.width <= viewport.width + EPS,
            "right edge {} past viewport {}",
            p.left + panel.width,
            viewport.width
        );
    }

    #[test]
    fn any_anchor_yields_non_negative_coordinates(
        anchor in rect_strategy(),
        (pw, ph) in (coord_strategy(), coord_strategy()),
        (vw, vh) in (coord_strategy(), coord_strategy()),
        scroll_top in coord_strategy(),
        policy in policy_strategy(),
    ) {
        let p = place(
            anchor,
            Size::new(pw, ph),
            Size::new(vw, vh),
            ScrollOffsets::new(scroll_top, 0.0),
            policy,
        );
        prop_assert!(p.left >= 0.0, "left {} for {:?}", p.left, anchor);
        prop_assert!(p.top >= 0.0, "top {} for {:?}", p.top, anchor);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Left edge
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn anchor_at_page_left_sets_left_flag(
        vw in 300.0f64..2000.0,
        anchor_w in 0.0f64..100.0,
        top in 0.0f64..1000.0,
        ratio in 0.0f64..=1.0,
    ) {
        // Wider than the anchor, but not a small-window panel.
        let min_w = anchor_w + 1.0;
        let max_w = vw / 1.5 - 1.0;
        let panel_w = min_w + (max_w - min_w) * ratio;
        let anchor = Rect::new(0.0, top, anchor_w, 20.0);
        let p = place(
            anchor,
            Size::new(panel_w, 80.0),
            Size::new(vw, 800.0),
            ScrollOffsets::default(),
            VerticalPolicy::Auto,
        );
        prop_assert!(p.flags.contains(SideFlags::LEFT));
        prop_assert!(p.left >= 0.0);
        prop_assert!(!p.small_window);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Right edge
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn anchor_at_viewport_right_sets_right_flag(
        vw in 300.0f64..2000.0,
        anchor_w in 1.0f64..100.0,
        ratio in 0.0f64..=1.0,
    ) {
        let min_w = anchor_w + 2.0;
        let max_w = vw / 1.5 - 1.0;
        let panel_w = min_w + (max_w - min_w) * ratio;
        let anchor = Rect::new(vw - anchor_w, 400.0, anchor_w, 20.0);
        let p = place(
            anchor,
            Size::new(panel_w, 80.0),
            Size::new(vw, 800.0),
            ScrollOffsets::default(),
            VerticalPolicy::Auto,
        );
        prop_assert!(p.flags.contains(SideFlags::RIGHT));
        prop_assert!(!p.flags.contains(SideFlags::LEFT));
        prop_assert!(p.left + panel_w <= vw + EPS);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Vertical policy
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn below_policy_always_below(
        (viewport, anchor, panel) in in_viewport_case(),
        scroll_top in 0.0f64..2000.0,
    ) {
        let p = place(
            anchor,
            panel,
            viewport,
            ScrollOffsets::new(scroll_top, 0.0),
            VerticalPolicy::Below,
        );
        prop_assert!(p.flags.contains(SideFlags::TOP));
        prop_assert!(p.is_below());
        prop_assert!(p.top >= anchor.bottom());
    }

    #[test]
    fn auto_goes_above_only_when_visible(
        (viewport, anchor, panel) in in_viewport_case(),
        scroll_top in 0.0f64..2000.0,
    ) {
        let p = place(
            anchor,
            panel,
            viewport,
            ScrollOffsets::new(scroll_top, 0.0),
            VerticalPolicy::Auto,
        );
        if !p.is_below() {
            prop_assert!(p.top >= 0.0);
            prop_assert!(p.top >= scroll_top);
            prop_assert!(p.top + panel.height <= anchor.top);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Dialog layout
// ═════════════════════════════════════════════════════════════════════════

fn height_strategy() -> impl Strategy<Value = HeightPolicy> {
    prop_oneof![
        Just(HeightPolicy::Auto),
        (100.0f64..1500.0).prop_map(HeightPolicy::Fixed),
        (10.0f64..100.0).prop_map(HeightPolicy::Percent),
    ]
}

proptest! {
    #[test]
    fn resize_twice_is_idempotent(
        vw in 280.0f64..2000.0,
        vh in 300.0f64..1400.0,
        natural in 0.0f64..3000.0,
        height in height_strategy(),
        phone in any::<bool>(),
        with_buttons in any::<bool>(),
    ) {
        let mut dom = MockDom::new(Size::new(vw, vh));
        dom.size_for_class("dialog-titlebar", Size::new(0.0, 48.0));
        dom.size_for_class("dialog-buttonpane", Size::new(0.0, 64.0));
        let content = dom.insert_with_id(None, "div", "termsDialog");
        dom.set_rect(content, Rect::new(0.0, 0.0, 500.0, natural));

        let device = if phone { DeviceClass::Phone } else { DeviceClass::Desktop };
        let mut mgr = DialogManager::with_device(device);
        let mut descriptor = DialogDescriptor::new().height(height);
        if with_buttons {
            descriptor = descriptor.button(DialogButton::default());
        }
        prop_assert!(mgr.register(&mut dom, "terms", descriptor));
        prop_assert!(mgr.open(&mut dom, "terms", None));

        let frame = mgr.frame("terms").unwrap();
        let first = *mgr.layout("terms").unwrap();
        let first_rect = dom.client_rect(frame);
        prop_assert!(mgr.resize(&mut dom, "terms"));
        prop_assert_eq!(mgr.layout("terms"), Some(&first));
        prop_assert_eq!(dom.client_rect(frame), first_rect);

        if !phone {
            prop_assert!(first.box_height <= vh * 0.8 + EPS);
        }
    }
}
