//! Positioners: native CSS anchor positioning when the browser has it,
//! geometry fallback otherwise.
//!
//! A floating element is in exactly one [`Mode`]. The choice is made once in
//! [`attach`]; the only later transition is native -> fallback when
//! `probe_native` is on and the native result lands off screen.
//!
//! The fallback re-runs the full engine, flips included, on every scroll,
//! resize and content mutation, so a tooltip that flipped below its anchor
//! flips back once there is room above again.

use crate::config::AnchorConfig;
use crate::css::{self, ANCHOR_NAME_PROPERTY, FLOATING_PROPERTIES};
use crate::engine::{compute_position, EngineOptions, FinalPosition};
use crate::geometry::{Point, Rect, Size};
use crate::host::{LayoutHost, ListenerId, Trigger};
use crate::resolve::PlacementSpec;
use crate::units::UnitContext;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Attribute and custom property carrying the placement actually used.
pub const PLACEMENT_ATTRIBUTE: &str = "data-placement";
/// Custom property mirror of [`PLACEMENT_ATTRIBUTE`].
pub const PLACEMENT_PROPERTY: &str = "--tether-placement";

/// Which positioner owns a floating element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Declarative CSS anchor positioning
    Native,
    /// Coordinates computed here and written as inline styles
    Fallback,
}

/// Whether the host supports the native anchor primitives.
pub fn native_supported<H: LayoutHost>(host: &H) -> bool {
    host.supports("anchor-name: --tether-probe")
        && host.supports("position-anchor: --tether-probe")
        && host.supports("top: anchor(bottom)")
}

/// Every layout read one pass needs, taken once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSnapshot {
    /// Reference element border box
    pub reference: Rect,
    /// Floating element size
    pub floating: Size,
    /// Metrics for unit conversion
    pub units: UnitContext,
    /// Document scroll offset
    pub scroll: Point,
}

impl LayoutSnapshot {
    /// Read the live layout.
    pub fn read<H: LayoutHost>(host: &H, floating: &H::Element, target: &H::Element) -> Self {
        Self {
            reference: host.bounding_rect(target),
            floating: host.bounding_rect(floating).size(),
            units: host.unit_context(floating),
            scroll: host.scroll_offset(),
        }
    }
}

/// Native anchor name for `target`, assigning it a DOM id first if needed.
pub fn ensure_anchor_name<H: LayoutHost>(host: &H, target: &H::Element, prefix: &str) -> String {
    let id = host.element_id(target).unwrap_or_else(|| {
        let generated = format!("tether-anchor-{}", host.element_key(target).0);
        host.set_element_id(target, &generated);
        generated
    });
    css::anchor_name(prefix, &id)
}

/// Write native anchor declarations. Returns the anchor name used.
pub fn apply_native<H: LayoutHost>(
    host: &H,
    floating: &H::Element,
    target: &H::Element,
    spec: &PlacementSpec,
    config: &AnchorConfig,
) -> String {
    let anchor = ensure_anchor_name(host, target, &config.anchor_prefix);
    host.set_style(target, ANCHOR_NAME_PROPERTY, &anchor);
    let decls = css::native_declarations(spec.placement, spec.offset, &anchor, config.flip);
    host.set_styles(floating, &decls);
    log::trace!("native anchor {anchor} for `{}`", spec.target);
    anchor
}

/// Remove everything [`apply_native`] wrote to the floating element.
pub fn clear_native<H: LayoutHost>(host: &H, floating: &H::Element) {
    for property in FLOATING_PROPERTIES {
        host.remove_style(floating, property);
    }
}

/// Whether natively positioned `floating` ended up entirely off screen.
pub fn landed_off_screen<H: LayoutHost>(host: &H, floating: &H::Element) -> bool {
    let viewport = Rect::from_origin_size(Point::ORIGIN, host.viewport());
    !host.bounding_rect(floating).intersects(&viewport)
}

struct Tracker<H: LayoutHost> {
    host: H,
    floating: H::Element,
    target: H::Element,
    spec: PlacementSpec,
    options: EngineOptions,
    last: Cell<Option<FinalPosition>>,
}

impl<H: LayoutHost> Tracker<H> {
    fn update(&self) -> FinalPosition {
        let snap = LayoutSnapshot::read(&self.host, &self.floating, &self.target);
        let offset = self.spec.offset.to_pixels(&snap.units);
        let pos = compute_position(
            &snap.reference,
            snap.floating,
            self.spec.placement,
            offset,
            snap.units.viewport,
            &self.options,
        );
        let h = &self.host;
        h.set_style(&self.floating, "left", &format!("{}px", pos.x + snap.scroll.x));
        h.set_style(&self.floating, "top", &format!("{}px", pos.y + snap.scroll.y));
        if self.last.get().map(|p| p.placement_used) != Some(pos.placement_used) {
            let used = pos.placement_used.as_str();
            h.set_attribute(&self.floating, PLACEMENT_ATTRIBUTE, used);
            h.set_style(&self.floating, PLACEMENT_PROPERTY, used);
        }
        self.last.set(Some(pos));
        pos
    }
}

/// A fallback-positioned element. Dropping the handle without calling
/// [`FallbackHandle::detach`] leaves its listeners installed.
pub struct FallbackHandle<H: LayoutHost> {
    tracker: Rc<Tracker<H>>,
    listeners: Vec<ListenerId>,
}

impl<H: LayoutHost + Clone + 'static> FallbackHandle<H> {
    /// Position `floating` against `target` and keep it there.
    pub fn attach(
        host: &H,
        floating: &H::Element,
        target: &H::Element,
        spec: &PlacementSpec,
        options: EngineOptions,
    ) -> Self
    where
        H::Element: 'static,
    {
        host.set_style(floating, "position", "absolute");
        let tracker = Rc::new(Tracker {
            host: host.clone(),
            floating: floating.clone(),
            target: target.clone(),
            spec: spec.clone(),
            options,
            last: Cell::new(None),
        });
        tracker.update();

        let listeners = [Trigger::Scroll, Trigger::Resize, Trigger::Mutation(floating.clone())]
            .into_iter()
            .map(|trigger| {
                let t = Rc::clone(&tracker);
                host.listen(trigger, Rc::new(move || {
                    t.update();
                }))
            })
            .collect();

        Self { tracker, listeners }
    }
}

impl<H: LayoutHost> FallbackHandle<H> {
    /// Recompute now.
    pub fn update(&self) -> FinalPosition {
        self.tracker.update()
    }

    /// Result of the most recent pass.
    pub fn position(&self) -> Option<FinalPosition> {
        self.tracker.last.get()
    }

    /// Number of installed listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Remove every listener.
    pub fn detach(self) {
        for id in self.listeners {
            self.tracker.host.unlisten(id);
        }
    }
}

impl<H: LayoutHost> fmt::Debug for FallbackHandle<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackHandle")
            .field("spec", &self.tracker.spec)
            .field("last", &self.tracker.last.get())
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// A positioned floating element.
#[derive(Debug)]
pub enum Attachment<H: LayoutHost> {
    /// Positioned by the browser; nothing to tear down
    Native {
        /// Anchor name written on the reference element
        anchor: String,
    },
    /// Positioned by [`FallbackHandle`]
    Fallback(FallbackHandle<H>),
}

impl<H: LayoutHost> Attachment<H> {
    /// Current mode.
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Native { .. } => Mode::Native,
            Self::Fallback(_) => Mode::Fallback,
        }
    }

    /// Release listeners. Native attachments hold none.
    pub fn detach(self) {
        if let Self::Fallback(handle) = self {
            handle.detach();
        }
    }
}

/// Position `floating` against `target`, choosing the positioner by feature
/// detection.
pub fn attach<H>(
    host: &H,
    floating: &H::Element,
    target: &H::Element,
    spec: &PlacementSpec,
    config: &AnchorConfig,
) -> Attachment<H>
where
    H: LayoutHost + Clone + 'static,
    H::Element: 'static,
{
    if config.prefer_native && native_supported(host) {
        let anchor = apply_native(host, floating, target, spec, config);
        if !(config.probe_native && landed_off_screen(host, floating)) {
            return Attachment::Native { anchor };
        }
        log::debug!("native anchor {anchor} landed off screen, using fallback");
        clear_native(host, floating);
    }
    Attachment::Fallback(FallbackHandle::attach(
        host,
        floating,
        target,
        spec,
        config.engine_options(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::Placement;
    use crate::testing::ScriptedHost;
    use crate::units::Length;

    fn setup(host: &ScriptedHost) -> (u64, u64) {
        host.set_viewport(Size::new(1000.0, 800.0));
        let target = host.add_element("#btn", Rect::from_edges(100.0, 100.0, 200.0, 130.0));
        let floating = host.add_element(".tip", Rect::new(0.0, 0.0, 50.0, 20.0));
        (floating, target)
    }

    fn spec(placement: Placement) -> PlacementSpec {
        PlacementSpec::new("#btn", placement, Length::px(10.0))
    }

    fn track(
        host: &ScriptedHost,
        floating: u64,
        target: u64,
        placement: Placement,
    ) -> FallbackHandle<ScriptedHost> {
        FallbackHandle::attach(host, &floating, &target, &spec(placement), EngineOptions::default())
    }

    #[test]
    fn test_fallback_writes_coordinates() {
        let host = ScriptedHost::new();
        let (floating, target) = setup(&host);
        let handle = track(&host, floating, target, Placement::Top);
        assert_eq!(host.style(floating, "position").as_deref(), Some("absolute"));
        assert_eq!(host.style(floating, "left").as_deref(), Some("125px"));
        assert_eq!(host.style(floating, "top").as_deref(), Some("70px"));
        assert_eq!(host.attr(floating, PLACEMENT_ATTRIBUTE).as_deref(), Some("top"));
        assert_eq!(host.style(floating, PLACEMENT_PROPERTY).as_deref(), Some("top"));
        assert_eq!(handle.listener_count(), 3);
        assert_eq!(host.listener_count(), 3);
    }

    #[test]
    fn test_fallback_adds_scroll_offset() {
        let host = ScriptedHost::new();
        let (floating, target) = setup(&host);
        host.set_scroll(Point::new(0.0, 300.0));
        track(&host, floating, target, Placement::Top);
        assert_eq!(host.style(floating, "top").as_deref(), Some("370px"));
    }

    #[test]
    fn test_fallback_reflips_on_resize() {
        let host = ScriptedHost::new();
        let (floating, target) = setup(&host);
        let handle = track(&host, floating, target, Placement::Bottom);
        assert_eq!(handle.position().map(|p| p.placement_used), Some(Placement::Bottom));

        // Shrink the viewport so there is no room below
        host.set_viewport(Size::new(1000.0, 150.0));
        host.fire(&Trigger::Resize);
        assert_eq!(handle.position().map(|p| p.placement_used), Some(Placement::Top));
        assert_eq!(host.attr(floating, PLACEMENT_ATTRIBUTE).as_deref(), Some("top"));

        // And back
        host.set_viewport(Size::new(1000.0, 800.0));
        host.fire(&Trigger::Resize);
        assert_eq!(handle.position().map(|p| p.placement_used), Some(Placement::Bottom));
    }

    #[test]
    fn test_fallback_follows_scrolled_reference() {
        let host = ScriptedHost::new();
        let (floating, target) = setup(&host);
        let _handle = track(&host, floating, target, Placement::Bottom);
        host.set_rect(target, Rect::from_edges(100.0, 50.0, 200.0, 80.0));
        host.set_scroll(Point::new(0.0, 50.0));
        host.fire(&Trigger::Scroll);
        // y = 80 + 10 in the viewport, plus 50 scrolled
        assert_eq!(host.style(floating, "top").as_deref(), Some("140px"));
    }

    #[test]
    fn test_fallback_resolves_relative_offset() {
        let host = ScriptedHost::new();
        let (floating, target) = setup(&host);
        host.set_font_size(floating, 20.0);
        let s = PlacementSpec::new("#btn", Placement::Right, "0.5em".parse().unwrap());
        let handle =
            FallbackHandle::attach(&host, &floating, &target, &s, EngineOptions::default());
        assert_eq!(handle.position().map(|p| p.x), Some(210.0));
    }

    #[test]
    fn test_detach_removes_listeners() {
        let host = ScriptedHost::new();
        let (floating, target) = setup(&host);
        let handle = track(&host, floating, target, Placement::Top);
        handle.detach();
        assert_eq!(host.listener_count(), 0);
        host.set_rect(target, Rect::from_edges(0.0, 300.0, 100.0, 330.0));
        host.fire(&Trigger::Resize);
        assert_eq!(host.style(floating, "top").as_deref(), Some("70px"));
    }

    #[test]
    fn test_attach_prefers_native_when_supported() {
        let host = ScriptedHost::new();
        host.set_native_support(true);
        let (floating, target) = setup(&host);
        let config = AnchorConfig::default();
        let attachment = attach(&host, &floating, &target, &spec(Placement::Top), &config);
        assert_eq!(attachment.mode(), Mode::Native);
        assert_eq!(host.style(target, ANCHOR_NAME_PROPERTY).as_deref(), Some("--anchor-btn"));
        assert_eq!(host.style(floating, "position-anchor").as_deref(), Some("--anchor-btn"));
        assert_eq!(
            host.style(floating, "bottom").as_deref(),
            Some("calc(anchor(top) + 10px)")
        );
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_attach_without_support_uses_fallback() {
        let host = ScriptedHost::new();
        let (floating, target) = setup(&host);
        let config = AnchorConfig::default();
        let attachment = attach(&host, &floating, &target, &spec(Placement::Top), &config);
        assert_eq!(attachment.mode(), Mode::Fallback);
        assert_eq!(host.style(target, ANCHOR_NAME_PROPERTY), None);
        attachment.detach();
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_attach_native_disabled_by_config() {
        let host = ScriptedHost::new();
        host.set_native_support(true);
        let (floating, target) = setup(&host);
        let config = AnchorConfig {
            prefer_native: false,
            ..AnchorConfig::default()
        };
        let attachment = attach(&host, &floating, &target, &spec(Placement::Top), &config);
        assert_eq!(attachment.mode(), Mode::Fallback);
    }

    #[test]
    fn test_probe_moves_off_screen_native_to_fallback() {
        let host = ScriptedHost::new();
        host.set_native_support(true);
        let (floating, target) = setup(&host);
        // Scripted host does not lay out native declarations; the floating
        // element stays wherever its rect says
        host.set_rect(floating, Rect::new(-500.0, -500.0, 50.0, 20.0));
        let config = AnchorConfig {
            probe_native: true,
            ..AnchorConfig::default()
        };
        let attachment = attach(&host, &floating, &target, &spec(Placement::Top), &config);
        assert_eq!(attachment.mode(), Mode::Fallback);
        assert_eq!(host.style(floating, "position-anchor"), None);
        assert_eq!(host.style(floating, "left").as_deref(), Some("125px"));
    }

    #[test]
    fn test_probe_keeps_on_screen_native() {
        let host = ScriptedHost::new();
        host.set_native_support(true);
        let (floating, target) = setup(&host);
        host.set_rect(floating, Rect::new(125.0, 70.0, 50.0, 20.0));
        let config = AnchorConfig {
            probe_native: true,
            ..AnchorConfig::default()
        };
        let attachment = attach(&host, &floating, &target, &spec(Placement::Top), &config);
        assert_eq!(attachment.mode(), Mode::Native);
    }

    #[test]
    fn test_generated_anchor_id() {
        let host = ScriptedHost::new();
        let target = host.add_element(".no-id", Rect::new(0.0, 0.0, 10.0, 10.0));
        host.clear_id(target);
        let name = ensure_anchor_name(&host, &target, "--anchor-");
        assert_eq!(name, format!("--anchor-tether-anchor-{target}"));
        assert_eq!(host.element_id(&target), Some(format!("tether-anchor-{target}")));
        // Deterministic on repeat
        assert_eq!(ensure_anchor_name(&host, &target, "--anchor-"), name);
    }

    #[test]
    fn test_similar_ids_get_distinct_anchors() {
        let host = ScriptedHost::new();
        let dotted = host.add_element("#menu.btn", Rect::new(0.0, 0.0, 10.0, 10.0));
        let dashed = host.add_element("#menu-btn", Rect::new(20.0, 0.0, 10.0, 10.0));
        let a = ensure_anchor_name(&host, &dotted, "--anchor-");
        let b = ensure_anchor_name(&host, &dashed, "--anchor-");
        assert_ne!(a, b);
        assert_eq!(b, "--anchor-menu-btn");
    }

    #[test]
    fn test_snapshot_reads_once() {
        let host = ScriptedHost::new();
        let (floating, target) = setup(&host);
        let before = host.rect_reads();
        let snap = LayoutSnapshot::read(&host, &floating, &target);
        assert_eq!(host.rect_reads() - before, 2);
        assert_eq!(snap.floating, Size::new(50.0, 20.0));
        assert_eq!(snap.units.viewport, Size::new(1000.0, 800.0));
    }
}
