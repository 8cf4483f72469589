//! The browser surface the positioners and plugins need.
//!
//! In WASM, `tether::browser::DomHost` implements this over `web-sys`.
//! Tests use `testing::ScriptedHost`.

use crate::css::Declaration;
use crate::geometry::{Point, Rect, Size};
use crate::units::UnitContext;
use std::rc::Rc;

/// Stable identity of an element for the lifetime of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey(pub u64);

/// Handle returned by [`LayoutHost::listen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Callback invoked when a trigger fires.
pub type Handler = Rc<dyn Fn()>;

/// What a positioner can subscribe to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger<E> {
    /// Any scroll in the document (capturing, so nested scrollers count)
    Scroll,
    /// Window resize
    Resize,
    /// Content changes inside an element that may change its size
    Mutation(E),
}

/// Read and write access to the live layout.
pub trait LayoutHost {
    /// Element handle type.
    type Element: Clone;

    /// First element matching a CSS selector.
    fn query(&self, selector: &str) -> Option<Self::Element>;

    /// Stable key for `element`.
    fn element_key(&self, element: &Self::Element) -> ElementKey;

    /// Border box in viewport coordinates.
    fn bounding_rect(&self, element: &Self::Element) -> Rect;

    /// Computed font size of `element` in pixels.
    fn font_size(&self, element: &Self::Element) -> f64;

    /// Computed font size of the root element in pixels.
    fn root_font_size(&self) -> f64;

    /// Viewport size.
    fn viewport(&self) -> Size;

    /// Current document scroll offset.
    fn scroll_offset(&self) -> Point;

    /// `CSS.supports(declaration)`.
    fn supports(&self, declaration: &str) -> bool;

    /// DOM id, if the element has a non-empty one.
    fn element_id(&self, element: &Self::Element) -> Option<String>;

    /// Assign a DOM id.
    fn set_element_id(&self, element: &Self::Element, id: &str);

    /// Attribute value.
    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

    /// Set an attribute.
    fn set_attribute(&self, element: &Self::Element, name: &str, value: &str);

    /// Set one inline style property.
    fn set_style(&self, element: &Self::Element, property: &str, value: &str);

    /// Remove one inline style property.
    fn remove_style(&self, element: &Self::Element, property: &str);

    /// Subscribe `handler` to `trigger`.
    fn listen(&self, trigger: Trigger<Self::Element>, handler: Handler) -> ListenerId;

    /// Remove a subscription. Unknown ids are ignored.
    fn unlisten(&self, id: ListenerId);

    /// Font metrics and viewport for unit conversion against `element`.
    fn unit_context(&self, element: &Self::Element) -> UnitContext {
        UnitContext {
            root_font_size: self.root_font_size(),
            font_size: self.font_size(element),
            viewport: self.viewport(),
        }
    }

    /// Set several style properties in order.
    fn set_styles(&self, element: &Self::Element, declarations: &[Declaration]) {
        for (property, value) in declarations {
            self.set_style(element, property, value);
        }
    }
}
