//! Element -> attachment map.
//!
//! Entries are erased deterministically: the framework's cleanup callback
//! for an element calls [`AttachmentRegistry::remove`], which detaches.
//! Every insert gets a fresh [`Generation`], so a cleanup left over from an
//! earlier load of the same element cannot remove a newer attachment.

use crate::host::{ElementKey, LayoutHost};
use crate::positioner::{Attachment, Mode};
use std::collections::HashMap;
use std::fmt;

/// Identifies one [`AttachmentRegistry::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u64);

/// Live attachments keyed by element.
pub struct AttachmentRegistry<H: LayoutHost> {
    entries: HashMap<ElementKey, (Generation, Attachment<H>)>,
    next: u64,
}

impl<H: LayoutHost> AttachmentRegistry<H> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next: 0,
        }
    }

    /// Track `attachment` for `key`, detaching whatever was there before.
    pub fn insert(&mut self, key: ElementKey, attachment: Attachment<H>) -> Generation {
        self.next += 1;
        let generation = Generation(self.next);
        if let Some((_, previous)) = self.entries.insert(key, (generation, attachment)) {
            previous.detach();
        }
        generation
    }

    /// Detach and forget `key` if it still holds `generation`. Returns
    /// whether anything was removed.
    pub fn remove(&mut self, key: ElementKey, generation: Generation) -> bool {
        if self.entries.get(&key).map(|(g, _)| *g) != Some(generation) {
            return false;
        }
        match self.entries.remove(&key) {
            Some((_, attachment)) => {
                attachment.detach();
                true
            }
            None => false,
        }
    }

    /// Mode of the attachment for `key`.
    pub fn mode(&self, key: ElementKey) -> Option<Mode> {
        self.entries.get(&key).map(|(_, attachment)| attachment.mode())
    }

    /// Number of tracked elements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: LayoutHost> Default for AttachmentRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: LayoutHost> fmt::Debug for AttachmentRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("AttachmentRegistry")
            .field("keys", &keys)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use crate::geometry::{Rect, Size};
    use crate::placement::Placement;
    use crate::positioner::FallbackHandle;
    use crate::resolve::PlacementSpec;
    use crate::testing::ScriptedHost;
    use crate::units::Length;

    fn fallback(host: &ScriptedHost, floating: u64, target: u64) -> Attachment<ScriptedHost> {
        let spec = PlacementSpec::new("#t", Placement::Bottom, Length::px(4.0));
        let options = EngineOptions::default();
        Attachment::Fallback(FallbackHandle::attach(host, &floating, &target, &spec, options))
    }

    #[test]
    fn test_insert_and_remove_detaches() {
        let host = ScriptedHost::new();
        host.set_viewport(Size::new(800.0, 600.0));
        let target = host.add_element("#t", Rect::new(10.0, 10.0, 40.0, 20.0));
        let floating = host.add_element(".f", Rect::new(0.0, 0.0, 30.0, 10.0));
        let key = host.element_key(&floating);

        let mut registry = AttachmentRegistry::new();
        let generation = registry.insert(key, fallback(&host, floating, target));
        assert_eq!(registry.mode(key), Some(Mode::Fallback));
        assert_eq!(host.listener_count(), 3);

        assert!(registry.remove(key, generation));
        assert!(registry.is_empty());
        assert_eq!(host.listener_count(), 0);
        assert!(!registry.remove(key, generation));
    }

    #[test]
    fn test_reinsert_replaces_previous() {
        let host = ScriptedHost::new();
        host.set_viewport(Size::new(800.0, 600.0));
        let target = host.add_element("#t", Rect::new(10.0, 10.0, 40.0, 20.0));
        let floating = host.add_element(".f", Rect::new(0.0, 0.0, 30.0, 10.0));
        let key = host.element_key(&floating);

        let mut registry = AttachmentRegistry::new();
        registry.insert(key, fallback(&host, floating, target));
        registry.insert(key, fallback(&host, floating, target));
        assert_eq!(registry.len(), 1);
        assert_eq!(host.listener_count(), 3);

        registry.insert(key, Attachment::Native { anchor: "--anchor-t".to_string() });
        assert_eq!(registry.mode(key), Some(Mode::Native));
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_stale_generation_keeps_newer_attachment() {
        let host = ScriptedHost::new();
        host.set_viewport(Size::new(800.0, 600.0));
        let target = host.add_element("#t", Rect::new(10.0, 10.0, 40.0, 20.0));
        let floating = host.add_element(".f", Rect::new(0.0, 0.0, 30.0, 10.0));
        let key = host.element_key(&floating);

        let mut registry = AttachmentRegistry::new();
        let first = registry.insert(key, fallback(&host, floating, target));
        let second = registry.insert(key, fallback(&host, floating, target));
        assert_ne!(first, second);

        assert!(!registry.remove(key, first));
        assert_eq!(registry.mode(key), Some(Mode::Fallback));
        assert_eq!(host.listener_count(), 3);

        assert!(registry.remove(key, second));
        assert_eq!(host.listener_count(), 0);
    }
}
