//! Caller-stack walking
//!
//! Scans the runtime's call-frame stack most-recent-first for the first
//! frame that belongs to neither the toolkit nor a caller-sensitive class.
//! Sensitivity is the `CALLER_SENSITIVE` class flag plus whatever filter
//! predicates have been registered, so the excluded set stays inspectable
//! instead of hiding in an annotation system.

use crate::{ReflectError, ReflectResult};
use krait_core::class::{Class, ClassFlags};
use krait_core::{ClassId, Runtime};
use parking_lot::RwLock;

/// Predicate marking a class's frames as skippable
pub type FrameFilter = fn(&Class) -> bool;

/// Registry of frame-filter predicates consulted by the walker
///
/// The `CALLER_SENSITIVE` class flag is always consulted; registered
/// filters only ever widen the excluded set.
#[derive(Default)]
pub struct SensitivityRegistry {
    filters: RwLock<Vec<(String, FrameFilter)>>,
}

impl SensitivityRegistry {
    /// Create a registry with no extra filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter predicate under a label
    pub fn add_filter(&self, label: impl Into<String>, filter: FrameFilter) {
        self.filters.write().push((label.into(), filter));
    }

    /// Labels of the registered filters, in registration order
    pub fn labels(&self) -> Vec<String> {
        self.filters
            .read()
            .iter()
            .map(|(label, _)| label.clone())
            .collect()
    }

    /// Whether frames of `class` must be skipped by the caller search
    pub fn is_sensitive(&self, class: &Class) -> bool {
        class.flags().contains(ClassFlags::CALLER_SENSITIVE)
            || self.filters.read().iter().any(|(_, f)| f(class))
    }
}

/// Class of the frame at a fixed depth, counted from the most recent frame
/// (0 = top). Out-of-range depths yield `None`, never a panic.
pub fn caller_class_at(rt: &Runtime, depth: usize) -> Option<ClassId> {
    rt.frames().frame_at(depth).map(|f| f.class)
}

/// First frame class, scanning most-recent-first, that is neither
/// caller-sensitive nor matched by a registered filter.
///
/// The first qualifying frame wins; there is no reordering or
/// deduplication. `None` when no frame qualifies.
pub fn caller_class(rt: &Runtime, sensitivity: &SensitivityRegistry) -> Option<ClassId> {
    for frame in rt.frames().iter_recent_first() {
        let Some(class) = rt.classes().get(frame.class) else {
            continue;
        };
        if !sensitivity.is_sensitive(class) {
            return Some(frame.class);
        }
    }
    None
}

/// Like [`caller_class_at`], failing with `CallerNotFound` instead of
/// returning `None`
pub fn require_caller_class_at(rt: &Runtime, depth: usize) -> ReflectResult<ClassId> {
    caller_class_at(rt, depth).ok_or(ReflectError::CallerNotFound)
}

/// Like [`caller_class`], failing with `CallerNotFound` instead of
/// returning `None`
pub fn require_caller_class(
    rt: &Runtime,
    sensitivity: &SensitivityRegistry,
) -> ReflectResult<ClassId> {
    caller_class(rt, sensitivity).ok_or(ReflectError::CallerNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use krait_core::class::ClassBuilder;
    use krait_core::Frame;

    struct Fixture {
        rt: Runtime,
        app: ClassId,
        lib: ClassId,
    }

    fn fixture() -> Fixture {
        let mut rt = Runtime::new();
        let app = rt.register(ClassBuilder::new("App")).unwrap();
        let lib = rt
            .register(ClassBuilder::new("Lib").caller_sensitive())
            .unwrap();
        Fixture { rt, app, lib }
    }

    #[test]
    fn test_fixed_depth_is_positional() {
        let Fixture { mut rt, app, lib } = fixture();
        rt.push_frame(Frame::new(app, "main")).unwrap();
        rt.push_frame(Frame::new(lib, "enter")).unwrap();

        assert_eq!(caller_class_at(&rt, 0), Some(lib));
        assert_eq!(caller_class_at(&rt, 1), Some(app));
        assert_eq!(caller_class_at(&rt, 2), None);
        assert_eq!(caller_class_at(&rt, usize::MAX), None);
    }

    #[test]
    fn test_scan_skips_sensitive_frames() {
        let Fixture { mut rt, app, lib } = fixture();
        let sensitivity = SensitivityRegistry::new();

        rt.push_frame(Frame::new(app, "main")).unwrap();
        rt.push_frame(Frame::new(lib, "enter")).unwrap();
        rt.push_frame(Frame::new(lib, "inner")).unwrap();

        assert_eq!(caller_class(&rt, &sensitivity), Some(app));
    }

    #[test]
    fn test_scan_is_most_recent_first() {
        let Fixture { mut rt, app, lib } = fixture();
        let sensitivity = SensitivityRegistry::new();
        let other = rt.register(ClassBuilder::new("Other")).unwrap();

        rt.push_frame(Frame::new(other, "outer")).unwrap();
        rt.push_frame(Frame::new(app, "mid")).unwrap();
        rt.push_frame(Frame::new(lib, "enter")).unwrap();

        // Both App and Other qualify; the more recent one wins
        assert_eq!(caller_class(&rt, &sensitivity), Some(app));
    }

    #[test]
    fn test_all_frames_sensitive_yields_none() {
        let Fixture { mut rt, app: _, lib } = fixture();
        let sensitivity = SensitivityRegistry::new();

        rt.push_frame(Frame::new(lib, "enter")).unwrap();
        assert_eq!(caller_class(&rt, &sensitivity), None);
        assert!(matches!(
            require_caller_class(&rt, &sensitivity),
            Err(ReflectError::CallerNotFound)
        ));
    }

    #[test]
    fn test_empty_stack_yields_none() {
        let Fixture { rt, .. } = fixture();
        let sensitivity = SensitivityRegistry::new();
        assert_eq!(caller_class(&rt, &sensitivity), None);
        assert!(matches!(
            require_caller_class_at(&rt, 0),
            Err(ReflectError::CallerNotFound)
        ));
    }

    #[test]
    fn test_registered_filter_widens_exclusion() {
        let Fixture { mut rt, app, lib: _ } = fixture();
        let sensitivity = SensitivityRegistry::new();
        let framework = rt.register(ClassBuilder::new("framework.Hook")).unwrap();

        rt.push_frame(Frame::new(app, "main")).unwrap();
        rt.push_frame(Frame::new(framework, "hook")).unwrap();

        assert_eq!(caller_class(&rt, &sensitivity), Some(framework));

        sensitivity.add_filter("framework classes", |class| {
            class.name().starts_with("framework.")
        });
        assert_eq!(caller_class(&rt, &sensitivity), Some(app));
        assert_eq!(sensitivity.labels(), vec!["framework classes".to_string()]);
    }
}
