//! Cached compiled template for a style string that can change at runtime.
//!
//! The cache owns the current `Arc<CompiledTemplate>`. Changing the style string
//! builds a new template and swaps the pointer in one step; evaluations that
//! already hold the previous template finish against it undisturbed. The swap is
//! a `tokio::sync::watch` send, so tasks that want to react to edits can
//! [`subscribe`](TemplateCache::subscribe).

use crate::rds::metadata::MetadataContext;
use crate::rds::style::ast::CompiledTemplate;
use crate::rds::style::evaluation::{evaluate, EvaluatedOutput};
use crate::rds::style::parsing::parse;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug)]
pub struct TemplateCache {
    current: watch::Sender<Arc<CompiledTemplate>>,
}

impl TemplateCache {
    pub fn new(source: &str) -> Self {
        let (current, _) = watch::channel(Arc::new(parse(source)));
        Self { current }
    }

    /// The template in effect right now.
    pub fn current(&self) -> Arc<CompiledTemplate> {
        self.current.borrow().clone()
    }

    /// Replace the template if `source` differs from the cached one.
    ///
    /// Returns `true` when a new template was installed.
    pub fn update(&self, source: &str) -> bool {
        let replaced = self.current.send_if_modified(|template| {
            if template.source() == source {
                return false;
            }
            *template = Arc::new(parse(source));
            true
        });
        if replaced {
            debug!(style = source, "style text recompiled");
        }
        replaced
    }

    /// Receive every future replacement.
    pub fn subscribe(&self) -> watch::Receiver<Arc<CompiledTemplate>> {
        self.current.subscribe()
    }

    /// Evaluate the current template.
    pub fn evaluate(&self, context: &MetadataContext) -> EvaluatedOutput {
        evaluate(&self.current(), context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rds::style::FieldKind;

    #[test]
    fn test_unchanged_source_keeps_template() {
        let cache = TemplateCache::new("{T}");
        let before = cache.current();
        assert!(!cache.update("{T}"));
        assert!(Arc::ptr_eq(&before, &cache.current()));
    }

    #[test]
    fn test_changed_source_swaps_template() {
        let cache = TemplateCache::new("{T}");
        let before = cache.current();
        assert!(cache.update("{A}"));
        let after = cache.current();
        assert_eq!(after.source(), "{A}");
        // The old handle is still intact.
        assert_eq!(before.source(), "{T}");
    }

    #[test]
    fn test_subscribers_see_replacement() {
        let cache = TemplateCache::new("a");
        let mut rx = cache.subscribe();
        cache.update("b");
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(rx.borrow_and_update().source(), "b");
    }

    #[test]
    fn test_concurrent_evaluation_sees_whole_templates() {
        let cache = TemplateCache::new("{T}|{A}");
        let ctx = MetadataContext::new()
            .with(FieldKind::Title, "t")
            .with(FieldKind::Artist, "a");

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        let lines = cache.evaluate(&ctx).into_lines();
                        assert!(lines == ["t", "a"] || lines == ["a - t"]);
                    }
                });
            }
            scope.spawn(|| {
                for i in 0..200 {
                    cache.update(if i % 2 == 0 { "{A} - {T}" } else { "{T}|{A}" });
                }
            });
        });
    }
}
