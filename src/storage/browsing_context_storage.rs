//! Component C — `BrowsingContextStorage` (spec section 4.2).

use std::collections::HashMap;

use crate::bidi::BrowsingContextId;
use crate::error::BidiError;
use crate::model::browsing_context::BrowsingContext;

#[derive(Default)]
pub struct BrowsingContextStorage {
    contexts: HashMap<BrowsingContextId, BrowsingContext>,
}

impl BrowsingContextStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_context(&mut self, context: BrowsingContext) {
        self.contexts.insert(context.id.clone(), context);
    }

    pub fn find_context(&self, id: &BrowsingContextId) -> Option<&BrowsingContext> {
        self.contexts.get(id)
    }

    pub fn find_context_mut(&mut self, id: &BrowsingContextId) -> Option<&mut BrowsingContext> {
        self.contexts.get_mut(id)
    }

    pub fn get_context(&self, id: &BrowsingContextId) -> Result<&BrowsingContext, BidiError> {
        self.find_context(id)
            .ok_or_else(|| BidiError::no_such_frame(format!("no such context {}", id.0)))
    }

    pub fn get_context_mut(&mut self, id: &BrowsingContextId) -> Result<&mut BrowsingContext, BidiError> {
        self.find_context_mut(id)
            .ok_or_else(|| BidiError::no_such_frame(format!("no such context {}", id.0)))
    }

    pub fn get_top_level_contexts(&self) -> impl Iterator<Item = &BrowsingContext> {
        self.contexts.values().filter(|c| c.is_top_level())
    }

    pub fn children_of(&self, id: &BrowsingContextId) -> impl Iterator<Item = &BrowsingContext> {
        self.contexts.values().filter(move |c| c.parent_id.as_ref() == Some(id))
    }

    /// Removes `id` and every descendant, depth-first (spec 4.2
    /// "cascades to children").
    pub fn delete_context(&mut self, id: &BrowsingContextId) -> Vec<BrowsingContext> {
        let child_ids: Vec<BrowsingContextId> = self.children_of(id).map(|c| c.id.clone()).collect();
        let mut removed = Vec::new();
        for child_id in child_ids {
            removed.extend(self.delete_context(&child_id));
        }
        if let Some(context) = self.contexts.remove(id) {
            removed.push(context);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::target::TargetId;

    fn ctx(id: &str, parent: Option<&str>) -> BrowsingContext {
        BrowsingContext::new(
            BrowsingContextId(id.into()),
            parent.map(|p| BrowsingContextId(p.into())),
            TargetId(format!("T-{id}")),
        )
    }

    #[test]
    fn delete_cascades_to_children() {
        let mut storage = BrowsingContextStorage::new();
        storage.add_context(ctx("C1", None));
        storage.add_context(ctx("C2", Some("C1")));
        storage.add_context(ctx("C3", Some("C2")));

        let removed = storage.delete_context(&BrowsingContextId("C1".into()));
        assert_eq!(removed.len(), 3);
        assert!(storage.find_context(&BrowsingContextId("C2".into())).is_none());
        assert!(storage.find_context(&BrowsingContextId("C3".into())).is_none());
    }

    #[test]
    fn get_context_fails_no_such_frame() {
        let storage = BrowsingContextStorage::new();
        let err = storage.get_context(&BrowsingContextId("missing".into())).unwrap_err();
        assert_eq!(err.code, crate::error::BidiErrorCode::NoSuchFrame);
    }

    #[test]
    fn top_level_excludes_children() {
        let mut storage = BrowsingContextStorage::new();
        storage.add_context(ctx("C1", None));
        storage.add_context(ctx("C2", Some("C1")));
        let top: Vec<_> = storage.get_top_level_contexts().map(|c| c.id.clone()).collect();
        assert_eq!(top, vec![BrowsingContextId("C1".into())]);
    }
}
