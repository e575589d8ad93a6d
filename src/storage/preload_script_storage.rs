//! Component D — `PreloadScriptStorage` (spec section 4.6).

use std::collections::HashMap;

use crate::bidi::BrowsingContextId;
use crate::cdp::page::ScriptIdentifier;
use crate::cdp::target::TargetId;
use crate::model::preload_script::{BidiPreloadScript, PreloadScriptId};

/// Filter accepted by [`PreloadScriptStorage::find_preload_scripts`].
#[derive(Debug, Clone, Default)]
pub struct PreloadScriptFilter {
    pub id: Option<PreloadScriptId>,
    pub context_id: Option<BrowsingContextId>,
    pub target_id: Option<TargetId>,
}

impl PreloadScriptFilter {
    fn matches(&self, script: &BidiPreloadScript) -> bool {
        if let Some(id) = &self.id {
            if &script.id != id {
                return false;
            }
        }
        if let Some(context_id) = &self.context_id {
            if !script.applies_to(context_id) {
                return false;
            }
        }
        if let Some(target_id) = &self.target_id {
            if !script.installed.iter().any(|(t, _)| t == target_id) {
                return false;
            }
        }
        true
    }
}

#[derive(Default)]
pub struct PreloadScriptStorage {
    scripts: HashMap<PreloadScriptId, BidiPreloadScript>,
    next_id: u64,
}

impl PreloadScriptStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_preload_script_id(&mut self) -> PreloadScriptId {
        let id = self.next_id;
        self.next_id += 1;
        PreloadScriptId(format!("preload-{id}"))
    }

    pub fn add_preload_script(
        &mut self,
        context_filter: Option<BrowsingContextId>,
        function_source: String,
        sandbox: Option<String>,
    ) -> PreloadScriptId {
        let id = self.next_preload_script_id();
        self.scripts.insert(
            id.clone(),
            BidiPreloadScript {
                id: id.clone(),
                context_filter,
                function_source,
                sandbox,
                installed: Vec::new(),
            },
        );
        id
    }

    pub fn find_preload_scripts(&self, filter: &PreloadScriptFilter) -> Vec<&BidiPreloadScript> {
        self.scripts.values().filter(|s| filter.matches(s)).collect()
    }

    pub fn get(&self, id: &PreloadScriptId) -> Option<&BidiPreloadScript> {
        self.scripts.get(id)
    }

    /// Records that `script` was materialized on `target` as `cdp_id`.
    pub fn record_installation(&mut self, id: &PreloadScriptId, target: TargetId, cdp_id: ScriptIdentifier) {
        if let Some(script) = self.scripts.get_mut(id) {
            script.installed.push((target, cdp_id));
        }
    }

    /// Every record applying to `target_context`'s top-level context,
    /// not yet installed on `target` — used when a new target attaches
    /// (spec 4.6 "iterate all BiDi records").
    pub fn scripts_for_new_target(&self, top_level_context: &BrowsingContextId) -> Vec<&BidiPreloadScript> {
        self.scripts
            .values()
            .filter(|s| s.applies_to(top_level_context))
            .collect()
    }

    pub fn remove_bidi_preload_script(&mut self, id: &PreloadScriptId) -> Option<BidiPreloadScript> {
        self.scripts.remove(id)
    }

    /// Strips `target`'s installations from every record on target
    /// teardown, retaining the BiDi record when other targets still carry
    /// it (spec 4.6).
    pub fn remove_cdp_preload_scripts(&mut self, target_id: &TargetId) {
        for script in self.scripts.values_mut() {
            script.installed.retain(|(t, _)| t != target_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_one_targets_installations_keeps_the_record() {
        let mut storage = PreloadScriptStorage::new();
        let id = storage.add_preload_script(None, "() => {}".into(), None);
        storage.record_installation(&id, TargetId("T1".into()), ScriptIdentifier("S1".into()));
        storage.record_installation(&id, TargetId("T2".into()), ScriptIdentifier("S2".into()));

        storage.remove_cdp_preload_scripts(&TargetId("T1".into()));

        let script = storage.get(&id).unwrap();
        assert_eq!(script.installed.len(), 1);
        assert_eq!(script.installed[0].0, TargetId("T2".into()));
    }

    #[test]
    fn global_script_applies_to_any_context() {
        let mut storage = PreloadScriptStorage::new();
        storage.add_preload_script(None, "() => {}".into(), None);
        let matches = storage.scripts_for_new_target(&BrowsingContextId("C1".into()));
        assert_eq!(matches.len(), 1);
    }
}
