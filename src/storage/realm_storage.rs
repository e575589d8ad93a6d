//! Component B — `RealmStorage` (spec section 4.2).

use std::collections::HashMap;

use crate::bidi::{BrowsingContextId, Handle, RealmId, RealmType};
use crate::cdp::target::SessionId;
use crate::error::BidiError;
use crate::model::realm::Realm;

/// Filter accepted by [`RealmStorage::find_realms`] / [`RealmStorage::get_realm`].
#[derive(Debug, Clone, Default)]
pub struct RealmFilter {
    pub context_id: Option<BrowsingContextId>,
    pub realm_type: Option<RealmType>,
    pub session_id: Option<SessionId>,
    pub sandbox: Option<String>,
}

impl RealmFilter {
    fn matches(&self, realm: &Realm) -> bool {
        if let Some(context_id) = &self.context_id {
            if &realm.context_id != context_id {
                return false;
            }
        }
        if let Some(realm_type) = self.realm_type {
            if realm.realm_type != realm_type {
                return false;
            }
        }
        if let Some(session_id) = &self.session_id {
            if &realm.session_id != session_id {
                return false;
            }
        }
        if let Some(sandbox) = &self.sandbox {
            if realm.sandbox.as_deref() != Some(sandbox.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Indexed realm store plus the handle→realm ownership index (spec
/// invariants 1 and 2).
#[derive(Default)]
pub struct RealmStorage {
    realms: HashMap<RealmId, Realm>,
    known_handles_to_realm: HashMap<Handle, RealmId>,
}

impl RealmStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_realm(&mut self, realm: Realm) {
        self.realms.insert(realm.id.clone(), realm);
    }

    /// Purges the realm and every handle it granted (spec invariant 2:
    /// "destroying a realm purges its handles").
    pub fn delete_realm(&mut self, id: &RealmId) -> Option<Realm> {
        self.known_handles_to_realm.retain(|_, owner| owner != id);
        self.realms.remove(id)
    }

    /// Deletes every realm belonging to `context_id`, e.g. on context
    /// teardown or navigation commit (a fresh principal realm replaces the
    /// old one).
    pub fn delete_realms_for_context(&mut self, context_id: &BrowsingContextId) {
        let doomed: Vec<RealmId> = self
            .realms
            .values()
            .filter(|r| &r.context_id == context_id)
            .map(|r| r.id.clone())
            .collect();
        for id in doomed {
            self.delete_realm(&id);
        }
    }

    pub fn find_realms(&self, filter: &RealmFilter) -> Vec<&Realm> {
        self.realms.values().filter(|r| filter.matches(r)).collect()
    }

    /// Resolves exactly one matching realm, per the storage-level `NoSuchRealm`
    /// (0 matches) / ambiguous (>1 match) contract (spec 4.2).
    pub fn get_realm(&self, filter: &RealmFilter) -> Result<&Realm, BidiError> {
        let mut matches = self.find_realms(filter).into_iter();
        let first = matches.next().ok_or_else(|| {
            BidiError::new(crate::error::BidiErrorCode::NoSuchHandle, "no such realm")
        })?;
        if matches.next().is_some() {
            return Err(BidiError::unknown_error("ambiguous realm filter: multiple matches"));
        }
        Ok(first)
    }

    pub fn get_realm_by_id(&self, id: &RealmId) -> Option<&Realm> {
        self.realms.get(id)
    }

    pub fn register_handle(&mut self, handle: Handle, realm: RealmId) {
        self.known_handles_to_realm.insert(handle, realm);
    }

    /// The realm a handle belongs to, or `None` if it is unknown — a
    /// `disown` of an unknown or foreign-realm handle is a silent no-op
    /// (spec 4.4 "Disown").
    pub fn realm_for_handle(&self, handle: &Handle) -> Option<&RealmId> {
        self.known_handles_to_realm.get(handle)
    }

    pub fn forget_handle(&mut self, handle: &Handle) {
        self.known_handles_to_realm.remove(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::runtime::ExecutionContextId;

    fn realm(id: &str, context: &str) -> Realm {
        Realm {
            id: RealmId(id.into()),
            context_id: BrowsingContextId(context.into()),
            execution_context_id: ExecutionContextId(1),
            session_id: SessionId("S1".into()),
            origin: "http://x/".into(),
            realm_type: RealmType::Window,
            sandbox: None,
        }
    }

    #[test]
    fn delete_realm_purges_its_handles() {
        let mut storage = RealmStorage::new();
        storage.add_realm(realm("R1", "C1"));
        storage.register_handle(Handle("H1".into()), RealmId("R1".into()));
        storage.delete_realm(&RealmId("R1".into()));
        assert!(storage.realm_for_handle(&Handle("H1".into())).is_none());
    }

    #[test]
    fn get_realm_fails_ambiguous_on_multiple_matches() {
        let mut storage = RealmStorage::new();
        storage.add_realm(realm("R1", "C1"));
        storage.add_realm(realm("R2", "C1"));
        let filter = RealmFilter {
            context_id: Some(BrowsingContextId("C1".into())),
            ..Default::default()
        };
        let err = storage.get_realm(&filter).unwrap_err();
        assert_eq!(err.code, crate::error::BidiErrorCode::UnknownError);
    }

    #[test]
    fn get_realm_fails_no_such_realm_on_zero_matches() {
        let storage = RealmStorage::new();
        let err = storage.get_realm(&RealmFilter::default()).unwrap_err();
        assert_eq!(err.code, crate::error::BidiErrorCode::NoSuchHandle);
    }
}
