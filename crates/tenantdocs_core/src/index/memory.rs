//! In-memory ownership index.
//!
//! Holds principals, memberships and ownership edges in plain maps. Used as a
//! controllable index for predicate tests and by embedders that keep
//! ownership outside SQLite.

use super::{
    not_org_member, not_org_owner, org_name_not_found, DocumentIndex, IndexError, IndexResult,
};
use crate::model::principal::{OrgRole, OwnerType};
use crate::model::Id;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryDocumentIndex {
    users: BTreeSet<Id>,
    orgs: HashMap<String, Id>,
    roles: HashMap<(Id, Id), OrgRole>,
    owned: HashMap<(OwnerType, Id), BTreeSet<Id>>,
    owners: HashMap<Id, BTreeSet<Id>>,
    document: Option<Id>,
    failure: Option<String>,
}

impl MemoryDocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new user and returns its id.
    pub fn add_user(&mut self) -> Id {
        let id = Uuid::new_v4();
        self.users.insert(id);
        id
    }

    /// Registers an organization, reusing the id if the name already exists.
    pub fn add_org(&mut self, name: impl Into<String>) -> Id {
        *self.orgs.entry(name.into()).or_insert_with(Uuid::new_v4)
    }

    /// Grants `role` in `org_id` to `user_id`, replacing any previous role.
    pub fn grant(&mut self, user_id: Id, org_id: Id, role: OrgRole) {
        self.roles.insert((user_id, org_id), role);
    }

    /// Puts `doc_id` in scope for subsequent `add_document_owner` calls.
    pub fn begin_document(&mut self, doc_id: Id) {
        self.document = Some(doc_id);
    }

    pub fn finish_document(&mut self) {
        self.document = None;
    }

    /// Makes every following call fail with `IndexError::Backend`.
    pub fn fail_with(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }

    pub fn recover(&mut self) {
        self.failure = None;
    }

    fn available(&self) -> IndexResult<()> {
        match &self.failure {
            Some(message) => Err(IndexError::Backend(message.clone())),
            None => Ok(()),
        }
    }

    fn principal_exists(&self, owner_type: OwnerType, owner_id: Id) -> bool {
        match owner_type {
            OwnerType::User => self.users.contains(&owner_id),
            OwnerType::Org => self.orgs.values().any(|id| *id == owner_id),
        }
    }
}

impl DocumentIndex for MemoryDocumentIndex {
    fn add_document_owner(&mut self, owner_type: OwnerType, owner_id: Id) -> IndexResult<()> {
        self.available()?;
        let doc_id = self.document.ok_or(IndexError::NoDocumentInScope)?;
        if !self.principal_exists(owner_type, owner_id) {
            return Err(IndexError::NotFound(format!("{owner_type} {owner_id}")));
        }

        self.owned
            .entry((owner_type, owner_id))
            .or_default()
            .insert(doc_id);
        self.owners.entry(doc_id).or_default().insert(owner_id);
        Ok(())
    }

    fn get_owners_documents(
        &self,
        owner_type: OwnerType,
        owner_id: Id,
    ) -> IndexResult<BTreeSet<Id>> {
        self.available()?;
        Ok(self
            .owned
            .get(&(owner_type, owner_id))
            .cloned()
            .unwrap_or_default())
    }

    fn get_documents_owners(&self, doc_id: Id) -> IndexResult<BTreeSet<Id>> {
        self.available()?;
        Ok(self.owners.get(&doc_id).cloned().unwrap_or_default())
    }

    fn is_org_owner(&self, user_id: Id, org_id: Id) -> IndexResult<()> {
        self.available()?;
        match self.roles.get(&(user_id, org_id)) {
            Some(OrgRole::Owner) => Ok(()),
            _ => Err(not_org_owner(user_id, org_id)),
        }
    }

    fn is_org_member(&self, user_id: Id, org_id: Id) -> IndexResult<()> {
        self.available()?;
        if self.roles.contains_key(&(user_id, org_id)) {
            Ok(())
        } else {
            Err(not_org_member(user_id, org_id))
        }
    }

    fn users_orgs(&self, user_id: Id) -> IndexResult<BTreeSet<Id>> {
        self.available()?;
        Ok(self
            .roles
            .keys()
            .filter(|(member, _)| *member == user_id)
            .map(|(_, org_id)| *org_id)
            .collect())
    }

    fn find_organization_by_name(&self, name: &str) -> IndexResult<Id> {
        self.available()?;
        self.orgs
            .get(name)
            .copied()
            .ok_or_else(|| org_name_not_found(name))
    }
}
