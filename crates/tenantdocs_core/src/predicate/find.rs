//! Find predicates.

use super::FindPredicate;
use crate::auth::Authorizer;
use crate::index::{DocumentIndex, ErrorKind, IndexError, IndexResult};
use crate::model::principal::OwnerType;
use crate::model::Id;
use std::collections::BTreeSet;

/// All documents owned by the named org. No access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereOrg {
    org: String,
}

impl WhereOrg {
    pub fn new(org: impl Into<String>) -> Self {
        Self { org: org.into() }
    }
}

impl FindPredicate for WhereOrg {
    fn name(&self) -> &'static str {
        "where_org"
    }

    fn apply(&self, index: &dyn DocumentIndex) -> IndexResult<BTreeSet<Id>> {
        let org_id = index.find_organization_by_name(&self.org)?;
        index.get_owners_documents(OwnerType::Org, org_id)
    }
}

/// The named org's documents, for any member of that org.
///
/// Reading is open to members while creating requires org ownership.
#[derive(Debug, Clone)]
pub struct AuthorizedWhereOrg<A> {
    authorizer: A,
    org: String,
}

impl<A: Authorizer> AuthorizedWhereOrg<A> {
    pub fn new(authorizer: A, org: impl Into<String>) -> Self {
        Self {
            authorizer,
            org: org.into(),
        }
    }
}

impl<A: Authorizer> FindPredicate for AuthorizedWhereOrg<A> {
    fn name(&self) -> &'static str {
        "authorized_where_org"
    }

    fn apply(&self, index: &dyn DocumentIndex) -> IndexResult<BTreeSet<Id>> {
        let org_id = index.find_organization_by_name(&self.org)?;
        index.is_org_member(self.authorizer.user_id(), org_id)?;
        index.get_owners_documents(OwnerType::Org, org_id)
    }
}

/// Everything visible to the actor: its own documents plus those of every
/// org it belongs to.
#[derive(Debug, Clone)]
pub struct AuthorizedWhere<A> {
    authorizer: A,
}

impl<A: Authorizer> AuthorizedWhere<A> {
    pub fn new(authorizer: A) -> Self {
        Self { authorizer }
    }
}

impl<A: Authorizer> FindPredicate for AuthorizedWhere<A> {
    fn name(&self) -> &'static str {
        "authorized_where"
    }

    fn apply(&self, index: &dyn DocumentIndex) -> IndexResult<BTreeSet<Id>> {
        let user_id = self.authorizer.user_id();
        let mut ids = index.get_owners_documents(OwnerType::User, user_id)?;
        for org_id in index.users_orgs(user_id)? {
            ids.extend(index.get_owners_documents(OwnerType::Org, org_id)?);
        }
        Ok(ids)
    }
}

/// Selects exactly one document id. No lookup, no access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhereId {
    doc_id: Id,
}

impl WhereId {
    pub fn new(doc_id: Id) -> Self {
        Self { doc_id }
    }
}

impl FindPredicate for WhereId {
    fn name(&self) -> &'static str {
        "where_id"
    }

    fn apply(&self, _index: &dyn DocumentIndex) -> IndexResult<BTreeSet<Id>> {
        Ok(BTreeSet::from([self.doc_id]))
    }
}

/// Selects one document if the actor owns any org that owns it.
///
/// Every owner of the document is checked as an org. A document owned only
/// by a user therefore never passes, not even for that user.
#[derive(Debug, Clone)]
pub struct AuthorizedWhereId<A> {
    authorizer: A,
    doc_id: Id,
}

impl<A: Authorizer> AuthorizedWhereId<A> {
    pub fn new(authorizer: A, doc_id: Id) -> Self {
        Self { authorizer, doc_id }
    }
}

impl<A: Authorizer> FindPredicate for AuthorizedWhereId<A> {
    fn name(&self) -> &'static str {
        "authorized_where_id"
    }

    fn apply(&self, index: &dyn DocumentIndex) -> IndexResult<BTreeSet<Id>> {
        let user_id = self.authorizer.user_id();
        for owner_id in index.get_documents_owners(self.doc_id)? {
            match index.is_org_owner(user_id, owner_id) {
                Ok(()) => return Ok(BTreeSet::from([self.doc_id])),
                // Denied for this owner; another owner may still grant access.
                Err(err) if matches!(err.kind(), ErrorKind::Unauthorized | ErrorKind::NotFound) => {}
                Err(err) => return Err(err),
            }
        }

        Err(IndexError::Unauthorized(format!(
            "user {user_id} cannot access document {}",
            self.doc_id
        )))
    }
}
