//! Creation predicates.

use super::CreatePredicate;
use crate::auth::Authorizer;
use crate::index::{DocumentIndex, IndexResult};
use crate::model::principal::OwnerType;
use crate::model::Id;

/// Records org ownership without checking the actor. Trusted callers only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithOrg {
    org: String,
}

impl WithOrg {
    pub fn new(org: impl Into<String>) -> Self {
        Self { org: org.into() }
    }
}

impl CreatePredicate for WithOrg {
    fn name(&self) -> &'static str {
        "with_org"
    }

    fn apply(&self, index: &mut dyn DocumentIndex) -> IndexResult<()> {
        let org_id = index.find_organization_by_name(&self.org)?;
        index.add_document_owner(OwnerType::Org, org_id)
    }
}

/// Records org ownership if the actor is an owner of that org.
///
/// Creating under an org is reserved to org owners; plain members are
/// rejected with `Unauthorized` and no edge is written.
#[derive(Debug, Clone)]
pub struct AuthorizedWithOrg<A> {
    authorizer: A,
    org: String,
}

impl<A: Authorizer> AuthorizedWithOrg<A> {
    pub fn new(authorizer: A, org: impl Into<String>) -> Self {
        Self {
            authorizer,
            org: org.into(),
        }
    }
}

impl<A: Authorizer> CreatePredicate for AuthorizedWithOrg<A> {
    fn name(&self) -> &'static str {
        "authorized_with_org"
    }

    fn apply(&self, index: &mut dyn DocumentIndex) -> IndexResult<()> {
        let org_id = index.find_organization_by_name(&self.org)?;
        index.is_org_owner(self.authorizer.user_id(), org_id)?;
        index.add_document_owner(OwnerType::Org, org_id)
    }
}

/// Records direct ownership by `user_id` without checking the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithUser {
    user_id: Id,
}

impl WithUser {
    pub fn new(user_id: Id) -> Self {
        Self { user_id }
    }
}

impl CreatePredicate for WithUser {
    fn name(&self) -> &'static str {
        "with_user"
    }

    fn apply(&self, index: &mut dyn DocumentIndex) -> IndexResult<()> {
        index.add_document_owner(OwnerType::User, self.user_id)
    }
}

/// Records the actor as a direct owner.
#[derive(Debug, Clone)]
pub struct AuthorizedWithUser<A> {
    authorizer: A,
}

impl<A: Authorizer> AuthorizedWithUser<A> {
    pub fn new(authorizer: A) -> Self {
        Self { authorizer }
    }
}

impl<A: Authorizer> CreatePredicate for AuthorizedWithUser<A> {
    fn name(&self) -> &'static str {
        "authorized_with_user"
    }

    fn apply(&self, index: &mut dyn DocumentIndex) -> IndexResult<()> {
        index.add_document_owner(OwnerType::User, self.authorizer.user_id())
    }
}
