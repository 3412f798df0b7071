use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use tenantdocs_core::db::open_db_in_memory;
use tenantdocs_core::{
    DirectoryError, DocumentIndex, ErrorKind, Id, IndexError, OrgRole, OwnerType,
    SqliteDirectory, SqliteDocumentIndex,
};
use uuid::Uuid;

struct Seed {
    acme: Id,
    globex: Id,
    owner: Id,
    member: Id,
    stranger: Id,
}

fn seed(conn: &Connection) -> Seed {
    let directory = SqliteDirectory::try_new(conn).unwrap();
    let acme = directory.create_org("acme").unwrap().id;
    let globex = directory.create_org("globex").unwrap().id;
    let owner = directory.create_user().unwrap();
    let member = directory.create_user().unwrap();
    let stranger = directory.create_user().unwrap();
    directory.grant_org_role(owner, acme, OrgRole::Owner).unwrap();
    directory.grant_org_role(member, acme, OrgRole::Member).unwrap();
    directory.grant_org_role(member, globex, OrgRole::Member).unwrap();

    Seed {
        acme,
        globex,
        owner,
        member,
        stranger,
    }
}

#[test]
fn directory_rejects_blank_and_duplicate_org_names() {
    let conn = open_db_in_memory().unwrap();
    let directory = SqliteDirectory::try_new(&conn).unwrap();

    assert!(matches!(
        directory.create_org("   ").unwrap_err(),
        DirectoryError::InvalidOrgName
    ));

    let acme = directory.create_org(" acme ").unwrap();
    assert_eq!(acme.name, "acme");
    assert!(matches!(
        directory.create_org("acme").unwrap_err(),
        DirectoryError::OrgNameTaken(name) if name == "acme"
    ));
    assert_eq!(directory.find_org_by_name("acme").unwrap(), Some(acme));
}

#[test]
fn directory_grant_requires_known_principals_and_replaces_role() {
    let conn = open_db_in_memory().unwrap();
    let directory = SqliteDirectory::try_new(&conn).unwrap();
    let org = directory.create_org("acme").unwrap().id;
    let user = directory.create_user().unwrap();

    let ghost = Uuid::new_v4();
    assert!(matches!(
        directory.grant_org_role(ghost, org, OrgRole::Member).unwrap_err(),
        DirectoryError::UserNotFound(id) if id == ghost
    ));
    assert!(matches!(
        directory.grant_org_role(user, ghost, OrgRole::Member).unwrap_err(),
        DirectoryError::OrgNotFound(id) if id == ghost
    ));

    directory.grant_org_role(user, org, OrgRole::Member).unwrap();
    directory.grant_org_role(user, org, OrgRole::Owner).unwrap();
    assert_eq!(directory.org_role(user, org).unwrap(), Some(OrgRole::Owner));
}

#[test]
fn repositories_refuse_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    assert!(matches!(
        SqliteDirectory::try_new(&conn),
        Err(DirectoryError::MissingRequiredTable("users"))
    ));
    assert!(matches!(
        SqliteDocumentIndex::try_new(&conn),
        Err(IndexError::InvalidData(_))
    ));
}

#[test]
fn membership_queries_follow_directory_roles() {
    let conn = open_db_in_memory().unwrap();
    let seed = seed(&conn);
    let index = SqliteDocumentIndex::try_new(&conn).unwrap();

    assert_eq!(index.find_organization_by_name("acme").unwrap(), seed.acme);
    assert_eq!(
        index.find_organization_by_name("initech").unwrap_err().kind(),
        ErrorKind::NotFound
    );

    index.is_org_owner(seed.owner, seed.acme).unwrap();
    index.is_org_member(seed.owner, seed.acme).unwrap();
    index.is_org_member(seed.member, seed.acme).unwrap();
    assert!(index.is_org_owner(seed.member, seed.acme).unwrap_err().is_unauthorized());
    assert!(index
        .is_org_member(seed.stranger, seed.acme)
        .unwrap_err()
        .is_unauthorized());

    assert_eq!(
        index.users_orgs(seed.member).unwrap(),
        BTreeSet::from([seed.acme, seed.globex])
    );
    assert!(index.users_orgs(seed.stranger).unwrap().is_empty());
}

#[test]
fn add_document_owner_needs_a_document_in_scope() {
    let conn = open_db_in_memory().unwrap();
    let seed = seed(&conn);
    let mut index = SqliteDocumentIndex::try_new(&conn).unwrap();

    assert!(matches!(
        index.add_document_owner(OwnerType::Org, seed.acme),
        Err(IndexError::NoDocumentInScope)
    ));
}

#[test]
fn add_document_owner_rejects_unknown_principals() {
    let conn = open_db_in_memory().unwrap();
    let seed = seed(&conn);
    let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate).unwrap();
    let mut index = SqliteDocumentIndex::for_document(&tx, Uuid::new_v4()).unwrap();

    // An org id is not a user id.
    let err = index
        .add_document_owner(OwnerType::User, seed.acme)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn edges_without_a_document_row_cannot_commit() {
    let conn = open_db_in_memory().unwrap();
    let seed = seed(&conn);
    let doc = Uuid::new_v4();

    let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate).unwrap();
    {
        let mut index = SqliteDocumentIndex::for_document(&tx, doc).unwrap();
        index.add_document_owner(OwnerType::Org, seed.acme).unwrap();
        index.add_document_owner(OwnerType::Org, seed.acme).unwrap();
        assert_eq!(
            index.get_documents_owners(doc).unwrap(),
            BTreeSet::from([seed.acme])
        );
    }
    assert!(tx.commit().is_err());

    let index = SqliteDocumentIndex::try_new(&conn).unwrap();
    assert!(index.get_documents_owners(doc).unwrap().is_empty());
}
