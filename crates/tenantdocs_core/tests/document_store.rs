use rusqlite::Connection;
use serde_json::json;
use std::collections::BTreeSet;
use tenantdocs_core::db::open_db_in_memory;
use tenantdocs_core::{
    AuthorizedWhere, AuthorizedWhereId, AuthorizedWhereOrg, AuthorizedWithOrg, AuthorizedWithUser,
    CreatePredicate, Document, DocumentIndex, DocumentService, DocumentStore, ErrorKind,
    FindPredicate, Id, OrgRole, SqliteDirectory, SqliteDocumentIndex, SqliteDocumentService,
    StoreError, UserSession, WhereId, WhereOrg, WithOrg,
};
use uuid::Uuid;

struct People {
    acme: Id,
    owner: UserSession,
    member: UserSession,
    stranger: UserSession,
}

fn people(conn: &Connection) -> People {
    let directory = SqliteDirectory::try_new(conn).unwrap();
    let acme = directory.create_org("acme").unwrap().id;
    let owner = directory.create_user().unwrap();
    let member = directory.create_user().unwrap();
    let stranger = directory.create_user().unwrap();
    directory.grant_org_role(owner, acme, OrgRole::Owner).unwrap();
    directory.grant_org_role(member, acme, OrgRole::Member).unwrap();

    People {
        acme,
        owner: UserSession::new(owner),
        member: UserSession::new(member),
        stranger: UserSession::new(stranger),
    }
}

fn ids(documents: &[Document]) -> BTreeSet<Id> {
    documents.iter().map(|doc| doc.id).collect()
}

#[test]
fn owner_creates_member_reads_stranger_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let p = people(&conn);
    let service = SqliteDocumentService::new(&conn);
    let store = service.create_document_store("templates").unwrap();

    let doc = Document::new("onboarding", Some(json!({"steps": 3})));
    store
        .create_document(&doc, &[&AuthorizedWithOrg::new(p.owner, "acme")])
        .unwrap();

    let index = SqliteDocumentIndex::try_new(&conn).unwrap();
    assert_eq!(
        index.get_documents_owners(doc.id).unwrap(),
        BTreeSet::from([p.acme])
    );

    let found = store
        .find_documents(&[&AuthorizedWhereOrg::new(p.member, "acme")])
        .unwrap();
    assert_eq!(found, vec![doc]);

    let err = store
        .find_documents(&[&AuthorizedWhereOrg::new(p.stranger, "acme")])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn failed_authorization_persists_neither_document_nor_edge() {
    let conn = open_db_in_memory().unwrap();
    let p = people(&conn);
    let store = SqliteDocumentService::new(&conn)
        .create_document_store("templates")
        .unwrap();

    let doc = Document::new("draft", None);
    let err = store
        .create_document(&doc, &[&AuthorizedWithOrg::new(p.member, "acme")])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let index = SqliteDocumentIndex::try_new(&conn).unwrap();
    assert!(index.get_documents_owners(doc.id).unwrap().is_empty());
    assert_eq!(
        store.find_documents_by_id(&[doc.id]).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn later_predicate_failure_rolls_back_earlier_edges() {
    let conn = open_db_in_memory().unwrap();
    let p = people(&conn);
    let store = SqliteDocumentService::new(&conn)
        .create_document_store("templates")
        .unwrap();

    let doc = Document::new("split", None);
    let with_self = AuthorizedWithUser::new(p.member);
    let with_acme = AuthorizedWithOrg::new(p.member, "acme");
    let predicates: [&dyn CreatePredicate; 2] = [&with_self, &with_acme];
    store.create_document(&doc, &predicates).unwrap_err();

    let index = SqliteDocumentIndex::try_new(&conn).unwrap();
    assert!(index.get_documents_owners(doc.id).unwrap().is_empty());
}

#[test]
fn fan_out_ownership_is_visible_through_both_owners() {
    let conn = open_db_in_memory().unwrap();
    let p = people(&conn);
    let store = SqliteDocumentService::new(&conn)
        .create_document_store("templates")
        .unwrap();

    let doc = Document::new("shared", None);
    let predicates: [&dyn CreatePredicate; 2] = [
        &AuthorizedWithOrg::new(p.owner, "acme"),
        &AuthorizedWithUser::new(p.owner),
    ];
    store.create_document(&doc, &predicates).unwrap();

    let index = SqliteDocumentIndex::try_new(&conn).unwrap();
    assert_eq!(index.get_documents_owners(doc.id).unwrap().len(), 2);
    let mine = store
        .find_documents(&[&AuthorizedWhere::new(p.owner)])
        .unwrap();
    assert_eq!(ids(&mine), BTreeSet::from([doc.id]));
}

#[test]
fn multiple_find_predicates_intersect() {
    let conn = open_db_in_memory().unwrap();
    let p = people(&conn);
    let store = SqliteDocumentService::new(&conn)
        .create_document_store("templates")
        .unwrap();

    let org_doc = Document::new("org", None);
    let private_doc = Document::new("private", None);
    store
        .create_document(&org_doc, &[&WithOrg::new("acme")])
        .unwrap();
    store
        .create_document(&private_doc, &[&AuthorizedWithUser::new(p.stranger)])
        .unwrap();

    let visible = AuthorizedWhereOrg::new(p.member, "acme");
    let pick_org = WhereId::new(org_doc.id);
    let pick_private = WhereId::new(private_doc.id);

    let both: [&dyn FindPredicate; 2] = [&visible, &pick_org];
    assert_eq!(store.find_documents(&both).unwrap(), vec![org_doc]);

    // The private document is not reachable by stacking an id predicate.
    let both: [&dyn FindPredicate; 2] = [&visible, &pick_private];
    assert!(store.find_documents(&both).unwrap().is_empty());
}

#[test]
fn find_and_delete_require_a_predicate() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentService::new(&conn)
        .create_document_store("templates")
        .unwrap();

    assert!(matches!(
        store.find_documents(&[]).unwrap_err(),
        StoreError::MissingFindPredicate
    ));
    assert_eq!(
        store.delete_documents(&[]).unwrap_err().kind(),
        ErrorKind::Invalid
    );
}

#[test]
fn authorized_where_id_gates_single_document_reads() {
    let conn = open_db_in_memory().unwrap();
    let p = people(&conn);
    let store = SqliteDocumentService::new(&conn)
        .create_document_store("templates")
        .unwrap();

    let doc = Document::new("budget", Some(json!([1, 2, 3])));
    store
        .create_document(&doc, &[&WithOrg::new("acme")])
        .unwrap();

    let found = store
        .find_documents(&[&AuthorizedWhereId::new(p.owner, doc.id)])
        .unwrap();
    assert_eq!(found, vec![doc.clone()]);

    let err = store
        .find_documents(&[&AuthorizedWhereId::new(p.member, doc.id)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn delete_removes_selected_documents_and_their_edges() {
    let conn = open_db_in_memory().unwrap();
    let p = people(&conn);
    let store = SqliteDocumentService::new(&conn)
        .create_document_store("templates")
        .unwrap();

    let keep = Document::new("keep", None);
    let drop_me = Document::new("drop", None);
    for doc in [&keep, &drop_me] {
        store
            .create_document(doc, &[&AuthorizedWithOrg::new(p.owner, "acme")])
            .unwrap();
    }

    let removed = store
        .delete_documents(&[&WhereId::new(drop_me.id)])
        .unwrap();
    assert_eq!(removed, 1);

    let remaining = store.find_documents(&[&WhereOrg::new("acme")]).unwrap();
    assert_eq!(remaining, vec![keep]);
    let index = SqliteDocumentIndex::try_new(&conn).unwrap();
    assert!(index.get_documents_owners(drop_me.id).unwrap().is_empty());
}

#[test]
fn stores_are_isolated_namespaces() {
    let conn = open_db_in_memory().unwrap();
    let p = people(&conn);
    let service = SqliteDocumentService::new(&conn);
    let dashboards = service.create_document_store("dashboards").unwrap();
    let templates = service.create_document_store("templates").unwrap();

    let doc = Document::new("cpu", None);
    dashboards
        .create_document(&doc, &[&AuthorizedWithOrg::new(p.owner, "acme")])
        .unwrap();

    assert!(templates
        .find_documents(&[&WhereOrg::new("acme")])
        .unwrap()
        .is_empty());
    assert_eq!(templates.delete_documents(&[&WhereId::new(doc.id)]).unwrap(), 0);
    assert_eq!(dashboards.find_documents_by_id(&[doc.id]).unwrap(), vec![doc]);
}

#[test]
fn document_service_creates_and_resolves_stores_by_name() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteDocumentService::new(&conn);

    let created = service.create_document_store("templates").unwrap();
    let found = service.find_document_store(" templates ").unwrap();
    assert_eq!(created.id(), found.id());
    assert_eq!(found.name(), "templates");

    assert_eq!(
        service
            .create_document_store("templates")
            .err()
            .map(|err| err.kind()),
        Some(ErrorKind::Conflict)
    );
    assert_eq!(
        service.create_document_store("  ").err().map(|err| err.kind()),
        Some(ErrorKind::Invalid)
    );
    assert!(matches!(
        service.find_document_store("missing").err(),
        Some(StoreError::StoreNotFound(name)) if name == "missing"
    ));
}

#[test]
fn find_by_id_keeps_request_order_and_reports_missing_ids() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentService::new(&conn)
        .create_document_store("templates")
        .unwrap();

    let first = Document::new("first", None);
    let second = Document::new("second", Some(json!({"k": "v"})));
    for doc in [&first, &second] {
        store.create_document(doc, &[&WithOrg::new("nowhere")]).unwrap_err();
        store.create_document(doc, &[]).unwrap();
    }

    let found = store.find_documents_by_id(&[second.id, first.id]).unwrap();
    assert_eq!(found, vec![second.clone(), first.clone()]);

    let ghost = Uuid::new_v4();
    assert!(matches!(
        store.find_documents_by_id(&[first.id, ghost]).unwrap_err(),
        StoreError::DocumentNotFound(id) if id == ghost
    ));

    assert_eq!(
        store.create_document(&first, &[]).unwrap_err().kind(),
        ErrorKind::Conflict
    );
}

#[test]
fn find_by_id_returns_one_entry_per_requested_id() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentService::new(&conn)
        .create_document_store("templates")
        .unwrap();

    let doc = Document::new("repeated", None);
    store.create_document(&doc, &[]).unwrap();

    let found = store.find_documents_by_id(&[doc.id, doc.id]).unwrap();
    assert_eq!(found, vec![doc.clone(), doc]);
}
