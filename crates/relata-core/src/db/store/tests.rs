use crate::{
    db::store::StoreError,
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::Key,
    model::FieldKind,
    test_fixtures::{empty_session, row, seeded_session, tags},
    value::Value,
};

fn store_error(err: &InternalError) -> &StoreError {
    err.store_error().expect("error should carry store detail")
}

#[test]
fn get_returns_stored_fields_and_foreign_key() {
    let session = seeded_session();

    let book = session.get("Book", 2).expect("Book 2 should exist");

    assert_eq!(book.kind(), "Book");
    assert_eq!(book.key(), &Key::Int(2));
    assert_eq!(book.get("title"), Some(&Value::from("Book 2")));
    assert_eq!(book.get("author"), Some(&Value::Int(1)));
    assert_eq!(book.get("tags"), None);
}

#[test]
fn get_missing_key_is_not_found() {
    let session = seeded_session();

    let err = session.get("Book", 99).expect_err("Book 99 should not exist");

    assert_eq!(err.class, ErrorClass::NotFound);
    assert_eq!(err.origin, ErrorOrigin::Store);
    assert_eq!(
        store_error(&err),
        &StoreError::NotFound {
            kind: "Book".to_string(),
            key: Key::Int(99),
        }
    );
}

#[test]
fn get_coerces_key_to_primary_key_kind() {
    let session = seeded_session();

    let author = session
        .get("Author", 1u64)
        .expect("unsigned key should coerce to an Int primary key");

    assert_eq!(author.key(), &Key::Int(1));
}

#[test]
fn create_schema_twice_is_duplicate_kind() {
    let session = empty_session();

    let err = session
        .create_schema()
        .expect_err("tables already exist");

    assert_eq!(err.class, ErrorClass::Conflict);
    assert!(matches!(
        store_error(&err),
        StoreError::DuplicateKind { kind } if kind == "Author"
    ));
}

#[test]
fn create_table_rejects_registered_kind() {
    let session = empty_session();

    let err = session
        .create_table("Book")
        .expect_err("Book table already exists");

    assert!(matches!(
        store_error(&err),
        StoreError::DuplicateKind { kind } if kind == "Book"
    ));
}

#[test]
fn insert_into_missing_table_is_unknown_table() {
    let session = crate::db::Db::new(crate::test_fixtures::library_schema()).session();

    let err = session
        .insert_many("Author", vec![row([("id", 1.into()), ("name", "A".into())])])
        .expect_err("no tables were created");

    assert!(matches!(
        store_error(&err),
        StoreError::UnknownTable { kind } if kind == "Author"
    ));
}

#[test]
fn failing_row_leaves_batch_unapplied() {
    let session = empty_session();

    let err = session
        .insert_many(
            "BookTag",
            vec![
                row([("id", 1.into()), ("name", "Fiction".into())]),
                row([("id", 2.into()), ("name", "Science".into())]),
                row([("id", 3.into()), ("name", 3.into())]),
            ],
        )
        .expect_err("third row has a mistyped name");

    assert!(matches!(
        store_error(&err),
        StoreError::TypeMismatch {
            field,
            expected: FieldKind::Text,
            found: "int",
            ..
        } if field == "name"
    ));
    assert!(session.find_all("BookTag").expect("find should run").is_empty());
}

#[test]
fn duplicate_primary_key_in_table_is_rejected() {
    let session = seeded_session();

    let err = session
        .insert_many(
            "BookTag",
            vec![
                row([("id", 4.into()), ("name", "Poetry".into())]),
                row([("id", 1.into()), ("name", "Again".into())]),
            ],
        )
        .expect_err("tag 1 already exists");

    assert_eq!(err.class, ErrorClass::Conflict);
    assert_eq!(
        store_error(&err),
        &StoreError::DuplicatePrimaryKey {
            kind: "BookTag".to_string(),
            key: Key::Int(1),
        }
    );
    assert!(session.get("BookTag", 4).is_err());
}

#[test]
fn duplicate_primary_key_within_batch_is_rejected() {
    let session = empty_session();

    let err = session
        .insert_many(
            "BookTag",
            vec![
                row([("id", 7.into()), ("name", "A".into())]),
                row([("id", 7.into()), ("name", "B".into())]),
            ],
        )
        .expect_err("key 7 appears twice");

    assert!(matches!(
        store_error(&err),
        StoreError::DuplicatePrimaryKey { key: Key::Int(7), .. }
    ));
    assert_eq!(session.count("BookTag", crate::db::query::Filter::True).ok(), Some(0));
}

#[test]
fn unique_field_rejects_existing_and_batch_duplicates() {
    let session = seeded_session();

    let err = session
        .insert_many(
            "Author",
            vec![row([
                ("id", 3.into()),
                ("name", "Author 3".into()),
                ("email", "a1@example.com".into()),
            ])],
        )
        .expect_err("email already taken");
    assert!(matches!(
        store_error(&err),
        StoreError::UniqueViolation { field, .. } if field == "email"
    ));

    let err = session
        .insert_many(
            "Author",
            vec![
                row([
                    ("id", 3.into()),
                    ("name", "Author 3".into()),
                    ("email", "same@example.com".into()),
                ]),
                row([
                    ("id", 4.into()),
                    ("name", "Author 4".into()),
                    ("email", "same@example.com".into()),
                ]),
            ],
        )
        .expect_err("email repeated within the batch");
    assert!(matches!(store_error(&err), StoreError::UniqueViolation { .. }));
    assert_eq!(session.find_all("Author").expect("find").count(), 2);
}

#[test]
fn null_unique_values_never_collide() {
    let session = empty_session();

    session
        .insert_many(
            "Author",
            vec![
                row([
                    ("id", 1.into()),
                    ("name", "A".into()),
                    ("email", "a@example.com".into()),
                    ("handle", Value::Null),
                ]),
                row([
                    ("id", 2.into()),
                    ("name", "B".into()),
                    ("email", "b@example.com".into()),
                ]),
                row([
                    ("id", 3.into()),
                    ("name", "C".into()),
                    ("email", "c@example.com".into()),
                    ("handle", Value::Null),
                ]),
            ],
        )
        .expect("authors without a handle should insert");

    assert_eq!(
        session.get("Author", 1).expect("author 1").get("handle"),
        Some(&Value::Null)
    );
    assert_eq!(session.get("Author", 2).expect("author 2").get("handle"), None);
}

#[test]
fn required_unique_field_rejects_null() {
    let session = empty_session();

    let err = session
        .insert_many(
            "Author",
            vec![row([("id", 1.into()), ("name", "A".into()), ("email", Value::Null)])],
        )
        .expect_err("email is required");

    assert!(matches!(
        store_error(&err),
        StoreError::MissingField { field, .. } if field == "email"
    ));
}

#[test]
fn unknown_member_is_unknown_field() {
    let session = empty_session();

    let err = session
        .insert_many(
            "BookTag",
            vec![row([("id", 1.into()), ("name", "A".into()), ("colour", "red".into())])],
        )
        .expect_err("colour is not declared");

    assert_eq!(
        store_error(&err),
        &StoreError::UnknownField {
            kind: "BookTag".to_string(),
            field: "colour".to_string(),
        }
    );
}

#[test]
fn absent_or_null_required_field_is_missing_field() {
    let session = empty_session();

    let err = session
        .insert_many("BookTag", vec![row([("id", 1.into())])])
        .expect_err("name is required");
    assert!(matches!(
        store_error(&err),
        StoreError::MissingField { field, .. } if field == "name"
    ));

    let err = session
        .insert_many("BookTag", vec![row([("id", 1.into()), ("name", Value::Null)])])
        .expect_err("null is not a value for a required field");
    assert!(matches!(
        store_error(&err),
        StoreError::MissingField { field, .. } if field == "name"
    ));
}

#[test]
fn relation_to_missing_target_is_rejected() {
    let session = seeded_session();

    let err = session
        .insert_many(
            "Book",
            vec![row([
                ("id", 4.into()),
                ("title", "Book 4".into()),
                ("author", 1.into()),
                ("tags", tags(&[1, 9])),
            ])],
        )
        .expect_err("tag 9 does not exist");

    assert_eq!(
        store_error(&err),
        &StoreError::RelationTargetMissing {
            kind: "Book".to_string(),
            field: "tags".to_string(),
            target: "BookTag".to_string(),
            key: Key::Int(9),
        }
    );
    assert!(session.get("Book", 4).is_err());
    assert_eq!(
        session
            .related_of("BookTag", 1, "books")
            .expect("tag 1 books")
            .keys(),
        vec![Key::Int(1), Key::Int(3)]
    );
}

#[test]
fn writing_a_derived_side_is_rejected() {
    let session = seeded_session();

    let err = session
        .insert_many(
            "BookTag",
            vec![row([
                ("id", 4.into()),
                ("name", "Poetry".into()),
                ("books", tags(&[1])),
            ])],
        )
        .expect_err("BookTag.books is mapped by Book.tags");

    assert!(matches!(
        store_error(&err),
        StoreError::DerivedRelationWrite { field, .. } if field == "books"
    ));
}

#[test]
fn to_many_owning_side_requires_a_list() {
    let session = seeded_session();

    let err = session
        .insert_many(
            "Book",
            vec![row([
                ("id", 4.into()),
                ("title", "Book 4".into()),
                ("tags", 1.into()),
            ])],
        )
        .expect_err("tags must be a list");

    assert!(matches!(store_error(&err), StoreError::InvalidDocument { .. }));
}

#[test]
fn insert_many_json_accepts_row_objects() {
    let session = seeded_session();

    let inserted = session
        .insert_many_json(
            "Book",
            &serde_json::json!([
                { "id": 4, "title": "Book 4", "author": 2, "tags": [2] },
                { "id": 5, "title": "Book 5" },
            ]),
        )
        .expect("json rows should insert");

    assert_eq!(inserted, 2);
    assert_eq!(
        session.get("Book", 5).expect("Book 5").get("author"),
        None
    );

    let err = session
        .insert_many_json("Book", &serde_json::json!({ "id": 6 }))
        .expect_err("a bare object is not a batch");
    assert!(matches!(store_error(&err), StoreError::InvalidDocument { .. }));
}
