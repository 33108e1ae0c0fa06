use crate::{
    db::relation::RelationError,
    error::{ErrorClass, ErrorOrigin},
    key::Key,
    model::FieldKind,
    schema::{EntityDecl, RelationDecl, SchemaBuilder},
    test_fixtures::{row, seeded_session, tags},
    value::Value,
};

fn keys(ids: &[i64]) -> Vec<Key> {
    ids.iter().copied().map(Key::Int).collect()
}

#[test]
fn owning_many_to_many_follows_pair_insertion_order() {
    let session = seeded_session();

    let related = session
        .related_of("Book", 3, "tags")
        .expect("Book 3 tags should resolve");

    assert_eq!(related.keys(), keys(&[1, 2, 3]));
    assert!(related.iter().all(|tag| tag.kind() == "BookTag"));
}

#[test]
fn derived_many_to_many_is_symmetric_with_owning_side() {
    let session = seeded_session();

    let fiction = session
        .related_of("BookTag", 1, "books")
        .expect("Fiction books should resolve");
    let fantasy = session
        .related_of("BookTag", 3, "books")
        .expect("Fantasy books should resolve");

    assert_eq!(fiction.keys(), keys(&[1, 3]));
    assert_eq!(fantasy.keys(), keys(&[1, 2, 3]));

    for book in &fantasy {
        let book_tags = session
            .related_of("Book", book.key().clone(), "tags")
            .expect("book tags should resolve");
        assert!(book_tags.contains_key(&Key::Int(3)));
    }
}

#[test]
fn many_to_one_and_its_mirror_agree() {
    let session = seeded_session();

    let author = session
        .related_of("Book", 2, "author")
        .expect("Book 2 author should resolve")
        .require_one("Author")
        .expect("Book 2 has exactly one author");
    assert_eq!(author.key(), &Key::Int(1));

    let books = session
        .related_of("Author", 1, "books")
        .expect("Author 1 books should resolve");
    assert_eq!(books.keys(), keys(&[1, 2]));
}

#[test]
fn unlinked_records_have_no_related_entities() {
    let session = seeded_session();
    session
        .insert_many(
            "Book",
            vec![row([("id", 4.into()), ("title", "Book 4".into())])],
        )
        .expect("book without relations should insert");
    session
        .insert_many(
            "BookTag",
            vec![row([("id", 4.into()), ("name", "Poetry".into())])],
        )
        .expect("unused tag should insert");

    assert!(session.related_of("Book", 4, "author").expect("author").is_empty());
    assert!(session.related_of("Book", 4, "tags").expect("tags").is_empty());
    assert!(session.related_of("BookTag", 4, "books").expect("books").is_empty());
}

#[test]
fn repeated_pairs_in_one_row_are_stored_once() {
    let session = seeded_session();
    session
        .insert_many(
            "Book",
            vec![row([
                ("id", 4.into()),
                ("title", "Book 4".into()),
                ("tags", tags(&[2, 2, 1])),
            ])],
        )
        .expect("repeated tag keys should insert");

    let related = session.related_of("Book", 4, "tags").expect("tags");
    assert_eq!(related.keys(), keys(&[2, 1]));
}

#[test]
fn undeclared_relationship_is_unknown_relationship() {
    let session = seeded_session();

    let err = session
        .related_of("Book", 1, "genres")
        .expect_err("genres is not a relationship");
    assert_eq!(err.class, ErrorClass::Invalid);
    assert_eq!(err.origin, ErrorOrigin::Relation);
    assert_eq!(
        err.relation_error(),
        Some(&RelationError::UnknownRelationship {
            kind: "Book".to_string(),
            field: "genres".to_string(),
        })
    );

    // scalar fields are not relationships either
    let err = session
        .related_of("Book", 1, "title")
        .expect_err("title is a scalar field");
    assert!(matches!(
        err.relation_error(),
        Some(RelationError::UnknownRelationship { .. })
    ));
}

#[test]
fn missing_source_record_is_not_found() {
    let session = seeded_session();

    let err = session
        .related_of("Book", 42, "tags")
        .expect_err("Book 42 does not exist");

    assert!(err.is_not_found());
}

#[test]
fn self_referencing_rows_may_link_within_one_batch() {
    let schema = SchemaBuilder::new()
        .entity(
            EntityDecl::new("Employee")
                .primary("id", FieldKind::Text)
                .relation(
                    RelationDecl::many_to_one("manager", "Employee").inversed_by("reports"),
                )
                .relation(RelationDecl::one_to_many("reports", "Employee").mapped_by("manager")),
        )
        .build()
        .expect("self-referencing schema should resolve");
    let session = crate::db::Db::new(schema).session();
    session.create_schema().expect("tables should be created");

    session
        .insert_many(
            "Employee",
            vec![
                row([("id", "ana".into()), ("manager", "bo".into())]),
                row([("id", "bo".into())]),
                row([("id", "cy".into()), ("manager", "bo".into())]),
            ],
        )
        .expect("forward reference inside the batch should resolve");

    let reports = session
        .related_of("Employee", "bo", "reports")
        .expect("reports should resolve");
    assert_eq!(
        reports.keys(),
        vec![Key::from("ana"), Key::from("cy")]
    );
    assert_eq!(
        session.get("Employee", "ana").expect("ana").get("manager"),
        Some(&Value::from("bo"))
    );
}
