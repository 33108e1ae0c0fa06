mod property;

use crate::{
    db::{
        query::{Filter, FindOptions, QueryError, parse_filter},
        relation::RelationError,
        response::Response,
    },
    error::{ErrorClass, ErrorOrigin},
    key::Key,
    test_fixtures::{row, seeded_session},
    value::Value,
};
use serde_json::json;

fn ids(response: &Response) -> Vec<i64> {
    response
        .keys()
        .into_iter()
        .map(|key| match key {
            Key::Int(id) => id,
            other => panic!("unexpected key {other}"),
        })
        .collect()
}

fn tag_named(name: &str) -> Filter {
    Filter::some("tags", Filter::eq("name", name))
}

#[test]
fn and_of_two_some_clauses_matches_books_with_both_tags() {
    let session = seeded_session();

    let books = session
        .find(
            "Book",
            &FindOptions::new().filter(Filter::and(vec![
                tag_named("Fiction"),
                tag_named("Fantasy"),
            ])),
        )
        .expect("find should run");

    assert_eq!(ids(&books), vec![1, 3]);
    assert_eq!(
        books
            .iter()
            .map(|book| book.get("title").cloned())
            .collect::<Vec<_>>(),
        vec![Some(Value::from("Book 1")), Some(Value::from("Book 3"))]
    );
}

#[test]
fn json_filter_document_matches_builder_filter() {
    let session = seeded_session();

    let filter = parse_filter(&json!({
        "$and": [
            { "tags": { "$some": { "name": "Fiction" } } },
            { "tags": { "$some": { "name": "Fantasy" } } },
        ]
    }))
    .expect("filter document should parse");

    let from_json = session
        .find("Book", &FindOptions::new().filter(filter))
        .expect("find should run");
    let from_builder = session
        .find("Book", &FindOptions::new().filter(tag_named("Fiction") & tag_named("Fantasy")))
        .expect("find should run");

    assert_eq!(from_json, from_builder);
}

#[test]
fn some_over_empty_relation_is_false_while_none_and_every_hold() {
    let session = seeded_session();
    session
        .insert_many("Book", vec![row([("id", 4.into()), ("title", "Bare".into())])])
        .expect("untagged book should insert");

    let any_tag = Filter::some("tags", Filter::True);
    let no_fiction = Filter::none("tags", Filter::eq("name", "Fiction"));
    let all_fiction = Filter::every("tags", Filter::eq("name", "Fiction"));

    let find = |filter: Filter| {
        session
            .find("Book", &FindOptions::new().filter(filter))
            .expect("find should run")
    };

    assert_eq!(ids(&find(any_tag)), vec![1, 2, 3]);
    assert_eq!(ids(&find(no_fiction)), vec![2, 4]);
    assert_eq!(ids(&find(all_fiction)), vec![4]);
}

#[test]
fn some_through_derived_sides_walks_back_to_owners() {
    let session = seeded_session();

    let tags = session
        .find(
            "BookTag",
            &FindOptions::new().filter(Filter::some("books", Filter::eq("title", "Book 2"))),
        )
        .expect("find should run");
    assert_eq!(ids(&tags), vec![2, 3]);

    let authors = session
        .find(
            "Author",
            &FindOptions::new().filter(Filter::some(
                "books",
                Filter::some("tags", Filter::eq("name", "Science")),
            )),
        )
        .expect("find should run");
    assert_eq!(ids(&authors), vec![1, 2]);
}

#[test]
fn implicit_some_through_a_to_one_relation() {
    let session = seeded_session();

    let filter = parse_filter(&json!({ "author": { "name": "Author 2" } }))
        .expect("nested object should parse");
    let books = session
        .find("Book", &FindOptions::new().filter(filter))
        .expect("find should run");

    assert_eq!(ids(&books), vec![3]);
}

#[test]
fn foreign_key_comparisons_use_the_stored_key() {
    let session = seeded_session();

    assert_eq!(
        session
            .count("Book", Filter::eq("author", 1))
            .expect("count should run"),
        2
    );
    assert_eq!(
        session
            .count("Book", Filter::in_("id", [1, 3]) & Filter::ne("author", 1))
            .expect("count should run"),
        1
    );
}

#[test]
fn results_follow_insertion_order_not_key_order() {
    let session = seeded_session();
    session
        .insert_many(
            "BookTag",
            vec![
                row([("id", 10.into()), ("name", "Zeta".into())]),
                row([("id", 5.into()), ("name", "Alpha".into())]),
            ],
        )
        .expect("tags should insert");

    let tags = session.find_all("BookTag").expect("find should run");

    assert_eq!(ids(&tags), vec![1, 2, 3, 10, 5]);
}

#[test]
fn offset_and_limit_apply_after_filtering() {
    let session = seeded_session();

    let page = session
        .find(
            "Book",
            &FindOptions::new()
                .filter(tag_named("Fantasy"))
                .offset(1)
                .limit(1),
        )
        .expect("find should run");

    assert_eq!(ids(&page), vec![2]);
}

#[test]
fn populate_attaches_nested_relations() {
    let session = seeded_session();

    let author = session
        .find_by_key("Author", 2, &["books.tags"])
        .expect("find should run")
        .expect("author 2 exists");

    let books = author.related("books").expect("books should be populated");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].key(), &Key::Int(3));

    let tags = books[0].related("tags").expect("tags should be populated");
    let names: Vec<_> = tags.iter().filter_map(|tag| tag.get("name")).collect();
    assert_eq!(
        names,
        vec![
            &Value::from("Fiction"),
            &Value::from("Science"),
            &Value::from("Fantasy")
        ]
    );
    assert!(!tags[0].is_populated("books"));
}

#[test]
fn populate_is_idempotent_and_does_not_mutate_the_store() {
    let session = seeded_session();
    let options = FindOptions::new().populate(["author", "tags"]);

    let first = session.find("Book", &options).expect("find should run");
    let second = session.find("Book", &options).expect("find should run");
    assert_eq!(first, second);

    let plain = session.get("Book", 1).expect("Book 1 should exist");
    assert!(!plain.is_populated("author"));
    assert!(!plain.is_populated("tags"));

    assert_eq!(
        first.to_json()[0],
        json!({
            "id": 1,
            "title": "Book 1",
            "author": { "id": 1, "name": "Author 1", "email": "a1@example.com" },
            "tags": [
                { "id": 1, "name": "Fiction" },
                { "id": 3, "name": "Fantasy" },
            ],
        })
    );
}

#[test]
fn unknown_field_fails_before_evaluation() {
    let session = seeded_session();

    let err = session
        .find("Book", &FindOptions::new().filter(Filter::eq("isbn", "x")))
        .expect_err("isbn is not declared");

    assert_eq!(err.origin, ErrorOrigin::Query);
    assert_eq!(
        err.query_error(),
        Some(&QueryError::UnknownField {
            kind: "Book".to_string(),
            field: "isbn".to_string(),
        })
    );
}

#[test]
fn unknown_relationship_in_quantifier_or_populate_is_reported() {
    let session = seeded_session();

    let err = session
        .find(
            "Book",
            &FindOptions::new().filter(Filter::some("genres", Filter::True)),
        )
        .expect_err("genres is not a relationship");
    assert_eq!(err.class, ErrorClass::Invalid);
    assert_eq!(
        err.relation_error(),
        Some(&RelationError::UnknownRelationship {
            kind: "Book".to_string(),
            field: "genres".to_string(),
        })
    );

    let err = session
        .find("Book", &FindOptions::new().populate(["publisher"]))
        .expect_err("publisher is not a relationship");
    assert!(matches!(
        err.relation_error(),
        Some(RelationError::UnknownRelationship { field, .. }) if field == "publisher"
    ));
}

#[test]
fn unknown_kind_and_operator_are_reported() {
    let session = seeded_session();

    let err = session
        .find_all("Publisher")
        .expect_err("Publisher is not declared");
    assert!(err.is_not_found());

    let err = parse_filter(&json!({ "title": { "$regex": "Book" } }))
        .expect_err("$regex is not an operator");
    assert_eq!(
        err,
        QueryError::UnknownOperator {
            operator: "$regex".to_string()
        }
    );
}

#[test]
fn find_one_requires_exactly_one_match() {
    let session = seeded_session();

    let book = session
        .find_one("Book", Filter::eq("title", "Book 2"))
        .expect("exactly one Book 2");
    assert_eq!(book.key(), &Key::Int(2));

    let err = session
        .find_one("Book", tag_named("Fantasy"))
        .expect_err("three books carry Fantasy");
    assert_eq!(err.class, ErrorClass::Conflict);

    let err = session
        .find_one("Book", Filter::eq("title", "Missing"))
        .expect_err("no book is titled Missing");
    assert!(err.is_not_found());
}
