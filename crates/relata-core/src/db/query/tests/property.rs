use crate::{
    db::{
        DbSession,
        query::{Filter, FindOptions},
    },
    key::Key,
    test_fixtures::{empty_session, row, tags},
    value::Value,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

const TAG_NAMES: [&str; 4] = ["Fiction", "Science", "Fantasy", "Poetry"];

// Distinct book ids in arbitrary insertion order, each with a tag subset.
fn arb_books() -> impl Strategy<Value = Vec<(i64, Vec<i64>)>> {
    prop::collection::btree_set(0i64..500, 0..12)
        .prop_flat_map(|ids| {
            let ids: Vec<i64> = ids.into_iter().collect();
            let len = ids.len();
            (
                Just(ids).prop_shuffle(),
                prop::collection::vec(prop::collection::btree_set(1i64..=4, 0..4), len),
            )
        })
        .prop_map(|(ids, tag_sets)| {
            ids.into_iter()
                .zip(tag_sets)
                .map(|(id, set)| (id, set.into_iter().collect()))
                .collect()
        })
}

fn seed(books: &[(i64, Vec<i64>)]) -> DbSession {
    let session = empty_session();

    session
        .insert_many(
            "BookTag",
            TAG_NAMES
                .iter()
                .zip(1i64..)
                .map(|(name, id)| row([("id", id.into()), ("name", (*name).into())])),
        )
        .expect("tags should insert");

    session
        .insert_many(
            "Book",
            books.iter().map(|(id, tag_ids)| {
                row([
                    ("id", (*id).into()),
                    ("title", format!("Book {id}").into()),
                    ("tags", tags(tag_ids)),
                ])
            }),
        )
        .expect("books should insert");

    session
}

proptest! {
    #[test]
    fn inserted_rows_are_returned_by_get(books in arb_books()) {
        let session = seed(&books);

        for (id, _) in &books {
            let book = session.get("Book", *id).expect("inserted book should exist");
            prop_assert_eq!(book.get("title"), Some(&Value::Text(format!("Book {id}"))));
        }
    }

    #[test]
    fn many_to_many_is_symmetric(books in arb_books()) {
        let session = seed(&books);

        for (id, tag_ids) in &books {
            for tag in 1i64..=4 {
                let book_side = session
                    .related_of("Book", *id, "tags")
                    .expect("book tags should resolve")
                    .contains_key(&Key::Int(tag));
                let tag_side = session
                    .related_of("BookTag", tag, "books")
                    .expect("tag books should resolve")
                    .contains_key(&Key::Int(*id));

                prop_assert_eq!(book_side, tag_side);
                prop_assert_eq!(book_side, tag_ids.contains(&tag));
            }
        }
    }

    #[test]
    fn results_keep_insertion_order(
        books in arb_books(),
        wanted in prop::collection::btree_set(1i64..=4, 1..3),
    ) {
        let session = seed(&books);
        let wanted: BTreeSet<i64> = wanted;

        let filter = Filter::and(
            wanted
                .iter()
                .map(|tag| Filter::some("tags", Filter::eq("id", *tag)))
                .collect(),
        );
        let found = session
            .find("Book", &FindOptions::new().filter(filter))
            .expect("find should run");

        let expected: Vec<Key> = books
            .iter()
            .filter(|(_, tag_ids)| wanted.iter().all(|tag| tag_ids.contains(tag)))
            .map(|(id, _)| Key::Int(*id))
            .collect();

        prop_assert_eq!(found.keys(), expected);
    }
}
