//! Shared library fixture: authors, books and book tags.

use crate::{
    db::{Db, DbSession, store::RowDocument},
    model::{FieldKind, FieldModel},
    schema::{EntityDecl, RelationDecl, Schema, SchemaBuilder},
    value::Value,
};

pub(crate) fn library_builder() -> SchemaBuilder {
    SchemaBuilder::new()
        .entity(
            EntityDecl::new("Author")
                .primary("id", FieldKind::Int)
                .field("name", FieldKind::Text)
                .unique("email", FieldKind::Text)
                .member(FieldModel::new("handle", FieldKind::Text).unique().nullable())
                .relation(RelationDecl::one_to_many("books", "Book").mapped_by("author")),
        )
        .entity(
            EntityDecl::new("Book")
                .primary("id", FieldKind::Int)
                .field("title", FieldKind::Text)
                .relation(RelationDecl::many_to_one("author", "Author").inversed_by("books"))
                .relation(RelationDecl::many_to_many("tags", "BookTag")),
        )
        .entity(
            EntityDecl::new("BookTag")
                .primary("id", FieldKind::Int)
                .field("name", FieldKind::Text)
                .relation(RelationDecl::many_to_many("books", "Book").mapped_by("tags")),
        )
}

pub(crate) fn library_schema() -> Schema {
    library_builder()
        .build()
        .expect("library schema should resolve")
}

pub(crate) fn row<const N: usize>(pairs: [(&str, Value); N]) -> RowDocument {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

pub(crate) fn tags(keys: &[i64]) -> Value {
    Value::from_list(keys.to_vec())
}

/// Session with the library tables created but empty.
pub(crate) fn empty_session() -> DbSession {
    let session = Db::new(library_schema()).session();
    session
        .create_schema()
        .expect("library tables should be created");
    session
}

/// Session seeded with two authors, three tags and three books.
pub(crate) fn seeded_session() -> DbSession {
    let session = empty_session();

    session
        .insert_many(
            "Author",
            vec![
                row([
                    ("id", 1.into()),
                    ("name", "Author 1".into()),
                    ("email", "a1@example.com".into()),
                ]),
                row([
                    ("id", 2.into()),
                    ("name", "Author 2".into()),
                    ("email", "a2@example.com".into()),
                ]),
            ],
        )
        .expect("authors should insert");

    session
        .insert_many(
            "BookTag",
            vec![
                row([("id", 1.into()), ("name", "Fiction".into())]),
                row([("id", 2.into()), ("name", "Science".into())]),
                row([("id", 3.into()), ("name", "Fantasy".into())]),
            ],
        )
        .expect("tags should insert");

    session
        .insert_many(
            "Book",
            vec![
                row([
                    ("id", 1.into()),
                    ("title", "Book 1".into()),
                    ("author", 1.into()),
                    ("tags", tags(&[1, 3])),
                ]),
                row([
                    ("id", 2.into()),
                    ("title", "Book 2".into()),
                    ("author", 1.into()),
                    ("tags", tags(&[2, 3])),
                ]),
                row([
                    ("id", 3.into()),
                    ("title", "Book 3".into()),
                    ("author", 2.into()),
                    ("tags", tags(&[1, 2, 3])),
                ]),
            ],
        )
        .expect("books should insert");

    session
}
