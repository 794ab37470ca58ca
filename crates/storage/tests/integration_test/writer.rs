use usersplit_core::{FieldValue, Frame};
use usersplit_storage::{read_table, replace_table, StorageError};

use crate::helpers::{test_db, text, users};

#[tokio::test]
async fn test_replace_then_read_roundtrip() {
    let (db, dir) = test_db();
    let frame = users(&[
        ("ann", "female", "2015-03-12T09:21:14.226Z", 41),
        ("bob", "male", "2019-07-01T00:00:00.000Z", 17),
    ]);

    let written = replace_table(&db, "people", &frame).await.unwrap();
    assert_eq!(written, 2);

    let back = read_table(&db, "people").await.unwrap();
    assert_eq!(back.columns(), frame.columns());
    assert_eq!(back.rows(), frame.rows());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_replace_drops_previous_contents() {
    let (db, dir) = test_db();

    let first = users(&[
        ("ann", "female", "2015-03-12T09:21:14.226Z", 41),
        ("cy", "female", "2016-03-12T09:21:14.226Z", 44),
    ]);
    replace_table(&db, "people", &first).await.unwrap();

    // Different schema on the second write: the table is recreated.
    let second = Frame::new(vec!["only".into()], vec![vec![FieldValue::Integer(7)]]).unwrap();
    replace_table(&db, "people", &second).await.unwrap();

    let back = read_table(&db, "people").await.unwrap();
    assert_eq!(back.columns(), &["only"]);
    assert_eq!(back.row_count(), 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_empty_partition_creates_empty_table() {
    let (db, dir) = test_db();
    let empty = users(&[]);

    assert_eq!(replace_table(&db, "nobody", &empty).await.unwrap(), 0);

    let back = read_table(&db, "nobody").await.unwrap();
    assert_eq!(back.row_count(), 0);
    assert_eq!(back.columns(), empty.columns());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_frame_without_columns_is_rejected() {
    let (db, dir) = test_db();
    let err = replace_table(&db, "void", &Frame::default()).await.unwrap_err();
    assert!(matches!(err, StorageError::EmptySchema(t) if t == "void"));
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_mixed_and_null_cells_survive() {
    let (db, dir) = test_db();
    let frame = Frame::new(
        vec!["postcode".into(), "lat".into(), "note".into()],
        vec![
            vec![FieldValue::Integer(12345), FieldValue::Float(-41.5), FieldValue::Null],
            vec![text("AB1 2CD"), FieldValue::Integer(3), text("x")],
        ],
    )
    .unwrap();

    replace_table(&db, "mixed", &frame).await.unwrap();
    let back = read_table(&db, "mixed").await.unwrap();

    // Mixed int/text column is stored as text, mixed int/float as float.
    assert_eq!(back.get_value(0, "postcode"), Some(&text("12345")));
    assert_eq!(back.get_value(1, "postcode"), Some(&text("AB1 2CD")));
    assert_eq!(back.get_value(0, "lat"), Some(&FieldValue::Float(-41.5)));
    assert_eq!(back.get_value(1, "lat"), Some(&FieldValue::Float(3.0)));
    assert_eq!(back.get_value(0, "note"), Some(&FieldValue::Null));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_large_frame_is_written_in_batches() {
    let (db, dir) = test_db();
    let rows: Vec<Vec<FieldValue>> = (0..12_000)
        .map(|i| vec![FieldValue::Integer(i), text("pad")])
        .collect();
    let frame = Frame::new(vec!["n".into(), "pad".into()], rows).unwrap();

    assert_eq!(replace_table(&db, "big", &frame).await.unwrap(), 12_000);
    let back = read_table(&db, "big").await.unwrap();
    assert_eq!(back.row_count(), 12_000);

    std::fs::remove_dir_all(&dir).ok();
}
