use std::collections::HashSet;

use serde_json::json;

use usersplit_core::{CoreError, Frame};
use usersplit_ingest::{IngestError, StaticSource};
use usersplit_pipeline::tables::DECADE_TABLES;
use usersplit_pipeline::{Pipeline, PipelineError, TableReport};
use usersplit_storage::read_table;

use crate::helpers::{
    age_of, expected_top, read_json_rows, test_config, test_data_dir, user_record, user_records,
    FailingSource,
};

/// Sorted `login.uuid` values of the rows of `gender` in `frame`.
fn ids_for(frame: &Frame, gender: &str) -> Vec<String> {
    let mut ids: Vec<String> = (0..frame.row_count())
        .filter(|&i| frame.get_value(i, "gender").and_then(|v| v.as_str()) == Some(gender))
        .filter_map(|i| frame.get_value(i, "login.uuid").and_then(|v| v.as_str()))
        .map(str::to_string)
        .collect();
    ids.sort();
    ids
}

/// `(registered.date, login.uuid)` of the rows of `gender`, in stored order.
fn registrations_for(frame: &Frame, gender: &str) -> Vec<(String, String)> {
    (0..frame.row_count())
        .filter(|&i| frame.get_value(i, "gender").and_then(|v| v.as_str()) == Some(gender))
        .map(|i| {
            let field = |col: &str| {
                frame
                    .get_value(i, col)
                    .and_then(|v| v.as_str())
                    .unwrap()
                    .to_string()
            };
            (field("registered.date"), field("login.uuid"))
        })
        .collect()
}

fn all_ids(frame: &Frame) -> HashSet<String> {
    frame
        .column("login.uuid")
        .unwrap()
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn run_splits_stores_and_exports() {
    let dir = test_data_dir();
    let config = test_config(&dir);
    let records = user_records(300);

    let pipeline = Pipeline::new(config.clone(), Box::new(StaticSource::new(records.clone()))).unwrap();
    let report = pipeline.run().await.unwrap();
    let db = pipeline.database();
    let names = pipeline.table_names();

    assert_eq!(report.fetched, 300);

    // Gender tables: exact routing, nobody in both.
    let female_count = records.iter().filter(|r| r["gender"] == "female").count();
    let male_count = records.iter().filter(|r| r["gender"] == "male").count();
    assert!(female_count + male_count < records.len());

    let female = read_table(db, &names.female()).await.unwrap();
    let male = read_table(db, &names.male()).await.unwrap();
    assert_eq!(female.row_count(), female_count);
    assert_eq!(male.row_count(), male_count);
    assert!(female
        .column("gender")
        .unwrap()
        .iter()
        .all(|v| v.as_str() == Some("female")));
    assert!(male
        .column("gender")
        .unwrap()
        .iter()
        .all(|v| v.as_str() == Some("male")));
    assert!(all_ids(&female).is_disjoint(&all_ids(&male)));
    assert_eq!(
        report.gender_tables,
        vec![
            TableReport {
                table: names.female(),
                rows: female_count
            },
            TableReport {
                table: names.male(),
                rows: male_count
            },
        ]
    );

    // Decade tables: every in-range age in exactly one table.
    let in_range = records
        .iter()
        .filter(|r| (0..100).contains(&age_of(r)))
        .count();
    assert!(in_range < records.len());

    let mut total = 0;
    for number in 1..=DECADE_TABLES {
        let table = read_table(db, &names.decade(number)).await.unwrap();
        let low = (number as i64 - 1) * 10;
        for age in table.column("dob.age").unwrap() {
            let age = age.to_i64().unwrap();
            assert!((low..low + 10).contains(&age), "age {age} in table {number}");
        }
        total += table.row_count();
    }
    assert_eq!(total, in_range);
    assert_eq!(report.decade_tables.len(), DECADE_TABLES);
    assert_eq!(
        report.decade_tables.iter().map(|t| t.rows).sum::<usize>(),
        in_range
    );

    // Top table: the 20 most recent registrations of each gender.
    let top = read_table(db, &names.top()).await.unwrap();
    assert_eq!(top.row_count(), 40);
    assert_eq!(report.top_table.rows, 40);

    let mut expected_female = expected_top(&records, "female", 20);
    expected_female.sort();
    let mut expected_male = expected_top(&records, "male", 20);
    expected_male.sort();
    assert_eq!(ids_for(&top, "female"), expected_female);
    assert_eq!(ids_for(&top, "male"), expected_male);

    // Within each gender, most recent registration first.
    for gender in ["female", "male"] {
        let stored = registrations_for(&top, gender);
        assert!(
            stored.windows(2).all(|w| w[0].0 >= w[1].0),
            "{gender} rows not newest first: {stored:?}"
        );
        let ids: Vec<String> = stored.into_iter().map(|(_, id)| id).collect();
        assert_eq!(ids, expected_top(&records, gender, 20));
    }

    // first.json: top + ages 40-49, exact duplicates removed.
    let forties = read_table(db, &names.decade(5)).await.unwrap();
    let overlap = all_ids(&forties).intersection(&all_ids(&top)).count();

    let first = read_json_rows(&config.output.output_dir.join("first.json"));
    assert_eq!(first.len(), top.row_count() + forties.row_count() - overlap);
    assert_eq!(report.first_export.rows, first.len());
    assert_eq!(first[0].keys().next().map(String::as_str), Some("index"));

    let distinct: HashSet<String> = first
        .iter()
        .map(|row| {
            let mut row = row.clone();
            row.remove("index");
            serde_json::to_string(&row).unwrap()
        })
        .collect();
    assert_eq!(distinct.len(), first.len());

    // second.json: top + ages 10-19, every row kept.
    let teens = read_table(db, &names.decade(2)).await.unwrap();
    let second = read_json_rows(&config.output.output_dir.join("second.json"));
    assert_eq!(second.len(), top.row_count() + teens.row_count());
    assert_eq!(report.second_export.rows, second.len());
    assert_eq!(second[0]["index"], json!(0));
    assert_eq!(second[top.row_count()]["index"], json!(0));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn overlapping_rows_collapse_only_in_first_export() {
    let dir = test_data_dir();
    let config = test_config(&dir);

    // Everyone is in their forties, so the whole top table repeats in `_5`.
    let mut records: Vec<_> = (0..5).map(user_record).collect();
    for (i, record) in records.iter_mut().enumerate() {
        record["dob"]["age"] = json!(40 + i);
        record["gender"] = json!(if i < 3 { "female" } else { "male" });
    }

    let pipeline = Pipeline::new(config.clone(), Box::new(StaticSource::new(records))).unwrap();
    let report = pipeline.run().await.unwrap();

    // Fewer than 20 per gender: the top table holds all of them.
    assert_eq!(report.top_table.rows, 5);
    assert_eq!(report.decade_tables[4].rows, 5);
    assert_eq!(report.decade_tables[1].rows, 0);

    let first = read_json_rows(&config.output.output_dir.join("first.json"));
    assert_eq!(first.len(), 5);
    let index: Vec<_> = first.iter().map(|row| row["index"].clone()).collect();
    assert_eq!(index, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);

    let second = read_json_rows(&config.output.output_dir.join("second.json"));
    assert_eq!(second.len(), 5);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn rerun_reproduces_identical_exports() {
    let dir = test_data_dir();
    let config = test_config(&dir);
    let records = user_records(120);

    let out = config.output.output_dir.clone();
    let mut snapshots = Vec::new();
    for _ in 0..2 {
        let pipeline =
            Pipeline::new(config.clone(), Box::new(StaticSource::new(records.clone()))).unwrap();
        pipeline.run().await.unwrap();
        snapshots.push((
            std::fs::read(out.join("first.json")).unwrap(),
            std::fs::read(out.join("second.json")).unwrap(),
        ));
    }
    assert_eq!(snapshots[0], snapshots[1]);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn custom_prefix_names_every_table() {
    let dir = test_data_dir();
    let mut config = test_config(&dir);
    config.output.table_prefix = "nightly".into();
    config.output.top_n = 3;

    let pipeline = Pipeline::new(config, Box::new(StaticSource::new(user_records(60)))).unwrap();
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.gender_tables[0].table, "nightly_female");
    assert_eq!(report.decade_tables[9].table, "nightly_10");
    assert_eq!(report.top_table.table, "nightly_20");
    assert_eq!(report.top_table.rows, 6);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["top_table"]["table"], json!("nightly_20"));
    assert_eq!(json["first_export"]["sources"][1]["table"], json!("nightly_5"));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn non_numeric_age_fails_after_gender_tables() {
    let dir = test_data_dir();
    let config = test_config(&dir);

    let mut records = user_records(10);
    records[3]["dob"]["age"] = json!("n/a");

    let pipeline = Pipeline::new(config.clone(), Box::new(StaticSource::new(records))).unwrap();
    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Core(CoreError::NonNumeric { row: 3, .. })
    ));

    // Gender tables were written before the failure and stay in place.
    let female = read_table(pipeline.database(), &pipeline.table_names().female())
        .await
        .unwrap();
    assert!(female.row_count() > 0);
    assert!(!config.output.output_dir.join("first.json").exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn fetch_failure_stops_before_any_write() {
    let dir = test_data_dir();
    let config = test_config(&dir);

    let pipeline = Pipeline::new(config.clone(), Box::new(FailingSource)).unwrap();
    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Ingest(IngestError::Api { status: 503, .. })
    ));
    assert!(!config.output.output_dir.exists());
    assert!(read_table(pipeline.database(), &pipeline.table_names().female())
        .await
        .is_err());

    std::fs::remove_dir_all(&dir).ok();
}
