use helvetia_seed::config::default_base_time;
use helvetia_seed::insert::build_read_statement;
use helvetia_seed::model::{Read, Region};
use helvetia_seed::schema::{table_specs, Keyspace};
use helvetia_sql::literal::{escape_value, parse_insert};
use helvetia_sql::{EmbeddedClient, SqlClient, SqlValue};

fn read(id: u64, uid: &str, detail: Option<&str>) -> Read {
    Read {
        id,
        uid: uid.into(),
        aid: "a0".into(),
        timestamp: default_base_time(),
        region: Region::HongKong,
        read_time_length: 42,
        agree_or_not: 1,
        comment_or_not: detail.is_some() as u8,
        comment_detail: detail.map(Into::into),
        share_or_not: 0,
    }
}

const AWKWARD: &[&str] = &[
    "it's",
    "''",
    "'; DROP TABLE read; --",
    "(1, 'x'),\n(2, 'y')",
    "NULL",
    "中文 'quoted' text",
];

#[test]
fn test_comment_detail_survives_escaping() {
    let reads: Vec<Read> = AWKWARD
        .iter()
        .enumerate()
        .map(|(i, text)| read(i as u64 + 1, &format!("u{}", i), Some(text)))
        .collect();
    let sql = build_read_statement(&reads).unwrap();
    let parsed = parse_insert(&sql).unwrap();

    let detail = parsed.columns.iter().position(|c| c == "commentDetail").unwrap();
    assert_eq!(parsed.rows.len(), AWKWARD.len());
    for (row, text) in parsed.rows.iter().zip(AWKWARD) {
        assert_eq!(row[detail], SqlValue::Text(text.to_string()));
    }
}

#[test]
fn test_absent_comment_is_null_literal() {
    assert_eq!(escape_value(&SqlValue::from(None::<&str>)), "NULL");
    let sql = build_read_statement(&[read(1, "u1", None)]).unwrap();
    assert!(sql.ends_with("'HongKong', 42, 1, 0, NULL, 0)"), "{}", sql);
}

#[tokio::test]
async fn test_fast_path_rows_land_intact() {
    let store = EmbeddedClient::with_tables(table_specs());
    let reads = vec![read(1, "u1", Some("O'Reilly's review")), read(2, "u2", None)];
    let affected = store.execute(&build_read_statement(&reads).unwrap()).await.unwrap();
    assert_eq!(affected, 2);

    let rows = store.rows(&Keyspace::Read.table()).await.unwrap();
    assert_eq!(rows[0].get_str("commentDetail"), Some("O'Reilly's review"));
    assert_eq!(rows[0].get_datetime("timestamp"), Some(default_base_time()));
    assert!(rows[1].get("commentDetail").unwrap().is_null());
}
