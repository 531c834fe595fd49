use helvetia_seed::config::{RetryPolicy, SeedConfig};
use helvetia_seed::pipeline::SeedPipeline;
use helvetia_seed::schema::{table_specs, Keyspace};
use helvetia_seed::PipelineError;
use helvetia_sql::{EmbeddedClient, SqlError};
use std::collections::{HashMap, HashSet};

fn config(users: usize, articles: usize, reads: usize) -> SeedConfig {
    SeedConfig {
        users,
        articles,
        reads,
        user_batch_size: 100,
        article_batch_size: 50,
        read_batch_size: 64,
        rng_seed: Some(2017),
        ..SeedConfig::default()
    }
}

async fn seed(store: &EmbeddedClient, config: SeedConfig) -> helvetia_seed::SeedReport {
    SeedPipeline::new(config, RetryPolicy::immediate(3))
        .run(store)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_read_ids_are_dense() {
    let store = EmbeddedClient::with_tables(table_specs());
    // Large pair space so no (uid, aid) pair repeats
    let report = seed(&store, config(2000, 1000, 100)).await;
    assert_eq!(report.reads, 100);
    assert!(report.read_candidates >= 100);

    let rows = store.rows(&Keyspace::Read.table()).await.unwrap();
    let mut ids: Vec<i64> = rows.iter().map(|r| r.get_i64("id").unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=100).collect::<Vec<i64>>());
    assert_eq!(report.reads_affected, 100);
}

#[tokio::test]
async fn test_duplicate_pairs_keep_ids_unique() {
    let store = EmbeddedClient::with_tables(table_specs());
    // 6 possible pairs, so most candidates collide
    let report = seed(&store, config(3, 2, 40)).await;
    assert_eq!(report.reads, 40);

    let rows = store.rows(&Keyspace::Read.table()).await.unwrap();
    assert_eq!(rows.len() as u64, report.reads_affected);
    assert!(rows.len() <= 6);
    let ids: HashSet<i64> = rows.iter().map(|r| r.get_i64("id").unwrap()).collect();
    assert_eq!(ids.len(), rows.len());
    assert!(ids.iter().all(|id| (1..=40).contains(id)));
}

#[tokio::test]
async fn test_reads_reference_seeded_entities() {
    let store = EmbeddedClient::with_tables(table_specs());
    let report = seed(&store, config(40, 25, 300)).await;
    assert_eq!(report.referential_fallbacks, 0);

    let users: HashMap<String, String> = store
        .rows(&Keyspace::User.table())
        .await
        .unwrap()
        .iter()
        .map(|r| (r.get_str("uid").unwrap().to_string(), r.get_str("region").unwrap().to_string()))
        .collect();
    let articles: HashSet<String> = store
        .rows(&Keyspace::Article.table())
        .await
        .unwrap()
        .iter()
        .map(|r| r.get_str("aid").unwrap().to_string())
        .collect();
    assert_eq!(users.len(), 40);
    assert_eq!(articles.len(), 25);

    for read in store.rows(&Keyspace::Read.table()).await.unwrap() {
        let uid = read.get_str("uid").unwrap();
        assert!(articles.contains(read.get_str("aid").unwrap()));
        assert_eq!(users.get(uid).map(String::as_str), read.get_str("region"));
        let commented = read.get_i64("commentOrNot") == Some(1);
        assert_eq!(commented, !read.get("commentDetail").unwrap().is_null());
    }
}

#[tokio::test]
async fn test_user_and_article_ids_follow_generation_order() {
    let store = EmbeddedClient::with_tables(table_specs());
    seed(&store, config(12, 9, 0)).await;

    let users = store.rows(&Keyspace::User.table()).await.unwrap();
    for (i, user) in users.iter().enumerate() {
        assert_eq!(user.get_i64("id"), Some(i as i64 + 1));
        assert_eq!(user.get_str("uid"), Some(format!("u{}", i).as_str()));
    }
    let articles = store.rows(&Keyspace::Article.table()).await.unwrap();
    assert_eq!(articles[0].get_str("category"), Some("science"));
    assert_eq!(articles[1].get_str("category"), Some("technology"));
    assert!(articles[0].get_str("videoPath").is_some());
}

#[tokio::test]
async fn test_zero_reads_insert_nothing_into_read() {
    let store = EmbeddedClient::with_tables(table_specs());
    let report = seed(&store, config(5, 5, 0)).await;
    assert_eq!(report.read_batches, 0);
    assert_eq!(store.row_count(&Keyspace::Read.table()).await, 0);
    let statements = store.statements().await;
    assert!(!statements.iter().any(|s| s.contains("`read_keyspace`.`read`")));
}

#[tokio::test]
async fn test_dry_run_never_touches_the_store() {
    let store = EmbeddedClient::with_tables(table_specs());
    let report = seed(
        &store,
        SeedConfig {
            dry_run: true,
            reads: 0,
            ..config(10, 10, 0)
        },
    )
    .await;
    assert_eq!(report.users, 10);
    assert_eq!(report.read_batches, 0);
    assert!(store.statements().await.is_empty());
    assert_eq!(store.open_sessions().await, 0);
}

#[tokio::test]
async fn test_reads_only_run_uses_stored_entities() {
    let store = EmbeddedClient::with_tables(table_specs());
    seed(&store, config(20, 10, 0)).await;

    let report = seed(
        &store,
        SeedConfig {
            reads_only: true,
            ..config(0, 0, 80)
        },
    )
    .await;
    assert_eq!(report.users, 0);
    assert_eq!(report.reads, 80);
    assert_eq!(report.referential_fallbacks, 0);
    assert_eq!(store.row_count(&Keyspace::User.table()).await, 20);
}

#[tokio::test]
async fn test_truncate_makes_reruns_repeatable() {
    let store = EmbeddedClient::with_tables(table_specs());
    let first = seed(&store, SeedConfig { truncate: true, ..config(30, 20, 120) }).await;
    let before = store.rows(&Keyspace::Read.table()).await.unwrap();

    let second = seed(&store, SeedConfig { truncate: true, ..config(30, 20, 120) }).await;
    assert_eq!(second.truncated, 30 + 20 + first.reads_affected);
    assert_eq!(store.rows(&Keyspace::Read.table()).await.unwrap(), before);
}

#[tokio::test]
async fn test_failed_run_closes_every_session() {
    let specs = table_specs()
        .into_iter()
        .filter(|s| s.table != Keyspace::Article.table());
    let store = EmbeddedClient::with_tables(specs);

    let err = SeedPipeline::new(config(10, 10, 10), RetryPolicy::immediate(3))
        .run(&store)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Sql(SqlError::UnknownTable(_))));
    assert_eq!(store.open_sessions().await, 0);
    // Users were committed before the article phase failed
    assert_eq!(store.row_count(&Keyspace::User.table()).await, 10);
}
