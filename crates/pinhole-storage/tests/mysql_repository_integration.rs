use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use pinhole_core::{ExpirationMode, Lookup, ShortCode, ShortLink, Visit};
use pinhole_storage::{MySqlRepository, ReadRepository, Repository, StorageError, VisitUpdate};
use pinhole_test_infra::mysql::{MySqlServer, MysqlConfig};
use sqlx::mysql::MySqlPoolOptions;

struct Fixture {
    _mysql: MySqlServer,
    repo: MySqlRepository,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::start(MysqlConfig::builder().build())
            .await
            .expect("start mysql");
        let url = mysql.database_url().await.expect("mysql url");
        let pool = connect_with_retry(&url).await;

        for ddl in [
            include_str!("../ddl/mysql/short_links.sql"),
            include_str!("../ddl/mysql/active_urls.sql"),
        ] {
            sqlx::query(ddl).execute(&pool).await.expect("create schema");
        }

        Self {
            _mysql: mysql,
            repo: MySqlRepository::new(pool),
        }
    }
}

async fn connect_with_retry(url: &str) -> sqlx::MySqlPool {
    let mut last_error = None;

    for _ in 0..20 {
        match MySqlPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
        {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect mysql: {last_error:?}");
}

fn code(value: &str) -> ShortCode {
    ShortCode::new_unchecked(value)
}

fn record(c: &str, url: &str) -> ShortLink {
    ShortLink::builder().code(code(c)).target_url(url).build()
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn insert_and_find_record() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .insert(record("abc123", "https://example.com"))
        .await
        .unwrap();

    let got = fixture
        .repo
        .find_by_code(&code("abc123"))
        .await
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(got.target_url, "https://example.com");
    assert_eq!(got.expiration_mode, ExpirationMode::Never);
    assert_eq!(got.visit_count, 0);
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn insert_conflicts_when_code_already_exists() {
    let fixture = Fixture::start().await;

    let mut first = record("abc123", "https://one.example");
    first.is_custom = true;
    fixture.repo.insert(first).await.unwrap();

    let mut second = record("abc123", "https://two.example");
    second.is_custom = true;
    let err = fixture.repo.insert(second).await.unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn active_url_is_not_duplicated() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .insert(record("first1", "https://example.com"))
        .await
        .unwrap();
    let err = fixture
        .repo
        .insert(record("second", "https://example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::ActiveUrlExists(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a docker daemon"]
async fn concurrent_inserts_of_one_url_create_one_record() {
    let fixture = Fixture::start().await;

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let repo = fixture.repo.clone();
            tokio::spawn(async move {
                repo.insert(record(&format!("race{i:02}"), "https://hot.example"))
                    .await
            })
        })
        .collect();

    let mut created = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(link) => created.push(link),
            Err(StorageError::ActiveUrlExists(existing)) => {
                assert_eq!(existing.target_url, "https://hot.example");
            }
            Err(other) => panic!("unexpected insert error: {other}"),
        }
    }
    assert_eq!(created.len(), 1);

    let active = fixture
        .repo
        .find_active_by_url("https://hot.example", Timestamp::now())
        .await
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(active.code, created[0].code);
    assert_eq!(fixture.repo.list_recent(50).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn expired_url_gets_a_new_record() {
    let fixture = Fixture::start().await;
    let old = ShortLink::builder()
        .code(code("old111"))
        .target_url("https://example.com")
        .expiration_mode(ExpirationMode::Date)
        .expires_at(Timestamp::now() - SignedDuration::from_secs(5))
        .build();
    fixture.repo.insert(old).await.unwrap();

    fixture
        .repo
        .insert(record("new222", "https://example.com"))
        .await
        .unwrap();

    let active = fixture
        .repo
        .find_active_by_url("https://example.com", Timestamp::now())
        .await
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(active.code, code("new222"));
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn find_active_by_url_skips_expired_records() {
    let fixture = Fixture::start().await;
    let link = ShortLink::builder()
        .code(code("expired"))
        .target_url("https://example.com")
        .expiration_mode(ExpirationMode::Date)
        .expires_at(Timestamp::now() - SignedDuration::from_secs(5))
        .build();
    fixture.repo.insert(link).await.unwrap();

    let active = fixture
        .repo
        .find_active_by_url("https://example.com", Timestamp::now())
        .await
        .unwrap();
    assert_eq!(active, Lookup::NotFound);

    let expired = fixture.repo.find_expired(Timestamp::now()).await.unwrap();
    assert_eq!(expired.len(), 1);
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn increment_visits_compares_counter() {
    let fixture = Fixture::start().await;
    fixture
        .repo
        .insert(record("visits", "https://example.com"))
        .await
        .unwrap();
    let visit = Visit::builder()
        .referrer("https://ref.example")
        .user_agent("curl/8.0")
        .source("10.0.0.1")
        .build();

    let applied = fixture
        .repo
        .increment_visits(&code("visits"), 0, Some(visit))
        .await
        .unwrap();
    match applied {
        VisitUpdate::Applied(link) => {
            assert_eq!(link.visit_count, 1);
            let last = link.last_visit.unwrap();
            assert_eq!(last.user_agent.as_deref(), Some("curl/8.0"));
        }
        other => panic!("unexpected update: {other:?}"),
    }

    let stale = fixture
        .repo
        .increment_visits(&code("visits"), 0, None)
        .await
        .unwrap();
    assert!(matches!(stale, VisitUpdate::Stale(_)));
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn delete_removes_record() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .insert(record("to-delete", "https://example.com"))
        .await
        .unwrap();

    assert!(fixture.repo.delete(&code("to-delete")).await.unwrap());
    assert!(!fixture.repo.exists(&code("to-delete")).await.unwrap());
    assert!(!fixture.repo.delete(&code("to-delete")).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn delete_if_expired_rechecks_expiry() {
    let fixture = Fixture::start().await;
    let now = Timestamp::now();
    let mut link = ShortLink::builder()
        .code(code("sweep1"))
        .target_url("https://example.com")
        .expiration_mode(ExpirationMode::Date)
        .expires_at(now - SignedDuration::from_secs(5))
        .build();
    fixture.repo.insert(link.clone()).await.unwrap();

    link.expires_at = Some(now + SignedDuration::from_hours(1));
    fixture.repo.update(&link).await.unwrap();
    assert!(!fixture
        .repo
        .delete_if_expired(&code("sweep1"), now)
        .await
        .unwrap());
    assert!(fixture.repo.exists(&code("sweep1")).await.unwrap());

    link.expires_at = Some(now - SignedDuration::from_secs(1));
    fixture.repo.update(&link).await.unwrap();
    assert!(fixture
        .repo
        .delete_if_expired(&code("sweep1"), now)
        .await
        .unwrap());
    assert!(!fixture.repo.exists(&code("sweep1")).await.unwrap());

    // The URL is free for a new generated record.
    fixture
        .repo
        .insert(record("sweep2", "https://example.com"))
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn longest_ip_source_fits_column() {
    let fixture = Fixture::start().await;
    fixture
        .repo
        .insert(record("ipv6ip", "https://example.com"))
        .await
        .unwrap();
    let source = "ffff:ffff:ffff:ffff:ffff:ffff:255.255.255.255";
    let visit = Visit::builder().source(source).build();

    let update = fixture
        .repo
        .increment_visits(&code("ipv6ip"), 0, Some(visit))
        .await
        .unwrap();
    let VisitUpdate::Applied(link) = update else {
        panic!("unexpected update: {update:?}");
    };
    assert_eq!(link.last_visit.unwrap().source.as_deref(), Some(source));
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn update_missing_record_is_not_found() {
    let fixture = Fixture::start().await;

    let err = fixture
        .repo
        .update(&record("missing", "https://example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}
