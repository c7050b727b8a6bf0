use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{DatabaseBackend, DbConn, MockDatabase, MockExecResult, RuntimeErr};

use updraft_core::domain::{NewUser, VoteDirection, VoteOutcome};
use updraft_core::error::{RepoError, VoteError};
use updraft_core::feed::FeedQuery;
use updraft_core::ports::{PostRepository, UserRepository, VotingEngine};

use super::entity::{post, updoot, user};
use super::postgres_repo::{PostgresPostRepository, PostgresUserRepository};
use super::voting::PgVotingEngine;

fn post_model(id: i64, creator_id: i64, created_at: DateTime<Utc>) -> post::Model {
    post::Model {
        id,
        creator_id,
        title: format!("post {id}"),
        text: "body".to_owned(),
        points: 0,
        created_at: created_at.into(),
        updated_at: created_at.into(),
    }
}

fn user_model(id: i64) -> user::Model {
    let now = Utc::now();
    user::Model {
        id,
        username: format!("user{id}"),
        email: format!("user{id}@example.com"),
        password_hash: "hash".to_owned(),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

fn updoot_model(user_id: i64, post_id: i64, value: i16) -> updoot::Model {
    updoot::Model {
        user_id,
        post_id,
        value,
    }
}

fn exec_ok(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

mod post_repo {
    use super::*;

    #[tokio::test]
    async fn test_find_post_by_id() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post_model(7, 1, now)]])
            .into_connection();

        let repo = PostgresPostRepository::new(Arc::new(db));

        let found = repo.find_by_id(7).await.unwrap().unwrap();
        assert_eq!(found.id, 7);
        assert_eq!(found.title, "post 7");
        assert_eq!(found.points, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_post_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec_ok(0)])
            .into_connection();

        let repo = PostgresPostRepository::new(Arc::new(db));

        assert!(matches!(repo.delete(99).await, Err(RepoError::NotFound)));
    }
}

mod feed {
    use super::*;

    fn page_of_posts(count: i64, creator_id: i64) -> Vec<post::Model> {
        let base = Utc::now();
        (0..count)
            .map(|i| post_model(i + 1, creator_id, base - Duration::seconds(i)))
            .collect()
    }

    #[tokio::test]
    async fn test_limit_is_clamped_and_spare_row_signals_more() {
        // A limit of 1000 behaves exactly like 50: 51 rows fetched, the
        // spare one dropped, has_more set.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([page_of_posts(51, 1)])
            .append_query_results([vec![user_model(1)]])
            .into_connection();

        let repo = PostgresPostRepository::new(Arc::new(db));

        let page = repo
            .feed(FeedQuery {
                limit: 1000,
                cursor: None,
                viewer_id: None,
            })
            .await
            .unwrap();

        assert_eq!(page.posts.len(), 50);
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn test_zero_limit_still_yields_a_post() {
        // Clamped up to one row, so a page that has more always carries a
        // last post for the client's next cursor.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([page_of_posts(2, 1)])
            .append_query_results([vec![user_model(1)]])
            .into_connection();

        let repo = PostgresPostRepository::new(Arc::new(db));

        let page = repo
            .feed(FeedQuery {
                limit: 0,
                cursor: None,
                viewer_id: None,
            })
            .await
            .unwrap();

        assert_eq!(page.posts.len(), 1);
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn test_exact_page_has_no_more() {
        // limit=2 against exactly 2 posts: both returned, has_more=false.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([page_of_posts(2, 1)])
            .append_query_results([vec![user_model(1)]])
            .into_connection();

        let repo = PostgresPostRepository::new(Arc::new(db));

        let page = repo
            .feed(FeedQuery {
                limit: 2,
                cursor: None,
                viewer_id: None,
            })
            .await
            .unwrap();

        assert_eq!(page.posts.len(), 2);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_partial_page_has_more() {
        // limit=2 against 3 posts: 2 returned, has_more=true.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([page_of_posts(3, 1)])
            .append_query_results([vec![user_model(1)]])
            .into_connection();

        let repo = PostgresPostRepository::new(Arc::new(db));

        let page = repo
            .feed(FeedQuery {
                limit: 2,
                cursor: None,
                viewer_id: None,
            })
            .await
            .unwrap();

        assert_eq!(page.posts.len(), 2);
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn test_viewer_votes_are_attached_per_post() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([page_of_posts(2, 1)])
            .append_query_results([vec![user_model(1)]])
            .append_query_results([vec![updoot_model(7, 1, -1)]])
            .into_connection();

        let repo = PostgresPostRepository::new(Arc::new(db));

        let page = repo
            .feed(FeedQuery {
                limit: 2,
                cursor: None,
                viewer_id: Some(7),
            })
            .await
            .unwrap();

        assert_eq!(page.posts[0].vote_status, Some(-1));
        assert_eq!(page.posts[1].vote_status, None);
    }

    #[tokio::test]
    async fn test_anonymous_feed_never_queries_the_ledger() {
        // Without a viewer id, only the posts query and the creator batch
        // run. A third query would drain an empty mock queue and fail.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([page_of_posts(1, 1)])
            .append_query_results([vec![user_model(1)]])
            .into_connection();

        let repo = PostgresPostRepository::new(Arc::new(db));

        let page = repo
            .feed(FeedQuery {
                limit: 10,
                cursor: None,
                viewer_id: None,
            })
            .await
            .unwrap();

        assert_eq!(page.posts[0].vote_status, None);
        assert_eq!(page.posts[0].creator.username, "user1");
    }

    #[tokio::test]
    async fn test_empty_feed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();

        let repo = PostgresPostRepository::new(Arc::new(db));

        let page = repo
            .feed(FeedQuery {
                limit: 10,
                cursor: None,
                viewer_id: Some(7),
            })
            .await
            .unwrap();

        assert!(page.posts.is_empty());
        assert!(!page.has_more);
    }
}

mod user_repo {
    use super::*;

    #[tokio::test]
    async fn test_find_by_login_with_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_model(3)]])
            .into_connection();

        let repo = PostgresUserRepository::new(Arc::new(db));

        let found = repo
            .find_by_login("User3@Example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, 3);
    }

    #[tokio::test]
    async fn test_duplicate_registration_maps_to_constraint() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([sea_orm::DbErr::Query(RuntimeErr::Internal(
                "duplicate key value violates unique constraint \"users_username_key\""
                    .to_owned(),
            ))])
            .into_connection();

        let repo = PostgresUserRepository::new(Arc::new(db));

        let result = repo
            .create(NewUser {
                username: "taken".to_owned(),
                email: "taken@example.com".to_owned(),
                password_hash: "hash".to_owned(),
            })
            .await;

        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }
}

mod voting {
    use super::*;

    fn engine(db: DbConn) -> PgVotingEngine {
        PgVotingEngine::new(Arc::new(db))
    }

    #[tokio::test]
    async fn test_first_vote_inserts_and_bumps_score() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post_model(1, 2, now)]])
            .append_query_results([Vec::<updoot::Model>::new()])
            .append_query_results([vec![updoot_model(7, 1, 1)]])
            .append_exec_results([exec_ok(1), exec_ok(1)])
            .into_connection();

        let outcome = engine(db)
            .apply_vote(7, 1, VoteDirection::Up)
            .await
            .unwrap();

        assert_eq!(outcome, VoteOutcome::Recorded);
    }

    #[tokio::test]
    async fn test_repeat_vote_is_unchanged() {
        // Same value already in the ledger: no write of any kind happens,
        // so no exec results are queued.
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post_model(1, 2, now)]])
            .append_query_results([vec![updoot_model(7, 1, 1)]])
            .into_connection();

        let outcome = engine(db)
            .apply_vote(7, 1, VoteDirection::Up)
            .await
            .unwrap();

        assert_eq!(outcome, VoteOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_reversal_flips_the_row() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post_model(1, 2, now)]])
            .append_query_results([vec![updoot_model(7, 1, 1)]])
            .append_exec_results([exec_ok(1), exec_ok(1)])
            .into_connection();

        let outcome = engine(db)
            .apply_vote(7, 1, VoteDirection::Down)
            .await
            .unwrap();

        assert_eq!(outcome, VoteOutcome::Changed);
    }

    #[tokio::test]
    async fn test_vote_on_missing_post() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();

        let result = engine(db).apply_vote(7, 99, VoteDirection::Up).await;

        assert!(matches!(result, Err(VoteError::PostNotFound(99))));
    }

    #[tokio::test]
    async fn test_insert_race_resolves_on_retry() {
        // First cycle: empty ledger read, then the insert hits the
        // composite-key unique violation (a concurrent vote won). The
        // transaction rolls back and the cycle reruns: this time the read
        // sees the winner's identical row and the request is a no-op.
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post_model(1, 2, now)]])
            .append_query_results([Vec::<updoot::Model>::new()])
            .append_query_errors([sea_orm::DbErr::Query(RuntimeErr::Internal(
                "duplicate key value violates unique constraint \"updoots_pkey\"".to_owned(),
            ))])
            .append_query_results([vec![post_model(1, 2, now)]])
            .append_query_results([vec![updoot_model(7, 1, 1)]])
            .into_connection();

        let outcome = engine(db)
            .apply_vote(7, 1, VoteDirection::Up)
            .await
            .unwrap();

        assert_eq!(outcome, VoteOutcome::Unchanged);
    }
}
