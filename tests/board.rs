//! Facade-level scenarios over the in-memory backend.

use std::collections::HashSet;

use palaver::config::Config;
use palaver::{Board, Direction, OrderKind, StoreError, VoteOutcome};

async fn board() -> Board {
    Board::from_config(&Config::for_test()).await.unwrap()
}

#[tokio::test]
async fn test_end_to_end_vote_scenario() {
    let config = Config::for_test();
    let weight = config.ranking.vote_weight;
    let b = Board::from_config(&config).await.unwrap();

    b.create_post("P1", "U1", "hello", "first post", "C1")
        .await
        .unwrap();

    let posts = b
        .list_community_posts("C1", OrderKind::Score, 1)
        .await
        .unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, "P1");
    assert_eq!(posts[0].votes, 0);
    assert_eq!(posts[0].score, 0.0);

    // First up-vote from another user.
    assert_eq!(
        b.cast_vote("P1", "U2", Direction::Up).await.unwrap(),
        VoteOutcome::First
    );
    let posts = b.list_posts(OrderKind::Score, 1).await.unwrap();
    assert_eq!(posts[0].score, weight);
    assert_eq!(posts[0].votes, 1);

    // Identical re-cast is a conflict.
    assert!(matches!(
        b.cast_vote("P1", "U2", Direction::Up).await,
        Err(StoreError::AlreadyVoted { .. })
    ));

    // A down-vote from a third user cancels the score out; the votes
    // field counts active up-votes, so it stays at 1.
    assert_eq!(
        b.cast_vote("P1", "U3", Direction::Down).await.unwrap(),
        VoteOutcome::First
    );
    let posts = b.list_posts(OrderKind::Score, 1).await.unwrap();
    assert_eq!(posts[0].score, 0.0);
    assert_eq!(posts[0].votes, 1);
}

#[tokio::test]
async fn test_score_invariant_across_reversals() {
    let config = Config::for_test();
    let weight = config.ranking.vote_weight;
    let b = Board::from_config(&config).await.unwrap();

    b.create_post("P1", "U1", "t", "s", "C1").await.unwrap();

    // U2: Up, reverse to Down. U3: Down. Net active values: -1 + -1 = -2.
    b.cast_vote("P1", "U2", Direction::Up).await.unwrap();
    b.cast_vote("P1", "U2", Direction::Down).await.unwrap();
    b.cast_vote("P1", "U3", Direction::Down).await.unwrap();

    let posts = b.list_posts(OrderKind::Score, 1).await.unwrap();
    assert_eq!(posts[0].score, -2.0 * weight);
    assert_eq!(posts[0].votes, 0);
}

#[tokio::test]
async fn test_concurrent_identical_casts_one_winner() {
    let b = board().await;
    b.create_post("P1", "U1", "t", "s", "C1").await.unwrap();

    let (a, c) = tokio::join!(
        b.cast_vote("P1", "U2", Direction::Up),
        b.cast_vote("P1", "U2", Direction::Up),
    );

    let accepted = [&a, &c].iter().filter(|r| r.is_ok()).count();
    let conflicts = [&a, &c]
        .iter()
        .filter(|r| matches!(r, Err(StoreError::AlreadyVoted { .. })))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(conflicts, 1);
}

#[tokio::test]
async fn test_pages_are_disjoint_and_cover_the_index() {
    let config = Config::for_test();
    let page_size = config.paging.page_size;
    let b = Board::from_config(&config).await.unwrap();

    let total = 50u64;
    for i in 0..total {
        let id = format!("P{i:02}");
        let t = chrono::DateTime::from_timestamp(1_700_000_000 + i as i64, 0).unwrap();
        b.create_post_at(&id, "U1", "t", "s", "C1", t).await.unwrap();
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut page = 1;
    loop {
        let posts = b.list_posts(OrderKind::Time, page).await.unwrap();
        if posts.is_empty() {
            break;
        }
        assert!(posts.len() as u64 <= page_size);
        for p in &posts {
            // Disjointness: no id appears on two pages.
            assert!(seen.insert(p.id.clone()), "duplicate id {}", p.id);
        }
        page += 1;
    }

    assert_eq!(seen.len() as u64, total);
    assert_eq!(page, 4); // 20 + 20 + 10, then an empty page
}

#[tokio::test]
async fn test_ordering_is_descending() {
    let b = board().await;
    for (id, t) in [("P1", 100), ("P2", 300), ("P3", 200)] {
        let t = chrono::DateTime::from_timestamp(1_700_000_000 + t, 0).unwrap();
        b.create_post_at(id, "U1", "t", "s", "C1", t).await.unwrap();
    }
    b.cast_vote("P3", "U2", Direction::Up).await.unwrap();

    let by_time: Vec<String> = b
        .list_posts(OrderKind::Time, 1)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(by_time, ["P2", "P3", "P1"]);

    let by_score = b.list_posts(OrderKind::Score, 1).await.unwrap();
    assert_eq!(by_score[0].id, "P3");
}

#[tokio::test]
async fn test_scoped_cache_staleness_within_ttl() {
    let mut config = Config::for_test();
    config.storage.scoped_index_ttl_secs = 1;
    let b = Board::from_config(&config).await.unwrap();

    let t0 = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    b.create_post_at("P1", "U1", "t", "s", "C1", t0).await.unwrap();

    // Prime the scoped cache.
    let first = b
        .list_community_posts("C1", OrderKind::Time, 1)
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    // A post created after the cache was built is invisible within the TTL.
    let t1 = chrono::DateTime::from_timestamp(1_700_000_010, 0).unwrap();
    b.create_post_at("P2", "U1", "t", "s", "C1", t1).await.unwrap();
    let stale = b
        .list_community_posts("C1", OrderKind::Time, 1)
        .await
        .unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].id, "P1");

    // After expiry the rebuild picks it up.
    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
    let fresh = b
        .list_community_posts("C1", OrderKind::Time, 1)
        .await
        .unwrap();
    assert_eq!(fresh.len(), 2);
    assert_eq!(fresh[0].id, "P2");
}

#[tokio::test]
async fn test_community_scoping_excludes_other_communities() {
    let b = board().await;
    b.create_post("P1", "U1", "t", "s", "C1").await.unwrap();
    b.create_post("P2", "U1", "t", "s", "C2").await.unwrap();

    let c1 = b
        .list_community_posts("C1", OrderKind::Score, 1)
        .await
        .unwrap();
    assert_eq!(c1.len(), 1);
    assert_eq!(c1[0].id, "P1");

    let none = b
        .list_community_posts("nowhere", OrderKind::Score, 1)
        .await
        .unwrap();
    assert!(none.is_empty());
}
