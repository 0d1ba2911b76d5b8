use std::sync::Arc;
use std::time::Duration;

use hof_core::likes::LikeTally;
use hof_core::models::{Like, ObjectDraft};
use hof_core::traits::Graffiti;
use integration_tests::{channels, session, store};

async fn like(store: &dyn Graffiti, actor: &str, target: &str) {
    store
        .put(ObjectDraft::new(&Like::new(target), channels()).unwrap(), &session(actor))
        .await
        .unwrap();
}

#[tokio::test]
async fn tally_counts_distinct_actors_per_target() {
    let store = store();
    like(&*store, "alice", "post-a").await;
    like(&*store, "alice", "post-a").await;
    like(&*store, "bob", "post-a").await;
    like(&*store, "carol", "post-b").await;
    like(&*store, "dave", "post-c").await;

    let tally = LikeTally::new(
        store.clone(),
        vec!["post-a".into(), "post-b".into(), "post-unliked".into()],
        channels(),
    );
    tally.refresh().await.unwrap();

    let actors = tally.actors_per_target();
    assert_eq!(actors.len(), 2, "post-c is outside the targets");
    assert_eq!(actors["post-a"].len(), 2);
    assert_eq!(tally.count("post-a"), 2);
    assert_eq!(tally.count("post-b"), 1);
    assert_eq!(tally.count("post-unliked"), 0);
    assert_eq!(tally.count("post-c"), 0);
}

#[tokio::test]
async fn likes_in_other_channels_are_ignored() {
    let store = store();
    store
        .put(
            ObjectDraft::new(&Like::new("post-a"), vec!["elsewhere".into()]).unwrap(),
            &session("alice"),
        )
        .await
        .unwrap();

    let tally = LikeTally::new(store.clone(), vec!["post-a".into()], channels());
    tally.refresh().await.unwrap();
    assert_eq!(tally.count("post-a"), 0);
}

#[tokio::test]
async fn retargeting_changes_the_query() {
    let store = store();
    like(&*store, "alice", "post-a").await;
    like(&*store, "bob", "post-b").await;

    let tally = LikeTally::new(store.clone(), vec!["post-a".into()], channels());
    tally.refresh().await.unwrap();
    assert_eq!(tally.count("post-b"), 0);

    tally.set_targets(vec!["post-b".into()]).await;
    tally.refresh().await.unwrap();
    assert_eq!(tally.targets().await, vec!["post-b".to_string()]);
    assert_eq!(tally.count("post-a"), 0);
    assert_eq!(tally.count("post-b"), 1);
}

#[tokio::test]
async fn changed_recomputes_after_a_new_like() {
    let store = store();
    let tally = Arc::new(LikeTally::new(store.clone(), vec!["post-a".into()], channels()));
    tally.refresh().await.unwrap();
    assert_eq!(tally.count("post-a"), 0);

    let waiter = {
        let tally = tally.clone();
        tokio::spawn(async move { tally.changed().await })
    };
    like(&*store, "alice", "post-a").await;

    tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("change observed in time")
        .unwrap()
        .unwrap();
    assert_eq!(tally.count("post-a"), 1);
}
