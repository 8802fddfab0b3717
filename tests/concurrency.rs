//! Concurrent puts and commits from many threads.

mod fixtures;

use std::collections::BTreeSet;
use std::sync::Barrier;
use std::thread;

use fixtures::bpo::site;
use fixtures::repo::{TestRepo, author};
use geoversion::HistoryMode;

const THREADS: usize = 8;

#[test]
fn concurrent_put_of_same_content_yields_one_payload() {
    let t = TestRepo::new();
    let bpo = site("shared", 12.5, 41.9);
    let barrier = Barrier::new(THREADS);

    let hashes: BTreeSet<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    t.repo.objects().put(&bpo).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(hashes.len(), 1);
    assert_eq!(t.repo.objects().count().unwrap(), 1);
    let hash = hashes.into_iter().next().unwrap();
    assert_eq!(t.repo.objects().get(hash).unwrap(), bpo);
}

#[test]
fn concurrent_implicit_commits_stay_linear() {
    let t = TestRepo::new();
    let s = t.situation("busy");
    let reg = t.repo.registry();
    let root = reg.commit(&s, vec![], &[], "root", author("ann")).unwrap();
    let barrier = Barrier::new(THREADS);

    let committed: BTreeSet<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let s = s.clone();
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    let bpo = site(&format!("f{i}"), i as f64, 0.0);
                    reg.commit(&s, vec![], &[bpo], format!("worker {i}"), author("bot"))
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(committed.len(), THREADS);

    let heads = reg.heads(&s).unwrap();
    assert_eq!(heads.len(), 1, "serialized commits must not fork");
    let head = *heads.first().unwrap();

    let history: Vec<_> = t
        .repo
        .graph()
        .history(head, HistoryMode::FirstParent)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(history.len(), THREADS + 1);
    assert_eq!(history.last(), Some(&root));
    let walked: BTreeSet<_> = history.iter().copied().filter(|v| *v != root).collect();
    assert_eq!(walked, committed);
}

#[test]
fn concurrent_explicit_commits_on_same_parent_fork() {
    let t = TestRepo::new();
    let s = t.situation("forky");
    let reg = t.repo.registry();
    let v1 = reg.commit(&s, vec![], &[], "root", author("ann")).unwrap();
    let barrier = Barrier::new(THREADS);

    let tips: BTreeSet<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let s = s.clone();
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    reg.commit(&s, vec![v1], &[site("f", i as f64, 1.0)], "", author("bot"))
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(reg.heads(&s).unwrap(), tips);
    let tips: Vec<_> = tips.into_iter().collect();
    for pair in tips.windows(2) {
        assert_eq!(
            t.repo.graph().lowest_common_ancestor(pair[0], pair[1]).unwrap(),
            Some(v1)
        );
    }
}

#[test]
fn commits_to_different_situations_run_in_parallel() {
    let t = TestRepo::new();
    let ids: Vec<_> = (0..THREADS).map(|i| t.situation(&format!("s{i}"))).collect();
    let reg = t.repo.registry();

    thread::scope(|scope| {
        for s in &ids {
            scope.spawn(move || {
                for n in 0..5 {
                    reg.commit(s, vec![], &[site("x", f64::from(n), 2.0)], "", author("bot"))
                        .unwrap();
                }
            });
        }
    });

    for s in &ids {
        let heads = reg.heads(s).unwrap();
        assert_eq!(heads.len(), 1);
        let versions = t.repo.graph().versions_for_situation(s, None, None).unwrap();
        assert_eq!(versions.len(), 5);
    }
}
