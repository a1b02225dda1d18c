use std::sync::{Arc, Barrier};

use proxen_common::{SigningKey, Tier};
use proxen_engine::{GenerationEngine, TierPreference};
use proxen_synth::{TargetDescription, TypeDescriptor, TypeName};

const THREADS: usize = 16;

fn engine() -> Arc<GenerationEngine> {
    Arc::new(
        GenerationEngine::in_memory()
            .with_signing_key(SigningKey::from_material(b"concurrency-test-key").unwrap()),
    )
}

fn description() -> TargetDescription {
    TargetDescription::new(TypeDescriptor::class("Repository"))
        .with_capability(TypeDescriptor::contract("Disposable"))
}

#[test]
fn one_container_per_tier_under_contention() {
    let engine = engine();
    let barrier = Arc::new(Barrier::new(THREADS));

    let containers: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let engine = Arc::clone(&engine);
                let barrier = Arc::clone(&barrier);
                s.spawn(move || {
                    barrier.wait();
                    let tier = if i % 2 == 0 { Tier::Standard } else { Tier::Elevated };
                    engine.acquire_container(tier).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(engine.stats().containers_created, 2);
    for container in &containers {
        let canonical = engine.container(container.tier()).unwrap();
        assert!(Arc::ptr_eq(container, &canonical));
    }
}

#[test]
fn racing_misses_converge_on_one_binding() {
    let engine = engine();
    let barrier = Arc::new(Barrier::new(THREADS));

    std::thread::scope(|s| {
        for _ in 0..THREADS {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            s.spawn(move || {
                barrier.wait();
                engine
                    .get_or_synthesize(&description(), TierPreference::Standard)
                    .unwrap();
            });
        }
    });

    // Duplicate synthesis is allowed on this path, but every duplicate lands
    // in the same container and exactly one binding survives.
    let stats = engine.stats();
    assert!(stats.synthesized >= 1);
    assert_eq!(engine.cache().len(), 1);
    let container = engine.container(Tier::Standard).unwrap();
    assert_eq!(container.len() as u64, stats.synthesized);
    let bound = engine.lookup(&description().key()).unwrap();
    assert!(bound.belongs_to(&container));
}

#[test]
fn exclusive_path_synthesizes_once() {
    let engine = engine();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = std::thread::scope(|s| {
        let joins: Vec<_> = (0..THREADS)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let barrier = Arc::clone(&barrier);
                s.spawn(move || {
                    barrier.wait();
                    engine
                        .get_or_synthesize_exclusive(&description(), TierPreference::Standard)
                        .unwrap()
                })
            })
            .collect();
        joins.into_iter().map(|j| j.join().unwrap()).collect()
    });

    assert_eq!(engine.stats().synthesized, 1);
    assert_eq!(engine.container(Tier::Standard).unwrap().len(), 1);
    assert!(handles.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn lookups_do_not_wait_on_the_engine_lock() {
    let engine = engine();
    let handle = engine
        .get_or_synthesize(&description(), TierPreference::Standard)
        .unwrap();
    let _write = engine.lock().write();
    assert_eq!(engine.lookup(&description().key()), Some(handle));
}

#[test]
fn capability_order_yields_distinct_implementations() {
    let engine = engine();
    let ab = TargetDescription::new(TypeDescriptor::class("Repository"))
        .with_capability(TypeDescriptor::contract("A"))
        .with_capability(TypeDescriptor::contract("B"));
    let ba = TargetDescription::new(TypeDescriptor::class("Repository"))
        .with_capability(TypeDescriptor::contract("B"))
        .with_capability(TypeDescriptor::contract("A"));

    let first = engine
        .get_or_synthesize(&ab, TierPreference::Standard)
        .unwrap();
    let second = engine
        .get_or_synthesize(&ba, TierPreference::Standard)
        .unwrap();
    assert_ne!(first, second);
    assert_eq!(first.name(), "RepositoryProxy");
    assert_eq!(second.name(), "RepositoryProxy_1");
    assert_eq!(
        first.implementation().contracts,
        vec![TypeName::new("A"), TypeName::new("B")]
    );
    assert_eq!(engine.stats().synthesized, 2);
}
