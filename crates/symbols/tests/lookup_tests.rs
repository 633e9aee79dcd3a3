//! SymbolLookup ordering, caching and invalidation behavior.

mod common;

use common::{Outcome, StaticSource};
use quarry_core::SymbolRef;
use quarry_core::config::SymbolsConfig;
use quarry_symbols::{SymbolLookup, SymbolSource};
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn cached_config() -> SymbolsConfig {
    SymbolsConfig {
        sources: Vec::new(),
        probe_cache_ttl_secs: 60,
        probe_cache_capacity: 1_000,
    }
}

fn reference() -> SymbolRef {
    SymbolRef::new("xul.pdb", "44E4EC8C2F41492B9369D6B9A059577C2", "xul.sym")
}

#[tokio::test]
async fn test_first_hit_wins_and_later_sources_are_not_probed() {
    let (first, first_probes) = StaticSource::new("first", Outcome::Miss);
    let (second, second_probes) =
        StaticSource::new("second", Outcome::Hit("https://a.example/xul.sym".to_string()));
    let (third, third_probes) =
        StaticSource::new("third", Outcome::Hit("https://b.example/xul.sym".to_string()));

    let sources: Vec<Arc<dyn SymbolSource>> = vec![first, second, third];
    let lookup = SymbolLookup::new(sources, &cached_config());

    let resolution = lookup.resolve(&reference()).await;
    assert_eq!(resolution.url.as_deref(), Some("https://a.example/xul.sym"));
    assert_eq!(first_probes.load(Ordering::SeqCst), 1);
    assert_eq!(second_probes.load(Ordering::SeqCst), 1);
    assert_eq!(third_probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failing_source_falls_through_to_next() {
    let (bad, bad_probes) = StaticSource::new("bad", Outcome::Error);
    let (good, good_probes) =
        StaticSource::new("good", Outcome::Hit("https://a.example/xul.sym".to_string()));

    let sources: Vec<Arc<dyn SymbolSource>> = vec![bad, good];
    let lookup = SymbolLookup::new(sources, &cached_config());

    let resolution = lookup.resolve(&reference()).await;
    assert!(resolution.found());
    assert_eq!(bad_probes.load(Ordering::SeqCst), 1);
    assert_eq!(good_probes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_all_sources_failing_resolves_to_miss() {
    let (bad, _) = StaticSource::new("bad", Outcome::Error);
    let sources: Vec<Arc<dyn SymbolSource>> = vec![bad];
    let lookup = SymbolLookup::new(sources, &cached_config());

    assert!(!lookup.resolve(&reference()).await.found());
}

#[tokio::test]
async fn test_hit_outcomes_are_cached() {
    let (source, probes) =
        StaticSource::new("src", Outcome::Hit("https://a.example/xul.sym".to_string()));
    let sources: Vec<Arc<dyn SymbolSource>> = vec![source];
    let lookup = SymbolLookup::new(sources, &cached_config());

    let first = lookup.resolve(&reference()).await;
    let second = lookup.resolve(&reference()).await;
    assert_eq!(first.url, second.url);
    assert_eq!(probes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_miss_outcomes_are_cached_too() {
    let (source, probes) = StaticSource::new("src", Outcome::Miss);
    let sources: Vec<Arc<dyn SymbolSource>> = vec![source];
    let lookup = SymbolLookup::new(sources, &cached_config());

    assert!(!lookup.resolve(&reference()).await.found());
    assert!(!lookup.resolve(&reference()).await.found());
    assert_eq!(probes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalidate_forces_a_reprobe() {
    let (source, probes) = StaticSource::new("src", Outcome::Miss);
    let sources: Vec<Arc<dyn SymbolSource>> = vec![source];
    let lookup = SymbolLookup::new(sources, &cached_config());
    let r = reference();

    lookup.resolve(&r).await;
    lookup.invalidate(&r).await;
    lookup.resolve(&r).await;
    assert_eq!(probes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_zero_capacity_disables_caching() {
    let (source, probes) = StaticSource::new("src", Outcome::Miss);
    let sources: Vec<Arc<dyn SymbolSource>> = vec![source];
    let config = SymbolsConfig {
        probe_cache_capacity: 0,
        ..cached_config()
    };
    let lookup = SymbolLookup::new(sources, &config);

    lookup.resolve(&reference()).await;
    lookup.resolve(&reference()).await;
    assert_eq!(probes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_distinct_references_are_cached_independently() {
    let (source, probes) = StaticSource::new("src", Outcome::Miss);
    let sources: Vec<Arc<dyn SymbolSource>> = vec![source];
    let lookup = SymbolLookup::new(sources, &cached_config());

    lookup.resolve(&reference()).await;
    let other = SymbolRef::new("nss3.pdb", "5F31953A4BBF4481A65ED1912AC52E061", "nss3.sym");
    lookup.resolve(&other).await;
    assert_eq!(probes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_health_check_reports_each_source_by_name() {
    let (good, _) = StaticSource::new("good", Outcome::Miss);
    let (bad, _) = StaticSource::new("bad", Outcome::Error);
    let sources: Vec<Arc<dyn SymbolSource>> = vec![good, bad];
    let lookup = SymbolLookup::new(sources, &cached_config());

    let health = lookup.health_check().await;
    assert_eq!(health.len(), 2);
    assert_eq!(health[0].0, "good");
    assert!(health[0].1.is_ok());
    assert_eq!(health[1].0, "bad");
    assert!(health[1].1.is_err());
}
