//! Tests for the metrics seam of the path resolver.
//!
//! The resolver is generic over [`MetricsRecorder`]; these tests wire in a
//! capturing recorder and assert on the exact observations emitted.

use std::sync::Mutex;
use std::time::Duration;

use theseus::{
    AncestorRef, GraphBuilder, MetricsRecorder, OccurrenceData, OccurrenceSource, PathResolver,
    ProjectId, Store, PATHS_FOUND_COUNTER, PATH_RESOLUTION_TIMER,
};

#[derive(Default)]
struct CapturingRecorder {
    durations: Mutex<Vec<&'static str>>,
    counts: Mutex<Vec<(&'static str, bool, u64)>>,
}

impl MetricsRecorder for CapturingRecorder {
    fn observe_duration(&self, instrument: &'static str, _elapsed: Duration) {
        self.durations.lock().unwrap().push(instrument);
    }

    fn count_paths(&self, instrument: &'static str, cyclic: bool, count: u64) {
        self.counts.lock().unwrap().push((instrument, cyclic, count));
    }
}

fn parent(name: &str) -> AncestorRef {
    AncestorRef::Parent {
        name: name.to_string(),
        version: "1.0.0".to_string(),
    }
}

fn record(name: &str, ancestors: Vec<AncestorRef>) -> OccurrenceData {
    OccurrenceData {
        component_name: name.to_string(),
        version: "1.0.0".to_string(),
        input_file_path: "Cargo.lock".to_string(),
        ancestors,
    }
}

/// Open a store with a built graph for the given records; returns the store
/// and the id of the last inserted occurrence.
fn built_store(records: &[OccurrenceData]) -> (tempfile::TempDir, Store, theseus::OccurrenceId) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = Store::open(&dir.path().join("test.db")).expect("failed to open store");
    let project = ProjectId::from(1);

    let ids = store
        .replace_project_occurrences(project, records)
        .expect("insert failed");
    GraphBuilder::new(&store).build(project).expect("build failed");

    let last = *ids.last().expect("at least one record");
    (dir, store, last)
}

#[test]
fn both_cyclic_labels_are_recorded_even_when_zero() {
    let (_dir, store, target_id) = built_store(&[
        record("root", vec![]),
        record("leaf", vec![parent("root")]),
    ]);
    let target = store
        .get_occurrence(target_id)
        .expect("lookup failed")
        .expect("occurrence exists");

    let recorder = CapturingRecorder::default();
    let paths = PathResolver::new(&store, &recorder)
        .find_paths(&target)
        .expect("resolution failed");
    assert_eq!(paths.len(), 1);

    let counts = recorder.counts.lock().unwrap();
    assert_eq!(counts.len(), 2, "one observation per cyclic label");
    assert!(counts.contains(&(PATHS_FOUND_COUNTER, false, 1)));
    assert!(counts.contains(&(PATHS_FOUND_COUNTER, true, 0)));
}

#[test]
fn cyclic_count_matches_paths_in_a_loop() {
    // a <-> b, target hangs off b.
    let (_dir, store, target_id) = built_store(&[
        record("a", vec![parent("b")]),
        record("b", vec![parent("a")]),
        record("target", vec![parent("b")]),
    ]);
    let target = store
        .get_occurrence(target_id)
        .expect("lookup failed")
        .expect("occurrence exists");

    let recorder = CapturingRecorder::default();
    let paths = PathResolver::new(&store, &recorder)
        .find_paths(&target)
        .expect("resolution failed");

    let cyclic_found = paths.iter().filter(|p| p.is_cyclic()).count() as u64;
    let non_cyclic_found = paths.len() as u64 - cyclic_found;
    assert!(cyclic_found > 0, "loop should surface as a cyclic path");

    let counts = recorder.counts.lock().unwrap();
    assert!(counts.contains(&(PATHS_FOUND_COUNTER, true, cyclic_found)));
    assert!(counts.contains(&(PATHS_FOUND_COUNTER, false, non_cyclic_found)));
}

#[test]
fn every_resolution_observes_the_timer() {
    let (_dir, store, target_id) = built_store(&[record("solo", vec![])]);
    let target = store
        .get_occurrence(target_id)
        .expect("lookup failed")
        .expect("occurrence exists");

    let recorder = CapturingRecorder::default();
    let resolver = PathResolver::new(&store, &recorder);
    resolver.find_paths(&target).expect("resolution failed");
    resolver.find_paths(&target).expect("resolution failed");

    let durations = recorder.durations.lock().unwrap();
    assert_eq!(*durations, vec![PATH_RESOLUTION_TIMER, PATH_RESOLUTION_TIMER]);
}
