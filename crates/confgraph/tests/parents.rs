//! Integration tests for the parent-path finder.

mod common;

use common::{Readout, segment_chain};
use confgraph::domain::ComponentId;
use confgraph::error::Error;
use confgraph::parents::{PARENTS_GOAL, find_paths};
use confgraph::system::System;

#[test]
fn test_paths_through_readout() {
    let r = Readout::build();
    let (s1, s2, a1, a2, m1, m4) = (r.s1, r.s2, r.a1, r.a2, r.m1, r.m4);
    let system = System::new("readout", r.config);

    assert_eq!(system.find_parents(m1).unwrap(), vec![vec![s1, a1]]);
    assert_eq!(system.find_parents(m4).unwrap(), vec![vec![s1, s2, a2]]);
    assert_eq!(system.find_parents(a2).unwrap(), vec![vec![s1, s2]]);
    assert_eq!(system.find_parents(s2).unwrap(), vec![vec![s1]]);
    assert_eq!(system.find_parents(s1).unwrap(), vec![Vec::<ComponentId>::new()]);
}

#[test]
fn test_shared_set_yields_one_path_per_route() {
    let mut r = Readout::build();
    r.config.add_application(r.s2, r.a1).unwrap();
    let (s1, s2, a1, m2) = (r.s1, r.s2, r.a1, r.m2);
    let system = System::new("readout", r.config);

    // Sub-segments are searched before the segment's own applications
    assert_eq!(
        system.find_parents(m2).unwrap(),
        vec![vec![s1, s2, a1], vec![s1, a1]]
    );
}

#[test]
fn test_unattached_component_has_no_paths() {
    let mut r = Readout::build();
    let stray = r.config.add_resource("stray").unwrap();
    let system = System::new("readout", r.config);

    assert!(system.find_parents(stray).unwrap().is_empty());
}

#[test]
fn test_depth_limit_reported_as_cycle() {
    let (config, segments, _) = segment_chain(70);
    let root = segments[0];
    let deepest = *segments.last().unwrap();

    let err = find_paths(&config, root, deepest, 64).unwrap_err();
    match err {
        Error::StructuralCycle { goal, path, .. } => {
            assert_eq!(goal, PARENTS_GOAL);
            assert_eq!(path.len(), 65);
        }
        other => panic!("unexpected error: {other}"),
    }

    // The same walk fits within a larger limit
    let paths = find_paths(&config, root, deepest, 128).unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].len(), 69);
}
