//! Common fixtures shared across integration tests.

#![allow(dead_code)]

use confgraph::domain::{ComponentId, SetVariant};
use confgraph::graph::InMemoryConfiguration;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per test binary.
///
/// Controlled via `RUST_LOG`, e.g. `RUST_LOG=confgraph=trace`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("confgraph=warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// The two-segment readout system used throughout the tests.
///
/// ```text
/// s1 (root)
/// ├── a1: AND { m1, m2 }
/// └── s2
///     └── a2: OR { m3, m4 }
/// ```
pub struct Readout {
    pub config: InMemoryConfiguration,
    pub s1: ComponentId,
    pub s2: ComponentId,
    pub a1: ComponentId,
    pub a2: ComponentId,
    pub m1: ComponentId,
    pub m2: ComponentId,
    pub m3: ComponentId,
    pub m4: ComponentId,
}

impl Readout {
    pub fn build() -> Self {
        let mut config = InMemoryConfiguration::new();
        let s1 = config.add_segment("S1").unwrap();
        let s2 = config.add_segment("S2").unwrap();
        let a1 = config.add_resource_set("A1", SetVariant::And).unwrap();
        let a2 = config.add_resource_set("A2", SetVariant::Or).unwrap();
        let m1 = config.add_resource("M1").unwrap();
        let m2 = config.add_resource("M2").unwrap();
        let m3 = config.add_resource("M3").unwrap();
        let m4 = config.add_resource("M4").unwrap();

        config.set_root(s1).unwrap();
        config.add_application(s1, a1).unwrap();
        config.add_sub_segment(s1, s2).unwrap();
        config.add_application(s2, a2).unwrap();
        config.add_to_set(a1, m1).unwrap();
        config.add_to_set(a1, m2).unwrap();
        config.add_to_set(a2, m3).unwrap();
        config.add_to_set(a2, m4).unwrap();

        Self {
            config,
            s1,
            s2,
            a1,
            a2,
            m1,
            m2,
            m3,
            m4,
        }
    }

    pub fn all(&self) -> [ComponentId; 8] {
        [
            self.s1, self.s2, self.a1, self.a2, self.m1, self.m2, self.m3, self.m4,
        ]
    }
}

/// A chain of `depth` nested segments with a plain application in the root.
///
/// Returns the configuration, the segments outermost first, and the
/// application.
pub fn segment_chain(depth: usize) -> (InMemoryConfiguration, Vec<ComponentId>, ComponentId) {
    let mut config = InMemoryConfiguration::new();
    let mut segments = Vec::with_capacity(depth);

    for level in 0..depth {
        let segment = config.add_segment(&format!("seg-{level}")).unwrap();
        match segments.last() {
            Some(&parent) => config.add_sub_segment(parent, segment).unwrap(),
            None => config.set_root(segment).unwrap(),
        }
        segments.push(segment);
    }

    let app = config.add_plain_application("app").unwrap();
    config.add_application(segments[0], app).unwrap();
    (config, segments, app)
}
