//! Resilient JSONL loading of an [`InMemoryConfiguration`].
//!
//! Each non-empty line holds one record, tagged by `class`:
//!
//! ```text
//! {"class":"system","uid":"session","segment":"root","disabled":["m1"]}
//! {"class":"segment","uid":"root","segments":["s2"],"applications":["a1"]}
//! {"class":"resource-set-and","uid":"a1","contains":["m1","m2"]}
//! {"class":"resource-set-or","uid":"a2","contains":["m3","m4"]}
//! {"class":"application","uid":"app"}
//! {"class":"resource","uid":"m1"}
//! ```
//!
//! Records may reference components defined later in the file. Loading does
//! not stop at the first bad record: problems are collected as
//! [`LoadWarning`]s and the offending record or edge is skipped.
//!
//! Containment cycles are *reported* but kept, so the engine's structural
//! check can reject the graph at query time with the full path.

use crate::domain::{ComponentId, ComponentKind, SetVariant};
use crate::error::{Error, Result};
use crate::graph::{ConfigurationGraph, InMemoryConfiguration};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// Non-fatal problems found while loading a JSONL configuration.
///
/// **Example:**
/// ```no_run
/// # use confgraph::graph::{load_from_jsonl, LoadWarning};
/// # use std::path::Path;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let (config, warnings) = load_from_jsonl(Path::new("system.jsonl")).await?;
///
/// for warning in &warnings {
///     eprintln!("⚠️  {}", warning);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Line that could not be parsed as a record
    ///
    /// **Effect**: Line is skipped entirely.
    MalformedJson {
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// Record whose uid was already defined
    ///
    /// **Effect**: The later record is skipped; the first definition wins.
    DuplicateComponent {
        /// 1-based line number of the skipped record
        line_number: usize,
        /// Duplicated uid
        uid: String,
    },

    /// Second system record
    ///
    /// **Effect**: Skipped; the first system record wins.
    DuplicateSystem {
        /// 1-based line number of the skipped record
        line_number: usize,
        /// Uid of the skipped system
        uid: String,
    },

    /// Reference to a uid that no record defines
    ///
    /// **Effect**: The edge (or disabled entry) is dropped.
    DanglingReference {
        /// Uid of the referencing record
        from: String,
        /// Missing uid
        to: String,
    },

    /// Edge between incompatible kinds, e.g. a segment inside a resource set
    ///
    /// **Effect**: The edge is dropped.
    InvalidContainment {
        /// Uid of the container
        parent: String,
        /// Uid of the contained component
        child: String,
        /// Why the edge was rejected
        reason: String,
    },

    /// A component that sits on a containment cycle
    ///
    /// **Effect**: None; the graph is kept as is and disabled-state queries
    /// will fail with a structural cycle error until it is fixed.
    ContainmentCycle {
        /// Uid of one component on the cycle
        uid: String,
    },

    /// No system record, or its root segment could not be resolved
    ///
    /// **Effect**: The configuration has no root; every walk is empty.
    MissingRoot,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadWarning::MalformedJson { line_number, error } => {
                write!(f, "skipped malformed record at line {}: {}", line_number, error)
            }
            LoadWarning::DuplicateComponent { line_number, uid } => {
                write!(f, "skipped duplicate component {} at line {}", uid, line_number)
            }
            LoadWarning::DuplicateSystem { line_number, uid } => {
                write!(f, "skipped second system {} at line {}", uid, line_number)
            }
            LoadWarning::DanglingReference { from, to } => {
                write!(f, "dropped reference from {} to unknown component {}", from, to)
            }
            LoadWarning::InvalidContainment {
                parent,
                child,
                reason,
            } => write!(f, "dropped edge {} -> {}: {}", parent, child, reason),
            LoadWarning::ContainmentCycle { uid } => {
                write!(f, "component {} is part of a containment cycle", uid)
            }
            LoadWarning::MissingRoot => write!(f, "configuration has no root segment"),
        }
    }
}

/// One line of a JSONL configuration.
#[derive(Debug, Deserialize)]
#[serde(tag = "class", rename_all = "kebab-case", deny_unknown_fields)]
enum Record {
    System {
        uid: String,
        segment: String,
        #[serde(default)]
        disabled: Vec<String>,
    },
    Segment {
        uid: String,
        #[serde(default)]
        segments: Vec<String>,
        #[serde(default)]
        applications: Vec<String>,
    },
    Application {
        uid: String,
    },
    Resource {
        uid: String,
    },
    ResourceSetAnd {
        uid: String,
        #[serde(default)]
        contains: Vec<String>,
    },
    ResourceSetOr {
        uid: String,
        #[serde(default)]
        contains: Vec<String>,
    },
}

impl Record {
    fn component(&self) -> Option<(&str, ComponentKind)> {
        match self {
            Record::System { .. } => None,
            Record::Segment { uid, .. } => Some((uid, ComponentKind::Segment)),
            Record::Application { uid } => Some((uid, ComponentKind::Application)),
            Record::Resource { uid } => Some((uid, ComponentKind::Resource)),
            Record::ResourceSetAnd { uid, .. } => {
                Some((uid, ComponentKind::ResourceSet(SetVariant::And)))
            }
            Record::ResourceSetOr { uid, .. } => {
                Some((uid, ComponentKind::ResourceSet(SetVariant::Or)))
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Edge {
    SubSegment,
    Application,
    Contains,
}

/// Load a configuration from a JSONL file.
///
/// # Errors
///
/// Only I/O failures are errors; everything else is a [`LoadWarning`].
pub async fn load_from_jsonl(path: &Path) -> Result<(InMemoryConfiguration, Vec<LoadWarning>)> {
    let content = fs::read_to_string(path).await?;
    let (config, warnings) = parse_jsonl(&content);

    tracing::debug!(
        path = %path.display(),
        components = config.len(),
        warnings = warnings.len(),
        "loaded configuration"
    );
    Ok((config, warnings))
}

/// Parse JSONL configuration text.
pub fn parse_jsonl(content: &str) -> (InMemoryConfiguration, Vec<LoadWarning>) {
    let mut warnings = Vec::new();

    // First pass: parse lines
    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Record>(trimmed) {
            Ok(record) => records.push((line_number, record)),
            Err(e) => warnings.push(LoadWarning::MalformedJson {
                line_number,
                error: e.to_string(),
            }),
        }
    }

    // Second pass: create components so edges may point forward
    let mut config = InMemoryConfiguration::new();
    let mut accepted = Vec::with_capacity(records.len());
    let mut system: Option<(String, String, Vec<String>)> = None;
    for (line_number, record) in records {
        if let Record::System {
            uid,
            segment,
            disabled,
        } = record
        {
            if system.is_some() {
                warnings.push(LoadWarning::DuplicateSystem { line_number, uid });
            } else {
                system = Some((uid, segment, disabled));
            }
            continue;
        }

        let Some((uid, kind)) = record.component() else {
            continue;
        };
        let added = config.add_component(uid, kind);
        match added {
            Ok(id) => accepted.push((id, record)),
            Err(Error::DuplicateComponent(uid)) => {
                warnings.push(LoadWarning::DuplicateComponent { line_number, uid });
            }
            Err(e) => warnings.push(LoadWarning::MalformedJson {
                line_number,
                error: e.to_string(),
            }),
        }
    }

    // Third pass: containment edges, in file order
    for (id, record) in &accepted {
        let edges: Vec<(Edge, &Vec<String>)> = match record {
            Record::Segment {
                segments,
                applications,
                ..
            } => vec![(Edge::SubSegment, segments), (Edge::Application, applications)],
            Record::ResourceSetAnd { contains, .. } | Record::ResourceSetOr { contains, .. } => {
                vec![(Edge::Contains, contains)]
            }
            _ => Vec::new(),
        };

        for (edge, children) in edges {
            for child_uid in children {
                link(&mut config, *id, child_uid, edge, &mut warnings);
            }
        }
    }

    // System record: root and persisted disabled list
    if let Some((uid, segment, disabled)) = system {
        match config.lookup(&segment) {
            Some(root) => {
                if let Err(e) = config.set_root(root) {
                    warnings.push(containment_warning(e, &uid, &segment));
                }
            }
            None => warnings.push(LoadWarning::DanglingReference {
                from: uid.clone(),
                to: segment,
            }),
        }

        for entry in disabled {
            match config.lookup(&entry) {
                Some(id) => config.disable(id),
                None => warnings.push(LoadWarning::DanglingReference {
                    from: uid.clone(),
                    to: entry,
                }),
            }
        }
        config.set_system_uid(uid);
    }

    if config.root_segment().is_none() {
        warnings.push(LoadWarning::MissingRoot);
    }

    if let Some(member) = config.find_cycle() {
        warnings.push(LoadWarning::ContainmentCycle {
            uid: config.describe(member),
        });
    }

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    (config, warnings)
}

fn link(
    config: &mut InMemoryConfiguration,
    parent: ComponentId,
    child_uid: &str,
    edge: Edge,
    warnings: &mut Vec<LoadWarning>,
) {
    let parent_uid = config.describe(parent);
    let Some(child) = config.lookup(child_uid) else {
        warnings.push(LoadWarning::DanglingReference {
            from: parent_uid,
            to: child_uid.to_string(),
        });
        return;
    };

    let result = match edge {
        Edge::SubSegment => config.add_sub_segment(parent, child),
        Edge::Application => config.add_application(parent, child),
        Edge::Contains => config.add_to_set(parent, child),
    };

    if let Err(e) = result {
        warnings.push(containment_warning(e, &parent_uid, child_uid));
    }
}

fn containment_warning(error: Error, parent: &str, child: &str) -> LoadWarning {
    match error {
        Error::InvalidContainment {
            parent,
            child,
            reason,
        } => LoadWarning::InvalidContainment {
            parent,
            child,
            reason,
        },
        other => LoadWarning::InvalidContainment {
            parent: parent.to_string(),
            child: child.to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_references_resolve() {
        let content = r#"
{"class":"system","uid":"session","segment":"root"}
{"class":"segment","uid":"root","applications":["set"]}
{"class":"resource-set-or","uid":"set","contains":["r1"]}
{"class":"resource","uid":"r1"}
"#;
        let (config, warnings) = parse_jsonl(content);
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);

        let root = config.require("root").unwrap();
        let set = config.require("set").unwrap();
        assert_eq!(config.root_segment(), Some(root));
        assert_eq!(config.children(root).applications, &[set]);
        assert_eq!(config.variant(set), Some(SetVariant::Or));
        assert_eq!(config.system_uid(), Some("session"));
    }

    #[test]
    fn test_malformed_line_skipped() {
        let content = "{\"class\":\"resource\",\"uid\":\"ok\"}\nnot json\n{\"class\":\"mystery\",\"uid\":\"x\"}\n";
        let (config, warnings) = parse_jsonl(content);

        assert_eq!(config.len(), 1);
        assert!(matches!(
            warnings[0],
            LoadWarning::MalformedJson { line_number: 2, .. }
        ));
        assert!(matches!(
            warnings[1],
            LoadWarning::MalformedJson { line_number: 3, .. }
        ));
        assert_eq!(warnings[2], LoadWarning::MissingRoot);
    }

    #[test]
    fn test_cycle_reported_but_kept() {
        let content = r#"
{"class":"system","uid":"s","segment":"root"}
{"class":"segment","uid":"root","applications":["a"]}
{"class":"resource-set-or","uid":"a","contains":["b"]}
{"class":"resource-set-and","uid":"b","contains":["a"]}
"#;
        let (config, warnings) = parse_jsonl(content);
        let b = config.require("b").unwrap();
        let a = config.require("a").unwrap();

        assert_eq!(config.contains(b), &[a]);
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, LoadWarning::ContainmentCycle { .. }))
        );
    }
}
