//! End-to-end flows through `TopicGraph` on both backends and on disk
//!
//! Run with: `cargo test --test commit_flow`

mod common;

use common::{edge_triples, memory_graph, sqlite_graph, TempStore};
use std::sync::Arc;
use tagweave::{
    Command, CommandOutcome, CommitOutcome, GraphStore, LabelError, LabelNormalizer, MemoryStore,
    OpenStore, SkipReason, SqliteStore, StoreSnapshot, TopicGraph, Upsert, DEMO_PAIRS,
};

// === Scenario: a typo reinforces the pair it was meant for ===

fn typo_reinforces_existing_pair(graph: TopicGraph) {
    graph.commit_pair("berlin", "startups").unwrap();
    let outcome = graph.commit_pair("Berlin", "#startup").unwrap();

    match outcome {
        CommitOutcome::Committed {
            source,
            target,
            edge,
        } => {
            assert_eq!(source, "#berlin");
            assert_eq!(target, "#startups");
            assert!(matches!(edge, Upsert::Reinforced(ref e) if e.weight == 2));
        }
        other => panic!("expected commit, got {other:?}"),
    }

    let store = graph.store();
    assert_eq!(store.labels().unwrap(), vec!["#berlin", "#startups"]);
    assert_eq!(
        edge_triples(store),
        vec![("#berlin".into(), "#startups".into(), 2)]
    );
}

#[test]
fn typo_reinforces_existing_pair_sqlite() {
    typo_reinforces_existing_pair(sqlite_graph());
}

#[test]
fn typo_reinforces_existing_pair_memory() {
    typo_reinforces_existing_pair(memory_graph());
}

// === Scenario: unrelated tags stay separate ===

#[test]
fn unrelated_tag_gets_its_own_node() {
    let graph = memory_graph();
    graph.commit_pair("dataengineer", "berlin").unwrap();
    graph.commit_pair("quantumcomputing", "dataenginer").unwrap();

    let labels = graph.store().labels().unwrap();
    assert_eq!(labels, vec!["#berlin", "#dataengineer", "#quantumcomputing"]);
    assert!(graph.store().edge_exists("#dataengineer", "#quantumcomputing").unwrap());
}

// === Scenario: validation stops the whole pair ===

#[test]
fn invalid_tag_leaves_store_untouched() {
    let graph = sqlite_graph();
    graph.commit_pair("rust", "go").unwrap();

    let outcome = graph.commit_pair("rust", "c++ & friends").unwrap();
    assert_eq!(
        outcome,
        CommitOutcome::Skipped(SkipReason::Rejected(vec![LabelError::NotAHashtag(
            "#c++ & friends".into()
        )]))
    );

    let node = graph.store().find_node("#rust").unwrap().unwrap();
    assert_eq!(node.weight, 1);
    assert_eq!(graph.store().list_edges().unwrap().len(), 1);
}

// === Scenario: a stricter threshold keeps near-duplicates apart ===

#[test]
fn threshold_controls_merging() {
    let strict = TopicGraph::with_normalizer(
        Arc::new(MemoryStore::new()),
        LabelNormalizer::with_threshold(95),
    );
    strict.commit_pair("startups", "berlin").unwrap();
    strict.commit_pair("startup", "berlin").unwrap();

    assert!(strict.store().find_node("#startup").unwrap().is_some());
    assert_eq!(strict.store().list_edges().unwrap().len(), 2);
}

// === Scenario: data persists on disk ===

#[test]
fn commits_survive_reopen() {
    let temp = TempStore::new();
    let graph = temp.graph();
    graph.commit_pair("python", "databases").unwrap();
    graph.commit_pair("pentest", "databases").unwrap();
    graph.like_node("python").unwrap();
    drop(graph);

    let reopened = temp.reopen();
    assert_eq!(reopened.find_node("#python").unwrap().unwrap().weight, 2);
    assert_eq!(reopened.find_node("#databases").unwrap().unwrap().weight, 2);
    assert_eq!(reopened.edges_touching("#databases").unwrap().len(), 2);
}

#[test]
fn backup_and_export_capture_the_store() {
    let temp = TempStore::new();
    let graph = temp.graph();
    graph.commit_pair("career", "money").unwrap();

    let backup = temp.dir.path().join("backup.db");
    temp.store.backup_to(&backup).unwrap();
    let copy = SqliteStore::open(&backup).unwrap();
    assert_eq!(copy.list_nodes().unwrap(), graph.store().list_nodes().unwrap());

    let snapshot: StoreSnapshot = serde_json::from_str(&graph.export_json().unwrap()).unwrap();
    assert_eq!(snapshot.nodes.len(), 2);
    assert_eq!(snapshot.edges[0].source, "#career");
    assert_eq!(snapshot.edges[0].target, "#money");
}

// === Scenario: demo data ===

#[test]
fn demo_replaces_existing_data() {
    let graph = sqlite_graph();
    graph.commit_pair("scratch", "notes").unwrap();

    let outcome = graph.execute(Command::LoadDemo).unwrap();
    let CommandOutcome::DemoLoaded { committed } = outcome else {
        panic!("expected demo outcome, got {outcome:?}");
    };
    assert!(committed <= DEMO_PAIRS.len());

    let store = graph.store();
    assert!(store.find_node("#scratch").unwrap().is_none());
    assert!(store.find_node("#berlin").unwrap().is_some());
    assert!(store.find_node("#crypto").unwrap().is_some());

    // Mixed-case input in the demo set lands on canonical labels
    assert!(store.find_node("#digitaltransformation").unwrap().is_some());
    for label in store.labels().unwrap() {
        assert_eq!(label, label.to_lowercase());
        assert!(label.starts_with('#'));
    }
}

#[test]
fn demo_view_is_renderable() {
    let graph = memory_graph();
    graph.load_demo().unwrap();

    let view = graph.view().unwrap();
    assert!(!view.is_empty());
    for node in &view.nodes {
        assert!(node.size >= 100.0);
        assert_eq!(node.id, node.label);
    }
    for edge in &view.edges {
        assert!(edge.stroke_width >= 1);
        assert!(view.nodes.iter().any(|n| n.id == edge.source));
        assert!(view.nodes.iter().any(|n| n.id == edge.target));
    }

    let json = serde_json::to_value(&view).unwrap();
    assert!(json["edges"][0]["strokeWidth"].is_u64());
}

// === Scenario: JSON commands from a front-end ===

#[test]
fn json_commands_drive_the_graph() {
    let graph = memory_graph();
    let script = [
        r#"{"command":"create_pair","a":"crypto","b":"bitcoin"}"#,
        r#"{"command":"like_edge","source":"bitcoin","target":"crypto"}"#,
        r#"{"command":"like_node","label":"Crypto"}"#,
        r#"{"command":"delete_edge","source":"bitcoin","target":"crypto"}"#,
    ];
    for raw in script {
        let command: Command = serde_json::from_str(raw).unwrap();
        graph.execute(command).unwrap();
    }

    // Reversed-order delete leaves the edge in place
    let edge = graph.store().find_edge("#crypto", "#bitcoin").unwrap().unwrap();
    assert_eq!(edge.weight, 2);
    assert_eq!(graph.store().find_node("#crypto").unwrap().unwrap().weight, 2);

    let raw = r##"{"command":"delete_node","label":"#Bitcoin"}"##;
    let command: Command = serde_json::from_str(raw).unwrap();
    let outcome = graph.execute(command).unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::NodeDeleted {
            label: "#bitcoin".into(),
            removed: true,
        }
    );
    assert!(graph.store().list_edges().unwrap().is_empty());
}
