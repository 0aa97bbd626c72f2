use mbvst_core::io::read_instance;
use mbvst_core::{graph_stats, MbvstError};
use std::fs;
use tempfile::tempdir;

#[test]
fn reads_instance_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bowtie.txt");
    fs::write(&path, "5 6\n1 2\n2 3\n1 3\n1 4\n4 5\n1 5\n").unwrap();

    let graph = read_instance(&path).unwrap();
    let stats = graph_stats(&graph);
    assert_eq!(stats.vertex_count, 5);
    assert_eq!(stats.edge_count, 6);
    assert_eq!(stats.max_degree, 4);
    assert_eq!(stats.cyclomatic_number, 2);
    assert_eq!(graph.cycle_basis().len(), 2);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = read_instance(dir.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, MbvstError::Io(_)));
}
