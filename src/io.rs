use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use sprs::io::{read_matrix_market, IoError};
use sprs::TriMat;
use crate::assignment::PartitionReport;
use crate::graph::Graph;
use crate::topology::{NodeId, Topology};

// Reads the coordinate entries of a `pattern` matrix market file, every entry
// with weight 1. Symmetric files get both directions.
fn read_matrix_market_pattern(file_path: &Path) -> Result<(usize, Vec<(usize, usize, f64)>), IoError> {
    let mut lines = BufReader::new(File::open(file_path).map_err(IoError::Io)?).lines();

    let header = lines.next().ok_or(IoError::BadMatrixMarketFile)?.map_err(IoError::Io)?;
    let fields: Vec<&str> = header.split_whitespace().collect();
    let symmetric = match fields[..] {
        [_, "matrix", "coordinate", "pattern", "symmetric"] => true,
        [_, "matrix", "coordinate", "pattern", "general"] => false,
        ["%%MatrixMarket", ..] => return Err(IoError::UnsupportedMatrixMarketFormat),
        _ => return Err(IoError::BadMatrixMarketFile),
    };

    let mut num_vertices = None;
    let mut entries = Vec::new();
    for line in lines {
        let line = line.map_err(IoError::Io)?;
        let line = line.trim_start();
        if line.starts_with('%') || line.is_empty() {
            continue;
        }

        let mut values = line.split_whitespace().map(str::parse::<usize>);
        let (Some(Ok(first)), Some(Ok(second))) = (values.next(), values.next()) else {
            return Err(IoError::BadMatrixMarketFile);
        };

        // The first non-comment line is the size line.
        if num_vertices.is_none() {
            num_vertices = Some(first.max(second));
            continue;
        }

        let (Some(row), Some(col)) = (first.checked_sub(1), second.checked_sub(1)) else {
            return Err(IoError::BadMatrixMarketFile);
        };
        entries.push((row, col, 1.0));
        if symmetric && row != col {
            entries.push((col, row, 1.0));
        }
    }

    let num_vertices = num_vertices.ok_or(IoError::BadMatrixMarketFile)?;
    if entries.iter().any(|&(row, col, _)| row >= num_vertices || col >= num_vertices) {
        return Err(IoError::BadMatrixMarketFile);
    }
    Ok((num_vertices, entries))
}

// Reads the entries of a matrix market file whatever its data type: real and
// integer files through sprs, pattern files with unit weights.
fn read_matrix_market_entries(file_path: &Path) -> Result<(usize, Vec<(usize, usize, f64)>), IoError> {
    match read_matrix_market::<f64, usize, _>(file_path) {
        Ok(tri_matrix) => Ok((
            tri_matrix.rows().max(tri_matrix.cols()),
            tri_matrix.triplet_iter().map(|(&weight, (row, col))| (row, col, weight)).collect(),
        )),
        Err(IoError::MismatchedMatrixMarketRead(..) | IoError::UnsupportedMatrixMarketFormat) => {
            match read_matrix_market::<i64, usize, _>(file_path) {
                Ok(tri_matrix) => Ok((
                    tri_matrix.rows().max(tri_matrix.cols()),
                    tri_matrix.triplet_iter().map(|(&weight, (row, col))| (row, col, weight as f64)).collect(),
                )),
                Err(IoError::MismatchedMatrixMarketRead(..) | IoError::UnsupportedMatrixMarketFormat) => {
                    read_matrix_market_pattern(file_path)
                }
                Err(e) => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

/// Read a matrix market file and output Graph struct.
///
/// Real, integer and pattern files are accepted; pattern entries get weight 1.
/// The matrix must be symmetric. Diagonal entries are dropped.
pub fn read_matrix_market_as_graph(file_path: &Path) -> Result<Graph, IoError> {
    let (num_vertices, entries) = read_matrix_market_entries(file_path)?;

    let mut triplet_matrix = TriMat::with_capacity((num_vertices, num_vertices), entries.len());
    for (row, col, edge_weight) in entries {
        if row != col {
            triplet_matrix.add_triplet(row, col, edge_weight.max(0.0));
        }
    }

    Ok(Graph {
        graph_csr: triplet_matrix.to_csr(),
    })
}

/// Read a JSON topology document.
pub fn read_topology(file_path: &Path) -> Result<Topology, serde_json::Error> {
    let file = File::open(file_path).map_err(serde_json::Error::io)?;
    serde_json::from_reader(BufReader::new(file))
}

/// Write a partition report as pretty printed JSON.
pub fn write_report(report: &PartitionReport, file_path: &Path) -> Result<(), serde_json::Error> {
    let file = File::create(file_path).map_err(serde_json::Error::io)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush().map_err(serde_json::Error::io)
}

/// Write the partition array to a file, one `node <id> => partition <p>` line per node.
pub fn write_partition_data_to_file(node_ids: &[NodeId], partition: &[usize], file_name: &str) -> std::io::Result<()> {
    let mut file = BufWriter::new(File::create(file_name)?);
    for (node_id, part) in node_ids.iter().zip(partition) {
        writeln!(file, "node {} => partition {}", node_id, part)?;
    }
    file.flush()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs::{read_to_string, File};
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;
    use crate::assignment::{PartSummary, PartitionReport};
    use crate::io::{read_matrix_market_as_graph, read_topology, write_partition_data_to_file, write_report};
    use crate::topology::NodeKind;

    fn create_mock_file(dir: &Path, filename: &str, content: &str) -> String {
        let file_path = dir.join(filename);
        let mut file = File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_read_matrix_market_for_integer() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let integer_content = "%%MatrixMarket matrix coordinate integer general\n%\n5 5 3\n1 1 1\n2 2 2\n5 5 5\n";
        let integer_matrix_file_path = create_mock_file(temp_dir.path(), "integer_matrix.mtx", integer_content);

        // Act
        let graph = read_matrix_market_as_graph(&Path::new(&integer_matrix_file_path)).unwrap();

        // Assert: only self-loops, which are dropped.
        assert_eq!(graph.graph_csr.rows(), 5);
        assert_eq!(graph.graph_csr.cols(), 5);
        assert_eq!(graph.graph_csr.nnz(), 0);

        Ok(())
    }

    #[test]
    fn test_read_matrix_market_symmetric() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let content = "%%MatrixMarket matrix coordinate real symmetric\n4 4 4\n2 1 1.5\n3 2 2.0\n4 3 0.5\n4 4 9.0\n";
        let file_path = create_mock_file(temp_dir.path(), "path.mtx", content);

        // Act
        let graph = read_matrix_market_as_graph(&Path::new(&file_path)).unwrap();

        // Assert
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.get_edge_weight(0, 1), Some(1.5));
        assert_eq!(graph.get_edge_weight(1, 0), Some(1.5));
        assert_eq!(graph.get_edge_weight(3, 2), Some(0.5));
        assert!(graph.get_edge_weight(3, 3).is_none());

        Ok(())
    }

    #[test]
    fn test_read_matrix_market_integer_weights() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let content = "%%MatrixMarket matrix coordinate integer symmetric\n3 3 2\n2 1 4\n3 2 7\n";
        let file_path = create_mock_file(temp_dir.path(), "weighted.mtx", content);

        // Act
        let graph = read_matrix_market_as_graph(&Path::new(&file_path)).unwrap();

        // Assert
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.get_edge_weight(0, 1), Some(4.0));
        assert_eq!(graph.get_edge_weight(2, 1), Some(7.0));

        Ok(())
    }

    #[test]
    fn test_read_matrix_market_pattern() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let content = "%%MatrixMarket matrix coordinate pattern symmetric\n% a path\n4 4 4\n2 1\n3 2\n4 3\n4 4\n";
        let file_path = create_mock_file(temp_dir.path(), "pattern.mtx", content);

        // Act
        let graph = read_matrix_market_as_graph(&Path::new(&file_path)).unwrap();

        // Assert
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.get_edge_weight(0, 1), Some(1.0));
        assert_eq!(graph.get_edge_weight(1, 0), Some(1.0));
        assert_eq!(graph.get_edge_weight(3, 2), Some(1.0));
        assert!(graph.get_edge_weight(3, 3).is_none());
        assert_eq!(graph.graph_csr.nnz(), 6);

        Ok(())
    }

    #[test]
    fn test_read_matrix_market_pattern_out_of_range() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let content = "%%MatrixMarket matrix coordinate pattern general\n2 2 1\n3 1\n";
        let file_path = create_mock_file(temp_dir.path(), "broken.mtx", content);

        // Act
        let result = read_matrix_market_as_graph(&Path::new(&file_path));

        // Assert
        assert!(result.is_err());

        Ok(())
    }

    #[test]
    fn test_read_topology() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let content = r#"{ "nodes": [ { "id": 4, "kind": "switch" }, { "id": 9, "weight": 3.0 } ], "links": [ { "a": 4, "b": 9, "bandwidth": 10 } ] }"#;
        let file_path = create_mock_file(temp_dir.path(), "topology.json", content);

        // Act
        let topology = read_topology(Path::new(&file_path)).unwrap();

        // Assert
        assert_eq!(topology.nodes.len(), 2);
        assert_eq!(topology.nodes[0].kind, NodeKind::Switch);
        assert_eq!(topology.nodes[1].weight(), 3.0);
        assert_eq!(topology.links[0].bandwidth, 10.0);

        Ok(())
    }

    #[test]
    fn test_read_topology_rejects_malformed_document() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let file_path = create_mock_file(temp_dir.path(), "broken.json", r#"{ "nodes": [ { "kind": "router" } ] }"#);

        // Act
        let result = read_topology(Path::new(&file_path));

        // Assert
        assert!(result.is_err());
        assert!(read_topology(&temp_dir.path().join("missing.json")).is_err());

        Ok(())
    }

    #[test]
    fn test_write_report() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let file_path = temp_dir.path().join("report.json");
        let report = PartitionReport {
            assignments: BTreeMap::from([(2, 1), (1, 0)]),
            parts: vec![
                PartSummary { part: 0, num_nodes: 1, weight: 1.0 },
                PartSummary { part: 1, num_nodes: 1, weight: 2.0 },
            ],
            boundary_links: Vec::new(),
            edge_cut: 0.5,
            imbalance: 1.0 / 3.0,
        };

        // Act
        write_report(&report, &file_path).unwrap();

        // Assert
        let written: serde_json::Value = serde_json::from_str(&read_to_string(&file_path)?).unwrap();
        assert_eq!(written["assignments"]["1"], 0);
        assert_eq!(written["assignments"]["2"], 1);
        assert_eq!(written["parts"][1]["weight"], 2.0);
        assert_eq!(written["edge_cut"], 0.5);
        assert!(written["boundary_links"].as_array().unwrap().is_empty());

        Ok(())
    }

    #[test]
    fn test_write_partition_data_to_file() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let file_path = temp_dir.path().join("partition.txt");

        // Act
        write_partition_data_to_file(&[7, 3], &[1, 0], file_path.to_str().unwrap())?;

        // Assert
        assert_eq!(read_to_string(&file_path)?, "node 7 => partition 1\nnode 3 => partition 0\n");

        Ok(())
    }
}
