use std::io::{BufWriter, Write};

use crate::{
    datatypes::{Element, Node},
    error::IngestError,
};

/// Writes every node with its index and coordinate, under a
/// `Printing nodes` banner. Nothing is written for an empty slice.
///
/// # Arguments
/// * `nodes` - The nodes to print, in order
/// * `out` - The destination
pub fn write_nodes<W: Write>(nodes: &[Node], out: &mut W) -> std::io::Result<()> {
    if nodes.is_empty() {
        return Ok(());
    }

    writeln!(out, "Printing nodes")?;
    for node in nodes {
        let coordinate = node.initial_coordinate();
        writeln!(out, "Node {}", node.index())?;
        writeln!(out, "Coordinate {} {}", coordinate.x, coordinate.y)?;
    }

    Ok(())
}

/// Writes every element with its index and connectivity, under a
/// `Printing conectivity` banner. Nothing is written for an empty slice.
///
/// # Arguments
/// * `elements` - The elements to print, in order
/// * `out` - The destination
pub fn write_connectivity<W: Write>(elements: &[Element], out: &mut W) -> std::io::Result<()> {
    if elements.is_empty() {
        return Ok(());
    }

    writeln!(out, "Printing conectivity")?;
    for element in elements {
        let [n0, n1, n2] = element.connectivity();
        writeln!(out, "Element {}", element.index())?;
        writeln!(out, "Conectivity {n0} {n1} {n2}")?;
    }

    Ok(())
}

/// Writes the mesh to two CSV files
///
/// # Arguments
/// * `nodes` - A reference to the vector of nodes
/// * `elements` - A reference to the vector of elements
/// * `nodes_output` - The filename of the output nodes csv
/// * `elements_output` - The filename of the output elements csv
pub fn csv_output(
    nodes: &[Node],
    elements: &[Element],
    nodes_output: &str,
    elements_output: &str,
) -> Result<(), IngestError> {
    let nodes_file = match std::fs::File::create(nodes_output) {
        Ok(f) => f,
        Err(err) => {
            return Err(IngestError::io(
                format!("failed to create {nodes_output}"),
                err,
            ))
        }
    };
    let elements_file = match std::fs::File::create(elements_output) {
        Ok(f) => f,
        Err(err) => {
            return Err(IngestError::io(
                format!("failed to create {elements_output}"),
                err,
            ))
        }
    };

    write_nodes_csv(nodes, BufWriter::new(nodes_file))
        .map_err(|err| IngestError::io(format!("failed to write {nodes_output}"), err))?;
    write_elements_csv(elements, BufWriter::new(elements_file))
        .map_err(|err| IngestError::io(format!("failed to write {elements_output}"), err))?;

    Ok(())
}

fn write_nodes_csv<W: Write>(nodes: &[Node], mut out: W) -> std::io::Result<()> {
    writeln!(out, "index,x,y")?;
    for node in nodes {
        let coordinate = node.initial_coordinate();
        writeln!(out, "{},{},{}", node.index(), coordinate.x, coordinate.y)?;
    }
    out.flush()
}

fn write_elements_csv<W: Write>(elements: &[Element], mut out: W) -> std::io::Result<()> {
    writeln!(out, "index,n0,n1,n2")?;
    for element in elements {
        let [n0, n1, n2] = element.connectivity();
        writeln!(out, "{},{n0},{n1},{n2}", element.index())?;
    }
    out.flush()
}
