use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use slog::{error, info, Level, Logger};

use crate::{
    config::IngestConfig,
    datatypes::{Element, Node},
    dump,
    error::IngestError,
    logger::terminal_logger,
    reader::{self, ParsedMesh},
};

/// Owns the nodes and elements of one mesh.
///
/// Nodes and elements are kept in file order, so `nodes()[i].index() == i`.
/// A failed ingestion leaves the previous contents untouched.
pub struct MeshStore {
    nodes: Vec<Node>,
    elements: Vec<Element>,
    config: IngestConfig,
    logger: Logger,
}

impl Default for MeshStore {
    fn default() -> Self {
        MeshStore::new()
    }
}

impl MeshStore {
    /// Creates an empty store that logs to stderr
    pub fn new() -> MeshStore {
        MeshStore::with_logger(terminal_logger(Level::Info))
    }

    pub fn with_logger(logger: Logger) -> MeshStore {
        MeshStore {
            nodes: Vec::new(),
            elements: Vec::new(),
            config: IngestConfig::default(),
            logger,
        }
    }

    pub fn with_config(mut self, config: IngestConfig) -> MeshStore {
        self.config = config;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Reads a mesh file, replacing the current nodes and elements
    ///
    /// # Arguments
    /// * `input_file` - The path to the mesh file
    /// * `mirror_file` - The path of the transcript to write. Created or
    ///     truncated.
    pub fn ingest<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input_file: P,
        mirror_file: Q,
    ) -> Result<(), IngestError> {
        let input_file = input_file.as_ref();
        let mirror_file = mirror_file.as_ref();

        info!(self.logger, "reading input data";
            "input" => input_file.display().to_string(),
            "mirror" => mirror_file.display().to_string());

        let input = match File::open(input_file) {
            Ok(f) => f,
            Err(err) => {
                return Err(IngestError::io(
                    format!("unable to open mesh file {}", input_file.display()),
                    err,
                ))
            }
        };
        let mirror = match File::create(mirror_file) {
            Ok(f) => f,
            Err(err) => {
                return Err(IngestError::io(
                    format!("unable to create mirror file {}", mirror_file.display()),
                    err,
                ))
            }
        };

        self.ingest_from(BufReader::new(input), BufWriter::new(mirror))
    }

    /// Same as [`MeshStore::ingest`], over already opened streams
    pub fn ingest_from<R: BufRead, W: Write>(
        &mut self,
        input: R,
        mut mirror: W,
    ) -> Result<(), IngestError> {
        let parsed = reader::read_mesh(input, &mut mirror, &self.config, &self.logger);

        // flush whatever was mirrored, even when parsing failed
        let flushed = mirror
            .flush()
            .map_err(|err| IngestError::io("failed to flush mirror", err));

        let ParsedMesh { nodes, elements } = match parsed.and_then(|mesh| flushed.map(|_| mesh)) {
            Ok(mesh) => mesh,
            Err(err) => {
                error!(self.logger, "ingestion failed"; "error" => err.to_string());
                return Err(err);
            }
        };

        self.nodes = nodes;
        self.elements = elements;

        info!(
            self.logger,
            "loaded {} nodes and {} elements",
            self.nodes.len(),
            self.elements.len()
        );

        Ok(())
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn node(&self, i: usize) -> Option<&Node> {
        self.nodes.get(i)
    }

    pub fn element(&self, i: usize) -> Option<&Element> {
        self.elements.get(i)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.elements.clear();
    }

    /// Checks that every element only references nodes held by the store
    pub fn validate_connectivity(&self) -> Result<(), IngestError> {
        reader::check_connectivity(&self.nodes, &self.elements)
    }

    /// Prints every node with its coordinate to stdout
    pub fn print_nodes(&self) {
        let stdout = std::io::stdout();
        let _ = dump::write_nodes(&self.nodes, &mut stdout.lock());
    }

    /// Prints the connectivity of every element to stdout
    pub fn print_connectivity(&self) {
        let stdout = std::io::stdout();
        let _ = dump::write_connectivity(&self.elements, &mut stdout.lock());
    }

    /// Writes nodes and elements to two csv files
    pub fn write_csv(&self, nodes_output: &str, elements_output: &str) -> Result<(), IngestError> {
        dump::csv_output(&self.nodes, &self.elements, nodes_output, elements_output)?;

        info!(self.logger, "wrote output to {} and {}", nodes_output, elements_output);

        Ok(())
    }
}
