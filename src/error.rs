use std::fmt::Display;

use thiserror::Error;

/// Block of the mesh file a count belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Nodes,
    Elements,
}

impl Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Section::Nodes => "node",
            Section::Elements => "element",
        };

        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    /// Opening, reading, writing or flushing one of the streams failed.
    #[error("IO error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The input does not follow the mesh file grammar.
    #[error("Format error on line {line}: {message}")]
    Format { line: usize, message: String },

    /// More rows were found than the header declared.
    #[error("Count error: {section} section declares {declared} rows, found {found}")]
    InconsistentCount {
        section: Section,
        declared: usize,
        found: usize,
    },

    #[error("Connectivity error: element {element} references node {node}, mesh has {num_nodes} nodes")]
    DanglingNode {
        element: usize,
        node: usize,
        num_nodes: usize,
    },

    #[error("Config error: {0}")]
    Config(String),
}

impl IngestError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        IngestError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn format(line: usize, message: impl Into<String>) -> Self {
        IngestError::Format {
            line,
            message: message.into(),
        }
    }
}
