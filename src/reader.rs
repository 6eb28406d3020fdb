//! Reader for the plain-text triangle mesh format.
//!
//! The file is laid out as
//!
//! ```text
//! <header line>
//! <number of nodes>
//! <column header line>
//! <number of elements>
//! <column header line>
//! <x> <y> <z>          one row per node, z and anything after it ignored
//! <separator line>
//! <n0> <n1> <n2>       one row per element, anything after n2 ignored
//! ```
//!
//! Header and separator lines are consumed whatever they hold. Blank lines
//! in front of a count or a row are skipped. Every value read is echoed to
//! the mirror as soon as it has been parsed.

use std::fmt::Display;
use std::collections::VecDeque;
use std::io::{BufRead, Lines, Write};
use std::str::FromStr;

use indicatif::ProgressBar;
use nalgebra::Vector2;
use slog::{debug, warn, Logger};

use crate::{
    config::IngestConfig,
    datatypes::{Element, Node},
    error::{IngestError, Section},
};

/// Upper bound on how many rows are reserved up front from a declared count
const RESERVE_LIMIT: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MeshParseState {
    Header,
    NodeCount,
    NodeHeader,
    ElementCount,
    ElementHeader,
    NodeRows,
    Separator,
    ElementRows,
    Trailer,
    Done,
}

/// Nodes and elements read from a single mesh file
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedMesh {
    pub nodes: Vec<Node>,
    pub elements: Vec<Element>,
}

impl ParsedMesh {
    /// Checks that every element only references existing nodes
    pub fn validate_connectivity(&self) -> Result<(), IngestError> {
        check_connectivity(&self.nodes, &self.elements)
    }
}

/// Checks every connectivity entry against the length of `nodes`
pub(crate) fn check_connectivity(nodes: &[Node], elements: &[Element]) -> Result<(), IngestError> {
    for element in elements {
        if let Some(&node) = element.connectivity().iter().find(|&&n| n >= nodes.len()) {
            return Err(IngestError::DanglingNode {
                element: element.index(),
                node,
                num_nodes: nodes.len(),
            });
        }
    }

    Ok(())
}

/// Line iterator that remembers the 1-based number of the last line read.
/// Lines taken out with `read_rest` can be handed back with `replay`.
struct LineSource<R> {
    lines: Lines<R>,
    line_no: usize,
    lines_read: usize,
    pending: VecDeque<(usize, String)>,
}

impl<R: BufRead> LineSource<R> {
    fn new(input: R) -> LineSource<R> {
        LineSource {
            lines: input.lines(),
            line_no: 0,
            lines_read: 0,
            pending: VecDeque::new(),
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, IngestError> {
        if let Some((line_no, line)) = self.pending.pop_front() {
            self.line_no = line_no;
            return Ok(Some(line));
        }

        match self.lines.next() {
            None => Ok(None),
            Some(Ok(line)) => {
                self.lines_read += 1;
                self.line_no = self.lines_read;
                Ok(Some(line))
            }
            Some(Err(err)) => Err(IngestError::io(
                format!("failed to read line {}", self.lines_read + 1),
                err,
            )),
        }
    }

    /// Drains every remaining line, tagged with its line number
    fn read_rest(&mut self) -> Result<Vec<(usize, String)>, IngestError> {
        let mut rest = Vec::new();
        while let Some(line) = self.next_line()? {
            rest.push((self.line_no, line));
        }
        Ok(rest)
    }

    /// Queues lines to be returned again, in order, before any unread input
    fn replay(&mut self, lines: Vec<(usize, String)>) {
        self.pending.extend(lines);
    }

    /// Reads the next line, failing on end of input
    fn expect_line(&mut self, what: &str) -> Result<String, IngestError> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(IngestError::format(
                self.line_no + 1,
                format!("unexpected end of input, expected {what}"),
            )),
        }
    }

    /// Reads the next non-blank line, failing on end of input
    fn expect_data_line(&mut self, what: &str) -> Result<String, IngestError> {
        loop {
            let line = self.expect_line(what)?;
            if !line.trim().is_empty() {
                return Ok(line);
            }
        }
    }
}

/// Parses a declared row count. Counts are real-valued tokens and must hold
/// a non-negative whole number.
fn parse_count(line: &str, line_no: usize, what: &str) -> Result<usize, IngestError> {
    let token = match line.split_whitespace().next() {
        Some(t) => t,
        None => return Err(IngestError::format(line_no, format!("missing {what}"))),
    };

    let value: f64 = token
        .parse()
        .map_err(|_| IngestError::format(line_no, format!("non-numeric {what} '{token}'")))?;

    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= usize::MAX as f64 {
        return Err(IngestError::format(
            line_no,
            format!("{what} '{token}' is not a non-negative whole number"),
        ));
    }

    Ok(value as usize)
}

/// Parses the first three tokens of a row. Tokens after the third are ignored.
fn parse_row<T>(line: &str, line_no: usize, what: &str) -> Result<[T; 3], IngestError>
where
    T: FromStr + Default + Copy,
    T::Err: Display,
{
    let mut tokens = line.split_whitespace();
    let mut values = [T::default(); 3];

    for (i, slot) in values.iter_mut().enumerate() {
        let token = match tokens.next() {
            Some(t) => t,
            None => {
                return Err(IngestError::format(
                    line_no,
                    format!("{what} row has {i} of 3 values"),
                ))
            }
        };

        *slot = token.parse().map_err(|err| {
            IngestError::format(line_no, format!("invalid {what} value '{token}': {err}"))
        })?;
    }

    Ok(values)
}

fn is_node_row(line: &str) -> bool {
    parse_row::<f64>(line, 0, "node").is_ok()
}

fn is_element_row(line: &str) -> bool {
    parse_row::<usize>(line, 0, "element").is_ok()
}

/// Finds the separator line in the lines that follow the declared node rows.
///
/// The separator is normally the first of them. When that line is numeric,
/// it is taken for a surplus node row only if a non-numeric line appears
/// further down and element rows follow it; that line is then the separator.
/// Otherwise the numeric line is the separator itself.
///
/// # Returns
/// The position of the separator in `tail` and the number of surplus node
/// rows in front of it
fn locate_separator(tail: &[(usize, String)]) -> (usize, usize) {
    match tail.first() {
        Some((_, first)) if is_node_row(first) => {}
        _ => return (0, 0),
    }

    let text = tail
        .iter()
        .position(|(_, line)| !line.trim().is_empty() && !is_node_row(line));

    if let Some(t) = text {
        if tail[t + 1..].iter().any(|(_, line)| is_element_row(line)) {
            let surplus = tail[..t].iter().filter(|(_, line)| is_node_row(line)).count();
            return (t, surplus);
        }
    }

    (0, 0)
}

fn echo<W: Write>(mirror: &mut W, args: std::fmt::Arguments) -> Result<(), IngestError> {
    mirror
        .write_fmt(args)
        .map_err(|err| IngestError::io("failed to write mirror", err))
}

fn progress_bar(config: &IngestConfig, rows: usize) -> ProgressBar {
    if config.show_progress {
        ProgressBar::new(rows as u64)
    } else {
        ProgressBar::hidden()
    }
}

/// Reads a mesh and writes the mirror transcript
///
/// # Arguments
/// * `input` - The mesh text
/// * `mirror` - Receives the transcript of every value parsed
/// * `config` - Ingestion options
/// * `logger` - Logger for diagnostics
///
/// # Returns
/// The parsed nodes and elements, in file order. On error, the mirror holds
/// the transcript up to the point of failure.
pub fn read_mesh<R: BufRead, W: Write>(
    input: R,
    mirror: &mut W,
    config: &IngestConfig,
    logger: &Logger,
) -> Result<ParsedMesh, IngestError> {
    let mut source = LineSource::new(input);
    let mut mesh = ParsedMesh::default();

    let mut num_nodes: usize = 0;
    let mut num_elements: usize = 0;
    let mut bar = ProgressBar::hidden();

    let mut parser_state = MeshParseState::Header;

    loop {
        parser_state = match parser_state {
            MeshParseState::Header => {
                source.expect_line("header line")?;
                MeshParseState::NodeCount
            }
            MeshParseState::NodeCount => {
                let line = source.expect_data_line("node count")?;
                num_nodes = parse_count(&line, source.line_no, "node count")?;
                debug!(logger, "declared node count"; "count" => num_nodes, "line" => source.line_no);

                mesh.nodes = Vec::with_capacity(num_nodes.min(RESERVE_LIMIT));
                echo(mirror, format_args!("Number of nodes\n{num_nodes}\n"))?;
                MeshParseState::NodeHeader
            }
            MeshParseState::NodeHeader => {
                source.expect_line("node column header")?;
                MeshParseState::ElementCount
            }
            MeshParseState::ElementCount => {
                let line = source.expect_data_line("element count")?;
                num_elements = parse_count(&line, source.line_no, "element count")?;
                debug!(logger, "declared element count"; "count" => num_elements, "line" => source.line_no);

                mesh.elements = Vec::with_capacity(num_elements.min(RESERVE_LIMIT));
                echo(mirror, format_args!("Number of elements\n{num_elements}\n"))?;
                MeshParseState::ElementHeader
            }
            MeshParseState::ElementHeader => {
                source.expect_line("element column header")?;
                bar = progress_bar(config, num_nodes.saturating_add(num_elements));
                echo(mirror, format_args!("Nodes Coordinates\n"))?;
                MeshParseState::NodeRows
            }
            MeshParseState::NodeRows => {
                while mesh.nodes.len() < num_nodes {
                    let line = source.expect_data_line("node row")?;
                    let [x, y, z] = parse_row::<f64>(&line, source.line_no, "node")?;
                    echo(mirror, format_args!("{x} {y} {z}\n"))?;

                    mesh.nodes.push(Node::new(mesh.nodes.len(), Vector2::new(x, y)));
                    bar.inc(1);
                }
                MeshParseState::Separator
            }
            MeshParseState::Separator => {
                let mut tail = source.read_rest()?;

                if tail.is_empty() {
                    // a file without elements may end right after its nodes
                    if num_elements != 0 {
                        return Err(IngestError::format(
                            source.line_no + 1,
                            "unexpected end of input, expected separator line",
                        ));
                    }
                } else {
                    let (separator, surplus) = locate_separator(&tail);
                    if surplus > 0 {
                        if config.strict_counts {
                            return Err(IngestError::InconsistentCount {
                                section: Section::Nodes,
                                declared: num_nodes,
                                found: num_nodes.saturating_add(surplus),
                            });
                        }
                        warn!(logger, "ignoring rows past the declared node count";
                            "declared" => num_nodes, "surplus" => surplus,
                            "separator_line" => tail[separator].0);
                    }
                    source.replay(tail.split_off(separator + 1));
                }

                echo(mirror, format_args!("Element Conectivity\n"))?;
                MeshParseState::ElementRows
            }
            MeshParseState::ElementRows => {
                while mesh.elements.len() < num_elements {
                    let line = source.expect_data_line("element row")?;
                    let [n0, n1, n2] = parse_row::<usize>(&line, source.line_no, "element")?;
                    echo(mirror, format_args!("{n0} {n1} {n2}\n"))?;

                    mesh.elements
                        .push(Element::new(mesh.elements.len(), [n0, n1, n2]));
                    bar.inc(1);
                }
                MeshParseState::Trailer
            }
            MeshParseState::Trailer => {
                let mut surplus: usize = 0;
                while let Some(line) = source.next_line()? {
                    if parse_row::<usize>(&line, source.line_no, "element").is_ok() {
                        surplus += 1;
                    }
                }

                if surplus > 0 {
                    if config.strict_counts {
                        return Err(IngestError::InconsistentCount {
                            section: Section::Elements,
                            declared: num_elements,
                            found: num_elements.saturating_add(surplus),
                        });
                    }
                    warn!(logger, "ignoring rows past the declared element count";
                        "declared" => num_elements, "surplus" => surplus);
                }
                MeshParseState::Done
            }
            MeshParseState::Done => break,
        };
    }

    bar.finish_and_clear();

    if config.validate_connectivity {
        mesh.validate_connectivity()?;
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::discard_logger;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    const TRIANGLE: &str = "Triangle mesh
3
x y z
1
n0 n1 n2
0.0 0.0 0.0
1.0 0.0 0.0
0.0 1.0 0.0
connectivity
0 1 2
";

    fn read(text: &str, config: &IngestConfig) -> (Result<ParsedMesh, IngestError>, String) {
        let mut mirror: Vec<u8> = Vec::new();
        let result = read_mesh(Cursor::new(text), &mut mirror, config, &discard_logger());
        (result, String::from_utf8(mirror).unwrap())
    }

    #[test]
    fn test_read_single_triangle() {
        let (result, mirror) = read(TRIANGLE, &IngestConfig::default());
        let mesh = result.unwrap();

        assert_eq!(
            mesh.nodes,
            vec![
                Node::new(0, Vector2::new(0.0, 0.0)),
                Node::new(1, Vector2::new(1.0, 0.0)),
                Node::new(2, Vector2::new(0.0, 1.0)),
            ]
        );
        assert_eq!(mesh.elements, vec![Element::new(0, [0, 1, 2])]);
        assert_eq!(
            mirror,
            "Number of nodes\n3\nNumber of elements\n1\nNodes Coordinates\n\
             0 0 0\n1 0 0\n0 1 0\nElement Conectivity\n0 1 2\n"
        );
    }

    #[test]
    fn test_trailing_columns_are_ignored() {
        let text = "header
2 nodes
x y z ux uy
1
a b c
0.5 -1.25 9.0 1 0
2.0 3.0 0.0 fixed
--
1 0 1 material 3
";
        let (result, mirror) = read(text, &IngestConfig::default());
        let mesh = result.unwrap();

        assert_relative_eq!(mesh.nodes[0].initial_coordinate().x, 0.5);
        assert_relative_eq!(mesh.nodes[0].initial_coordinate().y, -1.25);
        assert_eq!(mesh.elements[0].connectivity(), [1, 0, 1]);
        assert!(mirror.contains("\n0.5 -1.25 9\n2 3 0\n"));
    }

    #[test]
    fn test_zero_counts() {
        let text = "header\n0\nnodes\n0\nelements\nseparator\n";
        let (result, mirror) = read(text, &IngestConfig::default());
        let mesh = result.unwrap();

        assert!(mesh.nodes.is_empty());
        assert!(mesh.elements.is_empty());
        assert_eq!(
            mirror,
            "Number of nodes\n0\nNumber of elements\n0\nNodes Coordinates\nElement Conectivity\n"
        );
    }

    #[test]
    fn test_missing_separator_without_elements() {
        let text = "header\n1\nnodes\n0\nelements\n4 5 6\n";
        let (result, _) = read(text, &IngestConfig::default());
        let mesh = result.unwrap();

        assert_eq!(mesh.nodes.len(), 1);
        assert!(mesh.elements.is_empty());
    }

    #[test]
    fn test_real_valued_counts() {
        let text = "header\n1.0\nnodes\n0e0\nelements\n4 5 6\n--\n";
        let (result, mirror) = read(text, &IngestConfig::default());
        assert_eq!(result.unwrap().nodes.len(), 1);
        assert!(mirror.starts_with("Number of nodes\n1\nNumber of elements\n0\n"));
    }

    #[test]
    fn test_blank_lines_before_rows_are_skipped() {
        let text = "header\n\n3\nx y z\n1\nn0 n1 n2\n0 0 0\n\n1 0 0\n0 1 0\n--\n\n0 1 2\n";
        let (result, _) = read(text, &IngestConfig::default());
        let mesh = result.unwrap();

        assert_eq!(mesh.nodes.len(), 3);
        assert_eq!(mesh.elements.len(), 1);
    }

    #[test]
    fn test_fractional_count_is_rejected() {
        let text = "header\n2.5\nnodes\n";
        let (result, _) = read(text, &IngestConfig::default());
        assert!(matches!(result, Err(IngestError::Format { line: 2, .. })));
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let text = "header\n3\nnodes\n-1\nelements\n";
        let (result, mirror) = read(text, &IngestConfig::default());
        assert!(matches!(result, Err(IngestError::Format { line: 4, .. })));
        assert_eq!(mirror, "Number of nodes\n3\n");
    }

    #[test]
    fn test_bad_coordinate_reports_line() {
        let text = TRIANGLE.replace("1.0 0.0 0.0", "1.0 abc 0.0");
        let (result, mirror) = read(&text, &IngestConfig::default());

        match result {
            Err(IngestError::Format { line, message }) => {
                assert_eq!(line, 7);
                assert!(message.contains("'abc'"));
            }
            other => panic!("expected format error, got {:?}", other),
        }
        assert!(mirror.ends_with("Nodes Coordinates\n0 0 0\n"));
    }

    #[test]
    fn test_short_row_is_rejected() {
        let text = TRIANGLE.replace("0 1 2", "0 1");
        let (result, _) = read(&text, &IngestConfig::default());
        assert!(matches!(result, Err(IngestError::Format { line: 10, .. })));
    }

    #[test]
    fn test_negative_connectivity_is_rejected() {
        let text = TRIANGLE.replace("0 1 2", "0 -1 2");
        let (result, _) = read(&text, &IngestConfig::default());
        assert!(matches!(result, Err(IngestError::Format { .. })));
    }

    #[test]
    fn test_premature_end_of_input() {
        let text = "header\n3\nx y z\n1\nn0 n1 n2\n0 0 0\n1 0 0\n";
        let (result, _) = read(text, &IngestConfig::default());

        match result {
            Err(IngestError::Format { line, message }) => {
                assert_eq!(line, 8);
                assert!(message.contains("end of input"));
            }
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_surplus_node_row_in_strict_mode() {
        let text = TRIANGLE.replacen("3\n", "2\n", 1);
        let (result, _) = read(&text, &IngestConfig::default());

        assert!(matches!(
            result,
            Err(IngestError::InconsistentCount {
                section: Section::Nodes,
                declared: 2,
                found: 3,
            })
        ));
    }

    #[test]
    fn test_surplus_element_rows() {
        let text = format!("{TRIANGLE}1 2 0\n0 2 1\nend of file\n");

        let (result, _) = read(&text, &IngestConfig::default());
        assert!(matches!(
            result,
            Err(IngestError::InconsistentCount {
                section: Section::Elements,
                declared: 1,
                found: 3,
            })
        ));

        let lenient = IngestConfig {
            strict_counts: false,
            ..IngestConfig::default()
        };
        let (result, _) = read(&text, &lenient);
        assert_eq!(result.unwrap().elements.len(), 1);
    }

    #[test]
    fn test_huge_counts_fail_on_missing_rows() {
        let (result, mirror) = read("h\n1e19\nx\n1e19\ny\n", &IngestConfig::default());

        assert!(matches!(result, Err(IngestError::Format { line: 6, .. })));
        assert!(mirror.ends_with("Nodes Coordinates\n"));
    }

    #[test]
    fn test_count_past_usize_range_is_rejected() {
        let (result, _) = read("h\n18446744073709551616\nx\n", &IngestConfig::default());
        assert!(matches!(result, Err(IngestError::Format { line: 2, .. })));
    }

    #[test]
    fn test_numeric_separator() {
        let text = "h\n1\nx\n1\ny\n0 0 0\n1 2 3\n0 0 0\n";
        let (result, mirror) = read(text, &IngestConfig::default());
        let mesh = result.unwrap();

        assert_eq!(mesh.nodes.len(), 1);
        assert_eq!(mesh.elements, vec![Element::new(0, [0, 0, 0])]);
        assert!(mirror.ends_with("Element Conectivity\n0 0 0\n"));
    }

    const EXTRA_NODES: &str = "h
1
x y z
1
n0 n1 n2
0 0 0
1 0 0
0.5 1 0
conn
0 1 2
";

    #[test]
    fn test_every_surplus_node_row_is_counted() {
        let (result, _) = read(EXTRA_NODES, &IngestConfig::default());

        assert!(matches!(
            result,
            Err(IngestError::InconsistentCount {
                section: Section::Nodes,
                declared: 1,
                found: 3,
            })
        ));
    }

    #[test]
    fn test_surplus_node_rows_skipped_when_lenient() {
        let lenient = IngestConfig {
            strict_counts: false,
            ..IngestConfig::default()
        };
        let (result, mirror) = read(EXTRA_NODES, &lenient);
        let mesh = result.unwrap();

        assert_eq!(mesh.nodes, vec![Node::new(0, Vector2::new(0.0, 0.0))]);
        assert_eq!(mesh.elements, vec![Element::new(0, [0, 1, 2])]);
        assert_eq!(
            mirror,
            "Number of nodes\n1\nNumber of elements\n1\nNodes Coordinates\n\
             0 0 0\nElement Conectivity\n0 1 2\n"
        );
    }

    #[test]
    fn test_element_errors_keep_file_line_numbers() {
        let text = EXTRA_NODES.replace("0 1 2", "0 x 2");
        let lenient = IngestConfig {
            strict_counts: false,
            ..IngestConfig::default()
        };
        let (result, _) = read(&text, &lenient);

        // without an element row after "conn", line 7 is the separator and
        // "0.5 1 0" on line 8 is read as the element row
        assert!(matches!(result, Err(IngestError::Format { line: 8, .. })));
    }

    #[test]
    fn test_trailing_text_is_not_surplus() {
        let text = format!("{TRIANGLE}\nEND\n");
        let (result, _) = read(&text, &IngestConfig::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_connectivity_validation() {
        let text = TRIANGLE.replace("0 1 2", "0 1 3");

        let (result, _) = read(&text, &IngestConfig::default());
        assert!(result.is_ok());

        let validating = IngestConfig {
            validate_connectivity: true,
            ..IngestConfig::default()
        };
        let (result, _) = read(&text, &validating);
        assert!(matches!(
            result,
            Err(IngestError::DanglingNode {
                element: 0,
                node: 3,
                num_nodes: 3,
            })
        ));
    }

    #[test]
    fn test_mirror_is_deterministic() {
        let (first, mirror_a) = read(TRIANGLE, &IngestConfig::default());
        let (second, mirror_b) = read(TRIANGLE, &IngestConfig::default());

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(mirror_a, mirror_b);
    }
}
