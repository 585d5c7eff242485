//! Reader for the legacy STAP90 free-format input deck.
//!
//! A deck is turned into a [`Deck`]: typed control, node and load records plus raw
//! [`Record`]s for material and element data. The layout of those two depends on the
//! element type of the group, so they are interpreted downstream by the element and
//! material variants.

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

/// Number of physical freedoms carried by every node record.
pub const NODE_FREEDOMS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deck {
    pub title: String,
    pub control: Control,
    pub nodes: Vec<NodeRecord>,
    pub load_cases: Vec<LoadCaseRecord>,
    pub element_groups: Vec<ElementGroupRecord>,
    /// Time step and Rayleigh damping coefficients, present only for dynamic runs.
    pub dynamics: Option<DynamicsRecord>,
    pub history: Vec<HistoryRecord>,
}

/// The `NUMNP NUMEG NLCASE MODEX` control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Control {
    pub num_nodes: usize,
    pub num_groups: usize,
    pub num_load_cases: usize,
    pub mode: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub line: usize,
    pub id: usize,
    /// Boundary code per freedom: `true` when the freedom is fixed.
    pub fixed: [bool; NODE_FREEDOMS],
    pub coords: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadCaseRecord {
    pub line: usize,
    pub id: usize,
    pub loads: Vec<LoadRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadRecord {
    pub line: usize,
    pub node: usize,
    /// 1-based freedom direction.
    pub dof: usize,
    pub magnitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementGroupRecord {
    pub line: usize,
    pub element_type: u32,
    pub materials: Vec<Record>,
    pub elements: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DynamicsRecord {
    pub line: usize,
    pub time_step: f64,
    pub alpha: f64,
    pub beta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    pub line: usize,
    pub node: usize,
    pub dof: usize,
}

/// One whitespace-tokenised data line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

impl Record {
    pub fn new(line: usize, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    /// Tokenise a raw line.
    pub fn from_line(line: usize, raw: &str) -> Self {
        Self::new(line, raw.split_whitespace().map(str::to_string).collect())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse field `index`, naming it `name` in the error.
    pub fn field<T: FromStr>(&self, index: usize, name: &str) -> Result<T, ParseError> {
        let raw = self.fields.get(index).ok_or_else(|| {
            ParseError::new(self.line, format!("missing field {} ({name})", index + 1))
        })?;
        raw.parse::<T>()
            .map_err(|_| ParseError::new(self.line, format!("invalid {name}: '{raw}'")))
    }

    /// Like [`Record::field`] but absent trailing fields yield `None`.
    pub fn optional_field<T: FromStr>(
        &self,
        index: usize,
        name: &str,
    ) -> Result<Option<T>, ParseError> {
        if index >= self.fields.len() {
            return Ok(None);
        }
        self.field(index, name).map(Some)
    }

    /// Fail unless the record has between `min` and `max` fields.
    pub fn expect_len(&self, min: usize, max: usize, what: &str) -> Result<(), ParseError> {
        let n = self.fields.len();
        if n < min || n > max {
            let expected = if min == max {
                format!("{min}")
            } else {
                format!("{min} to {max}")
            };
            return Err(ParseError::new(
                self.line,
                format!("{what} record needs {expected} fields, found {n}"),
            ));
        }
        Ok(())
    }
}

impl Deck {
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ParseError {
            line: 0,
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::parse_str(&raw)
    }

    pub fn parse_str(raw: &str) -> Result<Self, ParseError> {
        let mut lines = raw.lines();
        let title = lines
            .next()
            .map(|l| l.trim().to_string())
            .ok_or_else(|| ParseError::new(1, "empty deck: missing title line"))?;

        let mut cursor = Cursor::new(lines);

        let control = parse_control(&cursor.next_record("control")?)?;

        let mut nodes = Vec::with_capacity(reserve(control.num_nodes));
        for _ in 0..control.num_nodes {
            nodes.push(parse_node(&cursor.next_record("nodal point")?)?);
        }

        let mut load_cases = Vec::with_capacity(reserve(control.num_load_cases));
        for _ in 0..control.num_load_cases {
            let header = cursor.next_record("load case")?;
            header.expect_len(2, 2, "load case")?;
            let id = header.field::<usize>(0, "load case number")?;
            let count = header.field::<usize>(1, "number of loads")?;
            let mut loads = Vec::with_capacity(reserve(count));
            for _ in 0..count {
                loads.push(parse_load(&cursor.next_record("concentrated load")?)?);
            }
            load_cases.push(LoadCaseRecord {
                line: header.line,
                id,
                loads,
            });
        }

        let mut element_groups = Vec::with_capacity(reserve(control.num_groups));
        for _ in 0..control.num_groups {
            let header = cursor.next_record("element group")?;
            header.expect_len(3, 3, "element group")?;
            let element_type = header.field::<u32>(0, "element type")?;
            let num_elements = header.field::<usize>(1, "number of elements")?;
            let num_materials = header.field::<usize>(2, "number of material sets")?;

            let mut materials = Vec::with_capacity(reserve(num_materials));
            for _ in 0..num_materials {
                materials.push(cursor.next_record("material set")?);
            }
            let mut elements = Vec::with_capacity(reserve(num_elements));
            for _ in 0..num_elements {
                elements.push(cursor.next_record("element")?);
            }
            element_groups.push(ElementGroupRecord {
                line: header.line,
                element_type,
                materials,
                elements,
            });
        }

        let dynamics = if control.mode == 3 {
            Some(parse_dynamics(&cursor.next_record("dynamics parameter")?)?)
        } else {
            None
        };

        let history = match cursor.try_next() {
            Some(record) => parse_history(&record)?,
            None => Vec::new(),
        };

        if let Some(extra) = cursor.try_next() {
            return Err(ParseError::new(extra.line, "unexpected data after end of deck"));
        }

        Ok(Deck {
            title,
            control,
            nodes,
            load_cases,
            element_groups,
            dynamics,
            history,
        })
    }

    /// Total number of element records over all groups.
    pub fn num_elements(&self) -> usize {
        self.element_groups.iter().map(|g| g.elements.len()).sum()
    }
}

/// Iterates data records, skipping blank lines and `#` comments.
struct Cursor<I> {
    lines: I,
    // The title occupies line 1.
    line_no: usize,
}

impl<'a, I: Iterator<Item = &'a str>> Cursor<I> {
    fn new(lines: I) -> Self {
        Self { lines, line_no: 1 }
    }

    fn try_next(&mut self) -> Option<Record> {
        for raw in self.lines.by_ref() {
            self.line_no += 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || is_comment(trimmed) {
                continue;
            }
            return Some(Record::from_line(self.line_no, trimmed));
        }
        None
    }

    fn next_record(&mut self, what: &str) -> Result<Record, ParseError> {
        self.try_next().ok_or_else(|| {
            ParseError::new(
                self.line_no + 1,
                format!("unexpected end of deck: expected {what} record"),
            )
        })
    }
}

/// Counts come from the deck, so preallocation is capped; a short deck then fails
/// with a missing-record error instead of an allocation failure.
const MAX_RESERVE: usize = 4096;

fn reserve(count: usize) -> usize {
    count.min(MAX_RESERVE)
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#')
}

fn parse_control(record: &Record) -> Result<Control, ParseError> {
    record.expect_len(4, 4, "control")?;
    let mode = record.field::<u32>(3, "solution mode")?;
    if mode > 3 {
        return Err(ParseError::new(
            record.line,
            format!("solution mode must be 0..=3, found {mode}"),
        ));
    }
    Ok(Control {
        num_nodes: record.field(0, "number of nodal points")?,
        num_groups: record.field(1, "number of element groups")?,
        num_load_cases: record.field(2, "number of load cases")?,
        mode,
    })
}

fn parse_node(record: &Record) -> Result<NodeRecord, ParseError> {
    record.expect_len(7, 7, "nodal point")?;
    let id = record.field::<usize>(0, "node number")?;

    let mut fixed = [false; NODE_FREEDOMS];
    for (dof, flag) in fixed.iter_mut().enumerate() {
        *flag = match record.field::<u8>(1 + dof, "boundary code")? {
            0 => false,
            1 => true,
            other => {
                return Err(ParseError::new(
                    record.line,
                    format!("boundary code must be 0 or 1, found {other}"),
                ));
            }
        };
    }

    let coords = [
        record.field::<f64>(4, "x coordinate")?,
        record.field::<f64>(5, "y coordinate")?,
        record.field::<f64>(6, "z coordinate")?,
    ];

    Ok(NodeRecord {
        line: record.line,
        id,
        fixed,
        coords,
    })
}

fn parse_load(record: &Record) -> Result<LoadRecord, ParseError> {
    record.expect_len(3, 3, "concentrated load")?;
    Ok(LoadRecord {
        line: record.line,
        node: record.field(0, "node number")?,
        dof: record.field(1, "load direction")?,
        magnitude: record.field(2, "load magnitude")?,
    })
}

fn parse_dynamics(record: &Record) -> Result<DynamicsRecord, ParseError> {
    record.expect_len(3, 3, "dynamics parameter")?;
    Ok(DynamicsRecord {
        line: record.line,
        time_step: record.field(0, "time step")?,
        alpha: record.field(1, "mass damping coefficient")?,
        beta: record.field(2, "stiffness damping coefficient")?,
    })
}

fn parse_history(record: &Record) -> Result<Vec<HistoryRecord>, ParseError> {
    let count = record.field::<usize>(0, "number of history freedoms")?;
    let fields = count
        .checked_mul(2)
        .and_then(|n| n.checked_add(1))
        .ok_or_else(|| {
            ParseError::new(record.line, format!("history freedom count {count} is too large"))
        })?;
    record.expect_len(fields, fields, "history output")?;
    (0..count)
        .map(|i| {
            Ok(HistoryRecord {
                line: record.line,
                node: record.field(1 + 2 * i, "history node")?,
                dof: record.field(2 + 2 * i, "history direction")?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_BARS: &str = "\
Two bar truss
3 1 1 1
1 1 1 1 0.0 0.0 0.0
2 0 1 1 1.0 0.0 0.0
3 1 1 1 2.0 0.0 0.0
1 1
2 1 10.0
1 2 1
1 1.0 1.0
1 1 2 1
2 2 3 1
";

    #[test]
    fn parses_controls_nodes_and_groups() {
        let deck = Deck::parse_str(TWO_BARS).expect("parser should succeed");
        assert_eq!(deck.title, "Two bar truss");
        assert_eq!(deck.control.num_nodes, 3);
        assert_eq!(deck.control.mode, 1);
        assert_eq!(deck.nodes.len(), 3);
        assert_eq!(deck.nodes[1].fixed, [false, true, true]);
        assert_eq!(deck.nodes[2].coords, [2.0, 0.0, 0.0]);
        assert_eq!(deck.load_cases[0].loads[0].magnitude, 10.0);
        assert_eq!(deck.element_groups[0].element_type, 1);
        assert_eq!(deck.element_groups[0].materials.len(), 1);
        assert_eq!(deck.num_elements(), 2);
        assert!(deck.dynamics.is_none());
        assert!(deck.history.is_empty());
    }

    #[test]
    fn records_keep_source_line_numbers() {
        let deck = Deck::parse_str(TWO_BARS).expect("parser should succeed");
        let group = &deck.element_groups[0];
        assert_eq!(group.line, 8);
        assert_eq!(group.materials[0].line, 9);
        assert_eq!(group.elements[1].line, 11);
        assert_eq!(group.elements[1].fields, vec!["2", "2", "3", "1"]);
    }

    #[test]
    fn skips_blank_lines_and_comments() {
        let src = "\
Title
# controls
1 0 0 1

1 1 1 1 0 0 0
";
        let deck = Deck::parse_str(src).expect("parser should succeed");
        assert_eq!(deck.nodes.len(), 1);
        assert_eq!(deck.nodes[0].line, 5);
    }

    #[test]
    fn reads_dynamics_and_history_lines() {
        let src = "\
Dynamic bar
2 0 0 3
1 1 1 1 0 0 0
2 0 1 1 1 0 0
0.01 0.1 0.02
2 2 1 1 1
";
        let deck = Deck::parse_str(src).expect("parser should succeed");
        let dynamics = deck.dynamics.expect("dynamic deck carries parameters");
        assert_eq!(dynamics.time_step, 0.01);
        assert_eq!(dynamics.beta, 0.02);
        assert_eq!(deck.history.len(), 2);
        assert_eq!((deck.history[0].node, deck.history[0].dof), (2, 1));
        assert_eq!((deck.history[1].node, deck.history[1].dof), (1, 1));
    }

    #[test]
    fn rejects_truncated_node_block() {
        let src = "Title\n2 0 0 1\n1 0 0 0 0 0 0\n";
        let err = Deck::parse_str(src).expect_err("should fail");
        assert!(err.message.contains("nodal point"));
        assert_eq!(err.line, 4);
    }

    #[test]
    fn rejects_bad_boundary_code() {
        let src = "Title\n1 0 0 1\n1 2 0 0 0 0 0\n";
        let err = Deck::parse_str(src).expect_err("should fail");
        assert_eq!(err.line, 3);
        assert!(err.message.contains("boundary code"));
    }

    #[test]
    fn rejects_non_numeric_field() {
        let src = "Title\n1 0 0 1\n1 0 0 0 abc 0 0\n";
        let err = Deck::parse_str(src).expect_err("should fail");
        assert!(err.message.contains("x coordinate"));
    }

    #[test]
    fn rejects_unknown_solution_mode() {
        let err = Deck::parse_str("Title\n1 0 0 7\n").expect_err("should fail");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn rejects_trailing_data() {
        let src = "Title\n1 0 0 1\n1 0 0 0 0 0 0\n0\n1 2 3\n";
        let err = Deck::parse_str(src).expect_err("should fail");
        assert_eq!(err.line, 5);
    }

    #[test]
    fn huge_node_count_is_a_missing_record_error() {
        let err = Deck::parse_str("T\n18446744073709551615 0 0 1\n").expect_err("should fail");
        assert_eq!(err.line, 3);
        assert!(err.message.contains("nodal point"));
    }

    #[test]
    fn huge_load_count_is_a_missing_record_error() {
        let src = "T\n1 0 1 1\n1 1 1 1 0 0 0\n1 18446744073709551615\n";
        let err = Deck::parse_str(src).expect_err("should fail");
        assert!(err.message.contains("concentrated load"));
    }

    #[test]
    fn huge_history_count_is_rejected() {
        let src = "T\n1 0 0 1\n1 1 1 1 0 0 0\n9223372036854775808 1 1\n";
        let err = Deck::parse_str(src).expect_err("should fail");
        assert_eq!(err.line, 4);
        assert!(err.message.contains("too large"));

        let src = "T\n1 0 0 1\n1 1 1 1 0 0 0\n4611686018427387904 1 1\n";
        let err = Deck::parse_str(src).expect_err("should fail");
        assert!(err.message.contains("history output"));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(Deck::parse_str("").is_err());
    }

    #[test]
    fn optional_fields_are_none_when_absent() {
        let record = Record::from_line(3, "1 2.5");
        assert_eq!(record.optional_field::<f64>(1, "value").unwrap(), Some(2.5));
        assert_eq!(record.optional_field::<f64>(2, "value").unwrap(), None);
        assert!(record.optional_field::<f64>(0, "value").is_ok());
    }

    #[test]
    fn deck_serializes_to_json() {
        let deck = Deck::parse_str(TWO_BARS).expect("parser should succeed");
        let json = serde_json::to_value(&deck).expect("deck is serializable");
        assert_eq!(json["control"]["num_nodes"], 3);
        assert_eq!(json["element_groups"][0]["elements"][0]["fields"][1], "1");
    }
}
