/// Parser for the line-oriented View3D vertex/surface input format
///
/// Every line is one record, dispatched on its first character
/// (case-insensitive) through [`RECORD_TABLE`]. Fields after the code letter
/// are separated by whitespace or `=`.
use std::fs;
use std::path::Path;

use log::{debug, warn};
use nom::{
    bytes::complete::{take_till1, take_while},
    character::complete::i64 as integer,
    combinator::all_consuming,
    multi::many0,
    number::complete::double,
    sequence::{preceded, terminated},
    IResult,
};

use crate::error::{ModelError, ParseError};
use crate::model::{ControlBlock, InputModel, InputModelBuilder, Surface, SurfaceKind, Vertex};

/// Fourth-vertex value that marks a surface as a triangle
pub const TRIANGLE_SENTINEL: u32 = 0;

/// A non-fatal problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
}

/// A parsed model together with the warnings raised while reading it
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub model: InputModel,
    pub diagnostics: Vec<Diagnostic>,
}

type RecordParser = fn(&mut InputModelBuilder, &str) -> Result<(), RecordError>;

/// What to do with a line once its record code is known
#[derive(Clone, Copy)]
enum Action {
    Parse(RecordParser),
    Comment,
    Terminate,
}

struct RecordSpec {
    code: char,
    name: &'static str,
    action: Action,
}

static RECORD_TABLE: &[RecordSpec] = &[
    RecordSpec { code: '/', name: "comment", action: Action::Comment },
    RecordSpec { code: '!', name: "comment", action: Action::Comment },
    RecordSpec { code: 'T', name: "title", action: Action::Parse(parse_title) },
    RecordSpec { code: 'C', name: "control", action: Action::Parse(parse_control) },
    RecordSpec { code: 'F', name: "format", action: Action::Parse(parse_format) },
    RecordSpec { code: 'G', name: "format", action: Action::Parse(parse_format) },
    RecordSpec { code: 'V', name: "vertex", action: Action::Parse(parse_vertex) },
    RecordSpec { code: 'S', name: "surface", action: Action::Parse(parse_radiating) },
    RecordSpec { code: 'M', name: "mask surface", action: Action::Parse(parse_mask) },
    RecordSpec { code: 'N', name: "null surface", action: Action::Parse(parse_null) },
    RecordSpec { code: 'O', name: "obstruction", action: Action::Parse(parse_obstruction) },
    RecordSpec { code: '*', name: "end", action: Action::Terminate },
    RecordSpec { code: 'E', name: "end", action: Action::Terminate },
];

fn lookup(code: char) -> Option<&'static RecordSpec> {
    let code = code.to_ascii_uppercase();
    RECORD_TABLE.iter().find(|spec| spec.code == code)
}

/// Failure of a single record, before the line number is attached
#[derive(Debug)]
enum RecordError {
    Model(ModelError),
    Malformed(String),
}

impl From<ModelError> for RecordError {
    fn from(err: ModelError) -> Self {
        RecordError::Model(err)
    }
}

/// Parse View3D input text into a model.
///
/// Warnings for unrecognized lines are logged and otherwise dropped; use
/// [`parse_input_with_diagnostics`] to collect them.
pub fn parse_input(text: &str) -> Result<InputModel, ParseError> {
    parse_input_with_diagnostics(text).map(|output| output.model)
}

/// Parse View3D input text, returning the model and every warning raised.
pub fn parse_input_with_diagnostics(text: &str) -> Result<ParseOutput, ParseError> {
    let mut builder = InputModel::builder();
    let mut diagnostics = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_start();
        let Some(code) = line.chars().next() else {
            continue;
        };

        let Some(spec) = lookup(code) else {
            warn!("line {}: unrecognized record '{}'", line_no, raw);
            diagnostics.push(Diagnostic {
                line: line_no,
                message: format!("unrecognized record: {}", raw.trim()),
            });
            continue;
        };

        match spec.action {
            Action::Comment => {}
            Action::Terminate => {
                debug!("line {}: end of data", line_no);
                break;
            }
            Action::Parse(parse) => {
                let fields = &line[code.len_utf8()..];
                parse(&mut builder, fields).map_err(|err| match err {
                    RecordError::Model(source) => ParseError::Model {
                        line: line_no,
                        source,
                    },
                    RecordError::Malformed(reason) => ParseError::MalformedRecord {
                        line: line_no,
                        record: spec.name,
                        reason,
                    },
                })?;
            }
        }
    }

    let model = builder.build();
    debug!(
        "parsed {} vertices and {} surfaces",
        model.vertex_count(),
        model.surfaces().len()
    );
    Ok(ParseOutput { model, diagnostics })
}

/// Read and parse a View3D input file
pub fn parse_file(path: impl AsRef<Path>) -> Result<InputModel, ParseError> {
    let text = fs::read_to_string(path)?;
    parse_input(&text)
}

fn parse_title(builder: &mut InputModelBuilder, fields: &str) -> Result<(), RecordError> {
    builder.title(fields.trim())?;
    Ok(())
}

fn parse_format(builder: &mut InputModelBuilder, fields: &str) -> Result<(), RecordError> {
    builder.format(fields.trim())?;
    Ok(())
}

fn parse_control(builder: &mut InputModelBuilder, fields: &str) -> Result<(), RecordError> {
    let tokens = tokens(fields);
    if tokens.len() % 2 != 0 {
        return Err(RecordError::Malformed(format!(
            "control word '{}' has no value",
            tokens[tokens.len() - 1]
        )));
    }
    let control: ControlBlock = tokens
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect();
    builder.control(control)?;
    Ok(())
}

fn parse_vertex(builder: &mut InputModelBuilder, fields: &str) -> Result<(), RecordError> {
    let tokens = expect_tokens(fields, 4)?;
    let key = key_field(tokens[0], "vertex index")?;
    let x = float_field(tokens[1], "x")?;
    let y = float_field(tokens[2], "y")?;
    let z = float_field(tokens[3], "z")?;
    builder.vertex(Vertex::new(key, x, y, z))?;
    Ok(())
}

fn parse_radiating(builder: &mut InputModelBuilder, fields: &str) -> Result<(), RecordError> {
    parse_surface(builder, fields, SurfaceKind::Radiating)
}

fn parse_mask(builder: &mut InputModelBuilder, fields: &str) -> Result<(), RecordError> {
    parse_surface(builder, fields, SurfaceKind::Mask)
}

fn parse_null(builder: &mut InputModelBuilder, fields: &str) -> Result<(), RecordError> {
    parse_surface(builder, fields, SurfaceKind::Null)
}

fn parse_surface(
    builder: &mut InputModelBuilder,
    fields: &str,
    kind: SurfaceKind,
) -> Result<(), RecordError> {
    let tokens = expect_tokens(fields, 9)?;
    let (key, [v1, v2, v3], v4) = surface_vertices(&tokens)?;
    let base = reference_field(tokens[5], "base surface")?;
    let combine = reference_field(tokens[6], "combine surface")?;
    let emissivity = float_field(tokens[7], "emissivity")?;
    if !(0.0..=1.0).contains(&emissivity) {
        return Err(RecordError::Malformed(format!(
            "emissivity {} outside [0, 1]",
            emissivity
        )));
    }
    builder.surface(Surface {
        key,
        kind,
        v1,
        v2,
        v3,
        v4,
        base,
        combine,
        emissivity,
        name: tokens[8].to_string(),
    })?;
    Ok(())
}

fn parse_obstruction(builder: &mut InputModelBuilder, fields: &str) -> Result<(), RecordError> {
    let tokens = expect_tokens(fields, 5)?;
    let (key, [v1, v2, v3], v4) = surface_vertices(&tokens)?;
    builder.surface(Surface {
        key,
        kind: SurfaceKind::Obstruction,
        v1,
        v2,
        v3,
        v4,
        base: 0,
        combine: 0,
        emissivity: 0.0,
        name: String::new(),
    })?;
    Ok(())
}

/// Surface key, the three required vertices and the optional fourth
fn surface_vertices(tokens: &[&str]) -> Result<(u32, [u32; 3], Option<u32>), RecordError> {
    let key = key_field(tokens[0], "surface index")?;
    let v1 = key_field(tokens[1], "first vertex")?;
    let v2 = key_field(tokens[2], "second vertex")?;
    let v3 = key_field(tokens[3], "third vertex")?;
    let v4 = match reference_field(tokens[4], "fourth vertex")? {
        TRIANGLE_SENTINEL => None,
        v => Some(v),
    };
    Ok((key, [v1, v2, v3], v4))
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == '='
}

fn token_list(input: &str) -> IResult<&str, Vec<&str>> {
    preceded(
        take_while(is_delimiter),
        many0(terminated(take_till1(is_delimiter), take_while(is_delimiter))),
    )(input)
}

/// Split a record's fields on whitespace and `=`
fn tokens(fields: &str) -> Vec<&str> {
    token_list(fields).map(|(_, t)| t).unwrap_or_default()
}

fn expect_tokens(fields: &str, count: usize) -> Result<Vec<&str>, RecordError> {
    let tokens = tokens(fields);
    if tokens.len() != count {
        return Err(RecordError::Malformed(format!(
            "expected {} fields, found {}",
            count,
            tokens.len()
        )));
    }
    Ok(tokens)
}

fn integer_token(token: &str) -> IResult<&str, i64> {
    all_consuming(integer)(token)
}

fn float_token(token: &str) -> IResult<&str, f64> {
    all_consuming(double)(token)
}

/// A reference that may be 0 ("none")
fn reference_field(token: &str, what: &str) -> Result<u32, RecordError> {
    integer_token(token)
        .ok()
        .and_then(|(_, v)| u32::try_from(v).ok())
        .ok_or_else(|| RecordError::Malformed(format!("bad {} '{}'", what, token)))
}

/// A strictly positive index
fn key_field(token: &str, what: &str) -> Result<u32, RecordError> {
    match reference_field(token, what)? {
        0 => Err(RecordError::Malformed(format!("{} must be positive", what))),
        v => Ok(v),
    }
}

fn float_field(token: &str, what: &str) -> Result<f64, RecordError> {
    float_token(token)
        .ok()
        .map(|(_, v)| v)
        .filter(|v| v.is_finite())
        .ok_or_else(|| RecordError::Malformed(format!("bad {} '{}'", what, token)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Field, IndexKind};
    use approx::assert_relative_eq;

    #[test]
    fn test_tokens_split_on_whitespace_and_equals() {
        assert_eq!(tokens("  eps=1e-4 encl = 1\t"), vec!["eps", "1e-4", "encl", "1"]);
        assert!(tokens("   ").is_empty());
    }

    #[test]
    fn test_title_and_format_are_trimmed() {
        let model = parse_input("T   A box  \nf 3a\n").unwrap();
        assert_eq!(model.title(), Some("A box"));
        assert_eq!(model.format(), Some("3a"));
    }

    #[test]
    fn test_control_record_is_ordered() {
        let model = parse_input("C encl=1 eps 0.001 list=2").unwrap();
        let control = model.control().unwrap();
        let entries: Vec<(&str, &str)> = control.iter().collect();
        assert_eq!(entries, vec![("encl", "1"), ("eps", "0.001"), ("list", "2")]);
    }

    #[test]
    fn test_control_with_odd_tokens_is_malformed() {
        let err = parse_input("T x\nC encl 1 eps").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedRecord { line: 2, record: "control", .. }
        ));
    }

    #[test]
    fn test_second_control_record_fails() {
        let err = parse_input("C a 1\nC b 2").unwrap_err();
        assert!(matches!(
            err.model_error(),
            Some(ModelError::AlreadySet(Field::Control))
        ));
    }

    #[test]
    fn test_repeated_control_word_keeps_last_value() {
        let model = parse_input("C eps 1e-3 encl 1 eps 1e-4").unwrap();
        let control = model.control().unwrap();
        assert_eq!(control.len(), 2);
        assert_eq!(control.get("eps"), Some("1e-4"));
        let entries: Vec<(&str, &str)> = control.iter().collect();
        assert_eq!(entries, vec![("eps", "1e-4"), ("encl", "1")]);
    }

    #[test]
    fn test_second_title_record_fails() {
        let err = parse_input("T first\nV 1 0 0 0\nT second").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Model {
                line: 3,
                source: ModelError::AlreadySet(Field::Title)
            }
        ));
    }

    #[test]
    fn test_format_alias_and_repeat() {
        let model = parse_input("G 2").unwrap();
        assert_eq!(model.format(), Some("2"));

        let err = parse_input("F 3\nG 3a").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Model {
                line: 2,
                source: ModelError::AlreadySet(Field::Format)
            }
        ));
    }

    #[test]
    fn test_vertex_record() {
        let model = parse_input("v 12 1.5 -2 3e2").unwrap();
        let vertex = model.vertex(12).unwrap();
        assert_relative_eq!(vertex.position.x, 1.5);
        assert_relative_eq!(vertex.position.y, -2.0);
        assert_relative_eq!(vertex.position.z, 300.0);
    }

    #[test]
    fn test_vertex_with_missing_coordinate_is_malformed() {
        let err = parse_input("V 1 0.0 1.0").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRecord { line: 1, record: "vertex", .. }));
    }

    #[test]
    fn test_vertex_with_bad_number_is_malformed() {
        assert!(parse_input("V 1 0.0 abc 1.0").is_err());
        assert!(parse_input("V 1 0.0 nan 1.0").is_err());
        assert!(parse_input("V 1.5 0.0 0.0 1.0").is_err());
        assert!(parse_input("V 0 0.0 0.0 1.0").is_err());
    }

    #[test]
    fn test_surface_sentinel_marks_triangle() {
        let model = parse_input("S 1 1 2 3 0 0 0 0.5 tri\nS 2 1 2 3 4 1 0 1 quad").unwrap();
        let tri = model.surface(1).unwrap();
        assert_eq!(tri.v4, None);
        assert!(!tri.is_quad());
        let quad = model.surface(2).unwrap();
        assert_eq!(quad.v4, Some(4));
        assert_eq!(quad.base, 1);
        assert_relative_eq!(quad.emissivity, 1.0);
        assert_eq!(quad.name, "quad");
    }

    #[test]
    fn test_surface_emissivity_out_of_range() {
        let err = parse_input("S 1 1 2 3 0 0 0 1.5 hot").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRecord { record: "surface", .. }));
    }

    #[test]
    fn test_surface_negative_emissivity() {
        let err = parse_input("V 1 0 0 0\nS 1 1 2 3 0 0 0 -0.1 cold").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedRecord { line: 2, record: "surface", .. }
        ));
    }

    #[test]
    fn test_surface_wrong_field_count() {
        assert!(parse_input("S 1 1 2 3 0 0 0 0.5").is_err());
        assert!(parse_input("S 1 1 2 3 0 0 0 0.5 two words").is_err());
    }

    #[test]
    fn test_duplicate_surface_index() {
        let err = parse_input("S 4 1 2 3 0 0 0 0.5 a\nS 4 1 2 3 0 0 0 0.5 b").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Model {
                line: 2,
                source: ModelError::DuplicateIndex {
                    kind: IndexKind::Surface,
                    index: 4
                }
            }
        ));
    }

    #[test]
    fn test_surface_record_kinds() {
        let input = "S 1 1 2 3 0 0 0 0.5 a\nO 2 1 2 3 4\nm 3 1 2 3 0 0 0 0.1 mask\nN 4 1 2 3 0 0 0 0 none";
        let model = parse_input(input).unwrap();
        let kinds: Vec<SurfaceKind> = model.surfaces().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SurfaceKind::Radiating,
                SurfaceKind::Obstruction,
                SurfaceKind::Mask,
                SurfaceKind::Null
            ]
        );
        let obstruction = model.surface(2).unwrap();
        assert_eq!(obstruction.v4, Some(4));
        assert!(obstruction.name.is_empty());
    }

    #[test]
    fn test_comments_and_unknown_lines() {
        let input = "/ comment\n! another\nX 1 2 3\n\nV 1 0 0 0\n";
        let output = parse_input_with_diagnostics(input).unwrap();
        assert_eq!(output.model.vertex_count(), 1);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].line, 3);
    }

    #[test]
    fn test_terminator_stops_parsing() {
        let model = parse_input("V 1 0 0 0\n*\nV 1 0 0 0\ngarbage").unwrap();
        assert_eq!(model.vertex_count(), 1);
        let model = parse_input("V 1 0 0 0\ne\nV 2 0 0 0").unwrap();
        assert_eq!(model.vertex_count(), 1);
    }

    #[test]
    fn test_missing_terminator_returns_model() {
        let model = parse_input("T open ended\r\nV 1 0 0 0\r\nV 2 1 0 0").unwrap();
        assert_eq!(model.title(), Some("open ended"));
        assert_eq!(model.vertex_count(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("v3d-missing-input-does-not-exist.vs3");
        let err = parse_file(&path).unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
        assert_eq!(err.line(), None);
    }

    #[test]
    fn test_parser_does_not_resolve_vertices() {
        let model = parse_input("S 1 10 20 30 40 0 0 0.5 floating").unwrap();
        assert_eq!(model.surfaces().len(), 1);
        assert!(model.validate().is_err());
    }
}
