//! Text rendering of an assembled dataset.
//!
//! Templates are plain text with `${key}` placeholders. A line holding only
//! `#days` opens a block that is repeated once per daily row, closed by a line
//! holding only `#end`. Inside the block, keys resolve against the row.

use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::climate::assemble::ReportDataset;
use crate::climate::daily::DayRow;
use crate::config::LetterCase;

pub const UPPER_CASE_TEMPLATE: &str = "f6_report.tmpl";
pub const MIXED_CASE_TEMPLATE: &str = "f6_report_mixed_case.tmpl";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),
    #[error("template parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("template invocation failed: {0}")]
    Invocation(String),
}

/// Turns an assembled dataset into report text.
pub trait Renderer: Send + Sync {
    fn render(&self, dataset: &ReportDataset, case: LetterCase) -> Result<String, TemplateError>;
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Text(String),
    Key(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Line(Vec<Piece>),
    Days(Vec<Vec<Piece>>),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

fn parse_line(text: &str, line: usize) -> Result<Vec<Piece>, TemplateError> {
    let mut pieces = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("${") {
        if open > 0 {
            pieces.push(Piece::Text(rest[..open].to_string()));
        }
        let after = &rest[open + 2..];
        let close = after.find('}').ok_or_else(|| TemplateError::Parse {
            line,
            message: "unterminated placeholder".to_string(),
        })?;
        let key = &after[..close];
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(TemplateError::Parse {
                line,
                message: format!("invalid placeholder '${{{key}}}'"),
            });
        }
        pieces.push(Piece::Key(key.to_string()));
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Text(rest.to_string()));
    }
    Ok(pieces)
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut block: Option<(usize, Vec<Vec<Piece>>)> = None;

        for (idx, text) in source.split_inclusive('\n').enumerate() {
            let line = idx + 1;
            match text.trim() {
                "#days" => {
                    if block.is_some() {
                        return Err(TemplateError::Parse {
                            line,
                            message: "nested #days block".to_string(),
                        });
                    }
                    block = Some((line, Vec::new()));
                }
                "#end" => match block.take() {
                    Some((_, lines)) => segments.push(Segment::Days(lines)),
                    None => {
                        return Err(TemplateError::Parse {
                            line,
                            message: "#end without #days".to_string(),
                        });
                    }
                },
                _ => {
                    let pieces = parse_line(text, line)?;
                    match block.as_mut() {
                        Some((_, lines)) => lines.push(pieces),
                        None => segments.push(Segment::Line(pieces)),
                    }
                }
            }
        }

        if let Some((line, _)) = block {
            return Err(TemplateError::Parse {
                line,
                message: "unclosed #days block".to_string(),
            });
        }
        Ok(Self { segments })
    }

    pub fn render(&self, dataset: &ReportDataset) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Line(pieces) => {
                    write_pieces(&mut out, pieces, |key| dataset.get(key))?;
                }
                Segment::Days(lines) => {
                    for row in &dataset.days {
                        for pieces in lines {
                            write_pieces(&mut out, pieces, |key| row_value(row, dataset, key))?;
                        }
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Row fields shadow dataset values inside a `#days` block.
fn row_value<'a>(row: &'a DayRow, dataset: &'a ReportDataset, key: &str) -> Option<&'a str> {
    row.field(key).or_else(|| dataset.get(key))
}

fn write_pieces<'a>(
    out: &mut String,
    pieces: &[Piece],
    lookup: impl Fn(&str) -> Option<&'a str>,
) -> Result<(), TemplateError> {
    for piece in pieces {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Key(key) => {
                let value = lookup(key)
                    .ok_or_else(|| TemplateError::Invocation(format!("unknown key '{key}'")))?;
                out.push_str(value);
            }
        }
    }
    Ok(())
}

/// Renders with the template files found in a directory.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    dir: PathBuf,
}

impl TemplateRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn load(&self, case: LetterCase) -> Result<Template, TemplateError> {
        let name = match case {
            LetterCase::Upper => UPPER_CASE_TEMPLATE,
            LetterCase::Mixed => MIXED_CASE_TEMPLATE,
        };
        let path = self.dir.join(name);
        debug!(path = %path.display(), "Loading template");
        let source = std::fs::read_to_string(&path)
            .map_err(|e| TemplateError::NotFound(format!("{}: {}", path.display(), e)))?;
        Template::parse(&source)
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, dataset: &ReportDataset, case: LetterCase) -> Result<String, TemplateError> {
        self.load(case)?.render(dataset)
    }
}
