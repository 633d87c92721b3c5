//! Stateful line reader
//!
//! Walks a G-code program line by line and keeps the machine state the
//! leveller needs: the sticky X/Y/Z position and the modal codes seen so far.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::Units;
use crate::error::{LevelError, Result};
use crate::geometry::{Point3, Rect};
use crate::parser::lexer::{self, Word};

/// Motion codes treated as straight-line traversal.
const LINEAR_MOTION_CODES: [&str; 4] = ["G0", "G00", "G1", "G01"];

/// How a raw line was terminated in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
    /// Last line of a file without a trailing newline
    None,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::None => "",
        }
    }
}

/// A line exactly as read, without its terminator
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    /// 1-based line number
    pub number: u64,
    pub text: String,
    pub ending: LineEnding,
}

/// Tracked X/Y/Z; an axis stays `None` until a line first sets it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl Position {
    /// The full point, once every axis has been assigned.
    pub fn point(&self) -> Option<Point3> {
        Some(Point3::new(self.x?, self.y?, self.z?))
    }

    /// All axes known and Z below the work surface.
    pub fn is_cutting(&self) -> bool {
        self.point().is_some_and(|p| p.z < 0.0)
    }
}

/// Machine state as of the last consumed line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParserState {
    pub position: Position,
    /// Code token (`G1`, `M3`, ...) to the line it was last seen on
    pub modal_history: HashMap<String, u64>,
    /// Most recent G code
    pub active_motion: Option<String>,
    pub line_number: u64,
}

impl ParserState {
    /// Fold one line's words into the state.
    fn apply(&mut self, words: &[Word], source_name: &str) -> Result<()> {
        self.line_number += 1;

        for word in words {
            match word.letter {
                'M' => {
                    self.modal_history.insert(word.code(), self.line_number);
                }
                'G' => {
                    let code = word.code();
                    self.modal_history.insert(code.clone(), self.line_number);
                    self.active_motion = Some(code);
                }
                _ => {}
            }
        }

        let x = self.axis_value(words, 'X', source_name)?;
        let y = self.axis_value(words, 'Y', source_name)?;
        let z = self.axis_value(words, 'Z', source_name)?;
        if x.is_some() {
            self.position.x = x;
        }
        if y.is_some() {
            self.position.y = y;
        }
        if z.is_some() {
            self.position.z = z;
        }

        Ok(())
    }

    fn axis_value(&self, words: &[Word], letter: char, source_name: &str) -> Result<Option<f64>> {
        let Some(word) = lexer::first_word(words, letter) else {
            return Ok(None);
        };
        word.value()
            .map(Some)
            .map_err(|_| LevelError::MalformedNumber {
                source_name: source_name.to_string(),
                line: self.line_number,
                text: word.code(),
            })
    }

    /// Line on which `code` was last seen.
    pub fn modal_line(&self, code: &str) -> Option<u64> {
        self.modal_history.get(&code.to_ascii_uppercase()).copied()
    }

    /// Whether the active motion is a rapid or linear move rather than an arc.
    pub fn is_linear_motion(&self) -> bool {
        self.active_motion
            .as_deref()
            .is_some_and(|code| LINEAR_MOTION_CODES.contains(&code))
    }

    /// Unit system declared by the program so far.
    pub fn units(&self) -> Option<Units> {
        if self.modal_history.contains_key("G21") {
            Some(Units::Millimeters)
        } else if self.modal_history.contains_key("G20") {
            Some(Units::Inches)
        } else {
            None
        }
    }
}

/// Forward-only reader over a G-code program with one line of lookahead
pub struct ProgramStateReader<R: BufRead> {
    source: R,
    source_name: String,
    state: ParserState,
    peeked: Option<Option<(String, LineEnding)>>,
    buffer: String,
}

impl ProgramStateReader<BufReader<File>> {
    /// Open a program file for one pass.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LevelError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)
            .map_err(|e| LevelError::io(format!("opening {}", path.display()), e))?;
        let source_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(BufReader::new(file), source_name))
    }
}

impl<R: BufRead> ProgramStateReader<R> {
    pub fn new(source: R, source_name: impl Into<String>) -> Self {
        Self {
            source,
            source_name: source_name.into(),
            state: ParserState::default(),
            peeked: None,
            buffer: String::new(),
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    pub fn current_position(&self) -> Position {
        self.state.position
    }

    pub fn is_linear_motion(&self) -> bool {
        self.state.is_linear_motion()
    }

    pub fn units(&self) -> Option<Units> {
        self.state.units()
    }

    /// Consume the next line and update the state from it.
    pub fn next_line(&mut self) -> Result<Option<RawLine>> {
        let next = match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.read_physical_line()?,
        };
        let Some((text, ending)) = next else {
            return Ok(None);
        };

        let words = lexer::scan_words(&text);
        self.state.apply(&words, &self.source_name)?;

        Ok(Some(RawLine {
            number: self.state.line_number,
            text,
            ending,
        }))
    }

    /// The next line's text without consuming it or touching the state.
    pub fn peek(&mut self) -> Result<Option<&str>> {
        if self.peeked.is_none() {
            let line = self.read_physical_line()?;
            self.peeked = Some(line);
        }
        Ok(self
            .peeked
            .as_ref()
            .and_then(|line| line.as_ref())
            .map(|(text, _)| text.as_str()))
    }

    /// Release the underlying source.
    pub fn close(self) {}

    /// Run the rest of the program and return the XY bounds of every
    /// cutting move (all axes known, Z < 0). `None` if nothing cuts.
    pub fn machining_area(mut self) -> Result<Option<Rect>> {
        let mut area: Option<Rect> = None;
        while self.next_line()?.is_some() {
            let Some(point) = self.state.position.point() else {
                continue;
            };
            if point.z >= 0.0 {
                continue;
            }
            match area.as_mut() {
                Some(rect) => rect.add(point.x, point.y),
                None => area = Some(Rect::at(point.x, point.y)),
            }
        }

        log::debug!(
            "{}: scanned {} lines, machining area {:?}",
            self.source_name,
            self.state.line_number,
            area
        );
        Ok(area)
    }

    fn read_physical_line(&mut self) -> Result<Option<(String, LineEnding)>> {
        self.buffer.clear();
        let read = self
            .source
            .read_line(&mut self.buffer)
            .map_err(|e| {
                LevelError::io(
                    format!(
                        "reading {} after line {}",
                        self.source_name, self.state.line_number
                    ),
                    e,
                )
            })?;
        if read == 0 {
            return Ok(None);
        }

        let (text, ending) = if let Some(text) = self.buffer.strip_suffix("\r\n") {
            (text, LineEnding::CrLf)
        } else if let Some(text) = self.buffer.strip_suffix('\n') {
            (text, LineEnding::Lf)
        } else {
            (self.buffer.as_str(), LineEnding::None)
        };

        Ok(Some((text.to_string(), ending)))
    }
}
