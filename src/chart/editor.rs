use super::{parse_points, to_editor_text, ChartData, ChartKind, ChartParseError, ChartPoint};

#[derive(Debug, Clone, PartialEq)]
pub enum ParseStatus {
    Valid,
    Invalid(ChartParseError),
}

impl ParseStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ParseStatus::Valid)
    }
}

/// Raw JSON text box plus the last successfully parsed data.
///
/// The text is the source of truth: every edit re-parses it. A failed parse keeps
/// the previous points and records the error in [`ParseStatus`].
#[derive(Debug, Clone)]
pub struct PlotEditor {
    kind: ChartKind,
    text: String,
    points: Vec<ChartPoint>,
    status: ParseStatus,
}

impl Default for PlotEditor {
    fn default() -> Self {
        Self::new(ChartKind::Scatter)
    }
}

impl PlotEditor {
    pub fn new(kind: ChartKind) -> Self {
        let points = kind.sample();
        Self {
            kind,
            text: to_editor_text(&points),
            points,
            status: ParseStatus::Valid,
        }
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn points(&self) -> &[ChartPoint] {
        &self.points
    }

    pub fn status(&self) -> &ParseStatus {
        &self.status
    }

    pub fn data(&self) -> ChartData {
        ChartData::from_points(self.kind, &self.points)
    }

    /// Switch chart type. Resets the text box to that type's sample and
    /// discards any unsaved edits.
    pub fn set_kind(&mut self, kind: ChartKind) {
        *self = Self::new(kind);
    }

    pub fn reset_to_sample(&mut self) {
        self.set_kind(self.kind);
    }

    /// Replace the whole text and re-parse.
    pub fn set_text(&mut self, text: impl Into<String>) -> &ParseStatus {
        self.text = text.into();
        self.reparse()
    }

    pub fn insert_char(&mut self, c: char) -> &ParseStatus {
        self.text.push(c);
        self.reparse()
    }

    pub fn insert_str(&mut self, s: &str) -> &ParseStatus {
        self.text.push_str(s);
        self.reparse()
    }

    pub fn backspace(&mut self) -> &ParseStatus {
        self.text.pop();
        self.reparse()
    }

    fn reparse(&mut self) -> &ParseStatus {
        self.status = match parse_points(self.kind, &self.text) {
            Ok(points) => {
                self.points = points;
                ParseStatus::Valid
            }
            Err(e) => ParseStatus::Invalid(e),
        };
        &self.status
    }
}
