use std::{
    fmt::Display,
    ops::{Deref, DerefMut},
};

use annotate_snippets::{
    display_list::{DisplayList, FormatOptions},
    snippet::{Annotation, AnnotationType, Slice, Snippet, SourceAnnotation},
};

/// A syntax node together with the region of source text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Span<'a, T>
where
    T: 'a,
{
    inner: T,
    pub filename: &'a str,
    pub source: &'a str,
    pub start: usize,
    pub end: usize,
}

impl<'a, T: Display> Display for Span<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl<'a, T> Deref for Span<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<'a, T> DerefMut for Span<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<'a, T> AsRef<T> for Span<'a, T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}

impl<'a, T> Span<'a, T> {
    /// Create a new `Span`.
    pub fn new(inner: T, filename: &'a str, source: &'a str, start: usize, end: usize) -> Self {
        Self {
            inner,
            filename,
            source,
            start,
            end,
        }
    }

    pub fn from_pest(inner: T, filename: &'a str, source: &'a str, span: pest::Span<'a>) -> Self {
        Self::new(inner, filename, source, span.start(), span.end())
    }

    /// Unwrap the node.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// The verbatim source text covered by this span.
    pub fn as_str(&self) -> &'a str {
        self.source.get(self.start..self.end).unwrap_or_default()
    }

    /// Replace the node, keeping the location.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Span<'a, U> {
        Span {
            inner: f(self.inner),
            filename: self.filename,
            source: self.source,
            start: self.start,
            end: self.end,
        }
    }

    pub fn lines(&self) -> Option<LinesInfo<'a>> {
        let mut start = 0;
        let mut line_start = 0;
        for (i, line) in self.source.split_inclusive('\n').enumerate() {
            let next = start + line.len();
            if next > self.start || next == self.source.len() {
                line_start = i + 1;
                break;
            }
            start = next;
        }
        if line_start == 0 {
            return None;
        }

        let mut end = start;
        for line in self.source[start..].split_inclusive('\n') {
            let next = end + line.len();
            end = next;
            if next >= self.end {
                break;
            }
        }

        let source = &self.source[start..end];
        let visible = source.trim_end_matches('\n').len();
        let from = (self.start - start).min(visible);
        let to = (self.end.min(end) - start).clamp(from, visible.max(from));
        Some(LinesInfo {
            filename: self.filename,
            source,
            line_start,
            range: (from, to),
        })
    }
}

/// The source lines surrounding a span.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinesInfo<'a> {
    /// File name
    pub filename: &'a str,
    /// The lines that contain the span
    pub source: &'a str,
    /// First line number (1-based)
    pub line_start: usize,
    /// Range of the span inside `source`
    pub range: (usize, usize),
}

impl<'a> LinesInfo<'a> {
    pub fn as_annotation<'b>(
        &'b self,
        message: &'b str,
        annotation_type: AnnotationType,
    ) -> Slice<'b> {
        Slice {
            source: self.source,
            line_start: self.line_start,
            origin: Some(self.filename),
            annotations: vec![SourceAnnotation {
                range: self.range,
                label: message,
                annotation_type,
            }],
            fold: true,
        }
    }

    /// Render an error report pointing at these lines.
    pub fn to_snippet(&self, title: &str, message: &str) -> String {
        let snippet = Snippet {
            title: Some(Annotation {
                id: None,
                label: Some(title),
                annotation_type: AnnotationType::Error,
            }),
            footer: vec![],
            slices: vec![self.as_annotation(message, AnnotationType::Error)],
            opt: FormatOptions {
                color: true,
                ..Default::default()
            },
        };

        DisplayList::from(snippet).to_string()
    }
}
