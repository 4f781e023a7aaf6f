//! This lexer sorts CM2 source lines into comments, label declarations
//! and instructions.

/// A classified line of source. Borrowed slices point into the raw line.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SourceLine<'a> {
    /// Empty or whitespace-only.
    Blank,
    Comment,
    /// The label name with surrounding whitespace stripped.
    Label(&'a str),
    /// The instruction text with any trailing comment and whitespace removed.
    Instruction(&'a str),
}

/// CM2 only supports a single directive per line.
pub fn classify(line: &str) -> SourceLine<'_> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return SourceLine::Blank;
    }
    if trimmed.starts_with('#') {
        return SourceLine::Comment;
    }
    if let Some(name) = line.strip_prefix('@') {
        return SourceLine::Label(name.trim());
    }

    let code = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    SourceLine::Instruction(code.trim())
}

/// Classifies every line of `source`, pairing each with its 1-based line number.
pub fn lines(source: &str) -> impl Iterator<Item = (usize, SourceLine<'_>)> {
    source
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, classify(line)))
}
