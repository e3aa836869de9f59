//! Parser for the generated essay text: a title line followed by sections,
//! each introduced by a line wrapped in the double-star marker.

use thiserror::Error;

use crate::models::{Section, StoryDocument};

const SECTION_MARKER: &str = "**";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected a non-empty text block")]
    EmptyInput,
    #[error("line {0} appears after the title but before the first section marker")]
    OrphanLine(usize),
}

// Lenient parse: content between the title and the first section marker is
// silently dropped.
pub fn parse(input: &str) -> Result<StoryDocument, ParseError> {
    parse_inner(input, false)
}

// Strict variant: errors instead of dropping preamble content.
pub fn parse_strict(input: &str) -> Result<StoryDocument, ParseError> {
    parse_inner(input, true)
}

fn parse_inner(input: &str, strict: bool) -> Result<StoryDocument, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut title = String::new();
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<Section> = None;

    for (line_number, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if is_section_marker(line) {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(Section {
                title: unwrap_marker(line).to_string(),
                content: Vec::new(),
            });
        } else if title.is_empty() {
            // First non-marker line becomes the document title
            title = line.to_string();
        } else if let Some(section) = current.as_mut() {
            section.content.push(line.to_string());
        } else if strict {
            return Err(ParseError::OrphanLine(line_number + 1));
        }
        // Otherwise: a line after the title but before the first marker, dropped
    }

    if let Some(section) = current {
        sections.push(section);
    }

    Ok(StoryDocument { title, sections })
}

fn is_section_marker(line: &str) -> bool {
    line.starts_with(SECTION_MARKER) && line.ends_with(SECTION_MARKER)
}

fn unwrap_marker(line: &str) -> &str {
    line.strip_prefix(SECTION_MARKER)
        .and_then(|rest| rest.strip_suffix(SECTION_MARKER))
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_title_sections_and_paragraphs() {
        let document = parse("Title\n**Sec A**\nP1\nP2\n**Sec B**\nP3").unwrap();

        assert_eq!(document.title, "Title");
        assert_eq!(document.sections.len(), 2);
        assert_eq!(document.sections[0].title, "Sec A");
        assert_eq!(document.sections[0].content, vec!["P1", "P2"]);
        assert_eq!(document.sections[1].title, "Sec B");
        assert_eq!(document.sections[1].content, vec!["P3"]);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(parse("").unwrap_err(), ParseError::EmptyInput);
        assert_eq!(parse("   \n\t\n").unwrap_err(), ParseError::EmptyInput);
    }

    #[test]
    fn text_without_markers_is_title_only() {
        let document = parse("Just a title\n").unwrap();

        assert_eq!(document.title, "Just a title");
        assert!(document.sections.is_empty());
    }

    #[test]
    fn bare_marker_opens_a_nameless_empty_section() {
        let document = parse("T\n****\n").unwrap();

        assert_eq!(document.title, "T");
        assert_eq!(document.sections.len(), 1);
        assert_eq!(document.sections[0].title, "");
        assert!(document.sections[0].content.is_empty());
    }

    #[test]
    fn markers_are_recognized_despite_surrounding_whitespace() {
        let document = parse("T\n   **Sec**\t\nbody").unwrap();

        assert_eq!(document.sections[0].title, "Sec");
        assert_eq!(document.sections[0].content, vec!["body"]);
    }

    #[test]
    fn marker_only_input_has_empty_title_and_empty_sections() {
        let document = parse("**A**\n**B**").unwrap();

        assert_eq!(document.title, "");
        assert_eq!(document.sections.len(), 2);
        assert!(document.sections.iter().all(|section| section.content.is_empty()));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let document = parse("\n\nTitle\n\n**Sec**\n\nP1\n\n").unwrap();

        assert_eq!(document.title, "Title");
        assert_eq!(document.sections[0].content, vec!["P1"]);
    }

    #[test]
    fn preamble_lines_are_dropped_in_lenient_mode() {
        let document = parse("Title\nlost line\n**Sec**\nP1").unwrap();

        assert_eq!(document.title, "Title");
        assert_eq!(document.sections.len(), 1);
        assert_eq!(document.sections[0].content, vec!["P1"]);
    }

    #[test]
    fn strict_mode_rejects_preamble_lines() {
        let result = parse_strict("Title\nlost line\n**Sec**\nP1");

        assert_eq!(result.unwrap_err(), ParseError::OrphanLine(2));
    }

    #[test]
    fn strict_mode_accepts_well_formed_input() {
        let document = parse_strict("Title\n**Sec**\nP1").unwrap();

        assert_eq!(document.title, "Title");
        assert_eq!(document.sections[0].content, vec!["P1"]);
    }

    #[test]
    fn title_can_arrive_after_the_first_marker() {
        // The first non-marker line anywhere becomes the title
        let document = parse("**Sec**\nTitle late\nP1").unwrap();

        assert_eq!(document.title, "Title late");
        assert_eq!(document.sections[0].content, vec!["P1"]);
    }
}
