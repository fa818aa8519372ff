//! Doc comment parser.
//!
//! Turns a raw `/** ... */` comment into a summary, a long description and an
//! ordered list of tags.

use refdoc_store::models::{DocBlock, DocTag};
use refdoc_store::schema::{is_typed_tag, is_variable_tag};

/// Parser for raw documentation comments.
pub struct DocBlockParser;

impl DocBlockParser {
    /// Parses a raw doc comment.
    ///
    /// The first paragraph becomes the summary and the remaining text before
    /// the first tag becomes the description. A line starting with `@` opens a
    /// tag; following lines are appended to it until the next tag.
    #[must_use]
    pub fn parse(raw: &str) -> DocBlock {
        let lines = strip_comment(raw);

        let mut preamble = Vec::new();
        let mut tag_texts: Vec<String> = Vec::new();
        for line in lines {
            if line.starts_with('@') {
                tag_texts.push(line);
            } else if let Some(current) = tag_texts.last_mut() {
                if !line.is_empty() {
                    current.push(' ');
                    current.push_str(&line);
                }
            } else {
                preamble.push(line);
            }
        }

        let (summary, description) = split_summary(&preamble);
        let tags = tag_texts.iter().filter_map(|text| parse_tag(text)).collect();

        DocBlock {
            summary,
            description,
            tags,
        }
    }
}

fn strip_comment(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("/**").unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("*/").unwrap_or(trimmed);

    trimmed
        .replace("\r\n", "\n")
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.trim().to_string()
        })
        .collect()
}

fn split_summary(preamble: &[String]) -> (Option<String>, Option<String>) {
    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current = Vec::new();
    for line in preamble {
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.as_str());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    let mut paragraphs = paragraphs.into_iter();
    let summary = paragraphs.next().map(|lines| lines.join(" "));
    let rest: Vec<String> = paragraphs.map(|lines| lines.join("\n")).collect();
    let description = if rest.is_empty() {
        None
    } else {
        Some(rest.join("\n\n"))
    };
    (summary, description)
}

fn parse_tag(text: &str) -> Option<DocTag> {
    let text = text.strip_prefix('@')?;
    let (name, body) = match text.split_once(char::is_whitespace) {
        Some((name, body)) => (name, collapse_whitespace(body.trim())),
        None => (text, String::new()),
    };
    if name.is_empty() {
        return None;
    }

    let mut tag = DocTag {
        name: name.to_string(),
        body,
        type_name: None,
        variable: None,
        description: None,
    };

    if is_typed_tag(name) {
        let mut words = tag.body.split(' ').filter(|word| !word.is_empty());
        tag.type_name = words.next().map(str::to_string);

        let mut remaining: Vec<&str> = words.collect();
        if is_variable_tag(name) {
            if let Some(first) = remaining.first().copied() {
                if let Some(variable) = first.strip_prefix('$') {
                    tag.variable = Some(variable.to_string());
                    remaining.remove(0);
                }
            }
        }

        let description = remaining.join(" ");
        if !description.is_empty() {
            tag.description = Some(description);
        }
    }

    Some(tag)
}

fn collapse_whitespace(value: &str) -> String {
    let mut output = String::new();
    let mut last_was_space = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                output.push(' ');
                last_was_space = true;
            }
        } else {
            output.push(ch);
            last_was_space = false;
        }
    }
    output
}
