//! Render engine: turns matches into bounded display documents.

use std::fmt::Write as _;

use refdoc_store::models::{
    ClassDescriptor,
    DocTag,
    MethodDescriptor,
    PropertyDescriptor,
    TagKind,
};
use refdoc_store::schema::{NO_DESCRIPTION, TAG_PROPERTY};
use serde::{Deserialize, Serialize};

use crate::resolve::{MatchResult, ViewKind};

/// Hard limit of labeled fields the display surface accepts per document.
pub const MAX_FIELDS: usize = 25;

/// One labeled entry of a display document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentField {
    pub name: String,
    pub value: String,
}

/// Structured render output handed to the transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayDocument {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<DocumentField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl DisplayDocument {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            fields: Vec::new(),
            footer: None,
        }
    }

    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(DocumentField {
            name: name.into(),
            value: value.into(),
        });
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.fields.len() >= MAX_FIELDS
    }

    /// Plain-text rendering for surfaces without rich documents.
    #[must_use]
    pub fn to_plain_text(&self) -> String {
        let mut text = format!("{}\n{}\n", self.title, self.description);
        for field in &self.fields {
            let _ = write!(text, "\n{}\n{}\n", field.name, field.value);
        }
        if let Some(footer) = &self.footer {
            let _ = write!(text, "\n{footer}\n");
        }
        text
    }
}

/// Renders a match. Method matches ignore `view`.
#[must_use]
pub fn render_match(result: &MatchResult, view: ViewKind) -> DisplayDocument {
    match (result, view) {
        (MatchResult::Class(class), ViewKind::Methods) => render_class_methods(class),
        (MatchResult::Class(class), ViewKind::Properties) => render_class_properties(class),
        (MatchResult::Method { .. }, _) => result
            .method()
            .map_or_else(|| DisplayDocument::new(result.fqn(), NO_DESCRIPTION), render_method),
    }
}

fn class_header(class: &ClassDescriptor) -> DisplayDocument {
    DisplayDocument::new(
        format!("`{}`", class.fqn),
        class.summary().unwrap_or(NO_DESCRIPTION),
    )
}

/// Public, non-magic methods as call signatures.
///
/// The overflow footer reports the class's total method count, not the
/// number of methods that qualified for display.
#[must_use]
pub fn render_class_methods(class: &ClassDescriptor) -> DisplayDocument {
    let mut document = class_header(class);

    for method in &class.methods {
        if !method.visibility.is_public() || method.is_magic() {
            continue;
        }
        if document.is_full() {
            document.footer = Some(format!(
                "{} method(s) unable to be shown.",
                class.methods.len()
            ));
            break;
        }
        document.push_field(
            method_signature(method),
            method.summary().unwrap_or(NO_DESCRIPTION),
        );
    }

    document
}

/// Doc-declared properties of a class.
#[must_use]
pub fn render_class_properties(class: &ClassDescriptor) -> DisplayDocument {
    let mut document = class_header(class);
    let Some(doc) = class.doc.as_ref() else {
        return document;
    };

    let tag_count = doc.tags_named(TAG_PROPERTY).count();
    let properties = doc
        .tags_named(TAG_PROPERTY)
        .map(|tag| PropertyDescriptor::from_tag_body(&tag.body));
    for property in properties {
        if document.is_full() {
            let noun = if tag_count > 1 { "properties" } else { "property" };
            document.footer = Some(format!("{tag_count} {noun} unable to be shown."));
            break;
        }
        document.push_field(
            format!("`{} {}`", property.type_name, property.variable),
            property.description.as_deref().unwrap_or(NO_DESCRIPTION),
        );
    }

    document
}

/// Parameters, return value and thrown types of one method. Not capped.
#[must_use]
pub fn render_method(method: &MethodDescriptor) -> DisplayDocument {
    let mut document = DisplayDocument::new(
        method.fqn.clone(),
        method.summary().unwrap_or(NO_DESCRIPTION),
    );
    let Some(doc) = method.doc.as_ref() else {
        return document;
    };

    for tag in &doc.tags {
        let label = match tag.kind() {
            TagKind::Param => format!(
                "`{} ${}`",
                tag_type(tag),
                tag.variable.as_deref().unwrap_or_default()
            ),
            TagKind::Return => format!("Returns `{}`", tag_type(tag)),
            TagKind::Throws => format!("Throws `{}`", tag_type(tag)),
            TagKind::Property | TagKind::Other => continue,
        };
        document.push_field(label, tag.description.as_deref().unwrap_or(NO_DESCRIPTION));
    }

    document
}

/// `` `name(type $arg, ...): returnType` ``
#[must_use]
pub fn method_signature(method: &MethodDescriptor) -> String {
    let arguments = method
        .arguments
        .iter()
        .map(|argument| format!("{} ${}", argument.type_name, argument.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("`{}({arguments}): {}`", method.name, method.return_type)
}

fn tag_type(tag: &DocTag) -> &str {
    tag.type_name.as_deref().unwrap_or_default()
}
