use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{
    METHOD_SEPARATOR,
    TAG_PARAM,
    TAG_PROPERTY,
    TAG_RETURN,
    TAG_THROWS,
};

/// Member visibility as reported by the reflector.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
        }
    }

    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method argument as a `(type, name)` pair. The name carries no `$` sigil.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Argument {
    #[serde(default)]
    pub type_name: String,
    pub name: String,
}

/// Documentation tag attached to a doc block.
///
/// `body` is the whitespace-collapsed text following `@name`. The typed
/// fields are only filled for tags whose grammar starts with a type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocTag {
    pub name: String,
    #[serde(default)]
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Known tag kinds the render engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Param,
    Return,
    Throws,
    Property,
    Other,
}

impl DocTag {
    #[must_use]
    pub fn kind(&self) -> TagKind {
        match self.name.as_str() {
            TAG_PARAM => TagKind::Param,
            TAG_RETURN => TagKind::Return,
            TAG_THROWS => TagKind::Throws,
            TAG_PROPERTY => TagKind::Property,
            _ => TagKind::Other,
        }
    }
}

/// Parsed documentation comment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<DocTag>,
}

impl DocBlock {
    /// Iterates tags with the given name, in declaration order.
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DocTag> + 'a {
        self.tags.iter().filter(move |tag| tag.name == name)
    }
}

/// Property declared through a `property` doc tag rather than a language construct.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub type_name: String,
    pub variable: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyDescriptor {
    /// Splits a tag body of form `<type> <name> <description...>` on single spaces.
    ///
    /// Missing pieces become empty strings; an empty description is `None`.
    #[must_use]
    pub fn from_tag_body(body: &str) -> Self {
        let mut parts = body.split(' ');
        let type_name = parts.next().unwrap_or_default().to_string();
        let variable = parts.next().unwrap_or_default().to_string();
        let description = parts.collect::<Vec<_>>().join(" ");
        Self {
            type_name,
            variable,
            description: if description.is_empty() { None } else { Some(description) },
        }
    }
}

/// Reflected method. Owned exclusively by one [`ClassDescriptor`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// `Class::method`.
    pub fqn: String,
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Argument>,
    pub return_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<DocBlock>,
}

impl MethodDescriptor {
    #[must_use]
    pub fn qualified_name(class_fqn: &str, method_name: &str) -> String {
        format!("{class_fqn}{METHOD_SEPARATOR}{method_name}")
    }

    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.doc.as_ref().and_then(|doc| doc.summary.as_deref())
    }

    /// Magic methods follow the double-underscore naming convention.
    #[must_use]
    pub fn is_magic(&self) -> bool {
        self.name.contains("__")
    }
}

/// Reflected class with its methods and doc-declared properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub fqn: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<DocBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyDescriptor>,
}

impl ClassDescriptor {
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.doc.as_ref().and_then(|doc| doc.summary.as_deref())
    }

    #[must_use]
    pub fn method(&self, fqn: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|method| method.fqn == fqn)
    }

    /// Rebuilds `properties` from the `property` tags of the class doc block.
    pub fn derive_properties(&mut self) {
        self.properties = self
            .doc
            .as_ref()
            .map(|doc| {
                doc.tags_named(TAG_PROPERTY)
                    .map(|tag| PropertyDescriptor::from_tag_body(&tag.body))
                    .collect()
            })
            .unwrap_or_default();
    }
}
