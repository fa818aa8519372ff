//! Reflection dump reader.
//!
//! A reflection dump is the JSON document an external reflector emits for one
//! source file. Doc comments are carried raw and parsed here.

use std::{error::Error, fmt, path::Path};

use refdoc_store::models::{Argument, ClassDescriptor, MethodDescriptor, Visibility};
use refdoc_store::schema::DEFAULT_RETURN_TYPE;
use serde::Deserialize;

use super::docblock::DocBlockParser;

/// Error type for reflection dump failures.
#[derive(Debug)]
pub struct ParseError {
    path: Option<String>,
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            path: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "reflection parse error in {path}: {}", self.message),
            None => write!(f, "reflection parse error: {}", self.message),
        }
    }
}

impl Error for ParseError {}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ReflectionFile {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    classes: Vec<ReflectedClass>,
}

#[derive(Debug, Deserialize)]
struct ReflectedClass {
    fqn: String,
    #[serde(default)]
    doc: Option<String>,
    #[serde(default)]
    methods: Vec<ReflectedMethod>,
}

#[derive(Debug, Deserialize)]
struct ReflectedMethod {
    name: String,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default)]
    arguments: Vec<ReflectedArgument>,
    #[serde(default)]
    return_type: Option<String>,
    #[serde(default)]
    doc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReflectedArgument {
    #[serde(default, rename = "type")]
    type_name: Option<String>,
    name: String,
}

/// Parser for reflection dump files.
pub struct ReflectionJsonParser;

impl ReflectionJsonParser {
    /// Parses one reflection dump into class descriptors, in declaration order.
    ///
    /// # Errors
    /// Returns `ParseError` if the JSON is invalid, a class has an empty name,
    /// or a class declares the same method twice.
    pub fn parse(json: &str) -> Result<Vec<ClassDescriptor>, ParseError> {
        let file: ReflectionFile = serde_json::from_str(json)?;
        let source_path = file.path;

        let mut classes = Vec::with_capacity(file.classes.len());
        for reflected in file.classes {
            let fqn = normalize_class_name(&reflected.fqn);
            if fqn.is_empty() {
                return Err(ParseError::new("class with empty name"));
            }

            let mut methods: Vec<MethodDescriptor> = Vec::with_capacity(reflected.methods.len());
            for method in reflected.methods {
                let method_fqn = MethodDescriptor::qualified_name(&fqn, &method.name);
                if methods.iter().any(|existing| existing.fqn == method_fqn) {
                    return Err(ParseError::new(format!("duplicate method {method_fqn}")));
                }
                methods.push(MethodDescriptor {
                    fqn: method_fqn,
                    name: method.name,
                    visibility: method.visibility,
                    arguments: method
                        .arguments
                        .into_iter()
                        .map(|argument| Argument {
                            type_name: argument.type_name.unwrap_or_default(),
                            name: argument.name.trim_start_matches('$').to_string(),
                        })
                        .collect(),
                    return_type: method
                        .return_type
                        .filter(|value| !value.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_RETURN_TYPE.to_string()),
                    doc: method.doc.as_deref().map(DocBlockParser::parse),
                });
            }

            let mut class = ClassDescriptor {
                name: simple_name(&fqn).to_string(),
                fqn,
                source_path: source_path.clone(),
                doc: reflected.doc.as_deref().map(DocBlockParser::parse),
                methods,
                properties: Vec::new(),
            };
            class.derive_properties();
            classes.push(class);
        }

        Ok(classes)
    }

    /// Reads and parses a reflection dump from a file path.
    ///
    /// # Errors
    /// Returns `ParseError` carrying the path if the file cannot be read or parsed.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<ClassDescriptor>, ParseError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let json = std::fs::read_to_string(path)
            .map_err(|err| ParseError::from(err).with_path(display.clone()))?;
        Self::parse(&json).map_err(|err| err.with_path(display))
    }
}

fn normalize_class_name(value: &str) -> String {
    value.trim().trim_start_matches('\\').to_string()
}

fn simple_name(fqn: &str) -> &str {
    fqn.rsplit('\\').next().unwrap_or(fqn)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANNEL_DUMP: &str = r#"{
        "path": "src/Discord/Parts/Channel/Channel.php",
        "classes": [
            {
                "fqn": "\\Discord\\Parts\\Channel\\Channel",
                "doc": "/**\n * A Channel can be either a text or voice channel.\n *\n * @property string $id The unique identifier.\n */",
                "methods": [
                    {
                        "name": "sendMessage",
                        "arguments": [
                            { "type": "string", "name": "$message" },
                            { "type": "bool", "name": "tts" }
                        ],
                        "return_type": "ExtendedPromiseInterface",
                        "doc": "/**\n * Sends a message.\n */"
                    },
                    { "name": "__get", "visibility": "public" },
                    { "name": "afterSave", "visibility": "protected", "return_type": "" }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_classes_methods_and_properties() {
        let classes = ReflectionJsonParser::parse(CHANNEL_DUMP).expect("dump should parse");
        assert_eq!(classes.len(), 1);

        let class = &classes[0];
        assert_eq!(class.fqn, "Discord\\Parts\\Channel\\Channel");
        assert_eq!(class.name, "Channel");
        assert_eq!(
            class.source_path.as_deref(),
            Some("src/Discord/Parts/Channel/Channel.php")
        );
        assert_eq!(
            class.summary(),
            Some("A Channel can be either a text or voice channel.")
        );
        assert_eq!(class.properties.len(), 1);

        let send = &class.methods[0];
        assert_eq!(send.fqn, "Discord\\Parts\\Channel\\Channel::sendMessage");
        assert_eq!(send.arguments[0].name, "message");
        assert_eq!(send.arguments[1].type_name, "bool");
        assert_eq!(send.summary(), Some("Sends a message."));

        let magic = &class.methods[1];
        assert!(magic.is_magic());
        assert!(magic.doc.is_none());
        assert_eq!(magic.return_type, "mixed");

        let protected = &class.methods[2];
        assert_eq!(protected.visibility, Visibility::Protected);
        assert_eq!(protected.return_type, "mixed");
    }

    #[test]
    fn rejects_duplicate_methods() {
        let json = r#"{ "classes": [ { "fqn": "A", "methods": [ { "name": "foo" }, { "name": "foo" } ] } ] }"#;
        let err = ReflectionJsonParser::parse(json).expect_err("duplicate should fail");
        assert!(err.message().contains("A::foo"));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = ReflectionJsonParser::parse("{ not json").expect_err("invalid json should fail");
        assert!(err.path().is_none());
        let err = err.with_path("broken.json");
        assert!(err.to_string().contains("broken.json"));
    }
}
