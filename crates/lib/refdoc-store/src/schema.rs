pub const TAG_PARAM: &str = "param";
pub const TAG_RETURN: &str = "return";
pub const TAG_THROWS: &str = "throws";
pub const TAG_VAR: &str = "var";
pub const TAG_PROPERTY: &str = "property";
pub const TAG_PROPERTY_READ: &str = "property-read";
pub const TAG_PROPERTY_WRITE: &str = "property-write";

/// Tags whose body starts with a type name.
pub const TYPED_TAGS: &[&str] = &[
    TAG_PARAM,
    TAG_RETURN,
    TAG_THROWS,
    TAG_VAR,
    TAG_PROPERTY,
    TAG_PROPERTY_READ,
    TAG_PROPERTY_WRITE,
];

/// Typed tags whose second token names a variable.
pub const VARIABLE_TAGS: &[&str] = &[
    TAG_PARAM,
    TAG_VAR,
    TAG_PROPERTY,
    TAG_PROPERTY_READ,
    TAG_PROPERTY_WRITE,
];

pub const METHOD_SEPARATOR: &str = "::";

pub const DEFAULT_RETURN_TYPE: &str = "mixed";

pub const NO_DESCRIPTION: &str = "No description available";

#[must_use]
pub fn is_typed_tag(name: &str) -> bool {
    TYPED_TAGS.contains(&name)
}

#[must_use]
pub fn is_variable_tag(name: &str) -> bool {
    VARIABLE_TAGS.contains(&name)
}
