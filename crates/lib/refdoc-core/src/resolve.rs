//! Query resolution against the symbol index.
//!
//! Matching is plain, case-sensitive substring containment over
//! fully-qualified names.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use refdoc_store::models::{ClassDescriptor, MethodDescriptor};
use refdoc_store::schema::METHOD_SEPARATOR;
use serde::{Deserialize, Serialize};

use crate::index::SymbolIndex;

/// Largest number of candidates a selection prompt can offer.
pub const MAX_CHOICES: usize = 9;

/// Which part of a class a render should show. Ignored for method matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Methods,
    #[default]
    Properties,
}

impl ViewKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Methods => "methods",
            Self::Properties => "properties",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewKind {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "methods" => Ok(Self::Methods),
            "properties" => Ok(Self::Properties),
            _ => Err(()),
        }
    }
}

/// One symbol matched by a query.
#[derive(Debug, Clone)]
pub enum MatchResult {
    Class(Arc<ClassDescriptor>),
    Method {
        class: Arc<ClassDescriptor>,
        index: usize,
    },
}

impl MatchResult {
    #[must_use]
    pub fn fqn(&self) -> &str {
        match self {
            Self::Class(class) => &class.fqn,
            Self::Method { class, index } => class
                .methods
                .get(*index)
                .map_or(class.fqn.as_str(), |method| method.fqn.as_str()),
        }
    }

    #[must_use]
    pub fn class(&self) -> &ClassDescriptor {
        match self {
            Self::Class(class) | Self::Method { class, .. } => class,
        }
    }

    #[must_use]
    pub fn method(&self) -> Option<&MethodDescriptor> {
        match self {
            Self::Class(_) => None,
            Self::Method { class, index } => class.methods.get(*index),
        }
    }

    #[must_use]
    pub const fn is_class(&self) -> bool {
        matches!(self, Self::Class(_))
    }
}

/// Resolves a free-text query into matches, in index order.
///
/// A query containing `::` also matches methods. Class matching always runs,
/// independently of method matching, and nothing is deduplicated.
#[must_use]
pub fn resolve(index: &SymbolIndex, query: Option<&str>) -> Vec<MatchResult> {
    let Some(query) = query.filter(|query| !query.is_empty()) else {
        return Vec::new();
    };
    let search_methods = query.contains(METHOD_SEPARATOR);

    let mut results = Vec::new();
    for class in index.all_classes() {
        if search_methods {
            for (position, method) in class.methods.iter().enumerate() {
                if method.fqn.contains(query) {
                    results.push(MatchResult::Method {
                        class: class.clone(),
                        index: position,
                    });
                }
            }
        }

        if class.fqn.contains(query) {
            results.push(MatchResult::Class(class.clone()));
        }
    }
    results
}

/// Outcome of a query once the number of matches is known.
#[derive(Debug, Clone)]
pub enum Resolution {
    NoResults,
    Single(MatchResult),
    Ambiguous(Vec<MatchResult>),
    TooMany(usize),
}

impl Resolution {
    #[must_use]
    pub fn classify(mut matches: Vec<MatchResult>) -> Self {
        match matches.len() {
            0 => Self::NoResults,
            1 => matches.pop().map_or(Self::NoResults, Self::Single),
            count if count > MAX_CHOICES => Self::TooMany(count),
            _ => Self::Ambiguous(matches),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::class;

    fn sample_index() -> SymbolIndex {
        SymbolIndex::from_classes([class("A", &["foo", "bar"]), class("B", &["baz"])])
            .expect("index should build")
    }

    fn fqns(matches: &[MatchResult]) -> Vec<&str> {
        matches.iter().map(MatchResult::fqn).collect()
    }

    #[test]
    fn empty_and_missing_queries_match_nothing() {
        let index = sample_index();
        assert!(resolve(&index, None).is_empty());
        assert!(resolve(&index, Some("")).is_empty());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let index = sample_index();
        assert!(resolve(&index, Some("a")).is_empty());
        assert_eq!(fqns(&resolve(&index, Some("A"))), ["A"]);
    }

    #[test]
    fn plain_queries_never_match_methods() {
        let index = sample_index();
        assert!(resolve(&index, Some("foo")).is_empty());
    }

    #[test]
    fn separator_queries_match_methods_in_definition_order() {
        let index = sample_index();
        assert_eq!(fqns(&resolve(&index, Some("A::"))), ["A::foo", "A::bar"]);
        assert_eq!(fqns(&resolve(&index, Some("::ba"))), ["A::bar", "B::baz"]);
        assert!(resolve(&index, Some("::ba")).iter().all(|m| !m.is_class()));
    }

    #[test]
    fn method_and_class_matching_are_independent() {
        let index = SymbolIndex::from_classes([
            class("Ns::Weird", &["call"]),
            class("Other", &["run"]),
        ])
        .expect("index should build");

        let matches = resolve(&index, Some("Ns::"));
        assert_eq!(fqns(&matches), ["Ns::Weird::call", "Ns::Weird"]);
        assert!(!matches[0].is_class());
        assert!(matches[1].is_class());
    }

    #[test]
    fn stale_method_index_falls_back_to_the_class() {
        let stale = MatchResult::Method {
            class: Arc::new(class("A", &["foo"])),
            index: 7,
        };
        assert_eq!(stale.fqn(), "A");
        assert!(stale.method().is_none());
    }

    #[test]
    fn classify_applies_choice_bounds() {
        let names: Vec<String> = (0..10).map(|i| format!("X{i}")).collect();
        let index = SymbolIndex::from_classes(names.iter().map(|name| class(name, &[])))
            .expect("index should build");

        assert!(matches!(
            Resolution::classify(resolve(&index, Some("missing"))),
            Resolution::NoResults
        ));
        assert!(matches!(
            Resolution::classify(resolve(&index, Some("X3"))),
            Resolution::Single(found) if found.fqn() == "X3"
        ));
        assert!(matches!(
            Resolution::classify(resolve(&index, Some("X"))),
            Resolution::TooMany(10)
        ));

        let nine = resolve(&index, Some("X")).into_iter().take(9).collect();
        assert!(matches!(
            Resolution::classify(nine),
            Resolution::Ambiguous(matches) if matches.len() == MAX_CHOICES
        ));
    }
}
