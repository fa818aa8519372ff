use std::path::PathBuf;
use std::sync::Arc;

use refdoc_core::corpus::FsCorpus;
use refdoc_core::index::{IndexBuildError, IndexBuildOptions, SymbolIndex};
use refdoc_core::parsers::ReflectionJsonParser;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

async fn build(name: &str) -> Result<SymbolIndex, IndexBuildError> {
    SymbolIndex::build(
        fixture(name),
        Arc::new(FsCorpus::default()),
        Arc::new(ReflectionJsonParser),
        IndexBuildOptions::default().with_parse_concurrency(2),
    )
    .await
}

#[tokio::test]
async fn malformed_file_fails_with_its_path() {
    let err = build("broken").await.expect_err("truncated dump should fail");

    let IndexBuildError::Parse(parse) = err else {
        panic!("expected a parse error, got {err:?}");
    };
    let path = parse.path().expect("parse error should carry the path");
    assert!(path.ends_with("Truncated.json"), "unexpected path: {path}");
}

#[tokio::test]
async fn class_declared_in_two_files_fails_the_build() {
    let err = build("duplicate")
        .await
        .expect_err("duplicate class should fail");

    assert!(
        matches!(&err, IndexBuildError::DuplicateSymbol(fqn) if fqn == "Acme\\Shared"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn missing_root_fails_as_a_corpus_error() {
    let err = build("absent").await.expect_err("missing root should fail");
    assert!(matches!(err, IndexBuildError::Corpus(_)), "unexpected error: {err:?}");
}
