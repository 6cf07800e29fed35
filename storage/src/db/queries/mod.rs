use surrealdb::sql::Tokenizer;

pub mod generic;
pub mod song;

/// Statement declaring a text analyzer, unless one with the same name already exists.
///
/// NOTE: for some reason, having more than one tokenizer causes the parser to fail, so we're just not going to support that for now
#[must_use]
#[inline]
pub fn define_analyzer(name: &str, tokenizer: Option<Tokenizer>, filters: &[&str]) -> String {
    let tokenizer_string = tokenizer.map_or_else(String::new, |t| format!(" TOKENIZERS {t}"));

    let filter_string = filters.is_empty().then(String::new).unwrap_or_else(|| {
        let filters = filters.join(",");
        format!(" FILTERS {filters}")
    });

    format!("DEFINE ANALYZER IF NOT EXISTS {name}{tokenizer_string}{filter_string}")
}

/// Check that `query` parses to the same statements as `expected`.
#[cfg(test)]
pub fn validate_query(query: impl AsRef<str>, expected: &str) {
    use pretty_assertions::assert_eq;

    let compiled_query = surrealdb::syn::parse(query.as_ref()).unwrap();
    let compiled_expected = surrealdb::syn::parse(expected).unwrap();
    assert!(
        !compiled_expected.0.is_empty(),
        "Expected query compiled to an empty list of statements: \"{expected}\""
    );
    assert_eq!(compiled_query, compiled_expected);
}
