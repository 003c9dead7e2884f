//! Reusable parse callbacks for the common predicate shapes.
//!
//! ```ignore
//! engine.set_parse_callback("-loaded", predicates::flag);
//! engine.set_parse_callback("-property", predicates::arguments::<()>(2));
//! engine.set_parse_callback("-version", predicates::range);
//! ```

use crate::element::{Leaf, Value};
use crate::error::{QueryError, Result};
use crate::range::NumericRange;
use crate::tokens::TokenCursor;

/// Metadata key under which [`range`] stores its parsed [`NumericRange`].
pub const RANGE_METADATA_KEY: &str = "range";

/// A predicate that takes no arguments.
pub fn flag<D>(_leaf: &mut Leaf, _cursor: &mut TokenCursor<'_>, _data: &D) -> Result<()> {
    Ok(())
}

/// A predicate that takes exactly `count` string arguments.
pub fn arguments<D: 'static>(
    count: usize,
) -> impl Fn(&mut Leaf, &mut TokenCursor<'_>, &D) -> Result<()> + Send + Sync + 'static {
    move |leaf: &mut Leaf, cursor: &mut TokenCursor<'_>, _data: &D| {
        let what = format!("{count} argument(s)");
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(Value::from(cursor.expect_argument(&what)?));
        }
        leaf.set_arguments(values);
        Ok(())
    }
}

/// A predicate that takes one integer argument.
pub fn integer<D>(leaf: &mut Leaf, cursor: &mut TokenCursor<'_>, _data: &D) -> Result<()> {
    let raw = cursor.expect_argument("an integer")?;
    let value = raw.trim().parse::<i64>().map_err(|_| {
        QueryError::InvalidOrMissingArgument(format!(
            "{} expects an integer, found {raw:?}",
            leaf.predicate()
        ))
    })?;
    leaf.push_argument(value);
    Ok(())
}

/// A predicate that takes one numeric range argument. The raw text is kept
/// as the leaf's argument and the parsed range is stored in metadata.
pub fn range<D>(leaf: &mut Leaf, cursor: &mut TokenCursor<'_>, _data: &D) -> Result<()> {
    let raw = cursor.expect_argument("a number or range")?;
    let parsed = NumericRange::parse(raw)?;
    leaf.push_argument(raw);
    leaf.set_metadata(RANGE_METADATA_KEY, parsed);
    Ok(())
}

/// Runs `inner`, then renames the leaf's predicate to `name`, so that
/// several keywords share one evaluation callback.
pub fn rename<D, F>(
    name: &str,
    inner: F,
) -> impl Fn(&mut Leaf, &mut TokenCursor<'_>, &D) -> Result<()> + Send + Sync + 'static
where
    D: 'static,
    F: Fn(&mut Leaf, &mut TokenCursor<'_>, &D) -> Result<()> + Send + Sync + 'static,
{
    let name = name.to_string();
    move |leaf: &mut Leaf, cursor: &mut TokenCursor<'_>, data: &D| {
        inner(leaf, cursor, data)?;
        leaf.set_predicate(name.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<F>(callback: F, tokens: &[&str]) -> (Result<()>, Leaf, usize)
    where
        F: Fn(&mut Leaf, &mut TokenCursor<'_>, &()) -> Result<()>,
    {
        let mut cursor = TokenCursor::new(tokens);
        cursor.next();
        cursor.mark_keyword();
        let mut leaf = Leaf::new(tokens[0]);
        let result = callback(&mut leaf, &mut cursor, &());
        (result, leaf, cursor.position())
    }

    #[test]
    fn flag_consumes_nothing() {
        let (result, leaf, consumed) = run(flag, &["-loaded", "-and"]);
        assert!(result.is_ok());
        assert!(leaf.arguments().is_empty());
        assert_eq!(consumed, 1);
    }

    #[test]
    fn arguments_consume_exactly_count() {
        let tokens = ["-property", "CFBundleName", "IOKit", "-loaded"];
        let (result, leaf, consumed) = run(arguments::<()>(2), &tokens);
        assert!(result.is_ok());
        assert_eq!(
            leaf.arguments(),
            &[Value::from("CFBundleName"), Value::from("IOKit")]
        );
        assert_eq!(consumed, 3);
    }

    #[test]
    fn arguments_report_missing_values() {
        let (result, _, _) = run(arguments::<()>(2), &["-property", "CFBundleName"]);
        assert!(matches!(
            result,
            Err(QueryError::InvalidOrMissingArgument(_))
        ));
    }

    #[test]
    fn integer_rejects_non_numbers() {
        let (ok, leaf, _) = run(integer, &["-depth", "3"]);
        assert!(ok.is_ok());
        assert_eq!(leaf.argument(0).and_then(Value::as_integer), Some(3));

        let (err, _, _) = run(integer, &["-depth", "three"]);
        assert!(matches!(err, Err(QueryError::InvalidOrMissingArgument(_))));
    }

    #[test]
    fn range_stashes_parsed_metadata() {
        let (result, leaf, _) = run(range, &["-version", "2..4"]);
        assert!(result.is_ok());
        assert_eq!(leaf.argument(0).and_then(Value::as_str), Some("2..4"));
        let parsed = leaf
            .metadata(RANGE_METADATA_KEY)
            .and_then(Value::as_range)
            .expect("range metadata");
        assert!(parsed.contains(3));
        assert!(!parsed.contains(5));
    }

    #[test]
    fn rename_routes_to_shared_predicate() {
        let callback = rename::<(), _>("-bundle-id", arguments::<()>(1));
        let (result, leaf, _) = run(callback, &["-b", "com.apple"]);
        assert!(result.is_ok());
        assert_eq!(leaf.predicate(), "-bundle-id");
    }
}
