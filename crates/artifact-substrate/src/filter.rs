//! Service filter expressions
//!
//! Filters select published services by their properties using an
//! LDAP-style prefix grammar:
//!
//! - `(attr=value)` — equality, `*` acts as a wildcard within `value`
//! - `(attr=*)` — presence of the attribute
//! - `(&(f)(g)...)` — conjunction
//! - `(|(f)(g)...)` — disjunction
//! - `(!(f))` — negation

use crate::error::{Error, Result};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::all_consuming,
    multi::many1,
    sequence::delimited,
};
use std::collections::HashMap;

/// A parsed filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// All sub-filters must match
    And(Vec<Filter>),
    /// At least one sub-filter must match
    Or(Vec<Filter>),
    /// The sub-filter must not match
    Not(Box<Filter>),
    /// Attribute equals value; `*` in the value is a wildcard
    Equals(String, String),
    /// Attribute is present with any value
    Present(String),
}

impl Filter {
    /// Parse a filter expression
    ///
    /// Fails with [`Error::InvalidFilter`] on malformed input; callers
    /// must not retry a malformed expression.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        match all_consuming(filter_expr).parse(trimmed) {
            Ok((_, filter)) => Ok(filter),
            Err(_) => Err(Error::InvalidFilter(input.to_string())),
        }
    }

    /// Evaluate the filter against a property map
    pub fn matches(&self, properties: &HashMap<String, String>) -> bool {
        match self {
            Filter::And(children) => children.iter().all(|f| f.matches(properties)),
            Filter::Or(children) => children.iter().any(|f| f.matches(properties)),
            Filter::Not(child) => !child.matches(properties),
            Filter::Equals(attr, pattern) => properties
                .get(attr)
                .is_some_and(|value| wildcard_match(pattern, value)),
            Filter::Present(attr) => properties.contains_key(attr),
        }
    }
}

/// Match a value against a pattern where `*` matches any run of characters
fn wildcard_match(pattern: &str, value: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == value;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    let mut rest = value;

    // First segment is anchored at the start, last at the end
    if let Some(first) = segments.first() {
        if !rest.starts_with(first) {
            return false;
        }
        rest = &rest[first.len()..];
    }
    if let Some(last) = segments.last() {
        if segments.len() > 1 {
            if !rest.ends_with(last) {
                return false;
            }
            rest = &rest[..rest.len() - last.len()];
        }
    }

    // Interior segments must appear in order
    for segment in &segments[1..segments.len().saturating_sub(1)] {
        if segment.is_empty() {
            continue;
        }
        match rest.find(segment) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }

    true
}

fn filter_expr(input: &str) -> IResult<&str, Filter> {
    delimited(
        char('('),
        alt((and_expr, or_expr, not_expr, comparison)),
        char(')'),
    )
    .parse(input)
}

fn and_expr(input: &str) -> IResult<&str, Filter> {
    let (input, _) = char('&').parse(input)?;
    let (input, children) = many1(filter_expr).parse(input)?;
    Ok((input, Filter::And(children)))
}

fn or_expr(input: &str) -> IResult<&str, Filter> {
    let (input, _) = char('|').parse(input)?;
    let (input, children) = many1(filter_expr).parse(input)?;
    Ok((input, Filter::Or(children)))
}

fn not_expr(input: &str) -> IResult<&str, Filter> {
    let (input, _) = char('!').parse(input)?;
    let (input, child) = filter_expr(input)?;
    Ok((input, Filter::Not(Box::new(child))))
}

fn comparison(input: &str) -> IResult<&str, Filter> {
    let (input, attr) = take_while1(|c: char| !"=()&|!".contains(c)).parse(input)?;
    let (input, _) = char('=').parse(input)?;
    let (input, value) = take_while(|c: char| c != '(' && c != ')').parse(input)?;

    let filter = if value == "*" {
        Filter::Present(attr.to_string())
    } else {
        Filter::Equals(attr.to_string(), value.to_string())
    };
    Ok((input, filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_equality() {
        let filter = Filter::parse("(port=8080)").unwrap();
        assert_eq!(
            filter,
            Filter::Equals("port".to_string(), "8080".to_string())
        );
    }

    #[test]
    fn test_parse_presence() {
        let filter = Filter::parse("(port=*)").unwrap();
        assert_eq!(filter, Filter::Present("port".to_string()));
    }

    #[test]
    fn test_parse_conjunction() {
        let filter = Filter::parse("(&(objectClass=http)(port=8080))").unwrap();
        assert!(filter.matches(&props(&[("objectClass", "http"), ("port", "8080")])));
        assert!(!filter.matches(&props(&[("objectClass", "http"), ("port", "9090")])));
    }

    #[test]
    fn test_parse_disjunction() {
        let filter = Filter::parse("(|(port=80)(port=8080))").unwrap();
        assert!(filter.matches(&props(&[("port", "80")])));
        assert!(filter.matches(&props(&[("port", "8080")])));
        assert!(!filter.matches(&props(&[("port", "443")])));
    }

    #[test]
    fn test_parse_negation() {
        let filter = Filter::parse("(!(secure=true))").unwrap();
        assert!(filter.matches(&props(&[("secure", "false")])));
        assert!(filter.matches(&props(&[])));
        assert!(!filter.matches(&props(&[("secure", "true")])));
    }

    #[test]
    fn test_wildcard_values() {
        let filter = Filter::parse("(path=/api/*)").unwrap();
        assert!(filter.matches(&props(&[("path", "/api/v1")])));
        assert!(!filter.matches(&props(&[("path", "/web/v1")])));

        let filter = Filter::parse("(host=*.example.org)").unwrap();
        assert!(filter.matches(&props(&[("host", "www.example.org")])));
        assert!(!filter.matches(&props(&[("host", "www.example.com")])));
    }

    #[test]
    fn test_nested_composition() {
        let filter = Filter::parse("(&(objectClass=http)(!(port=443))(|(tls=*)(plain=yes)))")
            .unwrap();
        assert!(filter.matches(&props(&[
            ("objectClass", "http"),
            ("port", "8080"),
            ("plain", "yes")
        ])));
    }

    #[test]
    fn test_malformed_expressions() {
        for input in ["", "(", "port=8080", "(port=8080", "(&)", "((port=1))", "(port=1)x"] {
            assert!(
                matches!(Filter::parse(input), Err(Error::InvalidFilter(_))),
                "expected InvalidFilter for {input:?}"
            );
        }
    }
}
