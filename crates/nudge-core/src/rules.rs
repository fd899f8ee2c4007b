//! Extra substitution rules.
//!
//! Rules are written sed-style, `s<d>pattern<d>replacement<d>flags`, where
//! `<d>` is any punctuation character (`s/a/b/g`, `s#v\d+#v${major}#`).
//! The delimiter can be escaped with a backslash inside the pattern or the
//! replacement.
//!
//! Before a rule is applied, `${major}`, `${minor}`, `${patch}` and
//! `${version}` in the replacement are expanded from the new version. Other
//! `$1` / `${name}` references keep their regex capture-group meaning.
//!
//! Flags: `g` replace every match (default is the first match only), `i`
//! case-insensitive, `m` multi-line anchors, `s` dot matches newline.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use semver::Version;
use thiserror::Error;

/// Errors from parsing a substitution rule.
#[derive(Error, Debug)]
pub enum RuleError {
    /// The expression is not of the form `s/pattern/replacement/flags`.
    #[error("malformed replace rule {0:?} (expected s/pattern/replacement/flags)")]
    Syntax(String),

    /// An unsupported flag was given.
    #[error("unknown flag {flag:?} in replace rule {rule:?}")]
    UnknownFlag {
        /// The offending flag.
        flag: char,
        /// The full rule.
        rule: String,
    },

    /// The pattern is not a valid regular expression.
    #[error("invalid pattern in replace rule: {0}")]
    Regex(#[from] regex::Error),
}

/// Result alias for rule parsing.
pub type RuleResult<T> = Result<T, RuleError>;

/// A pattern → replacement pair applied after the version substitution.
#[derive(Debug, Clone)]
pub struct SubstitutionRule {
    source: String,
    pattern: Regex,
    replacement: String,
    global: bool,
}

impl SubstitutionRule {
    /// Parse a sed-style `s/pattern/replacement/flags` expression.
    pub fn parse(expr: &str) -> RuleResult<Self> {
        let syntax = || RuleError::Syntax(expr.to_string());

        let rest = expr.strip_prefix('s').ok_or_else(syntax)?;
        let delimiter = rest.chars().next().ok_or_else(syntax)?;
        if delimiter.is_alphanumeric() || delimiter.is_whitespace() || delimiter == '\\' {
            return Err(syntax());
        }

        let parts = split_unescaped(&rest[delimiter.len_utf8()..], delimiter);
        let [pattern, replacement, flags] = parts.as_slice() else {
            return Err(syntax());
        };

        let mut builder = RegexBuilder::new(pattern);
        let mut global = false;
        for flag in flags.chars() {
            match flag {
                'g' => global = true,
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                other => {
                    return Err(RuleError::UnknownFlag {
                        flag: other,
                        rule: expr.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            source: expr.to_string(),
            pattern: builder.build()?,
            replacement: replacement.clone(),
            global,
        })
    }

    /// Apply the rule to `content`, expanding version tokens from `version`.
    pub fn apply(&self, content: &str, version: &Version) -> String {
        let replacement = expand_version_tokens(&self.replacement, version);
        if self.global {
            self.pattern
                .replace_all(content, replacement.as_str())
                .into_owned()
        } else {
            self.pattern
                .replace(content, replacement.as_str())
                .into_owned()
        }
    }
}

impl FromStr for SubstitutionRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SubstitutionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn expand_version_tokens(replacement: &str, version: &Version) -> String {
    replacement
        .replace("${major}", &version.major.to_string())
        .replace("${minor}", &version.minor.to_string())
        .replace("${patch}", &version.patch.to_string())
        .replace("${version}", &version.to_string())
}

/// Split on `delimiter`, turning `\<delimiter>` into a literal delimiter.
///
/// Other backslash escapes are kept as-is for the regex engine.
fn split_unescaped(input: &str, delimiter: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&delimiter) {
            current.push(delimiter);
            chars.next();
        } else if c == '\\' {
            current.push(c);
            if let Some(escaped) = chars.next() {
                current.push(escaped);
            }
        } else if c == delimiter {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn parses_basic_rule() {
        let rule = SubstitutionRule::parse("s/foo/bar/").unwrap();
        assert_eq!(rule.apply("foo foo", &v("1.0.0")), "bar foo");
    }

    #[test]
    fn global_flag_replaces_all() {
        let rule: SubstitutionRule = "s/foo/bar/g".parse().unwrap();
        assert_eq!(rule.apply("foo foo", &v("1.0.0")), "bar bar");
    }

    #[test]
    fn case_insensitive_flag() {
        let rule = SubstitutionRule::parse("s/FOO/bar/gi").unwrap();
        assert_eq!(rule.apply("foo Foo", &v("1.0.0")), "bar bar");
    }

    #[test]
    fn alternate_delimiter_and_escapes() {
        let rule = SubstitutionRule::parse(r"s#a\#b#c#").unwrap();
        assert_eq!(rule.apply("a#b", &v("1.0.0")), "c");

        let rule = SubstitutionRule::parse(r"s/\d+\/x/y/").unwrap();
        assert_eq!(rule.apply("12/x", &v("1.0.0")), "y");
    }

    #[test]
    fn version_tokens_expand() {
        let rule = SubstitutionRule::parse(r"s/v\d+\.\d+/v${major}.${minor}/g").unwrap();
        assert_eq!(rule.apply("docs for v1.4", &v("2.3.7")), "docs for v2.3");

        let rule = SubstitutionRule::parse("s/@latest/@${version}/").unwrap();
        assert_eq!(rule.apply("pkg@latest", &v("2.3.7-rc.1")), "pkg@2.3.7-rc.1");

        let rule = SubstitutionRule::parse("s/p=0/p=${patch}/").unwrap();
        assert_eq!(rule.apply("p=0", &v("2.3.7")), "p=7");
    }

    #[test]
    fn capture_groups_still_work() {
        let rule = SubstitutionRule::parse(r"s/(name)=\w+/${1}=${major}/").unwrap();
        assert_eq!(rule.apply("name=old", &v("5.0.0")), "name=5");
    }

    #[test]
    fn multi_line_flag() {
        let rule = SubstitutionRule::parse("s/^x$/y/gm").unwrap();
        assert_eq!(rule.apply("x\nx\n", &v("1.0.0")), "y\ny\n");
    }

    #[test]
    fn rejects_malformed() {
        for expr in ["", "x/a/b/", "s", "s/a/b", "s/a/b/c/d", "sa", "s a b "] {
            assert!(
                matches!(SubstitutionRule::parse(expr), Err(RuleError::Syntax(_))),
                "{expr}"
            );
        }
    }

    #[test]
    fn rejects_unknown_flag() {
        assert!(matches!(
            SubstitutionRule::parse("s/a/b/q"),
            Err(RuleError::UnknownFlag { flag: 'q', .. })
        ));
    }

    #[test]
    fn rejects_bad_regex() {
        assert!(matches!(
            SubstitutionRule::parse("s/(/b/"),
            Err(RuleError::Regex(_))
        ));
    }
}
