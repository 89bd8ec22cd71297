//! Replacement templates.
//!
//! A template is parsed once at compile time into literal text and capture
//! references, then expanded per request.
//!
//! Placeholder syntax:
//! - `$1` .. `$99`: positional group (two digits only when that group exists)
//! - `$0`, `$&`: the whole match
//! - `${name}`, `$<name>`: named group (`${12}` is positional)
//! - `$$`: a literal dollar sign
//!
//! Any other `$` is literal. References to groups that did not take part in
//! the match, or that the pattern does not define, expand to nothing.

use regex::{Captures, Regex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Group(usize),
    Named(String),
    Whole,
}

/// A compiled replacement template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

enum Token {
    Escaped,
    Capture(Segment),
    Plain,
}

impl Template {
    /// Parse `source`, resolving positional references against `pattern`.
    pub fn parse(source: &str, pattern: Option<&Regex>) -> Self {
        let groups = pattern.map_or(0, |re| re.captures_len() - 1);
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(pos) = rest.find('$') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let (token, consumed) = placeholder(after, groups);
            match token {
                Token::Escaped | Token::Plain => literal.push('$'),
                Token::Capture(segment) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
            }
            rest = &after[consumed..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    /// A template with no placeholders.
    pub fn literal(text: &str) -> Self {
        Self::parse(text, None)
    }

    /// The template text as written in the rule.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Append the expansion to `out`.
    ///
    /// `whole` is the matched text, used for `$0`/`$&` and when no
    /// captures are available (exact matchers).
    pub fn expand_into(&self, captures: Option<&Captures<'_>>, whole: &str, out: &mut String) {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Whole => out.push_str(whole),
                Segment::Group(index) => {
                    if let Some(m) = captures.and_then(|c| c.get(*index)) {
                        out.push_str(m.as_str());
                    }
                }
                Segment::Named(name) => {
                    if let Some(m) = captures.and_then(|c| c.name(name)) {
                        out.push_str(m.as_str());
                    }
                }
            }
        }
    }

    pub fn expand(&self, captures: Option<&Captures<'_>>, whole: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + whole.len());
        self.expand_into(captures, whole, &mut out);
        out
    }

    /// Placeholders that `pattern` can never fill, as written (`$3`, `${slug}`).
    pub fn unresolved(&self, pattern: Option<&Regex>) -> Vec<String> {
        let groups = pattern.map_or(0, |re| re.captures_len() - 1);
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Group(index) if *index > groups => Some(format!("${}", index)),
                Segment::Named(name) => {
                    let known = pattern
                        .map(|re| re.capture_names().flatten().any(|n| n == name))
                        .unwrap_or(false);
                    (!known).then(|| format!("${{{}}}", name))
                }
                _ => None,
            })
            .collect()
    }
}

fn placeholder(after: &str, groups: usize) -> (Token, usize) {
    let bytes = after.as_bytes();
    match bytes.first().copied() {
        Some(b'$') => (Token::Escaped, 1),
        Some(b'&') => (Token::Capture(Segment::Whole), 1),
        Some(d @ b'0'..=b'9') => {
            let first = usize::from(d - b'0');
            if let Some(d2 @ b'0'..=b'9') = bytes.get(1).copied() {
                let two = first * 10 + usize::from(d2 - b'0');
                if (1..=groups).contains(&two) {
                    return (Token::Capture(Segment::Group(two)), 2);
                }
            }
            if first == 0 {
                (Token::Capture(Segment::Whole), 1)
            } else {
                (Token::Capture(Segment::Group(first)), 1)
            }
        }
        Some(b'{') => braced(after, '}'),
        Some(b'<') => braced(after, '>'),
        _ => (Token::Plain, 0),
    }
}

fn braced(after: &str, close: char) -> (Token, usize) {
    let Some(end) = after[1..].find(close) else {
        return (Token::Plain, 0);
    };
    let name = &after[1..1 + end];
    if name.is_empty() {
        return (Token::Plain, 0);
    }

    let segment = if name.bytes().all(|b| b.is_ascii_digit()) {
        match name.parse::<usize>() {
            Ok(0) => Segment::Whole,
            Ok(index) => Segment::Group(index),
            Err(_) => return (Token::Plain, 0),
        }
    } else {
        Segment::Named(name.to_string())
    };
    (Token::Capture(segment), end + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(pattern: &str, template: &str, path: &str) -> String {
        let re = Regex::new(pattern).unwrap();
        let caps = re.captures(path).unwrap();
        Template::parse(template, Some(&re)).expand(Some(&caps), &caps[0])
    }

    #[test]
    fn test_positional_group() {
        assert_eq!(render("^/old/(.*)$", "/new/$1", "/old/sub/foo"), "/new/sub/foo");
    }

    #[test]
    fn test_group_followed_by_text() {
        assert_eq!(render("^/(a)$", "/$1b", "/a"), "/ab");
    }

    #[test]
    fn test_two_digit_group_only_when_defined() {
        let many = "^/(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)(l)$";
        assert_eq!(render(many, "$12", "/abcdefghijkl"), "l");
        assert_eq!(render("^/(a)$", "$12", "/a"), "a2");
    }

    #[test]
    fn test_named_groups() {
        let pattern = "^/blog/(?P<year>\\d+)/(?P<slug>[^/]+)$";
        assert_eq!(
            render(pattern, "/posts/${slug}?y=$<year>", "/blog/2019/hello"),
            "/posts/hello?y=2019"
        );
    }

    #[test]
    fn test_whole_match_and_escape() {
        assert_eq!(render("^/a$", "/x$&-$0-$$", "/a"), "/x/a-/a-$");
    }

    #[test]
    fn test_non_participating_group_is_empty() {
        assert_eq!(render("^/a(/b)?$", "/z$1", "/a"), "/z");
    }

    #[test]
    fn test_missing_group_is_empty() {
        assert_eq!(render("^/a$", "/z/$3/${nope}", "/a"), "/z//");
    }

    #[test]
    fn test_plain_dollar_is_literal() {
        let t = Template::literal("/price$/x${");
        assert_eq!(t.expand(None, "/"), "/price$/x${");
    }

    #[test]
    fn test_unresolved_references() {
        let re = Regex::new("^/(?P<id>\\d+)$").unwrap();
        let t = Template::parse("/$1/$2/${id}/${other}", Some(&re));
        assert_eq!(t.unresolved(Some(&re)), vec!["$2".to_string(), "${other}".to_string()]);
    }
}
