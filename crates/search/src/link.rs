//! Parameterized link templates.
//!
//! A link may contain positional placeholders `{0}`, `{1}`, ... and the
//! wildcard placeholder `{*}`, which expands to every supplied parameter
//! joined by a single space.

use crate::error::{LinkError, Result};

const WILDCARD_PLACEHOLDER: &str = "{*}";

/// Classification of supplied versus required link parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkArity {
    Sufficient,
    Insufficient,
    Excess,
}

impl LinkArity {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkArity::Sufficient => "sufficient",
            LinkArity::Insufficient => "insufficient",
            LinkArity::Excess => "excess",
        }
    }
}

/// Classifies `supplied` parameters against a template's requirements.
///
/// A wildcard template accepts any number of parameters.
pub fn match_arity(count: usize, has_wildcard: bool, supplied: usize) -> LinkArity {
    if has_wildcard {
        return LinkArity::Sufficient;
    }
    if supplied > count {
        LinkArity::Excess
    } else if supplied < count {
        LinkArity::Insufficient
    } else {
        LinkArity::Sufficient
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Positional(usize),
    Wildcard,
}

/// Splits a template into literal runs and placeholders.
///
/// Braces that do not form `{N}` or `{*}` are kept literally.
fn segment_template(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0usize;
    let mut cursor = 0usize;

    while let Some(offset) = template[cursor..].find('{') {
        let open = cursor + offset;
        let Some(close_offset) = template[open..].find('}') else {
            break;
        };
        let close = open + close_offset;
        let inner = &template[open + 1..close];

        let placeholder = if inner == "*" {
            Some(Segment::Wildcard)
        } else if !inner.is_empty() && inner.bytes().all(|byte| byte.is_ascii_digit()) {
            inner.parse::<usize>().ok().map(Segment::Positional)
        } else {
            None
        };

        match placeholder {
            Some(segment) => {
                if literal_start < open {
                    segments.push(Segment::Literal(&template[literal_start..open]));
                }
                segments.push(segment);
                cursor = close + 1;
                literal_start = cursor;
            }
            None => cursor = open + 1,
        }
    }

    if literal_start < template.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }
    segments
}

/// Counts placeholders in a template.
///
/// Returns `max(N) + 1` over all `{N}` placeholders (zero when there are
/// none) and whether `{*}` occurs anywhere.
pub fn parameter_count(template: &str) -> (usize, bool) {
    segment_template(template)
        .into_iter()
        .fold((0usize, false), |(count, wildcard), segment| match segment {
            Segment::Positional(index) => (count.max(index.saturating_add(1)), wildcard),
            Segment::Wildcard => (count, true),
            Segment::Literal(_) => (count, wildcard),
        })
}

/// Substitutes parameters into a template.
///
/// `{N}` is replaced with `parameters[N]` when supplied and left untouched
/// otherwise; `{*}` is replaced with all parameters joined by one space.
pub fn resolve<S: AsRef<str>>(template: &str, parameters: &[S]) -> String {
    let mut resolved = String::with_capacity(template.len());
    for segment in segment_template(template) {
        match segment {
            Segment::Literal(text) => resolved.push_str(text),
            Segment::Positional(index) => match parameters.get(index) {
                Some(value) => resolved.push_str(value.as_ref()),
                None => {
                    resolved.push('{');
                    resolved.push_str(&index.to_string());
                    resolved.push('}');
                }
            },
            Segment::Wildcard => {
                let joined = parameters
                    .iter()
                    .map(AsRef::as_ref)
                    .collect::<Vec<_>>()
                    .join(" ");
                resolved.push_str(&joined);
            }
        }
    }
    resolved
}

/// A link template with its placeholder requirements precomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTemplate {
    template: String,
    count: usize,
    has_wildcard: bool,
}

impl LinkTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let (count, has_wildcard) = parameter_count(&template);
        Self {
            template,
            count,
            has_wildcard,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Number of positional parameters the template requires.
    pub fn parameter_count(&self) -> usize {
        self.count
    }

    pub fn has_wildcard(&self) -> bool {
        self.has_wildcard
    }

    pub fn arity(&self, supplied: usize) -> LinkArity {
        match_arity(self.count, self.has_wildcard, supplied)
    }

    /// Substitutes parameters without checking arity.
    pub fn resolve<S: AsRef<str>>(&self, parameters: &[S]) -> String {
        resolve(&self.template, parameters)
    }

    /// Substitutes parameters, failing when the arity does not match.
    pub fn resolve_checked<S: AsRef<str>>(&self, parameters: &[S]) -> Result<String> {
        let supplied = parameters.len();
        match self.arity(supplied) {
            LinkArity::Sufficient => Ok(self.resolve(parameters)),
            LinkArity::Insufficient => Err(LinkError::Insufficient {
                required: self.count,
                supplied,
            }),
            LinkArity::Excess => Err(LinkError::Excess {
                required: self.count,
                supplied,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_positional_placeholders() {
        assert_eq!(parameter_count("http://x/{0}/{1}"), (2, false));
        assert_eq!(parameter_count("http://x/{2}"), (3, false));
        assert_eq!(parameter_count("http://x/{1}?q={1}"), (2, false));
        assert_eq!(parameter_count("http://x/"), (0, false));
    }

    #[test]
    fn detects_wildcard_placeholder() {
        assert_eq!(parameter_count("http://x/{*}"), (0, true));
        assert_eq!(parameter_count("http://x/{0}/{*}"), (1, true));
    }

    #[test]
    fn ignores_non_placeholder_braces() {
        assert_eq!(parameter_count("http://x/{a}/{}/{-1}"), (0, false));
        assert_eq!(resolve("{a}{0}", &["v"]), "{a}v");
        assert_eq!(parameter_count("{{0}}"), (1, false));
        assert_eq!(resolve("{{0}}", &["v"]), "{v}");
    }

    #[test]
    fn resolves_positional_parameters() {
        assert_eq!(resolve("http://x/{0}/{1}", &["a", "b"]), "http://x/a/b");
        assert_eq!(resolve("{1}-{0}-{1}", &["a", "b"]), "b-a-b");
    }

    #[test]
    fn missing_parameters_leave_placeholder() {
        assert_eq!(resolve("http://x/{0}/{1}", &["a"]), "http://x/a/{1}");
    }

    #[test]
    fn resolves_wildcard_with_space_join() {
        assert_eq!(resolve("http://x/{*}", &["a", "b", "c"]), "http://x/a b c");
        let none: [&str; 0] = [];
        assert_eq!(resolve("http://x/{*}", &none), "http://x/");
    }

    #[test]
    fn arity_verdicts() {
        assert_eq!(match_arity(2, false, 1), LinkArity::Insufficient);
        assert_eq!(match_arity(2, false, 2), LinkArity::Sufficient);
        assert_eq!(match_arity(2, false, 3), LinkArity::Excess);
        assert_eq!(match_arity(0, true, 3), LinkArity::Sufficient);
        assert_eq!(match_arity(2, true, 0), LinkArity::Sufficient);
    }

    #[test]
    fn template_round_trip() {
        let template = LinkTemplate::new("http://x/{0}/{1}");
        assert_eq!(template.resolve_checked(&["a", "b"]).unwrap(), "http://x/a/b");
        assert_eq!(template.arity(1), LinkArity::Insufficient);
        assert_eq!(template.arity(3), LinkArity::Excess);
        assert_eq!(
            template.resolve_checked(&["a"]),
            Err(LinkError::Insufficient {
                required: 2,
                supplied: 1
            })
        );
        let err = template.resolve_checked(&["a", "b", "c"]).unwrap_err();
        assert_eq!(err.arity(), LinkArity::Excess);

        let wildcard = LinkTemplate::new("http://x/{*}");
        assert_eq!(
            wildcard.resolve_checked(&["a", "b", "c"]).unwrap(),
            "http://x/a b c"
        );
        assert_eq!(wildcard.arity(0), LinkArity::Sufficient);
        assert_eq!(wildcard.arity(7), LinkArity::Sufficient);
    }
}
