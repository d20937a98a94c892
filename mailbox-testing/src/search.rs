use mailbox::flag::Flag;

use crate::{message::StoredMessage, Error, Result};

/// A single SEARCH criterion understood by the memory store.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Criterion {
    All,
    Answered,
    Unanswered,
    Deleted,
    Undeleted,
    Draft,
    Flagged,
    Unflagged,
    Seen,
    Unseen,
    Keyword(String),
    Unkeyword(String),
    Subject(String),
    From(String),
    Not(Box<Criterion>),
}

impl Criterion {
    fn matches(&self, msg: &StoredMessage) -> bool {
        match self {
            Self::All => true,
            Self::Answered => msg.flags.is_answered(),
            Self::Unanswered => !msg.flags.is_answered(),
            Self::Deleted => msg.flags.is_deleted(),
            Self::Undeleted => !msg.flags.is_deleted(),
            Self::Draft => msg.flags.is_draft(),
            Self::Flagged => msg.flags.is_flagged(),
            Self::Unflagged => !msg.flags.is_flagged(),
            Self::Seen => msg.flags.is_seen(),
            Self::Unseen => !msg.flags.is_seen(),
            Self::Keyword(kw) => msg.flags.contains(&Flag::custom(kw)),
            Self::Unkeyword(kw) => !msg.flags.contains(&Flag::custom(kw)),
            Self::Subject(s) => contains_ignore_case(&msg.envelope.subject, s),
            Self::From(s) => msg
                .envelope
                .from
                .iter()
                .any(|addr| contains_ignore_case(&addr.to_string(), s)),
            Self::Not(criterion) => !criterion.matches(msg),
        }
    }
}

/// A SEARCH expression: the conjunction of its criteria.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Query(Vec<Criterion>);

impl Query {
    pub fn parse(expr: &str) -> Result<Self> {
        let mut tokens = tokenize(expr).into_iter();
        let mut criteria = Vec::new();

        while let Some(criterion) = parse_criterion(expr, &mut tokens)? {
            criteria.push(criterion);
        }

        Ok(Self(criteria))
    }

    pub fn matches(&self, msg: &StoredMessage) -> bool {
        self.0.iter().all(|criterion| criterion.matches(msg))
    }
}

fn parse_criterion(
    expr: &str,
    tokens: &mut impl Iterator<Item = String>,
) -> Result<Option<Criterion>> {
    let Some(token) = tokens.next() else {
        return Ok(None);
    };

    let criterion = match token.to_ascii_uppercase().as_str() {
        "ALL" => Criterion::All,
        "ANSWERED" => Criterion::Answered,
        "UNANSWERED" => Criterion::Unanswered,
        "DELETED" => Criterion::Deleted,
        "UNDELETED" => Criterion::Undeleted,
        "DRAFT" => Criterion::Draft,
        "FLAGGED" => Criterion::Flagged,
        "UNFLAGGED" => Criterion::Unflagged,
        "SEEN" => Criterion::Seen,
        "UNSEEN" => Criterion::Unseen,
        "KEYWORD" => Criterion::Keyword(arg(expr, tokens)?),
        "UNKEYWORD" => Criterion::Unkeyword(arg(expr, tokens)?),
        "SUBJECT" => Criterion::Subject(arg(expr, tokens)?),
        "FROM" => Criterion::From(arg(expr, tokens)?),
        "NOT" => match parse_criterion(expr, tokens)? {
            Some(criterion) => Criterion::Not(Box::new(criterion)),
            None => return Err(Error::ParseSearchArgumentError(expr.to_owned())),
        },
        _ => return Err(Error::ParseSearchCriterionError(token, expr.to_owned())),
    };

    Ok(Some(criterion))
}

fn arg(expr: &str, tokens: &mut impl Iterator<Item = String>) -> Result<String> {
    tokens
        .next()
        .ok_or_else(|| Error::ParseSearchArgumentError(expr.to_owned()))
}

/// Split the expression by whitespace, keeping double-quoted strings
/// together.
fn tokenize(expr: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut token = String::new();
    let mut quoted = false;

    for c in expr.chars() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !token.is_empty() {
                    tokens.push(std::mem::take(&mut token));
                }
            }
            c => token.push(c),
        }
    }

    if !token.is_empty() {
        tokens.push(token);
    }

    tokens
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::{tokenize, Criterion, Query};
    use crate::Error;

    #[test]
    fn tokenize_quoted_strings() {
        assert_eq!(
            vec!["SUBJECT", "hello world", "UNSEEN"],
            tokenize(r#"SUBJECT "hello world"  UNSEEN"#)
        );
    }

    #[test]
    fn parse_nested_not() {
        let query = Query::parse("not seen keyword $Todo").unwrap();

        assert_eq!(
            Query(vec![
                Criterion::Not(Box::new(Criterion::Seen)),
                Criterion::Keyword("$Todo".into()),
            ]),
            query
        );
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            Query::parse("ALL LARGER 10"),
            Err(Error::ParseSearchCriterionError(token, _)) if token == "LARGER"
        ));
        assert!(matches!(
            Query::parse("SUBJECT"),
            Err(Error::ParseSearchArgumentError(_))
        ));
    }
}
