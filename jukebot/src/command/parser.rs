//! Command argument tokenizer
//!
//! Splits command arguments into `-name value` options and a free-text body.
//! Quoted strings (`"..."` or `'...'`) spanning several words are joined into
//! one token; quotes around option values are stripped.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A bare `-` with no option name
    #[error("invalid option given")]
    EmptyOption,

    #[error("unterminated quoted string")]
    UnterminatedQuote,
}

/// A `-name [value]` option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArgument {
    pub name: String,
    pub value: Option<String>,
}

/// Options and body of a command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArguments {
    pub options: Vec<CommandArgument>,
    /// Non-option words joined with single spaces
    pub body: String,
}

impl ParsedArguments {
    /// Value of the first option called `name`
    pub fn option(&self, name: &str) -> Option<&CommandArgument> {
        self.options.iter().find(|option| option.name == name)
    }
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

fn strip_quotes(token: &str) -> &str {
    let mut chars = token.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if is_quote(first) && first == last => {
            &token[first.len_utf8()..token.len() - last.len_utf8()]
        }
        _ => token,
    }
}

/// Join words belonging to one quoted string, keeping the quotes
fn join_quoted(words: &[String]) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::with_capacity(words.len());
    let mut open: Option<(char, String)> = None;

    for word in words {
        match open.as_mut() {
            Some((quote, current)) => {
                current.push(' ');
                current.push_str(word);
                if word.ends_with(*quote) {
                    if let Some((_, joined)) = open.take() {
                        tokens.push(joined);
                    }
                }
            }
            None => match word.chars().next() {
                Some(quote) if is_quote(quote) => {
                    let closed = word.len() > 1 && word.ends_with(quote);
                    if closed {
                        tokens.push(word.clone());
                    } else {
                        open = Some((quote, word.clone()));
                    }
                }
                _ => tokens.push(word.clone()),
            },
        }
    }

    if open.is_some() {
        return Err(ParseError::UnterminatedQuote);
    }
    Ok(tokens)
}

/// Parse command arguments (the words after the command itself)
///
/// ```
/// use jukebot::command::parser::parse_arguments;
///
/// let words: Vec<String> = ["-p", "\"hello", "there\"", "some", "body"]
///     .iter()
///     .map(|w| w.to_string())
///     .collect();
/// let parsed = parse_arguments(&words).unwrap();
/// assert_eq!(parsed.option("p").unwrap().value.as_deref(), Some("hello there"));
/// assert_eq!(parsed.body, "some body");
/// ```
pub fn parse_arguments(words: &[String]) -> Result<ParsedArguments, ParseError> {
    let tokens = join_quoted(words)?;
    let mut parsed = ParsedArguments::default();
    let mut body: Vec<&str> = Vec::new();

    let mut iter = tokens.iter().peekable();
    while let Some(token) = iter.next() {
        if let Some(name) = token.strip_prefix('-') {
            if name.is_empty() {
                return Err(ParseError::EmptyOption);
            }
            let value = iter
                .next_if(|next| !next.starts_with('-'))
                .map(|value| strip_quotes(value).to_string());
            parsed.options.push(CommandArgument {
                name: name.to_string(),
                value,
            });
        } else {
            body.push(token);
        }
    }

    parsed.body = body.join(" ");
    Ok(parsed)
}
