//! Command parser (C2): turns the raw tail of a chat command into either a
//! positional argument list or a name=value map.

use crate::domain::errors::{CoreError, CoreResult};
use crate::domain::models::ActionSpec;
use crate::domain::ports::ActionArgs;

/// Parse the tail of a command line into arguments.
///
/// If the string looks like `key=value key2=value2` (an unquoted `=` outside
/// a fully-quoted token), it's parsed as a name-keyed map. Otherwise it's
/// tokenized shell-style into a positional list. If tokenization fails
/// (e.g. an unterminated quote), the whole tail is passed through as a
/// single positional argument.
pub fn parse_args(tail: &str) -> ActionArgs {
    let trimmed = tail.trim();
    if trimmed.is_empty() {
        return ActionArgs::Positional(Vec::new());
    }

    match shell_words::split(trimmed) {
        Ok(tokens) => {
            if looks_like_named(&tokens) {
                let mut map = std::collections::HashMap::new();
                for token in tokens {
                    let Some((key, value)) = token.split_once('=') else {
                        continue;
                    };
                    map.insert(key.to_string(), value.to_string());
                }
                ActionArgs::Named(map)
            } else {
                ActionArgs::Positional(tokens)
            }
        }
        Err(_) => ActionArgs::Positional(vec![trimmed.to_string()]),
    }
}

/// True if any token is a `name=value` pair; tokens without `=` are simply
/// skipped when the map is built. A single quoted JSON blob (`{...}` or
/// `[...]`) is never treated as named args even though it may contain `=`.
fn looks_like_named(tokens: &[String]) -> bool {
    if tokens.is_empty() {
        return false;
    }
    if let Some(first) = tokens.first() {
        if first.starts_with('{') || first.starts_with('[') {
            return false;
        }
    }
    tokens.iter().any(|t| t.contains('=') && !t.starts_with('='))
}

/// Validate parsed arguments against an action's spec. A `None` spec accepts
/// anything (extension actions may omit one entirely).
pub fn validate(action_name: &str, spec: Option<&ActionSpec>, args: &ActionArgs) -> CoreResult<()> {
    let Some(spec) = spec else { return Ok(()) };

    match args {
        ActionArgs::Named(map) => {
            let missing: Vec<String> = spec
                .arguments
                .iter()
                .filter(|a| a.required)
                .filter(|a| !map.contains_key(&a.name))
                .map(|a| a.name.clone())
                .collect();
            if !missing.is_empty() {
                return Err(CoreError::MissingRequiredArguments {
                    action: action_name.to_string(),
                    missing,
                });
            }

            let known: std::collections::HashSet<&str> = spec.arguments.iter().map(|a| a.name.as_str()).collect();
            let unknown: Vec<String> = map.keys().filter(|k| !known.contains(k.as_str())).cloned().collect();
            if !unknown.is_empty() {
                return Err(CoreError::UnknownArguments {
                    action: action_name.to_string(),
                    unknown,
                });
            }
        }
        ActionArgs::Positional(list) => {
            let required = spec.required_count();
            if list.len() < required {
                return Err(CoreError::TooFewPositionalArguments {
                    action: action_name.to_string(),
                    required,
                    got: list.len(),
                });
            }
            if list.len() > spec.arguments.len() {
                return Err(CoreError::TooManyPositionalArguments {
                    action: action_name.to_string(),
                    max: spec.arguments.len(),
                    got: list.len(),
                });
            }
        }
    }

    Ok(())
}
