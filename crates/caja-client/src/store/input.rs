use std::fs;
use std::io::{IsTerminal, Read};

use crate::store::invalid_input_error;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum SourceKind {
    File,
    Stdin,
}

impl SourceKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Stdin => "stdin",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedSource {
    pub(crate) source_kind: SourceKind,
    pub(crate) content: String,
}

/// `-` or no path means stdin; a path with piped stdin is ambiguous and
/// rejected.
pub(crate) fn resolve_source(
    path: Option<&str>,
    stdin_override: Option<String>,
) -> ClientResult<ResolvedSource> {
    let stdin_body = read_stdin(stdin_override)?;

    match path {
        Some("-") | None => match stdin_body {
            Some(content) => Ok(ResolvedSource {
                source_kind: SourceKind::Stdin,
                content,
            }),
            None if path.is_some() => Err(invalid_input_error(
                "Path `-` means stdin input, but stdin was empty. Pipe JSON/CSV input or pass a file path.",
            )),
            None => Err(invalid_input_error(
                "No import source provided. Pass a file path or pipe input via stdin.",
            )),
        },
        Some(path_value) => {
            if stdin_body.is_some() {
                return Err(invalid_input_error(
                    "Both stdin and file input were provided. Pass exactly one source: either a file path or piped stdin.",
                ));
            }
            let content = fs::read_to_string(path_value).map_err(|error| {
                ClientError::invalid_argument_with_recovery(
                    &format!("Could not read import file `{path_value}`: {error}"),
                    vec![
                        "Verify the path exists and is readable.".to_string(),
                        "Rerun caja import <path>.".to_string(),
                    ],
                )
            })?;
            Ok(ResolvedSource {
                source_kind: SourceKind::File,
                content,
            })
        }
    }
}

fn read_stdin(stdin_override: Option<String>) -> ClientResult<Option<String>> {
    let buffer = match stdin_override {
        Some(value) => value,
        None => {
            if std::io::stdin().is_terminal() {
                return Ok(None);
            }
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|error| {
                    ClientError::invalid_argument_with_recovery(
                        &format!("Could not read stdin: {error}"),
                        vec![
                            "Retry with an explicit file path argument.".to_string(),
                            "Or rerun with valid stdin content.".to_string(),
                        ],
                    )
                })?;
            buffer
        }
    };

    if buffer.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(buffer))
}

#[cfg(test)]
mod tests {
    use super::{SourceKind, resolve_source};

    #[test]
    fn dash_reads_stdin_override() {
        let resolved = resolve_source(Some("-"), Some("[]".to_string()));
        assert!(resolved.is_ok());
        if let Ok(source) = resolved {
            assert_eq!(source.source_kind, SourceKind::Stdin);
            assert_eq!(source.content, "[]");
        }
    }

    #[test]
    fn empty_stdin_with_dash_is_rejected() {
        let resolved = resolve_source(Some("-"), Some("   ".to_string()));
        assert!(resolved.is_err());
    }

    #[test]
    fn missing_file_reports_invalid_argument() {
        let resolved = resolve_source(Some("/definitely/not/here.json"), Some(String::new()));
        assert!(resolved.is_err());
        if let Err(error) = resolved {
            assert_eq!(error.code, "invalid_argument");
            assert!(error.message.contains("/definitely/not/here.json"));
        }
    }
}
