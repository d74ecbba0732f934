use caja_client::ClientError;
use serde_json::Value;

pub fn render_error(error: &ClientError) -> String {
    let mut lines = vec![
        "Something went wrong, but it's easy to fix.".to_string(),
        String::new(),
        format!("  Error:    {}", error.code),
        format!("  Details:  {}", error.message),
    ];

    let issues = validation_issues(error);
    if !issues.is_empty() {
        lines.push(String::new());
        lines.push("Fields to fix:".to_string());
        lines.extend(issues);
    }

    lines.push(String::new());
    lines.push("What to do next:".to_string());
    if error.recovery_steps.is_empty() {
        lines.push("  1. Retry the command.".to_string());
    } else {
        for (index, step) in error.recovery_steps.iter().enumerate() {
            lines.push(format!("  {}. {step}", index + 1));
        }
    }

    if let Some((command, section)) = help_pointer(error) {
        lines.push(String::new());
        lines.push(format!("See \"{section}\" in `{command}`."));
    }

    lines.join("\n")
}

fn help_pointer(error: &ClientError) -> Option<(&str, &str)> {
    let data = error.data.as_ref()?;
    let command = data.get("help_command").and_then(Value::as_str)?;
    let section = data.get("help_section_title").and_then(Value::as_str)?;
    Some((command, section))
}

fn validation_issues(error: &ClientError) -> Vec<String> {
    error
        .data
        .as_ref()
        .and_then(|data| data.get("issues"))
        .and_then(Value::as_array)
        .map(|issues| {
            issues
                .iter()
                .map(|issue| {
                    let field = issue.get("field").and_then(Value::as_str).unwrap_or("?");
                    let description = issue
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or("");
                    format!("  - {field}: {description}")
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use caja_client::ClientError;
    use caja_client::contracts::types::FieldIssue;

    use super::render_error;

    #[test]
    fn renders_standard_error_layout() {
        let error = ClientError::invalid_argument_with_recovery(
            "bad input",
            vec!["run caja --help".to_string()],
        );

        let rendered = render_error(&error);
        assert!(rendered.starts_with("Something went wrong, but it's easy to fix."));
        assert!(rendered.contains("  Error:    invalid_argument"));
        assert!(rendered.contains("  Details:  bad input"));
        assert!(rendered.contains("What to do next:"));
        assert!(rendered.contains("  1. run caja --help"));
        assert!(!rendered.contains("Fields to fix:"));
    }

    #[test]
    fn lists_validation_issues() {
        let error = ClientError::movement_validation_failed(vec![FieldIssue {
            field: "amount".to_string(),
            code: "non_positive_amount".to_string(),
            description: "amount must be greater than zero".to_string(),
            expected: None,
            received: Some("-5".to_string()),
        }]);

        let rendered = render_error(&error);
        assert!(rendered.contains("Fields to fix:"));
        assert!(rendered.contains("  - amount: amount must be greater than zero"));
    }

    #[test]
    fn import_errors_point_at_help_section() {
        let error = ClientError::invalid_import_format("not JSON or CSV", "unknown");
        let rendered = render_error(&error);
        assert!(rendered.ends_with("See \"Import fields\" in `caja import --help`."));
    }
}
