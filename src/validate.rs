//! Documentation/signature consistency checks.

use crate::model::{ClassDoc, FunctionDoc, ModuleDoc, ModuleEntry};
use serde::Serialize;
use std::fmt;

pub const MISSING_DOCUMENTATION: &str = "Documentation is missing.";
pub const RECEIVER_DOCUMENTED: &str =
    "Neither \"self\" nor \"cls\" should appear in the documented parameters.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Success,
    Failure,
}

/// Outcome of validating one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// `path:line @ name`
    pub subject: String,
    pub status: ValidationStatus,
    /// Failure messages joined by newlines; `None` on success
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn new(subject: impl Into<String>) -> Self {
        ValidationResult {
            subject: subject.into(),
            status: ValidationStatus::Success,
            message: None,
        }
    }

    /// Mark as failed and append a message line.
    pub fn append_failure(&mut self, message: impl AsRef<str>) {
        self.status = ValidationStatus::Failure;
        match &mut self.message {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(message.as_ref());
            }
            None => self.message = Some(message.as_ref().to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ValidationStatus::Success
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            ValidationStatus::Success => write!(f, "ok   {}", self.subject),
            ValidationStatus::Failure => {
                write!(f, "FAIL {}", self.subject)?;
                for line in self.message.iter().flat_map(|m| m.lines()) {
                    write!(f, "\n     {line}")?;
                }
                Ok(())
            }
        }
    }
}

impl FunctionDoc {
    pub fn validate(&self) -> ValidationResult {
        let subject = format!("{}:{} @ {}", self.source_path.display(), self.line, self.name);
        let mut result = ValidationResult::new(subject);

        let Some(comment) = &self.comment else {
            result.append_failure(MISSING_DOCUMENTATION);
            return result;
        };

        if comment.params.len() != self.signature.parameters.len() {
            let first_documented = comment.params.first().map(|p| p.name.as_str());
            let receiver_documented = matches!(
                (self.signature.bound.receiver(), first_documented),
                (Some(receiver), Some(first)) if receiver == first
            );
            if receiver_documented {
                result.append_failure(RECEIVER_DOCUMENTED);
            }
            result.append_failure(format!(
                "Mismatching function signature arguments:\nSignature: {}\nDocumentation: {}",
                self.signature.parameter_list(),
                comment.parameter_list()
            ));
        }

        result
    }
}

impl ClassDoc {
    /// One result per method, in method order.
    pub fn validate(&self) -> Vec<ValidationResult> {
        self.methods.iter().map(FunctionDoc::validate).collect()
    }
}

impl ModuleDoc {
    /// Results for every entry in source order.
    pub fn validate(&self) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        for entry in &self.entries {
            match entry {
                ModuleEntry::Class(class) => results.extend(class.validate()),
                ModuleEntry::Function(func) => results.push(func.validate()),
            }
        }
        results
    }
}
