use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::utils::rule;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    /// 1-based source line, `None` for document-wide findings
    pub line: Option<usize>,
}

impl Finding {
    pub(super) fn error(line: Option<usize>, message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
            line,
        }
    }

    pub(super) fn warning(line: Option<usize>, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            line,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Line {}: {}", line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Pass,
    PassWithWarnings,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let display = match self {
            Verdict::Pass => "Configuration validation passed with no issues",
            Verdict::PassWithWarnings => "Configuration validation passed with warnings",
            Verdict::Fail => "Configuration validation failed",
        };
        write!(f, "{}", display)
    }
}

/// Findings for one configuration file, in document order
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub path: Option<PathBuf>,
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn verdict(&self) -> Verdict {
        match (self.error_count(), self.warning_count()) {
            (0, 0) => Verdict::Pass,
            (0, _) => Verdict::PassWithWarnings,
            _ => Verdict::Fail,
        }
    }

    /// Process exit code for this report: 1 if any error was found
    pub fn exit_code(&self) -> i32 {
        match self.verdict() {
            Verdict::Fail => 1,
            _ => 0,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Summary: {} errors, {} warnings",
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let path = self
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| String::from("<input>"));
        writeln!(f, "{}", rule('='))?;
        writeln!(f, "BGP Configuration Validation Report: {}", path)?;
        writeln!(f, "{}", rule('='))?;
        writeln!(f)?;
        for (title, findings) in [
            ("ERRORS:", self.errors().collect::<Vec<_>>()),
            ("WARNINGS:", self.warnings().collect::<Vec<_>>()),
        ] {
            writeln!(f, "{}", title)?;
            if findings.is_empty() {
                writeln!(f, "  (none)")?;
            }
            for finding in findings {
                writeln!(f, "  - {}", finding)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{}", self.verdict())?;
        writeln!(f)?;
        writeln!(f, "{}", self.summary())?;
        writeln!(f, "{}", rule('='))
    }
}
