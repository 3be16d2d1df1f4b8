//! Filename classification and destination segment normalisation.
//!
//! # Design
//! - The pattern is compiled once per run; a missing named group is a
//!   construction error rather than a silent miss at processing time.
//! - Matching anchors at the start of the name and is case-insensitive.
//! - Signed detection is a fixed three-step rule: `_signed` wins, then
//!   `unsigned` loses, then any configured keyword wins.

use regex::{Regex, RegexBuilder};
use signet_config::WatchConfig;
use signet_config::defaults::REQUIRED_PATTERN_GROUPS;

use crate::error::{PipelineError, PipelineResult};
use crate::model::FilenameMetadata;

const SIGNED_MARKER: &str = "_signed";
const UNSIGNED_MARKER: &str = "unsigned";
const FORBIDDEN_SEGMENT_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Classifies filenames against the configured pattern and status keywords.
#[derive(Debug, Clone)]
pub struct FilenameClassifier {
    pattern: Regex,
    keywords: Vec<String>,
}

/// Outcome of classifying one filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The name matched and the status marks the document as signed.
    Signed(FilenameMetadata),
    /// The name matched but the status is not a signed one.
    Unsigned(FilenameMetadata),
    /// The name does not follow the expected shape.
    NoMatch,
}

impl Verdict {
    /// Human-readable explanation used in outcomes and previews.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Signed(_) => "Matches pattern and contains signed status",
            Self::Unsigned(_) => "No signed status keyword found",
            Self::NoMatch => "Filename doesn't match pattern",
        }
    }

    /// Parsed metadata, when the name matched.
    #[must_use]
    pub const fn metadata(&self) -> Option<&FilenameMetadata> {
        match self {
            Self::Signed(metadata) | Self::Unsigned(metadata) => Some(metadata),
            Self::NoMatch => None,
        }
    }

    /// Whether the worker would move the file.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Signed(_))
    }
}

impl FilenameClassifier {
    /// Compile `pattern` and keep lowercase copies of `keywords`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidPattern`] when the pattern does not
    /// compile or lacks one of the `doc`, `client`, `date`, `status` groups.
    pub fn new(pattern: &str, keywords: &[String]) -> PipelineResult<Self> {
        let compiled = RegexBuilder::new(&format!("^(?:{pattern})"))
            .case_insensitive(true)
            .build()
            .map_err(|_| PipelineError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "invalid_regex",
            })?;
        let names: Vec<&str> = compiled.capture_names().flatten().collect();
        if REQUIRED_PATTERN_GROUPS
            .iter()
            .any(|group| !names.contains(group))
        {
            return Err(PipelineError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "missing_group",
            });
        }
        Ok(Self {
            pattern: compiled,
            keywords: keywords
                .iter()
                .map(|keyword| keyword.trim().to_lowercase())
                .filter(|keyword| !keyword.is_empty())
                .collect(),
        })
    }

    /// Build a classifier from the watcher configuration.
    ///
    /// # Errors
    ///
    /// See [`FilenameClassifier::new`].
    pub fn from_config(config: &WatchConfig) -> PipelineResult<Self> {
        Self::new(&config.filename_pattern, &config.status_keywords)
    }

    /// Extract the four filename fields, or `None` when the name does not match.
    #[must_use]
    pub fn parse(&self, filename: &str) -> Option<FilenameMetadata> {
        let captures = self.pattern.captures(filename)?;
        let field = |name: &str| captures.name(name).map(|m| m.as_str().to_string());
        Some(FilenameMetadata {
            doc: field("doc")?,
            client: field("client")?,
            date: field("date")?,
            status: field("status")?,
        })
    }

    /// Whether a status segment marks the document as signed.
    #[must_use]
    pub fn is_signed(&self, status: &str) -> bool {
        let status = status.to_lowercase();
        if status.contains(SIGNED_MARKER) {
            return true;
        }
        if status.contains(UNSIGNED_MARKER) {
            return false;
        }
        self.keywords
            .iter()
            .any(|keyword| status.contains(keyword.as_str()))
    }

    /// Parse and judge `filename` in one step.
    #[must_use]
    pub fn verdict(&self, filename: &str) -> Verdict {
        match self.parse(filename) {
            Some(metadata) if self.is_signed(&metadata.status) => Verdict::Signed(metadata),
            Some(metadata) => Verdict::Unsigned(metadata),
            None => Verdict::NoMatch,
        }
    }
}

/// Make a filename segment safe to use as a directory name.
///
/// Drops `< > : " / \ | ? *`, turns each whitespace run into one `_`, and
/// trims `_` and `.` from both ends. Applying it twice changes nothing.
#[must_use]
pub fn normalize_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut in_whitespace = false;
    for ch in segment.chars() {
        if FORBIDDEN_SEGMENT_CHARS.contains(&ch) {
            continue;
        }
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;
        out.push(ch);
    }
    out.trim_matches(|ch| ch == '_' || ch == '.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use signet_config::defaults::FILENAME_PATTERN;

    fn classifier() -> PipelineResult<FilenameClassifier> {
        let keywords = vec![
            "signed".to_string(),
            "executed".to_string(),
            "final".to_string(),
        ];
        FilenameClassifier::new(FILENAME_PATTERN, &keywords)
    }

    fn meta(doc: &str, client: &str, date: &str, status: &str) -> FilenameMetadata {
        FilenameMetadata {
            doc: doc.into(),
            client: client.into(),
            date: date.into(),
            status: status.into(),
        }
    }

    #[test]
    fn parses_well_formed_names() -> PipelineResult<()> {
        let classifier = classifier()?;
        assert_eq!(
            classifier.parse("contract_Acme_2024-01-15_signed.pdf"),
            Some(meta("contract", "Acme", "2024-01-15", "signed"))
        );
        assert_eq!(
            classifier.parse("Invoice_ClientB_20240116_executed.PDF"),
            Some(meta("Invoice", "ClientB", "20240116", "executed"))
        );
        assert_eq!(
            classifier.parse("nda_Beta Corp_2024-0301_fully_signed.pdf"),
            Some(meta("nda", "Beta Corp", "2024-0301", "fully_signed"))
        );
        Ok(())
    }

    #[test]
    fn lazy_segments_split_at_first_underscore() -> PipelineResult<()> {
        let classifier = classifier()?;
        assert_eq!(
            classifier.parse("service_agreement_Acme_2024-01-15_signed.pdf"),
            Some(meta("service", "agreement_Acme", "2024-01-15", "signed"))
        );
        Ok(())
    }

    #[test]
    fn rejects_malformed_names() -> PipelineResult<()> {
        let classifier = classifier()?;
        for name in [
            "random_file.pdf",
            "contract_Acme_2024-01-15_signed.docx",
            "contract_Acme_24-01-15_signed.pdf",
            "contract_2024-01-15_signed.pdf",
            "contract_Acme_2024-01-15_.pdf",
            "xcontract_Acme_2024-01-15_signed.pdf.part",
        ] {
            assert_eq!(classifier.parse(name), None, "{name}");
        }
        Ok(())
    }

    #[test]
    fn signed_detection_follows_precedence() -> PipelineResult<()> {
        let classifier = classifier()?;
        assert!(classifier.is_signed("fully_signed"));
        assert!(classifier.is_signed("Executed"));
        assert!(classifier.is_signed("final_version"));
        assert!(!classifier.is_signed("unsigned_copy"));
        assert!(!classifier.is_signed("draft"));
        assert!(classifier.is_signed("not_signed"));
        Ok(())
    }

    #[test]
    fn verdict_combines_parse_and_status() -> PipelineResult<()> {
        let classifier = classifier()?;
        let signed = classifier.verdict("Contract_ClientA_2024-01-15_signed.pdf");
        assert!(signed.is_signed());
        assert_eq!(signed.reason(), "Matches pattern and contains signed status");

        let unsigned = classifier.verdict("Agreement_ClientC_2024-01-17_unsigned.pdf");
        assert!(matches!(unsigned, Verdict::Unsigned(_)));
        assert_eq!(unsigned.metadata().map(|m| m.client.as_str()), Some("ClientC"));

        assert_eq!(classifier.verdict("random_file.pdf"), Verdict::NoMatch);
        Ok(())
    }

    #[test]
    fn custom_pattern_must_define_required_groups() {
        let keywords = vec!["signed".to_string()];
        let missing = FilenameClassifier::new(r"(?P<doc>.+)\.pdf", &keywords);
        assert!(matches!(
            missing,
            Err(PipelineError::InvalidPattern {
                reason: "missing_group",
                ..
            })
        ));
        let broken = FilenameClassifier::new("(?P<doc>", &keywords);
        assert!(matches!(
            broken,
            Err(PipelineError::InvalidPattern {
                reason: "invalid_regex",
                ..
            })
        ));
    }

    #[test]
    fn normalize_strips_and_collapses() {
        assert_eq!(normalize_segment("Client/Name"), "ClientName");
        assert_eq!(normalize_segment("  a  b  "), "a_b");
        assert_eq!(normalize_segment(r#"a<b>c:d"e\f|g?h*i"#), "abcdefghi");
        assert_eq!(normalize_segment("._report_."), "report");
        assert_eq!(normalize_segment("a < b"), "a_b");
        assert_eq!(normalize_segment("***"), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["  Beta   Corp. ", "x/y\\z", "__a__", "tab\there", "..."] {
            let once = normalize_segment(input);
            assert_eq!(normalize_segment(&once), once, "{input}");
        }
    }
}
