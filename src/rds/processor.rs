//! Inspection API for style strings
//!
//! Runs a style string through one compiler stage and renders the result in a
//! chosen format. Formats are named `<stage>-<format>`:
//!
//!     token-simple       one token per line
//!     token-json         token list as JSON
//!     template-treeviz   group tree, see [`to_treeviz_str`]
//!     template-style     the template written back as normalized style text
//!     template-json      group tree as JSON
//!     template-yaml      group tree as YAML
//!     output-simple      evaluated lines, one per line
//!     output-json        evaluated lines as JSON
//!     output-yaml        evaluated lines as YAML
//!
//! The `output` stage evaluates against the metadata passed by the caller.

use crate::rds::metadata::MetadataContext;
use crate::rds::style::formats::{to_style_string, to_treeviz_str};
use crate::rds::style::{evaluate, parse, tokenize, Token};
use thiserror::Error;

/// Which compiler stage to stop at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    Token,
    Template,
    Output,
}

/// How to render the stage's result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Simple,
    Json,
    Yaml,
    Treeviz,
    Style,
}

/// A complete processing specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingSpec {
    pub stage: ProcessingStage,
    pub format: OutputFormat,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("invalid stage: {0}")]
    InvalidStage(String),
    #[error("format '{format}' is not available for stage '{stage}'")]
    Unsupported { stage: String, format: String },
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ProcessingStage {
    pub fn name(&self) -> &'static str {
        match self {
            ProcessingStage::Token => "token",
            ProcessingStage::Template => "template",
            ProcessingStage::Output => "output",
        }
    }
}

impl OutputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Simple => "simple",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Treeviz => "treeviz",
            OutputFormat::Style => "style",
        }
    }
}

impl ProcessingSpec {
    /// Parse a format string like "token-simple" or "template-treeviz"
    pub fn from_string(format_str: &str) -> Result<Self, ProcessingError> {
        let (stage, format) = format_str
            .split_once('-')
            .ok_or_else(|| ProcessingError::InvalidFormat(format_str.to_string()))?;

        let stage = match stage {
            "token" => ProcessingStage::Token,
            "template" => ProcessingStage::Template,
            "output" => ProcessingStage::Output,
            _ => return Err(ProcessingError::InvalidStage(stage.to_string())),
        };
        let format = match format {
            "simple" => OutputFormat::Simple,
            "json" => OutputFormat::Json,
            "yaml" => OutputFormat::Yaml,
            "treeviz" => OutputFormat::Treeviz,
            "style" => OutputFormat::Style,
            _ => return Err(ProcessingError::InvalidFormat(format_str.to_string())),
        };

        let spec = ProcessingSpec { stage, format };
        if Self::available_specs().contains(&spec) {
            Ok(spec)
        } else {
            Err(ProcessingError::Unsupported {
                stage: stage.name().to_string(),
                format: format.name().to_string(),
            })
        }
    }

    /// Get all available processing specifications
    pub fn available_specs() -> Vec<ProcessingSpec> {
        use OutputFormat::*;
        use ProcessingStage::*;
        [
            (Token, Simple),
            (Token, Json),
            (Template, Treeviz),
            (Template, Style),
            (Template, Json),
            (Template, Yaml),
            (Output, Simple),
            (Output, Json),
            (Output, Yaml),
        ]
        .into_iter()
        .map(|(stage, format)| ProcessingSpec { stage, format })
        .collect()
    }

    pub fn name(&self) -> String {
        format!("{}-{}", self.stage.name(), self.format.name())
    }
}

/// Get all available format strings
pub fn available_formats() -> Vec<String> {
    ProcessingSpec::available_specs()
        .iter()
        .map(ProcessingSpec::name)
        .collect()
}

/// Process a style string according to the given specification
pub fn process_style(
    source: &str,
    context: &MetadataContext,
    spec: &ProcessingSpec,
) -> Result<String, ProcessingError> {
    match spec.stage {
        ProcessingStage::Token => {
            let tokens = tokenize(source);
            match spec.format {
                OutputFormat::Simple => Ok(format_tokens(&tokens)),
                _ => to_json(&tokens),
            }
        }
        ProcessingStage::Template => {
            let template = parse(source);
            match spec.format {
                OutputFormat::Treeviz => Ok(to_treeviz_str(&template)),
                OutputFormat::Style => Ok(to_style_string(&template)),
                OutputFormat::Yaml => to_yaml(&template),
                _ => to_json(&template),
            }
        }
        ProcessingStage::Output => {
            let output = evaluate(&parse(source), context);
            match spec.format {
                OutputFormat::Simple => Ok(output.lines().join("\n")),
                OutputFormat::Yaml => to_yaml(&output),
                _ => to_json(&output),
            }
        }
    }
}

fn format_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| format!("{:<10} {:?}", token.name(), token.to_string()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, ProcessingError> {
    serde_json::to_string_pretty(value).map_err(|e| ProcessingError::Serialization(e.to_string()))
}

fn to_yaml<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, ProcessingError> {
    serde_yaml::to_string(value).map_err(|e| ProcessingError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rds::style::FieldKind;

    fn process(source: &str, format: &str) -> String {
        let spec = ProcessingSpec::from_string(format).expect("known format");
        let ctx = MetadataContext::new().with(FieldKind::Title, "Silent Night");
        process_style(source, &ctx, &spec).expect("processing succeeds")
    }

    #[test]
    fn test_processing_spec_parsing() {
        let spec = ProcessingSpec::from_string("token-simple").expect("valid");
        assert_eq!(spec.stage, ProcessingStage::Token);
        assert_eq!(spec.format, OutputFormat::Simple);

        assert_eq!(
            ProcessingSpec::from_string("invalid"),
            Err(ProcessingError::InvalidFormat("invalid".into()))
        );
        assert_eq!(
            ProcessingSpec::from_string("ast-json"),
            Err(ProcessingError::InvalidStage("ast".into()))
        );
        assert!(matches!(
            ProcessingSpec::from_string("token-treeviz"),
            Err(ProcessingError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_every_listed_format_parses() {
        for format in available_formats() {
            assert_eq!(
                ProcessingSpec::from_string(&format).map(|spec| spec.name()),
                Ok(format.clone())
            );
        }
        assert_eq!(available_formats().len(), 9);
    }

    #[test]
    fn test_token_simple() {
        assert_eq!(
            process("{T}|x", "token-simple"),
            "FieldOpen  \"{\"\nText       \"T\"\nFieldClose \"}\"\nPipe       \"|\"\nText       \"x\""
        );
    }

    #[test]
    fn test_template_style_normalizes() {
        assert_eq!(process("a[{A}|b", "template-style"), "a[{A}]|b");
    }

    #[test]
    fn test_output_simple() {
        assert_eq!(process("{T}[ by {A}]|Merry", "output-simple"), "Silent Night\nMerry");
    }

    #[test]
    fn test_output_json() {
        let json = process("{T}|{A}", "output-json");
        let lines: Vec<String> = serde_json::from_str(&json).expect("valid json");
        assert_eq!(lines, vec!["Silent Night"]);
    }

    #[test]
    fn test_output_yaml() {
        assert_eq!(process("{T}", "output-yaml"), "- Silent Night\n");
    }
}
