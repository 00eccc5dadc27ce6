//! Document parser adapter: wraps the external parser call and prepares its
//! output for the generators.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, instrument};

use samplebuilder_shared::{
    HostsConfig, ParsedSample, Project, Result, Sample, SampleBuilderError,
};

use crate::parser::{ParseContext, ParseRequest, ParserHosts, SampleParser};

/// Routing context for one sample, with every URL qualified by the platform host.
pub fn parse_context(sample: &Sample, hosts: &HostsConfig) -> ParseContext {
    let platform = &hosts.platform;
    ParseContext {
        base_path: format!("{platform}{}", sample.routes.base()),
        canonical: format!("{platform}{}", sample.routes.documentation()),
        preview: format!("{platform}{}", sample.routes.preview()),
        hosts: ParserHosts {
            platform: platform.clone(),
            api: hosts.api.clone(),
            backend: hosts.backend.clone(),
            preview: hosts.preview.clone(),
        },
    }
}

/// Parse one sample and post-process the result:
/// - the absolute file path becomes project-relative
/// - the documentation route is attached
/// - every section's markdown is normalized
///
/// Parser failures and documents without a title or sections are returned as
/// errors; the caller skips the sample.
#[instrument(skip_all, fields(sample = %sample.file.relative))]
pub async fn parse_sample<P: SampleParser>(
    parser: &P,
    sample: &Sample,
    hosts: &HostsConfig,
    project: &Project,
) -> Result<ParsedSample> {
    let request = ParseRequest {
        path: sample.file.origin.clone(),
        context: parse_context(sample, hosts),
        contents: sample.file.text()?.to_string(),
    };

    let raw = parser.parse(request).await?;
    let mut parsed = validate(raw, &sample.file.relative)?;

    parsed.file_path = project.relative(Path::new(&parsed.file_path));
    parsed.route = Some(sample.routes.documentation());
    samplebuilder_markdown::normalize_document(&mut parsed.document);

    debug!(
        title = %parsed.document.title,
        sections = parsed.document.sections.len(),
        format = %parsed.format(),
        "parsed sample"
    );
    Ok(parsed)
}

/// Decode the parser's raw output, requiring a non-empty title and a
/// sections list.
fn validate(raw: Value, sample: &str) -> Result<ParsedSample> {
    let parsed: ParsedSample = serde_json::from_value(raw).map_err(|e| {
        SampleBuilderError::parse(format!("parser output for {sample} is incomplete: {e}"))
    })?;

    if parsed.document.title.trim().is_empty() {
        return Err(SampleBuilderError::validation(format!(
            "{sample} has no title"
        )));
    }
    Ok(parsed)
}
