//! Domain model document parser.
//!
//! Domain models are markdown documents with an optional YAML front-matter
//! block followed by a fixed heading schema:
//!
//! ```markdown
//! ---
//! domain_id: investments
//! domain_name: Investments
//! capabilities:
//!   - portfolio_analysis
//! expertise_keywords:
//!   - finance
//! ---
//!
//! # Domain
//!
//! investments
//!
//! ## Description
//!
//! Portfolio construction and market analysis.
//!
//! ## Version
//!
//! 1.2.0
//!
//! ## Tools
//!
//! - market_data
//! ```
//!
//! Front-matter wins for machine-readable fields (id and lists), the body
//! wins for the description. Disagreements are returned as
//! [`FieldConflict`]s instead of failing the parse. JSON documents carrying
//! the same fields (optionally under a `metadata` key) are accepted too.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::domain::errors::ParseError;
use crate::domain::models::descriptor::default_display_name;
use crate::domain::models::{DocumentFormat, DomainModelDescriptor};

pub const HEADING_DOMAIN: &str = "# Domain";
pub const HEADING_DESCRIPTION: &str = "## Description";
pub const HEADING_VERSION: &str = "## Version";
pub const HEADING_CAPABILITIES: &str = "## Capabilities";
pub const HEADING_TOOLS: &str = "## Tools";
pub const HEADING_RULES: &str = "## Rules";
pub const HEADING_EXPERTISE: &str = "## Expertise";

/// Required headings, in the order they are checked.
pub const REQUIRED_HEADINGS: [&str; 3] = [HEADING_DOMAIN, HEADING_DESCRIPTION, HEADING_VERSION];

const KNOWN_HEADINGS: [&str; 7] = [
    HEADING_DOMAIN,
    HEADING_DESCRIPTION,
    HEADING_VERSION,
    HEADING_CAPABILITIES,
    HEADING_TOOLS,
    HEADING_RULES,
    HEADING_EXPERTISE,
];

/// Front-matter and body disagree on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldConflict {
    pub field: &'static str,
    pub front_matter: String,
    pub body: String,
}

/// Parser output: the descriptor plus non-fatal findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub descriptor: DomainModelDescriptor,
    pub conflicts: Vec<FieldConflict>,
}

/// Parse a markdown domain model document.
pub fn parse(raw: &str) -> Result<DomainModelDescriptor, ParseError> {
    parse_document(raw).map(|doc| doc.descriptor)
}

/// Parse a markdown document, keeping front-matter/body conflicts.
pub fn parse_document(raw: &str) -> Result<ParsedDocument, ParseError> {
    let (front_matter, body) = split_front_matter(raw)?;
    let front = match front_matter {
        Some(yaml) if !yaml.trim().is_empty() => {
            let value: Value = serde_yaml::from_str(yaml)
                .map_err(|e| ParseError::InvalidFrontMatter(e.to_string()))?;
            FrontMatter::from_value(&value)?
        }
        _ => FrontMatter::default(),
    };

    let sections = BodySections::scan(body);
    for heading in REQUIRED_HEADINGS {
        if !sections.has(heading) {
            return Err(ParseError::MissingRequiredHeading(heading.to_string()));
        }
    }

    let mut conflicts = Vec::new();

    let body_domain = sections.first_line(HEADING_DOMAIN);
    let domain_id = pick_front_first("domain_id", front.domain_id, body_domain, &mut conflicts);

    let body_description = sections.paragraph(HEADING_DESCRIPTION);
    let description = pick_body_first(
        "description",
        front.description,
        body_description,
        &mut conflicts,
    );

    let body_version = sections.first_line(HEADING_VERSION);
    let version = pick_body_first("version", front.version, body_version, &mut conflicts);

    let capabilities = pick_list(
        "capabilities",
        front.capabilities,
        sections.bullets(HEADING_CAPABILITIES),
        &mut conflicts,
    );
    let tools = pick_list("tools", front.tools, sections.bullets(HEADING_TOOLS), &mut conflicts);
    let rule_sets = pick_list(
        "rule_sets",
        front.rule_sets,
        sections.bullets(HEADING_RULES),
        &mut conflicts,
    );
    let expertise_keywords = pick_list(
        "expertise_keywords",
        front.expertise_keywords,
        sections.bullets(HEADING_EXPERTISE),
        &mut conflicts,
    );

    let domain_name = front
        .domain_name
        .unwrap_or_else(|| default_display_name(&domain_id));

    Ok(ParsedDocument {
        descriptor: DomainModelDescriptor {
            domain_id,
            domain_name,
            description,
            version,
            capabilities,
            tools,
            rule_sets,
            expertise_keywords,
            format: DocumentFormat::Markdown,
            source_path: None,
            loaded_at: None,
        },
        conflicts,
    })
}

/// Parse a JSON domain model document.
///
/// Accepts `{ "metadata": { ... } }` or a flat object. Missing fields become
/// empty and are left for the validator to reject.
pub fn parse_json(raw: &str) -> Result<DomainModelDescriptor, ParseError> {
    let root: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let object = match root.get("metadata") {
        Some(metadata @ serde_json::Value::Object(_)) => metadata,
        _ if root.is_object() => &root,
        _ => {
            return Err(ParseError::InvalidJson(
                "document must be a JSON object".to_string(),
            ))
        }
    };

    let value =
        serde_yaml::to_value(object).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let fields = FrontMatter::from_value(&value).map_err(|e| match e {
        ParseError::InvalidFrontMatter(msg) => ParseError::InvalidJson(msg),
        other => other,
    })?;

    let domain_id = fields.domain_id.unwrap_or_default();
    Ok(DomainModelDescriptor {
        domain_name: fields
            .domain_name
            .unwrap_or_else(|| default_display_name(&domain_id)),
        domain_id,
        description: fields.description.unwrap_or_default(),
        version: fields.version.unwrap_or_default(),
        capabilities: fields.capabilities.unwrap_or_default(),
        tools: fields.tools.unwrap_or_default(),
        rule_sets: fields.rule_sets.unwrap_or_default(),
        expertise_keywords: fields.expertise_keywords.unwrap_or_default(),
        format: DocumentFormat::Json,
        source_path: None,
        loaded_at: None,
    })
}

/// Parse `raw` as the given format.
pub fn parse_with_format(raw: &str, format: DocumentFormat) -> Result<ParsedDocument, ParseError> {
    match format {
        DocumentFormat::Markdown => parse_document(raw),
        DocumentFormat::Json => parse_json(raw).map(|descriptor| ParsedDocument {
            descriptor,
            conflicts: Vec::new(),
        }),
    }
}

/// Parse `raw`, choosing the format from `path`'s extension.
pub fn parse_path(path: &Path, raw: &str) -> Result<ParsedDocument, ParseError> {
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| ParseError::UnsupportedFormat(path.display().to_string()))?;
    parse_with_format(raw, format)
}

#[derive(Serialize)]
struct CanonicalFrontMatter<'a> {
    domain_id: &'a str,
    domain_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    capabilities: &'a [String],
    tools: &'a [String],
    rule_sets: &'a [String],
    expertise_keywords: &'a [String],
}

/// Whether `description` reads back unchanged as a `## Description`
/// paragraph: one line, single-spaced, not a heading or fence.
fn fits_body_paragraph(description: &str) -> bool {
    normalize_ws(description) == description
        && !is_fence(description)
        && !is_heading(description)
}

/// Render a descriptor in the canonical markdown layout.
///
/// Descriptions that would not survive as a body paragraph go into the
/// front-matter and the `## Description` section is left empty, so
/// `parse(&to_markdown(d)?)` yields `d` back.
///
/// # Errors
/// Returns `Render` if the front-matter cannot be serialized.
pub fn to_markdown(descriptor: &DomainModelDescriptor) -> Result<String, ParseError> {
    let in_body = fits_body_paragraph(&descriptor.description);
    let front = CanonicalFrontMatter {
        domain_id: &descriptor.domain_id,
        domain_name: &descriptor.domain_name,
        description: (!in_body).then_some(descriptor.description.as_str()),
        capabilities: &descriptor.capabilities,
        tools: &descriptor.tools,
        rule_sets: &descriptor.rule_sets,
        expertise_keywords: &descriptor.expertise_keywords,
    };
    let yaml = serde_yaml::to_string(&front).map_err(|e| ParseError::Render(e.to_string()))?;

    let mut out = format!("---\n{}---\n\n", yaml.trim_start_matches("---\n"));
    out.push_str(&format!("{HEADING_DOMAIN}\n\n{}\n\n", descriptor.domain_id));
    if in_body {
        out.push_str(&format!(
            "{HEADING_DESCRIPTION}\n\n{}\n\n",
            descriptor.description
        ));
    } else {
        out.push_str(&format!("{HEADING_DESCRIPTION}\n\n"));
    }
    out.push_str(&format!("{HEADING_VERSION}\n\n{}\n", descriptor.version));

    for (heading, items) in [
        (HEADING_CAPABILITIES, &descriptor.capabilities),
        (HEADING_TOOLS, &descriptor.tools),
        (HEADING_RULES, &descriptor.rule_sets),
        (HEADING_EXPERTISE, &descriptor.expertise_keywords),
    ] {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{heading}\n\n"));
        for item in items {
            out.push_str(&format!("- {item}\n"));
        }
    }

    Ok(out)
}

/// Split off a leading `---` delimited front-matter block.
fn split_front_matter(raw: &str) -> Result<(Option<&str>, &str), ParseError> {
    let text = raw.trim_start_matches('\u{feff}').trim_start();

    let Some(after_marker) = text.strip_prefix("---") else {
        return Ok((None, text));
    };
    let Some(after_open) = after_marker
        .strip_prefix('\n')
        .or_else(|| after_marker.strip_prefix("\r\n"))
    else {
        return Ok((None, text));
    };

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Ok((Some(yaml), body));
        }
        offset += line.len();
    }

    Err(ParseError::UnterminatedFrontMatter)
}

/// Structured fields read from front-matter (or a JSON object).
#[derive(Debug, Default)]
struct FrontMatter {
    domain_id: Option<String>,
    domain_name: Option<String>,
    description: Option<String>,
    version: Option<String>,
    capabilities: Option<Vec<String>>,
    tools: Option<Vec<String>>,
    rule_sets: Option<Vec<String>>,
    expertise_keywords: Option<Vec<String>>,
}

impl FrontMatter {
    fn from_value(value: &Value) -> Result<Self, ParseError> {
        let mapping = match value {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Ok(Self::default()),
            _ => {
                return Err(ParseError::InvalidFrontMatter(
                    "front-matter must be a mapping".to_string(),
                ))
            }
        };

        Ok(Self {
            domain_id: scalar(mapping, &["domain_id", "id"]),
            domain_name: scalar(mapping, &["domain_name", "name"]),
            description: scalar(mapping, &["description"]),
            version: scalar(mapping, &["version"]),
            capabilities: list(mapping, &["capabilities"]),
            tools: list(mapping, &["tools"]),
            rule_sets: list(mapping, &["rule_sets", "rules"]),
            expertise_keywords: list(mapping, &["expertise_keywords", "expertise", "keywords"]),
        })
    }
}

fn lookup<'a>(mapping: &'a Mapping, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| mapping.get(Value::String((*key).to_string())))
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn scalar(mapping: &Mapping, keys: &[&str]) -> Option<String> {
    lookup(mapping, keys).and_then(value_to_string)
}

fn list(mapping: &Mapping, keys: &[&str]) -> Option<Vec<String>> {
    match lookup(mapping, keys)? {
        Value::Sequence(seq) => Some(seq.iter().filter_map(value_to_string).collect()),
        Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(ToString::to_string)
                .collect(),
        ),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

/// A body line and whether it sits inside a fenced code block.
#[derive(Clone, Copy)]
struct BodyLine<'a> {
    text: &'a str,
    fenced: bool,
}

/// Body lines grouped under the known headings.
///
/// Fence delimiters are dropped; fenced lines are kept as text but never
/// read as headings or bullets.
struct BodySections<'a> {
    sections: HashMap<&'static str, Vec<BodyLine<'a>>>,
}

impl<'a> BodySections<'a> {
    fn scan(body: &'a str) -> Self {
        let mut sections: HashMap<&'static str, Vec<BodyLine<'a>>> = HashMap::new();
        let mut current: Option<&'static str> = None;
        let mut in_fence = false;

        for line in body.lines() {
            let trimmed = line.trim();

            if is_fence(trimmed) {
                in_fence = !in_fence;
                continue;
            }
            if !in_fence && is_heading(trimmed) {
                current = KNOWN_HEADINGS
                    .iter()
                    .find(|known| **known == trimmed)
                    .copied()
                    .filter(|known| !sections.contains_key(known));
                if let Some(heading) = current {
                    sections.insert(heading, Vec::new());
                }
                continue;
            }

            if let Some(heading) = current {
                if let Some(lines) = sections.get_mut(heading) {
                    lines.push(BodyLine {
                        text: line,
                        fenced: in_fence,
                    });
                }
            }
        }

        Self { sections }
    }

    fn has(&self, heading: &str) -> bool {
        self.sections.contains_key(heading)
    }

    fn body_lines(&self, heading: &str) -> impl Iterator<Item = BodyLine<'a>> + '_ {
        self.sections
            .get(heading)
            .into_iter()
            .flat_map(|lines| lines.iter().copied())
    }

    fn lines(&self, heading: &str) -> impl Iterator<Item = &'a str> + '_ {
        self.body_lines(heading).map(|line| line.text)
    }

    fn first_line(&self, heading: &str) -> Option<String> {
        self.lines(heading)
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(ToString::to_string)
    }

    fn paragraph(&self, heading: &str) -> Option<String> {
        let text = self
            .lines(heading)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!text.is_empty()).then_some(text)
    }

    fn bullets(&self, heading: &str) -> Option<Vec<String>> {
        if !self.has(heading) {
            return None;
        }
        Some(
            self.body_lines(heading)
                .filter(|line| !line.fenced)
                .filter_map(|line| bullet_item(line.text))
                .collect(),
        )
    }
}

fn is_fence(line: &str) -> bool {
    line.starts_with("```") || line.starts_with("~~~")
}

/// ATX heading: one to six `#` followed by a space or end of line.
fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&hashes) && line[hashes..].chars().next().is_none_or(char::is_whitespace)
}

fn bullet_item(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let rest = ["- ", "* ", "+ "]
        .iter()
        .find_map(|marker| trimmed.strip_prefix(marker))
        .or_else(|| matches!(trimmed.trim_end(), "-" | "*" | "+").then_some(""))?;

    let item = rest.trim();
    let item = item
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
        .unwrap_or(item);
    Some(item.to_string())
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn pick_front_first(
    field: &'static str,
    front: Option<String>,
    body: Option<String>,
    conflicts: &mut Vec<FieldConflict>,
) -> String {
    record_conflict(field, front.as_deref(), body.as_deref(), conflicts);
    front
        .filter(|v| !v.is_empty())
        .or(body)
        .unwrap_or_default()
}

fn pick_body_first(
    field: &'static str,
    front: Option<String>,
    body: Option<String>,
    conflicts: &mut Vec<FieldConflict>,
) -> String {
    record_conflict(field, front.as_deref(), body.as_deref(), conflicts);
    body.or(front).unwrap_or_default()
}

fn record_conflict(
    field: &'static str,
    front: Option<&str>,
    body: Option<&str>,
    conflicts: &mut Vec<FieldConflict>,
) {
    if let (Some(front), Some(body)) = (front, body) {
        if !front.is_empty() && normalize_ws(front) != normalize_ws(body) {
            conflicts.push(FieldConflict {
                field,
                front_matter: front.to_string(),
                body: body.to_string(),
            });
        }
    }
}

fn pick_list(
    field: &'static str,
    front: Option<Vec<String>>,
    body: Option<Vec<String>>,
    conflicts: &mut Vec<FieldConflict>,
) -> Vec<String> {
    if let (Some(front), Some(body)) = (&front, &body) {
        let front_set: HashSet<&String> = front.iter().collect();
        let body_set: HashSet<&String> = body.iter().collect();
        if !body.is_empty() && front_set != body_set {
            conflicts.push(FieldConflict {
                field,
                front_matter: front.join(", "),
                body: body.join(", "),
            });
        }
    }
    front.or(body).unwrap_or_default()
}
