//! Context resolution command handler

use anyhow::{Context, Result};

use crate::cli::output::print_json;
use crate::domain::models::{ContextBundle, ContextQuery};
use crate::services::ContextService;

/// Handle `resolve`
pub async fn handle_resolve(
    service: &ContextService,
    domains: Vec<String>,
    keywords: Vec<String>,
    request_id: Option<String>,
    json: bool,
) -> Result<()> {
    let query = ContextQuery {
        request_id,
        domain_ids: domains,
        keywords,
    };
    let bundle = service
        .resolve(query)
        .await
        .context("Failed to resolve context")?;

    if json {
        print_json(&bundle)
    } else {
        print_bundle(&bundle);
        Ok(())
    }
}

fn print_bundle(bundle: &ContextBundle) {
    println!("Request:  {}", bundle.request_id);
    println!("Outcome:  {}", bundle.outcome);
    if !bundle.detail.is_empty() {
        println!("Detail:   {}", bundle.detail);
    }
    for domain in &bundle.domains {
        println!("\n{} ({}, v{})", domain.domain_name, domain.domain_id, domain.version);
        if !domain.capabilities.is_empty() {
            println!("  capabilities: {}", domain.capabilities.join(", "));
        }
        if !domain.tools.is_empty() {
            println!("  tools:        {}", domain.tools.join(", "));
        }
        if !domain.rule_sets.is_empty() {
            println!("  rule sets:    {}", domain.rule_sets.join(", "));
        }
    }
}
