//! Policy checks over the BGP sections of an FRR config
//!
//! Every check runs independently and adds its findings to the report; none of
//! them stops the scan. Documents without a `router bgp` section produce no
//! findings at all.

mod report;

pub use report::{Finding, Report, Severity, Verdict};

use log::debug;

use crate::config::ValidateSettings;
use crate::document::ConfigDocument;
use crate::model::{BgpSection, ParsedConfig};

pub fn validate(document: &ConfigDocument, settings: &ValidateSettings) -> Report {
    let parsed = ParsedConfig::from_document(document);
    let mut findings = Vec::new();
    for section in &parsed.sections {
        check_router_id(section, &mut findings);
        check_neighbors(section, &mut findings);
        check_policy_references(&parsed, section, &mut findings);
    }
    check_bogon_filtering(document, &parsed, settings, &mut findings);

    // Stable, so findings on the same line keep their check order
    findings.sort_by_key(|finding| finding.line.unwrap_or(usize::MAX));
    debug!(
        "Validated {} BGP section(s), {} finding(s)",
        parsed.sections.len(),
        findings.len()
    );
    Report {
        path: document.path().map(|p| p.to_path_buf()),
        findings,
    }
}

fn section_name(section: &BgpSection) -> String {
    match &section.vrf {
        Some(vrf) => format!("router bgp {} vrf {}", section.asn, vrf),
        None => format!("router bgp {}", section.asn),
    }
}

fn check_router_id(section: &BgpSection, findings: &mut Vec<Finding>) {
    if section.router_id.is_none() {
        findings.push(Finding::error(
            Some(section.line_number()),
            format!("No BGP router-id configured for {}", section_name(section)),
        ));
    }
}

fn check_neighbors(section: &BgpSection, findings: &mut Vec<Finding>) {
    for neighbor in section.neighbors.iter() {
        let remote_as = match neighbor.remote_as {
            Some(remote_as) => remote_as,
            None => continue,
        };
        let line = Some(remote_as.index + 1);
        if !neighbor.is_activated() {
            findings.push(Finding::warning(
                line,
                format!(
                    "Neighbor {} is not activated in any address-family",
                    neighbor.addr
                ),
            ));
        }
        if neighbor.description.is_none() {
            findings.push(Finding::warning(
                line,
                format!("Neighbor {} has no description", neighbor.addr),
            ));
        }
    }
}

fn check_policy_references(
    parsed: &ParsedConfig,
    section: &BgpSection,
    findings: &mut Vec<Finding>,
) {
    for neighbor in section.neighbors.iter() {
        for entry in &neighbor.policies {
            if !parsed.is_defined(&entry.policy) {
                findings.push(Finding::error(
                    Some(entry.index + 1),
                    format!(
                        "{} '{}' referenced by neighbor {} is not defined",
                        entry.policy.kind, entry.policy.name, neighbor.addr
                    ),
                ));
            }
        }
    }
}

/// Only looks for the marker text anywhere in the document. It doesn't check
/// that a bogon prefix-list is well formed or applied to any neighbor, and it
/// only runs once some neighbor has inbound policy.
fn check_bogon_filtering(
    document: &ConfigDocument,
    parsed: &ParsedConfig,
    settings: &ValidateSettings,
    findings: &mut Vec<Finding>,
) {
    let filters_inbound = parsed
        .sections
        .iter()
        .flat_map(|section| section.neighbors.iter())
        .any(|neighbor| neighbor.has_inbound_policy());
    if filters_inbound && !document.contains(&settings.bogon_marker) {
        findings.push(Finding::warning(
            None,
            format!(
                "No bogon filtering detected (no '{}' in configuration). \
                 Consider adding a prefix-list for bogon networks",
                settings.bogon_marker
            ),
        ));
    }
}
