//! Descriptive, read-only summary of FRR config files

use std::fmt;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use ipnetwork::IpNetwork;
use itertools::Itertools;
use log::debug;
use serde::Serialize;

use crate::config::ValidateSettings;
use crate::document::{ConfigDocument, PolicyRef, RouteMapAction};
use crate::model::{BgpSection, Interface, Neighbor, ParsedConfig};

/// Peering type, by AS number equality only (confederations aren't considered)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PeerKind {
    #[serde(rename = "iBGP")]
    Ibgp,
    #[serde(rename = "eBGP")]
    Ebgp,
}

impl fmt::Display for PeerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let display = match self {
            PeerKind::Ibgp => "iBGP",
            PeerKind::Ebgp => "eBGP",
        };
        write!(f, "{}", display)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PeerSummary {
    pub addr: Ipv4Addr,
    pub remote_as: u32,
    pub kind: PeerKind,
    pub description: Option<String>,
    pub policies: Vec<PolicyRef>,
    pub activated: bool,
    pub soft_reconfiguration: bool,
    pub maximum_prefix: Option<u32>,
}

impl PeerSummary {
    fn new(section: &BgpSection, neighbor: &Neighbor, remote_as: u32) -> Self {
        let kind = match section.is_ibgp(neighbor) {
            Some(true) => PeerKind::Ibgp,
            _ => PeerKind::Ebgp,
        };
        Self {
            addr: neighbor.addr,
            remote_as,
            kind,
            description: neighbor.description.clone(),
            policies: neighbor
                .policies
                .iter()
                .map(|entry| entry.policy.clone())
                .collect(),
            activated: neighbor.is_activated(),
            soft_reconfiguration: neighbor.soft_reconfiguration,
            maximum_prefix: neighbor.maximum_prefix,
        }
    }

    /// E.g. "route-map IMPORT (in), prefix-list BOGONS (in)"
    pub fn policy_summary(&self) -> String {
        if self.policies.is_empty() {
            String::from("none")
        } else {
            self.policies.iter().join(", ")
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SectionSummary {
    pub asn: u32,
    pub vrf: Option<String>,
    pub router_id: Option<Ipv4Addr>,
    pub peers: Vec<PeerSummary>,
    pub networks: Vec<IpNetwork>,
}

impl SectionSummary {
    fn new(section: &BgpSection) -> Self {
        Self {
            asn: section.asn,
            vrf: section.vrf.clone(),
            router_id: section.router_id,
            peers: section
                .neighbors
                .iter()
                .filter_map(|n| n.remote_as.map(|remote| PeerSummary::new(section, n, remote.asn)))
                .collect(),
            networks: section.networks.iter().map(|n| n.prefix).collect(),
        }
    }

    pub fn count(&self, kind: PeerKind) -> usize {
        self.peers.iter().filter(|p| p.kind == kind).count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteMapEntry {
    pub seq: u32,
    pub action: RouteMapAction,
}

impl fmt::Display for RouteMapEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "seq {}: {}", self.seq, self.action)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteMapSummary {
    pub name: String,
    pub entries: Vec<RouteMapEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InterfaceSummary {
    pub name: String,
    pub vrf: Option<String>,
    pub up: bool,
    pub description: Option<String>,
    pub addresses: Vec<IpNetwork>,
}

impl From<&Interface> for InterfaceSummary {
    fn from(interface: &Interface) -> Self {
        Self {
            name: interface.name.clone(),
            vrf: interface.vrf.clone(),
            up: interface.is_up(),
            description: interface.description.clone(),
            addresses: interface.addresses.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FileAnalysis {
    pub path: Option<PathBuf>,
    pub sections: Vec<SectionSummary>,
    pub route_maps: Vec<RouteMapSummary>,
    pub prefix_lists: Vec<String>,
    pub as_path_filters: Vec<String>,
    pub community_lists: Vec<String>,
    pub interfaces: Vec<InterfaceSummary>,
    pub recommendations: Vec<String>,
}

pub fn analyze(document: &ConfigDocument, settings: &ValidateSettings) -> FileAnalysis {
    let parsed = ParsedConfig::from_document(document);
    let sections: Vec<_> = parsed.sections.iter().map(SectionSummary::new).collect();
    let route_maps = parsed
        .route_map_names()
        .into_iter()
        .map(|name| RouteMapSummary {
            name: name.to_string(),
            entries: parsed
                .route_map_entries(name)
                .map(|rm| RouteMapEntry {
                    seq: rm.seq,
                    action: rm.action,
                })
                .collect(),
        })
        .collect();
    let recommendations = recommendations(document, &parsed, settings);
    debug!(
        "Analyzed {} BGP section(s), {} interface(s)",
        sections.len(),
        parsed.interfaces.len()
    );
    FileAnalysis {
        path: document.path().map(|p| p.to_path_buf()),
        sections,
        route_maps,
        prefix_lists: parsed.prefix_lists.iter().cloned().collect(),
        as_path_filters: parsed.as_path_filters.iter().cloned().collect(),
        community_lists: parsed.community_lists.iter().cloned().collect(),
        interfaces: parsed.interfaces.iter().map(InterfaceSummary::from).collect(),
        recommendations,
    }
}

fn recommendations(
    document: &ConfigDocument,
    parsed: &ParsedConfig,
    settings: &ValidateSettings,
) -> Vec<String> {
    let mut recommendations = Vec::new();
    if parsed.sections.is_empty() {
        return recommendations;
    }
    for section in &parsed.sections {
        if section.router_id.is_none() {
            recommendations.push(format!(
                "Consider configuring an explicit BGP router-id for router bgp {}",
                section.asn
            ));
        }
    }
    if !parsed.sections.iter().any(|s| s.log_neighbor_changes) {
        recommendations.push(String::from(
            "Enable 'bgp log-neighbor-changes' for better monitoring",
        ));
    }

    let peers: Vec<&Neighbor> = parsed.sections.iter().flat_map(|s| s.peers()).collect();
    if !peers.is_empty() && !peers.iter().any(|n| n.maximum_prefix.is_some()) {
        recommendations.push(String::from(
            "Consider configuring maximum-prefix limits on peers",
        ));
    }
    for neighbor in &peers {
        if !neighbor.is_activated() {
            recommendations.push(format!(
                "Activate neighbor {} in an address-family",
                neighbor.addr
            ));
        }
        if neighbor.description.is_none() {
            recommendations.push(format!("Add a description to neighbor {}", neighbor.addr));
        }
        if !neighbor.soft_reconfiguration {
            recommendations.push(format!(
                "Consider enabling soft-reconfiguration inbound on {} for policy changes",
                neighbor.addr
            ));
        }
    }
    if !document.contains(&settings.bogon_marker) {
        recommendations.push(String::from(
            "Implement bogon prefix filtering for security",
        ));
    }
    recommendations
}
