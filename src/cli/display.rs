use std::fmt::Write;

use colored::*;
use itertools::Itertools;
use prettytable::{cell, row, Row};

use crate::analyze::{FileAnalysis, InterfaceSummary, PeerKind, PeerSummary, SectionSummary};
use crate::fix::FixRun;
use crate::utils::{maybe_string, rule, EMPTY_VALUE};
use crate::validate::{Report, Verdict};

use super::table::{OutputTable, ToRow};

pub struct PeerRow<'a>(pub &'a PeerSummary);

impl ToRow for PeerRow<'_> {
    fn columns() -> Row {
        row!["Neighbor", "AS", "Type", "Description", "Activated", "MaxPfx"]
    }

    fn to_row(&self) -> Row {
        let peer = self.0;
        row![
            peer.addr,
            peer.remote_as,
            peer.kind,
            maybe_string(peer.description.as_ref()),
            if peer.activated { "yes" } else { "no" },
            maybe_string(peer.maximum_prefix.as_ref()),
        ]
    }
}

pub struct InterfaceRow<'a>(pub &'a InterfaceSummary);

impl ToRow for InterfaceRow<'_> {
    fn columns() -> Row {
        row!["Interface", "VRF", "Status", "Addresses", "Description"]
    }

    fn to_row(&self) -> Row {
        let interface = self.0;
        let addresses = if interface.addresses.is_empty() {
            String::from(EMPTY_VALUE)
        } else {
            interface.addresses.iter().join(", ")
        };
        row![
            interface.name,
            maybe_string(interface.vrf.as_ref()),
            if interface.up { "up" } else { "down" },
            addresses,
            maybe_string(interface.description.as_ref()),
        ]
    }
}

fn section_title(section: &SectionSummary) -> String {
    match &section.vrf {
        Some(vrf) => format!("router bgp {} vrf {}", section.asn, vrf),
        None => format!("router bgp {}", section.asn),
    }
}

/// Plain-text analysis report for one file
pub fn analysis_text(analysis: &FileAnalysis) -> String {
    let path = analysis
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| String::from("<input>"));
    let mut out = String::new();
    write_analysis(&mut out, analysis, &path).expect("Error formatting analysis");
    out
}

fn write_analysis(out: &mut String, analysis: &FileAnalysis, path: &str) -> std::fmt::Result {
    writeln!(out, "{}", rule('='))?;
    writeln!(out, "FRR Configuration Analysis Report: {}", path)?;
    writeln!(out, "{}", rule('='))?;

    for section in &analysis.sections {
        writeln!(out)?;
        writeln!(out, "BGP Peer Summary ({})", section_title(section))?;
        writeln!(out, "{}", rule('-'))?;
        writeln!(out, "  Router ID: {}", maybe_string(section.router_id.as_ref()))?;
        writeln!(
            out,
            "  Peers: {} ({} iBGP, {} eBGP)",
            section.peers.len(),
            section.count(PeerKind::Ibgp),
            section.count(PeerKind::Ebgp)
        )?;
        if !section.peers.is_empty() {
            let mut table = OutputTable::new();
            for peer in &section.peers {
                table.add_row(&PeerRow(peer));
            }
            write!(out, "{}", table.render())?;
        }

        writeln!(out)?;
        writeln!(out, "Policy Summary")?;
        writeln!(out, "{}", rule('-'))?;
        for peer in &section.peers {
            writeln!(out, "  {}: {}", peer.addr, peer.policy_summary())?;
        }

        writeln!(out)?;
        writeln!(out, "Advertised Networks")?;
        writeln!(out, "{}", rule('-'))?;
        if section.networks.is_empty() {
            writeln!(out, "  (none)")?;
        }
        for network in &section.networks {
            writeln!(out, "  - {}", network)?;
        }
    }

    if !analysis.route_maps.is_empty() {
        writeln!(out)?;
        writeln!(out, "Route Maps")?;
        writeln!(out, "{}", rule('-'))?;
        for route_map in &analysis.route_maps {
            writeln!(
                out,
                "  {}: {}",
                route_map.name,
                route_map.entries.iter().join(", ")
            )?;
        }
    }
    if !analysis.prefix_lists.is_empty() {
        writeln!(out, "  Prefix-lists: {}", analysis.prefix_lists.join(", "))?;
    }
    if !analysis.as_path_filters.is_empty() {
        writeln!(
            out,
            "  AS-path access-lists: {}",
            analysis.as_path_filters.join(", ")
        )?;
    }
    if !analysis.community_lists.is_empty() {
        writeln!(
            out,
            "  Community-lists: {}",
            analysis.community_lists.join(", ")
        )?;
    }

    if !analysis.interfaces.is_empty() {
        writeln!(out)?;
        writeln!(out, "Interface Summary")?;
        writeln!(out, "{}", rule('-'))?;
        let mut table = OutputTable::new();
        for interface in &analysis.interfaces {
            table.add_row(&InterfaceRow(interface));
        }
        write!(out, "{}", table.render())?;
    }

    if !analysis.sections.is_empty() {
        writeln!(out)?;
        writeln!(out, "Best Practice Recommendations")?;
        writeln!(out, "{}", rule('-'))?;
        if analysis.recommendations.is_empty() {
            writeln!(out, "  (none)")?;
        }
        for recommendation in &analysis.recommendations {
            writeln!(out, "  - {}", recommendation)?;
        }
    }
    writeln!(out, "{}", rule('='))
}

/// Print a validation report, colouring findings by severity
pub fn print_report(report: &Report) {
    let verdict = report.verdict().to_string();
    let mut in_errors = false;
    for line in report.to_string().lines() {
        match line {
            "ERRORS:" => in_errors = true,
            "WARNINGS:" => in_errors = false,
            _ => {}
        }
        if line == verdict {
            let colored = match report.verdict() {
                Verdict::Pass => line.green(),
                Verdict::PassWithWarnings => line.yellow(),
                Verdict::Fail => line.red(),
            };
            println!("{}", colored.bold());
        } else if line.starts_with("  - ") {
            if in_errors {
                println!("{}", line.red());
            } else {
                println!("{}", line.yellow());
            }
        } else {
            println!("{}", line);
        }
    }
}

pub fn print_fix(run: &FixRun) {
    println!("Fixing {}", run.path.display());
    if let Some(backup) = &run.backup {
        println!("  Backup saved to {}", backup.display());
    }
    for action in &run.actions {
        if action.is_change() {
            println!("  {} {}", "+".green(), action);
        } else {
            println!("  {} {}", "!".yellow(), action);
        }
    }
    if run.written {
        println!();
        print!("{}", run.diff);
        println!();
        println!(
            "{}",
            format!(
                "Applied {} change(s) to {}",
                run.actions.iter().filter(|a| a.is_change()).count(),
                run.path.display()
            )
            .green()
        );
    } else {
        println!("No changes needed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::analyze;
    use crate::config::ValidateSettings;
    use crate::document::ConfigDocument;

    fn analysis_of(path: &str) -> FileAnalysis {
        let doc = ConfigDocument::from_file(path).unwrap();
        analyze(&doc, &ValidateSettings::default())
    }

    #[test]
    fn test_analysis_text() {
        let text = analysis_text(&analysis_of("./fixtures/bgpd.conf"));
        assert!(text.contains("FRR Configuration Analysis Report: ./fixtures/bgpd.conf"));
        assert!(text.contains("BGP Peer Summary (router bgp 65001)"));
        assert!(text.contains("  Router ID: 10.255.0.1"));
        assert!(text.contains("  Peers: 2 (1 iBGP, 1 eBGP)"));
        assert!(text.contains("Transit-ISP-A"));
        assert!(text.contains("  10.0.2.1: none"));
        assert!(text.contains("  - 192.168.2.0/24"));
        assert!(text.contains("  TRANSIT-OUT: seq 10: permit, seq 20: deny"));
        assert!(text.contains("  Prefix-lists: BOGONS, OWN-NETS"));
        assert!(text.contains("Best Practice Recommendations"));
        assert!(!text.contains("Interface Summary"));
    }

    #[test]
    fn test_analysis_text_interfaces() {
        let text = analysis_text(&analysis_of("./fixtures/zebra.conf"));
        assert!(text.contains("Interface Summary"));
        assert!(text.contains("10.0.2.2/30, 2001:db8::1/64"));
        assert!(text.contains("down"));
        assert!(!text.contains("BGP Peer Summary"));
        assert!(!text.contains("Best Practice Recommendations"));
    }

    #[test]
    fn test_peer_row() {
        let analysis = analysis_of("./fixtures/minimal.conf");
        let row = PeerRow(&analysis.sections[0].peers[0]).to_row();
        assert_eq!(row.len(), PeerRow::columns().len());
        assert_eq!(row.get_cell(2).unwrap().get_content(), "eBGP");
        assert_eq!(row.get_cell(3).unwrap().get_content(), "---");
    }
}
