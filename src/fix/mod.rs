//! In-place remediation of common FRR BGP omissions
//!
//! Fixes are applied as a fixed sequence of steps. Each step parses the
//! document as left by the previous one and computes line insertions, so
//! running the fixer on its own output changes nothing.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, info, warn};
use similar::TextDiff;

use crate::config::{FixSettings, Settings};
use crate::document::ConfigDocument;
use crate::error::{Error, Result};
use crate::model::{BgpSection, ParsedConfig};
use crate::validate::{validate, Report};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixOptions {
    /// Copy the original file aside before writing
    pub backup: bool,
    /// Re-validate the file once fixed
    pub validate: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FixAction {
    /// Reported only, a router-id can't be picked automatically
    MissingRouterId { asn: u32, line: usize },
    AddedDescription { addr: Ipv4Addr, description: String },
    AddedAddressFamily { asn: u32 },
    AddedActivation { addr: Ipv4Addr },
    AddedSoftReconfiguration { addr: Ipv4Addr },
    /// Nothing to anchor the change on
    Skipped { addr: Ipv4Addr, reason: String },
}

impl FixAction {
    /// Does this action modify the document?
    pub fn is_change(&self) -> bool {
        !matches!(
            self,
            FixAction::MissingRouterId { .. } | FixAction::Skipped { .. }
        )
    }
}

impl fmt::Display for FixAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FixAction::MissingRouterId { asn, line } => write!(
                f,
                "router bgp {} (line {}) has no router-id, configure one manually",
                asn, line
            ),
            FixAction::AddedDescription { addr, description } => {
                write!(f, "Added description '{}' to neighbor {}", description, addr)
            }
            FixAction::AddedAddressFamily { asn } => write!(
                f,
                "Added address-family ipv4 unicast to router bgp {}",
                asn
            ),
            FixAction::AddedActivation { addr } => {
                write!(f, "Activated neighbor {} in ipv4 unicast", addr)
            }
            FixAction::AddedSoftReconfiguration { addr } => {
                write!(f, "Enabled soft-reconfiguration inbound on {}", addr)
            }
            FixAction::Skipped { addr, reason } => {
                write!(f, "Skipped neighbor {}: {}", addr, reason)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct FixOutcome {
    pub document: ConfigDocument,
    pub actions: Vec<FixAction>,
}

impl FixOutcome {
    pub fn changes(&self) -> impl Iterator<Item = &FixAction> {
        self.actions.iter().filter(|a| a.is_change())
    }
}

type Insertions = BTreeMap<usize, Vec<String>>;
type Step = fn(&ConfigDocument, &ParsedConfig, &mut Vec<FixAction>) -> Insertions;

/// Apply every fix to a copy of `document`
pub fn fix_document(document: &ConfigDocument) -> FixOutcome {
    let mut document = document.clone();
    let mut actions = Vec::new();
    let steps: [(&str, Step); 4] = [
        ("router-id", report_router_id as Step),
        ("description", add_descriptions as Step),
        ("activation", add_activations as Step),
        ("soft-reconfiguration", add_soft_reconfiguration as Step),
    ];
    for (name, step) in steps {
        let parsed = ParsedConfig::from_document(&document);
        let insertions = step(&document, &parsed, &mut actions);
        debug!("Fix step {}: {} anchor(s)", name, insertions.len());
        document.insert_after(insertions);
    }
    FixOutcome { document, actions }
}

fn report_router_id(
    _document: &ConfigDocument,
    parsed: &ParsedConfig,
    actions: &mut Vec<FixAction>,
) -> Insertions {
    for section in parsed.sections.iter().filter(|s| s.router_id.is_none()) {
        actions.push(FixAction::MissingRouterId {
            asn: section.asn,
            line: section.line_number(),
        });
    }
    Insertions::new()
}

fn add_descriptions(
    document: &ConfigDocument,
    parsed: &ParsedConfig,
    actions: &mut Vec<FixAction>,
) -> Insertions {
    let mut insertions = Insertions::new();
    for section in &parsed.sections {
        for neighbor in section.neighbors.iter().filter(|n| n.description.is_none()) {
            let remote_as = match neighbor.remote_as {
                Some(remote_as) => remote_as,
                None => {
                    warn!(
                        "No remote-as line for neighbor {}, not adding a description",
                        neighbor.addr
                    );
                    actions.push(FixAction::Skipped {
                        addr: neighbor.addr,
                        reason: String::from("no remote-as line to add a description after"),
                    });
                    continue;
                }
            };
            let description = format!(
                "Peer-AS-{}",
                remote_as_token(document, remote_as.index, remote_as.asn)
            );
            let indent = document.lines()[remote_as.index].leading_whitespace();
            insertions.entry(remote_as.index).or_default().push(format!(
                "{}neighbor {} description {}",
                indent, neighbor.addr, description
            ));
            actions.push(FixAction::AddedDescription {
                addr: neighbor.addr,
                description,
            });
        }
    }
    insertions
}

/// The remote-as value as written on its line, so asdot stays asdot
fn remote_as_token(document: &ConfigDocument, index: usize, asn: u32) -> String {
    document.lines()[index]
        .text
        .split_whitespace()
        .skip_while(|word| *word != "remote-as")
        .nth(1)
        .map_or_else(|| asn.to_string(), str::to_string)
}

fn add_activations(
    document: &ConfigDocument,
    parsed: &ParsedConfig,
    actions: &mut Vec<FixAction>,
) -> Insertions {
    let mut insertions = Insertions::new();
    for section in &parsed.sections {
        let pending: Vec<Ipv4Addr> = section
            .peers()
            .filter(|n| !n.is_activated())
            .map(|n| n.addr)
            .collect();
        if pending.is_empty() {
            continue;
        }
        match section.ipv4_unicast() {
            Some(family) => {
                let lines = insertions.entry(family.start).or_default();
                for addr in &pending {
                    lines.push(format!("{}neighbor {} activate", family.content_indent, addr));
                }
            }
            None => {
                let block = address_family_block(document, section, &pending);
                insertions
                    .entry(section.append_anchor())
                    .or_default()
                    .extend(block);
                actions.push(FixAction::AddedAddressFamily { asn: section.asn });
            }
        }
        actions.extend(
            pending
                .into_iter()
                .map(|addr| FixAction::AddedActivation { addr }),
        );
    }
    insertions
}

/// New `address-family ipv4 unicast` block, indented like the section body.
/// Flat sections (body at the `router bgp` indentation) stay flat.
fn address_family_block(
    document: &ConfigDocument,
    section: &BgpSection,
    neighbors: &[Ipv4Addr],
) -> Vec<String> {
    let body = section.body_indent.as_str();
    let content = if body == document.lines()[section.start].leading_whitespace() {
        body.to_string()
    } else {
        format!("{} ", body)
    };
    let mut block = Vec::with_capacity(neighbors.len() + 2);
    block.push(format!("{}address-family ipv4 unicast", body));
    for addr in neighbors {
        block.push(format!("{}neighbor {} activate", content, addr));
    }
    block.push(format!("{}exit-address-family", body));
    block
}

fn add_soft_reconfiguration(
    document: &ConfigDocument,
    parsed: &ParsedConfig,
    actions: &mut Vec<FixAction>,
) -> Insertions {
    let mut insertions = Insertions::new();
    for section in &parsed.sections {
        for neighbor in section.neighbors.iter().filter(|n| !n.soft_reconfiguration) {
            let activation = match neighbor.activations.first() {
                Some(activation) => activation,
                None => continue,
            };
            let indent = document.lines()[activation.index].leading_whitespace();
            insertions.entry(activation.index).or_default().push(format!(
                "{}neighbor {} soft-reconfiguration inbound",
                indent, neighbor.addr
            ));
            actions.push(FixAction::AddedSoftReconfiguration {
                addr: neighbor.addr,
            });
        }
    }
    insertions
}

/// Result of fixing a file on disk
#[derive(Debug)]
pub struct FixRun {
    pub path: PathBuf,
    pub actions: Vec<FixAction>,
    /// Was the file rewritten?
    pub written: bool,
    pub backup: Option<PathBuf>,
    /// Unified diff of the change, empty when nothing changed
    pub diff: String,
    pub validation: Option<Report>,
}

/// Fix the config file at `path` in place
pub fn run<P: AsRef<Path>>(path: P, options: FixOptions, settings: &Settings) -> Result<FixRun> {
    let path = path.as_ref();
    let original = ConfigDocument::from_file(path)?;
    check_writable(path)?;

    let backup = if options.backup {
        Some(create_backup(path, &settings.fix)?)
    } else {
        None
    };

    let outcome = fix_document(&original);
    let before = original.render();
    let after = outcome.document.render();
    let written = before != after;
    let diff = if written {
        fs::write(path, &after).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "Applied {} fix(es) to {}",
            outcome.changes().count(),
            path.display()
        );
        let name = path.display().to_string();
        TextDiff::from_lines(&before, &after)
            .unified_diff()
            .context_radius(3)
            .header(&name, &name)
            .to_string()
    } else {
        info!("No changes needed for {}", path.display());
        String::new()
    };

    let validation = if options.validate {
        let fixed = ConfigDocument::from_file(path)?;
        Some(validate(&fixed, &settings.validate))
    } else {
        None
    };

    Ok(FixRun {
        path: path.to_path_buf(),
        actions: outcome.actions,
        written,
        backup,
        diff,
        validation,
    })
}

fn check_writable(path: &Path) -> Result<()> {
    OpenOptions::new()
        .write(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| Error::NotWritable {
            path: path.to_path_buf(),
            source,
        })
}

fn create_backup(path: &Path, settings: &FixSettings) -> Result<PathBuf> {
    let root = settings.backup_root();
    fs::create_dir_all(&root).map_err(|source| Error::Backup {
        path: root.clone(),
        source,
    })?;
    let name = format!("frr-backup-{}", Local::now().format("%Y%m%d-%H%M%S"));
    let dir = create_unique_dir(&root, &name)?;
    let target = dir.join(path.file_name().unwrap_or_else(|| OsStr::new("frr.conf")));
    fs::copy(path, &target).map_err(|source| Error::Backup {
        path: target.clone(),
        source,
    })?;
    info!("Backed up {} to {}", path.display(), target.display());
    Ok(target)
}

/// Create `<root>/<name>`, falling back to `<name>-1`, `<name>-2`, ... so an
/// earlier backup is never overwritten
fn create_unique_dir(root: &Path, name: &str) -> Result<PathBuf> {
    let mut attempt = 0;
    loop {
        let dir = match attempt {
            0 => root.join(name),
            n => root.join(format!("{}-{}", name, n)),
        };
        match fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(source) => return Err(Error::Backup { path: dir, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;

    use crate::config::ValidateSettings;

    fn fixed(text: &str) -> FixOutcome {
        fix_document(&ConfigDocument::from_text(text))
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("frrcheck-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_fix_minimal() {
        let doc = ConfigDocument::from_file("./fixtures/minimal.conf").unwrap();
        let outcome = fix_document(&doc);
        assert_eq!(
            outcome.document.render(),
            "\
router bgp 65001
 neighbor 10.0.1.1 remote-as 65002
 neighbor 10.0.1.1 description Peer-AS-65002
 network 192.168.1.0/24
 address-family ipv4 unicast
  neighbor 10.0.1.1 activate
  neighbor 10.0.1.1 soft-reconfiguration inbound
 exit-address-family
"
        );
        let actions: Vec<_> = outcome.actions.iter().map(|a| a.to_string()).collect();
        assert_eq!(
            actions,
            vec![
                "router bgp 65001 (line 1) has no router-id, configure one manually",
                "Added description 'Peer-AS-65002' to neighbor 10.0.1.1",
                "Added address-family ipv4 unicast to router bgp 65001",
                "Activated neighbor 10.0.1.1 in ipv4 unicast",
                "Enabled soft-reconfiguration inbound on 10.0.1.1",
            ]
        );

        let report = validate(&outcome.document, &ValidateSettings::default());
        assert_eq!(report.summary(), "Summary: 1 errors, 0 warnings");
        assert!(report.findings[0].message.contains("router-id"));
    }

    #[test]
    fn test_fix_is_idempotent() {
        let doc = ConfigDocument::from_file("./fixtures/minimal.conf").unwrap();
        let once = fix_document(&doc);
        let twice = fix_document(&once.document);
        assert_eq!(twice.document.render(), once.document.render());
        assert_eq!(twice.changes().count(), 0);

        let clean = ConfigDocument::from_file("./fixtures/bgpd.conf").unwrap();
        let outcome = fix_document(&clean);
        assert_eq!(outcome.document.render(), clean.render());
        assert!(outcome.actions.is_empty());
    }

    #[test]
    fn test_fix_existing_address_family() {
        let outcome = fixed(
            "\
router bgp 65001
 bgp router-id 10.0.0.1
 neighbor 10.0.1.1 remote-as 65002
 neighbor 10.0.1.1 description upstream
 neighbor 10.0.2.1 remote-as 65001
 neighbor 10.0.2.1 description core
 address-family ipv4 unicast
  network 192.168.1.0/24
 exit-address-family
exit
",
        );
        assert_eq!(
            outcome.document.render(),
            "\
router bgp 65001
 bgp router-id 10.0.0.1
 neighbor 10.0.1.1 remote-as 65002
 neighbor 10.0.1.1 description upstream
 neighbor 10.0.2.1 remote-as 65001
 neighbor 10.0.2.1 description core
 address-family ipv4 unicast
  neighbor 10.0.1.1 activate
  neighbor 10.0.1.1 soft-reconfiguration inbound
  neighbor 10.0.2.1 activate
  neighbor 10.0.2.1 soft-reconfiguration inbound
  network 192.168.1.0/24
 exit-address-family
exit
"
        );
        assert!(!outcome
            .actions
            .iter()
            .any(|a| matches!(a, FixAction::AddedAddressFamily { .. })));
    }

    #[test]
    fn test_fix_new_address_family_before_exit() {
        let outcome = fixed(
            "\
router bgp 65001
 bgp router-id 10.0.0.1
 neighbor 10.0.1.1 remote-as 65002
 neighbor 10.0.1.1 description upstream
exit
!
line vty
",
        );
        assert_eq!(
            outcome.document.render(),
            "\
router bgp 65001
 bgp router-id 10.0.0.1
 neighbor 10.0.1.1 remote-as 65002
 neighbor 10.0.1.1 description upstream
 address-family ipv4 unicast
  neighbor 10.0.1.1 activate
  neighbor 10.0.1.1 soft-reconfiguration inbound
 exit-address-family
exit
!
line vty
"
        );
    }

    #[test]
    fn test_fix_flat_section() {
        let doc = ConfigDocument::from_file("./fixtures/broken.conf").unwrap();
        let outcome = fix_document(&doc);
        let text = outcome.document.render();
        assert!(text.contains(
            "\
neighbor 192.0.2.1 remote-as 65020
neighbor 192.0.2.1 description Peer-AS-65020
neighbor 192.0.2.1 route-map IMPORT in"
        ));
        assert!(text.contains(
            "\
address-family ipv4 unicast
neighbor 192.0.2.1 activate
neighbor 192.0.2.1 soft-reconfiguration inbound
neighbor 198.51.100.1 activate
neighbor 198.51.100.1 soft-reconfiguration inbound
exit-address-family"
        ));
        // Dangling policy references are left alone
        let report = validate(&outcome.document, &ValidateSettings::default());
        assert_eq!(report.error_count(), 2);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_fix_neighbor_without_remote_as() {
        let outcome = fixed(
            "\
router bgp 65001
 bgp router-id 10.0.0.1
 neighbor 10.0.1.1 update-source lo
",
        );
        assert_eq!(
            outcome.document.render(),
            "router bgp 65001\n bgp router-id 10.0.0.1\n neighbor 10.0.1.1 update-source lo\n"
        );
        assert_eq!(outcome.changes().count(), 0);
        assert!(matches!(
            outcome.actions.as_slice(),
            [FixAction::Skipped { .. }]
        ));
    }

    #[test]
    fn test_fix_description_keeps_asdot() {
        let outcome = fixed(
            "\
router bgp 65001
 bgp router-id 10.0.0.1
 neighbor 10.0.1.1 remote-as 65000.100
",
        );
        assert!(outcome
            .document
            .render()
            .contains(" neighbor 10.0.1.1 description Peer-AS-65000.100\n"));
        assert!(outcome.actions.contains(&FixAction::AddedDescription {
            addr: "10.0.1.1".parse().unwrap(),
            description: "Peer-AS-65000.100".to_string(),
        }));
    }

    #[test]
    fn test_fix_leaves_router_id_alone() {
        let outcome = fixed("router bgp 65001\n");
        assert_eq!(outcome.document.render(), "router bgp 65001\n");
        assert_eq!(
            outcome.actions,
            vec![FixAction::MissingRouterId {
                asn: 65001,
                line: 1
            }]
        );
    }

    #[test]
    fn test_run_with_backup_and_validate() {
        let dir = scratch_dir("run");
        let path = dir.join("bgpd.conf");
        let original = fs::read_to_string("./fixtures/minimal.conf").unwrap();
        fs::write(&path, &original).unwrap();
        let settings = Settings {
            fix: FixSettings {
                backup_dir: Some(dir.join("backups")),
            },
            ..Settings::default()
        };
        let options = FixOptions {
            backup: true,
            validate: true,
        };

        let first = run(&path, options, &settings).unwrap();
        assert!(first.written);
        assert!(first.diff.contains("+ neighbor 10.0.1.1 description Peer-AS-65002"));
        let backup = first.backup.unwrap();
        assert!(backup.starts_with(dir.join("backups")));
        assert_eq!(backup.file_name(), Some(OsStr::new("bgpd.conf")));
        assert_eq!(fs::read_to_string(&backup).unwrap(), original);
        assert_eq!(first.validation.unwrap().error_count(), 1);

        let fixed = fs::read_to_string(&path).unwrap();
        let second = run(&path, FixOptions::default(), &settings).unwrap();
        assert!(!second.written);
        assert!(second.diff.is_empty());
        assert!(second.validation.is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), fixed);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_run_backups_never_overwrite() {
        let dir = scratch_dir("backups");
        let path = dir.join("bgpd.conf");
        let original = fs::read_to_string("./fixtures/minimal.conf").unwrap();
        fs::write(&path, &original).unwrap();
        let settings = Settings {
            fix: FixSettings {
                backup_dir: Some(dir.join("backups")),
            },
            ..Settings::default()
        };
        let options = FixOptions {
            backup: true,
            validate: false,
        };

        let first = run(&path, options, &settings).unwrap().backup.unwrap();
        let second = run(&path, options, &settings).unwrap().backup.unwrap();
        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(&first).unwrap(), original);
        assert_eq!(
            fs::read_to_string(&second).unwrap(),
            fs::read_to_string(&path).unwrap()
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_unique_dir() {
        let dir = scratch_dir("unique");
        let first = create_unique_dir(&dir, "frr-backup-x").unwrap();
        let second = create_unique_dir(&dir, "frr-backup-x").unwrap();
        let third = create_unique_dir(&dir, "frr-backup-x").unwrap();
        assert_eq!(first, dir.join("frr-backup-x"));
        assert_eq!(second, dir.join("frr-backup-x-1"));
        assert_eq!(third, dir.join("frr-backup-x-2"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_run_keeps_crlf_endings() {
        let dir = scratch_dir("crlf");
        let path = dir.join("bgpd.conf");
        let original = fs::read_to_string("./fixtures/minimal.conf")
            .unwrap()
            .replace('\n', "\r\n");
        fs::write(&path, &original).unwrap();

        let first = run(&path, FixOptions::default(), &Settings::default()).unwrap();
        assert!(first.written);
        let fixed = fs::read_to_string(&path).unwrap();
        assert!(fixed.contains(" neighbor 10.0.1.1 description Peer-AS-65002\r\n"));
        assert_eq!(fixed.matches('\n').count(), fixed.matches("\r\n").count());

        let second = run(&path, FixOptions::default(), &Settings::default()).unwrap();
        assert!(!second.written);
        assert_eq!(fs::read_to_string(&path).unwrap(), fixed);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_run_missing_file() {
        let dir = scratch_dir("missing");
        let result = run(dir.join("bgpd.conf"), FixOptions::default(), &Settings::default());
        assert!(matches!(result, Err(Error::NotFound(_))));
        fs::remove_dir_all(&dir).unwrap();
    }
}
