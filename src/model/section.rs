use std::net::Ipv4Addr;

use ipnetwork::IpNetwork;
use log::{debug, trace};

use crate::document::{Direction, Line, NeighborAttr, PolicyRef, Statement};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoteAs {
    pub asn: u32,
    /// Index of the `remote-as` line
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyEntry {
    pub policy: PolicyRef,
    pub index: usize,
}

/// An `activate` line inside one of the section's address families
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Activation {
    /// Position in [`BgpSection::address_families`]
    pub family: usize,
    pub index: usize,
}

/// A BGP neighbor, keyed by its IPv4 address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Neighbor {
    pub addr: Ipv4Addr,
    pub remote_as: Option<RemoteAs>,
    pub description: Option<String>,
    pub policies: Vec<PolicyEntry>,
    pub activations: Vec<Activation>,
    pub soft_reconfiguration: bool,
    pub maximum_prefix: Option<u32>,
}

impl Neighbor {
    fn new(addr: Ipv4Addr) -> Self {
        Self {
            addr,
            remote_as: None,
            description: None,
            policies: Vec::new(),
            activations: Vec::new(),
            soft_reconfiguration: false,
            maximum_prefix: None,
        }
    }

    pub fn is_activated(&self) -> bool {
        !self.activations.is_empty()
    }

    pub fn has_inbound_policy(&self) -> bool {
        self.policies
            .iter()
            .any(|entry| entry.policy.direction == Direction::In)
    }
}

/// `address-family <afi> [<safi>]` block within a BGP section
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressFamily {
    pub afi: String,
    pub safi: Option<String>,
    /// Index of the `address-family` line
    pub start: usize,
    /// Exclusive, includes `exit-address-family` when present
    pub end: usize,
    /// Leading whitespace used by statements inside the block
    pub content_indent: String,
}

impl AddressFamily {
    pub fn is_ipv4_unicast(&self) -> bool {
        self.afi == "ipv4" && self.safi.as_deref().map_or(true, |safi| safi == "unicast")
    }

    pub fn contains(&self, index: usize) -> bool {
        index > self.start && index < self.end
    }

    fn detect(lines: &[Line], records: &[Statement], start: usize, limit: usize) -> Self {
        let (afi, safi) = match &records[start] {
            Statement::AddressFamily { afi, safi } => (afi.clone(), safi.clone()),
            _ => unreachable!("address-family detection must start on its header"),
        };
        let header = lines[start].indent();
        let mut deeper: Option<bool> = None;
        let mut content_indent: Option<String> = None;
        let mut last = start;
        let mut end = None;
        for i in (start + 1)..limit {
            match records[i] {
                Statement::Blank => continue,
                Statement::ExitAddressFamily => {
                    end = Some(i + 1);
                    break;
                }
                Statement::AddressFamily { .. } => break,
                _ => {}
            }
            let indent = lines[i].indent();
            // Indentation of the first child decides how the block is closed
            if *deeper.get_or_insert(indent > header) && indent <= header {
                break;
            }
            if content_indent.is_none() {
                content_indent = Some(lines[i].leading_whitespace().to_string());
            }
            last = i;
        }
        let content_indent = content_indent
            .unwrap_or_else(|| format!("{} ", lines[start].leading_whitespace()));
        Self {
            afi,
            safi,
            start,
            end: end.unwrap_or(last + 1),
            content_indent,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Network {
    pub prefix: IpNetwork,
    pub index: usize,
}

/// A `router bgp <AS>` block
///
/// The end of the block is inferred: it covers blank lines, lines indented
/// deeper than `router bgp`, and BGP sub-commands at the same indentation.
/// A `!` separator or any other statement at that indentation closes it, an
/// `exit` closes it inclusively. Non-standard formatting can fool this.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BgpSection {
    pub asn: u32,
    pub vrf: Option<String>,
    /// Index of the `router bgp` line
    pub start: usize,
    /// Exclusive end index (after the last non-blank line of the block)
    pub end: usize,
    /// Index of the closing `exit`, when there is one
    pub exit: Option<usize>,
    /// Leading whitespace of direct children
    pub body_indent: String,
    pub router_id: Option<Ipv4Addr>,
    pub log_neighbor_changes: bool,
    pub neighbors: Vec<Neighbor>,
    pub address_families: Vec<AddressFamily>,
    pub networks: Vec<Network>,
}

impl BgpSection {
    pub(super) fn detect(lines: &[Line], records: &[Statement], start: usize) -> Self {
        let (asn, vrf) = match &records[start] {
            Statement::RouterBgp { asn, vrf } => (*asn, vrf.clone()),
            _ => unreachable!("BGP section detection must start on `router bgp`"),
        };
        let base = lines[start].indent();
        let mut end = start + 1;
        let mut exit = None;
        for i in (start + 1)..lines.len() {
            let statement = &records[i];
            if *statement == Statement::Blank {
                continue;
            }
            if lines[i].indent() > base || statement.is_bgp_body() {
                end = i + 1;
                continue;
            }
            if *statement == Statement::Exit {
                end = i + 1;
                exit = Some(i);
            }
            break;
        }
        let body_end = exit.unwrap_or(end);
        let body_indent = ((start + 1)..body_end)
            .find(|i| records[*i] != Statement::Blank)
            .map(|i| lines[i].leading_whitespace().to_string())
            .unwrap_or_else(|| format!("{} ", lines[start].leading_whitespace()));
        debug!(
            "router bgp {} spans lines {}-{}",
            asn,
            lines[start].number,
            lines[end - 1].number
        );

        let mut section = Self {
            asn,
            vrf,
            start,
            end,
            exit,
            body_indent,
            router_id: None,
            log_neighbor_changes: false,
            neighbors: Vec::new(),
            address_families: Vec::new(),
            networks: Vec::new(),
        };

        let mut i = start + 1;
        while i < body_end {
            if let Statement::AddressFamily { .. } = &records[i] {
                let family = AddressFamily::detect(lines, records, i, body_end);
                trace!(
                    "address-family {} spans lines {}-{}",
                    family.afi,
                    lines[family.start].number,
                    lines[family.end - 1].number
                );
                i = family.end;
                section.address_families.push(family);
            } else {
                i += 1;
            }
        }

        for i in (start + 1)..body_end {
            let family = section
                .address_families
                .iter()
                .position(|family| family.contains(i));
            match &records[i] {
                Statement::RouterId(id) => section.router_id = Some(*id),
                Statement::LogNeighborChanges => section.log_neighbor_changes = true,
                Statement::Network(prefix) => section.networks.push(Network {
                    prefix: *prefix,
                    index: i,
                }),
                Statement::Neighbor { addr, attr } => {
                    section.record_neighbor(*addr, attr, family, lines[i].number, i)
                }
                _ => {}
            }
        }
        section
    }

    fn record_neighbor(
        &mut self,
        addr: Ipv4Addr,
        attr: &NeighborAttr,
        family: Option<usize>,
        number: usize,
        index: usize,
    ) {
        let neighbor = self.neighbor_entry(addr);
        match attr {
            NeighborAttr::RemoteAs(asn) => {
                if let Some(previous) = neighbor.remote_as {
                    debug!(
                        "Neighbor {} remote-as redefined at line {} ({} -> {})",
                        addr, number, previous.asn, asn
                    );
                }
                neighbor.remote_as = Some(RemoteAs { asn: *asn, index });
            }
            NeighborAttr::Description(text) => neighbor.description = Some(text.clone()),
            NeighborAttr::Activate => match family {
                Some(family) => neighbor.activations.push(Activation { family, index }),
                None => debug!(
                    "Ignoring activation of {} outside address-family at line {}",
                    addr, number
                ),
            },
            NeighborAttr::SoftReconfigurationInbound => neighbor.soft_reconfiguration = true,
            NeighborAttr::Policy(policy) => neighbor.policies.push(PolicyEntry {
                policy: policy.clone(),
                index,
            }),
            NeighborAttr::MaximumPrefix(limit) => neighbor.maximum_prefix = Some(*limit),
            NeighborAttr::Other(_) => {}
        }
    }

    fn neighbor_entry(&mut self, addr: Ipv4Addr) -> &mut Neighbor {
        let position = match self.neighbors.iter().position(|n| n.addr == addr) {
            Some(position) => position,
            None => {
                self.neighbors.push(Neighbor::new(addr));
                self.neighbors.len() - 1
            }
        };
        &mut self.neighbors[position]
    }

    /// 1-based line number of `router bgp`
    pub fn line_number(&self) -> usize {
        self.start + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    pub fn neighbor(&self, addr: Ipv4Addr) -> Option<&Neighbor> {
        self.neighbors.iter().find(|n| n.addr == addr)
    }

    /// Neighbors configured with a numeric `remote-as`
    pub fn peers(&self) -> impl Iterator<Item = &Neighbor> {
        self.neighbors.iter().filter(|n| n.remote_as.is_some())
    }

    /// First `address-family ipv4 [unicast]` block
    pub fn ipv4_unicast(&self) -> Option<&AddressFamily> {
        self.address_families
            .iter()
            .find(|family| family.is_ipv4_unicast())
    }

    /// iBGP when remote-as equals the local AS; `None` without a remote-as
    pub fn is_ibgp(&self, neighbor: &Neighbor) -> Option<bool> {
        neighbor.remote_as.map(|remote| remote.asn == self.asn)
    }

    /// Line index that new trailing statements are inserted after
    pub fn append_anchor(&self) -> usize {
        match self.exit {
            Some(exit) => exit - 1,
            None => self.end - 1,
        }
    }
}
