use std::fmt;
use std::net::Ipv4Addr;

use ipnetwork::IpNetwork;
use serde::Serialize;

use crate::utils::{asn_from_dotted, ipv4_literal};

/// Keywords that can appear as direct children of `router bgp`
const BGP_KEYWORDS: &[&str] = &[
    "neighbor",
    "network",
    "bgp",
    "address-family",
    "exit-address-family",
    "redistribute",
    "aggregate-address",
    "timers",
    "maximum-paths",
    "distance",
    "table-map",
    "import",
    "export",
    "rd",
    "rt",
    "label",
    "coalesce-time",
    "update-delay",
    "read-quanta",
    "write-quanta",
    "advertise-all-vni",
    "advertise",
    "no bgp",
    "no neighbor",
    "no network",
    "no auto-summary",
    "no synchronization",
];

/// Keywords that can appear as direct children of `interface`
const INTERFACE_KEYWORDS: &[&str] = &[
    "link-detect",
    "bandwidth",
    "multicast",
    "no shutdown",
    "no link-detect",
    "no multicast",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let display = match self {
            Direction::In => "in",
            Direction::Out => "out",
        };
        write!(f, "{}", display)
    }
}

/// Named policy object a neighbor can reference
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    RouteMap,
    PrefixList,
    /// AS-path access-list, applied with `neighbor <ip> filter-list`
    FilterList,
}

impl PolicyKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "route-map" => Some(PolicyKind::RouteMap),
            "prefix-list" => Some(PolicyKind::PrefixList),
            "filter-list" => Some(PolicyKind::FilterList),
            _ => None,
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let display = match self {
            PolicyKind::RouteMap => "Route-map",
            PolicyKind::PrefixList => "Prefix-list",
            PolicyKind::FilterList => "AS-path filter-list",
        };
        write!(f, "{}", display)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PolicyRef {
    pub kind: PolicyKind,
    pub name: String,
    pub direction: Direction,
}

impl fmt::Display for PolicyRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let keyword = match self.kind {
            PolicyKind::RouteMap => "route-map",
            PolicyKind::PrefixList => "prefix-list",
            PolicyKind::FilterList => "filter-list",
        };
        write!(f, "{} {} ({})", keyword, self.name, self.direction)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMapAction {
    Permit,
    Deny,
}

impl fmt::Display for RouteMapAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let display = match self {
            RouteMapAction::Permit => "permit",
            RouteMapAction::Deny => "deny",
        };
        write!(f, "{}", display)
    }
}

/// Everything after `neighbor <ipv4>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NeighborAttr {
    RemoteAs(u32),
    Description(String),
    Activate,
    SoftReconfigurationInbound,
    Policy(PolicyRef),
    MaximumPrefix(u32),
    Other(String),
}

/// Typed classification of a single config line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    Blank,
    Comment,
    RouterBgp { asn: u32, vrf: Option<String> },
    RouterId(Ipv4Addr),
    LogNeighborChanges,
    Neighbor { addr: Ipv4Addr, attr: NeighborAttr },
    Network(IpNetwork),
    AddressFamily { afi: String, safi: Option<String> },
    ExitAddressFamily,
    Exit,
    RouteMap {
        name: String,
        action: RouteMapAction,
        seq: u32,
    },
    PrefixList { name: String },
    AsPathAccessList { name: String },
    CommunityList { name: String },
    Interface { name: String, vrf: Option<String> },
    IpAddress(IpNetwork),
    Description(String),
    Shutdown,
    /// Anything else, keyed by its leading keyword (two words for `no ...`)
    Other(String),
}

impl Statement {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Statement::Blank;
        }
        if trimmed.starts_with('!') {
            return Statement::Comment;
        }
        let words: Vec<&str> = trimmed.split_whitespace().collect();
        match words.as_slice() {
            ["router", "bgp", asn, rest @ ..] => match asn_from_dotted(asn) {
                Ok(asn) => {
                    let vrf = match rest {
                        ["vrf", name, ..] => Some(name.to_string()),
                        _ => None,
                    };
                    Statement::RouterBgp { asn, vrf }
                }
                Err(_) => Statement::Other("router".to_string()),
            },
            ["bgp", "router-id", id] => match id.parse() {
                Ok(id) => Statement::RouterId(id),
                Err(_) => Statement::Other("bgp".to_string()),
            },
            ["bgp", "log-neighbor-changes"] => Statement::LogNeighborChanges,
            ["bgp", "as-path", "access-list", name, _, ..]
            | ["ip", "as-path", "access-list", name, _, ..] => Statement::AsPathAccessList {
                name: name.to_string(),
            },
            ["bgp", "community-list" | "extcommunity-list" | "large-community-list", rest @ ..] => {
                match rest {
                    ["standard" | "expanded", name, _, ..] | [name, _, ..] => {
                        Statement::CommunityList {
                            name: name.to_string(),
                        }
                    }
                    _ => Statement::Other("bgp".to_string()),
                }
            }
            ["ip" | "ipv6", "prefix-list", name, _, ..] => Statement::PrefixList {
                name: name.to_string(),
            },
            ["ip" | "ipv6", "address", prefix, ..] => match prefix.parse() {
                Ok(prefix) => Statement::IpAddress(prefix),
                Err(_) => Statement::Other(words[0].to_string()),
            },
            ["route-map", name, action, seq, ..] => {
                let action = match *action {
                    "permit" => Some(RouteMapAction::Permit),
                    "deny" => Some(RouteMapAction::Deny),
                    _ => None,
                };
                match (action, seq.parse()) {
                    (Some(action), Ok(seq)) => Statement::RouteMap {
                        name: name.to_string(),
                        action,
                        seq,
                    },
                    _ => Statement::Other("route-map".to_string()),
                }
            }
            ["neighbor", addr, rest @ ..] => match ipv4_literal(addr) {
                Some(addr) => Statement::Neighbor {
                    addr,
                    attr: NeighborAttr::parse(rest),
                },
                None => Statement::Other("neighbor".to_string()),
            },
            ["network", prefix, ..] => match prefix.parse() {
                Ok(prefix) => Statement::Network(prefix),
                Err(_) => Statement::Other("network".to_string()),
            },
            ["address-family", afi, rest @ ..] => Statement::AddressFamily {
                afi: afi.to_string(),
                safi: rest.first().map(|safi| safi.to_string()),
            },
            ["exit-address-family"] => Statement::ExitAddressFamily,
            ["exit"] => Statement::Exit,
            ["interface", name, rest @ ..] => {
                let vrf = match rest {
                    ["vrf", vrf, ..] => Some(vrf.to_string()),
                    _ => None,
                };
                Statement::Interface {
                    name: name.to_string(),
                    vrf,
                }
            }
            ["description", _, ..] => Statement::Description(words[1..].join(" ")),
            ["shutdown"] => Statement::Shutdown,
            ["no", next, ..] => Statement::Other(format!("no {}", next)),
            [keyword, ..] => Statement::Other(keyword.to_string()),
            [] => Statement::Blank,
        }
    }

    /// Can this statement live directly under `router bgp` when it is not
    /// indented deeper than the `router bgp` line?
    pub fn is_bgp_body(&self) -> bool {
        match self {
            Statement::RouterId(_)
            | Statement::LogNeighborChanges
            | Statement::Neighbor { .. }
            | Statement::Network(_)
            | Statement::AddressFamily { .. }
            | Statement::ExitAddressFamily => true,
            Statement::Other(keyword) => BGP_KEYWORDS.contains(&keyword.as_str()),
            _ => false,
        }
    }

    /// Same as [`Statement::is_bgp_body`], for `interface` blocks
    pub fn is_interface_body(&self) -> bool {
        match self {
            Statement::IpAddress(_) | Statement::Description(_) | Statement::Shutdown => true,
            Statement::Other(keyword) => INTERFACE_KEYWORDS.contains(&keyword.as_str()),
            _ => false,
        }
    }
}

impl NeighborAttr {
    fn parse(words: &[&str]) -> Self {
        match words {
            ["remote-as", asn] => match asn_from_dotted(asn) {
                Ok(asn) => NeighborAttr::RemoteAs(asn),
                // `remote-as internal|external` can't be resolved to a number
                Err(_) => NeighborAttr::Other("remote-as".to_string()),
            },
            ["description", _, ..] => NeighborAttr::Description(words[1..].join(" ")),
            ["activate"] => NeighborAttr::Activate,
            ["soft-reconfiguration", "inbound"] => NeighborAttr::SoftReconfigurationInbound,
            ["maximum-prefix", limit, ..] => match limit.parse() {
                Ok(limit) => NeighborAttr::MaximumPrefix(limit),
                Err(_) => NeighborAttr::Other("maximum-prefix".to_string()),
            },
            [kind, name, direction] => {
                match (PolicyKind::from_keyword(kind), Direction::from_keyword(direction)) {
                    (Some(kind), Some(direction)) => NeighborAttr::Policy(PolicyRef {
                        kind,
                        name: name.to_string(),
                        direction,
                    }),
                    _ => NeighborAttr::Other(kind.to_string()),
                }
            }
            [keyword, ..] => NeighborAttr::Other(keyword.to_string()),
            [] => NeighborAttr::Other(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbor(line: &str) -> NeighborAttr {
        match Statement::parse(line) {
            Statement::Neighbor { attr, .. } => attr,
            other => panic!("Not a neighbor statement: {:?}", other),
        }
    }

    #[test]
    fn test_parse_router_bgp() {
        assert_eq!(
            Statement::parse("router bgp 65001"),
            Statement::RouterBgp {
                asn: 65001,
                vrf: None
            }
        );
        assert_eq!(
            Statement::parse("router bgp 65001 vrf RED"),
            Statement::RouterBgp {
                asn: 65001,
                vrf: Some("RED".to_string())
            }
        );
        assert_eq!(
            Statement::parse("router bgp"),
            Statement::Other("router".to_string())
        );
        assert_eq!(
            Statement::parse(" bgp router-id 10.0.0.1"),
            Statement::RouterId(Ipv4Addr::new(10, 0, 0, 1))
        );
    }

    #[test]
    fn test_parse_neighbor() {
        assert_eq!(
            neighbor(" neighbor 10.0.1.1 remote-as 65002"),
            NeighborAttr::RemoteAs(65002)
        );
        assert_eq!(
            neighbor(" neighbor 10.0.1.1 remote-as 65000.100"),
            NeighborAttr::RemoteAs(4259840100)
        );
        assert_eq!(
            neighbor(" neighbor 10.0.1.1 remote-as external"),
            NeighborAttr::Other("remote-as".to_string())
        );
        assert_eq!(
            neighbor(" neighbor 10.0.1.1 description Transit  ISP A"),
            NeighborAttr::Description("Transit ISP A".to_string())
        );
        assert_eq!(neighbor("  neighbor 10.0.1.1 activate"), NeighborAttr::Activate);
        assert_eq!(
            neighbor("  neighbor 10.0.1.1 soft-reconfiguration inbound"),
            NeighborAttr::SoftReconfigurationInbound
        );
        assert_eq!(
            neighbor("  neighbor 10.0.1.1 route-map IMPORT in"),
            NeighborAttr::Policy(PolicyRef {
                kind: PolicyKind::RouteMap,
                name: "IMPORT".to_string(),
                direction: Direction::In,
            })
        );
        assert_eq!(
            neighbor("  neighbor 10.0.1.1 filter-list AS-PATH-OUT out"),
            NeighborAttr::Policy(PolicyRef {
                kind: PolicyKind::FilterList,
                name: "AS-PATH-OUT".to_string(),
                direction: Direction::Out,
            })
        );
        assert_eq!(
            neighbor("  neighbor 10.0.1.1 maximum-prefix 1000 80"),
            NeighborAttr::MaximumPrefix(1000)
        );
        assert_eq!(
            neighbor("  neighbor 10.0.1.1 update-source lo"),
            NeighborAttr::Other("update-source".to_string())
        );
    }

    #[test]
    fn test_non_ipv4_neighbors_are_not_recognized() {
        assert_eq!(
            Statement::parse(" neighbor 2001:db8::1 remote-as 65002"),
            Statement::Other("neighbor".to_string())
        );
        assert_eq!(
            Statement::parse(" neighbor peer1.example.net remote-as 65002"),
            Statement::Other("neighbor".to_string())
        );
        assert_eq!(
            Statement::parse(" neighbor UPSTREAM peer-group"),
            Statement::Other("neighbor".to_string())
        );
        assert!(Statement::parse(" neighbor 2001:db8::1 activate").is_bgp_body());
    }

    #[test]
    fn test_parse_definitions() {
        assert_eq!(
            Statement::parse("route-map IMPORT permit 10"),
            Statement::RouteMap {
                name: "IMPORT".to_string(),
                action: RouteMapAction::Permit,
                seq: 10
            }
        );
        assert_eq!(
            Statement::parse("route-map IMPORT"),
            Statement::Other("route-map".to_string())
        );
        assert_eq!(
            Statement::parse("ip prefix-list BOGONS seq 5 deny 10.0.0.0/8 le 32"),
            Statement::PrefixList {
                name: "BOGONS".to_string()
            }
        );
        assert_eq!(
            Statement::parse("ipv6 prefix-list V6-OUT permit 2001:db8::/32"),
            Statement::PrefixList {
                name: "V6-OUT".to_string()
            }
        );
        assert_eq!(
            Statement::parse("bgp as-path access-list UPSTREAM seq 5 permit ^65002_"),
            Statement::AsPathAccessList {
                name: "UPSTREAM".to_string()
            }
        );
        assert_eq!(
            Statement::parse("bgp community-list standard NO-EXPORT seq 5 permit no-export"),
            Statement::CommunityList {
                name: "NO-EXPORT".to_string()
            }
        );
    }

    #[test]
    fn test_parse_interface_statements() {
        assert_eq!(
            Statement::parse("interface eth0 vrf RED"),
            Statement::Interface {
                name: "eth0".to_string(),
                vrf: Some("RED".to_string())
            }
        );
        assert_eq!(
            Statement::parse(" ip address 10.0.0.1/24"),
            Statement::IpAddress("10.0.0.1/24".parse().unwrap())
        );
        assert_eq!(Statement::parse(" shutdown"), Statement::Shutdown);
        assert_eq!(
            Statement::parse(" no shutdown"),
            Statement::Other("no shutdown".to_string())
        );
        assert!(Statement::parse(" no shutdown").is_interface_body());
    }

    #[test]
    fn test_bgp_body() {
        assert!(Statement::parse("neighbor 10.0.0.1 remote-as 1").is_bgp_body());
        assert!(Statement::parse("bgp bestpath as-path multipath-relax").is_bgp_body());
        assert!(Statement::parse("no bgp default ipv4-unicast").is_bgp_body());
        assert!(Statement::parse("exit-address-family").is_bgp_body());
        assert!(!Statement::parse("route-map IMPORT permit 10").is_bgp_body());
        assert!(!Statement::parse("ip prefix-list BOGONS seq 5 deny 0.0.0.0/8").is_bgp_body());
        assert!(!Statement::parse("line vty").is_bgp_body());
        assert!(!Statement::parse("!").is_bgp_body());
        assert!(!Statement::parse("exit").is_bgp_body());
    }
}
