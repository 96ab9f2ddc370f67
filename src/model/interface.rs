use ipnetwork::IpNetwork;

use crate::document::{Line, Statement};

/// zebra-style `interface <name>` block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub vrf: Option<String>,
    /// Index of the `interface` line
    pub index: usize,
    pub description: Option<String>,
    pub addresses: Vec<IpNetwork>,
    pub shutdown: bool,
    pub(super) end: usize,
}

impl Interface {
    pub(super) fn detect(lines: &[Line], records: &[Statement], start: usize) -> Self {
        let (name, vrf) = match &records[start] {
            Statement::Interface { name, vrf } => (name.clone(), vrf.clone()),
            _ => unreachable!("interface detection must start on its header"),
        };
        let mut interface = Self {
            name,
            vrf,
            index: start,
            description: None,
            addresses: Vec::new(),
            shutdown: false,
            end: start + 1,
        };
        let base = lines[start].indent();
        for i in (start + 1)..lines.len() {
            let statement = &records[i];
            if *statement == Statement::Blank {
                continue;
            }
            if lines[i].indent() <= base && !statement.is_interface_body() {
                if *statement == Statement::Exit {
                    interface.end = i + 1;
                }
                break;
            }
            interface.end = i + 1;
            match statement {
                Statement::Description(text) => interface.description = Some(text.clone()),
                Statement::IpAddress(prefix) => interface.addresses.push(*prefix),
                Statement::Shutdown => interface.shutdown = true,
                Statement::Other(keyword) if keyword == "no shutdown" => {
                    interface.shutdown = false
                }
                _ => {}
            }
        }
        interface
    }

    pub fn is_up(&self) -> bool {
        !self.shutdown
    }
}

#[cfg(test)]
mod tests {
    use crate::document::ConfigDocument;
    use crate::model::ParsedConfig;

    #[test]
    fn test_parse_zebra_config() {
        let doc = ConfigDocument::from_file("./fixtures/zebra.conf").unwrap();
        let interfaces = ParsedConfig::from_document(&doc).interfaces;
        let names: Vec<_> = interfaces.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["eth0", "eth1", "eth2", "lo"]);

        assert_eq!(interfaces[0].description.as_deref(), Some("Uplink to ISP-A"));
        assert_eq!(interfaces[1].addresses.len(), 2);
        assert!(interfaces[1].is_up());
        assert!(!interfaces[2].is_up());
        assert!(interfaces[2].addresses.is_empty());
        assert_eq!(interfaces[3].addresses, vec!["10.255.0.1/32".parse().unwrap()]);
    }

    #[test]
    fn test_flat_interface_block() {
        let text = "\
interface eth0
description Uplink
ip address 10.0.0.1/24
shutdown
no shutdown
ip route 0.0.0.0/0 10.0.0.254
";
        let doc = ConfigDocument::from_text(text);
        let interfaces = ParsedConfig::from_document(&doc).interfaces;
        assert_eq!(interfaces.len(), 1);
        assert!(interfaces[0].is_up());
        assert_eq!(interfaces[0].end, 5);
        assert_eq!(interfaces[0].description.as_deref(), Some("Uplink"));
    }
}
