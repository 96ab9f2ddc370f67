mod interface;
mod section;

pub use interface::Interface;
pub use section::{Activation, AddressFamily, BgpSection, Neighbor, Network, PolicyEntry, RemoteAs};

use std::collections::BTreeSet;

use itertools::Itertools;

use crate::document::{ConfigDocument, Line, PolicyKind, PolicyRef, RouteMapAction, Statement};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMapDefinition {
    pub name: String,
    pub action: RouteMapAction,
    pub seq: u32,
    pub index: usize,
}

/// Everything derived from one scan of a [`ConfigDocument`]
#[derive(Clone, Debug)]
pub struct ParsedConfig {
    records: Vec<Statement>,
    pub sections: Vec<BgpSection>,
    pub route_maps: Vec<RouteMapDefinition>,
    pub prefix_lists: BTreeSet<String>,
    pub as_path_filters: BTreeSet<String>,
    pub community_lists: BTreeSet<String>,
    pub interfaces: Vec<Interface>,
}

impl ParsedConfig {
    pub fn from_document(document: &ConfigDocument) -> Self {
        let lines = document.lines();
        let records: Vec<Statement> = lines.iter().map(Line::statement).collect();

        let mut sections = Vec::new();
        let mut interfaces = Vec::new();
        let mut i = 0;
        while i < records.len() {
            match &records[i] {
                Statement::RouterBgp { .. } => {
                    let section = BgpSection::detect(lines, &records, i);
                    i = section.end;
                    sections.push(section);
                }
                Statement::Interface { .. } => {
                    let interface = Interface::detect(lines, &records, i);
                    i = interface.end;
                    interfaces.push(interface);
                }
                _ => i += 1,
            }
        }

        let mut route_maps = Vec::new();
        let mut prefix_lists = BTreeSet::new();
        let mut as_path_filters = BTreeSet::new();
        let mut community_lists = BTreeSet::new();
        for (index, record) in records.iter().enumerate() {
            match record {
                Statement::RouteMap { name, action, seq } => {
                    route_maps.push(RouteMapDefinition {
                        name: name.clone(),
                        action: *action,
                        seq: *seq,
                        index,
                    });
                }
                Statement::PrefixList { name } => {
                    prefix_lists.insert(name.clone());
                }
                Statement::AsPathAccessList { name } => {
                    as_path_filters.insert(name.clone());
                }
                Statement::CommunityList { name } => {
                    community_lists.insert(name.clone());
                }
                _ => {}
            }
        }

        Self {
            records,
            sections,
            route_maps,
            prefix_lists,
            as_path_filters,
            community_lists,
            interfaces,
        }
    }

    pub fn statement(&self, index: usize) -> Option<&Statement> {
        self.records.get(index)
    }

    /// Does the document define the object this policy points at?
    /// Definitions count wherever they appear in the file.
    pub fn is_defined(&self, policy: &PolicyRef) -> bool {
        match policy.kind {
            PolicyKind::RouteMap => self.route_maps.iter().any(|rm| rm.name == policy.name),
            PolicyKind::PrefixList => self.prefix_lists.contains(&policy.name),
            PolicyKind::FilterList => self.as_path_filters.contains(&policy.name),
        }
    }

    /// Route-map names in order of first definition
    pub fn route_map_names(&self) -> Vec<&str> {
        self.route_maps
            .iter()
            .map(|rm| rm.name.as_str())
            .unique()
            .collect()
    }

    pub fn route_map_entries<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a RouteMapDefinition> + 'a {
        self.route_maps.iter().filter(move |rm| rm.name == name)
    }
}
