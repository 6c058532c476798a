/**
 * Turn the flat `Manifest.db` catalog into a per-domain tree of path segments.
 * Nodes live in an arena and each domain keeps a `fullPath -> node` lookup
 */
use super::{error::BackupError, filter::EntryFilter, manifest::BackupIndex};
use common::ios::{DomainCategory, DomainTree, FileEntry, TreeEntry};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
struct Node {
    name: String,
    full_path: String,
    file_id: Option<String>,
    children: BTreeMap<String, usize>,
}

#[derive(Debug)]
struct Domain {
    category: DomainCategory,
    root: usize,
    lookup: HashMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct BackupTree {
    nodes: Vec<Node>,
    domains: BTreeMap<String, Domain>,
}

/// Route a domain to its display category by prefix
pub fn categorize_domain(domain: &str) -> DomainCategory {
    if domain.starts_with("AppDomainGroup-") {
        DomainCategory::AppGroup
    } else if domain.starts_with("AppDomainPlugin-") {
        DomainCategory::AppPlugin
    } else if domain == "HomeDomain" || domain.starts_with("AppDomain-") {
        DomainCategory::UserApp
    } else {
        DomainCategory::System
    }
}

/// Split a relative path on `/`, dropping empty segments
pub(crate) fn path_segments(relative_path: &str) -> Vec<&str> {
    relative_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}

impl BackupTree {
    pub fn new() -> BackupTree {
        BackupTree::default()
    }

    /// Build a tree from every catalog row matching the filter
    pub fn build(index: &BackupIndex, filter: &EntryFilter) -> Result<BackupTree, BackupError> {
        let mut tree = BackupTree::new();
        index.enumerate(filter, |entry| tree.insert(&entry))?;
        Ok(tree)
    }

    fn new_node(&mut self, name: &str, full_path: String) -> usize {
        self.nodes.push(Node {
            name: name.to_string(),
            full_path,
            file_id: None,
            children: BTreeMap::new(),
        });
        self.nodes.len() - 1
    }

    /// Insert a catalog row. Inserting the same `(domain, relativePath)` again does not add nodes
    pub fn insert(&mut self, entry: &FileEntry) {
        let root = match self.domains.get(&entry.domain) {
            Some(domain) => domain.root,
            None => {
                let root = self.new_node(&entry.domain, String::new());
                self.domains.insert(
                    entry.domain.clone(),
                    Domain {
                        category: categorize_domain(&entry.domain),
                        root,
                        lookup: HashMap::new(),
                    },
                );
                root
            }
        };

        let segments = path_segments(&entry.relative_path);
        let mut current = root;
        let mut full_path = String::new();
        for segment in &segments {
            if !full_path.is_empty() {
                full_path.push('/');
            }
            full_path.push_str(segment);

            let existing = self.nodes[current].children.get(*segment).copied();
            current = match existing {
                Some(child) => child,
                None => {
                    let child = self.new_node(segment, full_path.clone());
                    self.nodes[current].children.insert(segment.to_string(), child);
                    if let Some(domain) = self.domains.get_mut(&entry.domain) {
                        domain.lookup.insert(full_path.clone(), child);
                    }
                    child
                }
            };
        }

        if !segments.is_empty() && entry.flags != 2 {
            self.nodes[current].file_id = Some(entry.file_id.clone());
        }
    }

    /// Domains with their category, sorted by domain name
    pub fn domains(&self) -> Vec<(DomainCategory, &str)> {
        self.domains
            .iter()
            .map(|(name, domain)| (domain.category, name.as_str()))
            .collect()
    }

    /// Check if a `(domain, relativePath)` is in the tree
    pub fn contains(&self, domain: &str, relative_path: &str) -> bool {
        let key = path_segments(relative_path).join("/");
        match self.domains.get(domain) {
            Some(entry) => entry.lookup.contains_key(&key),
            None => false,
        }
    }

    /// Get the subtree at a full path. An empty path returns the domain root
    pub fn subtree(&self, domain: &str, full_path: &str) -> Option<TreeEntry> {
        let entry = self.domains.get(domain)?;
        let key = path_segments(full_path).join("/");
        let node = if key.is_empty() {
            entry.root
        } else {
            *entry.lookup.get(&key)?
        };
        Some(self.render(node))
    }

    fn render(&self, index: usize) -> TreeEntry {
        let node = &self.nodes[index];
        TreeEntry {
            name: node.name.clone(),
            full_path: node.full_path.clone(),
            file_id: node.file_id.clone(),
            children: node
                .children
                .values()
                .map(|child| self.render(*child))
                .collect(),
        }
    }

    /// Display tree ordered by category then domain. Children are sorted by name
    pub fn display(&self) -> Vec<DomainTree> {
        let mut trees: Vec<DomainTree> = self
            .domains
            .iter()
            .map(|(name, domain)| DomainTree {
                category: domain.category,
                domain: name.clone(),
                entries: self.render(domain.root).children,
            })
            .collect();
        trees.sort_by(|first, second| {
            first
                .category
                .cmp(&second.category)
                .then_with(|| first.domain.cmp(&second.domain))
        });
        trees
    }

    /// Number of path nodes, excluding domain roots
    pub fn len(&self) -> usize {
        self.nodes.len() - self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
