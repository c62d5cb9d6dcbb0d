use std::collections::HashSet;
use std::path::Path;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use crate::error::CatalogError;

/// A fixed participant drawn on the visualization surface.
///
/// `position` is normalized to the unit square; the renderer maps it into
/// whatever rectangle it is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub position: Vec2,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub ordinal: usize,
    pub title: String,
    pub description: String,
    pub source: String,
    pub target: String,
}

impl Step {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawCatalog {
    nodes: Vec<Node>,
    steps: Vec<Step>,
}

/// Ordered, validated list of steps over a fixed node layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    nodes: Vec<Node>,
    steps: Vec<Step>,
}

impl Catalog {
    pub fn new(nodes: Vec<Node>, steps: Vec<Step>) -> Result<Self, CatalogError> {
        if steps.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut ids = HashSet::new();
        for node in &nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(CatalogError::DuplicateNode(node.id.clone()));
            }
        }

        for (index, step) in steps.iter().enumerate() {
            if step.ordinal != index + 1 {
                return Err(CatalogError::Ordinal {
                    index,
                    expected: index + 1,
                    found: step.ordinal,
                });
            }
            for node in [&step.source, &step.target] {
                if !ids.contains(node.as_str()) {
                    return Err(CatalogError::UnknownNode {
                        ordinal: step.ordinal,
                        node: node.clone(),
                    });
                }
            }
        }

        Ok(Self { nodes, steps })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        Self::new(raw.nodes, raw.steps)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Number of steps (N)
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Step shown at `cursor`; `None` at cursor 0 or past the end.
    pub fn step_at(&self, cursor: usize) -> Option<&Step> {
        cursor.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Client PC reaching an intranet file server: name resolution, link
    /// setup, Kerberos authentication, authorization and the data transfer.
    pub fn reference() -> Self {
        let node = |id: &str, label: &str, x: f32, y: f32, color: [u8; 3]| Node {
            id: id.to_string(),
            label: label.to_string(),
            position: Vec2::new(x, y),
            color,
        };
        let step = |ordinal: usize, title: &str, description: &str, source: &str, target: &str| Step {
            ordinal,
            title: title.to_string(),
            description: description.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        };

        // Laid out on an 800x600 board, normalized.
        let nodes = vec![
            node("user", "Client PC", 100.0 / 800.0, 300.0 / 600.0, [96, 165, 250]),
            node("dns", "DNS Server", 300.0 / 800.0, 100.0 / 600.0, [244, 114, 182]),
            node("gateway", "Gateway", 300.0 / 800.0, 500.0 / 600.0, [167, 139, 250]),
            node("kdc", "KDC (AD)", 500.0 / 800.0, 100.0 / 600.0, [251, 191, 36]),
            node("server", "File Server", 600.0 / 800.0, 300.0 / 600.0, [52, 211, 153]),
        ];

        let steps = vec![
            step(1, "DNS Resolution", "Client queries internal DNS for intranet.corp.local", "user", "dns"),
            step(2, "DNS Response", "DNS server returns internal IP (10.x.x.x)", "dns", "user"),
            step(3, "ARP Request", "Client resolves MAC address of Gateway/Server", "user", "gateway"),
            step(4, "TCP Handshake", "SYN → SYN-ACK → ACK to establish connection", "user", "server"),
            step(
                5,
                "Authentication",
                "Kerberos TGT presented to KDC, Service Ticket obtained (or NTLM fallback)",
                "user",
                "kdc",
            ),
            step(6, "Authorization", "Server checks ACLs and Permissions", "server", "server"),
            step(7, "Data Transfer", "Authorized data flows back to client", "server", "user"),
        ];

        // Static content validated by `reference_catalog_is_valid`.
        Self { nodes, steps }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::reference()
    }
}
