// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The fixed registry of recognized `<key>` attributes.

/// Which element kind a `<key>` attribute applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Domain {
    Node,
    Edge,
}

/// The declared type of a `<key>` attribute, used to parse `<data>` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttrKind {
    Str,
    Num,
    Int,
}

impl AttrKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            AttrKind::Str => "string",
            AttrKind::Num => "double",
            AttrKind::Int => "int",
        }
    }
}

/// A `<key>` element's declaration, as recorded under its `id`.
#[derive(Debug, Clone)]
pub(crate) struct KeyDecl {
    pub(crate) domain: Domain,
    pub(crate) name: String,
    pub(crate) kind: AttrKind,
}

/// The fixed set of node/edge attributes this parser understands. Any
/// `<key>` declared outside this set is recorded but never referenced by a
/// `<data>` element in practice; any `<data>` that does reference an
/// undeclared or unrecognized key id is rejected at parse time.
pub(crate) fn recognized(domain: Domain, attr_name: &str) -> Option<AttrKind> {
    match (domain, attr_name) {
        (Domain::Node, "type") => Some(AttrKind::Str),
        (Domain::Node, "packetloss") => Some(AttrKind::Num),
        (Domain::Node, "bandwidthup") => Some(AttrKind::Num),
        (Domain::Node, "bandwidthdown") => Some(AttrKind::Num),
        (Domain::Edge, "latency") => Some(AttrKind::Num),
        (Domain::Edge, "packetloss") => Some(AttrKind::Num),
        (Domain::Edge, "jitter") => Some(AttrKind::Num),
        (Domain::Edge, "queue_len") => Some(AttrKind::Int),
        _ => None,
    }
}
