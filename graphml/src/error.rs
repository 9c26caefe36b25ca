// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

/// Everything that can go wrong while ingesting a GraphML document.
#[derive(Debug, thiserror::Error)]
pub enum GraphmlError {
    /// The underlying XML was not well-formed.
    #[error("malformed XML")]
    Xml(#[from] quick_xml::Error),
    /// An attribute value was not valid UTF-8.
    #[error("attribute or text value was not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),
    /// The document's root element was missing, misnamed, or carried the
    /// wrong namespace.
    #[error("missing or unrecognized <graphml> root element")]
    BadRoot,
    /// A `<data>` element referenced a `key` id that was never declared by a
    /// `<key>` element (or was declared for the wrong domain).
    #[error("<data> references undeclared key {0:?}")]
    UnknownKey(String),
    /// A `<data>` value did not parse as its declared type.
    #[error("key {key:?} is declared as {declared} but value {value:?} does not parse as that type")]
    TypeMismatch {
        key: String,
        declared: &'static str,
        value: String,
    },
    /// An edge was directed, either explicitly or via the graph's
    /// `edgedefault`. Only undirected topologies are supported.
    #[error("edge {source:?} -> {target:?} is directed; only undirected graphs are supported")]
    DirectedEdge { source: String, target: String },
    /// In single-pass mode, a `<node>` closed after the first `<edge>` had
    /// already closed.
    #[error("node {0:?} encountered after the first edge in single-pass mode")]
    NodesAfterEdges(String),
    /// Two-pass mode was requested over a source that cannot be rewound.
    #[error("two-pass mode requires a seekable source; stdin is not seekable")]
    TwoPassRequiresSeek,
}
