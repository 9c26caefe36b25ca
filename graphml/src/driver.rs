// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The SAX-style state machine that drives GraphML ingest.

use crate::error::GraphmlError;
use crate::keys::{Domain, KeyDecl, recognized};
use crate::sink::{EdgeAttrs, GraphSink, NodeAttrs};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;
use std::collections::HashMap;
use std::io::BufRead;
use tracing::{instrument, warn};

/// Which events a single call to [`GraphmlDriver::run`] delivers to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassFilter {
    /// Deliver both nodes and edges (single-pass mode).
    Both,
    /// Deliver only nodes; the first pass of two-pass mode.
    NodesOnly,
    /// Deliver only edges; the second pass of two-pass mode.
    EdgesOnly,
}

#[derive(Debug, Clone, Copy)]
enum DataDomain {
    Node,
    Edge,
}

#[derive(Debug)]
enum State {
    Initial,
    TopLevel,
    Graph,
    Node {
        id: String,
        attrs: NodeAttrs,
    },
    Edge {
        source: String,
        target: String,
        attrs: EdgeAttrs,
    },
    Data {
        resume: Box<State>,
        domain: DataDomain,
        key: String,
        buffer: String,
    },
    Unknown {
        depth: u32,
        resume: Box<State>,
    },
}

/// A streaming parser for the GraphML subset used to describe network
/// topologies. Drives events from a [`quick_xml::Reader`] through a small
/// state machine and emits fully-parsed nodes and edges to a [`GraphSink`]
/// in document order.
///
/// Any fatal error latches the driver `dead`: the remainder of the document
/// is drained without further processing so the underlying reader can be
/// dropped cleanly, and the first diagnostic is the one returned.
#[derive(Debug)]
pub struct GraphmlDriver {
    keys: HashMap<String, KeyDecl>,
    state: State,
    dead: bool,
    seen_edge: bool,
    default_directed: bool,
}

impl Default for GraphmlDriver {
    fn default() -> Self {
        GraphmlDriver {
            keys: HashMap::new(),
            state: State::Initial,
            dead: false,
            seen_edge: false,
            default_directed: false,
        }
    }
}

impl GraphmlDriver {
    /// A driver ready to parse its first pass.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one pass over `reader`, delivering the events permitted by
    /// `filter` to `sink` in document order.
    ///
    /// The key registry accumulated from `<key>` declarations persists
    /// across calls on the same driver, so a single driver can be reused for
    /// both passes of two-pass mode; all other per-pass state is reset at
    /// the start of each call.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`GraphmlError`] encountered (malformed XML,
    /// an undeclared or mistyped `<data>` key, a directed edge, or, in
    /// single-pass mode, a node closing after the first edge).
    #[instrument(skip_all)]
    pub fn run<R: BufRead>(
        &mut self,
        reader: R,
        filter: PassFilter,
        sink: &mut dyn GraphSink,
    ) -> Result<(), GraphmlError> {
        self.state = State::Initial;
        self.dead = false;
        self.seen_edge = false;
        self.default_directed = false;

        let mut xml = Reader::from_reader(reader);
        xml.config_mut().trim_text = true;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let event = xml.read_event_into(&mut buf)?;
            if self.dead {
                if matches!(event, Event::Eof) {
                    return Ok(());
                }
                continue;
            }
            match event {
                Event::Eof => return Ok(()),
                Event::Start(start) => {
                    let name = local_name(start.name())?.to_string();
                    self.on_start(&name, &start)?;
                }
                Event::Empty(start) => {
                    let name = local_name(start.name())?.to_string();
                    self.on_start(&name, &start)?;
                    self.on_end(&name, filter, sink)?;
                }
                Event::End(end) => {
                    let name = local_name(end.name())?.to_string();
                    self.on_end(&name, filter, sink)?;
                }
                Event::Text(text) => {
                    let decoded = text.unescape()?;
                    self.on_text(&decoded);
                }
                _ => {}
            }
        }
    }

    fn fail(&mut self, err: GraphmlError) -> GraphmlError {
        self.dead = true;
        warn!(%err, "graphml ingest aborted");
        err
    }

    fn on_start(&mut self, name: &str, e: &BytesStart) -> Result<(), GraphmlError> {
        let state = std::mem::replace(&mut self.state, State::Initial);
        let next = match (state, name) {
            (State::Unknown { depth, resume }, _) => State::Unknown { depth: depth + 1, resume },
            (State::Initial, "graphml") => {
                if let Some(xmlns) = get_attr(e, "xmlns")? {
                    if xmlns != "http://graphml.graphdrawing.org/xmlns" {
                        return Err(self.fail(GraphmlError::BadRoot));
                    }
                }
                State::TopLevel
            }
            (State::Initial, _) => return Err(self.fail(GraphmlError::BadRoot)),
            (State::TopLevel, "key") => {
                self.declare_key(e)?;
                State::TopLevel
            }
            (State::TopLevel, "graph") => {
                self.default_directed = get_attr(e, "edgedefault")?.as_deref() == Some("directed");
                State::Graph
            }
            (State::Graph, "node") => {
                let id = get_attr(e, "id")?.unwrap_or_default();
                State::Node { id, attrs: NodeAttrs::default() }
            }
            (State::Graph, "edge") => {
                let source = get_attr(e, "source")?.unwrap_or_default();
                let target = get_attr(e, "target")?.unwrap_or_default();
                let directed = match get_attr(e, "directed")?.as_deref() {
                    Some("true") => true,
                    Some("false") => false,
                    _ => self.default_directed,
                };
                if directed {
                    return Err(self.fail(GraphmlError::DirectedEdge { source, target }));
                }
                State::Edge { source, target, attrs: EdgeAttrs::default() }
            }
            (State::Node { id, attrs }, "data") => {
                let key = get_attr(e, "key")?.unwrap_or_default();
                State::Data {
                    resume: Box::new(State::Node { id, attrs }),
                    domain: DataDomain::Node,
                    key,
                    buffer: String::new(),
                }
            }
            (State::Edge { source, target, attrs }, "data") => {
                let key = get_attr(e, "key")?.unwrap_or_default();
                State::Data {
                    resume: Box::new(State::Edge { source, target, attrs }),
                    domain: DataDomain::Edge,
                    key,
                    buffer: String::new(),
                }
            }
            (other, _) => State::Unknown { depth: 1, resume: Box::new(other) },
        };
        self.state = next;
        Ok(())
    }

    fn on_end(&mut self, name: &str, filter: PassFilter, sink: &mut dyn GraphSink) -> Result<(), GraphmlError> {
        let state = std::mem::replace(&mut self.state, State::Initial);
        let next = match state {
            State::Unknown { depth, resume } => {
                if depth <= 1 { *resume } else { State::Unknown { depth: depth - 1, resume } }
            }
            State::Data { resume, domain, key, buffer } if name == "data" => {
                self.apply_data(*resume, domain, &key, buffer)?
            }
            State::Node { id, attrs } if name == "node" => {
                if filter == PassFilter::Both && self.seen_edge {
                    return Err(self.fail(GraphmlError::NodesAfterEdges(id)));
                }
                if filter != PassFilter::EdgesOnly {
                    sink.node(&id, attrs);
                }
                State::Graph
            }
            State::Edge { source, target, attrs } if name == "edge" => {
                self.seen_edge = true;
                if filter != PassFilter::NodesOnly {
                    sink.edge(&source, &target, attrs);
                }
                State::Graph
            }
            State::Graph if name == "graph" => State::TopLevel,
            State::TopLevel if name == "graphml" => State::Initial,
            State::TopLevel if name == "key" => State::TopLevel,
            other => other,
        };
        self.state = next;
        Ok(())
    }

    fn on_text(&mut self, text: &str) {
        if let State::Data { buffer, .. } = &mut self.state {
            buffer.push_str(text);
        }
    }

    fn declare_key(&mut self, e: &BytesStart) -> Result<(), GraphmlError> {
        let id = get_attr(e, "id")?.unwrap_or_default();
        let domain_attr = get_attr(e, "for")?.unwrap_or_default();
        let attr_name = get_attr(e, "attr.name")?.unwrap_or_default();
        let domain = match domain_attr.as_str() {
            "node" => Domain::Node,
            "edge" => Domain::Edge,
            _ => return Ok(()),
        };
        if let Some(kind) = recognized(domain, &attr_name) {
            self.keys.insert(id, KeyDecl { domain, name: attr_name, kind });
        }
        Ok(())
    }

    fn apply_data(&mut self, resume: State, domain: DataDomain, key: &str, buffer: String) -> Result<State, GraphmlError> {
        let decl = match self.keys.get(key).cloned() {
            Some(decl) => decl,
            None => return Err(self.fail(GraphmlError::UnknownKey(key.to_string()))),
        };
        let value = buffer.trim();
        match (resume, domain) {
            (State::Node { id, mut attrs }, DataDomain::Node) => {
                self.assign_node_attr(&mut attrs, &decl, key, value)?;
                Ok(State::Node { id, attrs })
            }
            (State::Edge { source, target, mut attrs }, DataDomain::Edge) => {
                self.assign_edge_attr(&mut attrs, &decl, key, value)?;
                Ok(State::Edge { source, target, attrs })
            }
            (other, _) => Ok(other),
        }
    }

    fn assign_node_attr(&mut self, attrs: &mut NodeAttrs, decl: &KeyDecl, key: &str, value: &str) -> Result<(), GraphmlError> {
        match decl.name.as_str() {
            "type" => attrs.kind = Some(value.to_string()),
            "packetloss" => attrs.packetloss = Some(self.parse_num(key, decl, value)?),
            "bandwidthup" => attrs.bandwidth_up = Some(self.parse_num(key, decl, value)?),
            "bandwidthdown" => attrs.bandwidth_down = Some(self.parse_num(key, decl, value)?),
            _ => {}
        }
        Ok(())
    }

    fn assign_edge_attr(&mut self, attrs: &mut EdgeAttrs, decl: &KeyDecl, key: &str, value: &str) -> Result<(), GraphmlError> {
        match decl.name.as_str() {
            "latency" => attrs.latency = Some(self.parse_num(key, decl, value)?),
            "packetloss" => attrs.packetloss = Some(self.parse_num(key, decl, value)?),
            "jitter" => attrs.jitter = Some(self.parse_num(key, decl, value)?),
            "queue_len" => attrs.queue_len = Some(self.parse_int(key, decl, value)?),
            _ => {}
        }
        Ok(())
    }

    fn parse_num(&mut self, key: &str, decl: &KeyDecl, value: &str) -> Result<f64, GraphmlError> {
        value.parse::<f64>().map_err(|_| {
            self.fail(GraphmlError::TypeMismatch {
                key: key.to_string(),
                declared: decl.kind.name(),
                value: value.to_string(),
            })
        })
    }

    fn parse_int(&mut self, key: &str, decl: &KeyDecl, value: &str) -> Result<i64, GraphmlError> {
        value.parse::<i64>().map_err(|_| {
            self.fail(GraphmlError::TypeMismatch {
                key: key.to_string(),
                declared: decl.kind.name(),
                value: value.to_string(),
            })
        })
    }
}

fn local_name(name: QName<'_>) -> Result<&str, GraphmlError> {
    Ok(std::str::from_utf8(name.local_name().as_ref())?)
}

fn get_attr(e: &BytesStart, key: &str) -> Result<Option<String>, GraphmlError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSink {
        nodes: Vec<(String, NodeAttrs)>,
        edges: Vec<(String, String, EdgeAttrs)>,
    }

    impl GraphSink for RecordingSink {
        fn node(&mut self, id: &str, attrs: NodeAttrs) {
            self.nodes.push((id.to_string(), attrs));
        }
        fn edge(&mut self, source: &str, target: &str, attrs: EdgeAttrs) {
            self.edges.push((source.to_string(), target.to_string(), attrs));
        }
    }

    const SCENARIO_A: &str = r#"<?xml version="1.0"?>
<graphml>
  <key id="d0" for="node" attr.name="type" attr.type="string"/>
  <key id="d1" for="edge" attr.name="latency" attr.type="double"/>
  <graph edgedefault="undirected">
    <node id="n1"><data key="d0">client</data></node>
    <node id="n2"><data key="d0">client</data></node>
    <edge source="n1" target="n2"><data key="d1">1.0</data></edge>
  </graph>
</graphml>"#;

    #[test]
    fn scenario_a_minimal_topology() {
        let mut sink = RecordingSink::default();
        let mut driver = GraphmlDriver::new();
        driver.run(SCENARIO_A.as_bytes(), PassFilter::Both, &mut sink).unwrap();

        assert_eq!(sink.nodes.len(), 2);
        assert_eq!(sink.nodes[0].0, "n1");
        assert_eq!(sink.nodes[0].1.kind.as_deref(), Some("client"));
        assert_eq!(sink.edges.len(), 1);
        assert_eq!(sink.edges[0].0, "n1");
        assert_eq!(sink.edges[0].1, "n2");
        assert_eq!(sink.edges[0].2.latency, Some(1.0));
    }

    const SCENARIO_C_EDGES_FIRST: &str = r#"<graphml>
  <key id="d0" for="edge" attr.name="latency" attr.type="double"/>
  <graph edgedefault="undirected">
    <edge source="n1" target="n2"><data key="d0">2.0</data></edge>
    <node id="n1"/>
    <node id="n2"/>
  </graph>
</graphml>"#;

    #[test]
    fn scenario_c_two_pass_handles_edges_before_nodes() {
        let mut sink = RecordingSink::default();
        let mut driver = GraphmlDriver::new();
        driver
            .run(SCENARIO_C_EDGES_FIRST.as_bytes(), PassFilter::NodesOnly, &mut sink)
            .unwrap();
        driver
            .run(SCENARIO_C_EDGES_FIRST.as_bytes(), PassFilter::EdgesOnly, &mut sink)
            .unwrap();
        assert_eq!(sink.nodes.len(), 2);
        assert_eq!(sink.edges.len(), 1);
    }

    #[test]
    fn scenario_c_single_pass_rejects_edges_before_nodes() {
        let mut sink = RecordingSink::default();
        let mut driver = GraphmlDriver::new();
        let err = driver
            .run(SCENARIO_C_EDGES_FIRST.as_bytes(), PassFilter::Both, &mut sink)
            .unwrap_err();
        assert!(matches!(err, GraphmlError::NodesAfterEdges(_)));
    }

    #[test]
    fn directed_edge_is_rejected() {
        let doc = r#"<graphml>
  <graph edgedefault="directed">
    <node id="n1"/>
    <node id="n2"/>
    <edge source="n1" target="n2"/>
  </graph>
</graphml>"#;
        let mut sink = RecordingSink::default();
        let mut driver = GraphmlDriver::new();
        let err = driver.run(doc.as_bytes(), PassFilter::Both, &mut sink).unwrap_err();
        assert!(matches!(err, GraphmlError::DirectedEdge { .. }));
    }

    #[test]
    fn undeclared_data_key_is_rejected() {
        let doc = r#"<graphml>
  <graph edgedefault="undirected">
    <node id="n1"><data key="nope">x</data></node>
  </graph>
</graphml>"#;
        let mut sink = RecordingSink::default();
        let mut driver = GraphmlDriver::new();
        let err = driver.run(doc.as_bytes(), PassFilter::Both, &mut sink).unwrap_err();
        assert!(matches!(err, GraphmlError::UnknownKey(_)));
    }

    #[test]
    fn type_mismatch_on_numeric_attribute_is_rejected() {
        let doc = r#"<graphml>
  <key id="d0" for="node" attr.name="packetloss" attr.type="double"/>
  <graph edgedefault="undirected">
    <node id="n1"><data key="d0">not-a-number</data></node>
  </graph>
</graphml>"#;
        let mut sink = RecordingSink::default();
        let mut driver = GraphmlDriver::new();
        let err = driver.run(doc.as_bytes(), PassFilter::Both, &mut sink).unwrap_err();
        assert!(matches!(err, GraphmlError::TypeMismatch { .. }));
    }

    #[test]
    fn unrecognized_elements_are_skipped_without_disturbing_parsing() {
        let doc = r#"<graphml>
  <desc>some human description</desc>
  <graph edgedefault="undirected">
    <node id="n1">
      <desc><nested>ignored</nested></desc>
    </node>
  </graph>
</graphml>"#;
        let mut sink = RecordingSink::default();
        let mut driver = GraphmlDriver::new();
        driver.run(doc.as_bytes(), PassFilter::Both, &mut sink).unwrap();
        assert_eq!(sink.nodes.len(), 1);
    }

    #[test]
    fn bad_root_element_is_rejected() {
        let doc = r#"<notgraphml/>"#;
        let mut sink = RecordingSink::default();
        let mut driver = GraphmlDriver::new();
        let err = driver.run(doc.as_bytes(), PassFilter::Both, &mut sink).unwrap_err();
        assert!(matches!(err, GraphmlError::BadRoot));
    }

    #[test]
    fn wrong_namespace_is_rejected() {
        let doc = r#"<graphml xmlns="http://example.com/not-graphml"/>"#;
        let mut sink = RecordingSink::default();
        let mut driver = GraphmlDriver::new();
        let err = driver.run(doc.as_bytes(), PassFilter::Both, &mut sink).unwrap_err();
        assert!(matches!(err, GraphmlError::BadRoot));
    }

    #[test]
    fn correct_namespace_is_accepted() {
        let doc = r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <graph edgedefault="undirected"/>
</graphml>"#;
        let mut sink = RecordingSink::default();
        let mut driver = GraphmlDriver::new();
        driver.run(doc.as_bytes(), PassFilter::Both, &mut sink).unwrap();
    }
}
