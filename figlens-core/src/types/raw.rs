//! Raw design-API nodes
//!
//! The design API returns an untyped JSON tree. It is validated once here,
//! at the ingestion boundary, into [`RawNode`]s: the fields every node carries
//! are lifted into typed fields and the node type becomes a closed [`NodeKind`]
//! (with an `Unknown` passthrough). Type-specific properties stay in an
//! order-preserving JSON map that extractors read through typed serde views.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Node types reported by the design API
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Canvas,
    Frame,
    Group,
    Section,
    Component,
    ComponentSet,
    Instance,
    Text,
    Vector,
    BooleanOperation,
    Star,
    Line,
    Ellipse,
    RegularPolygon,
    Rectangle,
    Slice,
    /// Any type this crate does not know about, kept verbatim
    Unknown(String),
}

impl NodeKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "DOCUMENT" => Self::Document,
            "CANVAS" => Self::Canvas,
            "FRAME" => Self::Frame,
            "GROUP" => Self::Group,
            "SECTION" => Self::Section,
            "COMPONENT" => Self::Component,
            "COMPONENT_SET" => Self::ComponentSet,
            "INSTANCE" => Self::Instance,
            "TEXT" => Self::Text,
            "VECTOR" => Self::Vector,
            "BOOLEAN_OPERATION" => Self::BooleanOperation,
            "STAR" => Self::Star,
            "LINE" => Self::Line,
            "ELLIPSE" => Self::Ellipse,
            "REGULAR_POLYGON" => Self::RegularPolygon,
            "RECTANGLE" => Self::Rectangle,
            "SLICE" => Self::Slice,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Document => "DOCUMENT",
            Self::Canvas => "CANVAS",
            Self::Frame => "FRAME",
            Self::Group => "GROUP",
            Self::Section => "SECTION",
            Self::Component => "COMPONENT",
            Self::ComponentSet => "COMPONENT_SET",
            Self::Instance => "INSTANCE",
            Self::Text => "TEXT",
            Self::Vector => "VECTOR",
            Self::BooleanOperation => "BOOLEAN_OPERATION",
            Self::Star => "STAR",
            Self::Line => "LINE",
            Self::Ellipse => "ELLIPSE",
            Self::RegularPolygon => "REGULAR_POLYGON",
            Self::Rectangle => "RECTANGLE",
            Self::Slice => "SLICE",
            Self::Unknown(raw) => raw,
        }
    }

    /// Kinds whose geometry is a vector path
    pub fn is_vector_path(&self) -> bool {
        matches!(
            self,
            Self::Vector
                | Self::BooleanOperation
                | Self::Star
                | Self::Line
                | Self::Ellipse
                | Self::RegularPolygon
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a JSON value cannot be ingested as a node
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("node is not a JSON object")]
    NotAnObject,

    #[error("node is missing string field `{0}`")]
    MissingField(&'static str),
}

/// A validated raw node
#[derive(Debug, Clone)]
pub struct RawNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// `false` only when the API explicitly marked the node invisible
    pub visible: bool,
    pub children: Vec<RawNode>,
    /// Every other field, in the order the API sent them
    pub props: Map<String, Value>,
}

impl RawNode {
    /// Ingest a JSON value as a node tree.
    ///
    /// Children that fail ingestion are dropped with a warning; only a
    /// malformed root is an error.
    pub fn ingest(value: Value) -> Result<Self, IngestError> {
        let Value::Object(mut props) = value else {
            return Err(IngestError::NotAnObject);
        };

        let id = take_string(&mut props, "id").ok_or(IngestError::MissingField("id"))?;
        let kind = take_string(&mut props, "type")
            .map(|t| NodeKind::parse(&t))
            .ok_or(IngestError::MissingField("type"))?;
        let name = take_string(&mut props, "name").unwrap_or_else(|| "Unnamed Node".to_string());
        let visible = match props.remove("visible") {
            Some(Value::Bool(visible)) => visible,
            _ => true,
        };

        let children = match props.remove("children") {
            Some(Value::Array(raw_children)) => raw_children
                .into_iter()
                .enumerate()
                .filter_map(|(index, child)| match RawNode::ingest(child) {
                    Ok(node) => Some(node),
                    Err(e) => {
                        tracing::warn!("Skipping child {} of node {}: {}", index, id, e);
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            id,
            name,
            kind,
            visible,
            children,
            props,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.props.get(key).is_some_and(|v| !v.is_null())
    }

    /// Read a property through a typed view. `Ok(None)` when absent or null.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, serde_json::Error> {
        match self.props.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some),
        }
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        self.props.get(key).and_then(Value::as_f64)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    /// Frames are recognized by their `clipsContent` flag, which only frame-like nodes carry
    pub fn is_frame(&self) -> bool {
        matches!(self.props.get("clipsContent"), Some(Value::Bool(_)))
    }

    /// An auto-layout frame lays its children out along a row or a column
    pub fn is_auto_layout(&self) -> bool {
        self.is_frame() && matches!(self.str("layoutMode"), Some("HORIZONTAL" | "VERTICAL"))
    }

    pub fn is_vector_leaf(&self) -> bool {
        self.kind.is_vector_path() && self.children.is_empty()
    }

    pub fn visible_children(&self) -> impl Iterator<Item = &RawNode> {
        self.children.iter().filter(|child| child.visible)
    }
}

fn take_string(props: &mut Map<String, Value>, key: &str) -> Option<String> {
    match props.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}
