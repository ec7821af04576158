//! Owned syntax trees for Python sources.
//!
//! Detectors never touch tree-sitter directly. The builder in [`python`]
//! parses a file once and lowers the concrete tree into [`Node`]s whose
//! kinds carry exactly the structure the smell detectors need:
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌────────────┐
//! │ source text │────▶│ tree-sitter CST  │────▶│ SyntaxTree │
//! └─────────────┘     └──────────────────┘     └────────────┘
//!                                                     │
//!                                                     ▼
//!                                              ┌────────────┐
//!                                              │ Detectors  │
//!                                              └────────────┘
//! ```

mod python;

use std::collections::VecDeque;
use std::fmt;

pub use python::{parse, MAX_NESTING_DEPTH};

/// Conventional name of the bound instance parameter of a method.
pub const RECEIVER_NAME: &str = "self";

/// Source location of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// End line (1-indexed).
    pub end_line: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        Self::between(node, node)
    }

    /// Span starting at `first` and ending at `last`.
    pub fn between(first: tree_sitter::Node, last: tree_sitter::Node) -> Self {
        Self {
            start_byte: first.start_byte(),
            end_byte: last.end_byte(),
            start_line: first.start_position().row + 1, // tree-sitter is 0-indexed
            end_line: last.end_position().row + 1,
        }
    }

    /// Whether `other` lies entirely within this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start_byte <= other.start_byte
            && other.end_byte <= self.end_byte
            && self.start_line <= other.start_line
            && other.end_line <= self.end_line
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_line, self.end_line)
    }
}

/// How a parameter may be passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Declared before a `/` separator.
    PositionalOnly,
    /// Positional-or-keyword.
    Regular,
    /// `*args`
    VarPositional,
    /// Declared after `*` or `*args`.
    KeywordOnly,
    /// `**kwargs`
    VarKeyword,
}

/// A declared function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    /// Source text of the default value, if any.
    pub default: Option<String>,
}

/// Payload of a `def` (or `async def`) node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub is_async: bool,
}

impl FunctionDeclaration {
    /// Parameters a caller may pass either positionally or by keyword.
    pub fn regular_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(|p| p.kind == ParameterKind::Regular)
    }

    /// The leading `self` parameter, when the function declares one.
    pub fn receiver(&self) -> Option<&Parameter> {
        self.regular_parameters()
            .next()
            .filter(|p| p.name == RECEIVER_NAME)
    }
}

/// Payload of a `class` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDeclaration {
    pub name: String,
}

/// Argument accounting for a call expression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallExpression {
    /// Positional arguments, including `*iterable` splats.
    pub positional_args: usize,
    /// Keyword arguments, including `**mapping` splats.
    pub keyword_args: usize,
}

impl CallExpression {
    pub fn total_args(&self) -> usize {
        self.positional_args + self.keyword_args
    }
}

/// A literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i128),
    /// Integer literal too large for `Int`, kept as its digits.
    LargeInt(String),
    Float(f64),
    /// Imaginary literal such as `3j`, kept as source text.
    Complex(String),
    /// String literal, kept as source text including quotes.
    Str(String),
    Bool(bool),
    None,
}

impl Constant {
    /// Numeric value for integer and float literals.
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            Constant::Int(v) => Some(*v as f64),
            Constant::LargeInt(text) => Some(approximate_int(text)),
            Constant::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The constant with its sign flipped, for numeric literals.
    pub fn negated(&self) -> Option<Constant> {
        match self {
            Constant::Int(v) => v.checked_neg().map(Constant::Int),
            Constant::LargeInt(text) => Some(Constant::LargeInt(match text.strip_prefix('-') {
                Some(magnitude) => magnitude.to_string(),
                None => format!("-{}", text),
            })),
            Constant::Float(v) => Some(Constant::Float(-v)),
            _ => None,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Float(v) => f.write_str(&float_repr(*v)),
            Constant::LargeInt(text) | Constant::Complex(text) | Constant::Str(text) => {
                f.write_str(text)
            }
            Constant::Bool(true) => f.write_str("True"),
            Constant::Bool(false) => f.write_str("False"),
            Constant::None => f.write_str("None"),
        }
    }
}

/// Nearest float to an integer literal of any size.
fn approximate_int(text: &str) -> f64 {
    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(magnitude) => (true, magnitude),
        None => (false, text),
    };
    let (digits, radix) = python::split_radix(magnitude);
    let value = digits
        .chars()
        .filter_map(|d| d.to_digit(radix))
        .fold(0.0, |acc, d| acc * radix as f64 + d as f64);
    if negative {
        -value
    } else {
        value
    }
}

/// Render a float the way Python's `repr` does (`2.0`, `3.14`, `1e-05`).
fn float_repr(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let abs = v.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let formatted = format!("{:e}", v);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => formatted,
        };
    }

    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// The closed set of node kinds produced by the builder.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Module,
    FunctionDeclaration(FunctionDeclaration),
    ClassDeclaration(ClassDeclaration),
    /// Ordered statement sequence (function, class, loop or branch body).
    Block,
    /// `else`/`elif` continuation of an `if`, `for`, `while` or `try`.
    ElseBranch,
    Decorator,
    IfStatement,
    ForStatement,
    WhileStatement,
    TryStatement,
    WithStatement,
    Assignment,
    AugmentedAssignment,
    AnnotatedAssignment,
    ReturnStatement,
    ExpressionStatement,
    CallExpression(CallExpression),
    /// `name=value` inside a call; the value is the only child.
    KeywordArgument(String),
    /// `object.attribute`; the object is the only child.
    AttributeAccess(String),
    Identifier(String),
    Constant(Constant),
    /// Any other grammar node, by tree-sitter kind name.
    Other(String),
}

/// A node of the owned syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span, children: Vec<Node>) -> Self {
        Self {
            kind,
            span,
            children,
        }
    }

    /// Breadth-first walk over this node and all of its descendants.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            queue: VecDeque::from([self]),
        }
    }

    /// The statement block of a function, class, loop or `if`.
    pub fn body(&self) -> Option<&Node> {
        self.children
            .iter()
            .find(|c| matches!(c.kind, NodeKind::Block))
    }

    /// The `else`/`elif` continuation, if present.
    pub fn else_branch(&self) -> Option<&Node> {
        self.children
            .iter()
            .find(|c| matches!(c.kind, NodeKind::ElseBranch))
    }

    /// Statements of the body block, or an empty slice.
    pub fn body_statements(&self) -> &[Node] {
        self.body().map(|b| b.children.as_slice()).unwrap_or(&[])
    }

    pub fn as_function(&self) -> Option<&FunctionDeclaration> {
        match &self.kind {
            NodeKind::FunctionDeclaration(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassDeclaration> {
        match &self.kind {
            NodeKind::ClassDeclaration(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&CallExpression> {
        match &self.kind {
            NodeKind::CallExpression(call) => Some(call),
            _ => None,
        }
    }

    /// Whether this node is the identifier `name`.
    pub fn is_identifier(&self, name: &str) -> bool {
        matches!(&self.kind, NodeKind::Identifier(id) if id == name)
    }
}

/// Breadth-first iterator over a subtree, in source order per level.
///
/// `Block` and `ElseBranch` wrappers below the starting node are not
/// yielded; their children count as children of the enclosing node, so
/// a statement sits one level below its function, class or `if`.
pub struct Walk<'a> {
    queue: VecDeque<&'a Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        let mut pending: Vec<&Node> = node.children.iter().rev().collect();
        while let Some(child) = pending.pop() {
            if matches!(child.kind, NodeKind::Block | NodeKind::ElseBranch) {
                pending.extend(child.children.iter().rev());
            } else {
                self.queue.push_back(child);
            }
        }
        Some(node)
    }
}

/// A parsed file: the lowered tree plus the text it was built from.
#[derive(Debug, Clone)]
pub struct SyntaxTree<'src> {
    source: &'src str,
    root: Node,
}

impl<'src> SyntaxTree<'src> {
    pub fn new(source: &'src str, root: Node) -> Self {
        Self { source, root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn walk(&self) -> Walk<'_> {
        self.root.walk()
    }

    /// Every function declaration in the file, nested ones included.
    pub fn functions(&self) -> impl Iterator<Item = (&Node, &FunctionDeclaration)> {
        self.walk().filter_map(|n| n.as_function().map(|f| (n, f)))
    }

    /// Every class declaration in the file, nested ones included.
    pub fn classes(&self) -> impl Iterator<Item = (&Node, &ClassDeclaration)> {
        self.walk().filter_map(|n| n.as_class().map(|c| (n, c)))
    }

    /// Source text of a node, when its byte range can be sliced.
    pub fn snippet(&self, node: &Node) -> Option<&'src str> {
        self.source.get(node.span.start_byte..node.span.end_byte)
    }
}
