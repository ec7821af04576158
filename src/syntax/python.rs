//! Python syntax tree builder using tree-sitter.
//!
//! tree-sitter never rejects input outright; it recovers with ERROR and
//! MISSING nodes. Any such node makes the whole file a parse failure, so
//! detectors only ever see well-formed trees. The grammar also accepts a few
//! forms that Python 3 rejects (Python 2 `print`/`exec` statements, misplaced
//! defaults and arguments); those fail the same way.

use tree_sitter::{Language, Node as TsNode, Parser};

use super::{
    CallExpression, ClassDeclaration, Constant, FunctionDeclaration, Node, NodeKind, Parameter,
    ParameterKind, Span, SyntaxTree,
};
use crate::error::AnalysisError;

/// Deepest nesting the builder will lower.
///
/// Each `elif` and each link of a left-nested operator chain (`a + b + c`)
/// adds one level; every other concrete-tree level adds one as well. Bounds
/// every recursive pass over the tree, so adversarial input fails with a
/// parse error instead of exhausting the stack.
pub const MAX_NESTING_DEPTH: usize = 1000;

/// Parse Python source into a [`SyntaxTree`].
///
/// `file` is only used to label errors.
pub fn parse<'src>(file: &str, source: &'src str) -> Result<SyntaxTree<'src>, AnalysisError> {
    let language: Language = tree_sitter_python::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| AnalysisError::parse(file, format!("cannot load Python grammar: {}", e)))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| AnalysisError::parse(file, "parser produced no tree"))?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(AnalysisError::parse(file, describe_error(root)));
    }
    if let Some(description) = find_rejected(root) {
        return Err(AnalysisError::parse(file, description));
    }

    let lowering = Lowering {
        source: source.as_bytes(),
        file,
    };
    let root = lowering.lower(root, 0)?;
    Ok(SyntaxTree::new(source, root))
}

/// Describe the first ERROR or MISSING node in document order.
fn describe_error(root: TsNode) -> String {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let pos = node.start_position();
        if node.is_missing() {
            return format!(
                "missing {:?} at line {}, column {}",
                node.kind(),
                pos.row + 1,
                pos.column + 1
            );
        }
        if node.is_error() {
            return format!("invalid syntax at line {}, column {}", pos.row + 1, pos.column + 1);
        }
        if node.has_error() {
            let children: Vec<_> = node.children(&mut node.walk()).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    "invalid syntax".to_string()
}

struct Lowering<'a> {
    source: &'a [u8],
    file: &'a str,
}

impl Lowering<'_> {
    fn text(&self, node: TsNode) -> &str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn check_depth(&self, node: TsNode, depth: usize) -> Result<(), AnalysisError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(AnalysisError::parse(
                self.file,
                format!(
                    "nesting exceeds {} levels at line {}",
                    MAX_NESTING_DEPTH,
                    node.start_position().row + 1
                ),
            ));
        }
        Ok(())
    }

    fn lower(&self, node: TsNode, depth: usize) -> Result<Node, AnalysisError> {
        self.check_depth(node, depth)?;

        let span = Span::from_node(node);
        match node.kind() {
            "module" => self.generic(NodeKind::Module, node, depth),
            "block" => self.generic(NodeKind::Block, node, depth),
            "decorator" => self.generic(NodeKind::Decorator, node, depth),
            "function_definition" => self.lower_function(node, Vec::new(), span, depth),
            "class_definition" => self.lower_class(node, Vec::new(), span, depth),
            "decorated_definition" => self.lower_decorated(node, depth),
            "if_statement" => self.lower_if(node, depth),
            "else_clause" => self.lower_else(node, depth),
            "for_statement" => self.generic(NodeKind::ForStatement, node, depth),
            "while_statement" => self.generic(NodeKind::WhileStatement, node, depth),
            "try_statement" => self.generic(NodeKind::TryStatement, node, depth),
            "with_statement" => self.generic(NodeKind::WithStatement, node, depth),
            "return_statement" => self.generic(NodeKind::ReturnStatement, node, depth),
            "expression_statement" => self.lower_expression_statement(node, depth),
            "call" => self.lower_call(node, depth),
            "keyword_argument" => self.lower_keyword_argument(node, depth),
            "attribute" => self.lower_attribute(node, depth),
            "identifier" => Ok(leaf(
                NodeKind::Identifier(self.text(node).to_string()),
                span,
            )),
            "integer" | "float" => Ok(leaf(NodeKind::Constant(self.number(node)), span)),
            "true" => Ok(leaf(NodeKind::Constant(Constant::Bool(true)), span)),
            "false" => Ok(leaf(NodeKind::Constant(Constant::Bool(false)), span)),
            "none" => Ok(leaf(NodeKind::Constant(Constant::None), span)),
            "string" | "concatenated_string" => self.lower_string(node, depth),
            "unary_operator" => self.lower_unary(node, depth),
            "binary_operator" | "boolean_operator" => self.lower_operator_chain(node, depth),
            other => self.generic(NodeKind::Other(other.to_string()), node, depth),
        }
    }

    /// Lower every named, non-comment child of `node`.
    fn lower_children(&self, node: TsNode, depth: usize) -> Result<Vec<Node>, AnalysisError> {
        named_children(node)
            .into_iter()
            .map(|child| self.lower(child, depth + 1))
            .collect()
    }

    fn generic(&self, kind: NodeKind, node: TsNode, depth: usize) -> Result<Node, AnalysisError> {
        let children = self.lower_children(node, depth)?;
        Ok(Node::new(kind, Span::from_node(node), children))
    }

    /// Children are ordered parameters, body, decorators, return annotation.
    fn lower_function(
        &self,
        node: TsNode,
        decorators: Vec<Node>,
        span: Span,
        depth: usize,
    ) -> Result<Node, AnalysisError> {
        let name = self.field_text(node, "name");
        let is_async = node.child(0).map(|c| c.kind() == "async").unwrap_or(false);

        let mut children = Vec::new();
        let mut parameters = Vec::new();
        if let Some(params) = node.child_by_field_name("parameters") {
            parameters = self.parameters(params);
            // Defaults and annotations still hold literals and calls.
            children.push(self.lower(params, depth + 1)?);
        }
        if let Some(body) = node.child_by_field_name("body") {
            children.push(self.lower(body, depth + 1)?);
        }
        children.extend(decorators);
        if let Some(returns) = node.child_by_field_name("return_type") {
            children.push(self.lower(returns, depth + 1)?);
        }

        Ok(Node::new(
            NodeKind::FunctionDeclaration(FunctionDeclaration {
                name,
                parameters,
                is_async,
            }),
            span,
            children,
        ))
    }

    /// Children are ordered superclasses, body, decorators.
    fn lower_class(
        &self,
        node: TsNode,
        decorators: Vec<Node>,
        span: Span,
        depth: usize,
    ) -> Result<Node, AnalysisError> {
        let name = self.field_text(node, "name");

        let mut children = Vec::new();
        for field in ["superclasses", "body"] {
            if let Some(child) = node.child_by_field_name(field) {
                children.push(self.lower(child, depth + 1)?);
            }
        }
        children.extend(decorators);

        Ok(Node::new(
            NodeKind::ClassDeclaration(ClassDeclaration { name }),
            span,
            children,
        ))
    }

    /// A decorated definition becomes the definition itself, spanning its
    /// decorators, with the decorators following the body.
    fn lower_decorated(&self, node: TsNode, depth: usize) -> Result<Node, AnalysisError> {
        let span = Span::from_node(node);
        let decorators = named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "decorator")
            .map(|c| self.lower(c, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;

        match node.child_by_field_name("definition") {
            Some(def) if def.kind() == "function_definition" => {
                self.lower_function(def, decorators, span, depth)
            }
            Some(def) if def.kind() == "class_definition" => {
                self.lower_class(def, decorators, span, depth)
            }
            _ => self.generic(NodeKind::Other(node.kind().to_string()), node, depth),
        }
    }

    fn lower_if(&self, node: TsNode, depth: usize) -> Result<Node, AnalysisError> {
        let mut children = Vec::new();
        for field in ["condition", "consequence"] {
            if let Some(child) = node.child_by_field_name(field) {
                children.push(self.lower(child, depth + 1)?);
            }
        }

        let mut cursor = node.walk();
        let alternatives: Vec<_> = node
            .children_by_field_name("alternative", &mut cursor)
            .collect();
        if let Some(branch) = self.lower_alternatives(&alternatives, depth + 1)? {
            children.push(branch);
        }

        Ok(Node::new(
            NodeKind::IfStatement,
            Span::from_node(node),
            children,
        ))
    }

    /// Fold an `elif`/`else` chain into nested `ElseBranch(IfStatement)`
    /// nodes, so every `if` has at most one else-branch.
    ///
    /// Built from the last clause backwards without recursion; each `elif`
    /// adds a single nesting level.
    fn lower_alternatives(
        &self,
        alternatives: &[TsNode],
        depth: usize,
    ) -> Result<Option<Node>, AnalysisError> {
        let elif_count = alternatives
            .iter()
            .take_while(|a| a.kind() == "elif_clause")
            .count();
        let (elifs, rest) = alternatives.split_at(elif_count);

        let mut branch = match rest.first() {
            Some(else_clause) => Some(self.lower(*else_clause, depth + elif_count)?),
            None => None,
        };

        let Some(last) = alternatives.last() else {
            return Ok(branch);
        };
        for (i, clause) in elifs.iter().enumerate().rev() {
            let level = depth + i;
            self.check_depth(*clause, level)?;

            let mut children = Vec::new();
            for field in ["condition", "consequence"] {
                if let Some(child) = clause.child_by_field_name(field) {
                    children.push(self.lower(child, level + 1)?);
                }
            }
            children.extend(branch.take());

            let span = Span::between(*clause, *last);
            let nested = Node::new(NodeKind::IfStatement, span, children);
            branch = Some(Node::new(NodeKind::ElseBranch, span, vec![nested]));
        }

        Ok(branch)
    }

    /// Lower a left-nested `binary_operator`/`boolean_operator` chain
    /// without recursing down its left spine. Each link adds one level.
    fn lower_operator_chain(&self, node: TsNode, depth: usize) -> Result<Node, AnalysisError> {
        let mut spine = vec![node];
        while let Some(left) = spine
            .last()
            .and_then(|link| link.child_by_field_name("left"))
            .filter(|left| is_operator_chain(left.kind()))
        {
            self.check_depth(left, depth + spine.len())?;
            spine.push(left);
        }

        let mut lowered: Option<Node> = None;
        for (i, link) in spine.iter().enumerate().rev() {
            let level = depth + i;
            let inner_id = spine.get(i + 1).map(|n| n.id());

            let mut children = Vec::new();
            for child in named_children(*link) {
                if Some(child.id()) == inner_id {
                    children.extend(lowered.take());
                } else {
                    children.push(self.lower(child, level + 1)?);
                }
            }
            lowered = Some(Node::new(
                NodeKind::Other(link.kind().to_string()),
                Span::from_node(*link),
                children,
            ));
        }

        lowered.ok_or_else(|| AnalysisError::parse(self.file, "empty operator chain"))
    }

    /// `else:` lowers to an `ElseBranch` holding the statements directly.
    fn lower_else(&self, node: TsNode, depth: usize) -> Result<Node, AnalysisError> {
        let statements = match node.child_by_field_name("body") {
            Some(body) => self.lower_children(body, depth + 1)?,
            None => Vec::new(),
        };
        Ok(Node::new(
            NodeKind::ElseBranch,
            Span::from_node(node),
            statements,
        ))
    }

    fn lower_expression_statement(
        &self,
        node: TsNode,
        depth: usize,
    ) -> Result<Node, AnalysisError> {
        let span = Span::from_node(node);
        let inner = named_children(node);

        if let [only] = inner.as_slice() {
            let kind = match only.kind() {
                "assignment" if only.child_by_field_name("type").is_some() => {
                    Some(NodeKind::AnnotatedAssignment)
                }
                "assignment" => Some(NodeKind::Assignment),
                "augmented_assignment" => Some(NodeKind::AugmentedAssignment),
                _ => None,
            };
            if let Some(kind) = kind {
                let children = self.lower_children(*only, depth + 1)?;
                return Ok(Node::new(kind, span, children));
            }
        }

        let children = inner
            .into_iter()
            .map(|child| self.lower(child, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Node::new(NodeKind::ExpressionStatement, span, children))
    }

    /// The callee is always the first child; arguments follow in order.
    fn lower_call(&self, node: TsNode, depth: usize) -> Result<Node, AnalysisError> {
        let mut call = CallExpression::default();
        let mut children = Vec::new();

        if let Some(function) = node.child_by_field_name("function") {
            children.push(self.lower(function, depth + 1)?);
        }

        if let Some(arguments) = node.child_by_field_name("arguments") {
            if arguments.kind() == "argument_list" {
                for arg in named_children(arguments) {
                    match arg.kind() {
                        "keyword_argument" | "dictionary_splat" => call.keyword_args += 1,
                        _ => call.positional_args += 1,
                    }
                    children.push(self.lower(arg, depth + 1)?);
                }
            } else {
                // Bare generator argument: `f(x for x in xs)`
                call.positional_args += 1;
                children.push(self.lower(arguments, depth + 1)?);
            }
        }

        Ok(Node::new(
            NodeKind::CallExpression(call),
            Span::from_node(node),
            children,
        ))
    }

    fn lower_keyword_argument(&self, node: TsNode, depth: usize) -> Result<Node, AnalysisError> {
        let name = self.field_text(node, "name");
        let mut children = Vec::new();
        if let Some(value) = node.child_by_field_name("value") {
            children.push(self.lower(value, depth + 1)?);
        }
        Ok(Node::new(
            NodeKind::KeywordArgument(name),
            Span::from_node(node),
            children,
        ))
    }

    fn lower_attribute(&self, node: TsNode, depth: usize) -> Result<Node, AnalysisError> {
        let attribute = self.field_text(node, "attribute");
        let mut children = Vec::new();
        if let Some(object) = node.child_by_field_name("object") {
            children.push(self.lower(object, depth + 1)?);
        }
        Ok(Node::new(
            NodeKind::AttributeAccess(attribute),
            Span::from_node(node),
            children,
        ))
    }

    /// Plain strings are constants; f-strings keep their interpolated
    /// expressions as children instead.
    fn lower_string(&self, node: TsNode, depth: usize) -> Result<Node, AnalysisError> {
        if has_interpolation(node) {
            return self.generic(NodeKind::Other(node.kind().to_string()), node, depth);
        }
        Ok(leaf(
            NodeKind::Constant(Constant::Str(self.text(node).to_string())),
            Span::from_node(node),
        ))
    }

    /// `-3` becomes the constant -3 rather than negation of 3.
    fn lower_unary(&self, node: TsNode, depth: usize) -> Result<Node, AnalysisError> {
        let operator = node.child_by_field_name("operator").map(|o| o.kind());
        let argument = node.child_by_field_name("argument");

        if let (Some("-"), Some(arg)) = (operator, argument) {
            if matches!(arg.kind(), "integer" | "float") {
                if let Some(negated) = self.number(arg).negated() {
                    return Ok(leaf(NodeKind::Constant(negated), Span::from_node(node)));
                }
            }
        }

        self.generic(NodeKind::Other(node.kind().to_string()), node, depth)
    }

    fn number(&self, node: TsNode) -> Constant {
        let text = self.text(node);
        let cleaned: String = text.chars().filter(|c| *c != '_').collect();

        if cleaned.ends_with(['j', 'J']) {
            return Constant::Complex(text.to_string());
        }

        if node.kind() == "integer" {
            match parse_int(&cleaned) {
                Some(v) => Constant::Int(v),
                None => Constant::LargeInt(cleaned),
            }
        } else {
            Constant::Float(cleaned.parse().unwrap_or(f64::NAN))
        }
    }

    fn parameters(&self, params: TsNode) -> Vec<Parameter> {
        let mut parameters: Vec<Parameter> = Vec::new();
        let mut keyword_only = false;

        for child in named_children(params) {
            let regular = if keyword_only {
                ParameterKind::KeywordOnly
            } else {
                ParameterKind::Regular
            };

            match child.kind() {
                "identifier" => parameters.push(Parameter {
                    name: self.text(child).to_string(),
                    kind: regular,
                    default: None,
                }),
                "default_parameter" | "typed_default_parameter" => parameters.push(Parameter {
                    name: self.field_text(child, "name"),
                    kind: regular,
                    default: child
                        .child_by_field_name("value")
                        .map(|v| self.text(v).to_string()),
                }),
                "typed_parameter" => {
                    let Some(inner) = named_children(child).into_iter().next() else {
                        continue;
                    };
                    let kind = match inner.kind() {
                        "list_splat_pattern" => {
                            keyword_only = true;
                            ParameterKind::VarPositional
                        }
                        "dictionary_splat_pattern" => ParameterKind::VarKeyword,
                        _ => regular,
                    };
                    parameters.push(Parameter {
                        name: self.splat_name(inner),
                        kind,
                        default: None,
                    });
                }
                "list_splat_pattern" => {
                    keyword_only = true;
                    parameters.push(Parameter {
                        name: self.splat_name(child),
                        kind: ParameterKind::VarPositional,
                        default: None,
                    });
                }
                "dictionary_splat_pattern" => parameters.push(Parameter {
                    name: self.splat_name(child),
                    kind: ParameterKind::VarKeyword,
                    default: None,
                }),
                "keyword_separator" => keyword_only = true,
                "positional_separator" => {
                    for p in parameters.iter_mut() {
                        if p.kind == ParameterKind::Regular {
                            p.kind = ParameterKind::PositionalOnly;
                        }
                    }
                }
                _ => {}
            }
        }

        parameters
    }

    /// Name of `*args` / `**kwargs` without the stars.
    fn splat_name(&self, node: TsNode) -> String {
        named_children(node)
            .into_iter()
            .find(|c| c.kind() == "identifier")
            .map(|c| self.text(c).to_string())
            .unwrap_or_else(|| self.text(node).trim_start_matches('*').to_string())
    }

    fn field_text(&self, node: TsNode, field: &str) -> String {
        node.child_by_field_name(field)
            .map(|n| self.text(n).to_string())
            .unwrap_or_default()
    }
}

fn leaf(kind: NodeKind, span: Span) -> Node {
    Node::new(kind, span, Vec::new())
}

fn named_children(node: TsNode) -> Vec<TsNode> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

fn has_interpolation(node: TsNode) -> bool {
    named_children(node)
        .into_iter()
        .any(|c| c.kind() == "interpolation" || (c.kind() == "string" && has_interpolation(c)))
}

fn parse_int(text: &str) -> Option<i128> {
    let (digits, radix) = split_radix(text);
    i128::from_str_radix(&digits, radix).ok()
}

/// Lowercased digits and radix of an integer literal.
pub(super) fn split_radix(text: &str) -> (String, u32) {
    let lower = text.to_ascii_lowercase();
    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if let Some(rest) = lower.strip_prefix(prefix) {
            return (rest.to_string(), radix);
        }
    }
    (lower, 10)
}

fn is_operator_chain(kind: &str) -> bool {
    matches!(kind, "binary_operator" | "boolean_operator")
}

/// Find the first construct, in document order, that the grammar accepts
/// but Python 3 does not.
fn find_rejected(root: TsNode) -> Option<String> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if let Some(reason) = rejection(node) {
            let pos = node.start_position();
            return Some(format!(
                "{} at line {}, column {}",
                reason,
                pos.row + 1,
                pos.column + 1
            ));
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn rejection(node: TsNode) -> Option<&'static str> {
    match node.kind() {
        "print_statement" => Some("Python 2 print statement"),
        "exec_statement" => Some("Python 2 exec statement"),
        "parameters" | "lambda_parameters" => misplaced_default(node),
        "argument_list" => misplaced_argument(node),
        _ => None,
    }
}

/// A parameter without a default may not follow one with a default unless
/// it is keyword-only.
fn misplaced_default(params: TsNode) -> Option<&'static str> {
    let mut seen_default = false;
    for child in named_children(params) {
        let kind = match child.kind() {
            "typed_parameter" => named_children(child).first().map(|inner| inner.kind()),
            kind => Some(kind),
        };
        // Everything after `*`, `*args` or `**kwargs` is keyword-only.
        if matches!(
            kind,
            Some("list_splat_pattern" | "keyword_separator" | "dictionary_splat_pattern")
        ) {
            return None;
        }
        match child.kind() {
            "default_parameter" | "typed_default_parameter" => seen_default = true,
            "identifier" | "typed_parameter" if seen_default => {
                return Some("non-default argument follows default argument")
            }
            _ => {}
        }
    }
    None
}

/// Positional arguments may not follow keyword arguments or `**` unpacking,
/// and `*` unpacking may not follow `**` unpacking.
fn misplaced_argument(arguments: TsNode) -> Option<&'static str> {
    let mut seen_keyword = false;
    let mut seen_dict_splat = false;
    for child in named_children(arguments) {
        match child.kind() {
            "keyword_argument" => seen_keyword = true,
            "dictionary_splat" => seen_dict_splat = true,
            "list_splat" if seen_dict_splat => {
                return Some("iterable argument unpacking follows keyword argument unpacking")
            }
            "list_splat" => {}
            _ if seen_dict_splat => {
                return Some("positional argument follows keyword argument unpacking")
            }
            _ if seen_keyword => return Some("positional argument follows keyword argument"),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> SyntaxTree<'_> {
        parse("test.py", source).expect("source should parse")
    }

    fn assert_spans_nest(node: &Node) {
        assert!(node.span.end_line >= node.span.start_line);
        for child in &node.children {
            assert!(
                node.span.contains(&child.span),
                "{:?} at {} escapes {:?} at {}",
                child.kind,
                child.span,
                node.kind,
                node.span
            );
            assert_spans_nest(child);
        }
    }

    #[test]
    fn test_function_declaration() {
        let tree = parse_ok(
            r#"
def greet(self, name, greeting="hi", *args, flag=False, **kwargs):
    message = greeting + name
    return message
"#,
        );

        let (node, func) = tree.functions().next().expect("function should be found");
        assert_eq!(func.name, "greet");
        assert!(!func.is_async);
        assert_eq!(node.span.start_line, 2);
        assert_eq!(node.span.end_line, 4);

        let kinds: Vec<_> = func.parameters.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParameterKind::Regular,
                ParameterKind::Regular,
                ParameterKind::Regular,
                ParameterKind::VarPositional,
                ParameterKind::KeywordOnly,
                ParameterKind::VarKeyword,
            ]
        );
        assert_eq!(func.parameters[2].default.as_deref(), Some("\"hi\""));
        assert_eq!(func.parameters[3].name, "args");
        assert_eq!(func.parameters[5].name, "kwargs");
        assert!(func.receiver().is_some());

        let statements = node.body_statements();
        assert_eq!(statements.len(), 2);
        assert!(matches!(statements[0].kind, NodeKind::Assignment));
        assert!(matches!(statements[1].kind, NodeKind::ReturnStatement));
    }

    #[test]
    fn test_positional_only_and_keyword_separator() {
        let tree = parse_ok("def f(a, b, /, c, *, d):\n    pass\n");
        let (_, func) = tree.functions().next().unwrap();
        let kinds: Vec<_> = func.parameters.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParameterKind::PositionalOnly,
                ParameterKind::PositionalOnly,
                ParameterKind::Regular,
                ParameterKind::KeywordOnly,
            ]
        );
        assert_eq!(func.regular_parameters().count(), 1);
    }

    #[test]
    fn test_elif_chain_nests_in_else_branch() {
        let tree = parse_ok(
            r#"
def classify(x):
    if x > 10:
        return "big"
    elif x > 5:
        return "medium"
    else:
        y = x
        return "small"
"#,
        );
        let (func, _) = tree.functions().next().unwrap();
        let outer = &func.body_statements()[0];
        assert!(matches!(outer.kind, NodeKind::IfStatement));

        let elif = &outer.else_branch().expect("elif branch").children[0];
        assert!(matches!(elif.kind, NodeKind::IfStatement));
        assert_eq!(elif.body_statements().len(), 1);

        let else_branch = elif.else_branch().expect("else branch");
        assert_eq!(else_branch.children.len(), 2);
        assert_spans_nest(tree.root());
    }

    #[test]
    fn test_statement_kinds() {
        let tree = parse_ok(
            r#"
def f(items):
    total = 0
    total += 1
    count: int = 0
    print(total)
    for item in items:
        pass
    while total:
        total -= 1
    with open("x") as fh:
        pass
    try:
        pass
    except ValueError:
        pass
"#,
        );
        let (func, _) = tree.functions().next().unwrap();
        let kinds: Vec<_> = func
            .body_statements()
            .iter()
            .map(|s| std::mem::discriminant(&s.kind))
            .collect();
        let expected = [
            NodeKind::Assignment,
            NodeKind::AugmentedAssignment,
            NodeKind::AnnotatedAssignment,
            NodeKind::ExpressionStatement,
            NodeKind::ForStatement,
            NodeKind::WhileStatement,
            NodeKind::WithStatement,
            NodeKind::TryStatement,
        ];
        assert_eq!(kinds.len(), expected.len());
        for (got, want) in kinds.iter().zip(expected.iter()) {
            assert_eq!(*got, std::mem::discriminant(want));
        }
    }

    #[test]
    fn test_call_argument_accounting() {
        let tree = parse_ok("obj.method(1, *rest, key=2, **opts)\nsum(x for x in xs)\n");
        let calls: Vec<_> = tree
            .walk()
            .filter_map(|n| n.as_call().map(|c| (n, *c)))
            .collect();
        assert_eq!(calls.len(), 2);

        let (node, call) = &calls[0];
        assert_eq!(call.positional_args, 2);
        assert_eq!(call.keyword_args, 2);
        assert!(matches!(&node.children[0].kind, NodeKind::AttributeAccess(a) if a == "method"));

        assert_eq!(calls[1].1.positional_args, 1);
        assert_eq!(calls[1].1.keyword_args, 0);
    }

    #[test]
    fn test_constants() {
        let tree = parse_ok("a = [42, -3, 3.14, 0x10, 1_000, 2j, 'text', True, None, f'{x * 7}']\n");
        let constants: Vec<_> = tree
            .walk()
            .filter_map(|n| match &n.kind {
                NodeKind::Constant(c) => Some(c.clone()),
                _ => None,
            })
            .collect();

        assert!(constants.contains(&Constant::Int(42)));
        assert!(constants.contains(&Constant::Int(-3)));
        assert!(constants.contains(&Constant::Float(3.14)));
        assert!(constants.contains(&Constant::Int(16)));
        assert!(constants.contains(&Constant::Int(1000)));
        assert!(constants.contains(&Constant::Complex("2j".to_string())));
        assert!(constants.contains(&Constant::Str("'text'".to_string())));
        assert!(constants.contains(&Constant::Bool(true)));
        assert!(constants.contains(&Constant::None));
        // Interpolated expressions are walked like any other expression.
        assert!(constants.contains(&Constant::Int(7)));
        assert!(!constants.contains(&Constant::Int(3)));
    }

    #[test]
    fn test_decorated_method_is_class_member() {
        let tree = parse_ok(
            r#"
class Service:
    retries = 3

    @property
    def name(self):
        return self._name

    async def fetch(self):
        return None
"#,
        );
        let (class_node, class) = tree.classes().next().unwrap();
        assert_eq!(class.name, "Service");

        let members = class_node.body_statements();
        assert_eq!(members.len(), 3);
        assert!(matches!(members[0].kind, NodeKind::Assignment));
        let decorated = members[1].as_function().expect("decorated method");
        assert_eq!(decorated.name, "name");
        // Decorators follow the parameters and the body.
        let last = members[1].children.last().unwrap();
        assert!(matches!(last.kind, NodeKind::Decorator));
        assert!(members[2].as_function().map(|f| f.is_async).unwrap_or(false));
        assert_spans_nest(tree.root());
    }

    #[test]
    fn test_comments_are_dropped() {
        let tree = parse_ok("def f():\n    # note\n    x = 1  # trailing\n    return x\n");
        let (func, _) = tree.functions().next().unwrap();
        assert_eq!(func.body_statements().len(), 2);
    }

    #[test]
    fn test_snippet_reconstruction() {
        let source = "def f():\n    return g(1, 2)\n";
        let tree = parse_ok(source);
        let call = tree.walk().find(|n| n.as_call().is_some()).unwrap();
        assert_eq!(tree.snippet(call), Some("g(1, 2)"));
        let (func, _) = tree.functions().next().unwrap();
        assert_eq!(tree.snippet(func), Some(source.trim_end()));
    }

    #[test]
    fn test_syntax_error() {
        let err = parse("broken.py", "def broken(:\n    return\n").unwrap_err();
        match err {
            AnalysisError::Parse { file, description } => {
                assert_eq!(file, "broken.py");
                assert!(description.contains("line 1"), "got {}", description);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_nesting_limit() {
        let handle = std::thread::Builder::new()
            .stack_size(64 << 20)
            .spawn(|| {
                let depth = MAX_NESTING_DEPTH + 10;
                let source = format!("x = {}1{}\n", "(".repeat(depth), ")".repeat(depth));
                let err = parse("deep.py", &source).unwrap_err();
                assert!(matches!(err, AnalysisError::Parse { .. }));
            })
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_long_elif_chain() {
        let mut source = String::from("def dispatch(op):\n    if op == 'op0':\n        return 'r0'\n");
        for i in 1..200 {
            source.push_str(&format!("    elif op == 'op{i}':\n        return 'r{i}'\n"));
        }
        source.push_str("    else:\n        return None\n");

        let tree = parse_ok(&source);
        let (func, _) = tree.functions().next().unwrap();
        let mut branch = &func.body_statements()[0];
        let mut links = 1;
        while let Some(next) = branch.else_branch().and_then(|e| e.children.first()) {
            if !matches!(next.kind, NodeKind::IfStatement) {
                break;
            }
            branch = next;
            links += 1;
        }
        assert_eq!(links, 200);
        let last_else = branch.else_branch().expect("final else");
        assert!(matches!(last_else.children[0].kind, NodeKind::ReturnStatement));
        assert_eq!(branch.span.end_line, func.span.end_line);
    }

    #[test]
    fn test_long_operator_chain() {
        let terms: Vec<_> = (0..300).map(|i| format!("v{i}")).collect();
        let source = format!("total = {} + 42\n", terms.join(" + "));
        let tree = parse_ok(&source);

        let constants: Vec<_> = tree
            .walk()
            .filter_map(|n| match &n.kind {
                NodeKind::Constant(c) => Some(c.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(constants, vec![Constant::Int(42)]);
        let identifiers = tree
            .walk()
            .filter(|n| matches!(n.kind, NodeKind::Identifier(_)))
            .count();
        assert_eq!(identifiers, 301);
        assert_spans_nest(tree.root());
    }

    fn parse_error(source: &str) -> String {
        match parse("bad.py", source) {
            Err(AnalysisError::Parse { description, .. }) => description,
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_python2_statements_rejected() {
        let description = parse_error("print \"hello\"\nx = 42\n");
        assert!(description.starts_with("Python 2 print statement"), "{}", description);
        assert!(description.contains("line 1"), "{}", description);

        let description = parse_error("exec \"x = 1\"\n");
        assert!(description.starts_with("Python 2 exec statement"), "{}", description);

        // The function forms are ordinary calls.
        parse_ok("print(\"hello\")\nexec(\"x = 1\")\n");
    }

    #[test]
    fn test_default_order_enforced() {
        let description = parse_error("def f(a=1, b, c, d, e, g):\n    return 42\n");
        assert!(
            description.starts_with("non-default argument follows default argument"),
            "{}",
            description
        );
        parse_error("lambda a=1, b: a");
        parse_error("def f(a: int = 1, b: int):\n    pass\n");

        parse_ok("def f(a=1, *, b):\n    pass\n");
        parse_ok("def f(a=1, *args, b):\n    pass\n");
        parse_ok("def f(a, b=2, **kw):\n    pass\n");
        parse_ok("def f(a: int, b: int = 2, *args: str, c: int):\n    pass\n");
    }

    #[test]
    fn test_argument_order_enforced() {
        assert_eq!(
            parse_error("f(**kw, *args, 42)\n"),
            "iterable argument unpacking follows keyword argument unpacking at line 1, column 9"
        );
        assert!(parse_error("f(**kw, 42)\n")
            .starts_with("positional argument follows keyword argument unpacking"));
        assert!(parse_error("f(a=1, 42)\n").starts_with("positional argument follows keyword argument"));

        parse_ok("f(a=1, *args)\n");
        parse_ok("f(**kw, a=1)\n");
        parse_ok("f(*args, 42, **kw)\n");
        parse_ok("f(x for x in y)\n");
    }

    #[test]
    fn test_parse_int_radix() {
        assert_eq!(parse_int("0xff"), Some(255));
        assert_eq!(parse_int("0o17"), Some(15));
        assert_eq!(parse_int("0b101"), Some(5));
        assert_eq!(parse_int("12"), Some(12));
        assert_eq!(parse_int("zz"), None);
    }
}
