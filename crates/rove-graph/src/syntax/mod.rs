//! Lowered syntax tree.
//!
//! The analysis passes never look at the parser's own AST. [`lower`] converts an
//! oxc `Program` into this closed union of the node kinds that matter for scoping
//! and reference extraction; everything else becomes [`NodeKind::Other`] with its
//! children preserved in source order. The tree owns all of its data, so modules
//! can outlive the parser's arena allocator.

pub mod lower;
pub mod walk;

pub use lower::{parse, ParseFailure};
pub use oxc_span::Span;
pub use walk::{walk, Visitor, WalkControl};

/// A node of the lowered tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub span: Span,
    pub kind: NodeKind,
}

/// Declaration keyword of a variable declaration. `using` declarations lower to
/// [`VariableKind::Const`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    /// `let`/`const` bindings are block scoped; `var` hoists.
    pub fn is_block_scoped(self) -> bool {
        !matches!(self, VariableKind::Var)
    }
}

/// The name an import (or re-export) pulls out of its source module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImportedName {
    Default,
    Namespace,
    Named(String),
}

impl ImportedName {
    /// Builds the imported name for `import { name }`; `default` is normalised.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == "default" {
            ImportedName::Default
        } else {
            ImportedName::Named(name)
        }
    }

    /// The export-table key this name is looked up under (`*` for namespaces).
    pub fn as_export_name(&self) -> &str {
        match self {
            ImportedName::Default => "default",
            ImportedName::Namespace => "*",
            ImportedName::Named(name) => name,
        }
    }
}

/// One specifier of an import declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBinding {
    pub local: String,
    pub imported: ImportedName,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: Option<Box<Node>>,
    pub params: Vec<Node>,
    /// Always a [`NodeKind::BlockStatement`]; expression-bodied arrows are wrapped.
    pub body: Box<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub id: Option<Box<Node>>,
    pub super_class: Option<Box<Node>>,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    ImportDeclaration {
        source: String,
        specifiers: Vec<ImportBinding>,
    },
    ExportNamedDeclaration {
        declaration: Option<Box<Node>>,
        specifiers: Vec<Node>,
        source: Option<String>,
    },
    ExportSpecifier {
        local: Box<Node>,
        exported: Box<Node>,
    },
    ExportDefaultDeclaration {
        declaration: Box<Node>,
    },
    ExportAllDeclaration {
        source: String,
        exported: Option<String>,
    },
    VariableDeclaration {
        kind: VariableKind,
        declarations: Vec<Node>,
    },
    VariableDeclarator {
        id: Box<Node>,
        init: Option<Box<Node>>,
    },
    FunctionDeclaration(Function),
    FunctionExpression(Function),
    ArrowFunctionExpression(Function),
    ClassDeclaration(Class),
    ClassExpression(Class),
    MethodDefinition {
        key: Box<Node>,
        computed: bool,
        value: Box<Node>,
    },
    PropertyDefinition {
        key: Box<Node>,
        computed: bool,
        value: Option<Box<Node>>,
    },
    BlockStatement {
        body: Vec<Node>,
    },
    /// `for`, `for in` and `for of`; `head` holds init/test/update or left/right.
    ForStatement {
        head: Vec<Node>,
        body: Box<Node>,
        /// `for in`/`for of`: `head[0]` is written on every iteration.
        iterates: bool,
    },
    CatchClause {
        param: Option<Box<Node>>,
        body: Box<Node>,
    },
    /// An identifier in expression position (or an assignment target).
    Identifier(String),
    /// An identifier that introduces a binding.
    BindingIdentifier(String),
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
        computed: bool,
    },
    CallExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    AssignmentExpression {
        left: Box<Node>,
        right: Box<Node>,
    },
    UpdateExpression {
        argument: Box<Node>,
    },
    /// Object literal property or object pattern property.
    Property {
        key: Box<Node>,
        value: Box<Node>,
        computed: bool,
    },
    ObjectPattern {
        properties: Vec<Node>,
    },
    ArrayPattern {
        elements: Vec<Option<Node>>,
    },
    RestElement {
        argument: Box<Node>,
    },
    AssignmentPattern {
        left: Box<Node>,
        right: Box<Node>,
    },
    Other {
        children: Vec<Node>,
    },
}

impl Node {
    pub fn new(span: Span, kind: NodeKind) -> Self {
        Self { span, kind }
    }

    /// A node with no analysis-relevant content.
    pub fn leaf(span: Span) -> Self {
        Self::other(span, Vec::new())
    }

    pub fn other(span: Span, children: Vec<Node>) -> Self {
        Self::new(span, NodeKind::Other { children })
    }

    /// Function declarations, function expressions and arrows.
    pub fn function(&self) -> Option<&Function> {
        match &self.kind {
            NodeKind::FunctionDeclaration(function)
            | NodeKind::FunctionExpression(function)
            | NodeKind::ArrowFunctionExpression(function) => Some(function),
            _ => None,
        }
    }

    pub fn is_function_like(&self) -> bool {
        self.function().is_some()
    }

    pub fn is_import_declaration(&self) -> bool {
        matches!(self.kind, NodeKind::ImportDeclaration { .. })
    }

    pub fn is_export_declaration(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::ExportNamedDeclaration { .. }
                | NodeKind::ExportDefaultDeclaration { .. }
                | NodeKind::ExportAllDeclaration { .. }
        )
    }

    /// Child nodes in source order.
    ///
    /// Specifiers of `export { a } from './m'` are not children: they name bindings
    /// of another module and contain nothing this module evaluates.
    pub fn children(&self) -> Vec<&Node> {
        let mut out: Vec<&Node> = Vec::new();
        match &self.kind {
            NodeKind::ImportDeclaration { .. }
            | NodeKind::ExportAllDeclaration { .. }
            | NodeKind::Identifier(_)
            | NodeKind::BindingIdentifier(_) => {}
            NodeKind::ExportNamedDeclaration {
                declaration,
                specifiers,
                source,
            } => {
                out.extend(declaration.as_deref());
                if source.is_none() {
                    out.extend(specifiers.iter());
                }
            }
            NodeKind::ExportSpecifier { local, exported } => {
                out.push(local);
                out.push(exported);
            }
            NodeKind::ExportDefaultDeclaration { declaration } => out.push(declaration),
            NodeKind::VariableDeclaration { declarations, .. } => out.extend(declarations.iter()),
            NodeKind::VariableDeclarator { id, init } => {
                out.push(id);
                out.extend(init.as_deref());
            }
            NodeKind::FunctionDeclaration(function)
            | NodeKind::FunctionExpression(function)
            | NodeKind::ArrowFunctionExpression(function) => {
                out.extend(function.id.as_deref());
                out.extend(function.params.iter());
                out.push(&function.body);
            }
            NodeKind::ClassDeclaration(class) | NodeKind::ClassExpression(class) => {
                out.extend(class.id.as_deref());
                out.extend(class.super_class.as_deref());
                out.extend(class.body.iter());
            }
            NodeKind::MethodDefinition { key, value, .. } => {
                out.push(key);
                out.push(value);
            }
            NodeKind::PropertyDefinition { key, value, .. } => {
                out.push(key);
                out.extend(value.as_deref());
            }
            NodeKind::BlockStatement { body } => out.extend(body.iter()),
            NodeKind::ForStatement { head, body, .. } => {
                out.extend(head.iter());
                out.push(body);
            }
            NodeKind::CatchClause { param, body } => {
                out.extend(param.as_deref());
                out.push(body);
            }
            NodeKind::MemberExpression {
                object, property, ..
            } => {
                out.push(object);
                out.push(property);
            }
            NodeKind::CallExpression { callee, arguments } => {
                out.push(callee);
                out.extend(arguments.iter());
            }
            NodeKind::AssignmentExpression { left, right } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::UpdateExpression { argument } => out.push(argument),
            NodeKind::Property { key, value, .. } => {
                out.push(key);
                out.push(value);
            }
            NodeKind::ObjectPattern { properties } => out.extend(properties.iter()),
            NodeKind::ArrayPattern { elements } => out.extend(elements.iter().flatten()),
            NodeKind::RestElement { argument } => out.push(argument),
            NodeKind::AssignmentPattern { left, right } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::Other { children } => out.extend(children.iter()),
        }
        out
    }
}
