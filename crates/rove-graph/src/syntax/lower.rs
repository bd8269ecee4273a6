//! Lowering from the oxc AST into [`Node`]s.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, ArrayExpressionElement, ArrowFunctionExpression, AssignmentTarget,
    AssignmentTargetMaybeDefault, AssignmentTargetProperty, BindingPattern, BindingPatternKind,
    CallExpression, ChainElement, Class as OxcClass, ClassElement, ComputedMemberExpression,
    Declaration, ExportDefaultDeclarationKind, Expression, ForStatementInit, ForStatementLeft,
    FormalParameters, Function as OxcFunction, FunctionBody, ImportDeclarationSpecifier,
    ModuleExportName, ObjectPropertyKind, PrivateFieldExpression, PropertyKey,
    SimpleAssignmentTarget, Statement, StaticMemberExpression, VariableDeclaration,
    VariableDeclarationKind,
};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};

use super::{Class, Function, ImportBinding, ImportedName, Node, NodeKind, VariableKind};

/// First error reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
    pub offset: u32,
}

/// Parse ES module source and lower its top-level statements.
pub fn parse(source: &str) -> Result<Vec<Node>, ParseFailure> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();

    if let Some(error) = ret.errors.first() {
        let offset = error
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map_or(0, |label| label.offset() as u32);
        return Err(ParseFailure {
            message: error.to_string(),
            offset,
        });
    }

    if ret.panicked {
        return Err(ParseFailure {
            message: "parser aborted".to_string(),
            offset: 0,
        });
    }

    Ok(statements(&ret.program.body))
}

fn statements(body: &[Statement<'_>]) -> Vec<Node> {
    body.iter().map(statement).collect()
}

fn statement(stmt: &Statement<'_>) -> Node {
    let span = stmt.span();
    match stmt {
        Statement::BlockStatement(block) => block_statement(block.span, &block.body),
        Statement::ExpressionStatement(expr) => Node::other(span, vec![expression(&expr.expression)]),
        Statement::VariableDeclaration(decl) => variable_declaration(decl),
        Statement::FunctionDeclaration(func) => {
            Node::new(span, NodeKind::FunctionDeclaration(function(func)))
        }
        Statement::ClassDeclaration(class) => Node::new(span, NodeKind::ClassDeclaration(class_parts(class))),
        Statement::IfStatement(stmt) => {
            let mut children = vec![expression(&stmt.test), statement(&stmt.consequent)];
            children.extend(stmt.alternate.as_ref().map(statement));
            Node::other(span, children)
        }
        Statement::ForStatement(stmt) => {
            let mut head = Vec::new();
            if let Some(init) = &stmt.init {
                head.push(for_init(init));
            }
            head.extend(stmt.test.as_ref().map(expression));
            head.extend(stmt.update.as_ref().map(expression));
            for_statement(span, head, &stmt.body, false)
        }
        Statement::ForInStatement(stmt) => {
            let head = vec![for_left(&stmt.left), expression(&stmt.right)];
            for_statement(span, head, &stmt.body, true)
        }
        Statement::ForOfStatement(stmt) => {
            let head = vec![for_left(&stmt.left), expression(&stmt.right)];
            for_statement(span, head, &stmt.body, true)
        }
        Statement::WhileStatement(stmt) => {
            Node::other(span, vec![expression(&stmt.test), statement(&stmt.body)])
        }
        Statement::DoWhileStatement(stmt) => {
            Node::other(span, vec![statement(&stmt.body), expression(&stmt.test)])
        }
        Statement::ReturnStatement(stmt) => {
            Node::other(span, stmt.argument.iter().map(expression).collect())
        }
        Statement::ThrowStatement(stmt) => Node::other(span, vec![expression(&stmt.argument)]),
        Statement::TryStatement(stmt) => {
            let mut children = vec![block_statement(stmt.block.span, &stmt.block.body)];
            if let Some(handler) = &stmt.handler {
                let param = handler
                    .param
                    .as_ref()
                    .map(|param| Box::new(binding_pattern(&param.pattern)));
                let body = block_statement(handler.body.span, &handler.body.body);
                children.push(Node::new(
                    handler.span,
                    NodeKind::CatchClause {
                        param,
                        body: Box::new(body),
                    },
                ));
            }
            if let Some(finalizer) = &stmt.finalizer {
                children.push(block_statement(finalizer.span, &finalizer.body));
            }
            Node::other(span, children)
        }
        Statement::SwitchStatement(stmt) => {
            // Cases share one lexical block.
            let cases = stmt
                .cases
                .iter()
                .map(|case| {
                    let mut children: Vec<Node> = case.test.iter().map(expression).collect();
                    children.extend(case.consequent.iter().map(statement));
                    Node::other(case.span, children)
                })
                .collect();
            let block = Node::new(span, NodeKind::BlockStatement { body: cases });
            Node::other(span, vec![expression(&stmt.discriminant), block])
        }
        Statement::LabeledStatement(stmt) => Node::other(span, vec![statement(&stmt.body)]),
        Statement::WithStatement(stmt) => {
            Node::other(span, vec![expression(&stmt.object), statement(&stmt.body)])
        }
        Statement::ImportDeclaration(decl) => {
            let mut specifiers = Vec::new();
            if let Some(specs) = &decl.specifiers {
                for spec in specs {
                    specifiers.push(match spec {
                        ImportDeclarationSpecifier::ImportSpecifier(named) => ImportBinding {
                            local: named.local.name.to_string(),
                            imported: ImportedName::named(module_export_name(&named.imported).0),
                            span: named.span,
                        },
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => {
                            ImportBinding {
                                local: default.local.name.to_string(),
                                imported: ImportedName::Default,
                                span: default.span,
                            }
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(namespace) => {
                            ImportBinding {
                                local: namespace.local.name.to_string(),
                                imported: ImportedName::Namespace,
                                span: namespace.span,
                            }
                        }
                    });
                }
            }
            Node::new(
                span,
                NodeKind::ImportDeclaration {
                    source: decl.source.value.to_string(),
                    specifiers,
                },
            )
        }
        Statement::ExportNamedDeclaration(decl) => {
            let declaration = decl.declaration.as_ref().map(|d| Box::new(declaration(d)));
            let specifiers = decl
                .specifiers
                .iter()
                .map(|spec| {
                    let (local, local_span) = module_export_name(&spec.local);
                    let (exported, exported_span) = module_export_name(&spec.exported);
                    Node::new(
                        spec.span,
                        NodeKind::ExportSpecifier {
                            local: Box::new(Node::new(local_span, NodeKind::Identifier(local))),
                            exported: Box::new(Node::new(
                                exported_span,
                                NodeKind::Identifier(exported),
                            )),
                        },
                    )
                })
                .collect();
            Node::new(
                span,
                NodeKind::ExportNamedDeclaration {
                    declaration,
                    specifiers,
                    source: decl.source.as_ref().map(|s| s.value.to_string()),
                },
            )
        }
        Statement::ExportDefaultDeclaration(decl) => {
            let declaration = match &decl.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                    Node::new(func.span, NodeKind::FunctionDeclaration(function(func)))
                }
                ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                    Node::new(class.span, NodeKind::ClassDeclaration(class_parts(class)))
                }
                other => other
                    .as_expression()
                    .map_or_else(|| Node::leaf(other.span()), expression),
            };
            Node::new(
                span,
                NodeKind::ExportDefaultDeclaration {
                    declaration: Box::new(declaration),
                },
            )
        }
        Statement::ExportAllDeclaration(decl) => Node::new(
            span,
            NodeKind::ExportAllDeclaration {
                source: decl.source.value.to_string(),
                exported: decl.exported.as_ref().map(|name| module_export_name(name).0),
            },
        ),
        _ => Node::leaf(span),
    }
}

fn block_statement(span: Span, body: &[Statement<'_>]) -> Node {
    Node::new(
        span,
        NodeKind::BlockStatement {
            body: statements(body),
        },
    )
}

fn for_statement(span: Span, head: Vec<Node>, body: &Statement<'_>, iterates: bool) -> Node {
    Node::new(
        span,
        NodeKind::ForStatement {
            head,
            body: Box::new(statement(body)),
            iterates,
        },
    )
}

fn for_init(init: &ForStatementInit<'_>) -> Node {
    match init {
        ForStatementInit::VariableDeclaration(decl) => variable_declaration(decl),
        other => other
            .as_expression()
            .map_or_else(|| Node::leaf(other.span()), expression),
    }
}

fn for_left(left: &ForStatementLeft<'_>) -> Node {
    match left {
        ForStatementLeft::VariableDeclaration(decl) => variable_declaration(decl),
        other => other
            .as_assignment_target()
            .map_or_else(|| Node::leaf(other.span()), assignment_target),
    }
}

fn declaration(decl: &Declaration<'_>) -> Node {
    match decl {
        Declaration::VariableDeclaration(decl) => variable_declaration(decl),
        Declaration::FunctionDeclaration(func) => {
            Node::new(func.span, NodeKind::FunctionDeclaration(function(func)))
        }
        Declaration::ClassDeclaration(class) => {
            Node::new(class.span, NodeKind::ClassDeclaration(class_parts(class)))
        }
        other => Node::leaf(other.span()),
    }
}

fn variable_declaration(decl: &VariableDeclaration<'_>) -> Node {
    let kind = match decl.kind {
        VariableDeclarationKind::Var => VariableKind::Var,
        VariableDeclarationKind::Let => VariableKind::Let,
        _ => VariableKind::Const,
    };
    let declarations = decl
        .declarations
        .iter()
        .map(|declarator| {
            Node::new(
                declarator.span,
                NodeKind::VariableDeclarator {
                    id: Box::new(binding_pattern(&declarator.id)),
                    init: declarator.init.as_ref().map(|init| Box::new(expression(init))),
                },
            )
        })
        .collect();
    Node::new(decl.span, NodeKind::VariableDeclaration { kind, declarations })
}

fn binding_pattern(pattern: &BindingPattern<'_>) -> Node {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(ident) => {
            Node::new(ident.span, NodeKind::BindingIdentifier(ident.name.to_string()))
        }
        BindingPatternKind::ObjectPattern(object) => {
            let mut properties: Vec<Node> = object
                .properties
                .iter()
                .map(|prop| {
                    Node::new(
                        prop.span,
                        NodeKind::Property {
                            key: Box::new(property_key(&prop.key)),
                            value: Box::new(binding_pattern(&prop.value)),
                            computed: prop.computed,
                        },
                    )
                })
                .collect();
            if let Some(rest) = &object.rest {
                properties.push(Node::new(
                    rest.span,
                    NodeKind::RestElement {
                        argument: Box::new(binding_pattern(&rest.argument)),
                    },
                ));
            }
            Node::new(object.span, NodeKind::ObjectPattern { properties })
        }
        BindingPatternKind::ArrayPattern(array) => {
            let mut elements: Vec<Option<Node>> = array
                .elements
                .iter()
                .map(|element| element.as_ref().map(binding_pattern))
                .collect();
            if let Some(rest) = &array.rest {
                elements.push(Some(Node::new(
                    rest.span,
                    NodeKind::RestElement {
                        argument: Box::new(binding_pattern(&rest.argument)),
                    },
                )));
            }
            Node::new(array.span, NodeKind::ArrayPattern { elements })
        }
        BindingPatternKind::AssignmentPattern(assign) => Node::new(
            assign.span,
            NodeKind::AssignmentPattern {
                left: Box::new(binding_pattern(&assign.left)),
                right: Box::new(expression(&assign.right)),
            },
        ),
    }
}

fn formal_parameters(params: &FormalParameters<'_>) -> Vec<Node> {
    let mut nodes: Vec<Node> = params
        .items
        .iter()
        .map(|param| binding_pattern(&param.pattern))
        .collect();
    if let Some(rest) = &params.rest {
        nodes.push(Node::new(
            rest.span,
            NodeKind::RestElement {
                argument: Box::new(binding_pattern(&rest.argument)),
            },
        ));
    }
    nodes
}

fn function_body(body: &FunctionBody<'_>) -> Node {
    block_statement(body.span, &body.statements)
}

fn function(func: &OxcFunction<'_>) -> Function {
    Function {
        id: func.id.as_ref().map(|id| {
            Box::new(Node::new(id.span, NodeKind::BindingIdentifier(id.name.to_string())))
        }),
        params: formal_parameters(&func.params),
        body: Box::new(
            func.body
                .as_ref()
                .map_or_else(|| block_statement(func.span, &[]), |body| function_body(body)),
        ),
    }
}

fn arrow(func: &ArrowFunctionExpression<'_>) -> Function {
    Function {
        id: None,
        params: formal_parameters(&func.params),
        body: Box::new(function_body(&func.body)),
    }
}

fn class_parts(class: &OxcClass<'_>) -> Class {
    Class {
        id: class.id.as_ref().map(|id| {
            Box::new(Node::new(id.span, NodeKind::BindingIdentifier(id.name.to_string())))
        }),
        super_class: class.super_class.as_ref().map(|sup| Box::new(expression(sup))),
        body: class.body.body.iter().map(class_element).collect(),
    }
}

fn class_element(element: &ClassElement<'_>) -> Node {
    match element {
        ClassElement::MethodDefinition(method) => Node::new(
            method.span,
            NodeKind::MethodDefinition {
                key: Box::new(property_key(&method.key)),
                computed: method.computed,
                value: Box::new(Node::new(
                    method.value.span,
                    NodeKind::FunctionExpression(function(&method.value)),
                )),
            },
        ),
        ClassElement::PropertyDefinition(prop) => Node::new(
            prop.span,
            NodeKind::PropertyDefinition {
                key: Box::new(property_key(&prop.key)),
                computed: prop.computed,
                value: prop.value.as_ref().map(|value| Box::new(expression(value))),
            },
        ),
        ClassElement::AccessorProperty(prop) => Node::new(
            prop.span,
            NodeKind::PropertyDefinition {
                key: Box::new(property_key(&prop.key)),
                computed: prop.computed,
                value: prop.value.as_ref().map(|value| Box::new(expression(value))),
            },
        ),
        ClassElement::StaticBlock(block) => block_statement(block.span, &block.body),
        other => Node::leaf(other.span()),
    }
}

fn property_key(key: &PropertyKey<'_>) -> Node {
    match key {
        PropertyKey::StaticIdentifier(ident) => {
            Node::new(ident.span, NodeKind::Identifier(ident.name.to_string()))
        }
        PropertyKey::PrivateIdentifier(ident) => Node::leaf(ident.span),
        other => other
            .as_expression()
            .map_or_else(|| Node::leaf(other.span()), expression),
    }
}

fn module_export_name(name: &ModuleExportName<'_>) -> (String, Span) {
    match name {
        ModuleExportName::IdentifierName(ident) => (ident.name.to_string(), ident.span),
        ModuleExportName::IdentifierReference(ident) => (ident.name.to_string(), ident.span),
        ModuleExportName::StringLiteral(lit) => (lit.value.to_string(), lit.span),
    }
}

fn static_member(member: &StaticMemberExpression<'_>) -> Node {
    Node::new(
        member.span,
        NodeKind::MemberExpression {
            object: Box::new(expression(&member.object)),
            property: Box::new(Node::new(
                member.property.span,
                NodeKind::Identifier(member.property.name.to_string()),
            )),
            computed: false,
        },
    )
}

fn computed_member(member: &ComputedMemberExpression<'_>) -> Node {
    Node::new(
        member.span,
        NodeKind::MemberExpression {
            object: Box::new(expression(&member.object)),
            property: Box::new(expression(&member.expression)),
            computed: true,
        },
    )
}

fn private_field(member: &PrivateFieldExpression<'_>) -> Node {
    Node::new(
        member.span,
        NodeKind::MemberExpression {
            object: Box::new(expression(&member.object)),
            property: Box::new(Node::leaf(member.field.span)),
            computed: false,
        },
    )
}

fn call(call: &CallExpression<'_>) -> Node {
    Node::new(
        call.span,
        NodeKind::CallExpression {
            callee: Box::new(expression(&call.callee)),
            arguments: call.arguments.iter().map(argument).collect(),
        },
    )
}

fn argument(arg: &Argument<'_>) -> Node {
    match arg {
        Argument::SpreadElement(spread) => {
            Node::other(spread.span, vec![expression(&spread.argument)])
        }
        other => other
            .as_expression()
            .map_or_else(|| Node::leaf(other.span()), expression),
    }
}

fn expression(expr: &Expression<'_>) -> Node {
    let span = expr.span();
    match expr {
        Expression::Identifier(ident) => Node::new(span, NodeKind::Identifier(ident.name.to_string())),
        Expression::StaticMemberExpression(member) => static_member(member),
        Expression::ComputedMemberExpression(member) => computed_member(member),
        Expression::PrivateFieldExpression(member) => private_field(member),
        Expression::CallExpression(expr) => call(expr),
        Expression::NewExpression(expr) => {
            let mut children = vec![expression(&expr.callee)];
            children.extend(expr.arguments.iter().map(argument));
            Node::other(span, children)
        }
        Expression::FunctionExpression(func) => {
            Node::new(span, NodeKind::FunctionExpression(function(func)))
        }
        Expression::ArrowFunctionExpression(func) => {
            Node::new(span, NodeKind::ArrowFunctionExpression(arrow(func)))
        }
        Expression::ClassExpression(class) => Node::new(span, NodeKind::ClassExpression(class_parts(class))),
        Expression::AssignmentExpression(assign) => Node::new(
            span,
            NodeKind::AssignmentExpression {
                left: Box::new(assignment_target(&assign.left)),
                right: Box::new(expression(&assign.right)),
            },
        ),
        Expression::UpdateExpression(update) => Node::new(
            span,
            NodeKind::UpdateExpression {
                argument: Box::new(simple_assignment_target(&update.argument)),
            },
        ),
        Expression::ObjectExpression(object) => Node::other(
            span,
            object
                .properties
                .iter()
                .map(|prop| match prop {
                    ObjectPropertyKind::ObjectProperty(prop) => Node::new(
                        prop.span,
                        NodeKind::Property {
                            key: Box::new(property_key(&prop.key)),
                            value: Box::new(expression(&prop.value)),
                            computed: prop.computed,
                        },
                    ),
                    ObjectPropertyKind::SpreadProperty(spread) => {
                        Node::other(spread.span, vec![expression(&spread.argument)])
                    }
                })
                .collect(),
        ),
        Expression::ArrayExpression(array) => Node::other(
            span,
            array
                .elements
                .iter()
                .map(|element| match element {
                    ArrayExpressionElement::SpreadElement(spread) => {
                        Node::other(spread.span, vec![expression(&spread.argument)])
                    }
                    other => other
                        .as_expression()
                        .map_or_else(|| Node::leaf(other.span()), expression),
                })
                .collect(),
        ),
        Expression::ParenthesizedExpression(paren) => expression(&paren.expression),
        Expression::SequenceExpression(seq) => {
            Node::other(span, seq.expressions.iter().map(expression).collect())
        }
        Expression::ConditionalExpression(cond) => Node::other(
            span,
            vec![
                expression(&cond.test),
                expression(&cond.consequent),
                expression(&cond.alternate),
            ],
        ),
        Expression::BinaryExpression(bin) => {
            Node::other(span, vec![expression(&bin.left), expression(&bin.right)])
        }
        Expression::LogicalExpression(logical) => {
            Node::other(span, vec![expression(&logical.left), expression(&logical.right)])
        }
        Expression::UnaryExpression(unary) => Node::other(span, vec![expression(&unary.argument)]),
        Expression::AwaitExpression(expr) => Node::other(span, vec![expression(&expr.argument)]),
        Expression::YieldExpression(expr) => {
            Node::other(span, expr.argument.iter().map(expression).collect())
        }
        Expression::TemplateLiteral(template) => {
            Node::other(span, template.expressions.iter().map(expression).collect())
        }
        Expression::TaggedTemplateExpression(tagged) => {
            let mut children = vec![expression(&tagged.tag)];
            children.extend(tagged.quasi.expressions.iter().map(expression));
            Node::other(span, children)
        }
        Expression::ChainExpression(chain) => match &chain.expression {
            ChainElement::CallExpression(expr) => call(expr),
            ChainElement::StaticMemberExpression(member) => static_member(member),
            ChainElement::ComputedMemberExpression(member) => computed_member(member),
            ChainElement::PrivateFieldExpression(member) => private_field(member),
            _ => Node::leaf(span),
        },
        // Dynamic specifiers never become graph edges; the source expression is still evaluated.
        Expression::ImportExpression(import) => Node::other(span, vec![expression(&import.source)]),
        Expression::PrivateInExpression(expr) => Node::other(span, vec![expression(&expr.right)]),
        _ => Node::leaf(span),
    }
}

fn assignment_target(target: &AssignmentTarget<'_>) -> Node {
    match target {
        AssignmentTarget::AssignmentTargetIdentifier(ident) => {
            Node::new(ident.span, NodeKind::Identifier(ident.name.to_string()))
        }
        AssignmentTarget::StaticMemberExpression(member) => static_member(member),
        AssignmentTarget::ComputedMemberExpression(member) => computed_member(member),
        AssignmentTarget::PrivateFieldExpression(member) => private_field(member),
        AssignmentTarget::ArrayAssignmentTarget(array) => {
            let mut elements: Vec<Option<Node>> = array
                .elements
                .iter()
                .map(|element| element.as_ref().map(maybe_default))
                .collect();
            if let Some(rest) = &array.rest {
                elements.push(Some(Node::new(
                    rest.span,
                    NodeKind::RestElement {
                        argument: Box::new(assignment_target(&rest.target)),
                    },
                )));
            }
            Node::new(array.span, NodeKind::ArrayPattern { elements })
        }
        AssignmentTarget::ObjectAssignmentTarget(object) => {
            let mut properties: Vec<Node> = object
                .properties
                .iter()
                .map(|prop| match prop {
                    AssignmentTargetProperty::AssignmentTargetPropertyIdentifier(prop) => {
                        let ident = Node::new(
                            prop.binding.span,
                            NodeKind::Identifier(prop.binding.name.to_string()),
                        );
                        let value = match &prop.init {
                            Some(init) => Node::new(
                                prop.span,
                                NodeKind::AssignmentPattern {
                                    left: Box::new(ident.clone()),
                                    right: Box::new(expression(init)),
                                },
                            ),
                            None => ident.clone(),
                        };
                        Node::new(
                            prop.span,
                            NodeKind::Property {
                                key: Box::new(ident),
                                value: Box::new(value),
                                computed: false,
                            },
                        )
                    }
                    AssignmentTargetProperty::AssignmentTargetPropertyProperty(prop) => Node::new(
                        prop.span,
                        NodeKind::Property {
                            key: Box::new(property_key(&prop.name)),
                            value: Box::new(maybe_default(&prop.binding)),
                            computed: prop.computed,
                        },
                    ),
                })
                .collect();
            if let Some(rest) = &object.rest {
                properties.push(Node::new(
                    rest.span,
                    NodeKind::RestElement {
                        argument: Box::new(assignment_target(&rest.target)),
                    },
                ));
            }
            Node::new(object.span, NodeKind::ObjectPattern { properties })
        }
        other => Node::leaf(other.span()),
    }
}

fn maybe_default(target: &AssignmentTargetMaybeDefault<'_>) -> Node {
    match target {
        AssignmentTargetMaybeDefault::AssignmentTargetWithDefault(with_default) => Node::new(
            with_default.span,
            NodeKind::AssignmentPattern {
                left: Box::new(assignment_target(&with_default.binding)),
                right: Box::new(expression(&with_default.init)),
            },
        ),
        other => other
            .as_assignment_target()
            .map_or_else(|| Node::leaf(other.span()), assignment_target),
    }
}

fn simple_assignment_target(target: &SimpleAssignmentTarget<'_>) -> Node {
    match target {
        SimpleAssignmentTarget::AssignmentTargetIdentifier(ident) => {
            Node::new(ident.span, NodeKind::Identifier(ident.name.to_string()))
        }
        SimpleAssignmentTarget::StaticMemberExpression(member) => static_member(member),
        SimpleAssignmentTarget::ComputedMemberExpression(member) => computed_member(member),
        SimpleAssignmentTarget::PrivateFieldExpression(member) => private_field(member),
        other => Node::leaf(other.span()),
    }
}
