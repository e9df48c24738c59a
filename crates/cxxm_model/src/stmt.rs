//! Statements, expressions and references.

use crate::decl::{DeclRef, Declaration, Variable};
use cxxm_core::text::TextSpan;
use serde::Serialize;

/// An identifier used in an expression, with the symbol-table verdict at
/// the point of use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    pub name: String,
    pub span: TextSpan,
    /// A symbol-table entry for the name was visible where it was used.
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<DeclRef>,
}

/// Expressions are not modelled structurally; only their extent and the
/// names they reference are kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub span: TextSpan,
    pub references: Vec<Reference>,
}

impl Expression {
    pub fn references_name(&self, name: &str) -> Option<&Reference> {
        self.references.iter().find(|r| r.name == name)
    }
}

/// The controlling clause of a selection or iteration statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    Expression(Expression),
    Declaration(Variable),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    Compound {
        span: TextSpan,
        statements: Vec<Statement>,
    },
    Expression {
        span: TextSpan,
        expression: Option<Expression>,
    },
    Declaration {
        span: TextSpan,
        declarations: Vec<Declaration>,
    },
    If {
        span: TextSpan,
        condition: Option<Condition>,
        then_branch: Option<Box<Statement>>,
        else_branch: Option<Box<Statement>>,
    },
    Switch {
        span: TextSpan,
        condition: Option<Condition>,
        body: Option<Box<Statement>>,
    },
    Case {
        span: TextSpan,
        value: Option<Expression>,
    },
    Default {
        span: TextSpan,
    },
    Label {
        span: TextSpan,
        label: String,
    },
    /// `while` (`post_check == false`) and `do ... while` loops.
    Loop {
        span: TextSpan,
        post_check: bool,
        condition: Option<Condition>,
        body: Option<Box<Statement>>,
    },
    For {
        span: TextSpan,
        init: Option<Box<Statement>>,
        condition: Option<Condition>,
        step: Option<Expression>,
        body: Option<Box<Statement>>,
    },
    Break {
        span: TextSpan,
    },
    Continue {
        span: TextSpan,
    },
    Return {
        span: TextSpan,
        value: Option<Expression>,
    },
    Goto {
        span: TextSpan,
        label: String,
    },
}

impl Statement {
    pub fn span(&self) -> TextSpan {
        match self {
            Statement::Compound { span, .. }
            | Statement::Expression { span, .. }
            | Statement::Declaration { span, .. }
            | Statement::If { span, .. }
            | Statement::Switch { span, .. }
            | Statement::Case { span, .. }
            | Statement::Default { span }
            | Statement::Label { span, .. }
            | Statement::Loop { span, .. }
            | Statement::For { span, .. }
            | Statement::Break { span }
            | Statement::Continue { span }
            | Statement::Return { span, .. }
            | Statement::Goto { span, .. } => *span,
        }
    }

    /// Direct child statements, in source order.
    pub fn children(&self) -> Vec<&Statement> {
        match self {
            Statement::Compound { statements, .. } => statements.iter().collect(),
            Statement::If {
                then_branch,
                else_branch,
                ..
            } => then_branch.iter().chain(else_branch.iter()).map(|s| &**s).collect(),
            Statement::Switch { body, .. } | Statement::Loop { body, .. } => {
                body.iter().map(|s| &**s).collect()
            }
            Statement::For { init, body, .. } => {
                init.iter().chain(body.iter()).map(|s| &**s).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Every expression directly owned by this statement.
    pub fn expressions(&self) -> Vec<&Expression> {
        match self {
            Statement::Expression { expression, .. } => expression.iter().collect(),
            Statement::Return { value, .. } | Statement::Case { value, .. } => value.iter().collect(),
            Statement::If { condition: c, .. }
            | Statement::Switch { condition: c, .. }
            | Statement::Loop { condition: c, .. } => condition(c).into_iter().collect(),
            Statement::For {
                condition: c, step, ..
            } => condition(c).into_iter().chain(step.iter()).collect(),
            _ => Vec::new(),
        }
    }

    /// Depth-first walk over this statement and all nested statements.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Statement)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

fn condition(c: &Option<Condition>) -> Option<&Expression> {
    match c {
        Some(Condition::Expression(e)) => Some(e),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(start: u32, name: &str) -> Expression {
        Expression {
            span: TextSpan::new(start, 3),
            references: vec![Reference {
                name: name.to_string(),
                span: TextSpan::new(start, 1),
                resolved: true,
                definition: None,
            }],
        }
    }

    #[test]
    fn test_walk_visits_nested_statements() {
        let body = Statement::Compound {
            span: TextSpan::new(0, 40),
            statements: vec![
                Statement::If {
                    span: TextSpan::new(2, 20),
                    condition: Some(Condition::Expression(expr(5, "a"))),
                    then_branch: Some(Box::new(Statement::Return {
                        span: TextSpan::new(10, 9),
                        value: Some(expr(17, "b")),
                    })),
                    else_branch: None,
                },
                Statement::Break {
                    span: TextSpan::new(30, 6),
                },
            ],
        };
        let mut names = Vec::new();
        body.walk(&mut |s| {
            for e in s.expressions() {
                names.extend(e.references.iter().map(|r| r.name.clone()));
            }
        });
        assert_eq!(names, vec!["a", "b"]);

        let mut count = 0;
        body.walk(&mut |_| count += 1);
        assert_eq!(count, 4);
    }
}
