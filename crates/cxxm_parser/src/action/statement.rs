//! Statements, conditions, expressions and identifier references.

use crate::builders::*;
use crate::error::{ActionFault, RecognitionError, RecognitionFault};
use crate::session::ParseSession;
use cxxm_core::text::TextSpan;
use cxxm_lexer::Token;
use cxxm_model::{Reference, Statement, Variable};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPart {
    If,
    Else,
    Switch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationPart {
    While,
    Do,
    For,
    /// The condition of a `for` (after the first `;`).
    ForCondition,
    /// The step of a `for` (after the second `;`).
    ForStep,
    /// The body of a `while` or `for`.
    Body,
    /// The `while` after a `do` body.
    DoCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// `case` keyword; the value expression follows.
    Case,
    /// `:` after the case value.
    CaseColon,
    Default,
    /// `identifier :`
    Label,
}

impl ParseSession {
    // ========================================================================
    // Blocks
    // ========================================================================

    /// `{` of a block. A function body block makes the parameters visible.
    pub fn compound_statement(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.symtab.push();
            if let Some(Builder::Function(function)) = s.builders.top() {
                let names: Vec<_> = function
                    .parameters
                    .iter()
                    .filter_map(|p| p.name.as_deref())
                    .map(|name| s.interner.intern(name))
                    .collect();
                for name in names {
                    s.symtab.enter_local(name);
                }
            }
            let mut statement = StatementBuilder::new(token.offset, StatementKind::Compound { statements: Vec::new() });
            statement.scoped = true;
            s.builders.push(Builder::Statement(statement));
            Ok(())
        })
    }

    pub fn end_compound_statement(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| s.finish_statement(token))
    }

    pub fn expression_statement(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.push_statement(token, StatementKind::Expression { expression: None }, false);
            Ok(())
        })
    }

    pub fn end_expression_statement(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| s.finish_statement(token))
    }

    pub fn declaration_statement(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.push_statement(token, StatementKind::Declaration { declarations: Vec::new() }, false);
            Ok(())
        })
    }

    pub fn end_declaration_statement(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| s.finish_statement(token))
    }

    // ========================================================================
    // Selection and iteration
    // ========================================================================

    /// `if` and `switch` open a scope for condition declarations; `else`
    /// switches the open `if` to its else branch.
    pub fn selection_statement(&mut self, part: SelectionPart, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            match part {
                SelectionPart::If => s.push_statement(
                    token,
                    StatementKind::If {
                        condition: None,
                        then_branch: None,
                        else_branch: None,
                        in_else: false,
                    },
                    true,
                ),
                SelectionPart::Switch => s.push_statement(
                    token,
                    StatementKind::Switch {
                        condition: None,
                        body: None,
                    },
                    true,
                ),
                SelectionPart::Else => {
                    if let StatementKind::If { in_else, .. } = &mut s.builders.statement_mut()?.kind {
                        *in_else = true;
                    }
                }
            }
            Ok(())
        })
    }

    pub fn end_selection_statement(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| s.finish_statement(token))
    }

    pub fn iteration_statement(&mut self, part: IterationPart, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            match part {
                IterationPart::While => s.push_statement(
                    token,
                    StatementKind::Loop {
                        post_check: false,
                        condition: None,
                        body: None,
                        part: LoopPart::Condition,
                    },
                    true,
                ),
                IterationPart::Do => s.push_statement(
                    token,
                    StatementKind::Loop {
                        post_check: true,
                        condition: None,
                        body: None,
                        part: LoopPart::Body,
                    },
                    false,
                ),
                IterationPart::For => s.push_statement(
                    token,
                    StatementKind::For {
                        init: None,
                        condition: None,
                        step: None,
                        body: None,
                        part: LoopPart::Init,
                    },
                    true,
                ),
                IterationPart::ForCondition => s.set_loop_part(LoopPart::Condition)?,
                IterationPart::ForStep => s.set_loop_part(LoopPart::Step)?,
                IterationPart::Body => s.set_loop_part(LoopPart::Body)?,
                IterationPart::DoCondition => s.set_loop_part(LoopPart::Condition)?,
            }
            Ok(())
        })
    }

    pub fn end_iteration_statement(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| s.finish_statement(token))
    }

    /// A declaration in the condition of an `if`, `switch`, `while` or
    /// `for`. It lives in the statement's scope.
    pub fn condition_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.statement()?;
            let mut decl = SimpleDeclarationBuilder::new(token.offset);
            decl.condition = true;
            s.builders.push(Builder::SimpleDeclaration(decl));
            Ok(())
        })
    }

    pub fn end_condition_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let decl = s.builders.pop_simple_declaration()?;
            s.pop_scopes(&decl.pushed_scopes)?;
            let declarator = decl.declarator.as_ref();
            let name = declarator
                .and_then(|d| d.name.as_ref())
                .ok_or(ActionFault::Incomplete("condition declaration"))?;
            if let Some(last) = name.last() {
                s.symtab.enter_local(last);
            }
            let variable = Variable {
                name: name.display(&s.interner),
                span: TextSpan::from_bounds(decl.start, token.end),
                ty: decl.specs.resolved_type(declarator).unwrap_or_default(),
                is_static: false,
                is_extern: false,
                initializer: declarator.and_then(|d| d.initializer.clone()),
                bit_width: None,
                template: None,
            };
            s.builders.statement_mut()?.accept_condition(variable);
            Ok(())
        })
    }

    // ========================================================================
    // Labels and jumps
    // ========================================================================

    /// `case`, the `:` closing its value, `default:` and `label:`.
    pub fn labeled_statement(&mut self, kind: LabelKind, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            match kind {
                LabelKind::Case => {
                    if !s.inside_switch() {
                        return Err(RecognitionFault::DanglingCase.into());
                    }
                    s.push_statement(token, StatementKind::Case { value: None }, false);
                }
                LabelKind::CaseColon => {
                    if !s.builders.statement()?.is_case() {
                        return Err(ActionFault::unexpected(BuilderKind::Statement, s.builders.kind_at(0)));
                    }
                    let case = s.builders.pop_statement()?.create(token.end);
                    s.attach_statement(case);
                }
                LabelKind::Default => s.attach_statement(Statement::Default { span: token.span() }),
                LabelKind::Label => {
                    let label = s.interner.resolve(token.text).to_string();
                    s.attach_statement(Statement::Label {
                        span: token.span(),
                        label,
                    });
                }
            }
            Ok(())
        })
    }

    /// End of a labeled statement. A case still open here never saw its `:`.
    pub fn end_labeled_statement(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            if let Some(Builder::Statement(statement)) = s.builders.top() {
                if statement.is_case() {
                    s.builders.pop_statement()?;
                    return Err(RecognitionFault::UnfinishedCase.into());
                }
            }
            Ok(())
        })
    }

    pub fn jump_statement(&mut self, kind: JumpKind, token: Token, label: Option<Token>) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let label = label.map(|l| s.interner.resolve(l.text).to_string());
            s.push_statement(
                token,
                StatementKind::Jump {
                    kind,
                    value: None,
                    label,
                },
                false,
            );
            Ok(())
        })
    }

    pub fn end_jump_statement(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| s.finish_statement(token))
    }

    fn push_statement(&mut self, token: Token, kind: StatementKind, scoped: bool) {
        let mut statement = StatementBuilder::new(token.offset, kind);
        if scoped {
            self.symtab.push();
            statement.scoped = true;
        }
        self.builders.push(Builder::Statement(statement));
    }

    fn finish_statement(&mut self, token: Token) -> Result<(), ActionFault> {
        let statement = self.builders.pop_statement()?;
        if statement.scoped {
            self.symtab.pop()?;
        }
        let statement = statement.create(token.end);
        self.attach_statement(statement);
        Ok(())
    }

    fn set_loop_part(&mut self, next: LoopPart) -> Result<(), ActionFault> {
        match &mut self.builders.statement_mut()?.kind {
            StatementKind::Loop { part, .. } | StatementKind::For { part, .. } => *part = next,
            _ => trace!(?next, "loop part outside a loop"),
        }
        Ok(())
    }

    /// A switch statement is open below the top, within the current
    /// function.
    fn inside_switch(&self) -> bool {
        for builder in self.builders.iter_from_top() {
            match builder {
                Builder::Statement(statement) if statement.is_switch() => return true,
                Builder::Statement(_) => {}
                _ => return false,
            }
        }
        false
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Enter an expression. Nested expressions fold into the outermost one.
    pub fn expression(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            match s.builders.top_mut() {
                Some(Builder::Expression(expression)) => expression.depth += 1,
                _ => s
                    .builders
                    .push(Builder::Expression(ExpressionBuilder::new(token.offset))),
            }
            Ok(())
        })
    }

    /// Leave an expression; `token` is its last token. The outermost one is
    /// handed to whatever waits for it.
    pub fn end_expression(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            if let Some(Builder::Expression(expression)) = s.builders.top_mut() {
                if expression.depth > 0 {
                    expression.depth -= 1;
                    return Ok(());
                }
            }
            let expression = s.builders.pop_expression()?.create(token.end);
            match s.builders.top_mut() {
                Some(Builder::Statement(statement)) => {
                    if !statement.accept_expression(expression) {
                        trace!("expression without a slot dropped");
                    }
                }
                Some(Builder::SimpleDeclaration(decl)) => {
                    if let Some(declarator) = decl.declarator.as_mut() {
                        match declarator.slot {
                            DeclaratorSlot::BitWidth => declarator.bit_width = Some(expression),
                            _ => declarator.initializer = Some(expression),
                        }
                        declarator.slot = DeclaratorSlot::None;
                    }
                }
                Some(Builder::Declarator(declarator)) => declarator.slot = DeclaratorSlot::None,
                Some(Builder::Parameter(parameter)) => parameter.default_value = Some(expression),
                Some(Builder::Enum(builder)) => {
                    if let Some(last) = builder.enumerators.last_mut() {
                        last.value = Some(expression);
                    }
                }
                _ => {}
            }
            Ok(())
        })
    }

    /// An identifier used in an expression.
    pub fn id_expression(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.push(Builder::Name(NameBuilder::new(token.offset)));
            Ok(())
        })
    }

    /// Resolve the identifier against the symbol table as it stands now and
    /// record the reference.
    pub fn end_id_expression(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let name = s.builders.pop_name()?.create();
            if !s.options.record_references || name.is_empty() {
                return Ok(());
            }
            let entry = s.symtab.lookup_qualified(&name.lookup_parts(&s.interner));
            let reference = Reference {
                name: name.display(&s.interner),
                span: TextSpan::from_bounds(name.start, name.end),
                resolved: entry.is_some(),
                definition: entry.and_then(|e| s.symtab.entry(e).definition.clone()),
            };
            trace!(name = %reference.name, resolved = reference.resolved, "reference");
            let file = s.current_file();
            if let Some(content) = s.store.file_mut(file) {
                content.references.push(reference.clone());
            }
            if let Some(Builder::Expression(expression)) = s.builders.top_mut() {
                expression.references.push(reference);
            }
            Ok(())
        })
    }
}
