use super::errors::ParseError;
use super::tokenizer::{Position, Token, TokenKind, Tokenizer};
use super::tree::*;
use crate::sem::{Type, TypeReference};
use log::trace;

type ExprParser<'t, 'i> = fn(&mut Parser<'t, 'i>) -> Result<Expr, ParseError>;

#[derive(Debug)]
pub struct Parser<'t, 'i> {
    tokenizer: Tokenizer<'t>,
    ids: &'i mut ExprIdGenerator,
}

impl<'t, 'i> Parser<'t, 'i> {
    pub fn new(tokenizer: Tokenizer<'t>, ids: &'i mut ExprIdGenerator) -> Self {
        Self { tokenizer, ids }
    }

    /// Parses a standalone unit with a fresh id generator.
    pub fn parse_string<S: AsRef<str> + ?Sized>(src: &S) -> Result<Program, ParseError> {
        let mut ids = ExprIdGenerator::new();
        let tokenizer = Tokenizer::from_string(src);
        let mut parser = Parser::new(tokenizer, &mut ids);

        parser.parse()
    }

    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut statements = vec![];

        while self.peek_kind()? != TokenKind::Eos {
            statements.push(self.parse_declaration()?);
        }

        Ok(Program { statements })
    }

    fn parse_declaration(&mut self) -> Result<Stmt, ParseError> {
        self.debug_trace("parse_declaration");

        match self.peek_kind()? {
            TokenKind::Class | TokenKind::Public | TokenKind::Private => self.parse_class(),
            TokenKind::Fun => self.parse_function_declaration(),
            TokenKind::Var => self.parse_var_declaration(),
            TokenKind::Enum => self.parse_enum(),
            _ => self.parse_statement(),
        }
    }

    fn parse_class(&mut self) -> Result<Stmt, ParseError> {
        let position = self.peek_position()?;
        let visibility = self.parse_visibility()?;

        self.expect(TokenKind::Class)?;

        let name = self.expect_identifier()?;
        let mut fields = vec![];
        let mut methods = vec![];

        self.expect_char('{')?;

        while !self.consume_char('}')? {
            let member_position = self.peek_position()?;
            let member_visibility = self.parse_visibility()?;

            match self.peek_kind()? {
                TokenKind::Constructor => {
                    self.next_token()?;
                    let name = Identifier::new("constructor", member_position);
                    methods.push(self.parse_function_rest(name, member_visibility, true)?);
                }
                TokenKind::Mutable => {
                    self.next_token()?;
                    let name = self.expect_identifier()?;
                    fields.push(self.parse_field_rest(name, member_visibility, true)?);
                }
                _ => {
                    let name = self.expect_identifier()?;

                    if self.match_char(':')? {
                        fields.push(self.parse_field_rest(name, member_visibility, false)?);
                    } else {
                        methods.push(self.parse_function_rest(name, member_visibility, false)?);
                    }
                }
            }
        }

        let class = Class {
            name,
            visibility,
            fields,
            methods,
        };

        Ok(Stmt::new(StmtKind::Class(class), position))
    }

    fn parse_visibility(&mut self) -> Result<Visibility, ParseError> {
        let visibility = match self.peek_kind()? {
            TokenKind::Public => Visibility::Public,
            TokenKind::Private => Visibility::Private,
            _ => return Ok(Visibility::Unspecified),
        };

        self.next_token()?;
        Ok(visibility)
    }

    // name ":" type ("=" expression)? ";"
    fn parse_field_rest(
        &mut self,
        name: Identifier,
        visibility: Visibility,
        is_mutable: bool,
    ) -> Result<Field, ParseError> {
        self.expect_char(':')?;

        let type_ref = TypeReference::explicit(self.parse_type()?);
        let initializer = if self.consume_char('=')? {
            Some(self.parse_expr()?)
        } else {
            None
        };

        self.expect_char(';')?;

        Ok(Field {
            name,
            type_ref,
            initializer,
            visibility,
            is_mutable,
        })
    }

    fn parse_function_declaration(&mut self) -> Result<Stmt, ParseError> {
        let position = self.peek_position()?;

        self.expect(TokenKind::Fun)?;

        let name = self.expect_identifier()?;
        let function = self.parse_function_rest(name, Visibility::Unspecified, false)?;

        Ok(Stmt::new(StmtKind::Function(function), position))
    }

    // "(" params? ")" (":" type)? block
    fn parse_function_rest(
        &mut self,
        name: Identifier,
        visibility: Visibility,
        is_constructor: bool,
    ) -> Result<Function, ParseError> {
        self.expect_char('(')?;

        let mut parameters = vec![];

        if !self.consume_char(')')? {
            loop {
                let name = self.expect_identifier()?;
                let type_ref = self.parse_type_annotation()?;

                parameters.push(Parameter { name, type_ref });

                if self.consume_char(')')? {
                    break;
                }
                self.expect_char(',')?;
            }
        }

        let return_type = if is_constructor {
            TypeReference::inferred()
        } else {
            self.parse_type_annotation()?
        };
        let body = self.parse_block()?;

        Ok(Function {
            name,
            parameters,
            return_type,
            body,
            visibility,
            is_constructor,
        })
    }

    fn parse_var_declaration(&mut self) -> Result<Stmt, ParseError> {
        let position = self.peek_position()?;

        self.expect(TokenKind::Var)?;

        let name = self.expect_identifier()?;
        let type_ref = self.parse_type_annotation()?;
        let initializer = if self.consume_char('=')? {
            Some(self.parse_expr()?)
        } else {
            None
        };

        self.expect_char(';')?;

        let var = Var {
            name,
            type_ref,
            initializer,
        };

        Ok(Stmt::new(StmtKind::Var(var), position))
    }

    fn parse_enum(&mut self) -> Result<Stmt, ParseError> {
        let position = self.peek_position()?;

        self.expect(TokenKind::Enum)?;

        let name = self.expect_identifier()?;
        let mut members = vec![];

        self.expect_char('{')?;

        while !self.consume_char('}')? {
            let name = self.expect_identifier()?;
            let initializer = if self.consume_char('=')? {
                Some(self.parse_expr()?)
            } else {
                None
            };

            members.push(EnumMember {
                name,
                initializer,
                value: None,
            });

            // trailing comma is allowed
            if !self.consume_char(',')? {
                self.expect_char('}')?;
                break;
            }
        }

        let declaration = Enum {
            name,
            members,
            underlying_type: TypeReference::inferred(),
        };

        Ok(Stmt::new(StmtKind::Enum(declaration), position))
    }

    // (":" type)?
    fn parse_type_annotation(&mut self) -> Result<TypeReference, ParseError> {
        if self.consume_char(':')? {
            Ok(TypeReference::explicit(self.parse_type()?))
        } else {
            Ok(TypeReference::inferred())
        }
    }

    fn parse_type(&mut self) -> Result<TypeSpecifier, ParseError> {
        let token = self.next_token()?;

        let name = match token.kind {
            TokenKind::Identifier(name) => name,
            _ => return Err(ParseError::mismatch_token(&token, "type name")),
        };

        let is_array = if self.consume_char('[')? {
            self.expect_char(']')?;
            true
        } else {
            false
        };

        Ok(TypeSpecifier {
            name,
            is_array,
            position: token.range.start,
        })
    }

    // --- Statements
    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        self.debug_trace("parse_statement");

        let position = self.peek_position()?;

        let kind = match self.peek_kind()? {
            TokenKind::Char('{') => StmtKind::Block(self.parse_block()?),
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::For => return self.parse_for(),
            TokenKind::Print => {
                self.next_token()?;
                let expr = self.parse_expr()?;
                self.expect_char(';')?;
                StmtKind::Print(expr)
            }
            TokenKind::Return => {
                self.next_token()?;
                let value = if self.match_char(';')? {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect_char(';')?;
                StmtKind::Return(value)
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect_char(';')?;
                StmtKind::Expression(expr)
            }
        };

        Ok(Stmt::new(kind, position))
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = vec![];

        self.expect_char('{')?;

        while !self.consume_char('}')? {
            if self.peek_kind()? == TokenKind::Eos {
                let token = self.next_token()?;
                return Err(ParseError::mismatch_token(&token, "}"));
            }
            statements.push(self.parse_declaration()?);
        }

        Ok(statements)
    }

    fn parse_if(&mut self) -> Result<StmtKind, ParseError> {
        self.expect(TokenKind::If)?;
        self.expect_char('(')?;

        let condition = self.parse_expr()?;

        self.expect_char(')')?;

        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.consume(TokenKind::Else)? {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<StmtKind, ParseError> {
        self.expect(TokenKind::While)?;
        self.expect_char('(')?;

        let condition = self.parse_expr()?;

        self.expect_char(')')?;

        let body = Box::new(self.parse_statement()?);

        Ok(StmtKind::While { condition, body })
    }

    /// `for (init; condition; increment) body` is rewritten as
    /// `{ init; while (condition) { body; increment; } }`.
    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let position = self.peek_position()?;

        self.expect(TokenKind::For)?;
        self.expect_char('(')?;

        let initializer = match self.peek_kind()? {
            TokenKind::Char(';') => {
                self.next_token()?;
                None
            }
            TokenKind::Var => Some(self.parse_var_declaration()?),
            _ => {
                let expr_position = self.peek_position()?;
                let expr = self.parse_expr()?;
                self.expect_char(';')?;
                Some(Stmt::new(StmtKind::Expression(expr), expr_position))
            }
        };

        let condition = if self.match_char(';')? {
            self.expr(ExprKind::Literal(Literal::Bool(true)), position)
        } else {
            self.parse_expr()?
        };

        self.expect_char(';')?;

        let increment = if self.match_char(')')? {
            None
        } else {
            let expr_position = self.peek_position()?;
            let expr = self.parse_expr()?;
            Some(Stmt::new(StmtKind::Expression(expr), expr_position))
        };

        self.expect_char(')')?;

        let mut body = self.parse_statement()?;

        if let Some(increment) = increment {
            let body_position = body.position;
            body = Stmt::new(StmtKind::Block(vec![body, increment]), body_position);
        }

        let mut stmt = Stmt::new(
            StmtKind::While {
                condition,
                body: Box::new(body),
            },
            position,
        );

        if let Some(initializer) = initializer {
            stmt = Stmt::new(StmtKind::Block(vec![initializer, stmt]), position);
        }

        Ok(stmt)
    }

    // --- Expressions
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let target = self.parse_logic_or()?;

        let operator = match self.peek_kind()? {
            TokenKind::Char('=') => None,
            TokenKind::PlusEq => Some(BinaryOperator::AddAssign),
            TokenKind::MinusEq => Some(BinaryOperator::SubtractAssign),
            _ => return Ok(target),
        };

        let token = self.next_token()?;

        if !matches!(target.kind, ExprKind::Identifier(_) | ExprKind::Get { .. }) {
            return Err(ParseError::syntax_error(
                token.range.start,
                "Invalid assignment target.",
            ));
        }

        let mut value = self.parse_assignment()?;

        // `a += b` is `a = a += b`; the right hand side reads the target again.
        if let Some(operator) = operator {
            let lhs = self.duplicate_target(&target)?;
            value = self.expr(
                ExprKind::Binary {
                    operator,
                    lhs: Box::new(lhs),
                    rhs: Box::new(value),
                },
                token.range.start,
            );
        }

        let position = target.position;

        Ok(self.expr(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            position,
        ))
    }

    fn duplicate_target(&mut self, target: &Expr) -> Result<Expr, ParseError> {
        let kind = match &target.kind {
            ExprKind::Identifier(id) => ExprKind::Identifier(id.clone()),
            ExprKind::Get { object, name } => ExprKind::Get {
                object: Box::new(self.duplicate_target(object)?),
                name: name.clone(),
            },
            _ => {
                return Err(ParseError::syntax_error(
                    target.position,
                    "Invalid compound assignment target.",
                ))
            }
        };

        Ok(self.expr(kind, target.position))
    }

    fn parse_logic_or(&mut self) -> Result<Expr, ParseError> {
        self._parse_logical_op(
            Parser::parse_logic_and,
            TokenKind::OrOr,
            LogicalOperator::Or,
        )
    }

    fn parse_logic_and(&mut self) -> Result<Expr, ParseError> {
        self._parse_logical_op(
            Parser::parse_equality,
            TokenKind::AndAnd,
            LogicalOperator::And,
        )
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self._parse_binary_op(
            Parser::parse_comparison,
            &[
                (TokenKind::Eq, BinaryOperator::Equal),
                (TokenKind::Ne, BinaryOperator::NotEqual),
            ],
        )
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        self._parse_binary_op(
            Parser::parse_shift,
            &[
                (TokenKind::Char('<'), BinaryOperator::Less),
                (TokenKind::Le, BinaryOperator::LessEqual),
                (TokenKind::Char('>'), BinaryOperator::Greater),
                (TokenKind::Ge, BinaryOperator::GreaterEqual),
            ],
        )
    }

    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        self._parse_binary_op(
            Parser::parse_term,
            &[
                (TokenKind::Shl, BinaryOperator::ShiftLeft),
                (TokenKind::Shr, BinaryOperator::ShiftRight),
            ],
        )
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        self._parse_binary_op(
            Parser::parse_factor,
            &[
                (TokenKind::Char('+'), BinaryOperator::Add),
                (TokenKind::Char('-'), BinaryOperator::Subtract),
            ],
        )
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        self._parse_binary_op(
            Parser::parse_power,
            &[
                (TokenKind::Char('*'), BinaryOperator::Multiply),
                (TokenKind::Char('/'), BinaryOperator::Divide),
                (TokenKind::Char('%'), BinaryOperator::Modulo),
            ],
        )
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        self._parse_binary_op(
            Parser::parse_unary,
            &[(TokenKind::StarStar, BinaryOperator::Power)],
        )
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let operator = match self.peek_kind()? {
            TokenKind::Char('!') => UnaryOperator::Not,
            TokenKind::Char('-') => UnaryOperator::Minus,
            _ => return self.parse_postfix(),
        };

        let token = self.next_token()?;
        let operand = self.parse_unary()?;
        let position = token.range.start;

        // `-5` is a negative literal rather than a negated one.
        if let (UnaryOperator::Minus, Some(Literal::Integer(value))) =
            (operator, operand.literal())
        {
            let negated = -*value;
            return Ok(self.expr(ExprKind::Literal(Literal::Integer(negated)), position));
        }

        Ok(self.expr(
            ExprKind::UnaryPrefix {
                operator,
                operand: Box::new(operand),
            },
            position,
        ))
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let operand = self.parse_call()?;

        let operator = match self.peek_kind()? {
            TokenKind::PlusPlus => PostfixOperator::Increment,
            TokenKind::MinusMinus => PostfixOperator::Decrement,
            _ => return Ok(operand),
        };

        let token = self.next_token()?;

        if operand.identifier().is_none() {
            return Err(ParseError::syntax_error(
                token.range.start,
                format!("Invalid {} target.", operator),
            ));
        }

        let position = operand.position;

        Ok(self.expr(
            ExprKind::UnaryPostfix {
                operator,
                operand: Box::new(operand),
            },
            position,
        ))
    }

    fn parse_call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let position = expr.position;

            if self.consume_char('(')? {
                let arguments = self.parse_arguments(')')?;
                expr = self.expr(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        arguments,
                    },
                    position,
                );
            } else if self.consume_char('.')? {
                let token = self.next_token()?;
                let name = match token.kind {
                    TokenKind::Identifier(name) => Identifier::new(name, token.range.start),
                    _ => return Err(ParseError::mismatch_token(&token, "property name")),
                };
                expr = self.expr(
                    ExprKind::Get {
                        object: Box::new(expr),
                        name,
                    },
                    position,
                );
            } else if self.consume_char('[')? {
                let argument = self.parse_expr()?;
                self.expect_char(']')?;
                expr = self.expr(
                    ExprKind::Index {
                        indexee: Box::new(expr),
                        argument: Box::new(argument),
                    },
                    position,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    // (expression ("," expression)*)? close_char
    fn parse_arguments(&mut self, close_char: char) -> Result<Vec<Expr>, ParseError> {
        let mut arguments = vec![];

        if self.consume_char(close_char)? {
            return Ok(arguments);
        }

        loop {
            arguments.push(self.parse_expr()?);

            if self.consume_char(close_char)? {
                break;
            }
            self.expect_char(',')?;
        }

        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        self.debug_trace("parse_primary");

        let token = self.next_token()?;
        let position = token.range.start;

        let kind = match token.kind {
            TokenKind::Integer(i) => ExprKind::Literal(Literal::Integer(i)),
            TokenKind::Float(x) => ExprKind::Literal(Literal::Float(x)),
            TokenKind::String(s) => ExprKind::Literal(Literal::String(s)),
            TokenKind::CharLiteral(c) => ExprKind::Literal(Literal::Char(c)),
            TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
            TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
            TokenKind::Null => ExprKind::Literal(Literal::Null),
            TokenKind::This => ExprKind::Identifier(Identifier::new("this", position)),
            TokenKind::Identifier(name) => ExprKind::Identifier(Identifier::new(name, position)),
            TokenKind::Char('(') => {
                let expr = self.parse_expr()?;
                self.expect_char(')')?;
                ExprKind::Grouping(Box::new(expr))
            }
            TokenKind::Char('[') => ExprKind::Collection(self.parse_arguments(']')?),
            TokenKind::New => {
                let class_name = self.expect_identifier()?;
                self.expect_char('(')?;
                let arguments = self.parse_arguments(')')?;
                ExprKind::New {
                    class_name,
                    arguments,
                }
            }
            _ => return Err(ParseError::mismatch_token(&token, "expression")),
        };

        Ok(self.expr(kind, position))
    }

    fn _parse_binary_op(
        &mut self,
        next_parser: ExprParser<'t, 'i>,
        operators: &[(TokenKind, BinaryOperator)],
    ) -> Result<Expr, ParseError> {
        let mut lhs = next_parser(self)?;

        loop {
            let kind = self.peek_kind()?;
            let operator = match operators.iter().find(|(op, _)| *op == kind) {
                Some((_, operator)) => *operator,
                None => break,
            };

            let token = self.next_token()?;
            let rhs = next_parser(self)?;

            lhs = self.expr(
                ExprKind::Binary {
                    operator,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                token.range.start,
            );
        }

        Ok(lhs)
    }

    fn _parse_logical_op(
        &mut self,
        next_parser: ExprParser<'t, 'i>,
        token_kind: TokenKind,
        operator: LogicalOperator,
    ) -> Result<Expr, ParseError> {
        let mut lhs = next_parser(self)?;

        while self.match_token(&token_kind)? {
            let token = self.next_token()?;
            let rhs = next_parser(self)?;

            lhs = self.expr(
                ExprKind::Logical {
                    operator,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                token.range.start,
            );
        }

        Ok(lhs)
    }

    // --- Helpers
    fn expr(&mut self, kind: ExprKind, position: Position) -> Expr {
        Expr::new(self.ids.next_id(), kind, position)
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        Ok(self.tokenizer.next_token()?)
    }

    fn peek_kind(&mut self) -> Result<TokenKind, ParseError> {
        self.tokenizer
            .peek_kind()
            .map(Clone::clone)
            .map_err(ParseError::from)
    }

    fn peek_position(&mut self) -> Result<Position, ParseError> {
        self.tokenizer
            .peek()
            .map(|token| token.range.start)
            .map_err(ParseError::from)
    }

    fn match_token(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        Ok(self.peek_kind()? == *kind)
    }

    fn match_char(&mut self, c: char) -> Result<bool, ParseError> {
        self.match_token(&TokenKind::Char(c))
    }

    fn consume(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        if self.match_token(&kind)? {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn consume_char(&mut self, c: char) -> Result<bool, ParseError> {
        self.consume(TokenKind::Char(c))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.next_token()?;

        if token.kind == kind {
            Ok(token)
        } else {
            Err(ParseError::mismatch_token(&token, kind.to_string()))
        }
    }

    fn expect_char(&mut self, c: char) -> Result<Token, ParseError> {
        self.expect(TokenKind::Char(c))
    }

    /// Reads the name of a declaration. Keywords and built-in type names are rejected.
    fn expect_identifier(&mut self) -> Result<Identifier, ParseError> {
        let token = self.next_token()?;
        let position = token.range.start;

        if token.kind.is_keyword() {
            return Err(ParseError::reserved_identifier(position, token.text()));
        }

        match token.kind {
            TokenKind::Identifier(name) => {
                if Type::from_name(&name).is_some() {
                    Err(ParseError::reserved_identifier(position, name))
                } else {
                    Ok(Identifier::new(name, position))
                }
            }
            _ => Err(ParseError::mismatch_token(&token, "identifier")),
        }
    }

    fn debug_trace(&mut self, name: &str) {
        trace!("[{}] position: {}", name, self.tokenizer.current_position());
    }
}
