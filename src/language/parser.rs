//! Recursive descent parser for the high-level language, built on the
//! same backtracking core as the assembler.
use super::ast::*;
use crate::syntax::cursor::{is_identifier_part, Cursor, Diagnostic};
use crate::syntax::Grammar;

const KEYWORDS: [&str; 8] = ["var", "val", "fun", "if", "else", "while", "true", "false"];

/// The parsed program and everything reported while parsing it.
#[derive(Debug)]
pub struct Parsed {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }
}

pub struct Parser {
    cursor: Cursor,
}

impl Grammar for Parser {
    fn cursor(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Parser { cursor: Cursor::new(source, Some("//")) }
    }

    /// Run the parser, consuming itself and returning the program.
    pub fn run(mut self) -> Parsed {
        let program = self.program();
        debug!(
            "parsed {} top level declaration(s) with {} error(s)",
            program.items.len(),
            self.cursor.errors()
        );
        Parsed { program, diagnostics: self.cursor.into_diagnostics() }
    }

    fn program(&mut self) -> Program {
        let mut items = Vec::new();
        self.cursor.skip_trivia();
        let begin = self.cursor.mark();
        loop {
            self.cursor.skip_trivia();
            if self.cursor.eof() {
                break;
            }
            if let Some(variable) = self.variable_declaration() {
                items.push(TopLevel::Variable(variable));
            } else if let Some(function) = self.function_declaration() {
                items.push(TopLevel::Function(function));
            } else {
                self.cursor.error("Top level declaration expected");
                break;
            }
        }
        Program { span: Span::new(begin, self.cursor.mark()), items }
    }

    fn span_from(&self, begin: usize) -> Span {
        Span::new(begin, self.cursor.mark())
    }

    fn identifier(&mut self) -> Option<Identifier> {
        self.parse(|p, begin| {
            let first = p.cursor.peek();
            if !(first.is_alphabetic() || first == '_') {
                return None;
            }
            let mut name = String::new();
            while is_identifier_part(p.cursor.peek()) {
                name.push(p.cursor.next());
            }
            if KEYWORDS.contains(&name.as_str()) {
                return None;
            }
            Some(Identifier { span: p.span_from(begin), name })
        })
    }

    fn type_node(&mut self) -> Option<TypeNode> {
        self.parse(|p, begin| {
            let value_type = ValueType::ALL.iter().copied().find(|t| p.cursor.match_word(t.name()))?;
            Some(TypeNode { span: p.span_from(begin), value_type })
        })
    }

    fn variable_declaration(&mut self) -> Option<VariableDeclaration> {
        self.parse(|p, begin| {
            let mutable = if p.cursor.match_word("var") {
                true
            } else if p.cursor.match_word("val") {
                false
            } else {
                return None;
            };

            let name = match p.identifier() {
                Some(name) => name,
                None => {
                    p.cursor.error("Expected declared variable identifier");
                    return None;
                }
            };
            if !p.cursor.expect(":", None) {
                return None;
            }
            let value_type = match p.type_node() {
                Some(t) => t,
                None => {
                    p.cursor.error("Expected variable type");
                    return None;
                }
            };

            let mut initial_value = None;
            if p.cursor.match_str("=") {
                initial_value = p.expression();
                if initial_value.is_none() {
                    p.cursor.error("Expected initial value expression");
                }
            }
            if !p.cursor.expect(";", None) {
                return None;
            }
            Some(VariableDeclaration { span: p.span_from(begin), mutable, name, value_type, initial_value })
        })
    }

    /// `{ statement* }`. A missing `}` fails this block only.
    fn block(&mut self, missing_open: &str) -> Option<Block> {
        self.parse(|p, begin| {
            if !p.cursor.expect("{", Some(missing_open)) {
                return None;
            }
            let mut statements = Vec::new();
            while !p.cursor.match_str("}") {
                p.cursor.skip_trivia();
                if p.cursor.eof() {
                    let message = format!("Expected '}}' for '{{' at line {}", p.cursor.line(begin));
                    p.cursor.error(&message);
                    return None;
                }
                match p.statement() {
                    Some(statement) => statements.push(statement),
                    None => {
                        p.cursor.error("Expected statement in block");
                        return None;
                    }
                }
            }
            Some(Block { span: p.span_from(begin), statements })
        })
    }

    fn function_declaration(&mut self) -> Option<FunctionDeclaration> {
        self.parse(|p, begin| {
            if !p.cursor.match_word("fun") {
                return None;
            }
            let name = match p.identifier() {
                Some(name) => name,
                None => {
                    p.cursor.error("Expected function identifier");
                    return None;
                }
            };

            let mut return_type = None;
            if p.cursor.match_str(":") {
                return_type = p.type_node();
                if return_type.is_none() {
                    p.cursor.error("Expected return type");
                    return None;
                }
            }

            p.cursor.skip_trivia();
            let open_paren = p.cursor.mark();
            if !p.cursor.expect("(", None) {
                return None;
            }
            let mut parameters = Vec::new();
            while !p.cursor.match_str(")") {
                p.cursor.skip_trivia();
                if p.cursor.eof() {
                    let message = format!("Expected ')' for '(' at line {}", p.cursor.line(open_paren));
                    p.cursor.error(&message);
                    return None;
                }
                if !parameters.is_empty() && !p.cursor.expect(",", None) {
                    return None;
                }
                let parameter = match p.identifier() {
                    Some(name) => name,
                    None => {
                        p.cursor.error("Expected parameter name");
                        return None;
                    }
                };
                let message = format!("Expected ':' and type for parameter {}", parameter.name);
                if !p.cursor.expect(":", Some(&message)) {
                    return None;
                }
                let value_type = match p.type_node() {
                    Some(t) => t,
                    None => {
                        p.cursor.error(&format!("Expected type for parameter {}", parameter.name));
                        return None;
                    }
                };
                parameters.push(Parameter { name: parameter, value_type });
            }

            let body = p.block(&format!("Expected body of function {}", name.name))?;
            Some(FunctionDeclaration { span: p.span_from(begin), name, return_type, parameters, body })
        })
    }

    fn literal(&mut self) -> Option<Expression> {
        self.parse(|p, begin| {
            let value = p.number()?;
            Some(Expression::Literal { span: p.span_from(begin), value })
        })
    }

    fn boolean(&mut self) -> Option<Expression> {
        self.parse(|p, begin| {
            let value = if p.cursor.match_word("true") {
                true
            } else if p.cursor.match_word("false") {
                false
            } else {
                return None;
            };
            Some(Expression::Boolean { span: p.span_from(begin), value })
        })
    }

    /// A unary operator applies to the operand right after it.
    fn unary(&mut self) -> Option<Expression> {
        self.parse(|p, begin| {
            let operator = UnaryOperator::ALL.iter().copied().find(|op| p.cursor.match_str(op.text()))?;
            let operand = match p.operand() {
                Some(operand) => operand,
                None => {
                    p.cursor.error(&format!("Expected expression after unary '{}'", operator.text()));
                    return None;
                }
            };
            Some(Expression::Unary { span: p.span_from(begin), operator, operand: Box::new(operand) })
        })
    }

    /// `name(arguments)`.
    fn function_call(&mut self) -> Option<FunctionCall> {
        self.parse(|p, begin| {
            let name = p.identifier()?;
            if !p.cursor.match_str("(") {
                return None;
            }
            let mut arguments = Vec::new();
            while !p.cursor.match_str(")") {
                p.cursor.skip_trivia();
                if p.cursor.eof() {
                    let message = format!("Expected ')' for '(' at line {}", p.cursor.line(begin));
                    p.cursor.error(&message);
                    return None;
                }
                if !arguments.is_empty() && !p.cursor.expect(",", None) {
                    return None;
                }
                match p.expression() {
                    Some(argument) => arguments.push(argument),
                    None => {
                        p.cursor.error(&format!("Expected expression for argument {}", arguments.len() + 1));
                        return None;
                    }
                }
            }
            Some(FunctionCall { span: p.span_from(begin), name, arguments })
        })
    }

    fn paren(&mut self) -> Option<Expression> {
        self.parse(|p, begin| {
            if !p.cursor.match_str("(") {
                return None;
            }
            let inner = match p.expression() {
                Some(inner) => inner,
                None => {
                    p.cursor.error("Expected expression in parentheses");
                    return None;
                }
            };
            let message = format!(
                "Expected ')' to close '(' at {}:{}",
                p.cursor.line(begin),
                p.cursor.column(begin)
            );
            if !p.cursor.expect(")", Some(&message)) {
                return None;
            }
            Some(Expression::Paren { span: p.span_from(begin), inner: Box::new(inner) })
        })
    }

    /// Everything but a binary expression.
    fn operand(&mut self) -> Option<Expression> {
        self.literal()
            .or_else(|| self.boolean())
            .or_else(|| self.unary())
            .or_else(|| self.function_call().map(Expression::Call))
            .or_else(|| self.paren())
            .or_else(|| self.identifier().map(Expression::Field))
    }

    fn expression(&mut self) -> Option<Expression> {
        self.parse(|p, begin| {
            let left = p.operand()?;
            let operator = match BinaryOperator::ALL.iter().copied().find(|op| p.cursor.match_str(op.text())) {
                Some(operator) => operator,
                None => return Some(left),
            };
            let right = match p.expression() {
                Some(right) => right,
                None => {
                    p.cursor.error(&format!("Expected expression after '{}'", operator.text()));
                    return None;
                }
            };
            Some(Expression::Binary {
                span: p.span_from(begin),
                left: Box::new(left),
                operator,
                right: Box::new(right),
            })
        })
    }

    fn assignment(&mut self) -> Option<Statement> {
        self.parse(|p, begin| {
            let target = p.identifier()?;
            if !p.cursor.match_str("=") || p.cursor.peek() == '=' {
                return None;
            }
            let value = match p.expression() {
                Some(value) => value,
                None => {
                    p.cursor.error(&format!("Expected expression after '{} ='", target.name));
                    return None;
                }
            };
            p.cursor.expect(";", Some("Missing ';' after assignment"));
            Some(Statement::Assignment { span: p.span_from(begin), target, value })
        })
    }

    fn if_statement(&mut self) -> Option<Statement> {
        self.parse(|p, begin| {
            if !p.cursor.match_word("if") {
                return None;
            }
            if !p.cursor.expect("(", None) {
                return None;
            }
            let condition = match p.expression() {
                Some(condition) => condition,
                None => {
                    p.cursor.error("Condition expected after 'if ('");
                    return None;
                }
            };
            if !p.cursor.expect(")", None) {
                return None;
            }
            let body = p.block("Expected body of if statement")?;

            let mut otherwise = None;
            if p.cursor.match_word("else") {
                let branch = match p.if_statement() {
                    Some(else_if) => else_if,
                    None => Statement::Block(p.block("'if' or '{' expected after else")?),
                };
                otherwise = Some(Box::new(branch));
            }
            Some(Statement::If { span: p.span_from(begin), condition, body, otherwise })
        })
    }

    fn while_statement(&mut self) -> Option<Statement> {
        self.parse(|p, begin| {
            if !p.cursor.match_word("while") {
                return None;
            }
            if !p.cursor.expect("(", None) {
                return None;
            }
            let condition = match p.expression() {
                Some(condition) => condition,
                None => {
                    p.cursor.error("Expected condition of while statement");
                    return None;
                }
            };
            if !p.cursor.expect(")", None) {
                return None;
            }
            let body = p.block("Expected body of while statement")?;
            Some(Statement::While { span: p.span_from(begin), condition, body })
        })
    }

    fn statement(&mut self) -> Option<Statement> {
        self.parse(|p, begin| {
            if let Some(variable) = p.variable_declaration() {
                return Some(Statement::Variable(variable));
            }
            p.assignment()
                .or_else(|| p.if_statement())
                .or_else(|| p.while_statement())
                .or_else(|| {
                    let call = p.function_call()?;
                    p.cursor.expect(";", Some(&format!("Expected ';' after {} call", call.name.name)));
                    Some(Statement::Call { span: p.span_from(begin), call })
                })
        })
    }
}
