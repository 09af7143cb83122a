//! SQL parser
//!
//! This module parses SQL tokens into an AST. Statement kinds outside the
//! supported dialect are reported as "not implemented"; within a known
//! statement, malformed input is a parse error.

use super::ast::*;
use super::lexer::Lexer;
use super::token::Token;
use crate::catalog::DataType;
use crate::error::{Error, Result};

/// SQL parser
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Create a new parser from a SQL string
    pub fn new(sql: &str) -> Result<Self> {
        let tokens = Lexer::new(sql).tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse a single SQL statement
    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = self.parse_statement()?;

        // Consume optional semicolon
        if self.check(&Token::Semicolon) {
            self.advance();
        }
        if !self.check(&Token::Eof) {
            return Err(Error::UnexpectedToken {
                expected: "end of statement".to_string(),
                found: self.current().to_string(),
            });
        }
        Ok(stmt)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.current() {
            Token::Create => self.parse_create(),
            Token::Drop => self.parse_drop(),
            Token::Show => self.parse_show(),
            Token::Insert => self.parse_insert(),
            Token::Delete => self.parse_delete(),
            Token::Select => self.parse_select(),
            _ => Err(Error::Exec("not implemented".to_string())),
        }
    }

    // ========== CREATE ==========

    fn parse_create(&mut self) -> Result<Statement> {
        self.expect(&Token::Create)?;
        match self.current() {
            Token::Table => self.parse_create_table(),
            Token::Index => self.parse_create_index(),
            _ => Err(Error::UnexpectedToken {
                expected: "TABLE or INDEX".to_string(),
                found: self.current().to_string(),
            }),
        }
    }

    fn parse_create_table(&mut self) -> Result<Statement> {
        self.expect(&Token::Table)?;

        let mut if_not_exists = false;
        if self.check(&Token::If) {
            self.advance();
            self.expect(&Token::Not)?;
            self.expect(&Token::Exists)?;
            if_not_exists = true;
        }

        let table_name = self.identifier("table name")?;
        self.expect(&Token::LParen)?;
        let mut columns = Vec::new();
        loop {
            let name = self.identifier("column name")?;
            let data_type = self.data_type()?;
            columns.push(ColumnDef { name, data_type });
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&Token::RParen)?;

        Ok(Statement::CreateTable(CreateTableStatement {
            table_name,
            columns,
            if_not_exists,
        }))
    }

    fn parse_create_index(&mut self) -> Result<Statement> {
        self.expect(&Token::Index)?;
        let index_name = self.identifier("index name")?;
        self.expect(&Token::On)?;
        let table_name = self.identifier("table name")?;

        let mut index_type = "BTREE".to_string();
        if self.check(&Token::Using) {
            self.advance();
            index_type = match self.current().clone() {
                Token::Btree => {
                    self.advance();
                    "BTREE".to_string()
                }
                Token::Hash => {
                    self.advance();
                    "HASH".to_string()
                }
                Token::Identifier(name) => {
                    self.advance();
                    name
                }
                token => {
                    return Err(Error::UnexpectedToken {
                        expected: "index type".to_string(),
                        found: token.to_string(),
                    })
                }
            };
        }

        self.expect(&Token::LParen)?;
        let columns = self.identifier_list()?;
        self.expect(&Token::RParen)?;

        Ok(Statement::CreateIndex(CreateIndexStatement {
            index_name,
            table_name,
            columns,
            index_type,
        }))
    }

    // ========== DROP ==========

    fn parse_drop(&mut self) -> Result<Statement> {
        self.expect(&Token::Drop)?;
        match self.current() {
            Token::Table => {
                self.advance();
                let table_name = self.identifier("table name")?;
                Ok(Statement::DropTable { table_name })
            }
            Token::Index => {
                self.advance();
                let index_name = self.identifier("index name")?;
                self.expect(&Token::From)?;
                let table_name = self.identifier("table name")?;
                Ok(Statement::DropIndex {
                    index_name,
                    table_name,
                })
            }
            _ => Err(Error::UnexpectedToken {
                expected: "TABLE or INDEX".to_string(),
                found: self.current().to_string(),
            }),
        }
    }

    // ========== SHOW ==========

    fn parse_show(&mut self) -> Result<Statement> {
        self.expect(&Token::Show)?;
        match self.current() {
            Token::Tables => {
                self.advance();
                Ok(Statement::ShowTables)
            }
            Token::Columns => {
                self.advance();
                self.expect(&Token::From)?;
                let table_name = self.identifier("table name")?;
                Ok(Statement::ShowColumns { table_name })
            }
            Token::Index => {
                self.advance();
                self.expect(&Token::From)?;
                let table_name = self.identifier("table name")?;
                Ok(Statement::ShowIndex { table_name })
            }
            _ => Err(Error::UnexpectedToken {
                expected: "TABLES, COLUMNS or INDEX".to_string(),
                found: self.current().to_string(),
            }),
        }
    }

    // ========== INSERT ==========

    fn parse_insert(&mut self) -> Result<Statement> {
        self.expect(&Token::Insert)?;
        self.expect(&Token::Into)?;
        let table_name = self.identifier("table name")?;

        let mut columns = None;
        if self.check(&Token::LParen) {
            self.advance();
            columns = Some(self.identifier_list()?);
            self.expect(&Token::RParen)?;
        }

        self.expect(&Token::Values)?;
        self.expect(&Token::LParen)?;
        let mut values = Vec::new();
        loop {
            values.push(self.literal()?);
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&Token::RParen)?;

        Ok(Statement::Insert(InsertStatement {
            table_name,
            columns,
            values,
        }))
    }

    // ========== DELETE ==========

    fn parse_delete(&mut self) -> Result<Statement> {
        self.expect(&Token::Delete)?;
        self.expect(&Token::From)?;
        let table_name = self.identifier("table name")?;
        let where_clause = self.optional_where()?;
        Ok(Statement::Delete(DeleteStatement {
            table_name,
            where_clause,
        }))
    }

    // ========== SELECT ==========

    fn parse_select(&mut self) -> Result<Statement> {
        self.expect(&Token::Select)?;

        let columns = if self.check(&Token::Asterisk) {
            self.advance();
            SelectList::Wildcard
        } else {
            SelectList::Columns(self.identifier_list()?)
        };

        self.expect(&Token::From)?;
        let table_name = self.identifier("table name")?;
        let where_clause = self.optional_where()?;

        Ok(Statement::Select(SelectStatement {
            columns,
            table_name,
            where_clause,
        }))
    }

    // ========== WHERE ==========

    fn optional_where(&mut self) -> Result<Option<Conjunction>> {
        if !self.check(&Token::Where) {
            return Ok(None);
        }
        self.advance();

        let mut conjunction = Vec::new();
        loop {
            conjunction.push(self.condition()?);
            match self.current() {
                Token::And => self.advance(),
                Token::Or => {
                    return Err(Error::Exec(
                        "only AND-connected equality predicates are supported".to_string(),
                    ))
                }
                _ => break,
            }
        }
        Ok(Some(conjunction))
    }

    fn condition(&mut self) -> Result<Condition> {
        if self.check(&Token::Not) {
            return Err(Error::Exec(
                "only AND-connected equality predicates are supported".to_string(),
            ));
        }
        let column = self.identifier("column name")?;
        match self.current() {
            Token::Eq => self.advance(),
            Token::Neq | Token::Lt | Token::Gt | Token::Lte | Token::Gte => {
                return Err(Error::Exec(
                    "only equality comparisons are supported in WHERE".to_string(),
                ))
            }
            token => {
                return Err(Error::UnexpectedToken {
                    expected: "=".to_string(),
                    found: token.to_string(),
                })
            }
        }
        let value = self.literal()?;
        Ok(Condition { column, value })
    }

    // ========== helpers ==========

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else if self.check(&Token::Eof) {
            Err(Error::UnexpectedEof(token.to_string()))
        } else {
            Err(Error::UnexpectedToken {
                expected: token.to_string(),
                found: self.current().to_string(),
            })
        }
    }

    fn identifier(&mut self, expected: &str) -> Result<String> {
        match self.current().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            Token::Eof => Err(Error::UnexpectedEof(expected.to_string())),
            token => Err(Error::UnexpectedToken {
                expected: expected.to_string(),
                found: token.to_string(),
            }),
        }
    }

    fn identifier_list(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.identifier("column name")?];
        while self.check(&Token::Comma) {
            self.advance();
            names.push(self.identifier("column name")?);
        }
        Ok(names)
    }

    fn data_type(&mut self) -> Result<DataType> {
        let data_type = match self.current() {
            Token::Int | Token::Integer => DataType::Int,
            Token::Text => DataType::Text,
            token => {
                return Err(Error::UnexpectedToken {
                    expected: "INT or TEXT".to_string(),
                    found: token.to_string(),
                })
            }
        };
        self.advance();
        Ok(data_type)
    }

    fn literal(&mut self) -> Result<Literal> {
        match self.current().clone() {
            Token::IntegerLiteral(n) => {
                self.advance();
                Ok(Literal::Int(n))
            }
            Token::StringLiteral(s) => {
                self.advance();
                Ok(Literal::Text(s))
            }
            Token::Eof => Err(Error::UnexpectedEof("literal value".to_string())),
            token => Err(Error::UnexpectedToken {
                expected: "literal value".to_string(),
                found: token.to_string(),
            }),
        }
    }
}
