//! Lexical helpers for recognising transaction-control statements in SQL text.
//!
//! The scanner skips quoted strings, quoted identifiers, comments and dollar-quoted
//! bodies, so a `;` or `COMMIT` inside a function body does not count.

mod parsers;
mod scanner;

use parsers::{
    continues_identifier, is_block_comment_end, is_block_comment_start, is_line_comment_start,
    matches_tag, try_start_dollar_quote,
};
use scanner::{State, Token, scan_quoted, scan_word};

/// What a single statement does to the transaction state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// `BEGIN` / `START TRANSACTION`
    Begin,
    /// `COMMIT` / `END`
    Commit,
    /// `ROLLBACK` / `ABORT`
    Rollback,
    /// `SAVEPOINT name`
    Savepoint(String),
    /// `RELEASE [SAVEPOINT] name`
    Release(String),
    /// `ROLLBACK TO [SAVEPOINT] name`
    RollbackTo(String),
    /// Anything else.
    Other,
}

/// Split SQL text into its top-level statements, trimmed, empties dropped.
#[must_use]
pub fn split_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut state = State::Normal;
    let mut start = 0;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b';' => {
                    push_statement(&mut statements, &sql[start..idx]);
                    start = idx + 1;
                }
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' if !continues_identifier(bytes, idx) => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }
        idx += 1;
    }

    push_statement(&mut statements, &sql[start..]);
    statements
}

fn push_statement<'a>(statements: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed);
    }
}

/// Up to `limit` leading words / quoted identifiers of `statement`, skipping comments.
fn leading_tokens(statement: &str, limit: usize) -> Vec<Token> {
    let bytes = statement.as_bytes();
    let mut tokens = Vec::with_capacity(limit);
    let mut idx = 0;

    while idx < bytes.len() && tokens.len() < limit {
        let b = bytes[idx];
        if b.is_ascii_whitespace() {
            idx += 1;
        } else if is_line_comment_start(bytes, idx) {
            while idx < bytes.len() && bytes[idx] != b'\n' {
                idx += 1;
            }
        } else if is_block_comment_start(bytes, idx) {
            let mut depth = 1u32;
            idx += 2;
            while idx < bytes.len() && depth > 0 {
                if is_block_comment_start(bytes, idx) {
                    depth += 1;
                    idx += 2;
                } else if is_block_comment_end(bytes, idx) {
                    depth -= 1;
                    idx += 2;
                } else {
                    idx += 1;
                }
            }
        } else if let Some((next, token)) =
            scan_word(bytes, idx).or_else(|| scan_quoted(bytes, idx))
        {
            tokens.push(token);
            idx = next;
        } else {
            break;
        }
    }

    tokens
}

/// Classify one statement (as produced by [`split_statements`]).
#[must_use]
pub fn classify(statement: &str) -> StatementKind {
    let mut tokens = leading_tokens(statement, 5).into_iter().peekable();
    let Some(first) = tokens.next() else {
        return StatementKind::Other;
    };
    let next_is = |tokens: &mut std::iter::Peekable<std::vec::IntoIter<Token>>, kw: &str| {
        tokens.next_if(|t| t.is_keyword(kw)).is_some()
    };

    match &first {
        Token::Word(w) if w == "begin" => StatementKind::Begin,
        Token::Word(w) if w == "start" => {
            if next_is(&mut tokens, "transaction") {
                StatementKind::Begin
            } else {
                StatementKind::Other
            }
        }
        Token::Word(w) if w == "commit" || w == "end" => {
            if next_is(&mut tokens, "prepared") {
                StatementKind::Other
            } else {
                StatementKind::Commit
            }
        }
        Token::Word(w) if w == "abort" => StatementKind::Rollback,
        Token::Word(w) if w == "rollback" => {
            if next_is(&mut tokens, "prepared") {
                return StatementKind::Other;
            }
            let _ = next_is(&mut tokens, "work") || next_is(&mut tokens, "transaction");
            if next_is(&mut tokens, "to") {
                let _ = next_is(&mut tokens, "savepoint");
                tokens
                    .next()
                    .map_or(StatementKind::Other, |name| {
                        StatementKind::RollbackTo(name.into_name())
                    })
            } else {
                StatementKind::Rollback
            }
        }
        Token::Word(w) if w == "savepoint" => tokens
            .next()
            .map_or(StatementKind::Other, |name| {
                StatementKind::Savepoint(name.into_name())
            }),
        Token::Word(w) if w == "release" => {
            let _ = next_is(&mut tokens, "savepoint");
            tokens
                .next()
                .map_or(StatementKind::Other, |name| StatementKind::Release(name.into_name()))
        }
        _ => StatementKind::Other,
    }
}

/// Classify every statement in `sql`, in order.
#[must_use]
pub fn classify_all(sql: &str) -> Vec<StatementKind> {
    split_statements(sql).into_iter().map(classify).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_top_level_semicolons_only() {
        let sql =
            "CREATE TABLE t (a text default ';'); -- ; here\nINSERT INTO \"x;y\" VALUES (1);;";
        assert_eq!(
            split_statements(sql),
            vec![
                "CREATE TABLE t (a text default ';')",
                "-- ; here\nINSERT INTO \"x;y\" VALUES (1)"
            ]
        );
    }

    #[test]
    fn dollar_quoted_bodies_are_opaque() {
        let sql = "CREATE FUNCTION f() RETURNS void AS $body$ BEGIN; COMMIT; END $body$ \
                   LANGUAGE plpgsql; SELECT $1";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1], "SELECT $1");
        assert_eq!(classify(statements[0]), StatementKind::Other);
    }

    #[test]
    fn nested_block_comments() {
        let sql = "/* outer /* inner; */ still; */ COMMIT";
        assert_eq!(classify_all(sql), vec![StatementKind::Commit]);
    }

    #[test]
    fn transaction_control_keywords() {
        assert_eq!(classify("begin"), StatementKind::Begin);
        assert_eq!(
            classify("START TRANSACTION ISOLATION LEVEL SERIALIZABLE"),
            StatementKind::Begin
        );
        assert_eq!(classify("END"), StatementKind::Commit);
        assert_eq!(classify("COMMIT PREPARED 'x'"), StatementKind::Other);
        assert_eq!(classify("ABORT"), StatementKind::Rollback);
        assert_eq!(classify("ROLLBACK WORK"), StatementKind::Rollback);
        assert_eq!(classify("select 1"), StatementKind::Other);
    }

    #[test]
    fn savepoint_names_keep_quoting_rules() {
        assert_eq!(
            classify("SAVEPOINT \"Ab\"\"c\""),
            StatementKind::Savepoint("Ab\"c".into())
        );
        assert_eq!(classify("savepoint MySp"), StatementKind::Savepoint("mysp".into()));
        assert_eq!(
            classify("RELEASE SAVEPOINT \"sp_1\""),
            StatementKind::Release("sp_1".into())
        );
        assert_eq!(classify("RELEASE sp_2"), StatementKind::Release("sp_2".into()));
        assert_eq!(
            classify("ROLLBACK TO \"sp_1\""),
            StatementKind::RollbackTo("sp_1".into())
        );
        assert_eq!(
            classify("ROLLBACK TRANSACTION TO SAVEPOINT sp_3"),
            StatementKind::RollbackTo("sp_3".into())
        );
    }

    #[test]
    fn dollar_inside_an_identifier_is_not_a_quote() {
        let sql = "UPDATE a$b$c SET x = 1; COMMIT";
        assert_eq!(split_statements(sql), vec!["UPDATE a$b$c SET x = 1", "COMMIT"]);
        assert_eq!(classify_all(sql).last(), Some(&StatementKind::Commit));

        let body = "CREATE FUNCTION f() RETURNS int AS $fn$ SELECT 1; $fn$ LANGUAGE sql; COMMIT";
        assert_eq!(split_statements(body).len(), 2);
    }
}
