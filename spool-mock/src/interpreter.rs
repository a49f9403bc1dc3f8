use spool_core::{Error, Result};

/// The handful of statements the mock database understands without a script.
/// Keywords are case-insensitive, identifiers are exact.
#[derive(Debug, PartialEq)]
pub(crate) enum Statement<'a> {
    CreateTable {
        table: &'a str,
        /// Column name and whether it is an identity column.
        columns: Vec<(&'a str, bool)>,
    },
    DropTable {
        table: &'a str,
        if_exists: bool,
    },
    Delete {
        table: &'a str,
    },
    /// Values come from the input parameters, matched by name.
    Insert {
        table: &'a str,
    },
    Select {
        table: &'a str,
        projection: Projection<'a>,
    },
}

#[derive(Debug, PartialEq)]
pub(crate) enum Projection<'a> {
    All,
    Count,
    Columns(Vec<&'a str>),
}

fn unsupported(sql: &str) -> Error {
    Error::msg(format!("The mock database does not understand `{}`", sql))
}

fn keyword(token: Option<&str>, expected: &str) -> bool {
    token.is_some_and(|v| v.eq_ignore_ascii_case(expected))
}

pub(crate) fn parse(sql: &str) -> Result<Statement<'_>> {
    let sql = sql.trim().trim_end_matches(';').trim_end();
    let tokens = sql.split_whitespace().collect::<Vec<_>>();
    let token = |i: usize| tokens.get(i).copied();
    let name = |i: usize| {
        token(i)
            .map(|v| v.split('(').next().unwrap_or(v))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| unsupported(sql))
    };
    if keyword(token(0), "CREATE") && keyword(token(1), "TABLE") {
        let (Some(open), Some(close)) = (sql.find('('), sql.rfind(')')) else {
            return Err(unsupported(sql));
        };
        let table = sql[..open]
            .split_whitespace()
            .nth(2)
            .ok_or_else(|| unsupported(sql))?;
        let columns = sql[open + 1..close]
            .split(',')
            .filter_map(|definition| {
                let mut parts = definition.split_whitespace();
                let column = parts.next()?;
                Some((column, parts.any(|v| v.eq_ignore_ascii_case("IDENTITY"))))
            })
            .collect::<Vec<_>>();
        if columns.is_empty() {
            return Err(unsupported(sql));
        }
        Ok(Statement::CreateTable { table, columns })
    } else if keyword(token(0), "DROP") && keyword(token(1), "TABLE") {
        if keyword(token(2), "IF") && keyword(token(3), "EXISTS") {
            Ok(Statement::DropTable {
                table: name(4)?,
                if_exists: true,
            })
        } else {
            Ok(Statement::DropTable {
                table: name(2)?,
                if_exists: false,
            })
        }
    } else if keyword(token(0), "DELETE") && keyword(token(1), "FROM") {
        Ok(Statement::Delete { table: name(2)? })
    } else if keyword(token(0), "INSERT") && keyword(token(1), "INTO") {
        Ok(Statement::Insert { table: name(2)? })
    } else if keyword(token(0), "SELECT") {
        let Some(from) = tokens.iter().position(|v| v.eq_ignore_ascii_case("FROM")) else {
            return Err(unsupported(sql));
        };
        let projection = tokens[1..from].join(" ");
        let projection = if projection == "*" {
            Projection::All
        } else if projection.eq_ignore_ascii_case("COUNT(*)") {
            Projection::Count
        } else {
            let start = sql.find(tokens[0]).unwrap_or_default() + tokens[0].len();
            let end = start + sql[start..].find(tokens[from]).unwrap_or_default();
            let columns = sql[start..end]
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>();
            if columns.is_empty() {
                return Err(unsupported(sql));
            }
            Projection::Columns(columns)
        };
        Ok(Statement::Select {
            table: name(from + 1)?,
            projection,
        })
    } else {
        Err(unsupported(sql))
    }
}
