//! Multi-column sort resolution.
//!
//! Turns a user-controlled, comma-separated sort string plus a caller-declared
//! default ordering into a deterministic, duplicate-free directive list. The
//! resolver only manipulates strings and positions: column identifiers are not
//! validated here and must come from a trusted source before reaching SQL.

/// One resolved sort instruction. Position in a directive list determines
/// `ORDER BY` precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

impl OrderBy {
    /// Parse a single token: a leading `-` means descending and is stripped
    /// from the column name.
    pub fn parse(token: &str) -> Self {
        match token.strip_prefix('-') {
            Some(column) => OrderBy {
                column: column.to_string(),
                descending: true,
            },
            None => OrderBy {
                column: token.to_string(),
                descending: false,
            },
        }
    }
}

/// Resolve a user sort string against caller defaults.
///
/// User tokens come first, in their original order and direction. Defaults
/// are comma-joined, re-split, and appended afterwards, skipping any entry
/// whose bare column name (leading `-` stripped) was already consumed from
/// the user string; the user's direction wins regardless of the default's.
///
/// There is no error path. An empty `order` contributes zero tokens and the
/// defaults pass through unmodified; empty tokens from consecutive commas
/// become zero-length column names and are left for the backend to reject.
pub fn resolve(order: &str, defaults: &[&str]) -> Vec<OrderBy> {
    let joined = defaults.join(",");
    let mut pending = tokens(&joined);

    let mut resolved = Vec::new();
    for token in tokens(order) {
        resolved.push(OrderBy::parse(token));

        if !pending.is_empty() {
            let bare = bare_name(token);
            pending.retain(|d| bare != bare_name(d));
        }
    }

    for token in pending {
        resolved.push(OrderBy::parse(token));
    }
    resolved
}

/// Render directives as the body of a SQL `ORDER BY` clause, e.g.
/// `name, time DESC`. Identifiers are emitted verbatim.
pub fn sql_clause(directives: &[OrderBy]) -> String {
    let parts: Vec<String> = directives
        .iter()
        .map(|d| {
            if d.descending {
                format!("{} DESC", d.column)
            } else {
                d.column.clone()
            }
        })
        .collect();
    parts.join(", ")
}

fn bare_name(token: &str) -> &str {
    token.strip_prefix('-').unwrap_or(token)
}

fn tokens(s: &str) -> Vec<&str> {
    if s.is_empty() {
        Vec::new()
    } else {
        s.split(',').collect()
    }
}
