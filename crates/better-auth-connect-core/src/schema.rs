// Schema template for the better-auth tables the connect routes read and write.
//
// Columns are declared with their logical camelCase names and rendered as
// PostgreSQL DDL with snake_case physical names.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Boolean,
    Timestamp,
}

impl ColumnType {
    fn sql(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub not_null: bool,
    /// Raw SQL default expression.
    pub default: Option<&'static str>,
    /// Referenced `table.id`, deleted in cascade.
    pub references: Option<&'static str>,
}

impl Column {
    const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            primary_key: false,
            not_null: false,
            default: None,
            references: None,
        }
    }

    const fn id() -> Self {
        let mut col = Self::new("id", ColumnType::Text);
        col.primary_key = true;
        col
    }

    const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnType::Text)
    }

    const fn timestamp(name: &'static str) -> Self {
        Self::new(name, ColumnType::Timestamp)
    }

    const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    const fn default_now(mut self) -> Self {
        self.default = Some("now()");
        self
    }

    const fn references(mut self, table: &'static str) -> Self {
        self.references = Some(table);
        self
    }

    pub fn column_name(&self) -> String {
        to_snake_case(self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: &'static str,
    pub unique: bool,
    pub columns: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        let _ = writeln!(sql, "CREATE TABLE IF NOT EXISTS \"{}\" (", self.name);
        let defs: Vec<String> = self.columns.iter().map(column_sql).collect();
        let _ = writeln!(sql, "  {}", defs.join(",\n  "));
        sql.push_str(");\n");

        for index in &self.indexes {
            let cols: Vec<String> = index
                .columns
                .iter()
                .map(|c| format!("\"{}\"", to_snake_case(c)))
                .collect();
            let _ = writeln!(
                sql,
                "CREATE {}INDEX IF NOT EXISTS \"{}\" ON \"{}\" ({});",
                if index.unique { "UNIQUE " } else { "" },
                index.name,
                self.name,
                cols.join(", ")
            );
        }
        sql
    }
}

fn column_sql(col: &Column) -> String {
    let mut def = format!("\"{}\" {}", col.column_name(), col.column_type.sql());
    if col.primary_key {
        def.push_str(" PRIMARY KEY");
    }
    if col.not_null {
        def.push_str(" NOT NULL");
    }
    if let Some(default) = col.default {
        let _ = write!(def, " DEFAULT {default}");
    }
    if let Some(table) = col.references {
        let _ = write!(def, " REFERENCES \"{table}\"(\"id\") ON DELETE CASCADE");
    }
    def
}

/// `userId` -> `user_id`, `accessTokenExpiresAt` -> `access_token_expires_at`.
pub fn to_snake_case(s: &str) -> String {
    static RE: LazyLock<Option<Regex>> =
        LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").ok());
    match RE.as_ref() {
        Some(re) => re.replace_all(s, "${1}_${2}").to_lowercase(),
        None => s.to_lowercase(),
    }
}

fn timestamps() -> [Column; 2] {
    [
        Column::timestamp("createdAt").not_null().default_now(),
        Column::timestamp("updatedAt").not_null().default_now(),
    ]
}

pub fn user_table() -> Table {
    let mut email_verified = Column::new("emailVerified", ColumnType::Boolean).not_null();
    email_verified.default = Some("false");
    let mut columns = vec![
        Column::id(),
        Column::text("name"),
        Column::text("email"),
        email_verified,
        Column::text("image"),
    ];
    columns.extend(timestamps());
    Table {
        name: "user",
        columns,
        indexes: vec![Index { name: "user_email_unique", unique: true, columns: &["email"] }],
    }
}

pub fn account_table() -> Table {
    let mut columns = vec![
        Column::id(),
        Column::text("userId").not_null().references("user"),
        Column::text("providerId").not_null(),
        Column::text("accountId").not_null(),
        Column::text("accessToken"),
        Column::text("refreshToken"),
        Column::text("idToken"),
        Column::timestamp("accessTokenExpiresAt"),
        Column::timestamp("refreshTokenExpiresAt"),
        Column::text("scope"),
    ];
    columns.extend(timestamps());
    Table {
        name: "account",
        columns,
        indexes: vec![
            Index {
                name: "account_user_provider_unique",
                unique: true,
                columns: &["userId", "providerId", "accountId"],
            },
            Index { name: "account_provider_idx", unique: false, columns: &["providerId"] },
        ],
    }
}

pub fn session_table() -> Table {
    let mut columns = vec![
        Column::id(),
        Column::text("userId").not_null().references("user"),
        Column::text("token").not_null(),
        Column::timestamp("expiresAt").not_null(),
        Column::text("ipAddress"),
        Column::text("userAgent"),
    ];
    columns.extend(timestamps());
    Table {
        name: "session",
        columns,
        indexes: vec![
            Index { name: "session_token_unique", unique: true, columns: &["token"] },
            Index { name: "session_user_idx", unique: false, columns: &["userId"] },
        ],
    }
}

pub fn verification_table() -> Table {
    let mut columns = vec![
        Column::id(),
        Column::text("identifier").not_null(),
        Column::text("token"),
        Column::text("value").not_null(),
        Column::timestamp("expiresAt").not_null(),
    ];
    columns.extend(timestamps());
    Table {
        name: "verification",
        columns,
        indexes: vec![
            Index { name: "verification_identifier_idx", unique: false, columns: &["identifier"] },
            Index { name: "verification_token_unique", unique: true, columns: &["token"] },
        ],
    }
}

/// All tables in creation order (referenced tables first).
pub fn tables() -> Vec<Table> {
    vec![user_table(), account_table(), session_table(), verification_table()]
}

/// Full DDL script for every table.
pub fn to_sql() -> String {
    tables().iter().map(Table::to_sql).collect::<Vec<_>>().join("\n")
}
