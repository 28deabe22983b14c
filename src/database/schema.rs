//! Explicit table descriptions for the persisted entities.
//!
//! The PostgreSQL adapter renders these into DDL at migration time; the
//! in-memory adapter does not need them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Uuid,
    VarChar(u32),
    Text,
    Boolean,
    Timestamp,
}

impl ColumnType {
    pub fn pg_type(&self) -> String {
        match self {
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::VarChar(len) => format!("VARCHAR({})", len),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Timestamp => "TIMESTAMPTZ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
    /// SQL default expression
    pub default: Option<&'static str>,
    pub references: Option<ForeignKey>,
    pub primary_key: bool,
    pub unique: bool,
}

impl ColumnDef {
    const fn required(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: false,
            default: None,
            references: None,
            primary_key: false,
            unique: false,
        }
    }

    const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    const fn default(mut self, expr: &'static str) -> Self {
        self.default = Some(expr);
        self
    }

    const fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some(ForeignKey { table, column });
        self
    }

    const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("\"{}\" {}", self.name, self.column_type.pg_type());
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(default) = self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if let Some(fk) = self.references {
            sql.push_str(&format!(
                " REFERENCES \"{}\" (\"{}\") ON DELETE CASCADE",
                fk.table, fk.column
            ));
        }
        sql
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    /// Column lists to index, each rendered as one btree index.
    pub indexes: &'static [&'static [&'static str]],
}

impl TableDef {
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| format!("    {}", c.to_sql())).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (\n{}\n)",
            self.name,
            columns.join(",\n")
        )
    }

    pub fn create_index_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|cols| {
                let quoted: Vec<String> = cols.iter().map(|c| format!("\"{}\"", c)).collect();
                format!(
                    "CREATE INDEX IF NOT EXISTS \"idx_{}_{}\" ON \"{}\" ({})",
                    self.name,
                    cols.join("_"),
                    self.name,
                    quoted.join(", ")
                )
            })
            .collect()
    }

    /// Comma separated column list for SELECT/RETURNING clauses.
    pub fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("\"{}\"", c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

pub const TITLE_MAX_LENGTH: u32 = 200;

pub const USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        ColumnDef::required("id", ColumnType::Uuid).primary_key(),
        ColumnDef::required("username", ColumnType::VarChar(150)).unique(),
        ColumnDef::required("password_hash", ColumnType::Text),
        ColumnDef::required("created_at", ColumnType::Timestamp).default("NOW()"),
    ],
    indexes: &[],
};

pub const TODOS: TableDef = TableDef {
    name: "todos",
    columns: &[
        ColumnDef::required("id", ColumnType::Uuid).primary_key(),
        ColumnDef::required("owner", ColumnType::Uuid).references("users", "id"),
        ColumnDef::required("title", ColumnType::VarChar(TITLE_MAX_LENGTH)),
        ColumnDef::required("description", ColumnType::Text),
        ColumnDef::required("completed", ColumnType::Boolean).default("FALSE"),
        ColumnDef::required("is_deleted", ColumnType::Boolean).default("FALSE"),
        ColumnDef::required("created_at", ColumnType::Timestamp).default("NOW()"),
        ColumnDef::required("updated_at", ColumnType::Timestamp).default("NOW()"),
        ColumnDef::required("created_by", ColumnType::Uuid)
            .nullable()
            .references("users", "id"),
        ColumnDef::required("updated_by", ColumnType::Uuid)
            .nullable()
            .references("users", "id"),
    ],
    indexes: &[&["owner", "is_deleted", "created_at"]],
};

/// Tables in dependency order.
pub const TABLES: &[TableDef] = &[USERS, TODOS];
