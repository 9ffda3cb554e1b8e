use dmw_validator::{
    ddl::{ColumnDef, parse_ddl, parse_ddl_bytes, split_top_level},
    values::Nullability,
};
use proptest::prelude::*;

fn column(schema: &dmw_validator::ddl::TableSchema, table: &str, column: &str) -> ColumnDef {
    schema
        .column(table, column)
        .unwrap_or_else(|| panic!("{table}.{column} missing"))
        .clone()
}

#[test]
fn simple_table_round_trip() {
    let schema = parse_ddl("CREATE TABLE T (A INT NOT NULL, B VARCHAR(50) NULL);");
    assert_eq!(schema.table_count(), 1);
    assert_eq!(column(&schema, "T", "A"), ColumnDef::new("INT", Nullability::NotNull));
    assert_eq!(column(&schema, "T", "B"), ColumnDef::new("VARCHAR(50)", Nullability::Null));
}

#[test]
fn sql_server_script_with_constraints() {
    let sql = r#"
        /****** Object: Table [dbo].[Customer] ******/
        SET ANSI_NULLS ON
        GO
        CREATE TABLE [dbo].[Customer](
            [CustomerId] [int] IDENTITY(1,1) NOT NULL,
            [Name] [nvarchar](100) COLLATE SQL_Latin1_General_CP1_CI_AS NULL,
            [Balance] [decimal](12, 3) NOT NULL DEFAULT ((0)),
            [Code] CHAR(3) NULL CHECK (Code IS NOT NULL OR Code = 'X,Y'),
            [FullName] AS ([Name] + ' ' + [Code]),
            [ValidFrom] DATETIME2 GENERATED ALWAYS AS ROW START NOT NULL,
            [ValidTo] DATETIME2 GENERATED ALWAYS AS ROW END NOT NULL,
            CONSTRAINT [PK_Customer] PRIMARY KEY CLUSTERED ([CustomerId] ASC)
                WITH (PAD_INDEX = OFF, STATISTICS_NORECOMPUTE = OFF),
            PERIOD FOR SYSTEM_TIME ([ValidFrom], [ValidTo]),
        ) ON [PRIMARY]
        GO
    "#;
    let schema = parse_ddl(sql);
    let customer = schema.table("CUSTOMER").expect("customer table");
    let names: Vec<&str> = customer.keys().map(String::as_str).collect();
    assert_eq!(names, ["BALANCE", "CODE", "CUSTOMERID", "NAME", "VALIDFROM", "VALIDTO"]);
    assert_eq!(column(&schema, "CUSTOMER", "CUSTOMERID"), ColumnDef::new("INT", Nullability::NotNull));
    assert_eq!(column(&schema, "CUSTOMER", "NAME"), ColumnDef::new("NVARCHAR(100)", Nullability::Null));
    assert_eq!(column(&schema, "CUSTOMER", "BALANCE"), ColumnDef::new("DECIMAL(12,3)", Nullability::NotNull));
    assert_eq!(column(&schema, "CUSTOMER", "CODE"), ColumnDef::new("CHAR(3)", Nullability::Null));
}

#[test]
fn multiple_tables_comments_and_missing_semicolons() {
    let sql = "
        -- CREATE TABLE Ghost (X INT);
        create table sales.orders (
            order_id bigint not null, -- surrogate, (internal)
            amount numeric(10,2),
            note varchar(max) null
        )
        CREATE TABLE IF NOT EXISTS `audit_log` (`id` INT NOT NULL, `payload` TEXT)
    ";
    let schema = parse_ddl(sql);
    assert!(!schema.contains_table("GHOST"));
    assert_eq!(schema.table_count(), 2);
    assert_eq!(column(&schema, "ORDERS", "ORDER_ID"), ColumnDef::new("BIGINT", Nullability::NotNull));
    assert_eq!(
        column(&schema, "ORDERS", "AMOUNT"),
        ColumnDef::new("NUMERIC(10,2)", Nullability::Unspecified)
    );
    assert_eq!(column(&schema, "ORDERS", "NOTE"), ColumnDef::new("VARCHAR(MAX)", Nullability::Null));
    assert_eq!(column(&schema, "AUDIT_LOG", "PAYLOAD"), ColumnDef::new("TEXT", Nullability::Unspecified));
}

#[test]
fn multi_word_types() {
    let schema = parse_ddl(
        "CREATE TABLE m (a DOUBLE PRECISION NOT NULL, b CHARACTER VARYING(20), c TIMESTAMP WITH TIME ZONE NULL)",
    );
    assert_eq!(column(&schema, "M", "A").data_type, "DOUBLE PRECISION");
    assert_eq!(column(&schema, "M", "B").data_type, "CHARACTER VARYING(20)");
    assert_eq!(column(&schema, "M", "C"), ColumnDef::new("TIMESTAMP WITH TIME ZONE", Nullability::Null));
}

#[test]
fn irregular_clauses_are_dropped_not_fatal() {
    let schema = parse_ddl("CREATE TABLE T (A INT,, 'junk', B DATE NOT NULL, ) ; CREATE TABLE U (");
    assert_eq!(column(&schema, "T", "B"), ColumnDef::new("DATE", Nullability::NotNull));
    assert!(schema.table("T").expect("T").len() == 2);
    assert!(schema.table("U").expect("U").is_empty());
}

#[test]
fn later_definition_replaces_earlier() {
    let schema = parse_ddl("CREATE TABLE T (A INT); CREATE TABLE dbo.T (B INT);");
    let names: Vec<&String> = schema.table("T").expect("T").keys().collect();
    assert_eq!(names, ["B"]);
}

#[test]
fn utf16_bytes_are_decoded() {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "CREATE TABLE [X] ([Y] NVARCHAR(10) NOT NULL)".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let schema = parse_ddl_bytes(&bytes);
    assert_eq!(column(&schema, "X", "Y"), ColumnDef::new("NVARCHAR(10)", Nullability::NotNull));
}

#[test]
fn depth_aware_split() {
    let parts = split_top_level("A DECIMAL(12,3), B CHAR(1) DEFAULT 'a,b', C INT");
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[1].trim(), "B CHAR(1) DEFAULT 'a,b'");
}

#[test]
fn bracketed_names_with_quotes_and_commas() {
    let schema = parse_ddl(
        "CREATE TABLE [dbo].[Person] ([O'Brien Id] INT NOT NULL, [Name, Full] NVARCHAR(50) NULL, \
         [Notes -- free text] VARCHAR(200)) GO",
    );
    assert_eq!(schema.table("PERSON").map(|t| t.len()), Some(3));
    assert_eq!(column(&schema, "PERSON", "O'BRIEN ID"), ColumnDef::new("INT", Nullability::NotNull));
    assert_eq!(
        column(&schema, "PERSON", "NAME, FULL"),
        ColumnDef::new("NVARCHAR(50)", Nullability::Null)
    );
    assert_eq!(
        column(&schema, "PERSON", "NOTES -- FREE TEXT").effective_nullability(),
        Nullability::Null
    );
}

proptest! {
    #[test]
    fn parser_never_panics(text in ".{0,200}") {
        let _ = parse_ddl(&text);
        let _ = parse_ddl_bytes(text.as_bytes());
    }

    #[test]
    fn identifiers_normalize_regardless_of_case_and_quoting(
        table in "[A-Za-z][A-Za-z0-9_]{0,10}",
        column in "[A-Za-z][A-Za-z0-9_]{0,10}",
        bracketed in any::<bool>(),
        width in 1u32..4000,
    ) {
        let reserved = ["KEY", "CHECK", "INDEX", "WITH", "UNIQUE", "CONSTRAINT", "FULLTEXT", "SPATIAL"];
        prop_assume!(!reserved.contains(&column.to_uppercase().as_str()));
        let quote = |name: &str| if bracketed { format!("[{name}]") } else { name.to_string() };
        let sql = format!(
            "CREATE TABLE {}.{} ({} varchar({width}) not null)",
            quote("dbo"),
            quote(&table),
            quote(&column)
        );
        let schema = parse_ddl(&sql);
        let def = schema.column(&table.to_uppercase(), &column.to_uppercase());
        prop_assert_eq!(def, Some(&ColumnDef::new(format!("VARCHAR({width})"), Nullability::NotNull)));
    }
}
