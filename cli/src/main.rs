mod render;
mod shell;

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use dbkeeper_core::{UndoRecord, Value};
use dbkeeper_sqlite::{ColumnDef, QueryOutcome, Session};
use dbkeeper_transfer::ManagerConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::render::{current_values, parse_assignments, render_details, render_row_set};
use crate::shell::{Shell, render_outcome};

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for row listings.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Table,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "dbkeeper", version = PACKAGE_VERSION)]
#[command(about = "Browse and edit SQLite database files")]
struct Cli {
    /// Database file. Falls back to `default_database` from the config file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new, empty database file.
    New(NewArgs),
    /// List tables.
    Tables,
    /// Create a table from column definitions.
    CreateTable(CreateTableArgs),
    /// Drop a table.
    DropTable(TableArgs),
    /// Rename a table.
    RenameTable(RenameTableArgs),
    /// Drop every table in the database.
    DropAll(DropAllArgs),
    /// Show a table's columns.
    Describe(TableArgs),
    /// Count a table's rows.
    Count(TableArgs),
    /// Show a table's rows.
    Rows(RowsArgs),
    /// Show one row by primary key.
    Row(RowArgs),
    /// Insert a row from column=value pairs.
    Insert(InsertArgs),
    /// Update a row from column=value pairs.
    Update(UpdateArgs),
    /// Delete rows by primary key.
    Delete(DeleteArgs),
    /// Run one SQL statement.
    Query(QueryArgs),
    /// Run a SQL script file.
    Script(FileArgs),
    /// Import CSV records into a table (the first line is a header).
    ImportCsv(TableFileArgs),
    /// Import a JSON array of objects into a table.
    ImportJson(TableFileArgs),
    /// Export a table as CSV.
    ExportCsv(TableFileArgs),
    /// Write the schema of every table to a text file.
    ExportSchema(FileArgs),
    /// Copy the database to a new file.
    Backup(FileArgs),
    /// Show database path, size and table count.
    Summary,
    /// Insert generated sample rows.
    Sample(SampleArgs),
    /// Read commands from stdin against one open session (supports undo).
    Shell,
}

#[derive(Debug, Args)]
struct NewArgs {
    /// Path of the database file to create.
    path: PathBuf,
}

#[derive(Debug, Args)]
struct TableArgs {
    table: String,
}

#[derive(Debug, Args)]
struct CreateTableArgs {
    table: String,
    /// Column definition such as "id INTEGER PRIMARY KEY". Repeatable.
    #[arg(long = "column", required = true)]
    columns: Vec<String>,
}

#[derive(Debug, Args)]
struct RenameTableArgs {
    table: String,
    new_name: String,
}

#[derive(Debug, Args)]
struct DropAllArgs {
    /// Confirm dropping every table.
    #[arg(long)]
    yes: bool,
}

#[derive(Debug, Args)]
struct RowsArgs {
    table: String,
    /// Only rows where some cell contains this text (case-insensitive).
    #[arg(long)]
    filter: Option<String>,
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct RowArgs {
    table: String,
    key: String,
}

#[derive(Debug, Args)]
struct InsertArgs {
    table: String,
    /// column=value pairs; NULL is a null, anything else is text.
    assignments: Vec<String>,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    table: String,
    key: String,
    #[arg(required = true)]
    assignments: Vec<String>,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    table: String,
    #[arg(required = true)]
    keys: Vec<String>,
}

#[derive(Debug, Args)]
struct QueryArgs {
    sql: String,
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct FileArgs {
    path: PathBuf,
}

#[derive(Debug, Args)]
struct TableFileArgs {
    table: String,
    path: PathBuf,
}

#[derive(Debug, Args)]
struct SampleArgs {
    table: String,
    /// Number of rows to generate.
    #[arg(long, default_value_t = 1)]
    count: usize,
}

fn main() {
    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| {
        init_tracing(&config, cli.verbose);
        run(cli.command, cli.db, &config)
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<ManagerConfig, String> {
    match path {
        Some(path) => ManagerConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display())),
        None => Ok(ManagerConfig::default()),
    }
}

fn init_tracing(config: &ManagerConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command, db: Option<PathBuf>, config: &ManagerConfig) -> Result<(), String> {
    let open = || open_session(db.clone(), config);

    match command {
        Command::New(args) => run_new(args),
        Command::Tables => run_tables(&open()?),
        Command::CreateTable(args) => run_create_table(&mut open()?, args),
        Command::DropTable(args) => run_drop_table(&mut open()?, args),
        Command::RenameTable(args) => run_rename_table(&mut open()?, args),
        Command::DropAll(args) => run_drop_all(&mut open()?, args),
        Command::Describe(args) => run_describe(&open()?, args),
        Command::Count(args) => run_count(&open()?, args),
        Command::Rows(args) => run_rows(&open()?, args),
        Command::Row(args) => run_row(&open()?, args),
        Command::Insert(args) => run_insert(&mut open()?, args),
        Command::Update(args) => run_update(&mut open()?, args),
        Command::Delete(args) => run_delete(&mut open()?, args),
        Command::Query(args) => run_query(&mut open()?, args),
        Command::Script(args) => run_script(&mut open()?, args),
        Command::ImportCsv(args) => run_import_csv(&mut open()?, args),
        Command::ImportJson(args) => run_import_json(&mut open()?, args),
        Command::ExportCsv(args) => run_export_csv(&mut open()?, args),
        Command::ExportSchema(args) => run_export_schema(&mut open()?, args),
        Command::Backup(args) => run_backup(&mut open()?, args),
        Command::Summary => run_summary(&open()?),
        Command::Sample(args) => run_sample(&mut open()?, args),
        Command::Shell => run_shell(open()?),
    }
}

fn open_session(db: Option<PathBuf>, config: &ManagerConfig) -> Result<Session, String> {
    let path = db.or_else(|| config.default_database.clone()).ok_or_else(|| {
        "no database given; pass --db <path> or set default_database in the config file"
            .to_string()
    })?;
    debug!(path = %path.display(), "opening database");
    let mut session = Session::open(&path)
        .map_err(|e| format!("Failed to open database '{}': {e}", path.display()))?;
    session.apply_config(config);
    Ok(session)
}

fn run_new(args: NewArgs) -> Result<(), String> {
    Session::create(&args.path)
        .map_err(|e| format!("Failed to create database: {e}"))?;
    println!("Created database '{}'.", args.path.display());
    Ok(())
}

fn run_tables(session: &Session) -> Result<(), String> {
    let tables = session
        .tables()
        .map_err(|e| format!("Failed to list tables: {e}"))?;
    for table in tables {
        println!("{table}");
    }
    Ok(())
}

fn run_create_table(session: &mut Session, args: CreateTableArgs) -> Result<(), String> {
    let columns = args
        .columns
        .iter()
        .map(|c| ColumnDef::parse(c))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("Invalid column definition: {e}"))?;
    session
        .create_table(&args.table, &columns)
        .map_err(|e| format!("Failed to create table '{}': {e}", args.table))?;
    println!("Created table '{}' with {} column(s).", args.table, columns.len());
    Ok(())
}

fn run_drop_table(session: &mut Session, args: TableArgs) -> Result<(), String> {
    session
        .drop_table(&args.table)
        .map_err(|e| format!("Failed to drop table '{}': {e}", args.table))?;
    println!("Dropped table '{}'.", args.table);
    Ok(())
}

fn run_rename_table(session: &mut Session, args: RenameTableArgs) -> Result<(), String> {
    session
        .rename_table(&args.table, &args.new_name)
        .map_err(|e| format!("Failed to rename table '{}': {e}", args.table))?;
    println!("Renamed table '{}' to '{}'.", args.table, args.new_name);
    Ok(())
}

fn run_drop_all(session: &mut Session, args: DropAllArgs) -> Result<(), String> {
    if !args.yes {
        return Err("refusing to drop every table without --yes".to_string());
    }
    let dropped = session
        .drop_all_tables()
        .map_err(|e| format!("Failed to drop tables: {e}"))?;
    println!("Dropped {} table(s).", dropped.len());
    Ok(())
}

fn run_describe(session: &Session, args: TableArgs) -> Result<(), String> {
    let columns = session
        .describe(&args.table)
        .map_err(|e| format!("Failed to describe '{}': {e}", args.table))?;
    print!(
        "{}",
        dbkeeper_transfer::render_table_schema(&args.table, &columns)
    );
    Ok(())
}

fn run_count(session: &Session, args: TableArgs) -> Result<(), String> {
    let count = session
        .row_count(&args.table)
        .map_err(|e| format!("Failed to count rows of '{}': {e}", args.table))?;
    println!("{count}");
    Ok(())
}

fn run_rows(session: &Session, args: RowsArgs) -> Result<(), String> {
    let mut rows = session
        .rows(&args.table)
        .map_err(|e| format!("Failed to read rows of '{}': {e}", args.table))?;
    if let Some(term) = &args.filter {
        rows = rows.filter(term);
    }
    match args.format {
        CliOutputFormat::Table => println!("{}", render_row_set(&rows)),
        CliOutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&rows)
                .map_err(|e| format!("JSON serialization failed: {e}"))?
        ),
    }
    Ok(())
}

fn run_row(session: &Session, args: RowArgs) -> Result<(), String> {
    let key = Value::parse_literal(&args.key);
    let details = session
        .row_details(&args.table, &key)
        .map_err(|e| format!("Failed to read row: {e}"))?
        .ok_or_else(|| format!("no row in '{}' with key {key}", args.table))?;
    println!("{}", render_details(&details));
    Ok(())
}

fn run_insert(session: &mut Session, args: InsertArgs) -> Result<(), String> {
    let (columns, values) = parse_assignments(&args.assignments)?;
    let rows = session
        .insert(&args.table, &columns, &values)
        .map_err(|e| format!("Insert failed: {e}"))?;
    println!("Inserted 1 row into '{}' ({} rows).", args.table, rows.len());
    Ok(())
}

fn run_update(session: &mut Session, args: UpdateArgs) -> Result<(), String> {
    let key = Value::parse_literal(&args.key);
    let (columns, new_values) = parse_assignments(&args.assignments)?;
    let details = session
        .row_details(&args.table, &key)
        .map_err(|e| format!("Failed to read row: {e}"))?
        .ok_or_else(|| format!("no row in '{}' with key {key}", args.table))?;
    let old_values = current_values(&details, &columns)?;
    session
        .update(&args.table, &key, &columns, &new_values, &old_values)
        .map_err(|e| format!("Update failed: {e}"))?;
    println!("Updated row {key} in '{}'.", args.table);
    Ok(())
}

fn run_delete(session: &mut Session, args: DeleteArgs) -> Result<(), String> {
    let keys = args
        .keys
        .iter()
        .map(|k| Value::parse_literal(k))
        .collect::<Vec<_>>();
    let rows = session
        .delete_rows(&args.table, &keys)
        .map_err(|e| format!("Delete failed: {e}"))?;
    let deleted = session.pending_undo().map_or(0, UndoRecord::row_count);
    println!(
        "Deleted {deleted} row(s) from '{}' ({} remaining).",
        args.table,
        rows.len()
    );
    Ok(())
}

fn run_query(session: &mut Session, args: QueryArgs) -> Result<(), String> {
    let outcome = session
        .run_query(&args.sql)
        .map_err(|e| format!("Query failed: {e}"))?;
    match (args.format, &outcome) {
        (CliOutputFormat::Json, QueryOutcome::Rows { columns, rows }) => {
            let value = serde_json::json!({ "columns": columns, "rows": rows });
            println!(
                "{}",
                serde_json::to_string_pretty(&value)
                    .map_err(|e| format!("JSON serialization failed: {e}"))?
            );
        }
        _ => println!("{}", render_outcome(&outcome)),
    }
    Ok(())
}

fn run_script(session: &mut Session, args: FileArgs) -> Result<(), String> {
    session
        .run_script_file(&args.path)
        .map_err(|e| format!("Script '{}' failed: {e}", args.path.display()))?;
    println!("Executed script '{}'.", args.path.display());
    Ok(())
}

fn run_import_csv(session: &mut Session, args: TableFileArgs) -> Result<(), String> {
    let count = session
        .import_csv(&args.table, &args.path)
        .map_err(|e| format!("CSV import failed: {e}"))?;
    println!("Imported {count} row(s) into '{}'.", args.table);
    Ok(())
}

fn run_import_json(session: &mut Session, args: TableFileArgs) -> Result<(), String> {
    let count = session
        .import_json(&args.table, &args.path)
        .map_err(|e| format!("JSON import failed: {e}"))?;
    println!("Imported {count} row(s) into '{}'.", args.table);
    Ok(())
}

fn run_export_csv(session: &mut Session, args: TableFileArgs) -> Result<(), String> {
    let count = session
        .export_csv(&args.table, &args.path)
        .map_err(|e| format!("CSV export failed: {e}"))?;
    println!("Exported {count} row(s) to '{}'.", args.path.display());
    Ok(())
}

fn run_export_schema(session: &mut Session, args: FileArgs) -> Result<(), String> {
    session
        .export_schema(&args.path)
        .map_err(|e| format!("Schema export failed: {e}"))?;
    println!("Exported schema to '{}'.", args.path.display());
    Ok(())
}

fn run_backup(session: &mut Session, args: FileArgs) -> Result<(), String> {
    session
        .backup(&args.path)
        .map_err(|e| format!("Backup failed: {e}"))?;
    println!("Backed up database to '{}'.", args.path.display());
    Ok(())
}

fn run_summary(session: &Session) -> Result<(), String> {
    let summary = session
        .summary()
        .map_err(|e| format!("Failed to summarize database: {e}"))?;
    println!("{summary}");
    Ok(())
}

fn run_sample(session: &mut Session, args: SampleArgs) -> Result<(), String> {
    for _ in 0..args.count {
        session
            .generate_sample(&args.table)
            .map_err(|e| format!("Sample generation failed: {e}"))?;
    }
    println!("Inserted {} sample row(s) into '{}'.", args.count, args.table);
    Ok(())
}

fn run_shell(session: Session) -> Result<(), String> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut shell = Shell::new(session).with_prompt(interactive);
    shell
        .run(stdin.lock(), &mut io::stdout().lock())
        .map_err(|e| format!("Shell I/O failed: {e}"))
}
