//! Command-line front end for MEMO maintenance tasks.
//!
//! # Responsibility
//! - Probe core linkage (`memo_cli` with no arguments).
//! - Run admin batch jobs: spreadsheet/CSV imports, ERP export, templates.
//! - Print the kanban board for a quick status overview.

use log::info;
use memo_core::import::erp::{export_file_name, import_customers_csv, import_products_csv};
use memo_core::import::mapping::Template;
use memo_core::import::{
    export_orders_csv, import_customer_rows, import_product_rows, read_csv_rows,
    read_workbook_rows, BatchImporter, SheetRow,
};
use memo_core::repo::customer_repo::SqliteCustomerRepository;
use memo_core::repo::mapping_repo::SqliteMappingRepository;
use memo_core::repo::order_repo::SqliteOrderRepository;
use memo_core::repo::product_repo::SqliteProductRepository;
use memo_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use memo_core::service::user_service::UserService;
use memo_core::service::workflow::KanbanService;
use memo_core::{
    init_logging, load_config, load_default_config, ImportReport, Role, RowOutcome, Session,
};
use rusqlite::Connection;
use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::process::ExitCode;

const USAGE: &str = "usage: memo_cli [--config <file.json>] [--user <email>] <command>

commands:
  board                          print the kanban board
  import-clientes <file>         import customers from .xlsx/.ods/.csv
  import-produtos <file>         import products from .xlsx/.ods/.csv
  erp-clientes <file.csv>        import ERP customer extract
  erp-produtos <file.csv>        import ERP product extract
  export-os [dir]                export service orders for the ERP
  template <clientes|produtos> <file.xlsx>";

struct Args {
    config: Option<String>,
    user: Option<String>,
    command: Vec<String>,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args {
        config: None,
        user: None,
        command: Vec::new(),
    };
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--config" => args.config = Some(raw.next().ok_or("--config needs a path")?),
            "--user" => args.user = Some(raw.next().ok_or("--user needs an e-mail")?),
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ => args.command.push(arg),
        }
    }
    Ok(args)
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    if args.command.is_empty() {
        println!("memo_core ping={}", memo_core::ping());
        println!("memo_core version={}", memo_core::core_version());
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_default_config()?,
    };
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = memo_core::open_db(&config.database_path)?;
    let session = resolve_session(&conn, args.user.as_deref())?;
    let importer = BatchImporter::new(config.import_batch_size);
    info!(
        "event=cli_command module=cli status=start command={}",
        args.command[0]
    );

    let command: Vec<&str> = args.command.iter().map(String::as_str).collect();
    match command.as_slice() {
        ["board"] => print_board(&conn, &session),
        ["import-clientes", file] => {
            let rows = read_rows(Path::new(file))?;
            let repo = SqliteCustomerRepository::try_new(&conn)?;
            let report = import_customer_rows(&session, &repo, &rows, &importer, print_progress)?;
            print_report(&report);
            Ok(())
        }
        ["import-produtos", file] => {
            let rows = read_rows(Path::new(file))?;
            let repo = SqliteProductRepository::try_new(&conn)?;
            let report = import_product_rows(&session, &repo, &rows, &importer, print_progress)?;
            print_report(&report);
            Ok(())
        }
        ["erp-clientes", file] => {
            let customers = SqliteCustomerRepository::try_new(&conn)?;
            let mappings = SqliteMappingRepository::try_new(&conn)?;
            let report = import_customers_csv(
                &session,
                File::open(file)?,
                &customers,
                &mappings,
                &importer,
                print_progress,
            )?;
            print_report(&report);
            Ok(())
        }
        ["erp-produtos", file] => {
            let products = SqliteProductRepository::try_new(&conn)?;
            let report = import_products_csv(
                &session,
                File::open(file)?,
                &products,
                &importer,
                print_progress,
            )?;
            print_report(&report);
            Ok(())
        }
        ["export-os"] => export_orders(&conn, &session, Path::new(".")),
        ["export-os", dir] => export_orders(&conn, &session, Path::new(dir)),
        ["template", kind, file] => {
            let template = match *kind {
                "clientes" => Template::Customers,
                "produtos" => Template::Products,
                other => return Err(format!("unknown template `{other}`").into()),
            };
            std::fs::write(file, template.to_xlsx()?)?;
            println!("{} -> {file}", template.file_stem());
            Ok(())
        }
        _ => Err(USAGE.into()),
    }
}

/// Without `--user`, the CLI acts as the first registered admin.
fn resolve_session(conn: &Connection, email: Option<&str>) -> Result<Session, Box<dyn Error>> {
    let users = UserService::new(SqliteUserRepository::try_new(conn)?);
    if let Some(email) = email {
        return Ok(users.session_for_email(email)?);
    }

    let admin = SqliteUserRepository::try_new(conn)?
        .list_users(Some(Role::Admin))?
        .into_iter()
        .last()
        .ok_or("no admin user registered; pass --user <email>")?;
    Ok(users.session_for(admin.id)?)
}

fn read_rows(path: &Path) -> Result<Vec<SheetRow>, Box<dyn Error>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let rows = if is_csv {
        read_csv_rows(File::open(path)?)?
    } else {
        read_workbook_rows(path)?
    };
    Ok(rows)
}

fn print_board(conn: &Connection, session: &Session) -> Result<(), Box<dyn Error>> {
    let kanban = KanbanService::new(SqliteOrderRepository::try_new(conn)?);
    for column in kanban.board(session)? {
        println!("== {} ({}) ==", column.label(), column.cards.len());
        for card in &column.cards {
            let prazo = card
                .prazo
                .map(|date| date.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {}  {}  [{}]  prazo {}",
                card.numero, card.customer_name, card.technician_name, prazo
            );
        }
    }
    Ok(())
}

fn export_orders(conn: &Connection, session: &Session, dir: &Path) -> Result<(), Box<dyn Error>> {
    let orders = SqliteOrderRepository::try_new(conn)?;
    let path = dir.join(export_file_name(chrono::Utc::now().date_naive()));
    let count = export_orders_csv(session, &orders, File::create(&path)?)?;
    println!("{count} OS exportadas -> {}", path.display());
    Ok(())
}

fn print_progress(percent: u8) {
    eprint!("\r{percent:>3}%");
    if percent == 100 {
        eprintln!();
    }
}

fn print_report(report: &ImportReport) {
    println!("{}", report.summary());
    for row in &report.rows {
        if let RowOutcome::Failed(reason) = &row.outcome {
            println!("  linha {}: {reason}", row.row_number);
        }
    }
}
