use std::io::Write;

use log::LevelFilter;
use rustyline::{DefaultEditor, Result, error::ReadlineError};
use tabmap::{
    planner::{
        compiler::compile_where,
        select::SelectStatement,
        types::{FieldDef, FieldList, ParseFlags},
    },
    storage::{block_store::FileBlockStore, header::MapHeaderBlock},
    types::value::FieldType,
};

const HISTORY_FILE: &str = "tabmap_history.txt";

fn init_logging() {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(LevelFilter::Warn);
    }
    builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
    let _ = builder.try_init();
}

fn read_multiline_command(rl: &mut DefaultEditor) -> Result<String> {
    let mut input = String::new();
    let mut prompt = "tabmap> ".to_string();

    loop {
        let line = rl.readline(&prompt)?;
        let trimmed_line = line.trim_end();

        // Trailing backslash continues the command
        if let Some(stripped) = trimmed_line.strip_suffix('\\') {
            input.push_str(stripped);
            input.push(' ');
            prompt = "     -> ".to_string();
        } else {
            input.push_str(trimmed_line);
            break;
        }
    }

    Ok(input)
}

/// Parses `name:type,name:type`.
fn parse_field_list(decl: &str) -> std::result::Result<FieldList, String> {
    let mut fields = Vec::new();
    for entry in decl.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, type_name) = entry
            .split_once(':')
            .ok_or_else(|| format!("Expected name:type, got `{}'", entry))?;
        let field_type = FieldType::from_name(type_name.trim())
            .ok_or_else(|| format!("Unknown field type `{}'", type_name.trim()))?;
        fields.push(FieldDef::new(name.trim(), field_type));
    }
    Ok(FieldList::new(fields))
}

fn dump_header(path: &str) {
    let result = FileBlockStore::open(path).and_then(|mut store| MapHeaderBlock::read_from_store(&mut store));
    match result {
        Ok(header) => println!("{}", header),
        Err(e) => println!("Error: {}", e),
    }
}

fn run_select(sql: &str, fields: &FieldList) {
    let statement = SelectStatement::preparse(sql).and_then(|mut statement| {
        statement.parse(fields, ParseFlags::ALLOW_UNDEFINED_COL_FUNCS)?;
        Ok(statement)
    });
    match statement {
        Ok(statement) => print!("{}", statement),
        Err(e) => println!("Error: {}", e),
    }
}

fn process_command(command: &str, fields: &mut FieldList) -> bool {
    let cmd = command.trim();

    if let Some(decl) = cmd.strip_prefix("\\fields") {
        match parse_field_list(decl) {
            Ok(list) => {
                println!("{} fields defined", list.len());
                *fields = list;
            }
            Err(e) => println!("Error: {}", e),
        }
        return true;
    }
    if let Some(path) = cmd.strip_prefix("\\header") {
        dump_header(path.trim());
        return true;
    }
    if let Some(expr) = cmd.strip_prefix("\\where") {
        match compile_where(expr.trim(), fields) {
            Ok(expr) => print!("{}", expr),
            Err(e) => println!("Error: {}", e),
        }
        return true;
    }

    match cmd.to_lowercase().as_str() {
        "exit" | "quit" | "q" => {
            println!("Goodbye!");
            return false;
        }
        "help" | "h" => {
            println!(
                r#"
Available commands:
  \fields name:type,...   - Declare the field list (integer, float, string, boolean)
  \where <expression>     - Compile a WHERE expression and dump its tree
  \header <path>          - Dump the header block of a .MAP file
  SELECT ...              - Parse a SELECT statement against the field list
  help, h                 - Show this help message
  clear                   - Clear the screen
  exit, quit, q           - Exit

Use '\' at the end of a line for multiline input.
"#
            );
        }
        "clear" => {
            print!("\x1B[2J\x1B[1;1H");
            let _ = std::io::stdout().flush();
        }
        "" => {}
        lower if lower.starts_with("select") => run_select(cmd, fields),
        _ => println!("Unknown command: {}", cmd),
    }

    true
}

fn main() -> Result<()> {
    init_logging();
    println!("tabmap {} - MapInfo MAP block and swq SQL shell", env!("CARGO_PKG_VERSION"));

    let mut rl = DefaultEditor::new()?;
    let _ = rl.load_history(HISTORY_FILE);
    let mut fields = FieldList::default();

    loop {
        match read_multiline_command(&mut rl) {
            Ok(input) => {
                let command = input.trim().to_string();
                if !command.is_empty() {
                    rl.add_history_entry(&command)?;
                }
                if !process_command(&command, &mut fields) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("EOF");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    Ok(())
}
