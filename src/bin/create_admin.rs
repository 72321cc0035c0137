use std::{
    error::Error,
    path::Path,
    process::exit,
    sync::{Arc, Mutex},
};

use clap::Parser;
use rusqlite::Connection;

use household_expenses::{Age, NewUser, SQLiteUserStore, UserName, UserStore, initialize_db};

/// A utility for adding an admin to the household expense tracker's database.
///
/// The database is created if it does not exist yet.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The name the admin will log in with.
    #[arg(long)]
    name: String,

    /// The admin's age in whole years.
    #[arg(long)]
    age: u32,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    match db_path.extension() {
        None => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    let name = match UserName::new(&args.name) {
        Ok(name) => name,
        Err(error) => {
            print_error(error);
            exit(1);
        }
    };

    let age = match Age::new(args.age) {
        Ok(age) => age,
        Err(error) => {
            print_error(error);
            exit(1);
        }
    };

    println!("Opening database at {db_path:#?}");
    let conn = Connection::open(db_path)?;
    initialize_db(&conn)?;

    let store = SQLiteUserStore::new(Arc::new(Mutex::new(conn)));

    if store
        .list_users()?
        .iter()
        .any(|user| user.name == name)
    {
        print_error(format!("A user named \"{name}\" already exists."));
        exit(1);
    }

    let admin = store.create_user(NewUser {
        name,
        age,
        is_admin: true,
    })?;

    println!("Created admin \"{}\" with ID {}.", admin.name, admin.id);

    Ok(())
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string())
}
