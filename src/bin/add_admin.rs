/*!
Add an admin account to the data DB.

```text
add_admin --db Impact.db --username alice --password hunter2
```
*/
use clap::Parser;
use simplelog::{ColorChoice, TerminalMode, TermLogger};

use impact::{auth, store::Store};

#[derive(Parser, Debug)]
#[command(version, about = "Insert an admin login into the data DB.")]
struct Args {
    /// Path to the SQLite database; created if it doesn't exist.
    #[arg(long, default_value = "Impact.db")]
    db: String,
    #[arg(short, long)]
    username: String,
    #[arg(short, long)]
    password: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    let log_cfg = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("impact")
        .add_filter_allow_str("add_admin")
        .build();
    TermLogger::init(
        impact::log_level_from_env(),
        log_cfg,
        TerminalMode::Stderr,
        ColorChoice::Auto
    ).map_err(|e| format!("Unable to start logging: {}", &e))?;

    let store = Store::new(&args.db);
    store.ensure_db_schema().await
        .map_err(|e| format!("Unable to ensure state of data DB: {}", &e))?;

    let hash = auth::hash_password(&args.password);
    let id = store.insert_admin(&args.username, &hash).await
        .map_err(|e| e.to_string())?;

    println!("Added admin {:?} (AID {}).", &args.username, &id);
    Ok(())
}
