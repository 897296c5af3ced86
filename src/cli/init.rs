use std::path::PathBuf;

use kontoregel::db::{get_connection, init_db};
use kontoregel::error::Result;
use kontoregel::settings::{load_settings, save_settings};

pub fn run(data_dir: Option<String>, workspace: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(ws) = workspace {
        settings.workspace = ws;
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    let conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;

    println!(
        "Initialized kontoregel at {} (workspace '{}')",
        resolved.display(),
        settings.workspace
    );
    Ok(())
}

fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
