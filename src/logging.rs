use chrono::NaiveDateTime;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "loadscreen.log";

/// Send log lines to an append-only file, or to stderr when the file
/// cannot be opened.
pub fn init(log_file: Option<&Path>, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(level);
    let mut builder = env_logger::Builder::from_env(env);
    builder.format(|buf, record| {
        let now = chrono::Local::now().naive_local();
        writeln!(buf, "{}: [{}] {}", ctime(&now), record.level(), record.args())
    });

    let path = log_file.map(Path::to_path_buf).or_else(default_log_path);
    let opened = path.as_ref().and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    if let Some(file) = opened {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    drop(builder.try_init());
}

pub fn default_log_path() -> Option<PathBuf> {
    crate::config::exe_dir().map(|dir| dir.join(LOG_FILE_NAME))
}

/// `Tue Mar  5 09:07:01 2024`
pub fn ctime(time: &NaiveDateTime) -> String {
    time.format("%a %b %e %H:%M:%S %Y").to_string()
}
