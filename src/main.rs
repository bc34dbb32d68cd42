//! Entry point for the **slotgrid** daemon.
//!
//! Spawns the Unix-socket [`CommandSource`](slotgrid::traits::CommandSource)
//! on a background thread and processes incoming commands on the main
//! thread.  Every [`ViewEvent`] the board publishes is written to stdout as
//! one line of JSON, so a renderer can simply read the daemon's output.

use slotgrid::board::Board;
use slotgrid::command::Command;
use slotgrid::config::Config;
use slotgrid::ipc::listener::UnixSocketListener;
use slotgrid::storage::file::JsonFileStore;
use slotgrid::storage::memory::MemoryStore;
use slotgrid::traits::{CommandSource, KeyValueStore, ViewEvent};
use log::{error, info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc;

/// Default socket path for the command listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/slotgrid.sock", runtime)
}

/// `$XDG_<VAR>` or `$HOME/<fallback>`, joined with `slotgrid`.
fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    let base = std::env::var(var).unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/{}", home, fallback)
    });
    PathBuf::from(base).join("slotgrid")
}

/// Try to load the config from `$XDG_CONFIG_HOME/slotgrid/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = xdg_dir("XDG_CONFIG_HOME", ".config").join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no usable config file ({}), using defaults", e);
            Config::default()
        }
    }
}

fn storage_path(config: &Config) -> PathBuf {
    config
        .storage
        .path
        .clone()
        .unwrap_or_else(|| xdg_dir("XDG_DATA_HOME", ".local/share").join("storage.json"))
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();
    let path = storage_path(&config);
    match JsonFileStore::open(&path) {
        Ok(store) => {
            info!("storage at {}", store.path().display());
            run(Rc::new(store), &config);
        }
        Err(e) => {
            warn!("cannot open {} ({}), state will not persist", path.display(), e);
            run(Rc::new(MemoryStore::new()), &config);
        }
    }
}

fn run<S: KeyValueStore + Clone>(store: S, config: &Config) {
    let mut board = Board::new(store, config);

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    let (view_tx, view_rx) = mpsc::channel::<ViewEvent>();
    board.set_upload_sink(cmd_tx.clone());
    board.set_view_sink(view_tx);

    spawn_view_printer(view_rx);
    spawn_command_sources(cmd_tx);

    board.publish_all();
    info!("slotgrid running");
    // The board keeps a sender for upload completions, so the loop only
    // ends with the process.
    for cmd in cmd_rx {
        if let Err(e) = board.handle(cmd) {
            error!("command error: {}", e);
        }
    }
    info!("all command sources closed, exiting");
}

//  Helpers

fn spawn_command_sources(tx: mpsc::Sender<Command>) {
    let path = default_socket_path();
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&path);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}

fn spawn_view_printer(rx: mpsc::Receiver<ViewEvent>) {
    std::thread::spawn(move || {
        let stdout = std::io::stdout();
        for event in rx {
            let line = match serde_json::to_string(&event) {
                Ok(line) => line,
                Err(e) => {
                    error!("failed to encode view: {}", e);
                    continue;
                }
            };
            let mut out = stdout.lock();
            if writeln!(out, "{}", line).and_then(|_| out.flush()).is_err() {
                warn!("stdout closed, no longer publishing views");
                return;
            }
        }
    });
}
