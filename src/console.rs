//! Operator console on stdin: `help`, `status`, `open`, `exit`.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::state::dashboard_state::DashboardState;

pub const HELP_TEXT: &str = "Commands: help | status | open | exit\n\
- help: show this help\n\
- status: show the latest dashboard counts\n\
- open: print the dashboard URLs\n\
- exit: stop the monitor and quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Open,
    Exit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let command = line.trim().to_lowercase();
        match command.as_str() {
            "" => Self::Empty,
            "help" => Self::Help,
            "status" => Self::Status,
            "open" => Self::Open,
            "exit" | "quit" | "q" => Self::Exit,
            _ => Self::Unknown(command),
        }
    }
}

/// Dashboard URLs for the three view modes.
pub fn dashboard_urls(host: &str, port: u16) -> [String; 3] {
    let base = format!("http://{host}:{port}");
    [
        format!("{base}/"),
        format!("{base}/linker"),
        format!("{base}/linked"),
    ]
}

pub struct Console {
    state: DashboardState,
    host: String,
    port: u16,
}

impl Console {
    pub fn new(state: DashboardState, host: &str, port: u16) -> Self {
        Self {
            state,
            host: host.to_string(),
            port,
        }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Read commands until `exit`, EOF, or shutdown. EOF alone does not stop
    /// the service.
    pub async fn run(self, shutdown: CancellationToken) {
        println!("{HELP_TEXT}");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => break,
                line = lines.next_line() => line,
            };
            let Ok(Some(line)) = line else {
                info!("Console input closed");
                break;
            };

            if self.execute(Command::parse(&line), &shutdown).await {
                break;
            }
        }
    }

    /// Run one command. Returns true when the console should stop.
    pub async fn execute(&self, command: Command, shutdown: &CancellationToken) -> bool {
        match command {
            Command::Help => println!("{HELP_TEXT}"),
            Command::Status => {
                let snapshot = self.state.get().await;
                let counts = snapshot.counts;
                println!(
                    "Monitor running. Last update {} | A={} B={} linked={} pending={}",
                    snapshot.last_update,
                    counts.a_total,
                    counts.b_total,
                    counts.linked_total,
                    counts.pending_total
                );
            }
            Command::Open => {
                for url in dashboard_urls(&self.host, self.port) {
                    println!("{url}");
                }
            }
            Command::Exit => {
                println!("Stopping monitor...");
                shutdown.cancel();
                return true;
            }
            Command::Empty => {}
            Command::Unknown(other) => println!("Unknown command '{other}'. Type 'help'."),
        }
        false
    }
}
