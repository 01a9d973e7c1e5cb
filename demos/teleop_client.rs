// Keyboard teleop client: sends 12-byte frames to a running bridge
//
// Usage: cargo run --example teleop_client -- [host:port]
// Log lines are printed while the terminal is in raw mode, so they do not return
// to column 0.
//
//    u    i    o          U    I    O        q/z : all speeds +/-10%
//    j    k    l          J    K    L        w/x : linear speed +/-10%
//    m    ,    .          M    <    >        e/c : turn speed +/-10%
//                                            t/b : up/down
// Ctrl-C sends the interrupt frame (stops the bridge), Esc just quits.
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::info;

use teleop_bridge::mapping;
use teleop_bridge::protocol::{CommandFrame, INTERRUPT_SYMBOL, STOP_SYMBOL};

// Speed keys: (linear factor, turn factor)
const SPEED_BINDINGS: [(char, f64, f64); 6] = [
    ('q', 1.1, 1.1),
    ('z', 0.9, 0.9),
    ('w', 1.1, 1.0),
    ('x', 0.9, 1.0),
    ('e', 1.0, 1.1),
    ('c', 1.0, 0.9),
];

const INITIAL_SPEED: f64 = 0.5; // m/s
const INITIAL_TURN: f64 = 1.0; // rad/s
const KEEPALIVE: Duration = Duration::from_secs(1); // well under the bridge watchdog

#[derive(Debug, Parser)]
#[command(name = "teleop_client", about = "Keyboard teleop over the frame protocol")]
struct ClientArgs {
    /// Bridge address
    #[arg(default_value = "127.0.0.1:8080")]
    addr: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let addr = ClientArgs::parse().addr;

    info!("Connecting to {}...", addr);
    let mut stream = TcpStream::connect(&addr).await?;
    info!("Connected. Movement: uiojklm,. (shift to strafe), speed: qzwxec, Esc quits");
    print_speed(INITIAL_SPEED, INITIAL_TURN);

    enable_raw_mode()?;
    let result = run_teleop(&mut stream).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    stream: &mut TcpStream,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed = INITIAL_SPEED;
    let mut turn = INITIAL_TURN;
    let mut last_sent = Instant::now();

    loop {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind,
                ..
            }) = event::read()?
            {
                if kind == KeyEventKind::Release {
                    continue;
                }

                match code {
                    // Raw mode delivers Ctrl-C as a key, forward it as the kill switch
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        send(stream, CommandFrame::new(INTERRUPT_SYMBOL, 0.0, 0.0)).await?;
                        info!("Sent interrupt");
                        break;
                    }
                    KeyCode::Esc => {
                        send(stream, CommandFrame::new(STOP_SYMBOL, 0.0, 0.0)).await?;
                        break;
                    }
                    KeyCode::Char(key) => {
                        if let Some(&(_, linear, angular)) =
                            SPEED_BINDINGS.iter().find(|(bound, _, _)| *bound == key)
                        {
                            speed *= linear;
                            turn *= angular;
                            print_speed(speed, turn);
                        } else if key.is_ascii() && mapping::lookup(key as u8).is_some() {
                            send(stream, CommandFrame::new(key as u8, turn, speed)).await?;
                            last_sent = Instant::now();
                        }
                    }
                    _ => {}
                }
            }
        }

        // Idle: keep the watchdog fed with a stop frame
        if last_sent.elapsed() > KEEPALIVE {
            send(stream, CommandFrame::new(STOP_SYMBOL, turn, speed)).await?;
            last_sent = Instant::now();
        }
    }

    Ok(())
}

async fn send(
    stream: &mut TcpStream,
    frame: CommandFrame,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    stream.write_all(&frame.encode()).await?;
    Ok(())
}

fn print_speed(speed: f64, turn: f64) {
    info!("Speed: {:.3}  Turn: {:.3}", speed, turn);
}
