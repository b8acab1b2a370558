use clap::{Parser, Subcommand};
use reqwest::header::COOKIE;
use serde_json::{Map, Value};

use cookie_relay::config::schema::DEFAULT_COOKIE_NAME;
use cookie_relay::relay::{decode_session_cookie, encode_session_cookie, ACCESS_TOKEN_FIELD};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Build, inspect and probe cookie-relay session cookies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a session cookie value carrying the given token
    Encode {
        #[arg(short, long)]
        token: String,

        /// Extra payload entries, as key=value (ignored by the relay)
        #[arg(short, long = "claim", value_parser = parse_claim)]
        claims: Vec<(String, String)>,
    },
    /// Decode a session cookie value the way the relay does
    Inspect {
        value: String,
    },
    /// Send a request carrying the cookie through a running relay
    Probe {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,

        #[arg(short = 'n', long, default_value = DEFAULT_COOKIE_NAME)]
        cookie_name: String,

        #[arg(short, long)]
        value: String,
    },
}

fn parse_claim(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { token, claims } => {
            let mut payload = Map::new();
            for (key, value) in claims {
                payload.insert(key, Value::String(value));
            }
            payload.insert(ACCESS_TOKEN_FIELD.to_string(), Value::String(token));
            println!("{}", encode_session_cookie(&payload));
        }
        Commands::Inspect { value } => match decode_session_cookie(&value) {
            Ok(token) => println!("Authorization: Bearer {token}"),
            Err(e) => {
                eprintln!("{} {}", e.status(), e);
                std::process::exit(1);
            }
        },
        Commands::Probe {
            url,
            cookie_name,
            value,
        } => {
            let res = reqwest::Client::new()
                .get(&url)
                .header(COOKIE, format!("{cookie_name}={value}"))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if status.is_success() {
        println!("{status}");
    } else {
        eprintln!("Relay returned status {status}");
    }

    // Pretty-print JSON bodies, show anything else verbatim.
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }
    Ok(())
}
