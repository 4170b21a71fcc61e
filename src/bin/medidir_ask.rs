//! Command-line client for a running `medidir-service`.
//!
//! ```bash
//! medidir-ask --email me@example.com --password secret1 "How many doctors are there?"
//! medidir-ask --email me@example.com --password secret1 --city pune
//! ```

use anyhow::{bail, Result};
use clap::Parser;
use medidir_lib::infrastructure::{
    check_service_availability,
    http_client::{DEFAULT_HOST, DEFAULT_PORT},
    RemoteDirectoryClient,
};
use tracing::debug;

#[derive(Parser)]
#[command(name = "medidir-ask")]
#[command(about = "Ask the hospital directory a question", long_about = None)]
struct Cli {
    #[arg(long, default_value = DEFAULT_HOST, help = "Service host")]
    host: String,

    #[arg(long, default_value_t = DEFAULT_PORT, help = "Service port")]
    port: u16,

    #[arg(long, help = "Account email")]
    email: String,

    #[arg(long, help = "Account password")]
    password: String,

    #[arg(long, help = "Create the account before asking")]
    register: bool,

    #[arg(long, help = "List hospitals whose city contains this text")]
    city: Option<String>,

    #[arg(help = "The question to ask")]
    question: Option<String>,
}

fn main() {
    medidir_lib::init_tracing();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("[medidir::ask] {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.question.is_none() && cli.city.is_none() {
        bail!("nothing to do: pass a QUESTION or --city");
    }

    if !check_service_availability(&cli.host, cli.port) {
        bail!(
            "medidir-service is not reachable at {}:{}",
            cli.host,
            cli.port
        );
    }

    let mut client = RemoteDirectoryClient::new(&cli.host, cli.port);
    let auth = if cli.register {
        client.register(&cli.email, &cli.password)?
    } else {
        client.login(&cli.email, &cli.password)?
    };
    debug!(user = %auth.user.email, "authenticated");

    if let Some(city) = cli.city.as_deref() {
        let hospitals = client.list_hospitals(Some(city))?;
        if hospitals.is_empty() {
            println!("No hospitals found in {city}.");
        }
        for hospital in hospitals {
            println!(
                "{}  {} ({}) rating {:.1}",
                hospital.id,
                hospital.name,
                hospital.city,
                hospital.rating
            );
        }
    }

    if let Some(question) = cli.question.as_deref() {
        println!("{}", client.ask(question)?);
    }

    Ok(())
}
