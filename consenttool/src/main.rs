use clap::{Parser, Subcommand};
use colored_json::{Color, ColorMode, Output, Styler, ToColoredJson};
use iab_consent::ParsedConsent;
use log::debug;
use std::error::Error;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a consent string and display it in the console
    Parse {
        /// Consent string to parse
        consent_string: String,
    },
    /// Check whether vendors are allowed
    Vendors {
        /// Consent string to parse
        consent_string: String,
        /// Vendor IDs to check
        #[arg(required = true)]
        ids: Vec<u16>,
    },
    /// Check whether purposes are allowed
    Purposes {
        /// Consent string to parse
        consent_string: String,
        /// Purpose IDs to check
        #[arg(required = true)]
        ids: Vec<u16>,
    },
}

fn main() {
    env_logger::init();
    let args = Cli::parse();

    let e = match args.cmd {
        Commands::Parse { consent_string } => parse_consent_string(&consent_string),
        Commands::Vendors {
            consent_string,
            ids,
        } => check_vendors(&consent_string, &ids),
        Commands::Purposes {
            consent_string,
            ids,
        } => check_purposes(&consent_string, &ids),
    };

    if let Err(e) = e {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn decode(s: &str) -> Result<ParsedConsent, Box<dyn Error>> {
    debug!("decoding {s:?}");
    Ok(s.parse::<ParsedConsent>()?)
}

fn parse_consent_string(s: &str) -> Result<(), Box<dyn Error>> {
    let consent = decode(s)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&consent)?
            .to_colored_json_with_styler(ColorMode::Auto(Output::StdOut), json_color_styler())?
    );

    Ok(())
}

fn check_vendors(s: &str, ids: &[u16]) -> Result<(), Box<dyn Error>> {
    let consent = decode(s)?;

    for &id in ids {
        println!("{}\t{}", id, consent.vendor_allowed(id));
    }

    Ok(())
}

fn check_purposes(s: &str, ids: &[u16]) -> Result<(), Box<dyn Error>> {
    let consent = decode(s)?;

    for &id in ids {
        println!("{}\t{}", id, consent.purpose_allowed(id));
    }
    println!("all\t{}", consent.every_purpose_allowed(ids.iter().copied()));

    Ok(())
}

fn json_color_styler() -> Styler {
    Styler {
        key: Color::Green.foreground(),
        string_value: Color::Blue.bold(),
        integer_value: Color::Magenta.bold(),
        float_value: Color::Magenta.italic(),
        object_brackets: Color::Yellow.bold(),
        array_brackets: Color::Cyan.bold(),
        ..Default::default()
    }
}
