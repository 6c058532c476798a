use base64::{engine::general_purpose, Engine};
use clap::Parser;
use collector::system::{run_collector, Commands};
use log::info;

mod collector;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Full path to TOML collector
    #[clap(short, long, value_parser)]
    toml: Option<String>,

    /// Base64 encoded TOML file
    #[clap(short, long, value_parser)]
    data: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn main() {
    let args = Args::parse();
    println!("[orchard] Starting orchard collection!");

    if let Some(toml) = args.toml {
        if !toml.is_empty() {
            let collection_results = orchard_core::core::parse_toml_file(&toml);
            match collection_results {
                Ok(_) => info!("[orchard] Collection success"),
                Err(err) => {
                    println!("[orchard] Failed to collect artifacts: {err:?}");
                    return;
                }
            }
        }
    } else if let Some(data) = args.data {
        if !data.is_empty() {
            let toml_data_results = general_purpose::STANDARD.decode(&data);
            let toml_data = match toml_data_results {
                Ok(results) => results,
                Err(err) => {
                    println!(
                        "[orchard] Failed to base64 decode TOML collector {data}, error: {err:?}",
                    );
                    return;
                }
            };
            let collection_results = orchard_core::core::parse_toml_data(&toml_data);
            match collection_results {
                Ok(_) => info!("[orchard] Collection success"),
                Err(err) => {
                    println!("[orchard] Failed to collect artifacts: {err:?}");
                    return;
                }
            }
        }
    } else if let Some(command) = args.command {
        run_collector(&command);
    } else {
        println!("[orchard] No TOML file, data or backup provided!");
        return;
    }
    println!("[orchard] Finished orchard collection!");
}
