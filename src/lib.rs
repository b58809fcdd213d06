pub mod cli;
pub mod convert;
pub mod decode;
pub mod error;
pub mod io_utils;
pub mod resolve;
pub mod schema;
pub mod sql;
pub mod transform;
pub mod writer;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::{Parser, error::ErrorKind};
use log::LevelFilter;

use crate::cli::ConvertArgs;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_sql_convert", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let args = match ConvertArgs::try_parse() {
        Ok(args) => args,
        Err(err) if err.kind() == ErrorKind::MissingRequiredArgument => {
            println!("{}", cli::USAGE);
            return Ok(());
        }
        Err(err) => err.exit(),
    };
    convert::execute(&args)
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
