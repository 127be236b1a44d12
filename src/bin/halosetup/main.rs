use anyhow::Error;
use getopts::Options;
use halosetup::console::Terminal;
use halosetup::setup;
use halosetup::Api;
use log::*;
use logosaurus::{self, Logger, L_LEVEL, L_TIME};
use std::env;
use std::io;
use std::process;

#[tokio::main]
async fn main() {
    let args = env::args().collect::<Vec<String>>();

    let mut opts = Options::new();
    opts.optflag("h", "help", "print this help");
    opts.optflag("v", "verbose", "log each step to stderr");
    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(e) => {
            eprint!("{}\n\n", e);
            print_help(&args[0], &opts);
            process::exit(2);
        }
    };
    if matches.opt_present("h") {
        print_help(&args[0], &opts);
        return;
    }
    if !matches.free.is_empty() {
        print_help(&args[0], &opts);
        process::exit(2);
    }

    let level = if matches.opt_present("v") {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let logger = Logger::builder(io::stderr())
        .set_prefix("halosetup: ")
        .set_flags(L_LEVEL | L_TIME)
        .set_level(level)
        .build();
    logosaurus::init(logger).unwrap();

    if let Err(e) = run().await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let mut console = Terminal::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    setup::run(&mut console, Api::new, &mut out).await?;
    Ok(())
}

fn print_help(prog: &str, opts: &Options) {
    let brief = format!(
        "usage: {} [-v]\n\n\
         Logs in to a Kwikset account, lists its homes and prints a refresh token.\n\
         You will be asked for your email, password and the verification code\n\
         Kwikset sends you.",
        prog
    );
    eprint!("{}", opts.usage(&brief));
}
