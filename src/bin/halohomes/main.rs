use anyhow::{Context, Error};
use getopts::Options;
use halosetup::setup::print_homes;
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
    if matches.free.len() != 1 {
        print_help(&args[0], &opts);
        process::exit(2);
    }

    let level = if matches.opt_present("v") {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let logger = Logger::builder(io::stderr())
        .set_prefix("halohomes: ")
        .set_flags(L_LEVEL | L_TIME)
        .set_level(level)
        .build();
    logosaurus::init(logger).unwrap();

    if let Err(e) = run(&matches.free[0]).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(refresh_token: &str) -> Result<(), Error> {
    // renewal does not need the account email
    let mut api = Api::new("");
    api.renew(refresh_token).await.context("renew session")?;
    let homes = api.get_homes().await.context("list homes")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_homes(&mut out, &homes)?;
    Ok(())
}

fn print_help(prog: &str, opts: &Options) {
    let brief = format!(
        "usage: {} [-v] <REFRESH_TOKEN>\n\n\
         Lists the homes on a Kwikset account using a refresh token printed\n\
         by halosetup.",
        prog
    );
    eprint!("{}", opts.usage(&brief));
}
