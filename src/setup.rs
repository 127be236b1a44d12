//! The interactive setup flow: log in, list homes, hand out a refresh token.

use crate::client::{Account, Error as ClientError};
use crate::console::Console;
use crate::home::Home;
use anyhow::{Context, Error};
use log::*;
use std::io::{self, Write};

pub const NO_HOMES: &str = "You have no homes! Please download the Kwikset app and add one.";

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The account has no homes; nothing else was printed.
    NoHomes,
    /// Homes and the refresh token were printed.
    Printed,
}

/// Runs the setup flow once.
///
/// `connect` builds the account client for the email the user typed. Every
/// remote call must succeed before the next one is made; the first failure
/// ends the run.
pub async fn run<A, C, F, W>(console: &mut C, connect: F, out: &mut W) -> Result<Outcome, Error>
where
    A: Account,
    C: Console,
    F: FnOnce(&str) -> A,
    W: Write,
{
    let email = console.read_line("Email").context("read email")?;
    let mut api = connect(&email);

    let password = console.read_secret("Password").context("read password")?;
    let pre_auth = api.authenticate(&password).await.context("authenticate")?;
    info!("password accepted, waiting for verification code");

    let code = console
        .read_line("Verification Code")
        .context("read verification code")?;
    api.verify_user(pre_auth, &code).await.context("verify")?;
    info!("login verified");

    let homes = api.get_homes().await.context("list homes")?;

    writeln!(out)?;
    print_homes(out, &homes)?;
    if homes.is_empty() {
        return Ok(Outcome::NoHomes);
    }

    let token = api
        .refresh_token()
        .ok_or(ClientError::MissingRefreshToken)
        .context("read refresh token")?;
    writeln!(out)?;
    writeln!(out, "Refresh Token: {}", token)?;
    Ok(Outcome::Printed)
}

/// Prints the home summary: a hint for no homes, the id alone for a single
/// home, and every field of every home otherwise.
pub fn print_homes<W: Write>(out: &mut W, homes: &[Home]) -> io::Result<()> {
    match homes {
        [] => writeln!(out, "{}", NO_HOMES)?,
        [home] => writeln!(out, "Home ID: {}", home.id)?,
        _ => {
            writeln!(out, "You have {} homes!", homes.len())?;
            writeln!(out)?;
            for home in homes {
                writeln!(out, "Home ID: {}", home.id)?;
                writeln!(out, "Home Name: {}", home.name)?;
                writeln!(out, "Owner Name: {}", home.owner_name)?;
                writeln!(out, "Owner Email: {}", home.email)?;
            }
        }
    }
    Ok(())
}
