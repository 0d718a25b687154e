use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::queries::{
    START_YEAR_THRESHOLD, TEAM_PREFIX, players_by_nationality, players_by_team_prefix,
    players_started_after, print_documents,
};
use crate::store::DocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Exit,
    StartedAfter,
    TeamPrefix,
    Nationality,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::Exit),
            "2" => Some(MenuChoice::StartedAfter),
            "3" => Some(MenuChoice::TeamPrefix),
            "4" => Some(MenuChoice::Nationality),
            _ => None,
        }
    }
}

pub struct MenuContext<'a> {
    pub store: &'a DocumentStore,
    pub collection: &'a str,
    pub nationality: &'a str,
}

pub const INVALID_CHOICE: &str = "Invalid option. Please choose an option from 1 to 4.";

/// Runs until the exit choice or end of input.
pub fn run_menu<R: BufRead, W: Write>(ctx: &MenuContext<'_>, mut input: R, out: &mut W) -> Result<()> {
    let mut line = String::new();
    loop {
        print_menu(out)?;
        line.clear();
        let read = input.read_line(&mut line).context("read menu choice")?;
        if read == 0 {
            writeln!(out)?;
            writeln!(out, "Exiting...")?;
            return Ok(());
        }

        match MenuChoice::parse(&line) {
            Some(MenuChoice::Exit) => {
                writeln!(out, "Exiting...")?;
                return Ok(());
            }
            Some(MenuChoice::StartedAfter) => {
                writeln!(out, "\nFILTER BY start_year GREATER THAN {START_YEAR_THRESHOLD}")?;
                let docs = players_started_after(ctx.store, ctx.collection, START_YEAR_THRESHOLD)?;
                print_documents(out, &docs)?;
            }
            Some(MenuChoice::TeamPrefix) => {
                writeln!(out, "\nFILTER BY TEAMS STARTING WITH '{TEAM_PREFIX}'")?;
                let docs = players_by_team_prefix(ctx.store, ctx.collection, TEAM_PREFIX, false)?;
                print_documents(out, &docs)?;
            }
            Some(MenuChoice::Nationality) => {
                writeln!(out, "\nFILTER BY NATIONALITY {}", ctx.nationality)?;
                let docs = players_by_nationality(ctx.store, ctx.collection, ctx.nationality)?;
                print_documents(out, &docs)?;
            }
            None => writeln!(out, "{INVALID_CHOICE}")?,
        }
    }
}

fn print_menu<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "\n=== QUERY MENU ===")?;
    writeln!(out, "1. Exit")?;
    writeln!(out, "2. Filter by start_year greater than {START_YEAR_THRESHOLD}")?;
    writeln!(out, "3. Filter by teams starting with '{TEAM_PREFIX}'")?;
    writeln!(out, "4. Filter by nationality")?;
    write!(out, "Choose an option (1-4): ")?;
    out.flush()?;
    Ok(())
}
