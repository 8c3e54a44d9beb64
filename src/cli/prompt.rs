//! Interactive menu used when no URLs are given on the command line

use std::io::{self, BufRead, Write};

/// A choice from the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Single,
    Multiple,
    Exit,
    Invalid,
}

pub fn parse_choice(input: &str) -> MenuChoice {
    match input.trim() {
        "1" => MenuChoice::Single,
        "2" => MenuChoice::Multiple,
        "3" | "q" | "quit" | "exit" => MenuChoice::Exit,
        _ => MenuChoice::Invalid,
    }
}

pub fn print_menu() {
    eprintln!();
    eprintln!("How would you like to proceed?");
    eprintln!("  1. Download a single image");
    eprintln!("  2. Download multiple images");
    eprintln!("  3. Exit");
}

/// Print `message` and read one line. `None` on end of input.
pub fn ask<R: BufRead>(reader: &mut R, message: &str) -> io::Result<Option<String>> {
    eprint!("{message}");
    io::stderr().flush()?;

    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Read URLs, one per line, until a blank line or end of input
pub fn read_url_list<R: BufRead>(reader: &mut R) -> io::Result<Vec<String>> {
    let mut urls = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let url = line.trim();
        if url.is_empty() {
            break;
        }
        urls.push(url.to_string());
    }
    Ok(urls)
}
