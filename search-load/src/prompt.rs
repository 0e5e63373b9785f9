//! Menu for picking the search field and term.
//!
//! On a terminal the answers are read with `dialoguer`. Piped input is read
//! one line per answer, so `printf '1\nQueen\n' | search-load` works too.

use std::io::{BufRead, IsTerminal};

use anyhow::{Context, Result};
use dialoguer::Input;

use crate::error::InputError;
use crate::query::{SearchField, SearchRequest};

const MENU: &str = "\
Welcome! Please choose one of the following options:
1. Search songs by artist name
2. Search songs by album title";

/// Where the operator's answers come from.
pub trait Answers {
    fn answer(&mut self, prompt: &str) -> Result<String>;
}

pub struct TerminalAnswers;

impl Answers for TerminalAnswers {
    fn answer(&mut self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .with_context(|| format!("Failed to read {prompt:?} from the terminal"))
    }
}

/// One line per answer. End of input reads as an empty answer.
pub struct LineAnswers<R> {
    reader: R,
}

impl<R: BufRead> LineAnswers<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Answers for LineAnswers<R> {
    fn answer(&mut self, prompt: &str) -> Result<String> {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .with_context(|| format!("Failed to read {prompt:?} from stdin"))?;
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(line)
    }
}

/// Fills in whatever was not given on the command line by asking the operator.
///
/// The outer error is I/O, the inner one is invalid input.
pub fn collect_request(
    selection: Option<String>,
    query: Option<String>,
) -> Result<Result<SearchRequest, InputError>> {
    if console::user_attended_stderr() && std::io::stdin().is_terminal() {
        collect_with(&mut TerminalAnswers, selection, query)
    } else {
        let mut answers = LineAnswers::new(std::io::stdin().lock());
        collect_with(&mut answers, selection, query)
    }
}

pub fn collect_with(
    answers: &mut impl Answers,
    selection: Option<String>,
    query: Option<String>,
) -> Result<Result<SearchRequest, InputError>> {
    let selection = match selection {
        Some(selection) => selection,
        None => {
            println!("{MENU}");
            answers.answer("Enter option number")?
        }
    };
    let field = match SearchField::from_selection(&selection) {
        Ok(field) => field,
        Err(e) => return Ok(Err(e)),
    };
    let query = match query {
        Some(query) => query,
        None => answers.answer(query_prompt(field))?,
    };
    Ok(SearchRequest::new(field, query))
}

fn query_prompt(field: SearchField) -> &'static str {
    match field {
        SearchField::Artist => "Enter the artist name to search for",
        SearchField::Album => "Enter the album title to search for",
    }
}
