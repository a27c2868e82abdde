/// Terminal prompts: the "which do you prefer?" resolver and the between-rounds question.
///
/// Both read from any `BufRead` and write to any `Write`, so tests can script them.
use palate_core::{Choice, ComparisonResolver, PalateError, Result};
use std::io::{BufRead, Write};

/// Read one trimmed line. `None` on end of input.
fn read_answer(input: &mut impl BufRead) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Asks the user to pick between two items, re-asking on anything but "1" or "2".
pub struct TerminalResolver<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> TerminalResolver<I, O> {
    pub fn new(input: I, output: O) -> Self {
        TerminalResolver { input, output }
    }

    fn ask(&mut self, first: &str, second: &str) -> std::io::Result<Option<Choice>> {
        writeln!(self.output, "Do you prefer: {first} or {second}?")?;
        loop {
            write!(self.output, "Enter 1 for the first option or 2 for the second: ")?;
            self.output.flush()?;

            match read_answer(&mut self.input)?.as_deref() {
                None => return Ok(None),
                Some("1") => return Ok(Some(Choice::First)),
                Some("2") => return Ok(Some(Choice::Second)),
                Some(_) => writeln!(self.output, "Invalid choice. Please enter '1' or '2'.")?,
            }
        }
    }
}

impl<I: BufRead, O: Write> ComparisonResolver for TerminalResolver<I, O> {
    fn resolve(&mut self, first: &str, second: &str) -> Result<Choice> {
        let failure = |reason: String| PalateError::Resolver {
            first: first.to_string(),
            second: second.to_string(),
            reason,
        };
        match self.ask(first, second) {
            Ok(Some(choice)) => Ok(choice),
            Ok(None) => Err(failure("input closed".to_string())),
            Err(e) => Err(failure(e.to_string())),
        }
    }
}

/// Ask whether to play another round. End of input means stop.
pub fn ask_play_again(input: &mut impl BufRead, output: &mut impl Write) -> std::io::Result<bool> {
    loop {
        write!(output, "Play another round? Enter 1 to stop or 2 to continue: ")?;
        output.flush()?;
        match read_answer(input)?.as_deref() {
            None | Some("1") => return Ok(false),
            Some("2") => return Ok(true),
            Some(_) => writeln!(output, "Invalid choice. Please enter '1' or '2'.")?,
        }
    }
}
