use dialoguer::{Input, Password};
use std::io::{self, BufRead, IsTerminal, Write};

/// Where the setup flow gets its answers from.
pub trait Console {
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;

    /// Like [`Console::read_line`], but the answer should not be echoed.
    fn read_secret(&mut self, prompt: &str) -> io::Result<String>;
}

/// Interactive prompts on the controlling terminal. Prompts are written to
/// stderr, leaving stdout to the report. Unless both stdin and stderr are
/// terminals the answers are read line by line instead.
pub struct Terminal {
    interactive: bool,
}

impl Terminal {
    pub fn new() -> Terminal {
        Terminal {
            interactive: use_prompts(io::stdin().is_terminal(), io::stderr().is_terminal()),
        }
    }
}

// dialoguer draws its prompts on stderr and refuses to run without a tty there
fn use_prompts(stdin_tty: bool, stderr_tty: bool) -> bool {
    stdin_tty && stderr_tty
}

impl Default for Terminal {
    fn default() -> Self {
        Terminal::new()
    }
}

impl Console for Terminal {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        if !self.interactive {
            return read_plain(&mut io::stdin().lock(), &mut io::stderr(), prompt);
        }
        let answer: String = Input::new()
            .with_prompt(prompt)
            .interact_text()
            .map_err(io::Error::other)?;
        Ok(answer.trim().to_string())
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        if !self.interactive {
            return read_plain(&mut io::stdin().lock(), &mut io::stderr(), prompt);
        }
        Password::new()
            .with_prompt(prompt)
            .interact()
            .map_err(io::Error::other)
    }
}

fn read_plain<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> io::Result<String> {
    write!(out, "{}: ", prompt)?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("input closed before {} was given", prompt.to_lowercase()),
        ));
    }
    Ok(line.trim().to_string())
}
