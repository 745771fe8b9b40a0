//! Interactive loop: read a line, make one remote call, print the reply.
//!
//! The loop alternates between awaiting input and dispatching. The next line
//! is only read once the previous call has finished.

use std::io;

use rex_client::CommandClient;
use rex_protocol::Request;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Split on whitespace: the first token is the method, the rest are
/// arguments. Blank input gives an empty method, which the host reports as
/// not found.
pub fn parse_command(line: &str) -> Request {
    let mut tokens = line.split_whitespace();
    let method = tokens.next().unwrap_or_default().to_string();
    Request::new(method, tokens.map(str::to_string).collect())
}

/// Prompt showing this process's working directory (not the host's).
pub fn local_prompt() -> String {
    match std::env::current_dir() {
        Ok(dir) => format!("{}> ", dir.display()),
        Err(_) => "> ".to_string(),
    }
}

enum State {
    AwaitingInput,
    Dispatching(Request),
    Closed,
}

pub struct Repl<R, W> {
    client: CommandClient,
    input: R,
    output: W,
    prompt: fn() -> String,
}

impl<R, W> Repl<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(client: CommandClient, input: R, output: W) -> Self {
        Self {
            client,
            input,
            output,
            prompt: local_prompt,
        }
    }

    pub fn with_prompt(mut self, prompt: fn() -> String) -> Self {
        self.prompt = prompt;
        self
    }

    /// Run until the input ends. Returns the output sink.
    pub async fn run(mut self) -> io::Result<W> {
        let mut state = State::AwaitingInput;
        loop {
            state = match state {
                State::AwaitingInput => self.read_command().await?,
                State::Dispatching(request) => {
                    self.dispatch(request).await?;
                    State::AwaitingInput
                }
                State::Closed => return Ok(self.output),
            };
        }
    }

    async fn read_command(&mut self) -> io::Result<State> {
        let prompt = (self.prompt)();
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            self.output.write_all(b"\n").await?;
            self.output.flush().await?;
            return Ok(State::Closed);
        }
        Ok(State::Dispatching(parse_command(&line)))
    }

    async fn dispatch(&mut self, request: Request) -> io::Result<()> {
        let line = match self.client.send(&request).await {
            Ok(reply) => reply.body,
            Err(err) => {
                tracing::debug!(method = %request.method, "call failed: {err}");
                format!("Failed to run {}", request.method)
            }
        };
        self.output.write_all(line.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }
}
