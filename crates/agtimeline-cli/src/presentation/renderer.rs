use anyhow::Result;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt::Display;

use crate::types::OutputFormat;

/// JSON envelope for every command result
#[derive(Debug, Serialize)]
pub struct CommandResult<T>
where
    T: Serialize,
{
    pub content: T,
}

impl<T> CommandResult<T>
where
    T: Serialize,
{
    pub fn new(content: T) -> Self {
        Self { content }
    }
}

/// View model with a one-line heading printed above its plain-text body
pub trait TitledView: Serialize + Display {
    fn title(&self) -> String;
}

pub struct ConsoleRenderer {
    json_mode: bool,
    color: bool,
}

impl ConsoleRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            json_mode: format == OutputFormat::Json,
            color: std::io::stdout().is_terminal(),
        }
    }

    pub fn render<T>(&self, view: T) -> Result<()>
    where
        T: TitledView,
    {
        if self.json_mode {
            println!("{}", serde_json::to_string_pretty(&CommandResult::new(view))?);
            return Ok(());
        }

        let title = view.title();
        if self.color {
            println!("{}", title.bold());
        } else {
            println!("{}", title);
        }
        print!("{}", view);

        Ok(())
    }
}
