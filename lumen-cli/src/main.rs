//! Render a template file against a JSON property set and print the
//! resulting HTML.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use lumen_core::{Component, ComponentConfig, Context, ShadowMode};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "lumen", about = "lumen component framework CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mount a template and print the rendered HTML.
    Render {
        /// Template file.
        template: PathBuf,
        /// Component properties as a JSON object.
        #[arg(long)]
        props: Option<String>,
        /// Component context as a JSON object.
        #[arg(long)]
        context: Option<String>,
        /// Host tag name.
        #[arg(long, default_value = "lumen-view")]
        tag: String,
        /// Shadow mode: open, closed or none.
        #[arg(long, default_value = "open")]
        shadow: String,
        /// Print the host element too, not just its content.
        #[arg(long)]
        host: bool,
    },
}

fn parse_object(source: Option<&str>, what: &str) -> anyhow::Result<Vec<(String, Value)>> {
    let Some(source) = source else {
        return Ok(Vec::new());
    };
    let value: Value =
        serde_json::from_str(source).with_context(|| format!("parsing --{what}"))?;
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => bail!("--{what} must be a JSON object"),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            template,
            props,
            context,
            tag,
            shadow,
            host,
        } => {
            let markup = fs::read_to_string(&template)
                .with_context(|| format!("reading {}", template.display()))?;

            let mut config = ComponentConfig::new(tag, markup);
            config.shadow_mode = ShadowMode::parse(&shadow)?;
            config.context = parse_object(context.as_deref(), "context")?
                .into_iter()
                .collect::<Context>();

            let component = Component::new(config)?;
            for (name, value) in parse_object(props.as_deref(), "props")? {
                component.set_property(name, value);
            }
            component.mount();

            let root = component.root();
            if host {
                println!("{}", root.outer_html());
            } else {
                println!("{}", root.inner_html());
            }
        }
    }
    Ok(())
}
