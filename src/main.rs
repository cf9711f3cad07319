//! Fumen command-line tool (default binary).
//!
//! ```text
//! fumen decode <fumen>          pages as JSON
//! fumen encode                  JSON pages on stdin -> fumen
//! fumen normalize <fumen>       decode and re-encode
//! fumen show <fumen> [page]     board, comment and next pieces of one page
//! ```
//!
//! Set `FUMEN_VERBOSE=1` for progress lines on stderr.

use std::io::Read;

use anyhow::{anyhow, bail, Context, Result};

use fumen_editor::codec::{decode_async, encode_async};
use fumen_editor::core::{Page, PrimitivePage};
use fumen_editor::engine::{EditorConfig, PageComment, PageStore};

const USAGE: &str = "usage: fumen <decode|encode|normalize|show> [fumen] [page]";

#[tokio::main]
async fn main() -> Result<()> {
    let config = EditorConfig::from_env();
    let args: Vec<String> = std::env::args().skip(1).collect();

    let Some(command) = args.first() else {
        bail!(USAGE);
    };
    let input = || {
        args.get(1)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("missing fumen argument\n{}", USAGE))
    };

    match command.as_str() {
        "decode" => decode_command(input()?, &config).await,
        "encode" => encode_command(&config).await,
        "normalize" => normalize_command(input()?, &config).await,
        "show" => {
            let index = match args.get(2) {
                Some(s) => s.parse().with_context(|| format!("invalid page index {:?}", s))?,
                None => 0,
            };
            show_command(input()?, index, &config).await
        }
        other => bail!("unknown command {:?}\n{}", other, USAGE),
    }
}

async fn load(data: &str, config: &EditorConfig) -> Result<Vec<Page>> {
    let pages = decode_async(data, config.yield_every)
        .await
        .context("failed to decode fumen")?;
    if config.verbose {
        eprintln!("[Fumen] decoded {} pages", pages.len());
    }
    Ok(pages)
}

async fn decode_command(data: &str, config: &EditorConfig) -> Result<()> {
    let pages = load(data, config).await?;
    let primitive: Vec<PrimitivePage> = pages.iter().map(PrimitivePage::from).collect();
    println!("{}", serde_json::to_string_pretty(&primitive)?);
    Ok(())
}

async fn encode_command(config: &EditorConfig) -> Result<()> {
    let mut json = String::new();
    std::io::stdin()
        .read_to_string(&mut json)
        .context("failed to read stdin")?;
    let primitive: Vec<PrimitivePage> =
        serde_json::from_str(&json).context("stdin is not a JSON page list")?;
    let pages = primitive
        .into_iter()
        .map(Page::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    // validates references the same way an editor session would
    let store = PageStore::new(pages)?;
    if config.verbose {
        eprintln!("[Fumen] encoding {} pages", store.len());
    }
    println!("{}", encode_async(store.pages(), config.yield_every).await?);
    Ok(())
}

async fn normalize_command(data: &str, config: &EditorConfig) -> Result<()> {
    let pages = load(data, config).await?;
    println!("{}", encode_async(&pages, config.yield_every).await?);
    Ok(())
}

async fn show_command(data: &str, index: usize, config: &EditorConfig) -> Result<()> {
    let mut store = PageStore::new(load(data, config).await?)?;
    let page = store.resolved_page(index)?;

    println!("page {}/{}", index + 1, store.len());
    println!("{}", page.field);
    if let Some(piece) = page.piece {
        println!(
            "piece: {} {} ({}, {}){}",
            piece.piece.as_char(),
            piece.rotation.as_str(),
            piece.x,
            piece.y,
            if page.flags.lock { "" } else { " unlocked" }
        );
    }
    match &page.comment {
        PageComment::Text { text, next } => {
            if !text.is_empty() {
                println!("comment: {}", text);
            }
            if !next.is_empty() {
                let next: String = next.iter().map(|p| p.as_char()).collect();
                println!("next: {}", next);
            }
        }
        PageComment::Quiz {
            quiz,
            after_operation,
        } => {
            println!("quiz: {}", quiz.format());
            println!("after: {}", after_operation.format());
        }
    }
    Ok(())
}
