//! Kestrel layout inspector
//!
//! Lays out a JSON document fixture and prints what the layout core makes
//! of it: the render tree, the line boxes, and the answers to the caret,
//! hit test and selection queries listed in the fixture.
//!
//! - kestrel demos/wrapped.json           # Tree and query answers
//! - kestrel --lines demos/wrapped.json   # Also every line box
//! - kestrel --json demos/wrapped.json    # Everything as JSON

mod fixture;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use kestrel_dom::NodeId;
use kestrel_layout::dump::{ObjectSnapshot, dump_line_boxes, dump_render_tree, snapshot};
use kestrel_layout::{
    Document, Granularity, HitTestAction, Position, Rect, SelectionRange, SelectionState,
};
use owo_colors::OwoColorize;
use serde::Serialize;

use fixture::{Built, Fixture, Labels, Queries};

/// Kestrel: inspect the layout of a document fixture
#[derive(Parser, Debug)]
#[command(name = "kestrel")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the render tree and answer the fixture's queries
    kestrel demos/wrapped.json

    # Include the line box tree of every block
    kestrel --lines demos/wrapped.json

    # Lay out at another viewport width
    kestrel --width 320 demos/wrapped.json

    # Machine-readable output
    kestrel --json demos/wrapped.json
"#)]
struct Cli {
    /// Path to the JSON fixture
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Print the line box tree of every block
    #[arg(long)]
    lines: bool,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,

    /// Override the viewport width from the fixture
    #[arg(long, value_name = "PX")]
    width: Option<i32>,

    /// Show layout debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Caret rectangle at one position.
#[derive(Debug, Serialize)]
struct CaretReport {
    label: String,
    position: Position,
    rect: Rect,
}

/// What a document point hit.
#[derive(Debug, Serialize)]
struct HitReport {
    x: i32,
    y: i32,
    node: Option<NodeId>,
    position: Position,
}

/// A selection after validation.
#[derive(Debug, Serialize)]
struct SelectionReport {
    granularity: Granularity,
    start: Position,
    end: Position,
    state: SelectionState,
    range: Option<SelectionRange>,
    caret: Rect,
}

/// Everything the inspector prints.
#[derive(Debug, Serialize)]
struct Report {
    tree: ObjectSnapshot,
    carets: Vec<CaretReport>,
    hits: Vec<HitReport>,
    selections: Vec<SelectionReport>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let mut fixture = Fixture::load(&cli.path)?;
    if let Some(width) = cli.width {
        fixture.settings.viewport_width = width;
    }
    let Built { dom, styles, labels } = fixture.build()?;
    let mut doc = Document::with_styles(dom, styles, fixture.settings.clone());
    doc.layout();
    log::debug!("laid out {}", cli.path.display());

    let report = answer(&mut doc, &labels, &fixture.queries)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "=== Render Tree ===".bold());
    print!("{}", dump_render_tree(doc.view()));
    if cli.lines {
        println!("\n{}", "=== Line Boxes ===".bold());
        print!("{}", dump_line_boxes(doc.view()));
    }
    print_answers(&labels, &report);
    Ok(())
}

/// Run the fixture's queries against the laid-out document.
fn answer(doc: &mut Document, labels: &Labels, queries: &Queries) -> Result<Report> {
    let mut carets = Vec::new();
    for spec in &queries.carets {
        let position = labels.position(spec)?;
        let node = labels.node(&spec.node)?;
        carets.push(CaretReport {
            label: spec.node.clone(),
            position,
            rect: doc.caret_rect(node, spec.offset)?,
        });
    }

    let hits = queries
        .hits
        .iter()
        .map(|&(x, y)| {
            let hit = doc.hit_test(x, y, 0, 0, HitTestAction::All);
            HitReport {
                x,
                y,
                node: hit.as_ref().and_then(|h| h.node),
                position: hit.map_or_else(Position::empty, |h| h.position),
            }
        })
        .collect();

    let mut selections = Vec::new();
    for spec in &queries.selections {
        let granularity = spec.granularity()?;
        doc.set_selection(labels.position(&spec.base)?, labels.position(&spec.extent)?)?;
        if granularity != Granularity::Character {
            let _ = doc.expand_selection(granularity);
        }
        let selection = doc.selection();
        let (start, end, state) = (selection.start(), selection.end(), selection.state());
        selections.push(SelectionReport {
            granularity,
            start,
            end,
            state,
            range: doc.selection_range(),
            caret: doc.selection_caret_rect(),
        });
    }

    Ok(Report {
        tree: snapshot(doc.view()),
        carets,
        hits,
        selections,
    })
}

fn describe(labels: &Labels, position: Position) -> String {
    match position.node {
        Some(node) => format!("{}@{}", labels.name_of(node), position.offset),
        None => String::from("(none)"),
    }
}

fn describe_rect(rect: Rect) -> String {
    format!("({}, {}) {}x{}", rect.x, rect.y, rect.width, rect.height)
}

fn print_answers(labels: &Labels, report: &Report) {
    if !report.carets.is_empty() {
        println!("\n{}", "=== Carets ===".bold());
        for caret in &report.carets {
            println!(
                "  {} {}",
                describe(labels, caret.position).cyan(),
                describe_rect(caret.rect)
            );
        }
    }

    if !report.hits.is_empty() {
        println!("\n{}", "=== Hit Tests ===".bold());
        for hit in &report.hits {
            let node = hit.node.map_or_else(|| String::from("nothing"), |n| labels.name_of(n));
            println!(
                "  ({}, {}) -> {} at {}",
                hit.x,
                hit.y,
                node.green(),
                describe(labels, hit.position).cyan()
            );
        }
    }

    if !report.selections.is_empty() {
        println!("\n{}", "=== Selections ===".bold());
        for selection in &report.selections {
            let range = selection.range.map_or_else(
                || String::from("none"),
                |r| format!("{}..{}", describe(labels, r.start), describe(labels, r.end)),
            );
            println!(
                "  {:<9} {}..{} {} range {} caret {}",
                selection.granularity.to_string(),
                describe(labels, selection.start).cyan(),
                describe(labels, selection.end).cyan(),
                selection.state.yellow(),
                range,
                describe_rect(selection.caret)
            );
        }
    }
}
