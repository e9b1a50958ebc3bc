//! Interactive terminal wizard for building a PC within a budget.
//!
//! Reads configuration from the environment (see `pc_architect::config`),
//! then walks through every component category in order.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use pc_architect::budget::{BudgetTier, UsageProfile};
use pc_architect::catalog::{CandidateOrigin, CandidateQuery, SortOrder};
use pc_architect::{Architect, BudgetProfile, BuildSession, BuildSummary, CandidateBatch, ComponentCategory, Config};

type Input = Lines<BufReader<Stdin>>;

enum Command {
    Pick(usize),
    Filter(String),
    Sort(SortOrder),
    Back,
    Restart,
    Quit,
    Unknown,
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if let Ok(n) = line.parse::<usize>() {
        return Command::Pick(n);
    }
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    match head {
        "f" => Command::Filter(rest.trim().to_string()),
        "s" => SortOrder::parse(rest).map(Command::Sort).unwrap_or(Command::Unknown),
        "b" => Command::Back,
        "r" => Command::Restart,
        "q" => Command::Quit,
        _ => Command::Unknown,
    }
}

async fn prompt(input: &mut Input, question: &str) -> anyhow::Result<Option<String>> {
    println!("{question}");
    Ok(input.next_line().await?)
}

async fn choose_index(input: &mut Input, question: &str, options: &[&str]) -> anyhow::Result<Option<usize>> {
    loop {
        println!();
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }
        let Some(line) = prompt(input, question).await? else {
            return Ok(None);
        };
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(n - 1)),
            _ => println!("Please enter a number between 1 and {}.", options.len()),
        }
    }
}

fn render_batch(step: usize, batch: &CandidateBatch, query: &CandidateQuery, spent: u64, ceiling: u64) {
    let category = batch.category;
    println!();
    println!(
        "STEP {}/{}  {}  ({})",
        step + 1,
        ComponentCategory::ALL.len(),
        category.title(),
        category.description()
    );
    println!(
        "Spent ₹{spent} of ₹{ceiling}. Target band for {}: ₹{} - ₹{}",
        category, batch.band.min, batch.band.max
    );
    if let CandidateOrigin::Fallback(reason) = &batch.origin {
        println!("(showing generic suggestions: {reason:?})");
    }
    if !query.filter.is_empty() {
        println!("Filter: \"{}\"", query.filter);
    }

    let shown = query.apply(&batch.candidates);
    if shown.is_empty() {
        println!("  No parts match the filter.");
    }
    for (i, part) in shown.iter().enumerate() {
        let marker = if batch.band.contains(part.price) { " " } else { "!" };
        println!("  {}. {}{} ₹{}", i + 1, marker, part.name, part.price);
        let specs: Vec<String> = part.specs.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        println!("       {}", specs.join(", "));
        if let Some(note) = &part.compatibility_note {
            println!("       {note}");
        }
        if let Some(link) = &part.source_link {
            println!("       {link}");
        }
    }
    println!("[number] pick  f <text> filter  s asc|desc|name sort  b back  r restart  q quit");
}

fn render_summary(summary: &BuildSummary) {
    println!();
    println!("BUILD SUMMARY ({})", summary.usage);
    for (category, part) in &summary.parts {
        println!("  {:<14} {:<40} ₹{}", category.name(), part.name, part.price);
    }
    for category in &summary.missing {
        println!("  {:<14} (not selected)", category.name());
    }
    println!("  Total ₹{} of ₹{}", summary.total, summary.ceiling);
    if summary.within_ceiling {
        println!("  ₹{} left over.", summary.remaining);
    } else {
        println!("  Over budget by ₹{}.", summary.total - summary.ceiling);
    }
}

async fn run(architect: &Architect, input: &mut Input) -> anyhow::Result<()> {
    let usages: Vec<&str> = UsageProfile::ALL.iter().map(|u| u.label()).collect();
    let Some(usage) = choose_index(input, "Primary usage?", &usages).await? else {
        return Ok(());
    };
    let tiers: Vec<&str> = BudgetTier::ALL.iter().map(|t| t.label()).collect();
    let Some(tier) = choose_index(input, "Target budget (INR)?", &tiers).await? else {
        return Ok(());
    };

    let profile = BudgetProfile::from_labels(tiers[tier], usages[usage]);
    let ceiling = profile.ceiling();
    let session = RwLock::new(BuildSession::new(profile));

    let mut step = 0;
    while step < ComponentCategory::ALL.len() {
        let category = ComponentCategory::ALL[step];
        println!("\nLooking for {} options...", category);
        let batch = architect.shop(&session, category).await?;
        let mut query = CandidateQuery::default();

        loop {
            let spent = session.read().await.ledger().spent();
            render_batch(step, &batch, &query, spent, ceiling);
            let Some(line) = prompt(input, ">").await? else {
                return Ok(());
            };
            match parse_command(&line) {
                Command::Pick(n) => {
                    let shown = query.apply(&batch.candidates);
                    let Some(part) = n.checked_sub(1).and_then(|i| shown.get(i)) else {
                        println!("No option {n}.");
                        continue;
                    };
                    let mut guard = session.write().await;
                    let Some(tag) = guard.current_request() else {
                        break;
                    };
                    guard.choose(&tag, &part.id)?;
                    step += 1;
                    break;
                }
                Command::Filter(text) => query.filter = text,
                Command::Sort(order) => query.sort = order,
                Command::Back => {
                    session.write().await.abandon();
                    step = step.saturating_sub(1);
                    break;
                }
                Command::Restart => {
                    session.write().await.restart();
                    step = 0;
                    break;
                }
                Command::Quit => {
                    render_summary(&session.read().await.summary());
                    return Ok(());
                }
                Command::Unknown => println!("Unrecognized command."),
            }
        }
    }

    render_summary(&session.read().await.summary());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pc_architect=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    tracing::info!(
        model = %config.model,
        source = config.has_source(),
        band_policy = ?config.band_policy,
        "Starting PC Architect"
    );
    let architect = Architect::from_config(&config)?;

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    run(&architect, &mut input).await
}
