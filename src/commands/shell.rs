use super::build_editor;
use anyhow::Result;
use colored::Colorize;
use cost_estimator::catalog::LOCATION_ATTRIBUTE;
use cost_estimator::client::PricingApi;
use cost_estimator::config::Config;
use cost_estimator::editor::{Editor, Outcome};
use cost_estimator::region::Region;
use cost_estimator::render;
use cost_estimator::state::LineItemId;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const HELP: &str = "\
Commands (items are numbered from 1):
  add                        add a new resource
  rm <n>                     remove resource n
  service <n> <code>         select a service for resource n
  set <n> <attribute> <value> choose a value (empty value clears it)
  qty <n> <count>            set the quantity of resource n
  advanced <n>               toggle the advanced attribute view
  values <n> <attribute>     load allowed values of an advanced attribute
  show [n]                   show the summary, or resource n in detail
  services                   list available services
  region <code>              switch region
  account <id>               set the account ID
  estimate                   recompute all estimates
  help                       show this help
  quit                       leave the shell";

/// One line of shell input
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Add,
    Remove(usize),
    Service(usize, String),
    Set(usize, String, String),
    Quantity(usize, u32),
    Advanced(usize),
    Values(usize, String),
    Show(Option<usize>),
    Services,
    Region(String),
    Account(String),
    Estimate,
    Help,
    Quit,
}

fn parse_index(arg: Option<&str>) -> Result<usize, String> {
    let arg = arg.ok_or_else(|| "missing resource number".to_string())?;
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("'{}' is not a resource number", arg)),
    }
}

fn required<'a>(arg: Option<&'a str>, what: &str) -> Result<&'a str, String> {
    arg.ok_or_else(|| format!("missing {}", what))
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "add" | "new" => Self::Add,
            "rm" | "remove" => Self::Remove(parse_index(words.next())?),
            "service" | "svc" => {
                let index = parse_index(words.next())?;
                Self::Service(index, required(words.next(), "service code")?.to_string())
            }
            "set" => {
                let index = parse_index(words.next())?;
                let attribute = required(words.next(), "attribute")?.to_string();
                let value = words.collect::<Vec<_>>().join(" ");
                Self::Set(index, attribute, value)
            }
            "qty" | "quantity" => {
                let index = parse_index(words.next())?;
                let count = required(words.next(), "quantity")?;
                match count.parse::<u32>() {
                    Ok(n) if n > 0 => Self::Quantity(index, n),
                    _ => return Err("quantity must be a positive integer".to_string()),
                }
            }
            "advanced" | "adv" => Self::Advanced(parse_index(words.next())?),
            "values" => {
                let index = parse_index(words.next())?;
                Self::Values(index, required(words.next(), "attribute")?.to_string())
            }
            "show" | "ls" => match words.next() {
                Some(arg) => Self::Show(Some(parse_index(Some(arg))?)),
                None => Self::Show(None),
            },
            "services" => Self::Services,
            "region" => Self::Region(required(words.next(), "region code")?.to_string()),
            "account" => Self::Account(words.collect::<Vec<_>>().join(" ")),
            "estimate" | "calc" => Self::Estimate,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };
        Ok(Some(command))
    }
}

fn item_id<P: PricingApi>(editor: &Editor<P>, index: usize) -> Result<LineItemId, String> {
    editor
        .session()
        .items
        .get(index - 1)
        .map(|item| item.id)
        .ok_or_else(|| format!("no resource #{}", index))
}

fn report_outcome(outcome: &Outcome, success: &str) {
    match outcome {
        Outcome::Applied => println!("{}", success.green()),
        Outcome::Ignored => println!("{}", "nothing to do".dimmed()),
        Outcome::Discarded => println!("{}", "superseded by a newer request".dimmed()),
        Outcome::Failed(failure) => println!("{} {}", "✗".red(), failure),
    }
}

/// Run one command against the editor. Returns false when the shell should exit.
pub async fn run_command<P: PricingApi>(
    editor: &mut Editor<P>,
    command: ShellCommand,
) -> Result<bool, String> {
    match command {
        ShellCommand::Add => {
            let id = editor.add_item();
            println!(
                "Added resource #{} ({})",
                editor.session().items.len(),
                id.short()
            );
        }
        ShellCommand::Remove(index) => {
            let id = item_id(editor, index)?;
            editor.remove_item(id);
            println!("Removed resource #{}", index);
        }
        ShellCommand::Service(index, code) => {
            let id = item_id(editor, index)?;
            if !editor.session().catalog.services.is_empty()
                && !editor.session().catalog.services.contains(&code)
            {
                println!("{} '{}' is not in the service list", "warning:".yellow(), code);
            }
            println!("{}", format!("Loading {} options...", code).dimmed());
            let outcome = editor.select_service(id, &code).await;
            report_outcome(&outcome, &format!("Resource #{} is now {}", index, code));
            if outcome.is_applied() {
                if let Some(item) = editor.session().item(id) {
                    print!("{}", render::item_detail(item));
                }
            }
        }
        ShellCommand::Set(index, attribute, value) => {
            let id = item_id(editor, index)?;
            if attribute == LOCATION_ATTRIBUTE {
                return Err("location follows the region, use 'region <code>'".to_string());
            }
            if !editor.update_selection(id, &attribute, &value) {
                return Err(format!(
                    "resource #{} has no attribute '{}' (see 'show {}' or 'advanced {}')",
                    index, attribute, index, index
                ));
            }
        }
        ShellCommand::Quantity(index, count) => {
            let id = item_id(editor, index)?;
            editor.set_quantity(id, count);
        }
        ShellCommand::Advanced(index) => {
            let id = item_id(editor, index)?;
            editor.toggle_advanced(id);
            if let Some(item) = editor.session().item(id) {
                print!("{}", render::item_detail(item));
            }
        }
        ShellCommand::Values(index, attribute) => {
            let id = item_id(editor, index)?;
            let outcome = editor.load_attribute_values(id, &attribute).await;
            report_outcome(&outcome, &format!("Loaded values for {}", attribute));
        }
        ShellCommand::Show(None) => print!("{}", render::summary(editor.session())),
        ShellCommand::Show(Some(index)) => {
            let id = item_id(editor, index)?;
            if let Some(item) = editor.session().item(id) {
                print!("{}", render::item_detail(item));
            }
        }
        ShellCommand::Services => {
            if editor.session().catalog.services.is_empty() {
                report_outcome(&editor.load_services().await, "Service list loaded");
            }
            println!("{}", editor.session().catalog.services.join("  "));
        }
        ShellCommand::Region(code) => {
            let region = code.parse::<Region>().map_err(|e| e.to_string())?;
            editor.set_region(region);
            println!("Region: {}", region.display_name());
        }
        ShellCommand::Account(account_id) => editor.set_account(account_id),
        ShellCommand::Estimate => {
            println!("{}", "Estimating...".dimmed());
            let report = editor.recompute_estimates().await;
            for (id, failure) in report.failures() {
                println!("{} {}: {}", "✗".red(), id.short(), failure);
            }
            print!("{}", render::summary(editor.session()));
        }
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Quit => return Ok(false),
    }
    Ok(true)
}

/// Execute the shell command
///
/// Reads commands from stdin until `quit` or end of input
pub async fn execute(cfg: &Config, region: Option<String>, account: Option<String>) -> Result<()> {
    let mut editor = build_editor(cfg, region.as_deref(), account.as_deref())?;

    println!("{}", "Cloud Cost Estimator".bold());
    println!(
        "Region {} ({}), pricing API {}",
        editor.session().region.display_name(),
        editor.session().region.code(),
        editor.api().base_url()
    );

    if let Outcome::Failed(failure) = editor.load_services().await {
        println!("{} {}", "warning:".yellow(), failure);
    } else {
        println!("{} services available", editor.session().catalog.services.len());
    }
    println!("Type 'help' for commands.");
    info!("Shell started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".cyan());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{} {}", "error:".red(), message);
                continue;
            }
        };

        match run_command(&mut editor, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(message) => println!("{} {}", "error:".red(), message),
        }
    }

    info!(items = editor.session().items.len(), total = editor.total(), "Shell finished");
    Ok(())
}
