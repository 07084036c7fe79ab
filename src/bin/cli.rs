use gridview::coloring::{ColorMode, ColorRule, RuleCondition};
use gridview::field::{FieldRegistry, FieldType};
use gridview::filter::{EvalContext, FilterCondition, FilterValue, Operator};
use gridview::grouping::SortSpec;
use gridview::loader::load_records;
use gridview::pipeline::{Projection, ProjectionStatus, project};
use gridview::record::Record;
use gridview::saving::{Autosave, FileStore, load_view_state};
use gridview::view::ViewState;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use std::env;
use std::io::{self, Write};
use std::time::{Duration, Instant};

lazy_static! {
    static ref COMMAND_REGEX: Regex = Regex::new(r"^(\w+)\s*(.*)$").unwrap();
    static ref FILTER_REGEX: Regex = Regex::new(r"^(\S+)\s+(\S+)\s*(.*)$").unwrap();
    static ref RULE_REGEX: Regex = Regex::new(
        r"^(\S+)\s+(equals|contains|not_equals)\s+(.+?)\s+(#[0-9A-Fa-f]{3,8})(?:\s+(#[0-9A-Fa-f]{3,8}))?$"
    )
    .unwrap();
}

const STATE_KEY: &str = "view";
const AUTOSAVE_DELAY: Duration = Duration::from_millis(500);

fn print_help() {
    println!("Commands:");
    println!("  q: Quit");
    println!("  show: Redraw the grid");
    println!("  disable_output / enable_output: Toggle redrawing after each command");
    println!("  fields: List fields and their operators");
    println!("  filter <field> <operator> <value>: Add a condition (use a|b|c for in/not_in)");
    println!("  quick <field> <value>: Add an equals condition");
    println!("  unfilter <id>: Remove a condition (an id prefix is enough)");
    println!("  clear_filters: Remove every condition");
    println!("  search [text]: Set or clear the search text");
    println!("  group <field>|none: Group rows");
    println!("  sort <field> asc|desc, sort none: Sort rows inside each group");
    println!("  hide <field>: Toggle a field's visibility");
    println!("  color none|status|priority|custom: Pick the colour mode");
    println!("  rule <field> <equals|contains|not_equals> <value> <#bg> [#text]: Add a colour rule");
    println!("  rules on|off: Toggle colouring by rule");
    println!("  clear_rules: Remove every colour rule");
}

fn print_fields(registry: &FieldRegistry, view: &ViewState) {
    for field in registry.fields() {
        let ops: Vec<&str> = field.semantic_type.operators().iter().map(|o| o.as_str()).collect();
        let hidden = if view.is_hidden(&field.id) { " (hidden)" } else { "" };
        println!(
            "  {:<12} {:<8} {}{}",
            field.id,
            field.semantic_type,
            ops.join(", "),
            hidden
        );
    }
}

fn display(view: &ViewState, registry: &FieldRegistry, projection: &Projection) {
    let columns = view.visible_fields(registry);
    let header: Vec<&str> = std::iter::once("id").chain(columns.iter().copied()).collect();

    match projection.status() {
        ProjectionStatus::NoMatches => {
            println!("No records match ({} total)", projection.total);
            return;
        }
        ProjectionStatus::Degraded => {
            for warning in &projection.warnings {
                println!("! filter {} ignored: {}", short(&warning.condition_id), warning.message);
            }
        }
        ProjectionStatus::Rows => {}
    }

    for group in projection.groups.groups() {
        if view.group_by().is_some() {
            let key = if group.key.is_empty() { "(empty)" } else { group.key.as_str() };
            println!("== {} ({}) ==", key, group.records.len());
        }
        println!("{}", header.join("\t\t"));
        for record in &group.records {
            print_row(view, record, &columns);
        }
    }
    println!("{} of {} records", projection.matched(), projection.total);
}

fn print_row(view: &ViewState, record: &Record, columns: &[&str]) {
    let mut cells = vec![record.id.clone()];
    cells.extend(columns.iter().map(|c| record.text_of(c)));
    match view.color_for(record) {
        Some(color) => println!("{}\t\t[{}]", cells.join("\t\t"), color.background_color),
        None => println!("{}", cells.join("\t\t")),
    }
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn parse_value(registry: &FieldRegistry, field: &str, operator: &Operator, raw: &str) -> FilterValue {
    let raw = raw.trim();
    if matches!(operator, Operator::In | Operator::NotIn) {
        return FilterValue::List(raw.split('|').map(|s| s.trim().to_string()).collect());
    }
    match registry.resolve(field).map(|f| f.semantic_type) {
        Ok(FieldType::Number) => match raw.parse::<f64>() {
            Ok(n) => FilterValue::from(n),
            Err(_) => FilterValue::from(raw),
        },
        _ => FilterValue::from(raw),
    }
}

/// Applies one command to the view. Returns the status text for the prompt.
fn run_command(command: &str, args: &str, view: &mut ViewState, registry: &FieldRegistry) -> String {
    match command {
        "filter" => {
            let Some(caps) = FILTER_REGEX.captures(args) else {
                return "usage: filter <field> <operator> <value>".to_string();
            };
            let field = &caps[1];
            if !registry.contains(field) {
                return format!("unknown field {}", field);
            }
            let operator: Operator = caps[2].parse().unwrap_or(Operator::Unknown);
            let value = parse_value(registry, field, &operator, &caps[3]);
            let condition = FilterCondition::new(field, operator, value);
            let id = condition.id.clone();
            view.add_filter(condition);
            format!("added {}", short(&id))
        }
        "quick" => match args.split_once(' ') {
            Some((field, value)) if registry.contains(field) => {
                let id = view.add_quick_filter(field, value.trim());
                format!("added {}", short(&id))
            }
            _ => "usage: quick <field> <value>".to_string(),
        },
        "unfilter" => {
            let target = view
                .filters()
                .conditions()
                .iter()
                .find(|c| !args.is_empty() && c.id.starts_with(args))
                .map(|c| c.id.clone());
            match target {
                Some(id) => {
                    view.remove_filter(&id);
                    "ok".to_string()
                }
                None => "no such filter".to_string(),
            }
        }
        "clear_filters" => {
            view.clear_filters();
            "ok".to_string()
        }
        "search" => {
            view.set_search_query(args);
            "ok".to_string()
        }
        "group" => match args {
            "" | "none" => {
                view.set_group_by(None);
                "ok".to_string()
            }
            field if registry.contains(field) => {
                view.set_group_by(Some(field.to_string()));
                "ok".to_string()
            }
            field => format!("unknown field {}", field),
        },
        "sort" => {
            let mut parts = args.split_whitespace();
            match (parts.next(), parts.next()) {
                (None, _) | (Some("none"), _) => {
                    view.set_sort_by(None);
                    "ok".to_string()
                }
                (Some(field), _) if !registry.contains(field) => format!("unknown field {}", field),
                (Some(field), None | Some("asc")) => {
                    view.set_sort_by(Some(SortSpec::asc(field)));
                    "ok".to_string()
                }
                (Some(field), Some("desc")) => {
                    view.set_sort_by(Some(SortSpec::desc(field)));
                    "ok".to_string()
                }
                _ => "usage: sort <field> asc|desc".to_string(),
            }
        }
        "hide" => {
            if !registry.contains(args) {
                return format!("unknown field {}", args);
            }
            if view.toggle_field_visibility(args) {
                format!("{} hidden", args)
            } else {
                format!("{} shown", args)
            }
        }
        "color" => {
            let mode = match args {
                "none" => ColorMode::None,
                "status" => ColorMode::Status,
                "priority" => ColorMode::Priority,
                "custom" => ColorMode::Custom,
                _ => return "usage: color none|status|priority|custom".to_string(),
            };
            view.set_color_mode(mode);
            "ok".to_string()
        }
        "rule" => {
            let Some(caps) = RULE_REGEX.captures(args) else {
                return "usage: rule <field> <equals|contains|not_equals> <value> <#bg> [#text]"
                    .to_string();
            };
            let condition = match &caps[2] {
                "equals" => RuleCondition::Equals,
                "contains" => RuleCondition::Contains,
                _ => RuleCondition::NotEquals,
            };
            let text = caps.get(5).map_or("#111827", |m| m.as_str());
            view.add_color_rule(ColorRule::new(&caps[1], condition, &caps[3], text, &caps[4]));
            "ok".to_string()
        }
        "rules" => match args {
            "on" => {
                view.set_color_by_condition(true);
                "ok".to_string()
            }
            "off" => {
                view.set_color_by_condition(false);
                "ok".to_string()
            }
            _ => "usage: rules on|off".to_string(),
        },
        "clear_rules" => {
            view.clear_color_rules();
            "ok".to_string()
        }
        _ => "invalid command".to_string(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        eprintln!(
            "Usage: {} <records.json|records.csv> [state-dir]",
            args.first().map_or("gridview-cli", String::as_str)
        );
        return Ok(());
    }

    let registry = FieldRegistry::standard();
    let records = load_records(&args[1], &registry)?;
    info!("loaded {} records from {}", records.len(), args[1]);

    let mut store = match args.get(2) {
        Some(dir) => Some(FileStore::open(dir)?),
        None => None,
    };
    let mut view = match &store {
        Some(store) => load_view_state(store, STATE_KEY)?.unwrap_or_default(),
        None => ViewState::new(),
    };
    let mut autosave = Autosave::new(STATE_KEY, AUTOSAVE_DELAY);

    let ctx = EvalContext::default();
    let mut status = String::from("ok");
    let mut show = true;
    let mut start_time = Instant::now();

    loop {
        if show {
            match project(&view, &records, &registry, &ctx) {
                Ok(projection) => display(&view, &registry, &projection),
                Err(e) => println!("! {}", e),
            }
        }

        let elapsed_time = start_time.elapsed().as_secs_f64();
        print!("[{:.1}] ({}) > ", elapsed_time, status);
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        start_time = Instant::now();

        if let Some(store) = store.as_mut() {
            autosave.poll(start_time, store, &view)?;
        }

        let Some(caps) = COMMAND_REGEX.captures(line) else {
            status = String::from("invalid command");
            continue;
        };
        let (command, rest) = (&caps[1], caps[2].trim());

        match command {
            "q" => break,
            "help" => {
                print_help();
                continue;
            }
            "fields" => {
                print_fields(&registry, &view);
                continue;
            }
            "show" => {
                show = true;
                status = String::from("ok");
                continue;
            }
            "disable_output" => {
                show = false;
                status = String::from("ok");
                continue;
            }
            "enable_output" => {
                show = true;
                status = String::from("ok");
                continue;
            }
            _ => {}
        }

        let before = view.clone();
        status = run_command(command, rest, &mut view, &registry);
        if view != before {
            autosave.touch(start_time);
        }
    }

    if let Some(store) = store.as_mut() {
        autosave.flush(store, &view)?;
    }
    Ok(())
}
