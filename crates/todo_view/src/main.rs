use clap::{CommandFactory, Parser};
use std::io::{self, BufRead, IsTerminal};
use todo_view::cli::{Cli, Command, collect_config_overrides, expand_alias, split_command_line};
use todo_view::render::{render_rows_json, render_rows_plain};
use todo_view_core::api::{HttpTaskApi, TaskApi};
use todo_view_core::config::{
    Config, Palette, load_config_with_fallback, merge_overrides, palette_for_theme,
};
use todo_view_core::error::AppError;
use todo_view_core::view::{AddOutcome, SaveOutcome, SaveRejection, TodoListView};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "warn";
const ADD_UNSUPPORTED_NOTICE: &str = "Adding tasks is not available yet.";

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal())
                .with_target(false),
        )
        .try_init();
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

/// Defaults < config file < `TODOVIEW_API_URL` < `--config-override` < `--api-url`.
fn resolve_config(cli: &Cli) -> Result<Config, AppError> {
    let loaded = load_config_with_fallback();
    let overrides = collect_config_overrides(&cli.config_override)?;
    let mut config = merge_overrides(&loaded.config, &overrides);
    if let Some(api_url) = cli.api_url.as_ref() {
        config.api_url = Some(api_url.clone());
    }
    Ok(config)
}

fn build_view(config: &Config) -> Result<TodoListView<HttpTaskApi>, AppError> {
    let api = HttpTaskApi::new(config.api_url(), config.timeout())?;
    debug!(api_url = %api.base_url(), "using task api");
    Ok(TodoListView::new(api))
}

fn print_view<A: TaskApi>(
    view: &TodoListView<A>,
    palette: &Palette,
    json: bool,
) -> Result<(), AppError> {
    let rows = view.rows();
    if json {
        println!("{}", render_rows_json(&rows)?);
    } else {
        let loaded_at = view.state().last_loaded_label();
        println!("{}", render_rows_plain(&rows, palette, loaded_at.as_deref()));
    }
    Ok(())
}

fn rejection_error(rejection: SaveRejection) -> AppError {
    match rejection {
        SaveRejection::EmptyName => AppError::invalid_input("name is required"),
        SaveRejection::Unchanged => AppError::invalid_input("name is unchanged"),
        SaveRejection::NotEditing => AppError::invalid_input("task is not being edited"),
    }
}

/// Apply one command to the view. Returns whether the operation succeeded;
/// network failures have already been logged by the view.
fn apply_command<A: TaskApi>(view: &mut TodoListView<A>, command: Command) -> bool {
    match command {
        Command::List => view.load_tasks().is_success(),
        Command::Type { id, text } => {
            view.begin_edit(id, &text);
            true
        }
        Command::Save { id } => match view.save_edit(id) {
            SaveOutcome::Rejected(rejection) => {
                debug!(id, ?rejection, "save ignored");
                true
            }
            outcome => outcome.is_success(),
        },
        Command::Cancel => {
            view.cancel_edit();
            true
        }
        Command::Edit { id, name } => {
            view.begin_edit(id, &name);
            view.save_edit(id).is_success()
        }
        Command::Delete { id } => view.delete_task(id).is_success(),
        Command::Add => match view.add_task() {
            AddOutcome::Unsupported => {
                println!("{ADD_UNSUPPORTED_NOTICE}");
                true
            }
        },
    }
}

fn run_command(cli: Cli) -> Result<bool, AppError> {
    let command = cli.command.clone().unwrap_or(Command::List);
    if command.needs_session() {
        return Err(AppError::invalid_input(format!(
            "'{}' requires an interactive session",
            command.name()
        )));
    }

    let config = resolve_config(&cli)?;
    let palette = palette_for_theme(config.theme.as_deref());
    let mut view = build_view(&config)?;
    let mounted = view.mount();

    let succeeded = match command {
        Command::List => mounted.is_success(),
        Command::Edit { id, name } => {
            view.begin_edit(id, &name);
            match view.save_edit(id) {
                SaveOutcome::Rejected(rejection) => return Err(rejection_error(rejection)),
                outcome => outcome.is_success(),
            }
        }
        other => apply_command(&mut view, other),
    };

    print_view(&view, &palette, cli.json)?;
    Ok(succeeded)
}

fn run_interactive(cli: Cli) -> Result<(), AppError> {
    let config = resolve_config(&cli)?;
    let palette = palette_for_theme(config.theme.as_deref());
    let mut view = build_view(&config)?;
    view.mount();
    print_view(&view, &palette, cli.json)?;

    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let parsed = split_command_line(line).and_then(|args| expand_alias(args, &config.aliases));
        let args = match parsed {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("todo_view".to_string());
        argv.extend(args);

        let line_cli = match Cli::try_parse_from(argv) {
            Ok(line_cli) => line_cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Some(flag) = line_cli.startup_only_flag() {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input(format!("{flag} can only be set at startup"))
            );
            continue;
        }

        let Some(command) = line_cli.command else {
            continue;
        };

        apply_command(&mut view, command);
        if let Err(err) = print_view(&view, &palette, cli.json || line_cli.json) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if cli.command.is_none() {
        if let Err(err) = run_interactive(cli) {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    match run_command(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    }
}
