use chrono::{Duration, Local, NaiveDateTime};
use std::io::{self, Write};
use task_scheduler::{
    Calendar, Deadline, Event, PlannerConfig, SqliteTaskStore, Task, WhichDays,
    load_calendar_from_csv, load_calendar_from_json, priority, save_calendar_to_csv,
    save_calendar_to_json,
};

const INPUT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
}

fn parse_due(input: &str) -> Option<Deadline> {
    if input.eq_ignore_ascii_case("anytime") {
        return Some(Deadline::Anytime);
    }
    parse_timestamp(input).map(Deadline::At)
}

fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

fn render_row(widths: &[usize], cells: &[&str]) -> String {
    let mut line = String::from("|");
    for (ci, cell) in cells.iter().enumerate() {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
        line.push_str(" |");
    }
    line
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    // Compute column widths
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, headers));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&render_row(&widths, &cells));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn task_rows(tasks: &[Task]) -> Vec<Vec<String>> {
    tasks
        .iter()
        .map(|task| {
            vec![
                task.task_id().map(|id| id.to_string()).unwrap_or_default(),
                task.name.clone(),
                task.duration.num_minutes().to_string(),
                task.due_date.to_string(),
                task.priority.to_string(),
            ]
        })
        .collect()
}

fn event_rows<'a>(events: impl Iterator<Item = &'a Event>) -> Vec<Vec<String>> {
    events
        .map(|event| {
            vec![
                event.event_id().map(|id| id.to_string()).unwrap_or_default(),
                event.name().to_string(),
                fmt_ts(event.start_time),
                fmt_ts(event.end_time),
                event.which_days.to_string(),
            ]
        })
        .collect()
}

fn print_calendar(calendar: &Calendar) {
    println!("Tasks:");
    println!(
        "{}",
        render_text_table(
            &["id", "name", "minutes", "due", "priority"],
            &task_rows(calendar.tasks())
        )
    );
    println!("Events:");
    println!(
        "{}",
        render_text_table(
            &["id", "name", "start", "end", "days"],
            &event_rows(calendar.events())
        )
    );
}

fn print_schedule(events: &[Event]) {
    println!(
        "{}",
        render_text_table(
            &["id", "name", "start", "end", "days"],
            &event_rows(events.iter())
        )
    );
}

fn print_help() {
    println!(
        "Commands:\n  help                                     Show this help\n  show                                     Show tasks and events\n  task <name> [minutes] [due|anytime] [priority]\n                                           Add a task (due like 2025-03-10T17:00,\n                                           priority high|medium|low|none|<int>)\n  event <name> <start> <end> [days]        Add an event (days like mon,wed)\n  conflicts                                Check for overlapping events\n  assign [break_minutes]                   Sequence tasks earliest due date first\n  plan                                     Full scheduler over tasks and events\n  save <json|csv> <path>                   Write a calendar snapshot\n  load <json|csv> <path>                   Read a calendar snapshot\n  db <save|load> <path>                    Persist to / hydrate from SQLite\n  quit|exit                                Exit"
    );
}

fn add_task_command(calendar: &mut Calendar, args: &[&str]) {
    let Some(name) = args.first() else {
        println!("Usage: task <name> [minutes] [due|anytime] [priority]");
        return;
    };
    let mut task = Task::new(*name);
    if let Some(minutes) = args.get(1) {
        match minutes.parse::<i64>().ok().and_then(Duration::try_minutes) {
            Some(duration) => task = task.with_duration(duration),
            None => {
                println!("Invalid minutes");
                return;
            }
        }
    }
    if let Some(due) = args.get(2) {
        match parse_due(due) {
            Some(deadline) => task = task.with_due_date(deadline),
            None => {
                println!("Invalid due date (YYYY-MM-DDTHH:MM or anytime)");
                return;
            }
        }
    }
    if let Some(level) = args.get(3) {
        match priority::parse(level) {
            Some(p) => task = task.with_priority(p),
            None => {
                println!("Invalid priority");
                return;
            }
        }
    }
    match calendar.push_task(task) {
        Ok(task) => println!("Task '{}' added.", task.name),
        Err(e) => println!("Error: {}", e),
    }
}

fn add_event_command(calendar: &mut Calendar, args: &[&str]) {
    let (Some(name), Some(start_s), Some(end_s)) = (args.first(), args.get(1), args.get(2)) else {
        println!("Usage: event <name> <start> <end> [days]");
        return;
    };
    let (Some(start), Some(end)) = (parse_timestamp(start_s), parse_timestamp(end_s)) else {
        println!("Invalid timestamp (YYYY-MM-DDTHH:MM)");
        return;
    };
    let which_days = match args.get(3) {
        Some(days) => match WhichDays::parse_list(days) {
            Some(which) => which,
            None => {
                println!("Invalid days (e.g. mon,wed,fri)");
                return;
            }
        },
        None => WhichDays::none(),
    };
    let task = Task::new(*name).with_duration(end - start);
    match Event::new(task, start, Some(end), which_days) {
        Ok(event) => {
            let kind = if event.is_recurring() { "Recurring" } else { "Definite" };
            println!("{} event '{}' added.", kind, event.name());
            calendar.add_event(event);
        }
        Err(e) => println!("Error: {}", e),
    }
}

fn print_conflicts(calendar: &Calendar) {
    if !calendar.check_all_conflict() {
        println!("No conflicts.");
        return;
    }
    for conflict in calendar.find_conflicts() {
        println!(
            "Conflict: '{}' ({} - {}) overlaps '{}' ({} - {})",
            conflict.earlier.name(),
            fmt_ts(conflict.earlier.start_time),
            fmt_ts(conflict.earlier.end_time),
            conflict.later.name(),
            fmt_ts(conflict.later.start_time),
            fmt_ts(conflict.later.end_time),
        );
    }
}

fn main() {
    env_logger::init();

    let config = match PlannerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {e}; using defaults");
            PlannerConfig::default()
        }
    };
    let mut calendar = Calendar::new();

    println!("Task Scheduler (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts[0];
        let args = &parts[1..];

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => print_calendar(&calendar),
            "task" => add_task_command(&mut calendar, args),
            "event" => add_event_command(&mut calendar, args),
            "conflicts" => print_conflicts(&calendar),
            "assign" => {
                let break_time = match args.first() {
                    Some(s) => match s.parse::<i64>().ok().and_then(Duration::try_minutes) {
                        Some(duration) => duration,
                        None => {
                            println!("Invalid break minutes");
                            continue;
                        }
                    },
                    None => config.break_time(),
                };
                let Some(start) = Local::now()
                    .naive_local()
                    .checked_add_signed(config.headstart())
                else {
                    println!("Error: headstart is out of range");
                    continue;
                };
                match calendar.assign_tasks_from(start, break_time) {
                    Ok(events) => print_schedule(&events),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "plan" => match calendar.assign_all_events(config.break_time()) {
                Ok(events) => print_schedule(&events),
                Err(e) => println!("Plan error: {}", e),
            },
            "save" => match (args.first(), args.get(1)) {
                (Some(&format), Some(path)) => {
                    let res = match format {
                        "json" => save_calendar_to_json(&calendar, path),
                        "csv" => save_calendar_to_csv(&calendar, path),
                        _ => {
                            println!("Unknown format '{}'", format);
                            continue;
                        }
                    };
                    match res {
                        Ok(_) => println!("Calendar saved to {}", path),
                        Err(e) => println!("Save error: {}", e),
                    }
                }
                _ => println!("Usage: save <json|csv> <path>"),
            },
            "load" => match (args.first(), args.get(1)) {
                (Some(&format), Some(path)) => {
                    let res = match format {
                        "json" => load_calendar_from_json(path),
                        "csv" => load_calendar_from_csv(path),
                        _ => {
                            println!("Unknown format '{}'", format);
                            continue;
                        }
                    };
                    match res {
                        Ok(loaded) => {
                            calendar = loaded;
                            println!("Calendar loaded from {}", path);
                        }
                        Err(e) => println!("Load error: {}", e),
                    }
                }
                _ => println!("Usage: load <json|csv> <path>"),
            },
            "db" => {
                let path = args
                    .get(1)
                    .map(|p| p.to_string())
                    .or_else(|| {
                        config
                            .database_path
                            .as_ref()
                            .map(|p| p.to_string_lossy().to_string())
                    });
                let (Some(&action), Some(path)) = (args.first(), path) else {
                    println!("Usage: db <save|load> <path>");
                    continue;
                };
                let store = match SqliteTaskStore::new(&path) {
                    Ok(store) => store,
                    Err(e) => {
                        println!("Database error: {}", e);
                        continue;
                    }
                };
                match action {
                    "save" => match calendar.save_to(&store) {
                        Ok(_) => println!("Calendar stored in {}", path),
                        Err(e) => println!("Database error: {}", e),
                    },
                    "load" => match Calendar::load_from(&store) {
                        Ok(loaded) => {
                            calendar = loaded;
                            println!("Calendar loaded from database {}", path);
                        }
                        Err(e) => println!("Database error: {}", e),
                    },
                    other => println!("Unknown db action '{}'", other),
                }
            }
            other => {
                println!("Unknown command '{}'. Type 'help'.", other);
            }
        }
    }
}
