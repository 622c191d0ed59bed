use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pgdf::model::DataObject;
use pgdf::parser::pgdf::{read_file_with, DecodeOptions};
use std::io;
use time::format_description::FormatItem;
use time::macros::format_description;
use tui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};

const TIME_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
);

/// Browse the data objects of a PAMGuard binary file
#[derive(Parser, Debug)]
#[command(name = "pgdf-tui", version)]
struct Args {
    path: std::path::PathBuf,
    /// Skip data records that cannot be decoded instead of failing
    #[arg(long)]
    lenient: bool,
}

struct StatefulList<T> {
    state: ListState,
    items: Vec<T>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> StatefulList<T> {
        StatefulList {
            state: ListState::default(),
            items,
        }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= self.items.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    fn unselect(&mut self) {
        self.state.select(None);
    }

    fn selected(&self) -> Option<&T> {
        self.state.selected().and_then(|i| self.items.get(i))
    }
}

struct App {
    title: String,
    items: StatefulList<DataObject>,
}

impl App {
    fn build(title: String, v: Vec<DataObject>) -> App {
        App {
            title,
            items: StatefulList::with_items(v),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    // Load data
    let options = if args.lenient {
        DecodeOptions::lenient()
    } else {
        DecodeOptions::default()
    };
    let file = read_file_with(&args.path, options)?;
    let title = format!("{} ({})", args.path.display(), file.module_type());
    let objects = file.module.map(|m| m.objects).unwrap_or_default();

    let app = App::build(title, objects);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;

    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, &mut app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Left => app.items.unselect(),
                KeyCode::Down => app.items.next(),
                KeyCode::Up => app.items.previous(),
                _ => {}
            }
        }
    }
}

fn format_millis(millis: i64) -> String {
    pgdf::parser::timestamp::from_millis(millis)
        .ok()
        .and_then(|t| t.format(TIME_FORMAT).ok())
        .unwrap_or_else(|| millis.to_string())
}

fn details(object: &DataObject) -> Vec<String> {
    let pam = &object.pam;
    let mut lines = vec![
        format!("offset: {}", pam.record_offset),
        format!("length: {}", pam.length),
        format!("flags: {:?}", pam.flags),
    ];
    if let Some(channels) = pam.channel_map {
        lines.push(format!("channels: {:#b}", channels));
    }
    if let Some(annotations) = &pam.annotations {
        lines.push(format!("annotations: {}", annotations.len()));
    }
    if let Some(track) = object.track() {
        for p in track.points() {
            lines.push(format!(
                "{} sonar {} bearing {:.3} range {:.2} size {:.2}",
                p.time.format(TIME_FORMAT).unwrap_or_default(),
                p.sonar_id,
                p.peak_bearing,
                p.peak_range,
                p.object_size
            ));
        }
    }
    lines
}

fn ui<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(f.size());

    let items: Vec<ListItem> = app
        .items
        .items
        .iter()
        .enumerate()
        .map(|(i, obj)| {
            let uid = obj.pam.uid.map(|u| u.to_string()).unwrap_or_default();
            let points = obj.track().map_or(0, |t| t.len());

            let s = format!(
                "{0:5} {1:25} {2:12} {3:5}",
                i,
                format_millis(obj.pam.millis),
                uid,
                points
            );

            ListItem::new(s)
        })
        .collect();

    let items = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(app.title.as_str()))
        .highlight_style(
            Style::default()
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(items, chunks[0], &mut app.items.state);

    let text = app
        .items
        .selected()
        .map(|obj| details(obj).join("\n"))
        .unwrap_or_default();
    let detail = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Object"));
    f.render_widget(detail, chunks[1]);
}
