use crate::impls::SpotifySearch;
use crate::utils::{format_optional_time, format_time};
use catalog_providers::SpotifyClient;
use playback_controller::{
    CatalogClient, ChannelPhase, ControllerHandle, PlaybackController, TrackId,
};
use std::io::BufRead;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, error, info};

const MUSIC_PAGE: &str = "music";

#[derive(Debug, PartialEq)]
pub(crate) enum Command {
    /// A 1-based position in the track list or a track id.
    Play(String),
    Resume,
    Pause,
    Seek(f64),
    Volume(f32),
    Next,
    Previous,
    Shuffle,
    AutoAdvance,
    Navigate(String),
    List,
    Status,
    Snapshot,
    Reload,
    Search(String),
    Help,
    Quit,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum CommandParseError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Command {0} needs an argument")]
    MissingArgument(&'static str),
    #[error("Not a number: {0}")]
    InvalidNumber(String),
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandParseError::Empty)?;
        let argument = words.collect::<Vec<_>>().join(" ");
        let required = |command: &'static str| {
            if argument.is_empty() {
                Err(CommandParseError::MissingArgument(command))
            } else {
                Ok(argument.clone())
            }
        };

        let command = match name.to_lowercase().as_str() {
            "play" if argument.is_empty() => Command::Resume,
            "play" => Command::Play(argument.clone()),
            "resume" => Command::Resume,
            "pause" => Command::Pause,
            "seek" => Command::Seek(parse_number(&required("seek")?)?),
            "volume" | "vol" => Command::Volume(parse_number(&required("volume")?)?),
            "next" | "n" => Command::Next,
            "prev" | "previous" | "p" => Command::Previous,
            "shuffle" => Command::Shuffle,
            "autoplay" | "auto" => Command::AutoAdvance,
            "go" | "navigate" => Command::Navigate(required("navigate")?),
            "list" | "ls" => Command::List,
            "status" | "s" => Command::Status,
            "state" => Command::Snapshot,
            "reload" => Command::Reload,
            "search" | "find" => Command::Search(required("search")?),
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandParseError::UnknownCommand(other.to_string())),
        };

        Ok(command)
    }
}

fn parse_number<T: FromStr>(raw: &str) -> Result<T, CommandParseError> {
    raw.parse()
        .map_err(|_| CommandParseError::InvalidNumber(raw.to_string()))
}

/// Resolves a 1-based list position or a literal id.
fn resolve_track(controller: &PlaybackController, selector: &str) -> TrackId {
    selector
        .parse::<usize>()
        .ok()
        .and_then(|position| position.checked_sub(1))
        .and_then(|index| controller.tracks().at(index))
        .map(|track| track.id.clone())
        .unwrap_or_else(|| TrackId::from(selector))
}

pub(crate) fn execute(controller: &mut PlaybackController, command: &Command) {
    controller.mark_user_interaction();

    match command {
        Command::Play(selector) => {
            let track_id = resolve_track(controller, selector);
            controller.play(&track_id);
        }
        Command::Resume => {
            let track_id = controller
                .state()
                .current_track
                .clone()
                .or_else(|| controller.tracks().at(0).map(|track| track.id.clone()));

            if let Some(track_id) = track_id {
                controller.play(&track_id);
            }
        }
        Command::Pause => controller.pause(),
        Command::Seek(seconds) => controller.seek(*seconds),
        Command::Volume(level) => controller.set_volume(*level),
        Command::Next => controller.next(),
        Command::Previous => controller.previous(),
        Command::Shuffle => controller.toggle_shuffle(),
        Command::AutoAdvance => controller.toggle_auto_advance(),
        Command::Navigate(page) => controller.on_navigate(page.eq_ignore_ascii_case(MUSIC_PAGE)),
        _ => (),
    }
}

pub(crate) fn render_status(controller: &PlaybackController) -> String {
    let state = controller.state();

    let marker = match state.phase {
        ChannelPhase::Idle => "■",
        ChannelPhase::Loading => "…",
        ChannelPhase::Playing => "▶",
        ChannelPhase::Paused => "❚❚",
    };

    let title = controller
        .current_track()
        .map(|track| format!("{} - {}", track.name, track.artist))
        .unwrap_or_else(|| "Nothing selected".to_string());

    let mut status = format!(
        "{} {} [{} / {}] vol {:.0}%",
        marker,
        title,
        format_time(state.position_seconds),
        format_optional_time(state.duration_seconds),
        state.volume * 100.0,
    );

    if state.shuffle_enabled {
        status.push_str(" shuffle");
    }

    if state.auto_advance_enabled {
        status.push_str(" autoplay");
    }

    if let Some(error) = &state.last_error {
        status.push_str(&format!(" ({})", error));
    }

    status
}

pub(crate) fn render_list(controller: &PlaybackController) -> String {
    let current = controller.state().current_track.as_ref();

    controller
        .tracks()
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let marker = if Some(&track.id) == current { ">" } else { " " };
            format!("{} {}. {} - {}", marker, index + 1, track.name, track.artist)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const HELP: &str = "\
play [n|id]   play a track, or resume
pause         pause
seek <secs>   jump within the current track
volume <0-1>  set volume
next | prev   skip
shuffle       toggle shuffle
autoplay      toggle auto-advance
go <page>     navigate (music keeps ambience silent)
list          show tracks
status        show what is playing
state         dump the full player state as JSON
search <text> replace the list with Spotify search results
reload        fetch the catalog again
quit          leave";

/// Where the console gets its track lists from.
pub(crate) struct CatalogSources {
    pub(crate) library: Rc<dyn CatalogClient>,
    /// Only present with a Spotify catalog.
    pub(crate) search: Option<Arc<SpotifyClient>>,
}

/// Forwards stdin lines from a detached thread. The thread never blocks
/// runtime shutdown, and it stops once the receiver is gone.
pub(crate) fn spawn_stdin_reader() -> std::io::Result<UnboundedReceiver<String>> {
    let (sender, receiver) = mpsc::unbounded_channel();

    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if sender.send(line).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        error!(?error, "Unable to read from stdin");
                        break;
                    }
                }
            }
        })?;

    Ok(receiver)
}

async fn load_and_list(handle: &ControllerHandle, catalog: &dyn CatalogClient) {
    if !handle.load_catalog(catalog).await {
        println!("Catalog is already loading");
    }
    println!("{}", handle.with(|controller| render_list(controller)));
}

/// Runs commands until the input closes or `quit`.
pub(crate) async fn run_console(
    handle: ControllerHandle,
    sources: CatalogSources,
    mut input: UnboundedReceiver<String>,
) {
    info!("Console ready, type `help` for commands");

    while let Some(line) = input.recv().await {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(CommandParseError::Empty) => continue,
            Err(error) => {
                println!("{}", error);
                continue;
            }
        };

        debug!(?command, "Console command");

        match command {
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::List => println!("{}", handle.with(|controller| render_list(controller))),
            Command::Snapshot => match serde_json::to_string_pretty(&handle.snapshot()) {
                Ok(json) => println!("{}", json),
                Err(error) => error!(?error, "Unable to serialize player state"),
            },
            Command::Reload => load_and_list(&handle, sources.library.as_ref()).await,
            Command::Search(query) => match &sources.search {
                Some(client) => {
                    let search = SpotifySearch::new(Arc::clone(client), &query);
                    load_and_list(&handle, &search).await;
                }
                None => println!("Search needs Spotify credentials"),
            },
            command => {
                let status = handle.with(|controller| {
                    execute(controller, &command);
                    render_status(controller)
                });
                println!("{}", status);
            }
        }
    }

    info!("Console closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use playback_controller::{
        AudioOutput, AudioOutputError, CatalogError, ControllerSettings, MediaRequest, Track,
        TrackSource,
    };

    #[test]
    fn test_parsing_of_commands() {
        assert_eq!(Ok(Command::Resume), "play".parse());
        assert_eq!(Ok(Command::Play("3".into())), "play 3".parse());
        assert_eq!(
            Ok(Command::Play("0WNGsQ1oAuHzNTk8jivBKW".into())),
            "PLAY 0WNGsQ1oAuHzNTk8jivBKW".parse()
        );
        assert_eq!(Ok(Command::Seek(42.5)), "seek 42.5".parse());
        assert_eq!(Ok(Command::Volume(0.3)), "vol 0.3".parse());
        assert_eq!(Ok(Command::Previous), " prev ".parse());
        assert_eq!(Ok(Command::Navigate("music".into())), "go music".parse());
        assert_eq!(Ok(Command::Snapshot), "state".parse());
        assert_eq!(Ok(Command::Search("spring day".into())), "find spring  day".parse());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Err(CommandParseError::Empty), "   ".parse::<Command>());
        assert_eq!(
            Err(CommandParseError::MissingArgument("seek")),
            "seek".parse::<Command>()
        );
        assert_eq!(
            Err(CommandParseError::InvalidNumber("loud".into())),
            "volume loud".parse::<Command>()
        );
        assert_eq!(
            Err(CommandParseError::UnknownCommand("dance".into())),
            "dance".parse::<Command>()
        );
    }

    struct SilentOutput;

    impl AudioOutput for SilentOutput {
        fn load(&mut self, _request: MediaRequest) -> Result<(), AudioOutputError> {
            Ok(())
        }
        fn play(&mut self) {}
        fn pause(&mut self) {}
        fn stop(&mut self) {}
        fn seek(&mut self, _position: f64) {}
        fn set_volume(&mut self, _volume: f32) {}
        fn set_looping(&mut self, _looping: bool) {}
    }

    fn controller_with(ids: &[&str]) -> PlaybackController {
        let mut controller = PlaybackController::new(
            ControllerSettings::default(),
            Box::new(SilentOutput),
            Box::new(SilentOutput),
        );

        controller.set_tracks(
            ids.iter()
                .map(|id| Track {
                    id: TrackId::from(*id),
                    name: id.to_uppercase(),
                    artist: "BTS".into(),
                    artwork: None,
                    source: TrackSource::Remote(format!("https://p.scdn.co/mp3-preview/{}", id)),
                    duration_hint: None,
                })
                .collect(),
        );

        controller
    }

    #[test]
    fn test_play_by_position_and_id() {
        let mut controller = controller_with(&["dynamite", "butter", "permission"]);

        execute(&mut controller, &Command::Play("2".into()));
        assert_eq!(Some(TrackId::from("butter")), controller.state().current_track);

        execute(&mut controller, &Command::Play("permission".into()));
        assert_eq!(Some(TrackId::from("permission")), controller.state().current_track);
    }

    #[test]
    fn test_bare_play_starts_first_track() {
        let mut controller = controller_with(&["dynamite", "butter"]);

        execute(&mut controller, &Command::Resume);

        assert_eq!(Some(TrackId::from("dynamite")), controller.state().current_track);
        assert!(render_status(&controller).contains("DYNAMITE - BTS"));
    }

    #[test]
    fn test_list_marks_current_track() {
        let mut controller = controller_with(&["dynamite", "butter"]);

        execute(&mut controller, &Command::Play("butter".into()));

        assert_eq!(
            "  1. DYNAMITE - BTS\n> 2. BUTTER - BTS",
            render_list(&controller)
        );
    }

    struct NoCatalog;

    #[async_trait]
    impl CatalogClient for NoCatalog {
        async fn fetch_tracks(&self) -> Result<Vec<Track>, CatalogError> {
            Err(CatalogError::Unavailable("offline".into()))
        }
    }

    fn sources_without_search() -> CatalogSources {
        CatalogSources {
            library: Rc::new(NoCatalog),
            search: None,
        }
    }

    #[actix_rt::test]
    async fn test_console_stops_when_input_closes() {
        let handle = ControllerHandle::new(controller_with(&["dynamite", "butter"]));
        let (sender, input) = mpsc::unbounded_channel();

        for line in ["volume 0.5", "", "dance", "play 2"] {
            sender.send(line.to_string()).expect("Console input is open");
        }
        drop(sender);

        run_console(handle.clone(), sources_without_search(), input).await;

        let state = handle.snapshot().playback;
        assert_eq!(0.5, state.volume);
        assert_eq!(Some(TrackId::from("butter")), state.current_track);
    }

    #[actix_rt::test]
    async fn test_quit_stops_console_while_input_is_open() {
        let handle = ControllerHandle::new(controller_with(&["dynamite"]));
        let (sender, input) = mpsc::unbounded_channel();

        sender.send("quit".to_string()).expect("Console input is open");
        sender.send("play 1".to_string()).expect("Console input is open");

        run_console(handle.clone(), sources_without_search(), input).await;

        assert_eq!(None, handle.snapshot().playback.current_track);
        drop(sender);
    }

    #[actix_rt::test]
    async fn test_search_without_spotify_keeps_track_list() {
        let handle = ControllerHandle::new(controller_with(&["dynamite", "butter"]));
        let (sender, input) = mpsc::unbounded_channel();

        sender.send("search butter".to_string()).expect("Console input is open");
        drop(sender);

        run_console(handle.clone(), sources_without_search(), input).await;

        assert_eq!(2, handle.with(|controller| controller.tracks().len()));
    }
}
