//! The long running worker that keeps the transmitter's text current.
//!
//! The player's callbacks write one command per line into a FIFO. The engine
//! reads them, keeps a [`MetadataContext`] up to date, re-evaluates both style
//! strings when a track's values are complete, and feeds the transmitter one
//! line per channel at each channel's own cadence.
//!
//! Line protocol
//!
//!     Keywords:  INIT  START  STOP  RESET  UPDATE  EXIT
//!     Values:    T<title>  A<artist>  B<album>  G<genre>  N<track number>
//!                L<length in seconds>  P<playlist position>  C<playlist count>
//!                MAINLIST<playlist name>
//!
//! `L` closes a track's values and triggers the re-evaluation; `P` and `C` do
//! the same for playlist counters. Numbers that are `0` or empty are absent.

use crate::rds::metadata::MetadataContext;
use crate::rds::segmenter::Segmenter;
use crate::rds::style::{FieldKind, TemplateCache};
use crate::rds::transmitter::Transmitter;
use dynrds_config::{ConfigError, DynRdsConfig, StartMode, StopMode};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read commands: {0}")]
    Io(#[from] std::io::Error),
}

/// A command line the engine could not make sense of. Logged, then skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("command '{command}' expects a number, got '{value}'")]
    InvalidNumber { command: char, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Init,
    Start,
    Stop,
    Reset,
    Update,
    Exit,
    Title(String),
    Artist(String),
    Album(String),
    Genre(String),
    TrackNumber(u32),
    TrackLength(u64),
    PlaylistPosition(u32),
    PlaylistCount(u32),
    MainPlaylist(String),
}

impl FromStr for EngineCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        match line {
            "" => return Err(CommandError::Empty),
            "INIT" => return Ok(EngineCommand::Init),
            "START" => return Ok(EngineCommand::Start),
            "STOP" => return Ok(EngineCommand::Stop),
            "RESET" => return Ok(EngineCommand::Reset),
            "UPDATE" => return Ok(EngineCommand::Update),
            "EXIT" => return Ok(EngineCommand::Exit),
            _ => {}
        }
        if let Some(name) = line.strip_prefix("MAINLIST") {
            return Ok(EngineCommand::MainPlaylist(name.to_string()));
        }

        let mut chars = line.chars();
        let command = chars.next().ok_or(CommandError::Empty)?;
        let value = chars.as_str();
        match command {
            'T' => Ok(EngineCommand::Title(value.to_string())),
            'A' => Ok(EngineCommand::Artist(value.to_string())),
            'B' => Ok(EngineCommand::Album(value.to_string())),
            'G' => Ok(EngineCommand::Genre(value.to_string())),
            'N' => parse_number(command, value).map(EngineCommand::TrackNumber),
            'L' => parse_number(command, value).map(EngineCommand::TrackLength),
            'P' => parse_number(command, value).map(EngineCommand::PlaylistPosition),
            'C' => parse_number(command, value).map(EngineCommand::PlaylistCount),
            _ => Err(CommandError::Unknown(line.to_string())),
        }
    }
}

/// Empty means zero, which the metadata setters treat as absent.
fn parse_number<N>(command: char, value: &str) -> Result<N, CommandError>
where
    N: FromStr + Default,
{
    let value = value.trim();
    if value.is_empty() {
        return Ok(N::default());
    }
    value.parse().map_err(|_| CommandError::InvalidNumber {
        command,
        value: value.to_string(),
    })
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Init => write!(f, "INIT"),
            EngineCommand::Start => write!(f, "START"),
            EngineCommand::Stop => write!(f, "STOP"),
            EngineCommand::Reset => write!(f, "RESET"),
            EngineCommand::Update => write!(f, "UPDATE"),
            EngineCommand::Exit => write!(f, "EXIT"),
            EngineCommand::Title(v) => write!(f, "T{}", v),
            EngineCommand::Artist(v) => write!(f, "A{}", v),
            EngineCommand::Album(v) => write!(f, "B{}", v),
            EngineCommand::Genre(v) => write!(f, "G{}", v),
            EngineCommand::TrackNumber(n) => write!(f, "N{}", n),
            EngineCommand::TrackLength(n) => write!(f, "L{}", n),
            EngineCommand::PlaylistPosition(n) => write!(f, "P{}", n),
            EngineCommand::PlaylistCount(n) => write!(f, "C{}", n),
            EngineCommand::MainPlaylist(v) => write!(f, "MAINLIST{}", v),
        }
    }
}

/// What the engine needs from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub enabled: bool,
    pub ps_style: String,
    pub ps_update_rate: Duration,
    pub ps_fallback: String,
    pub rt_style: String,
    pub rt_update_rate: Duration,
    pub rt_size: usize,
    pub rt_fallback: String,
    pub start: StartMode,
    pub stop: StopMode,
}

impl From<&DynRdsConfig> for EngineSettings {
    fn from(config: &DynRdsConfig) -> Self {
        Self {
            enabled: config.rds.enabled,
            ps_style: config.rds.ps_style.clone(),
            ps_update_rate: Duration::from_secs(config.rds.ps_update_rate),
            ps_fallback: config.rds.ps_fallback.clone(),
            rt_style: config.rds.rt_style.clone(),
            rt_update_rate: Duration::from_secs(config.rds.rt_update_rate),
            rt_size: config.rds.rt_size,
            rt_fallback: config.rds.rt_fallback.clone(),
            start: config.engine.start,
            stop: config.engine.stop,
        }
    }
}

/// How [`Engine::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// An `EXIT` command was received.
    Exit,
    /// The writer closed its end of the input.
    InputClosed,
}

/// What the loop has to do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Reload { restart: bool },
    Exit,
}

/// One text service: its template, rotation and cadence.
#[derive(Debug)]
struct Channel {
    cache: TemplateCache,
    segmenter: Segmenter,
    rate: Duration,
}

impl Channel {
    fn new(style: &str, fallback: &str, rate: Duration) -> Self {
        Self {
            cache: TemplateCache::new(style),
            segmenter: Segmenter::default().with_fallback(fallback),
            rate,
        }
    }

    fn refresh(&mut self, metadata: &MetadataContext) {
        self.segmenter.update(self.cache.evaluate(metadata));
    }

    fn timer(&self) -> Interval {
        let mut timer = interval(self.rate);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer
    }
}

pub struct Engine<T> {
    settings: EngineSettings,
    ps: Channel,
    rt: Channel,
    metadata: MetadataContext,
    playlist: Option<String>,
    transmitter: T,
}

impl<T: Transmitter> Engine<T> {
    pub fn new(settings: EngineSettings, mut transmitter: T) -> Self {
        transmitter.set_rt_size(settings.rt_size);
        let mut engine = Self {
            ps: Channel::new(&settings.ps_style, &settings.ps_fallback, settings.ps_update_rate),
            rt: Channel::new(&settings.rt_style, &settings.rt_fallback, settings.rt_update_rate),
            settings,
            metadata: MetadataContext::new(),
            playlist: None,
            transmitter,
        };
        engine.refresh();
        engine
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn metadata(&self) -> &MetadataContext {
        &self.metadata
    }

    /// Name of the main playlist last announced with `MAINLIST`.
    pub fn playlist(&self) -> Option<&str> {
        self.playlist.as_deref()
    }

    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }

    pub fn into_transmitter(self) -> T {
        self.transmitter
    }

    /// Lines currently rotating on the PS channel.
    pub fn ps_lines(&self) -> &[String] {
        self.ps.segmenter.lines()
    }

    /// Lines currently rotating on the RadioText channel.
    pub fn rt_lines(&self) -> &[String] {
        self.rt.segmenter.lines()
    }

    /// Re-evaluate both channels against the current metadata.
    pub fn refresh(&mut self) {
        self.ps.refresh(&self.metadata);
        self.rt.refresh(&self.metadata);
        debug!(ps = ?self.ps.segmenter.lines(), rt = ?self.rt.segmenter.lines(), "text refreshed");
    }

    /// Parse and apply one input line. Bad lines are logged and skipped.
    pub fn handle_line(&mut self, line: &str) -> Flow {
        match line.parse::<EngineCommand>() {
            Ok(command) => self.apply(command),
            Err(CommandError::Empty) => Flow::Continue,
            Err(e) => {
                warn!("ignoring command: {}", e);
                Flow::Continue
            }
        }
    }

    pub fn apply(&mut self, command: EngineCommand) -> Flow {
        match command {
            EngineCommand::Init => {
                info!("engine initialised");
                if self.settings.start == StartMode::FppdStart {
                    self.start_transmitter();
                }
            }
            EngineCommand::Start => {
                info!("playlist started");
                if self.settings.start == StartMode::PlaylistStart {
                    self.start_transmitter();
                }
            }
            EngineCommand::Stop => {
                info!("playlist stopped");
                self.metadata.clear_track();
                self.refresh();
                if self.settings.stop == StopMode::PlaylistStop {
                    self.stop_transmitter();
                }
            }
            EngineCommand::Reset => return Flow::Reload { restart: true },
            EngineCommand::Update => return Flow::Reload { restart: false },
            EngineCommand::Exit => {
                info!("exit requested");
                self.stop_transmitter();
                return Flow::Exit;
            }
            EngineCommand::Title(value) => self.metadata.set(FieldKind::Title, value),
            EngineCommand::Artist(value) => self.metadata.set(FieldKind::Artist, value),
            EngineCommand::Album(value) => self.metadata.set(FieldKind::Album, value),
            EngineCommand::Genre(value) => self.metadata.set(FieldKind::Genre, value),
            EngineCommand::TrackNumber(number) => self.metadata.set_track_number(number),
            EngineCommand::TrackLength(seconds) => {
                self.metadata.set_track_length(seconds);
                self.refresh();
            }
            EngineCommand::PlaylistPosition(position) => {
                self.metadata.set_playlist_position(position);
                self.refresh();
            }
            EngineCommand::PlaylistCount(count) => {
                self.metadata.set_playlist_count(count);
                self.refresh();
            }
            EngineCommand::MainPlaylist(name) => {
                debug!(playlist = %name, "main playlist");
                self.playlist = Some(name).filter(|name| !name.is_empty());
            }
        }
        Flow::Continue
    }

    /// Install new settings. Style strings that did not change keep their
    /// compiled templates. Returns `true` when an update rate changed.
    pub fn reconfigure(&mut self, settings: EngineSettings) -> bool {
        let ps_changed = self.ps.cache.update(&settings.ps_style);
        let rt_changed = self.rt.cache.update(&settings.rt_style);
        self.ps.segmenter.set_fallback(settings.ps_fallback.clone());
        self.rt.segmenter.set_fallback(settings.rt_fallback.clone());
        self.transmitter.set_rt_size(settings.rt_size);

        let rates_changed = self.ps.rate != settings.ps_update_rate
            || self.rt.rate != settings.rt_update_rate;
        self.ps.rate = settings.ps_update_rate;
        self.rt.rate = settings.rt_update_rate;

        let disabled = self.settings.enabled && !settings.enabled;
        self.settings = settings;
        if ps_changed || rt_changed {
            self.refresh();
        }
        if disabled {
            self.stop_transmitter();
        }
        info!("settings reloaded");
        rates_changed
    }

    /// Take the transmitter down and bring it back according to the start mode.
    pub fn cycle_transmitter(&mut self) {
        let was_active = self.transmitter.is_active();
        self.stop_transmitter();
        if was_active || self.settings.start == StartMode::FppdStart {
            self.start_transmitter();
        }
    }

    /// Push the next PS line if the transmitter is on air.
    pub fn tick_ps(&mut self) {
        if !self.transmitter.is_active() {
            return;
        }
        let line = self.ps.segmenter.next_line();
        if let Err(e) = self.transmitter.send_ps(line) {
            warn!("PS update failed: {}", e);
        }
    }

    /// Push the next RadioText line if the transmitter is on air.
    pub fn tick_rt(&mut self) {
        if !self.transmitter.is_active() {
            return;
        }
        let line = self.rt.segmenter.next_line();
        if let Err(e) = self.transmitter.send_rt(line) {
            warn!("RT update failed: {}", e);
        }
    }

    fn start_transmitter(&mut self) {
        if !self.settings.enabled {
            info!("RDS disabled, transmitter stays off");
            return;
        }
        if self.transmitter.is_active() {
            return;
        }
        if let Err(e) = self.transmitter.startup() {
            error!("transmitter startup failed: {}", e);
            return;
        }
        self.ps.segmenter.restart();
        self.rt.segmenter.restart();
    }

    fn stop_transmitter(&mut self) {
        if !self.transmitter.is_active() {
            return;
        }
        if let Err(e) = self.transmitter.shutdown() {
            error!("transmitter shutdown failed: {}", e);
        }
    }

    /// Read commands from `input` until `EXIT` or end of input.
    ///
    /// `reload` is called for `RESET` and `UPDATE`. A failed reload is logged
    /// and the current settings stay in effect.
    pub async fn run<R, F, E>(&mut self, input: R, mut reload: F) -> Result<RunOutcome, EngineError>
    where
        R: AsyncBufRead + Unpin,
        F: FnMut() -> Result<EngineSettings, E>,
        E: fmt::Display,
    {
        let mut lines = input.lines();
        let mut ps_timer = self.ps.timer();
        let mut rt_timer = self.rt.timer();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("command input closed");
                        return Ok(RunOutcome::InputClosed);
                    };
                    match self.handle_line(&line) {
                        Flow::Continue => {}
                        Flow::Exit => return Ok(RunOutcome::Exit),
                        Flow::Reload { restart } => {
                            match reload() {
                                Ok(settings) => {
                                    if self.reconfigure(settings) {
                                        ps_timer = self.ps.timer();
                                        rt_timer = self.rt.timer();
                                    }
                                }
                                Err(e) => warn!("keeping current settings: {}", e),
                            }
                            if restart {
                                self.cycle_transmitter();
                            }
                        }
                    }
                }
                _ = ps_timer.tick() => self.tick_ps(),
                _ = rt_timer.tick() => self.tick_rt(),
            }
        }
    }
}

impl EngineSettings {
    /// Settings from the built-in defaults.
    pub fn defaults() -> Result<Self, ConfigError> {
        dynrds_config::load_defaults().map(|config| Self::from(&config))
    }
}
