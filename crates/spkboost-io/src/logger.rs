//! Long-running telemetry and model logger.
//!
//! Per channel (device) the pipeline appends to three files in the output
//! directory, named after the file prefix and the channel's side letter:
//!
//! - `<prefix><side>_0000.CSV` - one telemetry line per tick
//! - `<prefix><side>_ZMDL.BIN` - impedance model dumps
//! - `<prefix><side>_XMDL.BIN` - excursion model dumps
//!
//! A run is a sequence of ticks:
//!
//! ```text
//! Idle -> Sampling -> [ModelDump] -> Sampling -> ... -> Done
//! ```
//!
//! Each tick samples every channel in order and writes its CSV line. When
//! the line counter has passed `model_interval * dumps`, both models of every
//! channel are dumped before the tick ends. The thread then sleeps for the
//! interval, except after the last tick of a bounded run.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use spkboost_core::ModelKind;

use crate::device::{DeviceBackend, DeviceHandle, MAX_DEVICES};
use crate::model::read_raw_model;
use crate::modellog::ModelLogRecord;
use crate::record::{format_record_line, print_record_header};
use crate::supervisor::AnomalySupervisor;
use crate::telemetry::{LiveData, decode_live_data};
use crate::{Error, Result};

/// Side letter of each channel, by position.
pub const SIDE_LABELS: [char; MAX_DEVICES] = ['L', 'R', 'C', 'D'];

/// Run banner file in the output directory.
pub const RUN_LOG: &str = "RUN.LOG";

/// Logger run parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerSettings {
    /// Time between ticks.
    pub interval: Duration,
    /// Number of ticks; 0 runs until a fatal error.
    pub count: u64,
    /// Lines between model dumps.
    pub model_interval: u64,
    /// Directory receiving all files.
    pub output_dir: PathBuf,
    /// File name prefix.
    pub file_prefix: String,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            count: 0,
            model_interval: 30,
            output_dir: PathBuf::from("."),
            file_prefix: "01".to_string(),
        }
    }
}

/// File names of the channel at `index`: CSV, impedance log, excursion log.
pub fn channel_file_names(prefix: &str, index: usize) -> [String; 3] {
    let side = SIDE_LABELS[index.min(MAX_DEVICES - 1)];
    [
        format!("{prefix}{side}_0000.CSV"),
        format!("{prefix}{side}_{}.BIN", ModelKind::Impedance.log_suffix()),
        format!("{prefix}{side}_{}.BIN", ModelKind::Excursion.log_suffix()),
    ]
}

/// Where the pipeline is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Files open, no tick yet.
    Idle,
    /// Sampling telemetry.
    Sampling,
    /// Dumping models.
    ModelDump,
    /// Finished, either by count or by a fatal error.
    Done,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Line number of the tick, starting at 1.
    pub line: u64,
    /// True if models were dumped during the tick.
    pub model_dump: bool,
    /// Channels skipped because their DSP was not running.
    pub skipped: usize,
}

/// Totals of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Ticks completed.
    pub lines: u64,
    /// Model dumps performed.
    pub model_dumps: u64,
    /// Channel samples skipped because the DSP was not running.
    pub skipped: u64,
}

struct Sink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl Sink {
    fn append(path: PathBuf) -> Result<(Self, bool)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;
        let empty = file.metadata().map_err(|e| Error::io(&path, e))?.len() == 0;
        Ok((
            Self {
                path,
                writer: BufWriter::new(file),
            },
            empty,
        ))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer
            .write_all(bytes)
            .map_err(|e| Error::io(&self.path, e))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| Error::io(&self.path, e))
    }
}

struct Channel {
    handle: DeviceHandle,
    csv: Sink,
    impedance: Sink,
    excursion: Sink,
}

impl Channel {
    fn model_sink(&mut self, kind: ModelKind) -> &mut Sink {
        match kind {
            ModelKind::Impedance => &mut self.impedance,
            ModelKind::Excursion => &mut self.excursion,
        }
    }

    fn sinks(&mut self) -> [&mut Sink; 3] {
        [&mut self.csv, &mut self.impedance, &mut self.excursion]
    }
}

/// Telemetry and model logger over a set of opened devices.
///
/// Owns its files for the whole run; they are flushed at the end of every
/// tick and closed when the pipeline is dropped.
pub struct LoggingPipeline<'a> {
    backend: &'a mut dyn DeviceBackend,
    supervisor: &'a mut dyn AnomalySupervisor,
    channels: Vec<Channel>,
    settings: LoggerSettings,
    state: PipelineState,
    line: u64,
    dumps: u64,
    skipped: u64,
}

impl<'a> LoggingPipeline<'a> {
    /// Open (append) the log files of every channel.
    ///
    /// A telemetry CSV that is still empty gets its header.
    ///
    /// # Errors
    ///
    /// [`Error::BadParam`] unless 1 to 4 channels are given, [`Error::Io`]
    /// naming the first file that could not be opened.
    pub fn open(
        backend: &'a mut dyn DeviceBackend,
        supervisor: &'a mut dyn AnomalySupervisor,
        handles: &[DeviceHandle],
        settings: LoggerSettings,
    ) -> Result<Self> {
        if handles.is_empty() || handles.len() > MAX_DEVICES {
            return Err(Error::BadParam(format!(
                "{} channels requested, expected 1 to {MAX_DEVICES}",
                handles.len()
            )));
        }
        std::fs::create_dir_all(&settings.output_dir)
            .map_err(|e| Error::io(&settings.output_dir, e))?;

        let interval_ms = settings.interval.as_millis() as u64;
        let mut channels = Vec::with_capacity(handles.len());
        for (index, &handle) in handles.iter().enumerate() {
            let [csv, z, x] = channel_file_names(&settings.file_prefix, index)
                .map(|name| settings.output_dir.join(name));
            let (mut csv, empty) = Sink::append(csv)?;
            if empty {
                let mut header = Vec::new();
                print_record_header(&mut header, interval_ms).map_err(|e| Error::io(&csv.path, e))?;
                csv.write(&header)?;
            }
            channels.push(Channel {
                handle,
                csv,
                impedance: Sink::append(z)?.0,
                excursion: Sink::append(x)?.0,
            });
        }

        Ok(Self {
            backend,
            supervisor,
            channels,
            settings,
            state: PipelineState::Idle,
            line: 0,
            dumps: 0,
            skipped: 0,
        })
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Totals so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            lines: self.line,
            model_dumps: self.dumps,
            skipped: self.skipped,
        }
    }

    /// Every file the pipeline writes, in channel order.
    pub fn files(&self) -> Vec<&Path> {
        self.channels
            .iter()
            .flat_map(|c| [c.csv.path.as_path(), c.impedance.path.as_path(), c.excursion.path.as_path()])
            .collect()
    }

    /// Human-readable description of the run, as written to `RUN.LOG`.
    pub fn banner(&self) -> String {
        let interval = self.settings.interval.as_secs_f64();
        let mut text = String::from("data logger starting:\n");
        let _ = writeln!(
            text,
            " state info interval = {} ms",
            self.settings.interval.as_millis()
        );
        if self.settings.count == 0 {
            let _ = writeln!(text, " total lines = unbounded");
        } else {
            let total = self.settings.count as f64 * interval;
            let _ = writeln!(text, " total lines = {}", self.settings.count);
            let _ = writeln!(
                text,
                " total time = {:.0} seconds = {:.2} minutes = {:.2} hours",
                total,
                total / 60.0,
                total / 3600.0
            );
        }
        let _ = writeln!(
            text,
            " model log time every {} lines = {:.0} seconds",
            self.settings.model_interval,
            self.settings.model_interval as f64 * interval
        );
        text.push_str(" files:");
        for path in self.files() {
            if let Some(name) = path.file_name() {
                let _ = write!(text, " {}", name.to_string_lossy());
            }
        }
        text.push('\n');
        text
    }

    fn write_banner(&self) -> Result<()> {
        let banner = self.banner();
        for line in banner.lines() {
            tracing::info!("{}", line.trim());
        }
        let path = self.settings.output_dir.join(RUN_LOG);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;
        file.write_all(banner.as_bytes())
            .map_err(|e| Error::io(&path, e))
    }

    fn flush_all(&mut self) -> Result<()> {
        for channel in &mut self.channels {
            for sink in channel.sinks() {
                sink.flush()?;
            }
        }
        Ok(())
    }

    /// Stop the run: flush what was written and keep the first error.
    fn fail(&mut self, err: Error) -> Error {
        self.state = PipelineState::Done;
        if let Err(flush_err) = self.flush_all() {
            tracing::warn!(error = %flush_err, "flush after failure failed");
        }
        err
    }

    /// Sample every channel once and dump models if due.
    ///
    /// # Errors
    ///
    /// [`Error::DeviceFault`] when the supervisor forced a reload,
    /// [`Error::LiveData`] when a device read failed, [`Error::Io`] on
    /// write failures. The pipeline is [`PipelineState::Done`] afterwards.
    pub fn tick(&mut self) -> Result<TickReport> {
        if self.state == PipelineState::Done {
            return Err(Error::BadParam("logging run already finished".into()));
        }
        self.state = PipelineState::Sampling;
        let line = self.line + 1;
        let mut skipped = 0;

        for index in 0..self.channels.len() {
            let handle = self.channels[index].handle;
            let sample = decode_live_data(&mut *self.backend, &mut *self.supervisor, handle);
            match sample {
                Ok(LiveData::Live(record)) => {
                    let mut text = format_record_line(line, handle.address, &record);
                    text.push('\n');
                    if let Err(e) = self.channels[index].csv.write(text.as_bytes()) {
                        return Err(self.fail(e));
                    }
                }
                Ok(LiveData::DspNotRunning) => {
                    tracing::warn!(line, address = handle.address, "no live data, DSP not running");
                    skipped += 1;
                }
                Ok(LiveData::ReloadIssued { status_register }) => {
                    return Err(self.fail(Error::DeviceFault {
                        address: handle.address,
                        status_register,
                    }));
                }
                Err(source) => {
                    return Err(self.fail(Error::LiveData {
                        address: handle.address,
                        source: Box::new(source),
                    }));
                }
            }
        }
        self.skipped += skipped as u64;

        let model_dump = line > self.settings.model_interval * self.dumps;
        if model_dump {
            self.state = PipelineState::ModelDump;
            if let Err(e) = self.dump_models(line) {
                return Err(self.fail(e));
            }
            self.dumps += 1;
            tracing::info!(line, model = self.dumps, "models dumped");
        } else {
            tracing::debug!(line, "line logged");
        }

        self.line = line;
        if let Err(e) = self.flush_all() {
            return Err(self.fail(e));
        }
        self.state = PipelineState::Sampling;
        Ok(TickReport {
            line,
            model_dump,
            skipped,
        })
    }

    fn dump_models(&mut self, line: u64) -> Result<()> {
        for channel in &mut self.channels {
            for kind in ModelKind::ALL {
                let raw = read_raw_model(&mut *self.backend, channel.handle, kind)?;
                let record = ModelLogRecord {
                    line: line as u32,
                    raw,
                };
                channel.model_sink(kind).write(&record.to_bytes())?;
            }
        }
        Ok(())
    }

    /// Run to completion.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.run_with(|_| {})
    }

    /// Run to completion, calling `observer` after every tick.
    ///
    /// Writes the banner to `RUN.LOG`, then ticks `count` times (forever for
    /// 0) with a blocking sleep of one interval between ticks.
    pub fn run_with(&mut self, mut observer: impl FnMut(&TickReport)) -> Result<RunSummary> {
        self.write_banner()?;
        let mut ticks = 0u64;
        loop {
            let report = self.tick()?;
            observer(&report);
            ticks += 1;
            if self.settings.count != 0 && ticks >= self.settings.count {
                break;
            }
            std::thread::sleep(self.settings.interval);
        }
        self.state = PipelineState::Done;
        let summary = self.summary();
        tracing::info!(
            lines = summary.lines,
            model_dumps = summary.model_dumps,
            skipped = summary.skipped,
            "logging finished"
        );
        Ok(summary)
    }
}
