#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(
    dead_code,
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Signed-document routing pipeline.
//!
//! Files arriving in the workplace directory are filtered and deduplicated at
//! intake, classified by filename, waited on until their content settles, and
//! moved into `destination/doc/client/date/status/`. A single worker task
//! drains the queue; [`WatchService`] owns the lifecycle.
//!
//! Layout: `classify.rs` (filename parsing and segment normalisation),
//! `stability.rs` (settle detection), `mover.rs` (collision-safe moves),
//! `intake.rs` (filtering, in-flight set, queue), `worker.rs` (processing
//! loop), `history.rs` (bounded outcome history), `watch.rs` (filesystem
//! notifications), `service.rs` (lifecycle facade), `samples.rs` (fixtures
//! for manual testing).

pub mod classify;
pub mod error;
pub mod history;
pub mod intake;
pub mod model;
pub mod mover;
pub mod samples;
pub mod service;
pub mod stability;
pub mod watch;
pub mod worker;

pub use classify::{FilenameClassifier, Verdict, normalize_segment};
pub use error::{PipelineError, PipelineResult};
pub use history::OutcomeHistory;
pub use intake::{InFlightGuard, InFlightSet, Intake, admissible};
pub use model::{
    FilenameMetadata, FilterReason, OutcomeStatus, PathEvent, PathEventKind, PreviewEntry,
    PreviewReport, PreviewSummary, ProcessingOutcome, RuntimeActivity, ServiceStatus, SubmitOutcome,
    WatcherState,
};
pub use mover::DestinationMover;
pub use samples::{SAMPLE_FILENAMES, SampleReport, create_sample_files, rename_in_workplace};
pub use service::WatchService;
pub use stability::{Clock, StabilityDetector, SystemClock};
pub use watch::{NotifyWatchSource, PathEventSink, PathEventSource, WatchHandle, translate};
pub use worker::{DocumentPipeline, FILE_DISAPPEARED, FileHandler, NOT_PDF, NOT_STABLE};
