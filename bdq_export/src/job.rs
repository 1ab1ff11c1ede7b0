/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “BDQ” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! the export job orchestrator: one conversion-tool subprocess per requested output
//! format, all running concurrently inside a token-named scratch dir, with stdout
//! chunks relayed as progress ticks and an explicit job state machine deciding when
//! (and how) to finalize

use std::fmt::Write as FmtWrite;
use std::path::{Path,PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use rand::RngCore;
use sqlx::PgPool;
use tokio::io::{AsyncBufReadExt,AsyncReadExt,BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug,error,info,warn};

use bdq_common::datetime::{date_string,local_date_string};
use bdq_common::fs::{ensure_dir,path_to_lossy_string};

use crate::{
    DbConfig, ExportConfig, ExportFormat, FilterOptions, TablesConfig,
    archive, filter,
    errors::{op_failed,Result},
    ledger::DownloadLedger,
    request::ExportRequest,
    workspace::Workspace,
};

/* #region job model *****************************************************************************/

/// events reported back to the requesting client. Progress is fire-and-forget
/// telemetry; Ready/Failed are the terminal outcomes
#[derive(Debug,Clone,PartialEq)]
pub enum ExportEvent {
    /// approximate, monotonically increasing progress signal (not a percentage)
    Progress { progress: f32 },
    /// the artifact can now be fetched under `folder`/`file`
    Ready { folder: String, file: String },
    /// terminal failure - the job produced nothing fetchable
    Failed { reason: String },
}

/// explicit job lifecycle. All task-exit callbacks go through [`JobState::task_exited`]
/// so that "all done" detection is a single testable decision point
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum JobState {
    Pending,
    InProgress { done: usize, total: usize },
    Completed,
    Abandoned,
}

impl JobState {
    pub fn start (total: usize)->JobState {
        JobState::InProgress { done: 0, total }
    }

    /// the single transition point for task completion: Completed exactly when the last
    /// task has exited. Exits in a terminal state are absorbed, never double counted
    pub fn task_exited (self)->JobState {
        match self {
            JobState::InProgress { done, total } => {
                let done = done + 1;
                if done >= total { JobState::Completed } else { JobState::InProgress { done, total } }
            }
            other => other
        }
    }

    pub fn abandon (self)->JobState {
        match self {
            JobState::Completed => JobState::Completed,
            _ => JobState::Abandoned
        }
    }
}

/// one conversion-tool invocation within an export job
#[derive(Debug,Clone)]
pub struct FormatTask {
    pub format: ExportFormat,
    pub out_path: PathBuf,
    /// shapefile output is a set of sibling files and goes into its own sub-directory,
    /// which is zipped and removed when the task exits
    pub sub_dir: Option<PathBuf>,
}

impl FormatTask {
    fn new (format: ExportFormat, dir: &Path, file_stem: &str)->Self {
        let (out_dir, sub_dir) = if format == ExportFormat::Shapefile {
            let sub = dir.join("shapefile");
            (sub.clone(), Some(sub))
        } else {
            (dir.to_path_buf(), None)
        };

        FormatTask {
            format,
            out_path: out_dir.join( format!("{}{}", file_stem, format.extension())),
            sub_dir,
        }
    }
}

/// one user-initiated export: the scratch token doubles as directory name and
/// correlation id, and the job exclusively owns the scratch dir until the artifact
/// has been handed over
#[derive(Debug)]
pub struct ExportJob {
    pub token: String,
    pub file_stem: String,
    pub dir: PathBuf,
    pub options: FilterOptions,
    pub tasks: Vec<FormatTask>,
    pub state: JobState,
}

impl ExportJob {
    pub fn new (token: String, dir: PathBuf, options: FilterOptions, config: &ExportConfig)->Self {
        let file_stem = format!("{}.{}.{}",
            config.base_name, date_string( &options.date_from), date_string( &options.date_to));

        let tasks: Vec<FormatTask> = options.formats.iter()
            .map( |format| FormatTask::new( *format, &dir, &file_stem))
            .collect();

        ExportJob { token, file_stem, dir, options, tasks, state: JobState::Pending }
    }

    /// the name of the deliverable file within the scratch dir
    pub fn deliverable (&self)->String {
        if let [task] = self.tasks.as_slice() {
            // single format: the output file itself, zipped only for the multi-file shapefile
            match task.format {
                ExportFormat::Shapefile => format!("{}.shp.zip", self.file_stem),
                format => format!("{}{}", self.file_stem, format.extension()),
            }
        } else {
            format!("{}.zip", self.file_stem)
        }
    }
}

/// 24 random bytes from the OS-seeded RNG, hex encoded, plus the current date.
/// A collision between two live jobs is treated as astronomically unlikely
/// (accepted risk) and not detected
pub fn new_scratch_token ()->String {
    let mut bytes = [0u8; 24];
    rand::rng().fill_bytes( &mut bytes);

    let mut token = String::with_capacity( 64);
    for b in bytes { write!( token, "{b:02x}"); }
    write!( token, "_--_{}", local_date_string());
    token
}

/* #endregion job model */

/* #region export service ************************************************************************/

/// the export entry point: validates requests, keeps the audit ledger, and drives
/// detached export jobs. All configuration is injected at construction
pub struct ExportService {
    config: Arc<ExportConfig>,
    tables: Arc<TablesConfig>,
    db: Arc<DbConfig>,
    workspace: Workspace,
    ledger: DownloadLedger,
}

impl ExportService {
    pub fn new (config: ExportConfig, tables: TablesConfig, db: DbConfig, pool: PgPool)->Self {
        let workspace = Workspace::new( &config.tmp_dir);
        let tables = Arc::new( tables);
        let ledger = DownloadLedger::new( pool, tables.clone());

        ExportService {
            config: Arc::new( config),
            tables,
            db: Arc::new( db),
            workspace,
            ledger
        }
    }

    pub fn workspace (&self)->&Workspace {
        &self.workspace
    }

    /// the existence probe behind the UI's export-button gate
    pub async fn exists_data (&self, request: &ExportRequest)->Result<bool> {
        let options = request.normalize()?;
        self.ledger.exists_data( &options).await
    }

    /// start an export job. Validation errors surface synchronously; everything after
    /// that is reported through `events`. The returned handle carries the job token
    pub async fn start_export (&self, request: &ExportRequest, requester_ip: &str, events: mpsc::Sender<ExportEvent>)->Result<ExportJobHandle> {
        let options = request.normalize()?;

        // audit first, so the request is recorded even if generation fails later.
        // A ledger failure does not stop the export
        if let Err(e) = self.ledger.record( &options, requester_ip).await {
            warn!("failed to record download of {requester_ip}: {e}");
        }

        let token = new_scratch_token();
        let dir = self.workspace.create_dir( &token)?;
        let job = ExportJob::new( token.clone(), dir, options, &self.config);

        info!("starting export {} for {} ({} formats)", token, requester_ip, job.tasks.len());

        let task = tokio::spawn( run_export_job(
            job,
            self.config.clone(), self.tables.clone(), self.db.clone(),
            self.workspace.clone(),
            events
        ));

        Ok( ExportJobHandle { token, task })
    }
}

pub struct ExportJobHandle {
    pub token: String,
    task: JoinHandle<()>,
}

impl ExportJobHandle {
    pub async fn join (self) {
        let _ = self.task.await;
    }

    pub fn abort_handle (&self)->tokio::task::AbortHandle {
        self.task.abort_handle()
    }
}

/* #endregion export service */

/* #region job execution *************************************************************************/

/// what the per-format subprocess tasks report to the job driver
#[derive(Debug)]
enum TaskEvent {
    /// one stdout chunk arrived - contents don't matter, only the tick
    Progress,
    /// exactly one per task, sent no matter how the subprocess went
    Exited { format: ExportFormat, ok: bool },
}

/// drive one prepared export job to its terminal event: spawn every format task,
/// relay progress, bundle and finalize. Does not touch the database - the ledger
/// entry was written before this runs
pub async fn run_export_job (mut job: ExportJob, config: Arc<ExportConfig>, tables: Arc<TablesConfig>,
                             db: Arc<DbConfig>, workspace: Workspace, events: mpsc::Sender<ExportEvent>)
{
    let total = job.tasks.len();
    let (tx, mut rx) = mpsc::channel::<TaskEvent>(64);

    let datasource = db.ogr_datasource();
    for task in &job.tasks {
        if let Some(sub_dir) = &task.sub_dir {
            if let Err(e) = ensure_dir( sub_dir) {
                error!("cannot create {:?}: {e}", sub_dir); // the task then fails on its own and is counted as exited
            }
        }

        let query = filter::build_export_query( &job.options, &tables, task.format);
        let args = ogr_args( task, &datasource, &query, &job.options);
        tokio::spawn( run_format_task( config.ogr2ogr_cmd.clone(), args, task.format, tx.clone()));
    }
    drop(tx); // the channel closes once every task has sent its exit event

    job.state = JobState::start( total);

    // per-chunk progress increment - intentionally approximate, the first chunk reports 0
    let progress_step = 2.5 / total as f32;
    let mut progress: Option<f32> = None;
    let mut n_ok = 0;

    while let Some(event) = rx.recv().await {
        match event {
            TaskEvent::Progress => {
                let p = match progress {
                    None => 0.0,
                    Some(p) => p + progress_step
                };
                progress = Some(p);
                // fire-and-forget: a client that went away just stops receiving ticks
                let _ = events.send( ExportEvent::Progress { progress: p }).await;
            }
            TaskEvent::Exited { format, ok } => {
                if ok { n_ok += 1 }

                if format == ExportFormat::Shapefile {
                    if let Err(e) = zip_shapefile_output( &job) {
                        error!("failed to bundle shapefile output of {}: {e}", job.token);
                    }
                }

                job.state = job.state.task_exited();
                if job.state == JobState::Completed { break }
            }
        }
    }

    if job.state != JobState::Completed {
        job.state = job.state.abandon(); // all senders gone without the last exit event
    }

    let outcome = if job.state == JobState::Completed && n_ok > 0 {
        finalize( &job)
    } else {
        Err( op_failed( format!("no format task of export {} produced output", job.token)))
    };

    match outcome {
        Ok(file) => {
            info!("export {} ready: {}", job.token, file);
            if events.send( ExportEvent::Ready { folder: job.token.clone(), file }).await.is_err() {
                // nobody is listening anymore, so no download will come - clean up now
                if let Err(e) = workspace.remove_dir( &job.token) {
                    warn!("failed to remove abandoned scratch dir of {}: {e}", job.token);
                }
            }
        }
        Err(e) => {
            job.state = job.state.abandon();
            error!("export {} failed: {e}", job.token);
            let _ = events.send( ExportEvent::Failed { reason: e.to_string() }).await;
            if let Err(e) = workspace.remove_dir( &job.token) {
                warn!("failed to remove scratch dir of failed export {}: {e}", job.token);
            }
        }
    }
}

/// decide and produce the deliverable once every task has exited: a single requested
/// format is served as its own file (the shapefile bundle is already zipped), multiple
/// formats are bundled into one archive covering the whole scratch dir
fn finalize (job: &ExportJob)->Result<String> {
    let file = job.deliverable();

    if job.tasks.len() > 1 {
        let out = job.dir.join( &file);
        archive::zip_dir_flat( &job.dir, &out)?;
    }

    Ok(file)
}

/// shapefile output is a set of sibling files - zip the sub-directory into a
/// `.shp.zip` next to the other outputs and drop the sub-directory
fn zip_shapefile_output (job: &ExportJob)->Result<()> {
    let sub_dir = job.dir.join("shapefile");
    let out = job.dir.join( format!("{}.shp.zip", job.file_stem));

    archive::zip_dir_flat( &sub_dir, &out)?;
    bdq_common::fs::remove_tree( &sub_dir)?;
    Ok(())
}

/// conversion tool arguments for one format task
fn ogr_args (task: &FormatTask, datasource: &str, query: &str, options: &FilterOptions)->Vec<String> {
    let mut args: Vec<String> = vec![
        "-progress".to_string(),
        "-f".to_string(), task.format.ogr_name().to_string(),
        path_to_lossy_string( &task.out_path),
        datasource.to_string(),
        "-sql".to_string(), query.to_string(),
        "-skipfailures".to_string(),
    ];

    if task.format == ExportFormat::Csv {
        args.push("-lco".to_string());
        args.push("LINEFORMAT=CRLF".to_string());
        args.push("-lco".to_string());
        args.push( format!("SEPARATOR={}", options.field_separator.ogr_name()));
    }

    args
}

/// run one conversion subprocess, relaying stdout chunks as progress ticks and stderr
/// lines to the log. Failures here never abort sibling tasks - the task just reports
/// a failed exit
async fn run_format_task (cmd_path: String, args: Vec<String>, format: ExportFormat, tx: mpsc::Sender<TaskEvent>) {
    let mut cmd = Command::new( &cmd_path);
    cmd.args( &args)
        .stdin( Stdio::null())
        .stdout( Stdio::piped())
        .stderr( Stdio::piped());

    debug!("executing {cmd:?}");

    let mut ok = false;
    match cmd.spawn() {
        Ok(mut child) => {
            let progress_relay = child.stdout.take().map( |mut stdout| {
                let tx = tx.clone();
                tokio::spawn( async move {
                    let mut buf = [0u8; 512];
                    while let Ok(n) = stdout.read( &mut buf).await {
                        if n == 0 { break }
                        if tx.send( TaskEvent::Progress).await.is_err() { break }
                    }
                })
            });

            let stderr_relay = child.stderr.take().map( |stderr| {
                tokio::spawn( async move {
                    let mut lines = BufReader::new( stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        error!("ogr2ogr[{}]: {}", format.name(), line);
                    }
                })
            });

            match child.wait().await {
                Ok(status) => {
                    if status.success() {
                        ok = true;
                    } else {
                        error!("ogr2ogr {} conversion exited with {status}", format.name());
                    }
                }
                Err(e) => error!("failed to wait for ogr2ogr {} conversion: {e}", format.name())
            }

            if let Some(jh) = progress_relay { let _ = jh.await; }
            if let Some(jh) = stderr_relay { let _ = jh.await; }
        }
        Err(e) => {
            error!("failed to spawn {cmd_path}: {e}");
        }
    }

    // exactly one exit event per task, no matter how it went
    let _ = tx.send( TaskEvent::Exited { format, ok }).await;
}

/* #endregion job execution */
